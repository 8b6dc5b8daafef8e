pub mod emitter;
pub mod error;
pub mod format;
pub mod id;
pub mod mask;
pub mod metadata;
pub mod model;
pub mod notify;
pub mod parser;
pub mod resolve;

pub use emitter::{EmitConfig, emit_document, emit_document_with};
pub use error::{LoadError, RegistryError, ValidationError};
pub use format::format_markup;
pub use id::{Name, NodeId};
pub use mask::{HierarchyMask, Rejection};
pub use metadata::{
    Accessory, ClassName, GridAxis, GridExtent, PropertyDescriptor, PropertyName, Registry,
    ValidationContext, Value,
};
pub use model::*;
pub use notify::{ChangeEvent, SubscriptionId};
pub use resolve::{RegistryResolver, TypeResolver};
