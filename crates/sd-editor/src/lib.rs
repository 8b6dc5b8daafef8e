pub mod config;
pub mod context;
pub mod drop;
pub mod editor;
pub mod error;
pub mod history;
pub mod job;
pub mod selection;

pub use config::EditorConfig;
pub use context::EditorContext;
pub use drop::{DragSession, DragSource, DropRefusal, DropTarget};
pub use editor::Editor;
pub use error::EditError;
pub use history::JobManager;
pub use job::{BatchJob, Job, JobState};
pub use selection::{GridSelection, ObjectSelection, Selection, SelectionGroup};
