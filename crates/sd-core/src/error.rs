//! Error types for loading markup and validating property edits.

use thiserror::Error;

/// Failure to turn markup text into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("closing tag `</{found}>` does not match `<{expected}>` on line {line}")]
    MismatchedTag {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("content after the root element on line {line}")]
    TrailingContent { line: usize },
}

/// A rejected property edit. The tree is never touched when one of these is
/// produced; the message doubles as the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("`{0}` is not a property of this component")]
    UnknownProperty(String),

    #[error("`{0}` is read-only")]
    ReadOnly(String),

    #[error("`{property}` holds objects and cannot be edited as text")]
    ObjectValued { property: String },

    #[error("`{raw}` is not a valid number for `{property}`")]
    NotANumber { property: String, raw: String },

    #[error("`{raw}` is not a valid integer for `{property}`")]
    NotAnInteger { property: String, raw: String },

    #[error("`{raw}` is not a boolean (expected `true` or `false`)")]
    NotABoolean { raw: String },

    #[error("{value} is out of range for `{property}` ({min} to {max})")]
    OutOfRange {
        property: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("`{raw}` is not one of {allowed:?} for `{property}`")]
    NotInEnumeration {
        property: String,
        raw: String,
        allowed: &'static [&'static str],
    },

    #[error("`{0}` can only be edited on children of a grid")]
    NoGridContext(String),
}

/// Failure to register a user-supplied component type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` has no known ancestor class")]
    NoKnownAncestor(String),

    #[error("`{0}` is already registered")]
    AlreadyRegistered(String),
}
