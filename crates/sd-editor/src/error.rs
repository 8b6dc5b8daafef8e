use sd_core::ValidationError;
use thiserror::Error;

/// Why an edit request produced no job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("nothing is selected")]
    NothingSelected,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("the edit cannot be applied to the current selection")]
    NotExecutable,
}
