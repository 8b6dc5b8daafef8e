//! Undoable jobs.
//!
//! A job is checked with `is_executable`, then executed once, and from then
//! on alternates between `undo` and `redo`. Each job records what it needs
//! to put the document back exactly, so undo never re-derives state.

use crate::context::EditorContext;
use sd_core::NodeId;
use std::fmt;

pub mod batch;
pub mod grid;
pub mod property;
pub mod selection;
pub mod structure;

pub use batch::BatchJob;
pub use grid::{InsertPosition, insert_grid_lines};
pub use property::{ModifyPropertyJob, modify_selection};
pub use selection::UpdateSelectionJob;
pub use structure::{AddObjectJob, ReIndexObjectJob, RemoveObjectJob, delete_selection, duplicate_selection};

pub trait Job: fmt::Debug {
    /// Whether the job can run against the current state. Must not mutate
    /// the document; jobs may use `&mut self` to cache what they computed.
    fn is_executable(&mut self, ctx: &EditorContext) -> bool;

    fn execute(&mut self, ctx: &mut EditorContext);

    fn undo(&mut self, ctx: &mut EditorContext);

    fn redo(&mut self, ctx: &mut EditorContext);

    /// Short label for undo/redo menu entries.
    fn description(&self) -> String;

    /// Called once when the job leaves the history for good, either trimmed
    /// from the undo end or dropped from the redo end. Detached subtrees
    /// only this job could bring back are discarded here.
    fn dispose(&mut self, _ctx: &mut EditorContext) {}
}

/// Discard `node` when it heads a detached subtree.
pub(crate) fn discard_detached(ctx: &mut EditorContext, node: NodeId) {
    let doc = &mut ctx.document;
    if doc.contains(node) && doc.parent(node).is_none() && doc.root() != Some(node) {
        log::trace!("discard detached {node}");
        doc.discard(node);
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Fresh,
    Executed,
    Undone,
}

impl JobState {
    /// Step to `to`, panicking on an out-of-order call.
    pub(crate) fn advance(&mut self, to: JobState) {
        let allowed = matches!(
            (*self, to),
            (JobState::Fresh, JobState::Executed)
                | (JobState::Executed, JobState::Undone)
                | (JobState::Undone, JobState::Executed)
        );
        assert!(allowed, "job cannot go from {self:?} to {to:?}");
        *self = to;
    }
}
