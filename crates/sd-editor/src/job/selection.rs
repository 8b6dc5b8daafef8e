use super::{Job, JobState};
use crate::context::EditorContext;
use crate::selection::SelectionGroup;

/// Replace the selection, restoring the previous group on undo.
#[derive(Debug)]
pub struct UpdateSelectionJob {
    group: Option<SelectionGroup>,
    previous: Option<SelectionGroup>,
    state: JobState,
}

impl UpdateSelectionJob {
    pub fn new(group: Option<SelectionGroup>) -> Self {
        Self {
            group,
            previous: None,
            state: JobState::Fresh,
        }
    }
}

impl Job for UpdateSelectionJob {
    fn is_executable(&mut self, _ctx: &EditorContext) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.previous = ctx.selection.group().cloned();
        ctx.select(self.group.clone());
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        ctx.select(self.previous.clone());
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        ctx.select(self.group.clone());
    }

    fn description(&self) -> String {
        "Update selection".to_string()
    }
}
