//! Undo/redo job stack.
//!
//! Every edit goes through `push`: the job is checked, executed, and kept on
//! the undo stack. Undo pops and reverts it; redo re-applies it. Each of the
//! three runs inside one notification bracket, so listeners see one burst of
//! events per user action, ending with `JobStackChanged`.
//!
//! The selection is part of what undo restores: every entry keeps the group
//! selected before and after its job ran.

use crate::context::EditorContext;
use crate::job::Job;
use crate::selection::SelectionGroup;
use sd_core::ChangeEvent;

struct Entry {
    job: Box<dyn Job>,
    selection_before: Option<SelectionGroup>,
    selection_after: Option<SelectionGroup>,
}

pub struct JobManager {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Bumped on every stack change; lets observers tell stale state apart.
    revision: u64,
}

impl JobManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            revision: 0,
        }
    }

    /// Execute `job` and record it for undo. Returns false, leaving the
    /// document and both stacks untouched, when the job is not executable.
    pub fn push(&mut self, ctx: &mut EditorContext, mut job: Box<dyn Job>) -> bool {
        if !job.is_executable(ctx) {
            log::debug!("rejected job `{}`", job.description());
            return false;
        }
        log::debug!("execute `{}`", job.description());

        ctx.document.begin_update();
        let selection_before = ctx.selection.group().cloned();
        job.execute(ctx);
        ctx.revalidate_selection();

        self.undo_stack.push(Entry {
            job,
            selection_before,
            selection_after: ctx.selection.group().cloned(),
        });
        if self.undo_stack.len() > self.max_depth {
            let mut oldest = self.undo_stack.remove(0);
            oldest.job.dispose(ctx);
        }
        // Clear redo stack on new action
        for mut entry in self.redo_stack.drain(..) {
            entry.job.dispose(ctx);
        }
        self.changed(ctx);
        ctx.document.end_update();
        true
    }

    /// Revert the last job and the selection it left. Returns its
    /// description.
    pub fn undo(&mut self, ctx: &mut EditorContext) -> Option<String> {
        let mut entry = self.undo_stack.pop()?;
        let description = entry.job.description();
        log::debug!("undo `{description}`");

        ctx.document.begin_update();
        entry.job.undo(ctx);
        ctx.select(entry.selection_before.clone());
        self.redo_stack.push(entry);
        self.changed(ctx);
        ctx.document.end_update();
        Some(description)
    }

    /// Re-apply the last undone job. Returns its description.
    pub fn redo(&mut self, ctx: &mut EditorContext) -> Option<String> {
        let mut entry = self.redo_stack.pop()?;
        let description = entry.job.description();
        log::debug!("redo `{description}`");

        ctx.document.begin_update();
        entry.job.redo(ctx);
        ctx.select(entry.selection_after.clone());
        self.undo_stack.push(entry);
        self.changed(ctx);
        ctx.document.end_update();
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|entry| entry.job.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|entry| entry.job.description())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget all history, e.g. before loading another document. Jobs are
    /// disposed against the document they were recorded on.
    pub fn clear(&mut self, ctx: &mut EditorContext) {
        for mut entry in self.redo_stack.drain(..) {
            entry.job.dispose(ctx);
        }
        for mut entry in self.undo_stack.drain(..).rev() {
            entry.job.dispose(ctx);
        }
        self.changed(ctx);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn changed(&mut self, ctx: &mut EditorContext) {
        self.revision += 1;
        ctx.document.notify(ChangeEvent::JobStackChanged {
            revision: self.revision,
        });
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new(100)
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{AddObjectJob, BatchJob, ModifyPropertyJob, RemoveObjectJob};
    use sd_core::{Document, Fragment, NodeId, PropertyName, Registry, RegistryResolver};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context() -> EditorContext {
        let registry = Registry::builtin();
        let doc = Document::load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<VBox>
  <Button fx:id="ok" text="A"/>
  <Label fx:id="note"/>
</VBox>"#,
            &registry,
            &RegistryResolver::new(&registry),
        )
        .unwrap();
        EditorContext::with_document(registry, doc)
    }

    fn id(ctx: &EditorContext, fx_id: &str) -> NodeId {
        ctx.document.node_by_fx_id(fx_id).unwrap()
    }

    fn set_text(ok: NodeId, text: &str) -> Box<dyn Job> {
        Box::new(ModifyPropertyJob::set(ok, PropertyName::new("text"), text))
    }

    fn text(ctx: &EditorContext) -> Option<String> {
        ctx.document
            .text_property(id(ctx, "ok"), &PropertyName::new("text"))
            .map(str::to_string)
    }

    #[test]
    fn push_undo_redo() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(10);
        assert!(history.push(&mut ctx, set_text(ok, "B")));
        assert_eq!(history.undo_description().as_deref(), Some("Set text"));

        assert_eq!(history.undo(&mut ctx).as_deref(), Some("Set text"));
        assert_eq!(text(&ctx).as_deref(), Some("A"));
        assert!(history.can_redo());

        history.redo(&mut ctx);
        assert_eq!(text(&ctx).as_deref(), Some("B"));
        assert!(!history.can_redo());
    }

    #[test]
    fn new_job_clears_redo() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(10);
        history.push(&mut ctx, set_text(ok, "B"));
        history.undo(&mut ctx);
        history.push(&mut ctx, set_text(ok, "C"));
        assert!(!history.can_redo());
        assert_eq!(history.redo(&mut ctx), None);
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(3);
        for text in ["1", "2", "3", "4", "5"] {
            history.push(&mut ctx, set_text(ok, text));
        }
        assert_eq!(history.undo_depth(), 3);
        while history.undo(&mut ctx).is_some() {}
        assert_eq!(text(&ctx).as_deref(), Some("2"));
    }

    #[test]
    fn rejected_job_changes_nothing() {
        let mut ctx = context();
        let mut history = JobManager::new(10);
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = events.clone();
        ctx.document.subscribe(move |e| seen.borrow_mut().push(e.clone()));

        let missing = NodeId::intern("no_such_node");
        assert!(!history.push(&mut ctx, set_text(missing, "x")));
        assert!(!history.push(&mut ctx, Box::new(BatchJob::new("empty"))));
        assert!(!history.can_undo());
        assert_eq!(history.revision(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn one_burst_per_push() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(10);
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = events.clone();
        ctx.document.subscribe(move |e| seen.borrow_mut().push(e.clone()));

        history.push(&mut ctx, set_text(ok, "B"));
        assert_eq!(
            *events.borrow(),
            [
                ChangeEvent::PropertyChanged {
                    node: ok,
                    property: PropertyName::new("text")
                },
                ChangeEvent::JobStackChanged { revision: 1 },
            ]
        );
    }

    #[test]
    fn undo_restores_the_selection_cleared_by_a_removal() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(10);
        ctx.select(Some(SelectionGroup::single(ok)));

        assert!(history.push(&mut ctx, Box::new(RemoveObjectJob::new(ok))));
        assert!(ctx.selection.is_empty());

        history.undo(&mut ctx);
        assert_eq!(ctx.selection.group(), Some(&SelectionGroup::single(ok)));
        history.redo(&mut ctx);
        assert!(ctx.selection.is_empty());
    }

    #[test]
    fn trimmed_removal_discards_its_subtree() {
        let mut ctx = context();
        let (ok, note) = (id(&ctx, "ok"), id(&ctx, "note"));
        let mut history = JobManager::new(1);
        history.push(&mut ctx, Box::new(RemoveObjectJob::new(ok)));
        assert!(ctx.document.contains(ok), "kept while undo can bring it back");

        history.push(&mut ctx, set_text(note, "gone"));
        assert!(!ctx.document.contains(ok));
        ctx.document.check_integrity().unwrap();
    }

    #[test]
    fn dropped_redo_discards_undone_additions() {
        let mut ctx = context();
        let (root, ok) = (ctx.document.root().unwrap(), id(&ctx, "ok"));
        let mut history = JobManager::new(10);
        let button = Fragment::instance("Button", ctx.registry.resolve_simple_name("Button"));
        let add = AddObjectJob::from_fragment(button, root, PropertyName::new("children"), 0);

        assert!(history.push(&mut ctx, Box::new(add)));
        let added = ctx.document.children(root, &PropertyName::new("children"))[0];
        history.undo(&mut ctx);
        assert!(ctx.document.contains(added), "kept while redo can bring it back");

        history.push(&mut ctx, set_text(ok, "B"));
        assert!(!ctx.document.contains(added));
        ctx.document.check_integrity().unwrap();
    }

    #[test]
    fn removal_still_on_the_redo_stack_keeps_its_node() {
        let mut ctx = context();
        let ok = id(&ctx, "ok");
        let mut history = JobManager::new(10);
        history.push(&mut ctx, Box::new(RemoveObjectJob::new(ok)));
        history.undo(&mut ctx);
        // The undone removal leaves the history; `ok` is attached again.
        history.push(&mut ctx, set_text(ok, "B"));
        assert!(ctx.document.is_attached(ok));
        assert_eq!(text(&ctx).as_deref(), Some("B"));
    }
}
