//! Editor façade.
//!
//! Owns the editing context and the job history, and exposes the edits a
//! front end needs as single calls. Every edit becomes a job pushed through
//! the history, so each one is undoable and notifies listeners once.

use crate::config::EditorConfig;
use crate::context::EditorContext;
use crate::drop::{DragSession, DragSource, DropTarget};
use crate::error::EditError;
use crate::history::JobManager;
use crate::job::{InsertPosition, Job, delete_selection, duplicate_selection, insert_grid_lines, modify_selection};
use crate::selection::SelectionGroup;
use sd_core::{
    ChangeEvent, Document, Fragment, GridAxis, LoadError, PropertyName, Registry, RegistryResolver, SubscriptionId,
    emit_document_with,
};

#[derive(Debug)]
pub struct Editor {
    ctx: EditorContext,
    history: JobManager,
    config: EditorConfig,
}

impl Editor {
    pub fn new(registry: Registry, config: EditorConfig) -> Self {
        Self {
            ctx: EditorContext::new(registry),
            history: JobManager::new(config.max_undo_depth),
            config,
        }
    }

    /// Create an editor over a document parsed from markup.
    pub fn from_markup(text: &str, registry: Registry, config: EditorConfig) -> Result<Self, LoadError> {
        let mut editor = Self::new(registry, config);
        editor.load(text)?;
        Ok(editor)
    }

    /// Replace the document with `text`. Clears the selection and the
    /// history; on error nothing changes.
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let doc = Document::load(text, &self.ctx.registry, &RegistryResolver::new(&self.ctx.registry))?;
        let unresolved = doc.unresolved_nodes().len();
        if unresolved > 0 {
            log::warn!("loaded document with {unresolved} unresolved element(s)");
        }
        self.ctx.document.begin_update();
        self.history.clear(&mut self.ctx);
        self.ctx.select(None);
        self.ctx.document.replace(doc);
        self.ctx.document.end_update();
        Ok(())
    }

    /// Current document as canonical markup.
    pub fn to_markup(&self) -> String {
        emit_document_with(&self.ctx.document, &self.ctx.registry, &self.config.emit)
    }

    pub fn context(&self) -> &EditorContext {
        &self.ctx
    }

    pub fn document(&self) -> &Document {
        &self.ctx.document
    }

    pub fn registry(&self) -> &Registry {
        &self.ctx.registry
    }

    /// Registry access for registering custom components before loading.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.ctx.registry
    }

    pub fn history(&self) -> &JobManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.ctx.document.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.ctx.document.unsubscribe(id)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Option<&SelectionGroup> {
        self.ctx.selection.group()
    }

    /// Replace the selection directly. Selection changes are not undoable
    /// on their own.
    pub fn select(&mut self, group: Option<SelectionGroup>) -> bool {
        self.ctx.select(group)
    }

    /// Select by `fx:id`.
    pub fn select_id(&mut self, fx_id: &str) -> bool {
        match self.ctx.document.node_by_fx_id(fx_id) {
            Some(node) => self.ctx.select(Some(SelectionGroup::single(node))),
            None => false,
        }
    }

    pub fn select_previous(&mut self) -> bool {
        match self.ctx.selection.previous_group(&self.ctx.document) {
            Some(group) => self.ctx.select(Some(group)),
            None => false,
        }
    }

    pub fn select_next(&mut self) -> bool {
        match self.ctx.selection.next_group(&self.ctx.document, &self.ctx.registry) {
            Some(group) => self.ctx.select(Some(group)),
            None => false,
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Execute a job and record it for undo. False when not executable.
    pub fn push(&mut self, job: impl Job + 'static) -> bool {
        self.history.push(&mut self.ctx, Box::new(job))
    }

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.ctx)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.ctx)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Set `property` (e.g. `text` or `GridPane.columnIndex`) on every
    /// selected object. The value is validated first; a rejected value
    /// leaves the document untouched.
    pub fn set_property(&mut self, property: &str, raw: &str) -> Result<(), EditError> {
        self.modify(property, Some(raw))
    }

    /// Remove `property` from every selected object.
    pub fn clear_property(&mut self, property: &str) -> Result<(), EditError> {
        self.modify(property, None)
    }

    fn modify(&mut self, property: &str, raw: Option<&str>) -> Result<(), EditError> {
        let job = modify_selection(&self.ctx, PropertyName::parse(property), raw)?;
        if self.push(job) {
            Ok(())
        } else {
            Err(EditError::NotExecutable)
        }
    }

    pub fn insert_columns(&mut self, position: InsertPosition) -> bool {
        self.insert_lines(GridAxis::Column, position)
    }

    pub fn insert_rows(&mut self, position: InsertPosition) -> bool {
        self.insert_lines(GridAxis::Row, position)
    }

    fn insert_lines(&mut self, axis: GridAxis, position: InsertPosition) -> bool {
        match insert_grid_lines(&self.ctx, axis, position) {
            Some(job) => self.push(job),
            None => false,
        }
    }

    pub fn delete_selection(&mut self) -> bool {
        match delete_selection(&self.ctx) {
            Some(job) => self.push(job),
            None => false,
        }
    }

    pub fn duplicate_selection(&mut self) -> bool {
        match duplicate_selection(&self.ctx) {
            Some(job) => self.push(job),
            None => false,
        }
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    /// Start dragging the selected objects.
    pub fn drag_selection(&self) -> Option<DragSession> {
        DragSource::from_selection(&self.ctx).map(DragSession::new)
    }

    /// Start dragging objects from outside the document.
    pub fn drag_external(&mut self, fragments: &[Fragment]) -> Option<DragSession> {
        DragSource::external(&mut self.ctx, fragments).map(DragSession::new)
    }

    pub fn hover(&self, session: &mut DragSession, target: Option<DropTarget>) -> bool {
        session.hover(&self.ctx, target)
    }

    pub fn release(&mut self, session: DragSession) -> bool {
        session.release(&mut self.ctx, &mut self.history)
    }

    pub fn cancel_drag(&mut self, session: DragSession) {
        session.cancel(&mut self.ctx);
    }

    /// Drop `source` on `target` in one step.
    pub fn drop(&mut self, source: DragSource, target: DropTarget) -> bool {
        let mut session = DragSession::new(source);
        session.hover(&self.ctx, Some(target));
        session.release(&mut self.ctx, &mut self.history)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Registry::builtin(), EditorConfig::default())
    }
}
