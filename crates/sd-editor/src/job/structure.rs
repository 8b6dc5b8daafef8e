//! Jobs that attach, detach and reorder objects.

use super::{BatchJob, Job, JobState, UpdateSelectionJob, discard_detached};
use crate::context::EditorContext;
use crate::selection::SelectionGroup;
use sd_core::metadata::PropertyKind;
use sd_core::{ClassName, Detachment, Fragment, NodeId, PropertyName};

#[derive(Debug)]
enum Payload {
    Node(NodeId),
    /// Materialized on first execution; the node is reused by redo.
    Fragment(Fragment, Option<NodeId>),
}

/// Attach an object to a slot of `parent` at `index`.
///
/// The object is either an existing node (detached by the time the job
/// executes) or a fragment built into the document on first execution.
#[derive(Debug)]
pub struct AddObjectJob {
    payload: Payload,
    parent: NodeId,
    slot: PropertyName,
    index: usize,
    state: JobState,
}

impl AddObjectJob {
    pub fn new(node: NodeId, parent: NodeId, slot: PropertyName, index: usize) -> Self {
        Self {
            payload: Payload::Node(node),
            parent,
            slot,
            index,
            state: JobState::Fresh,
        }
    }

    pub fn from_fragment(fragment: Fragment, parent: NodeId, slot: PropertyName, index: usize) -> Self {
        Self {
            payload: Payload::Fragment(fragment, None),
            parent,
            slot,
            index,
            state: JobState::Fresh,
        }
    }

    /// The added node, once known.
    pub fn node(&self) -> Option<NodeId> {
        match &self.payload {
            Payload::Node(node) => Some(*node),
            Payload::Fragment(_, node) => *node,
        }
    }

    fn accepts(&self, ctx: &EditorContext, class: ClassName) -> bool {
        let Some(parent_class) = ctx.document.class_of(self.parent) else {
            return false;
        };
        let Some(slot) = ctx
            .registry
            .describe(parent_class)
            .and_then(|d| d.property(&self.slot))
        else {
            return false;
        };
        match slot.kind {
            PropertyKind::Object { accepted, .. } => {
                ctx.registry.is_subclass(class, ClassName::of(accepted))
            }
            _ => false,
        }
    }
}

impl Job for AddObjectJob {
    fn is_executable(&mut self, ctx: &EditorContext) -> bool {
        if !ctx.document.contains(self.parent) {
            return false;
        }
        match &self.payload {
            Payload::Node(node) => {
                let node = *node;
                if ctx.document.root() == Some(node)
                    || node == self.parent
                    || ctx.document.is_ancestor_of(node, self.parent)
                {
                    return false;
                }
                ctx.document
                    .class_of(node)
                    .is_some_and(|class| self.accepts(ctx, class))
            }
            Payload::Fragment(fragment, _) => fragment
                .class
                .is_some_and(|class| self.accepts(ctx, class)),
        }
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        let node = match &mut self.payload {
            Payload::Node(node) => *node,
            Payload::Fragment(fragment, built) => match *built {
                Some(node) => node,
                None => *built.insert(ctx.document.materialize(fragment)),
            },
        };
        ctx.document.add_child(self.parent, self.slot, self.index, node);
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        if let Some(node) = self.node() {
            ctx.document.remove_child(node);
        }
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        if let Some(node) = self.node() {
            ctx.document.add_child(self.parent, self.slot, self.index, node);
        }
    }

    fn description(&self) -> String {
        let type_name = match &self.payload {
            Payload::Node(_) => "object",
            Payload::Fragment(fragment, _) => fragment.type_name.as_str(),
        };
        format!("Add {type_name}")
    }

    fn dispose(&mut self, ctx: &mut EditorContext) {
        if self.state == JobState::Undone
            && let Some(node) = self.node()
        {
            discard_detached(ctx, node);
        }
    }
}

/// Detach an object from its parent, keeping the subtree for undo.
#[derive(Debug)]
pub struct RemoveObjectJob {
    node: NodeId,
    detachment: Option<Detachment>,
    state: JobState,
}

impl RemoveObjectJob {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            detachment: None,
            state: JobState::Fresh,
        }
    }
}

impl Job for RemoveObjectJob {
    fn is_executable(&mut self, ctx: &EditorContext) -> bool {
        ctx.document.parent(self.node).is_some() && ctx.document.class_of(self.node).is_some()
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.detachment = Some(ctx.document.remove_child(self.node));
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        if let Some(at) = self.detachment {
            ctx.document.add_child(at.parent, at.slot, at.index, self.node);
        }
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.detachment = Some(ctx.document.remove_child(self.node));
    }

    fn description(&self) -> String {
        "Delete".to_string()
    }

    fn dispose(&mut self, ctx: &mut EditorContext) {
        if self.state == JobState::Executed {
            discard_detached(ctx, self.node);
        }
    }
}

/// Move an object to another position within the same slot.
#[derive(Debug)]
pub struct ReIndexObjectJob {
    node: NodeId,
    index: usize,
    previous: Option<usize>,
    state: JobState,
}

impl ReIndexObjectJob {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self {
            node,
            index,
            previous: None,
            state: JobState::Fresh,
        }
    }
}

impl Job for ReIndexObjectJob {
    fn is_executable(&mut self, ctx: &EditorContext) -> bool {
        let doc = &ctx.document;
        match (doc.parent(self.node), doc.parent_slot(self.node)) {
            (Some(parent), Some(slot)) => {
                doc.class_of(self.node).is_some() && self.index < doc.children(parent, &slot).len()
            }
            _ => false,
        }
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.previous = ctx.document.index_in_parent(self.node);
        ctx.document.reindex_child(self.node, self.index);
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        if let Some(previous) = self.previous {
            ctx.document.reindex_child(self.node, previous);
        }
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        ctx.document.reindex_child(self.node, self.index);
    }

    fn description(&self) -> String {
        "Reorder".to_string()
    }
}

/// Selected objects without those already covered by a selected ancestor.
fn outermost(ctx: &EditorContext) -> Vec<NodeId> {
    let items = ctx.selection.group().map(SelectionGroup::items).unwrap_or_default();
    items
        .iter()
        .copied()
        .filter(|item| !items.iter().any(|other| ctx.document.is_ancestor_of(*other, *item)))
        .collect()
}

/// Remove every selected object and clear the selection.
pub fn delete_selection(ctx: &EditorContext) -> Option<BatchJob> {
    let items = outermost(ctx);
    if items.is_empty() {
        return None;
    }
    let mut batch = BatchJob::new("Delete").with(UpdateSelectionJob::new(None));
    for item in items {
        batch.push(RemoveObjectJob::new(item));
    }
    Some(batch)
}

/// Insert a copy of every selected object right after the original.
/// Copies carry no `fx:id`.
pub fn duplicate_selection(ctx: &EditorContext) -> Option<BatchJob> {
    let doc = &ctx.document;
    let mut placed: Vec<(NodeId, PropertyName, usize, NodeId)> = Vec::new();
    for item in outermost(ctx) {
        let (Some(parent), Some(slot), Some(index)) =
            (doc.parent(item), doc.parent_slot(item), doc.index_in_parent(item))
        else {
            return None;
        };
        placed.push((parent, slot, index, item));
    }
    if placed.is_empty() {
        return None;
    }
    // Later positions first, so each insertion leaves the earlier indexes
    // valid.
    placed.sort_by(|a, b| b.2.cmp(&a.2));

    let mut batch = BatchJob::new("Duplicate");
    for (parent, slot, index, item) in placed {
        let mut fragment = doc.extract_fragment(item);
        fragment.strip_fx_ids();
        batch.push(AddObjectJob::from_fragment(fragment, parent, slot, index + 1));
    }
    Some(batch)
}
