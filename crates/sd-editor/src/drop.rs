//! Drop target negotiation.
//!
//! While a drag is in progress the view asks `accept_drag_source` on every
//! pointer move; that check never touches the document. Only releasing the
//! drag builds a job, and the job goes through the history like any other
//! edit.

use crate::context::EditorContext;
use crate::history::JobManager;
use crate::job::{AddObjectJob, BatchJob, Job, ModifyPropertyJob, ReIndexObjectJob, RemoveObjectJob, UpdateSelectionJob};
use crate::selection::SelectionGroup;
use sd_core::mask::Rejection;
use sd_core::{Accessory, ClassName, Fragment, NodeId, PropertyName};
use thiserror::Error;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSource {
    items: Vec<NodeId>,
    hit: NodeId,
    external: bool,
}

impl DragSource {
    /// Items already in the document. `None` when `items` is empty.
    pub fn from_items(items: Vec<NodeId>, hit: Option<NodeId>) -> Option<Self> {
        let first = *items.first()?;
        let hit = hit.filter(|h| items.contains(h)).unwrap_or(first);
        Some(Self {
            items,
            hit,
            external: false,
        })
    }

    /// The selected objects, with the clicked one as hit item.
    pub fn from_selection(ctx: &EditorContext) -> Option<Self> {
        match ctx.selection.group()? {
            SelectionGroup::Objects(objects) => {
                Self::from_items(objects.items().to_vec(), Some(objects.hit()))
            }
            SelectionGroup::Grid(_) => None,
        }
    }

    /// Objects coming from outside the document, such as a library palette.
    /// They are built as detached nodes right away so drop targets can
    /// check them like any other node.
    pub fn external(ctx: &mut EditorContext, fragments: &[Fragment]) -> Option<Self> {
        let items: Vec<NodeId> = fragments
            .iter()
            .map(|fragment| ctx.document.materialize(fragment))
            .collect();
        let mut source = Self::from_items(items, None)?;
        source.external = true;
        Some(source)
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn hit(&self) -> NodeId {
        self.hit
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    fn single(&self) -> Result<NodeId, DropRefusal> {
        match self.items.as_slice() {
            [item] => Ok(*item),
            _ => Err(DropRefusal::MultipleItems),
        }
    }

    /// Drop external nodes that did not end up in the tree.
    pub fn cancel(self, ctx: &mut EditorContext) {
        if !self.external {
            return;
        }
        for item in self.items {
            if ctx.document.contains(item) && ctx.document.parent(item).is_none() {
                ctx.document.discard(item);
            }
        }
    }
}

/// Why a drop target refused a drag source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropRefusal {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("only a single item can be dropped here")]
    MultipleItems,

    #[error("the root cannot be moved")]
    Root,

    #[error("the items are already there")]
    NoMove,

    #[error("{0} carries no image")]
    NoImage(NodeId),

    #[error("{0} does not display an image")]
    NotAnImageView(NodeId),

    #[error("{0} is not an element of the document")]
    Unknown(NodeId),
}

/// A place something can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A single-valued slot such as `center` or `graphic`.
    Accessory { target: NodeId, kind: Accessory },

    /// The ordered child list of `target`, before the child `before` or at
    /// the end.
    Container { target: NodeId, before: Option<NodeId> },

    /// The image of an image view. The dragged item itself is not inserted;
    /// its image is copied onto the target.
    Image { target: NodeId },
}

fn image_slot() -> PropertyName {
    PropertyName::new("image")
}

impl DropTarget {
    pub fn target(&self) -> NodeId {
        match *self {
            DropTarget::Accessory { target, .. }
            | DropTarget::Container { target, .. }
            | DropTarget::Image { target } => target,
        }
    }

    pub fn accept_drag_source(&self, ctx: &EditorContext, source: &DragSource) -> bool {
        match self.check(ctx, source) {
            Ok(()) => true,
            Err(refusal) => {
                log::debug!("drop on {} refused: {refusal}", self.target());
                false
            }
        }
    }

    /// Side-effect-free acceptance check.
    pub fn check(&self, ctx: &EditorContext, source: &DragSource) -> Result<(), DropRefusal> {
        let target = self.target();
        if !ctx.document.contains(target) {
            return Err(DropRefusal::Unknown(target));
        }
        let root = ctx.document.root();
        // Palette items are detached until dropped; document items must
        // still be in the tree.
        let present = |item: NodeId| {
            if source.external {
                ctx.document.contains(item)
            } else {
                ctx.document.is_attached(item)
            }
        };
        if let Some(item) = source.items.iter().find(|i| !present(**i)) {
            return Err(DropRefusal::Unknown(*item));
        }
        if source.items.iter().any(|i| Some(*i) == root) {
            return Err(DropRefusal::Root);
        }

        match *self {
            DropTarget::Accessory { kind, .. } => {
                let item = source.single()?;
                ctx.mask(target).check_accessory(kind, item)?;
                Ok(())
            }
            DropTarget::Container { .. } => {
                let mask = ctx.mask(target);
                mask.check_sub_components(&source.items)?;
                let Some((current, arranged)) = self.arrangement(ctx, source) else {
                    return Err(DropRefusal::Rejected(Rejection::NotAContainer {
                        target,
                        slot: "sub-component".to_string(),
                    }));
                };
                let all_inside = source.items.iter().all(|i| current.contains(i));
                if all_inside && current == arranged {
                    return Err(DropRefusal::NoMove);
                }
                Ok(())
            }
            DropTarget::Image { .. } => {
                let item = source.single()?;
                if item == target {
                    return Err(DropRefusal::NoMove);
                }
                image_of(ctx, item).ok_or(DropRefusal::NoImage(item))?;
                let accepts = ctx
                    .document
                    .class_of(target)
                    .and_then(|c| ctx.registry.describe(c))
                    .and_then(|d| d.property(&image_slot()))
                    .is_some_and(|p| p.is_object());
                if accepts {
                    Ok(())
                } else {
                    Err(DropRefusal::NotAnImageView(target))
                }
            }
        }
    }

    /// Current sub-components of a container target and the order they
    /// would have after the drop.
    fn arrangement(&self, ctx: &EditorContext, source: &DragSource) -> Option<(Vec<NodeId>, Vec<NodeId>)> {
        let DropTarget::Container { target, before } = *self else {
            return None;
        };
        let slot = ctx.mask(target).sub_component_property()?;
        let current = ctx.document.children(target, &slot).to_vec();
        let mut arranged: Vec<NodeId> = current
            .iter()
            .copied()
            .filter(|c| !source.items.contains(c))
            .collect();

        // Dropping before one of the dragged items means before the first
        // sibling after it that stays put.
        let anchor = before.and_then(|before| {
            let from = current.iter().position(|c| *c == before)?;
            current[from..].iter().copied().find(|c| !source.items.contains(c))
        });
        let at = anchor
            .and_then(|a| arranged.iter().position(|c| *c == a))
            .unwrap_or(arranged.len());
        arranged.splice(at..at, source.items.iter().copied());
        Some((current, arranged))
    }

    /// Build the job performing the drop, or `None` when the source is not
    /// acceptable. The job also selects what `selection_after_drop` says.
    pub fn make_drop_job(&self, ctx: &EditorContext, source: &DragSource) -> Option<BatchJob> {
        if !self.accept_drag_source(ctx, source) {
            return None;
        }
        let mut batch = BatchJob::new("Drop");
        match *self {
            DropTarget::Accessory { target, kind } => {
                let item = source.single().ok()?;
                if ctx.document.parent(item).is_some() {
                    batch.push(RemoveObjectJob::new(item));
                }
                batch.push(AddObjectJob::new(item, target, kind.property(), 0));
                let border = ctx
                    .document
                    .class_of(target)
                    .is_some_and(|c| ctx.registry.is_subclass(c, ClassName::of("BorderPane")));
                if border {
                    batch.push(ModifyPropertyJob::set(
                        item,
                        PropertyName::resided("BorderPane", "alignment"),
                        "CENTER",
                    ));
                }
            }
            DropTarget::Container { target, .. } => {
                let (current, arranged) = self.arrangement(ctx, source)?;
                let slot = ctx.mask(target).sub_component_property()?;
                if source.items.iter().all(|i| current.contains(i)) {
                    for job in reorder_jobs(&current, &arranged) {
                        batch.push(job);
                    }
                } else {
                    for item in &source.items {
                        if ctx.document.parent(*item).is_some() {
                            batch.push(RemoveObjectJob::new(*item));
                        }
                    }
                    let first = *source.items.first()?;
                    let base = arranged.iter().position(|c| *c == first)?;
                    for (i, item) in source.items.iter().enumerate() {
                        batch.push(AddObjectJob::new(*item, target, slot, base + i));
                    }
                }
            }
            DropTarget::Image { target } => {
                let item = source.single().ok()?;
                let image = image_of(ctx, item)?;
                if let Some(existing) = ctx.document.children(target, &image_slot()).first() {
                    batch.push(RemoveObjectJob::new(*existing));
                }
                let fragment = ctx.document.extract_fragment(image);
                batch.push(AddObjectJob::from_fragment(fragment, target, image_slot(), 0));
            }
        }
        batch.push(UpdateSelectionJob::new(self.selection_after_drop(source)));
        Some(batch)
    }

    /// Selection once the drop is done: the dropped items, except for image
    /// drops where the target is selected instead.
    pub fn selection_after_drop(&self, source: &DragSource) -> Option<SelectionGroup> {
        match *self {
            DropTarget::Image { target } => Some(SelectionGroup::single(target)),
            _ => SelectionGroup::objects(source.items.iter().copied(), Some(source.hit)),
        }
    }
}

/// The image object `item` carries: itself when it is an image, or the
/// image of an image view.
fn image_of(ctx: &EditorContext, item: NodeId) -> Option<NodeId> {
    let class = ctx.document.class_of(item)?;
    if ctx.registry.is_subclass(class, ClassName::of("Image")) {
        return Some(item);
    }
    ctx.document.children(item, &image_slot()).first().copied()
}

/// Reindex jobs turning `current` into `arranged`, a permutation of it.
fn reorder_jobs(current: &[NodeId], arranged: &[NodeId]) -> Vec<ReIndexObjectJob> {
    let mut working = current.to_vec();
    let mut jobs = Vec::new();
    for (i, node) in arranged.iter().enumerate() {
        if working[i] == *node {
            continue;
        }
        let Some(from) = working.iter().position(|c| c == node) else {
            continue;
        };
        let moved = working.remove(from);
        working.insert(i, moved);
        jobs.push(ReIndexObjectJob::new(*node, i));
    }
    jobs
}

/// One drag gesture, from pick-up to release or cancel.
#[derive(Debug)]
pub struct DragSession {
    source: DragSource,
    target: Option<DropTarget>,
    accepted: bool,
}

impl DragSession {
    pub fn new(source: DragSource) -> Self {
        Self {
            source,
            target: None,
            accepted: false,
        }
    }

    pub fn source(&self) -> &DragSource {
        &self.source
    }

    pub fn target(&self) -> Option<DropTarget> {
        self.target
    }

    /// Move over `target` (or off any target). Returns whether a release
    /// here would be accepted.
    pub fn hover(&mut self, ctx: &EditorContext, target: Option<DropTarget>) -> bool {
        self.target = target;
        self.accepted = target.is_some_and(|t| t.accept_drag_source(ctx, &self.source));
        self.accepted
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Finish the gesture over the last hovered target. Returns whether a
    /// job was pushed.
    pub fn release(self, ctx: &mut EditorContext, history: &mut JobManager) -> bool {
        let pushed = match self.target {
            Some(target) if self.accepted => match target.make_drop_job(ctx, &self.source) {
                Some(job) => history.push(ctx, Box::new(job) as Box<dyn Job>),
                None => false,
            },
            _ => false,
        };
        self.source.cancel(ctx);
        pushed
    }

    /// Abandon the gesture. Nothing is built.
    pub fn cancel(self, ctx: &mut EditorContext) {
        self.source.cancel(ctx);
    }
}
