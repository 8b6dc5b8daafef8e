//! Hierarchy mask: what a node can contain.
//!
//! A mask is a read-only view over one node, combining the document with the
//! registry's descriptors. It answers which accessory slots the node has,
//! which list takes free-form children, whether candidates may go there, and
//! for grid containers, how many rows and columns there are and what sits in
//! each.

use crate::id::NodeId;
use crate::metadata::{
    Accessory, ClassName, ComponentDescriptor, GridAxis, GridExtent, PropertyKind, PropertyName,
    Registry, Sentinel,
};
use crate::model::Document;
use thiserror::Error;

/// Why a mask refused a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{target} has no {slot} slot")]
    NotAContainer { target: NodeId, slot: String },

    #[error("the {slot} slot of {target} is already occupied")]
    SlotOccupied { target: NodeId, slot: String },

    #[error("{candidate} is not a {accepted}")]
    WrongType {
        candidate: NodeId,
        accepted: &'static str,
    },

    #[error("{0} has an unresolved type")]
    Unresolved(NodeId),

    #[error("{candidate} cannot be placed inside itself")]
    Cycle { candidate: NodeId },
}

/// Cell index of `child` on `axis`, from its `GridPane.*Index` property.
pub fn grid_index(doc: &Document, child: NodeId, axis: GridAxis) -> usize {
    doc.text_property(child, &axis.index_property())
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

/// Cell span of `child` on `axis`. `REMAINING` counts as one line.
pub fn grid_span(doc: &Document, child: NodeId, axis: GridAxis) -> usize {
    match doc.text_property(child, &axis.span_property()) {
        Some(raw) if Sentinel::Remaining.matches(raw.trim()) => 1,
        Some(raw) => raw.trim().parse().unwrap_or(1).max(1),
        None => 1,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HierarchyMask<'a> {
    doc: &'a Document,
    registry: &'a Registry,
    node: NodeId,
    descriptor: Option<&'a ComponentDescriptor>,
}

impl<'a> HierarchyMask<'a> {
    pub fn new(doc: &'a Document, registry: &'a Registry, node: NodeId) -> Self {
        let descriptor = doc.class_of(node).and_then(|c| registry.describe(c));
        Self {
            doc,
            registry,
            node,
            descriptor,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn class(&self) -> Option<ClassName> {
        self.doc.class_of(self.node)
    }

    pub fn is_resolved(&self) -> bool {
        self.descriptor.is_some()
    }

    // ─── Accessories ─────────────────────────────────────────────────────

    pub fn accessories(&self) -> Vec<Accessory> {
        self.descriptor
            .map(|d| d.accessories().map(|(kind, _)| kind).collect())
            .unwrap_or_default()
    }

    pub fn has_accessory(&self, kind: Accessory) -> bool {
        self.descriptor.and_then(|d| d.accessory(kind)).is_some()
    }

    /// Current occupant of the accessory slot.
    pub fn accessory(&self, kind: Accessory) -> Option<NodeId> {
        self.doc
            .children(self.node, &kind.property())
            .first()
            .copied()
    }

    pub fn check_accessory(&self, kind: Accessory, candidate: NodeId) -> Result<(), Rejection> {
        let descriptor = self.descriptor.ok_or(Rejection::Unresolved(self.node))?;
        let slot = descriptor
            .accessory(kind)
            .ok_or_else(|| Rejection::NotAContainer {
                target: self.node,
                slot: kind.property_name().to_string(),
            })?;
        if self.accessory(kind).is_some() {
            return Err(Rejection::SlotOccupied {
                target: self.node,
                slot: kind.property_name().to_string(),
            });
        }
        self.check_candidate(slot.kind, candidate)
    }

    pub fn is_accepting_accessory(&self, kind: Accessory, candidate: NodeId) -> bool {
        self.check_accessory(kind, candidate).is_ok()
    }

    // ─── Sub-components ──────────────────────────────────────────────────

    /// The ordered child list (`children`, `items`, `tabs`...).
    pub fn sub_component_property(&self) -> Option<PropertyName> {
        self.descriptor
            .and_then(|d| d.sub_component_property())
            .map(|p| p.name)
    }

    pub fn sub_components(&self) -> &'a [NodeId] {
        match self.sub_component_property() {
            Some(slot) => self.doc.children(self.node, &slot),
            None => &[],
        }
    }

    pub fn check_sub_components(&self, candidates: &[NodeId]) -> Result<(), Rejection> {
        let descriptor = self.descriptor.ok_or(Rejection::Unresolved(self.node))?;
        let slot = descriptor
            .sub_component_property()
            .ok_or_else(|| Rejection::NotAContainer {
                target: self.node,
                slot: "sub-component".to_string(),
            })?;
        candidates
            .iter()
            .try_for_each(|c| self.check_candidate(slot.kind, *c))
    }

    pub fn is_accepting_sub_component(&self, candidates: &[NodeId]) -> bool {
        self.check_sub_components(candidates).is_ok()
    }

    fn check_candidate(&self, kind: PropertyKind, candidate: NodeId) -> Result<(), Rejection> {
        if candidate == self.node || self.doc.is_ancestor_of(candidate, self.node) {
            return Err(Rejection::Cycle { candidate });
        }
        let class = self
            .doc
            .class_of(candidate)
            .ok_or(Rejection::Unresolved(candidate))?;
        let PropertyKind::Object { accepted, .. } = kind else {
            return Err(Rejection::WrongType {
                candidate,
                accepted: "object",
            });
        };
        if self.registry.is_subclass(class, ClassName::of(accepted)) {
            Ok(())
        } else {
            Err(Rejection::WrongType {
                candidate,
                accepted,
            })
        }
    }

    // ─── Grid ────────────────────────────────────────────────────────────

    pub fn is_grid(&self) -> bool {
        self.class()
            .is_some_and(|c| self.registry.is_subclass(c, ClassName::of("GridPane")))
    }

    /// Constraint objects on `axis`, in line order.
    pub fn grid_constraints(&self, axis: GridAxis) -> &'a [NodeId] {
        self.doc.children(self.node, &axis.constraints_property())
    }

    /// Number of lines: the larger of the constraint count and the
    /// furthest line any child reaches.
    pub fn line_count(&self, axis: GridAxis) -> usize {
        if !self.is_grid() {
            return 0;
        }
        let reached = self
            .sub_components()
            .iter()
            .map(|c| grid_index(self.doc, *c, axis) + grid_span(self.doc, *c, axis))
            .max()
            .unwrap_or(0);
        reached.max(self.grid_constraints(axis).len())
    }

    pub fn column_count(&self) -> usize {
        self.line_count(GridAxis::Column)
    }

    pub fn row_count(&self) -> usize {
        self.line_count(GridAxis::Row)
    }

    /// Children whose cell index on `axis` is `index`.
    pub fn content_at(&self, axis: GridAxis, index: usize) -> Vec<NodeId> {
        self.sub_components()
            .iter()
            .copied()
            .filter(|c| grid_index(self.doc, *c, axis) == index)
            .collect()
    }

    pub fn column_content_at(&self, index: usize) -> Vec<NodeId> {
        self.content_at(GridAxis::Column, index)
    }

    pub fn row_content_at(&self, index: usize) -> Vec<NodeId> {
        self.content_at(GridAxis::Row, index)
    }

    pub fn grid_extent(&self) -> Option<GridExtent> {
        self.is_grid().then(|| GridExtent {
            columns: self.column_count(),
            rows: self.row_count(),
        })
    }
}
