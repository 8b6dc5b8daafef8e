//! Document object model for SD documents.
//!
//! The document is a tree of `DocNode` values stored in a petgraph
//! `StableDiGraph`. Edges go parent → child and carry the slot (property)
//! the child lives in; the order of children within a slot is the order of
//! the `PropertyValue::Nodes` list on the parent.
//!
//! Detached nodes stay in the graph with no incoming edge. That keeps a
//! removed subtree and its `NodeId`s intact, so undo can put it back exactly
//! where it was. `discard` drops a detached subtree for good.

use crate::error::LoadError;
use crate::id::NodeId;
use crate::metadata::{ClassName, PropertyName, Registry};
use crate::notify::{ChangeEvent, ChangeSubject, SubscriptionId};
use crate::resolve::TypeResolver;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Markup directives that are not component instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    Include,
    /// `fx:root`: an instance of its `type` attribute supplied by the
    /// controller at runtime.
    Root,
    Reference,
    Copy,
}

impl Intrinsic {
    pub fn tag(self) -> &'static str {
        match self {
            Intrinsic::Include => "fx:include",
            Intrinsic::Root => "fx:root",
            Intrinsic::Reference => "fx:reference",
            Intrinsic::Copy => "fx:copy",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "fx:include" => Some(Intrinsic::Include),
            "fx:root" => Some(Intrinsic::Root),
            "fx:reference" => Some(Intrinsic::Reference),
            "fx:copy" => Some(Intrinsic::Copy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// An ordinary component instance.
    Instance,
    Intrinsic(Intrinsic),
    /// A simple value written as `fx:value` or as element text.
    Value { text: String },
}

/// Content of one property of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    /// Ordered child list. Positions are contiguous and zero based.
    Nodes(SmallVec<[NodeId; 4]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Type as written in the markup (`Button`, `javafx.scene.control.Button`).
    pub type_name: String,
    /// Resolved class; `None` when the type could not be resolved.
    pub class: Option<ClassName>,
    pub fx_id: Option<String>,
    pub controller: Option<String>,
    pub properties: IndexMap<PropertyName, PropertyValue>,
}

impl DocNode {
    pub fn new(id: NodeId, kind: NodeKind, type_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            type_name: type_name.into(),
            class: None,
            fx_id: None,
            controller: None,
            properties: IndexMap::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.class.is_some()
    }

    pub fn text(&self, name: &PropertyName) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn nodes(&self, name: &PropertyName) -> &[NodeId] {
        match self.properties.get(name) {
            Some(PropertyValue::Nodes(list)) => list,
            _ => &[],
        }
    }
}

// ─── Fragments ───────────────────────────────────────────────────────────

/// Document-independent copy of a subtree, used for clipboard payloads,
/// external drags and freshly created objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: NodeKind,
    pub type_name: String,
    pub class: Option<ClassName>,
    pub fx_id: Option<String>,
    pub controller: Option<String>,
    pub properties: IndexMap<PropertyName, FragmentValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentValue {
    Text(String),
    Nodes(Vec<Fragment>),
}

impl Fragment {
    pub fn instance(type_name: &str, class: Option<ClassName>) -> Self {
        Self {
            kind: NodeKind::Instance,
            type_name: type_name.to_string(),
            class,
            fx_id: None,
            controller: None,
            properties: IndexMap::new(),
        }
    }

    pub fn with_text(mut self, name: PropertyName, value: &str) -> Self {
        self.properties.insert(name, FragmentValue::Text(value.to_string()));
        self
    }

    pub fn with_child(mut self, slot: PropertyName, child: Fragment) -> Self {
        match self
            .properties
            .entry(slot)
            .or_insert_with(|| FragmentValue::Nodes(Vec::new()))
        {
            FragmentValue::Nodes(list) => list.push(child),
            other => *other = FragmentValue::Nodes(vec![child]),
        }
        self
    }

    /// Drop `fx:id`s throughout, so pasted copies do not clash with the
    /// originals.
    pub fn strip_fx_ids(&mut self) {
        self.fx_id = None;
        for value in self.properties.values_mut() {
            if let FragmentValue::Nodes(list) = value {
                list.iter_mut().for_each(Fragment::strip_fx_ids);
            }
        }
    }
}

/// Where a node was before `remove_child` detached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detachment {
    pub parent: NodeId,
    pub slot: PropertyName,
    pub index: usize,
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete SD document.
#[derive(Debug, Default)]
pub struct Document {
    /// Parent → child edges, weighted by the slot the child occupies.
    pub graph: StableDiGraph<DocNode, PropertyName>,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    root: Option<NodeId>,

    /// `<?import ...?>` targets in document order.
    pub imports: Vec<String>,

    /// `xmlns` declarations of the root element.
    pub namespaces: IndexMap<String, String>,

    subject: ChangeSubject,
}

impl Document {
    /// Create an empty document with no root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse markup into a document. Types the resolver cannot place are
    /// kept as unresolved nodes.
    pub fn load(
        text: &str,
        registry: &Registry,
        resolver: &dyn TypeResolver,
    ) -> Result<Self, LoadError> {
        crate::parser::load_document(text, registry, resolver)
    }

    /// Take over the tree of `other`, keeping this document's listeners.
    pub fn replace(&mut self, other: Document) {
        self.graph = other.graph;
        self.id_index = other.id_index;
        self.root = other.root;
        self.imports = other.imports;
        self.namespaces = other.namespaces;
        self.subject.post(ChangeEvent::DocumentReplaced);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        if let Some(id) = root {
            assert!(self.contains(id), "unknown node {id}");
            assert!(self.parent(id).is_none(), "root {id} must be detached");
        }
        self.root = root;
        self.subject.post(ChangeEvent::StructureChanged);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&DocNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    fn index_of(&self, id: NodeId) -> NodeIndex {
        match self.id_index.get(&id) {
            Some(idx) => *idx,
            None => panic!("unknown node {id}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut DocNode {
        let idx = self.index_of(id);
        &mut self.graph[idx]
    }

    pub fn class_of(&self, id: NodeId) -> Option<ClassName> {
        self.node(id).and_then(|n| n.class)
    }

    /// Node carrying `fx_id` in the tree. Detached subtrees are not searched.
    pub fn node_by_fx_id(&self, fx_id: &str) -> Option<NodeId> {
        self.graph
            .node_weights()
            .filter(|n| n.fx_id.as_deref() == Some(fx_id))
            .map(|n| n.id)
            .find(|id| self.is_attached(*id))
    }

    /// Add a detached node. Used by the loader and by `materialize`.
    pub fn create_node(&mut self, node: DocNode) -> NodeId {
        let id = node.id;
        assert!(!self.contains(id), "duplicate node {id}");
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        id
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let idx = *self.id_index.get(&id)?;
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .next()
            .map(|e| self.graph[e.source()].id)
    }

    pub fn parent_slot(&self, id: NodeId) -> Option<PropertyName> {
        let idx = *self.id_index.get(&id)?;
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .next()
            .map(|e| *e.weight())
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        let slot = self.parent_slot(id)?;
        self.children(parent, &slot).iter().position(|c| *c == id)
    }

    /// Children of `id` in `slot`, in order.
    pub fn children(&self, id: NodeId, slot: &PropertyName) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.nodes(slot))
    }

    /// Object-valued slots of `id` in property order.
    pub fn slots(&self, id: NodeId) -> Vec<PropertyName> {
        self.node(id).map_or_else(Vec::new, |n| {
            n.properties
                .iter()
                .filter(|(_, v)| matches!(v, PropertyValue::Nodes(_)))
                .map(|(k, _)| *k)
                .collect()
        })
    }

    /// All children of `id` across every slot.
    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map_or_else(Vec::new, |n| {
            n.properties
                .values()
                .filter_map(|v| match v {
                    PropertyValue::Nodes(list) => Some(list.iter().copied()),
                    PropertyValue::Text(_) => None,
                })
                .flatten()
                .collect()
        })
    }

    pub fn text_property(&self, id: NodeId, name: &PropertyName) -> Option<&str> {
        self.node(id)?.text(name)
    }

    /// Position of `name` among the node's properties.
    pub fn property_position(&self, id: NodeId, name: &PropertyName) -> Option<usize> {
        self.node(id)?.properties.get_index_of(name)
    }

    /// Number of ancestors. The root and detached subtree roots are at 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn top(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// True when `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.root.is_some_and(|root| self.top(id) == root)
    }

    /// Strict: a node is not its own ancestor.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut current = descendant;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Nearest node that is `a`, `b`, or an ancestor of both. Walks the
    /// deeper node up to the other's depth, then both in lock step.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let (mut a, mut b) = (a, b);
        let (mut da, mut db) = (self.depth(a), self.depth(b));
        while da > db {
            a = self.parent(a)?;
            da -= 1;
        }
        while db > da {
            b = self.parent(b)?;
            db -= 1;
        }
        while a != b {
            a = self.parent(a)?;
            b = self.parent(b)?;
        }
        Some(a)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let slot = self.parent_slot(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent, &slot)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let slot = self.parent_slot(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent, &slot).get(index + 1).copied()
    }

    /// Every node below `id`, depth first in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_nodes(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.child_nodes(next).into_iter().rev());
        }
        out
    }

    /// Attached nodes whose type did not resolve.
    pub fn unresolved_nodes(&self) -> Vec<NodeId> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|id| self.node(*id).is_some_and(|n| !n.is_resolved()))
            .collect()
    }

    // ─── Notification ────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.subject.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subject.unsubscribe(id)
    }

    pub fn begin_update(&mut self) {
        self.subject.begin_update();
    }

    pub fn end_update(&mut self) {
        self.subject.end_update();
    }

    pub fn notify(&mut self, event: ChangeEvent) {
        self.subject.post(event);
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Set (or with `None`, remove) a text property. Returns the previous
    /// text. New properties are appended after the existing ones.
    pub fn set_text_property(
        &mut self,
        id: NodeId,
        name: PropertyName,
        value: Option<String>,
    ) -> Option<String> {
        let node = self.node_mut(id);
        let previous = match value {
            Some(text) => node.properties.insert(name, PropertyValue::Text(text)),
            None => node.properties.shift_remove(&name),
        };
        let previous = match previous {
            Some(PropertyValue::Text(s)) => Some(s),
            Some(PropertyValue::Nodes(_)) => panic!("{name} on {id} holds objects"),
            None => None,
        };
        self.subject.post(ChangeEvent::PropertyChanged { node: id, property: name });
        previous
    }

    /// Move property `name` to position `to` in the node's property order.
    pub fn move_property(&mut self, id: NodeId, name: &PropertyName, to: usize) {
        let node = self.node_mut(id);
        if let Some(from) = node.properties.get_index_of(name) {
            let to = to.min(node.properties.len() - 1);
            node.properties.move_index(from, to);
        }
    }

    /// Attach a detached `child` to `slot` of `parent` at `index`.
    pub fn add_child(&mut self, parent: NodeId, slot: PropertyName, index: usize, child: NodeId) {
        self.attach(parent, slot, index, child);
        self.subject.post(ChangeEvent::StructureChanged);
    }

    /// `add_child` without notification, for building detached subtrees.
    pub(crate) fn attach(&mut self, parent: NodeId, slot: PropertyName, index: usize, child: NodeId) {
        assert!(self.contains(child), "unknown node {child}");
        assert!(self.parent(child).is_none(), "{child} is already attached");
        assert!(child != parent && !self.is_ancestor_of(child, parent), "{child} would contain itself");
        assert!(self.root != Some(child), "cannot attach the root {child}");

        let node = self.node_mut(parent);
        let list = match node
            .properties
            .entry(slot)
            .or_insert_with(|| PropertyValue::Nodes(SmallVec::new()))
        {
            PropertyValue::Nodes(list) => list,
            PropertyValue::Text(_) => panic!("{slot} on {parent} holds text"),
        };
        assert!(index <= list.len(), "index {index} out of range for {slot} ({} children)", list.len());
        list.insert(index, child);

        let (p, c) = (self.index_of(parent), self.index_of(child));
        self.graph.add_edge(p, c, slot);
    }

    /// Detach `child` from its parent. The subtree stays in the document.
    pub fn remove_child(&mut self, child: NodeId) -> Detachment {
        let c = self.index_of(child);
        let edge = self
            .graph
            .edges_directed(c, petgraph::Direction::Incoming)
            .next()
            .map(|e| (e.id(), e.source(), *e.weight()));
        let Some((edge, p, slot)) = edge else {
            panic!("{child} is not attached");
        };
        let parent = self.graph[p].id;
        self.graph.remove_edge(edge);

        let node = &mut self.graph[p];
        let Some(PropertyValue::Nodes(list)) = node.properties.get_mut(&slot) else {
            panic!("{slot} on {parent} does not list {child}");
        };
        let Some(index) = list.iter().position(|n| *n == child) else {
            panic!("{slot} on {parent} does not list {child}");
        };
        list.remove(index);
        self.subject.post(ChangeEvent::StructureChanged);
        Detachment { parent, slot, index }
    }

    /// Move `child` to `index` within its current slot.
    pub fn reindex_child(&mut self, child: NodeId, index: usize) {
        let (Some(parent), Some(slot)) = (self.parent(child), self.parent_slot(child)) else {
            panic!("{child} is not attached");
        };
        let node = self.node_mut(parent);
        let Some(PropertyValue::Nodes(list)) = node.properties.get_mut(&slot) else {
            panic!("{slot} on {parent} does not list {child}");
        };
        assert!(index < list.len(), "index {index} out of range for {slot} ({} children)", list.len());
        let Some(from) = list.iter().position(|n| *n == child) else {
            panic!("{slot} on {parent} does not list {child}");
        };
        let moved = list.remove(from);
        list.insert(index, moved);
        self.subject.post(ChangeEvent::StructureChanged);
    }

    /// Build a detached subtree from `fragment` and return its root.
    pub fn materialize(&mut self, fragment: &Fragment) -> NodeId {
        let prefix = fragment
            .type_name
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(&fragment.type_name)
            .to_string();
        let id = NodeId::with_prefix(&prefix);
        let mut node = DocNode::new(id, fragment.kind.clone(), fragment.type_name.clone());
        node.class = fragment.class;
        node.fx_id = fragment.fx_id.clone();
        node.controller = fragment.controller.clone();
        self.create_node(node);

        for (name, value) in &fragment.properties {
            match value {
                FragmentValue::Text(text) => {
                    self.node_mut(id)
                        .properties
                        .insert(*name, PropertyValue::Text(text.clone()));
                }
                FragmentValue::Nodes(children) => {
                    self.node_mut(id)
                        .properties
                        .insert(*name, PropertyValue::Nodes(SmallVec::new()));
                    for (i, child) in children.iter().enumerate() {
                        let child = self.materialize(child);
                        self.attach(id, *name, i, child);
                    }
                }
            }
        }
        id
    }

    /// Deep copy of the subtree at `id`.
    pub fn extract_fragment(&self, id: NodeId) -> Fragment {
        let Some(node) = self.node(id) else {
            panic!("unknown node {id}");
        };
        let properties = node
            .properties
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    PropertyValue::Text(text) => FragmentValue::Text(text.clone()),
                    PropertyValue::Nodes(list) => {
                        FragmentValue::Nodes(list.iter().map(|c| self.extract_fragment(*c)).collect())
                    }
                };
                (*name, value)
            })
            .collect();
        Fragment {
            kind: node.kind.clone(),
            type_name: node.type_name.clone(),
            class: node.class,
            fx_id: node.fx_id.clone(),
            controller: node.controller.clone(),
            properties,
        }
    }

    /// Drop a detached subtree from the document.
    pub fn discard(&mut self, id: NodeId) {
        assert!(self.parent(id).is_none(), "cannot discard attached node {id}");
        assert!(self.root != Some(id), "cannot discard the root {id}");
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            if let Some(idx) = self.id_index.remove(&node) {
                self.graph.remove_node(idx);
            }
        }
    }

    /// Verify that every listed child points back at the node listing it,
    /// that no child is listed twice, and that every edge is listed.
    pub fn check_integrity(&self) -> Result<(), String> {
        let mut listed = 0usize;
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            for (slot, value) in &node.properties {
                let PropertyValue::Nodes(list) = value else {
                    continue;
                };
                for (i, child) in list.iter().enumerate() {
                    listed += 1;
                    if list[..i].contains(child) {
                        return Err(format!("{child} is listed twice in {slot} of {}", node.id));
                    }
                    if self.parent(*child) != Some(node.id) {
                        return Err(format!("{child} in {slot} of {} has another parent", node.id));
                    }
                    if self.parent_slot(*child) != Some(*slot) {
                        return Err(format!("{child} in {slot} of {} has another slot", node.id));
                    }
                }
            }
        }
        if listed != self.graph.edge_count() {
            return Err(format!(
                "{} edges but {listed} listed children",
                self.graph.edge_count()
            ));
        }
        Ok(())
    }
}
