//! Selection model.
//!
//! A selection is either a set of objects or a set of rows/columns of one
//! grid. Groups are immutable values: changing the selection means replacing
//! the group, never editing it in place.

use sd_core::mask::HierarchyMask;
use sd_core::metadata::{GridAxis, Registry};
use sd_core::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selected objects, in selection order, with the item the user clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSelection {
    items: Vec<NodeId>,
    hit: NodeId,
}

impl ObjectSelection {
    /// `None` when `items` is empty. Duplicates are dropped; a `hit` outside
    /// the items falls back to the first item.
    pub fn new(items: impl IntoIterator<Item = NodeId>, hit: Option<NodeId>) -> Option<Self> {
        let mut unique: Vec<NodeId> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        let first = *unique.first()?;
        let hit = hit.filter(|h| unique.contains(h)).unwrap_or(first);
        Some(Self { items: unique, hit })
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn hit(&self) -> NodeId {
        self.hit
    }
}

/// Selected lines of one grid container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSelection {
    target: NodeId,
    axis: GridAxis,
    indexes: BTreeSet<usize>,
}

impl GridSelection {
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn axis(&self) -> GridAxis {
        self.axis
    }

    pub fn indexes(&self) -> &BTreeSet<usize> {
        &self.indexes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionGroup {
    Objects(ObjectSelection),
    Grid(GridSelection),
}

impl SelectionGroup {
    pub fn single(node: NodeId) -> Self {
        SelectionGroup::Objects(ObjectSelection {
            items: vec![node],
            hit: node,
        })
    }

    pub fn objects(items: impl IntoIterator<Item = NodeId>, hit: Option<NodeId>) -> Option<Self> {
        ObjectSelection::new(items, hit).map(SelectionGroup::Objects)
    }

    /// `None` when `indexes` is empty.
    pub fn grid(target: NodeId, axis: GridAxis, indexes: impl IntoIterator<Item = usize>) -> Option<Self> {
        let indexes: BTreeSet<usize> = indexes.into_iter().collect();
        (!indexes.is_empty()).then_some(SelectionGroup::Grid(GridSelection {
            target,
            axis,
            indexes,
        }))
    }

    /// Selected objects; empty for grid groups.
    pub fn items(&self) -> &[NodeId] {
        match self {
            SelectionGroup::Objects(objects) => objects.items(),
            SelectionGroup::Grid(_) => &[],
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match self {
            SelectionGroup::Objects(objects) => objects.items.contains(&node),
            SelectionGroup::Grid(grid) => grid.target == node,
        }
    }

    /// Closest node containing the whole group.
    ///
    /// For objects, the common ancestor of the items' parents. The root
    /// answers when one of the items is the root, or when the items share no
    /// ancestor (some of them are detached).
    pub fn ancestor(&self, doc: &Document) -> Option<NodeId> {
        let items = match self {
            SelectionGroup::Grid(grid) => return Some(grid.target),
            SelectionGroup::Objects(objects) => &objects.items,
        };
        let root = doc.root()?;
        if items.contains(&root) {
            return Some(root);
        }
        let mut parents = items.iter().map(|item| doc.parent(*item));
        let Some(mut common) = parents.next().flatten() else {
            return Some(root);
        };
        for parent in parents {
            let Some(ancestor) = parent.and_then(|p| doc.common_ancestor(common, p)) else {
                return Some(root);
            };
            common = ancestor;
        }
        Some(common)
    }

    /// The group restricted to what still exists in `doc`, or `None` when
    /// nothing is left.
    pub fn revalidated(&self, doc: &Document, registry: &Registry) -> Option<SelectionGroup> {
        match self {
            SelectionGroup::Objects(objects) => SelectionGroup::objects(
                objects.items.iter().copied().filter(|n| doc.is_attached(*n)),
                Some(objects.hit),
            ),
            SelectionGroup::Grid(grid) => {
                if !doc.is_attached(grid.target) {
                    return None;
                }
                let mask = HierarchyMask::new(doc, registry, grid.target);
                if !mask.is_grid() {
                    return None;
                }
                let count = mask.line_count(grid.axis);
                SelectionGroup::grid(
                    grid.target,
                    grid.axis,
                    grid.indexes.iter().copied().filter(|i| *i < count),
                )
            }
        }
    }
}

enum Step {
    Object(NodeId),
    Line(NodeId, GridAxis, usize),
}

/// The current selection and a counter bumped on every change.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    group: Option<SelectionGroup>,
    revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self) -> Option<&SelectionGroup> {
        self.group.as_ref()
    }

    /// Returns false (and leaves the revision alone) when nothing changed.
    pub fn replace(&mut self, group: Option<SelectionGroup>) -> bool {
        if self.group == group {
            return false;
        }
        self.group = group;
        self.revision += 1;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.replace(None)
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_none()
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.group.as_ref().is_some_and(|g| g.contains(node))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn ancestor(&self, doc: &Document) -> Option<NodeId> {
        self.group.as_ref().and_then(|g| g.ancestor(doc))
    }

    pub fn revalidated(&self, doc: &Document, registry: &Registry) -> Option<SelectionGroup> {
        self.group.as_ref().and_then(|g| g.revalidated(doc, registry))
    }

    /// The one selected object or grid line, if exactly one is selected.
    fn single_item(&self) -> Option<Step> {
        match self.group.as_ref()? {
            SelectionGroup::Objects(objects) => match objects.items.as_slice() {
                [item] => Some(Step::Object(*item)),
                _ => None,
            },
            SelectionGroup::Grid(grid) if grid.indexes.len() == 1 => {
                let index = *grid.indexes.first()?;
                Some(Step::Line(grid.target, grid.axis, index))
            }
            SelectionGroup::Grid(_) => None,
        }
    }

    /// The sibling (or grid line) before the single selected item. `None`
    /// when several items are selected or there is nothing before it.
    pub fn previous_group(&self, doc: &Document) -> Option<SelectionGroup> {
        match self.single_item()? {
            Step::Object(item) => doc.previous_sibling(item).map(SelectionGroup::single),
            Step::Line(target, axis, index) => SelectionGroup::grid(target, axis, [index.checked_sub(1)?]),
        }
    }

    /// The sibling (or grid line) after the single selected item.
    pub fn next_group(&self, doc: &Document, registry: &Registry) -> Option<SelectionGroup> {
        match self.single_item()? {
            Step::Object(item) => doc.next_sibling(item).map(SelectionGroup::single),
            Step::Line(target, axis, index) => {
                let count = HierarchyMask::new(doc, registry, target).line_count(axis);
                if index + 1 < count {
                    SelectionGroup::grid(target, axis, [index + 1])
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::PropertyName;
    use sd_core::resolve::RegistryResolver;

    const NESTED: &str = r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<VBox>
  <HBox>
    <Button fx:id="a"/>
    <VBox>
      <Button fx:id="b"/>
    </VBox>
  </HBox>
  <Label fx:id="c"/>
</VBox>"#;

    fn load() -> (Document, Registry) {
        let registry = Registry::builtin();
        let doc = Document::load(NESTED, &registry, &RegistryResolver::new(&registry)).unwrap();
        (doc, registry)
    }

    fn id(doc: &Document, fx_id: &str) -> NodeId {
        doc.node_by_fx_id(fx_id).unwrap()
    }

    #[test]
    fn object_groups_dedupe_and_fix_hit() {
        let a = NodeId::intern("sel_a");
        let b = NodeId::intern("sel_b");
        let group = ObjectSelection::new([a, b, a], Some(NodeId::intern("other"))).unwrap();
        assert_eq!(group.items(), &[a, b]);
        assert_eq!(group.hit(), a);
        assert!(ObjectSelection::new([], None).is_none());
        assert!(SelectionGroup::grid(a, GridAxis::Row, []).is_none());
    }

    #[test]
    fn ancestor_of_nested_items() {
        let (doc, _) = load();
        let hbox = doc.parent(id(&doc, "a")).unwrap();
        let group = SelectionGroup::objects([id(&doc, "a"), id(&doc, "b")], None).unwrap();
        // Parents are the HBox and the inner VBox; their common ancestor is
        // the HBox at depth 1.
        assert_eq!(group.ancestor(&doc), Some(hbox));
        assert_eq!(doc.depth(hbox), 1);

        let root = doc.root().unwrap();
        let with_root = SelectionGroup::objects([root, id(&doc, "c")], None).unwrap();
        assert_eq!(with_root.ancestor(&doc), Some(root));

        let single = SelectionGroup::single(id(&doc, "c"));
        assert_eq!(single.ancestor(&doc), Some(root));
    }

    const DEEP: &str = r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<VBox>
  <HBox fx:id="shared">
    <VBox>
      <HBox>
        <VBox>
          <Button fx:id="deep"/>
        </VBox>
      </HBox>
    </VBox>
    <Label fx:id="shallow"/>
  </HBox>
  <Label fx:id="outside"/>
</VBox>"#;

    #[test]
    fn ancestor_of_leaves_at_uneven_depths() {
        let registry = Registry::builtin();
        let doc = Document::load(DEEP, &registry, &RegistryResolver::new(&registry)).unwrap();
        let (deep, shallow, shared) = (id(&doc, "deep"), id(&doc, "shallow"), id(&doc, "shared"));
        assert_eq!((doc.depth(deep), doc.depth(shallow)), (5, 2));

        for items in [[deep, shallow], [shallow, deep]] {
            let group = SelectionGroup::objects(items, None).unwrap();
            assert_eq!(group.ancestor(&doc), Some(shared));
        }
        assert_eq!(doc.depth(shared), 1);

        let wider = SelectionGroup::objects([deep, id(&doc, "outside")], None).unwrap();
        assert_eq!(wider.ancestor(&doc), doc.root());
    }

    #[test]
    fn replace_bumps_revision_only_on_change() {
        let mut selection = Selection::new();
        let node = NodeId::intern("sel_node");
        assert!(selection.replace(Some(SelectionGroup::single(node))));
        assert!(!selection.replace(Some(SelectionGroup::single(node))));
        assert_eq!(selection.revision(), 1);
        assert!(selection.is_selected(node));
        assert!(selection.clear());
        assert!(selection.is_empty());
    }

    #[test]
    fn sibling_navigation() {
        let (doc, registry) = load();
        let mut selection = Selection::new();
        let hbox = doc.parent(id(&doc, "a")).unwrap();
        selection.replace(Some(SelectionGroup::single(hbox)));
        assert_eq!(
            selection.next_group(&doc, &registry),
            Some(SelectionGroup::single(id(&doc, "c")))
        );
        assert_eq!(selection.previous_group(&doc), None);

        selection.replace(SelectionGroup::objects([hbox, id(&doc, "c")], None));
        assert_eq!(selection.next_group(&doc, &registry), None, "needs a single item");
    }

    #[test]
    fn revalidation_drops_detached_items() {
        let (mut doc, registry) = load();
        let (a, c) = (id(&doc, "a"), id(&doc, "c"));
        let group = SelectionGroup::objects([a, c], Some(c)).unwrap();
        doc.remove_child(c);
        assert_eq!(group.revalidated(&doc, &registry), Some(SelectionGroup::single(a)));

        let root = doc.root().unwrap();
        let grid = SelectionGroup::grid(root, GridAxis::Column, [0]).unwrap();
        assert_eq!(grid.revalidated(&doc, &registry), None, "not a grid");
        assert_eq!(doc.children(root, &PropertyName::new("children")).len(), 1);
    }
}
