//! Editing context shared by jobs: the document, its selection and the
//! registry describing the classes in it.

use crate::selection::{Selection, SelectionGroup};
use sd_core::mask::HierarchyMask;
use sd_core::metadata::{ClassName, GridExtent, Registry, ValidationContext};
use sd_core::{ChangeEvent, Document, NodeId};

#[derive(Debug, Default)]
pub struct EditorContext {
    pub document: Document,
    pub selection: Selection,
    pub registry: Registry,
}

impl EditorContext {
    pub fn new(registry: Registry) -> Self {
        Self {
            document: Document::new(),
            selection: Selection::new(),
            registry,
        }
    }

    pub fn with_document(registry: Registry, document: Document) -> Self {
        Self {
            document,
            selection: Selection::new(),
            registry,
        }
    }

    /// Replace the selection. Items no longer in the tree are dropped from
    /// `group` first, so the selection never holds detached nodes. Posts one
    /// `SelectionChanged` when the group actually changed.
    pub fn select(&mut self, group: Option<SelectionGroup>) -> bool {
        let group = group.and_then(|g| g.revalidated(&self.document, &self.registry));
        let changed = self.selection.replace(group);
        if changed {
            self.document.notify(ChangeEvent::SelectionChanged);
        }
        changed
    }

    /// Drop selected items that are no longer part of the tree.
    pub fn revalidate_selection(&mut self) -> bool {
        let group = self.selection.revalidated(&self.document, &self.registry);
        self.select(group)
    }

    pub fn mask(&self, node: NodeId) -> HierarchyMask<'_> {
        HierarchyMask::new(&self.document, &self.registry, node)
    }

    pub fn parent_class(&self, node: NodeId) -> Option<ClassName> {
        self.document
            .parent(node)
            .and_then(|p| self.document.class_of(p))
    }

    /// Grid bounds for index validation, taken from the grid that contains
    /// the current selection.
    pub fn grid_extent(&self) -> Option<GridExtent> {
        let container = match self.selection.group()? {
            SelectionGroup::Grid(grid) => grid.target(),
            SelectionGroup::Objects(_) => self.selection.ancestor(&self.document)?,
        };
        self.mask(container).grid_extent()
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            grid: self.grid_extent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::PropertyName;
    use sd_core::resolve::RegistryResolver;
    use std::cell::Cell;
    use std::rc::Rc;

    fn context(markup: &str) -> EditorContext {
        let registry = Registry::builtin();
        let doc = Document::load(markup, &registry, &RegistryResolver::new(&registry)).unwrap();
        EditorContext::with_document(registry, doc)
    }

    #[test]
    fn select_notifies_once_per_change() {
        let mut ctx = context("<?import javafx.scene.layout.*?><VBox><Pane/></VBox>");
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        ctx.document.subscribe(move |event| {
            if *event == ChangeEvent::SelectionChanged {
                seen.set(seen.get() + 1);
            }
        });
        let root = ctx.document.root().unwrap();
        assert!(ctx.select(Some(SelectionGroup::single(root))));
        assert!(!ctx.select(Some(SelectionGroup::single(root))));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn select_drops_detached_items() {
        let mut ctx = context("<?import javafx.scene.layout.*?><VBox><Pane/><Pane/></VBox>");
        let root = ctx.document.root().unwrap();
        let panes = ctx.document.children(root, &PropertyName::new("children")).to_vec();
        ctx.document.remove_child(panes[1]);

        assert!(ctx.select(SelectionGroup::objects(panes.clone(), None)));
        assert_eq!(ctx.selection.group(), Some(&SelectionGroup::single(panes[0])));
        assert!(ctx.select(Some(SelectionGroup::single(panes[1]))));
        assert!(ctx.selection.is_empty());
    }

    #[test]
    fn grid_extent_follows_selection() {
        let mut ctx = context(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<GridPane>
  <Label GridPane.columnIndex="2"/>
  <Label GridPane.rowIndex="1"/>
</GridPane>"#,
        );
        assert_eq!(ctx.validation_context().grid, None);

        let root = ctx.document.root().unwrap();
        let label = ctx.document.children(root, &PropertyName::new("children"))[0];
        ctx.select(Some(SelectionGroup::single(label)));
        assert_eq!(ctx.grid_extent(), Some(GridExtent { columns: 3, rows: 2 }));

        ctx.select(None);
        assert_eq!(ctx.grid_extent(), None);
    }
}
