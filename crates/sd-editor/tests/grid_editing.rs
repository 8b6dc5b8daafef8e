//! Integration tests: row and column insertion (sd-editor).

use pretty_assertions::assert_eq;
use sd_core::mask::{HierarchyMask, grid_index};
use sd_core::{GridAxis, NodeId, Registry};
use sd_editor::job::InsertPosition;
use sd_editor::{Editor, EditorConfig, SelectionGroup};

const FIXTURE: &str = include_str!("fixtures/settings_panel.fxml");

fn make_editor() -> Editor {
    Editor::from_markup(FIXTURE, Registry::builtin(), EditorConfig::default()).unwrap()
}

fn id(editor: &Editor, fx_id: &str) -> NodeId {
    editor.document().node_by_fx_id(fx_id).unwrap()
}

fn column_of(editor: &Editor, fx_id: &str) -> usize {
    grid_index(editor.document(), id(editor, fx_id), GridAxis::Column)
}

#[test]
fn insert_column_after_selected_column() {
    let mut editor = make_editor();
    let grid = id(&editor, "grid");
    let before = editor.to_markup();
    {
        let mask = HierarchyMask::new(editor.document(), editor.registry(), grid);
        assert_eq!(mask.column_count(), 3);
    }

    editor.select(SelectionGroup::grid(grid, GridAxis::Column, [1]));
    assert!(editor.insert_columns(InsertPosition::After));

    let mask = HierarchyMask::new(editor.document(), editor.registry(), grid);
    assert_eq!(mask.column_count(), 4);
    assert_eq!(mask.grid_constraints(GridAxis::Column).len(), 4);
    assert_eq!(column_of(&editor, "quota_label"), 0);
    assert_eq!(column_of(&editor, "quota"), 1);
    assert_eq!(column_of(&editor, "remember"), 1);
    assert_eq!(column_of(&editor, "refresh"), 3, "column 2 content moves to column 3");
    assert_eq!(
        editor.selection(),
        SelectionGroup::grid(grid, GridAxis::Column, [2]).as_ref()
    );

    assert_eq!(editor.undo().as_deref(), Some("Insert Column"));
    assert_eq!(editor.to_markup(), before);
}

#[test]
fn insert_after_last_column_shifts_nothing() {
    let mut editor = make_editor();
    let grid = id(&editor, "grid");
    editor.select(SelectionGroup::grid(grid, GridAxis::Column, [2]));
    assert!(editor.insert_columns(InsertPosition::After));

    assert_eq!(column_of(&editor, "refresh"), 2);
    let mask = HierarchyMask::new(editor.document(), editor.registry(), grid);
    assert_eq!(mask.column_count(), 4);
}

#[test]
fn insert_rows_pads_missing_constraints() {
    let mut editor = make_editor();
    let grid = id(&editor, "grid");
    editor.select(Some(SelectionGroup::single(grid)));
    assert!(editor.insert_rows(InsertPosition::Before));

    let mask = HierarchyMask::new(editor.document(), editor.registry(), grid);
    assert_eq!(mask.grid_constraints(GridAxis::Row).len(), 3);
    assert_eq!(mask.row_count(), 3);
    assert_eq!(
        grid_index(editor.document(), id(&editor, "remember"), GridAxis::Row),
        2
    );
    assert!(editor.to_markup().contains("<rowConstraints>"));
}

#[test]
fn column_index_edits_are_bounded_by_the_grid() {
    let mut editor = make_editor();
    editor.select_id("refresh");
    assert!(editor.set_property("GridPane.columnIndex", "3").is_err());
    editor.set_property("GridPane.columnIndex", "0").unwrap();
    assert_eq!(column_of(&editor, "refresh"), 0);

    // Outside a grid the property does not apply.
    editor.select_id("ok");
    assert!(editor.set_property("GridPane.columnIndex", "0").is_err());
}
