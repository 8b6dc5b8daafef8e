//! Integration tests: job history (sd-editor).
//!
//! Drives the Editor façade through a series of edits and checks that undo
//! and redo walk the document back and forth through exactly the same
//! markup.

use pretty_assertions::assert_eq;
use sd_core::{ChangeEvent, PropertyName, Registry};
use sd_editor::job::{BatchJob, InsertPosition, ModifyPropertyJob, RemoveObjectJob};
use sd_editor::{DragSource, DropTarget, Editor, EditorConfig, SelectionGroup};
use std::cell::RefCell;
use std::rc::Rc;

const FIXTURE: &str = include_str!("fixtures/settings_panel.fxml");

fn make_editor() -> Editor {
    Editor::from_markup(FIXTURE, Registry::builtin(), EditorConfig::default()).unwrap()
}

fn record(editor: &mut Editor) -> Rc<RefCell<Vec<ChangeEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let seen = events.clone();
    editor.subscribe(move |e| seen.borrow_mut().push(e.clone()));
    events
}

// ─── Round trips ────────────────────────────────────────────────────────

#[test]
fn fixture_is_canonical() {
    assert_eq!(make_editor().to_markup(), FIXTURE);
}

#[test]
fn undo_redo_walks_through_every_snapshot() {
    let mut editor = make_editor();
    let mut snapshots = vec![editor.to_markup()];

    editor.select_id("refresh");
    editor.set_property("text", "Reload").unwrap();
    snapshots.push(editor.to_markup());

    editor.select_id("apply");
    assert!(editor.delete_selection());
    snapshots.push(editor.to_markup());

    editor.select_id("ok");
    assert!(editor.duplicate_selection());
    snapshots.push(editor.to_markup());

    let grid = editor.document().node_by_fx_id("grid").unwrap();
    editor.select(SelectionGroup::grid(grid, sd_core::GridAxis::Column, [0]));
    assert!(editor.insert_columns(InsertPosition::Before));
    snapshots.push(editor.to_markup());

    let buttons = editor.document().node_by_fx_id("buttons").unwrap();
    let cancel = editor.document().node_by_fx_id("cancel").unwrap();
    let source = DragSource::from_items(vec![cancel], None).unwrap();
    assert!(editor.drop(source, DropTarget::Container { target: buttons, before: None }));
    snapshots.push(editor.to_markup());

    for expected in snapshots.iter().rev().skip(1) {
        assert!(editor.undo().is_some());
        assert_eq!(&editor.to_markup(), expected);
    }
    assert!(!editor.can_undo());

    for expected in snapshots.iter().skip(1) {
        assert!(editor.redo().is_some());
        assert_eq!(&editor.to_markup(), expected);
    }
    assert!(!editor.can_redo());
    editor.document().check_integrity().unwrap();
}

#[test]
fn undo_restores_attribute_order() {
    let mut editor = make_editor();
    let before = editor.to_markup();
    editor.select_id("remember");
    editor.clear_property("GridPane.rowIndex").unwrap();
    assert!(!editor.to_markup().contains("GridPane.rowIndex"));
    editor.undo();
    assert_eq!(editor.to_markup(), before);
}

// ─── Atomicity ──────────────────────────────────────────────────────────

#[test]
fn batch_with_one_blocked_job_changes_nothing() {
    let mut editor = make_editor();
    let before = editor.to_markup();
    let events = record(&mut editor);

    let ok = editor.document().node_by_fx_id("ok").unwrap();
    let root = editor.document().root().unwrap();
    let batch = BatchJob::new("Mixed")
        .with(ModifyPropertyJob::set(ok, PropertyName::new("text"), "Done"))
        .with(RemoveObjectJob::new(root));

    assert!(!editor.push(batch));
    assert_eq!(editor.to_markup(), before);
    assert!(!editor.can_undo());
    assert!(events.borrow().is_empty(), "no notification for a rejected job");
}

#[test]
fn batch_notifies_once_per_event_kind() {
    let mut editor = make_editor();
    let events = record(&mut editor);
    let (cancel, apply) = {
        let doc = editor.document();
        (doc.node_by_fx_id("cancel").unwrap(), doc.node_by_fx_id("apply").unwrap())
    };
    let batch = BatchJob::new("Remove two")
        .with(RemoveObjectJob::new(cancel))
        .with(RemoveObjectJob::new(apply));
    assert!(editor.push(batch));

    let events = events.borrow();
    let structural = events
        .iter()
        .filter(|e| **e == ChangeEvent::StructureChanged)
        .count();
    assert_eq!(structural, 1);
    assert_eq!(events.last(), Some(&ChangeEvent::JobStackChanged { revision: 2 }));
}

#[test]
fn empty_batch_no_undo_entry() {
    let mut editor = make_editor();
    assert!(!editor.push(BatchJob::new("Nothing")));
    assert!(!editor.can_undo());
}

// ─── Stack limits ───────────────────────────────────────────────────────

#[test]
fn max_depth_trims_oldest() {
    let config = EditorConfig {
        max_undo_depth: 2,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_markup(FIXTURE, Registry::builtin(), config).unwrap();
    editor.select_id("heading");
    for text in ["One", "Two", "Three"] {
        editor.set_property("text", text).unwrap();
    }
    assert_eq!(editor.history().undo_depth(), 2);
    editor.undo();
    editor.undo();
    assert!(!editor.can_undo());
    assert!(editor.to_markup().contains(r#"text="One""#));
}

#[test]
fn redo_cleared_by_new_edit() {
    let mut editor = make_editor();
    editor.select_id("heading");
    editor.set_property("text", "A").unwrap();
    editor.undo();
    assert!(editor.can_redo());
    editor.set_property("text", "B").unwrap();
    assert!(!editor.can_redo());
    assert_eq!(editor.history().undo_description().as_deref(), Some("Set text"));
}
