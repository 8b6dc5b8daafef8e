//! Integration tests: drag and drop (sd-editor).

use pretty_assertions::assert_eq;
use sd_core::{Accessory, Fragment, NodeId, PropertyName, Registry};
use sd_editor::{DragSource, DropTarget, Editor, EditorConfig, SelectionGroup};
use std::cell::RefCell;
use std::rc::Rc;

const FIXTURE: &str = include_str!("fixtures/settings_panel.fxml");

fn make_editor() -> Editor {
    Editor::from_markup(FIXTURE, Registry::builtin(), EditorConfig::default()).unwrap()
}

fn id(editor: &Editor, fx_id: &str) -> NodeId {
    editor.document().node_by_fx_id(fx_id).unwrap()
}

fn children(editor: &Editor, fx_id: &str) -> Vec<NodeId> {
    editor
        .document()
        .children(id(editor, fx_id), &PropertyName::new("children"))
        .to_vec()
}

#[test]
fn same_position_drag_builds_no_job() {
    let mut editor = make_editor();
    let before = editor.to_markup();
    let events = Rc::new(RefCell::new(0));
    let seen = events.clone();
    editor.subscribe(move |_| *seen.borrow_mut() += 1);

    let buttons = id(&editor, "buttons");
    let apply = id(&editor, "apply");
    editor.select(Some(SelectionGroup::single(apply)));
    *events.borrow_mut() = 0;

    let mut session = editor.drag_selection().unwrap();
    let target = DropTarget::Container {
        target: buttons,
        before: Some(id(&editor, "ok")),
    };
    assert!(!editor.hover(&mut session, Some(target)));
    assert!(!editor.release(session));

    assert_eq!(*events.borrow(), 0);
    assert!(!editor.can_undo());
    assert_eq!(editor.to_markup(), before);
}

#[test]
fn hover_tracks_the_latest_target() {
    let mut editor = make_editor();
    editor.select_id("ok");
    let mut session = editor.drag_selection().unwrap();
    let buttons = id(&editor, "buttons");
    let front = DropTarget::Container {
        target: buttons,
        before: Some(id(&editor, "cancel")),
    };
    let heading = DropTarget::Accessory {
        target: editor.document().root().unwrap(),
        kind: Accessory::Top,
    };
    assert!(editor.hover(&mut session, Some(front)));
    assert!(!editor.hover(&mut session, Some(heading)), "top is occupied");
    assert!(!editor.hover(&mut session, None));
    assert!(editor.hover(&mut session, Some(front)));
    assert!(editor.release(session));

    let (cancel, apply, ok) = (id(&editor, "cancel"), id(&editor, "apply"), id(&editor, "ok"));
    assert_eq!(children(&editor, "buttons"), [ok, cancel, apply]);
}

#[test]
fn move_into_grid_and_back() {
    let mut editor = make_editor();
    let before = editor.to_markup();
    editor.select_id("cancel");
    let grid = id(&editor, "grid");
    let source = DragSource::from_selection(editor.context()).unwrap();
    assert!(editor.drop(source, DropTarget::Container { target: grid, before: None }));

    let cancel = id(&editor, "cancel");
    assert_eq!(editor.document().parent(cancel), Some(grid));
    assert_eq!(children(&editor, "buttons").len(), 2);
    assert_eq!(editor.selection(), Some(&SelectionGroup::single(cancel)));

    editor.undo();
    assert_eq!(editor.to_markup(), before);
}

#[test]
fn palette_drop_into_empty_accessory() {
    let mut editor = make_editor();
    let ok = id(&editor, "ok");
    let tooltip = Fragment::instance("Tooltip", editor.registry().resolve_simple_name("Tooltip"))
        .with_text(PropertyName::new("text"), "Confirm");
    let mut session = editor.drag_external(&[tooltip]).unwrap();
    assert!(editor.hover(
        &mut session,
        Some(DropTarget::Accessory {
            target: ok,
            kind: Accessory::Tooltip
        })
    ));
    assert!(editor.release(session));

    let markup = editor.to_markup();
    assert!(markup.contains("<tooltip>"), "{markup}");
    assert!(markup.contains(r#"<Tooltip text="Confirm"/>"#));

    editor.undo();
    assert!(!editor.to_markup().contains("<tooltip>"));
}

#[test]
fn cancelled_palette_drag_leaves_no_trace() {
    let mut editor = make_editor();
    let nodes_before = editor.document().graph.node_count();
    let button = Fragment::instance("Button", editor.registry().resolve_simple_name("Button"));
    let session = editor.drag_external(&[button]).unwrap();
    assert_eq!(editor.document().graph.node_count(), nodes_before + 1);
    editor.cancel_drag(session);
    assert_eq!(editor.document().graph.node_count(), nodes_before);
    assert!(!editor.can_undo());
}

#[test]
fn multi_selection_ancestor_is_shared_container() {
    let mut editor = make_editor();
    let (quota, refresh, ok) = (id(&editor, "quota"), id(&editor, "refresh"), id(&editor, "ok"));
    let grid = id(&editor, "grid");
    let root = editor.document().root().unwrap();

    editor.select(SelectionGroup::objects([quota, refresh], None));
    assert_eq!(editor.context().selection.ancestor(editor.document()), Some(grid));
    assert_eq!(editor.document().depth(grid), 1);

    editor.select(SelectionGroup::objects([quota, ok], None));
    assert_eq!(editor.context().selection.ancestor(editor.document()), Some(root));

    // A container and one of its children: the child's parent is the
    // container, whose own parent is the root.
    editor.select(SelectionGroup::objects([grid, quota], None));
    assert_eq!(editor.context().selection.ancestor(editor.document()), Some(root));
}
