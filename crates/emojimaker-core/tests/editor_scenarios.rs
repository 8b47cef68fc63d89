//! End-to-end editor scenarios driven through the public API.

use std::sync::Arc;

use emojimaker_core::input::{DragData, DroppedFile};
use emojimaker_core::storage::keys;
use emojimaker_core::{
    DragEvent, Editor, Element, History, MAX_HISTORY, MemoryStorage, MouseButton,
    PointerEvent, Storage, VisualStyle,
};
use kurbo::Point;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor() -> Editor<MemoryStorage> {
    init_logging();
    Editor::boot(Arc::new(MemoryStorage::new()))
}

fn down(x: f64, y: f64) -> PointerEvent {
    PointerEvent::Down {
        position: Point::new(x, y),
        button: MouseButton::Left,
    }
}

fn up(x: f64, y: f64) -> PointerEvent {
    PointerEvent::Up {
        position: Point::new(x, y),
        button: MouseButton::Left,
    }
}

#[test]
fn test_drag_snaps_to_centered_element() {
    let mut editor = editor();
    editor.set_container_size(400.0, 400.0);
    editor.toggle_snapping();

    editor
        .add_element(
            Element::text("anchor")
                .with_size(100.0, 100.0)
                .with_center(Point::new(200.0, 200.0)),
        )
        .unwrap();
    let mover = editor
        .add_element(
            Element::text("mover")
                .with_size(40.0, 40.0)
                .with_center(Point::new(100.0, 100.0)),
        )
        .unwrap();
    let before = editor.history().len();

    assert!(editor.handle_pointer(down(100.0, 100.0)));
    assert!(editor.handle_pointer(PointerEvent::Move {
        position: Point::new(205.0, 199.0),
    }));
    assert!(!editor.interaction().active_guidelines().is_empty());

    assert!(editor.handle_pointer(up(205.0, 199.0)));
    let element = editor.canvas().store.get(mover).unwrap();
    assert_eq!(element.center_in(editor.container_size()), Point::new(200.0, 200.0));
    assert_eq!(element.initial_center, Point::new(200.0, 200.0));
    assert_eq!(editor.history().len(), before + 1);
    assert!(editor.interaction().active_guidelines().is_empty());
}

#[test]
fn test_history_keeps_last_fifty_states() {
    init_logging();
    let mut history = History::new();
    let mut element = Element::text("0");
    let mut states = Vec::new();
    for i in 0..60 {
        element.content = i.to_string();
        states.push(vec![element.clone()]);
        assert!(history.commit(&states[i]));
    }

    assert_eq!(history.len(), MAX_HISTORY);
    assert_eq!(history.cursor(), 49);

    let mut oldest = None;
    while let Some(elements) = history.undo() {
        oldest = Some(elements);
    }
    assert_eq!(oldest.as_ref(), Some(&states[10]));
    assert_eq!(history.cursor(), 0);
}

#[test]
fn test_undo_without_history_is_noop() {
    let mut editor = editor();
    assert!(!editor.undo());
    assert_eq!(editor.history().len(), 1);
    assert_eq!(editor.history().cursor(), 0);
}

#[test]
fn test_boot_recovers_well_formed_entries() {
    init_logging();
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            keys::ELEMENTS,
            r#"[{"id":"0b8f3c2e-5d1a-4f6b-9c7e-2a4d6f8b0c1e","type":"text","content":"hi"}, 42]"#,
        )
        .unwrap();

    let editor = Editor::boot(storage);
    assert_eq!(editor.elements().len(), 1);
    assert_eq!(editor.elements()[0].content, "hi");
    assert_eq!(editor.elements()[0].style, VisualStyle::default());
}

#[test]
fn test_click_without_move_records_nothing() {
    let mut editor = editor();
    editor.add_element(Element::text("x").with_size(40.0, 40.0)).unwrap();
    let before = editor.history().len();

    assert!(editor.handle_pointer(down(200.0, 200.0)));
    assert!(!editor.handle_pointer(up(200.0, 200.0)));
    assert_eq!(editor.history().len(), before);
}

#[test]
fn test_drag_leave_on_edge_ends_hover() {
    let mut editor = editor();
    editor.handle_drag(
        &DragEvent::Enter {
            position: Point::new(10.0, 10.0),
        },
        false,
    );
    assert!(editor.interaction().is_drop_target_active());

    // Still inside: hovering a child, not a real leave.
    editor.handle_drag(
        &DragEvent::Leave {
            position: Point::new(50.0, 50.0),
        },
        false,
    );
    assert!(editor.interaction().is_drop_target_active());

    editor.handle_drag(
        &DragEvent::Leave {
            position: Point::new(0.0, 50.0),
        },
        false,
    );
    assert!(editor.interaction().is_idle());
}

#[test]
fn test_drop_ignored_under_confirmation_dialog() {
    let mut editor = editor();
    let file = DroppedFile {
        name: "a.png".to_string(),
        mime: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
    };
    editor.handle_drag(
        &DragEvent::Enter {
            position: Point::new(10.0, 10.0),
        },
        true,
    );
    let added = editor.handle_drag(
        &DragEvent::Drop {
            position: Point::new(10.0, 10.0),
            data: DragData::files(vec![file]),
        },
        true,
    );
    assert!(added.is_empty());
    assert!(editor.elements().is_empty());
}

#[test]
fn test_editing_element_cannot_be_dragged() {
    let mut editor = editor();
    let id = editor.add_element(Element::text("x").with_size(40.0, 40.0)).unwrap();
    assert!(editor.enter_text_editing(id));

    assert!(!editor.handle_pointer(down(200.0, 200.0)));
    assert!(editor.interaction().is_idle());
    assert!(editor.begin_layer_drag(0).is_none());
}

#[test]
fn test_layer_drag_reorders_and_records() {
    let mut editor = editor();
    let bottom = editor.add_text("bottom").unwrap();
    let top = editor.add_text("top").unwrap();
    let before = editor.history().len();

    let transfer = editor.begin_layer_drag(0).unwrap();
    assert!(transfer.is_internal && transfer.is_layer_sort);
    assert!(editor.layer_drop(1));

    let order: Vec<_> = editor.elements().iter().map(|e| e.id()).collect();
    assert_eq!(order, vec![top, bottom]);
    assert_eq!(editor.history().len(), before + 1);
    assert!(editor.interaction().is_idle());
}

#[test]
fn test_settings_survive_restart() {
    let mut editor = editor();
    editor.add_text("kept").unwrap();
    editor.toggle_guidelines();
    editor.toggle_other_boundaries();

    let storage = Arc::clone(editor.settings().storage());
    assert_eq!(storage.get(keys::GUIDELINES).unwrap().as_deref(), Some("true"));

    let restarted = Editor::boot(storage);
    assert_eq!(restarted.elements().len(), 1);
    assert_eq!(restarted.elements()[0].content, "kept");
    assert!(restarted.assist().show_guidelines);
    assert!(!restarted.assist().enable_snapping);
    assert!(restarted.assist().show_other_boundaries);
    assert_eq!(restarted.history().len(), 1);
}

#[test]
fn test_click_away_keeps_text_edit_after_restart() {
    let mut editor = editor();
    let id = editor.add_element(Element::text("old").with_size(40.0, 40.0)).unwrap();
    let before = editor.history().len();

    assert!(editor.enter_text_editing(id));
    assert!(editor.edit_text("new"));
    editor.handle_pointer(down(5.0, 5.0));
    editor.handle_pointer(up(5.0, 5.0));

    assert_eq!(editor.history().len(), before + 1);
    assert!(editor.canvas().selected().is_none());

    let restarted = Editor::boot(Arc::clone(editor.settings().storage()));
    assert_eq!(restarted.elements()[0].content, "new");
}

#[test]
fn test_cancelled_os_drag_does_not_block_canvas_drag() {
    let mut editor = editor();
    let id = editor.add_element(Element::text("x").with_size(40.0, 40.0)).unwrap();
    editor.clear_selection();

    editor.handle_drag(
        &DragEvent::Enter {
            position: Point::new(100.0, 100.0),
        },
        false,
    );
    editor.handle_drag(
        &DragEvent::Leave {
            position: Point::new(100.0, 100.0),
        },
        false,
    );

    assert!(editor.handle_pointer(down(200.0, 200.0)));
    assert_eq!(editor.interaction().dragged_element(), Some(id));
}

#[test]
fn test_hidden_element_cannot_be_grabbed() {
    let mut editor = editor();
    let id = editor.add_element(Element::text("x").with_size(40.0, 40.0)).unwrap();
    editor.clear_selection();
    editor.set_visible(id, false);

    assert!(!editor.handle_pointer(down(200.0, 200.0)));
    assert!(editor.canvas().selected().is_none());
    assert!(editor.interaction().is_idle());
}
