use std::thread::sleep;
use std::time::Duration;

use pretty_assertions::assert_eq;
use richtext_engine::keymap::Platform;
use richtext_engine::{Editor, EditorOptions, HistoryOptions, Selection, doc, li, p, ul};

fn editor(batch_delay: Duration) -> Editor {
    Editor::new(EditorOptions {
        history: HistoryOptions {
            batch_delay,
            max_depth: 100,
        },
        platform: Platform::Other,
        ..EditorOptions::default()
    })
    .unwrap()
}

#[test]
fn test_typing_burst_is_one_undo_step() {
    let mut editor = editor(Duration::from_secs(60));
    for ch in ["h", "e", "l", "l", "o"] {
        editor.type_text(ch).unwrap();
    }
    assert_eq!(editor.state().doc(), &doc![p!("hello")]);
    assert_eq!(editor.history().undo_depth(), 1);

    assert!(editor.undo());
    assert_eq!(editor.state().doc(), &doc![p!()]);
    assert_eq!(editor.state().selection(), Selection::cursor(1));
    assert!(!editor.undo());
}

#[test]
fn test_pause_splits_batches() {
    let mut editor = editor(Duration::from_millis(20));
    editor.type_text("one").unwrap();
    sleep(Duration::from_millis(80));
    editor.type_text(" two").unwrap();
    assert_eq!(editor.history().undo_depth(), 2);

    assert!(editor.undo());
    assert_eq!(editor.state().doc(), &doc![p!("one")]);
    assert!(editor.undo());
    assert_eq!(editor.state().doc(), &doc![p!()]);

    assert!(editor.redo());
    assert!(editor.redo());
    assert_eq!(editor.state().doc(), &doc![p!("one two")]);
    assert!(!editor.redo());
}

#[test]
fn test_structural_edits_undo_with_trailing_paragraph() {
    let mut editor = editor(Duration::ZERO);
    editor.load(doc![p!("a")]).unwrap();
    assert!(editor.handle_key("Mod-Shift-8").unwrap());
    assert_eq!(editor.state().doc(), &doc![ul!(li!(p!("a"))), p!()]);

    assert!(editor.handle_key("Mod-z").unwrap());
    assert_eq!(editor.state().doc(), &doc![p!("a")]);
    assert!(editor.handle_key("Mod-y").unwrap());
    assert_eq!(editor.state().doc(), &doc![ul!(li!(p!("a"))), p!()]);
}

#[test]
fn test_edit_after_undo_drops_redo() {
    let mut editor = editor(Duration::from_secs(60));
    editor.type_text("a").unwrap();
    editor.undo();
    editor.type_text("b").unwrap();
    assert!(!editor.history().can_redo());
    assert!(!editor.redo());
    assert_eq!(editor.state().doc(), &doc![p!("b")]);
}
