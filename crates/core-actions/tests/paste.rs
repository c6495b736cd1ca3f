mod common;

use common::{engine_with, host, pos, run_keys};
use core_state::{Mode, RegisterEntry, Selection};
use core_text::CursorPlacement;
use pretty_assertions::assert_eq;

#[test]
fn each_cursor_pastes_its_own_entry_when_counts_match() {
    let (host, engine) = run_keys("ab\ncd", &[(0, 0), (1, 0)], "ylp");
    assert_eq!(
        engine.state().registers.entries(),
        &[RegisterEntry::charwise("a"), RegisterEntry::charwise("c")]
    );
    assert_eq!(host.text(), "aab\nccd");
    assert_eq!(host.cursors(), vec![pos(0, 1), pos(1, 1)]);
}

#[test]
fn count_mismatch_pastes_joined_blob_everywhere() {
    let mut host = host("ab\ncd\nef", &[(0, 0), (1, 0)]);
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut host, "yl").unwrap();
    host.selections = [(0, 0), (1, 0), (2, 0)]
        .iter()
        .map(|&(l, c)| Selection::cursor(pos(l, c)))
        .collect();
    engine.feed(&mut host, "P").unwrap();
    assert_eq!(host.text(), "a\ncab\na\nccd\na\ncef");
}

#[test]
fn linewise_paste_above_and_below() {
    let (host, _) = run_keys("a\nb", &[(1, 0)], "yyP");
    assert_eq!(host.text(), "a\nb\nb");
    assert_eq!(host.cursors(), vec![pos(1, 0)]);
    let (host, _) = run_keys("  a\nb", &[(0, 0)], "yyjp");
    assert_eq!(host.text(), "  a\nb\n  a");
    assert_eq!(host.cursors(), vec![pos(2, 2)]);
}

#[test]
fn external_clipboard_text_is_adopted() {
    let mut host = host("a", &[(0, 0)]);
    host.clipboard = Some("zz\n".to_string());
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut host, "p").unwrap();
    assert_eq!(host.text(), "a\nzz");
    assert_eq!(host.cursors(), vec![pos(1, 0)]);
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::linewise("zz\n")]);
}

#[test]
fn own_clipboard_write_does_not_replace_entries() {
    let mut host = host("ab\ncd", &[(0, 0), (1, 0)]);
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut host, "yl").unwrap();
    assert_eq!(host.clipboard.as_deref(), Some("a\nc"));
    engine.feed(&mut host, "P").unwrap();
    assert_eq!(host.text(), "aab\nccd");
    // A later external copy wins over the stored entries.
    host.clipboard = Some("X".to_string());
    host.selections = vec![Selection::cursor(pos(0, 0))];
    engine.feed(&mut host, "P").unwrap();
    assert_eq!(host.text(), "Xaab\nccd");
}

#[test]
fn paste_with_empty_register_does_nothing() {
    let (host, engine) = run_keys("abc", &[(0, 1)], "p");
    assert_eq!(host.text(), "abc");
    assert!(engine.pending_keys().is_empty());
}

#[test]
fn unavailable_clipboard_still_uses_registers() {
    let mut host = host("abc", &[(0, 0)]).without_clipboard();
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut host, "xp").unwrap();
    assert_eq!(host.text(), "bac");
}

#[test]
fn visual_paste_replaces_selection_and_stores_replaced_text() {
    let (host, engine) = run_keys("foo bar", &[(0, 0)], "yiwwviwp");
    assert_eq!(host.text(), "foo foo");
    assert_eq!(engine.mode(), Mode::Normal);
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("bar")]);
    let (host, engine) = run_keys("foo bar", &[(0, 0)], "yiwwviwP");
    assert_eq!(host.text(), "foo foo");
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("foo")]);
}

#[test]
fn visual_line_paste_replaces_whole_lines() {
    let (host, _) = run_keys("a\nb\nc", &[(0, 0)], "yyjVp");
    assert_eq!(host.text(), "a\na\nc");
    assert_eq!(host.cursors(), vec![pos(1, 0)]);
}

#[test]
fn entries_pair_with_cursors_by_position() {
    let (host, engine) = run_keys("aa\nbb", &[(1, 0), (0, 0)], "yiwP");
    assert_eq!(
        engine.state().registers.entries(),
        &[RegisterEntry::charwise("aa"), RegisterEntry::charwise("bb")]
    );
    assert_eq!(host.text(), "aaaa\nbbbb");
    assert_eq!(host.cursors(), vec![pos(1, 1), pos(0, 1)]);
}

#[test]
fn visual_paste_pairs_entries_by_position() {
    let (host, engine) = run_keys("aa x\nbb y", &[(1, 0), (0, 0)], "yiwwviwp");
    assert_eq!(host.text(), "aa aa\nbb bb");
    assert_eq!(
        engine.state().registers.entries(),
        &[RegisterEntry::charwise("x"), RegisterEntry::charwise("y")]
    );
}

#[test]
fn clipboard_returning_after_failed_write_is_adopted() {
    let mut host = host("abc", &[(0, 0)]).without_clipboard();
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut host, "x").unwrap();
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("a")]);

    host.clipboard = Some("Z".to_string());
    engine.feed(&mut host, "p").unwrap();
    assert_eq!(host.text(), "bZc");
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("Z")]);
}
