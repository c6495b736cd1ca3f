mod common;

use common::{engine_with, host, pos, run_keys, run_keys_with};
use core_state::Mode;
use core_text::CursorPlacement;
use pretty_assertions::assert_eq;

#[test]
fn typing_inserts_at_every_cursor() {
    let (host, engine) = run_keys("ab\ncd", &[(0, 0), (1, 0)], "ix<Esc>");
    assert_eq!(host.text(), "xab\nxcd");
    assert_eq!(host.cursors(), vec![pos(0, 1), pos(1, 1)]);
    assert_eq!(engine.mode(), Mode::Normal);
}

#[test]
fn leaving_insert_steps_back_onto_a_char() {
    let (host, _) = run_keys_with(CursorPlacement::OnChar, "ab", &[(0, 0)], "ixy<Esc>");
    assert_eq!(host.text(), "xyab");
    assert_eq!(host.cursors(), vec![pos(0, 1)]);
    let (host, _) = run_keys("ab", &[(0, 0)], "ixy<Esc>");
    assert_eq!(host.cursors(), vec![pos(0, 2)]);
}

#[test]
fn backspace_and_enter_cross_lines() {
    let (host, engine) = run_keys("ab\ncd", &[(1, 0)], "i<BS>");
    assert_eq!(host.text(), "abcd");
    assert_eq!(host.cursors(), vec![pos(0, 2)]);
    assert_eq!(engine.mode(), Mode::Insert);

    let (host, _) = run_keys("abcd", &[(0, 2)], "i<CR>");
    assert_eq!(host.text(), "ab\ncd");
    assert_eq!(host.cursors(), vec![pos(1, 0)]);

    // Nothing before the first char: the key is consumed, the text is kept.
    let (host, engine) = run_keys("ab", &[(0, 0)], "i<BS>");
    assert_eq!(host.text(), "ab");
    assert!(engine.pending_keys().is_empty());
}

#[test]
fn delete_key_removes_char_after_cursor() {
    let (host, _) = run_keys("ab\ncd", &[(0, 2)], "i<Del>");
    assert_eq!(host.text(), "abcd");
    assert_eq!(host.cursors(), vec![pos(0, 2)]);
}

#[test]
fn entry_points_place_the_cursor() {
    let (host, _) = run_keys("abc", &[(0, 0)], "ax<Esc>");
    assert_eq!(host.text(), "axbc");
    let (host, _) = run_keys("abc", &[(0, 0)], "Ad<Esc>");
    assert_eq!(host.text(), "abcd");
    let (host, _) = run_keys("  abc", &[(0, 4)], "Ix<Esc>");
    assert_eq!(host.text(), "  xabc");
}

#[test]
fn open_line_keeps_indent() {
    let (host, engine) = run_keys("  foo", &[(0, 0)], "obar<Esc>");
    assert_eq!(host.text(), "  foo\n  bar");
    assert_eq!(host.cursors(), vec![pos(1, 5)]);
    assert_eq!(engine.mode(), Mode::Normal);

    let (host, _) = run_keys("  foo", &[(0, 3)], "Ox");
    assert_eq!(host.text(), "  x\n  foo");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
}

#[test]
fn open_line_runs_once_per_line() {
    let (host, _) = run_keys("a\nb", &[(0, 0), (1, 0)], "o-<Esc>");
    assert_eq!(host.text(), "a\n-\nb\n-");
}

#[test]
fn replace_char_at_every_cursor() {
    let (host, engine) = run_keys("ab\ncd", &[(0, 0), (1, 1)], "rx");
    assert_eq!(host.text(), "xb\ncx");
    assert_eq!(host.cursors(), vec![pos(0, 0), pos(1, 1)]);
    assert_eq!(engine.mode(), Mode::Normal);

    let (host, _) = run_keys("\nab", &[(0, 0)], "rx");
    assert_eq!(host.text(), "\nab");

    let (host, engine) = run_keys("ab", &[(0, 0)], "r<Esc>");
    assert_eq!(host.text(), "ab");
    assert!(engine.pending_keys().is_empty());

    let (host, _) = run_keys("ab cd", &[(0, 2)], "r<CR>");
    assert_eq!(host.text(), "ab\ncd");
    assert_eq!(host.cursors(), vec![pos(1, 0)]);
}

#[test]
fn join_strips_indent_and_comment_leader() {
    let (host, _) = run_keys("foo\n   bar", &[(0, 1)], "J");
    assert_eq!(host.text(), "foo bar");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);

    let mut h = host_with_language("// a\n    // b", "rust");
    let mut engine = engine_with(CursorPlacement::Gap);
    engine.feed(&mut h, "J").unwrap();
    assert_eq!(h.text(), "// a b");
    assert_eq!(h.cursors(), vec![pos(0, 4)]);

    // Unknown language: the leader stays.
    let mut h = host_with_language("// a\n// b", "plaintext");
    engine.feed(&mut h, "J").unwrap();
    assert_eq!(h.text(), "// a // b");
}

#[test]
fn join_spacing_rules() {
    let (host, _) = run_keys("foo(\n  )", &[(0, 0)], "J");
    assert_eq!(host.text(), "foo()");
    let (host, _) = run_keys("foo \nbar", &[(0, 0)], "J");
    assert_eq!(host.text(), "foo bar");
    let (host, _) = run_keys("foo\n", &[(0, 0)], "J");
    assert_eq!(host.text(), "foo");
    let (host, _) = run_keys("a\nb", &[(1, 0)], "J");
    assert_eq!(host.text(), "a\nb");
}

fn host_with_language(text: &str, language: &str) -> core_actions::MemoryHost {
    host(text, &[(0, 0)]).with_language(language)
}
