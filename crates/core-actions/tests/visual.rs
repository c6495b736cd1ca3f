mod common;

use common::{engine_with, host, pos, run_keys};
use core_events::SelectionChangeSource;
use core_state::{Mode, RegisterEntry, Selection};
use core_text::CursorPlacement;
use pretty_assertions::assert_eq;

#[test]
fn v_selects_char_under_cursor() {
    let (host, engine) = run_keys("abc", &[(0, 1)], "v");
    assert_eq!(engine.mode(), Mode::Visual);
    assert_eq!(host.selections, vec![Selection::new(pos(0, 1), pos(0, 2))]);
}

#[test]
fn motions_extend_and_delete_is_inclusive() {
    let (host, engine) = run_keys("abcdef", &[(0, 1)], "vlld");
    assert_eq!(host.text(), "aef");
    assert_eq!(host.cursors(), vec![pos(0, 1)]);
    assert_eq!(engine.mode(), Mode::Normal);
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("bcd")]);
}

#[test]
fn backward_selection_keeps_anchor_char() {
    let (host, engine) = run_keys("abcdef", &[(0, 3)], "vhh");
    assert_eq!(host.selections, vec![Selection::new(pos(0, 4), pos(0, 1))]);
    assert_eq!(engine.mode(), Mode::Visual);

    let (host, engine) = run_keys("abcdef", &[(0, 3)], "vhhy");
    assert_eq!(host.text(), "abcdef");
    assert_eq!(host.cursors(), vec![pos(0, 1)]);
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("bcd")]);
}

#[test]
fn o_swaps_active_end() {
    let (host, engine) = run_keys("abcdef", &[(0, 1)], "vllo");
    assert_eq!(host.selections, vec![Selection::new(pos(0, 4), pos(0, 1))]);
    assert_eq!(engine.mode(), Mode::Visual);
    let (host, _) = run_keys("abcdef", &[(0, 1)], "vllohd");
    assert_eq!(host.text(), "ef");
}

#[test]
fn visual_line_covers_whole_lines() {
    let (host, engine) = run_keys("a\nb\nc", &[(0, 0)], "Vj");
    assert_eq!(engine.mode(), Mode::VisualLine);
    assert_eq!(host.selections, vec![Selection::new(pos(0, 0), pos(2, 0))]);
    let (host, engine) = run_keys("a\nb\nc", &[(0, 0)], "Vjd");
    assert_eq!(host.text(), "c");
    assert_eq!(host.cursors(), vec![pos(0, 0)]);
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::linewise("a\nb\n")]);
}

#[test]
fn visual_line_change_keeps_a_line_to_type_on() {
    let (host, engine) = run_keys("a\nb\nc", &[(1, 0)], "Vcx<Esc>");
    assert_eq!(host.text(), "a\nx\nc");
    assert_eq!(engine.mode(), Mode::Normal);
}

#[test]
fn toggles_between_visual_kinds() {
    let (host, engine) = run_keys("abc", &[(0, 1)], "vlv");
    assert_eq!(engine.mode(), Mode::Normal);
    assert_eq!(host.cursors(), vec![pos(0, 2)]);

    let (host, engine) = run_keys("ab\ncd", &[(0, 1)], "vjV");
    assert_eq!(engine.mode(), Mode::VisualLine);
    assert_eq!(host.selections, vec![Selection::new(pos(0, 0), pos(1, 2))]);

    let (_, engine) = run_keys("ab\ncd", &[(0, 1)], "VV");
    assert_eq!(engine.mode(), Mode::Normal);
}

#[test]
fn escape_collapses_to_head() {
    let (host, engine) = run_keys("abcdef", &[(0, 1)], "vll<Esc>");
    assert_eq!(engine.mode(), Mode::Normal);
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
}

#[test]
fn text_object_replaces_selection() {
    let (host, engine) = run_keys("foo bar", &[(0, 5)], "viw");
    assert_eq!(host.selections, vec![Selection::new(pos(0, 4), pos(0, 7))]);
    assert_eq!(engine.mode(), Mode::Visual);
    let (host, engine) = run_keys("foo bar", &[(0, 5)], "viwc");
    assert_eq!(host.text(), "foo ");
    assert_eq!(engine.mode(), Mode::Insert);
    assert_eq!(host.cursors(), vec![pos(0, 4)]);
}

#[test]
fn paragraph_object_switches_to_visual_line() {
    let (host, engine) = run_keys("a\nb\n\nc", &[(0, 0)], "vip");
    assert_eq!(engine.mode(), Mode::VisualLine);
    assert_eq!(host.selections, vec![Selection::new(pos(0, 0), pos(2, 0))]);
}

#[test]
fn outside_selection_changes_drive_mode() {
    let mut host = host("abc def", &[(0, 0)]);
    let mut engine = engine_with(CursorPlacement::Gap);

    host.selections = vec![Selection::new(pos(0, 0), pos(0, 3))];
    assert_eq!(engine.on_selection_change(&host, SelectionChangeSource::Pointer), Mode::Visual);

    // Keyboard-driven collapses are transient and keep Visual.
    host.selections = vec![Selection::cursor(pos(0, 2))];
    assert_eq!(engine.on_selection_change(&host, SelectionChangeSource::Keyboard), Mode::Visual);

    assert_eq!(engine.on_selection_change(&host, SelectionChangeSource::Pointer), Mode::Normal);

    // Normal with empty selections stays Normal.
    assert_eq!(engine.on_selection_change(&host, SelectionChangeSource::Pointer), Mode::Normal);
    let _ = engine.feed(&mut host, "l");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
}

#[test]
fn visual_works_across_cursors() {
    let (host, _) = run_keys("abc\ndef", &[(0, 0), (1, 0)], "vld");
    assert_eq!(host.text(), "c\nf");
    assert_eq!(host.cursors(), vec![pos(0, 0), pos(1, 0)]);
}

#[test]
fn percent_balances_angle_brackets_in_visual() {
    let (host, engine) = run_keys("<ab> x", &[(0, 0)], "v%d");
    assert_eq!(host.text(), " x");
    assert_eq!(engine.state().registers.entries(), &[RegisterEntry::charwise("<ab>")]);

    // Normal mode leaves `<>` alone.
    let (host, engine) = run_keys("<ab> x", &[(0, 0)], "%");
    assert_eq!(host.cursors(), vec![pos(0, 0)]);
    assert!(engine.pending_keys().is_empty());
}
