mod common;

use common::{host, pos, run_keys};
use core_actions::KeyOutcome;
use core_state::LastFindState;
use core_text::motion::{FindDirection, FindDistance};
use pretty_assertions::assert_eq;

#[test]
fn find_repeat_and_reverse() {
    let (host, engine) = run_keys("foo.bar.baz", &[(0, 0)], "f.");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
    assert_eq!(
        engine.state().last_find,
        Some(LastFindState {
            target: '.',
            distance: FindDistance::Further,
            direction: FindDirection::After,
        })
    );
    let (host, _) = run_keys("foo.bar.baz", &[(0, 0)], "f.;");
    assert_eq!(host.cursors(), vec![pos(0, 7)]);
    let (host, engine) = run_keys("foo.bar.baz", &[(0, 0)], "f.;,");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
    // `,` reverses for one step only; the recorded search keeps its direction.
    assert_eq!(engine.state().last_find.map(|f| f.direction), Some(FindDirection::After));
}

#[test]
fn till_repeat_skips_adjacent_match() {
    let (host, _) = run_keys("a.b.c", &[(0, 0)], "t.");
    assert_eq!(host.cursors(), vec![pos(0, 0)]);
    let (host, _) = run_keys("xa.b.c", &[(0, 0)], "t.;");
    assert_eq!(host.cursors(), vec![pos(0, 3)]);
}

#[test]
fn operator_with_find_is_inclusive_forward() {
    let (host, engine) = run_keys("foo.bar.baz", &[(0, 4)], "dt.");
    assert_eq!(host.text(), "foo..baz");
    assert!(engine.state().last_find.is_some());
    let (host, _) = run_keys("foo.bar.baz", &[(0, 4)], "df.");
    assert_eq!(host.text(), "foo.baz");
    let (host, _) = run_keys("foo.bar.baz", &[(0, 6)], "dF.");
    assert_eq!(host.text(), "foor.baz");
}

#[test]
fn failed_find_resets_without_moving() {
    let mut host = host("foo", &[(0, 1)]);
    let mut engine = common::engine_with(core_text::CursorPlacement::Gap);
    let outcomes = engine.feed(&mut host, "fz").unwrap();
    assert_eq!(outcomes, vec![KeyOutcome::Pending, KeyOutcome::Reset]);
    assert_eq!(host.cursors(), vec![pos(0, 1)]);
    assert_eq!(engine.state().last_find, None);
}

#[test]
fn repeat_without_history_does_nothing() {
    let (host, engine) = run_keys("foo.bar", &[(0, 0)], ";");
    assert_eq!(host.cursors(), vec![pos(0, 0)]);
    assert!(engine.pending_keys().is_empty());
}

#[test]
fn find_runs_at_every_cursor() {
    let (host, _) = run_keys("a-b\nc-d", &[(0, 0), (1, 0)], "f-");
    assert_eq!(host.cursors(), vec![pos(0, 1), pos(1, 1)]);
}
