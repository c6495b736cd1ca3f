// Shared across many integration tests; each test binary uses a subset of helpers.
#![allow(dead_code)]

use std::sync::Arc;

use core_actions::{ActionRegistry, Engine, EngineSettings, MemoryHost};
use core_config::Config;
use core_text::{Buffer, CursorPlacement, Position};

pub fn pos(line: usize, col: usize) -> Position {
    Position::new(line, col)
}

pub fn engine_with(placement: CursorPlacement) -> Engine {
    let registry = ActionRegistry::builtin().expect("built-in registry");
    let settings = EngineSettings {
        placement,
        comments: Config::default().comment_table(),
    };
    Engine::new(Arc::new(registry), settings)
}

pub fn host(initial: &str, cursors: &[(usize, usize)]) -> MemoryHost {
    MemoryHost::new(Buffer::from_str("test", initial))
        .with_cursors(cursors.iter().map(|&(l, c)| pos(l, c)))
}

/// Feed `keys` (key notation) to a fresh gap-cursor engine over `initial`.
pub fn run_keys(initial: &str, cursors: &[(usize, usize)], keys: &str) -> (MemoryHost, Engine) {
    run_keys_with(CursorPlacement::Gap, initial, cursors, keys)
}

pub fn run_keys_with(
    placement: CursorPlacement,
    initial: &str,
    cursors: &[(usize, usize)],
    keys: &str,
) -> (MemoryHost, Engine) {
    let mut host = host(initial, cursors);
    let mut engine = engine_with(placement);
    engine.feed(&mut host, keys).expect("valid key notation");
    (host, engine)
}
