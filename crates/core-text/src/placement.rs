//! Cursor placement strategies.
//!
//! Two conventions exist for where a resting cursor lives. `Gap` treats the
//! cursor as the insertion point between characters and lets it rest after
//! the last character of a line. `OnChar` treats the cursor as covering a
//! character, so in Normal mode it can never sit past the last one. Motions
//! are computed in gap coordinates; the strategy is applied when a motion
//! target becomes a resting cursor and when Insert mode is left.

use crate::{Buffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CursorPlacement {
    /// Cursor is a gap; may rest at end of line.
    #[default]
    Gap,
    /// Cursor covers a character; rests on the last char at most.
    OnChar,
}

impl CursorPlacement {
    /// Largest column a Normal-mode cursor may occupy on a line of `len` chars.
    pub fn max_col(self, len: usize) -> usize {
        match self {
            CursorPlacement::Gap => len,
            CursorPlacement::OnChar => len.saturating_sub(1),
        }
    }

    /// Clamp a position into a legal Normal-mode resting place.
    pub fn clamp(self, buf: &Buffer, pos: Position) -> Position {
        let pos = buf.clamp(pos);
        Position::new(pos.line, pos.col.min(self.max_col(buf.line_len(pos.line))))
    }

    /// Where the cursor lands after leaving Insert mode.
    pub fn after_insert(self, buf: &Buffer, pos: Position) -> Position {
        let pos = buf.clamp(pos);
        match self {
            CursorPlacement::Gap => pos,
            CursorPlacement::OnChar => Position::new(pos.line, pos.col.saturating_sub(1)),
        }
    }
}
