//! Rope-based text buffer abstraction.
//!
//! Coordinates are `(line, col)` with `col` counted in chars and read as the
//! gap *before* that char: on a line of length `n`, `col == n` is the slot
//! after the last char. Line breaks are LF only; the host adapter normalizes
//! anything else before text reaches the engine.

use ropey::Rope;
use thiserror::Error;

pub mod motion;
pub mod placement;
pub mod span;

pub use placement::CursorPlacement;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// A position inside a buffer expressed as (line index, char column within that line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
    pub const fn origin() -> Self {
        Self { line: 0, col: 0 }
    }
}

/// Inclusive line interval covered by a linewise range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

/// Half-open range `[start, end)` with `start <= end`.
///
/// `lines` is the linewise tag: when present the range denotes whole lines
/// (normally including the trailing line break) and paste / register logic
/// treats it as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
    pub lines: Option<LineSpan>,
}

impl Range {
    /// Characterwise range, normalizing ordering so that `start <= end`.
    pub fn new(a: Position, b: Position) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            start,
            end,
            lines: None,
        }
    }

    pub fn empty(at: Position) -> Self {
        Self::new(at, at)
    }

    pub fn with_lines(mut self, first: usize, last: usize) -> Self {
        self.lines = Some(LineSpan { first, last });
        self
    }

    pub fn is_linewise(&self) -> bool {
        self.lines.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// True when `other` lies within `self` (shared endpoints allowed).
    pub fn encloses(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// One replacement within an atomic multi-range edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub text: String,
}

impl TextEdit {
    pub fn delete(range: Range) -> Self {
        Self {
            range,
            text: String::new(),
        }
    }
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            range: Range::empty(at),
            text: text.into(),
        }
    }
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit position {line}:{col} is outside the buffer")]
    OutOfBounds { line: usize, col: usize },
    #[error("edits overlap at char offset {offset}")]
    Overlap { offset: usize },
}

/// Validated multi-range edit: absolute char offsets computed against one snapshot.
#[derive(Debug, Clone)]
pub struct EditPlan {
    /// (start, end, text, input index) sorted by start offset, stable on ties.
    ops: Vec<(usize, usize, String, usize)>,
    /// Post-edit char offset of each edit's start, in input order.
    mapped_starts: Vec<usize>,
}

impl EditPlan {
    /// Char offset where edit `idx` (input order) begins once the whole plan is applied.
    pub fn mapped_start(&self, idx: usize) -> Option<usize> {
        self.mapped_starts.get(idx).copied()
    }

    /// Post-edit offset just past the text inserted by edit `idx`.
    pub fn mapped_end(&self, idx: usize) -> Option<usize> {
        let start = self.mapped_start(idx)?;
        let (_, _, text, _) = self.ops.iter().find(|op| op.3 == idx)?;
        Some(start + text.chars().count())
    }

    /// Follow a pre-edit char offset through the whole plan. Offsets inside a
    /// replaced range collapse to its start; offsets at an insertion point
    /// end up after the inserted text.
    pub fn map_offset(&self, offset: usize) -> usize {
        let mut delta: isize = 0;
        for (s, e, text, _) in &self.ops {
            if offset < *s {
                break;
            }
            if offset < *e {
                return (*s as isize + delta) as usize;
            }
            delta += text.chars().count() as isize - (*e - *s) as isize;
        }
        (offset as isize + delta) as usize
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
        }
    }

    /// Total number of lines in the buffer (a trailing newline opens an empty last line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Line content without its line break; empty for lines past the end.
    pub fn line_content(&self, idx: usize) -> String {
        let mut s = self.line(idx).unwrap_or_default();
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    pub fn line_chars(&self, idx: usize) -> Vec<char> {
        self.line_content(idx).chars().collect()
    }

    /// Char length of a line (excluding any newline).
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let n = line.len_chars();
        if n > 0 && line.char(n - 1) == '\n' {
            n - 1
        } else {
            n
        }
    }

    /// True for empty or whitespace-only lines.
    pub fn is_blank_line(&self, idx: usize) -> bool {
        self.line_content(idx).trim().is_empty()
    }

    pub fn char_at(&self, pos: Position) -> Option<char> {
        if pos.line >= self.line_count() || pos.col >= self.line_len(pos.line) {
            return None;
        }
        Some(self.rope.char(self.rope.line_to_char(pos.line) + pos.col))
    }

    pub fn char_at_offset(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    /// Clamp a position to an existing line and to `col <= line_len`.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        Position::new(line, pos.col.min(self.line_len(line)))
    }

    /// Absolute char offset of a (clamped) position.
    pub fn offset_of(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.rope.line_to_char(pos.line) + pos.col
    }

    /// Position of an absolute char offset (clamped to the end of the buffer).
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    pub fn end_position(&self) -> Position {
        let last = self.last_line();
        Position::new(last, self.line_len(last))
    }

    pub fn slice(&self, range: &Range) -> String {
        let s = self.offset_of(range.start);
        let e = self.offset_of(range.end);
        if s >= e {
            return String::new();
        }
        self.rope.slice(s..e).to_string()
    }

    /// Lines `first..=last` joined with `\n`, always newline terminated.
    pub fn lines_text(&self, first: usize, last: usize) -> String {
        let mut out = String::new();
        for l in first..=last.min(self.last_line()) {
            out.push_str(&self.line_content(l));
            out.push('\n');
        }
        out
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    fn check_in_bounds(&self, pos: Position) -> Result<(), EditError> {
        if pos.line >= self.line_count() || pos.col > self.line_len(pos.line) {
            return Err(EditError::OutOfBounds {
                line: pos.line,
                col: pos.col,
            });
        }
        Ok(())
    }

    /// Validate a batch of edits against the current snapshot.
    ///
    /// Every range is resolved to char offsets before anything is applied, so
    /// each edit is interpreted against the same pre-edit text.
    pub fn plan_edits(&self, edits: &[TextEdit]) -> Result<EditPlan, EditError> {
        let mut ops = Vec::with_capacity(edits.len());
        for (idx, edit) in edits.iter().enumerate() {
            self.check_in_bounds(edit.range.start)?;
            self.check_in_bounds(edit.range.end)?;
            let s = self.offset_of(edit.range.start);
            let e = self.offset_of(edit.range.end);
            ops.push((s, e, edit.text.clone(), idx));
        }
        ops.sort_by_key(|op| op.0);
        for pair in ops.windows(2) {
            if pair[0].1 > pair[1].0 {
                return Err(EditError::Overlap { offset: pair[1].0 });
            }
        }
        let mut mapped_starts = vec![0; ops.len()];
        let mut delta: isize = 0;
        for (s, e, text, idx) in &ops {
            mapped_starts[*idx] = (*s as isize + delta) as usize;
            delta += text.chars().count() as isize - (*e - *s) as isize;
        }
        Ok(EditPlan { ops, mapped_starts })
    }

    /// Apply all edits atomically: either every edit lands or the buffer is untouched.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<EditPlan, EditError> {
        let plan = self.plan_edits(edits)?;
        for (s, e, text, _) in plan.ops.iter().rev() {
            if s < e {
                self.rope.remove(*s..*e);
            }
            if !text.is_empty() {
                self.rope.insert(*s, text);
            }
        }
        Ok(plan)
    }
}
