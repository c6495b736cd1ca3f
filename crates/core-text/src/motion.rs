//! Cursor motion helpers.
//!
//! These operate purely on a `Buffer` + `Position` pair and are free of editor
//! state. Targets are gap positions; whether a resting cursor may sit at end
//! of line is decided later by `CursorPlacement`.
//!
//! Positions coming in may carry a column past the end of their line (vertical
//! motions preserve the column); every horizontal helper clamps first.

use crate::{Buffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punct,
}

/// `Small` splits word chars from punctuation (`w`); `Big` only splits on whitespace (`W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Small,
    Big,
}

pub fn classify(c: char, kind: WordKind) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if kind == WordKind::Big || c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Maximal run of same-class chars within one line: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end: usize,
    pub class: CharClass,
}

/// Split a line into maximal same-class runs, blanks included.
pub fn runs(chars: &[char], kind: WordKind) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        let class = classify(c, kind);
        match out.last_mut() {
            Some(run) if run.class == class => run.end = i + 1,
            _ => out.push(Run {
                start: i,
                end: i + 1,
                class,
            }),
        }
    }
    out
}

fn word_runs(buf: &Buffer, line: usize, kind: WordKind) -> Vec<Run> {
    runs(&buf.line_chars(line), kind)
        .into_iter()
        .filter(|r| r.class != CharClass::Blank)
        .collect()
}

/// Move left one char; stays put at column zero.
pub fn left(buf: &Buffer, pos: &mut Position) {
    let p = buf.clamp(*pos);
    *pos = Position::new(p.line, p.col.saturating_sub(1));
}

/// Move right one char; may reach the end-of-line gap.
pub fn right(buf: &Buffer, pos: &mut Position) {
    let p = buf.clamp(*pos);
    let len = buf.line_len(p.line);
    *pos = Position::new(p.line, (p.col + 1).min(len));
}

/// Move up one line preserving column.
pub fn up(_buf: &Buffer, pos: &mut Position) {
    if pos.line > 0 {
        pos.line -= 1;
    }
}

/// Move down one line preserving column.
pub fn down(buf: &Buffer, pos: &mut Position) {
    if pos.line + 1 < buf.line_count() {
        pos.line += 1;
    }
}

pub fn line_start(buf: &Buffer, pos: &mut Position) {
    *pos = Position::new(buf.clamp(*pos).line, 0);
}

pub fn line_end(buf: &Buffer, pos: &mut Position) {
    let line = buf.clamp(*pos).line;
    *pos = Position::new(line, buf.line_len(line));
}

/// Column of the first non-whitespace char; line length for blank lines.
pub fn first_non_blank_col(buf: &Buffer, line: usize) -> usize {
    let chars = buf.line_chars(line);
    chars
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(chars.len())
}

pub fn first_non_blank(buf: &Buffer, pos: &mut Position) {
    let line = buf.clamp(*pos).line;
    *pos = Position::new(line, first_non_blank_col(buf, line));
}

pub fn document_start(buf: &Buffer, pos: &mut Position) {
    *pos = Position::new(0, first_non_blank_col(buf, 0));
}

pub fn document_end(buf: &Buffer, pos: &mut Position) {
    let last = buf.last_line();
    *pos = Position::new(last, first_non_blank_col(buf, last));
}

/// Start of the next word. Empty lines count as words. With no further word
/// the cursor moves to the end of the buffer.
pub fn word_forward(buf: &Buffer, pos: &mut Position, kind: WordKind) {
    let p = buf.clamp(*pos);
    if let Some(r) = word_runs(buf, p.line, kind).iter().find(|r| r.start > p.col) {
        *pos = Position::new(p.line, r.start);
        return;
    }
    for line in p.line + 1..buf.line_count() {
        if buf.line_len(line) == 0 {
            *pos = Position::new(line, 0);
            return;
        }
        if let Some(r) = word_runs(buf, line, kind).first() {
            *pos = Position::new(line, r.start);
            return;
        }
    }
    *pos = buf.end_position().max(p);
}

/// Start of the current or previous word. Empty lines count as words.
pub fn word_backward(buf: &Buffer, pos: &mut Position, kind: WordKind) {
    let p = buf.clamp(*pos);
    if let Some(r) = word_runs(buf, p.line, kind).iter().rev().find(|r| r.start < p.col) {
        *pos = Position::new(p.line, r.start);
        return;
    }
    for line in (0..p.line).rev() {
        if buf.line_len(line) == 0 {
            *pos = Position::new(line, 0);
            return;
        }
        if let Some(r) = word_runs(buf, line, kind).last() {
            *pos = Position::new(line, r.start);
            return;
        }
    }
    *pos = Position::origin();
}

/// Last char of the current or next word; skips empty lines. Stays put when
/// no word end follows.
pub fn word_end_forward(buf: &Buffer, pos: &mut Position, kind: WordKind) {
    let p = buf.clamp(*pos);
    if let Some(r) = word_runs(buf, p.line, kind).iter().find(|r| r.end - 1 > p.col) {
        *pos = Position::new(p.line, r.end - 1);
        return;
    }
    for line in p.line + 1..buf.line_count() {
        if let Some(r) = word_runs(buf, line, kind).first() {
            *pos = Position::new(line, r.end - 1);
            return;
        }
    }
    *pos = p;
}

/// Last char of the previous word. Empty lines count as stops.
pub fn word_end_backward(buf: &Buffer, pos: &mut Position, kind: WordKind) {
    let p = buf.clamp(*pos);
    if let Some(r) = word_runs(buf, p.line, kind)
        .iter()
        .rev()
        .find(|r| r.end - 1 < p.col)
    {
        *pos = Position::new(p.line, r.end - 1);
        return;
    }
    for line in (0..p.line).rev() {
        if buf.line_len(line) == 0 {
            *pos = Position::new(line, 0);
            return;
        }
        if let Some(r) = word_runs(buf, line, kind).last() {
            *pos = Position::new(line, r.end - 1);
            return;
        }
    }
    *pos = Position::origin();
}

/// Next blank line after the current paragraph, or the end of the buffer.
pub fn paragraph_forward(buf: &Buffer, pos: &mut Position) {
    let n = buf.line_count();
    let mut line = buf.clamp(*pos).line;
    while line < n && buf.is_blank_line(line) {
        line += 1;
    }
    while line < n && !buf.is_blank_line(line) {
        line += 1;
    }
    *pos = if line < n {
        Position::new(line, 0)
    } else {
        buf.end_position()
    };
}

/// Previous blank line before the current paragraph, or the buffer start.
pub fn paragraph_backward(buf: &Buffer, pos: &mut Position) {
    let mut line = buf.clamp(*pos).line as isize;
    while line >= 0 && buf.is_blank_line(line as usize) {
        line -= 1;
    }
    while line >= 0 && !buf.is_blank_line(line as usize) {
        line -= 1;
    }
    *pos = if line >= 0 {
        Position::new(line as usize, 0)
    } else {
        Position::origin()
    };
}

/// Which side of the cursor a character search scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindDirection {
    Before,
    After,
}

impl FindDirection {
    pub fn reversed(self) -> Self {
        match self {
            FindDirection::Before => FindDirection::After,
            FindDirection::After => FindDirection::Before,
        }
    }
}

/// `Further` lands on the target (`f`/`F`); `Nearer` stops one short (`t`/`T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindDistance {
    Nearer,
    Further,
}

/// Search the current line for `target`. Returns false (position untouched)
/// when the char does not occur in the scanned direction.
///
/// `repeat` skips an occurrence adjacent to the cursor for `Nearer` searches,
/// so that repeating `t`/`T` advances instead of sticking in place.
pub fn find_in_line(
    buf: &Buffer,
    pos: &mut Position,
    target: char,
    direction: FindDirection,
    distance: FindDistance,
    repeat: bool,
) -> bool {
    let p = buf.clamp(*pos);
    let chars = buf.line_chars(p.line);
    let skip = if distance == FindDistance::Nearer && repeat {
        2
    } else {
        1
    };
    let found = match direction {
        FindDirection::After => (p.col + skip..chars.len())
            .find(|&i| chars[i] == target)
            .map(|i| match distance {
                FindDistance::Further => i,
                FindDistance::Nearer => i - 1,
            }),
        FindDirection::Before => {
            if p.col < skip {
                None
            } else {
                (0..=p.col - skip)
                    .rev()
                    .find(|&i| chars[i] == target)
                    .map(|i| match distance {
                        FindDistance::Further => i,
                        FindDistance::Nearer => i + 1,
                    })
            }
        }
    };
    match found {
        Some(col) => {
            *pos = Position::new(p.line, col);
            true
        }
        None => false,
    }
}

pub const BRACKET_PAIRS: [(char, char); 3] = [('(', ')'), ('{', '}'), ('[', ']')];

/// Visual mode also balances angle brackets.
pub const VISUAL_BRACKET_PAIRS: [(char, char); 4] =
    [('(', ')'), ('{', '}'), ('[', ']'), ('<', '>')];

fn scan_forward(buf: &Buffer, from: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in buf.rope().chars_at(from + 1).enumerate() {
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                return Some(from + 1 + i);
            }
            depth -= 1;
        }
    }
    None
}

fn scan_backward(buf: &Buffer, from: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = from;
    while i > 0 {
        i -= 1;
        let c = buf.char_at_offset(i)?;
        if c == close {
            depth += 1;
        } else if c == open {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

/// Offset of the bracket balancing the one at `offset`, if any.
pub fn matching_bracket(buf: &Buffer, offset: usize, pairs: &[(char, char)]) -> Option<usize> {
    let c = buf.char_at_offset(offset)?;
    for &(open, close) in pairs {
        if c == open {
            return scan_forward(buf, offset, open, close);
        }
        if c == close {
            return scan_backward(buf, offset, open, close);
        }
    }
    None
}

/// Innermost balanced `open`/`close` pair around `offset` (either delimiter
/// may sit at `offset` itself). Spans lines.
pub fn enclosing_pair(
    buf: &Buffer,
    offset: usize,
    open: char,
    close: char,
) -> Option<(usize, usize)> {
    let open_idx = if buf.char_at_offset(offset) == Some(open) {
        offset
    } else {
        scan_backward(buf, offset, open, close)?
    };
    let close_idx = scan_forward(buf, open_idx, open, close)?;
    (close_idx >= offset).then_some((open_idx, close_idx))
}

/// `%`: on a bracket, jump to its partner. Otherwise pick whichever is nearest
/// of the enclosing pairs and the next bracket on the line, and jump to the
/// far side of it.
pub fn bracket_match(buf: &Buffer, pos: &mut Position, pairs: &[(char, char)]) -> bool {
    let p = buf.clamp(*pos);
    let off = buf.offset_of(p);
    if let Some(c) = buf.char_at(p)
        && pairs.iter().any(|&(o, cl)| c == o || c == cl)
    {
        return match matching_bracket(buf, off, pairs) {
            Some(m) => {
                *pos = buf.position_at(m);
                true
            }
            None => false,
        };
    }
    let mut best: Option<(usize, usize)> = None;
    let mut consider = |distance: usize, dest: usize| {
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, dest));
        }
    };
    for &(open, close) in pairs {
        if let Some((o, c)) = enclosing_pair(buf, off, open, close) {
            if off - o <= c - off {
                consider(off - o, c);
            } else {
                consider(c - off, o);
            }
        }
    }
    let line_end = buf.offset_of(Position::new(p.line, buf.line_len(p.line)));
    for i in off + 1..line_end {
        if let Some(m) = matching_bracket(buf, i, pairs) {
            consider(i - off, m);
            break;
        }
    }
    match best {
        Some((_, dest)) => {
            *pos = buf.position_at(dest);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn runs_split_word_punct_blank() {
        let chars: Vec<char> = "foo.bar  baz".chars().collect();
        let r = runs(&chars, WordKind::Small);
        let classes: Vec<_> = r.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(classes, vec![(0, 3), (3, 4), (4, 7), (7, 9), (9, 12)]);
        let big = runs(&chars, WordKind::Big);
        assert_eq!(big.len(), 3);
    }

    #[test]
    fn word_forward_visits_punctuation_and_lines() {
        let b = Buffer::from_str("t", "foo.bar baz\n\nqux");
        let mut p = at(0, 0);
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 3));
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 4));
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 8));
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(1, 0), "empty line is a stop");
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(2, 0));
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(2, 3), "no further word moves to end");
        word_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(2, 3), "idempotent at document end");
    }

    #[test]
    fn big_word_forward_skips_punctuation() {
        let b = Buffer::from_str("t", "foo.bar baz");
        let mut p = at(0, 0);
        word_forward(&b, &mut p, WordKind::Big);
        assert_eq!(p, at(0, 8));
    }

    #[test]
    fn word_backward_and_ends() {
        let b = Buffer::from_str("t", "one two\nthree");
        let mut p = at(1, 2);
        word_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(1, 0));
        word_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 4));
        word_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 0));
        word_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 0));

        let mut p = at(0, 0);
        word_end_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 2));
        word_end_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 6));
        word_end_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(1, 4));
        word_end_forward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(1, 4));

        word_end_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 6));
        word_end_backward(&b, &mut p, WordKind::Small);
        assert_eq!(p, at(0, 2));
    }

    #[test]
    fn vertical_motions_keep_column_and_stop_at_bounds() {
        let b = Buffer::from_str("t", "long line\nx\nanother");
        let mut p = at(0, 6);
        down(&b, &mut p);
        assert_eq!(p, at(1, 6));
        down(&b, &mut p);
        assert_eq!(p, at(2, 6));
        down(&b, &mut p);
        assert_eq!(p, at(2, 6));
        up(&b, &mut p);
        up(&b, &mut p);
        up(&b, &mut p);
        assert_eq!(p, at(0, 6));
    }

    #[test]
    fn horizontal_motions_clamp_sticky_column() {
        let b = Buffer::from_str("t", "ab");
        let mut p = at(0, 9);
        left(&b, &mut p);
        assert_eq!(p, at(0, 1));
        let mut p = at(0, 2);
        right(&b, &mut p);
        assert_eq!(p, at(0, 2));
    }

    #[test]
    fn paragraph_motions() {
        let b = Buffer::from_str("t", "a\nb\n\nc\nd");
        let mut p = at(0, 0);
        paragraph_forward(&b, &mut p);
        assert_eq!(p, at(2, 0));
        paragraph_forward(&b, &mut p);
        assert_eq!(p, at(4, 1));
        paragraph_backward(&b, &mut p);
        assert_eq!(p, at(2, 0));
        paragraph_backward(&b, &mut p);
        assert_eq!(p, at(0, 0));
    }

    #[test]
    fn find_variants() {
        let b = Buffer::from_str("t", "foo.bar.baz");
        let mut p = at(0, 0);
        assert!(find_in_line(&b, &mut p, '.', FindDirection::After, FindDistance::Further, false));
        assert_eq!(p, at(0, 3));
        assert!(find_in_line(&b, &mut p, '.', FindDirection::After, FindDistance::Further, true));
        assert_eq!(p, at(0, 7));
        assert!(!find_in_line(&b, &mut p, '.', FindDirection::After, FindDistance::Further, true));
        assert_eq!(p, at(0, 7));

        let mut p = at(0, 0);
        assert!(find_in_line(&b, &mut p, '.', FindDirection::After, FindDistance::Nearer, false));
        assert_eq!(p, at(0, 2));
        assert!(find_in_line(&b, &mut p, '.', FindDirection::After, FindDistance::Nearer, true));
        assert_eq!(p, at(0, 6));

        let mut p = at(0, 10);
        assert!(find_in_line(&b, &mut p, '.', FindDirection::Before, FindDistance::Nearer, false));
        assert_eq!(p, at(0, 8));
        assert!(find_in_line(&b, &mut p, '.', FindDirection::Before, FindDistance::Further, true));
        assert_eq!(p, at(0, 7));
    }

    #[test]
    fn bracket_match_on_and_off_brackets() {
        let b = Buffer::from_str("t", "f(a, [b])\n{\n  x\n}");
        let mut p = at(0, 1);
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 8));
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 1));

        // inside `[b]`, nearest pair is the brackets; ties favor the closer
        let mut p = at(0, 6);
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 7));

        // multi-line braces
        let mut p = at(2, 2);
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(1, 0));

        // before any bracket on the line: jump to partner of the next one
        let mut p = at(0, 0);
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 8));
    }

    #[test]
    fn angle_brackets_only_when_asked() {
        let b = Buffer::from_str("t", "<a (b)>");
        let mut p = at(0, 0);
        assert!(bracket_match(&b, &mut p, &VISUAL_BRACKET_PAIRS));
        assert_eq!(p, at(0, 6));
        let mut p = at(0, 0);
        assert!(bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 5));
    }

    #[test]
    fn bracket_match_without_brackets_stays() {
        let b = Buffer::from_str("t", "plain text");
        let mut p = at(0, 3);
        assert!(!bracket_match(&b, &mut p, &BRACKET_PAIRS));
        assert_eq!(p, at(0, 3));
    }
}
