//! Structural spans used by text objects: words, delimiter pairs, quotes,
//! markup tags, lines and paragraphs. Each function inspects the buffer around a position
//! and reports the range it covers, or `None` when there is nothing there.

use crate::motion::{CharClass, WordKind, enclosing_pair, runs};
use crate::{Buffer, Position, Range};

/// Whole lines `first..=last`.
///
/// With `include_break` the range swallows one line break so deleting it
/// removes the lines entirely: the trailing break when a line follows,
/// otherwise the break preceding `first`.
pub fn lines_span(buf: &Buffer, first: usize, last: usize, include_break: bool) -> Range {
    let last = last.min(buf.last_line());
    let first = first.min(last);
    let end_of_last = Position::new(last, buf.line_len(last));
    let range = if !include_break {
        Range::new(Position::new(first, 0), end_of_last)
    } else if last < buf.last_line() {
        Range::new(Position::new(first, 0), Position::new(last + 1, 0))
    } else if first > 0 {
        Range::new(Position::new(first - 1, buf.line_len(first - 1)), end_of_last)
    } else {
        Range::new(Position::origin(), end_of_last)
    };
    range.with_lines(first, last)
}

/// `iw`/`aw` (and `iW`/`aW` with `WordKind::Big`).
///
/// The inner span is the run under the cursor, blank runs included. The outer
/// span adds trailing blanks, or leading blanks when none trail; on a blank
/// run it adds the following word instead.
pub fn word_span(buf: &Buffer, pos: Position, kind: WordKind, around: bool) -> Option<Range> {
    let pos = buf.clamp(pos);
    let chars = buf.line_chars(pos.line);
    if chars.is_empty() {
        return None;
    }
    let col = pos.col.min(chars.len() - 1);
    let all = runs(&chars, kind);
    let idx = all.iter().position(|r| r.start <= col && col < r.end)?;
    let run = all[idx];
    let (mut start, mut end) = (run.start, run.end);
    if around {
        let next = all.get(idx + 1);
        let prev = idx.checked_sub(1).and_then(|i| all.get(i));
        if run.class == CharClass::Blank {
            if let Some(n) = next {
                end = n.end;
            } else if let Some(p) = prev {
                start = p.start;
            }
        } else if let Some(n) = next.filter(|n| n.class == CharClass::Blank) {
            end = n.end;
        } else if let Some(p) = prev.filter(|p| p.class == CharClass::Blank) {
            start = p.start;
        }
    }
    Some(Range::new(
        Position::new(pos.line, start),
        Position::new(pos.line, end),
    ))
}

/// `i(`/`a(` and friends: the innermost balanced pair around `pos`.
///
/// The inner span of a block whose delimiters sit on their own lines covers
/// just the lines in between.
pub fn pair_span(
    buf: &Buffer,
    pos: Position,
    open: char,
    close: char,
    around: bool,
) -> Option<Range> {
    let off = buf.offset_of(pos);
    let (o, c) = enclosing_pair(buf, off, open, close)?;
    if around {
        return Some(Range::new(buf.position_at(o), buf.position_at(c + 1)));
    }
    let open_pos = buf.position_at(o);
    let close_pos = buf.position_at(c);
    let open_ends_line = open_pos.col + 1 == buf.line_len(open_pos.line);
    let close_leads_line = buf.line_chars(close_pos.line)[..close_pos.col]
        .iter()
        .all(|ch| ch.is_whitespace());
    if open_ends_line && close_leads_line && close_pos.line > open_pos.line + 1 {
        return Some(Range::new(
            Position::new(open_pos.line + 1, 0),
            Position::new(close_pos.line, 0),
        ));
    }
    Some(Range::new(buf.position_at(o + 1), close_pos))
}

/// `i"`/`a"` and friends. Quotes pair up left to right on the current line,
/// skipping backslash-escaped ones. Picks the pair containing the cursor, or
/// the first pair after it.
pub fn quote_span(buf: &Buffer, pos: Position, quote: char, around: bool) -> Option<Range> {
    let pos = buf.clamp(pos);
    let chars = buf.line_chars(pos.line);
    let quotes: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| c == quote && (i == 0 || chars[i - 1] != '\\'))
        .map(|(i, _)| i)
        .collect();
    let (q0, q1) = quotes
        .chunks_exact(2)
        .map(|w| (w[0], w[1]))
        .find(|&(a, b)| a <= pos.col && pos.col <= b)
        .or_else(|| {
            quotes
                .chunks_exact(2)
                .map(|w| (w[0], w[1]))
                .find(|&(a, _)| a > pos.col)
        })?;
    let (s, e) = if around { (q0, q1 + 1) } else { (q0 + 1, q1) };
    Some(Range::new(
        Position::new(pos.line, s),
        Position::new(pos.line, e),
    ))
}

/// One markup tag found by `scan_tag`.
struct Tag {
    name: String,
    closing: bool,
    end: usize,
}

/// Parse the tag starting at `chars[start]` (a `<`). Self-closing tags and
/// `<!`/`<?` declarations yield `None`, as does a stray `<`.
fn scan_tag(chars: &[char], start: usize) -> Option<Tag> {
    let len = chars[start + 1..].iter().position(|&c| c == '>' || c == '<')?;
    let end = start + 1 + len;
    if chars[end] != '>' {
        return None;
    }
    let body = &chars[start + 1..end];
    let (closing, body) = match body.split_first() {
        Some(('/', rest)) => (true, rest),
        _ => (false, body),
    };
    if !closing && body.last() == Some(&'/') {
        return None;
    }
    let name: String = body.iter().take_while(|c| !c.is_whitespace()).collect();
    if !name.starts_with(|c: char| c.is_alphabetic()) {
        return None;
    }
    Some(Tag {
        name,
        closing,
        end: end + 1,
    })
}

/// `it`/`at`: the innermost `<name ...>`..`</name>` element around the
/// cursor, which may sit on either tag. The inner span lies between the
/// tags; the outer span includes them. Spans lines.
pub fn tag_span(buf: &Buffer, pos: Position, around: bool) -> Option<Range> {
    let off = buf.offset_of(buf.clamp(pos));
    let chars: Vec<char> = buf.rope().chars().collect();
    // (name, open tag start, open tag end)
    let mut open: Vec<(String, usize, usize)> = Vec::new();
    let mut best: Option<(usize, usize, usize, usize)> = None;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '<' {
            i += 1;
            continue;
        }
        let Some(tag) = scan_tag(&chars, i) else {
            i += 1;
            continue;
        };
        if !tag.closing {
            open.push((tag.name, i, tag.end));
        } else if let Some(idx) = open.iter().rposition(|(name, _, _)| *name == tag.name) {
            let (start, inner) = (open[idx].1, open[idx].2);
            open.truncate(idx);
            let contains = start <= off && off < tag.end;
            if contains && best.is_none_or(|(s, ..)| start > s) {
                best = Some((start, inner, i, tag.end));
            }
        }
        i = tag.end;
    }
    let (start, inner_start, inner_end, end) = best?;
    let (s, e) = if around { (start, end) } else { (inner_start, inner_end) };
    Some(Range::new(buf.position_at(s), buf.position_at(e)))
}

/// `ip`/`ap`: the run of blank or non-blank lines around the cursor. The outer
/// span adds the following run (or the preceding blanks at end of buffer).
pub fn paragraph_span(buf: &Buffer, pos: Position, around: bool) -> Range {
    let line = buf.clamp(pos).line;
    let blank = buf.is_blank_line(line);
    let same = |l: usize| buf.is_blank_line(l) == blank;
    let mut first = line;
    while first > 0 && same(first - 1) {
        first -= 1;
    }
    let mut last = line;
    while last < buf.last_line() && same(last + 1) {
        last += 1;
    }
    if around {
        if last < buf.last_line() {
            let other = |l: usize| buf.is_blank_line(l) != blank;
            last += 1;
            while last < buf.last_line() && other(last + 1) {
                last += 1;
            }
        } else if !blank {
            while first > 0 && buf.is_blank_line(first - 1) {
                first -= 1;
            }
        }
    }
    lines_span(buf, first, last, true)
}
