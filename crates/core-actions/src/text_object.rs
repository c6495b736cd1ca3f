//! Text object registry.
//!
//! A text object turns `(buffer, position, keys)` into a `Range`. Three
//! families implement the `TextObject` trait:
//!
//! * `MotionObject` lifts any `Motion` to the range between the cursor and the
//!   motion target, so every motion doubles as an operator target (`dw`,
//!   `d$`, `df.`) without duplicating motion logic. Linewise motions lift to
//!   whole lines; inclusive motions take the target char too.
//! * `StructuralObject` covers the `i`/`a` families: words, delimiter pairs,
//!   quotes and paragraphs.
//! * `LineObject` is the doubled-operator whole-line object (`dd`, `yy`,
//!   `cc`). Whether the line break belongs to it depends on the operator.

use core_events::KeyToken;
use core_keymap::{KeyPattern, ParseOutcome, PatternError};
use core_state::LastFindState;
use core_text::motion::{CharClass, WordKind, first_non_blank_col, runs};
use core_text::span::{self, lines_span};
use core_text::{Buffer, CursorPlacement, Position, Range};

use crate::motion::{Motion, MotionContext, MotionKind, MotionResult, default_motions};
use crate::operator::OperatorKind;

#[derive(Clone, Copy)]
pub struct ObjectContext<'a> {
    pub buffer: &'a Buffer,
    pub placement: CursorPlacement,
    pub last_find: Option<LastFindState>,
    /// Operator the object is resolved for; `None` in Visual mode.
    pub operator: Option<OperatorKind>,
}

impl ObjectContext<'_> {
    /// Change keeps the final line break so replacement text lands on its own line.
    fn include_break(&self) -> bool {
        self.operator != Some(OperatorKind::Change)
    }

    fn motion_context(&self) -> MotionContext<'_> {
        MotionContext {
            buffer: self.buffer,
            placement: self.placement,
            last_find: self.last_find,
            visual: self.operator.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMatch {
    pub range: Range,
    pub remainder: Vec<KeyToken>,
    pub find: Option<LastFindState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextObjectResult {
    Match(ObjectMatch),
    NeedsMoreKeys,
    NoMatch,
}

/// Core trait every text object implementation satisfies.
pub trait TextObject: Send + Sync {
    /// Stable identifier used for logging / tracing (kebab-case).
    fn name(&self) -> &'static str;
    fn compute(
        &self,
        ctx: &ObjectContext<'_>,
        pos: Position,
        keys: &[KeyToken],
    ) -> TextObjectResult;
}

fn parse_remainder(
    pattern: &KeyPattern,
    keys: &[KeyToken],
) -> Result<Vec<KeyToken>, TextObjectResult> {
    match pattern.parse(keys) {
        ParseOutcome::Match { remainder, .. } => Ok(remainder),
        ParseOutcome::NeedsMoreKeys => Err(TextObjectResult::NeedsMoreKeys),
        ParseOutcome::NoMatch => Err(TextObjectResult::NoMatch),
    }
}

fn matched(range: Range, remainder: Vec<KeyToken>) -> TextObjectResult {
    TextObjectResult::Match(ObjectMatch {
        range,
        remainder,
        find: None,
    })
}

/// Whole lines `first..=last`, with or without the break according to the operator.
fn linewise(ctx: &ObjectContext<'_>, first: usize, last: usize) -> Range {
    lines_span(ctx.buffer, first, last, ctx.include_break())
}

// -------------------------------------------------------------------------------------------------
// Motion lifting
// -------------------------------------------------------------------------------------------------

pub struct MotionObject {
    motion: Motion,
}

impl MotionObject {
    pub fn new(motion: Motion) -> Self {
        Self { motion }
    }

    fn word_under(buf: &Buffer, pos: Position, kind: WordKind) -> Option<usize> {
        let chars = buf.line_chars(pos.line);
        runs(&chars, kind)
            .into_iter()
            .find(|r| r.start <= pos.col && pos.col < r.end && r.class != CharClass::Blank)
            .map(|r| r.end)
    }
}

impl TextObject for MotionObject {
    fn name(&self) -> &'static str {
        self.motion.name()
    }

    fn compute(
        &self,
        ctx: &ObjectContext<'_>,
        pos: Position,
        keys: &[KeyToken],
    ) -> TextObjectResult {
        let m = match self.motion.compute(&ctx.motion_context(), pos, keys) {
            MotionResult::Match(m) => m,
            MotionResult::NeedsMoreKeys => return TextObjectResult::NeedsMoreKeys,
            MotionResult::NoMatch => return TextObjectResult::NoMatch,
        };
        let buf = ctx.buffer;
        let origin = buf.clamp(pos);
        let find = m.find;
        let done = |range: Range| {
            TextObjectResult::Match(ObjectMatch {
                range,
                remainder: m.remainder.clone(),
                find,
            })
        };
        if m.linewise {
            let first = origin.line.min(m.target.line);
            let last = origin.line.max(m.target.line);
            return done(linewise(ctx, first, last));
        }
        if let MotionKind::WordForward(kind) = self.motion.kind() {
            // `cw` on a word changes to the end of that word only.
            if ctx.operator == Some(OperatorKind::Change)
                && let Some(end) = Self::word_under(buf, origin, kind)
            {
                return done(Range::new(origin, Position::new(origin.line, end)));
            }
            // The last word on a line never drags the line break along.
            if m.target.line > origin.line {
                let end = Position::new(origin.line, buf.line_len(origin.line));
                return done(Range::new(origin, end));
            }
        }
        let mut range = Range::new(origin, buf.clamp(m.target));
        if m.inclusive {
            let len = buf.line_len(range.end.line);
            range.end.col = (range.end.col + 1).min(len);
        } else if range.end.col == 0 && range.end.line > range.start.line {
            // Exclusive motion ending at column zero stops at the previous line's end,
            // or becomes linewise when it started at or before the first non-blank.
            let last = range.end.line - 1;
            if range.start.col <= first_non_blank_col(buf, range.start.line) {
                return done(linewise(ctx, range.start.line, last));
            }
            range.end = Position::new(last, buf.line_len(last));
        }
        done(range)
    }
}

// -------------------------------------------------------------------------------------------------
// Structural objects
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Word(WordKind),
    Pair(char, char),
    Quote(char),
    Tag,
    Paragraph,
}

pub struct StructuralObject {
    name: &'static str,
    pattern: KeyPattern,
    kind: StructKind,
    around: bool,
}

impl StructuralObject {
    pub fn new(name: &'static str, pattern: KeyPattern, kind: StructKind, around: bool) -> Self {
        Self {
            name,
            pattern,
            kind,
            around,
        }
    }
}

impl TextObject for StructuralObject {
    fn name(&self) -> &'static str {
        self.name
    }

    fn compute(
        &self,
        ctx: &ObjectContext<'_>,
        pos: Position,
        keys: &[KeyToken],
    ) -> TextObjectResult {
        let remainder = match parse_remainder(&self.pattern, keys) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        let buf = ctx.buffer;
        let range = match self.kind {
            StructKind::Word(kind) => span::word_span(buf, pos, kind, self.around),
            StructKind::Pair(open, close) => span::pair_span(buf, pos, open, close, self.around),
            StructKind::Quote(q) => span::quote_span(buf, pos, q, self.around),
            StructKind::Tag => span::tag_span(buf, pos, self.around),
            StructKind::Paragraph => {
                let r = span::paragraph_span(buf, pos, self.around);
                r.lines.map(|l| linewise(ctx, l.first, l.last))
            }
        };
        match range {
            Some(range) => matched(range, remainder),
            None => TextObjectResult::NoMatch,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Whole-line object
// -------------------------------------------------------------------------------------------------

/// `dd` / `yy` / `cc`: the cursor line as a linewise range.
#[derive(Debug, Clone)]
pub struct LineObject {
    pattern: KeyPattern,
    include_break: bool,
}

impl LineObject {
    pub fn new(pattern: KeyPattern, include_break: bool) -> Self {
        Self {
            pattern,
            include_break,
        }
    }
}

impl TextObject for LineObject {
    fn name(&self) -> &'static str {
        "line"
    }

    fn compute(
        &self,
        ctx: &ObjectContext<'_>,
        pos: Position,
        keys: &[KeyToken],
    ) -> TextObjectResult {
        let remainder = match parse_remainder(&self.pattern, keys) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        let line = ctx.buffer.clamp(pos).line;
        matched(lines_span(ctx.buffer, line, line, self.include_break), remainder)
    }
}

/// Structural `i`/`a` objects in registry order.
pub fn structural_objects() -> Result<Vec<Box<dyn TextObject>>, PatternError> {
    let mut out: Vec<Box<dyn TextObject>> = Vec::new();
    let mut add =
        |name: &'static str, keys: &[&str], kind: StructKind| -> Result<(), PatternError> {
            for (prefix, around) in [("i", false), ("a", true)] {
                for k in keys {
                    let pattern = KeyPattern::keys(&format!("{prefix}{k}"))?;
                    out.push(Box::new(StructuralObject::new(name, pattern, kind, around)));
                }
            }
            Ok(())
        };
    add("word", &["w"], StructKind::Word(WordKind::Small))?;
    add("WORD", &["W"], StructKind::Word(WordKind::Big))?;
    add("paragraph", &["p"], StructKind::Paragraph)?;
    add("parens", &["(", ")", "b"], StructKind::Pair('(', ')'))?;
    add("braces", &["{", "}", "B"], StructKind::Pair('{', '}'))?;
    add("brackets", &["[", "]"], StructKind::Pair('[', ']'))?;
    add("angles", &["<lt>", ">"], StructKind::Pair('<', '>'))?;
    add("double-quotes", &["\""], StructKind::Quote('"'))?;
    add("single-quotes", &["'"], StructKind::Quote('\''))?;
    add("backticks", &["`"], StructKind::Quote('`'))?;
    add("tag", &["t"], StructKind::Tag)?;
    Ok(out)
}

/// Every object an operator may take after its own key: structural objects,
/// then every motion lifted.
pub fn default_objects() -> Result<Vec<Box<dyn TextObject>>, PatternError> {
    let mut out = structural_objects()?;
    for motion in default_motions()? {
        out.push(Box::new(MotionObject::new(motion)));
    }
    Ok(out)
}
