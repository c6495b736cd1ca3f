//! Motion registry.
//!
//! A `Motion` pairs a key pattern with a `MotionKind`. Computing a motion is
//! pure: it parses the keys, moves a position with the `core_text::motion`
//! primitives and reports the target together with the facts operators need
//! when the motion is lifted to a text object (inclusive / linewise, and the
//! character search to remember for `;` and `,`).

use core_events::{KeyToken, NamedKey};
use core_keymap::{KeyPattern, ParseOutcome, PatternError};
use core_state::LastFindState;
use core_text::motion::{self, FindDirection, FindDistance, WordKind};
use core_text::{Buffer, CursorPlacement, Position};
use tracing::trace;

use crate::action::{Action, ActionContext, ActionOutcome};
use crate::host::HostError;
use core_state::ModeSet;

/// Read-only inputs every motion is computed against.
#[derive(Clone, Copy)]
pub struct MotionContext<'a> {
    pub buffer: &'a Buffer,
    pub placement: CursorPlacement,
    pub last_find: Option<LastFindState>,
    /// Computed for a Visual selection head.
    pub visual: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionMatch {
    pub target: Position,
    pub remainder: Vec<KeyToken>,
    /// The target char itself belongs to the lifted range.
    pub inclusive: bool,
    /// Lifted ranges cover whole lines.
    pub linewise: bool,
    /// Character search to record as the new `LastFindState`.
    pub find: Option<LastFindState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionResult {
    Match(MotionMatch),
    NeedsMoreKeys,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    FirstNonBlank,
    LineEnd,
    DocumentStart,
    DocumentEnd,
    WordForward(WordKind),
    WordBackward(WordKind),
    WordEndForward(WordKind),
    WordEndBackward(WordKind),
    ParagraphForward,
    ParagraphBackward,
    Find {
        direction: FindDirection,
        distance: FindDistance,
    },
    RepeatFind {
        reverse: bool,
    },
    BracketMatch,
}

impl MotionKind {
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            MotionKind::Up | MotionKind::Down | MotionKind::DocumentStart | MotionKind::DocumentEnd
        )
    }

    /// Vertical motions keep the column even past the end of the target line.
    pub fn keeps_column(self) -> bool {
        matches!(self, MotionKind::Up | MotionKind::Down)
    }

    fn is_inclusive(self) -> bool {
        matches!(
            self,
            MotionKind::WordEndForward(_)
                | MotionKind::WordEndBackward(_)
                | MotionKind::BracketMatch
        )
    }
}

#[derive(Debug, Clone)]
pub struct Motion {
    name: &'static str,
    pattern: KeyPattern,
    kind: MotionKind,
}

impl Motion {
    pub fn new(name: &'static str, pattern: KeyPattern, kind: MotionKind) -> Self {
        Self {
            name,
            pattern,
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    pub fn pattern(&self) -> &KeyPattern {
        &self.pattern
    }

    pub fn compute(
        &self,
        ctx: &MotionContext<'_>,
        pos: Position,
        keys: &[KeyToken],
    ) -> MotionResult {
        let (vars, remainder) = match self.pattern.parse(keys) {
            ParseOutcome::Match { vars, remainder } => (vars, remainder),
            ParseOutcome::NeedsMoreKeys => return MotionResult::NeedsMoreKeys,
            ParseOutcome::NoMatch => return MotionResult::NoMatch,
        };
        let buf = ctx.buffer;
        let mut target = pos;
        let mut inclusive = self.kind.is_inclusive();
        let mut find = None;
        match self.kind {
            MotionKind::Left => motion::left(buf, &mut target),
            MotionKind::Right => motion::right(buf, &mut target),
            MotionKind::Up => motion::up(buf, &mut target),
            MotionKind::Down => motion::down(buf, &mut target),
            MotionKind::LineStart => motion::line_start(buf, &mut target),
            MotionKind::FirstNonBlank => motion::first_non_blank(buf, &mut target),
            MotionKind::LineEnd => motion::line_end(buf, &mut target),
            MotionKind::DocumentStart => motion::document_start(buf, &mut target),
            MotionKind::DocumentEnd => motion::document_end(buf, &mut target),
            MotionKind::WordForward(kind) => motion::word_forward(buf, &mut target, kind),
            MotionKind::WordBackward(kind) => motion::word_backward(buf, &mut target, kind),
            MotionKind::WordEndForward(kind) => motion::word_end_forward(buf, &mut target, kind),
            MotionKind::WordEndBackward(kind) => motion::word_end_backward(buf, &mut target, kind),
            MotionKind::ParagraphForward => motion::paragraph_forward(buf, &mut target),
            MotionKind::ParagraphBackward => motion::paragraph_backward(buf, &mut target),
            MotionKind::Find {
                direction,
                distance,
            } => {
                let Some(c) = vars.char("char") else {
                    return MotionResult::NoMatch;
                };
                let state = LastFindState {
                    target: c,
                    distance,
                    direction,
                };
                if !run_find(buf, &mut target, state, false) {
                    return MotionResult::NoMatch;
                }
                inclusive = direction == FindDirection::After;
                find = Some(state);
            }
            MotionKind::RepeatFind { reverse } => {
                let Some(last) = ctx.last_find else {
                    return MotionResult::NoMatch;
                };
                let state = if reverse { last.reversed() } else { last };
                if !run_find(buf, &mut target, state, true) {
                    return MotionResult::NoMatch;
                }
                inclusive = state.direction == FindDirection::After;
            }
            MotionKind::BracketMatch => {
                let pairs: &[(char, char)] = if ctx.visual {
                    &motion::VISUAL_BRACKET_PAIRS
                } else {
                    &motion::BRACKET_PAIRS
                };
                if !motion::bracket_match(buf, &mut target, pairs) {
                    return MotionResult::NoMatch;
                }
            }
        }
        trace!(target: "input.keys", motion = self.name, ?pos, ?target, "motion_match");
        MotionResult::Match(MotionMatch {
            target,
            remainder,
            inclusive,
            linewise: self.kind.is_linewise(),
            find,
        })
    }
}

fn run_find(buf: &Buffer, pos: &mut Position, state: LastFindState, repeat: bool) -> bool {
    motion::find_in_line(buf, pos, state.target, state.direction, state.distance, repeat)
}

/// The built-in motions in registry order.
pub fn default_motions() -> Result<Vec<Motion>, PatternError> {
    use MotionKind::*;
    let lit = |s: &str| KeyPattern::keys(s);
    let named = |k: NamedKey| KeyPattern::literal([KeyToken::Named(k)]);
    let find = |direction, distance| Find {
        direction,
        distance,
    };
    Ok(vec![
        Motion::new("left", lit("h")?, Left),
        Motion::new("right", lit("l")?, Right),
        Motion::new("down", lit("j")?, Down),
        Motion::new("up", lit("k")?, Up),
        Motion::new("left", named(NamedKey::Left), Left),
        Motion::new("right", named(NamedKey::Right), Right),
        Motion::new("down", named(NamedKey::Down), Down),
        Motion::new("up", named(NamedKey::Up), Up),
        Motion::new("line-start", lit("0")?, LineStart),
        Motion::new("line-start", named(NamedKey::Home), LineStart),
        Motion::new("first-non-blank", lit("^")?, FirstNonBlank),
        Motion::new("line-end", lit("$")?, LineEnd),
        Motion::new("line-end", named(NamedKey::End), LineEnd),
        Motion::new("document-start", lit("gg")?, DocumentStart),
        Motion::new("document-end", lit("G")?, DocumentEnd),
        Motion::new("word-forward", lit("w")?, WordForward(WordKind::Small)),
        Motion::new("WORD-forward", lit("W")?, WordForward(WordKind::Big)),
        Motion::new("word-backward", lit("b")?, WordBackward(WordKind::Small)),
        Motion::new("WORD-backward", lit("B")?, WordBackward(WordKind::Big)),
        Motion::new("word-end", lit("e")?, WordEndForward(WordKind::Small)),
        Motion::new("WORD-end", lit("E")?, WordEndForward(WordKind::Big)),
        Motion::new("word-end-backward", lit("ge")?, WordEndBackward(WordKind::Small)),
        Motion::new("WORD-end-backward", lit("gE")?, WordEndBackward(WordKind::Big)),
        Motion::new("paragraph-forward", lit("}")?, ParagraphForward),
        Motion::new("paragraph-backward", lit("{")?, ParagraphBackward),
        Motion::new(
            "find-forward",
            KeyPattern::placeholder("f", "char")?,
            find(FindDirection::After, FindDistance::Further),
        ),
        Motion::new(
            "find-backward",
            KeyPattern::placeholder("F", "char")?,
            find(FindDirection::Before, FindDistance::Further),
        ),
        Motion::new(
            "till-forward",
            KeyPattern::placeholder("t", "char")?,
            find(FindDirection::After, FindDistance::Nearer),
        ),
        Motion::new(
            "till-backward",
            KeyPattern::placeholder("T", "char")?,
            find(FindDirection::Before, FindDistance::Nearer),
        ),
        Motion::new("repeat-find", lit(";")?, RepeatFind { reverse: false }),
        Motion::new("repeat-find-reverse", lit(",")?, RepeatFind { reverse: true }),
        Motion::new("bracket-match", lit("%")?, BracketMatch),
    ])
}

/// Registry entry moving every cursor (Normal) or selection head (Visual).
pub struct MotionAction {
    motion: Motion,
}

impl MotionAction {
    pub fn new(motion: Motion) -> Self {
        Self { motion }
    }
}

impl Action for MotionAction {
    fn name(&self) -> &str {
        self.motion.name
    }

    fn modes(&self) -> ModeSet {
        ModeSet::NORMAL_AND_VISUAL
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        if self.motion.pattern.parse(keys) == ParseOutcome::NoMatch {
            return Ok(ActionOutcome::NoMatch);
        }
        let buffer = ctx.buffer()?;
        if ctx.state.mode.is_visual() {
            return crate::visual::extend(ctx, &buffer, &self.motion, keys);
        }
        let mctx = MotionContext {
            buffer: &buffer,
            placement: ctx.placement,
            last_find: ctx.state.last_find,
            visual: false,
        };
        let mut cursors = Vec::new();
        let mut moved = false;
        let mut find = None;
        for sel in ctx.host.selections() {
            match self.motion.compute(&mctx, sel.active, keys) {
                MotionResult::NeedsMoreKeys => return Ok(ActionOutcome::NeedsMoreKeys),
                MotionResult::NoMatch => cursors.push(sel.active),
                MotionResult::Match(m) => {
                    moved = true;
                    find = find.or(m.find);
                    cursors.push(if self.motion.kind.keeps_column() {
                        m.target
                    } else {
                        ctx.placement.clamp(&buffer, m.target)
                    });
                }
            }
        }
        if !moved {
            return Ok(ActionOutcome::NoMatch);
        }
        if find.is_some() {
            ctx.state.last_find = find;
        }
        ctx.set_cursors(cursors);
        Ok(ActionOutcome::Executed)
    }
}
