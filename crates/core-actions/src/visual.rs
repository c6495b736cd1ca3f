//! Visual and VisualLine modes.
//!
//! Host selections are gap ranges. Visual mode reasons in *characters*: the
//! anchor char and the head char are both part of the selection, whichever
//! comes first. The helpers here convert between the two views, so a
//! selection always covers its endpoint chars regardless of direction. A
//! line end position counts as the line break char.
//! VisualLine selections always cover whole lines.

use std::sync::Arc;

use core_events::KeyToken;
use core_keymap::{Captures, KeyPattern, ParseOutcome};
use core_state::{Mode, ModeSet, Selection};
use core_text::span::lines_span;
use core_text::{Buffer, Position, Range};

use crate::action::{Action, ActionContext, ActionOutcome};
use crate::host::HostError;
use crate::motion::{Motion, MotionContext, MotionResult};
use crate::operator::{self, OperatorKind};
use crate::text_object::{ObjectContext, TextObject, TextObjectResult};

fn step_back(buf: &Buffer, p: Position) -> Position {
    if p.col > 0 {
        Position::new(p.line, p.col - 1)
    } else if p.line > 0 {
        Position::new(p.line - 1, buf.line_len(p.line - 1))
    } else {
        p
    }
}

fn step_forward(buf: &Buffer, p: Position) -> Position {
    let len = buf.line_len(p.line);
    if p.col < len {
        Position::new(p.line, p.col + 1)
    } else if p.line < buf.last_line() {
        Position::new(p.line + 1, 0)
    } else {
        Position::new(p.line, len)
    }
}

/// Nearest position that names a real char (or the break after a line).
pub fn clamp_char(buf: &Buffer, p: Position) -> Position {
    let p = buf.clamp(p);
    let len = buf.line_len(p.line);
    if p.line == buf.last_line() && p.col >= len {
        Position::new(p.line, len.saturating_sub(1))
    } else {
        p
    }
}

/// Char a Normal-mode cursor turns into when a selection starts there: a
/// cursor resting after the last char selects that char.
fn entry_char(buf: &Buffer, p: Position) -> Position {
    let p = buf.clamp(p);
    let len = buf.line_len(p.line);
    if p.col >= len && len > 0 {
        Position::new(p.line, len - 1)
    } else {
        clamp_char(buf, p)
    }
}

/// `(anchor char, head char)` of a charwise selection.
pub fn char_endpoints(buf: &Buffer, sel: &Selection) -> (Position, Position) {
    if sel.active > sel.anchor {
        (sel.anchor, step_back(buf, sel.active))
    } else if sel.active < sel.anchor {
        (step_back(buf, sel.anchor), sel.active)
    } else {
        (sel.anchor, sel.active)
    }
}

/// Host selection covering both chars, keeping the head as the active end.
pub fn covering(buf: &Buffer, anchor: Position, head: Position) -> Selection {
    if head >= anchor {
        Selection::new(anchor, step_forward(buf, head))
    } else {
        Selection::new(step_forward(buf, anchor), head)
    }
}

fn line_end_inclusive(buf: &Buffer, line: usize) -> Position {
    if line < buf.last_line() {
        Position::new(line + 1, 0)
    } else {
        Position::new(line, buf.line_len(line))
    }
}

/// `(anchor line, head line)` of a linewise selection.
pub fn line_endpoints(sel: &Selection) -> (usize, usize) {
    let (a, h) = (sel.anchor, sel.active);
    if h > a {
        let head = if h.col == 0 && h.line > a.line { h.line - 1 } else { h.line };
        (a.line, head)
    } else if h < a {
        let anchor = if a.col == 0 && a.line > h.line { a.line - 1 } else { a.line };
        (anchor, h.line)
    } else {
        (a.line, a.line)
    }
}

/// Host selection covering lines `anchor..=head` whole.
pub fn line_covering(buf: &Buffer, anchor: usize, head: usize) -> Selection {
    if head >= anchor {
        Selection::new(Position::new(anchor, 0), line_end_inclusive(buf, head))
    } else {
        Selection::new(line_end_inclusive(buf, anchor), Position::new(head, 0))
    }
}

/// Head of a selection in the current visual mode, as a motion origin.
fn head_of(buf: &Buffer, mode: Mode, sel: &Selection) -> Position {
    if mode == Mode::VisualLine {
        Position::new(line_endpoints(sel).1, 0)
    } else {
        char_endpoints(buf, sel).1
    }
}

/// Drop every selection to a cursor on its head and return to Normal.
pub fn collapse(ctx: &mut ActionContext<'_>, buffer: &Buffer) {
    let mode = ctx.state.mode;
    let cursors = ctx
        .host
        .selections()
        .iter()
        .map(|sel| ctx.placement.clamp(buffer, head_of(buffer, mode, sel)))
        .collect();
    ctx.set_cursors(cursors);
    ctx.state.mode = Mode::Normal;
}

/// Move the head of every selection by `motion`; anchors stay put.
pub fn extend(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    motion: &Motion,
    keys: &[KeyToken],
) -> Result<ActionOutcome, HostError> {
    let mode = ctx.state.mode;
    let mctx = MotionContext {
        buffer,
        placement: ctx.placement,
        last_find: ctx.state.last_find,
        visual: true,
    };
    let selections = ctx.host.selections();
    let mut out = Vec::with_capacity(selections.len());
    let mut moved = false;
    let mut find = None;
    for sel in selections {
        let (anchor, head) = if mode == Mode::VisualLine {
            let (a, h) = line_endpoints(&sel);
            (Position::new(a, 0), Position::new(h, 0))
        } else {
            char_endpoints(buffer, &sel)
        };
        match motion.compute(&mctx, head, keys) {
            MotionResult::NeedsMoreKeys => return Ok(ActionOutcome::NeedsMoreKeys),
            MotionResult::NoMatch => out.push(sel),
            MotionResult::Match(m) => {
                moved = true;
                find = find.or(m.find);
                out.push(if mode == Mode::VisualLine {
                    line_covering(buffer, anchor.line, m.target.line)
                } else {
                    covering(buffer, anchor, clamp_char(buffer, m.target))
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
    ctx.set_selections(out);
    Ok(ActionOutcome::Executed)
}

fn toggle_charwise(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    match ctx.state.mode {
        Mode::Visual => collapse(ctx, buffer),
        Mode::VisualLine => {
            let sels = ctx
                .host
                .selections()
                .iter()
                .map(|sel| {
                    let (a, h) = line_endpoints(sel);
                    covering(buffer, Position::new(a, 0), clamp_char(buffer, Position::new(h, 0)))
                })
                .collect();
            ctx.set_selections(sels);
            ctx.state.mode = Mode::Visual;
        }
        Mode::Normal | Mode::Insert => {
            let sels = ctx
                .host
                .selections()
                .iter()
                .map(|sel| {
                    let c = entry_char(buffer, sel.active);
                    covering(buffer, c, c)
                })
                .collect();
            ctx.set_selections(sels);
            ctx.state.mode = Mode::Visual;
        }
    }
    Ok(())
}

fn toggle_linewise(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    if ctx.state.mode == Mode::VisualLine {
        collapse(ctx, buffer);
        return Ok(());
    }
    let visual = ctx.state.mode == Mode::Visual;
    let sels = ctx
        .host
        .selections()
        .iter()
        .map(|sel| {
            if visual {
                let (a, h) = char_endpoints(buffer, sel);
                line_covering(buffer, a.line, h.line)
            } else {
                let line = buffer.clamp(sel.active).line;
                line_covering(buffer, line, line)
            }
        })
        .collect();
    ctx.set_selections(sels);
    ctx.state.mode = Mode::VisualLine;
    Ok(())
}

fn swap_ends(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    let linewise = ctx.state.mode == Mode::VisualLine;
    let sels = ctx
        .host
        .selections()
        .iter()
        .map(|sel| {
            if linewise {
                let (a, h) = line_endpoints(sel);
                line_covering(buffer, h, a)
            } else {
                let (a, h) = char_endpoints(buffer, sel);
                covering(buffer, h, a)
            }
        })
        .collect();
    ctx.set_selections(sels);
    Ok(())
}

/// `d`, `y`, `c` (and `x`, `s`) over the current selections.
pub struct VisualOperatorAction {
    name: &'static str,
    kind: OperatorKind,
    pattern: KeyPattern,
}

impl VisualOperatorAction {
    pub fn new(name: &'static str, key: char, kind: OperatorKind) -> Self {
        Self {
            name,
            kind,
            pattern: KeyPattern::literal([KeyToken::Char(key)]),
        }
    }
}

impl Action for VisualOperatorAction {
    fn name(&self) -> &str {
        self.name
    }

    fn modes(&self) -> ModeSet {
        ModeSet::ANY_VISUAL
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        match self.pattern.parse(keys) {
            ParseOutcome::Match { .. } => {}
            ParseOutcome::NeedsMoreKeys => return Ok(ActionOutcome::NeedsMoreKeys),
            ParseOutcome::NoMatch => return Ok(ActionOutcome::NoMatch),
        }
        let buffer = ctx.buffer()?;
        let linewise = ctx.state.mode == Mode::VisualLine;
        let selections = ctx.host.selections();
        let ranges: Vec<(usize, Range)> = selections
            .iter()
            .enumerate()
            .map(|(idx, sel)| {
                let range = if linewise {
                    let (a, h) = line_endpoints(sel);
                    lines_span(&buffer, a.min(h), a.max(h), self.kind != OperatorKind::Change)
                } else {
                    sel.range()
                };
                (idx, range)
            })
            .collect();
        tracing::debug!(
            target: "actions.operator",
            operator = self.kind.name(),
            object = "selection",
            cursors = ranges.len(),
            "compose"
        );
        operator::apply(self.kind, ctx, &buffer, &selections, &ranges, true)?;
        Ok(ActionOutcome::Executed)
    }
}

/// Structural text objects (`iw`, `a(`, `ip`, ...) replace the selection.
pub struct VisualObjectAction {
    objects: Arc<Vec<Box<dyn TextObject>>>,
}

impl VisualObjectAction {
    pub fn new(objects: Arc<Vec<Box<dyn TextObject>>>) -> Self {
        Self { objects }
    }
}

impl Action for VisualObjectAction {
    fn name(&self) -> &str {
        "visual-text-object"
    }

    fn modes(&self) -> ModeSet {
        ModeSet::ANY_VISUAL
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        let buffer = ctx.buffer()?;
        let octx = ObjectContext {
            buffer: &buffer,
            placement: ctx.placement,
            last_find: ctx.state.last_find,
            operator: None,
        };
        let mode = ctx.state.mode;
        let selections = ctx.host.selections();
        let mut needs_more = false;
        for object in self.objects.iter() {
            let mut out = Vec::with_capacity(selections.len());
            let mut matched = false;
            let mut linewise = mode == Mode::VisualLine;
            for sel in &selections {
                match object.compute(&octx, head_of(&buffer, mode, sel), keys) {
                    TextObjectResult::Match(m) => {
                        matched = true;
                        let r = m.range;
                        match r.lines {
                            Some(l) => {
                                linewise = true;
                                out.push(line_covering(&buffer, l.first, l.last));
                            }
                            None if linewise => {
                                let last = step_back(&buffer, r.end).line;
                                out.push(line_covering(&buffer, r.start.line, last));
                            }
                            None => out.push(Selection::new(r.start, r.end)),
                        }
                    }
                    TextObjectResult::NeedsMoreKeys => {
                        needs_more = true;
                        out.push(*sel);
                    }
                    TextObjectResult::NoMatch => out.push(*sel),
                }
            }
            if matched {
                tracing::debug!(
                    target: "actions.dispatch",
                    object = object.name(),
                    "visual_object"
                );
                ctx.set_selections(out);
                if linewise {
                    ctx.state.mode = Mode::VisualLine;
                }
                return Ok(ActionOutcome::Executed);
            }
        }
        Ok(if needs_more {
            ActionOutcome::NeedsMoreKeys
        } else {
            ActionOutcome::NoMatch
        })
    }
}

/// Mode toggles, end swap, operators, paste and objects for the visual modes.
pub fn visual_actions(objects: Arc<Vec<Box<dyn TextObject>>>) -> Vec<Box<dyn Action>> {
    use crate::action::SimpleAction;
    use crate::paste;
    let lit = |c: char| KeyPattern::literal([KeyToken::Char(c)]);
    let both = ModeSet::NORMAL_AND_VISUAL;
    let visual = ModeSet::ANY_VISUAL;
    vec![
        Box::new(SimpleAction::new("visual-toggle", both, lit('v'), toggle_charwise)),
        Box::new(SimpleAction::new("visual-line-toggle", both, lit('V'), toggle_linewise)),
        Box::new(SimpleAction::new("visual-swap-ends", visual, lit('o'), swap_ends)),
        Box::new(VisualOperatorAction::new("visual-delete", 'd', OperatorKind::Delete)),
        Box::new(VisualOperatorAction::new("visual-delete-x", 'x', OperatorKind::Delete)),
        Box::new(VisualOperatorAction::new("visual-yank", 'y', OperatorKind::Yank)),
        Box::new(VisualOperatorAction::new("visual-change", 'c', OperatorKind::Change)),
        Box::new(VisualOperatorAction::new("visual-substitute", 's', OperatorKind::Change)),
        Box::new(SimpleAction::new("visual-paste", visual, lit('p'), paste::visual_paste)),
        Box::new(SimpleAction::new(
            "visual-paste-keep",
            visual,
            lit('P'),
            paste::visual_paste_keep,
        )),
        Box::new(VisualObjectAction::new(objects)),
    ]
}
