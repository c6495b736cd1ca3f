//! Operators: `d`, `y`, `c` composed with any text object.
//!
//! After the operator key the remaining keys go first to the whole-line object
//! (the doubled operator key), then to every registered object in order. The
//! first object that matches at any cursor wins. Cursors where it finds
//! nothing are left alone. All ranges are merged and removed in one atomic
//! edit, and their text is stored in the register in document order.

use std::sync::Arc;

use core_events::KeyToken;
use core_keymap::{KeyPattern, ParseOutcome, PatternError};
use core_state::{Mode, ModeSet, RegisterEntry, Selection};
use core_text::motion::first_non_blank_col;
use core_text::span::lines_span;
use core_text::{Buffer, Position, Range, TextEdit};

use crate::action::{Action, ActionContext, ActionOutcome};
use crate::host::HostError;
use crate::text_object::{LineObject, ObjectContext, TextObject, TextObjectResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Delete,
    Yank,
    Change,
}

impl OperatorKind {
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Delete => "delete",
            OperatorKind::Yank => "yank",
            OperatorKind::Change => "change",
        }
    }

    pub fn key(self) -> char {
        match self {
            OperatorKind::Delete => 'd',
            OperatorKind::Yank => 'y',
            OperatorKind::Change => 'c',
        }
    }
}

pub type ObjectList = Arc<Vec<Box<dyn TextObject>>>;

#[derive(Clone)]
pub struct OperatorAction {
    kind: OperatorKind,
    name: String,
    pattern: KeyPattern,
    line_object: LineObject,
    objects: ObjectList,
}

impl OperatorAction {
    pub fn new(kind: OperatorKind, objects: ObjectList) -> Self {
        let key = KeyPattern::literal([KeyToken::Char(kind.key())]);
        Self {
            kind,
            name: format!("operator-{}", kind.name()),
            pattern: key.clone(),
            line_object: LineObject::new(key, kind != OperatorKind::Change),
            objects,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Resolve `object_keys` at every cursor and run the operator on the result.
    pub fn compose(
        &self,
        ctx: &mut ActionContext<'_>,
        buffer: &Buffer,
        object_keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        let selections = ctx.host.selections();
        if selections.is_empty() {
            return Ok(ActionOutcome::NoMatch);
        }
        let octx = ObjectContext {
            buffer,
            placement: ctx.placement,
            last_find: ctx.state.last_find,
            operator: Some(self.kind),
        };
        let mut candidates: Vec<&dyn TextObject> = Vec::with_capacity(self.objects.len() + 1);
        candidates.push(&self.line_object);
        for object in self.objects.iter() {
            candidates.push(object.as_ref());
        }

        let mut needs_more = false;
        for object in candidates {
            let mut ranges = Vec::new();
            let mut find = None;
            for (idx, sel) in selections.iter().enumerate() {
                match object.compute(&octx, sel.active, object_keys) {
                    TextObjectResult::Match(m) => {
                        find = find.or(m.find);
                        ranges.push((idx, m.range));
                    }
                    TextObjectResult::NeedsMoreKeys => needs_more = true,
                    TextObjectResult::NoMatch => {}
                }
            }
            if ranges.is_empty() {
                continue;
            }
            tracing::debug!(
                target: "actions.operator",
                operator = self.kind.name(),
                object = object.name(),
                cursors = ranges.len(),
                "compose"
            );
            apply(self.kind, ctx, buffer, &selections, &ranges, false)?;
            if find.is_some() {
                ctx.state.last_find = find;
            }
            return Ok(ActionOutcome::Executed);
        }
        Ok(if needs_more {
            ActionOutcome::NeedsMoreKeys
        } else {
            ActionOutcome::NoMatch
        })
    }
}

impl Action for OperatorAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn modes(&self) -> ModeSet {
        ModeSet::NORMAL
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        let remainder = match self.pattern.parse(keys) {
            ParseOutcome::Match { remainder, .. } => remainder,
            ParseOutcome::NeedsMoreKeys => return Ok(ActionOutcome::NeedsMoreKeys),
            ParseOutcome::NoMatch => return Ok(ActionOutcome::NoMatch),
        };
        if remainder.is_empty() {
            return Ok(ActionOutcome::NeedsMoreKeys);
        }
        let buffer = ctx.buffer()?;
        self.compose(ctx, &buffer, &remainder)
    }
}

/// One-key shorthand for an operator with fixed object keys (`x` = `dl`).
pub struct ShorthandAction {
    name: &'static str,
    pattern: KeyPattern,
    operator: OperatorAction,
    object_keys: Vec<KeyToken>,
}

impl ShorthandAction {
    pub fn new(
        name: &'static str,
        keys: &str,
        operator: OperatorAction,
        object: &str,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            name,
            pattern: KeyPattern::keys(keys)?,
            operator,
            object_keys: core_events::parse_keys(object)?,
        })
    }
}

impl Action for ShorthandAction {
    fn name(&self) -> &str {
        self.name
    }

    fn modes(&self) -> ModeSet {
        ModeSet::NORMAL
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
        match self.operator.compose(ctx, &buffer, &self.object_keys)? {
            ActionOutcome::Executed => {}
            // Nothing to act on (e.g. `x` on an empty line); Change still enters Insert.
            _ if self.operator.kind() == OperatorKind::Change => ctx.state.mode = Mode::Insert,
            _ => {}
        }
        Ok(ActionOutcome::Executed)
    }
}

/// Whether a linewise range swallows a line break beyond its own lines.
fn takes_break(r: &Range) -> bool {
    r.lines.is_some_and(|l| r.start.line < l.first || r.end.line > l.last)
}

/// Sort and fold overlapping ranges. Linewise ranges stay linewise only when
/// every folded part was; their union is rebuilt from the combined lines so
/// it takes exactly one break.
pub(crate) fn merge_ranges(buffer: &Buffer, mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut out: Vec<Range> = Vec::with_capacity(ranges.len());
    for r in ranges {
        if let Some(last) = out.last_mut()
            && (r.start < last.end || r == *last)
        {
            *last = match (last.lines, r.lines) {
                (Some(a), Some(b)) => lines_span(
                    buffer,
                    a.first.min(b.first),
                    a.last.max(b.last),
                    takes_break(last) || takes_break(&r),
                ),
                _ => Range::new(last.start, last.end.max(r.end)),
            };
            continue;
        }
        out.push(r);
    }
    out
}

/// Register entry for a range: whole lines when linewise, the raw slice otherwise.
pub(crate) fn register_entry(buffer: &Buffer, range: &Range) -> RegisterEntry {
    match range.lines {
        Some(l) => RegisterEntry::linewise(buffer.lines_text(l.first, l.last)),
        None => RegisterEntry::charwise(buffer.slice(range)),
    }
}

/// Run `kind` over per-cursor `ranges` (`(selection index, range)`).
///
/// Selections without a range keep their cursor (mapped through the edit).
/// `from_visual` places a linewise yank at the start of the first line.
pub(crate) fn apply(
    kind: OperatorKind,
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    selections: &[Selection],
    ranges: &[(usize, Range)],
    from_visual: bool,
) -> Result<(), HostError> {
    let merged = merge_ranges(buffer, ranges.iter().map(|(_, r)| *r).collect());
    let entries: Vec<RegisterEntry> = merged
        .iter()
        .map(|r| register_entry(buffer, r))
        .filter(|e| !e.text.is_empty())
        .collect();

    let range_for = |idx: usize| ranges.iter().find(|(i, _)| *i == idx).map(|(_, r)| *r);
    let cursor_of = |sel: &Selection| {
        if from_visual {
            sel.start()
        } else {
            sel.active
        }
    };

    if kind == OperatorKind::Yank {
        ctx.write_registers(entries);
        let cursors: Vec<Position> = selections
            .iter()
            .enumerate()
            .map(|(idx, sel)| match range_for(idx) {
                Some(r) if r.is_linewise() && !from_visual => sel.active,
                Some(r) => match r.lines {
                    Some(l) => Position::new(l.first, 0),
                    None => r.start,
                },
                None => cursor_of(sel),
            })
            .map(|p| ctx.placement.clamp(buffer, p))
            .collect();
        ctx.set_cursors(cursors);
        ctx.state.mode = Mode::Normal;
        return Ok(());
    }

    let edits: Vec<TextEdit> = merged
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| TextEdit::delete(*r))
        .collect();
    let (after, plan) = ctx.commit(buffer, &edits)?;
    // Only a landed edit replaces the register.
    ctx.write_registers(entries);
    let cursors: Vec<Position> = selections
        .iter()
        .enumerate()
        .map(|(idx, sel)| {
            let (origin, linewise) = match range_for(idx) {
                Some(r) => (r.start, r.is_linewise()),
                None => (cursor_of(sel), false),
            };
            let mut pos = after.position_at(plan.map_offset(buffer.offset_of(origin)));
            if kind == OperatorKind::Delete {
                if linewise {
                    pos.col = first_non_blank_col(&after, pos.line);
                }
                pos = ctx.placement.clamp(&after, pos);
            }
            pos
        })
        .collect();
    ctx.set_cursors(cursors);
    ctx.state.mode = if kind == OperatorKind::Change {
        Mode::Insert
    } else {
        Mode::Normal
    };
    Ok(())
}

/// `d`, `y`, `c` plus their shorthands, all sharing one object list.
pub fn default_operators(objects: ObjectList) -> Result<Vec<Box<dyn Action>>, PatternError> {
    let delete = OperatorAction::new(OperatorKind::Delete, objects.clone());
    let yank = OperatorAction::new(OperatorKind::Yank, objects.clone());
    let change = OperatorAction::new(OperatorKind::Change, objects);
    let shorthands = [
        ("delete-char", "x", &delete, "l"),
        ("delete-char-before", "X", &delete, "h"),
        ("delete-to-line-end", "D", &delete, "$"),
        ("change-to-line-end", "C", &change, "$"),
        ("substitute-char", "s", &change, "l"),
        ("substitute-line", "S", &change, "c"),
        ("yank-line", "Y", &yank, "y"),
    ];
    let mut out: Vec<Box<dyn Action>> = Vec::new();
    for (name, keys, op, object) in shorthands {
        out.push(Box::new(ShorthandAction::new(name, keys, op.clone(), object)?));
    }
    out.push(Box::new(delete));
    out.push(Box::new(yank));
    out.push(Box::new(change));
    Ok(out)
}
