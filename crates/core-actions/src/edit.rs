//! Mode entry, Insert-mode typing and the small single-key edits
//! (`o`, `O`, `r`, `J`, `<Esc>`).

use core_events::{KeyToken, NamedKey};
use core_keymap::{Captures, KeyPattern, PatternError};
use core_state::{Mode, ModeSet};
use core_text::motion::first_non_blank_col;
use core_text::{Buffer, Position, Range, TextEdit};

use crate::action::{Action, ActionContext, ActionOutcome, SimpleAction};
use crate::host::HostError;
use crate::visual;

/// Cursor positions of every selection, deduplicated, primary first.
fn cursors(ctx: &ActionContext<'_>, buffer: &Buffer) -> Vec<Position> {
    let mut out: Vec<Position> = Vec::new();
    for sel in ctx.host.selections() {
        let p = buffer.clamp(sel.active);
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Distinct cursor lines, primary first.
fn cursor_lines(ctx: &ActionContext<'_>, buffer: &Buffer) -> Vec<usize> {
    let mut out = Vec::new();
    for p in cursors(ctx, buffer) {
        if !out.contains(&p.line) {
            out.push(p.line);
        }
    }
    out
}

fn enter_insert_at(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    place: impl Fn(&Buffer, Position) -> Position,
) {
    let moved = cursors(ctx, buffer).into_iter().map(|p| place(buffer, p)).collect();
    ctx.set_cursors(moved);
    ctx.state.mode = Mode::Insert;
    tracing::debug!(target: "input.dispatch", mode = "insert", "mode_enter");
}

fn insert_before(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    enter_insert_at(ctx, buffer, |_, p| p);
    Ok(())
}

fn append(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    enter_insert_at(ctx, buffer, |b, p| Position::new(p.line, (p.col + 1).min(b.line_len(p.line))));
    Ok(())
}

fn insert_line_start(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    enter_insert_at(ctx, buffer, |b, p| Position::new(p.line, first_non_blank_col(b, p.line)));
    Ok(())
}

fn append_line_end(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    enter_insert_at(ctx, buffer, |b, p| Position::new(p.line, b.line_len(p.line)));
    Ok(())
}

fn indent_of(buffer: &Buffer, line: usize) -> String {
    buffer
        .line_content(line)
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

fn open_line(ctx: &mut ActionContext<'_>, buffer: &Buffer, below: bool) -> Result<(), HostError> {
    let lines = cursor_lines(ctx, buffer);
    let edits: Vec<TextEdit> = lines
        .iter()
        .map(|&line| {
            let indent = indent_of(buffer, line);
            if below {
                TextEdit::insert(Position::new(line, buffer.line_len(line)), format!("\n{indent}"))
            } else {
                TextEdit::insert(Position::new(line, 0), format!("{indent}\n"))
            }
        })
        .collect();
    let (after, plan) = ctx.commit(buffer, &edits)?;
    let moved = edits
        .iter()
        .enumerate()
        .filter_map(|(idx, edit)| {
            let offset = if below {
                plan.mapped_end(idx)?
            } else {
                plan.mapped_start(idx)? + edit.text.chars().count() - 1
            };
            Some(after.position_at(offset))
        })
        .collect();
    ctx.set_cursors(moved);
    ctx.state.mode = Mode::Insert;
    Ok(())
}

fn open_below(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    open_line(ctx, buffer, true)
}

fn open_above(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    open_line(ctx, buffer, false)
}

/// `r<char>`: replace the char under every cursor. `<CR>` splits the line;
/// any other non-printable key cancels.
fn replace_char(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    vars: &Captures,
) -> Result<(), HostError> {
    let text = match vars.get("char") {
        Some(KeyToken::Char(c)) => c.to_string(),
        Some(KeyToken::Named(NamedKey::Enter)) => "\n".to_string(),
        _ => return Ok(()),
    };
    let targets: Vec<Position> = cursors(ctx, buffer)
        .into_iter()
        .filter(|p| p.col < buffer.line_len(p.line))
        .collect();
    let edits: Vec<TextEdit> = targets
        .iter()
        .map(|p| TextEdit::replace(Range::new(*p, Position::new(p.line, p.col + 1)), text.clone()))
        .collect();
    let (after, plan) = ctx.commit(buffer, &edits)?;
    let moved = (0..edits.len())
        .filter_map(|idx| {
            let offset = if text == "\n" {
                plan.mapped_end(idx)?
            } else {
                plan.mapped_start(idx)?
            };
            Some(after.position_at(offset))
        })
        .collect();
    tracing::trace!(target: "actions.dispatch", op = "replace_char", cursors = edits.len(), "edit");
    if !edits.is_empty() {
        ctx.set_cursors(moved);
    }
    Ok(())
}

/// Chars of `next` to drop when joining it onto `current`: leading blanks,
/// plus the comment token (and the blanks after it) when both are comments.
fn join_skip(current: &str, next: &str, comment: Option<&str>) -> usize {
    let indent = next.chars().take_while(|c| c.is_whitespace()).count();
    let rest: String = next.chars().skip(indent).collect();
    let Some(token) = comment.filter(|t| !t.is_empty()) else {
        return indent;
    };
    if !current.trim_start().starts_with(token) || !rest.starts_with(token) {
        return indent;
    }
    let after_token = &rest[token.len()..];
    indent + token.chars().count() + after_token.chars().take_while(|c| c.is_whitespace()).count()
}

fn join_lines(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    let comment = ctx
        .host
        .language_id()
        .and_then(|lang| ctx.comments.get(&lang).cloned());
    let lines: Vec<usize> = cursor_lines(ctx, buffer)
        .into_iter()
        .filter(|&l| l < buffer.last_line())
        .collect();
    let edits: Vec<TextEdit> = lines
        .iter()
        .map(|&line| {
            let current = buffer.line_content(line);
            let next = buffer.line_content(line + 1);
            let skip = join_skip(&current, &next, comment.as_deref());
            let rest: String = next.chars().skip(skip).collect();
            let bare = current.is_empty() || current.ends_with(char::is_whitespace);
            let sep = if bare || rest.is_empty() || rest.starts_with(')') {
                ""
            } else {
                " "
            };
            let range = Range::new(
                Position::new(line, buffer.line_len(line)),
                Position::new(line + 1, skip),
            );
            TextEdit::replace(range, sep)
        })
        .collect();
    let (after, plan) = ctx.commit(buffer, &edits)?;
    let moved: Vec<Position> = (0..edits.len())
        .filter_map(|idx| plan.mapped_start(idx))
        .map(|offset| ctx.placement.clamp(&after, after.position_at(offset)))
        .collect();
    tracing::trace!(target: "actions.dispatch", op = "join", lines = edits.len(), "edit");
    if !moved.is_empty() {
        ctx.set_cursors(moved);
    }
    Ok(())
}

fn escape(ctx: &mut ActionContext<'_>, buffer: &Buffer, _: &Captures) -> Result<(), HostError> {
    match ctx.state.mode {
        Mode::Normal => {
            // Already in Normal: fold every cursor into the primary one.
            if let Some(primary) = ctx.host.selections().first() {
                let p = ctx.placement.clamp(buffer, primary.active);
                ctx.set_cursors(vec![p]);
            }
        }
        Mode::Insert => {
            let moved = cursors(ctx, buffer)
                .into_iter()
                .map(|p| ctx.placement.after_insert(buffer, p))
                .collect();
            ctx.set_cursors(moved);
            ctx.state.mode = Mode::Normal;
        }
        Mode::Visual | Mode::VisualLine => visual::collapse(ctx, buffer),
    }
    tracing::debug!(target: "input.dispatch", mode = "normal", "mode_enter");
    Ok(())
}

/// Typing in Insert mode: printable keys, `<CR>`, `<Tab>`, `<BS>` and `<Del>`
/// at every cursor. A non-empty selection is replaced by the typed text.
pub struct InsertTextAction;

enum Typed {
    Text(String),
    DeleteBefore,
    DeleteAfter,
}

impl InsertTextAction {
    fn classify(key: &KeyToken) -> Option<Typed> {
        match key {
            KeyToken::Char(c) => Some(Typed::Text(c.to_string())),
            KeyToken::Named(NamedKey::Enter) => Some(Typed::Text("\n".to_string())),
            KeyToken::Named(NamedKey::Tab) => Some(Typed::Text("\t".to_string())),
            KeyToken::Named(NamedKey::Backspace) => Some(Typed::DeleteBefore),
            KeyToken::Named(NamedKey::Delete) => Some(Typed::DeleteAfter),
            _ => None,
        }
    }
}

impl Action for InsertTextAction {
    fn name(&self) -> &str {
        "insert-text"
    }

    fn modes(&self) -> ModeSet {
        ModeSet::INSERT
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        let [key] = keys else {
            return Ok(ActionOutcome::NoMatch);
        };
        let Some(typed) = Self::classify(key) else {
            return Ok(ActionOutcome::NoMatch);
        };
        let buffer = ctx.buffer()?;
        let mut selections = ctx.host.selections();
        selections.dedup();
        let end = buffer.end_position();
        // (selection index, edit); cursors with nothing to delete get no edit.
        let mut edits: Vec<(usize, TextEdit)> = Vec::new();
        for (idx, sel) in selections.iter().enumerate() {
            let range = sel.range();
            let p = buffer.clamp(sel.active);
            let edit = match &typed {
                Typed::Text(text) => Some(TextEdit::replace(range, text.clone())),
                _ if !range.is_empty() => Some(TextEdit::delete(range)),
                Typed::DeleteBefore if p.col > 0 => {
                    Some(TextEdit::delete(Range::new(Position::new(p.line, p.col - 1), p)))
                }
                Typed::DeleteBefore if p.line > 0 => Some(TextEdit::delete(Range::new(
                    Position::new(p.line - 1, buffer.line_len(p.line - 1)),
                    p,
                ))),
                Typed::DeleteAfter if p < end => {
                    let next = if p.col < buffer.line_len(p.line) {
                        Position::new(p.line, p.col + 1)
                    } else {
                        Position::new(p.line + 1, 0)
                    };
                    Some(TextEdit::delete(Range::new(p, next)))
                }
                _ => None,
            };
            if let Some(edit) = edit {
                edits.push((idx, edit));
            }
        }
        let plain: Vec<TextEdit> = edits.iter().map(|(_, e)| e.clone()).collect();
        let (after, plan) = ctx.commit(&buffer, &plain)?;
        let moved = selections
            .iter()
            .enumerate()
            .map(|(idx, sel)| {
                let offset = match edits.iter().position(|(i, _)| *i == idx) {
                    Some(k) => plan.mapped_end(k).unwrap_or_default(),
                    None => plan.map_offset(buffer.offset_of(sel.active)),
                };
                after.position_at(offset)
            })
            .collect();
        tracing::trace!(
            target: "actions.dispatch",
            op = "insert",
            key = %key,
            cursors = selections.len(),
            "edit"
        );
        ctx.set_cursors(moved);
        Ok(ActionOutcome::Executed)
    }
}

/// Escape, Insert typing, mode entry and the single-key edits.
pub fn edit_actions() -> Result<Vec<Box<dyn Action>>, PatternError> {
    let lit = |c: char| KeyPattern::literal([KeyToken::Char(c)]);
    let all = ModeSet::NORMAL | ModeSet::INSERT | ModeSet::ANY_VISUAL;
    Ok(vec![
        Box::new(SimpleAction::new("escape", all, KeyPattern::literal([KeyToken::esc()]), escape)),
        Box::new(InsertTextAction),
        Box::new(SimpleAction::new("insert", ModeSet::NORMAL, lit('i'), insert_before)),
        Box::new(SimpleAction::new("append", ModeSet::NORMAL, lit('a'), append)),
        Box::new(SimpleAction::new(
            "insert-line-start",
            ModeSet::NORMAL,
            lit('I'),
            insert_line_start,
        )),
        Box::new(SimpleAction::new("append-line-end", ModeSet::NORMAL, lit('A'), append_line_end)),
        Box::new(SimpleAction::new("open-below", ModeSet::NORMAL, lit('o'), open_below)),
        Box::new(SimpleAction::new("open-above", ModeSet::NORMAL, lit('O'), open_above)),
        Box::new(SimpleAction::new(
            "replace-char",
            ModeSet::NORMAL,
            KeyPattern::placeholder("r", "char")?,
            replace_char,
        )),
        Box::new(SimpleAction::new("join-lines", ModeSet::NORMAL, lit('J'), join_lines)),
    ])
}
