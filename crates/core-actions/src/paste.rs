//! `p` / `P` in Normal and Visual modes.
//!
//! Register contents are synced from the host clipboard first, so text copied
//! outside the editor pastes as expected. When the register holds one entry
//! per cursor each cursor pastes its own; otherwise every cursor pastes the
//! joined text.

use core_keymap::Captures;
use core_state::{Mode, RegisterEntry, Selection};
use core_text::motion::first_non_blank_col;
use core_text::span::lines_span;
use core_text::{Buffer, Position, Range, TextEdit};

use crate::action::ActionContext;
use crate::host::HostError;
use crate::operator::register_entry;
use crate::visual::line_endpoints;

fn body(entry: &RegisterEntry) -> &str {
    if entry.linewise {
        entry.text.strip_suffix('\n').unwrap_or(&entry.text)
    } else {
        &entry.text
    }
}

/// Register entries lined up with `selections`. Entries are stored in
/// document order, so each selection takes the entry at its rank by position.
fn entries_for(ctx: &mut ActionContext<'_>, selections: &[Selection]) -> Vec<RegisterEntry> {
    ctx.sync_registers();
    let entries = ctx.state.registers.for_cursors(selections.len());
    if entries.is_empty() {
        tracing::debug!(target: "actions.paste", "paste_empty_register");
    }
    by_position(selections, entries)
}

fn by_position(selections: &[Selection], entries: Vec<RegisterEntry>) -> Vec<RegisterEntry> {
    if entries.len() != selections.len() {
        return entries;
    }
    let mut order: Vec<usize> = (0..selections.len()).collect();
    order.sort_by_key(|&idx| selections[idx].start());
    let mut slots: Vec<Option<RegisterEntry>> = vec![None; selections.len()];
    for (entry, idx) in entries.into_iter().zip(order) {
        slots[idx] = Some(entry);
    }
    slots.into_iter().flatten().collect()
}

/// Normal-mode paste after (`p`) or before (`P`) each cursor.
pub fn paste(ctx: &mut ActionContext<'_>, buffer: &Buffer, after: bool) -> Result<(), HostError> {
    let selections = ctx.host.selections();
    let entries = entries_for(ctx, &selections);
    if entries.is_empty() {
        return Ok(());
    }
    let edits: Vec<TextEdit> = selections
        .iter()
        .zip(&entries)
        .map(|(sel, entry)| {
            let pos = buffer.clamp(sel.active);
            let len = buffer.line_len(pos.line);
            match (entry.linewise, after) {
                (true, true) => {
                    TextEdit::insert(Position::new(pos.line, len), format!("\n{}", body(entry)))
                }
                (true, false) => TextEdit::insert(Position::new(pos.line, 0), entry.text.clone()),
                (false, true) => {
                    let at = Position::new(pos.line, (pos.col + 1).min(len));
                    TextEdit::insert(at, entry.text.clone())
                }
                (false, false) => TextEdit::insert(pos, entry.text.clone()),
            }
        })
        .collect();
    let (after_buf, plan) = ctx.commit(buffer, &edits)?;
    let cursors: Vec<Position> = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let start = plan.mapped_start(idx)?;
            let pos = if entry.linewise {
                let skip = usize::from(after);
                let line = after_buf.position_at(start + skip).line;
                Position::new(line, first_non_blank_col(&after_buf, line))
            } else {
                let end = plan.mapped_end(idx)?;
                after_buf.position_at(end.saturating_sub(1).max(start))
            };
            Some(ctx.placement.clamp(&after_buf, pos))
        })
        .collect();
    tracing::debug!(target: "actions.paste", op = "paste", after, cursors = cursors.len(), "edit");
    ctx.set_cursors(cursors);
    Ok(())
}

/// Replacement text for one selection, keeping line structure intact.
fn replacement(range: &Range, entry: &RegisterEntry) -> String {
    match range.lines {
        // The range swallowed the break before its first line.
        Some(l) if range.start.line < l.first => format!("\n{}", body(entry)),
        Some(_) => format!("{}\n", body(entry)),
        None if entry.linewise => format!("\n{}", entry.text),
        None => entry.text.clone(),
    }
}

/// Visual-mode paste: each selection is replaced by register text. `p` also
/// stores the replaced text; `P` leaves the register untouched.
pub fn paste_over_selection(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    store_replaced: bool,
) -> Result<(), HostError> {
    let selections = ctx.host.selections();
    let entries = entries_for(ctx, &selections);
    let linewise = ctx.state.mode == Mode::VisualLine;
    let ranges: Vec<Range> = selections
        .iter()
        .map(|sel| {
            if linewise {
                let (a, h) = line_endpoints(sel);
                lines_span(buffer, a.min(h), a.max(h), true)
            } else {
                sel.range()
            }
        })
        .collect();
    if entries.is_empty() {
        crate::visual::collapse(ctx, buffer);
        return Ok(());
    }
    let mut in_order = ranges.clone();
    in_order.sort_by_key(|r| r.start);
    let replaced: Vec<RegisterEntry> = in_order.iter().map(|r| register_entry(buffer, r)).collect();
    let edits: Vec<TextEdit> = ranges
        .iter()
        .zip(&entries)
        .map(|(range, entry)| TextEdit::replace(*range, replacement(range, entry)))
        .collect();
    let (after_buf, plan) = ctx.commit(buffer, &edits)?;
    let cursors: Vec<Position> = edits
        .iter()
        .enumerate()
        .filter_map(|(idx, edit)| {
            let mut start = plan.mapped_start(idx)?;
            if edit.text.starts_with('\n') {
                start += 1;
            }
            let mut pos = after_buf.position_at(start);
            if edit.range.is_linewise() || entries.get(idx).is_some_and(|e| e.linewise) {
                pos.col = first_non_blank_col(&after_buf, pos.line);
            }
            Some(ctx.placement.clamp(&after_buf, pos))
        })
        .collect();
    if store_replaced {
        ctx.write_registers(replaced);
    }
    ctx.set_cursors(cursors);
    ctx.state.mode = Mode::Normal;
    Ok(())
}

pub(crate) fn paste_after(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    paste(ctx, buffer, true)
}

pub(crate) fn paste_before(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    paste(ctx, buffer, false)
}

pub(crate) fn visual_paste(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    paste_over_selection(ctx, buffer, true)
}

pub(crate) fn visual_paste_keep(
    ctx: &mut ActionContext<'_>,
    buffer: &Buffer,
    _: &Captures,
) -> Result<(), HostError> {
    paste_over_selection(ctx, buffer, false)
}
