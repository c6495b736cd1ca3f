//! The `Action` trait and the context actions run against.
//!
//! An action receives the whole pending key sequence. It answers with one of
//! three outcomes: it ran, the keys are a strict prefix of something it would
//! run, or it has nothing to do with them. Actions touch the document only via
//! `ActionContext::host`.

use std::collections::BTreeMap;

use core_events::KeyToken;
use core_keymap::{Captures, KeyPattern, ParseOutcome};
use core_state::{ModeSet, RegisterEntry, Selection, SessionState};
use core_text::{Buffer, CursorPlacement, EditPlan, Position, TextEdit};

use crate::host::{EditorHost, HostError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Executed,
    NeedsMoreKeys,
    NoMatch,
}

pub struct ActionContext<'a> {
    pub host: &'a mut dyn EditorHost,
    pub state: &'a mut SessionState,
    pub placement: CursorPlacement,
    /// Line-comment token per language id.
    pub comments: &'a BTreeMap<String, String>,
}

impl ActionContext<'_> {
    pub fn buffer(&self) -> Result<Buffer, HostError> {
        self.host.buffer().ok_or(HostError::NoActiveEditor)
    }

    /// Apply `edits` as one atomic host edit and return the post-edit snapshot
    /// with the plan used to map offsets through it.
    pub fn commit(
        &mut self,
        buffer: &Buffer,
        edits: &[TextEdit],
    ) -> Result<(Buffer, EditPlan), HostError> {
        let mut after = buffer.clone();
        let plan = after.apply_edits(edits)?;
        if !edits.is_empty() {
            self.host.apply_edits(edits)?;
        }
        tracing::trace!(target: "actions.dispatch", edits = edits.len(), "commit");
        Ok((after, plan))
    }

    /// Replace the selection set with collapsed cursors. Duplicates fold into
    /// one; the first position stays primary and is revealed.
    pub fn set_cursors(&mut self, positions: Vec<Position>) {
        let mut seen = Vec::with_capacity(positions.len());
        for p in positions {
            if !seen.contains(&p) {
                seen.push(p);
            }
        }
        if let Some(first) = seen.first() {
            self.host.reveal(*first);
        }
        self.host
            .set_selections(seen.into_iter().map(Selection::cursor).collect());
    }

    pub fn set_selections(&mut self, selections: Vec<Selection>) {
        if let Some(first) = selections.first() {
            self.host.reveal(first.active);
        }
        self.host.set_selections(selections);
    }

    /// Store `entries` and mirror the joined text to the system clipboard.
    pub fn write_registers(&mut self, entries: Vec<RegisterEntry>) {
        if entries.is_empty() {
            return;
        }
        let text = self.state.registers.store(entries);
        match self.host.write_clipboard(&text) {
            Ok(()) => self.state.registers.note_clipboard_written(text),
            Err(e) => tracing::warn!(target: "registers", error = %e, "clipboard_write_failed"),
        }
    }

    /// Adopt external clipboard contents written since our last store.
    pub fn sync_registers(&mut self) {
        match self.host.read_clipboard() {
            Ok(text) => {
                if self.state.registers.sync_from_clipboard(&text) {
                    tracing::debug!(
                        target: "registers",
                        chars = text.chars().count(),
                        "clipboard_adopted"
                    );
                }
            }
            Err(e) => tracing::warn!(target: "registers", error = %e, "clipboard_read_failed"),
        }
    }
}

pub trait Action: Send + Sync {
    /// Stable identifier used for logging (kebab-case).
    fn name(&self) -> &str;
    fn modes(&self) -> ModeSet;
    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError>;
}

pub type Handler = fn(&mut ActionContext<'_>, &Buffer, &Captures) -> Result<(), HostError>;

/// Pattern plus a plain function. Most single-purpose commands are one of these.
pub struct SimpleAction {
    name: &'static str,
    modes: ModeSet,
    pattern: KeyPattern,
    handler: Handler,
}

impl SimpleAction {
    pub fn new(name: &'static str, modes: ModeSet, pattern: KeyPattern, handler: Handler) -> Self {
        Self {
            name,
            modes,
            pattern,
            handler,
        }
    }
}

impl Action for SimpleAction {
    fn name(&self) -> &str {
        self.name
    }

    fn modes(&self) -> ModeSet {
        self.modes
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        let vars = match self.pattern.parse(keys) {
            ParseOutcome::Match { vars, .. } => vars,
            ParseOutcome::NeedsMoreKeys => return Ok(ActionOutcome::NeedsMoreKeys),
            ParseOutcome::NoMatch => return Ok(ActionOutcome::NoMatch),
        };
        let buffer = ctx.buffer()?;
        (self.handler)(ctx, &buffer, &vars)?;
        Ok(ActionOutcome::Executed)
    }
}

/// User binding forwarded to a host command.
pub struct CommandAction {
    name: String,
    modes: ModeSet,
    pattern: KeyPattern,
    command: String,
    args: Option<toml::Value>,
}

impl CommandAction {
    pub fn new(
        pattern: KeyPattern,
        modes: ModeSet,
        command: impl Into<String>,
        args: Option<toml::Value>,
    ) -> Self {
        let command = command.into();
        Self {
            name: format!("command:{command}"),
            modes,
            pattern,
            command,
            args,
        }
    }
}

impl Action for CommandAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn modes(&self) -> ModeSet {
        self.modes
    }

    fn execute(
        &self,
        ctx: &mut ActionContext<'_>,
        keys: &[KeyToken],
    ) -> Result<ActionOutcome, HostError> {
        match self.pattern.parse(keys) {
            ParseOutcome::Match { .. } => {
                ctx.host.execute_command(&self.command, self.args.as_ref())?;
                Ok(ActionOutcome::Executed)
            }
            ParseOutcome::NeedsMoreKeys => Ok(ActionOutcome::NeedsMoreKeys),
            ParseOutcome::NoMatch => Ok(ActionOutcome::NoMatch),
        }
    }
}
