//! Host editor boundary.
//!
//! The engine never owns the document. Everything it reads or writes goes
//! through `EditorHost`: a snapshot of the active buffer, the selection set,
//! one atomic multi-range edit, the clipboard and command execution.
//! `MemoryHost` is the in-process implementation used by the CLI and tests.

use core_state::Selection;
use core_text::{Buffer, EditError, Position, TextEdit};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("no active editor")]
    NoActiveEditor,
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

pub trait EditorHost {
    /// Snapshot of the active document, `None` when no editor is focused.
    /// Snapshots are cheap rope clones and stay valid after later edits.
    fn buffer(&self) -> Option<Buffer>;

    /// Language id of the active document (drives the line-comment lookup).
    fn language_id(&self) -> Option<String> {
        None
    }

    /// Current selections; the first one is the primary cursor. Never empty
    /// while a buffer is available.
    fn selections(&self) -> Vec<Selection>;

    fn set_selections(&mut self, selections: Vec<Selection>);

    /// Apply every edit against the same pre-edit snapshot, all or nothing.
    fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<(), HostError>;

    /// Cosmetic hint to scroll `pos` into view.
    fn reveal(&mut self, _pos: Position) {}

    fn read_clipboard(&mut self) -> Result<String, ClipboardError>;

    fn write_clipboard(&mut self, text: &str) -> Result<(), ClipboardError>;

    fn execute_command(
        &mut self,
        command: &str,
        args: Option<&toml::Value>,
    ) -> Result<(), HostError>;
}

/// In-memory host: owns a buffer, a selection list and an optional clipboard.
#[derive(Clone)]
pub struct MemoryHost {
    pub buffer: Option<Buffer>,
    pub selections: Vec<Selection>,
    /// `None` simulates an unavailable system clipboard.
    pub clipboard: Option<String>,
    pub language: Option<String>,
    pub executed: Vec<(String, Option<toml::Value>)>,
    pub revealed: Option<Position>,
}

impl MemoryHost {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer: Some(buffer),
            selections: vec![Selection::cursor(Position::origin())],
            clipboard: Some(String::new()),
            language: None,
            executed: Vec::new(),
            revealed: None,
        }
    }

    /// Host with no focused editor.
    pub fn detached() -> Self {
        Self {
            buffer: None,
            selections: Vec::new(),
            clipboard: Some(String::new()),
            language: None,
            executed: Vec::new(),
            revealed: None,
        }
    }

    pub fn with_cursors(mut self, cursors: impl IntoIterator<Item = Position>) -> Self {
        self.selections = cursors.into_iter().map(Selection::cursor).collect();
        if self.selections.is_empty() {
            self.selections.push(Selection::cursor(Position::origin()));
        }
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn without_clipboard(mut self) -> Self {
        self.clipboard = None;
        self
    }

    pub fn text(&self) -> String {
        self.buffer.as_ref().map(Buffer::text).unwrap_or_default()
    }

    pub fn cursors(&self) -> Vec<Position> {
        self.selections.iter().map(|s| s.active).collect()
    }
}

impl EditorHost for MemoryHost {
    fn buffer(&self) -> Option<Buffer> {
        self.buffer.clone()
    }

    fn language_id(&self) -> Option<String> {
        self.language.clone()
    }

    fn selections(&self) -> Vec<Selection> {
        self.selections.clone()
    }

    fn set_selections(&mut self, selections: Vec<Selection>) {
        self.selections = selections;
    }

    fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<(), HostError> {
        let buffer = self.buffer.as_mut().ok_or(HostError::NoActiveEditor)?;
        buffer.apply_edits(edits)?;
        Ok(())
    }

    fn reveal(&mut self, pos: Position) {
        self.revealed = Some(pos);
    }

    fn read_clipboard(&mut self) -> Result<String, ClipboardError> {
        self.clipboard
            .clone()
            .ok_or_else(|| ClipboardError::Unavailable("no clipboard".to_string()))
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), ClipboardError> {
        match self.clipboard.as_mut() {
            Some(slot) => {
                *slot = text.to_string();
                Ok(())
            }
            None => Err(ClipboardError::Unavailable("no clipboard".to_string())),
        }
    }

    fn execute_command(
        &mut self,
        command: &str,
        args: Option<&toml::Value>,
    ) -> Result<(), HostError> {
        self.executed.push((command.to_string(), args.cloned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Range;

    #[test]
    fn memory_host_applies_edits_atomically() {
        let mut host = MemoryHost::new(Buffer::from_str("t", "abc"));
        let bad = [
            TextEdit::delete(Range::new(Position::new(0, 0), Position::new(0, 2))),
            TextEdit::delete(Range::new(Position::new(0, 1), Position::new(0, 3))),
        ];
        assert!(host.apply_edits(&bad).is_err());
        assert_eq!(host.text(), "abc");
        host.apply_edits(&[TextEdit::insert(Position::new(0, 3), "d")])
            .unwrap();
        assert_eq!(host.text(), "abcd");
    }

    #[test]
    fn clipboard_can_be_unavailable() {
        let mut host = MemoryHost::new(Buffer::from_str("t", "")).without_clipboard();
        assert!(host.read_clipboard().is_err());
        assert!(host.write_clipboard("x").is_err());
    }

    #[test]
    fn detached_host_has_no_buffer() {
        let host = MemoryHost::detached();
        assert!(host.buffer().is_none());
        assert!(host.selections().is_empty());
    }
}
