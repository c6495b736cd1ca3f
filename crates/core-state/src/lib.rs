//! Per-session modal state: current mode, pending keys, selections, the
//! register store and the last character search.
//!
//! Everything here is plain data mutated in place by the engine on the input
//! thread. Actions receive it by `&mut` for the duration of one keystroke.

use core_events::{KeyToken, format_keys};
use core_text::motion::{FindDirection, FindDistance};
use core_text::{Position, Range};
use tracing::{debug, trace};

/// Current editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Normal command/navigation mode.
    #[default]
    Normal,
    /// Insert text mode.
    Insert,
    /// Visual character-wise selection mode.
    Visual,
    /// Visual line-wise selection mode.
    VisualLine,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Insert => "insert",
            Mode::Visual => "visual",
            Mode::VisualLine => "visual-line",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Mode::Normal),
            "insert" => Some(Mode::Insert),
            "visual" => Some(Mode::Visual),
            "visual-line" | "visualline" | "visual_line" => Some(Mode::VisualLine),
            _ => None,
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }
}

bitflags::bitflags! {
    /// Modes in which an action is eligible for dispatch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModeSet: u8 {
        const NORMAL = 1;
        const INSERT = 2;
        const VISUAL = 4;
        const VISUAL_LINE = 8;
        const ANY_VISUAL = Self::VISUAL.bits() | Self::VISUAL_LINE.bits();
        const NORMAL_AND_VISUAL = Self::NORMAL.bits() | Self::ANY_VISUAL.bits();
    }
}

impl ModeSet {
    pub fn allows(self, mode: Mode) -> bool {
        self.contains(ModeSet::from(mode))
    }
}

impl From<Mode> for ModeSet {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Normal => ModeSet::NORMAL,
            Mode::Insert => ModeSet::INSERT,
            Mode::Visual => ModeSet::VISUAL,
            Mode::VisualLine => ModeSet::VISUAL_LINE,
        }
    }
}

/// Keys typed since the last resolved action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBuffer {
    keys: Vec<KeyToken>,
}

impl KeyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: KeyToken) {
        self.keys.push(key);
        trace!(target: "input.keys", pending = %format_keys(&self.keys), "key_buffer_push");
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn keys(&self) -> &[KeyToken] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn rendered(&self) -> String {
        format_keys(&self.keys)
    }
}

/// One cursor: a fixed `anchor` and a moving `active` end.
/// An empty selection (`anchor == active`) is a plain cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    pub fn cursor(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.active)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.active)
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor, self.active)
    }

    pub fn swapped(self) -> Self {
        Self::new(self.active, self.anchor)
    }
}

/// Text captured by one cursor of a yank or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub text: String,
    pub linewise: bool,
}

impl RegisterEntry {
    /// Linewise entries are normalized to end with exactly the line break they carried.
    pub fn new(text: impl Into<String>, linewise: bool) -> Self {
        let mut text = text.into();
        if linewise && !text.ends_with('\n') {
            text.push('\n');
        }
        Self { text, linewise }
    }

    pub fn charwise(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    pub fn linewise(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    /// Content read from the external clipboard. A trailing line break marks it linewise.
    pub fn from_clipboard(text: &str) -> Self {
        Self::new(text, text.ends_with('\n'))
    }

    fn body(&self) -> &str {
        if self.linewise {
            self.text.strip_suffix('\n').unwrap_or(&self.text)
        } else {
            &self.text
        }
    }
}

/// Last yanked/deleted content, one entry per contributing cursor, plus the
/// text most recently mirrored to the host clipboard.
#[derive(Debug, Clone, Default)]
pub struct RegisterStore {
    entries: Vec<RegisterEntry>,
    clipboard_snapshot: Option<String>,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RegisterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the register contents. Returns the text to mirror to the
    /// clipboard; call `note_clipboard_written` once that succeeds.
    pub fn store(&mut self, entries: Vec<RegisterEntry>) -> String {
        debug!(target: "registers", entries = entries.len(), "register_store");
        self.entries = entries;
        self.clipboard_snapshot = None;
        self.clipboard_text()
    }

    pub fn note_clipboard_written(&mut self, text: String) {
        self.clipboard_snapshot = Some(text);
    }

    /// Adopt clipboard content written by someone else since our last write.
    ///
    /// Content is adopted when it differs from the snapshot of our own last
    /// write. When our last write never reached the clipboard there is no
    /// snapshot, so the clipboard is compared with the entries themselves.
    pub fn sync_from_clipboard(&mut self, clipboard: &str) -> bool {
        if clipboard.is_empty() {
            return false;
        }
        let external = match &self.clipboard_snapshot {
            Some(snapshot) => snapshot != clipboard,
            None => self.entries.is_empty() || self.clipboard_text() != clipboard,
        };
        if external {
            debug!(target: "registers", len = clipboard.len(), "register_adopt_clipboard");
            self.entries = vec![RegisterEntry::from_clipboard(clipboard)];
            self.clipboard_snapshot = Some(clipboard.to_string());
        }
        external
    }

    /// All entries collapsed into one: bodies joined with `\n`, linewise iff
    /// every entry is linewise.
    pub fn joined(&self) -> Option<RegisterEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let linewise = self.entries.iter().all(|e| e.linewise);
        let text = self
            .entries
            .iter()
            .map(RegisterEntry::body)
            .collect::<Vec<_>>()
            .join("\n");
        Some(RegisterEntry::new(text, linewise))
    }

    fn clipboard_text(&self) -> String {
        self.joined().map(|e| e.text).unwrap_or_default()
    }

    /// Entries to paste at `cursors` cursors: one each when the counts agree,
    /// otherwise the joined blob repeated at every cursor.
    pub fn for_cursors(&self, cursors: usize) -> Vec<RegisterEntry> {
        if self.entries.len() == cursors {
            return self.entries.clone();
        }
        match self.joined() {
            Some(blob) => vec![blob; cursors],
            None => Vec::new(),
        }
    }
}

/// Most recent `f`/`F`/`t`/`T`, replayed by `;` and reversed by `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastFindState {
    pub target: char,
    pub distance: FindDistance,
    pub direction: FindDirection,
}

impl LastFindState {
    pub fn reversed(self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self
        }
    }
}

/// Mutable per-session state owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub mode: Mode,
    pub keys: KeyBuffer,
    pub registers: RegisterStore,
    pub last_find: Option<LastFindState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mode_names_round_trip() {
        for mode in [Mode::Normal, Mode::Insert, Mode::Visual, Mode::VisualLine] {
            assert_eq!(Mode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(Mode::from_name("replace"), None);
    }

    #[test]
    fn mode_set_filters() {
        let set = ModeSet::NORMAL_AND_VISUAL;
        assert!(set.allows(Mode::Normal));
        assert!(set.allows(Mode::VisualLine));
        assert!(!set.allows(Mode::Insert));
    }

    #[test]
    fn linewise_entries_end_with_newline() {
        assert_eq!(RegisterEntry::linewise("b").text, "b\n");
        assert_eq!(RegisterEntry::linewise("b\n").text, "b\n");
        assert_eq!(RegisterEntry::charwise("b").text, "b");
    }

    #[test]
    fn matching_cursor_count_uses_entries() {
        let mut regs = RegisterStore::new();
        regs.store(vec![RegisterEntry::charwise("a"), RegisterEntry::charwise("b")]);
        assert_eq!(
            regs.for_cursors(2),
            vec![RegisterEntry::charwise("a"), RegisterEntry::charwise("b")]
        );
    }

    #[test]
    fn mismatched_cursor_count_joins() {
        let mut regs = RegisterStore::new();
        regs.store(vec![RegisterEntry::linewise("a"), RegisterEntry::linewise("b")]);
        assert_eq!(regs.for_cursors(1), vec![RegisterEntry::linewise("a\nb")]);

        regs.store(vec![RegisterEntry::linewise("a"), RegisterEntry::charwise("b")]);
        assert_eq!(
            regs.for_cursors(3),
            vec![RegisterEntry::charwise("a\nb"); 3],
            "mixed entries join characterwise"
        );
    }

    #[test]
    fn store_returns_clipboard_text() {
        let mut regs = RegisterStore::new();
        let text = regs.store(vec![RegisterEntry::linewise("x"), RegisterEntry::linewise("y")]);
        assert_eq!(text, "x\ny\n");
    }

    #[test]
    fn clipboard_sync_only_adopts_foreign_text() {
        let mut regs = RegisterStore::new();
        let text = regs.store(vec![RegisterEntry::charwise("ours")]);
        regs.note_clipboard_written(text.clone());
        assert!(!regs.sync_from_clipboard(&text));
        assert_eq!(regs.entries(), &[RegisterEntry::charwise("ours")]);

        assert!(regs.sync_from_clipboard("theirs\n"));
        assert_eq!(regs.entries(), &[RegisterEntry::linewise("theirs")]);
    }

    #[test]
    fn failed_clipboard_write_keeps_entries() {
        let mut regs = RegisterStore::new();
        regs.store(vec![RegisterEntry::charwise("a"), RegisterEntry::charwise("b")]);
        // no note_clipboard_written: the mirror never landed
        assert!(!regs.sync_from_clipboard("a\nb"));
        assert_eq!(regs.entries().len(), 2);
    }

    #[test]
    fn foreign_text_adopted_after_failed_write() {
        let mut regs = RegisterStore::new();
        regs.store(vec![RegisterEntry::charwise("ours")]);
        assert!(regs.sync_from_clipboard("theirs"));
        assert_eq!(regs.entries(), &[RegisterEntry::charwise("theirs")]);
        // The adopted text is the new snapshot.
        assert!(!regs.sync_from_clipboard("theirs"));
    }

    #[test]
    fn empty_store_adopts_clipboard() {
        let mut regs = RegisterStore::new();
        assert!(regs.sync_from_clipboard("hello"));
        assert_eq!(regs.for_cursors(1), vec![RegisterEntry::charwise("hello")]);
    }

    #[test]
    fn last_find_reverses_direction_only() {
        let f = LastFindState {
            target: '.',
            distance: FindDistance::Further,
            direction: FindDirection::After,
        };
        let r = f.reversed();
        assert_eq!(r.direction, FindDirection::Before);
        assert_eq!(r.distance, FindDistance::Further);
        assert_eq!(r.target, '.');
    }

    #[test]
    fn selection_orders_endpoints() {
        let s = Selection::new(Position::new(2, 0), Position::new(1, 4));
        assert_eq!(s.start(), Position::new(1, 4));
        assert_eq!(s.end(), Position::new(2, 0));
        assert!(!s.is_empty());
        assert!(Selection::cursor(Position::origin()).is_empty());
    }
}
