//! Key and selection event types shared by every oxmodal crate.
//!
//! The engine consumes discrete `KeyToken`s, one per key press. A token is a
//! printable character, a named special key, or a chord (base token plus a
//! modifier mask). Tokens have a canonical textual rendering in the familiar
//! `<C-r>` notation; that rendering is used by configuration files, tests, and
//! by the placeholder-regex key patterns in `core-keymap`, which match against
//! the concatenated rendering of a key buffer.

use std::fmt;

use thiserror::Error;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 { const CTRL=1; const ALT=2; const SHIFT=4; const META=8; const SUPER=16; }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

impl NamedKey {
    fn notation(self) -> String {
        match self {
            NamedKey::Enter => "CR".to_string(),
            NamedKey::Esc => "Esc".to_string(),
            NamedKey::Backspace => "BS".to_string(),
            NamedKey::Tab => "Tab".to_string(),
            NamedKey::F(n) => format!("F{n}"),
            NamedKey::Up => "Up".to_string(),
            NamedKey::Down => "Down".to_string(),
            NamedKey::Left => "Left".to_string(),
            NamedKey::Right => "Right".to_string(),
            NamedKey::Home => "Home".to_string(),
            NamedKey::End => "End".to_string(),
            NamedKey::PageUp => "PageUp".to_string(),
            NamedKey::PageDown => "PageDown".to_string(),
            NamedKey::Insert => "Insert".to_string(),
            NamedKey::Delete => "Del".to_string(),
        }
    }

    fn from_notation(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "cr" | "enter" | "return" => NamedKey::Enter,
            "esc" | "escape" => NamedKey::Esc,
            "bs" | "backspace" => NamedKey::Backspace,
            "tab" => NamedKey::Tab,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" => NamedKey::PageUp,
            "pagedown" => NamedKey::PageDown,
            "insert" => NamedKey::Insert,
            "del" | "delete" => NamedKey::Delete,
            other => {
                let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
                if n == 0 {
                    return None;
                }
                NamedKey::F(n)
            }
        };
        Some(key)
    }
}

/// Canonical logical key tokens.
///
/// `KeyToken::Chord` wraps a base token plus modifier mask, so `<C-d>` stays a
/// single token distinct from a plain `d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
    Chord { base: Box<KeyToken>, mods: ModMask },
}

impl KeyToken {
    pub fn chord(base: KeyToken, mods: ModMask) -> Self {
        if mods.is_empty() {
            return base;
        }
        KeyToken::Chord {
            base: Box::new(base),
            mods,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self::chord(KeyToken::Char(c), ModMask::CTRL)
    }

    pub fn esc() -> Self {
        KeyToken::Named(NamedKey::Esc)
    }

    /// The printable character carried by an unmodified `Char` token.
    pub fn as_char(&self) -> Option<char> {
        match self {
            KeyToken::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_esc(&self) -> bool {
        matches!(self, KeyToken::Named(NamedKey::Esc))
    }

    /// Body of the token inside `<...>` brackets (without the brackets).
    fn bracket_body(&self) -> Option<String> {
        match self {
            KeyToken::Char('<') => Some("lt".to_string()),
            KeyToken::Char(' ') => Some("Space".to_string()),
            KeyToken::Char(_) => None,
            KeyToken::Named(named) => Some(named.notation()),
            KeyToken::Chord { base, mods } => {
                let mut out = String::new();
                for (flag, prefix) in [
                    (ModMask::CTRL, "C-"),
                    (ModMask::ALT, "A-"),
                    (ModMask::SHIFT, "S-"),
                    (ModMask::META, "M-"),
                    (ModMask::SUPER, "D-"),
                ] {
                    if mods.contains(flag) {
                        out.push_str(prefix);
                    }
                }
                match base.as_ref() {
                    KeyToken::Char(c) => match base.bracket_body() {
                        Some(body) => out.push_str(&body),
                        None => out.push(*c),
                    },
                    other => out.push_str(&other.bracket_body().unwrap_or_default()),
                }
                Some(out)
            }
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.bracket_body()) {
            (KeyToken::Char(c), None) => write!(f, "{c}"),
            (_, Some(body)) => write!(f, "<{body}>"),
            (_, None) => Ok(()),
        }
    }
}

/// Render a key sequence in `<C-r>` notation.
pub fn format_keys(keys: &[KeyToken]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyNotationError {
    #[error("empty key sequence")]
    Empty,
    #[error("empty key group `<>` at offset {0}")]
    EmptyGroup(usize),
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
}

/// Parse a key sequence written in `<C-r>` notation.
///
/// A `<` without a matching `>` is taken literally, as is any printable
/// character outside a group.
pub fn parse_keys(notation: &str) -> Result<Vec<KeyToken>, KeyNotationError> {
    if notation.is_empty() {
        return Err(KeyNotationError::Empty);
    }
    let chars: Vec<char> = notation.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<'
            && let Some(rel_close) = chars[i + 1..].iter().position(|&ch| ch == '>')
        {
            // `<C->>` style groups: allow a `>` right after a trailing dash.
            let mut close = i + 1 + rel_close;
            if close == i + 1 {
                return Err(KeyNotationError::EmptyGroup(i));
            }
            if chars[close - 1] == '-' && chars.get(close + 1) == Some(&'>') {
                close += 1;
            }
            let body: String = chars[i + 1..close].iter().collect();
            out.push(parse_group(&body)?);
            i = close + 1;
            continue;
        }
        out.push(KeyToken::Char(c));
        i += 1;
    }
    Ok(out)
}

fn parse_group(body: &str) -> Result<KeyToken, KeyNotationError> {
    let mut mods = ModMask::empty();
    let mut rest = body;
    loop {
        let mut chars = rest.chars();
        let (Some(prefix), Some('-')) = (chars.next(), chars.next()) else {
            break;
        };
        if chars.as_str().is_empty() {
            break;
        }
        let flag = match prefix.to_ascii_uppercase() {
            'C' => ModMask::CTRL,
            'A' => ModMask::ALT,
            'S' => ModMask::SHIFT,
            'M' => ModMask::META,
            'D' => ModMask::SUPER,
            _ => break,
        };
        mods |= flag;
        rest = chars.as_str();
    }
    let base = parse_base(rest)?;
    Ok(KeyToken::chord(base, mods))
}

fn parse_base(name: &str) -> Result<KeyToken, KeyNotationError> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyToken::Char(c));
    }
    match name.to_ascii_lowercase().as_str() {
        "lt" => return Ok(KeyToken::Char('<')),
        "space" => return Ok(KeyToken::Char(' ')),
        "bar" => return Ok(KeyToken::Char('|')),
        _ => {}
    }
    NamedKey::from_notation(name)
        .map(KeyToken::Named)
        .ok_or_else(|| KeyNotationError::UnknownKey(name.to_string()))
}

/// Origin of an externally observed selection change.
///
/// Only pointer-driven collapses demote Visual back to Normal; keyboard and
/// command driven changes can transiently produce empty selections while a
/// motion is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionChangeSource {
    Pointer,
    Keyboard,
    Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_characters() {
        let keys = parse_keys("dw").unwrap();
        assert_eq!(keys, vec![KeyToken::Char('d'), KeyToken::Char('w')]);
    }

    #[test]
    fn parses_named_and_chords() {
        let keys = parse_keys("<Esc><C-r>x<CR>").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyToken::esc(),
                KeyToken::ctrl('r'),
                KeyToken::Char('x'),
                KeyToken::Named(NamedKey::Enter),
            ]
        );
    }

    #[test]
    fn parses_multi_modifier_chord() {
        let keys = parse_keys("<C-A-Down>").unwrap();
        assert_eq!(
            keys,
            vec![KeyToken::chord(
                KeyToken::Named(NamedKey::Down),
                ModMask::CTRL | ModMask::ALT
            )]
        );
    }

    #[test]
    fn unmatched_angle_is_literal() {
        let keys = parse_keys("f<").unwrap();
        assert_eq!(keys, vec![KeyToken::Char('f'), KeyToken::Char('<')]);
    }

    #[test]
    fn lt_group_is_angle_char() {
        assert_eq!(parse_keys("<lt>").unwrap(), vec![KeyToken::Char('<')]);
    }

    #[test]
    fn unknown_group_is_error() {
        assert_eq!(
            parse_keys("<Bogus>"),
            Err(KeyNotationError::UnknownKey("Bogus".to_string()))
        );
        assert_eq!(parse_keys(""), Err(KeyNotationError::Empty));
        assert_eq!(parse_keys("a<>"), Err(KeyNotationError::EmptyGroup(1)));
    }

    #[test]
    fn display_round_trips_notation() {
        for src in ["<Esc>", "<C-r>", "<lt>", "<F5>", "<C-A-Down>", "x", "<Space>"] {
            let keys = parse_keys(src).unwrap();
            assert_eq!(format_keys(&keys), src);
        }
    }

    #[test]
    fn chord_without_mods_collapses_to_base() {
        assert_eq!(
            KeyToken::chord(KeyToken::Char('a'), ModMask::empty()),
            KeyToken::Char('a')
        );
    }
}
