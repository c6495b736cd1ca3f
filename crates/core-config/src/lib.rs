//! Configuration loading and parsing.
//!
//! Parses `oxmodal.toml` (or an override path provided by the binary):
//!
//! - `[cursor] placement`: `"vscode-native"` (gap cursor, default) or
//!   `"vim-traditional"` (on-character cursor).
//! - `[[bindings]]`: custom key sequences forwarded to host commands. Kept as
//!   a raw TOML value here and validated entry by entry in `load_bindings`, so
//!   one malformed entry never takes the rest of the file down with it.
//! - `[comments]`: language id to line-comment token, layered over built-in
//!   defaults. Only the line-join command consults it.
//!
//! Unknown fields are ignored. A missing file yields defaults; a file that
//! fails to parse yields defaults plus a warning.

use anyhow::Result;
use core_events::{KeyNotationError, KeyToken, parse_keys};
use core_state::{Mode, ModeSet};
use core_text::CursorPlacement;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementSetting {
    #[default]
    VscodeNative,
    VimTraditional,
}

impl From<PlacementSetting> for CursorPlacement {
    fn from(setting: PlacementSetting) -> Self {
        match setting {
            PlacementSetting::VscodeNative => CursorPlacement::Gap,
            PlacementSetting::VimTraditional => CursorPlacement::OnChar,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CursorConfig {
    #[serde(default)]
    pub placement: PlacementSetting,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub bindings: Option<toml::Value>,
    #[serde(default)]
    pub comments: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

const DEFAULT_LINE_COMMENTS: &[(&str, &str)] = &[
    ("c", "//"),
    ("cpp", "//"),
    ("csharp", "//"),
    ("go", "//"),
    ("java", "//"),
    ("javascript", "//"),
    ("typescript", "//"),
    ("rust", "//"),
    ("python", "#"),
    ("ruby", "#"),
    ("shellscript", "#"),
    ("toml", "#"),
    ("yaml", "#"),
    ("lua", "--"),
    ("sql", "--"),
    ("haskell", "--"),
    ("vim", "\""),
];

impl Config {
    pub fn placement(&self) -> CursorPlacement {
        self.file.cursor.placement.into()
    }

    /// Line-comment token for a language id; configured entries win over built-ins.
    pub fn line_comment(&self, language: &str) -> Option<&str> {
        self.file
            .comments
            .get(language)
            .map(String::as_str)
            .or_else(|| {
                DEFAULT_LINE_COMMENTS
                    .iter()
                    .find(|(lang, _)| *lang == language)
                    .map(|(_, token)| *token)
            })
    }

    /// Full comment table (built-ins overlaid with configured entries).
    pub fn comment_table(&self) -> BTreeMap<String, String> {
        let mut table: BTreeMap<String, String> = DEFAULT_LINE_COMMENTS
            .iter()
            .map(|(l, t)| (l.to_string(), t.to_string()))
            .collect();
        table.extend(self.file.comments.clone());
        table
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxmodal.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxmodal").join("oxmodal.toml");
    }
    PathBuf::from("oxmodal.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

/// A validated custom binding: literal key sequence to host command.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub keys: Vec<KeyToken>,
    pub modes: ModeSet,
    pub command: String,
    pub args: Option<toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("`bindings` must be an array of tables, found {found}")]
    NotAnArray { found: String },
    #[error("binding #{index} is not a table")]
    NotATable { index: usize },
    #[error("binding #{index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("binding #{index}: `{field}` must be {expected}")]
    WrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },
    #[error("binding #{index} has an invalid key sequence: {source}")]
    Keys {
        index: usize,
        #[source]
        source: KeyNotationError,
    },
    #[error("binding #{index} names unknown mode `{mode}`")]
    UnknownMode { index: usize, mode: String },
}

/// Outcome of validating the `bindings` section: accepted entries in file
/// order and one diagnostic per rejected entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedBindings {
    pub bindings: Vec<Binding>,
    pub diagnostics: Vec<BindingError>,
}

/// Validate custom bindings. Pure apart from logging: the result is meant to
/// be cached by the caller and rebuilt on reload.
pub fn load_bindings(file: &ConfigFile) -> LoadedBindings {
    let mut out = LoadedBindings::default();
    let Some(value) = &file.bindings else {
        return out;
    };
    let Some(entries) = value.as_array() else {
        let err = BindingError::NotAnArray {
            found: value.type_str().to_string(),
        };
        warn!(target: "config", error = %err, "bindings_rejected");
        out.diagnostics.push(err);
        return out;
    };
    for (index, entry) in entries.iter().enumerate() {
        match parse_binding(index, entry) {
            Ok(binding) => out.bindings.push(binding),
            Err(err) => {
                warn!(target: "config", index, error = %err, "binding_rejected");
                out.diagnostics.push(err);
            }
        }
    }
    info!(
        target: "config",
        accepted = out.bindings.len(),
        rejected = out.diagnostics.len(),
        "bindings_loaded"
    );
    out
}

fn parse_binding(index: usize, entry: &toml::Value) -> Result<Binding, BindingError> {
    let table = entry.as_table().ok_or(BindingError::NotATable { index })?;
    let keys = parse_keys(string_field(table, index, "keys")?)
        .map_err(|source| BindingError::Keys { index, source })?;
    let command = string_field(table, index, "command")?.to_string();
    let modes = match table.get("modes") {
        None => ModeSet::NORMAL,
        Some(toml::Value::String(name)) => mode_flag(index, name)?,
        Some(toml::Value::Array(names)) => {
            let mut set = ModeSet::empty();
            for name in names {
                let name = name.as_str().ok_or(BindingError::WrongType {
                    index,
                    field: "modes",
                    expected: "an array of strings",
                })?;
                set |= mode_flag(index, name)?;
            }
            set
        }
        Some(_) => {
            return Err(BindingError::WrongType {
                index,
                field: "modes",
                expected: "a string or an array of strings",
            });
        }
    };
    Ok(Binding {
        keys,
        modes,
        command,
        args: table.get("args").cloned(),
    })
}

fn string_field<'a>(
    table: &'a toml::Table,
    index: usize,
    field: &'static str,
) -> Result<&'a str, BindingError> {
    let v = table
        .get(field)
        .ok_or(BindingError::MissingField { index, field })?;
    v.as_str().ok_or(BindingError::WrongType {
        index,
        field,
        expected: "a string",
    })
}

fn mode_flag(index: usize, name: &str) -> Result<ModeSet, BindingError> {
    Mode::from_name(name)
        .map(ModeSet::from)
        .ok_or_else(|| BindingError::UnknownMode {
            index,
            mode: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn parse(src: &str) -> ConfigFile {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.placement(), CursorPlacement::Gap);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_placement_value() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[cursor]\nplacement = \"vim-traditional\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.placement(), CursorPlacement::OnChar);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[cursor]\nplacement = \"sideways\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.placement(), CursorPlacement::Gap);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn valid_bindings_keep_order() {
        let file = parse(
            r#"
            [[bindings]]
            keys = "<C-w>v"
            modes = ["normal", "visual"]
            command = "split"

            [[bindings]]
            keys = "gd"
            command = "goto"
            args = { reveal = true }
            "#,
        );
        let loaded = load_bindings(&file);
        assert!(loaded.diagnostics.is_empty());
        assert_eq!(loaded.bindings.len(), 2);
        let first = &loaded.bindings[0];
        assert_eq!(first.keys, vec![KeyToken::ctrl('w'), KeyToken::Char('v')]);
        assert_eq!(first.modes, ModeSet::NORMAL | ModeSet::VISUAL);
        assert_eq!(first.command, "split");
        let second = &loaded.bindings[1];
        assert_eq!(second.modes, ModeSet::NORMAL);
        assert!(second.args.is_some());
    }

    #[test]
    fn malformed_entries_rejected_individually() {
        let file = parse(
            r#"
            [[bindings]]
            command = "no-keys"

            [[bindings]]
            keys = "x"
            command = "ok"

            [[bindings]]
            keys = "y"
            modes = ["replace"]
            command = "bad-mode"

            [[bindings]]
            keys = "<Nope>"
            command = "bad-keys"
            "#,
        );
        let loaded = load_bindings(&file);
        assert_eq!(loaded.bindings.len(), 1);
        assert_eq!(loaded.bindings[0].command, "ok");
        assert_eq!(
            loaded.diagnostics,
            vec![
                BindingError::MissingField {
                    index: 0,
                    field: "keys"
                },
                BindingError::UnknownMode {
                    index: 2,
                    mode: "replace".to_string()
                },
                BindingError::Keys {
                    index: 3,
                    source: KeyNotationError::UnknownKey("Nope".to_string())
                },
            ]
        );
    }

    #[test]
    fn non_array_bindings_single_diagnostic() {
        let file = parse("[bindings]\nkeys = \"x\"\n");
        let loaded = load_bindings(&file);
        assert!(loaded.bindings.is_empty());
        assert_eq!(
            loaded.diagnostics,
            vec![BindingError::NotAnArray {
                found: "table".to_string()
            }]
        );
    }

    #[test]
    fn comment_lookup_layers_config_over_defaults() {
        let cfg = Config {
            raw: None,
            file: parse("[comments]\nrust = \"///\"\nelixir = \"#\"\n"),
        };
        assert_eq!(cfg.line_comment("rust"), Some("///"));
        assert_eq!(cfg.line_comment("elixir"), Some("#"));
        assert_eq!(cfg.line_comment("python"), Some("#"));
        assert_eq!(cfg.line_comment("brainfuck"), None);
        assert_eq!(cfg.comment_table().get("rust").map(String::as_str), Some("///"));
    }

    #[test]
    fn rejected_binding_logs_under_config_target() {
        let file = parse("[[bindings]]\nkeys = \"x\"\n");
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let loaded = with_default(subscriber, || load_bindings(&file));

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("binding_rejected"));
        assert_eq!(loaded.diagnostics.len(), 1);
    }
}
