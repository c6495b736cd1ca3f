//! The key-handling entry point.
//!
//! `Engine::handle_key` appends the key to the pending buffer and offers the
//! whole buffer to every action enabled in the current mode. The first action
//! that executes consumes the buffer. If none does, the buffer is kept when
//! some action reported a strict prefix and discarded otherwise.

use std::collections::BTreeMap;
use std::sync::Arc;

use core_config::Config;
use core_events::{KeyNotationError, KeyToken, SelectionChangeSource, format_keys, parse_keys};
use core_keymap::PatternError;
use core_state::{Mode, SessionState};
use core_text::CursorPlacement;

use crate::action::{ActionContext, ActionOutcome};
use crate::host::EditorHost;
use crate::registry::ActionRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// An action ran and the pending keys were consumed.
    Executed { action: String },
    /// The keys are a prefix of some action; waiting for more.
    Pending,
    /// Nothing matched; the pending keys were dropped.
    Reset,
    /// No editor, or the host rejected the action. Pending keys are untouched.
    Aborted,
}

/// Settings the engine reads on every key.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub placement: CursorPlacement,
    pub comments: BTreeMap<String, String>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            placement: config.placement(),
            comments: config.comment_table(),
        }
    }
}

pub struct Engine {
    registry: Arc<ActionRegistry>,
    settings: EngineSettings,
    state: SessionState,
}

impl Engine {
    pub fn new(registry: Arc<ActionRegistry>, settings: EngineSettings) -> Self {
        Self {
            registry,
            settings,
            state: SessionState::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PatternError> {
        let registry = ActionRegistry::from_config(config)?;
        Ok(Self::new(Arc::new(registry), EngineSettings::from_config(config)))
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn pending_keys(&self) -> &[KeyToken] {
        self.state.keys.keys()
    }

    /// Swap in a rebuilt registry and settings after a config change.
    pub fn reload(&mut self, registry: Arc<ActionRegistry>, settings: EngineSettings) {
        self.registry = registry;
        self.settings = settings;
        self.state.keys.clear();
        tracing::info!(target: "runtime", actions = self.registry.len(), "registry_reloaded");
    }

    pub fn handle_key(&mut self, host: &mut dyn EditorHost, key: KeyToken) -> KeyOutcome {
        if host.buffer().is_none() {
            tracing::warn!(target: "input.dispatch", key = %key, "no_active_editor");
            return KeyOutcome::Aborted;
        }
        let mut keys = self.state.keys.keys().to_vec();
        keys.push(key.clone());
        let mode = self.state.mode;
        let registry = Arc::clone(&self.registry);
        let mut needs_more = false;
        let mut ctx = ActionContext {
            host,
            state: &mut self.state,
            placement: self.settings.placement,
            comments: &self.settings.comments,
        };
        for action in registry.for_mode(mode) {
            match action.execute(&mut ctx, &keys) {
                Ok(ActionOutcome::Executed) => {
                    self.state.keys.clear();
                    tracing::debug!(
                        target: "input.dispatch",
                        keys = %format_keys(&keys),
                        action = action.name(),
                        from = mode.name(),
                        to = self.state.mode.name(),
                        "executed"
                    );
                    return KeyOutcome::Executed {
                        action: action.name().to_string(),
                    };
                }
                Ok(ActionOutcome::NeedsMoreKeys) => needs_more = true,
                Ok(ActionOutcome::NoMatch) => {}
                Err(e) => {
                    tracing::warn!(
                        target: "input.dispatch",
                        keys = %format_keys(&keys),
                        action = action.name(),
                        error = %e,
                        "action_failed"
                    );
                    return KeyOutcome::Aborted;
                }
            }
        }
        if needs_more {
            self.state.keys.push(key);
            tracing::debug!(target: "input.dispatch", keys = %format_keys(&keys), "pending");
            KeyOutcome::Pending
        } else {
            self.state.keys.clear();
            tracing::debug!(
                target: "input.dispatch",
                keys = %format_keys(&keys),
                mode = mode.name(),
                "no_match"
            );
            KeyOutcome::Reset
        }
    }

    pub fn handle_keys(
        &mut self,
        host: &mut dyn EditorHost,
        keys: impl IntoIterator<Item = KeyToken>,
    ) -> Vec<KeyOutcome> {
        keys.into_iter().map(|k| self.handle_key(host, k)).collect()
    }

    /// Parse `notation` and feed every key.
    pub fn feed(
        &mut self,
        host: &mut dyn EditorHost,
        notation: &str,
    ) -> Result<Vec<KeyOutcome>, KeyNotationError> {
        let keys = parse_keys(notation)?;
        Ok(self.handle_keys(host, keys))
    }

    /// React to a selection change the engine did not cause.
    pub fn on_selection_change(
        &mut self,
        host: &dyn EditorHost,
        source: SelectionChangeSource,
    ) -> Mode {
        let any_selected = host.selections().iter().any(|s| !s.is_empty());
        let from = self.state.mode;
        let to = match from {
            Mode::Normal if any_selected => Mode::Visual,
            Mode::Visual | Mode::VisualLine
                if !any_selected && source == SelectionChangeSource::Pointer =>
            {
                Mode::Normal
            }
            other => other,
        };
        if to != from {
            self.state.mode = to;
            tracing::debug!(
                target: "input.dispatch",
                ?source,
                from = from.name(),
                to = to.name(),
                "selection_mode_change"
            );
        }
        to
    }
}
