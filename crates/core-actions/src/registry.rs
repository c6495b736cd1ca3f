//! Action registry: every action the engine dispatches to, in priority order.
//!
//! Custom bindings come first so users can override built-ins. The engine
//! scans the list front to back and runs the first action that executes.

use std::sync::Arc;

use core_config::{Binding, Config, load_bindings};
use core_keymap::{KeyPattern, PatternError};
use core_state::Mode;

use crate::action::{Action, CommandAction, SimpleAction};
use crate::edit::edit_actions;
use crate::motion::{MotionAction, default_motions};
use crate::operator::default_operators;
use crate::paste;
use crate::text_object::{default_objects, structural_objects};
use crate::visual::visual_actions;

pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions }
    }

    /// Built-in actions only.
    pub fn builtin() -> Result<Self, PatternError> {
        Self::with_bindings(&[])
    }

    /// Built-ins with `bindings` spliced in ahead of them.
    pub fn with_bindings(bindings: &[Binding]) -> Result<Self, PatternError> {
        let mut actions: Vec<Box<dyn Action>> = bindings
            .iter()
            .map(|b| {
                Box::new(CommandAction::new(
                    KeyPattern::literal(b.keys.iter().cloned()),
                    b.modes,
                    b.command.clone(),
                    b.args.clone(),
                )) as Box<dyn Action>
            })
            .collect();
        actions.extend(edit_actions()?);
        actions.extend(visual_actions(Arc::new(structural_objects()?)));
        let lit = |c: char| KeyPattern::literal([core_events::KeyToken::Char(c)]);
        actions.push(Box::new(SimpleAction::new(
            "paste-after",
            core_state::ModeSet::NORMAL,
            lit('p'),
            paste::paste_after,
        )));
        actions.push(Box::new(SimpleAction::new(
            "paste-before",
            core_state::ModeSet::NORMAL,
            lit('P'),
            paste::paste_before,
        )));
        actions.extend(default_operators(Arc::new(default_objects()?))?);
        for motion in default_motions()? {
            actions.push(Box::new(MotionAction::new(motion)));
        }
        tracing::debug!(
            target: "input.dispatch",
            actions = actions.len(),
            custom = bindings.len(),
            "registry_built"
        );
        Ok(Self { actions })
    }

    /// Built-ins plus the config's valid bindings; rejected entries are logged
    /// by `load_bindings` and skipped.
    pub fn from_config(config: &Config) -> Result<Self, PatternError> {
        let loaded = load_bindings(&config.file);
        Self::with_bindings(&loaded.bindings)
    }

    /// Actions active in `mode`, in priority order.
    pub fn for_mode(&self, mode: Mode) -> impl Iterator<Item = &Box<dyn Action>> {
        self.actions.iter().filter(move |a| a.modes().allows(mode))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
