//! core-actions: the modal command engine.
//!
//! Layering, bottom-up:
//! - `motion`: motions as pure functions of (buffer, position, keys).
//! - `text_object`: ranges from structural objects, the whole-line object and
//!   every motion lifted to a range.
//! - `operator`: `d` / `y` / `c` composed with a text object across all cursors.
//! - `paste`, `visual`, `edit`: the remaining built-in actions.
//! - `registry`: the ordered action list, custom bindings first.
//! - `engine`: `Engine::handle_key`, pending-key buffering and mode tracking.
//!
//! All document access goes through the `host::EditorHost` trait.

pub mod action;
pub mod edit;
pub mod engine;
pub mod host;
pub mod motion;
pub mod operator;
pub mod paste;
pub mod registry;
pub mod text_object;
pub mod visual;

pub use action::{Action, ActionContext, ActionOutcome};
pub use engine::{Engine, EngineSettings, KeyOutcome};
pub use host::{ClipboardError, EditorHost, HostError, MemoryHost};
pub use motion::{Motion, MotionKind, MotionResult};
pub use operator::OperatorKind;
pub use registry::ActionRegistry;
pub use text_object::{TextObject, TextObjectResult};
