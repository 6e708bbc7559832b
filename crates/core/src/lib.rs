//! Deterministic moderator logic shared across the runtime and tools.
//!
//! `tabletalk-core` defines the canonical rules of the voice-moderated board
//! game pipeline: dot-path addressing over the JSON state tree, typed views
//! over well-known state fields, the closed primitive-action protocol, and
//! batch validation with sequential simulation. Everything here is pure and
//! synchronous; the async orchestration lives in `tabletalk-runtime`.
pub mod action;
pub mod paths;
pub mod state;
pub mod validate;

pub use action::{Action, DecodeError};
pub use state::{DecisionPoint, GamePhase, StateView};
pub use validate::{ValidationError, simulate_action, validate_actions};
