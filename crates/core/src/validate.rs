//! Stateful sequential batch validation.
//!
//! The validator folds over the batch: each action is checked against a
//! simulated snapshot that already reflects the effect of every earlier
//! action in the same batch. That is what lets one utterance resolve a
//! decision gate and then move in a single batch. Only `SET_STATE` and
//! `PLAYER_ROLLED` are simulable; every other kind leaves the snapshot
//! unchanged.
//!
//! Validation is fail-fast and all-or-nothing: the first failure rejects the
//! whole batch and nothing is ever committed. Execution downstream is
//! deliberately the opposite (best-effort per action).

use serde_json::{Value, json};
use thiserror::Error;

use crate::action::{Action, DecodeError};
use crate::paths;
use crate::state::{GAME_LAST_ROLL, GAME_TURN, GamePhase, StateView, is_protected_write, player_target};

/// First-failure rejection of a generator batch. Every variant names the
/// offending batch index.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("action {index}: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("action {index}: cannot modify player '{target}' because it is '{active}'s turn")]
    NotYourTurn {
        index: usize,
        target: String,
        active: String,
    },

    #[error("action {index}: '{path}' is managed by the moderator and cannot be set")]
    ProtectedField { index: usize, path: String },

    #[error("action {index}: 'game.turn' may only be set during the SETUP phase")]
    TurnChangeOutsideSetup { index: usize },

    #[error("action {index}: state path '{path}' does not exist")]
    UnknownPath { index: usize, path: String },

    #[error(
        "action {index}: player '{player}' must resolve '{field}' at position {position} before moving"
    )]
    DecisionPending {
        index: usize,
        player: String,
        field: String,
        position: i64,
    },

    #[error("action {index}: roll value must be a positive number, got {value}")]
    NonPositiveRoll { index: usize, value: f64 },

    #[error("action {index}: answer must not be empty")]
    EmptyAnswer { index: usize },

    #[error("action {index}: rolling is not allowed while a square effect is resolving")]
    RollDuringEffect { index: usize },
}

impl ValidationError {
    /// Batch index of the rejected action.
    pub fn index(&self) -> usize {
        match self {
            Self::Malformed { index, .. }
            | Self::NotYourTurn { index, .. }
            | Self::ProtectedField { index, .. }
            | Self::TurnChangeOutsideSetup { index }
            | Self::UnknownPath { index, .. }
            | Self::DecisionPending { index, .. }
            | Self::NonPositiveRoll { index, .. }
            | Self::EmptyAnswer { index }
            | Self::RollDuringEffect { index } => *index,
        }
    }
}

/// Validates a raw batch against a state snapshot and returns the decoded
/// actions on success, so the executor never re-parses the wire shapes.
///
/// `resolving_effect` is the orchestrator's observable square-effect flag;
/// while it is set, `PLAYER_ROLLED` is rejected (narration and state writes
/// remain allowed).
pub fn validate_actions(
    batch: &[Value],
    snapshot: &Value,
    resolving_effect: bool,
) -> Result<Vec<Action>, ValidationError> {
    let mut simulated = snapshot.clone();
    let mut decoded = Vec::with_capacity(batch.len());

    for (index, raw) in batch.iter().enumerate() {
        let action =
            Action::decode(raw).map_err(|source| ValidationError::Malformed { index, source })?;
        check_action(index, &action, &simulated, resolving_effect)?;
        simulated = simulate_action(&simulated, &action);
        decoded.push(action);
    }

    Ok(decoded)
}

/// Pure one-step simulation: returns the snapshot as it would look after the
/// action committed. Unsimulable kinds return the snapshot unchanged.
pub fn simulate_action(snapshot: &Value, action: &Action) -> Value {
    match action {
        Action::SetState { path, value } => {
            let mut next = snapshot.clone();
            paths::set_by_path(&mut next, path, value.clone());
            next
        }
        Action::PlayerRolled { value } => {
            let mut next = snapshot.clone();
            paths::set_by_path(&mut next, GAME_LAST_ROLL, json!(value));
            next
        }
        _ => snapshot.clone(),
    }
}

fn check_action(
    index: usize,
    action: &Action,
    simulated: &Value,
    resolving_effect: bool,
) -> Result<(), ValidationError> {
    match action {
        Action::Narrate { .. } | Action::ResetGame { .. } => Ok(()),
        Action::PlayerAnswered { answer } => {
            if answer.trim().is_empty() {
                Err(ValidationError::EmptyAnswer { index })
            } else {
                Ok(())
            }
        }
        Action::PlayerRolled { value } => {
            if resolving_effect {
                Err(ValidationError::RollDuringEffect { index })
            } else if !(*value > 0.0) {
                // NaN fails this comparison as well.
                Err(ValidationError::NonPositiveRoll {
                    index,
                    value: *value,
                })
            } else {
                Ok(())
            }
        }
        Action::SetState { path, .. } => check_set_state(index, path, simulated),
    }
}

fn check_set_state(index: usize, path: &str, simulated: &Value) -> Result<(), ValidationError> {
    let view = StateView::new(simulated);
    let setup = view.phase() == Some(GamePhase::Setup);

    // Orchestrator-exclusive fields, including writes that would replace
    // them by rewriting an ancestor node such as `game` or `players`.
    if is_protected_write(path) {
        return Err(ValidationError::ProtectedField {
            index,
            path: path.to_string(),
        });
    }
    if path == GAME_TURN && !setup {
        return Err(ValidationError::TurnChangeOutsideSetup { index });
    }

    if let Some((target, field)) = player_target(path) {
        // Turn ownership is suspended while the game is still being set up.
        if !setup {
            let active = view.turn().unwrap_or("");
            if target != active {
                return Err(ValidationError::NotYourTurn {
                    index,
                    target: target.to_string(),
                    active: active.to_string(),
                });
            }
        }
        // A position write is gated until the decision at the player's
        // *current* (simulated) square is resolved.
        if field == "position" {
            if let Some(point) = view.pending_decision(target) {
                return Err(ValidationError::DecisionPending {
                    index,
                    player: target.to_string(),
                    field: point.required_field,
                    position: point.position,
                });
            }
        }
    }

    if !paths::path_exists(simulated, path) {
        return Err(ValidationError::UnknownPath {
            index,
            path: path.to_string(),
        });
    }

    Ok(())
}
