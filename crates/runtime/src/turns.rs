//! Turn advancement and ownership authority.
//!
//! [`TurnManager`] is the only component that writes `game.turn` outside of
//! SETUP. It also provides the post-validation ownership assertion the
//! executor runs immediately before any player-subtree mutation: reaching a
//! failing assertion implies a validator bug, so that error is fatal and
//! logged distinctly rather than spoken.
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use tabletalk_core::state::{GAME_TURN, GamePhase, StateView};

use crate::api::{Result, RuntimeError};
use crate::store::StateStore;

/// The player record returned by a successful turn advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextTurn {
    pub player_id: String,
    pub name: String,
    pub position: i64,
}

/// Sole authority for turn advancement and ownership assertions.
pub struct TurnManager {
    store: Arc<dyn StateStore>,
}

impl TurnManager {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Attempts to hand the turn to the next player in `game.playerOrder`,
    /// wrapping last to first.
    ///
    /// Blocking precedence, evaluated in order; each failing check returns
    /// `None` immediately: not PLAYING, winner recorded, no current turn,
    /// empty player order, a square effect resolving, or the active player
    /// still sitting on an unresolved decision gate.
    pub async fn advance_turn(&self, effect_resolving: bool) -> Option<NextTurn> {
        let snapshot = self.store.snapshot().await;
        let view = StateView::new(&snapshot);

        if view.phase() != Some(GamePhase::Playing) {
            return None;
        }
        if view.has_winner() {
            return None;
        }
        let current = view.turn().filter(|turn| !turn.is_empty())?;
        let order = view.player_order();
        if order.is_empty() {
            return None;
        }
        if effect_resolving {
            return None;
        }
        if view.pending_decision(current).is_some() {
            return None;
        }

        // A current player missing from the order wraps to the start.
        let next = order
            .iter()
            .position(|id| *id == current)
            .map(|index| order[(index + 1) % order.len()])
            .unwrap_or(order[0])
            .to_string();

        let name = view.player_name(&next).unwrap_or(&next).to_string();
        let position = view.player_position(&next).unwrap_or(0);

        self.store.set(GAME_TURN, json!(next.clone())).await;
        debug!(player = %next, "turn advanced");

        Some(NextTurn {
            player_id: next,
            name,
            position,
        })
    }

    /// Second, independent enforcement point for turn ownership, invoked by
    /// the executor right before any `players.<id>.*` mutation. SETUP-phase
    /// batches may touch any player, matching the validator.
    pub async fn assert_ownership(&self, player_id: &str) -> Result<()> {
        let snapshot = self.store.snapshot().await;
        let view = StateView::new(&snapshot);

        if view.phase() == Some(GamePhase::Setup) {
            return Ok(());
        }
        let active = view.turn().unwrap_or("");
        if player_id != active {
            return Err(RuntimeError::OwnershipViolation {
                target: player_id.to_string(),
                active: active.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStateStore;
    use serde_json::{Value, json};

    fn playing_state() -> Value {
        json!({
            "game": {
                "phase": "PLAYING",
                "turn": "p1",
                "playerOrder": ["p1", "p2", "p3"],
                "winner": null,
            },
            "players": {
                "p1": { "name": "Alice", "position": 2 },
                "p2": { "name": "Bob", "position": 5 },
                "p3": { "name": "Cleo", "position": 7 },
            },
            "decisionPoints": [],
        })
    }

    fn manager(state: Value) -> (TurnManager, Arc<InMemoryStateStore>) {
        let store = Arc::new(InMemoryStateStore::new(state));
        (TurnManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn advances_in_order_and_wraps() {
        let (turns, store) = manager(playing_state());

        let next = turns.advance_turn(false).await.unwrap();
        assert_eq!(next.player_id, "p2");
        assert_eq!(next.name, "Bob");
        assert_eq!(next.position, 5);
        assert_eq!(store.get("game.turn").await, Some(json!("p2")));

        turns.advance_turn(false).await.unwrap();
        let wrapped = turns.advance_turn(false).await.unwrap();
        assert_eq!(wrapped.player_id, "p1");
    }

    #[tokio::test]
    async fn blocked_outside_playing_phase() {
        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(&mut state, "game.phase", json!("SETUP"));
        let (turns, _) = manager(state);

        assert_eq!(turns.advance_turn(false).await, None);
    }

    #[tokio::test]
    async fn blocked_when_winner_recorded() {
        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(&mut state, "game.winner", json!("p3"));
        let (turns, _) = manager(state);

        assert_eq!(turns.advance_turn(false).await, None);
    }

    #[tokio::test]
    async fn blocked_without_turn_or_order() {
        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(&mut state, "game.turn", json!(null));
        let (turns, _) = manager(state);
        assert_eq!(turns.advance_turn(false).await, None);

        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(&mut state, "game.playerOrder", json!([]));
        let (turns, _) = manager(state);
        assert_eq!(turns.advance_turn(false).await, None);
    }

    #[tokio::test]
    async fn blocked_while_effect_resolves() {
        let (turns, store) = manager(playing_state());

        assert_eq!(turns.advance_turn(true).await, None);
        assert_eq!(store.get("game.turn").await, Some(json!("p1")));
    }

    #[tokio::test]
    async fn blocked_by_pending_decision() {
        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(
            &mut state,
            "decisionPoints",
            json!([{ "position": 2, "requiredField": "pathChoice", "prompt": "A or B?" }]),
        );
        let (turns, _) = manager(state);

        assert_eq!(turns.advance_turn(false).await, None);
    }

    #[tokio::test]
    async fn ownership_assertion() {
        let (turns, _) = manager(playing_state());

        assert!(turns.assert_ownership("p1").await.is_ok());
        let err = turns.assert_ownership("p2").await.unwrap_err();
        assert!(matches!(err, RuntimeError::OwnershipViolation { .. }));
    }

    #[tokio::test]
    async fn ownership_is_suspended_during_setup() {
        let mut state = playing_state();
        tabletalk_core::paths::set_by_path(&mut state, "game.phase", json!("SETUP"));
        let (turns, _) = manager(state);

        assert!(turns.assert_ownership("p2").await.is_ok());
    }
}
