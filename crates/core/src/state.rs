//! Typed read-only views over the JSON game-state tree.
//!
//! The tree itself stays a [`serde_json::Value`] so game content remains
//! external configuration data, but everything the moderator reasons about
//! (phase, turn, board topology, decision gates) goes through [`StateView`]
//! instead of ad-hoc path strings scattered around the codebase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::paths;

/// Well-known orchestrator-owned paths.
pub const GAME_PHASE: &str = "game.phase";
pub const GAME_TURN: &str = "game.turn";
pub const GAME_WINNER: &str = "game.winner";
pub const GAME_LAST_ROLL: &str = "game.lastRoll";
pub const GAME_LAST_ANSWER: &str = "game.lastAnswer";
pub const GAME_PLAYER_ORDER: &str = "game.playerOrder";

/// Lifecycle phase recorded at `game.phase`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Setup,
    Playing,
    Ended,
}

impl GamePhase {
    /// Parses the wire string; unknown phases yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SETUP" => Some(Self::Setup),
            "PLAYING" => Some(Self::Playing),
            "ENDED" => Some(Self::Ended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Playing => "PLAYING",
            Self::Ended => "ENDED",
        }
    }
}

/// A board position plus the player field that gates leaving it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPoint {
    pub position: i64,
    pub required_field: String,
    pub prompt: String,
}

/// Splits a `players.<id>...` path into the target player id and the field
/// path below the player record (empty when the record itself is targeted).
pub fn player_target(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("players.")?;
    match rest.split_once('.') {
        Some((id, field)) => Some((id, field)),
        None => Some((rest, "")),
    }
}

/// Whether a write at `path` targets a moderator-exclusive node or would
/// replace one by rewriting an ancestor. `game.phase` and `game.winner` are
/// always moderator-owned, as is the `players` collection node itself;
/// individual player records fall under turn ownership instead.
pub fn is_protected_write(path: &str) -> bool {
    covers(path, GAME_PHASE) || covers(path, GAME_WINNER) || path == "players"
}

/// Whether writing `path` replaces the node at `protected`, either directly
/// or by rewriting an ancestor object.
fn covers(path: &str, protected: &str) -> bool {
    path == protected
        || protected
            .strip_prefix(path)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Read-only lens over one state snapshot.
#[derive(Clone, Copy)]
pub struct StateView<'a> {
    root: &'a Value,
}

impl<'a> StateView<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn phase(&self) -> Option<GamePhase> {
        let raw = paths::get_by_path(self.root, GAME_PHASE)?.as_str()?;
        GamePhase::parse(raw)
    }

    /// The player id holding the turn, if any is recorded.
    pub fn turn(&self) -> Option<&'a str> {
        paths::get_by_path(self.root, GAME_TURN)?.as_str()
    }

    /// Whether a winner is already recorded (non-null, non-empty).
    pub fn has_winner(&self) -> bool {
        paths::get_by_path(self.root, GAME_WINNER)
            .map(|winner| match winner {
                Value::Null => false,
                Value::String(name) => !name.is_empty(),
                _ => true,
            })
            .unwrap_or(false)
    }

    pub fn player_order(&self) -> Vec<&'a str> {
        paths::get_by_path(self.root, GAME_PLAYER_ORDER)
            .and_then(Value::as_array)
            .map(|order| order.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn player_ids(&self) -> Vec<&'a str> {
        paths::get_by_path(self.root, "players")
            .and_then(Value::as_object)
            .map(|players| players.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn player_field(&self, id: &str, field: &str) -> Option<&'a Value> {
        paths::get_by_path(self.root, "players")?.get(id)?.get(field)
    }

    pub fn player_position(&self, id: &str) -> Option<i64> {
        self.player_field(id, "position")?.as_i64()
    }

    pub fn player_name(&self, id: &str) -> Option<&'a str> {
        self.player_field(id, "name")?.as_str()
    }

    /// Configured destination for a board move starting at `position`.
    pub fn board_move(&self, position: i64) -> Option<i64> {
        paths::get_by_path(self.root, "board.moves")?
            .get(position.to_string())?
            .as_i64()
    }

    /// Non-empty effect descriptor configured for `position`, if any.
    pub fn square_effect(&self, position: i64) -> Option<&'a Value> {
        let descriptor = paths::get_by_path(self.root, "board.squares")?.get(position.to_string())?;
        if descriptor_is_empty(descriptor) {
            None
        } else {
            Some(descriptor)
        }
    }

    /// All configured decision points; malformed entries are skipped.
    pub fn decision_points(&self) -> Vec<DecisionPoint> {
        paths::get_by_path(self.root, "decisionPoints")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn decision_at(&self, position: i64) -> Option<DecisionPoint> {
        self.decision_points()
            .into_iter()
            .find(|point| point.position == position)
    }

    /// The decision gate the player still has to resolve at their current
    /// position: the required field is absent or null on their record.
    pub fn pending_decision(&self, id: &str) -> Option<DecisionPoint> {
        let position = self.player_position(id)?;
        let point = self.decision_at(position)?;
        match self.player_field(id, &point.required_field) {
            None | Some(Value::Null) => Some(point),
            Some(_) => None,
        }
    }
}

fn descriptor_is_empty(descriptor: &Value) -> bool {
    match descriptor {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "game": {
                "phase": "PLAYING",
                "turn": "p1",
                "playerOrder": ["p1", "p2"],
                "winner": null,
            },
            "players": {
                "p1": { "name": "Alice", "position": 0, "pathChoice": null },
                "p2": { "name": "Bob", "position": 4 },
            },
            "board": {
                "moves": { "5": 15 },
                "squares": { "4": { "kind": "trap" }, "7": {} },
            },
            "decisionPoints": [
                { "position": 0, "requiredField": "pathChoice", "prompt": "A or B?" }
            ],
        })
    }

    #[test]
    fn reads_game_fields() {
        let tree = sample();
        let view = StateView::new(&tree);

        assert_eq!(view.phase(), Some(GamePhase::Playing));
        assert_eq!(view.turn(), Some("p1"));
        assert!(!view.has_winner());
        assert_eq!(view.player_order(), vec!["p1", "p2"]);
    }

    #[test]
    fn null_winner_is_not_a_winner() {
        let mut tree = sample();
        let view = StateView::new(&tree);
        assert!(!view.has_winner());

        crate::paths::set_by_path(&mut tree, GAME_WINNER, json!("p2"));
        let view = StateView::new(&tree);
        assert!(view.has_winner());
    }

    #[test]
    fn board_lookups_use_position_keys() {
        let tree = sample();
        let view = StateView::new(&tree);

        assert_eq!(view.board_move(5), Some(15));
        assert_eq!(view.board_move(6), None);
        assert!(view.square_effect(4).is_some());
        // Empty descriptors do not count as effects.
        assert!(view.square_effect(7).is_none());
    }

    #[test]
    fn pending_decision_requires_null_field() {
        let tree = sample();
        let view = StateView::new(&tree);

        let point = view.pending_decision("p1").unwrap();
        assert_eq!(point.required_field, "pathChoice");

        // p2 is not on a decision square at all.
        assert!(view.pending_decision("p2").is_none());
    }

    #[test]
    fn protected_writes_cover_ancestors() {
        assert!(is_protected_write("game.phase"));
        assert!(is_protected_write("game.winner"));
        assert!(is_protected_write("game"));
        assert!(is_protected_write("players"));

        // Turn writes are phase-dependent and player records fall under
        // turn ownership; neither is categorically protected.
        assert!(!is_protected_write("game.turn"));
        assert!(!is_protected_write("game.lastRoll"));
        assert!(!is_protected_write("players.p1.position"));
    }

    #[test]
    fn player_target_splits_paths() {
        assert_eq!(player_target("players.p1.position"), Some(("p1", "position")));
        assert_eq!(player_target("players.p1"), Some(("p1", "")));
        assert_eq!(player_target("players.p1.bag.coins"), Some(("p1", "bag.coins")));
        assert_eq!(player_target("game.turn"), None);
    }
}
