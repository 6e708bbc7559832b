//! Shared mutable state tree behind the dot-path store contract.
//!
//! The store has no transactional isolation; safety against interleaving
//! comes from the orchestrator's single-flight lock serializing all external
//! entry points, not from the store itself.
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use tabletalk_core::paths;

/// Dot-path key-value contract over one state tree.
///
/// `set` on a missing intermediate segment creates an empty object there
/// (store-level permissiveness); the validator separately forbids the
/// generator from creating new leaf paths.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Resolves a path to a copy of the node, if it exists.
    async fn get(&self, path: &str) -> Option<Value>;

    /// Writes a value at the path, creating intermediate objects as needed.
    async fn set(&self, path: &str, value: Value);

    /// Full copy of the current tree.
    async fn snapshot(&self) -> Value;

    /// Replaces the entire tree with the template.
    async fn reset(&self, template: Value);
}

/// In-memory store for local sessions and tests.
pub struct InMemoryStateStore {
    tree: RwLock<Value>,
}

impl InMemoryStateStore {
    pub fn new(initial: Value) -> Self {
        Self {
            tree: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, path: &str) -> Option<Value> {
        let tree = self.tree.read().await;
        paths::get_by_path(&tree, path).cloned()
    }

    async fn set(&self, path: &str, value: Value) {
        let mut tree = self.tree.write().await;
        paths::set_by_path(&mut tree, path, value);
    }

    async fn snapshot(&self) -> Value {
        self.tree.read().await.clone()
    }

    async fn reset(&self, template: Value) {
        let mut tree = self.tree.write().await;
        *tree = template;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = InMemoryStateStore::new(json!({ "game": { "turn": "p1" } }));

        store.set("game.turn", json!("p2")).await;
        assert_eq!(store.get("game.turn").await, Some(json!("p2")));
        assert_eq!(store.get("game.phase").await, None);
    }

    #[tokio::test]
    async fn set_creates_missing_intermediates() {
        let store = InMemoryStateStore::new(json!({}));

        store.set("board.moves.5", json!(15)).await;
        assert_eq!(store.get("board.moves.5").await, Some(json!(15)));
    }

    #[tokio::test]
    async fn reset_replaces_the_whole_tree() {
        let store = InMemoryStateStore::new(json!({ "game": { "turn": "p2" } }));

        store.reset(json!({ "game": { "turn": "p1" } })).await;
        assert_eq!(store.snapshot().await, json!({ "game": { "turn": "p1" } }));
    }
}
