//! Dot-delimited path addressing over the JSON state tree.
//!
//! The state store and the validator share these helpers so both sides agree
//! on what a path means. Reads are strict: a missing segment yields `None`.
//! Writes are permissive: missing (or non-object) intermediate segments are
//! replaced with empty objects, matching the store contract. The validator
//! separately forbids the *generator* from creating new leaf paths.

use serde_json::{Map, Value};

/// Resolves a dot-delimited path to a node in the tree, if it exists.
pub fn get_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Returns whether the path resolves to an existing node (including `null`).
pub fn path_exists(root: &Value, path: &str) -> bool {
    get_by_path(root, path).is_some()
}

/// Writes a value at a dot-delimited path, creating empty objects for any
/// missing intermediate segment. A non-object node along the way is replaced.
pub fn set_by_path(root: &mut Value, path: &str, value: Value) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let Some(map) = root.as_object_mut() else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_by_path(child, rest, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_by_path_walks_nested_objects() {
        let tree = json!({ "game": { "turn": "p1", "lastRoll": null } });

        assert_eq!(get_by_path(&tree, "game.turn"), Some(&json!("p1")));
        assert_eq!(get_by_path(&tree, "game.lastRoll"), Some(&Value::Null));
        assert_eq!(get_by_path(&tree, "game.winner"), None);
        assert_eq!(get_by_path(&tree, "game.turn.deeper"), None);
    }

    #[test]
    fn path_exists_counts_null_leaves() {
        let tree = json!({ "players": { "p1": { "pathChoice": null } } });

        assert!(path_exists(&tree, "players.p1.pathChoice"));
        assert!(!path_exists(&tree, "players.p1.missing"));
    }

    #[test]
    fn set_by_path_overwrites_existing_leaf() {
        let mut tree = json!({ "players": { "p1": { "position": 0 } } });

        set_by_path(&mut tree, "players.p1.position", json!(5));

        assert_eq!(get_by_path(&tree, "players.p1.position"), Some(&json!(5)));
    }

    #[test]
    fn set_by_path_creates_missing_intermediates() {
        let mut tree = json!({});

        set_by_path(&mut tree, "game.turn", json!("p2"));

        assert_eq!(get_by_path(&tree, "game.turn"), Some(&json!("p2")));
    }

    #[test]
    fn set_by_path_replaces_scalar_intermediates() {
        let mut tree = json!({ "game": 7 });

        set_by_path(&mut tree, "game.turn", json!("p1"));

        assert_eq!(get_by_path(&tree, "game.turn"), Some(&json!("p1")));
    }
}
