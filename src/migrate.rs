//! Upgrading stored documents to the current schema.
//!
//! Older documents may lack the comment and activity maps, project styling
//! fields, or task start dates. Normalization works on the raw JSON so that a
//! missing key can be told apart from a key that is present but null, and it
//! is shared by the load path and the import path.

use std::collections::HashSet;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::project::DEFAULT_PROJECT_COLOR;
use crate::state::AppState;
use crate::task::Placement;

/// Whether a stored document predates the current schema.
pub fn needs_migration(raw: &Value) -> bool {
    let Some(root) = raw.as_object() else {
        return false;
    };
    if !root.contains_key("comments") || !root.contains_key("activityLog") {
        return true;
    }
    let lacks = |list: &str, key: &str| {
        root.get(list)
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().any(|i| i.as_object().is_some_and(|o| !o.contains_key(key))))
    };
    lacks("projects", "color") || lacks("tasks", "startDate")
}

/// Backfill every field the current schema requires. Idempotent.
pub fn normalize(raw: Value) -> Value {
    let mut root = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for key in ["projects", "tasks"] {
        if !root.get(key).is_some_and(Value::is_array) {
            root.insert(key.into(), json!([]));
        }
    }
    for key in ["comments", "activityLog"] {
        if !root.get(key).is_some_and(Value::is_object) {
            root.insert(key.into(), json!({}));
        }
    }

    if let Some(Value::Array(projects)) = root.get_mut("projects") {
        for p in projects.iter_mut().filter_map(Value::as_object_mut) {
            default_field(p, "priority", json!("Medium"));
            default_field(p, "isArchived", json!(false));
            default_field(p, "color", json!(DEFAULT_PROJECT_COLOR));
            default_field(p, "members", json!([]));
            default_field(p, "goals", json!([]));
            default_field(p, "links", json!([]));
            default_field(p, "tags", json!([]));
        }
    }

    if let Some(Value::Array(tasks)) = root.get_mut("tasks") {
        for t in tasks.iter_mut().filter_map(Value::as_object_mut) {
            if !t.contains_key("startDate") {
                let created = t.get("createdAt").cloned().unwrap_or(Value::Null);
                t.insert("startDate".into(), created);
            }
        }
    }

    Value::Object(root)
}

fn default_field(obj: &mut Map<String, Value>, key: &str, value: Value) {
    if !obj.contains_key(key) {
        obj.insert(key.to_string(), value);
    }
}

/// Migrate a stored document if needed, then decode it.
pub fn load_state(raw: Value) -> Result<AppState, ImportError> {
    let raw = if needs_migration(&raw) {
        info!("stored state predates current schema, migrating");
        normalize(raw)
    } else {
        raw
    };
    decode_state(raw)
}

/// Decode a normalized document and restore dense sibling ordering.
pub fn decode_state(raw: Value) -> Result<AppState, ImportError> {
    let mut state: AppState = serde_json::from_value(raw)?;
    let groups: Vec<Placement> = {
        let mut seen = HashSet::new();
        state
            .tasks
            .iter()
            .map(|t| t.placement())
            .filter(|g| seen.insert(g.clone()))
            .collect()
    };
    for g in &groups {
        state.renumber_group(g);
    }
    debug!(projects = state.projects.len(), tasks = state.tasks.len(), "decoded state");
    Ok(state)
}
