//! Import and export of whole tracker documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;
use crate::migrate::{decode_state, normalize};
use crate::project::Project;
use crate::state::AppState;
use crate::task::Task;

/// The exported document. Comments and activity logs are not exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

impl ExportBundle {
    pub fn from_state(state: &AppState) -> Self {
        ExportBundle { projects: state.projects.clone(), tasks: state.tasks.clone() }
    }
}

/// Validate and normalize an imported document into a full state.
///
/// The document must be an object with `projects` and `tasks` arrays;
/// `comments` and `activityLog` are accepted when present.
pub fn parse_import(raw: Value) -> Result<AppState, ImportError> {
    let Some(root) = raw.as_object() else {
        return Err(ImportError::InvalidShape("document is not an object"));
    };
    if !root.get("projects").is_some_and(Value::is_array) {
        return Err(ImportError::InvalidShape("`projects` must be an array"));
    }
    if !root.get("tasks").is_some_and(Value::is_array) {
        return Err(ImportError::InvalidShape("`tasks` must be an array"));
    }
    decode_state(normalize(raw))
}
