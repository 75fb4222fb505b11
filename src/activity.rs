//! Comments and the per-project audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

/// A comment posted on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub project_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One human-readable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub action: String,
}

/// Identity stamped on comments and activity entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub avatar_url: String,
}

impl Default for Author {
    fn default() -> Self {
        Author { name: "You".into(), avatar_url: String::new() }
    }
}

/// Ambient inputs to a mutation: the clock and the acting author.
#[derive(Debug, Clone)]
pub struct MutationContext {
    pub now: DateTime<Utc>,
    pub author: Author,
}

impl MutationContext {
    pub fn new(author: Author) -> Self {
        MutationContext { now: Utc::now(), author }
    }

    /// Context pinned to a given instant.
    pub fn at(now: DateTime<Utc>, author: Author) -> Self {
        MutationContext { now, author }
    }

    /// Fresh opaque identifier for a new entity.
    pub fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Append an audit entry to a project's log, creating the bucket if needed.
pub fn log_activity(state: &mut AppState, project_id: &str, action: impl Into<String>, ctx: &MutationContext) {
    let entry = ActivityLog {
        id: ctx.new_id(),
        timestamp: ctx.now,
        author: ctx.author.name.clone(),
        action: action.into(),
    };
    state.activity_log.entry(project_id.to_string()).or_default().push(entry);
}

/// Build a comment authored by the context's author.
pub fn new_comment(project_id: &str, content: String, ctx: &MutationContext) -> Comment {
    Comment {
        id: ctx.new_id(),
        project_id: project_id.to_string(),
        author_name: ctx.author.name.clone(),
        author_avatar_url: ctx.author.avatar_url.clone(),
        content,
        created_at: ctx.now,
    }
}
