//! Project data structures.
//!
//! A project owns a set of tasks, a comment thread and an activity log. Projects
//! are kept in a flat list and displayed by their `order` value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{MemberRole, Priority};

/// Colour assigned to projects that were stored before colours existed.
pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

/// A top-level container of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub links: Vec<Link>,
}

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

/// A person attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub role: MemberRole,
    #[serde(default)]
    pub avatar_url: String,
}

/// A measurable target tracked on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub current_value: f64,
    pub target_value: f64,
    #[serde(default)]
    pub unit: String,
}

/// A reference URL attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// User-editable project fields, as submitted by a create or edit form.
///
/// `id`, `created_at` and `order` are owned by the engine and never taken from
/// a draft.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub color: Option<String>,
    pub members: Vec<Member>,
    pub goals: Vec<Goal>,
    pub links: Vec<Link>,
}

impl ProjectDraft {
    /// Start a draft from an existing project, for partial edits.
    pub fn from_project(p: &Project) -> Self {
        ProjectDraft {
            name: p.name.clone(),
            description: p.description.clone(),
            tags: p.tags.clone(),
            priority: p.priority,
            color: Some(p.color.clone()),
            members: p.members.clone(),
            goals: p.goals.clone(),
            links: p.links.clone(),
        }
    }
}

impl Project {
    /// Build a fresh, unarchived project from a draft.
    pub fn from_draft(id: String, draft: ProjectDraft, order: i64, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: draft.name,
            description: draft.description,
            created_at: now,
            tags: draft.tags,
            order,
            priority: draft.priority,
            is_archived: false,
            color: draft.color.unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            members: draft.members,
            goals: draft.goals,
            links: draft.links,
        }
    }

    /// Merge a draft into this project, leaving identity, creation time, order
    /// and archive flag untouched.
    pub fn apply_draft(&mut self, draft: ProjectDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.tags = draft.tags;
        self.priority = draft.priority;
        if let Some(color) = draft.color {
            self.color = color;
        }
        self.members = draft.members;
        self.goals = draft.goals;
        self.links = draft.links;
    }

    /// Progress of a goal as a fraction clamped to `0.0..=1.0`.
    pub fn goal_progress(goal: &Goal) -> f64 {
        if goal.target_value <= 0.0 {
            return 0.0;
        }
        (goal.current_value / goal.target_value).clamp(0.0, 1.0)
    }
}
