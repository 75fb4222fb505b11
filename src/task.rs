//! Task data structure and related functionality.
//!
//! Tasks live in one flat list. Hierarchy is expressed by the `parent_id`
//! back-reference, and ordering is scoped to the sibling group sharing the same
//! `(project_id, parent_id)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A work item inside a project, optionally nested under another task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_focused: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub order: i64,
    /// Ids of tasks this one is blocked by. Advisory only.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// User-editable task fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
}

impl TaskDraft {
    /// Start a draft from an existing task, for partial edits.
    pub fn from_task(t: &Task) -> Self {
        TaskDraft {
            title: t.title.clone(),
            description: t.description.clone(),
            status: t.status,
            priority: t.priority,
            start_date: t.start_date,
            due_date: t.due_date,
            tags: t.tags.clone(),
            dependencies: t.dependencies.clone(),
        }
    }
}

/// Target location of a task: its owning project and optional parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placement {
    pub project_id: String,
    pub parent_id: Option<String>,
}

impl Placement {
    pub fn new(project_id: impl Into<String>, parent_id: Option<String>) -> Self {
        Placement { project_id: project_id.into(), parent_id }
    }
}

impl Task {
    /// Build a new, unfocused task.
    pub fn from_draft(id: String, draft: TaskDraft, at: Placement, order: i64, now: DateTime<Utc>) -> Self {
        Task {
            id,
            project_id: at.project_id,
            parent_id: at.parent_id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            start_date: draft.start_date.or(Some(now)),
            due_date: draft.due_date,
            tags: draft.tags,
            is_focused: false,
            created_at: now,
            order,
            dependencies: draft.dependencies,
        }
    }

    /// Copy the editable fields of a draft onto this task.
    pub fn apply_draft(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.status = draft.status;
        self.priority = draft.priority;
        self.start_date = draft.start_date;
        self.due_date = draft.due_date;
        self.tags = draft.tags;
        self.dependencies = draft.dependencies;
    }

    /// Current sibling-group key of this task.
    pub fn placement(&self) -> Placement {
        Placement::new(self.project_id.clone(), self.parent_id.clone())
    }

    /// Whether this task belongs to the given sibling group.
    pub fn is_in(&self, at: &Placement) -> bool {
        self.project_id == at.project_id && self.parent_id == at.parent_id
    }

    /// Whether the due date has passed and the task is not done.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != Status::Done && self.due_date.is_some_and(|d| d < now)
    }
}
