//! Enumerations and field types shared by projects and tasks.
//!
//! This module defines the small closed vocabularies used across the tracker:
//! task status, priority, member roles and drag-drop positions, together with
//! their display helpers.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task completion status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    #[serde(rename = "To Do", alias = "ToDo", alias = "todo")]
    #[value(name = "todo")]
    ToDo,
    #[serde(rename = "In Progress", alias = "InProgress", alias = "in-progress")]
    #[value(name = "in-progress")]
    InProgress,
    #[serde(rename = "Done", alias = "done")]
    #[value(name = "done")]
    Done,
}

/// Priority classification shared by projects and tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

/// Role of a member within a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
pub enum MemberRole {
    Owner,
    #[default]
    Collaborator,
    Viewer,
}

/// Where a dragged item lands relative to the drop target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DropPosition {
    /// Insert immediately before the target.
    #[default]
    Top,
    /// Insert immediately after the target.
    Bottom,
}

/// Format a task status for display and activity entries.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::ToDo => "To Do",
        Status::InProgress => "In Progress",
        Status::Done => "Done",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::ToDo).unwrap(), "\"To Do\"");
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"In Progress\"");
        let parsed: Status = serde_json::from_str("\"InProgress\"").unwrap();
        assert_eq!(parsed, Status::InProgress);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Status::default(), Status::ToDo);
        assert_eq!(DropPosition::default(), DropPosition::Top);
    }
}
