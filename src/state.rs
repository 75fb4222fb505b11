//! The root application state and its structural helpers.
//!
//! `AppState` keeps every entity in flat collections. Task hierarchy and
//! ownership are expressed only through back-references, so the helpers here
//! compute child sets, descendant closures and sibling groups on demand.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityLog, Comment};
use crate::project::Project;
use crate::task::{Placement, Task};

/// Single root aggregate for everything the tracker knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub comments: BTreeMap<String, Vec<Comment>>,
    pub activity_log: BTreeMap<String, Vec<ActivityLog>>,
}

impl AppState {
    /// Get a project by ID.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Get a mutable reference to a project by ID.
    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Get a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Projects sorted by display order. Ties keep insertion order.
    pub fn projects_in_order(&self) -> Vec<&Project> {
        let mut out: Vec<&Project> = self.projects.iter().collect();
        out.sort_by_key(|p| p.order);
        out
    }

    /// Order value for a newly created project.
    pub fn next_project_order(&self) -> i64 {
        self.projects.iter().map(|p| p.order).max().map_or(0, |m| m + 1)
    }

    /// Members of a sibling group, sorted by order.
    pub fn siblings(&self, at: &Placement) -> Vec<&Task> {
        let mut out: Vec<&Task> = self.tasks.iter().filter(|t| t.is_in(at)).collect();
        out.sort_by_key(|t| t.order);
        out
    }

    /// Order value for a task appended to a sibling group.
    pub fn next_sibling_order(&self, at: &Placement) -> i64 {
        self.tasks
            .iter()
            .filter(|t| t.is_in(at))
            .map(|t| t.order)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Compact a sibling group to orders `0..n-1`, keeping relative order.
    pub fn renumber_group(&mut self, at: &Placement) {
        let ordered: Vec<String> = self.siblings(at).into_iter().map(|t| t.id.clone()).collect();
        for (i, id) in ordered.iter().enumerate() {
            if let Some(t) = self.task_mut(id) {
                t.order = i as i64;
            }
        }
    }

    /// Direct children of a task.
    pub fn children(&self, id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.parent_id.as_deref() == Some(id)).collect()
    }

    /// Every transitive descendant of `root`, not including `root` itself.
    ///
    /// Iterates to a fixed point over the flat task list instead of recursing,
    /// so depth is unbounded and cyclic parent links still terminate.
    pub fn collect_descendants(&self, root: &str) -> HashSet<String> {
        let mut known: HashSet<String> = HashSet::new();
        known.insert(root.to_string());
        loop {
            let before = known.len();
            for t in &self.tasks {
                if let Some(p) = t.parent_id.as_deref() {
                    if known.contains(p) && !known.contains(&t.id) {
                        known.insert(t.id.clone());
                    }
                }
            }
            if known.len() == before {
                break;
            }
        }
        known.remove(root);
        known
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = self.task(id).and_then(|t| t.parent_id.as_deref());
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            if !seen.insert(p) {
                break;
            }
            cur = self.task(p).and_then(|t| t.parent_id.as_deref());
        }
        false
    }

    /// Remove tasks by IDs and drop dangling dependency references to them.
    pub fn remove_tasks(&mut self, ids: &HashSet<String>) {
        self.tasks.retain(|t| !ids.contains(&t.id));
        for t in self.tasks.iter_mut() {
            t.dependencies.retain(|d| !ids.contains(d));
        }
    }

    /// Remove a project together with its tasks, comments and activity log.
    pub fn remove_project(&mut self, id: &str) {
        self.projects.retain(|p| p.id != id);
        let owned: HashSet<String> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id.clone())
            .collect();
        self.remove_tasks(&owned);
        self.comments.remove(id);
        self.activity_log.remove(id);
    }

    /// Check that every sibling group holds orders exactly `0..n-1`.
    pub fn sibling_orders_dense(&self) -> bool {
        let groups: HashSet<Placement> = self.tasks.iter().map(|t| t.placement()).collect();
        groups.iter().all(|g| {
            self.siblings(g)
                .iter()
                .enumerate()
                .all(|(i, t)| t.order == i as i64)
        })
    }
}
