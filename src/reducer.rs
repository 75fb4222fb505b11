//! State mutation engine.
//!
//! Every user action is an [`Intent`]. [`reduce`] applies one intent to a state
//! and returns the next state, appending activity entries as it goes. Intents
//! arrive already validated, and an intent that names an entity which no
//! longer exists leaves the state unchanged.

use std::collections::HashSet;

use tracing::debug;

use crate::activity::{log_activity, new_comment, MutationContext};
use crate::fields::{format_status, DropPosition, Status};
use crate::project::{Project, ProjectDraft};
use crate::reorder::reorder_items;
use crate::state::AppState;
use crate::task::{Placement, Task, TaskDraft};

/// A caller-issued request to perform one mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateProject { draft: ProjectDraft },
    EditProject { id: String, draft: ProjectDraft },
    DeleteProject { id: String },
    ToggleArchive { id: String },
    BulkArchive { ids: Vec<String> },
    BulkDelete { ids: Vec<String> },
    ReorderProjects { dragged: String, target: String, position: DropPosition },
    CreateTask { draft: TaskDraft, at: Placement },
    /// Edit a task and place it at `at`. Moving happens when `at` differs from
    /// the task's current project or parent.
    EditTask { id: String, draft: TaskDraft, at: Placement },
    DeleteTask { id: String },
    UpdateTaskStatus { id: String, status: Status },
    ToggleTaskFocus { id: String },
    ReorderTasks { dragged: String, target: String, position: DropPosition },
    AddComment { project_id: String, content: String },
}

impl Intent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::CreateProject { .. } => "create-project",
            Intent::EditProject { .. } => "edit-project",
            Intent::DeleteProject { .. } => "delete-project",
            Intent::ToggleArchive { .. } => "toggle-archive",
            Intent::BulkArchive { .. } => "bulk-archive",
            Intent::BulkDelete { .. } => "bulk-delete",
            Intent::ReorderProjects { .. } => "reorder-projects",
            Intent::CreateTask { .. } => "create-task",
            Intent::EditTask { .. } => "edit-task",
            Intent::DeleteTask { .. } => "delete-task",
            Intent::UpdateTaskStatus { .. } => "update-task-status",
            Intent::ToggleTaskFocus { .. } => "toggle-task-focus",
            Intent::ReorderTasks { .. } => "reorder-tasks",
            Intent::AddComment { .. } => "add-comment",
        }
    }
}

/// Apply `intent` to `state`, returning the resulting state.
pub fn reduce(state: &AppState, intent: Intent, ctx: &MutationContext) -> AppState {
    let mut next = state.clone();
    debug!(intent = intent.name(), "reducing intent");
    match intent {
        Intent::CreateProject { draft } => create_project(&mut next, draft, ctx),
        Intent::EditProject { id, draft } => edit_project(&mut next, &id, draft, ctx),
        Intent::DeleteProject { id } => next.remove_project(&id),
        Intent::ToggleArchive { id } => toggle_archive(&mut next, &id, ctx),
        Intent::BulkArchive { ids } => bulk_archive(&mut next, &ids, ctx),
        Intent::BulkDelete { ids } => {
            for id in &ids {
                next.remove_project(id);
            }
        }
        Intent::ReorderProjects { dragged, target, position } => {
            let projects = std::mem::take(&mut next.projects);
            next.projects = reorder_items(projects, &dragged, &target, position);
        }
        Intent::CreateTask { draft, at } => create_task(&mut next, draft, at, ctx),
        Intent::EditTask { id, draft, at } => edit_task(&mut next, &id, draft, at, ctx),
        Intent::DeleteTask { id } => delete_task(&mut next, &id, ctx),
        Intent::UpdateTaskStatus { id, status } => update_status(&mut next, &id, status, ctx),
        Intent::ToggleTaskFocus { id } => {
            if let Some(t) = next.task_mut(&id) {
                t.is_focused = !t.is_focused;
            }
        }
        Intent::ReorderTasks { dragged, target, position } => reorder_tasks(&mut next, &dragged, &target, position),
        Intent::AddComment { project_id, content } => add_comment(&mut next, &project_id, content, ctx),
    }
    next
}

fn create_project(state: &mut AppState, draft: ProjectDraft, ctx: &MutationContext) {
    let project = Project::from_draft(ctx.new_id(), draft, state.next_project_order(), ctx.now);
    let (id, name) = (project.id.clone(), project.name.clone());
    state.projects.push(project);
    log_activity(state, &id, format!("created project \"{name}\""), ctx);
}

fn edit_project(state: &mut AppState, id: &str, draft: ProjectDraft, ctx: &MutationContext) {
    let Some(p) = state.project_mut(id) else {
        return;
    };
    p.apply_draft(draft);
    log_activity(state, id, "edited project details", ctx);
}

fn toggle_archive(state: &mut AppState, id: &str, ctx: &MutationContext) {
    let Some(p) = state.project_mut(id) else {
        return;
    };
    p.is_archived = !p.is_archived;
    let action = if p.is_archived { "archived the project" } else { "restored the project" };
    log_activity(state, id, action, ctx);
}

fn bulk_archive(state: &mut AppState, ids: &[String], ctx: &MutationContext) {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut hit = Vec::new();
    for p in state.projects.iter_mut().filter(|p| wanted.contains(p.id.as_str())) {
        p.is_archived = true;
        hit.push(p.id.clone());
    }
    for id in hit {
        log_activity(state, &id, "archived the project", ctx);
    }
}

/// A placement is usable when its project exists and its parent, if any, is a
/// task of that same project.
fn placement_valid(state: &AppState, at: &Placement) -> bool {
    if state.project(&at.project_id).is_none() {
        return false;
    }
    match at.parent_id.as_deref() {
        None => true,
        Some(pid) => state.task(pid).is_some_and(|p| p.project_id == at.project_id),
    }
}

fn create_task(state: &mut AppState, draft: TaskDraft, at: Placement, ctx: &MutationContext) {
    if !placement_valid(state, &at) {
        return;
    }
    let order = state.next_sibling_order(&at);
    let task = Task::from_draft(ctx.new_id(), draft, at, order, ctx.now);
    let (project_id, title) = (task.project_id.clone(), task.title.clone());
    state.tasks.push(task);
    log_activity(state, &project_id, format!("created task \"{title}\""), ctx);
}

fn edit_task(state: &mut AppState, id: &str, draft: TaskDraft, at: Placement, ctx: &MutationContext) {
    let Some(current) = state.task(id) else {
        return;
    };
    let from = current.placement();

    if from == at {
        let title = draft.title.clone();
        if let Some(t) = state.task_mut(id) {
            t.apply_draft(draft);
        }
        log_activity(state, &from.project_id, format!("edited task \"{title}\""), ctx);
        return;
    }

    // Reject moves that would break the hierarchy.
    if !placement_valid(state, &at) {
        return;
    }
    if let Some(pid) = at.parent_id.as_deref() {
        if pid == id || state.is_ancestor(id, pid) {
            return;
        }
    }

    let project_changed = from.project_id != at.project_id;
    if project_changed {
        for d in state.collect_descendants(id) {
            if let Some(t) = state.task_mut(&d) {
                t.project_id = at.project_id.clone();
            }
        }
    }

    let order = state.tasks.iter().filter(|t| t.is_in(&at)).count() as i64;
    let title = draft.title.clone();
    if let Some(t) = state.task_mut(id) {
        t.apply_draft(draft);
        t.project_id = at.project_id.clone();
        t.parent_id = at.parent_id.clone();
        t.order = order;
    }
    state.renumber_group(&from);

    if project_changed {
        log_activity(state, &at.project_id, format!("moved task \"{title}\" into this project"), ctx);
    }
    log_activity(state, &from.project_id, format!("edited task \"{title}\""), ctx);
}

fn delete_task(state: &mut AppState, id: &str, ctx: &MutationContext) {
    let Some(target) = state.task(id) else {
        return;
    };
    let from = target.placement();
    let title = target.title.clone();
    let mut doomed = state.collect_descendants(id);
    doomed.insert(id.to_string());
    state.remove_tasks(&doomed);
    state.renumber_group(&from);
    log_activity(state, &from.project_id, format!("deleted task \"{title}\""), ctx);
}

fn update_status(state: &mut AppState, id: &str, status: Status, ctx: &MutationContext) {
    let Some(t) = state.task_mut(id) else {
        return;
    };
    if t.status == status {
        return;
    }
    t.status = status;
    let (project_id, title) = (t.project_id.clone(), t.title.clone());
    log_activity(
        state,
        &project_id,
        format!("changed status of task \"{title}\" to {}", format_status(status)),
        ctx,
    );
}

fn reorder_tasks(state: &mut AppState, dragged: &str, target: &str, position: DropPosition) {
    let Some(group) = state.task(dragged).map(Task::placement) else {
        return;
    };
    let members: Vec<Task> = state.tasks.iter().filter(|t| t.is_in(&group)).cloned().collect();
    // Write new orders back by id so untouched groups keep their positions.
    for moved in reorder_items(members, dragged, target, position) {
        if let Some(t) = state.task_mut(&moved.id) {
            t.order = moved.order;
        }
    }
}

fn add_comment(state: &mut AppState, project_id: &str, content: String, ctx: &MutationContext) {
    if state.project(project_id).is_none() {
        return;
    }
    let comment = new_comment(project_id, content, ctx);
    state.comments.entry(project_id.to_string()).or_default().push(comment);
    log_activity(state, project_id, "added a comment", ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Author;
    use crate::state::tests::{project, task};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ctx() -> MutationContext {
        MutationContext::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(), Author::default())
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft { title: title.into(), ..Default::default() }
    }

    fn base() -> AppState {
        AppState {
            projects: vec![project("p1", 0), project("p2", 1)],
            tasks: vec![
                task("a", "p1", None, 0),
                task("b", "p1", None, 1),
                task("c", "p1", None, 2),
                task("a1", "p1", Some("a"), 0),
                task("a2", "p1", Some("a"), 1),
                task("a1x", "p1", Some("a1"), 0),
                task("x", "p2", None, 0),
            ],
            ..Default::default()
        }
    }

    fn actions(s: &AppState, project_id: &str) -> Vec<String> {
        s.activity_log
            .get(project_id)
            .map(|l| l.iter().map(|e| e.action.clone()).collect())
            .unwrap_or_default()
    }

    fn order_of(s: &AppState, id: &str) -> i64 {
        s.task(id).unwrap().order
    }

    #[test]
    fn test_create_project_appends_with_next_order() {
        let s = reduce(&base(), Intent::CreateProject { draft: ProjectDraft { name: "New".into(), ..Default::default() } }, &ctx());
        let p = s.projects.last().unwrap();
        assert_eq!(p.order, 2);
        assert!(!p.is_archived);
        assert_eq!(p.created_at, ctx().now);
        assert_eq!(actions(&s, &p.id), vec!["created project \"New\"".to_string()]);
    }

    #[test]
    fn test_edit_project_merges_and_logs() {
        let s = reduce(
            &base(),
            Intent::EditProject { id: "p1".into(), draft: ProjectDraft { name: "Renamed".into(), ..Default::default() } },
            &ctx(),
        );
        let p = s.project("p1").unwrap();
        assert_eq!(p.name, "Renamed");
        assert_eq!(p.order, 0);
        assert_eq!(actions(&s, "p1"), vec!["edited project details".to_string()]);
    }

    #[test]
    fn test_edit_missing_project_is_noop() {
        let before = base();
        let s = reduce(&before, Intent::EditProject { id: "nope".into(), draft: ProjectDraft::default() }, &ctx());
        assert_eq!(s, before);
    }

    #[test]
    fn test_delete_project_cascades() {
        let s = reduce(&base(), Intent::AddComment { project_id: "p1".into(), content: "hi".into() }, &ctx());
        let s = reduce(&s, Intent::DeleteProject { id: "p1".into() }, &ctx());
        assert_eq!(s.projects.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["p2"]);
        assert_eq!(s.tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["x"]);
        assert!(!s.comments.contains_key("p1"));
        assert!(!s.activity_log.contains_key("p1"));
    }

    #[test]
    fn test_toggle_archive_logs_direction() {
        let s = reduce(&base(), Intent::ToggleArchive { id: "p1".into() }, &ctx());
        assert!(s.project("p1").unwrap().is_archived);
        let s = reduce(&s, Intent::ToggleArchive { id: "p1".into() }, &ctx());
        assert!(!s.project("p1").unwrap().is_archived);
        assert_eq!(actions(&s, "p1"), vec!["archived the project".to_string(), "restored the project".to_string()]);
    }

    #[test]
    fn test_bulk_archive_forces_archived() {
        let mut start = base();
        start.project_mut("p1").unwrap().is_archived = true;
        let s = reduce(&start, Intent::BulkArchive { ids: vec!["p1".into(), "p2".into(), "zz".into()] }, &ctx());
        assert!(s.projects.iter().all(|p| p.is_archived));
        assert_eq!(actions(&s, "p1").len(), 1);
        assert_eq!(actions(&s, "p2").len(), 1);
    }

    #[test]
    fn test_bulk_delete() {
        let mut s = base();
        for p in ["p1", "p2"] {
            s = reduce(&s, Intent::AddComment { project_id: p.into(), content: "note".into() }, &ctx());
            assert_eq!(s.comments[p].len(), 1);
            assert_eq!(actions(&s, p).len(), 1);
        }
        let s = reduce(&s, Intent::BulkDelete { ids: vec!["p1".into(), "p2".into()] }, &ctx());
        assert!(s.projects.is_empty());
        assert!(s.tasks.is_empty());
        assert!(s.comments.is_empty());
        assert!(s.activity_log.is_empty());
    }

    #[test]
    fn test_create_task_places_last_in_group() {
        let s = reduce(&base(), Intent::CreateTask { draft: draft("new"), at: Placement::new("p1", Some("a".into())) }, &ctx());
        let t = s.tasks.last().unwrap();
        assert_eq!(t.order, 2);
        assert!(!t.is_focused);
        assert_eq!(t.start_date, Some(ctx().now));
        assert_eq!(actions(&s, "p1"), vec!["created task \"new\"".to_string()]);
    }

    #[test]
    fn test_create_task_with_foreign_parent_is_noop() {
        let before = base();
        let s = reduce(&before, Intent::CreateTask { draft: draft("n"), at: Placement::new("p2", Some("a".into())) }, &ctx());
        assert_eq!(s, before);
    }

    #[test]
    fn test_edit_task_in_place() {
        let s = reduce(&base(), Intent::EditTask { id: "b".into(), draft: draft("B2"), at: Placement::new("p1", None) }, &ctx());
        assert_eq!(s.task("b").unwrap().title, "B2");
        assert_eq!(order_of(&s, "b"), 1);
        assert_eq!(actions(&s, "p1"), vec!["edited task \"B2\"".to_string()]);
    }

    #[test]
    fn test_move_task_to_other_project() {
        let s = reduce(&base(), Intent::EditTask { id: "a".into(), draft: draft("A"), at: Placement::new("p2", None) }, &ctx());
        let a = s.task("a").unwrap();
        assert_eq!(a.project_id, "p2");
        assert_eq!(a.order, 1);
        assert_eq!(order_of(&s, "b"), 0);
        assert_eq!(order_of(&s, "c"), 1);
        for d in ["a1", "a2", "a1x"] {
            assert_eq!(s.task(d).unwrap().project_id, "p2");
        }
        assert_eq!(actions(&s, "p2"), vec!["moved task \"A\" into this project".to_string()]);
        assert_eq!(actions(&s, "p1"), vec!["edited task \"A\"".to_string()]);
        assert!(s.sibling_orders_dense());
    }

    #[test]
    fn test_move_task_under_new_parent() {
        let s = reduce(&base(), Intent::EditTask { id: "b".into(), draft: draft("B"), at: Placement::new("p1", Some("a".into())) }, &ctx());
        let b = s.task("b").unwrap();
        assert_eq!(b.parent_id.as_deref(), Some("a"));
        assert_eq!(b.order, 2);
        assert_eq!(order_of(&s, "a"), 0);
        assert_eq!(order_of(&s, "c"), 1);
        assert_eq!(actions(&s, "p1"), vec!["edited task \"B\"".to_string()]);
    }

    #[test]
    fn test_move_under_own_descendant_is_rejected() {
        let before = base();
        let s = reduce(&before, Intent::EditTask { id: "a".into(), draft: draft("A"), at: Placement::new("p1", Some("a1x".into())) }, &ctx());
        assert_eq!(s, before);
        let s = reduce(&before, Intent::EditTask { id: "a".into(), draft: draft("A"), at: Placement::new("p1", Some("a".into())) }, &ctx());
        assert_eq!(s, before);
    }

    #[test]
    fn test_delete_task_removes_subtree() {
        let mut start = base();
        start.task_mut("x").unwrap().dependencies = vec!["a1x".into(), "c".into()];
        let s = reduce(&start, Intent::DeleteTask { id: "a".into() }, &ctx());
        assert_eq!(s.tasks.len(), start.tasks.len() - 4);
        for gone in ["a", "a1", "a2", "a1x"] {
            assert!(s.task(gone).is_none());
        }
        assert_eq!(order_of(&s, "b"), 0);
        assert_eq!(order_of(&s, "c"), 1);
        assert_eq!(s.task("x").unwrap().dependencies, vec!["c".to_string()]);
        assert_eq!(actions(&s, "p1"), vec!["deleted task \"A\"".to_string()]);
    }

    #[test]
    fn test_status_change_logs_once() {
        let s = reduce(&base(), Intent::UpdateTaskStatus { id: "a".into(), status: Status::Done }, &ctx());
        assert_eq!(actions(&s, "p1"), vec!["changed status of task \"A\" to Done".to_string()]);
        let again = reduce(&s, Intent::UpdateTaskStatus { id: "a".into(), status: Status::Done }, &ctx());
        assert_eq!(again, s);
    }

    #[test]
    fn test_toggle_focus_does_not_log() {
        let s = reduce(&base(), Intent::ToggleTaskFocus { id: "a".into() }, &ctx());
        assert!(s.task("a").unwrap().is_focused);
        assert!(s.activity_log.is_empty());
    }

    #[test]
    fn test_reorder_tasks_within_group() {
        let s = reduce(&base(), Intent::ReorderTasks { dragged: "c".into(), target: "a".into(), position: DropPosition::Top }, &ctx());
        assert_eq!(order_of(&s, "c"), 0);
        assert_eq!(order_of(&s, "a"), 1);
        assert_eq!(order_of(&s, "b"), 2);
        assert_eq!(order_of(&s, "a1"), 0);
        assert!(s.sibling_orders_dense());
    }

    #[test]
    fn test_reorder_across_groups_is_noop() {
        let before = base();
        let s = reduce(&before, Intent::ReorderTasks { dragged: "a1".into(), target: "b".into(), position: DropPosition::Top }, &ctx());
        assert_eq!(s, before);
    }

    #[test]
    fn test_reorder_projects() {
        let s = reduce(&base(), Intent::ReorderProjects { dragged: "p2".into(), target: "p1".into(), position: DropPosition::Top }, &ctx());
        assert_eq!(s.project("p2").unwrap().order, 0);
        assert_eq!(s.project("p1").unwrap().order, 1);
    }

    #[test]
    fn test_add_comment() {
        let s = reduce(&base(), Intent::AddComment { project_id: "p2".into(), content: "looks good".into() }, &ctx());
        let c = &s.comments["p2"][0];
        assert_eq!(c.content, "looks good");
        assert_eq!(c.author_name, "You");
        assert_eq!(actions(&s, "p2"), vec!["added a comment".to_string()]);
    }
}
