//! Command implementations for the CLI interface.
//!
//! Each handler resolves human-friendly identifiers, builds one [`Intent`] and
//! runs it through the [`Session`], so one-shot commands and the interactive
//! shell persist changes the same way.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::fields::*;
use crate::parse::*;
use crate::project::{Project, ProjectDraft};
use crate::reducer::Intent;
use crate::session::Session;
use crate::state::AppState;
use crate::storage::KeyValueStore;
use crate::task::{Placement, Task, TaskDraft};

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Post a comment on a project.
    Comment {
        /// Project id, id prefix or name.
        project: String,
        /// Comment text.
        content: String,
    },

    /// Show a project's activity log.
    Log {
        /// Project id, id prefix or name.
        project: String,
        /// Only show the most recent N entries.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Replace all data with a JSON document ({ projects, tasks, ... }).
    Import {
        /// Input JSON file path.
        input: PathBuf,
    },

    /// Export projects and tasks as JSON.
    Export {
        /// Output file path (default: stdout).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Interactive session with undo/redo.
    Shell,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Hex colour, e.g. #10B981.
        #[arg(long)]
        color: Option<String>,
    },
    /// Edit project details.
    Edit {
        /// Project id, id prefix or name.
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Replace tags. May be repeated and comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a project with all its tasks, comments and activity.
    Delete { id: String },
    /// Archive or restore a project.
    Archive { id: String },
    /// Archive several projects.
    BulkArchive { ids: Vec<String> },
    /// Delete several projects.
    BulkDelete { ids: Vec<String> },
    /// List projects in display order.
    List {
        /// Include archived projects.
        #[arg(long)]
        all: bool,
    },
    /// Move a project before or after another.
    Reorder {
        dragged: String,
        target: String,
        #[arg(long, value_enum, default_value_t = DropPosition::Top)]
        position: DropPosition,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task.
    Add {
        /// Project id, id prefix or name.
        project: String,
        title: String,
        /// Parent task id, id prefix or title.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Status::ToDo)]
        status: Status,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", "in Nd", or a weekday.
        #[arg(long)]
        start: Option<String>,
        /// Due date, same formats as --start.
        #[arg(long)]
        due: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Edit a task, optionally moving it to another project or parent.
    Edit {
        /// Task id, id prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        /// Move into this project (as a top-level task unless --parent is given).
        #[arg(long)]
        project: Option<String>,
        /// Move under this parent task.
        #[arg(long)]
        parent: Option<String>,
        /// Make this a top-level task.
        #[arg(long)]
        clear_parent: bool,
        /// Blocked-by task, may be repeated. Replaces existing dependencies.
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },
    /// Delete a task and all its subtasks.
    Delete { id: String },
    /// Set a task's status.
    Status {
        id: String,
        #[arg(value_enum)]
        status: Status,
    },
    /// Toggle a task's focus flag.
    Focus { id: String },
    /// Move a task before or after a sibling.
    Reorder {
        dragged: String,
        target: String,
        #[arg(long, value_enum, default_value_t = DropPosition::Top)]
        position: DropPosition,
    },
    /// Show a project's task tree.
    List {
        /// Project id, id prefix or name.
        project: String,
    },
}

/// One line typed into the interactive shell.
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Revert the last change.
    Undo,
    /// Re-apply the last undone change.
    Redo,
    /// Leave the shell.
    #[command(alias = "quit")]
    Exit,
    #[command(flatten)]
    Run(Commands),
}

/// Run a single command against a session.
pub fn run<S: KeyValueStore>(session: &mut Session<S>, command: Commands) -> Result<(), String> {
    match command {
        Commands::Project { action } => cmd_project(session, action),
        Commands::Task { action } => cmd_task(session, action),
        Commands::Comment { project, content } => {
            let project_id = resolve_project(&project, session.state())?;
            apply(session, Intent::AddComment { project_id, content }, "Comment added")
        }
        Commands::Log { project, limit } => cmd_log(session.state(), &project, limit),
        Commands::Import { input } => cmd_import(session, input),
        Commands::Export { output } => cmd_export(session, output),
        Commands::Shell => cmd_shell(session),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

fn apply<S: KeyValueStore>(session: &mut Session<S>, intent: Intent, done: &str) -> Result<(), String> {
    if session.dispatch(intent) {
        println!("{done}");
    } else {
        println!("Nothing changed.");
    }
    Ok(())
}

fn require_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".into());
    }
    Ok(())
}

fn parse_date_arg(s: &str) -> Result<chrono::DateTime<Utc>, String> {
    parse_date_input(s).ok_or_else(|| {
        format!("Unrecognised date '{s}'. Use YYYY-MM-DD, 'today', 'tomorrow', 'in Nd' or a weekday.")
    })
}

/// Handle `project` subcommands.
pub fn cmd_project<S: KeyValueStore>(session: &mut Session<S>, action: ProjectAction) -> Result<(), String> {
    match action {
        ProjectAction::Add { name, desc, tags, priority, color } => {
            require_name(&name)?;
            let draft = ProjectDraft {
                name: name.trim().to_string(),
                description: desc.unwrap_or_default(),
                tags: split_and_normalise_tags(&tags),
                priority,
                color,
                ..Default::default()
            };
            apply(session, Intent::CreateProject { draft }, "Project created")
        }
        ProjectAction::Edit { id, name, desc, tags, priority, color } => {
            let id = resolve_project(&id, session.state())?;
            let Some(project) = session.state().project(&id) else {
                return Err(format!("Project {id} not found."));
            };
            let mut draft = ProjectDraft::from_project(project);
            if let Some(n) = name {
                require_name(&n)?;
                draft.name = n.trim().to_string();
            }
            if let Some(d) = desc {
                draft.description = d;
            }
            if !tags.is_empty() {
                draft.tags = split_and_normalise_tags(&tags);
            }
            if let Some(p) = priority {
                draft.priority = p;
            }
            if color.is_some() {
                draft.color = color;
            }
            apply(session, Intent::EditProject { id, draft }, "Project updated")
        }
        ProjectAction::Delete { id } => {
            let id = resolve_project(&id, session.state())?;
            apply(session, Intent::DeleteProject { id }, "Project deleted")
        }
        ProjectAction::Archive { id } => {
            let id = resolve_project(&id, session.state())?;
            apply(session, Intent::ToggleArchive { id }, "Archive flag toggled")
        }
        ProjectAction::BulkArchive { ids } => {
            let ids = resolve_all(&ids, session.state())?;
            apply(session, Intent::BulkArchive { ids }, "Projects archived")
        }
        ProjectAction::BulkDelete { ids } => {
            let ids = resolve_all(&ids, session.state())?;
            apply(session, Intent::BulkDelete { ids }, "Projects deleted")
        }
        ProjectAction::List { all } => {
            print_projects(session.state(), all);
            Ok(())
        }
        ProjectAction::Reorder { dragged, target, position } => {
            let dragged = resolve_project(&dragged, session.state())?;
            let target = resolve_project(&target, session.state())?;
            apply(session, Intent::ReorderProjects { dragged, target, position }, "Projects reordered")
        }
    }
}

fn resolve_all(ids: &[String], state: &AppState) -> Result<Vec<String>, String> {
    ids.iter().map(|i| resolve_project(i, state)).collect()
}

/// Handle `task` subcommands.
pub fn cmd_task<S: KeyValueStore>(session: &mut Session<S>, action: TaskAction) -> Result<(), String> {
    match action {
        TaskAction::Add { project, title, parent, desc, priority, status, start, due, tags } => {
            require_name(&title)?;
            let state = session.state();
            let project_id = resolve_project(&project, state)?;
            let parent_id = parent.map(|p| resolve_task(&p, state)).transpose()?;
            let draft = TaskDraft {
                title: title.trim().to_string(),
                description: desc.unwrap_or_default(),
                status,
                priority,
                start_date: start.as_deref().map(parse_date_arg).transpose()?,
                due_date: due.as_deref().map(parse_date_arg).transpose()?,
                tags: split_and_normalise_tags(&tags),
                dependencies: Vec::new(),
            };
            let at = Placement::new(project_id, parent_id);
            apply(session, Intent::CreateTask { draft, at }, "Task created")
        }
        TaskAction::Edit { id, title, desc, priority, due, clear_due, project, parent, clear_parent, depends_on } => {
            let state = session.state();
            let id = resolve_task(&id, state)?;
            let Some(task) = state.task(&id) else {
                return Err(format!("Task {id} not found."));
            };
            let mut draft = TaskDraft::from_task(task);
            let mut at = task.placement();
            if let Some(t) = title {
                require_name(&t)?;
                draft.title = t.trim().to_string();
            }
            if let Some(d) = desc {
                draft.description = d;
            }
            if let Some(p) = priority {
                draft.priority = p;
            }
            if clear_due {
                draft.due_date = None;
            }
            if let Some(d) = due {
                draft.due_date = Some(parse_date_arg(&d)?);
            }
            if !depends_on.is_empty() {
                draft.dependencies = depends_on.iter().map(|d| resolve_task(d, state)).collect::<Result<_, _>>()?;
            }
            let explicit_project = project.is_some();
            if let Some(p) = project {
                at = Placement::new(resolve_project(&p, state)?, None);
            }
            if clear_parent {
                at.parent_id = None;
            }
            if let Some(p) = parent {
                let pid = resolve_task(&p, state)?;
                if let Some(parent_task) = state.task(&pid) {
                    if explicit_project && parent_task.project_id != at.project_id {
                        return Err(format!(
                            "Parent task {} belongs to another project; drop --project or pick a parent in it.",
                            short_id(&pid)
                        ));
                    }
                    at.project_id = parent_task.project_id.clone();
                }
                at.parent_id = Some(pid);
            }
            apply(session, Intent::EditTask { id, draft, at }, "Task updated")
        }
        TaskAction::Delete { id } => {
            let id = resolve_task(&id, session.state())?;
            let descendants = session.state().collect_descendants(&id).len();
            apply(session, Intent::DeleteTask { id }, &format!("Deleted {} task(s)", descendants + 1))
        }
        TaskAction::Status { id, status } => {
            let id = resolve_task(&id, session.state())?;
            apply(session, Intent::UpdateTaskStatus { id, status }, "Status updated")
        }
        TaskAction::Focus { id } => {
            let id = resolve_task(&id, session.state())?;
            apply(session, Intent::ToggleTaskFocus { id }, "Focus toggled")
        }
        TaskAction::Reorder { dragged, target, position } => {
            let dragged = resolve_task(&dragged, session.state())?;
            let target = resolve_task(&target, session.state())?;
            apply(session, Intent::ReorderTasks { dragged, target, position }, "Tasks reordered")
        }
        TaskAction::List { project } => {
            let state = session.state();
            let project_id = resolve_project(&project, state)?;
            print_task_tree(state, &project_id);
            Ok(())
        }
    }
}

/// Print a project's activity log, oldest first.
pub fn cmd_log(state: &AppState, project: &str, limit: Option<usize>) -> Result<(), String> {
    let project_id = resolve_project(project, state)?;
    let entries = state.activity_log.get(&project_id).map(Vec::as_slice).unwrap_or_default();
    let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
    if entries.is_empty() {
        println!("No activity.");
    }
    for e in &entries[skip..] {
        println!("{}  {:<12} {}", e.timestamp.format("%Y-%m-%d %H:%M"), truncate(&e.author, 12), e.action);
    }
    Ok(())
}

/// Import a JSON document, replacing all data and clearing history.
pub fn cmd_import<S: KeyValueStore>(session: &mut Session<S>, input: PathBuf) -> Result<(), String> {
    let text = fs::read_to_string(&input).map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| format!("Import failed: {e}"))?;
    session.import_json(raw).map_err(|e| format!("Import failed: {e}"))?;
    let state = session.state();
    println!("Imported {} project(s), {} task(s).", state.projects.len(), state.tasks.len());
    Ok(())
}

/// Export projects and tasks as pretty JSON.
pub fn cmd_export<S: KeyValueStore>(session: &mut Session<S>, output: Option<PathBuf>) -> Result<(), String> {
    let bundle = session.export_bundle();
    let data = serde_json::to_string_pretty(&bundle).map_err(|e| format!("Export failed: {e}"))?;
    match output {
        Some(path) => {
            fs::write(&path, data).map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            println!("Exported {} project(s), {} task(s) to {}", bundle.projects.len(), bundle.tasks.len(), path.display());
        }
        None => println!("{data}"),
    }
    session.record_export(Utc::now());
    Ok(())
}

/// Interactive loop reading one command per line.
pub fn cmd_shell<S: KeyValueStore>(session: &mut Session<S>) -> Result<(), String> {
    let stdin = io::stdin();
    let mut out = io::stdout();
    println!("Type a command (e.g. `project list`), `undo`, `redo`, `help` or `exit`.");
    loop {
        print!("tb> ");
        let _ = out.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(format!("Failed to read input: {e}")),
        }
        let Some(words) = shlex::split(line.trim()) else {
            eprintln!("Unbalanced quotes.");
            continue;
        };
        if words.is_empty() {
            continue;
        }
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(p) => p,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };
        match parsed.command {
            ShellCommand::Undo => println!("{}", if session.undo() { "Undone." } else { "Nothing to undo." }),
            ShellCommand::Redo => println!("{}", if session.redo() { "Redone." } else { "Nothing to redo." }),
            ShellCommand::Exit => return Ok(()),
            ShellCommand::Run(Commands::Shell) => eprintln!("Already in the shell."),
            ShellCommand::Run(command) => {
                if let Err(e) = run(session, command) {
                    eprintln!("{e}");
                }
            }
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print projects in display order with task counts and goal progress.
pub fn print_projects(state: &AppState, include_archived: bool) {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for t in &state.tasks {
        let c = counts.entry(t.project_id.as_str()).or_default();
        c.0 += 1;
        if t.status == Status::Done {
            c.1 += 1;
        }
    }
    println!("{:<9} {:<5} {:<20} {:<7} {:<8} {:<9} {}", "ID", "Order", "Name", "Pri", "Archived", "Done", "Goals");
    for p in state.projects_in_order() {
        if p.is_archived && !include_archived {
            continue;
        }
        let (total, done) = counts.get(p.id.as_str()).copied().unwrap_or_default();
        println!(
            "{:<9} {:<5} {:<20} {:<7} {:<8} {:<9} {}",
            short_id(&p.id),
            p.order,
            truncate(&p.name, 20),
            format_priority(p.priority),
            if p.is_archived { "yes" } else { "-" },
            format!("{done}/{total}"),
            format_goals(p),
        );
    }
}

fn format_goals(p: &Project) -> String {
    if p.goals.is_empty() {
        return "-".into();
    }
    p.goals
        .iter()
        .map(|g| format!("{} {:.0}%", g.title, Project::goal_progress(g) * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a project's tasks as an indented tree in sibling order.
pub fn print_task_tree(state: &AppState, project_id: &str) {
    fn dfs(state: &AppState, at: &Placement, depth: usize) {
        for t in state.siblings(at) {
            print_task_row(t, depth);
            if depth < 64 {
                dfs(state, &Placement::new(t.project_id.clone(), Some(t.id.clone())), depth + 1);
            }
        }
    }
    println!("{:<9} {:<12} {:<7} {:<12} {}", "ID", "Status", "Pri", "Due", "Title [tags]");
    dfs(state, &Placement::new(project_id, None), 0);
}

fn print_task_row(t: &Task, depth: usize) {
    let tags = if t.tags.is_empty() { String::new() } else { format!(" [{}]", t.tags.join(",")) };
    let focus = if t.is_focused { "* " } else { "" };
    let due = t.due_date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
    let late = if t.is_overdue(Utc::now()) { " (late)" } else { "" };
    println!(
        "{:<9} {:<12} {:<7} {:<12} {}{}{}{}{}",
        short_id(&t.id),
        format_status(t.status),
        format_priority(t.priority),
        due,
        "  ".repeat(depth),
        focus,
        t.title,
        tags,
        late
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Author;
    use crate::storage::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), Author::default())
    }

    fn add_project(s: &mut Session<MemoryStore>, name: &str) {
        let action = ProjectAction::Add { name: name.into(), desc: None, tags: vec![], priority: Priority::High, color: None };
        cmd_project(s, action).unwrap();
    }

    fn add_task(s: &mut Session<MemoryStore>, project: &str, title: &str, parent: Option<&str>) {
        let action = TaskAction::Add {
            project: project.into(),
            title: title.into(),
            parent: parent.map(String::from),
            desc: None,
            priority: Priority::Medium,
            status: Status::ToDo,
            start: None,
            due: Some("2030-01-01".into()),
            tags: vec!["x".into()],
        };
        cmd_task(s, action).unwrap();
    }

    #[test]
    fn test_commands_resolve_names() {
        let mut s = session();
        add_project(&mut s, "Website");
        add_task(&mut s, "website", "Design", None);
        add_task(&mut s, "Website", "Mockups", Some("design"));
        let state = s.state();
        assert_eq!(state.tasks.len(), 2);
        let design = state.tasks.iter().find(|t| t.title == "Design").unwrap();
        let mockups = state.tasks.iter().find(|t| t.title == "Mockups").unwrap();
        assert_eq!(mockups.parent_id.as_deref(), Some(design.id.as_str()));
        assert!(design.due_date.is_some());
    }

    #[test]
    fn test_empty_name_rejected_before_engine() {
        let mut s = session();
        let action = ProjectAction::Add { name: "  ".into(), desc: None, tags: vec![], priority: Priority::Low, color: None };
        assert!(cmd_project(&mut s, action).is_err());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn test_edit_with_parent_moves_across_projects() {
        let mut s = session();
        add_project(&mut s, "One");
        add_project(&mut s, "Two");
        add_task(&mut s, "One", "Loose", None);
        add_task(&mut s, "Two", "Anchor", None);
        let action = TaskAction::Edit {
            id: "Loose".into(),
            title: None,
            desc: None,
            priority: None,
            due: None,
            clear_due: true,
            project: None,
            parent: Some("Anchor".into()),
            clear_parent: false,
            depends_on: vec![],
        };
        cmd_task(&mut s, action).unwrap();
        let state = s.state();
        let loose = state.tasks.iter().find(|t| t.title == "Loose").unwrap();
        let anchor = state.tasks.iter().find(|t| t.title == "Anchor").unwrap();
        assert_eq!(loose.project_id, anchor.project_id);
        assert_eq!(loose.parent_id.as_deref(), Some(anchor.id.as_str()));
        assert!(loose.due_date.is_none());
    }

    #[test]
    fn test_edit_rejects_parent_outside_given_project() {
        let mut s = session();
        add_project(&mut s, "One");
        add_project(&mut s, "Two");
        add_task(&mut s, "One", "Loose", None);
        add_task(&mut s, "Two", "Anchor", None);
        let before = s.state().clone();
        let action = TaskAction::Edit {
            id: "Loose".into(),
            title: None,
            desc: None,
            priority: None,
            due: None,
            clear_due: false,
            project: Some("One".into()),
            parent: Some("Anchor".into()),
            clear_parent: false,
            depends_on: vec![],
        };
        let err = cmd_task(&mut s, action).unwrap_err();
        assert!(err.contains("another project"));
        assert_eq!(*s.state(), before);
    }

    #[test]
    fn test_export_records_time_only_after_write() {
        let mut s = session();
        add_project(&mut s, "Website");
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("no_such_dir").join("out.json");
        assert!(cmd_export(&mut s, Some(missing)).is_err());
        assert!(s.last_export().is_none());

        let out = dir.path().join("out.json");
        cmd_export(&mut s, Some(out.clone())).unwrap();
        assert!(out.exists());
        assert!(s.last_export().is_some());
    }

    #[test]
    fn test_shell_line_parsing() {
        let line = ShellLine::try_parse_from(["undo"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Undo));
        let line = ShellLine::try_parse_from(["project", "add", "New thing"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Run(Commands::Project { action: ProjectAction::Add { .. } })));
    }
}
