//! # taskboard
//!
//! A local-first project and task tracker. All state lives in memory as a
//! single [`state::AppState`]: projects, hierarchical tasks, per-project
//! comments and an activity log. Every change runs through the
//! [`reducer`], is recorded in a bounded undo/redo [`history`], and the
//! current state is mirrored to a key-value [`storage`] backend.
//!
//! ## Key Features
//!
//! - **Hierarchical tasks** kept in a flat list with parent back-references;
//!   deleting a task removes its whole subtree.
//! - **Dense ordering**: tasks sharing a project and parent always carry
//!   orders `0..n-1`, across creates, moves, deletes and drag reorders.
//! - **Undo/redo** over the last 50 changes, with branch discard on new edits.
//! - **Activity log** per project, appended automatically by every auditable
//!   change.
//! - **Schema migration** of older stored documents and validated JSON
//!   import/export.
//!
//! ```no_run
//! use taskboard::activity::Author;
//! use taskboard::project::ProjectDraft;
//! use taskboard::reducer::Intent;
//! use taskboard::session::Session;
//! use taskboard::storage::MemoryStore;
//!
//! let mut session = Session::open(MemoryStore::new(), Author::default());
//! session.dispatch(Intent::CreateProject {
//!     draft: ProjectDraft { name: "Website".into(), ..Default::default() },
//! });
//! session.undo();
//! assert!(session.state().projects.is_empty());
//! ```

pub mod activity;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod history;
pub mod migrate;
pub mod parse;
pub mod project;
pub mod reducer;
pub mod reorder;
pub mod session;
pub mod state;
pub mod storage;
pub mod task;
pub mod transfer;
