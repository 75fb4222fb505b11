//! A running tracker: history, mutation engine and store wired together.
//!
//! Loading migrates the stored document once and seeds the history. Every
//! accepted change (dispatch, undo, redo, import) writes the current state back
//! to the store. Write failures are logged and never undo the in-memory change.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::activity::{Author, MutationContext};
use crate::error::ImportError;
use crate::history::History;
use crate::migrate::{load_state, needs_migration};
use crate::reducer::{reduce, Intent};
use crate::state::AppState;
use crate::storage::{KeyValueStore, LAST_EXPORT_KEY, STATE_KEY};
use crate::transfer::{parse_import, ExportBundle};

pub struct Session<S: KeyValueStore> {
    store: S,
    history: History<AppState>,
    author: Author,
}

impl<S: KeyValueStore> Session<S> {
    /// Load the stored state, migrating it if needed.
    ///
    /// Unreadable or undecodable data starts a fresh, empty state.
    pub fn open(store: S, author: Author) -> Self {
        let (initial, migrated) = match store.get(STATE_KEY) {
            Ok(Some(raw)) => {
                let migrating = needs_migration(&raw);
                match load_state(raw) {
                    Ok(state) => (state, migrating),
                    Err(e) => {
                        warn!(error = %e, "error decoding stored state, starting fresh");
                        (AppState::default(), false)
                    }
                }
            }
            Ok(None) => (AppState::default(), false),
            Err(e) => {
                warn!(error = %e, "error reading stored state, starting fresh");
                (AppState::default(), false)
            }
        };
        let mut session = Session { store, history: History::new(initial), author };
        if migrated {
            session.persist();
        }
        session
    }

    pub fn state(&self) -> &AppState {
        self.history.current()
    }

    pub fn history(&self) -> &History<AppState> {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply an intent now. Returns whether the state changed.
    pub fn dispatch(&mut self, intent: Intent) -> bool {
        let ctx = MutationContext::new(self.author.clone());
        self.dispatch_with(intent, &ctx)
    }

    /// Apply an intent with an explicit mutation context.
    pub fn dispatch_with(&mut self, intent: Intent, ctx: &MutationContext) -> bool {
        let name = intent.name();
        let accepted = self.history.update(|current| reduce(current, intent, ctx));
        debug!(intent = name, accepted, history = self.history.len(), "dispatched");
        if accepted {
            self.persist();
        }
        accepted
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.persist();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.persist();
        }
        moved
    }

    /// Replace the state with an imported document, discarding history.
    ///
    /// A rejected document leaves state and history untouched.
    pub fn import_json(&mut self, raw: Value) -> Result<(), ImportError> {
        let state = parse_import(raw).inspect_err(|e| warn!(error = %e, "import rejected"))?;
        self.history.reset(state);
        self.persist();
        Ok(())
    }

    /// Snapshot the exportable part of the state.
    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle::from_state(self.state())
    }

    /// Remember `now` as the time of the last completed export.
    pub fn record_export(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.store.set(LAST_EXPORT_KEY, &Value::String(now.to_rfc3339())) {
            warn!(error = %e, "failed to record export time");
        }
    }

    /// When the last export happened, if ever.
    pub fn last_export(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_EXPORT_KEY).ok().flatten()?;
        DateTime::parse_from_rfc3339(raw.as_str()?).ok().map(|d| d.with_timezone(&Utc))
    }

    fn persist(&mut self) {
        let value = match serde_json::to_value(self.history.current()) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "failed to serialize state");
                return;
            }
        };
        if let Err(e) = self.store.set(STATE_KEY, &value) {
            warn!(error = %e, "failed to save state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectDraft;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create(name: &str) -> Intent {
        Intent::CreateProject { draft: ProjectDraft { name: name.into(), ..Default::default() } }
    }

    #[test]
    fn test_dispatch_persists_each_change() {
        let mut s = Session::open(MemoryStore::new(), Author::default());
        assert!(s.dispatch(create("A")));
        assert!(s.dispatch(create("B")));
        assert_eq!(s.store().writes(), 2);
        let stored = s.store().get(STATE_KEY).unwrap().unwrap();
        assert_eq!(stored, serde_json::to_value(s.state()).unwrap());
    }

    #[test]
    fn test_noop_intent_records_nothing() {
        let mut s = Session::open(MemoryStore::new(), Author::default());
        assert!(!s.dispatch(Intent::DeleteProject { id: "missing".into() }));
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.store().writes(), 0);
    }

    #[test]
    fn test_undo_redo_write_back() {
        let mut s = Session::open(MemoryStore::new(), Author::default());
        s.dispatch(create("A"));
        assert!(s.undo());
        assert!(s.state().projects.is_empty());
        assert!(!s.undo());
        assert!(s.redo());
        assert_eq!(s.state().projects.len(), 1);
        assert_eq!(s.store().writes(), 3);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = MemoryStore::new();
        store.fail_writes(true);
        let mut s = Session::open(store, Author::default());
        assert!(s.dispatch(create("A")));
        assert_eq!(s.state().projects.len(), 1);
        assert!(s.can_undo());
    }

    #[test]
    fn test_import_resets_history_and_rejects_bad_shape() {
        let mut s = Session::open(MemoryStore::new(), Author::default());
        s.dispatch(create("A"));
        let before = s.state().clone();
        assert!(s.import_json(json!({"projects": 3, "tasks": []})).is_err());
        assert_eq!(*s.state(), before);
        assert!(s.can_undo());

        s.import_json(json!({"projects": [], "tasks": []})).unwrap();
        assert!(s.state().projects.is_empty());
        assert!(!s.can_undo() && !s.can_redo());
    }

    #[test]
    fn test_open_migrates_legacy_and_writes_back() {
        let mut store = MemoryStore::new();
        store
            .set(STATE_KEY, &json!({
                "projects": [{ "id": "p", "name": "P", "createdAt": "2024-01-01T00:00:00Z" }],
                "tasks": []
            }))
            .unwrap();
        let s = Session::open(store, Author::default());
        assert_eq!(s.state().projects.len(), 1);
        assert_eq!(s.history().len(), 1);
        let stored = s.store().get(STATE_KEY).unwrap().unwrap();
        assert!(stored.get("activityLog").is_some());
    }

    #[test]
    fn test_open_corrupt_state_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, &json!({"projects": "nope"})).unwrap();
        let s = Session::open(store, Author::default());
        assert_eq!(*s.state(), AppState::default());
    }

    #[test]
    fn test_export_records_timestamp() {
        let mut s = Session::open(MemoryStore::new(), Author::default());
        s.dispatch(create("A"));
        assert!(s.last_export().is_none());
        let now = Utc::now();
        let bundle = s.export_bundle();
        assert_eq!(bundle.projects.len(), 1);
        assert!(s.last_export().is_none());
        s.record_export(now);
        assert_eq!(s.last_export().map(|d| d.timestamp()), Some(now.timestamp()));
    }

    #[test]
    fn test_open_keeps_projects_missing_optional_fields() {
        let mut store = MemoryStore::new();
        store
            .set(STATE_KEY, &json!({
                "projects": [{ "id": "p", "name": "Kept", "createdAt": "2024-01-01T00:00:00Z", "color": "#10B981" }],
                "tasks": [],
                "comments": {},
                "activityLog": {}
            }))
            .unwrap();
        let mut s = Session::open(store, Author::default());
        assert_eq!(s.state().projects.len(), 1);
        assert_eq!(s.state().projects[0].color, "#10B981");
        assert!(s.dispatch(create("New")));

        let stored = s.store().get(STATE_KEY).unwrap().unwrap();
        let names: Vec<&str> = stored["projects"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Kept", "New"]);
    }
}
