//! Bounded linear undo/redo history.
//!
//! The history is a list of snapshots plus a cursor. Writing after an undo
//! discards every snapshot past the cursor, and once the list exceeds
//! [`HISTORY_LIMIT`] the oldest snapshot is evicted.

use tracing::debug;

/// Maximum number of snapshots kept.
pub const HISTORY_LIMIT: usize = 50;

/// Snapshots of `T` with a movable cursor.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    cursor: usize,
    limit: usize,
}

impl<T: Clone + PartialEq> History<T> {
    /// Start a history holding only `initial`.
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, HISTORY_LIMIT)
    }

    /// Start a history with a custom snapshot cap (at least one).
    pub fn with_limit(initial: T, limit: usize) -> Self {
        History { entries: vec![initial], cursor: 0, limit: limit.max(1) }
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    /// Record `next` as the newest snapshot.
    ///
    /// Returns `false` without touching the history when `next` equals the
    /// current snapshot.
    pub fn set_state(&mut self, next: T) -> bool {
        if next == *self.current() {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(next);
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > self.limit {
            self.entries.remove(0);
            self.cursor -= 1;
            debug!(limit = self.limit, "history full, evicted oldest snapshot");
        }
        true
    }

    /// Derive the next snapshot from the current one and record it.
    pub fn update<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(self.current());
        self.set_state(next)
    }

    /// Step back one snapshot. Returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Replace the whole history with a single snapshot.
    pub fn reset(&mut self, state: T) {
        self.entries = vec![state];
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Position of the cursor within the snapshots.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
