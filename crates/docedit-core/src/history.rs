//! Snapshot-based undo/redo
//!
//! The history owns deep copies. `push` stores its argument by value and
//! `undo`/`redo` hand back clones, so the live state and the stored
//! snapshots never alias.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::HISTORY_LIMIT;

/// Toolbar-facing summary of the history position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub cursor: isize,
    pub length: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    /// `None` until the first push
    cursor: Option<usize>,
    limit: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl<T: Clone> History<T> {
    /// Create an empty history that keeps at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: limit.max(1),
        }
    }

    /// Record a new state, discarding any redo branch.
    pub fn push(&mut self, snapshot: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot);

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = Some(self.entries.len() - 1);
        trace!(cursor = self.entries.len() - 1, len = self.entries.len(), "history push");
    }

    /// Step back one entry and return a copy of it.
    ///
    /// Returns `None` at the oldest entry or when nothing was pushed.
    pub fn undo(&mut self) -> Option<T> {
        let cursor = self.cursor.filter(|c| *c > 0)?;
        let cursor = cursor - 1;
        self.cursor = Some(cursor);
        trace!(cursor, "history undo");
        self.entries.get(cursor).cloned()
    }

    /// Step forward one entry and return a copy of it.
    pub fn redo(&mut self) -> Option<T> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if self.cursor.is_none() || next >= self.entries.len() {
            return None;
        }
        self.cursor = Some(next);
        trace!(cursor = next, "history redo");
        self.entries.get(next).cloned()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Cursor position, `-1` before the first push.
    pub fn cursor(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            cursor: self.cursor(),
            length: self.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}
