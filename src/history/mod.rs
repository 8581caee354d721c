//! Snapshot-based undo/redo.
//!
//! Every entry is a complete JSON serialization of the document. Snapshots
//! are owned immutable strings, so nothing restored from history can alias
//! live state, and comparing two snapshots is a string comparison.

use std::collections::VecDeque;

use crate::models::AppState;

/// Default maximum number of undo entries.
pub const DEFAULT_UNDO_DEPTH: usize = 80;

/// Serialization of an empty document.
const EMPTY_DOCUMENT: &str = r#"{"missions":[],"riskPoints":[],"momentumLogs":[]}"#;

/// A full serialized copy of the document at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Box<str>);

impl Snapshot {
    pub fn capture(state: &AppState) -> serde_json::Result<Self> {
        Ok(Self(serde_json::to_string(state)?.into_boxed_str()))
    }

    pub fn restore(&self) -> serde_json::Result<AppState> {
        serde_json::from_str(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bounded undo stack plus redo stack.
///
/// The oldest undo entry is evicted first once `depth` is exceeded. Recording
/// a new change clears the redo stack. Undo and redo move snapshots between
/// the two stacks and never record anything themselves.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    last: Snapshot,
    depth: usize,
}

impl History {
    pub fn new(initial: &AppState, depth: usize) -> serde_json::Result<Self> {
        Ok(Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            last: Snapshot::capture(initial)?,
            depth,
        })
    }

    /// Drop both stacks and start over from `current`.
    pub fn reset(&mut self, current: &AppState) -> serde_json::Result<()> {
        self.last = Snapshot::capture(current)?;
        self.undo.clear();
        self.redo.clear();
        Ok(())
    }

    /// Drop both stacks and start over from an empty document.
    pub fn clear(&mut self) {
        self.last = Snapshot(EMPTY_DOCUMENT.into());
        self.undo.clear();
        self.redo.clear();
    }

    /// Record a committed change.
    ///
    /// When `current` differs from the last recorded snapshot, that snapshot
    /// becomes the newest undo entry and the redo stack is cleared. Returns
    /// whether an entry was recorded.
    pub fn record(&mut self, current: &AppState) -> serde_json::Result<bool> {
        let snapshot = Snapshot::capture(current)?;
        if snapshot == self.last {
            return Ok(false);
        }
        let prior = std::mem::replace(&mut self.last, snapshot);
        self.push_undo(prior);
        self.redo.clear();
        Ok(true)
    }

    /// Step back one change. `current` moves onto the redo stack.
    pub fn undo(&mut self, current: &AppState) -> serde_json::Result<Option<AppState>> {
        let current = Snapshot::capture(current)?;
        let Some(target) = self.undo.pop_back() else {
            return Ok(None);
        };
        let restored = match target.restore() {
            Ok(state) => state,
            Err(e) => {
                self.undo.push_back(target);
                return Err(e);
            }
        };

        self.redo.push(current);
        self.last = target;
        Ok(Some(restored))
    }

    /// Re-apply the most recently undone change. `current` moves onto the
    /// undo stack.
    pub fn redo(&mut self, current: &AppState) -> serde_json::Result<Option<AppState>> {
        let current = Snapshot::capture(current)?;
        let Some(target) = self.redo.pop() else {
            return Ok(None);
        };
        let restored = match target.restore() {
            Ok(state) => state,
            Err(e) => {
                self.redo.push(target);
                return Err(e);
            }
        };

        self.push_undo(current);
        self.last = target;
        Ok(Some(restored))
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
