//! Undo/redo history of element sequences.
//!
//! Every committed mutation records an immutable snapshot of the whole
//! sequence. The stack is bounded and branch-truncating: recording after an
//! undo discards the redo branch. The engine never touches the element store;
//! `undo`/`redo` hand back a copy for the caller to apply.

use std::collections::VecDeque;

use crate::element::Element;

/// Maximum number of snapshots to keep.
pub const MAX_HISTORY: usize = 50;

/// An immutable copy of an element sequence at one point in history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    elements: Vec<Element>,
}

impl HistorySnapshot {
    fn capture(elements: &[Element]) -> Self {
        Self {
            elements: elements.to_vec(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

/// Serialize a sequence to the comparable form used to detect no-op commits.
pub fn canonical_form(elements: &[Element]) -> String {
    serde_json::to_string(elements).unwrap_or_else(|e| {
        log::warn!("Falling back to debug canonical form: {}", e);
        format!("{:?}", elements)
    })
}

/// Bounded undo/redo stack of element snapshots.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<HistorySnapshot>,
    /// Index of the snapshot matching the current state.
    cursor: usize,
    capacity: usize,
    /// Canonical form of the snapshot under the cursor.
    last_recorded: String,
    /// Set while a snapshot is being handed out by undo/redo.
    replaying: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create an empty history with the default bound.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Create an empty history keeping at most `capacity` snapshots (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            last_recorded: String::new(),
            replaying: false,
        }
    }

    /// Reset to a single snapshot of `elements` (called once at load time).
    pub fn initialize(&mut self, elements: &[Element]) {
        self.snapshots.clear();
        self.snapshots.push_back(HistorySnapshot::capture(elements));
        self.cursor = 0;
        self.last_recorded = canonical_form(elements);
        self.replaying = false;
    }

    /// Record `elements` as a new history entry.
    ///
    /// Returns false without recording when a snapshot is being replayed or
    /// when `elements` matches the last recorded state.
    pub fn commit(&mut self, elements: &[Element]) -> bool {
        if self.replaying {
            return false;
        }

        let form = canonical_form(elements);
        if !self.snapshots.is_empty() && form == self.last_recorded {
            return false;
        }

        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(HistorySnapshot::capture(elements));
        self.cursor = self.snapshots.len() - 1;
        self.last_recorded = form;

        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            self.cursor -= 1;
        }

        log::debug!(
            "History commit: {} snapshots, cursor {}",
            self.snapshots.len(),
            self.cursor
        );
        true
    }

    /// Step back one snapshot, returning a copy of it.
    /// Returns `None` when already at the oldest snapshot.
    pub fn undo(&mut self) -> Option<Vec<Element>> {
        if self.cursor == 0 || self.snapshots.is_empty() {
            return None;
        }
        Some(self.replay(self.cursor - 1))
    }

    /// Step forward one snapshot, returning a copy of it.
    /// Returns `None` when already at the newest snapshot.
    pub fn redo(&mut self) -> Option<Vec<Element>> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        Some(self.replay(self.cursor + 1))
    }

    fn replay(&mut self, index: usize) -> Vec<Element> {
        self.replaying = true;
        self.cursor = index;
        let elements = self.snapshots[index].elements().to_vec();
        self.last_recorded = canonical_form(&elements);
        self.replaying = false;
        elements
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Check if a snapshot is currently being replayed.
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the current snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.snapshots.get(self.cursor)
    }
}
