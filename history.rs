/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Undo/redo history for the mind-map session.
//!
//! The log stores full deep snapshots of the graph (viewport excluded) plus a
//! cursor. Snapshotting whole state trades memory for simplicity and
//! eliminates inverse-operation bugs; graphs are tens to low hundreds of
//! nodes, so the cost is negligible. History is ephemeral: created on session
//! open, discarded on session end.

use crate::graph::Graph;

/// Maximum retained history entries; the oldest are trimmed past this.
pub const MAX_HISTORY_ENTRIES: usize = 128;

/// Append-only, index-addressed snapshot log with a cursor.
///
/// Invariant: `cursor < entries.len()`. Entries after the cursor are the
/// redo-able future and are discarded the moment a new entry is recorded
/// after an undo (linear history, no branching).
pub struct HistoryLog {
    entries: Vec<Graph>,
    cursor: usize,
}

impl HistoryLog {
    /// Create a log seeded with the initial graph snapshot.
    pub fn seeded(initial: &Graph) -> Self {
        Self {
            entries: vec![initial.clone()],
            cursor: 0,
        }
    }

    /// Record a new snapshot after a user-intent-complete edit.
    ///
    /// Truncates any redo tail, appends a deep copy, and advances the cursor.
    /// This is the only mutation path into the log.
    pub fn record(&mut self, graph: &Graph) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(graph.clone());
        self.cursor += 1;

        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let excess = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(0..excess);
            self.cursor -= excess;
        }
    }

    /// Step back one entry. Returns the snapshot to restore, or `None` at the
    /// start of history.
    pub fn undo(&mut self) -> Option<&Graph> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward one entry. Returns the snapshot to restore, or `None` at
    /// the tip.
    pub fn redo(&mut self) -> Option<&Graph> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}
