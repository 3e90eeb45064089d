#![forbid(unsafe_code)]

//! Undo/redo stacks with optional limits.
//!
//! [`UndoHistory`] keeps two stacks of [`UndoEntry`] values. The default
//! configuration keeps every entry; hosts opt into depth and memory limits. It only stores entries; replaying them against fields is
//! done by [`UndoContext`](crate::UndoContext).
//!
//! # Invariants
//!
//! 1. `total_bytes` equals the sum of `size_bytes()` over both stacks.
//! 2. `undo_stack.len() <= config.max_depth` after every push.
//! 3. Recording a new entry clears the redo stack.
//! 4. Moving an entry between stacks (undo/redo replay) never clears either.
//!
//! ```text
//! record(e3)         undo: [e1, e2, e3]   redo: []
//! undo() x2          undo: [e1]           redo: [e3, e2]
//! record(e4)         undo: [e1, e4]       redo: []
//! ```

use std::collections::VecDeque;
use std::fmt;

use super::entry::UndoEntry;

/// Limits applied to a session's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "session-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "session-config", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of entries on the undo stack (`usize::MAX` = unlimited).
    pub max_depth: usize,
    /// Maximum total bytes across both stacks (0 = unlimited).
    pub max_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
        }
    }

    /// No depth or memory limit.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
        }
    }
}

/// Undo and redo stacks, newest entry at the back of each.
pub struct UndoHistory {
    undo_stack: VecDeque<UndoEntry>,
    redo_stack: VecDeque<UndoEntry>,
    config: HistoryConfig,
    total_bytes: usize,
}

impl fmt::Debug for UndoHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("total_bytes", &self.total_bytes)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UndoHistory {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            total_bytes: 0,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Record a freshly committed change. Starts a new branch.
    pub fn push(&mut self, entry: UndoEntry) {
        self.clear_redo();
        self.total_bytes += entry.size_bytes();
        self.undo_stack.push_back(entry);
        self.enforce_limits();
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        let entry = self.undo_stack.pop_back()?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        Some(entry)
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo_stack.pop_back()?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        Some(entry)
    }

    /// Park an entry that was just undone.
    pub fn push_redo(&mut self, entry: UndoEntry) {
        self.total_bytes += entry.size_bytes();
        self.redo_stack.push_back(entry);
    }

    /// Return an entry that was just redone, keeping the rest of the redo
    /// stack intact.
    pub fn push_undo_replayed(&mut self, entry: UndoEntry) {
        self.total_bytes += entry.size_bytes();
        self.undo_stack.push_back(entry);
        self.enforce_limits();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(UndoEntry::description)
            .collect()
    }

    /// Most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(UndoEntry::description)
            .collect()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(UndoEntry::description)
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(UndoEntry::description)
    }

    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_bytes = 0;
    }

    fn clear_redo(&mut self) {
        for entry in self.redo_stack.drain(..) {
            self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        }
    }

    /// Evict oldest entries until depth and memory limits hold.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            if let Some(entry) = self.undo_stack.pop_front() {
                self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
            }
        }

        if self.config.max_bytes == 0 {
            return;
        }
        while self.total_bytes > self.config.max_bytes {
            // Redo entries go first, then the oldest undo entries. The newest
            // undo entry always survives.
            let evicted = if let Some(entry) = self.redo_stack.pop_front() {
                entry
            } else if self.undo_stack.len() > 1 {
                match self.undo_stack.pop_front() {
                    Some(entry) => entry,
                    None => break,
                }
            } else {
                break;
            };
            self.total_bytes = self.total_bytes.saturating_sub(evicted.size_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use styleform_core::{FieldIdentity, FieldKind, Scalar, ValueModel};

    fn entry(n: i64) -> UndoEntry {
        UndoEntry::new(
            FieldIdentity::indexed(FieldKind::Size, n as u32),
            ValueModel::Constant(Scalar::Integer(n)),
            ValueModel::Constant(Scalar::Integer(n + 1)),
        )
    }

    fn bytes_of(history: &UndoHistory) -> usize {
        history
            .undo_stack
            .iter()
            .chain(history.redo_stack.iter())
            .map(UndoEntry::size_bytes)
            .sum()
    }

    #[test]
    fn push_clears_redo() {
        let mut history = UndoHistory::default();
        history.push(entry(1));
        history.push(entry(2));
        let undone = history.pop_undo().expect("entry");
        history.push_redo(undone);
        assert!(history.can_redo());

        history.push(entry(3));
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn replayed_push_keeps_redo() {
        let mut history = UndoHistory::default();
        history.push(entry(1));
        history.push(entry(2));
        for _ in 0..2 {
            let e = history.pop_undo().expect("entry");
            history.push_redo(e);
        }
        let e = history.pop_redo().expect("entry");
        history.push_undo_replayed(e);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 1);
    }

    #[test]
    fn default_keeps_every_entry() {
        assert_eq!(HistoryConfig::default(), HistoryConfig::unlimited());
        let mut history = UndoHistory::default();
        for n in 0..250 {
            history.push(entry(n));
        }
        assert_eq!(history.undo_depth(), 250);
        assert_eq!(history.memory_usage(), bytes_of(&history));
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut history = UndoHistory::new(HistoryConfig::new(3, 0));
        for n in 0..5 {
            history.push(entry(n));
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(
            history.undo_descriptions(10),
            vec!["Change size[4]", "Change size[3]", "Change size[2]"]
        );
    }

    #[test]
    fn memory_limit_evicts_but_keeps_newest() {
        let one = entry(0).size_bytes();
        let mut history = UndoHistory::new(HistoryConfig::new(100, one * 2));
        for n in 0..6 {
            history.push(entry(n));
        }
        assert!(history.memory_usage() <= one * 2 + 8);
        assert!(history.undo_depth() >= 1);
        assert_eq!(history.next_undo_description(), Some("Change size[5]"));
    }

    #[test]
    fn byte_accounting_matches_contents() {
        let mut history = UndoHistory::default();
        for n in 0..4 {
            history.push(entry(n));
        }
        let e = history.pop_undo().expect("entry");
        history.push_redo(e);
        assert_eq!(history.memory_usage(), bytes_of(&history));
        history.clear();
        assert_eq!(history.memory_usage(), 0);
        assert_eq!(history.next_redo_description(), None);
    }
}
