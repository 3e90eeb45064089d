#![forbid(unsafe_code)]

//! Per-panel "unsaved edits" flag.

use std::cell::Cell;
use std::rc::Rc;

/// Latch set by any committed user edit and cleared by the host.
///
/// Cloning yields another handle to the same flag. Undo and redo replays do
/// not touch it.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    flag: Rc<Cell<bool>>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.flag.set(true);
    }

    #[must_use]
    pub fn is_tree_data_updated(&self) -> bool {
        self.flag.get()
    }

    pub fn reset(&self) {
        self.flag.set(false);
    }
}
