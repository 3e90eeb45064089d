#![forbid(unsafe_code)]

//! Undo/redo history for field edits.
//!
//! Every committed change to a field produces one [`UndoEntry`] holding the
//! value before and after the edit. Entries live on the two stacks of an
//! [`UndoHistory`] owned by the session's [`UndoContext`](crate::UndoContext).
//!
//! ```text
//!      populate()                    undo()                 redo()
//! Field ─────────► UndoEntry ──► [undo stack] ──► [redo stack] ──┐
//!                                    ▲                           │
//!                                    └───────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`entry`]: the immutable before/after record
//! - [`history`]: undo/redo stacks, optional limits and memory accounting

pub mod entry;
pub mod history;

pub use entry::UndoEntry;
pub use history::{HistoryConfig, UndoHistory};
