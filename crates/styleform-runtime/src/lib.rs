#![forbid(unsafe_code)]

//! Runtime: fields bound into an editing session, with undo/redo.
//!
//! # Role in StyleForm
//! `styleform-runtime` is the stateful half of the field-binding engine. A
//! style-editing panel builds a [`FieldRegistry`] over a shared
//! [`UndoContext`], adds one [`Field`] per editable property, and from then
//! on every edit flows through [`FieldHandle::populate`].
//!
//! # Primary responsibilities
//! - **FieldHandle**: normalize input, detect no-op edits, commit.
//! - **FieldRegistry**: per-panel lookup with permissive populate helpers.
//! - **ChangeNotifier**: listener fan-out, silenced while populating.
//! - **UndoContext**: undo/redo stacks, recording vetoes, replay.
//! - **DirtyTracker**: "unsaved edits" latch per panel.
//!
//! # How it fits in the system
//! The UI layer and the document loader call into registries; the document
//! serializer pulls values back out with [`FieldHandle::expression`]. Loaders
//! wrap bulk population in [`UndoContext::bulk_load`] so that neither
//! listeners nor the undo history see it.
//!
//! ```ignore
//! let ctx = UndoContext::new();
//! let panel = FieldRegistry::new(&ctx);
//! let width = panel.add(FieldKind::StrokeWidth, Field::new(DataType::Double).with_default(1.0));
//!
//! width.populate(2.5);
//! assert_eq!(ctx.undo_list_size(), 1);
//! ctx.undo();
//! assert_eq!(width.double_value()?, 1.0);
//! ```
//!
//! Everything here is single-threaded (`Rc`/`RefCell`), matching the UI
//! event thread that drives it.

pub mod config;
pub mod context;
pub mod dirty;
pub mod field;
#[cfg(feature = "logging")]
pub mod logging;
pub mod notify;
pub mod registry;
pub mod undo;

pub use config::{ConfigError, SessionConfig};
pub use context::{
    BulkLoadGuard, PopulatingGuard, PopulationCheck, Recorded, RecordingGuard, Replay,
    UndoContext, VetoReason,
};
pub use dirty::DirtyTracker;
pub use field::{Field, FieldHandle, Populated};
pub use notify::{ChangeNotifier, DataChangedListener, Subscription};
pub use registry::FieldRegistry;
pub use undo::{HistoryConfig, UndoEntry, UndoHistory};

pub use styleform_core as core;
