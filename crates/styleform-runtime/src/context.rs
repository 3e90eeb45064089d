#![forbid(unsafe_code)]

//! Session-wide undo engine and populating window.
//!
//! An [`UndoContext`] is shared by every field registry in one editing
//! session. It owns the undo/redo history and the flags that decide whether
//! a committed change is recorded and whether listeners hear about it.
//!
//! # Windows
//!
//! | Guard                                | Listeners | Recording |
//! |--------------------------------------|-----------|-----------|
//! | [`UndoContext::populating_scope`]    | silent    | unchanged |
//! | [`UndoContext::suppress_recording`]  | unchanged | vetoed    |
//! | [`UndoContext::bulk_load`]           | silent    | vetoed    |
//! | undo/redo replay (internal)          | always    | vetoed    |
//!
//! Guards nest; a window closes when its last guard is dropped.
//!
//! # Invariants
//!
//! 1. An entry is pushed only if no veto applies (see [`VetoReason`]).
//! 2. `undo()` moves exactly one entry from the undo stack to the redo
//!    stack; `redo()` the reverse. Neither clears the other stack.
//! 3. Values written by a replay are never recorded again.
//! 4. Replay of an entry whose registry is gone discards the entry.
//! 5. State listeners see `(can_undo, can_redo)` after every stack change.
//!
//! # Failure Modes
//!
//! - **Re-entrant replay**: a listener that calls `undo()` from inside a
//!   change notification replays against the already-updated stacks. This is
//!   allowed but rarely useful.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use styleform_core::FieldIdentity;
use tracing::debug;

use crate::config::SessionConfig;
use crate::notify::Subscription;
use crate::undo::{HistoryConfig, UndoEntry, UndoHistory};

/// Host predicate consulted before recording; `true` vetoes the entry.
pub type PopulationCheck = Rc<dyn Fn() -> bool>;

type StateCallback = Rc<dyn Fn(bool, bool)>;

/// Why a committed change was not pushed onto the undo stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VetoReason {
    /// A [`RecordingGuard`] is open (see [`UndoContext::is_recording_suppressed`]).
    RecordingSuppressed,
    /// The host's population check reported a populate in progress.
    PopulationCheck,
    /// The field is configured to never record.
    FieldSuppressed,
    /// The value was written by an undo or redo.
    Replaying,
}

impl VetoReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordingSuppressed => "recording_suppressed",
            Self::PopulationCheck => "population_check",
            Self::FieldSuppressed => "field_suppressed",
            Self::Replaying => "replaying",
        }
    }
}

impl fmt::Display for VetoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`UndoContext::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Pushed,
    Vetoed(VetoReason),
}

impl Recorded {
    #[must_use]
    pub const fn is_pushed(self) -> bool {
        matches!(self, Self::Pushed)
    }
}

/// Outcome of a single undo or redo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// The field was found and restored.
    Applied(FieldIdentity),
    /// The owning registry or field is gone; the entry was discarded.
    Stale(FieldIdentity),
}

impl Replay {
    #[must_use]
    pub const fn target(self) -> FieldIdentity {
        match self {
            Self::Applied(id) | Self::Stale(id) => id,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

struct ContextInner {
    history: RefCell<UndoHistory>,
    /// Change notification suppressed while > 0.
    populating: Cell<u32>,
    /// Recording suppressed while > 0.
    recording_suppressed: Cell<u32>,
    replaying: Cell<u32>,
    population_check: RefCell<Option<PopulationCheck>>,
    state_listeners: RefCell<Vec<Weak<dyn Fn(bool, bool)>>>,
}

/// Shared handle to a session's undo engine.
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct UndoContext {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for UndoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoContext")
            .field("history", &*self.inner.history.borrow())
            .field("populating", &self.inner.populating.get())
            .field("recording_suppressed", &self.inner.recording_suppressed.get())
            .field("replaying", &self.inner.replaying.get())
            .field(
                "population_check",
                &self.inner.population_check.borrow().is_some(),
            )
            .finish()
    }
}

impl Default for UndoContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoContext {
    /// Engine with unlimited history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(HistoryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &SessionConfig) -> Self {
        Self::with_history(config.history)
    }

    #[must_use]
    pub fn with_history(config: HistoryConfig) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                history: RefCell::new(UndoHistory::new(config)),
                populating: Cell::new(0),
                recording_suppressed: Cell::new(0),
                replaying: Cell::new(0),
                population_check: RefCell::new(None),
                state_listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Silence guarded change notifications until the guard drops.
    pub fn populating_scope(&self) -> PopulatingGuard {
        PopulatingGuard::enter(self)
    }

    /// Veto undo recording until the guard drops.
    pub fn suppress_recording(&self) -> RecordingGuard {
        RecordingGuard::enter(self)
    }

    /// Both of the above: the window a host opens while loading a document
    /// into the panel.
    pub fn bulk_load(&self) -> BulkLoadGuard {
        BulkLoadGuard {
            _recording: self.suppress_recording(),
            _populating: self.populating_scope(),
        }
    }

    #[must_use]
    pub fn is_populating(&self) -> bool {
        self.inner.populating.get() > 0
    }

    #[must_use]
    pub fn is_recording_suppressed(&self) -> bool {
        self.inner.recording_suppressed.get() > 0
    }

    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.inner.replaying.get() > 0
    }

    /// Install the host's "populate in progress" predicate.
    pub fn set_population_check(&self, check: impl Fn() -> bool + 'static) {
        *self.inner.population_check.borrow_mut() = Some(Rc::new(check));
    }

    pub fn clear_population_check(&self) {
        *self.inner.population_check.borrow_mut() = None;
    }

    #[must_use]
    pub fn has_population_check(&self) -> bool {
        self.inner.population_check.borrow().is_some()
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Push `entry` unless a veto applies.
    pub fn record(&self, entry: UndoEntry, field_suppressed: bool) -> Recorded {
        if let Some(reason) = self.veto(field_suppressed) {
            debug!(
                field = %entry.target(),
                reason = reason.as_str(),
                "undo entry not recorded"
            );
            return Recorded::Vetoed(reason);
        }
        debug!(field = %entry.target(), "undo entry recorded");
        self.inner.history.borrow_mut().push(entry);
        self.notify_state();
        Recorded::Pushed
    }

    fn veto(&self, field_suppressed: bool) -> Option<VetoReason> {
        if field_suppressed {
            return Some(VetoReason::FieldSuppressed);
        }
        if self.is_replaying() {
            return Some(VetoReason::Replaying);
        }
        if self.is_recording_suppressed() {
            return Some(VetoReason::RecordingSuppressed);
        }
        // Clone out so the check may itself query this context.
        let check = self.inner.population_check.borrow().clone();
        if check.is_some_and(|check| check()) {
            return Some(VetoReason::PopulationCheck);
        }
        None
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Revert the most recent entry. `None` when there is nothing to undo.
    pub fn undo(&self) -> Option<Replay> {
        let entry = self.inner.history.borrow_mut().pop_undo()?;
        let replay = self.replay(&entry, Direction::Undo);
        if let Replay::Applied(_) = replay {
            self.inner.history.borrow_mut().push_redo(entry);
        }
        self.notify_state();
        Some(replay)
    }

    /// Re-apply the most recently undone entry. `None` when there is nothing
    /// to redo.
    pub fn redo(&self) -> Option<Replay> {
        let entry = self.inner.history.borrow_mut().pop_redo()?;
        let replay = self.replay(&entry, Direction::Redo);
        if let Replay::Applied(_) = replay {
            self.inner.history.borrow_mut().push_undo_replayed(entry);
        }
        self.notify_state();
        Some(replay)
    }

    fn replay(&self, entry: &UndoEntry, direction: Direction) -> Replay {
        let target = entry.target();
        let field = entry.registry().and_then(|registry| registry.field(target));
        let Some(field) = field else {
            debug!(
                field = %target,
                direction = direction.as_str(),
                "discarding stale undo entry"
            );
            return Replay::Stale(target);
        };

        let _replaying = ReplayGuard::enter(self);
        debug!(field = %target, direction = direction.as_str(), "replaying undo entry");
        let applied = match direction {
            Direction::Undo => field.undo_action(Some(entry)),
            Direction::Redo => field.redo_action(Some(entry)),
        };
        if applied {
            Replay::Applied(target)
        } else {
            Replay::Stale(target)
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn undo_list_size(&self) -> usize {
        self.inner.history.borrow().undo_depth()
    }

    #[must_use]
    pub fn redo_list_size(&self) -> usize {
        self.inner.history.borrow().redo_depth()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.inner.history.borrow().can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.inner.history.borrow().can_redo()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<String> {
        self.inner
            .history
            .borrow()
            .next_undo_description()
            .map(str::to_owned)
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<String> {
        self.inner
            .history
            .borrow()
            .next_redo_description()
            .map(str::to_owned)
    }

    /// Most recent first.
    #[must_use]
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inner
            .history
            .borrow()
            .undo_descriptions(limit)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Most recent first.
    #[must_use]
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inner
            .history
            .borrow()
            .redo_descriptions(limit)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.inner.history.borrow().memory_usage()
    }

    #[must_use]
    pub fn history_config(&self) -> HistoryConfig {
        *self.inner.history.borrow().config()
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    pub fn clear_history(&self) {
        self.inner.history.borrow_mut().clear();
        debug!("undo history cleared");
        self.notify_state();
    }

    /// A new document was loaded; earlier edits no longer apply.
    pub fn file_loaded(&self) {
        debug!("document loaded");
        self.clear_history();
    }

    /// The document was saved; history restarts from the saved state.
    pub fn file_saved(&self) {
        debug!("document saved");
        self.clear_history();
    }

    /// Call `callback(can_undo, can_redo)` whenever the stacks change.
    pub fn on_state_change(&self, callback: impl Fn(bool, bool) + 'static) -> Subscription {
        let strong: StateCallback = Rc::new(callback);
        self.inner
            .state_listeners
            .borrow_mut()
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    fn notify_state(&self) {
        let callbacks: Vec<StateCallback> = {
            let mut listeners = self.inner.state_listeners.borrow_mut();
            listeners.retain(|w| w.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }
        let (can_undo, can_redo) = (self.can_undo(), self.can_redo());
        for callback in &callbacks {
            callback(can_undo, can_redo);
        }
    }
}

// ============================================================================
// Guards
// ============================================================================

/// Keeps the populating window open. See [`UndoContext::populating_scope`].
#[must_use = "the window closes when the guard is dropped"]
pub struct PopulatingGuard {
    ctx: UndoContext,
}

impl PopulatingGuard {
    fn enter(ctx: &UndoContext) -> Self {
        let depth = &ctx.inner.populating;
        depth.set(depth.get().saturating_add(1));
        Self { ctx: ctx.clone() }
    }
}

impl Drop for PopulatingGuard {
    fn drop(&mut self) {
        let depth = &self.ctx.inner.populating;
        depth.set(depth.get().saturating_sub(1));
    }
}

impl fmt::Debug for PopulatingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulatingGuard").finish_non_exhaustive()
    }
}

/// Keeps undo recording vetoed. See [`UndoContext::suppress_recording`].
#[must_use = "recording resumes when the guard is dropped"]
pub struct RecordingGuard {
    ctx: UndoContext,
}

impl RecordingGuard {
    fn enter(ctx: &UndoContext) -> Self {
        let depth = &ctx.inner.recording_suppressed;
        depth.set(depth.get().saturating_add(1));
        Self { ctx: ctx.clone() }
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        let depth = &self.ctx.inner.recording_suppressed;
        depth.set(depth.get().saturating_sub(1));
    }
}

impl fmt::Debug for RecordingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingGuard").finish_non_exhaustive()
    }
}

/// Both windows at once. See [`UndoContext::bulk_load`].
#[must_use = "the load window closes when the guard is dropped"]
#[derive(Debug)]
pub struct BulkLoadGuard {
    _recording: RecordingGuard,
    _populating: PopulatingGuard,
}

struct ReplayGuard {
    ctx: UndoContext,
}

impl ReplayGuard {
    fn enter(ctx: &UndoContext) -> Self {
        let depth = &ctx.inner.replaying;
        depth.set(depth.get().saturating_add(1));
        Self { ctx: ctx.clone() }
    }
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        let depth = &self.ctx.inner.replaying;
        depth.set(depth.get().saturating_sub(1));
    }
}
