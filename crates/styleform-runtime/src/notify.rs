#![forbid(unsafe_code)]

//! Per-field change notification.
//!
//! A [`ChangeNotifier`] fans a "field X changed" signal out to registered
//! [`DataChangedListener`]s. Listeners are held either strongly (added with
//! [`ChangeNotifier::add_listener`]) or weakly behind a [`Subscription`]
//! guard (added with [`ChangeNotifier::subscribe`]).
//!
//! # Invariants
//!
//! 1. The same listener `Rc` is registered at most once.
//! 2. Listeners are called in registration order, outside of any borrow, so
//!    a listener may read the field or register further listeners.
//! 3. [`ChangeNotifier::fire_data_changed`] is silent while the session is
//!    populating; [`ChangeNotifier::fire`] always delivers.
//! 4. Dead weak listeners are pruned lazily on the next fire.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use styleform_core::FieldIdentity;
use tracing::{debug_span, trace};

use crate::context::UndoContext;

/// Receives change signals for a field.
pub trait DataChangedListener {
    fn data_changed(&self, field: FieldIdentity);
}

impl<F: Fn(FieldIdentity)> DataChangedListener for F {
    fn data_changed(&self, field: FieldIdentity) {
        self(field);
    }
}

enum ListenerSlot {
    Retained(Rc<dyn DataChangedListener>),
    Subscribed(Weak<dyn DataChangedListener>),
}

impl ListenerSlot {
    fn upgrade(&self) -> Option<Rc<dyn DataChangedListener>> {
        match self {
            Self::Retained(listener) => Some(Rc::clone(listener)),
            Self::Subscribed(weak) => weak.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            Self::Retained(_) => true,
            Self::Subscribed(weak) => weak.strong_count() > 0,
        }
    }

    fn holds(&self, listener: &Rc<dyn DataChangedListener>) -> bool {
        match self {
            Self::Retained(held) => same_listener(held, listener),
            Self::Subscribed(_) => false,
        }
    }
}

fn same_listener(a: &Rc<dyn DataChangedListener>, b: &Rc<dyn DataChangedListener>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Listener list for one field.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RefCell<Vec<ListenerSlot>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add_listener(&self, listener: Rc<dyn DataChangedListener>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|slot| slot.holds(&listener)) {
            return false;
        }
        listeners.push(ListenerSlot::Retained(listener));
        true
    }

    /// Unregister a listener added with [`Self::add_listener`].
    pub fn remove_listener(&self, listener: &Rc<dyn DataChangedListener>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|slot| !slot.holds(listener));
        listeners.len() != before
    }

    /// Register a callback for as long as the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(FieldIdentity) + 'static) -> Subscription {
        let strong: Rc<dyn DataChangedListener> = Rc::new(callback);
        self.listeners
            .borrow_mut()
            .push(ListenerSlot::Subscribed(Rc::downgrade(&strong)));
        Subscription::new(strong)
    }

    /// Number of listeners that would currently be called.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|slot| slot.is_live())
            .count()
    }

    /// Notify listeners unless `context` is in a populating window.
    ///
    /// Returns the number of listeners called.
    pub fn fire_data_changed(&self, field: FieldIdentity, context: &UndoContext) -> usize {
        if context.is_populating() {
            trace!(%field, "change notification suppressed while populating");
            return 0;
        }
        self.fire(field)
    }

    /// Notify listeners regardless of the populating window.
    pub fn fire(&self, field: FieldIdentity) -> usize {
        let callbacks: Vec<Rc<dyn DataChangedListener>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(ListenerSlot::is_live);
            listeners.iter().filter_map(ListenerSlot::upgrade).collect()
        };
        if callbacks.is_empty() {
            return 0;
        }

        let _span = debug_span!(
            "styleform.notify",
            field = %field,
            listeners = callbacks.len() as u64
        )
        .entered();
        for callback in &callbacks {
            callback.data_changed(field);
        }
        callbacks.len()
    }
}

/// RAII guard for a callback registered with `subscribe`-style methods.
///
/// Dropping it makes the callback unreachable; the dead slot is pruned on
/// the next notification.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn new<T: 'static>(strong: T) -> Self {
        Self {
            _guard: Box::new(strong),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
