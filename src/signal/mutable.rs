//! Mutable cells - externally settable values with equality elision.
//!
//! A [`Mutable<T>`] is the writable end of the value hierarchy: it holds a
//! current snapshot and an equality function. `update` with an equal value
//! (per that function) dispatches nothing; otherwise the stored snapshot is
//! replaced *before* listeners run, so a listener reading `current()` always
//! sees the value it was notified with.
//!
//! `Mutable::deferred()` creates a cell with no value yet. Reading `current`
//! before the first `update` is a contract violation and panics - a cell
//! that models a required input has no meaningful default to hand out.

use std::cell::RefCell;
use std::rc::Rc;

use super::eq::{self, Equality};
use super::registry::{Callback, ListenerRegistry, Remover};
use super::value::{Value, ValueCore};

/// An externally settable value.
///
/// Cloning shares the same cell; any clone may update, all observers hear it.
pub struct Mutable<T> {
    core: Rc<MutableCore<T>>,
}

impl<T> Clone for Mutable<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

struct MutableCore<T> {
    value: RefCell<Option<T>>,
    equals: Equality<T>,
    listeners: ListenerRegistry<T>,
}

impl<T: Clone + PartialEq + 'static> Mutable<T> {
    /// Create a cell with structural equality elision.
    pub fn new(initial: T) -> Self {
        Self::with_eq(initial, eq::structural())
    }

    /// Create an unset cell with structural equality elision.
    pub fn deferred() -> Self {
        Self::deferred_with_eq(eq::structural())
    }
}

impl<T: Clone + 'static> Mutable<T> {
    /// Create a cell with an explicit equality function.
    pub fn with_eq(initial: T, equals: Equality<T>) -> Self {
        let cell = Self::deferred_with_eq(equals);
        *cell.core.value.borrow_mut() = Some(initial);
        cell
    }

    /// Create an unset cell with an explicit equality function.
    pub fn deferred_with_eq(equals: Equality<T>) -> Self {
        Self {
            core: Rc::new(MutableCore {
                value: RefCell::new(None),
                equals,
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// Check whether the cell holds a value yet.
    pub fn is_set(&self) -> bool {
        self.core.value.borrow().is_some()
    }

    /// The current snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the cell was created with `deferred` and never updated.
    pub fn current(&self) -> T {
        self.core.current()
    }

    /// Store a new value and notify listeners, unless it is equal (per the
    /// cell's equality function) to the stored one.
    ///
    /// The snapshot is replaced before any listener runs. Reentrant updates
    /// from inside a listener are legal; each nested update runs its own
    /// full dispatch.
    pub fn update(&self, value: T) {
        {
            let stored = self.core.value.borrow();
            if let Some(current) = stored.as_ref() {
                if (*self.core.equals)(&value, current) {
                    return;
                }
            }
        }
        *self.core.value.borrow_mut() = Some(value.clone());
        self.core.listeners.emit(&value);
    }

    /// Subscribe to future changes only.
    pub fn on_emit(&self, callback: impl Fn(&T) + 'static) -> Remover {
        self.core.listeners.add(callback)
    }

    /// Invoke `callback` with the current snapshot now, then subscribe it.
    ///
    /// # Panics
    ///
    /// Panics if the cell is still unset.
    pub fn on_value(&self, callback: impl Fn(&T) + 'static) -> Remover {
        callback(&self.current());
        self.on_emit(callback)
    }

    /// A read-only handle to the same cell.
    pub fn as_value(&self) -> Value<T> {
        Value::from_core(self.core.clone())
    }

    /// Derive a value through a pure projection (see [`Value::map`]).
    pub fn map<U>(&self, projection: impl Fn(&T) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.as_value().map(projection)
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.core.listeners.len()
    }
}

impl<T: Clone + 'static> ValueCore<T> for MutableCore<T> {
    fn current(&self) -> T {
        self.value
            .borrow()
            .as_ref()
            .cloned()
            .expect("Mutable read before any value was set")
    }

    fn subscribe(&self, callback: Callback<T>) -> Remover {
        self.listeners.add_rc(callback)
    }
}

// =============================================================================
// Tests
// =============================================================================
