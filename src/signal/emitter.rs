//! Event streams - signals with no retained value.
//!
//! An [`Emitter<T>`] multicasts each emission to the listeners registered at
//! that moment and keeps nothing. Late subscribers see only future events.
//!
//! `fold` turns a stream into a [`Value`]: unlike the derived value
//! combinators it subscribes eagerly, because a stream has no replay - an
//! accumulator that connected lazily would silently miss emissions. The
//! subscription is released when the last handle of the folded value drops.

use std::cell::RefCell;
use std::rc::Rc;

use super::registry::{Callback, ListenerRegistry, Remover};
use super::value::{Value, ValueCore};

/// A discrete event stream.
///
/// Cloning shares the same stream; any clone may emit.
pub struct Emitter<T> {
    listeners: ListenerRegistry<T>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: 'static> Emitter<T> {
    /// Create a stream with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: ListenerRegistry::new(),
        }
    }

    /// Deliver an event to every current listener, synchronously.
    pub fn emit(&self, event: T) {
        self.listeners.emit(&event);
    }

    /// Subscribe to future emissions.
    pub fn on_emit(&self, callback: impl Fn(&T) + 'static) -> Remover {
        self.listeners.add(callback)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Accumulate the stream into a value, starting from `seed`.
    ///
    /// Every emission runs `step(&accumulated, &event)` and notifies the
    /// folded value's listeners with the result.
    pub fn fold<A: Clone + 'static>(
        &self,
        seed: A,
        step: impl Fn(&A, &T) -> A + 'static,
    ) -> Value<A> {
        let core = Rc::new(FoldCore {
            accumulated: RefCell::new(seed),
            listeners: ListenerRegistry::new(),
            upstream: RefCell::new(None),
        });

        let weak = Rc::downgrade(&core);
        let remover = self.on_emit(move |event| {
            if let Some(core) = weak.upgrade() {
                let next = {
                    let acc = core.accumulated.borrow();
                    step(&*acc, event)
                };
                *core.accumulated.borrow_mut() = next.clone();
                core.listeners.emit(&next);
            }
        });
        *core.upstream.borrow_mut() = Some(remover);

        Value::from_core(core)
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct FoldCore<A> {
    accumulated: RefCell<A>,
    listeners: ListenerRegistry<A>,
    upstream: RefCell<Option<Remover>>,
}

impl<A: Clone + 'static> ValueCore<A> for FoldCore<A> {
    fn current(&self) -> A {
        self.accumulated.borrow().clone()
    }

    fn subscribe(&self, callback: Callback<A>) -> Remover {
        self.listeners.add_rc(callback)
    }
}

impl<A> Drop for FoldCore<A> {
    fn drop(&mut self) {
        if let Some(remover) = self.upstream.borrow_mut().take() {
            remover.dispose();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_current_listeners_only() {
        let stream: Emitter<i32> = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        stream.emit(1); // nobody listening: lost

        let remover = {
            let log = log.clone();
            stream.on_emit(move |v| log.borrow_mut().push(*v))
        };
        stream.emit(2);
        remover.dispose();
        stream.emit(3);

        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_fold_accumulates_and_retains() {
        let stream: Emitter<i32> = Emitter::new();
        let total = stream.fold(0, |acc, v| acc + v);
        assert_eq!(total.current(), 0);

        stream.emit(3);
        stream.emit(4);
        assert_eq!(total.current(), 7);

        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            total.on_value(move |v| log.borrow_mut().push(*v));
        }
        stream.emit(1);
        assert_eq!(*log.borrow(), vec![7, 8]);
    }

    #[test]
    fn test_fold_sees_events_without_subscribers() {
        // The accumulator must not miss emissions that happen while the
        // folded value has no listeners.
        let stream: Emitter<i32> = Emitter::new();
        let count = stream.fold(0, |acc, _| acc + 1);
        stream.emit(0);
        stream.emit(0);
        assert_eq!(count.current(), 2);
    }

    #[test]
    fn test_fold_releases_subscription_on_drop() {
        let stream: Emitter<i32> = Emitter::new();
        {
            let _total = stream.fold(0, |acc, v| acc + v);
            assert_eq!(stream.listener_count(), 1);
        }
        assert_eq!(stream.listener_count(), 0);
    }
}
