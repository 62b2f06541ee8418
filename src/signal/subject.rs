//! Subjects - values bridging to an external producer.
//!
//! A [`Subject`] looks like any other value from the outside, but its
//! backing producer (a timer, an I/O completion callback, a platform event
//! hook) is only connected while at least one subscriber exists:
//!
//! - subscriber count 0 -> 1: the connect callback runs and hands the
//!   producer a [`SubjectSink`] to push values through
//! - subscriber count 1 -> 0: the remover returned by connect is invoked
//!
//! The last pushed value is retained across disconnects, so `current()`
//! keeps answering after the producer is detached.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::eq::{self, Equality};
use super::registry::{Callback, ListenerRegistry, Remover};
use super::value::{Value, ValueCore};

/// Write end handed to the external producer.
///
/// Holds no strong reference to the subject: a producer outliving every
/// subject handle pushes into nothing.
pub struct SubjectSink<T> {
    core: Weak<SubjectCore<T>>,
}

impl<T> Clone for SubjectSink<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + 'static> SubjectSink<T> {
    /// Push a value from the producer, with the subject's equality elision.
    pub fn push(&self, value: T) {
        if let Some(core) = self.core.upgrade() {
            core.push(value);
        }
    }
}

/// A value whose producer is connected only while observed.
pub struct Subject<T> {
    core: Rc<SubjectCore<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

struct SubjectCore<T> {
    value: RefCell<Option<T>>,
    equals: Equality<T>,
    listeners: ListenerRegistry<T>,
    connect: Box<dyn Fn(SubjectSink<T>) -> Remover>,
    connection: RefCell<Option<Remover>>,
    weak_self: RefCell<Weak<SubjectCore<T>>>,
}

impl<T: Clone + PartialEq + 'static> Subject<T> {
    /// Create a subject with an initial snapshot and structural equality.
    pub fn new(initial: T, connect: impl Fn(SubjectSink<T>) -> Remover + 'static) -> Self {
        Self::with_eq(Some(initial), connect, eq::structural())
    }

    /// Create a subject with no snapshot until the producer pushes one.
    ///
    /// Reading `current` before the first push is a contract violation.
    pub fn deferred(connect: impl Fn(SubjectSink<T>) -> Remover + 'static) -> Self {
        Self::with_eq(None, connect, eq::structural())
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a subject with an explicit equality function.
    pub fn with_eq(
        initial: Option<T>,
        connect: impl Fn(SubjectSink<T>) -> Remover + 'static,
        equals: Equality<T>,
    ) -> Self {
        let core = Rc::new(SubjectCore {
            value: RefCell::new(initial),
            equals,
            listeners: ListenerRegistry::new(),
            connect: Box::new(connect),
            connection: RefCell::new(None),
            weak_self: RefCell::new(Weak::new()),
        });
        *core.weak_self.borrow_mut() = Rc::downgrade(&core);
        Self { core }
    }

    /// The last pushed (or initial) snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the subject has no snapshot yet.
    pub fn current(&self) -> T {
        ValueCore::current(&*self.core)
    }

    /// Subscribe to future pushes; connects the producer if this is the
    /// first subscriber.
    pub fn on_emit(&self, callback: impl Fn(&T) + 'static) -> Remover {
        self.core.subscribe(Rc::new(callback))
    }

    /// Invoke `callback` with the current snapshot now, then subscribe it.
    pub fn on_value(&self, callback: impl Fn(&T) + 'static) -> Remover {
        callback(&self.current());
        self.on_emit(callback)
    }

    /// A read-only value handle to this subject.
    pub fn as_value(&self) -> Value<T> {
        Value::from_core(self.core.clone())
    }

    /// Check whether the producer is currently connected.
    pub fn is_connected(&self) -> bool {
        self.core.connection.borrow().is_some()
    }
}

impl<T: Clone + 'static> SubjectCore<T> {
    fn push(&self, value: T) {
        {
            let stored = self.value.borrow();
            if let Some(current) = stored.as_ref() {
                if (*self.equals)(&value, current) {
                    return;
                }
            }
        }
        *self.value.borrow_mut() = Some(value.clone());
        self.listeners.emit(&value);
    }

    fn connect_producer(&self) {
        let sink = SubjectSink {
            core: self.weak_self.borrow().clone(),
        };
        let remover = (self.connect)(sink);
        *self.connection.borrow_mut() = Some(remover);
    }

    fn disconnect_producer(&self) {
        if let Some(remover) = self.connection.borrow_mut().take() {
            remover.dispose();
        }
    }
}

impl<T: Clone + 'static> ValueCore<T> for SubjectCore<T> {
    fn current(&self) -> T {
        self.value
            .borrow()
            .as_ref()
            .cloned()
            .expect("Subject read before the producer pushed a value")
    }

    fn subscribe(&self, callback: Callback<T>) -> Remover {
        if self.listeners.is_empty() {
            self.connect_producer();
        }
        let inner = self.listeners.add_rc(callback);
        let weak = self.weak_self.borrow().clone();
        Remover::new(move || {
            inner.dispose();
            if let Some(core) = weak.upgrade() {
                if core.listeners.is_empty() {
                    core.disconnect_producer();
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// A fake producer that records connect/disconnect and exposes its sink.
    struct FakeProducer {
        connects: Rc<Cell<u32>>,
        disconnects: Rc<Cell<u32>>,
        sink: Rc<RefCell<Option<SubjectSink<i32>>>>,
    }

    impl FakeProducer {
        fn new() -> Self {
            Self {
                connects: Rc::new(Cell::new(0)),
                disconnects: Rc::new(Cell::new(0)),
                sink: Rc::new(RefCell::new(None)),
            }
        }

        fn subject(&self) -> Subject<i32> {
            let connects = self.connects.clone();
            let disconnects = self.disconnects.clone();
            let slot = self.sink.clone();
            Subject::new(0, move |sink| {
                connects.set(connects.get() + 1);
                *slot.borrow_mut() = Some(sink);
                let disconnects = disconnects.clone();
                let slot = slot.clone();
                Remover::new(move || {
                    disconnects.set(disconnects.get() + 1);
                    slot.borrow_mut().take();
                })
            })
        }

        fn push(&self, value: i32) {
            if let Some(sink) = self.sink.borrow().as_ref() {
                sink.push(value);
            }
        }
    }

    #[test]
    fn test_connects_on_first_subscriber_only() {
        let producer = FakeProducer::new();
        let subject = producer.subject();
        assert_eq!(producer.connects.get(), 0);

        let r1 = subject.on_emit(|_| {});
        let r2 = subject.on_emit(|_| {});
        assert_eq!(producer.connects.get(), 1);
        assert!(subject.is_connected());

        r1.dispose();
        assert_eq!(producer.disconnects.get(), 0);
        r2.dispose();
        assert_eq!(producer.disconnects.get(), 1);
        assert!(!subject.is_connected());
    }

    #[test]
    fn test_reconnects_after_full_disconnect() {
        let producer = FakeProducer::new();
        let subject = producer.subject();

        let r1 = subject.on_emit(|_| {});
        r1.dispose();
        let r2 = subject.on_emit(|_| {});
        assert_eq!(producer.connects.get(), 2);
        r2.dispose();
        assert_eq!(producer.disconnects.get(), 2);
    }

    #[test]
    fn test_pushes_flow_with_elision() {
        let producer = FakeProducer::new();
        let subject = producer.subject();
        let log = Rc::new(RefCell::new(Vec::new()));
        let remover = {
            let log = log.clone();
            subject.on_value(move |v| log.borrow_mut().push(*v))
        };

        producer.push(1);
        producer.push(1); // elided
        producer.push(2);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(subject.current(), 2);

        // Last value is retained after disconnect.
        remover.dispose();
        assert_eq!(subject.current(), 2);
    }

    #[test]
    #[should_panic(expected = "Subject read before the producer pushed a value")]
    fn test_deferred_read_before_push_panics() {
        let subject: Subject<i32> = Subject::deferred(|_| Remover::noop());
        let _ = subject.current();
    }
}
