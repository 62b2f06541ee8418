//! Reactive set - unique elements in insertion order, with change events.
//!
//! Backed by an `IndexSet`, so iteration order is first-insertion order and
//! stays consistent with the change-event order seen by a listener that
//! observed from empty. Removal shifts (never swaps) so the remaining order
//! is preserved.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::signal::eq::{self, Equality};
use crate::signal::registry::{ListenerRegistry, Remover};
use crate::signal::{DerivedCore, Value};

/// A structured change to a [`ReactiveSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum SetChange<T> {
    /// `value` was not present and is now a member.
    Added { value: T },
    /// `value` was a member and no longer is.
    Removed { value: T },
}

/// A mutable set that notifies on every membership change.
///
/// Cloning shares the same set.
pub struct ReactiveSet<T> {
    inner: Rc<SetInner<T>>,
}

impl<T> Clone for ReactiveSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct SetInner<T> {
    items: RefCell<IndexSet<T>>,
    changes: ListenerRegistry<SetChange<T>>,
}

impl<T: Clone + Hash + Eq + 'static> ReactiveSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SetInner {
                items: RefCell::new(IndexSet::new()),
                changes: ListenerRegistry::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }

    /// Members in insertion order.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.items.borrow().iter().cloned().collect()
    }

    /// Add a member. Returns false (and notifies nobody) if already present.
    pub fn add(&self, value: T) -> bool {
        let inserted = self.inner.items.borrow_mut().insert(value.clone());
        if inserted {
            self.inner.changes.emit(&SetChange::Added { value });
        }
        inserted
    }

    /// Remove a member, preserving the order of the rest. Returns false
    /// (and notifies nobody) if not present.
    pub fn remove(&self, value: &T) -> bool {
        let removed = self.inner.items.borrow_mut().shift_remove(value);
        if removed {
            self.inner.changes.emit(&SetChange::Removed {
                value: value.clone(),
            });
        }
        removed
    }

    /// Remove every member, one `Removed` event per member, in insertion
    /// order.
    pub fn clear(&self) {
        loop {
            let first = self.inner.items.borrow().first().cloned();
            match first {
                Some(value) => {
                    self.remove(&value);
                }
                None => break,
            }
        }
    }

    /// Subscribe to structured change events.
    pub fn on_change(&self, callback: impl Fn(&SetChange<T>) + 'static) -> Remover {
        self.inner.changes.add(callback)
    }

    /// Project the whole snapshot into a derived value.
    pub fn map<U>(&self, projection: impl Fn(&IndexSet<T>) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.map_eq(projection, eq::structural())
    }

    /// [`map`](Self::map) with an explicit equality for elision.
    pub fn map_eq<U: Clone + 'static>(
        &self,
        projection: impl Fn(&IndexSet<T>) -> U + 'static,
        equals: Equality<U>,
    ) -> Value<U> {
        let compute_inner = self.inner.clone();
        let connect_inner = self.inner.clone();
        DerivedCore::build(
            move || {
                let items = compute_inner.items.borrow();
                projection(&items)
            },
            move |ping| {
                let ping = ping.clone();
                vec![connect_inner.changes.add(move |_| (*ping)())]
            },
            equals,
        )
    }

    /// The whole set as an opaque snapshot value; fires on any structured
    /// change.
    pub fn as_value(&self) -> Value<Vec<T>> {
        self.map_eq(|items| items.iter().cloned().collect(), eq::never())
    }

    /// Membership of `value` as a derived bool; fires only when membership
    /// actually flips.
    pub fn has_value(&self, value: T) -> Value<bool> {
        self.map(move |items| items.contains(&value))
    }

    /// The size as a derived value; fires only when the size changes.
    pub fn size_value(&self) -> Value<usize> {
        self.map(|items| items.len())
    }
}

impl<T: Clone + Hash + Eq + 'static> Default for ReactiveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates() {
        let set = ReactiveSet::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            set.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        assert!(set.add("a"));
        assert!(!set.add("a"));
        assert_eq!(set.len(), 1);
        assert_eq!(*log.borrow(), vec![SetChange::Added { value: "a" }]);
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let set = ReactiveSet::new();
        for v in ["a", "b", "c", "d"] {
            set.add(v);
        }
        set.remove(&"b");
        assert_eq!(set.snapshot(), vec!["a", "c", "d"]);

        // Re-adding a removed element puts it at the end.
        set.add("b");
        assert_eq!(set.snapshot(), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let set: ReactiveSet<&str> = ReactiveSet::new();
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            set.on_change(move |_| *count.borrow_mut() += 1);
        }
        assert!(!set.remove(&"missing"));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_clear_emits_in_insertion_order() {
        let set = ReactiveSet::new();
        for v in [3, 1, 2] {
            set.add(v);
        }
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            set.on_change(move |change| {
                if let SetChange::Removed { value } = change {
                    log.borrow_mut().push(*value);
                }
            });
        }
        set.clear();
        assert!(set.is_empty());
        assert_eq!(*log.borrow(), vec![3, 1, 2]);
    }

    #[test]
    fn test_has_value_fires_only_on_membership_flips() {
        let set = ReactiveSet::new();
        let has_a = set.has_value("a");
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            has_a.on_value(move |present| log.borrow_mut().push(*present));
        }
        set.add("b"); // unrelated: elided
        set.add("a");
        set.add("c"); // unrelated: elided
        set.remove(&"a");
        assert_eq!(*log.borrow(), vec![false, true, false]);
    }

    #[test]
    fn test_size_value() {
        let set = ReactiveSet::new();
        let size = set.size_value();
        set.add(1);
        set.add(2);
        assert_eq!(size.current(), 2);
    }
}
