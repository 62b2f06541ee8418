//! Reactive list - an ordered container with structured change events.
//!
//! Every mutation is synchronous: the backing store changes first, then
//! listeners hear exactly one structured [`ListChange`] before the mutating
//! call returns. `clear` behaves like repeated `remove(0)`, one event per
//! removed entry, so the event payload order equals iteration order.

use std::cell::RefCell;
use std::rc::Rc;

use crate::signal::eq::{self, Equality};
use crate::signal::registry::{ListenerRegistry, Remover};
use crate::signal::{DerivedCore, Value};

/// A structured change to a [`ReactiveList`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    /// `value` was inserted at `index`; later entries shifted right.
    Added { index: usize, value: T },
    /// The entry at `index` was replaced.
    Updated {
        index: usize,
        value: T,
        previous: T,
    },
    /// The entry at `index` was removed; later entries shifted left.
    Removed { index: usize, value: T },
}

/// A mutable ordered container that notifies on every mutation.
///
/// Cloning shares the same list.
pub struct ReactiveList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ReactiveList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    changes: ListenerRegistry<ListChange<T>>,
}

impl<T: Clone + 'static> ReactiveList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a list seeded with `items` (no events fire for the seed).
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
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

    /// Clone of the entry at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Clone of the whole backing store.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Insert `value` at `index`, shifting later entries right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) {
        self.inner.items.borrow_mut().insert(index, value.clone());
        self.inner.changes.emit(&ListChange::Added { index, value });
    }

    /// Append `value` at the end.
    pub fn push(&self, value: T) {
        let index = self.len();
        self.insert(index, value);
    }

    /// Replace the entry at `index`.
    ///
    /// Always notifies; the list carries no equality function. Projections
    /// built with [`map_eq`](Self::map_eq) elide on their own terms.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn update(&self, index: usize, value: T) {
        let previous = {
            let mut items = self.inner.items.borrow_mut();
            std::mem::replace(&mut items[index], value.clone())
        };
        self.inner.changes.emit(&ListChange::Updated {
            index,
            value,
            previous,
        });
    }

    /// Remove and return the entry at `index`, shifting later entries left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&self, index: usize) -> T {
        let value = self.inner.items.borrow_mut().remove(index);
        self.inner.changes.emit(&ListChange::Removed {
            index,
            value: value.clone(),
        });
        value
    }

    /// Remove every entry, one `Removed` event per entry, front to back.
    pub fn clear(&self) {
        while !self.is_empty() {
            self.remove(0);
        }
    }

    /// Subscribe to structured change events.
    pub fn on_change(&self, callback: impl Fn(&ListChange<T>) + 'static) -> Remover {
        self.inner.changes.add(callback)
    }

    /// Project the whole snapshot into a derived value.
    ///
    /// The projection recomputes on any structured change; its own equality
    /// decides whether downstream listeners fire.
    pub fn map<U>(&self, projection: impl Fn(&[T]) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.map_eq(projection, eq::structural())
    }

    /// [`map`](Self::map) with an explicit equality for elision.
    pub fn map_eq<U: Clone + 'static>(
        &self,
        projection: impl Fn(&[T]) -> U + 'static,
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

    /// The whole list as an opaque snapshot value; fires on any structured
    /// change.
    pub fn as_value(&self) -> Value<Vec<T>> {
        self.map_eq(|items| items.to_vec(), eq::never())
    }

    /// The length as a derived value; fires only when the length changes.
    pub fn size_value(&self) -> Value<usize> {
        self.map(|items| items.len())
    }
}

impl<T: Clone + 'static> Default for ReactiveList<T> {
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
    fn test_insert_at_front_shifts() {
        let list = ReactiveList::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            list.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        list.insert(0, "a");
        list.insert(0, "b");
        assert_eq!(list.snapshot(), vec!["b", "a"]);
        assert_eq!(
            *log.borrow(),
            vec![
                ListChange::Added {
                    index: 0,
                    value: "a"
                },
                ListChange::Added {
                    index: 0,
                    value: "b"
                },
            ]
        );
    }

    #[test]
    fn test_insert_yields_value_at_index() {
        let list = ReactiveList::new();
        list.push(1);
        list.push(3);
        list.insert(1, 2);
        assert_eq!(list.snapshot(), vec![1, 2, 3]);
        assert_eq!(list.get(1), Some(2));
    }

    #[test]
    fn test_update_carries_previous() {
        let list = ReactiveList::with_items(vec![10, 20]);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            list.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        list.update(1, 25);
        assert_eq!(
            *log.borrow(),
            vec![ListChange::Updated {
                index: 1,
                value: 25,
                previous: 20
            }]
        );
    }

    #[test]
    fn test_remove_emits_and_shifts() {
        let list = ReactiveList::with_items(vec!["a", "b", "c"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            list.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        let removed = list.remove(1);
        assert_eq!(removed, "b");
        assert_eq!(list.snapshot(), vec!["a", "c"]);
        assert_eq!(
            *log.borrow(),
            vec![ListChange::Removed {
                index: 1,
                value: "b"
            }]
        );
    }

    #[test]
    fn test_clear_is_repeated_remove_front() {
        let list = ReactiveList::with_items(vec![1, 2, 3]);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            list.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                ListChange::Removed { index: 0, value: 1 },
                ListChange::Removed { index: 0, value: 2 },
                ListChange::Removed { index: 0, value: 3 },
            ]
        );
    }

    #[test]
    fn test_store_mutated_before_notification() {
        let list = ReactiveList::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let list2 = list.clone();
            let seen = seen.clone();
            list.on_change(move |_| seen.borrow_mut().push(list2.snapshot()));
        }
        list.push(1);
        list.push(2);
        assert_eq!(*seen.borrow(), vec![vec![1], vec![1, 2]]);
    }

    #[test]
    fn test_size_value_elides() {
        let list = ReactiveList::with_items(vec![1]);
        let size = list.size_value();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            size.on_value(move |n| log.borrow_mut().push(*n));
        }
        list.update(0, 99); // length unchanged: elided
        list.push(2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_as_value_fires_on_any_change() {
        let list = ReactiveList::with_items(vec![1]);
        let snapshots = Rc::new(RefCell::new(Vec::new()));
        {
            let snapshots = snapshots.clone();
            list.as_value()
                .on_emit(move |items| snapshots.borrow_mut().push(items.clone()));
        }
        list.push(2);
        list.update(0, 1); // same value, still a structured change
        assert_eq!(*snapshots.borrow(), vec![vec![1, 2], vec![1, 2]]);
    }
}
