//! Reactive map - keyed entries in insertion order, with change events.
//!
//! Backed by an `IndexMap`, so iteration order is first-insertion order.
//! The map carries an equality function over values: `set` with a value
//! equal to the stored one is a no-op, and per-key projections
//! ([`get_value`](ReactiveMap::get_value)) use the same function so a
//! map-wide change that does not touch the observed key never notifies its
//! observer.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::signal::eq::{self, Equality};
use crate::signal::registry::{ListenerRegistry, Remover};
use crate::signal::{DerivedCore, Value};

/// A structured change to a [`ReactiveMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapChange<K, V> {
    /// `key` was absent and now maps to `value`.
    Added { key: K, value: V },
    /// `key` already existed; `previous` was replaced by `value`.
    Updated { key: K, value: V, previous: V },
    /// `key` was removed; it mapped to `previous`.
    Removed { key: K, previous: V },
}

/// A mutable keyed container that notifies on every entry change.
///
/// Cloning shares the same map.
pub struct ReactiveMap<K, V> {
    inner: Rc<MapInner<K, V>>,
}

impl<K, V> Clone for ReactiveMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct MapInner<K, V> {
    entries: RefCell<IndexMap<K, V>>,
    equals: Equality<V>,
    changes: ListenerRegistry<MapChange<K, V>>,
}

impl<K, V> ReactiveMap<K, V>
where
    K: Clone + Hash + Eq + 'static,
    V: Clone + PartialEq + 'static,
{
    /// Create an empty map with structural value equality.
    pub fn new() -> Self {
        Self::with_eq(eq::structural())
    }
}

impl<K, V> ReactiveMap<K, V>
where
    K: Clone + Hash + Eq + 'static,
    V: Clone + 'static,
{
    /// Create an empty map with an explicit value equality function.
    pub fn with_eq(equals: Equality<V>) -> Self {
        Self {
            inner: Rc::new(MapInner {
                entries: RefCell::new(IndexMap::new()),
                equals,
                changes: ListenerRegistry::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// Clone of the value under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// Entries in insertion order.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert or replace the value under `key`.
    ///
    /// Replacing with a value equal (per the map's equality function) to
    /// the stored one is a no-op. A fresh key keeps insertion order; a
    /// replaced key keeps its original position.
    pub fn set(&self, key: K, value: V) {
        let previous = {
            let mut entries = self.inner.entries.borrow_mut();
            let unchanged =
                matches!(entries.get(&key), Some(current) if (*self.inner.equals)(&value, current));
            if unchanged {
                return;
            }
            entries.insert(key.clone(), value.clone())
        };
        let change = match previous {
            Some(previous) => MapChange::Updated {
                key,
                value,
                previous,
            },
            None => MapChange::Added { key, value },
        };
        self.inner.changes.emit(&change);
    }

    /// Remove the entry under `key`, preserving the order of the rest.
    pub fn remove(&self, key: &K) -> Option<V> {
        let previous = self.inner.entries.borrow_mut().shift_remove(key)?;
        self.inner.changes.emit(&MapChange::Removed {
            key: key.clone(),
            previous: previous.clone(),
        });
        Some(previous)
    }

    /// Remove every entry, one `Removed` event per entry, in insertion
    /// order.
    pub fn clear(&self) {
        loop {
            let first = self
                .inner
                .entries
                .borrow()
                .keys()
                .next()
                .cloned();
            match first {
                Some(key) => {
                    self.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Subscribe to structured change events.
    pub fn on_change(&self, callback: impl Fn(&MapChange<K, V>) + 'static) -> Remover {
        self.inner.changes.add(callback)
    }

    /// Project the whole snapshot into a derived value.
    pub fn map<U>(&self, projection: impl Fn(&IndexMap<K, V>) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.map_eq(projection, eq::structural())
    }

    /// [`map`](Self::map) with an explicit equality for elision.
    pub fn map_eq<U: Clone + 'static>(
        &self,
        projection: impl Fn(&IndexMap<K, V>) -> U + 'static,
        equals: Equality<U>,
    ) -> Value<U> {
        let compute_inner = self.inner.clone();
        let connect_inner = self.inner.clone();
        DerivedCore::build(
            move || {
                let entries = compute_inner.entries.borrow();
                projection(&entries)
            },
            move |ping| {
                let ping = ping.clone();
                vec![connect_inner.changes.add(move |_| (*ping)())]
            },
            equals,
        )
    }

    /// The whole map as an opaque snapshot value; fires on any structured
    /// change.
    pub fn as_value(&self) -> Value<Vec<(K, V)>> {
        self.map_eq(
            |entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            },
            eq::never(),
        )
    }

    /// The value under `key` as a derived value, elided with the map's own
    /// equality function lifted over `Option`.
    pub fn get_value(&self, key: K) -> Value<Option<V>> {
        let equals = self.inner.equals.clone();
        let option_equals: Equality<Option<V>> =
            Rc::new(move |a: &Option<V>, b: &Option<V>| match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => (*equals)(a, b),
                _ => false,
            });
        self.map_eq(move |entries| entries.get(&key).cloned(), option_equals)
    }

    /// Presence of `key` as a derived bool; fires only when presence flips.
    pub fn has_value(&self, key: K) -> Value<bool> {
        self.map_eq(
            move |entries| entries.contains_key(&key),
            eq::structural(),
        )
    }

    /// The size as a derived value; fires only when the size changes.
    pub fn size_value(&self) -> Value<usize> {
        self.map_eq(|entries| entries.len(), eq::structural())
    }
}

impl<K, V> Default for ReactiveMap<K, V>
where
    K: Clone + Hash + Eq + 'static,
    V: Clone + PartialEq + 'static,
{
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
    fn test_set_add_then_update() {
        let map = ReactiveMap::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            map.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        map.set("a", 1);
        map.set("a", 2);
        assert_eq!(
            *log.borrow(),
            vec![
                MapChange::Added { key: "a", value: 1 },
                MapChange::Updated {
                    key: "a",
                    value: 2,
                    previous: 1
                },
            ]
        );
    }

    #[test]
    fn test_set_equal_value_is_noop() {
        let map = ReactiveMap::new();
        map.set("a", 1);
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            map.on_change(move |_| *count.borrow_mut() += 1);
        }
        map.set("a", 1);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_remove_carries_previous() {
        let map = ReactiveMap::new();
        map.set("a", 1);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            map.on_change(move |change| log.borrow_mut().push(change.clone()));
        }
        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.remove(&"a"), None);
        assert_eq!(
            *log.borrow(),
            vec![MapChange::Removed {
                key: "a",
                previous: 1
            }]
        );
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let map = ReactiveMap::new();
        map.set("b", 1);
        map.set("a", 2);
        map.set("c", 3);
        map.remove(&"a");
        map.set("a", 4); // re-insertion goes to the end
        assert_eq!(map.keys(), vec!["b", "c", "a"]);
        // Replacing in place keeps the original position.
        map.set("c", 9);
        assert_eq!(map.keys(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_clear_emits_in_insertion_order() {
        let map = ReactiveMap::new();
        map.set("x", 1);
        map.set("y", 2);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            map.on_change(move |change| {
                if let MapChange::Removed { key, .. } = change {
                    log.borrow_mut().push(*key);
                }
            });
        }
        map.clear();
        assert!(map.is_empty());
        assert_eq!(*log.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn test_get_value_ignores_other_keys() {
        let map = ReactiveMap::new();
        let a = map.get_value("a");
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            a.on_value(move |v| log.borrow_mut().push(v.clone()));
        }
        map.set("b", 1); // untouched key: elided
        map.set("a", 2);
        map.set("b", 3); // untouched key: elided
        map.remove(&"a");
        assert_eq!(*log.borrow(), vec![None, Some(2), None]);
    }

    #[test]
    fn test_has_value_and_size_value() {
        let map = ReactiveMap::new();
        let has_a = map.has_value("a");
        let size = map.size_value();
        map.set("a", 1);
        map.set("b", 2);
        assert!(has_a.current());
        assert_eq!(size.current(), 2);
        map.remove(&"a");
        assert!(!has_a.current());
    }

    #[test]
    fn test_custom_value_equality() {
        // Compare values modulo 10.
        let map: ReactiveMap<&str, i32> =
            ReactiveMap::with_eq(Rc::new(|a: &i32, b: &i32| a % 10 == b % 10));
        map.set("a", 1);
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            map.on_change(move |_| *count.borrow_mut() += 1);
        }
        map.set("a", 11); // equal mod 10: elided
        assert_eq!(*count.borrow(), 0);
        map.set("a", 2);
        assert_eq!(*count.borrow(), 1);
    }
}
