//! Observable values - stateful signals with a current snapshot.
//!
//! [`Value<T>`] is a cloneable handle over some backing core: a constant, a
//! [`Mutable`](super::Mutable) cell, a [`Subject`](super::Subject), a
//! reactive collection projection, or a derived combination of other values.
//!
//! Subscription semantics:
//!
//! - `on_emit` fires only on future changes
//! - `on_value` fires once immediately with the current snapshot, then on
//!   future changes (`on_value = f(&current); on_emit(f)`)
//!
//! Derived values (`map`, `join2`/`join3`/`join_all`, `switch_map`) are
//! lazily activated: the upstream subscription exists only while the derived
//! value itself has listeners. While observed they recompute eagerly inside
//! the upstream's dispatch, so propagation order is always upstream before
//! downstream; their own equality function decides whether their listeners
//! fire, so change elision composes across derivation. While unobserved,
//! `current()` recomputes on demand from the upstream snapshots.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::eq::{self, Equality};
use super::registry::{Callback, ListenerRegistry, Remover};

// =============================================================================
// Core seam
// =============================================================================

/// Backing store behind a [`Value`] handle.
pub(crate) trait ValueCore<T> {
    /// The current snapshot.
    fn current(&self) -> T;

    /// Register for future changes only.
    fn subscribe(&self, callback: Callback<T>) -> Remover;
}

// =============================================================================
// Value handle
// =============================================================================

/// A signal that retains a current snapshot.
///
/// Cloning a `Value` clones the handle; both observe the same backing core.
pub struct Value<T> {
    core: Rc<dyn ValueCore<T>>,
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + 'static> Value<T> {
    pub(crate) fn from_core(core: Rc<dyn ValueCore<T>>) -> Self {
        Self { core }
    }

    /// A value that never changes and holds no listener storage.
    ///
    /// Subscribing is legal; beyond the immediate `on_value` callback no
    /// notification ever fires.
    pub fn constant(value: T) -> Self {
        Self::from_core(Rc::new(ConstantCore { value }))
    }

    /// The current snapshot.
    pub fn current(&self) -> T {
        self.core.current()
    }

    /// Subscribe to future changes only.
    pub fn on_emit(&self, callback: impl Fn(&T) + 'static) -> Remover {
        self.core.subscribe(Rc::new(callback))
    }

    /// Invoke `callback` with the current snapshot now, then subscribe it to
    /// future changes.
    pub fn on_value(&self, callback: impl Fn(&T) + 'static) -> Remover {
        callback(&self.current());
        self.on_emit(callback)
    }

    /// Derive a new value through a pure projection, elided structurally.
    pub fn map<U>(&self, projection: impl Fn(&T) -> U + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.map_eq(projection, eq::structural())
    }

    /// Derive a new value through a pure projection with an explicit
    /// equality for elision.
    pub fn map_eq<U: Clone + 'static>(
        &self,
        projection: impl Fn(&T) -> U + 'static,
        equals: Equality<U>,
    ) -> Value<U> {
        let compute_src = self.clone();
        let connect_src = self.clone();
        DerivedCore::build(
            move || projection(&compute_src.current()),
            move |ping| {
                let ping = ping.clone();
                vec![connect_src.on_emit(move |_| (*ping)())]
            },
            equals,
        )
    }

    /// Follow a value-of-values: whenever this value changes, `selector`
    /// picks a new inner value to track; the previous inner subscription is
    /// released before the new one is attached.
    pub fn switch_map<U>(&self, selector: impl Fn(&T) -> Value<U> + 'static) -> Value<U>
    where
        U: Clone + PartialEq + 'static,
    {
        self.switch_map_eq(selector, eq::structural())
    }

    /// `switch_map` with an explicit equality for elision.
    pub fn switch_map_eq<U: Clone + 'static>(
        &self,
        selector: impl Fn(&T) -> Value<U> + 'static,
        equals: Equality<U>,
    ) -> Value<U> {
        let selector = Rc::new(selector);
        let compute_outer = self.clone();
        let compute_selector = selector.clone();
        let connect_outer = self.clone();
        DerivedCore::build(
            move || (*compute_selector)(&compute_outer.current()).current(),
            move |ping| {
                let inner_sub: Rc<RefCell<Option<Remover>>> = Rc::new(RefCell::new(None));
                let resubscribe = {
                    let selector = selector.clone();
                    let outer = connect_outer.clone();
                    let ping = ping.clone();
                    let inner_sub = inner_sub.clone();
                    Rc::new(move || {
                        // Release the previous inner upstream first.
                        if let Some(previous) = inner_sub.borrow_mut().take() {
                            previous.dispose();
                        }
                        let inner = (*selector)(&outer.current());
                        let ping = ping.clone();
                        *inner_sub.borrow_mut() = Some(inner.on_emit(move |_| (*ping)()));
                    })
                };
                (*resubscribe)();

                let resub = resubscribe.clone();
                let ping_outer = ping.clone();
                let outer_remover = connect_outer.on_emit(move |_| {
                    (*resub)();
                    (*ping_outer)();
                });
                let release_inner = Remover::new(move || {
                    if let Some(previous) = inner_sub.borrow_mut().take() {
                        previous.dispose();
                    }
                });
                vec![outer_remover, release_inner]
            },
            equals,
        )
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Combine two values through a pure function.
pub fn join2<A, B, U>(a: &Value<A>, b: &Value<B>, combine: impl Fn(&A, &B) -> U + 'static) -> Value<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    join2_eq(a, b, combine, eq::structural())
}

/// `join2` with an explicit equality for elision.
pub fn join2_eq<A, B, U>(
    a: &Value<A>,
    b: &Value<B>,
    combine: impl Fn(&A, &B) -> U + 'static,
    equals: Equality<U>,
) -> Value<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
{
    let (ca, cb) = (a.clone(), b.clone());
    let (sa, sb) = (a.clone(), b.clone());
    DerivedCore::build(
        move || combine(&ca.current(), &cb.current()),
        move |ping| {
            let p1 = ping.clone();
            let p2 = ping.clone();
            vec![
                sa.on_emit(move |_| (*p1)()),
                sb.on_emit(move |_| (*p2)()),
            ]
        },
        equals,
    )
}

/// Combine three values through a pure function.
pub fn join3<A, B, C, U>(
    a: &Value<A>,
    b: &Value<B>,
    c: &Value<C>,
    combine: impl Fn(&A, &B, &C) -> U + 'static,
) -> Value<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    join3_eq(a, b, c, combine, eq::structural())
}

/// `join3` with an explicit equality for elision.
pub fn join3_eq<A, B, C, U>(
    a: &Value<A>,
    b: &Value<B>,
    c: &Value<C>,
    combine: impl Fn(&A, &B, &C) -> U + 'static,
    equals: Equality<U>,
) -> Value<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    U: Clone + 'static,
{
    let (ca, cb, cc) = (a.clone(), b.clone(), c.clone());
    let (sa, sb, sc) = (a.clone(), b.clone(), c.clone());
    DerivedCore::build(
        move || combine(&ca.current(), &cb.current(), &cc.current()),
        move |ping| {
            let p1 = ping.clone();
            let p2 = ping.clone();
            let p3 = ping.clone();
            vec![
                sa.on_emit(move |_| (*p1)()),
                sb.on_emit(move |_| (*p2)()),
                sc.on_emit(move |_| (*p3)()),
            ]
        },
        equals,
    )
}

/// Combine any number of homogeneous values through a pure function.
pub fn join_all<T, U>(values: &[Value<T>], combine: impl Fn(&[T]) -> U + 'static) -> Value<U>
where
    T: Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    join_all_eq(values, combine, eq::structural())
}

/// `join_all` with an explicit equality for elision.
pub fn join_all_eq<T, U>(
    values: &[Value<T>],
    combine: impl Fn(&[T]) -> U + 'static,
    equals: Equality<U>,
) -> Value<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    let compute_srcs: Vec<Value<T>> = values.to_vec();
    let connect_srcs: Vec<Value<T>> = values.to_vec();
    DerivedCore::build(
        move || {
            let snapshot: Vec<T> = compute_srcs.iter().map(Value::current).collect();
            combine(&snapshot)
        },
        move |ping| {
            connect_srcs
                .iter()
                .map(|value| {
                    let ping = ping.clone();
                    value.on_emit(move |_| (*ping)())
                })
                .collect()
        },
        equals,
    )
}

// =============================================================================
// Constant core
// =============================================================================

struct ConstantCore<T> {
    value: T,
}

impl<T: Clone> ValueCore<T> for ConstantCore<T> {
    fn current(&self) -> T {
        self.value.clone()
    }

    fn subscribe(&self, _callback: Callback<T>) -> Remover {
        Remover::noop()
    }
}

// =============================================================================
// Derived core
// =============================================================================

/// Shared machinery behind every derived value.
///
/// `compute` reads the upstream snapshots; `connect` attaches the upstream
/// subscriptions and is handed a `ping` that recomputes and (on change)
/// notifies. The connection exists only while this core has listeners.
pub(crate) struct DerivedCore<U> {
    listeners: ListenerRegistry<U>,
    // Some while active; the cache is kept fresh by upstream pings.
    cached: RefCell<Option<U>>,
    equals: Equality<U>,
    compute: Box<dyn Fn() -> U>,
    connect: Box<dyn Fn(&Rc<dyn Fn()>) -> Vec<Remover>>,
    connection: RefCell<Vec<Remover>>,
    weak_self: RefCell<Weak<DerivedCore<U>>>,
}

impl<U: Clone + 'static> DerivedCore<U> {
    pub(crate) fn build(
        compute: impl Fn() -> U + 'static,
        connect: impl Fn(&Rc<dyn Fn()>) -> Vec<Remover> + 'static,
        equals: Equality<U>,
    ) -> Value<U> {
        let core = Rc::new(DerivedCore {
            listeners: ListenerRegistry::new(),
            cached: RefCell::new(None),
            equals,
            compute: Box::new(compute),
            connect: Box::new(connect),
            connection: RefCell::new(Vec::new()),
            weak_self: RefCell::new(Weak::new()),
        });
        *core.weak_self.borrow_mut() = Rc::downgrade(&core);
        Value::from_core(core)
    }

    fn activate(&self) {
        let weak = self.weak_self.borrow().clone();
        let ping: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(core) = weak.upgrade() {
                core.refresh();
            }
        });
        let removers = (self.connect)(&ping);
        *self.connection.borrow_mut() = removers;
        *self.cached.borrow_mut() = Some((self.compute)());
    }

    fn deactivate(&self) {
        for remover in self.connection.borrow_mut().drain(..) {
            remover.dispose();
        }
        *self.cached.borrow_mut() = None;
    }

    fn refresh(&self) {
        let next = (self.compute)();
        let changed = {
            let mut cached = self.cached.borrow_mut();
            match cached.as_ref() {
                Some(previous) if (*self.equals)(&next, previous) => false,
                _ => {
                    *cached = Some(next.clone());
                    true
                }
            }
        };
        if changed {
            self.listeners.emit(&next);
        }
    }
}

impl<U: Clone + 'static> ValueCore<U> for DerivedCore<U> {
    fn current(&self) -> U {
        if let Some(value) = self.cached.borrow().as_ref() {
            return value.clone();
        }
        (self.compute)()
    }

    fn subscribe(&self, callback: Callback<U>) -> Remover {
        if self.listeners.is_empty() {
            self.activate();
        }
        let inner = self.listeners.add_rc(callback);
        let weak = self.weak_self.borrow().clone();
        Remover::new(move || {
            inner.dispose();
            if let Some(core) = weak.upgrade() {
                if core.listeners.is_empty() {
                    core.deactivate();
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
    use super::super::Mutable;
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_constant_on_value_fires_once() {
        let value = Value::constant(42);
        let log = Rc::new(RefCell::new(Vec::new()));
        let remover = {
            let log = log.clone();
            value.on_value(move |v| log.borrow_mut().push(*v))
        };
        assert_eq!(*log.borrow(), vec![42]);
        remover.dispose();
        assert_eq!(value.current(), 42);
    }

    #[test]
    fn test_on_value_immediate_and_synchronous() {
        let cell = Mutable::new(1);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            cell.on_value(move |v| log.borrow_mut().push(*v));
        }
        // Fired before on_value returned.
        assert_eq!(*log.borrow(), vec![1]);
        cell.update(2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_map_recomputes_and_elides() {
        let cell = Mutable::new(1);
        let doubled = cell.as_value().map(|v| v * 2);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            doubled.on_value(move |v| log.borrow_mut().push(*v));
        }
        cell.update(2);
        cell.update(2); // elided upstream
        cell.update(3);
        assert_eq!(*log.borrow(), vec![2, 4, 6]);
    }

    #[test]
    fn test_map_elision_composes() {
        // Projection collapses distinct upstream values; downstream
        // listeners only hear real projection changes.
        let cell = Mutable::new(1);
        let parity = cell.as_value().map(|v| v % 2);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            parity.on_value(move |v| log.borrow_mut().push(*v));
        }
        cell.update(3);
        cell.update(5);
        cell.update(6);
        assert_eq!(*log.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_map_is_lazy_until_subscribed() {
        let cell = Mutable::new(1);
        let calls = Rc::new(Cell::new(0));
        let mapped = {
            let calls = calls.clone();
            cell.as_value().map(move |v| {
                calls.set(calls.get() + 1);
                v * 10
            })
        };
        // Unobserved reads recompute on demand; no upstream subscription.
        assert_eq!(mapped.current(), 10);
        assert_eq!(mapped.current(), 10);
        assert_eq!(calls.get(), 2);
        cell.update(2); // nobody listening, nothing recomputes
        assert_eq!(calls.get(), 2);

        let remover = mapped.on_emit(|_| {});
        let after_subscribe = calls.get();
        cell.update(3);
        assert!(calls.get() > after_subscribe);
        assert_eq!(mapped.current(), 30);

        remover.dispose();
        let after_dispose = calls.get();
        cell.update(4); // disconnected again
        assert_eq!(calls.get(), after_dispose);
        assert_eq!(mapped.current(), 40);
    }

    #[test]
    fn test_propagation_upstream_before_downstream() {
        let cell = Mutable::new(1);
        let doubled = cell.as_value().map(|v| v * 2);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            // Subscribing to the derived first puts its recompute ahead of
            // the direct listener in the upstream's registry.
            let log = log.clone();
            doubled.on_emit(move |v| log.borrow_mut().push(("derived", *v)));
        }
        {
            let log = log.clone();
            cell.on_emit(move |v| log.borrow_mut().push(("direct", *v)));
        }
        cell.update(2);
        assert_eq!(*log.borrow(), vec![("derived", 4), ("direct", 2)]);
    }

    #[test]
    fn test_join2_combines_both_upstreams() {
        let a = Mutable::new(1);
        let b = Mutable::new(10);
        let sum = join2(&a.as_value(), &b.as_value(), |a, b| a + b);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            sum.on_value(move |v| log.borrow_mut().push(*v));
        }
        a.update(2);
        b.update(20);
        assert_eq!(*log.borrow(), vec![11, 12, 22]);
        assert_eq!(sum.current(), 22);
    }

    #[test]
    fn test_join2_elides_on_combined_equality() {
        // The combination collapses distinct inputs; only real changes of
        // the combined value reach listeners.
        let a = Mutable::new(1);
        let b = Mutable::new(1);
        let same_parity = join2(&a.as_value(), &b.as_value(), |a, b| (a + b) % 2 == 0);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            same_parity.on_value(move |v| log.borrow_mut().push(*v));
        }
        a.update(3); // parity of the sum unchanged: elided
        b.update(5); // unchanged: elided
        a.update(2); // sum now odd
        assert_eq!(*log.borrow(), vec![true, false]);
    }

    #[test]
    fn test_join3() {
        let a = Mutable::new(1);
        let b = Mutable::new(2);
        let c = Mutable::new(3);
        let total = join3(&a.as_value(), &b.as_value(), &c.as_value(), |a, b, c| {
            a + b + c
        });
        assert_eq!(total.current(), 6);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            total.on_emit(move |v| log.borrow_mut().push(*v));
        }
        c.update(4);
        assert_eq!(*log.borrow(), vec![7]);
    }

    #[test]
    fn test_join_all() {
        let cells: Vec<Mutable<i32>> = (0..4).map(Mutable::new).collect();
        let values: Vec<Value<i32>> = cells.iter().map(Mutable::as_value).collect();
        let total = join_all(&values, |vs| vs.iter().sum::<i32>());
        assert_eq!(total.current(), 6);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            total.on_value(move |v| log.borrow_mut().push(*v));
        }
        cells[2].update(10);
        assert_eq!(*log.borrow(), vec![6, 14]);
    }

    #[test]
    fn test_switch_map_tracks_inner_changes() {
        let first = Mutable::new(1);
        let second = Mutable::new(100);
        let which = Mutable::new(false);
        let (fv, sv) = (first.as_value(), second.as_value());
        let selected = which
            .as_value()
            .switch_map(move |use_second| if *use_second { sv.clone() } else { fv.clone() });

        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            selected.on_value(move |v| log.borrow_mut().push(*v));
        }
        assert_eq!(*log.borrow(), vec![1]);

        first.update(2);
        which.update(true);
        // After the switch, changes to the first cell no longer arrive.
        first.update(3);
        second.update(200);
        assert_eq!(*log.borrow(), vec![1, 2, 100, 200]);
    }

    #[test]
    fn test_switch_map_releases_previous_inner_subscription() {
        let first = Mutable::new(1);
        let second = Mutable::new(100);
        let which = Mutable::new(false);
        let (fv, sv) = (first.as_value(), second.as_value());
        let selected = which
            .as_value()
            .switch_map(move |use_second| if *use_second { sv.clone() } else { fv.clone() });

        let remover = selected.on_emit(|_| {});
        assert_eq!(first.listener_count(), 1);
        which.update(true);
        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 1);

        remover.dispose();
        assert_eq!(second.listener_count(), 0);
        assert_eq!(which.listener_count(), 0);
    }

    #[test]
    fn test_current_while_unobserved() {
        let cell = Mutable::new(5);
        let mapped = cell.as_value().map(|v| v + 1);
        cell.update(7);
        assert_eq!(mapped.current(), 8);
    }
}
