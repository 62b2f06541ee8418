//! Listener registry - the dispatch-safe callback list under every signal.
//!
//! Every signal type multicasts through one of these. The registry must stay
//! well-defined when listeners unsubscribe or subscribe *during* a dispatch:
//!
//! - listeners added during a dispatch pass are not visited in that pass
//! - a listener removed during a pass is skipped, even if the removal came
//!   from another listener's callback earlier in the same pass
//! - notification order equals subscription order
//!
//! Removal tombstones the slot in place; compaction is deferred until no
//! dispatch is active, so indices stay stable while a pass is iterating.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

// =============================================================================
// Remover
// =============================================================================

/// Cancel capability returned by every subscribe call.
///
/// Invoking it deregisters that one listener. Invoking it again is a no-op.
/// Dropping a `Remover` does NOT cancel the subscription; cleanup is always
/// explicit (or parked in a [`Disposer`]).
///
/// Clones share the same underlying cancel action.
#[derive(Clone)]
pub struct Remover {
    action: Rc<Cell<Option<Box<dyn FnOnce()>>>>,
}

impl Remover {
    /// Wrap a cancel action.
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Rc::new(Cell::new(Some(Box::new(action)))),
        }
    }

    /// A remover that does nothing (e.g. subscriptions on constants).
    pub fn noop() -> Self {
        Self {
            action: Rc::new(Cell::new(None)),
        }
    }

    /// Run the cancel action. Safe to call any number of times.
    pub fn dispose(&self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    /// Check whether the cancel action already ran (or never existed).
    pub fn is_disposed(&self) -> bool {
        // Peek without consuming
        let action = self.action.take();
        let disposed = action.is_none();
        self.action.set(action);
        disposed
    }
}

impl std::fmt::Debug for Remover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remover")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// Disposer
// =============================================================================

/// A bag of removers invoked together.
///
/// Elements park their subscriptions here so that `dispose()` tears down
/// every observation the element ever registered. Adding to an already
/// disposed bag cancels the subscription immediately.
#[derive(Clone, Default)]
pub struct Disposer {
    inner: Rc<DisposerInner>,
}

#[derive(Default)]
struct DisposerInner {
    removers: RefCell<Vec<Remover>>,
    disposed: Cell<bool>,
}

impl Disposer {
    /// Create an empty disposer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a remover for later disposal.
    pub fn add(&self, remover: Remover) {
        if self.inner.disposed.get() {
            remover.dispose();
        } else {
            self.inner.removers.borrow_mut().push(remover);
        }
    }

    /// Invoke every parked remover, in registration order.
    pub fn dispose_all(&self) {
        self.inner.disposed.set(true);
        let removers = std::mem::take(&mut *self.inner.removers.borrow_mut());
        for remover in removers {
            remover.dispose();
        }
    }

    /// Check whether `dispose_all` already ran.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

// =============================================================================
// Listener registry
// =============================================================================

pub(crate) type Callback<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    id: u64,
    // None = tombstone awaiting compaction
    callback: Option<Callback<T>>,
}

/// Append/remove/dispatch-safe list of callbacks.
///
/// Cloning shares the same listener list.
pub(crate) struct ListenerRegistry<T> {
    inner: Rc<RegistryInner<T>>,
}

impl<T> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct RegistryInner<T> {
    slots: RefCell<Vec<Slot<T>>>,
    next_id: Cell<u64>,
    dispatching: Cell<u32>,
    live: Cell<usize>,
}

impl<T: 'static> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                slots: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                dispatching: Cell::new(0),
                live: Cell::new(0),
            }),
        }
    }

    /// Number of registered (non-removed) listeners.
    pub fn len(&self) -> usize {
        self.inner.live.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a callback. Returns its remover.
    pub fn add(&self, callback: impl Fn(&T) + 'static) -> Remover {
        self.add_rc(Rc::new(callback))
    }

    /// Register an already shared callback. Returns its remover.
    pub fn add_rc(&self, callback: Callback<T>) -> Remover {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.slots.borrow_mut().push(Slot {
            id,
            callback: Some(callback),
        });
        self.inner.live.set(self.inner.live.get() + 1);

        let weak = Rc::downgrade(&self.inner);
        Remover::new(move || RegistryInner::remove(&weak, id))
    }

    /// Invoke every listener registered at the start of this pass.
    ///
    /// Reentrant dispatch (a listener triggering another emit on the same
    /// registry) is legal; each nested pass snapshots its own length.
    pub fn emit(&self, value: &T) {
        let inner = &self.inner;
        inner.dispatching.set(inner.dispatching.get() + 1);

        // Listeners pushed during this pass land past `end` and are skipped.
        let end = inner.slots.borrow().len();
        for index in 0..end {
            // Re-read the slot each step: an earlier listener may have
            // tombstoned this one.
            let callback = {
                let slots = inner.slots.borrow();
                slots[index].callback.clone()
            };
            if let Some(callback) = callback {
                (*callback)(value);
            }
        }

        inner.dispatching.set(inner.dispatching.get() - 1);
        if inner.dispatching.get() == 0 {
            inner.slots.borrow_mut().retain(|slot| slot.callback.is_some());
        }
    }
}

impl<T> RegistryInner<T> {
    fn remove(weak: &Weak<RegistryInner<T>>, id: u64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let mut slots = inner.slots.borrow_mut();
        if let Some(slot) = slots.iter_mut().find(|slot| slot.id == id) {
            if slot.callback.take().is_some() {
                inner.live.set(inner.live.get() - 1);
            }
        }
        if inner.dispatching.get() == 0 {
            slots.retain(|slot| slot.callback.is_some());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn log_registry() -> (ListenerRegistry<i32>, Rc<RefCell<Vec<(u8, i32)>>>) {
        (ListenerRegistry::new(), Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let (reg, log) = log_registry();
        for tag in 0..3u8 {
            let log = log.clone();
            reg.add(move |v| log.borrow_mut().push((tag, *v)));
        }
        reg.emit(&7);
        assert_eq!(*log.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_remover_idempotent() {
        let (reg, log) = log_registry();
        let remover = {
            let log = log.clone();
            reg.add(move |v| log.borrow_mut().push((0, *v)))
        };
        assert_eq!(reg.len(), 1);
        remover.dispose();
        remover.dispose();
        assert_eq!(reg.len(), 0);
        reg.emit(&1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_remove_does_not_affect_neighbors() {
        let (reg, log) = log_registry();
        let r0 = {
            let log = log.clone();
            reg.add(move |v| log.borrow_mut().push((0, *v)))
        };
        {
            let log = log.clone();
            reg.add(move |v| log.borrow_mut().push((1, *v)));
        }
        r0.dispose();
        reg.emit(&5);
        assert_eq!(*log.borrow(), vec![(1, 5)]);
    }

    #[test]
    fn test_add_during_dispatch_not_visited_in_same_pass() {
        let reg: ListenerRegistry<i32> = ListenerRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let reg2 = reg.clone();
            let log = log.clone();
            reg.add(move |v| {
                log.borrow_mut().push(("outer", *v));
                let log = log.clone();
                reg2.add(move |v| log.borrow_mut().push(("inner", *v)));
            });
        }
        reg.emit(&1);
        assert_eq!(*log.borrow(), vec![("outer", 1)]);
        // The listener added during the first pass sees the next one; the
        // one added during the second pass again does not.
        reg.emit(&2);
        assert_eq!(
            *log.borrow(),
            vec![("outer", 1), ("outer", 2), ("inner", 2)]
        );
    }

    #[test]
    fn test_remove_later_listener_mid_dispatch_skips_it() {
        let reg: ListenerRegistry<i32> = ListenerRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let later: Rc<RefCell<Option<Remover>>> = Rc::new(RefCell::new(None));
        {
            let log = log.clone();
            let later = later.clone();
            reg.add(move |v| {
                log.borrow_mut().push(("first", *v));
                if let Some(r) = later.borrow_mut().take() {
                    r.dispose();
                }
            });
        }
        let remover = {
            let log = log.clone();
            reg.add(move |v| log.borrow_mut().push(("second", *v)))
        };
        *later.borrow_mut() = Some(remover);

        // "second" is removed by "first" before being visited.
        reg.emit(&1);
        assert_eq!(*log.borrow(), vec![("first", 1)]);
    }

    #[test]
    fn test_listener_removing_itself_mid_dispatch() {
        let reg: ListenerRegistry<i32> = ListenerRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let own: Rc<RefCell<Option<Remover>>> = Rc::new(RefCell::new(None));
        let remover = {
            let log = log.clone();
            let own = own.clone();
            reg.add(move |v| {
                log.borrow_mut().push(*v);
                if let Some(r) = own.borrow_mut().take() {
                    r.dispose();
                }
            })
        };
        *own.borrow_mut() = Some(remover);

        reg.emit(&1);
        reg.emit(&2);
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_reentrant_emit() {
        let reg: ListenerRegistry<i32> = ListenerRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let reg2 = reg.clone();
            let log = log.clone();
            reg.add(move |v| {
                log.borrow_mut().push(*v);
                if *v < 3 {
                    reg2.emit(&(*v + 1));
                }
            });
        }
        reg.emit(&1);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_disposer_runs_everything_once() {
        let (reg, log) = log_registry();
        let disposer = Disposer::new();
        for tag in 0..2u8 {
            let log = log.clone();
            disposer.add(reg.add(move |v| log.borrow_mut().push((tag, *v))));
        }
        disposer.dispose_all();
        assert!(disposer.is_disposed());
        reg.emit(&9);
        assert!(log.borrow().is_empty());

        // Adding after disposal cancels immediately.
        let log2 = log.clone();
        disposer.add(reg.add(move |v| log2.borrow_mut().push((9, *v))));
        reg.emit(&9);
        assert!(log.borrow().is_empty());
    }
}
