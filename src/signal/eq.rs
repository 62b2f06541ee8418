//! Equality functions for change elision.
//!
//! Every stateful signal carries an equality function: an update whose new
//! value is equal (per that function) to the stored one dispatches nothing.
//! The choice is deliberate per call site - structural comparison for value
//! types, pointer identity for shared reference payloads, `never` to force
//! every write through.

use std::rc::Rc;

/// Comparison used to decide whether a new value is a change.
///
/// Called as `eq(new, current)`; `true` means "no change, skip dispatch".
pub type Equality<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Structural equality via `PartialEq`. The default for plain values.
pub fn structural<T: PartialEq + 'static>() -> Equality<T> {
    Rc::new(|a: &T, b: &T| a == b)
}

/// Never equal: every update dispatches.
pub fn never<T: 'static>() -> Equality<T> {
    Rc::new(|_: &T, _: &T| false)
}

/// Pointer identity for `Rc` payloads: two handles to the same allocation
/// are equal regardless of contents.
pub fn rc_ptr<T: 'static>() -> Equality<Rc<T>> {
    Rc::new(|a: &Rc<T>, b: &Rc<T>| Rc::ptr_eq(a, b))
}
