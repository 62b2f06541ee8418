//! Reactive collections - containers with fine-grained change events.
//!
//! Each collection is a mutable store that emits exactly one structured
//! change event per mutation, synchronously, in addition to being usable as
//! a coarse whole-snapshot value (`as_value`, `map`). Projected helpers
//! (`size_value`, `has_value`, `get_value`) ride the derived-value elision,
//! so a change that does not move the projection never notifies.
//!
//! - [`ReactiveList`] - ordered, index-addressed
//! - [`ReactiveSet`] - unique members, insertion-ordered
//! - [`ReactiveMap`] - keyed entries, insertion-ordered

pub mod list;
pub mod map;
pub mod set;

pub use list::{ListChange, ReactiveList};
pub use map::{MapChange, ReactiveMap};
pub use set::{ReactiveSet, SetChange};
