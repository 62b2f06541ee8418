//! Reactive signal core - push-based observables.
//!
//! The signal hierarchy, smallest first:
//!
//! - [`registry`] - the dispatch-safe listener list every signal multicasts
//!   through, plus [`Remover`] (idempotent cancel token) and [`Disposer`]
//!   (scoped cleanup bag)
//! - [`Emitter`] - a discrete event stream with no retained value
//! - [`Value`] - a stateful observable with a current snapshot; derivation
//!   combinators ([`Value::map`], [`join2`], [`Value::switch_map`], ...)
//!   produce lazily-activated values that only subscribe upstream while
//!   they themselves are observed
//! - [`Mutable`] - the externally settable cell, with equality elision
//! - [`Subject`] - a value whose external producer is connected only while
//!   at least one subscriber exists
//!
//! All dispatch is synchronous and single-threaded: an update returns only
//! after every transitively affected listener has run, and notification
//! order within one registry equals subscription order.

pub mod emitter;
pub mod eq;
pub mod mutable;
pub mod registry;
pub mod subject;
pub mod value;

pub use emitter::Emitter;
pub use eq::Equality;
pub use mutable::Mutable;
pub use registry::{Disposer, Remover};
pub use subject::{Subject, SubjectSink};
pub use value::{join2, join2_eq, join3, join3_eq, join_all, join_all_eq, Value};

pub(crate) use value::DerivedCore;
