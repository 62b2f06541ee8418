//! # kindling
//!
//! Reactive retained-mode UI toolkit for Rust.
//!
//! Two subsystems carry everything else:
//!
//! - a push-based **signal core** ([`signal`], [`collections`]): event
//!   streams, observable values with equality-elided updates, lazily
//!   activated derived values, and collections with fine-grained change
//!   events
//! - an **incremental invalidate/validate/paint engine** ([`element`],
//!   [`root`]): a retained element tree where layout recomputes only where
//!   invalidated and repaint covers only the accumulated dirty rectangle
//!
//! Widgets obtain values from a model and observe them; a change
//! invalidates (layout) and/or dirties (paint) the owning element. Once per
//! frame the [`Root`] validates the tree and renders the dirty region into
//! its [`Surface`].
//!
//! ```no_run
//! use kindling::{fill, host::TerminalSurface, FrameClock, Mutable, Rgba, Root};
//! use std::time::Duration;
//!
//! # fn main() -> std::io::Result<()> {
//! let color = Mutable::new(Rgba::from_rgb_int(0x282a36));
//! let mut surface = TerminalSurface::new()?;
//! surface.enter_fullscreen()?;
//!
//! let mut root = Root::new(surface);
//! root.element().add_child(fill(color.as_value()));
//!
//! // Per frame: validate + render only what changed.
//! root.update(FrameClock::new(0, Duration::ZERO, Duration::ZERO));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`signal`] - signal hierarchy: `Emitter`, `Value`, `Mutable`, `Subject`
//! - [`collections`] - `ReactiveList` / `ReactiveSet` / `ReactiveMap`
//! - [`element`] - element tree, behaviors, groups, styles, config factory
//! - [`root`] - per-frame driver and input routing
//! - [`render`] - `Canvas`/`Surface` paint boundary, `RecordingSurface`
//! - [`host`] - crossterm terminal host with differential present
//! - [`input`] - pointer/keyboard event vocabulary
//! - [`types`] - geometry and color primitives

pub mod collections;
pub mod element;
pub mod host;
pub mod input;
pub mod render;
pub mod root;
pub mod signal;
pub mod types;

// Re-export the everyday surface.
pub use collections::{ListChange, MapChange, ReactiveList, ReactiveMap, ReactiveSet, SetChange};
pub use element::{
    fill, label, Behavior, Config, ConstructorRegistry, Element, ElementKind, Group, Interaction,
    Orientation, Style, StyleSheet,
};
pub use input::{InputEvent, KeyEvent, Modifiers, MouseButton, MouseEvent};
pub use render::{Canvas, RecordingSurface, Surface};
pub use root::{FrameClock, Root};
pub use signal::{
    join2, join3, join_all, Disposer, Emitter, Equality, Mutable, Remover, Subject, Value,
};
pub use types::{Point, Rect, Rgba, Size};
