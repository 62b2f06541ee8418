//! Root - top of the element tree and per-frame driver.
//!
//! The root owns the pixel surface, translates host input into tree
//! dispatch, and runs the validate + render cycle once per frame:
//!
//! 1. emit the frame clock to per-frame observers
//! 2. auto-size the tree to the surface (if configured)
//! 3. `validate()` - layout recomputes only where invalid
//! 4. if validation did work or dirt accumulated, `render` the dirty
//!    region and present it
//!
//! Pointer routing: a press hit-tests depth first (topmost child first);
//! if the hit element begins an [`Interaction`], that button is captured
//! and every subsequent event for it routes exclusively to the handle until
//! release or cancel. Key events bubble from the focused element toward the
//! root until consumed.

use std::collections::HashMap;
use std::time::Duration;

use crate::element::{Element, Group, Interaction};
use crate::input::{InputEvent, KeyEvent, MouseAction, MouseButton, MouseEvent};
use crate::render::Surface;
use crate::signal::{Emitter, Remover};
use crate::types::Rect;

// =============================================================================
// Frame clock
// =============================================================================

/// Timing information emitted once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameClock {
    /// Monotonic frame counter.
    pub tick: u64,
    /// Time since the driver started.
    pub elapsed: Duration,
    /// Time since the previous frame.
    pub delta: Duration,
}

impl FrameClock {
    /// Create a frame clock sample.
    pub fn new(tick: u64, elapsed: Duration, delta: Duration) -> Self {
        Self {
            tick,
            elapsed,
            delta,
        }
    }
}

// =============================================================================
// Root
// =============================================================================

/// Top of an element tree bound to a presentable surface.
pub struct Root<S: Surface> {
    element: Element,
    surface: S,
    frames: Emitter<FrameClock>,
    auto_size: bool,
    captures: HashMap<MouseButton, Box<dyn Interaction>>,
    focus: Option<Element>,
}

impl<S: Surface> Root<S> {
    /// Create a root with an overlapping container as its tree root.
    pub fn new(surface: S) -> Self {
        Self::with_element(surface, Element::new(Group::stack()))
    }

    /// Create a root around an existing tree.
    pub fn with_element(surface: S, element: Element) -> Self {
        Self {
            element,
            surface,
            frames: Emitter::new(),
            auto_size: true,
            captures: HashMap::new(),
            focus: None,
        }
    }

    /// The tree root element.
    pub fn element(&self) -> Element {
        self.element.clone()
    }

    /// The owned surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Whether the tree is resized to the surface every frame (default on).
    pub fn set_auto_size(&mut self, auto_size: bool) {
        self.auto_size = auto_size;
    }

    /// Subscribe to the per-frame clock.
    pub fn on_frame(&self, callback: impl Fn(&FrameClock) + 'static) -> Remover {
        self.frames.on_emit(callback)
    }

    /// The element receiving key events first.
    pub fn set_focus(&mut self, element: Option<Element>) {
        self.focus = element;
    }

    // =========================================================================
    // Frame driver
    // =========================================================================

    /// Run one frame. Returns whether anything changed (callers use this to
    /// decide whether to blit the presented surface).
    pub fn update(&mut self, clock: FrameClock) -> bool {
        // Observers run first so state they mutate settles in this frame.
        self.frames.emit(clock);

        if self.auto_size {
            let size = self.surface.size();
            if self.element.bounds().size() != size {
                self.element.set_bounds(Rect::of_size(size));
            }
        }

        let worked = self.element.validate();
        let dirty = self.element.dirty_region();
        if !worked && dirty.is_empty() {
            return false;
        }

        let origin = self.element.bounds().origin();
        self.element.render(self.surface.canvas(), origin, dirty);
        if let Err(error) = self.surface.present(dirty) {
            tracing::warn!(%error, "surface present failed");
        }
        true
    }

    // =========================================================================
    // Input dispatch
    // =========================================================================

    /// Route a host event to the tree.
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::Mouse(mouse) => self.dispatch_mouse(mouse),
            InputEvent::Key(key) => self.dispatch_key(key),
            // Size changes are picked up by the next update's auto-size.
            InputEvent::Resize(_, _) => {}
        }
    }

    /// Route a pointer event.
    ///
    /// # Panics
    ///
    /// Panics on a press for a button that is already captured - one
    /// pointer button cannot run two interactions at once.
    pub fn dispatch_mouse(&mut self, event: MouseEvent) {
        match event.action {
            MouseAction::Down => {
                assert!(
                    !self.captures.contains_key(&event.button),
                    "pointer button pressed while its interaction is still active"
                );
                let origin = self.element.bounds().origin();
                let local = event.translated(-origin.x, -origin.y);
                if let Some(interaction) = self.element.dispatch_mouse_down(&local) {
                    self.captures.insert(event.button, interaction);
                }
            }
            MouseAction::Up => {
                if let Some(mut interaction) = self.captures.remove(&event.button) {
                    interaction.released(&event);
                }
            }
            MouseAction::Move => {
                for interaction in self.captures.values_mut() {
                    interaction.moved(&event);
                }
            }
            MouseAction::Scroll => {
                let origin = self.element.bounds().origin();
                let local = event.translated(-origin.x, -origin.y);
                self.element.dispatch_scroll(&local);
            }
        }
    }

    /// Route a key event: the focused element first, then up the parent
    /// chain until consumed.
    pub fn dispatch_key(&mut self, event: KeyEvent) {
        let mut cursor = self.focus.clone().or_else(|| Some(self.element.clone()));
        while let Some(element) = cursor {
            if element.handle_key(&event) {
                return;
            }
            cursor = element.parent();
        }
    }

    /// Abort every in-flight interaction (e.g. on focus loss).
    pub fn cancel_interactions(&mut self) {
        for (_, mut interaction) in self.captures.drain() {
            interaction.cancelled();
        }
    }

    /// Whether a button is currently captured by an interaction.
    pub fn is_captured(&self, button: MouseButton) -> bool {
        self.captures.contains_key(&button)
    }
}

// =============================================================================
// Tests
// =============================================================================
