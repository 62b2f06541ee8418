//! Element tree - retained nodes driving incremental layout and repaint.
//!
//! An [`Element`] owns bounds, a visibility value, a cached preferred size,
//! a validity flag, and an accumulated dirty rectangle. Widgets customize it
//! through the [`Behavior`] seam; everything else is the invalidation state
//! machine:
//!
//! - `invalidate()` marks layout stale and walks up, stopping at the first
//!   already-invalid ancestor (that ancestor's eventual validate covers this
//!   subtree too)
//! - `dirty(region)` accumulates a repaint rectangle as a running union and
//!   walks up only while the union actually grows
//! - `validate()` re-arranges invalid nodes top-down and marks them valid
//! - `render(region)` repaints only elements intersecting the region, then
//!   clears the accumulated dirt
//!
//! Validity and dirt are independent axes: a color change repaints without
//! relayout, a size change does both.
//!
//! Ownership: a parent exclusively owns the children under it; the child's
//! back-reference is weak. Elements die only by explicit [`Element::dispose`],
//! which runs the element's [`Disposer`], cascades to children, and detaches
//! from the parent.

pub mod config;
pub mod group;
pub mod style;
pub mod widgets;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::input::{KeyEvent, MouseEvent};
use crate::render::Canvas;
use crate::signal::{Disposer, Mutable, Value};
use crate::types::{Point, Rect, Size};

pub use config::{Config, ConstructorRegistry, ElementKind};
pub use group::{Group, Orientation};
pub use style::{Style, StyleSheet};
pub use widgets::{fill, label};

// =============================================================================
// Behavior seam
// =============================================================================

/// Widget-specific hooks invoked by the element state machine.
///
/// Every method has a no-op default; a bare `Element` is an empty,
/// zero-sized, input-transparent node.
pub trait Behavior: 'static {
    /// Compute the preferred size within an advisory hint.
    ///
    /// The hint is "how big would you like to be within at most this much
    /// space"; the final size assigned via `set_bounds` may differ and the
    /// element must accept it.
    fn measure(&mut self, element: &Element, hint: Size) -> Size {
        let _ = (element, hint);
        Size::ZERO
    }

    /// Assign bounds to children. Runs during `validate`, before the
    /// children themselves validate.
    fn arrange(&mut self, element: &Element) {
        let _ = element;
    }

    /// Paint this element's own content.
    ///
    /// `origin` is the element's absolute position on the surface; `region`
    /// is the repaint area in local coordinates.
    fn paint(&mut self, element: &Element, canvas: &mut dyn Canvas, origin: Point, region: Rect) {
        let _ = (element, canvas, origin, region);
    }

    /// Begin a pointer interaction for a press that hit this element.
    ///
    /// Returning a handle captures the button: the root routes every
    /// subsequent event for it to the handle until release or cancel.
    fn mouse_down(&mut self, element: &Element, event: &MouseEvent) -> Option<Box<dyn Interaction>> {
        let _ = (element, event);
        None
    }

    /// Handle a scroll event that hit this element. Return true to consume
    /// it and stop the hit-test walk.
    fn mouse_scroll(&mut self, element: &Element, event: &MouseEvent) -> bool {
        let _ = (element, event);
        false
    }

    /// Handle a key event. Return true to consume it and stop bubbling.
    fn key_down(&mut self, element: &Element, event: &KeyEvent) -> bool {
        let _ = (element, event);
        false
    }
}

/// A unit behavior for plain containers and test elements.
pub struct EmptyBehavior;

impl Behavior for EmptyBehavior {}

/// An in-flight pointer interaction (press -> move* -> release | cancel).
///
/// While one exists for a button, no other element sees that button's
/// events.
pub trait Interaction {
    /// The pointer moved while captured. Coordinates are surface-absolute.
    fn moved(&mut self, event: &MouseEvent) {
        let _ = event;
    }

    /// The captured button was released; the interaction is over.
    fn released(&mut self, event: &MouseEvent) {
        let _ = event;
    }

    /// The interaction was cancelled (capture torn down without a release).
    fn cancelled(&mut self) {}
}

// =============================================================================
// Element
// =============================================================================

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ElementFlags: u8 {
        /// Layout is up to date.
        const VALID = 1 << 0;
        /// `dispose()` ran; the element is inert.
        const DISPOSED = 1 << 1;
    }
}

struct ElementState {
    flags: ElementFlags,
    /// Position and size in the parent's coordinate space.
    bounds: Rect,
    /// Memoized preferred size; `Size::INVALID` when stale.
    preferred: Size,
    /// Accumulated repaint area in local coordinates.
    dirty: Rect,
    parent: Weak<ElementInner>,
    children: Vec<Element>,
}

struct ElementInner {
    state: RefCell<ElementState>,
    behavior: RefCell<Box<dyn Behavior>>,
    visible: Mutable<bool>,
    disposer: Disposer,
    styles: RefCell<Option<Rc<StyleSheet>>>,
}

/// A node in the retained element tree.
///
/// Cloning is cheap and refers to the same node.
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Clone for Element {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Element {
    /// Create a detached element with the given behavior.
    ///
    /// New elements start invalid (they have never been laid out) with an
    /// empty dirty region.
    pub fn new(behavior: impl Behavior) -> Self {
        let element = Self {
            inner: Rc::new(ElementInner {
                state: RefCell::new(ElementState {
                    flags: ElementFlags::empty(),
                    bounds: Rect::EMPTY,
                    preferred: Size::INVALID,
                    dirty: Rect::EMPTY,
                    parent: Weak::new(),
                    children: Vec::new(),
                }),
                behavior: RefCell::new(Box::new(behavior)),
                visible: Mutable::new(true),
                disposer: Disposer::new(),
                styles: RefCell::new(None),
            }),
        };

        // Visibility flips repaint the element's area; layout is untouched
        // (containers that collapse hidden children observe it themselves).
        let weak = Rc::downgrade(&element.inner);
        element.inner.disposer.add(element.inner.visible.on_emit(move |_| {
            if let Some(inner) = weak.upgrade() {
                Element { inner }.dirty_all();
            }
        }));

        element
    }

    /// Create a plain container element.
    pub fn empty() -> Self {
        Self::new(EmptyBehavior)
    }

    fn from_inner(inner: Rc<ElementInner>) -> Self {
        Self { inner }
    }

    /// Check whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Bounds in the parent's coordinate space.
    pub fn bounds(&self) -> Rect {
        self.inner.state.borrow().bounds
    }

    /// The visibility cell. Invisible elements skip painting and hit
    /// testing but keep their layout slot.
    pub fn visible(&self) -> Mutable<bool> {
        self.inner.visible.clone()
    }

    /// The element's cleanup bag; removers parked here run on `dispose`.
    pub fn disposer(&self) -> Disposer {
        self.inner.disposer.clone()
    }

    /// The parent node, if attached.
    pub fn parent(&self) -> Option<Element> {
        self.inner.state.borrow().parent.upgrade().map(Element::from_inner)
    }

    /// Child handles in paint order (last child paints on top).
    pub fn children(&self) -> Vec<Element> {
        self.inner.state.borrow().children.clone()
    }

    /// Layout validity. False means a validate pass will re-arrange.
    pub fn is_valid(&self) -> bool {
        self.inner.state.borrow().flags.contains(ElementFlags::VALID)
    }

    /// Whether `dispose()` already ran.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().flags.contains(ElementFlags::DISPOSED)
    }

    /// The accumulated repaint area, in local coordinates.
    pub fn dirty_region(&self) -> Rect {
        self.inner.state.borrow().dirty
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Append `child` as the topmost child.
    ///
    /// # Panics
    ///
    /// Panics if `child` is already attached elsewhere or disposed.
    pub fn add_child(&self, child: Element) {
        assert!(
            !child.is_disposed(),
            "add_child on a disposed element"
        );
        assert!(
            child.parent().is_none(),
            "add_child on an element that already has a parent"
        );
        {
            let mut child_state = child.inner.state.borrow_mut();
            child_state.parent = Rc::downgrade(&self.inner);
        }
        self.inner.state.borrow_mut().children.push(child);
        self.invalidate();
    }

    /// Detach `child` without disposing it. Returns false if it was not a
    /// child of this element.
    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            let before = state.children.len();
            state.children.retain(|c| !c.ptr_eq(child));
            state.children.len() != before
        };
        if removed {
            child.inner.state.borrow_mut().parent = Weak::new();
            // Repaint the area the child vacated.
            self.dirty(child.bounds());
            self.invalidate();
        }
        removed
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Mark layout stale and discard the cached preferred size.
    ///
    /// Walks up the tree, stopping at the first already-invalid ancestor:
    /// its eventual validate covers this subtree too. Calling this on an
    /// already-invalid element does nothing.
    pub fn invalidate(&self) {
        let parent = {
            let mut state = self.inner.state.borrow_mut();
            if !state.flags.contains(ElementFlags::VALID) {
                return;
            }
            state.flags.remove(ElementFlags::VALID);
            state.preferred = Size::INVALID;
            state.parent.upgrade()
        };
        if let Some(parent) = parent {
            Element::from_inner(parent).invalidate();
        }
    }

    /// Accumulate a repaint rectangle (local coordinates).
    ///
    /// The region is unioned into the accumulated dirty rectangle. If the
    /// union equals what was already there (the region was fully contained)
    /// propagation stops; otherwise the region continues to the parent,
    /// translated into its space. The containment stop bounds propagation
    /// cost to O(depth) amortized across a frame's mutations.
    pub fn dirty(&self, region: Rect) {
        let propagate = {
            let mut state = self.inner.state.borrow_mut();
            let union = state.dirty.union(&region);
            if union == state.dirty {
                return;
            }
            state.dirty = union;
            let origin = state.bounds.origin();
            state
                .parent
                .upgrade()
                .map(|parent| (parent, region.translate(origin.x, origin.y)))
        };
        if let Some((parent, parent_region)) = propagate {
            Element::from_inner(parent).dirty(parent_region);
        }
    }

    /// Accumulate the element's whole extent for repaint.
    pub fn dirty_all(&self) {
        self.dirty(Rect::of_size(self.bounds().size()));
    }

    /// Recompute layout where needed. Returns whether any work was done.
    ///
    /// A valid element returns immediately: an invalid descendant always
    /// has an invalid ancestor chain, so validity here covers the subtree.
    pub fn validate(&self) -> bool {
        {
            let state = self.inner.state.borrow();
            if state.flags.contains(ElementFlags::VALID)
                || state.flags.contains(ElementFlags::DISPOSED)
            {
                return false;
            }
        }

        self.inner.behavior.borrow_mut().arrange(self);
        for child in self.children() {
            child.validate();
        }
        self.inner.state.borrow_mut().flags.insert(ElementFlags::VALID);
        true
    }

    /// The memoized preferred size.
    ///
    /// Recomputed only when the cache holds the stale sentinel (set by
    /// `invalidate`); the hint does not participate in the memoization, so
    /// two reads between invalidations measure once.
    pub fn preferred_size(&self, hint: Size) -> Size {
        {
            let state = self.inner.state.borrow();
            if !state.preferred.is_invalid() {
                return state.preferred;
            }
        }
        let measured = self.inner.behavior.borrow_mut().measure(self, hint);
        self.inner.state.borrow_mut().preferred = measured;
        measured
    }

    /// Assign bounds (parent coordinates).
    ///
    /// A no-op when unchanged. Otherwise the union of the old and new
    /// bounds is dirtied on the parent - covering both the vacated and the
    /// newly occupied area - and the element is invalidated.
    pub fn set_bounds(&self, bounds: Rect) {
        let (old, parent) = {
            let state = self.inner.state.borrow();
            (state.bounds, state.parent.upgrade())
        };
        if old == bounds {
            return;
        }
        self.inner.state.borrow_mut().bounds = bounds;
        match parent {
            Some(parent) => Element::from_inner(parent).dirty(old.union(&bounds)),
            // The root has no parent to repaint it; dirty its own extent.
            None => self.dirty(Rect::of_size(bounds.size())),
        }
        self.invalidate();
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Paint the element and its children where they intersect `region`.
    ///
    /// `origin` is the element's absolute position on the surface; `region`
    /// is in local coordinates. Elements outside the region are untouched
    /// (their dirt, if any, stays accumulated). Invisible elements paint
    /// nothing but still shed their accumulated dirt.
    pub fn render(&self, canvas: &mut dyn Canvas, origin: Point, region: Rect) {
        let extent = Rect::of_size(self.bounds().size());
        if !extent.intersects(&region) {
            return;
        }

        if !self.inner.visible.current() {
            // A hidden subtree must still shed its accumulated dirt: stale
            // dirt would swallow (via the containment early-exit) the very
            // dirty() call that later makes the subtree visible again.
            self.clear_dirty_deep();
            return;
        }

        self.inner
            .behavior
            .borrow_mut()
            .paint(self, canvas, origin, region);
        for child in self.children() {
            let child_bounds = child.bounds();
            child.render(
                canvas,
                origin.offset(child_bounds.x, child_bounds.y),
                region.translate(-child_bounds.x, -child_bounds.y),
            );
        }

        self.inner.state.borrow_mut().dirty = Rect::EMPTY;
    }

    fn clear_dirty_deep(&self) {
        self.inner.state.borrow_mut().dirty = Rect::EMPTY;
        for child in self.children() {
            child.clear_dirty_deep();
        }
    }

    // =========================================================================
    // Observation helpers
    // =========================================================================

    /// React to a layout-affecting value: any change invalidates and
    /// repaints this element. The subscription lives in the disposer.
    pub fn observe<T: Clone + 'static>(&self, value: &Value<T>) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.disposer.add(value.on_emit(move |_| {
            if let Some(inner) = weak.upgrade() {
                let element = Element::from_inner(inner);
                element.invalidate();
                element.dirty_all();
            }
        }));
    }

    /// React to a paint-only value (e.g. a color): any change repaints
    /// without relayout. The subscription lives in the disposer.
    pub fn observe_paint<T: Clone + 'static>(&self, value: &Value<T>) {
        let weak = Rc::downgrade(&self.inner);
        self.inner.disposer.add(value.on_emit(move |_| {
            if let Some(inner) = weak.upgrade() {
                Element::from_inner(inner).dirty_all();
            }
        }));
    }

    // =========================================================================
    // Styles
    // =========================================================================

    /// Install a style sheet on this element, making it a style scope for
    /// its subtree.
    pub fn set_styles(&self, sheet: StyleSheet) {
        *self.inner.styles.borrow_mut() = Some(Rc::new(sheet));
    }

    /// The nearest style sheet up the parent chain.
    ///
    /// # Panics
    ///
    /// Panics if no ancestor carries a style scope - the tree contract says
    /// lookups only happen on attached elements.
    pub fn styles(&self) -> Rc<StyleSheet> {
        let mut cursor = Some(self.clone());
        while let Some(element) = cursor {
            if let Some(sheet) = element.inner.styles.borrow().as_ref() {
                return sheet.clone();
            }
            cursor = element.parent();
        }
        panic!("style lookup on an element with no styled root ancestor");
    }

    // =========================================================================
    // Input plumbing (driven by the root)
    // =========================================================================

    /// Depth-first hit test for a press. `event` is in local coordinates;
    /// the topmost (last painted) child gets the first chance.
    pub(crate) fn dispatch_mouse_down(&self, event: &MouseEvent) -> Option<Box<dyn Interaction>> {
        if !self.inner.visible.current() {
            return None;
        }
        let extent = Rect::of_size(self.bounds().size());
        if !extent.contains(event.position) {
            return None;
        }
        for child in self.children().iter().rev() {
            let child_bounds = child.bounds();
            let local = event.translated(-child_bounds.x, -child_bounds.y);
            if let Some(interaction) = child.dispatch_mouse_down(&local) {
                return Some(interaction);
            }
        }
        self.inner.behavior.borrow_mut().mouse_down(self, event)
    }

    /// Depth-first hit test for a scroll, topmost child first; the first
    /// consumer wins. `event` is in local coordinates.
    pub(crate) fn dispatch_scroll(&self, event: &MouseEvent) -> bool {
        if !self.inner.visible.current() {
            return false;
        }
        let extent = Rect::of_size(self.bounds().size());
        if !extent.contains(event.position) {
            return false;
        }
        for child in self.children().iter().rev() {
            let child_bounds = child.bounds();
            let local = event.translated(-child_bounds.x, -child_bounds.y);
            if child.dispatch_scroll(&local) {
                return true;
            }
        }
        self.inner.behavior.borrow_mut().mouse_scroll(self, event)
    }

    /// Offer a key event to this element's behavior.
    pub(crate) fn handle_key(&self, event: &KeyEvent) -> bool {
        self.inner.behavior.borrow_mut().key_down(self, event)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Tear the element down: run the disposer, dispose all children, and
    /// detach from the parent. Idempotent.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.flags.contains(ElementFlags::DISPOSED) {
                return;
            }
            state.flags.insert(ElementFlags::DISPOSED);
        }

        self.inner.disposer.dispose_all();

        let children = std::mem::take(&mut self.inner.state.borrow_mut().children);
        for child in children {
            child.dispose();
        }

        if let Some(parent) = self.parent() {
            // No-op when the parent is itself disposing and already drained
            // its child list.
            parent.remove_child(self);
        }
        self.inner.state.borrow_mut().parent = Weak::new();
    }
}

// =============================================================================
// Tests
// =============================================================================
