//! Input events - pointer and keyboard types delivered by the host.
//!
//! These are plain data carried from the hosting environment into the tree
//! dispatch in [`Root`](crate::root::Root). The routing policy (hit testing,
//! pointer capture, key bubbling) lives there; this module only defines the
//! event vocabulary.

use crate::types::Point;

// =============================================================================
// Modifiers
// =============================================================================

bitflags::bitflags! {
    /// Modifier key state as a bitfield.
    ///
    /// Combine with bitwise OR: `Modifiers::CTRL | Modifiers::SHIFT`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const NONE = 0;
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

// =============================================================================
// Mouse
// =============================================================================

/// Pointer action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    Scroll,
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
}

impl Default for MouseButton {
    fn default() -> Self {
        Self::None
    }
}

/// Scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Scroll payload (only on `MouseAction::Scroll`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollInfo {
    pub direction: ScrollDirection,
    pub delta: i32,
}

/// A pointer event in surface coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    /// Action type (down, up, move, scroll).
    pub action: MouseAction,
    /// Button pressed/released (`None` for plain moves and scrolls).
    pub button: MouseButton,
    /// Position in the coordinate space of the element receiving the event.
    pub position: Point,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Scroll payload, for scroll events only.
    pub scroll: Option<ScrollInfo>,
}

impl MouseEvent {
    /// Create a new pointer event.
    pub fn new(action: MouseAction, button: MouseButton, position: Point) -> Self {
        Self {
            action,
            button,
            position,
            modifiers: Modifiers::NONE,
            scroll: None,
        }
    }

    /// Create a button-press event.
    pub fn down(button: MouseButton, position: Point) -> Self {
        Self::new(MouseAction::Down, button, position)
    }

    /// Create a button-release event.
    pub fn up(button: MouseButton, position: Point) -> Self {
        Self::new(MouseAction::Up, button, position)
    }

    /// Create a plain move event.
    pub fn move_to(position: Point) -> Self {
        Self::new(MouseAction::Move, MouseButton::None, position)
    }

    /// Create a scroll event.
    pub fn scroll(position: Point, direction: ScrollDirection, delta: i32) -> Self {
        Self {
            action: MouseAction::Scroll,
            button: MouseButton::None,
            position,
            modifiers: Modifiers::NONE,
            scroll: Some(ScrollInfo { direction, delta }),
        }
    }

    /// The same event re-expressed in a coordinate space shifted by
    /// `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut event = self.clone();
        event.position = event.position.offset(dx, dy);
        event
    }
}

// =============================================================================
// Keyboard
// =============================================================================

/// Key event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    Repeat,
    Release,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::Press
    }
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// The key name (e.g. "a", "Enter", "ArrowUp").
    pub key: String,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Press/repeat/release phase.
    pub state: KeyState,
}

impl KeyEvent {
    /// Create a simple key press event.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
            state: KeyState::Press,
        }
    }

    /// Create a key press with modifiers.
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
        }
    }
}

/// Unified event type delivered by a host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer event.
    Mouse(MouseEvent),
    /// Keyboard event.
    Key(KeyEvent),
    /// The surface was resized.
    Resize(i32, i32),
}

// =============================================================================
// Tests
// =============================================================================
