//! Paint boundary - what the toolkit requires from a pixel surface.
//!
//! The element tree does not know how pixels get to the screen. It paints
//! through [`Canvas`] (a deliberately small command vocabulary) and the
//! [`Root`](crate::root::Root) presents through [`Surface`]. Hosts implement
//! both; [`RecordingSurface`] is the headless implementation used in tests
//! and render-trace captures.

use std::io;

use crate::types::{Point, Rect, Rgba, Size};

// =============================================================================
// Traits
// =============================================================================

/// Paint command sink handed to elements during render.
pub trait Canvas {
    /// Fill a rectangle with a solid color (alpha-blended over existing
    /// content).
    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Outline a rectangle, one unit thick, inside its bounds.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba);

    /// Draw a single line of text with its top-left corner at `origin`.
    fn draw_text(&mut self, origin: Point, text: &str, color: Rgba);
}

/// A presentable pixel target owned by the root.
pub trait Surface {
    /// Current size of the target, in surface units.
    fn size(&self) -> Size;

    /// The canvas to paint the next frame into.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Push the given region of painted content to the screen.
    fn present(&mut self, region: Rect) -> io::Result<()>;
}

// =============================================================================
// Recording surface
// =============================================================================

/// A recorded paint command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect { rect: Rect, color: Rgba },
    StrokeRect { rect: Rect, color: Rgba },
    Text {
        origin: Point,
        text: String,
        color: Rgba,
    },
}

/// Headless surface that records every draw call and presented region.
///
/// Useful for asserting what a render pass actually painted without a real
/// screen behind it.
pub struct RecordingSurface {
    size: Size,
    ops: Vec<DrawOp>,
    presented: Vec<Rect>,
}

impl RecordingSurface {
    /// Create a recording surface of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: Size::new(width, height),
            ops: Vec::new(),
            presented: Vec::new(),
        }
    }

    /// Change the reported size (as a host window resize would).
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.size = Size::new(width, height);
    }

    /// Every draw call since the last `clear`.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Every presented region since the last `clear`.
    pub fn presented(&self) -> &[Rect] {
        &self.presented
    }

    /// Drop all recorded calls.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.presented.clear();
    }
}

impl Canvas for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(DrawOp::StrokeRect { rect, color });
    }

    fn draw_text(&mut self, origin: Point, text: &str, color: Rgba) {
        self.ops.push(DrawOp::Text {
            origin,
            text: text.to_string(),
            color,
        });
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        self
    }

    fn present(&mut self, region: Rect) -> io::Result<()> {
        self.presented.push(region);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_records_in_order() {
        let mut surface = RecordingSurface::new(100, 50);
        surface.fill_rect(Rect::new(0, 0, 10, 10), Rgba::RED);
        surface.draw_text(Point::new(1, 2), "hi", Rgba::WHITE);
        surface.present(Rect::new(0, 0, 10, 10)).unwrap();

        assert_eq!(surface.size(), Size::new(100, 50));
        assert_eq!(surface.ops().len(), 2);
        assert_eq!(
            surface.ops()[1],
            DrawOp::Text {
                origin: Point::new(1, 2),
                text: "hi".to_string(),
                color: Rgba::WHITE,
            }
        );
        assert_eq!(surface.presented(), &[Rect::new(0, 0, 10, 10)]);

        surface.clear();
        assert!(surface.ops().is_empty());
        assert!(surface.presented().is_empty());
    }
}
