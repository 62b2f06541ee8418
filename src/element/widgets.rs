//! Minimal widgets - reference consumers of the element machinery.
//!
//! Each widget is a constructor function returning a wired [`Element`]: the
//! behavior holds the values it paints from, and the element observes them
//! so changes flow into invalidate/dirty automatically. Layout-affecting
//! values (label text) use [`Element::observe`]; paint-only values (colors)
//! use [`Element::observe_paint`].

use unicode_width::UnicodeWidthStr;

use crate::render::Canvas;
use crate::signal::Value;
use crate::types::{Point, Rect, Rgba, Size};

use super::{Behavior, Element};

// =============================================================================
// Label
// =============================================================================

struct LabelBehavior {
    text: Value<String>,
    color: Value<Rgba>,
}

impl Behavior for LabelBehavior {
    fn measure(&mut self, _element: &Element, _hint: Size) -> Size {
        // One text row; width in display cells.
        let text = self.text.current();
        Size::new(UnicodeWidthStr::width(text.as_str()) as i32, 1)
    }

    fn paint(&mut self, _element: &Element, canvas: &mut dyn Canvas, origin: Point, _region: Rect) {
        canvas.draw_text(origin, &self.text.current(), self.color.current());
    }
}

/// A single line of reactive text.
///
/// Text changes relayout and repaint; color changes repaint only.
pub fn label(text: Value<String>, color: Value<Rgba>) -> Element {
    let element = Element::new(LabelBehavior {
        text: text.clone(),
        color: color.clone(),
    });
    element.observe(&text);
    element.observe_paint(&color);
    element
}

// =============================================================================
// Fill
// =============================================================================

struct FillBehavior {
    color: Value<Rgba>,
}

impl Behavior for FillBehavior {
    fn paint(&mut self, element: &Element, canvas: &mut dyn Canvas, origin: Point, region: Rect) {
        // Paint only the damaged part of the extent.
        let extent = Rect::of_size(element.bounds().size());
        let target = extent.intersect(&region);
        if !target.is_empty() {
            canvas.fill_rect(target.translate(origin.x, origin.y), self.color.current());
        }
    }
}

/// A solid panel filling its bounds with a reactive color.
pub fn fill(color: Value<Rgba>) -> Element {
    let element = Element::new(FillBehavior {
        color: color.clone(),
    });
    element.observe_paint(&color);
    element
}

// =============================================================================
// Tests
// =============================================================================
