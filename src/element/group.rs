//! Layout groups - containers that arrange children along an axis.
//!
//! Groups are plain consumers of the validation machinery: `measure` sums
//! child preferred sizes, `arrange` assigns child bounds through
//! `set_bounds` (which does its own change detection and dirt accounting).
//! Nothing here touches the invalidation bookkeeping directly.

use crate::types::{Rect, Size};

use super::{Behavior, Element};

/// Axis along which a [`Group`] stacks its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Children top to bottom, full container width.
    #[default]
    Column,
    /// Children left to right, full container height.
    Row,
    /// Children overlap, each filling the container.
    Stack,
}

/// Container behavior stacking children along an [`Orientation`].
pub struct Group {
    orientation: Orientation,
    gap: i32,
}

impl Group {
    /// A top-to-bottom container.
    pub fn column() -> Self {
        Self {
            orientation: Orientation::Column,
            gap: 0,
        }
    }

    /// A left-to-right container.
    pub fn row() -> Self {
        Self {
            orientation: Orientation::Row,
            gap: 0,
        }
    }

    /// An overlapping container.
    pub fn stack() -> Self {
        Self {
            orientation: Orientation::Stack,
            gap: 0,
        }
    }

    /// Space between adjacent children (ignored by `Stack`).
    pub fn with_gap(mut self, gap: i32) -> Self {
        self.gap = gap;
        self
    }
}

impl Behavior for Group {
    fn measure(&mut self, element: &Element, hint: Size) -> Size {
        let children = element.children();
        if children.is_empty() {
            return Size::ZERO;
        }

        let mut along = 0;
        let mut across = 0;
        for child in &children {
            let preferred = child.preferred_size(hint);
            match self.orientation {
                Orientation::Column => {
                    along += preferred.height;
                    across = across.max(preferred.width);
                }
                Orientation::Row => {
                    along += preferred.width;
                    across = across.max(preferred.height);
                }
                Orientation::Stack => {
                    along = along.max(preferred.height);
                    across = across.max(preferred.width);
                }
            }
        }
        if !matches!(self.orientation, Orientation::Stack) {
            along += self.gap * (children.len() as i32 - 1);
        }

        match self.orientation {
            Orientation::Column | Orientation::Stack => Size::new(across, along),
            Orientation::Row => Size::new(along, across),
        }
    }

    fn arrange(&mut self, element: &Element) {
        let size = element.bounds().size();
        let hint = size;
        let mut cursor = 0;
        for child in element.children() {
            let preferred = child.preferred_size(hint);
            let bounds = match self.orientation {
                Orientation::Column => {
                    let b = Rect::new(0, cursor, size.width, preferred.height);
                    cursor += preferred.height + self.gap;
                    b
                }
                Orientation::Row => {
                    let b = Rect::new(cursor, 0, preferred.width, size.height);
                    cursor += preferred.width + self.gap;
                    b
                }
                Orientation::Stack => Rect::of_size(size),
            };
            child.set_bounds(bounds);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
