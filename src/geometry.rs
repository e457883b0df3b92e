//! Rectangle math for pre-edit and status areas.

use dpi::PhysicalSize;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::toolkit::Margins;

/// A platform rectangle: signed origin, unsigned extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Rect { x, y, width, height }
    }

    /// A band of the given height anchored to the bottom edge of `size`.
    pub(crate) fn bottom_band(size: PhysicalSize<u16>, height: u16) -> Self {
        Rect {
            x: 0,
            y: size.height.saturating_sub(height) as i16,
            width: size.width,
            height,
        }
    }
}

/// The widget rectangle shrunk by its text margins; this is where spot-style
/// pre-edit text may be drawn. Keeps one pixel of slack on each axis, the
/// way the toolkit has always computed it.
pub(crate) fn content_rect(size: PhysicalSize<u16>, margin: &Margins) -> Rect {
    Rect {
        x: margin.left as i16,
        y: margin.top as i16,
        width: size
            .width
            .saturating_sub((margin.left + margin.right).saturating_sub(1)),
        height: size
            .height
            .saturating_sub((margin.top + margin.bottom).saturating_sub(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rect_applies_margins_with_slack() {
        let margin = Margins { left: 4, right: 6, top: 2, bottom: 3 };
        let rect = content_rect(PhysicalSize::new(100, 50), &margin);
        assert_eq!(rect, Rect::new(4, 2, 91, 46));
    }

    #[test]
    fn content_rect_saturates_on_tiny_widgets() {
        let margin = Margins { left: 30, right: 30, top: 30, bottom: 30 };
        let rect = content_rect(PhysicalSize::new(10, 10), &margin);
        assert_eq!((rect.width, rect.height), (0, 0));
    }

    #[test]
    fn bottom_band_is_anchored_to_the_lower_edge() {
        let band = Rect::bottom_band(PhysicalSize::new(640, 480), 20);
        assert_eq!(band, Rect::new(0, 460, 640, 20));
    }
}
