//! Scroll helpers for the presentation layer.

use wip_core::defaults::SCROLL_BOTTOM_THRESHOLD_PX;

/// Keeps the viewport on the same entry while older entries are prepended.
///
/// Capture before the insertion renders, restore with the new content
/// height afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    scroll_top: f64,
    scroll_height: f64,
}

impl ScrollAnchor {
    pub fn capture(scroll_top: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
        }
    }

    /// Scroll offset that shows the same content after the height changed.
    pub fn restore(&self, new_scroll_height: f64) -> f64 {
        let delta = new_scroll_height - self.scroll_height;
        (self.scroll_top + delta).max(0.0)
    }
}

/// Whether the viewport is within the threshold of the bottom. The
/// scroll-to-bottom button shows when this is false.
pub fn is_near_bottom(scroll_top: f64, scroll_height: f64, client_height: f64) -> bool {
    scroll_height - scroll_top - client_height < SCROLL_BOTTOM_THRESHOLD_PX
}
