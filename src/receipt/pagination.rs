//! Page-break decisions.
//!
//! Sections ask for the height of their header plus first body unit before
//! they start; every following row asks for its own height. A unit that is
//! taller than a whole page is placed anyway and reported as an overflow.

use crate::pdf::canvas::{Canvas, PageGeometry};

#[derive(Clone, Copy, Debug)]
pub struct Paginator {
    top: f32,
    bottom: f32,
}

impl Paginator {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self {
            top: geometry.margin_top,
            bottom: geometry.content_bottom(),
        }
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn fits(&self, required: f32, cursor: f32) -> bool {
        cursor + required <= self.bottom
    }

    /// Space left below `cursor` on the current page.
    pub fn remaining(&self, cursor: f32) -> f32 {
        (self.bottom - cursor).max(0.0)
    }

    /// Height available on a fresh page.
    pub fn capacity(&self) -> f32 {
        self.bottom - self.top
    }

    /// Start a new page when `required` does not fit below `cursor`.
    /// Returns the cursor to continue from. A cursor already at the top of
    /// a page is returned as is, since another page would not help.
    pub fn ensure_space(&self, canvas: &mut Canvas, required: f32, cursor: f32) -> f32 {
        if self.fits(required, cursor) || cursor <= self.top {
            return cursor;
        }
        log::debug!(
            "Page break: need {required:.1}mm at y={cursor:.1}, {:.1}mm left",
            self.remaining(cursor)
        );
        canvas.new_page()
    }
}
