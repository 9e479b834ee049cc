//! Viewport state over a [`ScrollScale`]
//!
//! Tracks the current scroll offset and answers which rows are on screen.

use super::mapper::{FirstRow, ScrollGeometry, ScrollScale, VisibleRange};
use super::wide::{saturating_u64, RowId};

/// Scroll state for one table
#[derive(Debug, Clone)]
pub struct TableViewport {
    scale: ScrollScale,
    /// Current scroll offset in `[0, dom_max]`
    dom_content: u64,
    /// Extra rows drawn below the last visible one
    pub overscan: u64,
}

impl TableViewport {
    pub fn new(geometry: ScrollGeometry, total_rows: RowId, overscan: u64) -> Self {
        Self {
            scale: ScrollScale::new(geometry, total_rows),
            dom_content: 0,
            overscan,
        }
    }

    pub fn scale(&self) -> &ScrollScale {
        &self.scale
    }

    pub fn dom_content(&self) -> u64 {
        self.dom_content
    }

    /// Replace the row total (e.g. once indexing finishes), keeping the
    /// scroll offset where it is
    pub fn set_total_rows(&mut self, total_rows: RowId) {
        self.scale = ScrollScale::new(*self.scale.geometry(), total_rows);
        self.dom_content = self.dom_content.min(self.scale.dom_max());
    }

    /// Replace the geometry (e.g. on resize)
    pub fn set_geometry(&mut self, geometry: ScrollGeometry) {
        self.scale = ScrollScale::new(geometry, self.scale.total_rows());
        self.dom_content = self.dom_content.min(self.scale.dom_max());
    }

    /// Scroll to an absolute offset, clamping to the valid range
    pub fn scroll_to(&mut self, px: f64) {
        self.dom_content = (px.max(0.0).floor() as u64).min(self.scale.dom_max());
    }

    /// Scroll by a delta amount
    pub fn scroll_by(&mut self, delta_px: f64) {
        self.scroll_to(self.dom_content as f64 + delta_px);
    }

    pub fn first_row(&self) -> FirstRow {
        self.scale.first_row(self.dom_content as f64)
    }

    /// Rows to draw right now
    pub fn visible_range(&self) -> VisibleRange {
        self.scale
            .visible_range(self.dom_content as f64, self.overscan)
    }

    /// Check if a row is visible
    pub fn is_row_visible(&self, row: RowId) -> bool {
        let first = self.first_row().row;
        row >= first && row < first + self.scale.visible_rows() as RowId
    }

    /// Scroll the minimum amount that puts `row` on screen
    pub fn ensure_visible(&mut self, row: RowId) {
        let first = self.first_row().row;
        let visible = (self.scale.visible_rows() as RowId).max(1);
        if row < first {
            self.dom_content = self.scale.dom_content_for_row(row);
        } else if row >= first + visible {
            self.dom_content = self.scale.dom_content_for_row(row + 1 - visible);
        }
    }

    /// Row range a windowed source should keep resident: the visible range
    /// widened by `margin` rows on both sides, narrowed to machine integers
    pub fn prefetch_range(&self, margin: u64) -> (u64, u64) {
        let range = self.visible_range();
        let start = saturating_u64(range.first).saturating_sub(margin);
        let end = saturating_u64(range.end()).saturating_add(margin);
        (start, end)
    }
}
