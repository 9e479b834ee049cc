//! Row-space mapping
//!
//! Hosts cap scroll coordinates far below what a 2^122-row table would need,
//! so the scrollbar works in a bounded pixel range `[0, dom_max]` and every
//! pixel is mapped proportionally onto `[0, total - visible]` rows.
//!
//! Row identity is computed only by [`first_row`] in exact integer
//! arithmetic. The scale factor `k` is reported for display and never used to
//! derive a row.

use super::wide::{mul_div_rem, saturating_u64, RowId};

/// Default cap for the scrollable content height, in pixels
pub const SAFE_CONTENT_PX: u64 = 16_000_000;

/// Pixel geometry of the table viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    /// Full viewport height including header and footer
    pub viewport_height: f64,
    pub row_height: f64,
    pub header_height: f64,
    /// Bottom status row; 0 when disabled
    pub footer_height: f64,
    /// Cap for the scrollable content height
    pub safe_content_px: u64,
}

impl Default for ScrollGeometry {
    fn default() -> Self {
        Self {
            viewport_height: 600.0,
            row_height: 24.0,
            header_height: 24.0,
            footer_height: 0.0,
            safe_content_px: SAFE_CONTENT_PX,
        }
    }
}

impl ScrollGeometry {
    /// Height available to data rows
    pub fn body_height(&self) -> f64 {
        (self.viewport_height - self.header_height - self.footer_height).max(0.0)
    }

    /// Whole rows that fit the body
    pub fn visible_rows(&self) -> u64 {
        if self.row_height <= 0.0 {
            return 0;
        }
        (self.body_height() / self.row_height).floor() as u64
    }
}

/// First visible row and how far (in pixels) it is scrolled out of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstRow {
    pub row: RowId,
    /// Sub-row offset in `[0, row_height)`; cosmetic only
    pub offset_within: f64,
}

/// Map a bounded scroll offset to a row.
///
/// `dom_content` is clamped to `[0, max(1, dom_max)]`. With
/// `scrollable = total_rows - visible_rows`, the row is
/// `dom_content * scrollable / dom_max`, exactly.
pub fn first_row(
    dom_content: u64,
    dom_max: u64,
    total_rows: RowId,
    visible_rows: u64,
    row_height: f64,
) -> FirstRow {
    let dom_max = dom_max.max(1);
    let dom_content = dom_content.min(dom_max);
    let scrollable = total_rows.saturating_sub(visible_rows as RowId);
    if scrollable == 0 {
        return FirstRow {
            row: 0,
            offset_within: 0.0,
        };
    }

    let (row, remainder) = mul_div_rem(dom_content, scrollable, dom_max);
    FirstRow {
        row,
        offset_within: remainder as f64 / dom_max as f64 * row_height,
    }
}

/// Rows to draw for one scroll offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    pub first: RowId,
    /// Pixels the first row is scrolled above the body top
    pub offset_within: f64,
    /// Rows to draw, overscan included, never past the end
    pub count: u64,
}

impl VisibleRange {
    /// One past the last drawn row
    pub fn end(&self) -> RowId {
        self.first + self.count as RowId
    }

    pub fn contains(&self, row: RowId) -> bool {
        row >= self.first && row < self.end()
    }
}

/// Scroll extents for one geometry and row total
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollScale {
    geometry: ScrollGeometry,
    total_rows: RowId,
    dom_max: u64,
    virtual_max: f64,
    k: f64,
}

impl ScrollScale {
    pub fn new(geometry: ScrollGeometry, total_rows: RowId) -> Self {
        let safe_content = (geometry.safe_content_px as f64
            - geometry.header_height
            - geometry.footer_height)
            .max(0.0);
        let dom_max = (safe_content - geometry.viewport_height).max(0.0).floor() as u64;
        let virtual_max =
            (total_rows as f64 * geometry.row_height - geometry.body_height()).max(0.0);
        let k = if dom_max > 0 {
            virtual_max / dom_max as f64
        } else {
            0.0
        };

        Self {
            geometry,
            total_rows,
            dom_max,
            virtual_max,
            k,
        }
    }

    pub fn geometry(&self) -> &ScrollGeometry {
        &self.geometry
    }

    pub fn total_rows(&self) -> RowId {
        self.total_rows
    }

    /// Largest valid scroll offset
    pub fn dom_max(&self) -> u64 {
        self.dom_max
    }

    /// Height the content would have without the cap (approximate)
    pub fn virtual_max(&self) -> f64 {
        self.virtual_max
    }

    /// Virtual pixels per scroll pixel (informational)
    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn visible_rows(&self) -> u64 {
        self.geometry.visible_rows()
    }

    /// Rows that can scroll past the top of the viewport
    pub fn scrollable_rows(&self) -> RowId {
        self.total_rows.saturating_sub(self.visible_rows() as RowId)
    }

    /// First visible row for a (possibly fractional) scroll offset
    pub fn first_row(&self, dom_content: f64) -> FirstRow {
        first_row(
            clamp_px(dom_content),
            self.dom_max,
            self.total_rows,
            self.visible_rows(),
            self.geometry.row_height,
        )
    }

    /// First row plus how many rows it takes to fill the body, with
    /// `overscan` extra rows below
    pub fn visible_range(&self, dom_content: f64, overscan: u64) -> VisibleRange {
        let first = self.first_row(dom_content);
        let remaining = self.total_rows.saturating_sub(first.row);
        let fit = if self.geometry.row_height > 0.0 {
            ((self.geometry.body_height() + first.offset_within) / self.geometry.row_height).ceil()
                as u64
        } else {
            0
        };
        let wanted = fit.saturating_add(overscan);
        VisibleRange {
            first: first.row,
            offset_within: first.offset_within,
            count: saturating_u64(remaining.min(wanted as RowId)),
        }
    }

    /// Row under a pointer at `y_in_body` pixels below the header
    pub fn row_at(&self, dom_content: f64, y_in_body: f64) -> Option<RowId> {
        if y_in_body.is_nan() || y_in_body < 0.0 || self.geometry.row_height <= 0.0 {
            return None;
        }
        let first = self.first_row(dom_content);
        let in_view = ((y_in_body + first.offset_within) / self.geometry.row_height).floor() as u64;
        let row = first.row.checked_add(in_view as RowId)?;
        (row < self.total_rows).then_some(row)
    }

    /// Smallest scroll offset whose first row is at least `row`.
    ///
    /// Rows beyond the scrollable range map to `dom_max`.
    pub fn dom_content_for_row(&self, row: RowId) -> u64 {
        if row == 0 || self.scrollable_rows() == 0 {
            return 0;
        }
        if row >= self.scrollable_rows() {
            return self.dom_max.max(1);
        }

        // first_row is monotone in dom_content
        let (mut lo, mut hi) = (0u64, self.dom_max.max(1));
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.first_row(mid as f64).row >= row {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    /// Scroll position as a fraction in `[0, 1]`
    pub fn scroll_fraction(&self, dom_content: f64) -> f64 {
        let dom_max = self.dom_max.max(1) as f64;
        (clamp_px(dom_content) as f64 / dom_max).clamp(0.0, 1.0)
    }
}

fn clamp_px(px: f64) -> u64 {
    // NaN and negatives land on 0; `as` saturates on the high side
    px.max(0.0).floor() as u64
}
