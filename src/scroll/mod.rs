//! Bounded scrollbar over an unbounded row space
//!
//! ```text
//! scroll px [0, dom_max] ──first_row()──▶ (row: u128, offset_within: f64)
//!                        ◀─dom_content_for_row()──
//! ```

mod mapper;
mod viewport;
mod wide;

pub use mapper::{
    first_row, FirstRow, ScrollGeometry, ScrollScale, VisibleRange, SAFE_CONTENT_PX,
};
pub use viewport::TableViewport;
pub use wide::{group_digits, mul_div_rem, saturating_u64, RowId};
