//! Data sources
//!
//! Every source implements [`DataSource`]. Optional behaviour is exposed
//! through capability accessors instead of probing:
//!
//! | Source             | big index | [`Windowed`] | [`Observable`] |
//! |--------------------|-----------|--------------|----------------|
//! | [`TextSource`]     |           |              |                |
//! | [`UuidSpaceSource`]| yes       |              |                |
//! | [`SyntheticSource`]| yes       |              |                |
//! | [`FileTableSource`]|           | yes          | yes            |

mod column;
mod file_table;
mod procedural;
mod sample;
mod status;
mod text;

use std::time::Duration;

pub use column::{
    columns_from_header, Align, Column, ColumnTheme, DATA_MIN_WIDTH, IDENTITY_MIN_WIDTH,
};
pub use file_table::{FileTableOptions, FileTableSource};
pub use procedural::{
    index_for_uuid, synthetic_value, uuid_for_index, SyntheticSource, UuidSpaceSource,
    UUID_SPACE_ROWS,
};
pub use sample::{SampleRows, SampleStride};
pub use status::{Status, StatusState, WindowEvent, WindowEventReason};
pub use text::TextSource;

use crate::events::Subscription;
use crate::loader::placeholder_row;
use crate::scroll::{group_digits, RowId};

/// Column-aligned cell values; column 0 holds the row number
pub type Row = Vec<String>;

/// Which family a source belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Entire text resident in memory
    StaticText,
    /// Rows computed from their index
    Procedural,
    /// Rows streamed from a byte source in windows
    FileTable,
}

pub trait DataSource: Send {
    fn kind(&self) -> SourceKind;

    /// Row total narrowed to `u64`, saturating
    fn row_count(&self) -> u64;

    /// Exact row total
    fn row_count_big(&self) -> RowId {
        RowId::from(self.row_count())
    }

    fn columns(&self) -> &[Column];

    /// Cells for `index`. Never blocks: windowed sources return a
    /// placeholder for rows that are not resident and schedule a load.
    fn row(&mut self, index: u64) -> Row;

    /// Cells for an index beyond `u64`
    fn row_big(&mut self, index: RowId) -> Row {
        match u64::try_from(index) {
            Ok(index) => self.row(index),
            Err(_) => placeholder_row(index, self.columns().len()),
        }
    }

    /// A finite, strided sample of rows for width estimation
    fn sample_rows(&mut self, max: usize) -> SampleRows<'_>;

    fn windowed(&mut self) -> Option<&mut dyn Windowed> {
        None
    }

    fn observable(&self) -> Option<&dyn Observable> {
        None
    }
}

/// On-demand window loading
pub trait Windowed {
    /// Whether `index` can be served from memory
    fn is_row_ready(&self, index: u64) -> bool;

    /// Pump the source until `index` is resident or `timeout` passes.
    ///
    /// `None` when the row does not exist, the source failed, or time ran out.
    fn row_blocking(&mut self, index: u64, timeout: Duration) -> Option<Row>;

    /// Declare the rows `[start, end)` the consumer wants resident. Loads are
    /// dispatched from [`Windowed::poll`] after the debounce delay.
    fn prefetch(&mut self, start: u64, end: u64);

    /// Apply finished background work and dispatch due loads. Returns
    /// whether anything observable changed.
    fn poll(&mut self) -> bool;
}

/// Status and window event streams
pub trait Observable {
    fn status(&self) -> Status;

    fn on_status(&self, listener: Box<dyn Fn(&Status) + Send + Sync>) -> Subscription;

    fn on_window(&self, listener: Box<dyn Fn(&WindowEvent) + Send + Sync>) -> Subscription;
}

/// Row total for display, e.g. `1,024 rows`
pub fn describe_rows(source: &dyn DataSource) -> String {
    let total = source.row_count_big();
    let noun = if total == 1 { "row" } else { "rows" };
    format!("{} {}", group_digits(total), noun)
}
