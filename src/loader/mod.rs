//! Indexing and window loading for byte-backed sources
//!
//! The pieces here are synchronous and single-owner. The execution channel
//! drives the reads; `FileTableSource` owns the cache and interest set.

mod bytes;
mod cache;
mod index;
mod interest;
mod window;

pub use bytes::{Encoding, SourceHandle, DEFAULT_CHUNK_SIZE};
pub use cache::{CachedWindow, WindowCache};
pub use index::{LineIndex, LineIndexer};
pub use interest::{window_key, InterestSet};
pub use window::{parse_window, placeholder_row};
