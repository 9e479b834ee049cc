//! Delimited text handling
//!
//! - `Delimiter`: field separator (single character or string)
//! - `split_line`: quote-aware cell tokenizer for one line
//! - `CsvText`: fully resident text with a line offset table
//!
//! Lines are always isolated by newline before tokenizing. A quoted field
//! containing a literal newline therefore spans two rows; row identity is
//! tied to line offsets, not to RFC 4180 records.

mod delimiter;
mod text;
mod tokenizer;

pub use delimiter::{detect_delimiter, Delimiter};
pub use text::{index_line_offsets, normalize_newlines, parse_header, CsvText};
pub use tokenizer::{align_row, split_line, trim_line_ending};
