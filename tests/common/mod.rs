//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use vastrow::channel::{ExecutionMode, InlineChannel};
use vastrow::loader::SourceHandle;
use vastrow::source::{FileTableOptions, FileTableSource, Windowed};
use vastrow::Row;

/// Header plus nine rows; row `i` is `"i,<letter i>"`
pub const NINE_ROWS: &str = "id,name\n0,a\n1,b\n2,c\n3,d\n4,e\n5,f\n6,g\n7,h\n8,i\n";

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// `id,value` table with `rows` data rows
pub fn numbered_csv(rows: usize) -> String {
    let mut text = String::from("id,value\n");
    for i in 0..rows {
        text.push_str(&format!("{},value-{}\n", i, i * 7));
    }
    text
}

/// Write `text` to a fresh temporary file
pub fn temp_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(text.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

pub fn options(window_rows: u64, execution: ExecutionMode) -> FileTableOptions {
    FileTableOptions {
        window_rows,
        execution,
        prefetch_debounce: Duration::from_millis(25),
        ..Default::default()
    }
}

pub fn inline_options(window_rows: u64) -> FileTableOptions {
    options(window_rows, ExecutionMode::Inline)
}

/// Indexed in-memory source
pub fn ready_source(text: &str, options: FileTableOptions) -> FileTableSource {
    let mut source = FileTableSource::from_bytes(text.as_bytes().to_vec(), options);
    assert!(source.wait_ready(TIMEOUT).expect("indexing failed"));
    source
}

/// Indexed in-memory source on an inline channel doing one chunk read per
/// pump, so loads progress in observable steps
pub fn stepped_source(text: &str, options: FileTableOptions, chunk_size: usize) -> FileTableSource {
    let channel = Box::new(InlineChannel::with_steps(chunk_size, 1));
    let mut source = FileTableSource::with_channel(
        SourceHandle::from_bytes(text.as_bytes().to_vec()),
        options,
        channel,
    );
    assert!(source.wait_ready(TIMEOUT).expect("indexing failed"));
    source
}

/// Every row through the blocking path
pub fn all_rows(source: &mut FileTableSource, total: u64) -> Vec<Row> {
    (0..total)
        .map(|i| {
            source
                .row_blocking(i, TIMEOUT)
                .unwrap_or_else(|| panic!("row {} did not load", i))
        })
        .collect()
}

/// Expected cells for row `i` of [`numbered_csv`]
pub fn numbered_row(i: u64) -> Row {
    vec![i.to_string(), i.to_string(), format!("value-{}", i * 7)]
}

/// Resident window keys, least recently used first
pub fn resident(source: &FileTableSource) -> Vec<u64> {
    source.cache().keys_by_recency().collect()
}
