//! Fully resident delimited text
//!
//! The whole text is kept in memory with a precomputed line offset table, so
//! any row can be sliced out and tokenized on demand.

use super::delimiter::Delimiter;
use super::tokenizer::{split_line, trim_line_ending};

/// Resident text plus its line offsets
#[derive(Debug, Clone, Default)]
pub struct CsvText {
    /// Normalized text (`\n` line endings only)
    pub text: String,
    /// Line start offsets; `offsets[0] = 0`, `offsets[1]` = first data row
    pub offsets: Vec<usize>,
    /// Header fields
    pub header: Vec<String>,
    /// Number of data rows (excludes header)
    pub rows: usize,
}

impl CsvText {
    /// Normalize, index and parse the header of `text`
    pub fn new(text: &str, delimiter: &Delimiter) -> Self {
        let text = normalize_newlines(text);
        let offsets = index_line_offsets(&text);
        let header = parse_header(&text, &offsets, delimiter);
        let rows = offsets.len().saturating_sub(2);
        Self {
            text,
            offsets,
            header,
            rows,
        }
    }

    /// Raw text of data row `row`, without its line ending
    pub fn line(&self, row: usize) -> Option<&str> {
        let start = *self.offsets.get(row + 1)?;
        let end = self
            .offsets
            .get(row + 2)
            .copied()
            .unwrap_or(self.text.len())
            .min(self.text.len());
        if start >= self.text.len() || start > end {
            return None;
        }
        Some(trim_line_ending(&self.text[start..end]))
    }
}

/// Replace `\r\n` and lone `\r` with `\n`
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Line start offsets, with a trailing end sentinel when the text does not
/// end in a newline
pub fn index_line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(text.len() / 32 + 2);
    offsets.push(0);
    offsets.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    if !text.is_empty() && !text.ends_with('\n') {
        offsets.push(text.len());
    }
    offsets
}

/// Tokenize the first line of `text`
pub fn parse_header(text: &str, offsets: &[usize], delimiter: &Delimiter) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let end = offsets.get(1).copied().unwrap_or(text.len()).min(text.len());
    split_line(trim_line_ending(&text[..end]), delimiter)
}
