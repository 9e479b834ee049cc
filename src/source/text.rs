//! Fully resident delimited text

use super::{columns_from_header, Column, DataSource, Row, SampleRows, SourceKind};
use crate::csv::{align_row, split_line, CsvText, Delimiter};
use crate::loader::placeholder_row;

/// A source over text held entirely in memory
pub struct TextSource {
    csv: CsvText,
    delimiter: Delimiter,
    columns: Vec<Column>,
}

impl TextSource {
    pub fn new(text: &str, delimiter: Delimiter) -> Self {
        let csv = CsvText::new(text, &delimiter);
        let columns = columns_from_header(&csv.header, "csv_");
        Self {
            csv,
            delimiter,
            columns,
        }
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Line start offsets of the normalized text
    pub fn offsets(&self) -> &[usize] {
        &self.csv.offsets
    }

    /// Raw line of a data row
    pub fn line(&self, index: u64) -> Option<&str> {
        self.csv.line(usize::try_from(index).ok()?)
    }
}

impl DataSource for TextSource {
    fn kind(&self) -> SourceKind {
        SourceKind::StaticText
    }

    fn row_count(&self) -> u64 {
        self.csv.rows as u64
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn row(&mut self, index: u64) -> Row {
        match self.line(index) {
            Some(line) => align_row(
                index.to_string(),
                split_line(line, &self.delimiter),
                self.columns.len(),
            ),
            None => placeholder_row(index.into(), self.columns.len()),
        }
    }

    fn sample_rows(&mut self, max: usize) -> SampleRows<'_> {
        SampleRows::new(self, max)
    }
}
