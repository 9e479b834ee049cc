//! Decoded window text to column-aligned rows

use crate::csv::{align_row, split_line, Delimiter};
use crate::scroll::RowId;
use crate::source::Row;

/// Split a window's text into exactly `count` rows.
///
/// Line `i` becomes row `start_row + i` with its number in column 0. Lines
/// missing from the text (a short read) become rows of empty fields.
pub fn parse_window(
    text: &str,
    start_row: u64,
    count: u64,
    column_count: usize,
    delimiter: &Delimiter,
) -> Vec<Row> {
    let mut lines = text.split('\n');
    (0..count)
        .map(|i| {
            let line = lines.next().unwrap_or("");
            let line = line.strip_suffix('\r').unwrap_or(line);
            let fields = split_line(line, delimiter);
            align_row((start_row + i).to_string(), fields, column_count)
        })
        .collect()
}

/// Placeholder for a row whose window is not resident
pub fn placeholder_row(row: RowId, column_count: usize) -> Row {
    align_row(row.to_string(), Vec::new(), column_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_numbers_rows() {
        let rows = parse_window("a,1\r\nb,2\n", 4, 2, 3, &Delimiter::Comma);
        assert_eq!(rows, vec![vec!["4", "a", "1"], vec!["5", "b", "2"]]);
    }

    #[test]
    fn test_parse_window_pads_and_truncates() {
        let rows = parse_window("x\ny,z,extra\n", 0, 2, 3, &Delimiter::Comma);
        assert_eq!(rows[0], vec!["0", "x", ""]);
        assert_eq!(rows[1], vec!["1", "y", "z"]);
    }

    #[test]
    fn test_parse_window_short_text() {
        let rows = parse_window("only\n", 10, 3, 2, &Delimiter::Comma);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["12", ""]);
    }

    #[test]
    fn test_parse_window_quoted_delimiter() {
        let rows = parse_window("\"a|b\"|c\n", 0, 1, 3, &Delimiter::Pipe);
        assert_eq!(rows[0], vec!["0", "a|b", "c"]);
    }

    #[test]
    fn test_placeholder_row() {
        assert_eq!(placeholder_row(7, 3), vec!["7", "", ""]);
        assert_eq!(placeholder_row(7, 0), vec!["7"]);
    }
}
