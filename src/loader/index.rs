//! Line offset index built by a single forward scan
//!
//! `offsets[0]` is the header start, `offsets[r + 1]` the start of data row
//! `r`, and the last entry is the end-of-source sentinel. Row `r` spans
//! `[offsets[r + 1], offsets[r + 2])`.

/// Finished offset index for one source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineIndex {
    offsets: Vec<u64>,
}

impl LineIndex {
    /// Wrap offsets received from an execution channel.
    ///
    /// An empty vector is treated as the index of an empty source.
    pub fn from_offsets(mut offsets: Vec<u64>) -> Self {
        if offsets.is_empty() {
            offsets.push(0);
        }
        Self { offsets }
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Data rows (header excluded)
    pub fn row_count(&self) -> u64 {
        (self.offsets.len() as u64).saturating_sub(2)
    }

    /// Byte length of the indexed source
    pub fn total_size(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Byte span of one data row
    pub fn row_span(&self, row: u64) -> Option<(u64, u64)> {
        if row >= self.row_count() {
            return None;
        }
        let r = row as usize;
        Some((self.offsets[r + 1], self.offsets[r + 2]))
    }

    /// Byte span of `count` rows starting at `start_row`, clipped to the end
    /// of the index. `None` when `start_row` is past the end.
    pub fn window_span(&self, start_row: u64, count: u64) -> Option<(u64, u64, u64)> {
        let total = self.row_count();
        if start_row >= total {
            return None;
        }
        let end_row = total.min(start_row.saturating_add(count));
        let start = self.offsets[start_row as usize + 1];
        let end = self.offsets[end_row as usize + 1];
        Some((start, end, end_row - start_row))
    }
}

/// Incremental scanner fed one chunk at a time
#[derive(Debug, Default)]
pub struct LineIndexer {
    offsets: Vec<u64>,
    consumed: u64,
    header: Vec<u8>,
    header_done: bool,
}

impl LineIndexer {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            ..Default::default()
        }
    }

    /// Scan the next chunk.
    ///
    /// Returns the header bytes (terminator excluded) once, on the chunk that
    /// completes the first line. Header bytes are collected across chunks.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        let base = self.consumed;
        let mut completed = None;

        for (i, _) in chunk.iter().enumerate().filter(|&(_, &b)| b == b'\n') {
            if !self.header_done {
                self.header.extend_from_slice(&chunk[..i]);
                self.header_done = true;
                completed = Some(std::mem::take(&mut self.header));
            }
            self.offsets.push(base + i as u64 + 1);
        }

        if !self.header_done {
            self.header.extend_from_slice(chunk);
        }
        self.consumed += chunk.len() as u64;
        completed
    }

    pub fn bytes_read(&self) -> u64 {
        self.consumed
    }

    /// Close the index, appending the end sentinel when the source does not
    /// end with a newline.
    ///
    /// The second value is the header when no newline was ever seen (the
    /// whole source is the header line).
    pub fn finish(mut self) -> (LineIndex, Option<Vec<u8>>) {
        if self.offsets.last().copied() != Some(self.consumed) {
            self.offsets.push(self.consumed);
        }
        let header = (!self.header_done).then_some(self.header);
        (LineIndex { offsets: self.offsets }, header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_all<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> (LineIndex, Vec<u8>) {
        let mut indexer = LineIndexer::new();
        let mut header = None;
        for chunk in chunks {
            if let Some(h) = indexer.push(chunk) {
                header = Some(h);
            }
        }
        let (index, trailing) = indexer.finish();
        (index, header.or(trailing).unwrap_or_default())
    }

    #[test]
    fn test_offsets_with_trailing_newline() {
        let (index, header) = index_all(["id,name\n1,a\n2,b\n".as_bytes()]);
        assert_eq!(index.offsets(), &[0, 8, 12, 16]);
        assert_eq!(index.row_count(), 2);
        assert_eq!(header, b"id,name");
    }

    #[test]
    fn test_sentinel_without_trailing_newline() {
        let (index, _) = index_all(["id\n1\n2".as_bytes()]);
        assert_eq!(index.offsets(), &[0, 3, 5, 6]);
        assert_eq!(index.row_count(), 2);
        assert_eq!(index.row_span(1), Some((5, 6)));
    }

    #[test]
    fn test_header_split_across_chunks() {
        let (index, header) = index_all(["ide", "ntifier,va", "lue\n1,2\n"].map(str::as_bytes));
        assert_eq!(header, b"identifier,value");
        assert_eq!(index.row_count(), 1);
        assert_eq!(index.row_span(0), Some((17, 21)));
    }

    #[test]
    fn test_offsets_independent_of_chunking() {
        let data = "h1,h2\nalpha,1\nbeta,2\ngamma,3\n".as_bytes();
        let (whole, _) = index_all([data]);
        let (chunked, header) = index_all(data.chunks(3));
        assert_eq!(whole, chunked);
        assert_eq!(header, b"h1,h2");
    }

    #[test]
    fn test_empty_source() {
        let (index, header) = index_all(std::iter::empty());
        assert_eq!(index.offsets(), &[0]);
        assert_eq!(index.row_count(), 0);
        assert!(header.is_empty());
    }

    #[test]
    fn test_header_only_source() {
        let (index, header) = index_all(["a,b,c".as_bytes()]);
        assert_eq!(index.offsets(), &[0, 5]);
        assert_eq!(index.row_count(), 0);
        assert_eq!(header, b"a,b,c");
    }

    #[test]
    fn test_window_span_clips_last_window() {
        let (index, _) = index_all(["h\n0\n1\n2\n3\n4\n".as_bytes()]);
        assert_eq!(index.window_span(0, 4), Some((2, 10, 4)));
        assert_eq!(index.window_span(4, 4), Some((10, 12, 1)));
        assert_eq!(index.window_span(5, 4), None);
    }

    #[test]
    fn test_offsets_strictly_increasing() {
        let (index, _) = index_all(["h\n\n\nx\n".as_bytes()]);
        assert!(index.offsets().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(index.row_count(), 3);
    }

    #[test]
    fn test_from_offsets_empty() {
        let index = LineIndex::from_offsets(Vec::new());
        assert_eq!(index.row_count(), 0);
        assert_eq!(index.total_size(), 0);
    }
}
