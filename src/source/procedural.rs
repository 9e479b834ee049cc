//! Sources whose rows are a pure function of the row index

use std::fmt::Write as _;
use std::sync::Arc;

use super::{Align, Column, ColumnTheme, DataSource, Row, SampleRows, SourceKind};
use crate::scroll::{saturating_u64, RowId};

/// Number of distinct version 4 UUIDs: 122 free bits
pub const UUID_SPACE_ROWS: RowId = 1 << 122;

const VERSION_4: u8 = 0x40;
const VARIANT_RFC4122: u8 = 0x80;

/// The version 4 UUID whose 122 free bits are `index` (taken modulo 2^122).
///
/// Bits are laid out from the least significant end: bytes 15..=9, the low
/// six bits of byte 8, byte 7, the low nibble of byte 6, then bytes 5..=0.
pub fn uuid_for_index(index: RowId) -> String {
    let mut v = index & (UUID_SPACE_ROWS - 1);
    let mut bytes = [0u8; 16];

    for b in bytes[9..16].iter_mut().rev() {
        *b = (v & 0xff) as u8;
        v >>= 8;
    }
    bytes[8] = (v & 0x3f) as u8 | VARIANT_RFC4122;
    v >>= 6;
    bytes[7] = (v & 0xff) as u8;
    v >>= 8;
    bytes[6] = (v & 0x0f) as u8 | VERSION_4;
    v >>= 4;
    for b in bytes[0..6].iter_mut().rev() {
        *b = (v & 0xff) as u8;
        v >>= 8;
    }

    format_uuid(&bytes)
}

/// Inverse of [`uuid_for_index`]. `None` for text that is not a
/// hyphenated version 4 RFC 4122 UUID.
pub fn index_for_uuid(uuid: &str) -> Option<RowId> {
    let hex: String = uuid.chars().filter(|&c| c != '-').collect();
    if hex.len() != 32 || uuid.len() != 36 {
        return None;
    }
    let raw = u128::from_str_radix(&hex, 16).ok()?;
    let bytes = raw.to_be_bytes();
    if bytes[6] & 0xf0 != VERSION_4 || bytes[8] & 0xc0 != VARIANT_RFC4122 {
        return None;
    }

    let mut v: RowId = 0;
    for &b in &bytes[0..6] {
        v = (v << 8) | RowId::from(b);
    }
    v = (v << 4) | RowId::from(bytes[6] & 0x0f);
    v = (v << 8) | RowId::from(bytes[7]);
    v = (v << 6) | RowId::from(bytes[8] & 0x3f);
    for &b in &bytes[9..16] {
        v = (v << 8) | RowId::from(b);
    }
    Some(v)
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Every version 4 UUID, one per row, in index order
pub struct UuidSpaceSource {
    columns: Vec<Column>,
}

impl Default for UuidSpaceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidSpaceSource {
    pub fn new() -> Self {
        let dimmed = ColumnTheme {
            background: None,
            text: Some("#666".to_string()),
        };
        Self {
            columns: vec![
                Column::new("id", "#").with_theme(dimmed),
                Column::new("uuid", "UUID"),
            ],
        }
    }
}

impl DataSource for UuidSpaceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Procedural
    }

    fn row_count(&self) -> u64 {
        saturating_u64(UUID_SPACE_ROWS)
    }

    fn row_count_big(&self) -> RowId {
        UUID_SPACE_ROWS
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn row(&mut self, index: u64) -> Row {
        self.row_big(RowId::from(index))
    }

    fn row_big(&mut self, index: RowId) -> Row {
        vec![index.to_string(), uuid_for_index(index)]
    }

    fn sample_rows(&mut self, max: usize) -> SampleRows<'_> {
        SampleRows::new(self, max)
    }
}

/// UUID-shaped value derived from a 32-bit seed with xorshift
pub fn synthetic_value(seed: u32) -> String {
    let mut x = seed ^ 0x9e37_79b9;
    let mut bytes = [0u8; 16];
    for word in bytes.chunks_exact_mut(4) {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        word.copy_from_slice(&x.to_le_bytes());
    }
    bytes[6] = (bytes[6] & 0x0f) | VERSION_4;
    bytes[8] = (bytes[8] & 0x3f) | VARIANT_RFC4122;
    format_uuid(&bytes)
}

type RowFn = Arc<dyn Fn(RowId) -> Row + Send + Sync>;

/// A configurable number of rows with a deterministic value column
pub struct SyntheticSource {
    rows: RowId,
    columns: Vec<Column>,
    row_fn: Option<RowFn>,
}

impl SyntheticSource {
    pub fn new(rows: RowId) -> Self {
        Self {
            rows,
            columns: vec![
                Column::new("id", "#")
                    .with_min_width(70)
                    .with_align(Align::Right),
                Column::new("value", "Value").with_min_width(320),
            ],
            row_fn: None,
        }
    }

    /// Replace the generated rows with `row_fn`
    pub fn with_row_fn(mut self, row_fn: impl Fn(RowId) -> Row + Send + Sync + 'static) -> Self {
        self.row_fn = Some(Arc::new(row_fn));
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    fn generate(&self, index: RowId) -> Row {
        if let Some(row_fn) = &self.row_fn {
            return row_fn(index);
        }
        // Low 32 bits for machine-sized indices; big ones are folded first
        let seed = match u64::try_from(index) {
            Ok(small) => small as u32,
            Err(_) => (index % 0xffff_ffff) as u32,
        };
        vec![index.to_string(), synthetic_value(seed)]
    }
}

impl DataSource for SyntheticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Procedural
    }

    fn row_count(&self) -> u64 {
        saturating_u64(self.rows)
    }

    fn row_count_big(&self) -> RowId {
        self.rows
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn row(&mut self, index: u64) -> Row {
        self.generate(RowId::from(index))
    }

    fn row_big(&mut self, index: RowId) -> Row {
        self.generate(index)
    }

    fn sample_rows(&mut self, max: usize) -> SampleRows<'_> {
        SampleRows::new(self, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last_uuid() {
        assert_eq!(uuid_for_index(0), "00000000-0000-4000-8000-000000000000");
        assert_eq!(
            uuid_for_index(UUID_SPACE_ROWS - 1),
            "ffffffff-ffff-4fff-bfff-ffffffffffff"
        );
    }

    #[test]
    fn test_uuid_low_bits() {
        assert_eq!(uuid_for_index(1), "00000000-0000-4000-8000-000000000001");
        // bit 56 lands in byte 8's low six bits
        assert_eq!(
            uuid_for_index(1 << 56),
            "00000000-0000-4000-8100-000000000000"
        );
    }

    #[test]
    fn test_uuid_wraps_modulo_space() {
        assert_eq!(uuid_for_index(UUID_SPACE_ROWS + 5), uuid_for_index(5));
    }

    #[test]
    fn test_uuid_bijection() {
        for index in [0, 1, 255, 1 << 56, 1 << 63, (1 << 100) + 12_345, UUID_SPACE_ROWS - 1] {
            let uuid = uuid_for_index(index);
            assert_eq!(index_for_uuid(&uuid), Some(index), "{uuid}");
        }
    }

    #[test]
    fn test_index_for_uuid_rejects_other_versions() {
        assert_eq!(index_for_uuid("00000000-0000-1000-8000-000000000000"), None);
        assert_eq!(index_for_uuid("not-a-uuid"), None);
    }

    #[test]
    fn test_uuid_source_counts() {
        let source = UuidSpaceSource::new();
        assert_eq!(source.row_count(), u64::MAX);
        assert_eq!(source.row_count_big(), 1 << 122);
        assert_eq!(source.columns()[0].theme.as_ref().unwrap().text.as_deref(), Some("#666"));
    }

    #[test]
    fn test_uuid_source_big_rows() {
        let mut source = UuidSpaceSource::new();
        let last = source.row_big(UUID_SPACE_ROWS - 1);
        assert_eq!(last[0], (UUID_SPACE_ROWS - 1).to_string());
        assert_eq!(last[1], "ffffffff-ffff-4fff-bfff-ffffffffffff");
    }

    #[test]
    fn test_uuid_sample_is_finite() {
        let mut source = UuidSpaceSource::new();
        let count = source.sample_rows(10).count();
        assert!((50..=51).contains(&count));
    }

    #[test]
    fn test_synthetic_value_shape() {
        let v = synthetic_value(42);
        assert_eq!(v.len(), 36);
        assert_eq!(&v[14..15], "4");
        assert!(matches!(&v[19..20], "8" | "9" | "a" | "b"));
        assert_eq!(v, synthetic_value(42));
        assert_ne!(v, synthetic_value(43));
    }

    #[test]
    fn test_synthetic_source() {
        let mut source = SyntheticSource::new(RowId::MAX);
        assert_eq!(source.row_count(), u64::MAX);
        assert_eq!(source.row(7)[1], synthetic_value(7));
        let big = source.row_big(RowId::MAX);
        assert_eq!(big[0], RowId::MAX.to_string());
    }

    #[test]
    fn test_synthetic_row_fn() {
        let mut source =
            SyntheticSource::new(10).with_row_fn(|i| vec![i.to_string(), format!("v{}", i * 2)]);
        assert_eq!(source.row(3), vec!["3", "v6"]);
    }
}
