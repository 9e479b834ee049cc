//! Strided row sampling for column width estimation

use super::{DataSource, Row};

const MIN_SAMPLE: u64 = 50;
const MAX_SAMPLE: u64 = 1000;

/// Row indices `0, step, 2 * step, ... < total` where
/// `step = max(1, total / clamp(max, 50, 1000))`
#[derive(Debug, Clone)]
pub struct SampleStride {
    next: u64,
    step: u64,
    total: u64,
}

impl SampleStride {
    pub fn new(total: u64, max: usize) -> Self {
        let take = (max as u64).clamp(MIN_SAMPLE, MAX_SAMPLE);
        Self {
            next: 0,
            step: (total / take).max(1),
            total,
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }
}

impl Iterator for SampleStride {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.next >= self.total {
            return None;
        }
        let row = self.next;
        self.next = self.next.saturating_add(self.step);
        if self.next == row {
            // saturated at u64::MAX
            self.total = row;
        }
        Some(row)
    }
}

/// Lazily fetches sampled rows from a source
pub struct SampleRows<'a> {
    source: &'a mut dyn DataSource,
    stride: SampleStride,
}

impl<'a> SampleRows<'a> {
    pub fn new(source: &'a mut dyn DataSource, max: usize) -> Self {
        let stride = SampleStride::new(source.row_count(), max);
        Self { source, stride }
    }
}

impl Iterator for SampleRows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let row = self.stride.next()?;
        Some(self.source.row(row))
    }
}
