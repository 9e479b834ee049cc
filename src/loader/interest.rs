//! Wanted windows and load ordering
//!
//! The consumer declares a row range; the set holds the keys of every window
//! touching that range plus an anchor row at its midpoint. The next window to
//! load is the wanted one whose key is closest to the anchor's window.

use std::collections::BTreeSet;

/// Key of the window holding `row`
pub fn window_key(row: u64, window_rows: u64) -> u64 {
    let window_rows = window_rows.max(1);
    row / window_rows * window_rows
}

#[derive(Debug, Clone)]
pub struct InterestSet {
    window_rows: u64,
    keys: BTreeSet<u64>,
    anchor: u64,
}

impl InterestSet {
    pub fn new(window_rows: u64) -> Self {
        Self {
            window_rows: window_rows.max(1),
            keys: BTreeSet::new(),
            anchor: 0,
        }
    }

    pub fn window_rows(&self) -> u64 {
        self.window_rows
    }

    /// Replace the set with the windows covering `[start, end)`, clipped to
    /// `total_rows`. An empty range clears it.
    pub fn declare(&mut self, start: u64, end: u64, total_rows: u64) {
        self.keys.clear();
        let end = end.min(total_rows);
        if start >= end {
            self.anchor = start.min(total_rows.saturating_sub(1));
            return;
        }
        self.anchor = start + (end - start) / 2;

        let last = window_key(end - 1, self.window_rows);
        let mut key = window_key(start, self.window_rows);
        loop {
            self.keys.insert(key);
            if key >= last {
                break;
            }
            key += self.window_rows;
        }
    }

    /// Move the anchor to `row`, adding its window if it was not wanted
    pub fn focus(&mut self, row: u64) {
        self.keys.insert(window_key(row, self.window_rows));
        self.anchor = row;
    }

    pub fn contains(&self, key: u64) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.keys.iter().copied()
    }

    pub fn anchor(&self) -> u64 {
        self.anchor
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Wanted keys nearest the anchor first; ties go to the lower key
    pub fn ordered(&self) -> Vec<u64> {
        let anchor_key = window_key(self.anchor, self.window_rows);
        let mut keys: Vec<u64> = self.keys.iter().copied().collect();
        keys.sort_by_key(|&k| (k.abs_diff(anchor_key), k));
        keys
    }

    /// Closest key among the `limit` wanted keys nearest the anchor for
    /// which `skip` is false
    pub fn next(&self, limit: usize, mut skip: impl FnMut(u64) -> bool) -> Option<u64> {
        self.ordered().into_iter().take(limit).find(|&k| !skip(k))
    }
}
