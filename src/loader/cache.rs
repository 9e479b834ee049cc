//! LRU window cache bounded by window count and decoded byte size

use std::collections::{HashMap, VecDeque};

use crate::source::Row;

/// One resident window
#[derive(Debug, Clone, PartialEq)]
pub struct CachedWindow {
    pub rows: Vec<Row>,
    pub byte_size: u64,
}

/// Windows keyed by their first row.
///
/// After every mutation `len() <= max_windows` and
/// `byte_total() <= budget_bytes`. Eviction takes from the least recently
/// used end until both bounds hold.
#[derive(Debug)]
pub struct WindowCache {
    windows: HashMap<u64, CachedWindow>,
    /// Least recently used first
    lru: VecDeque<u64>,
    byte_total: u64,
    max_windows: usize,
    budget_bytes: u64,
}

impl WindowCache {
    pub fn new(max_windows: usize, budget_bytes: u64) -> Self {
        Self {
            windows: HashMap::new(),
            lru: VecDeque::new(),
            byte_total: 0,
            max_windows: max_windows.max(1),
            budget_bytes,
        }
    }

    pub fn get(&self, key: u64) -> Option<&CachedWindow> {
        self.windows.get(&key)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.windows.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn byte_total(&self) -> u64 {
        self.byte_total
    }

    pub fn max_windows(&self) -> usize {
        self.max_windows
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    /// Keys from least to most recently used
    pub fn keys_by_recency(&self) -> impl Iterator<Item = u64> + '_ {
        self.lru.iter().copied()
    }

    /// Mark `key` most recently used. No-op when absent.
    pub fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|&k| k == key) {
            self.lru.remove(pos);
            self.lru.push_back(key);
        }
    }

    /// Insert (or replace) a window, mark it most recently used, then evict.
    ///
    /// Returns evicted keys in eviction order. The inserted key itself is
    /// among them when the window alone exceeds the byte budget.
    pub fn insert(&mut self, key: u64, window: CachedWindow) -> Vec<u64> {
        if let Some(old) = self.windows.remove(&key) {
            self.byte_total -= old.byte_size;
            self.lru.retain(|&k| k != key);
        }
        self.byte_total += window.byte_size;
        self.windows.insert(key, window);
        self.lru.push_back(key);
        self.enforce_bounds()
    }

    pub fn remove(&mut self, key: u64) -> Option<CachedWindow> {
        let window = self.windows.remove(&key)?;
        self.byte_total -= window.byte_size;
        self.lru.retain(|&k| k != key);
        Some(window)
    }

    pub fn clear(&mut self) {
        self.windows.clear();
        self.lru.clear();
        self.byte_total = 0;
    }

    fn enforce_bounds(&mut self) -> Vec<u64> {
        let mut evicted = Vec::new();
        while self.windows.len() > self.max_windows || self.byte_total > self.budget_bytes {
            let Some(key) = self.lru.pop_front() else {
                break;
            };
            if let Some(window) = self.windows.remove(&key) {
                self.byte_total -= window.byte_size;
                evicted.push(key);
            }
        }
        evicted
    }
}
