//! Streamed, windowed source over a delimited byte source
//!
//! Lifecycle: `loading` while the execution channel scans for line offsets,
//! then `ready`, or `error` when the scan fails. Once ready, rows are served
//! from an LRU cache of fixed-size windows. Misses return a placeholder and
//! schedule a load; at most one load is in flight at a time.
//!
//! All cache mutation happens in [`FileTableSource::poll_at`] on the
//! consumer's thread, so the cache needs no locking.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::{
    columns_from_header, Column, DataSource, Observable, Row, SampleRows, SourceKind, Status,
    WindowEvent, WindowEventReason, Windowed,
};
use crate::channel::{open_channel, ExecutionChannel, ExecutionMode, Request, RequestId, Response};
use crate::csv::{split_line, Delimiter};
use crate::error::{Result, VastrowError};
use crate::events::{EventHub, Subscription};
use crate::loader::{
    placeholder_row, window_key, CachedWindow, Encoding, InterestSet, LineIndex, SourceHandle,
    WindowCache, DEFAULT_CHUNK_SIZE,
};
use crate::scroll::group_digits;

/// Tuning for [`FileTableSource`]
#[derive(Debug, Clone)]
pub struct FileTableOptions {
    pub delimiter: Delimiter,
    pub encoding: Encoding,
    /// Rows per window (minimum 1)
    pub window_rows: u64,
    /// Resident window cap (minimum 1)
    pub max_windows: usize,
    /// Cap on the summed raw byte size of resident windows
    pub cache_budget_bytes: u64,
    /// Quiet time after the last `prefetch` before a load is dispatched
    pub prefetch_debounce: Duration,
    /// Status message while indexing
    pub loading_text: String,
    /// Read size for the index scan and window loads
    pub chunk_size: usize,
    pub execution: ExecutionMode,
}

impl Default for FileTableOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            encoding: Encoding::Utf8,
            window_rows: 1024,
            max_windows: 16,
            cache_budget_bytes: 50 * 1024 * 1024,
            prefetch_debounce: Duration::from_millis(25),
            loading_text: "Loading file".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            execution: ExecutionMode::Worker,
        }
    }
}

impl FileTableOptions {
    fn normalized(mut self) -> Self {
        self.window_rows = self.window_rows.max(1);
        self.max_windows = self.max_windows.max(1);
        self.chunk_size = self.chunk_size.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: RequestId,
    key: u64,
}

pub struct FileTableSource {
    source: SourceHandle,
    options: FileTableOptions,
    channel: Box<dyn ExecutionChannel>,
    columns: Vec<Column>,
    /// Set once indexing finishes
    index: Option<LineIndex>,
    status: Status,
    status_events: EventHub<Status>,
    window_events: EventHub<WindowEvent>,
    cache: WindowCache,
    interest: InterestSet,
    /// Last declared range, replayed when indexing finishes
    requested: Option<(u64, u64)>,
    /// Keys skipped until the next `prefetch`: failed loads and windows
    /// larger than the whole byte budget
    parked: HashSet<u64>,
    /// Wanted keys evicted to make room for a nearer window; skipped until
    /// the next `prefetch` so full caches do not reload in a cycle
    displaced: HashSet<u64>,
    in_flight: Option<InFlight>,
    /// Ids whose late results must be dropped
    canceled: HashSet<RequestId>,
    next_id: RequestId,
    dispatch_at: Option<Instant>,
}

impl FileTableSource {
    /// Start indexing `source` in the background
    pub fn new(source: SourceHandle, options: FileTableOptions) -> Self {
        let options = options.normalized();
        let channel = open_channel(options.execution, options.chunk_size);
        Self::with_channel(source, options, channel)
    }

    pub fn open(path: impl Into<PathBuf>, options: FileTableOptions) -> Self {
        Self::new(SourceHandle::File(path.into()), options)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>, options: FileTableOptions) -> Self {
        Self::new(SourceHandle::from_bytes(bytes), options)
    }

    /// Use an already opened execution channel
    pub fn with_channel(
        source: SourceHandle,
        options: FileTableOptions,
        channel: Box<dyn ExecutionChannel>,
    ) -> Self {
        let options = options.normalized();
        let mut this = Self {
            cache: WindowCache::new(options.max_windows, options.cache_budget_bytes),
            interest: InterestSet::new(options.window_rows),
            status: Status::loading(0.0, options.loading_text.clone()),
            source,
            options,
            channel,
            columns: vec![Column::identity()],
            index: None,
            status_events: EventHub::new(),
            window_events: EventHub::new(),
            requested: None,
            parked: HashSet::new(),
            displaced: HashSet::new(),
            in_flight: None,
            canceled: HashSet::new(),
            next_id: 0,
            dispatch_at: None,
        };
        this.start();
        this
    }

    fn start(&mut self) {
        tracing::debug!(
            source = %self.source.display_name(),
            mode = ?self.channel.mode(),
            "indexing"
        );
        let init = Request::Init {
            source: self.source.clone(),
            encoding: self.options.encoding,
            delimiter: self.options.delimiter.clone(),
        };
        if self.channel.send(init).and_then(|_| self.channel.send(Request::Index)).is_err() {
            self.set_status(Status::error("Execution channel closed"));
        }
    }

    pub fn options(&self) -> &FileTableOptions {
        &self.options
    }

    pub fn source(&self) -> &SourceHandle {
        &self.source
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.channel.mode()
    }

    /// Offset index, once indexing has finished
    pub fn line_index(&self) -> Option<&LineIndex> {
        self.index.as_ref()
    }

    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    /// Window currently being loaded
    pub fn in_flight_key(&self) -> Option<u64> {
        self.in_flight.map(|f| f.key)
    }

    /// Wanted windows not yet resident, in the order they would load.
    /// Only the `max_windows` keys nearest the anchor are loaded.
    pub fn pending_keys(&self) -> Vec<u64> {
        self.interest
            .ordered()
            .into_iter()
            .take(self.options.max_windows)
            .filter(|k| !self.is_skipped(*k))
            .collect()
    }

    fn is_skipped(&self, key: u64) -> bool {
        self.cache.contains(key) || self.parked.contains(&key) || self.displaced.contains(&key)
    }

    /// Declare interest in `[start, end)`; loads fire once `now` passes the
    /// debounce delay in [`FileTableSource::poll_at`]
    pub fn prefetch_at(&mut self, start: u64, end: u64, now: Instant) {
        self.parked.clear();
        self.displaced.clear();
        self.requested = Some((start, end));
        if let Some(index) = &self.index {
            self.interest.declare(start, end, index.row_count());
        }
        self.dispatch_at = Some(now + self.options.prefetch_debounce);
    }

    /// Drain channel replies, then dispatch if the debounce delay has passed
    pub fn poll_at(&mut self, now: Instant) -> bool {
        self.channel.pump();
        let mut changed = false;
        while let Some(response) = self.channel.try_recv() {
            changed |= self.handle_response(response, now);
        }
        if self.dispatch_at.is_some_and(|at| now >= at) {
            self.dispatch_at = None;
            self.dispatch();
        }
        changed
    }

    /// Pump until indexing finishes.
    ///
    /// `Ok(false)` on timeout; an error status becomes `Err`.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_at(Instant::now());
            if self.status.is_ready() {
                return Ok(true);
            }
            if self.status.is_error() {
                return Err(VastrowError::Indexing(self.status.message.clone()));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let wait = (deadline - now).min(Duration::from_millis(50));
            if let Some(response) = self.channel.recv_timeout(wait) {
                self.handle_response(response, Instant::now());
            }
        }
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.status_events.emit(&self.status);
    }

    fn total_rows(&self) -> u64 {
        self.index.as_ref().map_or(0, LineIndex::row_count)
    }

    fn window_end(&self, key: u64) -> u64 {
        key.saturating_add(self.options.window_rows)
            .min(self.total_rows())
    }

    fn handle_response(&mut self, response: Response, now: Instant) -> bool {
        match response {
            Response::IndexProgress {
                bytes_read,
                total_size,
            } => {
                if self.index.is_some() || self.status.is_error() {
                    return false;
                }
                let progress = bytes_read as f64 / total_size.max(1) as f64;
                let message = self.status.message.clone();
                self.set_status(Status::loading(progress, message));
                true
            }
            Response::Header { bytes } => {
                let text = self.options.encoding.decode_header(&bytes);
                let labels = split_line(&text, &self.options.delimiter);
                self.columns = columns_from_header(&labels, "col_");
                tracing::debug!(columns = self.columns.len() - 1, "header parsed");
                true
            }
            Response::IndexDone { offsets, row_count } => {
                let index = LineIndex::from_offsets(offsets);
                if index.row_count() != row_count {
                    tracing::warn!(
                        reported = row_count,
                        indexed = index.row_count(),
                        "row count disagrees with offsets"
                    );
                }
                let total = index.row_count();
                self.index = Some(index);
                if let Some((start, end)) = self.requested {
                    self.interest.declare(start, end, total);
                    self.dispatch_at.get_or_insert(now);
                }
                tracing::info!(
                    source = %self.source.display_name(),
                    rows = total,
                    "index complete"
                );
                self.set_status(Status::ready(format!(
                    "Loaded {} rows",
                    group_digits(total.into())
                )));
                true
            }
            Response::IndexFailed { message } => {
                tracing::error!(source = %self.source.display_name(), "indexing failed: {}", message);
                self.set_status(Status::error(format!(
                    "Failed to read {}: {}",
                    self.source.display_name(),
                    message
                )));
                true
            }
            Response::WindowDone {
                id,
                start_row,
                rows,
                byte_size,
            } => {
                if self.canceled.remove(&id) {
                    tracing::debug!(id, start_row, "dropping canceled window");
                    return false;
                }
                if self.in_flight.map(|f| f.id) != Some(id) {
                    tracing::debug!(id, start_row, "dropping stale window");
                    return false;
                }
                self.in_flight = None;
                self.insert_window(start_row, rows, byte_size);
                self.dispatch();
                true
            }
            Response::WindowCanceled { id } => {
                self.canceled.remove(&id);
                if self.in_flight.map(|f| f.id) == Some(id) {
                    self.in_flight = None;
                    self.dispatch();
                }
                false
            }
            Response::WindowFailed { id, message } => {
                if self.canceled.remove(&id) {
                    return false;
                }
                if let Some(flight) = self.in_flight.filter(|f| f.id == id) {
                    let err = VastrowError::WindowLoad {
                        start_row: flight.key,
                        message,
                    };
                    tracing::warn!("{}", err);
                    self.in_flight = None;
                    self.parked.insert(flight.key);
                    self.dispatch();
                }
                false
            }
        }
    }

    fn insert_window(&mut self, key: u64, rows: Vec<Row>, byte_size: u64) {
        let end = key + rows.len() as u64;
        let evicted = self.cache.insert(key, CachedWindow { rows, byte_size });
        tracing::debug!(
            key,
            byte_size,
            resident = self.cache.len(),
            bytes = self.cache.byte_total(),
            "window cached"
        );
        self.window_events.emit(&WindowEvent {
            start: key,
            end,
            reason: WindowEventReason::Loaded,
        });

        for evicted_key in evicted {
            if evicted_key == key {
                tracing::warn!(
                    key,
                    byte_size,
                    budget = self.options.cache_budget_bytes,
                    "window larger than cache budget"
                );
                self.parked.insert(key);
            } else if self.interest.contains(evicted_key) {
                tracing::debug!(key = evicted_key, "wanted window evicted");
                self.displaced.insert(evicted_key);
            } else {
                tracing::debug!(key = evicted_key, "window evicted");
            }
            self.window_events.emit(&WindowEvent {
                start: evicted_key,
                end: self.window_end(evicted_key),
                reason: WindowEventReason::Evicted,
            });
        }
    }

    /// Cancel an unwanted in-flight load, then start the closest wanted
    /// window if nothing is in flight
    fn dispatch(&mut self) {
        let Some(index) = &self.index else {
            return;
        };

        if let Some(flight) = self.in_flight {
            if self.interest.contains(flight.key) {
                return;
            }
            tracing::debug!(id = flight.id, key = flight.key, "canceling unwanted load");
            self.canceled.insert(flight.id);
            self.in_flight = None;
            if let Err(e) = self.channel.send(Request::Cancel {
                ids: vec![flight.id],
            }) {
                tracing::warn!("failed to send cancel: {}", e);
            }
        }

        let Some(key) = self
            .interest
            .next(self.options.max_windows, |k| self.is_skipped(k))
        else {
            return;
        };
        let Some((start_offset, end_offset, count)) =
            index.window_span(key, self.options.window_rows)
        else {
            return;
        };

        self.next_id += 1;
        let id = self.next_id;
        let request = Request::LoadWindow {
            id,
            start_offset,
            end_offset,
            start_row: key,
            count,
            column_count: self.columns.len(),
        };
        match self.channel.send(request) {
            Ok(()) => {
                tracing::debug!(id, key, count, "window load dispatched");
                self.in_flight = Some(InFlight { id, key });
            }
            Err(e) => tracing::warn!(key, "failed to dispatch window load: {}", e),
        }
    }

    fn cached_row(&mut self, index: u64) -> Option<Row> {
        let key = window_key(index, self.options.window_rows);
        let row = self
            .cache
            .get(key)?
            .rows
            .get((index - key) as usize)
            .cloned()?;
        self.cache.touch(key);
        Some(row)
    }
}

impl DataSource for FileTableSource {
    fn kind(&self) -> SourceKind {
        SourceKind::FileTable
    }

    fn row_count(&self) -> u64 {
        self.total_rows()
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn row(&mut self, index: u64) -> Row {
        let placeholder = placeholder_row(index.into(), self.columns.len());
        let Some(total) = self.index.as_ref().map(LineIndex::row_count) else {
            self.requested.get_or_insert((index, index.saturating_add(1)));
            return placeholder;
        };
        if index >= total {
            return placeholder;
        }
        if let Some(row) = self.cached_row(index) {
            return row;
        }

        // A miss is fresh interest: failed or displaced windows get retried
        let key = window_key(index, self.options.window_rows);
        self.parked.remove(&key);
        self.displaced.remove(&key);
        if !self.interest.contains(key) {
            self.interest.declare(index, index + 1, total);
            self.requested = Some((index, index + 1));
        }
        if self.dispatch_at.is_none() {
            self.dispatch_at = Some(Instant::now() + self.options.prefetch_debounce);
        }
        placeholder
    }

    fn sample_rows(&mut self, max: usize) -> SampleRows<'_> {
        SampleRows::new(self, max)
    }

    fn windowed(&mut self) -> Option<&mut dyn Windowed> {
        Some(self)
    }

    fn observable(&self) -> Option<&dyn Observable> {
        Some(self)
    }
}

impl Windowed for FileTableSource {
    fn is_row_ready(&self, index: u64) -> bool {
        let key = window_key(index, self.options.window_rows);
        self.cache
            .get(key)
            .is_some_and(|w| index - key < w.rows.len() as u64)
    }

    fn row_blocking(&mut self, index: u64, timeout: Duration) -> Option<Row> {
        let deadline = Instant::now() + timeout;
        let key = window_key(index, self.options.window_rows);
        let mut requested = false;

        loop {
            self.poll_at(Instant::now());
            if self.status.is_error() {
                return None;
            }

            if let Some(total) = self.index.as_ref().map(LineIndex::row_count) {
                if index >= total {
                    return None;
                }
                if let Some(row) = self.cached_row(index) {
                    return Some(row);
                }
                if self.parked.contains(&key) {
                    if requested {
                        return None;
                    }
                    self.parked.remove(&key);
                }
                self.displaced.remove(&key);
                if self.interest.contains(key) {
                    self.interest.focus(index);
                } else {
                    self.interest.declare(index, index + 1, total);
                    self.requested = Some((index, index + 1));
                }
                self.dispatch();
                requested = true;
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let wait = (deadline - now).min(Duration::from_millis(50));
            if let Some(response) = self.channel.recv_timeout(wait) {
                self.handle_response(response, Instant::now());
            }
        }
    }

    fn prefetch(&mut self, start: u64, end: u64) {
        self.prefetch_at(start, end, Instant::now());
    }

    fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }
}

impl Observable for FileTableSource {
    fn status(&self) -> Status {
        self.status.clone()
    }

    fn on_status(&self, listener: Box<dyn Fn(&Status) + Send + Sync>) -> Subscription {
        self.status_events.subscribe(listener)
    }

    fn on_window(&self, listener: Box<dyn Fn(&WindowEvent) + Send + Sync>) -> Subscription {
        self.window_events.subscribe(listener)
    }
}
