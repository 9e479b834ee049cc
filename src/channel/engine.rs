//! Request state machine shared by the worker thread and the inline channel
//!
//! Work advances one chunk per [`Engine::step`]. Callers hand every pending
//! request to [`Engine::handle`] between steps, so a `Cancel` lands before
//! the next read of the load it names.
//!
//! Every `LoadWindow` gets exactly one terminal reply: `WindowDone`,
//! `WindowCanceled` or `WindowFailed`.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use super::protocol::{Request, RequestId, Response};
use crate::csv::Delimiter;
use crate::loader::{parse_window, Encoding, LineIndexer, SourceHandle};

struct Setup {
    source: SourceHandle,
    encoding: Encoding,
    delimiter: Delimiter,
}

struct IndexJob {
    reader: Box<dyn Read + Send>,
    indexer: LineIndexer,
    total_size: u64,
}

struct WindowJob {
    id: RequestId,
    start_offset: u64,
    end_offset: u64,
    start_row: u64,
    count: u64,
    column_count: usize,
    canceled: bool,
    /// Opened on the first step
    reader: Option<Box<dyn Read + Send>>,
    bytes: Vec<u8>,
}

enum ChunkOutcome {
    Pending,
    Eof,
    Failed(String),
}

pub struct Engine {
    setup: Option<Setup>,
    buf: Vec<u8>,
    index: Option<IndexJob>,
    /// Front is the active load
    windows: VecDeque<WindowJob>,
    outbox: VecDeque<Response>,
}

impl Engine {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            setup: None,
            buf: vec![0; chunk_size],
            index: None,
            windows: VecDeque::new(),
            outbox: VecDeque::new(),
        }
    }

    /// Nothing queued and nothing in progress
    pub fn is_idle(&self) -> bool {
        self.index.is_none() && self.windows.is_empty()
    }

    pub fn has_responses(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn pop_response(&mut self) -> Option<Response> {
        self.outbox.pop_front()
    }

    pub fn drain_responses(&mut self) -> impl Iterator<Item = Response> + '_ {
        self.outbox.drain(..)
    }

    /// Apply one request. Returns `false` for `Shutdown`.
    pub fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Init {
                source,
                encoding,
                delimiter,
            } => {
                tracing::debug!(source = %source.display_name(), "engine init");
                self.index = None;
                for job in self.windows.drain(..) {
                    self.outbox.push_back(Response::WindowCanceled { id: job.id });
                }
                self.setup = Some(Setup {
                    source,
                    encoding,
                    delimiter,
                });
            }
            Request::Index => self.start_index(),
            Request::LoadWindow {
                id,
                start_offset,
                end_offset,
                start_row,
                count,
                column_count,
            } => {
                if self.setup.is_none() {
                    self.outbox.push_back(Response::WindowFailed {
                        id,
                        message: "source not initialized".to_string(),
                    });
                    return true;
                }
                self.windows.push_back(WindowJob {
                    id,
                    start_offset,
                    end_offset,
                    start_row,
                    count,
                    column_count,
                    canceled: false,
                    reader: None,
                    bytes: Vec::new(),
                });
            }
            Request::Cancel { ids } => {
                for job in self.windows.iter_mut().filter(|j| ids.contains(&j.id)) {
                    job.canceled = true;
                }
            }
            Request::Shutdown => return false,
        }
        true
    }

    /// Advance by at most one chunk read. Returns whether any work was done.
    pub fn step(&mut self) -> bool {
        if self.index.is_some() {
            self.step_index();
            return true;
        }

        while let Some(job) = self.windows.front() {
            if !job.canceled {
                break;
            }
            let id = job.id;
            self.windows.pop_front();
            tracing::debug!(id, "window load canceled");
            self.outbox.push_back(Response::WindowCanceled { id });
        }

        if self.windows.is_empty() {
            return false;
        }
        self.step_window();
        true
    }

    /// Step until idle; used by tests and blocking callers
    pub fn run_to_idle(&mut self) {
        while self.step() {}
    }

    fn start_index(&mut self) {
        let Some(setup) = &self.setup else {
            self.outbox.push_back(Response::IndexFailed {
                message: "source not initialized".to_string(),
            });
            return;
        };

        let opened = setup
            .source
            .len()
            .and_then(|total_size| Ok((total_size, setup.source.open()?)));
        match opened {
            Ok((total_size, reader)) => {
                self.index = Some(IndexJob {
                    reader,
                    indexer: LineIndexer::new(),
                    total_size,
                });
            }
            Err(e) => {
                tracing::warn!(source = %setup.source.display_name(), "index open failed: {}", e);
                self.index = None;
                self.outbox.push_back(Response::IndexFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn step_index(&mut self) {
        let Some(job) = self.index.as_mut() else {
            return;
        };

        match read_chunk(&mut *job.reader, &mut self.buf) {
            Ok(0) => {
                let Some(job) = self.index.take() else {
                    return;
                };
                let (index, header) = job.indexer.finish();
                if let Some(bytes) = header {
                    self.outbox.push_back(Response::Header { bytes });
                }
                let row_count = index.row_count();
                tracing::debug!(row_count, bytes = index.total_size(), "index scan finished");
                self.outbox.push_back(Response::IndexDone {
                    offsets: index.offsets().to_vec(),
                    row_count,
                });
            }
            Ok(n) => {
                if let Some(bytes) = job.indexer.push(&self.buf[..n]) {
                    self.outbox.push_back(Response::Header { bytes });
                }
                let bytes_read = job.indexer.bytes_read();
                self.outbox.push_back(Response::IndexProgress {
                    bytes_read,
                    total_size: job.total_size.max(bytes_read),
                });
            }
            Err(e) => {
                self.index = None;
                self.outbox.push_back(Response::IndexFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn step_window(&mut self) {
        let Some(setup) = &self.setup else {
            return;
        };
        let Some(job) = self.windows.front_mut() else {
            return;
        };

        let outcome = match job.reader.as_mut() {
            Some(reader) => match read_chunk(&mut **reader, &mut self.buf) {
                Ok(0) => ChunkOutcome::Eof,
                Ok(n) => {
                    job.bytes.extend_from_slice(&self.buf[..n]);
                    ChunkOutcome::Pending
                }
                Err(e) => ChunkOutcome::Failed(e.to_string()),
            },
            None => match setup.source.open_range(job.start_offset, job.end_offset) {
                Ok(reader) => {
                    job.bytes.reserve((job.end_offset - job.start_offset) as usize);
                    job.reader = Some(reader);
                    ChunkOutcome::Pending
                }
                Err(e) => ChunkOutcome::Failed(e.to_string()),
            },
        };

        match outcome {
            ChunkOutcome::Pending => {}
            ChunkOutcome::Eof => {
                let Some(job) = self.windows.pop_front() else {
                    return;
                };
                let text = setup.encoding.decode(&job.bytes);
                let rows = parse_window(
                    &text,
                    job.start_row,
                    job.count,
                    job.column_count,
                    &setup.delimiter,
                );
                self.outbox.push_back(Response::WindowDone {
                    id: job.id,
                    start_row: job.start_row,
                    rows,
                    byte_size: job.bytes.len() as u64,
                });
            }
            ChunkOutcome::Failed(message) => {
                let Some(job) = self.windows.pop_front() else {
                    return;
                };
                tracing::warn!(id = job.id, start_row = job.start_row, "window read failed: {}", message);
                self.outbox.push_back(Response::WindowFailed {
                    id: job.id,
                    message,
                });
            }
        }
    }
}

fn read_chunk(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "id,name\n0,a\n1,b\n2,c\n3,d\n4,e\n";

    fn engine(chunk: usize) -> Engine {
        let mut engine = Engine::new(chunk);
        engine.handle(Request::Init {
            source: SourceHandle::from_bytes(DATA.as_bytes().to_vec()),
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
        });
        engine
    }

    fn responses(engine: &mut Engine) -> Vec<Response> {
        engine.drain_responses().collect()
    }

    #[test]
    fn test_index_emits_progress_header_done() {
        let mut engine = engine(5);
        engine.handle(Request::Index);
        engine.run_to_idle();
        let out = responses(&mut engine);

        let progress = out
            .iter()
            .filter(|r| matches!(r, Response::IndexProgress { .. }))
            .count();
        assert_eq!(progress, DATA.len().div_ceil(5));
        assert!(out.contains(&Response::Header {
            bytes: b"id,name".to_vec()
        }));
        assert_eq!(
            out.last(),
            Some(&Response::IndexDone {
                offsets: vec![0, 8, 12, 16, 20, 24, 28],
                row_count: 5,
            })
        );
    }

    #[test]
    fn test_empty_source_sends_one_empty_header() {
        let mut engine = Engine::new(8);
        engine.handle(Request::Init {
            source: SourceHandle::from_bytes(Vec::new()),
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
        });
        engine.handle(Request::Index);
        engine.run_to_idle();
        assert_eq!(
            responses(&mut engine),
            vec![
                Response::Header { bytes: Vec::new() },
                Response::IndexDone {
                    offsets: vec![0],
                    row_count: 0,
                },
            ]
        );
    }

    #[test]
    fn test_window_load() {
        let mut engine = engine(3);
        engine.handle(Request::LoadWindow {
            id: 1,
            start_offset: 12,
            end_offset: 20,
            start_row: 1,
            count: 2,
            column_count: 3,
        });
        engine.run_to_idle();
        let out = responses(&mut engine);
        assert_eq!(
            out,
            vec![Response::WindowDone {
                id: 1,
                start_row: 1,
                rows: vec![vec!["1".into(), "1".into(), "b".into()], vec![
                    "2".into(),
                    "2".into(),
                    "c".into()
                ]],
                byte_size: 8,
            }]
        );
    }

    #[test]
    fn test_cancel_mid_read() {
        let mut engine = engine(2);
        engine.handle(Request::LoadWindow {
            id: 7,
            start_offset: 8,
            end_offset: 28,
            start_row: 0,
            count: 5,
            column_count: 3,
        });
        // open, then two chunks
        assert!(engine.step());
        assert!(engine.step());
        assert!(engine.step());
        engine.handle(Request::Cancel { ids: vec![7] });
        engine.run_to_idle();
        assert_eq!(responses(&mut engine), vec![Response::WindowCanceled { id: 7 }]);
    }

    #[test]
    fn test_cancel_queued_load_never_reads() {
        let mut engine = engine(64);
        for id in [1, 2] {
            engine.handle(Request::LoadWindow {
                id,
                start_offset: 8,
                end_offset: 12,
                start_row: 0,
                count: 1,
                column_count: 2,
            });
        }
        engine.handle(Request::Cancel { ids: vec![1] });
        engine.run_to_idle();
        let out = responses(&mut engine);
        assert_eq!(out[0], Response::WindowCanceled { id: 1 });
        assert!(matches!(out[1], Response::WindowDone { id: 2, .. }));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_cancel_unknown_id_is_ignored() {
        let mut engine = engine(64);
        engine.handle(Request::Cancel { ids: vec![99] });
        assert!(engine.is_idle());
        assert!(!engine.has_responses());
    }

    #[test]
    fn test_index_missing_file_fails() {
        let mut engine = Engine::new(16);
        engine.handle(Request::Init {
            source: SourceHandle::File("/no/such/file.csv".into()),
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
        });
        engine.handle(Request::Index);
        engine.run_to_idle();
        assert!(matches!(
            engine.pop_response(),
            Some(Response::IndexFailed { .. })
        ));
    }

    #[test]
    fn test_window_missing_file_fails() {
        let mut engine = Engine::new(16);
        engine.handle(Request::Init {
            source: SourceHandle::File("/no/such/file.csv".into()),
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
        });
        engine.handle(Request::LoadWindow {
            id: 5,
            start_offset: 0,
            end_offset: 10,
            start_row: 0,
            count: 1,
            column_count: 1,
        });
        engine.run_to_idle();
        assert!(matches!(
            engine.pop_response(),
            Some(Response::WindowFailed { id: 5, .. })
        ));
    }

    #[test]
    fn test_requests_before_init() {
        let mut engine = Engine::new(16);
        engine.handle(Request::Index);
        engine.handle(Request::LoadWindow {
            id: 1,
            start_offset: 0,
            end_offset: 1,
            start_row: 0,
            count: 1,
            column_count: 1,
        });
        let out = responses(&mut engine);
        assert!(matches!(out[0], Response::IndexFailed { .. }));
        assert!(matches!(out[1], Response::WindowFailed { id: 1, .. }));
    }

    #[test]
    fn test_reinit_cancels_pending_loads() {
        let mut engine = engine(64);
        engine.handle(Request::LoadWindow {
            id: 3,
            start_offset: 8,
            end_offset: 12,
            start_row: 0,
            count: 1,
            column_count: 2,
        });
        engine.handle(Request::Init {
            source: SourceHandle::from_bytes(Vec::new()),
            encoding: Encoding::Utf8,
            delimiter: Delimiter::Comma,
        });
        assert!(engine.is_idle());
        assert_eq!(responses(&mut engine), vec![Response::WindowCanceled { id: 3 }]);
    }

    #[test]
    fn test_shutdown() {
        let mut engine = Engine::new(16);
        assert!(!engine.handle(Request::Shutdown));
    }
}
