//! Execution channel protocol - every message crosses a JSON boundary

mod common;

use std::time::Duration;

use common::NINE_ROWS;
use vastrow::channel::{ExecutionChannel, InlineChannel, Request, Response, WorkerChannel};
use vastrow::csv::Delimiter;
use vastrow::loader::{Encoding, LineIndex, SourceHandle};

/// Serializes each message in both directions, as a process boundary would
struct Wire {
    inner: Box<dyn ExecutionChannel>,
}

impl Wire {
    fn send(&mut self, request: Request) {
        let json = serde_json::to_string(&request).unwrap();
        let request: Request = serde_json::from_str(&json).unwrap();
        self.inner.send(request).unwrap();
    }

    fn recv(&mut self) -> Response {
        let response = self
            .inner
            .recv_timeout(Duration::from_secs(10))
            .expect("channel timed out");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("type").is_some(), "{}", json);
        serde_json::from_value(json).unwrap()
    }

    /// Receive until `done` matches, returning everything seen
    fn recv_until(&mut self, done: impl Fn(&Response) -> bool) -> Vec<Response> {
        let mut seen = Vec::new();
        loop {
            let response = self.recv();
            let finished = done(&response);
            seen.push(response);
            if finished {
                return seen;
            }
        }
    }
}

fn channels() -> Vec<Wire> {
    vec![
        Wire {
            inner: Box::new(WorkerChannel::spawn(16).unwrap()),
        },
        Wire {
            inner: Box::new(InlineChannel::with_steps(16, 2)),
        },
    ]
}

fn init(wire: &mut Wire, text: &str) -> LineIndex {
    wire.send(Request::Init {
        source: SourceHandle::from_bytes(text.as_bytes().to_vec()),
        encoding: Encoding::Utf8,
        delimiter: Delimiter::Comma,
    });
    wire.send(Request::Index);
    let seen = wire.recv_until(|r| matches!(r, Response::IndexDone { .. }));

    let header = seen.iter().find_map(|r| match r {
        Response::Header { bytes } => Some(bytes.clone()),
        _ => None,
    });
    assert_eq!(header.as_deref(), Some(b"id,name".as_slice()));

    let progress: Vec<(u64, u64)> = seen
        .iter()
        .filter_map(|r| match r {
            Response::IndexProgress {
                bytes_read,
                total_size,
            } => Some((*bytes_read, *total_size)),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert_eq!(progress.last(), Some(&(text.len() as u64, text.len() as u64)));

    match seen.last() {
        Some(Response::IndexDone { offsets, row_count }) => {
            let index = LineIndex::from_offsets(offsets.clone());
            assert_eq!(index.row_count(), *row_count);
            index
        }
        other => panic!("expected IndexDone, got {:?}", other),
    }
}

#[test]
fn test_index_then_load_window() {
    for mut wire in channels() {
        let index = init(&mut wire, NINE_ROWS);
        assert_eq!(index.row_count(), 9);

        let (start_offset, end_offset, count) = index.window_span(2, 3).unwrap();
        wire.send(Request::LoadWindow {
            id: 1,
            start_offset,
            end_offset,
            start_row: 2,
            count,
            column_count: 3,
        });

        match wire.recv() {
            Response::WindowDone {
                id,
                start_row,
                rows,
                byte_size,
            } => {
                assert_eq!((id, start_row), (1, 2));
                assert_eq!(
                    rows,
                    vec![
                        vec!["2", "2", "c"],
                        vec!["3", "3", "d"],
                        vec!["4", "4", "e"],
                    ]
                );
                assert_eq!(byte_size, end_offset - start_offset);
            }
            other => panic!("expected WindowDone, got {:?}", other),
        }
    }
}

#[test]
fn test_last_window_is_clipped() {
    for mut wire in channels() {
        let index = init(&mut wire, NINE_ROWS);
        let (start_offset, end_offset, count) = index.window_span(8, 4).unwrap();
        assert_eq!(count, 1);
        wire.send(Request::LoadWindow {
            id: 9,
            start_offset,
            end_offset,
            start_row: 8,
            count,
            column_count: 3,
        });
        let seen = wire.recv_until(|r| r.window_id() == Some(9));
        assert!(matches!(
            seen.last(),
            Some(Response::WindowDone { rows, .. }) if rows == &vec![vec!["8", "8", "i"]]
        ));
    }
}

#[test]
fn test_cancel_before_first_read() {
    let mut wire = Wire {
        inner: Box::new(InlineChannel::with_steps(4, 1)),
    };
    let index = init(&mut wire, NINE_ROWS);
    let (start_offset, end_offset, count) = index.window_span(0, 4).unwrap();

    for id in [1, 2] {
        wire.send(Request::LoadWindow {
            id,
            start_offset,
            end_offset,
            start_row: 0,
            count,
            column_count: 3,
        });
    }
    wire.send(Request::Cancel { ids: vec![1] });

    // Exactly one terminal reply per load
    assert_eq!(wire.recv(), Response::WindowCanceled { id: 1 });
    assert!(matches!(wire.recv(), Response::WindowDone { id: 2, .. }));
    assert!(wire.inner.try_recv().is_none());
}

#[test]
fn test_requests_before_init_fail() {
    let mut wire = Wire {
        inner: Box::new(InlineChannel::new(16)),
    };
    wire.send(Request::Index);
    assert!(matches!(wire.recv(), Response::IndexFailed { .. }));

    wire.send(Request::LoadWindow {
        id: 4,
        start_offset: 0,
        end_offset: 10,
        start_row: 0,
        count: 1,
        column_count: 2,
    });
    assert!(matches!(wire.recv(), Response::WindowFailed { id: 4, .. }));
}

#[test]
fn test_wire_shape() {
    let json = serde_json::to_value(Request::Cancel { ids: vec![3, 4] }).unwrap();
    assert_eq!(json, serde_json::json!({"type": "cancel", "ids": [3, 4]}));

    let json = serde_json::to_value(Response::IndexProgress {
        bytes_read: 10,
        total_size: 20,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "indexProgress", "bytesRead": 10, "totalSize": 20})
    );

    let json = serde_json::to_value(Request::LoadWindow {
        id: 7,
        start_offset: 8,
        end_offset: 40,
        start_row: 2,
        count: 4,
        column_count: 3,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "loadWindow",
            "id": 7,
            "startByteOffset": 8,
            "endByteOffset": 40,
            "startRow": 2,
            "rowCount": 4,
            "columnCount": 3
        })
    );
}
