//! Messages exchanged with the execution channel
//!
//! Both enums serialize with an internal `type` tag so the same protocol can
//! run across a process boundary:
//!
//! ```json
//! {"type":"loadWindow","id":3,"startByteOffset":120,"endByteOffset":480,"startRow":4,"rowCount":4,"columnCount":3}
//! ```

use serde::{Deserialize, Serialize};

use crate::csv::Delimiter;
use crate::loader::{Encoding, SourceHandle};
use crate::source::Row;

/// Load request id, unique per source
pub type RequestId = u64;

/// Requests from a source to its execution channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// One-time setup; replaces any earlier source
    Init {
        source: SourceHandle,
        encoding: Encoding,
        delimiter: Delimiter,
    },
    /// Scan the source once for line offsets and the header
    Index,
    /// Read and parse rows `[start_row, start_row + count)` from the byte
    /// span `[start_offset, end_offset)`
    #[serde(rename_all = "camelCase")]
    LoadWindow {
        id: RequestId,
        #[serde(rename = "startByteOffset")]
        start_offset: u64,
        #[serde(rename = "endByteOffset")]
        end_offset: u64,
        start_row: u64,
        #[serde(rename = "rowCount")]
        count: u64,
        column_count: usize,
    },
    /// Abandon the listed loads
    Cancel { ids: Vec<RequestId> },
    /// Stop the worker
    Shutdown,
}

/// Replies from the execution channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    /// Sent after every scanned chunk
    #[serde(rename_all = "camelCase")]
    IndexProgress { bytes_read: u64, total_size: u64 },
    /// Raw header line bytes, terminator excluded
    Header { bytes: Vec<u8> },
    #[serde(rename_all = "camelCase")]
    IndexDone { offsets: Vec<u64>, row_count: u64 },
    /// The scan could not complete
    IndexFailed { message: String },
    #[serde(rename_all = "camelCase")]
    WindowDone {
        id: RequestId,
        start_row: u64,
        rows: Vec<Row>,
        byte_size: u64,
    },
    WindowCanceled { id: RequestId },
    /// A single window could not be read
    WindowFailed { id: RequestId, message: String },
}

impl Response {
    /// Id of the load this reply terminates, if it is a terminal window reply
    pub fn window_id(&self) -> Option<RequestId> {
        match self {
            Response::WindowDone { id, .. }
            | Response::WindowCanceled { id }
            | Response::WindowFailed { id, .. } => Some(*id),
            _ => None,
        }
    }
}
