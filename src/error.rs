//! Error types for indexing and window loading
//!
//! Cancellation is deliberately absent: a superseded load is answered with a
//! `WindowCanceled` reply on the execution channel and dropped silently.

use thiserror::Error;

/// Errors that can occur while indexing or reading a byte source
#[derive(Error, Debug)]
pub enum VastrowError {
    /// IO error from std::io
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The index scan could not complete; fatal to the source
    #[error("Indexing failed: {0}")]
    Indexing(String),

    /// A single window could not be read; the window stays absent
    #[error("Window {start_row} failed to load: {message}")]
    WindowLoad { start_row: u64, message: String },

    /// Bytes could not be decoded with the declared encoding
    #[error("Decode error: {0}")]
    Decode(String),

    /// The execution channel is gone (worker thread exited)
    #[error("Execution channel closed")]
    Channel,

    /// Configuration could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// A byte or row range was empty or reversed
    #[error("Invalid range {start}..{end}")]
    InvalidRange { start: u64, end: u64 },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, VastrowError>;

impl From<serde_yaml::Error> for VastrowError {
    fn from(e: serde_yaml::Error) -> Self {
        VastrowError::Config(e.to_string())
    }
}
