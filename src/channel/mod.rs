//! Background execution channel
//!
//! A source talks to its channel only through [`Request`] and [`Response`]
//! messages. [`WorkerChannel`] runs the [`Engine`] on its own thread;
//! [`InlineChannel`] runs the same engine on the caller's thread a few chunks
//! per [`ExecutionChannel::pump`].

mod engine;
mod inline;
mod protocol;
mod worker;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use engine::Engine;
pub use inline::{InlineChannel, DEFAULT_STEPS_PER_PUMP};
pub use protocol::{Request, RequestId, Response};
pub use worker::WorkerChannel;

use crate::error::Result;

/// Where indexing and window loads run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Dedicated background thread
    #[default]
    Worker,
    /// Cooperative steps on the consumer's thread
    Inline,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Worker => write!(f, "worker"),
            ExecutionMode::Inline => write!(f, "inline"),
        }
    }
}

/// Message link between a source and whatever executes its I/O
pub trait ExecutionChannel: Send {
    fn send(&mut self, request: Request) -> Result<()>;

    /// Next reply, if one is ready
    fn try_recv(&mut self) -> Option<Response>;

    /// Wait up to `timeout` for the next reply
    fn recv_timeout(&mut self, timeout: Duration) -> Option<Response>;

    /// Give the channel a slice of the caller's time. Inline channels do
    /// their work here; threaded ones have nothing to do.
    fn pump(&mut self) {}

    fn mode(&self) -> ExecutionMode;
}

/// Open a channel for `mode`, falling back to inline execution when the
/// worker thread cannot be spawned
pub fn open_channel(mode: ExecutionMode, chunk_size: usize) -> Box<dyn ExecutionChannel> {
    match mode {
        ExecutionMode::Worker => match WorkerChannel::spawn(chunk_size) {
            Ok(worker) => Box::new(worker),
            Err(e) => {
                tracing::warn!("Failed to spawn worker thread, running inline: {}", e);
                Box::new(InlineChannel::new(chunk_size))
            }
        },
        ExecutionMode::Inline => Box::new(InlineChannel::new(chunk_size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_channel_modes() {
        assert_eq!(open_channel(ExecutionMode::Worker, 64).mode(), ExecutionMode::Worker);
        assert_eq!(open_channel(ExecutionMode::Inline, 64).mode(), ExecutionMode::Inline);
    }

    #[test]
    fn test_mode_names_match_serde() {
        for mode in [ExecutionMode::Worker, ExecutionMode::Inline] {
            let yaml = serde_yaml::to_string(&mode).unwrap();
            assert_eq!(yaml.trim(), mode.to_string());
        }
    }
}
