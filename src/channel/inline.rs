//! Engine on the caller's thread

use std::time::{Duration, Instant};

use super::engine::Engine;
use super::protocol::{Request, Response};
use super::{ExecutionChannel, ExecutionMode};
use crate::error::Result;

/// Chunk reads performed per [`ExecutionChannel::pump`]
pub const DEFAULT_STEPS_PER_PUMP: usize = 8;

pub struct InlineChannel {
    engine: Engine,
    steps_per_pump: usize,
}

impl InlineChannel {
    pub fn new(chunk_size: usize) -> Self {
        Self::with_steps(chunk_size, DEFAULT_STEPS_PER_PUMP)
    }

    pub fn with_steps(chunk_size: usize, steps_per_pump: usize) -> Self {
        Self {
            engine: Engine::new(chunk_size),
            steps_per_pump: steps_per_pump.max(1),
        }
    }
}

impl ExecutionChannel for InlineChannel {
    fn send(&mut self, request: Request) -> Result<()> {
        self.engine.handle(request);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Response> {
        self.engine.pop_response()
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<Response> {
        let deadline = Instant::now() + timeout;
        while !self.engine.has_responses() {
            if !self.engine.step() || Instant::now() >= deadline {
                break;
            }
        }
        self.engine.pop_response()
    }

    fn pump(&mut self) {
        for _ in 0..self.steps_per_pump {
            if !self.engine.step() {
                break;
            }
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Inline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::Delimiter;
    use crate::loader::{Encoding, SourceHandle};

    fn channel(data: &str, chunk: usize, steps: usize) -> InlineChannel {
        let mut channel = InlineChannel::with_steps(chunk, steps);
        channel
            .send(Request::Init {
                source: SourceHandle::from_bytes(data.as_bytes().to_vec()),
                encoding: Encoding::Utf8,
                delimiter: Delimiter::Comma,
            })
            .unwrap();
        channel
    }

    #[test]
    fn test_pump_is_bounded() {
        let mut channel = channel("h\n1\n2\n3\n4\n5\n6\n7\n", 2, 3);
        channel.send(Request::Index).unwrap();
        channel.pump();
        let mut replies = Vec::new();
        while let Some(r) = channel.try_recv() {
            replies.push(r);
        }
        // three chunks of two bytes: header plus three progress replies
        assert_eq!(
            replies
                .iter()
                .filter(|r| matches!(r, Response::IndexProgress { .. }))
                .count(),
            3
        );
        assert!(!replies
            .iter()
            .any(|r| matches!(r, Response::IndexDone { .. })));
    }

    #[test]
    fn test_recv_timeout_runs_until_reply() {
        let mut channel = channel("h\n1\n", 64, 1);
        channel
            .send(Request::LoadWindow {
                id: 2,
                start_offset: 2,
                end_offset: 4,
                start_row: 0,
                count: 1,
                column_count: 2,
            })
            .unwrap();
        let reply = channel.recv_timeout(Duration::from_secs(1));
        assert!(matches!(reply, Some(Response::WindowDone { id: 2, .. })));
        assert!(channel.recv_timeout(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn test_cancel_before_pump() {
        let mut channel = channel("h\n1\n", 64, 4);
        channel
            .send(Request::LoadWindow {
                id: 9,
                start_offset: 2,
                end_offset: 4,
                start_row: 0,
                count: 1,
                column_count: 2,
            })
            .unwrap();
        channel.send(Request::Cancel { ids: vec![9] }).unwrap();
        channel.pump();
        assert_eq!(channel.try_recv(), Some(Response::WindowCanceled { id: 9 }));
        assert_eq!(channel.try_recv(), None);
    }
}
