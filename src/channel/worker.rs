//! Engine on a dedicated thread

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::engine::Engine;
use super::protocol::{Request, Response};
use super::{ExecutionChannel, ExecutionMode};
use crate::error::{Result, VastrowError};

pub struct WorkerChannel {
    tx: Sender<Request>,
    rx: Receiver<Response>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerChannel {
    /// Start the worker thread
    pub fn spawn(chunk_size: usize) -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("vastrow-worker".to_string())
            .spawn(move || run(Engine::new(chunk_size), req_rx, resp_tx))?;

        Ok(Self {
            tx: req_tx,
            rx: resp_rx,
            handle: Some(handle),
        })
    }
}

/// Worker loop: block while idle, otherwise drain requests and do one chunk
fn run(mut engine: Engine, rx: Receiver<Request>, tx: Sender<Response>) {
    tracing::debug!("worker started");
    'outer: loop {
        if engine.is_idle() {
            match rx.recv() {
                Ok(request) => {
                    if !engine.handle(request) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }

        loop {
            match rx.try_recv() {
                Ok(request) => {
                    if !engine.handle(request) {
                        break 'outer;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'outer,
            }
        }

        engine.step();

        for response in engine.drain_responses() {
            if tx.send(response).is_err() {
                break 'outer;
            }
        }
    }
    tracing::debug!("worker stopped");
}

impl ExecutionChannel for WorkerChannel {
    fn send(&mut self, request: Request) -> Result<()> {
        self.tx.send(request).map_err(|_| VastrowError::Channel)
    }

    fn try_recv(&mut self) -> Option<Response> {
        self.rx.try_recv().ok()
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<Response> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Worker
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
