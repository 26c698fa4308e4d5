//! Evaluation queue — single-flight ordering of execution requests.
//!
//! An interactive kernel runs one piece of code at a time, so concurrent
//! execute requests are serialized into a strict FIFO pipeline: at most one
//! request is dispatched to the engine, and the next one goes out only when
//! the adapter reports the terminal lifecycle event for the current one.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::engine::ExecRequest;
use crate::types::{Error, Result};

/// FIFO queue with at most one in-flight dispatch.
///
/// `ready == true` means no request is currently dispatched. Dispatch itself
/// is just a channel send; the queue never executes code.
#[derive(Debug)]
pub struct EvalQueue {
    queue: VecDeque<ExecRequest>,
    ready: bool,
    dispatch: mpsc::UnboundedSender<ExecRequest>,
}

impl EvalQueue {
    pub fn new(dispatch: mpsc::UnboundedSender<ExecRequest>) -> Self {
        Self {
            queue: VecDeque::new(),
            ready: true,
            dispatch,
        }
    }

    /// Append a request; dispatch it immediately if nothing is in flight.
    pub fn push(&mut self, request: ExecRequest) -> Result<()> {
        self.queue.push_back(request);
        if self.ready {
            self.advance()?;
        }
        Ok(())
    }

    /// Dispatch the next queued request, or become ready if none is waiting.
    ///
    /// Called by the adapter when the engine reports completion (success or
    /// failure) of the in-flight request.
    pub fn advance(&mut self) -> Result<()> {
        match self.queue.pop_front() {
            Some(request) => {
                tracing::debug!(parent_id = %request.parent_id, "dispatching execution request");
                self.dispatch
                    .send(request)
                    .map_err(|e| Error::dispatch(e.to_string()))?;
                self.ready = false;
                Ok(())
            }
            None => {
                self.ready = true;
                Ok(())
            }
        }
    }

    /// True when no request is dispatched and awaiting completion.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of requests waiting behind the in-flight one.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
