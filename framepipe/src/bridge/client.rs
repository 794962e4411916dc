//! Caller side of the bridge.

use super::reader::{Request, RequestReader};
use crate::context::TransactionContext;
use crate::errors::{BridgeError, Result};
use crate::frame::Frame;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Bridge sizing and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Requests that may wait for the engine.
    pub capacity: usize,
    /// How long a caller waits to enqueue, and then again for the response.
    pub timeout_ms: u64,
    /// How often the reader wakes to check for shutdown.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            timeout_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

impl BridgeConfig {
    /// Sets the queue capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the enqueue and response timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the reader poll interval.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The finished record returned to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    /// The request ID.
    pub request_id: Uuid,
    /// Row the engine assigned, absent on timeout.
    pub row: Option<u64>,
    /// The working frame at the end of the record.
    pub working: Frame,
    /// The target frame, if a mapping stage built one.
    pub target: Option<Frame>,
    /// The record error, if any.
    pub error: Option<String>,
    /// True if the caller stopped waiting before the engine answered.
    pub timed_out: bool,
}

impl BridgeResponse {
    /// Captures a finished transaction.
    #[must_use]
    pub fn completed(request_id: Uuid, transaction: &TransactionContext) -> Self {
        Self {
            request_id,
            row: Some(transaction.row()),
            working: transaction.working().clone(),
            target: transaction.target().cloned(),
            error: transaction.error_message().map(str::to_string),
            timed_out: false,
        }
    }

    /// A synthetic response for a request the engine did not answer in time.
    ///
    /// `working` holds the request frame as submitted.
    #[must_use]
    pub fn timed_out(request_id: Uuid, frame: Frame, timeout_ms: u64) -> Self {
        let error = BridgeError::Timeout {
            request_id: request_id.to_string(),
            timeout_ms,
        };
        Self {
            request_id,
            row: None,
            working: frame,
            target: None,
            error: Some(error.to_string()),
            timed_out: true,
        }
    }

    /// Returns true if the record completed without error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none() && !self.timed_out
    }

    /// Returns the target frame if built, otherwise the working frame.
    #[must_use]
    pub fn output(&self) -> &Frame {
        self.target.as_ref().unwrap_or(&self.working)
    }
}

/// Submits frames to an engine driven by a [`RequestReader`].
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Debug, Clone)]
pub struct RequestBridge {
    sender: mpsc::Sender<Request>,
    config: BridgeConfig,
}

impl RequestBridge {
    pub(super) const fn new(sender: mpsc::Sender<Request>, config: BridgeConfig) -> Self {
        Self { sender, config }
    }

    /// Returns the bridge configuration.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Submits one frame and waits for the engine to finish it.
    ///
    /// Fails with [`BridgeError::QueueFull`] if the frame cannot be queued
    /// within the timeout and [`BridgeError::Closed`] if the reader is gone.
    /// A response that does not arrive within the timeout yields a
    /// [`BridgeResponse::timed_out`] response; the engine still finishes
    /// the record.
    pub async fn submit(&self, frame: Frame) -> Result<BridgeResponse> {
        let request_id = Uuid::new_v4();
        let (reply, response) = oneshot::channel();
        let request = Request {
            id: request_id,
            frame: frame.clone(),
            reply,
        };

        self.sender
            .send_timeout(request, self.config.timeout())
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => {
                    warn!(%request_id, capacity = self.config.capacity, "Request queue full");
                    BridgeError::QueueFull {
                        capacity: self.config.capacity,
                    }
                }
                SendTimeoutError::Closed(_) => BridgeError::Closed,
            })?;
        debug!(%request_id, "Request queued");

        match tokio::time::timeout(self.config.timeout(), response).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(BridgeError::Closed.into()),
            Err(_) => {
                warn!(%request_id, timeout_ms = self.config.timeout_ms, "Request timed out");
                Ok(BridgeResponse::timed_out(request_id, frame, self.config.timeout_ms))
            }
        }
    }

    /// Submits frames concurrently; results keep the input order.
    pub async fn submit_all(&self, frames: impl IntoIterator<Item = Frame>) -> Vec<Result<BridgeResponse>> {
        join_all(frames.into_iter().map(|frame| self.submit(frame))).await
    }
}

/// Creates a connected bridge and reader.
#[must_use]
pub fn channel(config: BridgeConfig) -> (RequestBridge, RequestReader) {
    let (sender, receiver) = mpsc::channel(config.capacity.max(1));
    (
        RequestBridge::new(sender, config),
        RequestReader::new(receiver, config.poll_interval_ms),
    )
}
