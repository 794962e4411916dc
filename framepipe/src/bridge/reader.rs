//! Engine side of the bridge.

use super::client::BridgeResponse;
use crate::component::{Component, FrameReader};
use crate::context::{ContextListener, ContextScope, TransactionContext, TransformContext};
use crate::errors::Result;
use crate::frame::Frame;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

/// A queued request.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) id: Uuid,
    pub(crate) frame: Frame,
    pub(crate) reply: oneshot::Sender<BridgeResponse>,
}

/// Stops a [`RequestReader`] from outside the engine.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Asks the reader to end the stream at its next poll.
    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Returns true once shutdown was requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Sends the finished record back to the caller when the transaction ends.
struct ResponseListener {
    request_id: Uuid,
    reply: Mutex<Option<oneshot::Sender<BridgeResponse>>>,
}

impl ContextListener for ResponseListener {
    fn on_end(&self, scope: ContextScope<'_>) {
        let ContextScope::Transaction(txn) = scope else {
            return;
        };
        let Some(reply) = self.reply.lock().take() else {
            return;
        };
        if reply
            .send(BridgeResponse::completed(self.request_id, txn))
            .is_err()
        {
            debug!(request_id = %self.request_id, "Caller stopped waiting; response dropped");
        }
    }
}

/// A reader whose records are frames submitted through a
/// [`RequestBridge`](super::RequestBridge).
///
/// The stream ends when shutdown is requested or every bridge handle is
/// dropped. Requests still queued at shutdown are dropped and their callers
/// see [`BridgeError::Closed`](crate::errors::BridgeError::Closed). The
/// stream has no natural last frame, so aggregators are of no use behind
/// this reader.
#[derive(Debug)]
pub struct RequestReader {
    receiver: mpsc::Receiver<Request>,
    poll_interval: Duration,
    shutdown: ShutdownHandle,
    finished: bool,
}

impl RequestReader {
    pub(super) fn new(receiver: mpsc::Receiver<Request>, poll_interval_ms: u64) -> Self {
        Self {
            receiver,
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            shutdown: ShutdownHandle::default(),
            finished: false,
        }
    }

    /// Returns a handle that ends this reader's stream.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Stops accepting requests and drops the queued ones, which releases
    /// their callers with `Closed`.
    fn drain_queue(&mut self) {
        self.receiver.close();
        let mut dropped = 0_usize;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Queued requests dropped");
        }
    }
}

impl Component for RequestReader {
    fn name(&self) -> &str {
        "RequestReader"
    }

    fn close(&mut self) -> Result<()> {
        self.drain_queue();
        Ok(())
    }
}

#[async_trait]
impl FrameReader for RequestReader {
    async fn read(
        &mut self,
        _context: &TransformContext,
        transaction: &mut TransactionContext,
    ) -> Result<Option<Frame>> {
        loop {
            if self.shutdown.is_requested() {
                debug!("Shutdown requested; ending request stream");
                self.finished = true;
                self.drain_queue();
                return Ok(None);
            }
            match tokio::time::timeout(self.poll_interval, self.receiver.recv()).await {
                Ok(Some(request)) => {
                    debug!(request_id = %request.id, row = transaction.row(), "Request dequeued");
                    transaction.add_listener(Arc::new(ResponseListener {
                        request_id: request.id,
                        reply: Mutex::new(Some(request.reply)),
                    }));
                    return Ok(Some(request.frame));
                }
                Ok(None) => {
                    debug!("All bridge handles dropped; ending request stream");
                    self.finished = true;
                    return Ok(None);
                }
                Err(_) => {}
            }
        }
    }

    fn eof(&self) -> bool {
        self.finished
    }
}
