//! Serialized submit queue.
//!
//! Every flush request goes through a bounded MPSC channel to a single
//! worker task, so at most one processing pass runs at a time. When the
//! backlog is full, [`Submitter::submit`] drops the request instead of
//! waiting. An optional ticker feeds the same channel on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::errors::{Result, UploadError};
use crate::recorder::EventRecorder;

/// Default backlog of pending passes.
pub const DEFAULT_MAX_PENDING: usize = 1000;

/// Request sent to the submit worker.
struct SubmitRequest {
    reply: Option<oneshot::Sender<Result<usize>>>,
}

/// Single-worker queue of processing passes.
pub struct Submitter {
    tx: mpsc::Sender<SubmitRequest>,
    worker_handle: JoinHandle<()>,
    ticker: Option<JoinHandle<()>>,
}

impl Submitter {
    /// Spawn the worker. `capacity` bounds the pending backlog, not
    /// counting the pass currently running.
    pub fn new(recorder: Arc<EventRecorder>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker_handle = tokio::spawn(submit_worker(rx, recorder));
        Self {
            tx,
            worker_handle,
            ticker: None,
        }
    }

    /// Queue a pass every `every`, first one `every` from now. Replaces any
    /// running ticker. Ticks that find the backlog full are dropped.
    pub fn start_auto_submit(&mut self, every: Duration) {
        self.stop_auto_submit();
        let tx = self.tx.clone();
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(tokio::spawn(async move {
            loop {
                let _ = interval.tick().await;
                match tx.try_send(SubmitRequest { reply: None }) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("submit queue full, skipping timed pass");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }));
        debug!(interval = ?every, "auto submit started");
    }

    /// Stop the ticker, if any.
    pub fn stop_auto_submit(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Queue a pass without waiting. Returns `false` if it was dropped.
    pub fn submit(&self) -> bool {
        match self.tx.try_send(SubmitRequest { reply: None }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    capacity = self.tx.max_capacity(),
                    "submit queue full, dropping request"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("submit worker closed, dropping request");
                false
            }
        }
    }

    /// Queue a pass behind everything already pending and wait for its
    /// result.
    pub async fn submit_and_wait(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SubmitRequest {
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| self.closed_error())?;

        reply_rx
            .await
            .map_err(|_| UploadError::WorkerClosed("reply dropped".into()))?
    }

    /// Requests waiting behind the running pass.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop accepting requests, let the backlog drain, and wait for the
    /// worker to exit.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            tx,
            worker_handle,
            ticker,
        } = self;
        if let Some(ticker) = ticker {
            ticker.abort();
            let _ = ticker.await;
        }
        drop(tx);
        worker_handle
            .await
            .map_err(|e| UploadError::WorkerClosed(e.to_string()))
    }

    fn closed_error(&self) -> UploadError {
        if self.worker_handle.is_finished() {
            UploadError::WorkerClosed("worker panicked or exited".into())
        } else {
            UploadError::WorkerClosed("channel closed".into())
        }
    }
}

/// Runs one pass per request, in arrival order.
async fn submit_worker(mut rx: mpsc::Receiver<SubmitRequest>, recorder: Arc<EventRecorder>) {
    while let Some(req) = rx.recv().await {
        let result = recorder.process_events().await;
        match &result {
            Ok(delivered) => debug!(delivered, "submit pass finished"),
            Err(e) => error!(error = %e, "submit pass failed"),
        }
        if let Some(reply) = req.reply {
            let _ = reply.send(result);
        }
    }
    debug!("submit worker exiting");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
