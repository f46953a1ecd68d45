//! Request correlation.
//!
//! Every outgoing call gets a fresh numeric id and an entry in the pending
//! table. The entry owns a deadline timer; whichever of response, deadline,
//! send failure or rejection gets to the entry first removes it, and the
//! removal is what settles the caller. An id is never handed out twice, so a
//! late response or a stale timer can only miss.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use toolwire_protocol::{JsonRpcResponse, JsonRpcResponsePayload, RequestId};
use tracing::{debug, trace};

use crate::error::{ClientError, ClientResult};

/// Receiving end handed to the caller of [`Correlator::register`].
pub(crate) type ResponseReceiver = oneshot::Receiver<ClientResult<Value>>;

#[derive(Debug)]
struct PendingRequest {
    method: String,
    tx: oneshot::Sender<ClientResult<Value>>,
    timer: Option<AbortHandle>,
}

impl PendingRequest {
    fn settle(self, outcome: ClientResult<Value>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        // Receiver gone means the caller stopped waiting.
        let _ = self.tx.send(outcome);
    }
}

#[derive(Debug)]
pub(crate) struct Correlator {
    next_id: AtomicU64,
    pending: Arc<DashMap<RequestId, PendingRequest>>,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Fresh identifier, unique for the lifetime of this correlator.
    pub(crate) fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed) as i64)
    }

    /// Track `id` until it is resolved or `timeout` elapses.
    ///
    /// Must be called before the request is sent so a fast response cannot
    /// arrive ahead of its entry.
    pub(crate) fn register(&self, id: RequestId, method: &str, timeout: Duration) -> ResponseReceiver {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest {
                method: method.to_owned(),
                tx,
                timer: None,
            },
        );

        let pending = Arc::clone(&self.pending);
        let timer_id = id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some((_, entry)) = pending.remove(&timer_id) {
                debug!(id = %timer_id, method = %entry.method, ?timeout, "request timed out");
                let method = entry.method.clone();
                entry.settle(Err(ClientError::Timeout { method, timeout }));
            }
        })
        .abort_handle();

        match self.pending.get_mut(&id) {
            Some(mut entry) => entry.timer = Some(timer),
            // Already settled; the timer has nothing left to do.
            None => timer.abort(),
        }
        rx
    }

    /// Route a response to its waiting caller.
    pub(crate) fn resolve(&self, response: JsonRpcResponse) {
        let Some((_, entry)) = self.pending.remove(&response.id) else {
            trace!(id = %response.id, "response for unknown or retired request dropped");
            return;
        };
        trace!(id = %response.id, method = %entry.method, "response matched");
        let outcome = match response.payload {
            JsonRpcResponsePayload::Success { result } => Ok(result),
            JsonRpcResponsePayload::Error { error } => Err(ClientError::from(error)),
        };
        entry.settle(outcome);
    }

    /// Forget `id` without settling it (the caller already has its error).
    pub(crate) fn discard(&self, id: &RequestId) {
        if let Some((_, entry)) = self.pending.remove(id)
            && let Some(timer) = entry.timer
        {
            timer.abort();
        }
    }

    /// Fail every outstanding request with `error`.
    pub(crate) fn reject_all(&self, error: &ClientError) {
        let ids: Vec<RequestId> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        if !ids.is_empty() {
            debug!(count = ids.len(), %error, "rejecting pending requests");
        }
        for id in ids {
            if let Some((_, entry)) = self.pending.remove(&id) {
                entry.settle(Err(error.clone()));
            }
        }
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for Correlator {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            if let Some(timer) = &entry.timer {
                timer.abort();
            }
        }
    }
}
