//! Connection lifecycle.
//!
//! The manager owns at most one live session. Each session is tagged with a
//! generation number; its reader task reports the close under that number,
//! and a close whose generation no longer matches the live link is a close
//! the client asked for (or one that was already superseded) and is ignored.
//!
//! ```text
//! connect() ──▶ establish() ──▶ Link{generation, sink, reader}
//!                                   │
//!               reader task ◀───────┘  frames ─▶ codec ─▶ correlator / events
//!                    │
//!                    ▼ close frame read, or stream ended
//!             handle_closed(generation)
//!                    │
//!         ┌──────────┴──────────┐
//!   policy says retry      policy says stop
//!   reconnect_loop()       reject pending calls
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use toolwire_protocol::{InboundMessage, JsonRpcCodec};
use toolwire_transport_traits::{
    CloseFrame, ConnectionState, Connector, Endpoint, FrameSink, FrameStream, InboundFrame,
    OutboundFrame, TransportError, close_code,
};
use tracing::{debug, error, info, trace, warn};

use super::correlator::Correlator;
use super::reconnect::{ReconnectPolicy, ReconnectState};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{ClientEvent, EventBus};

/// How long an operation may wait for an open connection, fixed when the
/// operation starts so that waiting again after a lost link does not extend it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadyBound {
    bound: Duration,
    deadline: Instant,
}

/// Why a frame was not written.
#[derive(Debug)]
pub(crate) enum SendFailure {
    /// The link was gone or closing and nothing was written. Carries the
    /// link generation when there was one.
    Retired(Option<u64>),
    /// The transport failed the write.
    Failed(ClientError),
}

struct Link {
    generation: u64,
    sink: Arc<AsyncMutex<FrameSink>>,
    reader: JoinHandle<()>,
}

pub(crate) struct ConnectionManager {
    config: ClientConfig,
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    codec: JsonRpcCodec,
    correlator: Correlator,
    events: EventBus,
    state: watch::Sender<ConnectionState>,
    policy: Mutex<ReconnectPolicy>,
    link: Mutex<Option<Link>>,
    generation: AtomicU64,
    // Generation of the link in `link`, 0 when there is none. Readable
    // without the link lock.
    live_generation: AtomicU64,
    // Serializes connect, disconnect and reconnect attempts.
    connect_lock: AsyncMutex<()>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.endpoint.url)
            .field("state", &*self.state.borrow())
            .field("reconnect", &self.policy.lock().state())
            .field("pending", &self.correlator.pending_count())
            .finish()
    }
}

impl ConnectionManager {
    pub(crate) fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint: config.endpoint(),
            policy: Mutex::new(ReconnectPolicy::from_config(&config)),
            events: EventBus::new(config.event_capacity),
            config,
            connector,
            codec: JsonRpcCodec::new(),
            correlator: Correlator::new(),
            state,
            link: Mutex::new(None),
            generation: AtomicU64::new(0),
            live_generation: AtomicU64::new(0),
            connect_lock: AsyncMutex::new(()),
            reconnect_task: Mutex::new(None),
        }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn codec(&self) -> &JsonRpcCodec {
        &self.codec
    }

    pub(crate) fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn reconnect_state(&self) -> ReconnectState {
        self.policy.lock().state()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state().is_connected()
    }

    /// Open a connection unless one is already open.
    pub(crate) async fn connect(self: &Arc<Self>) -> ClientResult<()> {
        let _guard = self.connect_lock.lock().await;
        if self.is_open() {
            trace!(url = %self.endpoint.url, "already connected");
            return Ok(());
        }
        self.cancel_reconnect();
        self.policy.lock().reset();
        self.establish().await
    }

    /// Close the connection on purpose: no `Closed` event, no reconnect.
    pub(crate) async fn disconnect(&self) -> ClientResult<()> {
        self.cancel_reconnect();
        let _guard = self.connect_lock.lock().await;
        // A close may have scheduled a retry while we waited for the lock.
        self.cancel_reconnect();
        self.policy.lock().reset();

        let link = {
            let mut link = self.link.lock();
            self.live_generation.store(0, Ordering::Release);
            let taken = link.take();
            let state = if taken.is_some() {
                ConnectionState::Disconnecting
            } else {
                ConnectionState::Disconnected
            };
            self.state.send_replace(state);
            taken
        };
        let Some(Link {
            sink, mut reader, ..
        }) = link
        else {
            self.correlator.reject_all(&ClientError::NotConnected);
            return Ok(());
        };

        debug!(url = %self.endpoint.url, "closing connection");

        let close_timeout = self.config.close_timeout();
        let handshake = async {
            let close = OutboundFrame::Close(CloseFrame::normal("client disconnect"));
            if let Err(error) = sink.lock().await.send(close).await {
                debug!(%error, "close frame not delivered");
            }
            // The reader ends once the peer confirms.
            let _ = (&mut reader).await;
        };
        if tokio::time::timeout(close_timeout, handshake).await.is_err() {
            warn!(url = %self.endpoint.url, ?close_timeout, "close not confirmed, dropping connection");
            reader.abort();
        }

        self.state.send_replace(ConnectionState::Disconnected);
        self.correlator.reject_all(&ClientError::NotConnected);
        info!(url = %self.endpoint.url, "disconnected");
        Ok(())
    }

    /// Write one text frame on the live connection.
    ///
    /// Returns the generation of the link the frame went out on.
    pub(crate) async fn send_text(&self, text: String) -> Result<u64, SendFailure> {
        let link = self
            .link
            .lock()
            .as_ref()
            .map(|link| (link.generation, Arc::clone(&link.sink)));
        let Some((generation, sink)) = link else {
            return Err(SendFailure::Retired(None));
        };
        let mut sink = sink.lock().await;
        match sink.send(OutboundFrame::Text(text)).await {
            Ok(()) => Ok(generation),
            Err(TransportError::ConnectionLost(reason)) => {
                debug!(generation, %reason, "connection closing, frame not written");
                Err(SendFailure::Retired(Some(generation)))
            }
            Err(error) => {
                warn!(url = %self.endpoint.url, %error, "send failed");
                Err(SendFailure::Failed(ClientError::Transport(error)))
            }
        }
    }

    /// Resolve once `generation` is no longer the live link.
    pub(crate) async fn wait_retired(&self, generation: Option<u64>) {
        let Some(generation) = generation else {
            return;
        };
        let mut rx = self.state.subscribe();
        // Every retirement publishes a state change after clearing the generation.
        let _ = rx
            .wait_for(|_| self.live_generation.load(Ordering::Acquire) != generation)
            .await;
    }

    /// Readiness bound for an operation starting now.
    pub(crate) fn ready_bound(&self, requested: Duration) -> ReadyBound {
        let bound = self.config.ready_bound(requested);
        ReadyBound {
            bound,
            deadline: Instant::now() + bound,
        }
    }

    /// Wait until the connection is open.
    ///
    /// Never starts a connection attempt itself: it only waits for one that
    /// is in progress or scheduled, and gives up as soon as the policy is
    /// exhausted.
    pub(crate) async fn wait_ready(&self, ready: ReadyBound) -> ClientResult<()> {
        if self.is_open() {
            return Ok(());
        }
        if !self.config.reconnect || self.reconnect_state() == ReconnectState::Exhausted {
            return Err(ClientError::NotConnected);
        }

        trace!(bound = ?ready.bound, "waiting for connection");
        let mut rx = self.state.subscribe();
        let opened = async move {
            rx.wait_for(|state| {
                state.is_connected() || self.reconnect_state() == ReconnectState::Exhausted
            })
            .await
            .map(|state| state.is_connected())
            .unwrap_or(false)
        };
        match tokio::time::timeout_at(ready.deadline, opened).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ClientError::NotConnected),
            Err(_) => Err(ClientError::ReconnectTimeout {
                waited: ready.bound,
            }),
        }
    }

    async fn establish(self: &Arc<Self>) -> ClientResult<()> {
        self.state.send_replace(ConnectionState::Connecting);
        debug!(url = %self.endpoint.url, "opening connection");

        let session = match self.connector.connect(&self.endpoint).await {
            Ok(session) => session,
            Err(error) => {
                self.state.send_replace(ConnectionState::Disconnected);
                warn!(url = %self.endpoint.url, %error, "connection failed");
                let error = ClientError::Transport(error);
                self.events.emit_error(error.clone());
                return Err(error);
            }
        };

        let (sink, stream) = session.into_parts();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        {
            // The reader cannot report a close before the link is in place.
            let mut link = self.link.lock();
            let reader = tokio::spawn(Self::read_loop(Arc::downgrade(self), generation, stream));
            *link = Some(Link {
                generation,
                sink: Arc::new(AsyncMutex::new(sink)),
                reader,
            });
            self.live_generation.store(generation, Ordering::Release);
            self.policy.lock().on_open();
            self.state.send_replace(ConnectionState::Connected);
            self.events.emit(ClientEvent::Open);
        }
        info!(url = %self.endpoint.url, generation, "connected");
        Ok(())
    }

    async fn read_loop(manager: Weak<Self>, generation: u64, mut stream: FrameStream) {
        let mut close = None;

        while let Some(frame) = stream.next().await {
            let Some(this) = manager.upgrade() else {
                return;
            };
            match frame {
                Ok(InboundFrame::Text(text)) => this.handle_inbound(&text),
                Ok(InboundFrame::Close(frame)) => {
                    trace!(generation, ?frame, "close frame received");
                    close = Some(frame.unwrap_or_else(|| CloseFrame::new(close_code::NO_STATUS, "")));
                    break;
                }
                Err(error) => {
                    warn!(generation, %error, "receive failed");
                    this.events.emit_error(ClientError::Transport(error));
                }
            }
        }

        let Some(this) = manager.upgrade() else {
            return;
        };
        let Some(frame) = close else {
            this.handle_closed(generation, CloseFrame::abnormal(""));
            return;
        };

        // Nothing can be written once the peer's close is read, so the link
        // is retired before the handshake finishes.
        let close_timeout = this.config.close_timeout();
        this.handle_closed(generation, frame);
        drop(this);

        // Keep reading so the close reply gets flushed.
        let drain = async {
            while let Some(frame) = stream.next().await {
                trace!(generation, ?frame, "frame after close ignored");
            }
        };
        if tokio::time::timeout(close_timeout, drain).await.is_err() {
            debug!(generation, "peer did not end the connection after closing");
        }
    }

    fn handle_inbound(&self, text: &str) {
        match self.codec.decode(text) {
            Ok(InboundMessage::Response(response)) => self.correlator.resolve(response),
            Ok(InboundMessage::Notification(notification)) => {
                trace!(method = %notification.method, "notification received");
                self.events.emit(ClientEvent::Notification { notification });
            }
            Err(error) => {
                warn!(%error, "inbound message rejected");
                self.events.emit_error(ClientError::Protocol(error));
            }
        }
    }

    fn handle_closed(self: &Arc<Self>, generation: u64, frame: CloseFrame) {
        let retry = {
            let mut link = self.link.lock();
            if link.as_ref().map(|link| link.generation) != Some(generation) {
                trace!(generation, "close of a retired connection ignored");
                return;
            }
            *link = None;
            self.live_generation.store(0, Ordering::Release);
            let retry = self.policy.lock().on_close(frame.code);
            self.state.send_replace(ConnectionState::Disconnected);
            retry
        };

        info!(url = %self.endpoint.url, code = frame.code, reason = %frame.reason, "connection closed");
        self.events.emit(ClientEvent::Closed {
            code: frame.code,
            reason: frame.reason,
        });

        match retry {
            Some(delay) => {
                debug!(?delay, "reconnect scheduled");
                let task = tokio::spawn(Self::reconnect_loop(Arc::downgrade(self), delay));
                *self.reconnect_task.lock() = Some(task);
            }
            None => {
                if self.reconnect_state() == ReconnectState::Exhausted {
                    error!(url = %self.endpoint.url, "reconnection attempts exhausted");
                }
                self.correlator.reject_all(&ClientError::NotConnected);
            }
        }
    }

    async fn reconnect_loop(manager: Weak<Self>, mut delay: Duration) {
        loop {
            tokio::time::sleep(delay).await;
            let Some(this) = manager.upgrade() else {
                return;
            };
            let _guard = this.connect_lock.lock().await;
            if this.is_open() {
                return;
            }

            let attempt = this.policy.lock().attempts();
            info!(url = %this.endpoint.url, attempt, "reconnecting");
            if this.establish().await.is_ok() {
                return;
            }

            let next = this.policy.lock().on_attempt_failed();
            match next {
                Some(next) => delay = next,
                None => {
                    error!(url = %this.endpoint.url, attempts = attempt, "reconnection attempts exhausted");
                    // Readiness waiters re-check the policy on this change.
                    this.state.send_replace(ConnectionState::Disconnected);
                    this.correlator.reject_all(&ClientError::NotConnected);
                    return;
                }
            }
        }
    }

    fn cancel_reconnect(&self) {
        if let Some(task) = self.reconnect_task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = self.reconnect_task.get_mut().take() {
            task.abort();
        }
        if let Some(link) = self.link.get_mut().take() {
            link.reader.abort();
        }
    }
}
