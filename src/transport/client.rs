//! WebSocket transport client.
//!
//! The engine exposes one control socket per process. Every operation here
//! opens its own short-lived connection: the peer may restart or hang at any
//! point during a long startup, so a broken connection is discarded rather
//! than repaired, and each retry starts from a fresh TCP handshake.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`TransportClient::connect_with_retries`] | startup probe: connect, send one message, retry with per-error backoff |
//! | [`TransportClient::send_fire_and_forget`] | one-shot best-effort command send |
//! | [`TransportClient::poll_until_state`] | query playback state until a target value is reported |
//!
//! # Backoff
//!
//! A connect timeout means the engine is alive but still starting (possibly
//! syncing assets), so the wait is long. Connection refused means the socket
//! is not listening yet, so the wait is short. Any other transport error is
//! logged and retried after the short wait.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{ControlMessage, StateReply};

// ============================================================================
// Constants
// ============================================================================

/// Default control endpoint of a locally launched engine.
pub const DEFAULT_CONTROL_URL: &str = "ws://localhost:4682/websocket";

/// Time allowed for a single connection attempt to complete.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait after a connect timeout; tuned for slow engine startup (asset sync
/// can take minutes).
const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(120);

/// Wait after a refused connection; the engine is expected to start
/// listening shortly.
const REFUSED_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Wait after any other transport error.
const ERROR_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default number of playback state queries before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 15;

/// Default wait between playback state queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

/// Stream type produced by the client connector.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection is open.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// A connection is open and usable.
    Connected,
}

// ============================================================================
// TransportClient
// ============================================================================

/// Client side of the engine's WebSocket control channel.
///
/// Holds the endpoint and the retry tuning; connections themselves are
/// created per operation and never reused across retries.
pub struct TransportClient {
    /// Validated control endpoint.
    url: String,
    /// Current transport state.
    state: Mutex<ConnectionState>,
    /// Per-attempt connect timeout.
    connect_timeout: Duration,
    /// Wait after a connect timeout.
    startup_retry_delay: Duration,
    /// Wait after a refused connection.
    refused_retry_delay: Duration,
    /// Wait after any other transport error.
    error_retry_delay: Duration,
}

// ============================================================================
// TransportClient - Construction
// ============================================================================

impl TransportClient {
    /// Creates a client for the given control endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Url::parse(&url).map_err(|e| Error::config(format!("invalid control URL '{url}': {e}")))?;
        Ok(Self {
            url,
            state: Mutex::new(ConnectionState::Disconnected),
            connect_timeout: CONNECT_TIMEOUT,
            startup_retry_delay: STARTUP_RETRY_DELAY,
            refused_retry_delay: REFUSED_RETRY_DELAY,
            error_retry_delay: ERROR_RETRY_DELAY,
        })
    }

    /// Overrides the per-attempt connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the wait after a connect timeout.
    #[inline]
    #[must_use]
    pub fn with_startup_retry_delay(mut self, delay: Duration) -> Self {
        self.startup_retry_delay = delay;
        self
    }

    /// Overrides the wait after a refused connection.
    #[inline]
    #[must_use]
    pub fn with_refused_retry_delay(mut self, delay: Duration) -> Self {
        self.refused_retry_delay = delay;
        self
    }

    /// Overrides the wait after other transport errors.
    #[inline]
    #[must_use]
    pub fn with_error_retry_delay(mut self, delay: Duration) -> Self {
        self.error_retry_delay = delay;
        self
    }

    /// Returns the control endpoint.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current transport state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }
}

// ============================================================================
// TransportClient - Operations
// ============================================================================

impl TransportClient {
    /// Connects, sends one message, and closes; retries with per-error
    /// backoff.
    ///
    /// Makes up to `1 + max_retries` attempts, each on a fresh connection.
    /// Returns the number of retries that were needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once every attempt has failed.
    /// This is a reported condition for the caller to act on, never a hang.
    pub async fn connect_with_retries(
        &self,
        message: &ControlMessage,
        max_retries: u32,
    ) -> Result<u32> {
        let wire = message.to_wire()?;

        for attempt in 0..=max_retries {
            match self.try_send_once(&wire).await {
                Ok(()) => {
                    info!(retries = attempt, "connect_with_retries finished");
                    return Ok(attempt);
                }
                Err(Error::ConnectionTimeout { timeout_ms }) => {
                    warn!(attempt, timeout_ms, "connect timed out, engine still starting");
                    sleep(self.startup_retry_delay).await;
                }
                Err(Error::ConnectionRefused) => {
                    warn!(attempt, "connection refused, engine not listening yet");
                    sleep(self.refused_retry_delay).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "connect attempt failed");
                    sleep(self.error_retry_delay).await;
                }
            }
        }

        Err(Error::retries_exhausted(max_retries + 1))
    }

    /// Sends one message on a short-lived connection, best effort.
    ///
    /// Failures are logged and returned; no retry is attempted here. Callers
    /// wrap with their own retry policy where one is wanted.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the single attempt.
    pub async fn send_fire_and_forget(&self, message: &ControlMessage) -> Result<()> {
        let wire = message.to_wire()?;
        self.try_send_once(&wire).await.inspect_err(|e| {
            warn!(error = %e, "fire-and-forget send failed");
        })
    }

    /// Polls the playback state until `target` is reported.
    ///
    /// Opens one connection and repeatedly sends a state query, reading the
    /// reply's `payload.state`. Returns `true` on a match, `false` once
    /// `max_attempts` queries are spent or the connection closes.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the initial connection cannot be
    /// opened, or [`Error::Json`] if the query cannot be serialized.
    pub async fn poll_until_state(
        &self,
        target: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<bool> {
        let wire = ControlMessage::state_query().to_wire()?;
        let mut stream = self.connect_once().await?;

        let mut remaining = max_attempts;
        while remaining > 0 {
            if let Err(e) = stream.send(Message::Text(wire.clone().into())).await {
                warn!(error = %e, "state query send failed");
                break;
            }

            match stream.next().await {
                Some(Ok(Message::Text(text))) => match StateReply::from_wire(&text) {
                    Ok(reply) if reply.state() == target => {
                        debug!(state = target, "target playback state reached");
                        let _ = stream.close(None).await;
                        self.set_state(ConnectionState::Disconnected);
                        return Ok(true);
                    }
                    Ok(reply) => {
                        debug!(state = reply.state(), "playback not finished");
                    }
                    Err(e) => {
                        warn!(error = %e, "unparsable state reply");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    debug!("state connection closed by peer");
                    break;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "state connection error");
                    break;
                }
                // Ignore Binary, Ping, Pong
                Some(Ok(_)) => {}
            }

            remaining -= 1;
            if remaining > 0 {
                sleep(interval).await;
            }
        }

        let _ = stream.close(None).await;
        self.set_state(ConnectionState::Disconnected);
        Ok(false)
    }
}

// ============================================================================
// TransportClient - Internal
// ============================================================================

impl TransportClient {
    /// Opens one connection within the connect timeout.
    async fn connect_once(&self) -> Result<WsStream> {
        self.set_state(ConnectionState::Connecting);

        match timeout(self.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((stream, _response))) => {
                self.set_state(ConnectionState::Connected);
                Ok(stream)
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                Err(Error::from_ws(e))
            }
            Err(_elapsed) => {
                self.set_state(ConnectionState::Disconnected);
                Err(Error::connection_timeout(
                    self.connect_timeout.as_millis() as u64
                ))
            }
        }
    }

    /// One full attempt: connect, send, close.
    async fn try_send_once(&self, wire: &str) -> Result<()> {
        let mut stream = self.connect_once().await?;

        let send_result = stream.send(Message::Text(wire.to_string().into())).await;
        let _ = stream.close(None).await;
        self.set_state(ConnectionState::Disconnected);

        send_result.map_err(Error::from_ws)
    }
}

// ============================================================================
// Tests
// ============================================================================
