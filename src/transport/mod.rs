//! Push transport layer.
//!
//! A transport is a long-lived channel delivering named, ordered text
//! messages plus open/error/close signals, with an outbound text path for
//! wire protocols that accept client frames. The engine owns one transport
//! handle per connection and replaces it wholesale on reconnect.
//!
//! The wire protocol is not this crate's concern: a [`TransportFactory`]
//! turns a URL into a [`TransportHandle`], and everything behind the handle
//! is opaque. The factory is explicit configuration on the engine builder,
//! so tests and alternative transports substitute cleanly.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | In-process transport pair for tests and embedders |
//! | [`ws`] | Default WebSocket transport |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Submodules
// ============================================================================

/// In-process transport pair for tests and embedders.
pub mod channel;

/// Default WebSocket transport.
pub mod ws;

// ============================================================================
// PushMessage
// ============================================================================

/// One named text message delivered by a push transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Server-side message tag subscriptions match on.
    pub name: String,
    /// Message payload text.
    pub data: String,
}

impl PushMessage {
    /// Creates a message.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Signal delivered by a transport to its owning connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is established and messages may follow.
    Open,
    /// A named message arrived.
    Message(PushMessage),
    /// The channel failed; the connection decides whether to retry.
    Error {
        /// Description of the failure.
        message: String,
    },
    /// The remote end closed the channel.
    Closed,
}

// ============================================================================
// CloseSignal
// ============================================================================

/// Shared close flag between a [`TransportHandle`] and its producer task.
///
/// Closing is one-way and idempotent: the first [`close`](Self::close) wins,
/// later calls are no-ops. Producer tasks wait on the signal and tear down
/// their end when it fires.
#[derive(Debug, Clone, Default)]
pub struct CloseSignal {
    closed: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CloseSignal {
    /// Creates an open signal.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the signal. Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::SeqCst);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    /// Returns `true` once the signal has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Resolves once the signal is closed.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}

// ============================================================================
// TransportHandle
// ============================================================================

/// Owned handle to one live push channel.
///
/// The connection driver consumes events from the handle and closes it on
/// teardown. Dropping the handle also closes it, so a handle replaced during
/// reconnect never leaks its producer task.
#[derive(Debug)]
pub struct TransportHandle {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    outbound: mpsc::UnboundedSender<String>,
    signal: CloseSignal,
}

impl TransportHandle {
    /// Creates a handle from its event receiver, outbound sender, and close
    /// signal.
    #[must_use]
    pub fn new(
        events: mpsc::UnboundedReceiver<TransportEvent>,
        outbound: mpsc::UnboundedSender<String>,
        signal: CloseSignal,
    ) -> Self {
        Self {
            events,
            outbound,
            signal,
        }
    }

    /// Receives the next transport event.
    ///
    /// Returns `None` when the producer side is gone, which the connection
    /// treats like a channel close.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Queues `text` for delivery to the remote end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] once the channel is closed or the
    /// producer side is gone.
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.outbound
            .send(text.into())
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the channel. Idempotent.
    pub fn close(&mut self) {
        if self.signal.close() {
            self.events.close();
        }
    }

    /// Returns `true` once the channel has been closed from this side.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// TransportFactory
// ============================================================================

/// Creates push transports for connection URLs.
///
/// The factory does not track the handles it creates; ownership transfers
/// entirely to the connection. Creation failures are recoverable - the
/// connection retries them on the same backoff schedule as transport errors.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Opens a push channel to `url`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the channel cannot be established.
    async fn create(&self, url: &Url) -> Result<TransportHandle>;
}

// ============================================================================
// Tests
// ============================================================================
