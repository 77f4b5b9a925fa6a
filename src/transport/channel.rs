//! In-process push transport.
//!
//! A [`ChannelTransport`] is the producer half of a transport created by
//! [`pair`]: tests and embedders feed open/message/error signals into it and
//! the paired [`TransportHandle`] delivers them to the connection driver.
//! Text sent outbound through the handle queues on the producer half, where
//! [`sent`](ChannelTransport::sent) drains it.
//!
//! [`ChannelTransportFactory`] records every transport it creates, so a test
//! can drive the newest channel after a reconnect and count how many times
//! the engine asked for one.
//!
//! # Example
//!
//! ```
//! use hx_push::transport::channel::pair;
//! use hx_push::transport::TransportEvent;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (mut handle, remote) = pair();
//! remote.open().unwrap();
//! remote.message("update", "hi").unwrap();
//!
//! assert_eq!(handle.next_event().await, Some(TransportEvent::Open));
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{CloseSignal, PushMessage, TransportEvent, TransportFactory, TransportHandle};

// ============================================================================
// pair
// ============================================================================

/// Creates a connected transport handle and its producer half.
#[must_use]
pub fn pair() -> (TransportHandle, ChannelTransport) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let signal = CloseSignal::new();
    let handle = TransportHandle::new(events_rx, outbound_tx, signal.clone());
    let remote = ChannelTransport {
        events: events_tx,
        outbound: Arc::new(Mutex::new(outbound_rx)),
        signal,
    };
    (handle, remote)
}

// ============================================================================
// ChannelTransport
// ============================================================================

/// Producer half of an in-process push transport.
///
/// Clonable; all clones feed the same handle.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    outbound: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    signal: CloseSignal,
}

impl ChannelTransport {
    /// Emits the open signal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the consumer side is gone.
    pub fn open(&self) -> Result<()> {
        self.emit(TransportEvent::Open)
    }

    /// Emits a named message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the consumer side is gone.
    pub fn message(&self, name: impl Into<String>, data: impl Into<String>) -> Result<()> {
        self.emit(TransportEvent::Message(PushMessage::new(name, data)))
    }

    /// Emits a transport error signal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the consumer side is gone.
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.emit(TransportEvent::Error {
            message: message.into(),
        })
    }

    /// Emits a remote-close signal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the consumer side is gone.
    pub fn closed(&self) -> Result<()> {
        self.emit(TransportEvent::Closed)
    }

    /// Emits a raw transport event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the consumer side is gone.
    pub fn emit(&self, event: TransportEvent) -> Result<()> {
        if self.signal.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.events.send(event).map_err(|_| Error::ConnectionClosed)
    }

    /// Drains the texts sent outbound through the paired handle so far.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        let mut outbound = self.outbound.lock();
        let mut texts = Vec::new();
        while let Ok(text) = outbound.try_recv() {
            texts.push(text);
        }
        texts
    }

    /// Returns `true` once the consumer closed or dropped its handle.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}

// ============================================================================
// ChannelTransportFactory
// ============================================================================

/// Factory producing in-process transports and recording each one.
///
/// With `auto_open` enabled (the default) every created transport queues the
/// open signal immediately, mimicking a channel that establishes instantly.
#[derive(Debug, Default)]
pub struct ChannelTransportFactory {
    transports: Mutex<Vec<ChannelTransport>>,
    auto_open: AtomicBool,
    fail_next: AtomicBool,
}

impl ChannelTransportFactory {
    /// Creates a factory with auto-open enabled.
    #[must_use]
    pub fn new() -> Self {
        let factory = Self::default();
        factory.auto_open.store(true, Ordering::SeqCst);
        factory
    }

    /// Enables or disables automatic open signals on creation.
    pub fn set_auto_open(&self, auto_open: bool) {
        self.auto_open.store(auto_open, Ordering::SeqCst);
    }

    /// Makes the next [`create`](TransportFactory::create) call fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Returns how many transports have been created.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.transports.lock().len()
    }

    /// Returns the producer half of the `index`-th created transport.
    #[must_use]
    pub fn transport(&self, index: usize) -> Option<ChannelTransport> {
        self.transports.lock().get(index).cloned()
    }

    /// Returns the producer half of the most recently created transport.
    #[must_use]
    pub fn latest(&self) -> Option<ChannelTransport> {
        self.transports.lock().last().cloned()
    }
}

#[async_trait]
impl TransportFactory for ChannelTransportFactory {
    async fn create(&self, _url: &Url) -> Result<TransportHandle> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::transport("simulated connect failure"));
        }

        let (handle, remote) = pair();
        if self.auto_open.load(Ordering::SeqCst) {
            // queued before anything the caller emits afterwards
            remote.open()?;
        }
        self.transports.lock().push(remote);
        Ok(handle)
    }
}

// ============================================================================
// Tests
// ============================================================================
