//! Connection lifecycle driver.
//!
//! Each declared push channel gets one [`ConnectionHandle`] backed by a
//! spawned driver task. The task owns the transport handle and drives the
//! state machine:
//!
//! ```text
//! INIT ──► CONNECTING ──► OPEN
//!              ▲            │ transport error (owner attached)
//!              └────────────┘ backoff, replace transport
//!
//! any state ──► CLOSED    owner detached / close-trigger / teardown
//! ```
//!
//! Reconnection replaces the transport handle in place: the connection's
//! identity (id, owner, url, subscriptions) is stable across reconnects.
//! Retries are unbounded; only the delay is capped. `CLOSED` is final.
//!
//! Liveness checks are lazy: the driver asks the host whether the owner or
//! a subscriber is still in the document only when an event gives it a
//! reason to, never on a poll.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use url::Url;

use crate::backoff::BackoffPolicy;
use crate::engine::pipeline;
use crate::host::Host;
use crate::host::events::{self, LifecycleEvent};
use crate::identifiers::{ConnectionId, NodeId, SubscriptionId};
use crate::transport::{PushMessage, TransportEvent, TransportFactory, TransportHandle};

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable state of one push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Opening the transport, or waiting out a reconnect delay.
    Connecting,
    /// Transport established; messages flow.
    Open,
    /// Torn down permanently; never resurrected.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// How a subscriber consumes a matched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubscriptionKind {
    /// Swap the payload into the document via the message pipeline.
    Swap,
    /// Re-dispatch the message as an internal framework trigger.
    Relay,
}

/// One node's registered interest in one named message.
#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub id: SubscriptionId,
    pub node: NodeId,
    pub message: String,
    pub kind: SubscriptionKind,
}

// ============================================================================
// Commands and Shared State
// ============================================================================

enum ConnectionCommand {
    Subscribe(Subscription),
    Close,
}

#[derive(Debug)]
struct ConnectionShared {
    state: Mutex<ConnectionState>,
    retry_count: AtomicU32,
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Router-side handle to one connection driver.
///
/// Cheap to clone; all clones address the same driver task.
#[derive(Clone)]
pub(crate) struct ConnectionHandle {
    id: ConnectionId,
    owner: NodeId,
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    shared: Arc<ConnectionShared>,
}

impl ConnectionHandle {
    /// Returns the connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the owning node.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Returns `true` once the connection reached `CLOSED`.
    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Returns the consecutive failed-attempt count.
    pub fn retry_count(&self) -> u32 {
        self.shared.retry_count.load(Ordering::Relaxed)
    }

    /// Attaches a subscription.
    ///
    /// Returns `false` when the driver is gone; a subscription on a closed
    /// connection is meaningless and silently dropped.
    pub fn subscribe(&self, subscription: Subscription) -> bool {
        self.command_tx
            .send(ConnectionCommand::Subscribe(subscription))
            .is_ok()
    }

    /// Requests permanent teardown.
    pub fn close(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Close);
    }
}

// ============================================================================
// spawn
// ============================================================================

/// Spawns a connection driver and returns its handle.
pub(crate) fn spawn(
    owner: NodeId,
    url: Url,
    close_trigger: Option<String>,
    host: Arc<dyn Host>,
    factory: Arc<dyn TransportFactory>,
    backoff: BackoffPolicy,
) -> ConnectionHandle {
    let id = ConnectionId::next();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(ConnectionShared {
        state: Mutex::new(ConnectionState::Connecting),
        retry_count: AtomicU32::new(0),
    });

    let driver = ConnectionDriver {
        id,
        owner,
        url,
        close_trigger,
        host,
        factory,
        backoff,
        shared: Arc::clone(&shared),
        command_rx,
        subscriptions: Vec::new(),
        transport: None,
        retry_count: 0,
    };
    tokio::spawn(driver.run());

    ConnectionHandle {
        id,
        owner,
        command_tx,
        shared,
    }
}

// ============================================================================
// ConnectionDriver
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Closed,
}

enum Turn {
    Event(Option<TransportEvent>),
    Command(Option<ConnectionCommand>),
}

struct ConnectionDriver {
    id: ConnectionId,
    owner: NodeId,
    url: Url,
    close_trigger: Option<String>,
    host: Arc<dyn Host>,
    factory: Arc<dyn TransportFactory>,
    backoff: BackoffPolicy,
    shared: Arc<ConnectionShared>,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    /// Attachment order is delivery order.
    subscriptions: Vec<Subscription>,
    transport: Option<TransportHandle>,
    retry_count: u32,
}

impl ConnectionDriver {
    async fn run(mut self) {
        debug!(id = %self.id, owner = %self.owner, url = %self.url, "connection starting");

        let mut flow = self.connect().await;
        while flow == Flow::Continue {
            flow = self.turn().await;
        }

        self.shutdown();
    }

    /// Processes one transport event or one router command.
    async fn turn(&mut self) -> Flow {
        let turn = {
            let Some(transport) = self.transport.as_mut() else {
                return Flow::Closed;
            };
            tokio::select! {
                event = transport.next_event() => Turn::Event(event),
                command = self.command_rx.recv() => Turn::Command(command),
            }
        };

        match turn {
            Turn::Event(Some(TransportEvent::Open)) => self.handle_open(),
            Turn::Event(Some(TransportEvent::Message(message))) => self.handle_message(&message),
            Turn::Event(Some(TransportEvent::Error { message })) => {
                self.handle_error(message).await
            }
            Turn::Event(Some(TransportEvent::Closed)) | Turn::Event(None) => {
                self.handle_error("push channel closed".to_string()).await
            }
            Turn::Command(Some(ConnectionCommand::Subscribe(subscription))) => {
                trace!(
                    id = %self.id,
                    subscription = %subscription.id,
                    message = %subscription.message,
                    "subscription attached"
                );
                self.subscriptions.push(subscription);
                Flow::Continue
            }
            Turn::Command(Some(ConnectionCommand::Close)) | Turn::Command(None) => Flow::Closed,
        }
    }

    /// Creates the transport, retrying creation failures with backoff.
    async fn connect(&mut self) -> Flow {
        loop {
            if !self.host.is_attached(self.owner) {
                debug!(id = %self.id, "owner detached before connect");
                return Flow::Closed;
            }
            self.set_state(ConnectionState::Connecting);

            match self.factory.create(&self.url).await {
                Ok(transport) => {
                    self.transport = Some(transport);
                    return Flow::Continue;
                }
                Err(error) => {
                    warn!(id = %self.id, error = %error, "transport creation failed");
                    self.host.trigger_error(
                        self.owner,
                        events::ERROR,
                        json!({ "error": error.to_string(), "url": self.url.as_str() }),
                    );
                    if self.backoff_wait().await == Flow::Closed {
                        return Flow::Closed;
                    }
                }
            }
        }
    }

    fn handle_open(&mut self) -> Flow {
        debug!(id = %self.id, url = %self.url, "push channel open");
        self.retry_count = 0;
        self.shared.retry_count.store(0, Ordering::Relaxed);
        self.set_state(ConnectionState::Open);
        self.host.trigger(self.owner, LifecycleEvent::open(&self.url));
        Flow::Continue
    }

    /// Routes a message to every live matching subscription.
    fn handle_message(&mut self, message: &PushMessage) -> Flow {
        if self
            .close_trigger
            .as_deref()
            .is_some_and(|name| name == message.name)
        {
            debug!(id = %self.id, message = %message.name, "close trigger received");
            return Flow::Closed;
        }
        if !self.host.is_attached(self.owner) {
            debug!(id = %self.id, "owner detached, closing");
            return Flow::Closed;
        }

        let host = Arc::clone(&self.host);
        let connection = self.id;
        self.subscriptions.retain(|subscription| {
            if subscription.message != message.name {
                return true;
            }
            if !host.is_attached(subscription.node) {
                trace!(
                    id = %connection,
                    subscription = %subscription.id,
                    node = %subscription.node,
                    "subscriber left the document, detaching"
                );
                return false;
            }
            pipeline::deliver(host.as_ref(), subscription, message);
            true
        });

        Flow::Continue
    }

    /// Transport failed: report, then retry or close.
    async fn handle_error(&mut self, message: String) -> Flow {
        warn!(id = %self.id, error = %message, "push transport error");
        self.host.trigger_error(
            self.owner,
            events::ERROR,
            json!({ "error": message, "url": self.url.as_str() }),
        );

        if !self.host.is_attached(self.owner) {
            debug!(id = %self.id, "owner detached, closing");
            return Flow::Closed;
        }

        // old handle is discarded wholesale, never reused
        self.transport = None;
        self.set_state(ConnectionState::Connecting);
        if self.backoff_wait().await == Flow::Closed {
            return Flow::Closed;
        }
        self.connect().await
    }

    /// Waits out the computed delay, still honoring router commands.
    async fn backoff_wait(&mut self) -> Flow {
        let delay = self.backoff.delay(self.retry_count);
        debug!(
            id = %self.id,
            retry = self.retry_count,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
        self.retry_count += 1;
        self.shared.retry_count.store(self.retry_count, Ordering::Relaxed);
        self.sleep_with_commands(delay).await
    }

    async fn sleep_with_commands(&mut self, delay: Duration) -> Flow {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return Flow::Continue,
                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Subscribe(subscription)) => {
                        self.subscriptions.push(subscription);
                    }
                    Some(ConnectionCommand::Close) | None => return Flow::Closed,
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.shared.state.lock() = state;
    }

    /// Final teardown; the transport close primitive runs at most here.
    fn shutdown(&mut self) {
        self.set_state(ConnectionState::Closed);
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.subscriptions.clear();
        self.command_rx.close();
        debug!(id = %self.id, owner = %self.owner, "connection closed");
    }
}

// ============================================================================
// Tests
// ============================================================================
