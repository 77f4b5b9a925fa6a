//! # hx-push
//!
//! Server-push subscription and reconnection engine for hypermedia
//! frameworks: declarative attributes on document nodes become managed push
//! channels, and inbound named messages become content swaps or re-fired
//! triggers.
//!
//! The engine is host-agnostic. A framework implements the [`Host`] trait
//! (attribute reads, attachment checks, the swap primitive, event dispatch)
//! and calls two hooks: [`Engine::process_subtree`] when content lands and
//! [`Engine::before_node_removal`] when it knowingly removes a declaring
//! node. Everything else - connecting, capped-jitter reconnection, message
//! routing, lazy cleanup of nodes that silently left the document - runs on
//! the engine's own tasks.
//!
//! ## Modules
//!
//! | Module        | Purpose                                           |
//! |---------------|---------------------------------------------------|
//! | [`engine`]    | Subscription router, connection lifecycle         |
//! | [`transport`] | Transport abstraction, WebSocket and channel impls|
//! | [`host`]      | Host framework trait, lifecycle events            |
//! | [`backoff`]   | Reconnect delay policy                            |
//! | [`config`]    | Engine builder                                    |
//! | [`error`]     | Error taxonomy                                    |
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hx_push::{Engine, Host, NodeId};
//!
//! # fn demo(host: Arc<dyn Host>, root: NodeId) {
//! let engine = Engine::builder().build(host);
//! engine.process_subtree(root);
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod backoff;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod identifiers;
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::BackoffPolicy;
pub use config::EngineBuilder;
pub use engine::trigger::{TriggerSpec, TriggerTiming};
pub use engine::{ConnectionState, Engine};
pub use error::{Error, Result};
pub use host::events::LifecycleEvent;
pub use host::{Host, SwapSpec, SwapStyle};
pub use identifiers::{ConnectionId, NodeId, SubscriptionId};
pub use transport::channel::{ChannelTransport, ChannelTransportFactory};
pub use transport::ws::WebSocketFactory;
pub use transport::{
    CloseSignal, PushMessage, TransportEvent, TransportFactory, TransportHandle,
};
