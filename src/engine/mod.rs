//! Subscription router and engine surface.
//!
//! The [`Engine`] is what a host framework holds: it scans subtrees for push
//! declarations, owns one connection per declaring node, and routes inbound
//! messages to subscriptions. Declarative surface:
//!
//! | Attribute       | On               | Meaning                                  |
//! |-----------------|------------------|------------------------------------------|
//! | `push-connect`  | owner element    | connection target URL                    |
//! | `push-close`    | owner element    | message name that closes the connection  |
//! | `push-swap`     | subscriber       | message names to swap into the document  |
//! | `push-trigger`  | subscriber       | `push:<name>` entries relay as triggers  |
//! | `trigger`       | subscriber       | fallback spelling of `push-trigger`      |
//!
//! Every attribute also reads through its `data-` prefixed spelling. A
//! subscriber finds its connection on itself or its nearest declaring
//! ancestor, fixed at attach time.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::json;
use tracing::{debug, trace, warn};

use crate::backoff::BackoffPolicy;
use crate::config::EngineBuilder;
use crate::engine::connection::{ConnectionHandle, Subscription, SubscriptionKind};
use crate::engine::trigger::TriggerSpec;
use crate::host::Host;
use crate::host::events;
use crate::identifiers::{NodeId, SubscriptionId};
use crate::transport::TransportFactory;

// ============================================================================
// Submodules
// ============================================================================

/// Per-connection lifecycle driver.
pub(crate) mod connection;
/// Per-subscription delivery pipeline.
pub(crate) mod pipeline;
/// Trigger and message-list attribute parsing.
pub mod trigger;
/// Connection URL resolution.
pub mod url;

pub use connection::ConnectionState;

// ============================================================================
// Attributes
// ============================================================================

/// Declares a connection target on the owner element.
pub const ATTR_CONNECT: &str = "push-connect";

/// Names the message that permanently closes the owner's connection.
pub const ATTR_CLOSE: &str = "push-close";

/// Subscribes an element to swap deliveries of the named messages.
pub const ATTR_SWAP: &str = "push-swap";

/// Engine-specific trigger attribute; `push:` entries relay.
pub const ATTR_PUSH_TRIGGER: &str = "push-trigger";

/// The host framework's generic trigger attribute, consulted when
/// [`ATTR_PUSH_TRIGGER`] is absent.
pub const ATTR_TRIGGER: &str = "trigger";

// ============================================================================
// Engine
// ============================================================================

/// Server-push subscription engine.
///
/// One instance serves a whole document. The host calls
/// [`process_subtree`](Self::process_subtree) after content lands and
/// [`before_node_removal`](Self::before_node_removal) before it is removed;
/// everything else happens on the engine's own tasks.
pub struct Engine {
    host: Arc<dyn Host>,
    factory: Arc<dyn TransportFactory>,
    backoff: BackoffPolicy,
    connections: Mutex<FxHashMap<NodeId, ConnectionHandle>>,
}

impl Engine {
    /// Starts building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn new(
        host: Arc<dyn Host>,
        factory: Arc<dyn TransportFactory>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            host,
            factory,
            backoff,
            connections: Mutex::new(FxHashMap::default()),
        }
    }

    /// Scans `root` and its subtree for push declarations.
    ///
    /// Safe to call repeatedly over the same content: a node that already
    /// owns a connection keeps it untouched, whatever its state. Called by
    /// the host after initial load and after every swap that adds content.
    pub fn process_subtree(&self, root: NodeId) {
        for node in self.host.descendants(root) {
            if self
                .host
                .attribute_or_data(node, ATTR_CONNECT)
                .is_some()
            {
                self.ensure_connection(node);
            }
            self.register_subscriptions(node);
        }
    }

    /// Closes the connection owned by `node`, if any.
    ///
    /// The host calls this before removing content it knows holds a
    /// declaration; lazy cleanup covers removals the host never announces.
    pub fn before_node_removal(&self, node: NodeId) {
        let handle = self.connections.lock().remove(&node);
        if let Some(handle) = handle {
            debug!(owner = %node, id = %handle.id(), "owner leaving the document");
            handle.close();
        }
    }

    /// Returns the number of connections ever registered and still tracked.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Returns the state of the connection owned by `owner`.
    #[must_use]
    pub fn connection_state(&self, owner: NodeId) -> Option<ConnectionState> {
        self.connections.lock().get(&owner).map(ConnectionHandle::state)
    }

    /// Closes every connection. The engine stays usable; new declarations
    /// processed afterwards connect normally.
    pub fn shutdown(&self) {
        let handles: Vec<ConnectionHandle> = self.connections.lock().drain().map(|(_, h)| h).collect();
        debug!(count = handles.len(), "shutting down push connections");
        for handle in handles {
            handle.close();
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Spawns the connection declared on `owner` unless one already exists.
    fn ensure_connection(&self, owner: NodeId) {
        let mut connections = self.connections.lock();
        if connections.contains_key(&owner) {
            trace!(owner = %owner, "connection already registered");
            return;
        }

        let Some(value) = self.host.attribute_or_data(owner, ATTR_CONNECT) else {
            return;
        };
        let url = match url::resolve_push_url(&self.host.base_url(), &value) {
            Ok(url) => url,
            Err(error) => {
                warn!(owner = %owner, value, error = %error, "bad connection target");
                self.host.trigger_error(
                    owner,
                    events::ERROR,
                    json!({ "error": error.to_string(), "value": value }),
                );
                return;
            }
        };
        let close_trigger = self.host.attribute_or_data(owner, ATTR_CLOSE);

        let handle = connection::spawn(
            owner,
            url,
            close_trigger,
            Arc::clone(&self.host),
            Arc::clone(&self.factory),
            self.backoff,
        );
        debug!(owner = %owner, id = %handle.id(), "connection registered");
        connections.insert(owner, handle);
    }

    /// Attaches the subscriptions declared on `node` to its source connection.
    fn register_subscriptions(&self, node: NodeId) {
        let mut wanted: Vec<(String, SubscriptionKind)> = Vec::new();

        if let Some(value) = self.host.attribute_or_data(node, ATTR_SWAP) {
            for name in trigger::parse_message_names(&value) {
                wanted.push((name, SubscriptionKind::Swap));
            }
        }
        let trigger_value = self
            .host
            .attribute_or_data(node, ATTR_PUSH_TRIGGER)
            .or_else(|| self.host.attribute_or_data(node, ATTR_TRIGGER));
        if let Some(value) = trigger_value {
            for spec in trigger::parse_trigger_specs(&value) {
                if let TriggerSpec::Push { message } = spec {
                    wanted.push((message, SubscriptionKind::Relay));
                }
            }
        }
        if wanted.is_empty() {
            return;
        }

        let connections = self.connections.lock();
        let Some(handle) = self.find_source(node, &connections) else {
            warn!(node = %node, "subscriber has no connection-owning ancestor");
            self.host.trigger_error(
                node,
                events::NO_SOURCE_ERROR,
                json!({ "node": node.raw() }),
            );
            return;
        };
        for (message, kind) in wanted {
            let subscription = Subscription {
                id: SubscriptionId::generate(),
                node,
                message,
                kind,
            };
            trace!(
                node = %node,
                source = %handle.owner(),
                subscription = %subscription.id,
                message = %subscription.message,
                "subscribing"
            );
            if !handle.subscribe(subscription) {
                debug!(
                    node = %node,
                    source = %handle.owner(),
                    "subscription dropped, connection driver gone"
                );
            }
        }
    }

    /// Walks from `node` up to the nearest self-or-ancestor owning a
    /// registered connection.
    ///
    /// A node that declares a connection target but registered nothing (its
    /// URL failed to resolve) does not terminate the walk; a subscriber
    /// beneath it still binds to the next owning ancestor.
    fn find_source<'a>(
        &self,
        node: NodeId,
        connections: &'a FxHashMap<NodeId, ConnectionHandle>,
    ) -> Option<&'a ConnectionHandle> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if let Some(handle) = connections.get(&candidate) {
                return Some(handle);
            }
            if self
                .host
                .attribute_or_data(candidate, ATTR_CONNECT)
                .is_some()
            {
                trace!(
                    node = %node,
                    declarer = %candidate,
                    "declarer owns no connection, walking past"
                );
            }
            current = self.host.parent(candidate);
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
