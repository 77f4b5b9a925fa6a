//! Type-safe identifiers for engine entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time:
//!
//! - [`NodeId`] - host-assigned handle for a document node
//! - [`ConnectionId`] - engine-assigned handle for a push connection
//! - [`SubscriptionId`] - generated handle for a message subscription
//!
//! Node IDs are opaque to the engine; the host framework decides how its
//! elements map to them. Connection IDs are monotonic counters, subscription
//! IDs are random UUIDs, matching how the two are used (registry keys vs.
//! log correlation).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// NodeId
// ============================================================================

/// Handle for one node in the host document tree.
///
/// Assigned by the host framework; the engine only compares and stores it.
/// The engine never dereferences a `NodeId` itself - every fact about the
/// node (attributes, attachment, ancestry) comes from the [`Host`] trait.
///
/// [`Host`]: crate::host::Host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node ID from a raw host value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw host value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ============================================================================
// ConnectionId
// ============================================================================

/// Handle for one push connection owned by the engine.
///
/// Monotonically increasing per process; stable across reconnects of the
/// same connection (only the transport handle is replaced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Returns the next connection ID.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Handle for one message subscription.
///
/// Random UUID; used for log correlation when subscriptions attach and
/// lazily detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a fresh subscription ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_roundtrip() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id, NodeId::from(42));
        assert_eq!(id.to_string(), "node-42");
    }

    #[test]
    fn test_connection_id_monotonic() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_subscription_id_unique() {
        let a = SubscriptionId::generate();
        let b = SubscriptionId::generate();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("sub-"));
    }
}
