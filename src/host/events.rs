//! Lifecycle events emitted toward the host framework.
//!
//! The engine reports what it does through the host's trigger dispatch: a
//! channel opening, a message about to swap, a message handled. Consumers on
//! the host side listen the same way they listen for any framework event;
//! only `push:beforeMessage` is cancellable.
//!
//! Error conditions travel separately through
//! [`Host::trigger_error`](crate::host::Host::trigger_error) under the names
//! in this module, with JSON metadata for diagnosis.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use url::Url;

use crate::transport::PushMessage;

// ============================================================================
// Event Names
// ============================================================================

/// Fired on the owner element when its push channel opens.
pub const OPEN: &str = "push:open";

/// Error event: the push channel failed (retried with backoff).
pub const ERROR: &str = "push:error";

/// Fired on a subscriber before a message swaps; cancellable.
pub const BEFORE_MESSAGE: &str = "push:beforeMessage";

/// Fired on a subscriber after a message was handled.
pub const MESSAGE: &str = "push:message";

/// Error event: a subscriber has no connection-owning ancestor.
pub const NO_SOURCE_ERROR: &str = "push:noSourceError";

/// Prefix under which relay subscriptions re-dispatch their messages.
pub const TRIGGER_PREFIX: &str = "push:";

// ============================================================================
// LifecycleEvent
// ============================================================================

/// One engine event dispatched on a host node.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    /// Event name, `push:`-prefixed.
    pub name: String,
    /// Whether a consumer may cancel the event.
    pub cancellable: bool,
    /// Event metadata.
    pub detail: Value,
}

impl LifecycleEvent {
    /// Channel-open notification for the owner element.
    #[must_use]
    pub fn open(url: &Url) -> Self {
        Self {
            name: OPEN.to_string(),
            cancellable: false,
            detail: json!({ "url": url.as_str() }),
        }
    }

    /// Cancellable pre-swap notification carrying the raw message.
    #[must_use]
    pub fn before_message(message: &PushMessage) -> Self {
        Self {
            name: BEFORE_MESSAGE.to_string(),
            cancellable: true,
            detail: message_detail(message),
        }
    }

    /// Post-handling notification carrying the raw message.
    #[must_use]
    pub fn message(message: &PushMessage) -> Self {
        Self {
            name: MESSAGE.to_string(),
            cancellable: false,
            detail: message_detail(message),
        }
    }

    /// Relay dispatch: the message re-emitted as an internal trigger name
    /// (`push:<message>`) for ordinary framework rules to consume.
    #[must_use]
    pub fn relay(message: &PushMessage) -> Self {
        Self {
            name: format!("{TRIGGER_PREFIX}{}", message.name),
            cancellable: false,
            detail: message_detail(message),
        }
    }
}

fn message_detail(message: &PushMessage) -> Value {
    json!({ "name": message.name, "data": message.data })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_message_cancellable() {
        let event = LifecycleEvent::before_message(&PushMessage::new("update", "hi"));
        assert_eq!(event.name, BEFORE_MESSAGE);
        assert!(event.cancellable);
        assert_eq!(event.detail["data"], "hi");
    }

    #[test]
    fn test_message_not_cancellable() {
        let event = LifecycleEvent::message(&PushMessage::new("update", "hi"));
        assert!(!event.cancellable);
    }

    #[test]
    fn test_relay_name() {
        let event = LifecycleEvent::relay(&PushMessage::new("refresh", ""));
        assert_eq!(event.name, "push:refresh");
    }

    #[test]
    fn test_open_detail() {
        let url = Url::parse("https://example.test/stream").unwrap();
        let event = LifecycleEvent::open(&url);
        assert_eq!(event.name, OPEN);
        assert_eq!(event.detail["url"], "https://example.test/stream");
    }
}
