//! Engine configuration.
//!
//! Construction follows the builder pattern: pick a transport factory and a
//! backoff policy, then bind the engine to a host. Both knobs default
//! sensibly - a WebSocket factory and the standard capped-doubling backoff -
//! so the minimal embedding is `Engine::builder().build(host)`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::backoff::BackoffPolicy;
use crate::engine::Engine;
use crate::host::Host;
use crate::transport::TransportFactory;
use crate::transport::ws::WebSocketFactory;

// ============================================================================
// EngineBuilder
// ============================================================================

/// Fluent builder for [`Engine`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use hx_push::{BackoffPolicy, Engine};
/// # use hx_push::Host;
/// # fn demo(host: Arc<dyn Host>) {
/// let engine = Engine::builder()
///     .backoff(BackoffPolicy::new(
///         Duration::from_millis(250),
///         Duration::from_secs(30),
///     ))
///     .build(host);
/// # let _ = engine;
/// # }
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    factory: Option<Arc<dyn TransportFactory>>,
    backoff: BackoffPolicy,
}

impl EngineBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the transport factory new connections are created through.
    ///
    /// Defaults to [`WebSocketFactory`].
    #[must_use]
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets the reconnect backoff policy.
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Binds the engine to its host framework.
    #[must_use]
    pub fn build(self, host: Arc<dyn Host>) -> Engine {
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(WebSocketFactory));
        Engine::new(host, factory, self.backoff)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::host::mock::MockHost;
    use crate::transport::channel::ChannelTransportFactory;

    #[test]
    fn test_defaults() {
        let builder = EngineBuilder::new();
        assert!(builder.factory.is_none());
        assert_eq!(builder.backoff, BackoffPolicy::default());
    }

    #[tokio::test]
    async fn test_build_with_custom_parts() {
        let host = MockHost::new();
        let factory = Arc::new(ChannelTransportFactory::new());
        let engine = Engine::builder()
            .transport_factory(factory as Arc<dyn TransportFactory>)
            .backoff(BackoffPolicy::new(
                Duration::from_millis(100),
                Duration::from_secs(5),
            ))
            .build(host);

        assert_eq!(engine.connection_count(), 0);
    }
}
