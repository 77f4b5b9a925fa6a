//! Message delivery pipeline.
//!
//! Once the router matched a message to a live subscription, delivery runs a
//! fixed sequence per subscriber:
//!
//! 1. the payload passes through the host's extension transform chain;
//! 2. a cancellable before-message event fires on the subscriber - any
//!    consumer may veto the delivery;
//! 3. the content lands in the document;
//! 4. a non-cancellable handled event records that delivery completed.
//!
//! A veto at step 2 skips steps 3 and 4 entirely for that subscriber; other
//! subscribers to the same message are unaffected. Relay subscriptions skip
//! steps 1-3 and re-fire the raw message as an internal trigger instead.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use crate::engine::connection::{Subscription, SubscriptionKind};
use crate::host::Host;
use crate::host::events::LifecycleEvent;
use crate::transport::PushMessage;

// ============================================================================
// Delivery
// ============================================================================

/// Delivers `message` to one subscription.
pub(crate) fn deliver(host: &dyn Host, subscription: &Subscription, message: &PushMessage) {
    match subscription.kind {
        SubscriptionKind::Swap => deliver_swap(host, subscription, message),
        SubscriptionKind::Relay => deliver_relay(host, subscription, message),
    }
}

fn deliver_swap(host: &dyn Host, subscription: &Subscription, message: &PushMessage) {
    let payload = host.transform_payload(subscription.node, message.data.clone());
    let transformed = PushMessage::new(message.name.clone(), payload);

    if !host.trigger(
        subscription.node,
        LifecycleEvent::before_message(&transformed),
    ) {
        trace!(
            subscription = %subscription.id,
            message = %transformed.name,
            "delivery vetoed"
        );
        return;
    }

    let target = host.swap_target(subscription.node);
    let spec = host.swap_spec(subscription.node);
    host.swap(target, &spec, &transformed.data);

    host.trigger(subscription.node, LifecycleEvent::message(&transformed));
}

/// Relay deliveries bypass the swap path entirely: no transform, no veto,
/// just the re-fired trigger and the handled event.
fn deliver_relay(host: &dyn Host, subscription: &Subscription, message: &PushMessage) {
    host.trigger(subscription.node, LifecycleEvent::relay(message));
    host.trigger(subscription.node, LifecycleEvent::message(message));
}

// ============================================================================
// Tests
// ============================================================================
