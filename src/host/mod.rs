//! Host framework interface.
//!
//! The engine never touches a document directly. Everything it needs from
//! the hosting hypermedia framework - attribute reads, attachment checks,
//! the swap primitive, event dispatch - comes through the [`Host`] trait,
//! and the host drives the engine back through its lifecycle hooks
//! ([`Engine::process_subtree`], [`Engine::before_node_removal`]).
//!
//! [`Engine::process_subtree`]: crate::engine::Engine::process_subtree
//! [`Engine::before_node_removal`]: crate::engine::Engine::before_node_removal

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::host::events::LifecycleEvent;
use crate::identifiers::NodeId;

// ============================================================================
// Submodules
// ============================================================================

/// Lifecycle event names and payloads.
pub mod events;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// SwapStyle
// ============================================================================

/// How swapped content lands relative to the target node.
///
/// Mirrors the host framework's swap vocabulary; the host both parses the
/// attribute and executes the swap, the engine only ferries the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStyle {
    /// Replace the target's children.
    #[default]
    InnerHtml,
    /// Replace the target node itself.
    OuterHtml,
    /// Insert before the target node.
    BeforeBegin,
    /// Insert as the target's first child.
    AfterBegin,
    /// Insert as the target's last child.
    BeforeEnd,
    /// Insert after the target node.
    AfterEnd,
    /// Remove the target node, ignoring the payload.
    Delete,
    /// Keep the document untouched.
    None,
}

impl SwapStyle {
    /// Parses the framework's swap-attribute spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "innerHTML" => Some(Self::InnerHtml),
            "outerHTML" => Some(Self::OuterHtml),
            "beforebegin" => Some(Self::BeforeBegin),
            "afterbegin" => Some(Self::AfterBegin),
            "beforeend" => Some(Self::BeforeEnd),
            "afterend" => Some(Self::AfterEnd),
            "delete" => Some(Self::Delete),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Returns the attribute spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InnerHtml => "innerHTML",
            Self::OuterHtml => "outerHTML",
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
            Self::Delete => "delete",
            Self::None => "none",
        }
    }
}

// ============================================================================
// SwapSpec
// ============================================================================

/// Resolved swap specification for one subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSpec {
    /// Placement of the swapped content.
    pub style: SwapStyle,
}

impl SwapSpec {
    /// Creates a spec with the given style.
    #[inline]
    #[must_use]
    pub const fn new(style: SwapStyle) -> Self {
        Self { style }
    }
}

// ============================================================================
// Host
// ============================================================================

/// Services the hosting hypermedia framework provides to the engine.
///
/// Implementations must be cheap to call: the engine consults attachment and
/// attributes on every delivery decision (lazy cleanup does no polling, so
/// these calls *are* the liveness checks).
pub trait Host: Send + Sync {
    /// Returns `true` while `node` is part of the live document.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Reads an attribute on `node` as written, without `data-` fallback.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Returns the parent of `node`, if any.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Returns `root` and every node beneath it, in document order.
    fn descendants(&self, root: NodeId) -> Vec<NodeId>;

    /// Returns the page base URL connection targets resolve against.
    fn base_url(&self) -> Url;

    /// Resolves the swap target for content arriving at `node`.
    fn swap_target(&self, node: NodeId) -> NodeId;

    /// Resolves the swap specification declared on `node`.
    fn swap_spec(&self, node: NodeId) -> SwapSpec;

    /// Mutates the document with `content` at `target` per `spec`.
    fn swap(&self, target: NodeId, spec: &SwapSpec, content: &str);

    /// Runs `payload` through the installed extension transforms, in install
    /// order, returning the rewritten text.
    fn transform_payload(&self, node: NodeId, payload: String) -> String;

    /// Dispatches a lifecycle event on `node`.
    ///
    /// Returns `false` when a consumer cancelled a cancellable event.
    fn trigger(&self, node: NodeId, event: LifecycleEvent) -> bool;

    /// Surfaces a named error condition on `node` with JSON metadata.
    fn trigger_error(&self, node: NodeId, name: &str, detail: Value);

    /// Reads an attribute, falling back to its `data-` prefixed spelling.
    fn attribute_or_data(&self, node: NodeId, name: &str) -> Option<String> {
        self.attribute(node, name)
            .or_else(|| self.attribute(node, &format!("data-{name}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
