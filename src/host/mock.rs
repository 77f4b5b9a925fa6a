//! In-memory host for unit tests.
//!
//! Models just enough of a document tree to exercise the engine: parent and
//! child links, attributes, an attachment flag, text content mutated by the
//! swap primitive, and a recorder for every event and error the engine
//! dispatches.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use url::Url;

use crate::host::events::LifecycleEvent;
use crate::host::{Host, SwapSpec, SwapStyle};
use crate::identifiers::NodeId;

// ============================================================================
// Recorded
// ============================================================================

/// One lifecycle event the engine dispatched.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub node: NodeId,
    pub name: String,
    pub cancellable: bool,
    pub detail: Value,
}

// ============================================================================
// MockHost
// ============================================================================

struct MockNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: FxHashMap<String, String>,
    content: String,
    attached: bool,
}

struct Dom {
    nodes: FxHashMap<NodeId, MockNode>,
    next_id: u64,
}

/// In-memory document tree implementing [`Host`].
pub struct MockHost {
    dom: Mutex<Dom>,
    events: Mutex<Vec<Recorded>>,
    errors: Mutex<Vec<(NodeId, String, Value)>>,
    cancelled: Mutex<FxHashSet<String>>,
    uppercase_transform: AtomicBool,
}

impl MockHost {
    /// Creates a host with an attached root node.
    pub fn new() -> Arc<Self> {
        let root = NodeId::new(1);
        let mut nodes = FxHashMap::default();
        nodes.insert(
            root,
            MockNode {
                parent: None,
                children: Vec::new(),
                attrs: FxHashMap::default(),
                content: String::new(),
                attached: true,
            },
        );

        Arc::new(Self {
            dom: Mutex::new(Dom { nodes, next_id: 2 }),
            events: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            cancelled: Mutex::new(FxHashSet::default()),
            uppercase_transform: AtomicBool::new(false),
        })
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        NodeId::new(1)
    }

    /// Adds an attached child under `parent` with the given attributes.
    pub fn add_child(&self, parent: NodeId, attrs: &[(&str, &str)]) -> NodeId {
        let mut dom = self.dom.lock();
        let id = NodeId::new(dom.next_id);
        dom.next_id += 1;

        dom.nodes.insert(
            id,
            MockNode {
                parent: Some(parent),
                children: Vec::new(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                content: String::new(),
                attached: true,
            },
        );
        if let Some(parent_node) = dom.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Detaches `node` and everything beneath it from the document.
    pub fn detach(&self, node: NodeId) {
        let mut dom = self.dom.lock();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(entry) = dom.nodes.get_mut(&current) {
                entry.attached = false;
                pending.extend(entry.children.iter().copied());
            }
        }
        if let Some(parent) = dom.nodes.get(&node).and_then(|n| n.parent)
            && let Some(parent_node) = dom.nodes.get_mut(&parent)
        {
            parent_node.children.retain(|child| *child != node);
        }
    }

    /// Returns the node's current text content.
    pub fn content(&self, node: NodeId) -> String {
        self.dom
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.content.clone())
            .unwrap_or_default()
    }

    /// Returns every recorded lifecycle event.
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    /// Counts recorded events with the given name.
    pub fn event_count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name == name).count()
    }

    /// Returns every surfaced error event.
    pub fn errors(&self) -> Vec<(NodeId, String, Value)> {
        self.errors.lock().clone()
    }

    /// Counts surfaced error events with the given name.
    pub fn error_count(&self, name: &str) -> usize {
        self.errors.lock().iter().filter(|(_, n, _)| n == name).count()
    }

    /// Makes every future dispatch of `name` report cancellation.
    pub fn cancel_event(&self, name: &str) {
        self.cancelled.lock().insert(name.to_string());
    }

    /// Installs an uppercasing extension transform.
    pub fn enable_uppercase_transform(&self) {
        self.uppercase_transform.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Host Implementation
// ============================================================================

impl Host for MockHost {
    fn is_attached(&self, node: NodeId) -> bool {
        self.dom
            .lock()
            .nodes
            .get(&node)
            .is_some_and(|n| n.attached)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom
            .lock()
            .nodes
            .get(&node)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.lock().nodes.get(&node).and_then(|n| n.parent)
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let dom = self.dom.lock();
        let mut out = Vec::new();
        let mut pending = vec![root];
        while let Some(current) = pending.pop() {
            if let Some(node) = dom.nodes.get(&current) {
                out.push(current);
                // preserve document order under a stack walk
                pending.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn base_url(&self) -> Url {
        Url::parse("https://example.test/app/page").expect("mock base url")
    }

    fn swap_target(&self, node: NodeId) -> NodeId {
        self.attribute(node, "target")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(node, NodeId::new)
    }

    fn swap_spec(&self, node: NodeId) -> SwapSpec {
        let style = self
            .attribute(node, "swap")
            .and_then(|raw| SwapStyle::parse(&raw))
            .unwrap_or_default();
        SwapSpec::new(style)
    }

    fn swap(&self, target: NodeId, spec: &SwapSpec, content: &str) {
        let mut dom = self.dom.lock();
        if let Some(node) = dom.nodes.get_mut(&target) {
            match spec.style {
                SwapStyle::BeforeEnd => node.content.push_str(content),
                SwapStyle::Delete => {
                    node.attached = false;
                    node.content.clear();
                }
                SwapStyle::None => {}
                _ => node.content = content.to_string(),
            }
        }
    }

    fn transform_payload(&self, _node: NodeId, payload: String) -> String {
        if self.uppercase_transform.load(Ordering::SeqCst) {
            payload.to_uppercase()
        } else {
            payload
        }
    }

    fn trigger(&self, node: NodeId, event: LifecycleEvent) -> bool {
        let cancelled = event.cancellable && self.cancelled.lock().contains(&event.name);
        self.events.lock().push(Recorded {
            node,
            name: event.name,
            cancellable: event.cancellable,
            detail: event.detail,
        });
        !cancelled
    }

    fn trigger_error(&self, node: NodeId, name: &str, detail: Value) {
        self.errors.lock().push((node, name.to_string(), detail));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_walk_order() {
        let host = MockHost::new();
        let a = host.add_child(host.root(), &[]);
        let b = host.add_child(host.root(), &[]);
        let a1 = host.add_child(a, &[]);

        assert_eq!(host.descendants(host.root()), vec![host.root(), a, a1, b]);
    }

    #[test]
    fn test_detach_subtree() {
        let host = MockHost::new();
        let a = host.add_child(host.root(), &[]);
        let a1 = host.add_child(a, &[]);

        host.detach(a);
        assert!(!host.is_attached(a));
        assert!(!host.is_attached(a1));
        assert!(host.is_attached(host.root()));
    }

    #[test]
    fn test_swap_styles() {
        let host = MockHost::new();
        let node = host.add_child(host.root(), &[]);

        host.swap(node, &SwapSpec::new(SwapStyle::InnerHtml), "one");
        assert_eq!(host.content(node), "one");

        host.swap(node, &SwapSpec::new(SwapStyle::BeforeEnd), "+two");
        assert_eq!(host.content(node), "one+two");
    }

    #[test]
    fn test_cancelled_trigger() {
        let host = MockHost::new();
        let node = host.add_child(host.root(), &[]);
        host.cancel_event("push:beforeMessage");

        let event = LifecycleEvent::before_message(&crate::transport::PushMessage::new("x", "y"));
        assert!(!host.trigger(node, event));

        // non-cancellable dispatch of another name is unaffected
        let event = LifecycleEvent::message(&crate::transport::PushMessage::new("x", "y"));
        assert!(host.trigger(node, event));
    }
}
