//! Host Adapter
//!
//! The renderer never touches a concrete output tree. Every mutation goes
//! through a [`HostAdapter`], a fixed set of five operations supplied by the
//! embedder: a DOM binding, a terminal UI, or the in-memory tree in
//! [`MemoryHost`] used by tests.
//!
//! Host nodes are referred to by opaque [`HostNode`] handles. A handle is
//! owned by exactly one mounted vnode.

mod memory;

pub use memory::{HostOp, MemoryHost};

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::shared::Value;

/// Tag under which text nodes are created.
pub const TEXT_TAG: &str = "#text";

/// Opaque handle to a node in the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HostNode(u64);

impl HostNode {
    /// Allocate a fresh, process-unique handle.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for HostNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for HostNode {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The operations the renderer needs from an output tree.
pub trait HostAdapter: Send + Sync {
    /// Create a new, unattached node for an element tag.
    fn create_element(&self, tag: &str) -> HostNode;

    /// Apply or remove one attribute or listener.
    ///
    /// A `next` of `None` or [`Value::Null`] means remove.
    fn patch_prop(&self, el: HostNode, key: &str, prev: Option<&Value>, next: Option<&Value>);

    /// Attach `el` under `parent`, before `anchor` if given, else at the end.
    ///
    /// Inserting an already attached node moves it.
    fn insert(&self, el: HostNode, parent: HostNode, anchor: Option<HostNode>);

    /// Detach `el` from its parent. No-op if already detached.
    fn remove(&self, el: HostNode);

    /// Replace all of `el`'s content with `text`.
    fn set_element_text(&self, el: HostNode, text: &str);

    /// Create a text node. Defaults to a [`TEXT_TAG`] element.
    fn create_text(&self, text: &str) -> HostNode {
        let el = self.create_element(TEXT_TAG);
        self.set_element_text(el, text);
        el
    }

    /// Update a text node's content.
    fn set_text(&self, el: HostNode, text: &str) {
        self.set_element_text(el, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_node_ids_are_unique() {
        let a = HostNode::new();
        let b = HostNode::new();
        assert_ne!(a, b);
        assert_eq!(HostNode::from(a.raw()), a);
    }

    #[test]
    fn default_text_methods_use_required_ops() {
        let host = MemoryHost::new();
        let text = host.create_text("hello");
        assert_eq!(host.tag(text).as_deref(), Some(TEXT_TAG));
        assert_eq!(host.text(text).as_deref(), Some("hello"));

        host.set_text(text, "bye");
        assert_eq!(host.text(text).as_deref(), Some("bye"));
    }
}
