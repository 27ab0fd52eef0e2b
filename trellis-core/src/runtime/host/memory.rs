//! In-Memory Host
//!
//! A [`HostAdapter`] that keeps the output tree in memory and records every
//! call it receives. Tests mount components into it and then assert on the
//! resulting markup or on the exact sequence of host operations.

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;

use super::{HostAdapter, HostNode, TEXT_TAG};
use crate::shared::{is_on, to_handler_key, Value};

/// One recorded host call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    CreateElement { node: HostNode, tag: String },
    PatchProp { node: HostNode, key: String, removed: bool },
    /// `moved` is set when the node was already attached somewhere.
    Insert {
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
        moved: bool,
    },
    Remove { node: HostNode },
    SetElementText { node: HostNode, text: String },
}

#[derive(Debug, Default)]
struct MemoryNode {
    tag: String,
    props: IndexMap<String, Value>,
    children: Vec<HostNode>,
    parent: Option<HostNode>,
    text: String,
}

#[derive(Default)]
struct MemoryTree {
    nodes: HashMap<HostNode, MemoryNode>,
    ops: Vec<HostOp>,
}

impl MemoryTree {
    fn detach(&mut self, el: HostNode) -> bool {
        let Some(parent) = self.nodes.get_mut(&el).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|c| *c != el);
        }
        true
    }
}

/// Host tree held in memory.
#[derive(Default)]
pub struct MemoryHost {
    tree: Mutex<MemoryTree>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node to mount into. Not recorded as an operation.
    pub fn create_root(&self) -> HostNode {
        let node = HostNode::new();
        self.tree.lock().nodes.insert(
            node,
            MemoryNode {
                tag: "root".to_string(),
                ..Default::default()
            },
        );
        node
    }

    /// Every operation recorded so far.
    pub fn ops(&self) -> Vec<HostOp> {
        self.tree.lock().ops.clone()
    }

    /// Forget recorded operations.
    pub fn clear_ops(&self) {
        self.tree.lock().ops.clear();
    }

    /// Number of inserts that moved an attached node.
    pub fn move_count(&self) -> usize {
        self.tree
            .lock()
            .ops
            .iter()
            .filter(|op| matches!(op, HostOp::Insert { moved: true, .. }))
            .count()
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.tree
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.tree.lock().nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn tag(&self, node: HostNode) -> Option<String> {
        self.tree.lock().nodes.get(&node).map(|n| n.tag.clone())
    }

    pub fn text(&self, node: HostNode) -> Option<String> {
        self.tree.lock().nodes.get(&node).map(|n| n.text.clone())
    }

    pub fn prop(&self, node: HostNode, key: &str) -> Option<Value> {
        self.tree
            .lock()
            .nodes
            .get(&node)
            .and_then(|n| n.props.get(key).cloned())
    }

    /// Markup of `node`'s children.
    pub fn inner_html(&self, node: HostNode) -> String {
        let tree = self.tree.lock();
        let mut out = String::new();
        if let Some(n) = tree.nodes.get(&node) {
            if n.children.is_empty() {
                out.push_str(&n.text);
            }
            for child in &n.children {
                write_node(&tree, *child, &mut out);
            }
        }
        out
    }

    /// Markup of `node` itself.
    pub fn serialize(&self, node: HostNode) -> String {
        let tree = self.tree.lock();
        let mut out = String::new();
        write_node(&tree, node, &mut out);
        out
    }

    /// Structured dump of the subtree at `node`.
    pub fn snapshot(&self, node: HostNode) -> serde_json::Value {
        let tree = self.tree.lock();
        snapshot_node(&tree, node)
    }

    /// Invoke the listener registered for `event` on `node`.
    ///
    /// Returns `None` when no listener is registered.
    pub fn dispatch(&self, node: HostNode, event: &str, args: &[Value]) -> Option<Value> {
        let handler = self.prop(node, &to_handler_key(event))?;
        let callback = handler.as_callback()?.clone();
        Some(callback.call(args))
    }
}

fn write_node(tree: &MemoryTree, node: HostNode, out: &mut String) {
    let Some(n) = tree.nodes.get(&node) else {
        return;
    };
    if n.tag == TEXT_TAG {
        out.push_str(&n.text);
        return;
    }

    let _ = write!(out, "<{}", n.tag);
    for (key, value) in &n.props {
        if is_on(key) || matches!(value, Value::Func(_)) {
            continue;
        }
        let _ = write!(out, " {key}=\"{value}\"");
    }
    out.push('>');
    if n.children.is_empty() {
        out.push_str(&n.text);
    }
    for child in &n.children {
        write_node(tree, *child, out);
    }
    let _ = write!(out, "</{}>", n.tag);
}

fn snapshot_node(tree: &MemoryTree, node: HostNode) -> serde_json::Value {
    let Some(n) = tree.nodes.get(&node) else {
        return serde_json::Value::Null;
    };
    let props: serde_json::Map<String, serde_json::Value> = n
        .props
        .iter()
        .map(|(k, v)| (k.clone(), value_to_json(v)))
        .collect();
    let children: Vec<serde_json::Value> = n
        .children
        .iter()
        .map(|c| snapshot_node(tree, *c))
        .collect();
    json!({
        "id": node,
        "tag": n.tag,
        "props": props,
        "text": n.text,
        "children": children,
    })
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Number(n) => json!(n),
        Value::Str(s) => json!(s.as_ref()),
        Value::Func(_) => json!("[function]"),
        other => json!(other.to_string()),
    }
}

impl HostAdapter for MemoryHost {
    fn create_element(&self, tag: &str) -> HostNode {
        let node = HostNode::new();
        let mut tree = self.tree.lock();
        tree.nodes.insert(
            node,
            MemoryNode {
                tag: tag.to_string(),
                ..Default::default()
            },
        );
        tree.ops.push(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn patch_prop(&self, el: HostNode, key: &str, _prev: Option<&Value>, next: Option<&Value>) {
        let mut tree = self.tree.lock();
        let removed = next.map_or(true, Value::is_null);
        if let Some(n) = tree.nodes.get_mut(&el) {
            match next {
                Some(value) if !removed => {
                    n.props.insert(key.to_string(), value.clone());
                }
                _ => {
                    n.props.shift_remove(key);
                }
            }
        }
        tree.ops.push(HostOp::PatchProp {
            node: el,
            key: key.to_string(),
            removed,
        });
    }

    fn insert(&self, el: HostNode, parent: HostNode, anchor: Option<HostNode>) {
        let mut tree = self.tree.lock();
        let moved = tree.detach(el);

        if let Some(p) = tree.nodes.get_mut(&parent) {
            let position = anchor.and_then(|a| p.children.iter().position(|c| *c == a));
            match position {
                Some(i) => p.children.insert(i, el),
                None => p.children.push(el),
            }
        }
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.parent = Some(parent);
        }
        tree.ops.push(HostOp::Insert {
            node: el,
            parent,
            anchor,
            moved,
        });
    }

    fn remove(&self, el: HostNode) {
        let mut tree = self.tree.lock();
        if tree.detach(el) {
            tree.ops.push(HostOp::Remove { node: el });
        }
    }

    fn set_element_text(&self, el: HostNode, text: &str) {
        let mut tree = self.tree.lock();
        let children = tree
            .nodes
            .get_mut(&el)
            .map(|n| {
                n.text = text.to_string();
                std::mem::take(&mut n.children)
            })
            .unwrap_or_default();
        for child in children {
            if let Some(c) = tree.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
        tree.ops.push(HostOp::SetElementText {
            node: el,
            text: text.to_string(),
        });
    }
}
