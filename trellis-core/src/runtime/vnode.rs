//! Virtual Nodes
//!
//! A [`VNode`] describes what should exist in the host tree: an element, a
//! text node, a fragment of siblings, or a component. The renderer compares
//! an old vnode tree with a new one and applies the difference.
//!
//! # Shape Flags
//!
//! Each vnode classifies itself and its children in a [`ShapeFlags`]
//! bitmask at construction, so the renderer can pick a mount or patch path
//! without re-inspecting the payload.
//!
//! # Ownership
//!
//! A vnode's type, props, children, and key are immutable once built. The
//! host node (`el`) is filled in when the vnode is mounted, and a component
//! vnode keeps a weak back-link to its instance. The renderer owns the
//! instance itself.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::component::{Component, ComponentInstance, WeakInstance};
use super::host::HostNode;
use super::slots::RawSlots;
use crate::shared::{Object, ShapeFlags, Value};

/// What a vnode renders as.
#[derive(Clone)]
pub enum VNodeType {
    /// A host element with the given tag.
    Element(Arc<str>),
    /// A run of siblings with no wrapper node.
    Fragment,
    /// A text node.
    Text,
    Component(Arc<Component>),
}

impl PartialEq for VNodeType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Text, VNodeType::Text) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "Element({tag})"),
            VNodeType::Fragment => f.write_str("Fragment"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Component(c) => write!(f, "Component({})", c.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Arc::from(tag))
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(Arc::from(tag))
    }
}

impl From<Arc<Component>> for VNodeType {
    fn from(component: Arc<Component>) -> Self {
        VNodeType::Component(component)
    }
}

impl From<&Arc<Component>> for VNodeType {
    fn from(component: &Arc<Component>) -> Self {
        VNodeType::Component(component.clone())
    }
}

/// Identity of a vnode among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VNodeKey {
    Str(Arc<str>),
    Int(i64),
}

impl VNodeKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(VNodeKey::Str(s.clone())),
            Value::Number(n) if n.fract() == 0.0 => Some(VNodeKey::Int(*n as i64)),
            Value::Number(n) => Some(VNodeKey::Str(Arc::from(n.to_string()))),
            _ => None,
        }
    }
}

/// Content of a vnode.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(Arc<str>),
    Array(Vec<VNode>),
    /// Named slots handed to a component.
    Slots(RawSlots),
}

impl Children {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> &[VNode] {
        match self {
            Children::Array(items) => items,
            _ => &[],
        }
    }

    pub fn as_slots(&self) -> Option<&RawSlots> {
        match self {
            Children::Slots(slots) => Some(slots),
            _ => None,
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::None => f.write_str("None"),
            Children::Text(t) => write!(f, "Text({t:?})"),
            Children::Array(items) => f.debug_list().entries(items).finish(),
            Children::Slots(slots) => write!(f, "Slots({:?})", slots.names()),
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(Arc::from(text))
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(Arc::from(text))
    }
}

impl From<Vec<VNode>> for Children {
    fn from(items: Vec<VNode>) -> Self {
        Children::Array(items)
    }
}

impl From<VNode> for Children {
    fn from(item: VNode) -> Self {
        Children::Array(vec![item])
    }
}

impl From<RawSlots> for Children {
    fn from(slots: RawSlots) -> Self {
        Children::Slots(slots)
    }
}

/// A node of the virtual tree.
///
/// Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct VNode(Arc<VNodeInner>);

struct VNodeInner {
    ty: VNodeType,
    props: Option<Object>,
    children: Children,
    shape_flag: ShapeFlags,
    key: Option<VNodeKey>,
    el: RwLock<Option<HostNode>>,
    /// End marker of a mounted fragment.
    anchor: RwLock<Option<HostNode>>,
    component: RwLock<Option<WeakInstance>>,
}

fn shape_flag_for(ty: &VNodeType, children: &Children) -> ShapeFlags {
    let mut flag = match ty {
        VNodeType::Element(_) => ShapeFlags::ELEMENT,
        VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
        VNodeType::Fragment | VNodeType::Text => ShapeFlags::empty(),
    };

    match children {
        Children::Text(_) => flag |= ShapeFlags::TEXT_CHILDREN,
        Children::Array(_) => flag |= ShapeFlags::ARRAY_CHILDREN,
        Children::Slots(_) if flag.contains(ShapeFlags::STATEFUL_COMPONENT) => {
            flag |= ShapeFlags::SLOT_CHILDREN
        }
        _ => {}
    }
    flag
}

impl VNode {
    pub fn new(ty: VNodeType, props: Option<Object>, children: Children) -> Self {
        let shape_flag = shape_flag_for(&ty, &children);
        let key = props
            .as_ref()
            .and_then(|p| p.get("key"))
            .and_then(|k| VNodeKey::from_value(&k));

        Self(Arc::new(VNodeInner {
            ty,
            props,
            children,
            shape_flag,
            key,
            el: RwLock::new(None),
            anchor: RwLock::new(None),
            component: RwLock::new(None),
        }))
    }

    pub fn ty(&self) -> &VNodeType {
        &self.0.ty
    }

    pub fn props(&self) -> Option<&Object> {
        self.0.props.as_ref()
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    pub fn shape_flag(&self) -> ShapeFlags {
        self.0.shape_flag
    }

    pub fn key(&self) -> Option<&VNodeKey> {
        self.0.key.as_ref()
    }

    /// Host node this vnode is mounted as.
    ///
    /// For a fragment this is its empty start marker; for a component, the
    /// `el` of the tree it rendered.
    pub fn el(&self) -> Option<HostNode> {
        *self.0.el.read()
    }

    pub(crate) fn set_el(&self, el: Option<HostNode>) {
        *self.0.el.write() = el;
    }

    /// Empty end marker of a mounted fragment. Its children are inserted
    /// before it.
    pub fn anchor(&self) -> Option<HostNode> {
        *self.0.anchor.read()
    }

    pub(crate) fn set_anchor(&self, anchor: Option<HostNode>) {
        *self.0.anchor.write() = anchor;
    }

    /// The instance rendering this vnode, if it is a mounted component.
    pub fn component(&self) -> Option<ComponentInstance> {
        self.0.component.read().as_ref().and_then(WeakInstance::upgrade)
    }

    pub(crate) fn set_component(&self, instance: &ComponentInstance) {
        *self.0.component.write() = Some(instance.downgrade());
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("type", &self.0.ty)
            .field("key", &self.0.key)
            .field("shape_flag", &self.0.shape_flag)
            .field("children", &self.0.children)
            .field("el", &self.el())
            .field("anchor", &self.anchor())
            .finish()
    }
}

/// Build a vnode.
pub fn create_vnode(
    ty: impl Into<VNodeType>,
    props: impl Into<Option<Object>>,
    children: impl Into<Children>,
) -> VNode {
    VNode::new(ty.into(), props.into(), children.into())
}

/// Build a vnode. Shorthand for [`create_vnode`].
pub fn h(
    ty: impl Into<VNodeType>,
    props: impl Into<Option<Object>>,
    children: impl Into<Children>,
) -> VNode {
    create_vnode(ty, props, children)
}

/// Build a text vnode.
pub fn create_text_vnode(text: impl Into<String>) -> VNode {
    VNode::new(VNodeType::Text, None, Children::from(text.into()))
}

/// Build a fragment holding `children` as siblings.
pub fn fragment(children: Vec<VNode>) -> VNode {
    VNode::new(VNodeType::Fragment, None, Children::Array(children))
}

/// Whether two vnodes describe the same node: equal type and equal key.
pub fn is_same_vnode(a: &VNode, b: &VNode) -> bool {
    a.ty() == b.ty() && a.key() == b.key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    #[test]
    fn element_shape_flags() {
        let text = h("div", None, "hi");
        assert_eq!(
            text.shape_flag(),
            ShapeFlags::ELEMENT | ShapeFlags::TEXT_CHILDREN
        );

        let nested = h("div", None, vec![h("p", None, ())]);
        assert_eq!(
            nested.shape_flag(),
            ShapeFlags::ELEMENT | ShapeFlags::ARRAY_CHILDREN
        );
        assert_eq!(nested.children().as_array().len(), 1);
    }

    #[test]
    fn component_with_slots_gets_slot_flag() {
        let comp = Component::new("Foo").build();
        let vnode = h(&comp, None, RawSlots::new().slot("default", |_| h("p", None, "x").into()));
        assert!(vnode.shape_flag().contains(ShapeFlags::STATEFUL_COMPONENT));
        assert!(vnode.shape_flag().contains(ShapeFlags::SLOT_CHILDREN));
    }

    #[test]
    fn key_comes_from_props() {
        let a = h("li", props! { "key" => "a" }, ());
        let one = h("li", props! { "key" => 1 }, ());
        assert_eq!(a.key(), Some(&VNodeKey::Str(Arc::from("a"))));
        assert_eq!(one.key(), Some(&VNodeKey::Int(1)));
        assert!(h("li", None, ()).key().is_none());
    }

    #[test]
    fn same_vnode_needs_type_and_key() {
        let a1 = h("li", props! { "key" => "a" }, ());
        let a2 = h("li", props! { "key" => "a" }, "changed");
        let b = h("li", props! { "key" => "b" }, ());
        let p = h("p", props! { "key" => "a" }, ());
        assert!(is_same_vnode(&a1, &a2));
        assert!(!is_same_vnode(&a1, &b));
        assert!(!is_same_vnode(&a1, &p));
    }

    #[test]
    fn components_compare_by_definition() {
        let foo = Component::new("Foo").build();
        let other = Component::new("Foo").build();
        assert!(is_same_vnode(&h(&foo, None, ()), &h(&foo, None, ())));
        assert!(!is_same_vnode(&h(&foo, None, ()), &h(&other, None, ())));
    }

    #[test]
    fn text_vnode() {
        let t = create_text_vnode("hello");
        assert_eq!(*t.ty(), VNodeType::Text);
        assert_eq!(t.children().as_text(), Some("hello"));
        assert!(t.el().is_none());
    }
}
