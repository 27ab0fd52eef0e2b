//! Slots
//!
//! A parent passes named content holes to a component as [`RawSlots`]. Each
//! slot is a function of the scoped props the component supplies when it
//! renders the slot. Slot functions may return one vnode or several; at
//! component init they are normalized to always return a sequence.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::vnode::{fragment, VNode};
use crate::shared::Value;

/// What a slot function hands back before normalization.
#[derive(Clone, Debug)]
pub enum SlotContent {
    One(VNode),
    Many(Vec<VNode>),
}

impl SlotContent {
    pub fn into_vec(self) -> Vec<VNode> {
        match self {
            SlotContent::One(vnode) => vec![vnode],
            SlotContent::Many(vnodes) => vnodes,
        }
    }
}

impl From<VNode> for SlotContent {
    fn from(vnode: VNode) -> Self {
        SlotContent::One(vnode)
    }
}

impl From<Vec<VNode>> for SlotContent {
    fn from(vnodes: Vec<VNode>) -> Self {
        SlotContent::Many(vnodes)
    }
}

/// Slot function as written by the parent.
pub type RawSlotFn = Arc<dyn Fn(&Value) -> SlotContent + Send + Sync>;

/// Normalized slot function: scoped props to a vnode sequence.
pub type SlotFn = Arc<dyn Fn(&Value) -> Vec<VNode> + Send + Sync>;

/// Normalized slots of a component instance.
pub type Slots = IndexMap<String, SlotFn>;

/// Named slot functions passed as component children.
#[derive(Clone, Default)]
pub struct RawSlots {
    entries: IndexMap<String, RawSlotFn>,
}

impl RawSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot.
    pub fn slot<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> SlotContent + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(f));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RawSlotFn> {
        self.entries.get(name)
    }
}

impl fmt::Debug for RawSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlots")
            .field("names", &self.names())
            .finish()
    }
}

/// Promote every slot to a function returning a sequence.
pub fn normalize_slots(raw: &RawSlots) -> Slots {
    raw.entries
        .iter()
        .map(|(name, f)| {
            let f = f.clone();
            let normalized: SlotFn = Arc::new(move |props: &Value| f(props).into_vec());
            (name.clone(), normalized)
        })
        .collect()
}

/// Render the slot `name` with `props` as a fragment.
///
/// Returns `None` when the slot does not exist.
pub fn render_slots(slots: &Slots, name: &str, props: impl Into<Value>) -> Option<VNode> {
    let slot = slots.get(name)?;
    Some(fragment(slot(&props.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{h, VNodeType};
    use crate::{props, Object};

    #[test]
    fn single_vnode_is_promoted() {
        let raw = RawSlots::new().slot("default", |_| h("p", None, "one").into());
        let slots = normalize_slots(&raw);
        let out = slots["default"](&Value::Null);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn scoped_slot_round_trip() {
        let raw = RawSlots::new().slot("header", |scope| {
            let age = scope.get("age");
            vec![h("p", None, format!("header {age}"))].into()
        });
        let slots = normalize_slots(&raw);

        let rendered = render_slots(&slots, "header", props! { "age" => 18 }).unwrap();
        assert_eq!(*rendered.ty(), VNodeType::Fragment);
        let children = rendered.children().as_array();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].children().as_text(), Some("header 18"));
    }

    #[test]
    fn missing_slot_renders_nothing() {
        let slots = normalize_slots(&RawSlots::new());
        assert!(render_slots(&slots, "footer", Object::new()).is_none());
    }
}
