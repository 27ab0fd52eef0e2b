//! Public Instance Proxy
//!
//! Render functions read component data through an [`InstanceProxy`].
//! A key resolves in priority order: setup state first, then props, then a
//! fixed table of special properties (`$el`, `$slots`, `$props`). The first
//! match wins.

use std::fmt;

use super::component::ComponentInstance;
use super::host::HostNode;
use super::slots::Slots;
use crate::shared::{Object, Value};

/// A resolved public property.
#[derive(Clone)]
pub enum PublicProperty {
    /// From setup state, refs unwrapped.
    State(Value),
    Prop(Value),
    /// `$el`: the host node the component rendered.
    El(Option<HostNode>),
    /// `$slots`
    Slots(Slots),
    /// `$props`
    Props(Object),
}

impl fmt::Debug for PublicProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicProperty::State(v) => f.debug_tuple("State").field(v).finish(),
            PublicProperty::Prop(v) => f.debug_tuple("Prop").field(v).finish(),
            PublicProperty::El(el) => f.debug_tuple("El").field(el).finish(),
            PublicProperty::Slots(slots) => f
                .debug_tuple("Slots")
                .field(&slots.keys().collect::<Vec<_>>())
                .finish(),
            PublicProperty::Props(props) => f.debug_tuple("Props").field(props).finish(),
        }
    }
}

/// View of a component instance used by its render function.
#[derive(Clone, Debug)]
pub struct InstanceProxy {
    instance: ComponentInstance,
}

impl InstanceProxy {
    pub(crate) fn new(instance: ComponentInstance) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// Resolve `key` against state, props, then the special table.
    pub fn resolve(&self, key: &str) -> Option<PublicProperty> {
        let state = self.instance.setup_state();
        if state.contains_key(key) {
            return Some(PublicProperty::State(state.get(key)));
        }

        let props = self.instance.props();
        if let Some(value) = props.get(key) {
            return Some(PublicProperty::Prop(value));
        }

        match key {
            "$el" => Some(PublicProperty::El(self.el())),
            "$slots" => Some(PublicProperty::Slots(self.slots())),
            "$props" => Some(PublicProperty::Props(props)),
            _ => None,
        }
    }

    /// Read a key as a value.
    ///
    /// `$props` reads as a record. `$el` and `$slots` are not values; use
    /// [`el`](Self::el) and [`slots`](Self::slots).
    pub fn get(&self, key: &str) -> Value {
        match self.resolve(key) {
            Some(PublicProperty::State(value)) | Some(PublicProperty::Prop(value)) => value,
            Some(PublicProperty::Props(props)) => Value::Object(props),
            _ => Value::Null,
        }
    }

    /// Write a setup-state key; a ref in that slot is written through.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.instance.setup_state().set(key, value);
    }

    pub fn el(&self) -> Option<HostNode> {
        self.instance.vnode().el()
    }

    pub fn slots(&self) -> Slots {
        self.instance.slots()
    }

    pub fn props(&self) -> Object {
        self.instance.props()
    }
}
