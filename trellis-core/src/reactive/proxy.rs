//! Reactive Proxies
//!
//! A [`Reactive`] is an explicit wrapper around an [`Object`] that performs
//! dependency tracking on `get` and change notification on `set`.
//!
//! # Flavors
//!
//! - **Mutable**: reads track, writes trigger. Nested records are wrapped as
//!   mutable proxies when read.
//! - **Readonly**: reads do not track, writes are refused with a warning.
//!   Nested records are wrapped as readonly.
//! - **ShallowReadonly**: like readonly, but nested records are returned
//!   raw. Component props are exposed to `setup` this way.
//!
//! Nested wrapping happens on access, never eagerly.
//!
//! # Introspection
//!
//! Every proxy answers the hidden keys in [`ReactiveFlags`], which is how
//! [`is_reactive`] and [`is_readonly`] decide.

use std::fmt;

use tracing::warn;

use super::dep::{track, trigger};
use crate::config::runtime_config;
use crate::shared::{Object, Value};

/// Hidden keys every proxy answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactiveFlags {
    IsReactive,
    IsReadonly,
}

impl ReactiveFlags {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactiveFlags::IsReactive => "__v_isReactive",
            ReactiveFlags::IsReadonly => "__v_isReadonly",
        }
    }
}

/// Which interception rules a proxy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyFlavor {
    Mutable,
    Readonly,
    ShallowReadonly,
}

impl ProxyFlavor {
    pub fn is_readonly(self) -> bool {
        !matches!(self, ProxyFlavor::Mutable)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, ProxyFlavor::ShallowReadonly)
    }
}

/// A record viewed through reactive interception.
#[derive(Clone)]
pub struct Reactive {
    raw: Object,
    flavor: ProxyFlavor,
}

impl Reactive {
    pub(crate) fn new(raw: Object, flavor: ProxyFlavor) -> Self {
        Self { raw, flavor }
    }

    /// The underlying record.
    pub fn raw(&self) -> &Object {
        &self.raw
    }

    pub fn flavor(&self) -> ProxyFlavor {
        self.flavor
    }

    /// Read a property through the proxy.
    pub fn get(&self, key: &str) -> Value {
        if key == ReactiveFlags::IsReactive.as_str() {
            return Value::Bool(!self.flavor.is_readonly());
        }
        if key == ReactiveFlags::IsReadonly.as_str() {
            return Value::Bool(self.flavor.is_readonly());
        }

        let value = self.raw.get(key).unwrap_or_default();

        if !self.flavor.is_readonly() {
            track(self.raw.id(), key);
        }

        if self.flavor.is_shallow() {
            return value;
        }

        match value {
            Value::Object(nested) => Value::Reactive(Reactive::new(nested, self.flavor)),
            other => other,
        }
    }

    /// Write a property through the proxy.
    ///
    /// Mutable proxies store the raw form of `value` and notify dependents.
    /// Readonly flavors never touch storage and return `false`.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        if self.flavor.is_readonly() {
            if runtime_config().warn_readonly_writes {
                warn!(key, "set failed: target is readonly");
            }
            return false;
        }

        self.raw.insert(key, to_raw(&value.into()));
        trigger(self.raw.id(), key);
        true
    }

    /// Whether a property exists, without tracking.
    pub fn contains_key(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    /// Property names, without tracking.
    pub fn keys(&self) -> Vec<String> {
        self.raw.keys()
    }

    /// Same record viewed through the same flavor.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        self.raw.ptr_eq(&other.raw) && self.flavor == other.flavor
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("raw", &self.raw)
            .field("flavor", &self.flavor)
            .finish()
    }
}

fn wrap(value: Value, flavor: ProxyFlavor, api: &'static str) -> Value {
    match value {
        Value::Object(raw) => Value::Reactive(Reactive::new(raw, flavor)),
        Value::Reactive(existing) if existing.flavor == flavor => Value::Reactive(existing),
        Value::Reactive(existing) if flavor.is_readonly() => {
            Value::Reactive(Reactive::new(existing.raw, flavor))
        }
        other => {
            if !matches!(other, Value::Reactive(_)) {
                warn!(api, value = ?other, "target must be an object");
            }
            other
        }
    }
}

/// Wrap a record in a mutable, deep proxy.
///
/// Non-record inputs are returned unchanged with a warning.
pub fn reactive(value: impl Into<Value>) -> Value {
    wrap(value.into(), ProxyFlavor::Mutable, "reactive")
}

/// Wrap a record in a readonly, deep proxy.
pub fn readonly(value: impl Into<Value>) -> Value {
    wrap(value.into(), ProxyFlavor::Readonly, "readonly")
}

/// Wrap a record in a readonly proxy that does not wrap nested records.
pub fn shallow_readonly(value: impl Into<Value>) -> Value {
    wrap(value.into(), ProxyFlavor::ShallowReadonly, "shallowReadonly")
}

pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Reactive(_))
        && value.get(ReactiveFlags::IsReactive.as_str()) == Value::Bool(true)
}

pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Reactive(_))
        && value.get(ReactiveFlags::IsReadonly.as_str()) == Value::Bool(true)
}

/// Whether the value is any kind of proxy.
pub fn is_proxy(value: &Value) -> bool {
    is_reactive(value) || is_readonly(value)
}

/// Strip a proxy, returning the record it wraps.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Reactive(r) => Value::Object(r.raw.clone()),
        other => other.clone(),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
