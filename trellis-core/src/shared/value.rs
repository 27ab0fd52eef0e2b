//! Dynamic Values
//!
//! Component state, props, and event payloads are duck-typed: a prop may hold
//! a string, a number, a nested record, a ref cell, or an event handler. This
//! module defines that value universe.
//!
//! # Identity
//!
//! Records ([`Object`]) are shared by reference. Two `Object` handles are the
//! same record only if they point at the same allocation; this is what the
//! dependency map keys on and what "reference equality" means for props.
//!
//! # Equality
//!
//! [`Value::same_value`] implements same-value semantics: `NaN` equals
//! `NaN`, `+0` and `-0` differ, and records, refs, and callbacks compare by
//! identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::reactive::{Reactive, Ref};

/// Ordered key/value storage backing an [`Object`].
pub type Props = IndexMap<String, Value>;

/// Counter for generating unique object IDs.
static OBJECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_object_id() -> u64 {
    OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A shared, identity-bearing record of named values.
///
/// Cloning an `Object` clones the handle, not the record.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

struct ObjectInner {
    id: u64,
    fields: RwLock<Props>,
}

impl Object {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::from_props(Props::new())
    }

    /// Create a record owning the given fields.
    pub fn from_props(props: Props) -> Self {
        Self(Arc::new(ObjectInner {
            id: next_object_id(),
            fields: RwLock::new(props),
        }))
    }

    /// Unique identity of this record.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Read a field without any reactive tracking.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.fields.read().get(key).cloned()
    }

    /// Write a field without any reactive triggering.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.fields.write().insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.fields.read().contains_key(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.fields.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.fields.read().is_empty()
    }

    /// Copy of all fields, in insertion order.
    pub fn snapshot(&self) -> Props {
        self.0.fields.read().clone()
    }

    /// Whether two handles point at the same record.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_props(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("keys", &self.keys())
            .finish()
    }
}

/// A callable value, used for event handlers and slot-style callbacks.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    /// A plain, untracked record.
    Object(Object),
    /// A record seen through a reactive, readonly, or shallow-readonly proxy.
    Reactive(Reactive),
    /// A single-value reactive cell.
    Ref(Ref),
    Func(Callback),
}

impl Value {
    /// Wrap a closure as a callable value.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Value::Func(Callback::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is a record, either raw or proxied.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Read a property.
    ///
    /// Proxies go through their read trap (tracking, nested wrapping), raw
    /// records are read directly, and refs expose their `value` property.
    /// Anything else yields [`Value::Null`].
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Reactive(r) => r.get(key),
            Value::Object(o) => o.get(key).unwrap_or_default(),
            Value::Ref(r) if key == "value" => r.get(),
            _ => Value::Null,
        }
    }

    /// Write a property. Returns whether the write reached storage.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        match self {
            Value::Reactive(r) => r.set(key, value),
            Value::Object(o) => {
                o.insert(key, value);
                true
            }
            Value::Ref(r) if key == "value" => {
                r.set(value);
                true
            }
            _ => false,
        }
    }

    /// Same-value equality.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object(#{})", o.id()),
            Value::Reactive(r) => write!(f, "Reactive(#{}, {:?})", r.raw().id(), r.flavor()),
            Value::Ref(r) => write!(f, "Ref({:?})", r.get_untracked()),
            Value::Func(_) => f.write_str("Func"),
        }
    }
}

/// Renders a value the way text interpolation displays it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) | Value::Reactive(_) => f.write_str("[object Object]"),
            Value::Ref(r) => write!(f, "{}", r.get_untracked()),
            Value::Func(_) => f.write_str("function"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Reactive> for Value {
    fn from(r: Reactive) -> Self {
        Value::Reactive(r)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Callback> for Value {
    fn from(f: Callback) -> Self {
        Value::Func(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
