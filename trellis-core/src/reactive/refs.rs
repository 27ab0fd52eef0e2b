//! Ref Implementation
//!
//! A [`Ref`] is a single reactive cell read and written through its `value`.
//!
//! # How Refs Work
//!
//! 1. Reading the value inside an effect subscribes the effect to the ref's
//!    private dependency set.
//!
//! 2. Writing compares the new value with the stored raw value using
//!    same-value equality. Equal writes are dropped without notifying.
//!
//! 3. Record payloads are stored raw and exposed through a mutable proxy, so
//!    nested writes are reactive too.
//!
//! # Unwrapping
//!
//! [`ProxyRefs`] wraps a record of component state so that reads return the
//! value inside any ref and writes go through to it. Render functions can
//! then treat `count` as the number, never the cell.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::dep::{track_current, trigger_effects, Dep};
use super::proxy::{reactive, to_raw};
use crate::shared::{has_changed, Object, Value};

/// Counter for generating unique ref IDs.
static REF_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_ref_id() -> u64 {
    REF_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A single-value reactive cell.
///
/// Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct Ref(Arc<RefInner>);

struct RefInner {
    id: u64,
    /// The value as written, used for change detection.
    raw: RwLock<Value>,
    /// The value as read: records are proxied.
    value: RwLock<Value>,
    dep: Dep,
}

fn convert(value: &Value) -> Value {
    if value.is_object() {
        reactive(value.clone())
    } else {
        value.clone()
    }
}

impl Ref {
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self(Arc::new(RefInner {
            id: next_ref_id(),
            raw: RwLock::new(to_raw(&value)),
            value: RwLock::new(convert(&value)),
            dep: Dep::new(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Read the value, subscribing the running effect.
    pub fn get(&self) -> Value {
        track_current(&self.0.dep);
        self.0.value.read().clone()
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> Value {
        self.0.value.read().clone()
    }

    /// Write the value. Dependents are notified only if it changed.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        let raw = to_raw(&value);

        if !has_changed(&self.0.raw.read(), &raw) {
            return;
        }

        *self.0.raw.write() = raw;
        *self.0.value.write() = convert(&value);
        trigger_effects(&self.0.dep);
    }

    /// Write a value derived from the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get_untracked());
        self.set(next);
    }

    /// Number of effects subscribed to this ref.
    pub fn subscriber_count(&self) -> usize {
        self.0.dep.len()
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.0.id)
            .field("value", &*self.0.value.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Create a reactive cell.
pub fn create_ref(value: impl Into<Value>) -> Ref {
    Ref::new(value)
}

pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// The value inside a ref, or the value itself.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        other => other.clone(),
    }
}

/// A record whose ref-valued properties are transparently unwrapped.
#[derive(Clone, Debug, Default)]
pub struct ProxyRefs {
    target: Object,
}

impl ProxyRefs {
    pub fn new(target: Object) -> Self {
        Self { target }
    }

    /// The wrapped record.
    pub fn target(&self) -> &Object {
        &self.target
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.target.contains_key(key)
    }

    /// Read a property, unwrapping a ref.
    pub fn get(&self, key: &str) -> Value {
        unref(&self.target.get(key).unwrap_or_default())
    }

    /// Write a property.
    ///
    /// If the slot holds a ref and `value` is not itself a ref, the write
    /// goes into the ref. Otherwise the slot is replaced.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.target.get(key) {
            Some(Value::Ref(existing)) if !is_ref(&value) => existing.set(value),
            _ => {
                self.target.insert(key, value);
            }
        }
    }
}

/// Wrap a record so its refs auto-unwrap.
pub fn proxy_refs(target: Object) -> ProxyRefs {
    ProxyRefs::new(target)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{effect, is_reactive};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ref_holds_value() {
        let r = create_ref(1);
        assert_eq!(r.get(), Value::from(1));
        r.set(2);
        assert_eq!(r.get(), Value::from(2));
    }

    #[test]
    fn equal_writes_do_not_trigger() {
        let r = create_ref(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let (r2, runs2) = (r.clone(), runs.clone());
        effect(move || {
            r2.get();
            runs2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        r.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        r.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        let nan = create_ref(f64::NAN);
        nan.set(f64::NAN);
        assert_eq!(nan.subscriber_count(), 0);
    }

    #[test]
    fn object_payloads_are_reactive() {
        let r = create_ref(Object::from_iter([("count", 1)]));
        assert!(is_reactive(&r.get()));

        let seen = Arc::new(AtomicUsize::new(0));
        let (r2, seen2) = (r.clone(), seen.clone());
        effect(move || {
            let n = r2.get().get("count").as_f64().unwrap_or_default();
            seen2.store(n as usize, Ordering::SeqCst);
        });
        r.get().set("count", 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn is_ref_and_unref() {
        let r = create_ref(1);
        assert!(is_ref(&Value::from(r.clone())));
        assert!(!is_ref(&Value::from(1)));
        assert_eq!(unref(&Value::from(r)), Value::from(1));
        assert_eq!(unref(&Value::from(1)), Value::from(1));
    }

    #[test]
    fn proxy_refs_unwraps_and_writes_through() {
        let age = create_ref(10);
        let user = Object::from_iter([("age", Value::from(age.clone())), ("name", Value::from("xiaohong"))]);
        let proxy = proxy_refs(user.clone());

        assert_eq!(proxy.get("age"), Value::from(10));
        assert_eq!(proxy.get("name"), Value::from("xiaohong"));

        proxy.set("age", 20);
        assert_eq!(proxy.get("age"), Value::from(20));
        assert_eq!(age.get(), Value::from(20));

        proxy.set("age", create_ref(10));
        assert_eq!(proxy.get("age"), Value::from(10));
        assert_eq!(age.get(), Value::from(20));
    }
}
