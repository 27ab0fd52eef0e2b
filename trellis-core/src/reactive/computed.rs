//! Computed Implementation
//!
//! A [`Computed`] is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. The getter runs inside a private effect whose scheduler only flips a
//!    `dirty` flag. Nothing recomputes when a dependency changes.
//!
//! 2. Reading a dirty computed re-runs the getter, caches the result, and
//!    only then clears the flag. A getter that unwinds leaves it dirty.
//!    Reading a clean one returns the cache.
//!
//! 3. When the flag flips from clean to dirty, effects that read the
//!    computed are notified, so derived values compose.
//!
//! # Why This Matters
//!
//! - A ref changes
//! - 10 computed values depend on it
//! - Only the ones actually read will recompute

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::dep::{track_current, trigger_effects, Dep};
use super::effect::{EffectOptions, ReactiveEffect};

/// A lazily recomputed, cached value.
///
/// Cloning yields another handle to the same cache.
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The cached value (None until first read).
    value: Arc<RwLock<Option<T>>>,

    dirty: Arc<AtomicBool>,

    /// Effect wrapping the getter; its scheduler marks the cache dirty.
    effect: ReactiveEffect,

    /// Effects that read this computed.
    dep: Dep,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value. The getter does not run until first read.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let value: Arc<RwLock<Option<T>>> = Arc::new(RwLock::new(None));
        let dirty = Arc::new(AtomicBool::new(true));
        let dep = Dep::new();

        let slot = value.clone();
        let run = move || {
            let next = getter();
            *slot.write() = Some(next);
        };

        let flag = dirty.clone();
        let readers = dep.clone();
        let scheduler = move || {
            if !flag.swap(true, Ordering::SeqCst) {
                trigger_effects(&readers);
            }
        };

        let effect = ReactiveEffect::new(run, EffectOptions::default().scheduler(scheduler));

        Self {
            value,
            dirty,
            effect,
            dep,
        }
    }

    /// Read the value, recomputing if a dependency changed since last read.
    pub fn get(&self) -> T {
        track_current(&self.dep);

        if self.dirty.load(Ordering::SeqCst) {
            self.effect.run();
            self.dirty.store(false, Ordering::SeqCst);
        }

        self.value
            .read()
            .clone()
            .expect("computed value is cached once its getter has run")
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Stop tracking. The last cached value stays readable.
    pub fn stop(&self) {
        self.effect.stop();
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            dirty: Arc::clone(&self.dirty),
            effect: self.effect.clone(),
            dep: self.dep.clone(),
        }
    }
}

impl<T> fmt::Debug for Computed<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("value", &*self.value.read())
            .field("dirty", &self.is_dirty())
            .field("dependents", &self.dep.len())
            .finish()
    }
}

/// Create a computed value from a getter.
pub fn computed<T, F>(getter: F) -> Computed<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computed::new(getter)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_ref, effect, reactive};
    use crate::{Object, Value};
    use std::sync::atomic::AtomicI32;

    #[test]
    fn computed_is_lazy() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(c.is_dirty());
        assert_eq!(c.get(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unwinding_getter_leaves_cache_dirty() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let failing = Arc::new(AtomicBool::new(true));
        let failing_clone = failing.clone();
        let c = computed(move || {
            if failing_clone.load(Ordering::SeqCst) {
                panic!("getter failed");
            }
            7
        });

        assert!(catch_unwind(AssertUnwindSafe(|| c.get())).is_err());
        assert!(c.is_dirty());

        failing.store(false, Ordering::SeqCst);
        assert_eq!(c.get(), 7);
        assert!(!c.is_dirty());
    }

    #[test]
    fn computed_caches_until_dependency_changes() {
        let state = reactive(Object::from_iter([("age", 1)]));
        let calls = Arc::new(AtomicI32::new(0));

        let (s, calls_clone) = (state.clone(), calls.clone());
        let c = computed(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            s.get("age").as_f64().unwrap_or_default()
        });

        assert_eq!(c.get(), 1.0);
        assert_eq!(c.get(), 1.0);
        assert_eq!(c.get(), 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        state.set("age", 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(c.is_dirty());

        assert_eq!(c.get(), 2.0);
        assert_eq!(c.get(), 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn computed_notifies_readers() {
        let count = create_ref(1);
        let c = {
            let count = count.clone();
            computed(move || count.get().as_f64().unwrap_or_default() * 2.0)
        };

        let seen = Arc::new(RwLock::new(Value::Null));
        let (c2, seen2) = (c.clone(), seen.clone());
        effect(move || {
            *seen2.write() = Value::from(c2.get());
        });
        assert_eq!(*seen.read(), Value::from(2));

        count.set(5);
        assert_eq!(*seen.read(), Value::from(10));
    }

    #[test]
    fn clones_share_the_cache() {
        let c1 = computed(|| 7);
        let c2 = c1.clone();
        assert_eq!(c1.get(), 7);
        assert!(!c2.is_dirty());
    }
}
