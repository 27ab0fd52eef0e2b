//! Dependency Map
//!
//! The dependency map connects reactive data to the effects that read it.
//! It is a two-level mapping: target object → property key → set of effects.
//!
//! # How It Works
//!
//! 1. When a proxied property is read inside a running effect, [`track`]
//!    inserts the effect into `map[target][key]` and records the reverse edge
//!    on the effect, so that stopping it only touches the sets it is in.
//!
//! 2. When the property is written, [`trigger`] snapshots the set for that
//!    pair and schedules every active effect in it.
//!
//! Entries are created lazily on first track and never deleted. Refs and
//! computed values own a private [`Dep`] instead of going through the map.
//!
//! # Thread Safety
//!
//! The map is a process-wide [`DashMap`]. The shard guard is always released
//! before effects run, since a running effect tracks into the same map.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::effect::{EffectId, ReactiveEffect};

/// Global target map, keyed by [`Object`](crate::Object) id.
static TARGET_MAP: OnceLock<DashMap<u64, HashMap<String, Dep>>> = OnceLock::new();

fn target_map() -> &'static DashMap<u64, HashMap<String, Dep>> {
    TARGET_MAP.get_or_init(DashMap::new)
}

/// A set of effects subscribed to one reactive source.
///
/// Insertion order is preserved, so effects are notified in the order they
/// first subscribed.
#[derive(Clone, Default)]
pub struct Dep(Arc<DepInner>);

#[derive(Default)]
pub(crate) struct DepInner {
    effects: RwLock<IndexMap<EffectId, ReactiveEffect>>,
}

impl DepInner {
    pub(crate) fn remove(&self, id: EffectId) {
        self.effects.write().shift_remove(&id);
    }
}

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribed effects.
    pub fn len(&self) -> usize {
        self.0.effects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.effects.read().is_empty()
    }

    /// Whether `effect` is subscribed.
    pub fn contains(&self, effect: &ReactiveEffect) -> bool {
        self.0.effects.read().contains_key(&effect.id())
    }

    pub(crate) fn downgrade(&self) -> Weak<DepInner> {
        Arc::downgrade(&self.0)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep").field("effects", &self.len()).finish()
    }
}

/// Whether reads right now would be recorded.
pub fn is_tracking() -> bool {
    ReactiveContext::current_effect().is_some_and(|e| e.is_active())
}

/// Record that the current effect reads `key` on the object `target`.
///
/// No-op when no active effect is running.
pub fn track(target: u64, key: &str) {
    let Some(effect) = ReactiveContext::current_effect() else {
        return;
    };
    if !effect.is_active() {
        return;
    }

    let dep = {
        let mut entry = target_map().entry(target).or_default();
        entry.entry(key.to_string()).or_default().clone()
    };
    track_effect(&dep, &effect);
}

/// Subscribe the current effect to a private dependency set.
pub fn track_current(dep: &Dep) {
    if let Some(effect) = ReactiveContext::current_effect() {
        if effect.is_active() {
            track_effect(dep, &effect);
        }
    }
}

/// Subscribe `effect` to `dep`, recording the reverse edge.
///
/// An effect appears in a set at most once.
pub fn track_effect(dep: &Dep, effect: &ReactiveEffect) {
    let inserted = {
        let mut effects = dep.0.effects.write();
        if effects.contains_key(&effect.id()) {
            false
        } else {
            effects.insert(effect.id(), effect.clone());
            true
        }
    };

    if inserted {
        effect.record_dep(dep);
    }
}

/// Notify every effect that read `key` on `target`.
///
/// Writes to keys nobody tracked are a cheap no-op.
pub fn trigger(target: u64, key: &str) {
    let dep = target_map()
        .get(&target)
        .and_then(|keys| keys.get(key).cloned());

    if let Some(dep) = dep {
        trigger_effects(&dep);
    }
}

/// Notify every effect in `dep`.
///
/// The set is snapshotted first, so effects that re-track while running do
/// not disturb this pass. An effect is never re-entered from its own write.
pub fn trigger_effects(dep: &Dep) {
    let snapshot: Vec<ReactiveEffect> = dep.0.effects.read().values().cloned().collect();
    if snapshot.is_empty() {
        return;
    }

    let running = ReactiveContext::current_effect().map(|e| e.id());

    for effect in snapshot {
        if !effect.is_active() || Some(effect.id()) == running {
            continue;
        }
        effect.schedule();
    }
}

/// Look up the dependency set for a pair, if one was ever tracked.
pub fn dep_for(target: u64, key: &str) -> Option<Dep> {
    target_map()
        .get(&target)
        .and_then(|keys| keys.get(key).cloned())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
