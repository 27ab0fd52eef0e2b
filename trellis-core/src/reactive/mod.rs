//! Reactive Primitives
//!
//! This module implements the reactivity engine: effects, the dependency
//! map, reactive proxies, refs, and computed values. Everything the renderer
//! does on update is driven from here.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An effect is a computation that re-runs whenever data it read changes.
//! Component render functions run inside effects whose scheduler defers the
//! re-run to the job queue.
//!
//! ## Proxies
//!
//! A [`Reactive`] wraps a plain record. Reads through it are tracked against
//! the running effect; writes trigger every effect that read the same key.
//!
//! ## Refs and Computed Values
//!
//! A [`Ref`] is a single reactive cell. A [`Computed`] caches a derived
//! value and recomputes it only when read after a dependency changed.
//!
//! # Implementation Notes
//!
//! Tracking uses a thread-local stack of running effects, so nested effect
//! runs restore the outer effect's context when they finish.

mod computed;
mod context;
mod dep;
mod effect;
mod proxy;
mod refs;

pub use computed::{computed, Computed};
pub use context::ReactiveContext;
pub use dep::{dep_for, is_tracking, track, track_current, track_effect, trigger, trigger_effects, Dep};
pub use effect::{
    effect, effect_with_options, stop, EffectId, EffectOptions, EffectRunner, ReactiveEffect,
    Scheduler,
};
pub use proxy::{
    is_proxy, is_reactive, is_readonly, reactive, readonly, shallow_readonly, to_raw, ProxyFlavor,
    Reactive, ReactiveFlags,
};
pub use refs::{create_ref, is_ref, proxy_refs, unref, ProxyRefs, Ref};
