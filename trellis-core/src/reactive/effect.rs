//! Effect Implementation
//!
//! An effect is a computation that re-runs whenever the reactive data it read
//! during its last run changes.
//!
//! # How Effects Work
//!
//! 1. [`effect`] runs the function immediately to establish dependencies.
//!
//! 2. When a dependency changes, the effect's scheduler is invoked if it has
//!    one; otherwise the effect re-runs synchronously.
//!
//! 3. Before each run, the effect leaves every dependency set it was in and
//!    re-tracks during execution, so branches no longer taken stop
//!    triggering it.
//!
//! # Schedulers
//!
//! Component render effects and computed values both install a scheduler.
//! Render effects push a job onto the update queue; computed values flip a
//! dirty flag. Plain effects have none and re-run eagerly.
//!
//! # Stopping
//!
//! [`ReactiveEffect::stop`] removes the effect from every dependency set,
//! marks it inactive, and invokes `on_stop`. An inactive effect can still be
//! run by hand, but it tracks nothing.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::dep::{Dep, DepInner};

/// Unique identifier for an effect.
///
/// Used as the key in dependency sets and to recognise the effect that is
/// currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked instead of re-running an effect.
pub type Scheduler = Arc<dyn Fn() + Send + Sync>;

/// Options accepted by [`effect_with_options`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    pub scheduler: Option<Scheduler>,
    pub on_stop: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Skip the initial run.
    pub lazy: bool,
}

impl EffectOptions {
    pub fn scheduler<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.scheduler = Some(Arc::new(f));
        self
    }

    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_stop = Some(Arc::new(f));
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("scheduler", &self.scheduler.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .field("lazy", &self.lazy)
            .finish()
    }
}

/// A tracked computation.
///
/// Cloning yields another handle to the same effect.
#[derive(Clone)]
pub struct ReactiveEffect(Arc<EffectInner>);

struct EffectInner {
    id: EffectId,
    run: Box<dyn Fn() + Send + Sync>,
    scheduler: Option<Scheduler>,
    on_stop: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Reverse edges: the dependency sets this effect is registered in.
    deps: Mutex<SmallVec<[Weak<DepInner>; 4]>>,
    active: AtomicBool,
    run_count: AtomicUsize,
}

impl ReactiveEffect {
    /// Create an effect without running it.
    pub fn new<F>(run: F, options: EffectOptions) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(EffectInner {
            id: EffectId::new(),
            run: Box::new(run),
            scheduler: options.scheduler,
            on_stop: options.on_stop,
            deps: Mutex::new(SmallVec::new()),
            active: AtomicBool::new(true),
            run_count: AtomicUsize::new(0),
        }))
    }

    pub fn id(&self) -> EffectId {
        self.0.id
    }

    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    /// Number of times the computation has executed.
    pub fn run_count(&self) -> usize {
        self.0.run_count.load(Ordering::SeqCst)
    }

    /// Number of dependency sets the effect is currently registered in.
    pub fn dep_count(&self) -> usize {
        self.0
            .deps
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Execute the computation, re-collecting dependencies.
    pub fn run(&self) {
        self.0.run_count.fetch_add(1, Ordering::SeqCst);

        if !self.is_active() {
            let _ctx = ReactiveContext::untracked();
            (self.0.run)();
            return;
        }

        self.cleanup();
        let _ctx = ReactiveContext::enter(self);
        (self.0.run)();
    }

    /// React to a dependency change: defer to the scheduler or re-run.
    pub fn schedule(&self) {
        match &self.0.scheduler {
            Some(scheduler) => scheduler(),
            None => self.run(),
        }
    }

    /// Leave every dependency set and deactivate.
    ///
    /// Stopping twice is a no-op; `on_stop` fires once.
    pub fn stop(&self) {
        if self.0.active.swap(false, Ordering::SeqCst) {
            self.cleanup();
            if let Some(on_stop) = &self.0.on_stop {
                on_stop();
            }
        }
    }

    pub fn ptr_eq(&self, other: &ReactiveEffect) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn record_dep(&self, dep: &Dep) {
        self.0.deps.lock().push(dep.downgrade());
    }

    fn cleanup(&self) {
        let deps = std::mem::take(&mut *self.0.deps.lock());
        for dep in deps {
            if let Some(dep) = dep.upgrade() {
                dep.remove(self.0.id);
            }
        }
    }
}

impl fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("run_count", &self.run_count())
            .field("dep_count", &self.dep_count())
            .finish()
    }
}

/// Handle returned by [`effect`]: re-runs the computation on demand and
/// exposes the underlying effect for stopping.
#[derive(Clone, Debug)]
pub struct EffectRunner {
    effect: ReactiveEffect,
}

impl EffectRunner {
    /// Run the computation now, outside of any scheduler.
    pub fn run(&self) {
        self.effect.run();
    }

    pub fn effect(&self) -> &ReactiveEffect {
        &self.effect
    }

    pub fn stop(&self) {
        self.effect.stop();
    }
}

/// Create an effect and run it once.
pub fn effect<F>(f: F) -> EffectRunner
where
    F: Fn() + Send + Sync + 'static,
{
    effect_with_options(f, EffectOptions::default())
}

/// Create an effect with a scheduler, stop hook, or lazy start.
pub fn effect_with_options<F>(f: F, options: EffectOptions) -> EffectRunner
where
    F: Fn() + Send + Sync + 'static,
{
    let lazy = options.lazy;
    let effect = ReactiveEffect::new(f, options);
    if !lazy {
        effect.run();
    }
    EffectRunner { effect }
}

/// Stop the effect behind `runner`.
pub fn stop(runner: &EffectRunner) {
    runner.stop();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
