//! Update Scheduler
//!
//! Component render effects do not re-run when their data changes. Their
//! scheduler pushes an update job onto a queue instead, and the queue is
//! drained once per microtask turn. Several synchronous writes to state one
//! component reads therefore produce a single re-render.
//!
//! # Algorithm
//!
//! 1. `queue_job` appends a job unless one with the same id is already
//!    waiting, then arms a flush if none is pending.
//!
//! 2. The flush is itself a microtask. It drains the queue strictly in
//!    enqueue order. Jobs queued while flushing are appended and run in the
//!    same pass.
//!
//! 3. Jobs whose effect was stopped after they were queued are skipped.
//!
//! 4. A job that runs more than `recursion_limit` times in one flush aborts
//!    the flush with [`RuntimeError::RecursionLimit`].
//!
//! # Microtasks
//!
//! The runtime is single-threaded and cooperative. The microtask queue is
//! thread-local and is drained by [`flush_microtasks`], which the [`Tick`]
//! future returned by [`next_tick`] does when polled.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::task::AtomicWaker;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::config::runtime_config;
use crate::error::{Result, RuntimeError};
use crate::reactive::ReactiveEffect;

type Microtask = Box<dyn FnOnce() -> Result<()>>;

/// A unit of deferred work, usually one component re-render.
#[derive(Clone)]
pub struct Job {
    id: u64,
    effect: Option<ReactiveEffect>,
    run: Arc<dyn Fn() -> Result<()> + Send + Sync>,
}

impl Job {
    pub fn new<F>(id: u64, run: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id,
            effect: None,
            run: Arc::new(run),
        }
    }

    /// Tie the job to an effect; the job is skipped once the effect stops.
    pub fn with_effect(mut self, effect: ReactiveEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn is_cancelled(&self) -> bool {
        self.effect.as_ref().is_some_and(|e| !e.is_active())
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[derive(Default)]
struct UpdateScheduler {
    queue: VecDeque<Job>,
    flush_pending: bool,
    flushing: bool,
    microtasks: VecDeque<Microtask>,
}

thread_local! {
    static SCHEDULER: RefCell<UpdateScheduler> = RefCell::new(UpdateScheduler::default());
}

/// Enqueue a job, coalescing with an identical one already waiting.
pub fn queue_job(job: Job) {
    let queued = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        if s.queue.iter().any(|j| j.id == job.id) {
            false
        } else {
            s.queue.push_back(job);
            true
        }
    });
    trace!(queued, "queue_job");
    queue_flush();
}

fn queue_flush() {
    let arm = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        if s.flush_pending || s.flushing {
            false
        } else {
            s.flush_pending = true;
            true
        }
    });
    if arm {
        queue_microtask(flush_jobs);
    }
}

/// Drop a waiting job, e.g. because its work was already done directly.
pub fn invalidate_job(id: u64) {
    SCHEDULER.with(|s| s.borrow_mut().queue.retain(|j| j.id != id));
}

/// Schedule `task` to run at the end of the current turn.
pub fn queue_microtask<F>(task: F)
where
    F: FnOnce() -> Result<()> + 'static,
{
    SCHEDULER.with(|s| s.borrow_mut().microtasks.push_back(Box::new(task)));
}

/// Drain the job queue in order.
pub fn flush_jobs() -> Result<()> {
    SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        s.flush_pending = false;
        s.flushing = true;
    });

    let limit = runtime_config().recursion_limit;
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut ran = 0usize;

    let outcome = loop {
        let Some(job) = SCHEDULER.with(|s| s.borrow_mut().queue.pop_front()) else {
            break Ok(());
        };

        if job.is_cancelled() {
            trace!(job = job.id, "skipping job of stopped effect");
            continue;
        }

        let count = counts.entry(job.id).or_insert(0);
        *count += 1;
        if *count > limit {
            SCHEDULER.with(|s| s.borrow_mut().queue.retain(|j| j.id != job.id));
            break Err(RuntimeError::RecursionLimit { limit });
        }

        ran += 1;
        if let Err(err) = (job.run)() {
            break Err(err);
        }
    };

    SCHEDULER.with(|s| s.borrow_mut().flushing = false);

    match outcome {
        Ok(()) => {
            debug!(jobs = ran, "flushed update queue");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "update job failed; aborting flush");
            if SCHEDULER.with(|s| !s.borrow().queue.is_empty()) {
                queue_flush();
            }
            Err(err)
        }
    }
}

/// Run queued microtasks until none remain, including ones they queue.
///
/// Every task runs even if an earlier one fails; the first error is
/// returned.
pub fn flush_microtasks() -> Result<()> {
    let mut first_error = None;
    while let Some(task) = SCHEDULER.with(|s| s.borrow_mut().microtasks.pop_front()) {
        if let Err(err) = task() {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Whether a job flush is armed and not yet run.
pub fn is_flush_pending() -> bool {
    SCHEDULER.with(|s| s.borrow().flush_pending)
}

/// Number of jobs waiting in the queue.
pub fn queued_job_count() -> usize {
    SCHEDULER.with(|s| s.borrow().queue.len())
}

struct TickState {
    done: AtomicBool,
    waker: AtomicWaker,
    error: Mutex<Option<RuntimeError>>,
}

/// Resolves once every microtask queued before it has run.
///
/// Polling the future drives the thread's microtask queue, so it must be
/// awaited on the thread that queued the work.
#[must_use = "a tick does nothing unless awaited or waited on"]
pub struct Tick {
    state: Arc<TickState>,
}

impl Tick {
    fn queue() -> Self {
        let state = Arc::new(TickState {
            done: AtomicBool::new(false),
            waker: AtomicWaker::new(),
            error: Mutex::new(None),
        });
        let marker = state.clone();
        queue_microtask(move || {
            marker.done.store(true, Ordering::SeqCst);
            marker.waker.wake();
            Ok(())
        });
        Self { state }
    }

    fn drive(&self) {
        if self.state.done.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = flush_microtasks() {
            self.state.error.lock().get_or_insert(err);
        }
    }

    fn outcome(&self) -> Result<()> {
        self.state.error.lock().take().map_or(Ok(()), Err)
    }

    /// Drive the queue synchronously and return the outcome.
    pub fn wait(self) -> Result<()> {
        self.drive();
        self.outcome()
    }
}

impl Future for Tick {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.state.waker.register(cx.waker());
        self.drive();
        if self.state.done.load(Ordering::SeqCst) {
            Poll::Ready(self.outcome())
        } else {
            Poll::Pending
        }
    }
}

/// A handle that resolves after pending renders have flushed.
pub fn next_tick() -> Tick {
    Tick::queue()
}

/// Run `f` after pending renders have flushed.
pub fn next_tick_then<F>(f: F) -> Tick
where
    F: FnOnce() + 'static,
{
    queue_microtask(move || {
        f();
        Ok(())
    });
    Tick::queue()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
