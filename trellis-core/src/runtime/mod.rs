//! Component Runtime
//!
//! Everything between the reactivity engine and the host: virtual nodes,
//! component instances, the renderer and its keyed diff, and the job
//! scheduler that batches re-renders.
//!
//! # Flow
//!
//! ```text
//! App::mount ──► Renderer::patch ──► mount_component ──► setup ──► render effect
//!                                                                      │
//!       state write ──► trigger ──► effect scheduler ──► queue_job ◄───┘
//!                                                          │
//!                              microtask flush ──► ComponentInstance::update
//!                                                          │
//!                                      Renderer::patch(old sub-tree, new sub-tree)
//! ```

mod app;
mod component;
mod emit;
pub mod host;
mod inject;
mod public_instance;
mod renderer;
mod scheduler;
mod sequence;
mod slots;
mod vnode;

pub use app::{create_app, App};
pub use component::{
    get_current_instance, register_runtime_compiler, setup_component, Component,
    ComponentBuilder, ComponentInstance, CompilerFn, RenderFn, SetupContext, SetupFn, SetupResult,
    WeakInstance,
};
pub use emit::emit;
pub use host::{HostAdapter, HostNode, HostOp, MemoryHost, TEXT_TAG};
pub use inject::{inject, provide};
pub use public_instance::{InstanceProxy, PublicProperty};
pub use renderer::{create_renderer, should_update_component, Renderer};
pub use scheduler::{
    flush_jobs, flush_microtasks, invalidate_job, is_flush_pending, next_tick, next_tick_then,
    queue_job, queue_microtask, queued_job_count, Job, Tick,
};
pub use sequence::longest_increasing_subsequence;
pub use slots::{normalize_slots, render_slots, RawSlotFn, RawSlots, SlotContent, SlotFn, Slots};
pub use vnode::{
    create_text_vnode, create_vnode, fragment, h, is_same_vnode, Children, VNode, VNodeKey,
    VNodeType,
};
