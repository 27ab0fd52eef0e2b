//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (reactive proxies, refs, computed values, effects)
//! - Components with setup, props, slots, emit, and provide/inject
//! - A virtual node renderer with a keyed children diff
//! - A job scheduler that batches re-renders per microtask turn
//! - A template compiler producing render functions
//!
//! The renderer never touches a concrete output tree: embedders supply a
//! [`HostAdapter`](runtime::HostAdapter). [`MemoryHost`](runtime::MemoryHost)
//! is an in-memory implementation used by tests.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `shared`: the dynamic `Value` model and small helpers
//! - `reactive`: effects, dependency tracking, proxies, refs, computed values
//! - `runtime`: vnodes, components, renderer, scheduler, host adapter
//! - `compiler`: template parsing, transforms, and code generation
//! - `config`, `error`: runtime configuration and error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis_core::reactive::create_ref;
//! use trellis_core::runtime::{create_renderer, h, next_tick, Component, MemoryHost};
//! use trellis_core::{Object, Value};
//!
//! let count = create_ref(0);
//! let state = count.clone();
//! let counter = Component::new("Counter")
//!     .setup(move |_, _| Object::from_iter([("count", Value::from(state.clone()))]))
//!     .render(|proxy| h("p", None, format!("count: {}", proxy.get("count"))))
//!     .build();
//!
//! let host = Arc::new(MemoryHost::new());
//! let root = host.create_root();
//! create_renderer(host.clone()).create_app(counter).mount(root)?;
//! assert_eq!(host.inner_html(root), "<p>count: 0</p>");
//!
//! count.set(1);
//! next_tick().wait()?;
//! assert_eq!(host.inner_html(root), "<p>count: 1</p>");
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod reactive;
pub mod runtime;
pub mod shared;

pub use compiler::compile;
pub use config::{runtime_config, set_runtime_config, RuntimeConfig};
pub use error::{CompileError, Result, RuntimeError};
pub use reactive::{
    computed, create_ref, effect, effect_with_options, reactive, readonly, shallow_readonly, stop,
};
pub use runtime::{
    create_app, create_renderer, create_text_vnode, get_current_instance, h, inject, next_tick,
    provide, register_runtime_compiler, render_slots,
};
pub use shared::{Object, Value};

/// Build an [`Object`] from `key => value` pairs.
///
/// ```rust,ignore
/// let props = props! { "id" => "app", "count" => 1 };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        <$crate::Object as ::std::iter::FromIterator<(::std::string::String, $crate::Value)>>::from_iter([
            $((::std::string::String::from($key), $crate::Value::from($value))),+
        ])
    };
}
