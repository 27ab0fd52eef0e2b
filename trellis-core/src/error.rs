//! Error Types
//!
//! Every fallible runtime operation returns [`RuntimeError`]; template
//! compilation reports [`CompileError`], which converts into a runtime error
//! when compilation happens lazily during component setup.
//!
//! Non-fatal conditions (writing through a readonly proxy, wrapping a
//! primitive in `reactive`) are not errors: they are reported through
//! `tracing` and the operation degrades gracefully.

use thiserror::Error;

/// Errors raised while compiling a template into a render function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An element was opened but its closing tag never appeared.
    #[error("lack end tag: {tag}")]
    MissingEndTag { tag: String },

    /// A closing tag appeared with no matching open element.
    #[error("unexpected end tag: {tag}")]
    UnexpectedEndTag { tag: String },

    /// An interpolation `{{` was never closed.
    #[error("interpolation is missing its closing delimiter `}}}}`")]
    UnclosedInterpolation,

    /// The template produced no nodes at all.
    #[error("template is empty")]
    EmptyTemplate,
}

/// Errors raised by the renderer, component setup, or the job scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Lazy template compilation failed during component setup.
    #[error("template compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// A component has neither a render function nor a compilable template.
    #[error("component `{component}` has no render function")]
    MissingRender { component: String },

    /// A job re-queued itself more often than the configured limit within a
    /// single flush.
    #[error("maximum recursive updates exceeded ({limit}); a component may be mutating its own render dependencies")]
    RecursionLimit { limit: usize },
}

/// Result alias used throughout the runtime.
pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
