//! Template Compiler
//!
//! Compiles an HTML-like template into a render function. Components that
//! carry only a `template` are compiled on first mount once a compiler has
//! been installed with [`register_runtime_compiler`]; [`compile`] is the
//! function to install.
//!
//! # Pipeline
//!
//! ```text
//! template ──► parse ──► AST ──► transform ──► annotated AST ──┬──► generate ──► source text
//!                                                              └──► build_render ──► RenderFn
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::runtime::{register_runtime_compiler, Component};
//!
//! register_runtime_compiler(trellis_core::compile);
//! let hello = Component::new("Hello")
//!     .template("<div>hi, {{ name }}</div>")
//!     .build();
//! ```
//!
//! [`register_runtime_compiler`]: crate::runtime::register_runtime_compiler

mod ast;
mod codegen;
mod parse;
mod render;
mod transform;

pub use ast::{
    Attribute, CodegenNode, CompoundExpression, CompoundPart, ElementNode, Root, RuntimeHelper,
    SimpleExpression, TemplateNode, VNodeCall, VNodeCallChildren,
};
pub use codegen::{generate, CodegenResult};
pub use parse::base_parse;
pub use render::{build_render, evaluate};
pub use transform::{
    default_transforms, merge_text_children, transform, NodeTransform, TransformContext,
    TransformElement, TransformExpression, TransformText,
};

use tracing::debug;

use crate::error::CompileError;
use crate::runtime::RenderFn;

/// Output of a full compile.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub ast: Root,
    pub code: String,
}

/// Parse, transform, and generate source for `template`.
pub fn base_compile(template: &str) -> Result<CompileOutput, CompileError> {
    let mut ast = base_parse(template)?;
    transform(&mut ast, &default_transforms());
    let CodegenResult { code } = generate(&ast);
    debug!(helpers = ast.helpers.len(), bytes = code.len(), "compiled template");
    Ok(CompileOutput { ast, code })
}

/// Compile `template` into an executable render function.
pub fn compile(template: &str) -> Result<RenderFn, CompileError> {
    let CompileOutput { ast, .. } = base_compile(template)?;
    Ok(build_render(&ast))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
