//! Code Generation
//!
//! Prints a transformed [`Root`] as the source text of a render function:
//!
//! ```text
//! const { toDisplayString: _toDisplayString, createElementVNode: _createElementVNode } = Vue
//! return function render(_ctx,_cache) {return _createElementVNode('div', null, 'hi,' + _toDisplayString(_ctx.message))}
//! ```
//!
//! The text is what a host that evaluates script would load. The runtime
//! itself executes the same tree through [`build_render`](super::build_render).

use super::ast::{
    Attribute, CodegenNode, CompoundPart, Root, RuntimeHelper, TemplateNode, VNodeCall,
    VNodeCallChildren,
};

const RUNTIME_BINDING: &str = "Vue";
const FUNCTION_NAME: &str = "render";
const FUNCTION_ARGS: [&str; 2] = ["_ctx", "_cache"];

/// Generated render function source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenResult {
    pub code: String,
}

struct CodegenContext {
    code: String,
}

impl CodegenContext {
    fn push(&mut self, source: &str) {
        self.code.push_str(source);
    }

    fn helper(&self, helper: RuntimeHelper) -> String {
        format!("_{}", helper.name())
    }
}

/// Print `root` as render function source.
pub fn generate(root: &Root) -> CodegenResult {
    let mut context = CodegenContext {
        code: String::new(),
    };

    gen_function_preamble(root, &mut context);

    context.push(&format!("function {FUNCTION_NAME}({}) {{", FUNCTION_ARGS.join(",")));
    context.push("return ");
    match &root.codegen_node {
        Some(node) => gen_codegen_node(node, &mut context),
        None => context.push("null"),
    }
    context.push("}");

    CodegenResult { code: context.code }
}

fn gen_function_preamble(root: &Root, context: &mut CodegenContext) {
    if !root.helpers.is_empty() {
        let aliases: Vec<String> = root
            .helpers
            .iter()
            .map(|h| format!("{}: _{}", h.name(), h.name()))
            .collect();
        context.push(&format!("const {{ {} }} = {RUNTIME_BINDING}", aliases.join(", ")));
    }
    context.push("\n");
    context.push("return ");
}

fn gen_codegen_node(node: &CodegenNode, context: &mut CodegenContext) {
    match node {
        CodegenNode::VNode(call) => gen_vnode_call(call, context),
        CodegenNode::Node(node) => gen_node(node, context),
        CodegenNode::Fragment(nodes) => {
            let create = context.helper(RuntimeHelper::CreateElementVNode);
            let fragment = context.helper(RuntimeHelper::Fragment);
            context.push(&format!("{create}({fragment}, null, ["));
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    context.push(", ");
                }
                match node {
                    CodegenNode::Node(text) if text.is_text_like() => gen_text_vnode(text, context),
                    other => gen_codegen_node(other, context),
                }
            }
            context.push("])");
        }
    }
}

fn gen_node(node: &TemplateNode, context: &mut CodegenContext) {
    match node {
        TemplateNode::Text { content } => gen_text(content, context),
        TemplateNode::Interpolation { content } => {
            let helper = context.helper(RuntimeHelper::ToDisplayString);
            context.push(&format!("{helper}("));
            context.push(&content.content);
            context.push(")");
        }
        TemplateNode::Compound(compound) => {
            for part in &compound.parts {
                match part {
                    CompoundPart::Code(code) => context.push(code),
                    CompoundPart::Node(node) => gen_node(node, context),
                }
            }
        }
        TemplateNode::Element(element) => match &element.codegen_node {
            Some(call) => gen_vnode_call(call, context),
            None => gen_vnode_call(&VNodeCall::from_element(element), context),
        },
    }
}

fn gen_vnode_call(call: &VNodeCall, context: &mut CodegenContext) {
    let helper = context.helper(RuntimeHelper::CreateElementVNode);
    context.push(&format!("{helper}("));
    gen_text(&call.tag, context);
    context.push(", ");
    gen_props(&call.props, context);
    context.push(", ");
    match &call.children {
        VNodeCallChildren::None => context.push("null"),
        VNodeCallChildren::Single(child) => gen_node(child, context),
        VNodeCallChildren::Many(children) => {
            context.push("[");
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    context.push(", ");
                }
                if child.is_text_like() {
                    gen_text_vnode(child, context);
                } else {
                    gen_node(child, context);
                }
            }
            context.push("]");
        }
    }
    context.push(")");
}

fn gen_text_vnode(node: &TemplateNode, context: &mut CodegenContext) {
    let helper = context.helper(RuntimeHelper::CreateTextVNode);
    context.push(&format!("{helper}("));
    gen_node(node, context);
    context.push(")");
}

fn gen_props(props: &[Attribute], context: &mut CodegenContext) {
    if props.is_empty() {
        context.push("null");
        return;
    }
    let entries: Vec<String> = props
        .iter()
        .map(|attr| {
            let key = if is_identifier(&attr.name) {
                attr.name.clone()
            } else {
                quote(&attr.name)
            };
            format!("{key}: {}", quote(attr.value.as_deref().unwrap_or_default()))
        })
        .collect();
    context.push(&format!("{{ {} }}", entries.join(", ")));
}

fn gen_text(text: &str, context: &mut CodegenContext) {
    context.push(&quote(text));
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Single-quoted string literal.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
