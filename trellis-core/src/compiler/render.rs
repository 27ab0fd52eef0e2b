//! Render Function Builder
//!
//! Turns a transformed [`Root`] into a [`RenderFn`] the runtime can call.
//! It walks the same codegen tree the code generator prints, so a template
//! renders exactly what its generated source describes.
//!
//! Expressions are dotted paths (`_ctx.user.name`) or literals. The `_ctx`
//! segment stands for the component's public proxy; the remaining segments
//! are read through it, which tracks them for the render effect.

use std::sync::Arc;

use super::ast::{
    Attribute, CodegenNode, CompoundPart, Root, SimpleExpression, TemplateNode, VNodeCall,
    VNodeCallChildren,
};
use crate::runtime::{create_text_vnode, fragment, h, Children, InstanceProxy, RenderFn, VNode};
use crate::shared::{to_display_string, Object, Value};

const CONTEXT_IDENT: &str = "_ctx";

/// Build an executable render function from a transformed AST.
pub fn build_render(root: &Root) -> RenderFn {
    let node = Arc::new(root.codegen_node.clone());
    Arc::new(move |proxy: &InstanceProxy| match node.as_ref() {
        Some(node) => render_codegen_node(node, proxy),
        None => fragment(Vec::new()),
    })
}

fn render_codegen_node(node: &CodegenNode, proxy: &InstanceProxy) -> VNode {
    match node {
        CodegenNode::VNode(call) => render_vnode_call(call, proxy),
        CodegenNode::Node(node) => render_child(node, proxy),
        CodegenNode::Fragment(nodes) => fragment(
            nodes
                .iter()
                .map(|node| render_codegen_node(node, proxy))
                .collect(),
        ),
    }
}

fn render_vnode_call(call: &VNodeCall, proxy: &InstanceProxy) -> VNode {
    let props = props_object(&call.props);
    let children = match &call.children {
        VNodeCallChildren::None => Children::None,
        VNodeCallChildren::Single(child) if child.is_text_like() => {
            Children::from(render_text(child, proxy))
        }
        VNodeCallChildren::Single(child) => Children::from(render_child(child, proxy)),
        VNodeCallChildren::Many(children) => Children::from(
            children
                .iter()
                .map(|child| render_child(child, proxy))
                .collect::<Vec<_>>(),
        ),
    };
    h(call.tag.as_str(), props, children)
}

/// Render a node standing as a vnode of its own.
fn render_child(node: &TemplateNode, proxy: &InstanceProxy) -> VNode {
    match node {
        TemplateNode::Element(element) => match &element.codegen_node {
            Some(call) => render_vnode_call(call, proxy),
            None => render_vnode_call(&VNodeCall::from_element(element), proxy),
        },
        text => create_text_vnode(render_text(text, proxy)),
    }
}

fn render_text(node: &TemplateNode, proxy: &InstanceProxy) -> String {
    match node {
        TemplateNode::Text { content } => content.clone(),
        TemplateNode::Interpolation { content } => {
            to_display_string(&evaluate(content, proxy))
        }
        TemplateNode::Compound(compound) => compound
            .parts
            .iter()
            .filter_map(|part| match part {
                CompoundPart::Node(node) => Some(render_text(node, proxy)),
                CompoundPart::Code(_) => None,
            })
            .collect(),
        TemplateNode::Element(_) => String::new(),
    }
}

fn props_object(attrs: &[Attribute]) -> Option<Object> {
    if attrs.is_empty() {
        return None;
    }
    Some(
        attrs
            .iter()
            .map(|attr| {
                let value = attr.value.clone().unwrap_or_default();
                (attr.name.clone(), Value::from(value))
            })
            .collect(),
    )
}

/// Evaluate a path or literal expression against the proxy.
pub fn evaluate(expression: &SimpleExpression, proxy: &InstanceProxy) -> Value {
    let source = expression.content.trim();

    if let Some(literal) = parse_literal(source) {
        return literal;
    }

    let mut segments = source.split('.').map(str::trim);
    let first = match segments.next() {
        Some(CONTEXT_IDENT) => segments.next(),
        other => other,
    };
    let Some(first) = first else {
        return Value::Null;
    };

    segments.fold(proxy.get(first), |value, key| value.get(key))
}

/// Parse a boolean, null, quoted string, or number literal.
pub(crate) fn parse_literal(source: &str) -> Option<Value> {
    let source = source.trim();
    match source {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" | "undefined" => return Some(Value::Null),
        _ => {}
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = source
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Some(Value::from(inner));
        }
    }
    if !source.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        return None;
    }
    source.parse::<f64>().ok().map(Value::Number)
}
