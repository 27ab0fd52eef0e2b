//! Template AST
//!
//! The parser produces a [`Root`] holding a tree of [`TemplateNode`]s. The
//! transform pass annotates it in place: expressions are rewritten, runs of
//! text are merged into compound nodes, every element gets a [`VNodeCall`]
//! describing the vnode it builds, and the runtime helpers the generated
//! code needs are collected on the root.
//!
//! The AST is serializable so a compiled template can be inspected as JSON.

use serde::{Deserialize, Serialize};

/// Functions the generated render code imports from the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeHelper {
    ToDisplayString,
    CreateElementVNode,
    CreateTextVNode,
    Fragment,
}

impl RuntimeHelper {
    /// Name of the helper in generated code.
    pub fn name(self) -> &'static str {
        match self {
            RuntimeHelper::ToDisplayString => "toDisplayString",
            RuntimeHelper::CreateElementVNode => "createElementVNode",
            RuntimeHelper::CreateTextVNode => "createTextVNode",
            RuntimeHelper::Fragment => "Fragment",
        }
    }
}

/// Top of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub children: Vec<TemplateNode>,
    /// Helpers in first-use order. Filled by the transform pass.
    #[serde(default)]
    pub helpers: Vec<RuntimeHelper>,
    /// What the render function returns. Filled by the transform pass.
    #[serde(default)]
    pub codegen_node: Option<CodegenNode>,
}

impl Root {
    pub fn new(children: Vec<TemplateNode>) -> Self {
        Self {
            children,
            helpers: Vec::new(),
            codegen_node: None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A node of the template tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateNode {
    Element(ElementNode),
    Text { content: String },
    Interpolation { content: SimpleExpression },
    /// Adjacent text and interpolations joined into one expression.
    Compound(CompoundExpression),
}

impl TemplateNode {
    pub fn text(content: impl Into<String>) -> Self {
        TemplateNode::Text {
            content: content.into(),
        }
    }

    pub fn interpolation(expression: impl Into<String>) -> Self {
        TemplateNode::Interpolation {
            content: SimpleExpression::new(expression),
        }
    }

    /// Whether the node renders as text.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            TemplateNode::Text { .. } | TemplateNode::Interpolation { .. } | TemplateNode::Compound(_)
        )
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            TemplateNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// A bare expression such as `message` or `_ctx.user.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleExpression {
    pub content: String,
}

impl SimpleExpression {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
    pub parts: Vec<CompoundPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompoundPart {
    /// Verbatim code between nodes, e.g. ` + `.
    Code(String),
    Node(TemplateNode),
}

/// A static attribute. `value` is `None` for a bare boolean attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub props: Vec<Attribute>,
    pub children: Vec<TemplateNode>,
    #[serde(default)]
    pub codegen_node: Option<VNodeCall>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Vec::new(),
            children: Vec::new(),
            codegen_node: None,
        }
    }
}

/// The `createElementVNode(tag, props, children)` call an element compiles
/// to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VNodeCall {
    pub tag: String,
    pub props: Vec<Attribute>,
    pub children: VNodeCallChildren,
}

impl VNodeCall {
    /// Build the call for `element` from its current children.
    pub fn from_element(element: &ElementNode) -> Self {
        let children = match element.children.as_slice() {
            [] => VNodeCallChildren::None,
            [only] => VNodeCallChildren::Single(Box::new(only.clone())),
            many => VNodeCallChildren::Many(many.to_vec()),
        };
        Self {
            tag: element.tag.clone(),
            props: element.props.clone(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "nodes", rename_all = "snake_case")]
pub enum VNodeCallChildren {
    None,
    Single(Box<TemplateNode>),
    Many(Vec<TemplateNode>),
}

/// What the root of the render function returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "node", rename_all = "snake_case")]
pub enum CodegenNode {
    VNode(VNodeCall),
    /// A lone text-like root.
    Node(TemplateNode),
    /// Several roots wrapped in a fragment.
    Fragment(Vec<CodegenNode>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vnode_call_shapes_children() {
        let mut el = ElementNode::new("div");
        assert_eq!(VNodeCall::from_element(&el).children, VNodeCallChildren::None);

        el.children.push(TemplateNode::text("hi"));
        assert!(matches!(
            VNodeCall::from_element(&el).children,
            VNodeCallChildren::Single(_)
        ));

        el.children.push(TemplateNode::Element(ElementNode::new("p")));
        assert!(matches!(
            VNodeCall::from_element(&el).children,
            VNodeCallChildren::Many(ref nodes) if nodes.len() == 2
        ));
    }

    #[test]
    fn ast_serializes_with_node_types() {
        let root = Root::new(vec![TemplateNode::interpolation("message")]);
        let json = root.to_json().unwrap();
        assert!(json.contains(r#""type":"interpolation""#));
        assert!(json.contains(r#""content":"message""#));
    }
}
