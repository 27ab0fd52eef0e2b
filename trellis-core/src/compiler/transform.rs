//! AST Transforms
//!
//! A transform pass walks the AST depth first and hands every node to a list
//! of [`NodeTransform`]s twice: on the way down (`enter`) and, in reverse
//! order, on the way back up (`exit`). Exit hooks therefore see children
//! that every transform has already finished with.
//!
//! The standard pipeline, in order:
//!
//! 1. [`TransformExpression`] prefixes interpolated expressions with `_ctx.`
//!    so generated code reads them from the render context.
//! 2. [`TransformElement`] builds each element's [`VNodeCall`].
//! 3. [`TransformText`] merges adjacent text and interpolations into one
//!    compound expression.
//!
//! Because exits run in reverse, text merging happens before the element's
//! vnode call is built from its children.

use indexmap::IndexSet;

use super::ast::{
    CodegenNode, CompoundExpression, CompoundPart, Root, RuntimeHelper, TemplateNode, VNodeCall,
};
use super::render::parse_literal;

/// Shared state of one transform pass.
#[derive(Debug, Default)]
pub struct TransformContext {
    helpers: IndexSet<RuntimeHelper>,
}

impl TransformContext {
    /// Record that generated code needs `helper`.
    pub fn helper(&mut self, helper: RuntimeHelper) {
        self.helpers.insert(helper);
    }

    pub fn helpers(&self) -> impl Iterator<Item = RuntimeHelper> + '_ {
        self.helpers.iter().copied()
    }
}

/// A plugin run on every node of the AST.
pub trait NodeTransform {
    fn enter(&self, _node: &mut TemplateNode, _context: &mut TransformContext) {}

    fn exit(&self, _node: &mut TemplateNode, _context: &mut TransformContext) {}
}

/// Rewrites `{{ message }}` to read `_ctx.message`. Literals stay as they
/// are.
pub struct TransformExpression;

impl NodeTransform for TransformExpression {
    fn enter(&self, node: &mut TemplateNode, _context: &mut TransformContext) {
        if let TemplateNode::Interpolation { content } = node {
            if parse_literal(&content.content).is_none() {
                content.content = format!("_ctx.{}", content.content);
            }
        }
    }
}

/// Attaches a `createElementVNode` call to every element.
pub struct TransformElement;

impl NodeTransform for TransformElement {
    fn exit(&self, node: &mut TemplateNode, context: &mut TransformContext) {
        if let TemplateNode::Element(element) = node {
            context.helper(RuntimeHelper::CreateElementVNode);
            if element.children.len() > 1 && element.children.iter().any(TemplateNode::is_text_like) {
                context.helper(RuntimeHelper::CreateTextVNode);
            }
            element.codegen_node = Some(VNodeCall::from_element(element));
        }
    }
}

/// Joins runs of text and interpolations inside an element.
pub struct TransformText;

impl NodeTransform for TransformText {
    fn exit(&self, node: &mut TemplateNode, _context: &mut TransformContext) {
        if let TemplateNode::Element(element) = node {
            merge_text_children(&mut element.children);
        }
    }
}

/// The transforms `compile` runs, in order.
pub fn default_transforms() -> Vec<Box<dyn NodeTransform>> {
    vec![
        Box::new(TransformExpression),
        Box::new(TransformElement),
        Box::new(TransformText),
    ]
}

/// Run `transforms` over `root`, then collect helpers and pick the root
/// codegen node.
pub fn transform(root: &mut Root, transforms: &[Box<dyn NodeTransform>]) {
    let mut context = TransformContext::default();
    for child in &mut root.children {
        traverse_node(child, transforms, &mut context);
    }
    merge_text_children(&mut root.children);
    root.codegen_node = create_root_codegen(&root.children, &mut context);
    root.helpers = context.helpers().collect();
}

fn traverse_node(
    node: &mut TemplateNode,
    transforms: &[Box<dyn NodeTransform>],
    context: &mut TransformContext,
) {
    for transform in transforms {
        transform.enter(node, context);
    }

    match node {
        TemplateNode::Interpolation { .. } => context.helper(RuntimeHelper::ToDisplayString),
        TemplateNode::Element(element) => {
            for child in &mut element.children {
                traverse_node(child, transforms, context);
            }
        }
        TemplateNode::Text { .. } | TemplateNode::Compound(_) => {}
    }

    for transform in transforms.iter().rev() {
        transform.exit(node, context);
    }
}

fn codegen_for(node: &TemplateNode) -> CodegenNode {
    match node {
        TemplateNode::Element(element) => CodegenNode::VNode(
            element
                .codegen_node
                .clone()
                .unwrap_or_else(|| VNodeCall::from_element(element)),
        ),
        other => CodegenNode::Node(other.clone()),
    }
}

fn create_root_codegen(
    children: &[TemplateNode],
    context: &mut TransformContext,
) -> Option<CodegenNode> {
    match children {
        [] => None,
        [only] => Some(codegen_for(only)),
        many => {
            context.helper(RuntimeHelper::CreateElementVNode);
            context.helper(RuntimeHelper::Fragment);
            if many.iter().any(TemplateNode::is_text_like) {
                context.helper(RuntimeHelper::CreateTextVNode);
            }
            Some(CodegenNode::Fragment(many.iter().map(codegen_for).collect()))
        }
    }
}

/// Replace each run of two or more text-like siblings with one compound node.
pub fn merge_text_children(children: &mut Vec<TemplateNode>) {
    let mut merged: Vec<TemplateNode> = Vec::with_capacity(children.len());

    for child in children.drain(..) {
        let joinable = child.is_text_like()
            && merged.last().is_some_and(TemplateNode::is_text_like);
        if !joinable {
            merged.push(child);
            continue;
        }

        let Some(previous) = merged.pop() else {
            continue;
        };
        let mut compound = match previous {
            TemplateNode::Compound(compound) => compound,
            other => CompoundExpression {
                parts: vec![CompoundPart::Node(other)],
            },
        };
        compound.parts.push(CompoundPart::Code(" + ".to_string()));
        compound.parts.push(CompoundPart::Node(child));
        merged.push(TemplateNode::Compound(compound));
    }

    *children = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::{ElementNode, VNodeCallChildren};
    use crate::compiler::parse::base_parse;

    struct AppendText(&'static str);

    impl NodeTransform for AppendText {
        fn enter(&self, node: &mut TemplateNode, _context: &mut TransformContext) {
            if let TemplateNode::Text { content } = node {
                content.push_str(self.0);
            }
        }
    }

    #[test]
    fn plugins_see_every_node() {
        let mut root = base_parse("<div>hi,{{message}}</div>").unwrap();
        transform(&mut root, &[Box::new(AppendText("trellis"))]);

        let div = root.children[0].as_element().unwrap();
        assert_eq!(div.children[0], TemplateNode::text("hi,trellis"));
    }

    #[test]
    fn exits_run_in_reverse_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Record(&'static str, Rc<RefCell<Vec<String>>>);
        impl NodeTransform for Record {
            fn enter(&self, node: &mut TemplateNode, _context: &mut TransformContext) {
                if node.as_element().is_some() {
                    self.1.borrow_mut().push(format!("enter {}", self.0));
                }
            }
            fn exit(&self, node: &mut TemplateNode, _context: &mut TransformContext) {
                if node.as_element().is_some() {
                    self.1.borrow_mut().push(format!("exit {}", self.0));
                }
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut root = base_parse("<div></div>").unwrap();
        transform(
            &mut root,
            &[
                Box::new(Record("a", log.clone())),
                Box::new(Record("b", log.clone())),
            ],
        );
        assert_eq!(*log.borrow(), vec!["enter a", "enter b", "exit b", "exit a"]);
    }

    #[test]
    fn default_pipeline_builds_compound_children() {
        let mut root = base_parse("<div>hi,{{message}}</div>").unwrap();
        transform(&mut root, &default_transforms());

        assert_eq!(
            root.helpers,
            vec![RuntimeHelper::ToDisplayString, RuntimeHelper::CreateElementVNode]
        );
        let Some(CodegenNode::VNode(call)) = &root.codegen_node else {
            panic!("expected a vnode call at the root");
        };
        assert_eq!(call.tag, "div");
        let VNodeCallChildren::Single(child) = &call.children else {
            panic!("expected one merged child");
        };
        assert_eq!(
            **child,
            TemplateNode::Compound(CompoundExpression {
                parts: vec![
                    CompoundPart::Node(TemplateNode::text("hi,")),
                    CompoundPart::Code(" + ".into()),
                    CompoundPart::Node(TemplateNode::interpolation("_ctx.message")),
                ]
            })
        );
    }

    #[test]
    fn literals_are_not_prefixed() {
        let mut root = base_parse("<p>{{ 'a' }}{{ 42 }}{{ infinity }}</p>").unwrap();
        transform(&mut root, &[Box::new(TransformExpression)]);

        let p = root.children[0].as_element().unwrap();
        assert_eq!(
            p.children,
            vec![
                TemplateNode::interpolation("'a'"),
                TemplateNode::interpolation("42"),
                TemplateNode::interpolation("_ctx.infinity"),
            ]
        );
    }

    #[test]
    fn elements_break_text_runs() {
        let mut children = vec![
            TemplateNode::text("a"),
            TemplateNode::Element(ElementNode::new("br")),
            TemplateNode::text("b"),
            TemplateNode::interpolation("c"),
            TemplateNode::text("d"),
        ];
        merge_text_children(&mut children);
        assert_eq!(children.len(), 3);
        let TemplateNode::Compound(compound) = &children[2] else {
            panic!("expected compound");
        };
        assert_eq!(compound.parts.len(), 5);
    }

    #[test]
    fn several_roots_become_a_fragment() {
        let mut root = base_parse("<p>a</p><p>b</p>").unwrap();
        transform(&mut root, &default_transforms());
        assert!(matches!(root.codegen_node, Some(CodegenNode::Fragment(ref nodes)) if nodes.len() == 2));
        assert!(root.helpers.contains(&RuntimeHelper::Fragment));
    }
}
