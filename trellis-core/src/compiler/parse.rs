//! Template Parser
//!
//! Turns template source into a [`Root`]. Supported syntax is deliberately
//! small: nested elements with static attributes, self-closing elements,
//! plain text, and `{{ expression }}` interpolation.
//!
//! # Algorithm
//!
//! A cursor walks the source once. `parse_children` keeps a stack of open
//! tags; a closing tag that matches any open ancestor ends the current
//! child list, and the element that opened it checks that the closing tag
//! is its own. A closing tag matching no open element is rejected instead of
//! being read as text.

use tracing::trace;

use super::ast::{Attribute, ElementNode, Root, TemplateNode};
use crate::error::CompileError;

const OPEN_DELIMITER: &str = "{{";
const CLOSE_DELIMITER: &str = "}}";

struct ParserContext<'a> {
    source: &'a str,
}

impl<'a> ParserContext<'a> {
    fn advance_by(&mut self, len: usize) {
        self.source = &self.source[len..];
    }

    fn advance_whitespace(&mut self) {
        self.source = self.source.trim_start();
    }

    /// Consume and return the next `len` bytes.
    fn take(&mut self, len: usize) -> &'a str {
        let (taken, rest) = self.source.split_at(len);
        self.source = rest;
        taken
    }
}

/// Parse `template` into an untransformed AST.
pub fn base_parse(template: &str) -> Result<Root, CompileError> {
    let mut context = ParserContext { source: template };
    let children = parse_children(&mut context, &mut Vec::new())?;
    if children.is_empty() {
        return Err(CompileError::EmptyTemplate);
    }
    trace!(nodes = children.len(), "parsed template");
    Ok(Root::new(children))
}

fn parse_children(
    context: &mut ParserContext<'_>,
    ancestors: &mut Vec<String>,
) -> Result<Vec<TemplateNode>, CompileError> {
    let mut nodes = Vec::new();

    while !is_end(context, ancestors) {
        let s = context.source;
        let node = if s.starts_with(OPEN_DELIMITER) {
            parse_interpolation(context)?
        } else if let Some(rest) = s.strip_prefix("</") {
            return Err(CompileError::UnexpectedEndTag {
                tag: tag_name(rest).to_string(),
            });
        } else if starts_with_tag_open(s) {
            parse_element(context, ancestors)?
        } else {
            parse_text(context)
        };
        nodes.push(node);
    }

    Ok(nodes)
}

fn is_end(context: &ParserContext<'_>, ancestors: &[String]) -> bool {
    let s = context.source;
    if s.is_empty() {
        return true;
    }
    s.starts_with("</")
        && ancestors
            .iter()
            .rev()
            .any(|tag| starts_with_end_tag_open(s, tag))
}

fn starts_with_tag_open(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_with_end_tag_open(s: &str, tag: &str) -> bool {
    let Some(rest) = s.strip_prefix("</") else {
        return false;
    };
    let name = tag_name(rest);
    name.eq_ignore_ascii_case(tag)
}

fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(s.len());
    &s[..end]
}

fn parse_interpolation(context: &mut ParserContext<'_>) -> Result<TemplateNode, CompileError> {
    let close = context.source[OPEN_DELIMITER.len()..]
        .find(CLOSE_DELIMITER)
        .ok_or(CompileError::UnclosedInterpolation)?;

    context.advance_by(OPEN_DELIMITER.len());
    let raw = context.take(close);
    context.advance_by(CLOSE_DELIMITER.len());

    Ok(TemplateNode::interpolation(raw.trim()))
}

fn parse_element(
    context: &mut ParserContext<'_>,
    ancestors: &mut Vec<String>,
) -> Result<TemplateNode, CompileError> {
    let (mut element, self_closing) = parse_start_tag(context)?;
    if self_closing {
        return Ok(TemplateNode::Element(element));
    }

    ancestors.push(element.tag.clone());
    let children = parse_children(context, ancestors);
    ancestors.pop();
    element.children = children?;

    if starts_with_end_tag_open(context.source, &element.tag) {
        parse_end_tag(context);
        Ok(TemplateNode::Element(element))
    } else {
        Err(CompileError::MissingEndTag { tag: element.tag })
    }
}

/// Parse `<tag attr="v" ...>` or `<tag ... />`.
fn parse_start_tag(context: &mut ParserContext<'_>) -> Result<(ElementNode, bool), CompileError> {
    context.advance_by(1);
    let tag = tag_name(context.source).to_string();
    context.advance_by(tag.len());

    let mut element = ElementNode::new(tag);
    loop {
        context.advance_whitespace();
        let s = context.source;
        if s.is_empty() {
            return Err(CompileError::MissingEndTag { tag: element.tag });
        }
        if let Some(rest) = s.strip_prefix("/>") {
            context.source = rest;
            return Ok((element, true));
        }
        if let Some(rest) = s.strip_prefix('>') {
            context.source = rest;
            return Ok((element, false));
        }
        element.props.push(parse_attribute(context));
    }
}

fn parse_attribute(context: &mut ParserContext<'_>) -> Attribute {
    let s = context.source;
    let name_len = s
        .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
        .unwrap_or(s.len())
        // A stray '/' or '=' still has to make progress.
        .max(1);
    let name = context.take(name_len).to_string();

    context.advance_whitespace();
    let Some(rest) = context.source.strip_prefix('=') else {
        return Attribute { name, value: None };
    };
    context.source = rest.trim_start();

    let s = context.source;
    let value = match s.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let body = &s[1..];
            let end = body.find(quote).unwrap_or(body.len());
            context.advance_by(1);
            let value = context.take(end).to_string();
            if !context.source.is_empty() {
                context.advance_by(1);
            }
            value
        }
        _ => {
            let end = s
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(s.len());
            context.take(end).to_string()
        }
    };
    Attribute {
        name,
        value: Some(value),
    }
}

fn parse_end_tag(context: &mut ParserContext<'_>) {
    let end = context.source.find('>').map_or(context.source.len(), |i| i + 1);
    context.advance_by(end);
}

fn parse_text(context: &mut ParserContext<'_>) -> TemplateNode {
    let s = context.source;
    // The first character is always text, even a '<' that opens no tag.
    let first = s.chars().next().map_or(0, char::len_utf8);
    let end = [OPEN_DELIMITER, "<"]
        .iter()
        .filter_map(|token| s[first..].find(token).map(|i| i + first))
        .min()
        .unwrap_or(s.len());

    TemplateNode::text(context.take(end))
}
