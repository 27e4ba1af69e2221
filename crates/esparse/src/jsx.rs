//! JSX elements, parsed as primary expressions when JSX is enabled.
//!
//! Inside an element the regular scanner is bypassed: JSX tokens (names with
//! hyphens, attribute strings with entities, raw text) are lexed here
//! directly from the source. Embedded `{ expression }` regions hand control
//! back to the regular scanner and re-enter JSX at the closing brace.

use crate::ast::{Node, NodeKind};
use crate::entities;
use crate::error::messages;
use crate::parser::{Parser, Result};
use crate::scanner::{is_identifier_part, is_identifier_start, is_line_terminator};
use crate::span::Marker;
use crate::token::{RawToken, TokenKind};

/// An element whose children are still being parsed.
struct OpenElement {
    marker: Marker,
    opening: Node,
    closing: Option<Node>,
    children: Vec<Node>,
}

/// Fully qualified element name, e.g. `svg:path` or `Foo.Bar`.
fn qualified_element_name(name: &Node) -> String {
    match &name.kind {
        NodeKind::JsxIdentifier { name } => name.clone(),
        NodeKind::JsxNamespacedName { namespace, name } => {
            format!("{}:{}", qualified_element_name(namespace), qualified_element_name(name))
        }
        NodeKind::JsxMemberExpression { object, property } => {
            format!("{}.{}", qualified_element_name(object), qualified_element_name(property))
        }
        _ => String::new(),
    }
}

/// `JSXFragment` when both ends are fragments, `JSXElement` otherwise.
fn element_kind(opening: Node, children: Vec<Node>, closing: Option<Node>) -> NodeKind {
    match closing {
        Some(closing)
            if matches!(opening.kind, NodeKind::JsxOpeningFragment)
                && matches!(closing.kind, NodeKind::JsxClosingFragment) =>
        {
            NodeKind::JsxFragment {
                opening_fragment: Box::new(opening),
                children,
                closing_fragment: Box::new(closing),
            }
        }
        closing => NodeKind::JsxElement {
            opening_element: Box::new(opening),
            children,
            closing_element: closing.map(Box::new),
        },
    }
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Scanner hand-off
    // =========================================================================

    /// Rewind the scanner to the start of the lookahead token.
    fn start_jsx(&mut self) {
        self.scanner.index = self.start_marker.index;
        self.scanner.line_number = self.start_marker.line;
        self.scanner.line_start = self.start_marker.index - self.start_marker.column as usize;
    }

    /// Prime the regular lookahead after leaving JSX.
    fn finish_jsx(&mut self) -> Result<()> {
        self.next_token()?;
        Ok(())
    }

    /// Leave an embedded expression: the `}` lookahead is rescanned in JSX
    /// mode.
    fn reenter_jsx(&mut self) -> Result<()> {
        self.start_jsx();
        self.expect_jsx("}")?;
        if self.config.tokens {
            self.tokens.pop();
        }
        Ok(())
    }

    /// Hand an embedded `{ ... }` to the regular scanner. The closing brace it
    /// scans as lookahead pops the region again.
    fn enter_expression(&mut self) -> Result<()> {
        self.scanner.push_brace();
        self.finish_jsx()
    }

    fn create_jsx_node(&mut self) -> Result<Marker> {
        self.collect_comments()?;
        Ok(self.scanner_marker())
    }

    #[inline]
    fn create_jsx_child_node(&self) -> Marker {
        self.scanner_marker()
    }

    #[inline]
    fn jsx_char(&self) -> Option<char> {
        self.scanner.source().get(self.scanner.index..).and_then(|s| s.chars().next())
    }

    // =========================================================================
    // Lexing
    // =========================================================================

    /// Character reference after a `&`. Unknown or malformed references are
    /// kept verbatim.
    fn scan_xhtml_entity(&mut self, quote: char) -> String {
        let mut result = String::from("&");
        let mut valid = true;
        let mut terminated = false;
        let mut numeric = false;
        let mut hex = false;

        while valid && !terminated {
            let Some(ch) = self.jsx_char() else {
                break;
            };
            if ch == quote {
                break;
            }
            terminated = ch == ';';
            result.push(ch);
            self.scanner.index += ch.len_utf8();
            if terminated {
                break;
            }
            match result.chars().count() {
                2 => numeric = ch == '#',
                3 if numeric => {
                    hex = ch == 'x';
                    valid = hex || ch.is_ascii_digit();
                    numeric = !hex;
                }
                3 => {}
                _ => {
                    valid = valid && !(numeric && !ch.is_ascii_digit());
                    valid = valid && !(hex && !ch.is_ascii_hexdigit());
                }
            }
        }

        if !(valid && terminated && result.len() > 2) {
            return result;
        }
        let name = &result[1..result.len() - 1];
        let decoded = if numeric && name.len() > 1 {
            name[1..].parse::<u32>().ok().and_then(char::from_u32)
        } else if hex && name.len() > 2 {
            u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
        } else if !numeric && !hex {
            entities::lookup(name)
        } else {
            None
        };
        decoded.map_or(result, String::from)
    }

    /// Scan one JSX token; anything JSX does not claim goes to the regular
    /// scanner.
    fn lex_jsx(&mut self) -> Result<RawToken> {
        let start = self.scanner.index;
        let Some(ch) = self.jsx_char() else {
            return self.scanner.lex();
        };

        match ch {
            '<' | '>' | '/' | ':' | '=' | '{' | '}' => {
                self.scanner.index += 1;
                Ok(self.jsx_token(TokenKind::Punctuator, ch.to_string(), start))
            }
            '"' | '\'' => {
                self.scanner.index += 1;
                let mut value = String::new();
                while let Some(c) = self.jsx_char() {
                    self.scanner.index += c.len_utf8();
                    if c == ch {
                        break;
                    } else if c == '&' {
                        value.push_str(&self.scan_xhtml_entity(ch));
                    } else {
                        value.push(c);
                    }
                }
                Ok(self.jsx_token(TokenKind::StringLiteral, value, start))
            }
            '.' => {
                let rest = self.scanner.source().get(start..).unwrap_or("");
                let value = if rest.starts_with("...") { "..." } else { "." };
                self.scanner.index += value.len();
                Ok(self.jsx_token(TokenKind::Punctuator, value.to_string(), start))
            }
            // Placeholder only; a template is never a valid JSX token.
            '`' => Ok(self.jsx_token(TokenKind::Template, String::new(), start)),
            c if is_identifier_start(c) => {
                self.scanner.index += c.len_utf8();
                while let Some(c) = self.jsx_char() {
                    if !(is_identifier_part(c) || c == '-') {
                        break;
                    }
                    self.scanner.index += c.len_utf8();
                }
                let name = self.scanner.source().get(start..self.scanner.index).unwrap_or("").to_string();
                Ok(self.jsx_token(TokenKind::JsxIdentifier, name, start))
            }
            _ => self.scanner.lex(),
        }
    }

    fn jsx_token(&self, kind: TokenKind, value: String, start: usize) -> RawToken {
        RawToken::new(kind, value).at(self.scanner.line_number, self.scanner.line_start, start, self.scanner.index)
    }

    fn next_jsx_token(&mut self) -> Result<RawToken> {
        self.collect_comments()?;
        self.start_marker = self.scanner_marker();
        let token = self.lex_jsx()?;
        self.last_marker = self.scanner_marker();
        if self.config.tokens {
            let entry = self.convert_token(&token);
            self.tokens.push(entry);
        }
        Ok(token)
    }

    /// Raw text up to the next `{` or `<`.
    fn next_jsx_text(&mut self) -> RawToken {
        self.start_marker = self.scanner_marker();
        let start = self.scanner.index;

        let mut text = String::new();
        while let Some(ch) = self.jsx_char() {
            if ch == '{' || ch == '<' {
                break;
            }
            self.scanner.index += ch.len_utf8();
            text.push(ch);
            if is_line_terminator(ch) {
                if ch == '\r' && self.jsx_char() == Some('\n') {
                    self.scanner.index += 1;
                    text.push('\n');
                }
                self.scanner.line_number += 1;
                self.scanner.line_start = self.scanner.index;
            }
        }

        self.last_marker = self.scanner_marker();
        let token = RawToken::new(TokenKind::JsxText, text).at(
            self.scanner.line_number,
            self.scanner.line_start,
            start,
            self.scanner.index,
        );
        if self.config.tokens && token.start < token.end {
            let entry = self.convert_token(&token);
            self.tokens.push(entry);
        }
        token
    }

    fn peek_jsx_token(&mut self) -> Result<RawToken> {
        let state = self.scanner.save_state();
        let next = self.scanner.scan_comments().and_then(|_| self.lex_jsx());
        self.scanner.restore_state(state);
        next
    }

    fn expect_jsx(&mut self, value: &str) -> Result<()> {
        let token = self.next_jsx_token()?;
        if !token.is_punctuator(value) {
            return Err(self.unexpected(&token));
        }
        Ok(())
    }

    fn match_jsx(&mut self, value: &str) -> Result<bool> {
        Ok(self.peek_jsx_token()?.is_punctuator(value))
    }

    // =========================================================================
    // Names and attributes
    // =========================================================================

    fn parse_jsx_identifier(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let token = self.next_jsx_token()?;
        if token.kind != TokenKind::JsxIdentifier {
            return Err(self.unexpected(&token));
        }
        Ok(self.finalize(node, NodeKind::JsxIdentifier { name: token.value }))
    }

    fn parse_jsx_element_name(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let element_name = self.parse_jsx_identifier()?;

        if self.match_jsx(":")? {
            self.expect_jsx(":")?;
            let name = self.parse_jsx_identifier()?;
            return Ok(self.finalize(
                node,
                NodeKind::JsxNamespacedName {
                    namespace: Box::new(element_name),
                    name: Box::new(name),
                },
            ));
        }

        let mut name = element_name;
        while self.match_jsx(".")? {
            self.expect_jsx(".")?;
            let property = self.parse_jsx_identifier()?;
            name = self.finalize(
                node,
                NodeKind::JsxMemberExpression {
                    object: Box::new(name),
                    property: Box::new(property),
                },
            );
        }
        Ok(name)
    }

    fn parse_jsx_attribute_name(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let identifier = self.parse_jsx_identifier()?;
        if !self.match_jsx(":")? {
            return Ok(identifier);
        }
        self.expect_jsx(":")?;
        let name = self.parse_jsx_identifier()?;
        Ok(self.finalize(
            node,
            NodeKind::JsxNamespacedName {
                namespace: Box::new(identifier),
                name: Box::new(name),
            },
        ))
    }

    fn parse_jsx_string_literal_attribute(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let token = self.next_jsx_token()?;
        if token.kind != TokenKind::StringLiteral {
            return Err(self.unexpected(&token));
        }
        Ok(self.finalize_literal(node, &token))
    }

    fn parse_jsx_expression_attribute(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        self.expect_jsx("{")?;
        self.enter_expression()?;
        if self.check("}") {
            self.tolerate_error(messages::JSX_EMPTY_ATTRIBUTE_EXPRESSION, &[])?;
        }
        let expression = self.parse_assignment_expression()?;
        self.reenter_jsx()?;
        Ok(self.finalize(
            node,
            NodeKind::JsxExpressionContainer {
                expression: Box::new(expression),
            },
        ))
    }

    fn parse_jsx_attribute_value(&mut self) -> Result<Node> {
        if self.match_jsx("{")? {
            self.parse_jsx_expression_attribute()
        } else if self.match_jsx("<")? {
            self.parse_jsx_element()
        } else {
            self.parse_jsx_string_literal_attribute()
        }
    }

    fn parse_jsx_name_value_attribute(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let name = self.parse_jsx_attribute_name()?;
        let mut value = None;
        if self.match_jsx("=")? {
            self.expect_jsx("=")?;
            value = Some(self.parse_jsx_attribute_value()?);
        }
        Ok(self.finalize(
            node,
            NodeKind::JsxAttribute {
                name: Box::new(name),
                value: value.map(Box::new),
            },
        ))
    }

    fn parse_jsx_spread_attribute(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        self.expect_jsx("{")?;
        self.expect_jsx("...")?;
        self.enter_expression()?;
        let argument = self.parse_assignment_expression()?;
        self.reenter_jsx()?;
        Ok(self.finalize(
            node,
            NodeKind::JsxSpreadAttribute {
                argument: Box::new(argument),
            },
        ))
    }

    fn parse_jsx_attributes(&mut self) -> Result<Vec<Node>> {
        let mut attributes = Vec::new();
        while !self.match_jsx("/")? && !self.match_jsx(">")? {
            let attribute = if self.match_jsx("{")? {
                self.parse_jsx_spread_attribute()?
            } else {
                self.parse_jsx_name_value_attribute()?
            };
            attributes.push(attribute);
        }
        Ok(attributes)
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Name, attributes and `>` of an opening tag whose `<` is consumed.
    fn parse_jsx_opening_rest(&mut self, node: Marker) -> Result<Node> {
        let name = self.parse_jsx_element_name()?;
        let attributes = self.parse_jsx_attributes()?;
        let self_closing = self.match_jsx("/")?;
        if self_closing {
            self.expect_jsx("/")?;
        }
        self.expect_jsx(">")?;
        Ok(self.finalize(
            node,
            NodeKind::JsxOpeningElement {
                name: Box::new(name),
                self_closing,
                attributes,
            },
        ))
    }

    fn parse_jsx_opening_element(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        self.expect_jsx("<")?;
        if self.match_jsx(">")? {
            self.expect_jsx(">")?;
            return Ok(self.finalize(node, NodeKind::JsxOpeningFragment));
        }
        self.parse_jsx_opening_rest(node)
    }

    /// Any tag met among children: opening, closing, or a fragment end.
    fn parse_jsx_boundary_element(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        self.expect_jsx("<")?;
        if !self.match_jsx("/")? {
            return self.parse_jsx_opening_rest(node);
        }

        self.expect_jsx("/")?;
        if self.match_jsx(">")? {
            self.expect_jsx(">")?;
            return Ok(self.finalize(node, NodeKind::JsxClosingFragment));
        }
        let name = self.parse_jsx_element_name()?;
        self.expect_jsx(">")?;
        Ok(self.finalize(node, NodeKind::JsxClosingElement { name: Box::new(name) }))
    }

    fn parse_jsx_empty_expression(&mut self) -> Result<Node> {
        let node = self.create_jsx_child_node();
        self.collect_comments()?;
        self.last_marker = self.scanner_marker();
        Ok(self.finalize(node, NodeKind::JsxEmptyExpression))
    }

    fn parse_jsx_expression_container(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        self.expect_jsx("{")?;

        let expression = if self.match_jsx("}")? {
            let empty = self.parse_jsx_empty_expression()?;
            self.expect_jsx("}")?;
            empty
        } else {
            self.enter_expression()?;
            let expression = self.parse_assignment_expression()?;
            self.reenter_jsx()?;
            expression
        };

        Ok(self.finalize(
            node,
            NodeKind::JsxExpressionContainer {
                expression: Box::new(expression),
            },
        ))
    }

    /// Text and `{}` children up to the next tag.
    fn parse_jsx_children(&mut self) -> Result<Vec<Node>> {
        let mut children = Vec::new();
        while !self.scanner.eof() {
            let node = self.create_jsx_child_node();
            let token = self.next_jsx_text();
            if token.start < token.end {
                let raw = self.token_raw(&token).to_string();
                children.push(self.finalize(node, NodeKind::JsxText { value: token.value, raw }));
            }
            if self.jsx_char() != Some('{') {
                break;
            }
            children.push(self.parse_jsx_expression_container()?);
        }
        Ok(children)
    }

    /// Children of `el` up to its closing tag. Nested elements are kept on an
    /// explicit stack.
    fn parse_complex_jsx_element(&mut self, mut el: OpenElement) -> Result<OpenElement> {
        let mut stack: Vec<OpenElement> = Vec::new();

        while !self.scanner.eof() {
            let children = self.parse_jsx_children()?;
            el.children.extend(children);
            let node = self.create_jsx_child_node();
            let element = self.parse_jsx_boundary_element()?;

            match &element.kind {
                NodeKind::JsxOpeningElement { self_closing: true, .. } => {
                    let child = self.finalize(node, element_kind(element, Vec::new(), None));
                    el.children.push(child);
                }
                NodeKind::JsxOpeningElement { .. } => {
                    let parent = std::mem::replace(
                        &mut el,
                        OpenElement {
                            marker: node,
                            opening: element,
                            closing: None,
                            children: Vec::new(),
                        },
                    );
                    stack.push(parent);
                }
                NodeKind::JsxClosingElement { name } => {
                    match &el.opening.kind {
                        NodeKind::JsxOpeningElement { name: open, .. } => {
                            let open = qualified_element_name(open);
                            if open != qualified_element_name(name) {
                                self.tolerate_error(messages::JSX_CLOSING_TAG_MISMATCH, &[&open])?;
                            }
                        }
                        _ => self.tolerate_error(messages::JSX_FRAGMENT_MISMATCH, &[])?,
                    }
                    el.closing = Some(element);
                    let Some(parent) = stack.pop() else {
                        break;
                    };
                    let done = std::mem::replace(&mut el, parent);
                    let child = self.finalize(done.marker, element_kind(done.opening, done.children, done.closing));
                    el.children.push(child);
                }
                NodeKind::JsxClosingFragment => {
                    let is_fragment = matches!(el.opening.kind, NodeKind::JsxOpeningFragment);
                    el.closing = Some(element);
                    if is_fragment {
                        break;
                    }
                    self.tolerate_error(messages::JSX_FRAGMENT_MISMATCH, &[])?;
                }
                _ => {}
            }
        }

        Ok(el)
    }

    fn parse_jsx_element(&mut self) -> Result<Node> {
        let node = self.create_jsx_node()?;
        let opening = self.parse_jsx_opening_element()?;

        let kind = if matches!(opening.kind, NodeKind::JsxOpeningElement { self_closing: true, .. }) {
            element_kind(opening, Vec::new(), None)
        } else {
            let el = self.parse_complex_jsx_element(OpenElement {
                marker: node,
                opening,
                closing: None,
                children: Vec::new(),
            })?;
            element_kind(el.opening, el.children, el.closing)
        };
        Ok(self.finalize(node, kind))
    }

    /// Entry from expression parsing with `<` as the lookahead.
    pub(crate) fn parse_jsx_root(&mut self) -> Result<Node> {
        // The `<` was already recorded as a regular token.
        if self.config.tokens {
            self.tokens.pop();
        }
        self.start_jsx();
        let element = self.parse_jsx_element()?;
        self.finish_jsx()?;
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{messages, ParseError};
    use crate::options::ParseOptions;
    use crate::parser::Parser;

    fn parse_jsx(source: &str) -> Result<serde_json::Value, ParseError> {
        let options = ParseOptions::new().with_jsx(true);
        let program = Parser::new(source, &options, None).and_then(Parser::parse_program)?;
        Ok(program.to_json().unwrap())
    }

    fn expression(source: &str) -> serde_json::Value {
        parse_jsx(source).unwrap()["body"][0]["expression"].clone()
    }

    #[test]
    fn test_element_with_attributes_and_children() {
        let el = expression("<div className=\"box\" {...props} data-id={id}>hi {name}</div>");
        assert_eq!(el["type"], "JSXElement");
        let opening = &el["openingElement"];
        assert_eq!(opening["name"]["name"], "div");
        assert_eq!(opening["selfClosing"], false);
        assert_eq!(opening["attributes"][0]["value"]["value"], "box");
        assert_eq!(opening["attributes"][1]["type"], "JSXSpreadAttribute");
        assert_eq!(opening["attributes"][2]["name"]["name"], "data-id");
        assert_eq!(opening["attributes"][2]["value"]["type"], "JSXExpressionContainer");
        assert_eq!(el["children"][0]["type"], "JSXText");
        assert_eq!(el["children"][0]["value"], "hi ");
        assert_eq!(el["children"][1]["expression"]["name"], "name");
        assert_eq!(el["closingElement"]["name"]["name"], "div");
    }

    #[test]
    fn test_self_closing() {
        let el = expression("<br />");
        assert_eq!(el["openingElement"]["selfClosing"], true);
        assert!(el["closingElement"].is_null());
        assert_eq!(el["children"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_fragment() {
        let el = expression("<>a<b/></>");
        assert_eq!(el["type"], "JSXFragment");
        assert_eq!(el["openingFragment"]["type"], "JSXOpeningFragment");
        assert_eq!(el["children"][1]["type"], "JSXElement");
        assert_eq!(el["closingFragment"]["type"], "JSXClosingFragment");
    }

    #[test]
    fn test_element_names() {
        let el = expression("<svg:path />");
        assert_eq!(el["openingElement"]["name"]["type"], "JSXNamespacedName");
        assert_eq!(el["openingElement"]["name"]["namespace"]["name"], "svg");

        let el = expression("<A.B.C></A.B.C>");
        let name = &el["openingElement"]["name"];
        assert_eq!(name["type"], "JSXMemberExpression");
        assert_eq!(name["property"]["name"], "C");
        assert_eq!(name["object"]["object"]["name"], "A");
    }

    #[test]
    fn test_attribute_entities() {
        let el = expression("<a b=\"&amp;&#65;&#x42;&bogus;&lt\" />");
        let value = &el["openingElement"]["attributes"][0]["value"];
        assert_eq!(value["value"], "&AB&bogus;&lt");
        assert_eq!(value["raw"], "\"&amp;&#65;&#x42;&bogus;&lt\"");
    }

    #[test]
    fn test_nested_elements() {
        let el = expression("<a><b /><c>t</c></a>");
        let children = el["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1]["openingElement"]["name"]["name"], "c");
        assert_eq!(children[1]["children"][0]["raw"], "t");
    }

    #[test]
    fn test_empty_expression_container() {
        let el = expression("<a>{/* note */}</a>");
        assert_eq!(el["children"][0]["expression"]["type"], "JSXEmptyExpression");
    }

    #[test]
    fn test_closing_tag_mismatch() {
        let err = parse_jsx("<a></b>").unwrap_err();
        assert_eq!(err.description, "Expected corresponding JSX closing tag for a");
    }

    #[test]
    fn test_empty_attribute_expression() {
        let err = parse_jsx("<a b={} />").unwrap_err();
        assert_eq!(err.description, messages::JSX_EMPTY_ATTRIBUTE_EXPRESSION);
    }

    #[test]
    fn test_jsx_inside_template_substitution() {
        let expr = expression("`x${<a>{y}</a>}z`");
        assert_eq!(expr["type"], "TemplateLiteral");
        assert_eq!(expr["expressions"][0]["type"], "JSXElement");
        assert_eq!(expr["quasis"][1]["value"]["raw"], "z");
    }

    #[test]
    fn test_expression_after_element() {
        let json = parse_jsx("x = <a>{b}</a>; y").unwrap();
        assert_eq!(json["body"][0]["expression"]["right"]["type"], "JSXElement");
        assert_eq!(json["body"][1]["expression"]["name"], "y");
    }

    #[test]
    fn test_multiline_text() {
        let el = expression("<a>\r\n  b\n</a>");
        assert_eq!(el["children"][0]["value"], "\r\n  b\n");
    }

    #[test]
    fn test_jsx_disabled() {
        let err = Parser::new("<a />", &ParseOptions::new(), None)
            .and_then(Parser::parse_program)
            .unwrap_err();
        assert_eq!(err.description, "Unexpected token <");
    }
}
