//! Binding patterns and formal parameters.
//!
//! Patterns are parsed directly in declarations and parameter lists, or
//! recovered from an already parsed expression when the cover grammar turns
//! out to be a pattern (`[a, b] = c`, `(a, {b}) => c`).

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::error::{messages, ParseError};
use crate::parser::{Parser, Result};
use crate::span::Span;
use crate::token::{is_restricted_word, is_strict_mode_reserved_word, RawToken, TokenKind};

/// Where a parameter error is reported.
#[derive(Debug, Clone)]
pub(crate) enum Offender {
    /// A scanned token.
    Token(RawToken),
    /// A name recovered from an arrow parameter list; it has no token, so the
    /// error is reported at the current position.
    Binding,
}

/// Result of parsing a parameter list.
///
/// Violations that depend on whether the function body turns out to be
/// strict are recorded here and reported after the body is parsed.
#[derive(Debug, Default)]
pub(crate) struct FormalParameters {
    /// Only plain identifiers, no defaults, patterns or rest.
    pub simple: bool,
    pub has_duplicate_parameter_names: bool,
    pub params: Vec<Node>,
    pub param_set: FxHashSet<String>,
    /// Error in strict code regardless of the body.
    pub stricted: Option<Offender>,
    /// Error if the body turns out to be strict.
    pub first_restricted: Option<Offender>,
    pub message: Option<&'static str>,
}

impl FormalParameters {
    fn new(first_restricted: Option<RawToken>) -> Self {
        Self {
            simple: true,
            first_restricted: first_restricted.map(Offender::Token),
            ..Self::default()
        }
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn offender_error(&self, offender: &Offender, message: Option<&str>) -> ParseError {
        match offender {
            Offender::Token(token) => self.unexpected_token_error(Some(token), message),
            Offender::Binding => self.unexpected_token_error(None, message),
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    /// `...pattern` inside an array pattern.
    fn parse_binding_rest_element(&mut self, params: &mut Vec<RawToken>, kind: Option<VarKind>) -> Result<Node> {
        let node = self.create_node();
        self.expect("...")?;
        let argument = self.parse_pattern(params, kind)?;
        Ok(self.finalize(
            node,
            NodeKind::RestElement {
                argument: Box::new(argument),
            },
        ))
    }

    fn parse_array_pattern(&mut self, params: &mut Vec<RawToken>, kind: Option<VarKind>) -> Result<Node> {
        let node = self.create_node();
        let mut elements = Vec::new();

        self.expect("[")?;
        while !self.check("]") {
            if self.check(",") {
                self.next_token()?;
                elements.push(None);
                continue;
            }
            if self.check("...") {
                elements.push(Some(self.parse_binding_rest_element(params, kind)?));
                break;
            }
            elements.push(Some(self.parse_pattern_with_default(params, kind)?));
            if !self.check("]") {
                self.expect(",")?;
            }
        }
        self.expect("]")?;

        Ok(self.finalize(node, NodeKind::ArrayPattern { elements }))
    }

    fn parse_property_pattern(&mut self, params: &mut Vec<RawToken>, kind: Option<VarKind>) -> Result<Node> {
        let node = self.create_node();
        let mut computed = false;
        let mut shorthand = false;
        let key;
        let value;

        if self.lookahead.kind == TokenKind::Identifier {
            let key_token = self.lookahead.clone();
            key = self.parse_variable_identifier(None)?;
            let init = self.finalize(
                node,
                NodeKind::Identifier {
                    name: key_token.value.clone(),
                },
            );
            if self.check("=") {
                params.push(key_token.clone());
                shorthand = true;
                self.next_token()?;
                let expr = self.parse_assignment_expression()?;
                value = self.finalize(
                    self.start_node(&key_token),
                    NodeKind::AssignmentPattern {
                        left: Box::new(init),
                        right: Box::new(expr),
                    },
                );
            } else if !self.check(":") {
                params.push(key_token);
                shorthand = true;
                value = init;
            } else {
                self.expect(":")?;
                value = self.parse_pattern_with_default(params, kind)?;
            }
        } else {
            computed = self.check("[");
            key = self.parse_object_property_key()?;
            self.expect(":")?;
            value = self.parse_pattern_with_default(params, kind)?;
        }

        Ok(self.finalize(
            node,
            NodeKind::Property {
                key: Box::new(key),
                computed,
                value: Box::new(value),
                kind: PropertyKind::Init,
                method: false,
                shorthand,
            },
        ))
    }

    /// `...rest` as the last member of an object pattern.
    fn parse_rest_property(&mut self, params: &mut Vec<RawToken>) -> Result<Node> {
        let node = self.create_node();
        self.expect("...")?;
        let argument = self.parse_pattern(params, None)?;
        if self.check("=") {
            return Err(self.error(messages::DEFAULT_REST_PROPERTY, &[]));
        }
        if !self.check("}") {
            return Err(self.error(messages::PROPERTY_AFTER_REST_PROPERTY, &[]));
        }
        Ok(self.finalize(
            node,
            NodeKind::RestElement {
                argument: Box::new(argument),
            },
        ))
    }

    fn parse_object_pattern(&mut self, params: &mut Vec<RawToken>, kind: Option<VarKind>) -> Result<Node> {
        let node = self.create_node();
        let mut properties = Vec::new();

        self.expect("{")?;
        while !self.check("}") {
            let property = if self.check("...") {
                self.parse_rest_property(params)?
            } else {
                self.parse_property_pattern(params, kind)?
            };
            properties.push(property);
            if !self.check("}") {
                self.expect(",")?;
            }
        }
        self.expect("}")?;

        Ok(self.finalize(node, NodeKind::ObjectPattern { properties }))
    }

    /// A binding identifier or destructuring pattern. Every bound name token
    /// is pushed onto `params`.
    pub(crate) fn parse_pattern(&mut self, params: &mut Vec<RawToken>, kind: Option<VarKind>) -> Result<Node> {
        if self.check("[") {
            return self.parse_array_pattern(params, kind);
        }
        if self.check("{") {
            return self.parse_object_pattern(params, kind);
        }
        if self.check_keyword("let") && matches!(kind, Some(VarKind::Const | VarKind::Let)) {
            self.tolerate(self.unexpected_with(&self.lookahead, messages::LET_IN_LEXICAL_BINDING))?;
        }
        params.push(self.lookahead.clone());
        self.parse_variable_identifier(kind)
    }

    /// A pattern with an optional `= default`.
    pub(crate) fn parse_pattern_with_default(
        &mut self,
        params: &mut Vec<RawToken>,
        kind: Option<VarKind>,
    ) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let pattern = self.parse_pattern(params, kind)?;
        if !self.check("=") {
            return Ok(pattern);
        }

        self.next_token()?;
        let right = self.with_context(
            |c| c.allow_yield = true,
            |p| p.isolate_cover_grammar(Parser::parse_assignment_expression),
        )?;
        Ok(self.finalize(
            self.start_node(&start_token),
            NodeKind::AssignmentPattern {
                left: Box::new(pattern),
                right: Box::new(right),
            },
        ))
    }

    /// A name being bound. `let` is accepted as a `var` name in sloppy code.
    pub(crate) fn parse_variable_identifier(&mut self, kind: Option<VarKind>) -> Result<Node> {
        let node = self.create_node();
        let token = self.next_token()?;

        if token.is_keyword("yield") {
            if self.context.strict {
                self.tolerate(self.unexpected_with(&token, messages::STRICT_RESERVED_WORD))?;
            } else if !self.context.allow_yield {
                return Err(self.unexpected(&token));
            }
        } else if token.kind != TokenKind::Identifier {
            if self.context.strict && token.kind == TokenKind::Keyword && is_strict_mode_reserved_word(&token.value) {
                self.tolerate(self.unexpected_with(&token, messages::STRICT_RESERVED_WORD))?;
            } else if self.context.strict || token.value != "let" || kind != Some(VarKind::Var) {
                return Err(self.unexpected(&token));
            }
        } else if (self.context.is_module || self.context.is_async) && token.value == "await" {
            self.tolerate(self.unexpected(&token))?;
        }

        Ok(self.finalize(node, NodeKind::Identifier { name: token.value }))
    }

    // =========================================================================
    // Formal parameters
    // =========================================================================

    /// Record `name` in the parameter set, noting strict mode violations.
    fn validate_param(&self, options: &mut FormalParameters, offender: Offender, name: &str) {
        if self.context.strict {
            if is_restricted_word(name) {
                options.stricted = Some(offender.clone());
                options.message = Some(messages::STRICT_PARAM_NAME);
            }
            if options.param_set.contains(name) {
                options.stricted = Some(offender);
                options.has_duplicate_parameter_names = true;
            }
        } else if options.first_restricted.is_none() {
            if is_restricted_word(name) {
                options.first_restricted = Some(offender);
                options.message = Some(messages::STRICT_PARAM_NAME);
            } else if is_strict_mode_reserved_word(name) {
                options.first_restricted = Some(offender);
                options.message = Some(messages::STRICT_RESERVED_WORD);
            } else if options.param_set.contains(name) {
                options.stricted = Some(offender);
                options.has_duplicate_parameter_names = true;
            }
        }
        options.param_set.insert(name.to_string());
    }

    /// `...rest` as the last formal parameter.
    pub(crate) fn parse_rest_element(&mut self, params: &mut Vec<RawToken>) -> Result<Node> {
        let node = self.create_node();
        self.expect("...")?;
        let argument = self.parse_pattern(params, None)?;
        if self.check("=") {
            return Err(self.error(messages::DEFAULT_REST_PARAMETER, &[]));
        }
        if !self.check(")") {
            return Err(self.error(messages::PARAMETER_AFTER_REST_PARAMETER, &[]));
        }
        Ok(self.finalize(
            node,
            NodeKind::RestElement {
                argument: Box::new(argument),
            },
        ))
    }

    fn parse_formal_parameter(&mut self, options: &mut FormalParameters) -> Result<()> {
        let mut params = Vec::new();
        let param = if self.check("...") {
            self.parse_rest_element(&mut params)?
        } else {
            self.parse_pattern_with_default(&mut params, None)?
        };
        for token in params {
            let name = token.value.clone();
            self.validate_param(options, Offender::Token(token), &name);
        }
        options.simple &= param.is_identifier();
        options.params.push(param);
        Ok(())
    }

    /// `( a, b = 1, ...c )`.
    pub(crate) fn parse_formal_parameters(&mut self, first_restricted: Option<RawToken>) -> Result<FormalParameters> {
        let mut options = FormalParameters::new(first_restricted);

        self.expect("(")?;
        if !self.check(")") {
            while self.lookahead.kind != TokenKind::Eof {
                self.parse_formal_parameter(&mut options)?;
                if self.check(")") {
                    break;
                }
                self.expect(",")?;
                if self.check(")") {
                    break;
                }
            }
        }
        self.expect(")")?;

        if options.has_duplicate_parameter_names
            && (self.context.strict || self.context.is_async || !options.simple)
        {
            return Err(self.error(messages::DUPLICATE_PARAMETER, &[]));
        }
        Ok(options)
    }

    /// Validate the names bound by an arrow parameter recovered from an
    /// expression.
    fn check_pattern_param(&self, options: &mut FormalParameters, param: &Node) {
        match &param.kind {
            NodeKind::Identifier { name } => self.validate_param(options, Offender::Binding, name),
            NodeKind::RestElement { argument } => self.check_pattern_param(options, argument),
            NodeKind::AssignmentPattern { left, .. } => self.check_pattern_param(options, left),
            NodeKind::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.check_pattern_param(options, element);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for property in properties {
                    match &property.kind {
                        NodeKind::Property { value, .. } => self.check_pattern_param(options, value),
                        _ => self.check_pattern_param(options, property),
                    }
                }
            }
            _ => {}
        }
        options.simple &= param.is_identifier();
    }

    /// Turn an identifier or parenthesized placeholder into an arrow
    /// function's parameter list.
    pub(crate) fn reinterpret_as_cover_formals_list(&mut self, expr: Node, is_async: bool) -> Result<FormalParameters> {
        let raw_params = match expr.kind {
            NodeKind::ArrowParameterPlaceholder { params, .. } => params,
            NodeKind::Identifier { .. } => vec![expr],
            _ => return Err(self.unexpected(&self.lookahead)),
        };

        let mut options = FormalParameters::new(None);
        let mut params = Vec::with_capacity(raw_params.len());
        for mut param in raw_params {
            if let NodeKind::AssignmentPattern { right, .. } = &mut param.kind {
                match &right.kind {
                    NodeKind::YieldExpression { argument: Some(_), .. } => {
                        return Err(self.unexpected(&self.lookahead));
                    }
                    NodeKind::YieldExpression { argument: None, .. } => {
                        replace_with(right, |node| node.with_kind(NodeKind::Identifier { name: "yield".into() }));
                    }
                    _ => {}
                }
            } else if is_async && param.identifier_name() == Some("await") {
                return Err(self.unexpected(&self.lookahead));
            }
            self.check_pattern_param(&mut options, &param);
            params.push(param);
        }

        if (self.context.strict || !self.context.allow_yield)
            && params.iter().any(|p| matches!(p.kind, NodeKind::YieldExpression { .. }))
        {
            return Err(self.unexpected(&self.lookahead));
        }

        if options.has_duplicate_parameter_names {
            let offender = if self.context.strict {
                options.stricted.as_ref()
            } else {
                options.first_restricted.as_ref()
            };
            return Err(match offender {
                Some(offender) => self.offender_error(offender, Some(messages::DUPLICATE_PARAMETER)),
                None => self.unexpected_token_error(None, Some(messages::DUPLICATE_PARAMETER)),
            });
        }

        options.params = params;
        Ok(options)
    }
}

/// Convert an expression parsed under the cover grammar into a pattern.
/// Nodes that are already patterns, and invalid targets, pass through.
pub(crate) fn reinterpret_as_pattern(mut expr: Node) -> Node {
    let kind = std::mem::replace(&mut expr.kind, NodeKind::EmptyStatement);
    expr.kind = match kind {
        NodeKind::SpreadElement { argument } => NodeKind::RestElement {
            argument: Box::new(reinterpret_as_pattern(*argument)),
        },
        NodeKind::ArrayExpression { elements } => NodeKind::ArrayPattern {
            elements: elements.into_iter().map(|e| e.map(reinterpret_as_pattern)).collect(),
        },
        NodeKind::ObjectExpression { properties } => NodeKind::ObjectPattern {
            properties: properties.into_iter().map(reinterpret_property).collect(),
        },
        NodeKind::AssignmentExpression { left, right, .. } => NodeKind::AssignmentPattern {
            left: Box::new(reinterpret_as_pattern(*left)),
            right,
        },
        other => other,
    };
    expr
}

fn reinterpret_property(mut property: Node) -> Node {
    if matches!(property.kind, NodeKind::SpreadElement { .. }) {
        return reinterpret_as_pattern(property);
    }
    if let NodeKind::Property { value, .. } = &mut property.kind {
        replace_with(value, reinterpret_as_pattern);
    }
    property
}

/// Replace a boxed child with `f` applied to it.
fn replace_with(slot: &mut Node, f: impl FnOnce(Node) -> Node) {
    let node = std::mem::replace(slot, Node::new(NodeKind::EmptyStatement, Span::default()));
    *slot = f(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;

    fn parse(source: &str) -> std::result::Result<Program, ParseError> {
        Parser::new(source, &ParseOptions::default(), None).and_then(Parser::parse_program)
    }

    fn first_function_params(program: &Program) -> Vec<Node> {
        match &program.body()[0].kind {
            NodeKind::FunctionDeclaration { params, .. } => params.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reinterpret_nested_array() {
        let span = Span::new(0, 1);
        let ident = |name: &str| Node::new(NodeKind::Identifier { name: name.into() }, span);
        let spread = Node::new(
            NodeKind::SpreadElement {
                argument: Box::new(ident("rest")),
            },
            span,
        );
        let array = Node::new(
            NodeKind::ArrayExpression {
                elements: vec![Some(ident("a")), None, Some(spread)],
            },
            span,
        );
        let pattern = reinterpret_as_pattern(array);
        match pattern.kind {
            NodeKind::ArrayPattern { elements } => {
                assert_eq!(elements.len(), 3);
                assert!(elements[1].is_none());
                assert!(matches!(
                    elements[2].as_ref().map(|e| &e.kind),
                    Some(NodeKind::RestElement { .. })
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reinterpret_keeps_identity() {
        let mut node = Node::new(NodeKind::ObjectExpression { properties: vec![] }, Span::new(3, 5));
        node.id = NodeId(7);
        let pattern = reinterpret_as_pattern(node);
        assert_eq!(pattern.id, NodeId(7));
        assert_eq!(pattern.span, Span::new(3, 5));
        assert!(matches!(pattern.kind, NodeKind::ObjectPattern { .. }));
    }

    #[test]
    fn test_formal_parameters() {
        let program = parse("function f(a, [b, c] = [], {d, e: f}, ...g) {}").unwrap();
        let params = first_function_params(&program);
        assert_eq!(params.len(), 4);
        assert!(params[0].is_identifier());
        assert!(matches!(params[1].kind, NodeKind::AssignmentPattern { .. }));
        assert!(matches!(params[2].kind, NodeKind::ObjectPattern { .. }));
        assert!(matches!(params[3].kind, NodeKind::RestElement { .. }));
    }

    #[test]
    fn test_rest_parameter_must_be_last() {
        let err = parse("function f(...a, b) {}").unwrap_err();
        assert_eq!(err.description, messages::PARAMETER_AFTER_REST_PARAMETER);
        let err = parse("function f(...a = 1) {}").unwrap_err();
        assert_eq!(err.description, messages::DEFAULT_REST_PARAMETER);
    }

    #[test]
    fn test_duplicate_parameters() {
        // Sloppy functions with simple lists allow duplicates.
        parse("function f(a, a) {}").unwrap();
        let err = parse("function f(a, [a]) {}").unwrap_err();
        assert_eq!(err.description, messages::DUPLICATE_PARAMETER);
        let err = parse("'use strict'; function f(a, a) {}").unwrap_err();
        assert_eq!(err.description, messages::DUPLICATE_PARAMETER);
        let err = parse("(a, a) => 1").unwrap_err();
        assert_eq!(err.description, messages::DUPLICATE_PARAMETER);
    }

    #[test]
    fn test_strict_body_rejects_restricted_param() {
        let err = parse("function f(eval) { 'use strict'; }").unwrap_err();
        assert_eq!(err.description, messages::STRICT_PARAM_NAME);
    }

    #[test]
    fn test_arrow_yield_default_becomes_identifier() {
        let program = parse("(a = yield) => a").unwrap();
        let json = program.to_json().unwrap();
        let param = &json["body"][0]["expression"]["params"][0];
        assert_eq!(param["type"], "AssignmentPattern");
        assert_eq!(param["right"]["type"], "Identifier");
        assert_eq!(param["right"]["name"], "yield");
    }

    #[test]
    fn test_async_arrow_await_param() {
        assert!(parse("async (await) => 1").is_err());
    }

    #[test]
    fn test_rest_property_must_be_last() {
        let err = parse("let {...a, b} = c").unwrap_err();
        assert_eq!(err.description, messages::PROPERTY_AFTER_REST_PROPERTY);
    }

    #[test]
    fn test_let_in_lexical_binding() {
        let err = parse("let let = 1").unwrap_err();
        assert_eq!(err.description, messages::LET_IN_LEXICAL_BINDING);
        // `var let` is fine in sloppy code.
        parse("var let = 1").unwrap();
    }
}
