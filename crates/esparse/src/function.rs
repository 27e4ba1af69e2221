//! Functions, methods, classes and directive prologues.

use std::mem;

use crate::ast::*;
use crate::error::messages;
use crate::params::FormalParameters;
use crate::parser::{function_expression, is_property_key, qualified_property_name, Parser, Result};
use crate::token::{is_restricted_word, is_strict_mode_reserved_word, RawToken, TokenKind};

/// Pieces shared by function declarations and expressions.
struct FunctionParts {
    id: Option<Node>,
    params: Vec<Node>,
    body: Node,
    generator: bool,
    is_async: bool,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Bodies and directives
    // =========================================================================

    /// `{ directives; statements }` of a function or arrow body.
    pub(crate) fn parse_function_source_elements(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect("{")?;
        let mut body = self.parse_directive_prologues()?;

        let labels = mem::take(&mut self.label_set);
        let result = self.with_context(
            |c| {
                c.in_iteration = false;
                c.in_switch = false;
                c.in_function_body = true;
            },
            |p| {
                while p.lookahead.kind != TokenKind::Eof && !p.check("}") {
                    body.push(p.parse_statement_list_item()?);
                }
                p.expect("}")
            },
        );
        self.label_set = labels;
        result?;

        Ok(self.finalize(node, NodeKind::BlockStatement { body }))
    }

    fn parse_directive(&mut self) -> Result<Node> {
        let token = self.lookahead.clone();
        let node = self.create_node();
        let expr = self.parse_expression()?;
        let directive = match expr.kind {
            NodeKind::Literal { .. } => {
                let raw = self.token_raw(&token);
                raw.get(1..raw.len().saturating_sub(1)).map(str::to_string)
            }
            _ => None,
        };
        self.consume_semicolon()?;

        let kind = match directive {
            Some(directive) if !directive.is_empty() => NodeKind::Directive {
                expression: Box::new(expr),
                directive,
            },
            _ => NodeKind::ExpressionStatement {
                expression: Box::new(expr),
            },
        };
        Ok(self.finalize(node, kind))
    }

    /// Leading string-literal statements of a script, module or function body.
    pub(crate) fn parse_directive_prologues(&mut self) -> Result<Vec<Node>> {
        let mut first_restricted: Option<RawToken> = None;
        let mut body = Vec::new();

        while self.lookahead.kind == TokenKind::StringLiteral {
            let token = self.lookahead.clone();
            let statement = self.parse_directive()?;
            let directive = match &statement.kind {
                NodeKind::Directive { directive, .. } => Some(directive.clone()),
                _ => None,
            };
            body.push(statement);
            let Some(directive) = directive else { break };

            if directive == "use strict" {
                self.context.strict = true;
                if let Some(octal) = &first_restricted {
                    self.tolerate(self.unexpected_with(octal, messages::STRICT_OCTAL_LITERAL))?;
                }
                if !self.context.allow_strict_directive {
                    self.tolerate(self.unexpected_with(&token, messages::ILLEGAL_LANGUAGE_MODE_DIRECTIVE))?;
                }
            } else if first_restricted.is_none() && token.octal {
                first_restricted = Some(token);
            }
        }

        Ok(body)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// `async function` on one line.
    pub(crate) fn match_async_function(&mut self) -> Result<bool> {
        if !self.check_contextual("async") {
            return Ok(false);
        }
        let line = self.scanner.line_number;
        let next = self.peek_token()?;
        Ok(line == next.line_number && next.is_keyword("function"))
    }

    /// Name checks for a function id. Returns the token and message to report
    /// if the body turns out to be strict.
    fn check_function_name(&mut self, token: &RawToken) -> Result<(Option<RawToken>, Option<&'static str>)> {
        if self.context.strict {
            if is_restricted_word(&token.value) {
                self.tolerate(self.unexpected_with(token, messages::STRICT_FUNCTION_NAME))?;
            }
            Ok((None, None))
        } else if is_restricted_word(&token.value) {
            Ok((Some(token.clone()), Some(messages::STRICT_FUNCTION_NAME)))
        } else if is_strict_mode_reserved_word(&token.value) {
            Ok((Some(token.clone()), Some(messages::STRICT_RESERVED_WORD)))
        } else {
            Ok((None, None))
        }
    }

    /// Parameters and body, with the deferred strict mode checks.
    fn parse_function_rest(
        &mut self,
        first_restricted: Option<RawToken>,
        message: Option<&'static str>,
    ) -> Result<(Vec<Node>, Node)> {
        let FormalParameters {
            simple,
            params,
            stricted,
            first_restricted,
            message: params_message,
            ..
        } = self.parse_formal_parameters(first_restricted)?;
        let message = params_message.or(message);

        let body = self.with_context(
            |c| c.allow_strict_directive = simple,
            |p| {
                let body = p.parse_function_source_elements()?;
                if p.context.strict {
                    if let Some(offender) = &first_restricted {
                        return Err(p.offender_error(offender, message));
                    }
                    if let Some(offender) = &stricted {
                        p.tolerate(p.offender_error(offender, message))?;
                    }
                }
                Ok(body)
            },
        )?;
        Ok((params, body))
    }

    fn parse_function(&mut self, identifier_is_optional: bool, is_expression: bool) -> Result<FunctionParts> {
        let is_async = self.check_contextual("async");
        if is_async {
            if !is_expression && self.context.in_iteration {
                self.tolerate_error(messages::ASYNC_FUNCTION_IN_SINGLE_STATEMENT_CONTEXT, &[])?;
            }
            self.next_token()?;
        }
        self.expect_keyword("function")?;

        let generator = self.check("*");
        if generator {
            self.next_token()?;
        }

        self.with_context(
            |c| {
                if is_expression {
                    c.is_async = is_async;
                    c.allow_yield = !generator;
                }
            },
            |p| {
                let mut id = None;
                let mut first_restricted = None;
                let mut message = None;
                if !(identifier_is_optional && p.check("(")) {
                    let token = p.lookahead.clone();
                    id = Some(if is_expression && !p.context.strict && !generator && p.check_keyword("yield") {
                        p.parse_identifier_name()?
                    } else {
                        p.parse_variable_identifier(None)?
                    });
                    (first_restricted, message) = p.check_function_name(&token)?;
                }

                let (params, body) = p.with_context(
                    |c| {
                        c.is_async = is_async;
                        c.allow_yield = !generator;
                    },
                    |p| p.parse_function_rest(first_restricted, message),
                )?;

                Ok(FunctionParts {
                    id,
                    params,
                    body,
                    generator,
                    is_async,
                })
            },
        )
    }

    /// `function f() {}`, optionally `async` or a generator. The name may be
    /// omitted after `export default`.
    pub(crate) fn parse_function_declaration(&mut self, identifier_is_optional: bool) -> Result<Node> {
        let node = self.create_node();
        let parts = self.parse_function(identifier_is_optional, false)?;
        Ok(self.finalize(
            node,
            NodeKind::FunctionDeclaration {
                id: parts.id.map(Box::new),
                params: parts.params,
                body: Box::new(parts.body),
                generator: parts.generator,
                expression: false,
                is_async: parts.is_async,
            },
        ))
    }

    pub(crate) fn parse_function_expression(&mut self) -> Result<Node> {
        let node = self.create_node();
        let parts = self.parse_function(true, true)?;
        Ok(self.finalize(
            node,
            function_expression(parts.id, parts.params, parts.body, parts.generator, parts.is_async),
        ))
    }

    // =========================================================================
    // Methods
    // =========================================================================

    pub(crate) fn parse_getter_method(&mut self) -> Result<Node> {
        let node = self.create_node();
        let (params, body) = self.with_context(
            |c| c.allow_yield = true,
            |p| {
                let params = p.parse_formal_parameters(None)?;
                if !params.params.is_empty() {
                    p.tolerate_error(messages::BAD_GETTER_ARITY, &[])?;
                }
                let body = p.parse_property_method(&params)?;
                Ok((params.params, body))
            },
        )?;
        Ok(self.finalize(node, function_expression(None, params, body, false, false)))
    }

    pub(crate) fn parse_setter_method(&mut self) -> Result<Node> {
        let node = self.create_node();
        let (params, body) = self.with_context(
            |c| c.allow_yield = true,
            |p| {
                let params = p.parse_formal_parameters(None)?;
                match params.params.as_slice() {
                    [param] if matches!(param.kind, NodeKind::RestElement { .. }) => {
                        p.tolerate_error(messages::BAD_SETTER_REST_PARAMETER, &[])?;
                    }
                    [_] => {}
                    _ => p.tolerate_error(messages::BAD_SETTER_ARITY, &[])?,
                }
                let body = p.parse_property_method(&params)?;
                Ok((params.params, body))
            },
        )?;
        Ok(self.finalize(node, function_expression(None, params, body, false, false)))
    }

    pub(crate) fn parse_generator_method(&mut self) -> Result<Node> {
        let node = self.create_node();
        let params = self.with_context(|c| c.allow_yield = true, |p| p.parse_formal_parameters(None))?;
        let body = self.with_context(|c| c.allow_yield = false, |p| p.parse_property_method(&params))?;
        Ok(self.finalize(node, function_expression(None, params.params, body, true, false)))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn parse_class_element(&mut self, has_constructor: &mut bool) -> Result<Node> {
        let mut token = self.lookahead.clone();
        let node = self.create_node();

        let mut kind: Option<MethodKind> = None;
        let mut key: Option<Node> = None;
        let mut value: Option<Node> = None;
        let mut computed = false;
        let mut method = false;
        let mut is_static = false;
        let mut is_async = false;
        let mut is_generator = false;

        if self.check("*") {
            self.next_token()?;
        } else {
            computed = self.check("[");
            let parsed = self.parse_object_property_key()?;
            let names_static = parsed.identifier_name() == Some("static");
            key = Some(parsed);
            if names_static && (qualified_property_name(&self.lookahead) || self.check("*")) {
                token = self.lookahead.clone();
                is_static = true;
                computed = self.check("[");
                if self.check("*") {
                    self.next_token()?;
                } else {
                    key = Some(self.parse_object_property_key()?);
                }
            }
            if token.is_identifier("async") && !self.has_line_terminator && !self.check(":") && !self.check("(") {
                is_async = true;
                is_generator = self.check("*");
                if is_generator {
                    self.next_token()?;
                }
                token = self.lookahead.clone();
                computed = self.check("[");
                key = Some(self.parse_object_property_key()?);
                if token.is_identifier("constructor") {
                    self.tolerate(self.unexpected_with(&token, messages::CONSTRUCTOR_IS_ASYNC))?;
                }
            }
        }

        let lookahead_property_key = qualified_property_name(&self.lookahead);
        if token.kind == TokenKind::Identifier {
            if token.value == "get" && lookahead_property_key {
                kind = Some(MethodKind::Get);
                computed = self.check("[");
                key = Some(self.parse_object_property_key()?);
                value = Some(self.parse_getter_method()?);
            } else if token.value == "set" && lookahead_property_key {
                kind = Some(MethodKind::Set);
                computed = self.check("[");
                key = Some(self.parse_object_property_key()?);
                value = Some(self.parse_setter_method()?);
            }
        } else if token.is_punctuator("*") && lookahead_property_key {
            kind = Some(MethodKind::Method);
            computed = self.check("[");
            key = Some(self.parse_object_property_key()?);
            value = Some(self.parse_generator_method()?);
            method = true;
        }

        if kind.is_none() && key.is_some() && self.check("(") {
            let in_constructor = token.value == "constructor";
            kind = Some(MethodKind::Method);
            value = Some(self.with_context(
                |c| c.in_class_constructor = in_constructor,
                |p| {
                    if is_async {
                        p.parse_property_method_async_function(is_generator)
                    } else {
                        p.parse_property_method_function(is_generator)
                    }
                },
            )?);
            method = true;
        }

        let (Some(mut kind), Some(key), Some(value)) = (kind, key, value) else {
            return Err(self.unexpected(&self.lookahead));
        };

        if !computed {
            if is_static && is_property_key(&key, "prototype") {
                return Err(self.unexpected_with(&token, messages::STATIC_PROTOTYPE));
            }
            if !is_static && is_property_key(&key, "constructor") {
                let generator = matches!(value.kind, NodeKind::FunctionExpression { generator: true, .. });
                if kind != MethodKind::Method || !method || generator {
                    return Err(self.unexpected_with(&token, messages::CONSTRUCTOR_SPECIAL_METHOD));
                }
                if *has_constructor {
                    return Err(self.unexpected_with(&token, messages::DUPLICATE_CONSTRUCTOR));
                }
                *has_constructor = true;
                kind = MethodKind::Constructor;
            }
        }

        Ok(self.finalize(
            node,
            NodeKind::MethodDefinition {
                key: Box::new(key),
                computed,
                value: Box::new(value),
                kind,
                is_static,
            },
        ))
    }

    fn parse_class_body(&mut self) -> Result<Node> {
        let node = self.create_node();
        let mut body = Vec::new();
        let mut has_constructor = false;

        self.expect("{")?;
        while !self.check("}") {
            if self.check(";") {
                self.next_token()?;
            } else {
                body.push(self.parse_class_element(&mut has_constructor)?);
            }
        }
        self.expect("}")?;

        Ok(self.finalize(node, NodeKind::ClassBody { body }))
    }

    /// `extends` clause and body; class code is always strict.
    fn parse_class_tail(&mut self) -> Result<(Option<Node>, Node)> {
        let super_class = if self.check_keyword("extends") {
            self.next_token()?;
            Some(self.isolate_cover_grammar(Self::parse_left_hand_side_expression_allow_call)?)
        } else {
            None
        };
        let body = self.parse_class_body()?;
        Ok((super_class, body))
    }

    pub(crate) fn parse_class_declaration(&mut self, identifier_is_optional: bool) -> Result<Node> {
        let node = self.create_node();
        let (id, super_class, body) = self.with_context(
            |c| c.strict = true,
            |p| {
                p.expect_keyword("class")?;
                let id = if identifier_is_optional && p.lookahead.kind != TokenKind::Identifier {
                    None
                } else {
                    Some(p.parse_variable_identifier(None)?)
                };
                let (super_class, body) = p.parse_class_tail()?;
                Ok((id, super_class, body))
            },
        )?;
        Ok(self.finalize(
            node,
            NodeKind::ClassDeclaration {
                id: id.map(Box::new),
                super_class: super_class.map(Box::new),
                body: Box::new(body),
            },
        ))
    }

    pub(crate) fn parse_class_expression(&mut self) -> Result<Node> {
        let node = self.create_node();
        let (id, super_class, body) = self.with_context(
            |c| c.strict = true,
            |p| {
                p.expect_keyword("class")?;
                let id = if p.lookahead.kind == TokenKind::Identifier {
                    Some(p.parse_variable_identifier(None)?)
                } else {
                    None
                };
                let (super_class, body) = p.parse_class_tail()?;
                Ok((id, super_class, body))
            },
        )?;
        Ok(self.finalize(
            node,
            NodeKind::ClassExpression {
                id: id.map(Box::new),
                super_class: super_class.map(Box::new),
                body: Box::new(body),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::{messages, ParseError};
    use crate::options::ParseOptions;
    use crate::parser::Parser;

    fn parse(source: &str) -> Result<Program, ParseError> {
        Parser::new(source, &ParseOptions::default(), None).and_then(Parser::parse_program)
    }

    fn json(source: &str) -> serde_json::Value {
        parse(source).unwrap().to_json().unwrap()
    }

    #[test]
    fn test_function_declaration() {
        let json = json("async function* f(a) { yield a; }");
        let decl = &json["body"][0];
        assert_eq!(decl["type"], "FunctionDeclaration");
        assert_eq!(decl["id"]["name"], "f");
        assert_eq!(decl["async"], true);
        assert_eq!(decl["generator"], true);
        assert_eq!(decl["body"]["body"][0]["expression"]["type"], "YieldExpression");
    }

    #[test]
    fn test_async_function_expression_is_async() {
        let json = json("x = async function () {}");
        assert_eq!(json["body"][0]["expression"]["right"]["async"], true);
    }

    #[test]
    fn test_directive_prologue() {
        let json = json("'use strict'; 'other'; a;");
        assert_eq!(json["body"][0]["directive"], "use strict");
        assert_eq!(json["body"][1]["directive"], "other");
        assert!(json["body"][2].get("directive").is_none());
    }

    #[test]
    fn test_directive_makes_body_strict() {
        let err = parse("function f() { 'use strict'; with (a) {} }").unwrap_err();
        assert_eq!(err.description, messages::STRICT_MODE_WITH);
        // Outside the function the code is sloppy again.
        parse("function f() { 'use strict'; } with (a) {}").unwrap();
    }

    #[test]
    fn test_octal_before_use_strict() {
        let err = parse("function f() { '\\01'; 'use strict'; }").unwrap_err();
        assert_eq!(err.description, messages::STRICT_OCTAL_LITERAL);
    }

    #[test]
    fn test_use_strict_with_non_simple_params() {
        let err = parse("function f(a = 1) { 'use strict'; }").unwrap_err();
        assert_eq!(err.description, messages::ILLEGAL_LANGUAGE_MODE_DIRECTIVE);
    }

    #[test]
    fn test_strict_function_name() {
        let err = parse("function eval() { 'use strict'; }").unwrap_err();
        assert_eq!(err.description, messages::STRICT_FUNCTION_NAME);
    }

    #[test]
    fn test_accessors() {
        let json = json("({ get a() { return 1; }, set a(v) {} })");
        let props = &json["body"][0]["expression"]["properties"];
        assert_eq!(props[0]["kind"], "get");
        assert_eq!(props[1]["kind"], "set");
        assert_eq!(props[1]["value"]["params"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_accessor_arity() {
        let err = parse("({ get a(b) {} })").unwrap_err();
        assert_eq!(err.description, messages::BAD_GETTER_ARITY);
        let err = parse("({ set a() {} })").unwrap_err();
        assert_eq!(err.description, messages::BAD_SETTER_ARITY);
        let err = parse("({ set a(...b) {} })").unwrap_err();
        assert_eq!(err.description, messages::BAD_SETTER_REST_PARAMETER);
    }

    #[test]
    fn test_class_elements() {
        let json = json("class A extends B { constructor() { super(); } static m() {} get x() {} *g() {} async a() {} }");
        let class = &json["body"][0];
        assert_eq!(class["type"], "ClassDeclaration");
        assert_eq!(class["superClass"]["name"], "B");
        let body = class["body"]["body"].as_array().unwrap();
        assert_eq!(body[0]["kind"], "constructor");
        assert_eq!(body[1]["static"], true);
        assert_eq!(body[2]["kind"], "get");
        assert_eq!(body[3]["value"]["generator"], true);
        assert_eq!(body[4]["value"]["async"], true);
    }

    #[test]
    fn test_class_constructor_errors() {
        let err = parse("class A { constructor() {} constructor() {} }").unwrap_err();
        assert_eq!(err.description, messages::DUPLICATE_CONSTRUCTOR);
        let err = parse("class A { get constructor() {} }").unwrap_err();
        assert_eq!(err.description, messages::CONSTRUCTOR_SPECIAL_METHOD);
        let err = parse("class A { static prototype() {} }").unwrap_err();
        assert_eq!(err.description, messages::STATIC_PROTOTYPE);
    }

    #[test]
    fn test_super_call_outside_constructor() {
        let err = parse("class A { m() { super(); } }").unwrap_err();
        assert_eq!(err.description, messages::UNEXPECTED_SUPER);
    }

    #[test]
    fn test_class_body_is_strict() {
        let err = parse("class A { m() { with (a) {} } }").unwrap_err();
        assert_eq!(err.description, messages::STRICT_MODE_WITH);
    }

    #[test]
    fn test_generator_yield() {
        let json = json("function* g() { yield* other(); }");
        let expr = &json["body"][0]["body"]["body"][0]["expression"];
        assert_eq!(expr["delegate"], true);
        assert_eq!(expr["argument"]["type"], "CallExpression");
    }
}
