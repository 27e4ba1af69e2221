//! Statements, declarations and module items.

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::error::messages;
use crate::parser::{is_identifier_name, Parser, Result};
use crate::token::{is_restricted_word, TokenKind};

/// What a `for (` head turned out to be.
enum ForHead {
    Classic(Option<Node>),
    In(Node, Node),
    Of(Node, Node),
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Statement lists
    // =========================================================================

    /// A statement or a declaration.
    pub(crate) fn parse_statement_list_item(&mut self) -> Result<Node> {
        self.cover.is_assignment_target = true;
        self.cover.is_binding_element = true;
        if self.lookahead.kind != TokenKind::Keyword {
            return self.parse_statement();
        }

        match self.lookahead.value.as_str() {
            "export" => {
                if !self.context.is_module {
                    self.tolerate(self.unexpected_with(&self.lookahead, messages::ILLEGAL_EXPORT_DECLARATION))?;
                }
                self.parse_export_declaration()
            }
            "import" => {
                if self.match_import_call()? {
                    self.parse_expression_statement()
                } else if self.match_import_meta()? {
                    self.parse_statement()
                } else {
                    if !self.context.is_module {
                        self.tolerate(self.unexpected_with(&self.lookahead, messages::ILLEGAL_IMPORT_DECLARATION))?;
                    }
                    self.parse_import_declaration()
                }
            }
            "const" => self.parse_lexical_declaration(false),
            "function" => self.parse_function_declaration(false),
            "class" => self.parse_class_declaration(false),
            "let" => {
                if self.is_lexical_declaration()? {
                    self.parse_lexical_declaration(false)
                } else {
                    self.parse_statement()
                }
            }
            _ => self.parse_statement(),
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Node> {
        match self.lookahead.kind {
            TokenKind::BooleanLiteral
            | TokenKind::NullLiteral
            | TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::Template
            | TokenKind::RegularExpression => self.parse_expression_statement(),
            TokenKind::Punctuator => match self.lookahead.value.as_str() {
                "{" => self.parse_block(),
                ";" => self.parse_empty_statement(),
                _ => self.parse_expression_statement(),
            },
            TokenKind::Identifier => {
                if self.match_async_function()? {
                    self.parse_function_declaration(false)
                } else {
                    self.parse_labelled_statement()
                }
            }
            TokenKind::Keyword => match self.lookahead.value.as_str() {
                "break" => self.parse_break_statement(),
                "continue" => self.parse_continue_statement(),
                "debugger" => self.parse_debugger_statement(),
                "do" => self.parse_do_while_statement(),
                "for" => self.parse_for_statement(),
                "function" => self.parse_function_declaration(false),
                "if" => self.parse_if_statement(),
                "return" => self.parse_return_statement(),
                "switch" => self.parse_switch_statement(),
                "throw" => self.parse_throw_statement(),
                "try" => self.parse_try_statement(),
                "var" => self.parse_variable_statement(),
                "while" => self.parse_while_statement(),
                "with" => self.parse_with_statement(),
                _ => self.parse_expression_statement(),
            },
            _ => Err(self.unexpected(&self.lookahead)),
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<Node> {
        let node = self.create_node();
        let mut body = Vec::new();

        self.expect("{")?;
        while !self.check("}") {
            body.push(self.parse_statement_list_item()?);
        }
        self.expect("}")?;

        Ok(self.finalize(node, NodeKind::BlockStatement { body }))
    }

    fn parse_empty_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect(";")?;
        Ok(self.finalize(node, NodeKind::EmptyStatement))
    }

    fn parse_expression_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.finalize(
            node,
            NodeKind::ExpressionStatement {
                expression: Box::new(expression),
            },
        ))
    }

    /// Tolerant parsing replaces a body whose `)` is missing with an empty
    /// statement.
    fn missing_paren_recovery(&mut self) -> Result<Option<Node>> {
        if self.check(")") || !self.config.tolerant {
            return Ok(None);
        }
        let token = self.next_token()?;
        self.tolerate(self.unexpected(&token))?;
        let node = self.create_node();
        Ok(Some(self.finalize(node, NodeKind::EmptyStatement)))
    }

    // =========================================================================
    // Variable declarations
    // =========================================================================

    /// `var` binding; patterns need an initializer outside `for` heads.
    fn parse_variable_declaration(&mut self, in_for: bool) -> Result<Node> {
        let node = self.create_node();
        let id = self.parse_pattern(&mut Vec::new(), Some(VarKind::Var))?;

        if self.context.strict && id.identifier_name().is_some_and(is_restricted_word) {
            self.tolerate_error(messages::STRICT_VAR_NAME, &[])?;
        }

        let mut init = None;
        if self.check("=") {
            self.next_token()?;
            init = Some(self.isolate_cover_grammar(Self::parse_assignment_expression)?);
        } else if !id.is_identifier() && !in_for {
            self.expect("=")?;
        }

        Ok(self.finalize(
            node,
            NodeKind::VariableDeclarator {
                id: Box::new(id),
                init: init.map(Box::new),
            },
        ))
    }

    fn parse_variable_declaration_list(&mut self, in_for: bool) -> Result<Vec<Node>> {
        let mut list = vec![self.parse_variable_declaration(in_for)?];
        while self.check(",") {
            self.next_token()?;
            list.push(self.parse_variable_declaration(in_for)?);
        }
        Ok(list)
    }

    fn parse_variable_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("var")?;
        let declarations = self.parse_variable_declaration_list(false)?;
        self.consume_semicolon()?;
        Ok(self.finalize(
            node,
            NodeKind::VariableDeclaration {
                declarations,
                kind: VarKind::Var,
            },
        ))
    }

    fn parse_lexical_binding(&mut self, kind: VarKind, in_for: bool) -> Result<Node> {
        let node = self.create_node();
        let id = self.parse_pattern(&mut Vec::new(), Some(kind))?;

        if self.context.strict && id.identifier_name().is_some_and(is_restricted_word) {
            self.tolerate_error(messages::STRICT_VAR_NAME, &[])?;
        }

        let mut init = None;
        if kind == VarKind::Const {
            if !self.check_keyword("in") && !self.check_contextual("of") {
                if !self.check("=") {
                    return Err(self.error(messages::DECLARATION_MISSING_INITIALIZER, &["const"]));
                }
                self.next_token()?;
                init = Some(self.isolate_cover_grammar(Self::parse_assignment_expression)?);
            }
        } else if (!in_for && !id.is_identifier()) || self.check("=") {
            self.expect("=")?;
            init = Some(self.isolate_cover_grammar(Self::parse_assignment_expression)?);
        }

        Ok(self.finalize(
            node,
            NodeKind::VariableDeclarator {
                id: Box::new(id),
                init: init.map(Box::new),
            },
        ))
    }

    fn parse_binding_list(&mut self, kind: VarKind, in_for: bool) -> Result<Vec<Node>> {
        let mut list = vec![self.parse_lexical_binding(kind, in_for)?];
        while self.check(",") {
            self.next_token()?;
            list.push(self.parse_lexical_binding(kind, in_for)?);
        }
        Ok(list)
    }

    /// `let` followed by something that can be bound.
    fn is_lexical_declaration(&mut self) -> Result<bool> {
        let next = self.peek_token()?;
        Ok(next.kind == TokenKind::Identifier
            || next.is_punctuator("[")
            || next.is_punctuator("{")
            || next.is_keyword("let")
            || next.is_keyword("yield"))
    }

    fn parse_lexical_declaration(&mut self, in_for: bool) -> Result<Node> {
        let node = self.create_node();
        let token = self.next_token()?;
        let kind = VarKind::from_str(&token.value).ok_or_else(|| self.unexpected(&token))?;
        let declarations = self.parse_binding_list(kind, in_for)?;
        self.consume_semicolon()?;
        Ok(self.finalize(node, NodeKind::VariableDeclaration { declarations, kind }))
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn parse_if_clause(&mut self) -> Result<Node> {
        if self.context.strict && self.check_keyword("function") {
            self.tolerate_error(messages::STRICT_FUNCTION, &[])?;
        }
        self.parse_statement()
    }

    fn parse_if_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("if")?;
        self.expect("(")?;
        let test = self.parse_expression()?;

        let (consequent, alternate) = match self.missing_paren_recovery()? {
            Some(empty) => (empty, None),
            None => {
                self.expect(")")?;
                let consequent = self.parse_if_clause()?;
                let alternate = if self.check_keyword("else") {
                    self.next_token()?;
                    Some(self.parse_if_clause()?)
                } else {
                    None
                };
                (consequent, alternate)
            }
        };

        Ok(self.finalize(
            node,
            NodeKind::IfStatement {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: alternate.map(Box::new),
            },
        ))
    }

    /// Declarations are not allowed as the body of a loop.
    fn tolerate_invalid_loop_statement(&mut self) -> Result<()> {
        if self.check_keyword("class") || self.check_keyword("function") {
            let value = self.lookahead.value.clone();
            self.tolerate_error(messages::UNEXPECTED_TOKEN, &[&value])?;
        }
        Ok(())
    }

    fn parse_iteration_body(&mut self) -> Result<Node> {
        self.with_context(|c| c.in_iteration = true, Self::parse_statement)
    }

    fn parse_do_while_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("do")?;
        self.tolerate_invalid_loop_statement()?;
        let body = self.parse_iteration_body()?;

        self.expect_keyword("while")?;
        self.expect("(")?;
        let test = self.parse_expression()?;

        if !self.check(")") && self.config.tolerant {
            let token = self.next_token()?;
            self.tolerate(self.unexpected(&token))?;
        } else {
            self.expect(")")?;
            if self.check(";") {
                self.next_token()?;
            }
        }

        Ok(self.finalize(
            node,
            NodeKind::DoWhileStatement {
                body: Box::new(body),
                test: Box::new(test),
            },
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("while")?;
        self.expect("(")?;
        let test = self.parse_expression()?;

        let body = match self.missing_paren_recovery()? {
            Some(empty) => empty,
            None => {
                self.expect(")")?;
                self.parse_iteration_body()?
            }
        };

        Ok(self.finalize(
            node,
            NodeKind::WhileStatement {
                test: Box::new(test),
                body: Box::new(body),
            },
        ))
    }

    /// `for (...)`, `for (... in ...)`, `for (... of ...)` and `for await`.
    fn parse_for_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("for")?;

        let mut is_await = false;
        if self.check_contextual("await") {
            if !self.context.is_async {
                self.tolerate(self.unexpected(&self.lookahead))?;
            }
            is_await = true;
            self.next_token()?;
        }

        self.expect("(")?;
        let head = if self.check(";") {
            self.next_token()?;
            ForHead::Classic(None)
        } else if self.check_keyword("var") {
            self.parse_for_var_head(is_await)?
        } else if self.check_keyword("const") || self.check_keyword("let") {
            self.parse_for_lexical_head()?
        } else {
            self.parse_for_expression_head()?
        };

        let (mut test, mut update) = (None, None);
        if let ForHead::Classic(_) = head {
            if !self.check(";") {
                test = Some(self.isolate_cover_grammar(Self::parse_expression)?);
            }
            self.expect(";")?;
            if !self.check(")") {
                update = Some(self.isolate_cover_grammar(Self::parse_expression)?);
            }
        }

        let body = match self.missing_paren_recovery()? {
            Some(empty) => empty,
            None => {
                self.expect(")")?;
                self.with_context(
                    |c| c.in_iteration = true,
                    |p| p.isolate_cover_grammar(Self::parse_statement),
                )?
            }
        };
        let body = Box::new(body);

        let kind = match head {
            ForHead::Classic(init) => NodeKind::ForStatement {
                init: init.map(Box::new),
                test: test.map(Box::new),
                update: update.map(Box::new),
                body,
            },
            ForHead::In(left, right) => NodeKind::ForInStatement {
                left: Box::new(left),
                right: Box::new(right),
                body,
                each: false,
            },
            ForHead::Of(left, right) => NodeKind::ForOfStatement {
                is_await,
                left: Box::new(left),
                right: Box::new(right),
                body,
            },
        };
        Ok(self.finalize(node, kind))
    }

    fn parse_for_var_head(&mut self, is_await: bool) -> Result<ForHead> {
        let marker = self.create_node();
        self.next_token()?;
        let declarations = self.with_context(|c| c.allow_in = false, |p| p.parse_variable_declaration_list(true))?;

        let single = declarations.len() == 1;
        let (has_init, is_pattern) = match declarations.first().map(|d| &d.kind) {
            Some(NodeKind::VariableDeclarator { id, init }) => (
                init.is_some(),
                matches!(id.kind, NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. }),
            ),
            _ => (false, false),
        };

        if !is_await && single && self.check_keyword("in") {
            if has_init && (is_pattern || self.context.strict) {
                self.tolerate_error(messages::FOR_IN_OF_LOOP_INITIALIZER, &["for-in"])?;
            }
            let left = self.finalize(
                marker,
                NodeKind::VariableDeclaration {
                    declarations,
                    kind: VarKind::Var,
                },
            );
            self.next_token()?;
            let right = self.parse_expression()?;
            Ok(ForHead::In(left, right))
        } else if single && !has_init && self.check_contextual("of") {
            let left = self.finalize(
                marker,
                NodeKind::VariableDeclaration {
                    declarations,
                    kind: VarKind::Var,
                },
            );
            self.next_token()?;
            let right = self.parse_assignment_expression()?;
            Ok(ForHead::Of(left, right))
        } else {
            let init = self.finalize(
                marker,
                NodeKind::VariableDeclaration {
                    declarations,
                    kind: VarKind::Var,
                },
            );
            self.expect(";")?;
            Ok(ForHead::Classic(Some(init)))
        }
    }

    fn parse_for_lexical_head(&mut self) -> Result<ForHead> {
        let marker = self.create_node();
        let token = self.next_token()?;
        let kind = VarKind::from_str(&token.value).ok_or_else(|| self.unexpected(&token))?;

        // `for (let in x)` names a variable called `let`.
        if !self.context.strict && self.lookahead.value == "in" {
            let left = self.finalize(marker, NodeKind::Identifier { name: token.value });
            self.next_token()?;
            let right = self.parse_expression()?;
            return Ok(ForHead::In(left, right));
        }

        let declarations = self.with_context(|c| c.allow_in = false, |p| p.parse_binding_list(kind, true))?;
        let uninitialized_single = declarations.len() == 1
            && matches!(
                declarations[0].kind,
                NodeKind::VariableDeclarator { init: None, .. }
            );

        if uninitialized_single && self.check_keyword("in") {
            let left = self.finalize(marker, NodeKind::VariableDeclaration { declarations, kind });
            self.next_token()?;
            let right = self.parse_expression()?;
            Ok(ForHead::In(left, right))
        } else if uninitialized_single && self.check_contextual("of") {
            let left = self.finalize(marker, NodeKind::VariableDeclaration { declarations, kind });
            self.next_token()?;
            let right = self.parse_assignment_expression()?;
            Ok(ForHead::Of(left, right))
        } else {
            self.consume_semicolon()?;
            let init = self.finalize(marker, NodeKind::VariableDeclaration { declarations, kind });
            Ok(ForHead::Classic(Some(init)))
        }
    }

    fn parse_for_expression_head(&mut self) -> Result<ForHead> {
        let init_start_token = self.lookahead.clone();
        let saved_cover = self.cover.clone();

        let init = self.with_context(
            |c| c.allow_in = false,
            |p| p.inherit_cover_grammar(Self::parse_assignment_expression),
        )?;

        let is_assignment = matches!(init.kind, NodeKind::AssignmentExpression { .. });
        if self.check_keyword("in") {
            if !self.cover.is_assignment_target || is_assignment {
                self.tolerate_error(messages::INVALID_LHS_IN_FOR_IN, &[])?;
            }
            self.next_token()?;
            let left = crate::params::reinterpret_as_pattern(init);
            let right = self.parse_expression()?;
            return Ok(ForHead::In(left, right));
        }
        if self.check_contextual("of") {
            if !self.cover.is_assignment_target || is_assignment {
                self.tolerate_error(messages::INVALID_LHS_IN_FOR_LOOP, &[])?;
            }
            self.next_token()?;
            let left = crate::params::reinterpret_as_pattern(init);
            let right = self.parse_assignment_expression()?;
            return Ok(ForHead::Of(left, right));
        }

        // Plain initializer: it should have been parsed isolated.
        self.cover = saved_cover;
        let mut init = init;
        if self.check(",") {
            let mut expressions = vec![init];
            while self.check(",") {
                self.next_token()?;
                expressions.push(self.isolate_cover_grammar(Self::parse_assignment_expression)?);
            }
            init = self.finalize(
                self.start_node(&init_start_token),
                NodeKind::SequenceExpression { expressions },
            );
        }
        self.expect(";")?;
        Ok(ForHead::Classic(Some(init)))
    }

    fn parse_continue_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("continue")?;

        let mut label = None;
        if self.lookahead.kind == TokenKind::Identifier && !self.has_line_terminator {
            let id = self.parse_variable_identifier(None)?;
            let name = id.identifier_name().unwrap_or_default();
            if !self.label_set.contains(name) {
                return Err(self.error(messages::UNKNOWN_LABEL, &[name]));
            }
            label = Some(id);
        }

        self.consume_semicolon()?;
        if label.is_none() && !self.context.in_iteration {
            return Err(self.error(messages::ILLEGAL_CONTINUE, &[]));
        }

        Ok(self.finalize(
            node,
            NodeKind::ContinueStatement {
                label: label.map(Box::new),
            },
        ))
    }

    fn parse_break_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("break")?;

        let mut label = None;
        if self.lookahead.kind == TokenKind::Identifier && !self.has_line_terminator {
            let id = self.parse_variable_identifier(None)?;
            let name = id.identifier_name().unwrap_or_default();
            if !self.label_set.contains(name) {
                return Err(self.error(messages::UNKNOWN_LABEL, &[name]));
            }
            label = Some(id);
        }

        self.consume_semicolon()?;
        if label.is_none() && !self.context.in_iteration && !self.context.in_switch {
            return Err(self.error(messages::ILLEGAL_BREAK, &[]));
        }

        Ok(self.finalize(
            node,
            NodeKind::BreakStatement {
                label: label.map(Box::new),
            },
        ))
    }

    fn parse_return_statement(&mut self) -> Result<Node> {
        if !self.context.in_function_body {
            self.tolerate_error(messages::ILLEGAL_RETURN, &[])?;
        }

        let node = self.create_node();
        self.expect_keyword("return")?;

        let has_argument = (!self.check(";")
            && !self.check("}")
            && !self.has_line_terminator
            && self.lookahead.kind != TokenKind::Eof)
            || self.lookahead.kind == TokenKind::StringLiteral
            || self.lookahead.kind == TokenKind::Template;
        let argument = if has_argument {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume_semicolon()?;

        Ok(self.finalize(
            node,
            NodeKind::ReturnStatement {
                argument: argument.map(Box::new),
            },
        ))
    }

    fn parse_with_statement(&mut self) -> Result<Node> {
        if self.context.strict {
            self.tolerate_error(messages::STRICT_MODE_WITH, &[])?;
        }

        let node = self.create_node();
        self.expect_keyword("with")?;
        self.expect("(")?;
        let object = self.parse_expression()?;

        let body = match self.missing_paren_recovery()? {
            Some(empty) => empty,
            None => {
                self.expect(")")?;
                self.parse_statement()?
            }
        };

        Ok(self.finalize(
            node,
            NodeKind::WithStatement {
                object: Box::new(object),
                body: Box::new(body),
            },
        ))
    }

    fn parse_switch_case(&mut self) -> Result<Node> {
        let node = self.create_node();

        let test = if self.check_keyword("default") {
            self.next_token()?;
            None
        } else {
            self.expect_keyword("case")?;
            Some(self.parse_expression()?)
        };
        self.expect(":")?;

        let mut consequent = Vec::new();
        while !(self.check("}") || self.check_keyword("default") || self.check_keyword("case")) {
            consequent.push(self.parse_statement_list_item()?);
        }

        Ok(self.finalize(
            node,
            NodeKind::SwitchCase {
                test: test.map(Box::new),
                consequent,
            },
        ))
    }

    fn parse_switch_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("switch")?;
        self.expect("(")?;
        let discriminant = self.parse_expression()?;
        self.expect(")")?;

        let cases = self.with_context(
            |c| c.in_switch = true,
            |p| {
                let mut cases = Vec::new();
                let mut default_found = false;
                p.expect("{")?;
                while !p.check("}") {
                    let clause = p.parse_switch_case()?;
                    if matches!(clause.kind, NodeKind::SwitchCase { test: None, .. }) {
                        if default_found {
                            return Err(p.error(messages::MULTIPLE_DEFAULTS_IN_SWITCH, &[]));
                        }
                        default_found = true;
                    }
                    cases.push(clause);
                }
                p.expect("}")?;
                Ok(cases)
            },
        )?;

        Ok(self.finalize(
            node,
            NodeKind::SwitchStatement {
                discriminant: Box::new(discriminant),
                cases,
            },
        ))
    }

    /// `label: statement`, or an expression statement starting with an
    /// identifier.
    fn parse_labelled_statement(&mut self) -> Result<Node> {
        let marker = self.create_node();
        let expr = self.parse_expression()?;

        let Some(name) = expr.identifier_name().filter(|_| self.check(":")).map(str::to_string) else {
            self.consume_semicolon()?;
            return Ok(self.finalize(
                marker,
                NodeKind::ExpressionStatement {
                    expression: Box::new(expr),
                },
            ));
        };

        self.next_token()?;
        if self.label_set.contains(&name) {
            return Err(self.error(messages::REDECLARATION, &["Label", &name]));
        }
        self.label_set.insert(name.clone());

        let body = if self.check_keyword("class") {
            self.tolerate(self.unexpected(&self.lookahead))?;
            self.parse_class_declaration(false)
        } else if self.check_keyword("function") {
            let token = self.lookahead.clone();
            self.parse_function_declaration(false).and_then(|declaration| {
                if self.context.strict {
                    self.tolerate(self.unexpected_with(&token, messages::STRICT_FUNCTION))?;
                } else if matches!(declaration.kind, NodeKind::FunctionDeclaration { generator: true, .. }) {
                    self.tolerate(self.unexpected_with(&token, messages::GENERATOR_IN_LEGACY_CONTEXT))?;
                }
                Ok(declaration)
            })
        } else {
            self.parse_statement()
        };
        self.label_set.remove(&name);

        Ok(self.finalize(
            marker,
            NodeKind::LabeledStatement {
                label: Box::new(expr),
                body: Box::new(body?),
            },
        ))
    }

    fn parse_throw_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("throw")?;
        if self.has_line_terminator {
            return Err(self.error(messages::NEWLINE_AFTER_THROW, &[]));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.finalize(
            node,
            NodeKind::ThrowStatement {
                argument: Box::new(argument),
            },
        ))
    }

    fn parse_catch_clause(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("catch")?;

        let mut param = None;
        if self.check("(") {
            self.expect("(")?;
            if self.check(")") {
                return Err(self.unexpected(&self.lookahead));
            }

            let mut params = Vec::new();
            let pattern = self.parse_pattern(&mut params, None)?;
            let mut seen = FxHashSet::default();
            for token in &params {
                if !seen.insert(token.value.as_str()) {
                    self.tolerate_error(messages::DUPLICATE_BINDING, &[&token.value])?;
                }
            }
            if self.context.strict && pattern.identifier_name().is_some_and(is_restricted_word) {
                self.tolerate_error(messages::STRICT_CATCH_VARIABLE, &[])?;
            }
            self.expect(")")?;
            param = Some(pattern);
        }
        let body = self.parse_block()?;

        Ok(self.finalize(
            node,
            NodeKind::CatchClause {
                param: param.map(Box::new),
                body: Box::new(body),
            },
        ))
    }

    fn parse_try_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("try")?;

        let block = self.parse_block()?;
        let handler = if self.check_keyword("catch") {
            Some(self.parse_catch_clause()?)
        } else {
            None
        };
        let finalizer = if self.check_keyword("finally") {
            self.next_token()?;
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error(messages::NO_CATCH_OR_FINALLY, &[]));
        }

        Ok(self.finalize(
            node,
            NodeKind::TryStatement {
                block: Box::new(block),
                handler: handler.map(Box::new),
                finalizer: finalizer.map(Box::new),
            },
        ))
    }

    fn parse_debugger_statement(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("debugger")?;
        self.consume_semicolon()?;
        Ok(self.finalize(node, NodeKind::DebuggerStatement))
    }

    // =========================================================================
    // Imports
    // =========================================================================

    /// The string after `from` or a bare `import`.
    fn parse_module_specifier(&mut self) -> Result<Node> {
        let node = self.create_node();
        if self.lookahead.kind != TokenKind::StringLiteral {
            return Err(self.error(messages::INVALID_MODULE_SPECIFIER, &[]));
        }
        let token = self.next_token()?;
        Ok(self.finalize_literal(node, &token))
    }

    /// `foo`, `foo as bar`, `default as bar`.
    fn parse_import_specifier(&mut self) -> Result<Node> {
        let node = self.create_node();

        let imported;
        let mut local = None;
        if self.lookahead.kind == TokenKind::Identifier {
            imported = self.parse_variable_identifier(None)?;
            if self.check_contextual("as") {
                self.next_token()?;
                local = Some(self.parse_variable_identifier(None)?);
            }
        } else {
            imported = self.parse_identifier_name()?;
            if !self.check_contextual("as") {
                let token = self.next_token()?;
                return Err(self.unexpected(&token));
            }
            self.next_token()?;
            local = Some(self.parse_variable_identifier(None)?);
        }

        let local = local.unwrap_or_else(|| imported.clone());
        Ok(self.finalize(
            node,
            NodeKind::ImportSpecifier {
                local: Box::new(local),
                imported: Box::new(imported),
            },
        ))
    }

    fn parse_named_imports(&mut self) -> Result<Vec<Node>> {
        let mut specifiers = Vec::new();
        self.expect("{")?;
        while !self.check("}") {
            specifiers.push(self.parse_import_specifier()?);
            if !self.check("}") {
                self.expect(",")?;
            }
        }
        self.expect("}")?;
        Ok(specifiers)
    }

    fn parse_import_default_specifier(&mut self) -> Result<Node> {
        let node = self.create_node();
        let local = self.parse_identifier_name()?;
        Ok(self.finalize(
            node,
            NodeKind::ImportDefaultSpecifier {
                local: Box::new(local),
            },
        ))
    }

    fn parse_import_namespace_specifier(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect("*")?;
        if !self.check_contextual("as") {
            return Err(self.error(messages::NO_AS_AFTER_IMPORT_NAMESPACE, &[]));
        }
        self.next_token()?;
        let local = self.parse_identifier_name()?;
        Ok(self.finalize(
            node,
            NodeKind::ImportNamespaceSpecifier {
                local: Box::new(local),
            },
        ))
    }

    /// Error for a missing `from` clause.
    fn missing_from_error(&self) -> crate::error::ParseError {
        let value = self.lookahead.value.as_str();
        let message = if value.is_empty() {
            messages::MISSING_FROM_CLAUSE
        } else {
            messages::UNEXPECTED_TOKEN
        };
        self.error(message, &[value])
    }

    fn parse_import_declaration(&mut self) -> Result<Node> {
        if self.context.in_function_body {
            return Err(self.error(messages::ILLEGAL_IMPORT_DECLARATION, &[]));
        }

        let node = self.create_node();
        self.expect_keyword("import")?;

        let mut specifiers = Vec::new();
        let source = if self.lookahead.kind == TokenKind::StringLiteral {
            self.parse_module_specifier()?
        } else {
            if self.check("{") {
                specifiers.extend(self.parse_named_imports()?);
            } else if self.check("*") {
                specifiers.push(self.parse_import_namespace_specifier()?);
            } else if is_identifier_name(&self.lookahead) && !self.check_keyword("default") {
                specifiers.push(self.parse_import_default_specifier()?);
                if self.check(",") {
                    self.next_token()?;
                    if self.check("*") {
                        specifiers.push(self.parse_import_namespace_specifier()?);
                    } else if self.check("{") {
                        specifiers.extend(self.parse_named_imports()?);
                    } else {
                        return Err(self.unexpected(&self.lookahead));
                    }
                }
            } else {
                let token = self.next_token()?;
                return Err(self.unexpected(&token));
            }

            if !self.check_contextual("from") {
                return Err(self.missing_from_error());
            }
            self.next_token()?;
            self.parse_module_specifier()?
        };
        self.consume_semicolon()?;

        Ok(self.finalize(
            node,
            NodeKind::ImportDeclaration {
                specifiers,
                source: Box::new(source),
            },
        ))
    }

    // =========================================================================
    // Exports
    // =========================================================================

    fn parse_export_specifier(&mut self) -> Result<Node> {
        let node = self.create_node();
        let local = self.parse_identifier_name()?;
        let exported = if self.check_contextual("as") {
            self.next_token()?;
            self.parse_identifier_name()?
        } else {
            local.clone()
        };
        Ok(self.finalize(
            node,
            NodeKind::ExportSpecifier {
                local: Box::new(local),
                exported: Box::new(exported),
            },
        ))
    }

    fn parse_export_default(&mut self) -> Result<Node> {
        if self.check_keyword("function") {
            return self.parse_function_declaration(true);
        }
        if self.check_keyword("class") {
            return self.parse_class_declaration(true);
        }
        if self.check_contextual("async") {
            return if self.match_async_function()? {
                self.parse_function_declaration(true)
            } else {
                self.parse_assignment_expression()
            };
        }
        if self.check_contextual("from") {
            return Err(self.error(messages::UNEXPECTED_TOKEN, &[&self.lookahead.value]));
        }
        let declaration = if self.check("{") {
            self.parse_object_initializer()?
        } else if self.check("[") {
            self.parse_array_initializer()?
        } else {
            self.parse_assignment_expression()?
        };
        self.consume_semicolon()?;
        Ok(declaration)
    }

    fn parse_export_declaration(&mut self) -> Result<Node> {
        if self.context.in_function_body {
            return Err(self.error(messages::ILLEGAL_EXPORT_DECLARATION, &[]));
        }

        let node = self.create_node();
        self.expect_keyword("export")?;

        if self.check_keyword("default") {
            self.next_token()?;
            let declaration = self.parse_export_default()?;
            return Ok(self.finalize(
                node,
                NodeKind::ExportDefaultDeclaration {
                    declaration: Box::new(declaration),
                },
            ));
        }

        if self.check("*") {
            self.next_token()?;
            if !self.check_contextual("from") {
                return Err(self.missing_from_error());
            }
            self.next_token()?;
            let source = self.parse_module_specifier()?;
            self.consume_semicolon()?;
            return Ok(self.finalize(
                node,
                NodeKind::ExportAllDeclaration {
                    source: Box::new(source),
                },
            ));
        }

        let declaration = if self.lookahead.kind == TokenKind::Keyword {
            match self.lookahead.value.as_str() {
                "let" | "const" => Some(self.parse_lexical_declaration(false)?),
                "var" => Some(self.parse_variable_statement()?),
                "class" => Some(self.parse_class_declaration(false)?),
                "function" => Some(self.parse_function_declaration(false)?),
                _ => return Err(self.unexpected(&self.lookahead)),
            }
        } else if self.match_async_function()? {
            Some(self.parse_function_declaration(false)?)
        } else {
            None
        };
        if let Some(declaration) = declaration {
            return Ok(self.finalize(
                node,
                NodeKind::ExportNamedDeclaration {
                    declaration: Some(Box::new(declaration)),
                    specifiers: Vec::new(),
                    source: None,
                },
            ));
        }

        let mut specifiers = Vec::new();
        let mut exports_default = false;
        self.expect("{")?;
        while !self.check("}") {
            exports_default = exports_default || self.check_keyword("default");
            specifiers.push(self.parse_export_specifier()?);
            if !self.check("}") {
                self.expect(",")?;
            }
        }
        self.expect("}")?;

        let mut source = None;
        if self.check_contextual("from") {
            self.next_token()?;
            source = Some(self.parse_module_specifier()?);
            self.consume_semicolon()?;
        } else if exports_default {
            return Err(self.missing_from_error());
        } else {
            self.consume_semicolon()?;
        }

        Ok(self.finalize(
            node,
            NodeKind::ExportNamedDeclaration {
                declaration: None,
                specifiers,
                source: source.map(Box::new),
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

    fn parse_with(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
        Parser::new(source, options, None).and_then(Parser::parse_program)
    }

    fn parse(source: &str) -> Result<Program, ParseError> {
        parse_with(source, &ParseOptions::default())
    }

    fn json(source: &str) -> serde_json::Value {
        parse(source).unwrap().to_json().unwrap()
    }

    fn module_json(source: &str) -> serde_json::Value {
        parse_with(source, &ParseOptions::new().with_module())
            .unwrap()
            .to_json()
            .unwrap()
    }

    #[test]
    fn test_variable_declarations() {
        let json = json("var a = 1, b; let [c] = d; const e = 2;");
        assert_eq!(json["body"][0]["kind"], "var");
        assert_eq!(json["body"][0]["declarations"].as_array().unwrap().len(), 2);
        assert!(json["body"][0]["declarations"][1]["init"].is_null());
        assert_eq!(json["body"][1]["declarations"][0]["id"]["type"], "ArrayPattern");
        assert_eq!(json["body"][2]["kind"], "const");
    }

    #[test]
    fn test_const_requires_initializer() {
        let err = parse("const a;").unwrap_err();
        assert_eq!(err.description, "Missing initializer in const declaration");
    }

    #[test]
    fn test_let_as_identifier() {
        let json = json("let = 1");
        assert_eq!(json["body"][0]["type"], "ExpressionStatement");
        assert_eq!(json["body"][0]["expression"]["left"]["name"], "let");
    }

    #[test]
    fn test_for_statements() {
        let json = json("for (var i = 0; i < n; i++) {} for (k in o); for (const v of list) {}");
        assert_eq!(json["body"][0]["type"], "ForStatement");
        assert_eq!(json["body"][0]["init"]["type"], "VariableDeclaration");
        assert_eq!(json["body"][1]["type"], "ForInStatement");
        assert_eq!(json["body"][1]["each"], false);
        assert_eq!(json["body"][2]["type"], "ForOfStatement");
        assert_eq!(json["body"][2]["await"], false);
    }

    #[test]
    fn test_for_in_left_is_pattern() {
        let json = json("for ([a, b] of pairs);");
        assert_eq!(json["body"][0]["left"]["type"], "ArrayPattern");
    }

    #[test]
    fn test_for_init_sequence() {
        let json = json("for (i = 0, j = 1; ; ) break;");
        assert_eq!(json["body"][0]["init"]["type"], "SequenceExpression");
        assert!(json["body"][0]["test"].is_null());
    }

    #[test]
    fn test_for_in_with_initializer_in_strict() {
        let err = parse("'use strict'; for (var a = 1 in b);").unwrap_err();
        assert_eq!(err.description, "for-in loop variable declaration may not have an initializer.");
    }

    #[test]
    fn test_labels() {
        let json = json("outer: for (;;) { inner: while (x) { continue outer; } }");
        assert_eq!(json["body"][0]["type"], "LabeledStatement");
        assert_eq!(json["body"][0]["label"]["name"], "outer");

        let err = parse("while (x) { break missing; }").unwrap_err();
        assert_eq!(err.description, "Undefined label 'missing'");
        let err = parse("a: a: ;").unwrap_err();
        assert_eq!(err.description, "Label 'a' has already been declared");
    }

    #[test]
    fn test_illegal_break_and_continue() {
        assert_eq!(parse("break;").unwrap_err().description, messages::ILLEGAL_BREAK);
        assert_eq!(parse("continue;").unwrap_err().description, messages::ILLEGAL_CONTINUE);
        parse("switch (a) { case 1: break; default: }").unwrap();
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(parse("return 1").unwrap_err().description, messages::ILLEGAL_RETURN);
    }

    #[test]
    fn test_return_asi() {
        let json = json("function f() { return\n1 }");
        let body = &json["body"][0]["body"]["body"];
        assert!(body[0]["argument"].is_null());
        assert_eq!(body[1]["type"], "ExpressionStatement");
    }

    #[test]
    fn test_switch_defaults() {
        let err = parse("switch (a) { default: default: }").unwrap_err();
        assert_eq!(err.description, messages::MULTIPLE_DEFAULTS_IN_SWITCH);
    }

    #[test]
    fn test_try_statement() {
        let json = json("try { a() } catch ({ message }) { } finally { }");
        let stmt = &json["body"][0];
        assert_eq!(stmt["handler"]["param"]["type"], "ObjectPattern");
        assert_eq!(stmt["finalizer"]["type"], "BlockStatement");
        assert_eq!(parse("try {}").unwrap_err().description, messages::NO_CATCH_OR_FINALLY);
    }

    #[test]
    fn test_catch_duplicate_binding() {
        let err = parse("try {} catch ([a, a]) {}").unwrap_err();
        assert_eq!(err.description, "Duplicate binding a");
    }

    #[test]
    fn test_throw_newline() {
        let err = parse("throw\nerr").unwrap_err();
        assert_eq!(err.description, messages::NEWLINE_AFTER_THROW);
    }

    #[test]
    fn test_asi_failure() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.description, "Unexpected identifier");
    }

    #[test]
    fn test_imports() {
        let json = module_json("import a, { b as c, default as d } from 'm'; import * as ns from 'n'; import 'side';");
        let specifiers = json["body"][0]["specifiers"].as_array().unwrap();
        assert_eq!(specifiers[0]["type"], "ImportDefaultSpecifier");
        assert_eq!(specifiers[1]["imported"]["name"], "b");
        assert_eq!(specifiers[1]["local"]["name"], "c");
        assert_eq!(specifiers[2]["imported"]["name"], "default");
        assert_eq!(json["body"][1]["specifiers"][0]["type"], "ImportNamespaceSpecifier");
        assert_eq!(json["body"][2]["source"]["value"], "side");
        assert_eq!(json["sourceType"], "module");
    }

    #[test]
    fn test_exports() {
        let json = module_json(
            "export default function () {} export const a = 1; export { a as b }; export * from 'x'; export { c } from 'y';",
        );
        assert_eq!(json["body"][0]["type"], "ExportDefaultDeclaration");
        assert!(json["body"][0]["declaration"]["id"].is_null());
        assert_eq!(json["body"][1]["declaration"]["type"], "VariableDeclaration");
        assert_eq!(json["body"][2]["specifiers"][0]["exported"]["name"], "b");
        assert_eq!(json["body"][3]["type"], "ExportAllDeclaration");
        assert_eq!(json["body"][4]["source"]["value"], "y");
    }

    #[test]
    fn test_import_in_script() {
        let err = parse("import a from 'b'").unwrap_err();
        assert_eq!(err.description, "Unexpected token");
    }

    #[test]
    fn test_export_default_requires_from() {
        let err = parse_with("export { default };", &ParseOptions::new().with_module()).unwrap_err();
        assert_eq!(err.description, "Unexpected token ;");
    }

    #[test]
    fn test_module_is_strict() {
        let err = parse_with("with (a) {}", &ParseOptions::new().with_module()).unwrap_err();
        assert_eq!(err.description, messages::STRICT_MODE_WITH);
    }

    #[test]
    fn test_import_meta() {
        let json = module_json("import.meta.url");
        let expr = &json["body"][0]["expression"];
        assert_eq!(expr["object"]["type"], "MetaProperty");
        assert_eq!(expr["object"]["property"]["name"], "meta");
        let err = parse("import.meta").unwrap_err();
        assert_eq!(err.description, messages::CANNOT_USE_IMPORT_META_OUTSIDE_A_MODULE);
    }

    #[test]
    fn test_dynamic_import() {
        let json = json("import('x').then(f)");
        let callee = &json["body"][0]["expression"]["callee"]["object"];
        assert_eq!(callee["type"], "CallExpression");
        assert_eq!(callee["callee"]["type"], "Import");
    }
}
