//! Recursive descent parser for ECMAScript and JSX.
//!
//! Expressions are parsed with a cover grammar: a parenthesized list or an
//! array/object literal is parsed as an expression first and reinterpreted as
//! a pattern once a following `=>` or `=` shows that it was one. The flags in
//! [`Cover`] track whether the production parsed so far can still be a
//! binding element or an assignment target.
//!
//! Binary operators are reduced with an explicit operand/operator stack and a
//! per-parser [`PrecedenceTable`].
//!
//! Statements, functions, patterns and JSX live in sibling modules as further
//! `impl Parser` blocks.

use std::mem;

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::comments::CommentHandler;
use crate::error::{format_message, messages, ErrorHandler, ParseError};
use crate::options::{ParseOptions, SourceType};
use crate::params::{reinterpret_as_pattern, FormalParameters};
use crate::precedence::{PrecedenceTable, RELATIONAL_KEYWORD_PRECEDENCE};
use crate::scanner::Scanner;
use crate::span::{Marker, MetaPosition, Metadata, SourceLocation, Span};
use crate::token::{
    is_future_reserved_word, is_restricted_word, is_strict_mode_reserved_word, RawToken, TokenEntry, TokenKind,
};

pub(crate) type Result<T> = std::result::Result<T, ParseError>;

/// Observer of finished nodes and comments, called in completion order.
///
/// Nodes are reported bottom-up: children before their parent. Comments are
/// reported as the scanner skips them, and only when comments are collected.
pub trait Delegate {
    fn visit_node(&mut self, _node: &Node, _metadata: &Metadata) {}

    fn visit_comment(&mut self, _comment: &Comment, _metadata: &Metadata) {}
}

/// Output switches resolved from [`ParseOptions`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Config {
    pub range: bool,
    pub loc: bool,
    pub source: Option<String>,
    pub tokens: bool,
    /// Scan comments and report them.
    pub comment: bool,
    /// Return the flat comment list in `Program.comments`.
    pub comment_list: bool,
    pub jsx: bool,
    pub tolerant: bool,
}

/// Grammar parameters that are saved and restored around nested productions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context {
    pub is_module: bool,
    /// `in` is a binary operator (false inside a `for` head).
    pub allow_in: bool,
    pub allow_strict_directive: bool,
    /// `yield` is an identifier (false inside generators).
    pub allow_yield: bool,
    pub is_async: bool,
    pub in_function_body: bool,
    pub in_iteration: bool,
    pub in_switch: bool,
    pub in_class_constructor: bool,
    pub strict: bool,
}

/// Cover grammar state of the expression parsed so far.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cover {
    pub is_assignment_target: bool,
    pub is_binding_element: bool,
    /// First `{ a = 1 }` shorthand seen, an error unless it becomes a pattern.
    pub first_cover_initialized_name_error: Option<RawToken>,
}

impl Cover {
    fn fresh() -> Self {
        Self {
            is_assignment_target: true,
            is_binding_element: true,
            first_cover_initialized_name_error: None,
        }
    }

    /// The expression can be neither a pattern nor an assignment target.
    #[inline]
    pub(crate) fn non_pattern(&mut self) {
        self.is_assignment_target = false;
        self.is_binding_element = false;
    }
}

/// Latches that forbid mixing `??` with `&&`/`||` without parentheses.
#[derive(Debug, Clone, Copy)]
struct LogicalLatch {
    allow_and_or: bool,
    allow_nullish: bool,
}

impl LogicalLatch {
    fn new() -> Self {
        Self {
            allow_and_or: true,
            allow_nullish: true,
        }
    }

    fn rejects(&self, op: &str) -> bool {
        (!self.allow_and_or && (op == "&&" || op == "||")) || (!self.allow_nullish && op == "??")
    }

    fn update(&mut self, op: &str) {
        match op {
            "&&" | "||" => self.allow_nullish = false,
            "??" => self.allow_and_or = false,
            _ => {}
        }
    }
}

/// The parser.
pub struct Parser<'a> {
    pub(crate) scanner: Scanner<'a>,
    pub(crate) config: Config,
    precedence: PrecedenceTable,
    delegate: Option<&'a mut dyn Delegate>,
    comment_handler: Option<CommentHandler>,
    /// Next token, already scanned.
    pub(crate) lookahead: RawToken,
    /// A line terminator separates the last consumed token from `lookahead`.
    pub(crate) has_line_terminator: bool,
    pub(crate) context: Context,
    pub(crate) label_set: FxHashSet<String>,
    pub(crate) cover: Cover,
    pub(crate) tokens: Vec<TokenEntry>,
    /// Start of `lookahead`, after trivia.
    pub(crate) start_marker: Marker,
    /// End of the last consumed token.
    pub(crate) last_marker: Marker,
    next_id: u32,
}

impl<'a> Parser<'a> {
    /// Create a parser and prime the first token.
    pub fn new(source: &'a str, options: &ParseOptions, delegate: Option<&'a mut dyn Delegate>) -> Result<Self> {
        let config = Config {
            range: options.range,
            loc: options.loc,
            source: if options.loc { options.source.clone() } else { None },
            tokens: options.tokens,
            comment: options.collects_comments(),
            comment_list: options.comment,
            jsx: options.jsx,
            tolerant: options.tolerant,
        };

        let precedence = match &options.operator_precedence {
            Some(f) => PrecedenceTable::with_override(&|op| f(op)),
            None => PrecedenceTable::default(),
        };

        let is_module = options.is_module();
        let mut scanner = Scanner::new(source, ErrorHandler::new(config.tolerant));
        scanner.track_comment = config.comment;
        scanner.is_module = is_module;

        let comment_handler = config.comment.then(|| CommentHandler::new(options.attach_comment));

        let line = scanner.line_number;
        let mut lookahead = RawToken::new(TokenKind::Eof, "");
        lookahead.line_number = line;
        let marker = Marker { index: 0, line, column: 0 };

        let mut parser = Self {
            scanner,
            config,
            precedence,
            delegate,
            comment_handler,
            lookahead,
            has_line_terminator: false,
            context: Context {
                is_module,
                allow_in: true,
                allow_strict_directive: true,
                allow_yield: true,
                is_async: false,
                in_function_body: false,
                in_iteration: false,
                in_switch: false,
                in_class_constructor: false,
                strict: is_module,
            },
            label_set: FxHashSet::default(),
            cover: Cover::default(),
            tokens: Vec::new(),
            start_marker: marker,
            last_marker: marker,
            next_id: 0,
        };
        parser.next_token()?;
        parser.last_marker = parser.scanner_marker();
        Ok(parser)
    }

    /// Parse the whole source as a script or module, per the options.
    pub fn parse_program(mut self) -> Result<Program> {
        let node = self.create_node();
        let mut body = self.parse_directive_prologues()?;
        while self.lookahead.kind != TokenKind::Eof {
            body.push(self.parse_statement_list_item()?);
        }
        let source_type = if self.context.is_module {
            SourceType::Module
        } else {
            SourceType::Script
        };
        let mut root = self.finalize(node, NodeKind::Program { body, source_type });

        let comments = match self.comment_handler.take() {
            Some(handler) => {
                let comments = handler.finish(&mut root);
                self.config.comment_list.then_some(comments)
            }
            None => None,
        };
        let tokens = self.config.tokens.then(|| mem::take(&mut self.tokens));
        let errors = self.config.tolerant.then(|| self.scanner.errors.take_errors());
        tracing::trace!(
            nodes = self.next_id,
            errors = errors.as_ref().map_or(0, Vec::len),
            "parsed {}",
            source_type.as_str()
        );

        Ok(Program {
            root,
            comments,
            tokens,
            errors,
        })
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Error for an unexpected `token`, or for the current position.
    pub(crate) fn unexpected_token_error(&self, token: Option<&RawToken>, message: Option<&str>) -> ParseError {
        let mut msg = message.unwrap_or(messages::UNEXPECTED_TOKEN);
        if let (Some(token), None) = (token, message) {
            msg = match token.kind {
                TokenKind::Eof => messages::UNEXPECTED_EOS,
                TokenKind::Identifier => messages::UNEXPECTED_IDENTIFIER,
                TokenKind::NumericLiteral => messages::UNEXPECTED_NUMBER,
                TokenKind::StringLiteral => messages::UNEXPECTED_STRING,
                TokenKind::Template => messages::UNEXPECTED_TEMPLATE,
                TokenKind::Keyword if is_future_reserved_word(&token.value) => messages::UNEXPECTED_RESERVED,
                TokenKind::Keyword if self.context.strict && is_strict_mode_reserved_word(&token.value) => {
                    messages::STRICT_RESERVED_WORD
                }
                _ => messages::UNEXPECTED_TOKEN,
            };
        }
        let description = msg.replacen("%0", token.map_or("ILLEGAL", |t| t.value.as_str()), 1);

        match token {
            Some(token) => {
                let line_start = self.last_marker.index as i64 - self.last_marker.column as i64;
                let column = (token.start as i64 - line_start + 1).max(1) as u32;
                ParseError::new(token.start, token.line_number, column, description)
            }
            None => ParseError::new(
                self.last_marker.index,
                self.last_marker.line,
                self.last_marker.column + 1,
                description,
            ),
        }
    }

    #[inline]
    pub(crate) fn unexpected(&self, token: &RawToken) -> ParseError {
        self.unexpected_token_error(Some(token), None)
    }

    #[inline]
    pub(crate) fn unexpected_with(&self, token: &RawToken, message: &str) -> ParseError {
        self.unexpected_token_error(Some(token), Some(message))
    }

    /// Error at the end of the last consumed token.
    pub(crate) fn error(&self, message: &str, args: &[&str]) -> ParseError {
        ParseError::new(
            self.last_marker.index,
            self.last_marker.line,
            self.last_marker.column + 1,
            format_message(message, args),
        )
    }

    /// Record an error at the end of the last consumed token, or fail when
    /// not tolerant.
    pub(crate) fn tolerate_error(&mut self, message: &str, args: &[&str]) -> Result<()> {
        self.scanner.errors.tolerate_error(
            self.last_marker.index,
            self.scanner.line_number,
            self.last_marker.column + 1,
            format_message(message, args),
        )
    }

    #[inline]
    pub(crate) fn tolerate(&mut self, err: ParseError) -> Result<()> {
        self.scanner.errors.tolerate(err)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    pub(crate) fn scanner_marker(&self) -> Marker {
        Marker {
            index: self.scanner.index,
            line: self.scanner.line_number,
            column: (self.scanner.index - self.scanner.line_start) as u32,
        }
    }

    /// Source text of a token.
    pub(crate) fn token_raw(&self, token: &RawToken) -> &'a str {
        self.scanner.source().get(token.start..token.end).unwrap_or("")
    }

    pub(crate) fn convert_token(&self, token: &RawToken) -> TokenEntry {
        TokenEntry {
            kind: token.kind,
            value: self.token_raw(token).to_string(),
            regex: token.regex.clone(),
            range: self.config.range.then(|| [token.start as u32, token.end as u32]),
            loc: self.config.loc.then(|| SourceLocation {
                start: self.start_marker.position(),
                end: self.scanner_marker().position(),
                source: None,
            }),
        }
    }

    /// Skip trivia, reporting comments when they are collected.
    pub(crate) fn collect_comments(&mut self) -> Result<()> {
        let scanned = self.scanner.scan_comments()?;
        if !self.config.comment {
            return Ok(());
        }
        for entry in scanned {
            let comment = Comment {
                kind: if entry.multi_line {
                    CommentKind::Block
                } else {
                    CommentKind::Line
                },
                value: self
                    .scanner
                    .source()
                    .get(entry.slice.0..entry.slice.1)
                    .unwrap_or("")
                    .to_string(),
                range: self.config.range.then(|| [entry.range.0 as u32, entry.range.1 as u32]),
                loc: self.config.loc.then(|| SourceLocation {
                    start: entry.start,
                    end: entry.end,
                    source: None,
                }),
            };
            let metadata = Metadata {
                start: MetaPosition {
                    line: entry.start.line,
                    column: entry.start.column,
                    offset: entry.range.0,
                },
                end: MetaPosition {
                    line: entry.end.line,
                    column: entry.end.column,
                    offset: entry.range.1,
                },
            };
            if let Some(delegate) = self.delegate.as_deref_mut() {
                delegate.visit_comment(&comment, &metadata);
            }
            if let Some(handler) = self.comment_handler.as_mut() {
                handler.visit_comment(&comment, &metadata);
            }
        }
        Ok(())
    }

    /// Consume the lookahead, scan the next token, return the consumed one.
    pub(crate) fn next_token(&mut self) -> Result<RawToken> {
        self.last_marker = self.scanner_marker();
        self.collect_comments()?;
        if self.scanner.index != self.start_marker.index {
            self.start_marker = self.scanner_marker();
        }

        let mut next = self.scanner.lex()?;
        self.has_line_terminator = self.lookahead.line_number != next.line_number;
        if self.context.strict && next.kind == TokenKind::Identifier && is_strict_mode_reserved_word(&next.value) {
            next.kind = TokenKind::Keyword;
        }
        if self.config.tokens && next.kind != TokenKind::Eof {
            let entry = self.convert_token(&next);
            self.tokens.push(entry);
        }
        Ok(mem::replace(&mut self.lookahead, next))
    }

    /// Rescan the current `/` or `/=` as a regular expression.
    pub(crate) fn next_regex_token(&mut self) -> Result<RawToken> {
        self.collect_comments()?;
        let token = self.scanner.scan_regexp()?;
        if self.config.tokens {
            // The `/` or `/=` pushed as lookahead.
            self.tokens.pop();
            let entry = self.convert_token(&token);
            self.tokens.push(entry);
        }
        self.lookahead = token.clone();
        self.next_token()?;
        Ok(token)
    }

    /// Scan one token past the lookahead without consuming anything.
    pub(crate) fn peek_token(&mut self) -> Result<RawToken> {
        self.scanner.look_ahead(|s| {
            s.scan_comments()?;
            s.lex()
        })
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    #[inline]
    pub(crate) fn create_node(&self) -> Marker {
        self.start_marker
    }

    #[inline]
    pub(crate) fn start_node(&self, token: &RawToken) -> Marker {
        self.start_node_at(token, 0)
    }

    /// Marker at the start of `token`. A token that began on an earlier line
    /// than its recorded line start is placed on the previous line.
    pub(crate) fn start_node_at(&self, token: &RawToken, last_line_start: usize) -> Marker {
        let mut column = token.start as i64 - token.line_start as i64;
        let mut line = token.line_number;
        if column < 0 {
            column += last_line_start as i64;
            line = line.saturating_sub(1);
        }
        Marker {
            index: token.start,
            line,
            column: column.max(0) as u32,
        }
    }

    /// Close a node that started at `marker` and ends at the last consumed token.
    pub(crate) fn finalize(&mut self, marker: Marker, kind: NodeKind) -> Node {
        self.next_id += 1;
        let end = self.last_marker;
        let mut node = Node::new(kind, Span::new(marker.index as u32, end.index as u32));
        node.id = NodeId(self.next_id);
        if self.config.range {
            node.range = Some(node.span.range());
        }
        if self.config.loc {
            node.loc = Some(SourceLocation {
                start: marker.position(),
                end: end.position(),
                source: self.config.source.clone(),
            });
        }
        if self.delegate.is_some() || self.comment_handler.is_some() {
            let metadata = Metadata {
                start: marker.into(),
                end: end.into(),
            };
            if let Some(delegate) = self.delegate.as_deref_mut() {
                delegate.visit_node(&node, &metadata);
            }
            if let Some(handler) = self.comment_handler.as_mut() {
                handler.visit_node(&node, &metadata);
            }
        }
        node
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Consume the punctuator `value` or fail.
    pub(crate) fn expect(&mut self, value: &str) -> Result<()> {
        let token = self.next_token()?;
        if !token.is_punctuator(value) {
            return Err(self.unexpected(&token));
        }
        Ok(())
    }

    /// A `,` between list items. Tolerant parsing records a missing comma
    /// instead of failing.
    pub(crate) fn expect_comma_separator(&mut self) -> Result<()> {
        if !self.config.tolerant {
            return self.expect(",");
        }
        if self.check(",") {
            self.next_token()?;
        } else if self.check(";") {
            let token = self.next_token()?;
            self.tolerate(self.unexpected(&token))?;
        } else {
            self.tolerate(self.unexpected_with(&self.lookahead, messages::UNEXPECTED_TOKEN))?;
        }
        Ok(())
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_token()?;
        if !token.is_keyword(keyword) {
            return Err(self.unexpected(&token));
        }
        Ok(())
    }

    /// Lookahead is the punctuator `value`.
    #[inline]
    pub(crate) fn check(&self, value: &str) -> bool {
        self.lookahead.is_punctuator(value)
    }

    #[inline]
    pub(crate) fn check_keyword(&self, keyword: &str) -> bool {
        self.lookahead.is_keyword(keyword)
    }

    /// Lookahead is the identifier `keyword` (`as`, `async`, `of`, ...).
    #[inline]
    pub(crate) fn check_contextual(&self, keyword: &str) -> bool {
        self.lookahead.is_identifier(keyword)
    }

    pub(crate) fn match_assign(&self) -> bool {
        self.lookahead.kind == TokenKind::Punctuator
            && matches!(
                self.lookahead.value.as_str(),
                "=" | "*="
                    | "**="
                    | "/="
                    | "%="
                    | "+="
                    | "-="
                    | "<<="
                    | ">>="
                    | ">>>="
                    | "&="
                    | "^="
                    | "|="
                    | "&&="
                    | "||="
                    | "??="
            )
    }

    /// Automatic semicolon insertion.
    pub(crate) fn consume_semicolon(&mut self) -> Result<()> {
        if self.check(";") {
            self.next_token()?;
        } else if !self.has_line_terminator {
            if self.lookahead.kind != TokenKind::Eof && !self.check("}") {
                return Err(self.unexpected(&self.lookahead));
            }
            self.last_marker = self.start_marker;
        }
        Ok(())
    }

    fn operator<T>(&self, token: &RawToken, parse: fn(&str) -> Option<T>) -> Result<T> {
        parse(&token.value).ok_or_else(|| self.unexpected(token))
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Run `f` with a modified context; the previous context is restored
    /// afterwards.
    pub(crate) fn with_context<T>(
        &mut self,
        change: impl FnOnce(&mut Context),
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.context;
        change(&mut self.context);
        let result = f(self);
        self.context = saved;
        result
    }

    /// Parse a production that is used only as an expression. A pending
    /// shorthand initializer is an error.
    pub(crate) fn isolate_cover_grammar<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let previous = mem::replace(&mut self.cover, Cover::fresh());
        let result = f(self)?;
        if let Some(token) = &self.cover.first_cover_initialized_name_error {
            return Err(self.unexpected(token));
        }
        self.cover = previous;
        Ok(result)
    }

    /// Parse a production that may still become part of a pattern. Flags are
    /// merged into the enclosing state.
    pub(crate) fn inherit_cover_grammar<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let previous = mem::replace(&mut self.cover, Cover::fresh());
        let result = f(self)?;
        self.cover.is_binding_element &= previous.is_binding_element;
        self.cover.is_assignment_target &= previous.is_assignment_target;
        if previous.first_cover_initialized_name_error.is_some() {
            self.cover.first_cover_initialized_name_error = previous.first_cover_initialized_name_error;
        }
        Ok(result)
    }

    // =========================================================================
    // Primary expressions
    // =========================================================================

    pub(crate) fn parse_primary_expression(&mut self) -> Result<Node> {
        if self.config.jsx && self.check("<") {
            return self.parse_jsx_root();
        }

        let node = self.create_node();
        match self.lookahead.kind {
            TokenKind::Identifier => {
                if (self.context.is_module || self.context.is_async) && self.lookahead.value == "await" {
                    self.tolerate(self.unexpected(&self.lookahead))?;
                }
                if self.match_async_function()? {
                    self.parse_function_expression()
                } else {
                    let token = self.next_token()?;
                    Ok(self.finalize(node, NodeKind::Identifier { name: token.value }))
                }
            }
            TokenKind::NumericLiteral | TokenKind::StringLiteral => {
                if self.context.strict && self.lookahead.octal {
                    self.tolerate(self.unexpected_with(&self.lookahead, messages::STRICT_OCTAL_LITERAL))?;
                }
                self.cover.non_pattern();
                let token = self.next_token()?;
                Ok(self.finalize_literal(node, &token))
            }
            TokenKind::BooleanLiteral | TokenKind::NullLiteral => {
                self.cover.non_pattern();
                let token = self.next_token()?;
                Ok(self.finalize_literal(node, &token))
            }
            TokenKind::Template => self.parse_template_literal(false),
            TokenKind::Punctuator => match self.lookahead.value.as_str() {
                "(" => {
                    self.cover.is_binding_element = false;
                    self.inherit_cover_grammar(Self::parse_group_expression)
                }
                "[" => self.inherit_cover_grammar(Self::parse_array_initializer),
                "{" => self.inherit_cover_grammar(Self::parse_object_initializer),
                "/" | "/=" => {
                    self.cover.non_pattern();
                    self.scanner.index = self.start_marker.index;
                    let token = self.next_regex_token()?;
                    let raw = self.token_raw(&token).to_string();
                    Ok(self.finalize(
                        node,
                        NodeKind::Literal {
                            value: LiteralValue::RegExp,
                            raw,
                            regex: token.regex,
                        },
                    ))
                }
                _ => {
                    let token = self.next_token()?;
                    Err(self.unexpected(&token))
                }
            },
            TokenKind::Keyword => {
                if !self.context.strict && self.context.allow_yield && self.check_keyword("yield") {
                    return self.parse_identifier_name();
                }
                if !self.context.strict && self.check_keyword("let") {
                    let token = self.next_token()?;
                    return Ok(self.finalize(node, NodeKind::Identifier { name: token.value }));
                }
                self.cover.non_pattern();
                if self.check_keyword("function") {
                    self.parse_function_expression()
                } else if self.check_keyword("this") {
                    self.next_token()?;
                    Ok(self.finalize(node, NodeKind::ThisExpression))
                } else if self.check_keyword("class") {
                    self.parse_class_expression()
                } else if self.match_import_call()? {
                    self.parse_import_call()
                } else if self.match_import_meta()? {
                    if !self.context.is_module {
                        self.tolerate(
                            self.unexpected_with(&self.lookahead, messages::CANNOT_USE_IMPORT_META_OUTSIDE_A_MODULE),
                        )?;
                    }
                    self.parse_import_meta()
                } else {
                    let token = self.next_token()?;
                    Err(self.unexpected(&token))
                }
            }
            _ => {
                let token = self.next_token()?;
                Err(self.unexpected(&token))
            }
        }
    }

    /// `Literal` for a string, number, boolean or null token.
    pub(crate) fn finalize_literal(&mut self, marker: Marker, token: &RawToken) -> Node {
        let value = match token.kind {
            TokenKind::NumericLiteral => LiteralValue::Number(token.number),
            TokenKind::BooleanLiteral => LiteralValue::Boolean(token.value == "true"),
            TokenKind::NullLiteral => LiteralValue::Null,
            _ => LiteralValue::String(token.value.clone()),
        };
        let raw = self.token_raw(token).to_string();
        self.finalize(marker, NodeKind::Literal { value, raw, regex: None })
    }

    fn parse_spread_element(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect("...")?;
        let argument = self.inherit_cover_grammar(Self::parse_assignment_expression)?;
        Ok(self.finalize(
            node,
            NodeKind::SpreadElement {
                argument: Box::new(argument),
            },
        ))
    }

    pub(crate) fn parse_array_initializer(&mut self) -> Result<Node> {
        let node = self.create_node();
        let mut elements = Vec::new();

        self.expect("[")?;
        while !self.check("]") {
            if self.check(",") {
                self.next_token()?;
                elements.push(None);
            } else if self.check("...") {
                let element = self.parse_spread_element()?;
                if !self.check("]") {
                    self.cover.non_pattern();
                    self.expect(",")?;
                }
                elements.push(Some(element));
            } else {
                elements.push(Some(self.inherit_cover_grammar(Self::parse_assignment_expression)?));
                if !self.check("]") {
                    self.expect(",")?;
                }
            }
        }
        self.expect("]")?;

        Ok(self.finalize(node, NodeKind::ArrayExpression { elements }))
    }

    // =========================================================================
    // Object initializers
    // =========================================================================

    /// Body of a method; checks deferred parameter errors once the body's
    /// strictness is known.
    pub(crate) fn parse_property_method(&mut self, params: &FormalParameters) -> Result<Node> {
        self.cover.non_pattern();
        let simple = params.simple;
        self.with_context(
            |c| c.allow_strict_directive = simple,
            |p| {
                let body = p.isolate_cover_grammar(Self::parse_function_source_elements)?;
                if p.context.strict {
                    if let Some(offender) = &params.first_restricted {
                        p.tolerate(p.offender_error(offender, params.message))?;
                    }
                    if let Some(offender) = &params.stricted {
                        p.tolerate(p.offender_error(offender, params.message))?;
                    }
                }
                Ok(body)
            },
        )
    }

    pub(crate) fn parse_property_method_function(&mut self, is_generator: bool) -> Result<Node> {
        let node = self.create_node();
        let (params, body) = self.with_context(
            |c| c.allow_yield = true,
            |p| {
                let params = p.parse_formal_parameters(None)?;
                let body = p.parse_property_method(&params)?;
                Ok((params, body))
            },
        )?;
        Ok(self.finalize(node, function_expression(None, params.params, body, is_generator, false)))
    }

    pub(crate) fn parse_property_method_async_function(&mut self, is_generator: bool) -> Result<Node> {
        let node = self.create_node();
        let (params, body) = self.with_context(
            |c| {
                c.allow_yield = false;
                c.is_async = true;
            },
            |p| {
                let params = p.parse_formal_parameters(None)?;
                let body = p.parse_property_method(&params)?;
                Ok((params, body))
            },
        )?;
        Ok(self.finalize(node, function_expression(None, params.params, body, is_generator, true)))
    }

    pub(crate) fn parse_object_property_key(&mut self) -> Result<Node> {
        let node = self.create_node();
        let token = self.next_token()?;

        match token.kind {
            TokenKind::StringLiteral | TokenKind::NumericLiteral => {
                if self.context.strict && token.octal {
                    self.tolerate(self.unexpected_with(&token, messages::STRICT_OCTAL_LITERAL))?;
                }
                Ok(self.finalize_literal(node, &token))
            }
            TokenKind::Identifier | TokenKind::BooleanLiteral | TokenKind::NullLiteral | TokenKind::Keyword => {
                Ok(self.finalize(node, NodeKind::Identifier { name: token.value }))
            }
            TokenKind::Punctuator if token.value == "[" => {
                let key = self.isolate_cover_grammar(Self::parse_assignment_expression)?;
                self.expect("]")?;
                Ok(key)
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse_object_property(&mut self, has_proto: &mut bool) -> Result<Node> {
        let node = self.create_node();
        let token = self.lookahead.clone();

        let mut key: Option<Node> = None;
        let value: Node;
        let kind: PropertyKind;
        let mut computed = false;
        let mut method = false;
        let mut shorthand = false;
        let mut is_async = false;
        let mut is_generator = false;

        if token.kind == TokenKind::Identifier {
            self.next_token()?;
            computed = self.check("[");
            is_async = !self.has_line_terminator
                && token.value == "async"
                && !self.check(":")
                && !self.check("(")
                && !self.check(",");
            is_generator = self.check("*");
            if is_generator {
                self.next_token()?;
            }
            key = Some(if is_async {
                self.parse_object_property_key()?
            } else {
                self.finalize(
                    node,
                    NodeKind::Identifier {
                        name: token.value.clone(),
                    },
                )
            });
        } else if self.check("*") {
            self.next_token()?;
        } else {
            computed = self.check("[");
            key = Some(self.parse_object_property_key()?);
        }

        let lookahead_property_key = qualified_property_name(&self.lookahead);
        if token.kind == TokenKind::Identifier && !is_async && token.value == "get" && lookahead_property_key {
            kind = PropertyKind::Get;
            computed = self.check("[");
            key = Some(self.parse_object_property_key()?);
            value = self.parse_getter_method()?;
        } else if token.kind == TokenKind::Identifier && !is_async && token.value == "set" && lookahead_property_key {
            kind = PropertyKind::Set;
            computed = self.check("[");
            key = Some(self.parse_object_property_key()?);
            value = self.parse_setter_method()?;
        } else if token.is_punctuator("*") && lookahead_property_key {
            kind = PropertyKind::Init;
            computed = self.check("[");
            key = Some(self.parse_object_property_key()?);
            value = self.parse_generator_method()?;
            method = true;
        } else {
            let Some(current_key) = key.as_ref() else {
                return Err(self.unexpected(&self.lookahead));
            };
            kind = PropertyKind::Init;
            if self.check(":") && !is_async {
                if !computed && is_property_key(current_key, "__proto__") {
                    if *has_proto {
                        self.tolerate_error(messages::DUPLICATE_PROTO_PROPERTY, &[])?;
                    }
                    *has_proto = true;
                }
                self.next_token()?;
                value = self.inherit_cover_grammar(Self::parse_assignment_expression)?;
            } else if self.check("(") {
                value = if is_async {
                    self.parse_property_method_async_function(is_generator)?
                } else {
                    self.parse_property_method_function(is_generator)?
                };
                method = true;
            } else if token.kind == TokenKind::Identifier {
                let id = self.finalize(
                    node,
                    NodeKind::Identifier {
                        name: token.value.clone(),
                    },
                );
                shorthand = true;
                if self.check("=") {
                    self.cover.first_cover_initialized_name_error = Some(self.lookahead.clone());
                    self.next_token()?;
                    let init = self.isolate_cover_grammar(Self::parse_assignment_expression)?;
                    value = self.finalize(
                        node,
                        NodeKind::AssignmentPattern {
                            left: Box::new(id),
                            right: Box::new(init),
                        },
                    );
                } else {
                    value = id;
                }
            } else {
                let token = self.next_token()?;
                return Err(self.unexpected(&token));
            }
        }

        let Some(key) = key else {
            return Err(self.unexpected(&self.lookahead));
        };
        Ok(self.finalize(
            node,
            NodeKind::Property {
                key: Box::new(key),
                computed,
                value: Box::new(value),
                kind,
                method,
                shorthand,
            },
        ))
    }

    pub(crate) fn parse_object_initializer(&mut self) -> Result<Node> {
        let node = self.create_node();
        let mut properties = Vec::new();
        let mut has_proto = false;

        self.expect("{")?;
        while !self.check("}") {
            let property = if self.check("...") {
                self.parse_spread_element()?
            } else {
                self.parse_object_property(&mut has_proto)?
            };
            properties.push(property);
            if !self.check("}") {
                self.expect_comma_separator()?;
            }
        }
        self.expect("}")?;

        Ok(self.finalize(node, NodeKind::ObjectExpression { properties }))
    }

    // =========================================================================
    // Templates
    // =========================================================================

    fn template_escape_error(&self, token: &RawToken, head: char) -> ParseError {
        let message = match head {
            'u' => messages::INVALID_UNICODE_ESCAPE_SEQUENCE,
            'x' => messages::INVALID_HEX_ESCAPE_SEQUENCE,
            '8' | '9' => messages::TEMPLATE_ESCAPE_89,
            _ => messages::TEMPLATE_OCTAL_LITERAL,
        };
        self.unexpected_with(token, message)
    }

    /// One template chunk. Untagged templates reject invalid escapes.
    fn parse_template_element(&mut self, is_tagged: bool) -> Result<(Node, bool)> {
        if self.lookahead.kind != TokenKind::Template {
            return Err(self.unexpected_token_error(None, None));
        }
        let node = self.create_node();
        let token = self.next_token()?;
        if !is_tagged {
            if let Some(head) = token.not_escape_sequence_head {
                return Err(self.template_escape_error(&token, head));
            }
        }
        let tail = token.tail;
        let element = self.finalize(
            node,
            NodeKind::TemplateElement {
                value: TemplateValue {
                    raw: token.value,
                    cooked: token.cooked,
                },
                tail,
            },
        );
        Ok((element, tail))
    }

    fn parse_template_literal(&mut self, is_tagged: bool) -> Result<Node> {
        let node = self.create_node();
        let mut expressions = Vec::new();

        let (quasi, mut tail) = self.parse_template_element(is_tagged)?;
        let mut quasis = vec![quasi];
        while !tail {
            expressions.push(self.parse_expression()?);
            let (quasi, is_tail) = self.parse_template_element(is_tagged)?;
            quasis.push(quasi);
            tail = is_tail;
        }

        Ok(self.finalize(node, NodeKind::TemplateLiteral { quasis, expressions }))
    }

    // =========================================================================
    // Groups and arguments
    // =========================================================================

    /// `( ... )`: a parenthesized expression, a sequence, or arrow parameters.
    fn parse_group_expression(&mut self) -> Result<Node> {
        self.expect("(")?;
        if self.check(")") {
            self.next_token()?;
            if !self.check("=>") {
                self.expect("=>")?;
            }
            return Ok(arrow_placeholder(Vec::new(), false));
        }

        let start_token = self.lookahead.clone();
        if self.check("...") {
            let rest = self.parse_rest_element(&mut Vec::new())?;
            self.expect(")")?;
            if !self.check("=>") {
                self.expect("=>")?;
            }
            return Ok(arrow_placeholder(vec![rest], false));
        }

        self.cover.is_binding_element = true;
        let mut expr = self.inherit_cover_grammar(Self::parse_assignment_expression)?;

        if self.check(",") {
            let mut expressions = vec![expr];
            let mut arrow = false;
            self.cover.is_assignment_target = false;
            while self.lookahead.kind != TokenKind::Eof {
                if !self.check(",") {
                    break;
                }
                self.next_token()?;
                if self.check(")") {
                    self.next_token()?;
                    arrow = true;
                    break;
                } else if self.check("...") {
                    if !self.cover.is_binding_element {
                        return Err(self.unexpected(&self.lookahead));
                    }
                    expressions.push(self.parse_rest_element(&mut Vec::new())?);
                    self.expect(")")?;
                    if !self.check("=>") {
                        self.expect("=>")?;
                    }
                    self.cover.is_binding_element = false;
                    arrow = true;
                    break;
                }
                expressions.push(self.inherit_cover_grammar(Self::parse_assignment_expression)?);
            }
            if arrow {
                let params = expressions.into_iter().map(reinterpret_as_pattern).collect();
                return Ok(arrow_placeholder(params, false));
            }
            expr = self.finalize(self.start_node(&start_token), NodeKind::SequenceExpression { expressions });
        }

        self.expect(")")?;
        if self.check("=>") {
            if expr.identifier_name() == Some("yield") {
                self.cover.is_binding_element = false;
                return Ok(arrow_placeholder(vec![expr], false));
            }
            if !self.cover.is_binding_element {
                return Err(self.unexpected(&self.lookahead));
            }
            let params = match expr.kind {
                NodeKind::SequenceExpression { expressions } => expressions,
                _ => vec![expr],
            };
            expr = arrow_placeholder(params.into_iter().map(reinterpret_as_pattern).collect(), false);
        }
        self.cover.is_binding_element = false;
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Node>> {
        self.parse_argument_list(false)
    }

    /// Call arguments. Arguments of a possible `async (...) =>` keep shorthand
    /// initializers legal.
    fn parse_argument_list(&mut self, maybe_async_arrow: bool) -> Result<Vec<Node>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.check(")") {
            loop {
                let expr = if self.check("...") {
                    self.parse_spread_element()?
                } else if maybe_async_arrow {
                    self.isolate_cover_grammar(Self::parse_async_argument)?
                } else {
                    self.isolate_cover_grammar(Self::parse_assignment_expression)?
                };
                args.push(expr);
                if self.check(")") {
                    break;
                }
                self.expect_comma_separator()?;
                if self.check(")") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn parse_async_argument(&mut self) -> Result<Node> {
        let arg = self.parse_assignment_expression()?;
        self.cover.first_cover_initialized_name_error = None;
        Ok(arg)
    }

    pub(crate) fn parse_identifier_name(&mut self) -> Result<Node> {
        let node = self.create_node();
        let token = self.next_token()?;
        if !is_identifier_name(&token) {
            return Err(self.unexpected(&token));
        }
        Ok(self.finalize(node, NodeKind::Identifier { name: token.value }))
    }

    // =========================================================================
    // new, import(), import.meta, super
    // =========================================================================

    fn parse_new_expression(&mut self) -> Result<Node> {
        let node = self.create_node();
        let id = self.parse_identifier_name()?;

        if self.check(".") {
            self.next_token()?;
            if self.lookahead.kind == TokenKind::Identifier
                && self.context.in_function_body
                && self.lookahead.value == "target"
            {
                let property = self.parse_identifier_name()?;
                return Ok(self.finalize(
                    node,
                    NodeKind::MetaProperty {
                        meta: Box::new(id),
                        property: Box::new(property),
                    },
                ));
            }
            return Err(self.unexpected(&self.lookahead));
        }
        if self.check_keyword("import") {
            return Err(self.unexpected(&self.lookahead));
        }

        let callee = self.isolate_cover_grammar(Self::parse_left_hand_side_expression)?;
        let arguments = if self.check("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.cover.non_pattern();
        Ok(self.finalize(
            node,
            NodeKind::NewExpression {
                callee: Box::new(callee),
                arguments,
            },
        ))
    }

    pub(crate) fn match_import_call(&mut self) -> Result<bool> {
        if !self.check_keyword("import") {
            return Ok(false);
        }
        Ok(self.peek_token()?.is_punctuator("("))
    }

    fn parse_import_call(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("import")?;
        Ok(self.finalize(node, NodeKind::Import))
    }

    /// `import . meta` ahead.
    pub(crate) fn match_import_meta(&mut self) -> Result<bool> {
        if !self.check_keyword("import") {
            return Ok(false);
        }
        let meta = self.scanner.look_ahead(|s| -> Result<Option<RawToken>> {
            s.scan_comments()?;
            if !s.lex()?.is_punctuator(".") {
                return Ok(None);
            }
            s.scan_comments()?;
            Ok(Some(s.lex()?))
        })?;
        match meta {
            Some(meta) if meta.is_identifier("meta") => {
                if meta.end - meta.start != "meta".len() {
                    self.tolerate(self.unexpected_with(&meta, messages::INVALID_ESCAPED_RESERVED_WORD))?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn parse_import_meta(&mut self) -> Result<Node> {
        let node = self.create_node();
        let meta = self.parse_identifier_name()?;
        self.expect(".")?;
        let property = self.parse_identifier_name()?;
        self.cover.is_assignment_target = false;
        Ok(self.finalize(
            node,
            NodeKind::MetaProperty {
                meta: Box::new(meta),
                property: Box::new(property),
            },
        ))
    }

    fn parse_super(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("super")?;
        if !self.check("[") && !self.check(".") {
            return Err(self.unexpected(&self.lookahead));
        }
        Ok(self.finalize(node, NodeKind::Super))
    }

    fn parse_new_or_primary_expression(&mut self) -> Result<Node> {
        if self.check_keyword("new") {
            self.inherit_cover_grammar(Self::parse_new_expression)
        } else {
            self.inherit_cover_grammar(Self::parse_primary_expression)
        }
    }

    // =========================================================================
    // Left-hand side expressions
    // =========================================================================

    /// Member access, calls, tagged templates and optional chains.
    pub(crate) fn parse_left_hand_side_expression_allow_call(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let maybe_async = self.check_contextual("async");
        self.with_context(|c| c.allow_in = true, |p| p.parse_call_chain(&start_token, maybe_async))
    }

    fn parse_call_chain(&mut self, start_token: &RawToken, maybe_async: bool) -> Result<Node> {
        let is_super = self.check_keyword("super");
        let mut expr = if is_super && self.context.in_function_body {
            let marker = self.create_node();
            self.next_token()?;
            let expr = self.finalize(marker, NodeKind::Super);
            if !self.check("(") && !self.check(".") && !self.check("[") {
                return Err(self.unexpected(&self.lookahead));
            }
            expr
        } else {
            self.parse_new_or_primary_expression()?
        };

        if is_super && self.check("(") && !self.context.in_class_constructor {
            self.tolerate_error(messages::UNEXPECTED_SUPER, &[])?;
        }

        let mut has_optional = false;
        loop {
            let mut optional = false;
            if self.check("?.") {
                optional = true;
                has_optional = true;
                self.expect("?.")?;
            }

            if self.check("(") {
                let async_arrow = maybe_async && start_token.line_number == self.lookahead.line_number;
                self.cover.non_pattern();
                let args = self.parse_argument_list(async_arrow)?;
                if matches!(expr.kind, NodeKind::Import) && args.len() != 1 {
                    self.tolerate_error(messages::BAD_IMPORT_CALL_ARITY, &[])?;
                }
                if async_arrow && self.check("=>") {
                    let params = args.into_iter().map(reinterpret_as_pattern).collect();
                    expr = arrow_placeholder(params, true);
                } else {
                    expr = self.finalize(
                        self.start_node(start_token),
                        NodeKind::CallExpression {
                            callee: Box::new(expr),
                            arguments: args,
                            optional,
                        },
                    );
                }
            } else if self.check("[") {
                self.cover.is_binding_element = false;
                self.cover.is_assignment_target = !optional;
                self.expect("[")?;
                let property = self.isolate_cover_grammar(Self::parse_expression)?;
                self.expect("]")?;
                expr = self.finalize(self.start_node(start_token), member(expr, property, true, optional));
            } else if self.lookahead.kind == TokenKind::Template && self.lookahead.head {
                if optional {
                    return Err(self.unexpected(&self.lookahead));
                }
                if has_optional {
                    return Err(self.error(messages::INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN, &[]));
                }
                let quasi = self.parse_template_literal(true)?;
                expr = self.finalize(
                    self.start_node(start_token),
                    NodeKind::TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi: Box::new(quasi),
                    },
                );
            } else if self.check(".") || optional {
                self.cover.is_binding_element = false;
                self.cover.is_assignment_target = !optional;
                if !optional {
                    self.expect(".")?;
                }
                let property = self.parse_identifier_name()?;
                expr = self.finalize(self.start_node(start_token), member(expr, property, false, optional));
            } else {
                break;
            }
        }

        if has_optional {
            return Ok(self.finalize(
                self.start_node(start_token),
                NodeKind::ChainExpression {
                    expression: Box::new(expr),
                },
            ));
        }
        Ok(expr)
    }

    /// Callee of `new`: member access without calls.
    fn parse_left_hand_side_expression(&mut self) -> Result<Node> {
        let node = self.start_node(&self.lookahead);
        let mut expr = if self.check_keyword("super") && self.context.in_function_body {
            self.parse_super()?
        } else {
            self.parse_new_or_primary_expression()?
        };

        let mut has_optional = false;
        loop {
            let mut optional = false;
            if self.check("?.") {
                optional = true;
                has_optional = true;
                self.expect("?.")?;
            }

            if self.check("[") {
                self.cover.is_binding_element = false;
                self.cover.is_assignment_target = !optional;
                self.expect("[")?;
                let property = self.isolate_cover_grammar(Self::parse_expression)?;
                self.expect("]")?;
                expr = self.finalize(node, member(expr, property, true, optional));
            } else if self.lookahead.kind == TokenKind::Template && self.lookahead.head {
                if optional {
                    return Err(self.unexpected(&self.lookahead));
                }
                if has_optional {
                    return Err(self.error(messages::INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN, &[]));
                }
                let quasi = self.parse_template_literal(true)?;
                expr = self.finalize(
                    node,
                    NodeKind::TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi: Box::new(quasi),
                    },
                );
            } else if self.check(".") || optional {
                self.cover.is_binding_element = false;
                self.cover.is_assignment_target = !optional;
                if !optional {
                    self.expect(".")?;
                }
                let property = self.parse_identifier_name()?;
                expr = self.finalize(node, member(expr, property, false, optional));
            } else {
                break;
            }
        }

        if has_optional {
            return Ok(self.finalize(
                node,
                NodeKind::ChainExpression {
                    expression: Box::new(expr),
                },
            ));
        }
        Ok(expr)
    }

    // =========================================================================
    // Unary and update expressions
    // =========================================================================

    fn parse_update_expression(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();

        if self.check("++") || self.check("--") {
            let marker = self.start_node(&start_token);
            let token = self.next_token()?;
            let argument = self.inherit_cover_grammar(Self::parse_unary_expression)?;
            if self.context.strict && argument.identifier_name().is_some_and(is_restricted_word) {
                self.tolerate_error(messages::STRICT_LHS_PREFIX, &[])?;
            }
            if !self.cover.is_assignment_target {
                self.tolerate_error(messages::INVALID_LHS_IN_ASSIGNMENT, &[])?;
            }
            let operator = self.operator(&token, UpdateOp::from_str)?;
            let expr = self.finalize(
                marker,
                NodeKind::UpdateExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                },
            );
            self.cover.non_pattern();
            return Ok(expr);
        }

        let expr = self.inherit_cover_grammar(Self::parse_left_hand_side_expression_allow_call)?;
        if !self.has_line_terminator && (self.check("++") || self.check("--")) {
            if self.context.strict && expr.identifier_name().is_some_and(is_restricted_word) {
                self.tolerate_error(messages::STRICT_LHS_POSTFIX, &[])?;
            }
            if !self.cover.is_assignment_target {
                self.tolerate_error(messages::INVALID_LHS_IN_ASSIGNMENT, &[])?;
            }
            self.cover.non_pattern();
            let token = self.next_token()?;
            let operator = self.operator(&token, UpdateOp::from_str)?;
            return Ok(self.finalize(
                self.start_node(&start_token),
                NodeKind::UpdateExpression {
                    operator,
                    argument: Box::new(expr),
                    prefix: false,
                },
            ));
        }
        Ok(expr)
    }

    fn parse_await_expression(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.next_token()?;
        let argument = self.parse_unary_expression()?;
        Ok(self.finalize(
            node,
            NodeKind::AwaitExpression {
                argument: Box::new(argument),
            },
        ))
    }

    fn match_unary_op(&self) -> bool {
        match self.lookahead.kind {
            TokenKind::Punctuator => matches!(self.lookahead.value.as_str(), "+" | "-" | "~" | "!"),
            TokenKind::Keyword => matches!(self.lookahead.value.as_str(), "delete" | "void" | "typeof"),
            _ => false,
        }
    }

    pub(crate) fn parse_unary_expression(&mut self) -> Result<Node> {
        if self.match_unary_op() {
            let node = self.start_node(&self.lookahead);
            let token = self.next_token()?;
            let argument = self.inherit_cover_grammar(Self::parse_unary_expression)?;
            let operator = self.operator(&token, UnaryOp::from_str)?;
            let deletes_identifier = operator == UnaryOp::Delete && argument.is_identifier();
            let expr = self.finalize(
                node,
                NodeKind::UnaryExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                },
            );
            if self.context.strict && deletes_identifier {
                self.tolerate_error(messages::STRICT_DELETE, &[])?;
            }
            self.cover.non_pattern();
            Ok(expr)
        } else if self.context.is_async && self.check_contextual("await") {
            self.parse_await_expression()
        } else {
            self.parse_update_expression()
        }
    }

    /// `**` is right-associative and may not follow a bare unary expression.
    fn parse_exponentiation_expression(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let expr = self.inherit_cover_grammar(Self::parse_unary_expression)?;
        if matches!(expr.kind, NodeKind::UnaryExpression { .. }) || !self.check("**") {
            return Ok(expr);
        }
        self.next_token()?;
        self.cover.non_pattern();
        let right = self.isolate_cover_grammar(Self::parse_exponentiation_expression)?;
        Ok(self.finalize(
            self.start_node(&start_token),
            NodeKind::BinaryExpression {
                operator: BinaryOp::Pow,
                left: Box::new(expr),
                right: Box::new(right),
            },
        ))
    }

    // =========================================================================
    // Binary expressions
    // =========================================================================

    /// Binding strength of `token` as a binary operator, 0 when it is not one.
    fn binary_precedence(&self, token: &RawToken) -> u8 {
        match token.kind {
            TokenKind::Punctuator => self.precedence.get(&token.value),
            TokenKind::Keyword if token.value == "instanceof" || (self.context.allow_in && token.value == "in") => {
                RELATIONAL_KEYWORD_PRECEDENCE
            }
            _ => 0,
        }
    }

    fn binary_node(&self, operator: &str, left: Node, right: Node) -> Result<NodeKind> {
        let operator = BinaryOp::from_str(operator).ok_or_else(|| self.error(messages::UNEXPECTED_TOKEN, &[operator]))?;
        let (left, right) = (Box::new(left), Box::new(right));
        Ok(if operator.is_logical() {
            NodeKind::LogicalExpression { operator, left, right }
        } else {
            NodeKind::BinaryExpression { operator, left, right }
        })
    }

    /// Operator-precedence reduction over exponentiation operands.
    fn parse_binary_expression(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let expr = self.inherit_cover_grammar(Self::parse_exponentiation_expression)?;

        let token = self.lookahead.clone();
        let prec = self.binary_precedence(&token);
        if prec == 0 {
            return Ok(expr);
        }

        let mut latch = LogicalLatch::new();
        latch.update(&token.value);
        self.next_token()?;
        self.cover.non_pattern();

        // Start tokens of each operand, for node positions.
        let mut markers = vec![start_token, self.lookahead.clone()];
        let right = self.isolate_cover_grammar(Self::parse_exponentiation_expression)?;
        let mut operands = vec![expr, right];
        let mut operators = vec![token.value];
        let mut precedences = vec![prec];

        loop {
            let prec = self.binary_precedence(&self.lookahead);
            if prec == 0 {
                break;
            }
            if latch.rejects(&self.lookahead.value) {
                return Err(self.unexpected(&self.lookahead));
            }
            latch.update(&self.lookahead.value);

            // Reduce while the stack top binds at least as tightly.
            while operands.len() > 1 && precedences.last().is_some_and(|&top| prec <= top) {
                let (Some(right), Some(operator), Some(left)) = (operands.pop(), operators.pop(), operands.pop())
                else {
                    break;
                };
                precedences.pop();
                markers.pop();
                let node = match markers.last() {
                    Some(marker) => self.start_node_at(marker, marker.line_start),
                    None => self.create_node(),
                };
                let kind = self.binary_node(&operator, left, right)?;
                operands.push(self.finalize(node, kind));
            }

            // Shift.
            let operator = self.next_token()?.value;
            operators.push(operator);
            precedences.push(prec);
            markers.push(self.lookahead.clone());
            operands.push(self.isolate_cover_grammar(Self::parse_exponentiation_expression)?);
        }

        // Final reduce, right to left.
        let Some(mut expr) = operands.pop() else {
            return Err(self.unexpected(&self.lookahead));
        };
        let mut last_marker = markers.pop();
        while let (Some(operator), Some(left)) = (operators.pop(), operands.pop()) {
            let Some(marker) = markers.pop() else { break };
            let last_line_start = last_marker.as_ref().map_or(0, |m| m.line_start);
            let node = self.start_node_at(&marker, last_line_start);
            let kind = self.binary_node(&operator, left, expr)?;
            expr = self.finalize(node, kind);
            last_marker = Some(marker);
        }
        Ok(expr)
    }

    fn parse_conditional_expression(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let test = self.inherit_cover_grammar(Self::parse_binary_expression)?;
        if !self.check("?") {
            return Ok(test);
        }

        self.next_token()?;
        let consequent = self.with_context(
            |c| c.allow_in = true,
            |p| p.isolate_cover_grammar(Self::parse_assignment_expression),
        )?;
        self.expect(":")?;
        let alternate = self.isolate_cover_grammar(Self::parse_assignment_expression)?;

        let expr = self.finalize(
            self.start_node(&start_token),
            NodeKind::ConditionalExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        );
        self.cover.non_pattern();
        Ok(expr)
    }

    // =========================================================================
    // Assignment and arrow functions
    // =========================================================================

    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Node> {
        if !self.context.allow_yield && self.check_keyword("yield") {
            return self.parse_yield_expression();
        }

        let start_token = self.lookahead.clone();
        let mut expr = self.parse_conditional_expression()?;

        // `async x => ...`
        if start_token.is_identifier("async")
            && start_token.line_number == self.lookahead.line_number
            && (self.lookahead.kind == TokenKind::Identifier || self.check_keyword("yield"))
        {
            let arg = self.parse_primary_expression()?;
            expr = arrow_placeholder(vec![reinterpret_as_pattern(arg)], true);
        }

        let is_placeholder = matches!(expr.kind, NodeKind::ArrowParameterPlaceholder { .. });
        if is_placeholder || self.check("=>") {
            self.cover.non_pattern();
            if !is_placeholder && !expr.is_identifier() {
                return Ok(expr);
            }
            let is_async = matches!(expr.kind, NodeKind::ArrowParameterPlaceholder { is_async: true, .. });
            let list = self.reinterpret_as_cover_formals_list(expr, is_async)?;
            return self.parse_arrow_function(&start_token, list, is_async);
        }

        if self.match_assign() {
            if !self.cover.is_assignment_target {
                self.tolerate_error(messages::INVALID_LHS_IN_ASSIGNMENT, &[])?;
            }
            if self.context.strict {
                if let Some(name) = expr.identifier_name() {
                    if is_restricted_word(name) {
                        self.tolerate(self.unexpected_with(&start_token, messages::STRICT_LHS_ASSIGNMENT))?;
                    }
                    if is_strict_mode_reserved_word(name) {
                        self.tolerate(self.unexpected_with(&start_token, messages::STRICT_RESERVED_WORD))?;
                    }
                }
            }

            if self.check("=") {
                expr = reinterpret_as_pattern(expr);
            } else {
                self.cover.non_pattern();
            }

            let token = self.next_token()?;
            let operator = self.operator(&token, AssignOp::from_str)?;
            let right = self.isolate_cover_grammar(Self::parse_assignment_expression)?;
            expr = self.finalize(
                self.start_node(&start_token),
                NodeKind::AssignmentExpression {
                    operator,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
            );
            self.cover.first_cover_initialized_name_error = None;
        }

        Ok(expr)
    }

    fn parse_arrow_function(&mut self, start_token: &RawToken, list: FormalParameters, is_async: bool) -> Result<Node> {
        if self.has_line_terminator {
            self.tolerate(self.unexpected(&self.lookahead))?;
        }
        self.cover.first_cover_initialized_name_error = None;

        let simple = list.simple;
        self.with_context(
            |c| {
                c.allow_strict_directive = simple;
                c.allow_yield = true;
                c.is_async = is_async;
            },
            |p| {
                let node = p.start_node(start_token);
                p.expect("=>")?;
                let body = if p.check("{") {
                    p.with_context(|c| c.allow_in = true, Self::parse_function_source_elements)?
                } else {
                    p.isolate_cover_grammar(Self::parse_assignment_expression)?
                };
                let expression = !matches!(body.kind, NodeKind::BlockStatement { .. });

                if p.context.strict {
                    if let Some(offender) = &list.first_restricted {
                        return Err(p.offender_error(offender, list.message));
                    }
                    if let Some(offender) = &list.stricted {
                        p.tolerate(p.offender_error(offender, list.message))?;
                    }
                }

                Ok(p.finalize(
                    node,
                    NodeKind::ArrowFunctionExpression {
                        id: None,
                        params: list.params,
                        body: Box::new(body),
                        generator: false,
                        expression,
                        is_async,
                    },
                ))
            },
        )
    }

    /// Comma expression.
    pub(crate) fn parse_expression(&mut self) -> Result<Node> {
        let start_token = self.lookahead.clone();
        let expr = self.isolate_cover_grammar(Self::parse_assignment_expression)?;
        if !self.check(",") {
            return Ok(expr);
        }

        let mut expressions = vec![expr];
        while self.lookahead.kind != TokenKind::Eof && self.check(",") {
            self.next_token()?;
            expressions.push(self.isolate_cover_grammar(Self::parse_assignment_expression)?);
        }
        Ok(self.finalize(self.start_node(&start_token), NodeKind::SequenceExpression { expressions }))
    }

    // =========================================================================
    // Generators
    // =========================================================================

    pub(crate) fn is_start_of_expression(&self) -> bool {
        let value = self.lookahead.value.as_str();
        match self.lookahead.kind {
            TokenKind::Punctuator => {
                matches!(
                    value,
                    "[" | "(" | "{" | "+" | "-" | "!" | "~" | "++" | "--" | "/" | "/="
                ) || (self.config.jsx && value == "<")
            }
            TokenKind::Keyword => matches!(
                value,
                "class" | "delete" | "function" | "let" | "new" | "super" | "this" | "typeof" | "void" | "yield"
            ),
            _ => true,
        }
    }

    fn parse_yield_expression(&mut self) -> Result<Node> {
        let node = self.create_node();
        self.expect_keyword("yield")?;

        let mut argument = None;
        let mut delegate = false;
        if !self.has_line_terminator {
            (argument, delegate) = self.with_context(
                |c| c.allow_yield = false,
                |p| {
                    let delegate = p.check("*");
                    let argument = if delegate {
                        p.next_token()?;
                        Some(p.parse_assignment_expression()?)
                    } else if p.is_start_of_expression() {
                        Some(p.parse_assignment_expression()?)
                    } else {
                        None
                    };
                    Ok((argument, delegate))
                },
            )?;
        }

        Ok(self.finalize(
            node,
            NodeKind::YieldExpression {
                argument: argument.map(Box::new),
                delegate,
            },
        ))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Parenthesized parameter list awaiting `=>`. Not a finalized node.
pub(crate) fn arrow_placeholder(params: Vec<Node>, is_async: bool) -> Node {
    Node::new(NodeKind::ArrowParameterPlaceholder { params, is_async }, Span::default())
}

pub(crate) fn function_expression(
    id: Option<Node>,
    params: Vec<Node>,
    body: Node,
    generator: bool,
    is_async: bool,
) -> NodeKind {
    NodeKind::FunctionExpression {
        id: id.map(Box::new),
        params,
        body: Box::new(body),
        generator,
        expression: false,
        is_async,
    }
}

fn member(object: Node, property: Node, computed: bool, optional: bool) -> NodeKind {
    NodeKind::MemberExpression {
        computed,
        object: Box::new(object),
        property: Box::new(property),
        optional,
    }
}

/// Identifiers, keywords, `true`, `false` and `null`.
pub(crate) fn is_identifier_name(token: &RawToken) -> bool {
    matches!(
        token.kind,
        TokenKind::Identifier | TokenKind::Keyword | TokenKind::BooleanLiteral | TokenKind::NullLiteral
    )
}

/// Tokens that can start a method name.
pub(crate) fn qualified_property_name(token: &RawToken) -> bool {
    match token.kind {
        TokenKind::Identifier
        | TokenKind::StringLiteral
        | TokenKind::BooleanLiteral
        | TokenKind::NullLiteral
        | TokenKind::NumericLiteral
        | TokenKind::Keyword => true,
        TokenKind::Punctuator => token.value == "[",
        _ => false,
    }
}

/// `key` is the identifier or string literal `value`.
pub(crate) fn is_property_key(key: &Node, value: &str) -> bool {
    match &key.kind {
        NodeKind::Identifier { name } => name == value,
        NodeKind::Literal {
            value: LiteralValue::String(s),
            ..
        } => s == value,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source, &ParseOptions::default(), None)
            .and_then(Parser::parse_program)
            .unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(source, &ParseOptions::default(), None)
            .and_then(Parser::parse_program)
            .unwrap_err()
    }

    fn expression(source: &str) -> Node {
        let program = parse(source);
        match &program.body()[0].kind {
            NodeKind::ExpressionStatement { expression } => (**expression).clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_identifier_and_literals() {
        assert_eq!(expression("foo").identifier_name(), Some("foo"));
        match expression("0x10").kind {
            NodeKind::Literal { value, raw, .. } => {
                assert_eq!(value, LiteralValue::Number(16.0));
                assert_eq!(raw, "0x10");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            expression("null").kind,
            NodeKind::Literal {
                value: LiteralValue::Null,
                ..
            }
        ));
    }

    #[test]
    fn test_binary_precedence() {
        match expression("a + b * c").kind {
            NodeKind::BinaryExpression { operator, right, .. } => {
                assert_eq!(operator, BinaryOp::Add);
                assert!(matches!(
                    right.kind,
                    NodeKind::BinaryExpression {
                        operator: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_left_associative() {
        match expression("a - b - c").kind {
            NodeKind::BinaryExpression { left, right, .. } => {
                assert!(matches!(left.kind, NodeKind::BinaryExpression { .. }));
                assert_eq!(right.identifier_name(), Some("c"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exponent_right_associative() {
        match expression("a ** b ** c").kind {
            NodeKind::BinaryExpression { left, right, operator } => {
                assert_eq!(operator, BinaryOp::Pow);
                assert_eq!(left.identifier_name(), Some("a"));
                assert!(matches!(right.kind, NodeKind::BinaryExpression { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_logical_expression_kind() {
        assert!(matches!(
            expression("a ?? b").kind,
            NodeKind::LogicalExpression {
                operator: BinaryOp::NullishCoalesce,
                ..
            }
        ));
        assert!(matches!(expression("a | b").kind, NodeKind::BinaryExpression { .. }));
    }

    #[test]
    fn test_nullish_mixing_rejected() {
        let err = parse_err("a ?? b || c");
        assert_eq!(err.description, "Unexpected token ||");
        let err = parse_err("a && b ?? c");
        assert_eq!(err.description, "Unexpected token ??");
        // Parentheses reset the latch.
        parse("(a && b) ?? c");
    }

    #[test]
    fn test_optional_chain_wrapped() {
        match expression("a?.b.c").kind {
            NodeKind::ChainExpression { expression } => match expression.kind {
                NodeKind::MemberExpression { optional, object, .. } => {
                    assert!(!optional);
                    assert!(matches!(object.kind, NodeKind::MemberExpression { optional: true, .. }));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged_template_on_optional_chain() {
        let err = parse_err("a?.b`x`");
        assert_eq!(err.description, messages::INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN);
    }

    #[test]
    fn test_arrow_functions() {
        match expression("(a, b) => a").kind {
            NodeKind::ArrowFunctionExpression { params, expression, .. } => {
                assert_eq!(params.len(), 2);
                assert!(expression);
            }
            other => panic!("unexpected {other:?}"),
        }
        match expression("async x => { }").kind {
            NodeKind::ArrowFunctionExpression {
                is_async, expression, ..
            } => {
                assert!(is_async);
                assert!(!expression);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_destructuring_assignment() {
        match expression("[a, ...b] = c").kind {
            NodeKind::AssignmentExpression { left, .. } => match left.kind {
                NodeKind::ArrayPattern { elements } => {
                    assert!(matches!(
                        elements[1].as_ref().map(|e| &e.kind),
                        Some(NodeKind::RestElement { .. })
                    ));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shorthand_initializer_outside_pattern() {
        let err = parse_err("({ a = 1 })");
        assert_eq!(err.description, "Unexpected token =");
        parse("({ a = 1 } = {})");
    }

    #[test]
    fn test_sequence_expression() {
        match expression("a, b, c").kind {
            NodeKind::SequenceExpression { expressions } => assert_eq!(expressions.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_regex_literal() {
        match expression("/ab+c/gi").kind {
            NodeKind::Literal { regex: Some(regex), raw, .. } => {
                assert_eq!(regex.pattern, "ab+c");
                assert_eq!(regex.flags, "gi");
                assert_eq!(raw, "/ab+c/gi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_template_literal() {
        match expression("`a${b}c`").kind {
            NodeKind::TemplateLiteral { quasis, expressions } => {
                assert_eq!(quasis.len(), 2);
                assert_eq!(expressions.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_template_escape() {
        let err = parse_err("`\\u{g}`");
        assert_eq!(err.description, messages::INVALID_UNICODE_ESCAPE_SEQUENCE);
        // Tagged templates allow it; the cooked value is null.
        match expression("tag`\\u{g}`").kind {
            NodeKind::TaggedTemplateExpression { quasi, .. } => match quasi.kind {
                NodeKind::TemplateLiteral { quasis, .. } => {
                    assert!(matches!(
                        &quasis[0].kind,
                        NodeKind::TemplateElement {
                            value: TemplateValue { cooked: None, .. },
                            ..
                        }
                    ));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("1 = 2");
        assert_eq!(err.description, messages::INVALID_LHS_IN_ASSIGNMENT);
    }

    #[test]
    fn test_unexpected_eos() {
        let err = parse_err("a +");
        assert_eq!(err.description, messages::UNEXPECTED_EOS);
    }

    #[test]
    fn test_new_and_call() {
        match expression("new Foo(1)(2)").kind {
            NodeKind::CallExpression { callee, arguments, .. } => {
                assert_eq!(arguments.len(), 1);
                assert!(matches!(callee.kind, NodeKind::NewExpression { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_node_ids_are_unique() {
        let program = parse("a + b");
        let mut ids = Vec::new();
        fn walk(node: &Node, ids: &mut Vec<u32>) {
            ids.push(node.id.0);
            node.for_each_child(&mut |child| walk(child, ids));
        }
        walk(&program.root, &mut ids);
        let unique: FxHashSet<u32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_delegate_sees_nodes_bottom_up() {
        #[derive(Default)]
        struct Recorder(Vec<String>);
        impl Delegate for Recorder {
            fn visit_node(&mut self, node: &Node, _metadata: &Metadata) {
                let json = serde_json::to_value(node).unwrap();
                self.0.push(json["type"].as_str().unwrap_or("").to_string());
            }
        }

        let mut recorder = Recorder::default();
        Parser::new("a(b)", &ParseOptions::default(), Some(&mut recorder))
            .and_then(Parser::parse_program)
            .unwrap();
        assert_eq!(
            recorder.0,
            vec!["Identifier", "Identifier", "CallExpression", "ExpressionStatement", "Program"]
        );
    }
}
