//! Stand-alone tokenizer.
//!
//! Without a parser there is no grammar context to tell a regular expression
//! from a division, so [`Reader`] guesses from the tokens emitted so far.

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::{ErrorHandler, ParseError};
use crate::options::TokenizeOptions;
use crate::scanner::Scanner;
use crate::span::{Position, SourceLocation};
use crate::token::{CommentEntry, RawToken, TokenEntry, TokenKind};

/// One item of the token stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenItem {
    Token(TokenEntry),
    Comment(CommentEntry),
}

impl TokenItem {
    pub fn value(&self) -> &str {
        match self {
            TokenItem::Token(token) => &token.value,
            TokenItem::Comment(comment) => &comment.value,
        }
    }
}

/// Result of [`crate::tokenize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenStream {
    pub tokens: Vec<TokenItem>,
    /// Recorded scan errors, present in tolerant mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ParseError>>,
}

// =============================================================================
// Regex detection
// =============================================================================

/// Tokens after which a `function` keyword starts a function expression.
fn before_function_expression(value: &str) -> bool {
    matches!(
        value,
        "(" | "{" | "[" | "in" | "typeof" | "instanceof" | "new" | "return" | "case" | "delete" | "throw" | "void"
            | "=" | "+=" | "-=" | "*=" | "**=" | "/=" | "%=" | "<<=" | ">>=" | ">>>=" | "&=" | "|=" | "^="
            | "," | "+" | "-" | "*" | "**" | "/" | "%" | "++" | "--" | "<<" | ">>" | ">>>" | "&" | "|"
            | "^" | "!" | "~" | "&&" | "||" | "??" | "?" | ":" | "===" | "==" | ">=" | "<=" | "<" | ">"
            | "!=" | "!=="
    )
}

/// History of emitted tokens. Punctuators and keywords keep their value,
/// everything else is recorded as `None`.
#[derive(Debug, Default)]
struct Reader {
    values: Vec<Option<String>>,
    /// Index of the last `{`.
    curly: Option<usize>,
    /// Index of the last `(`.
    paren: Option<usize>,
}

impl Reader {
    /// Value `back` positions before `index`.
    fn before(&self, index: Option<usize>, back: usize) -> Option<&str> {
        index
            .and_then(|i| i.checked_sub(back))
            .and_then(|i| self.values.get(i))
            .and_then(|v| v.as_deref())
    }

    fn is_regex_start(&self) -> bool {
        let Some(previous) = self.values.last() else {
            return true;
        };
        let Some(previous) = previous.as_deref() else {
            return false;
        };

        match previous {
            "this" | "]" => false,
            ")" => matches!(self.before(self.paren, 1), Some("if" | "while" | "for" | "with")),
            "}" => {
                // Dividing a function by anything makes little sense.
                if self.before(self.curly, 3) == Some("function") {
                    // Anonymous: function(){} /42
                    self.before(self.curly, 4).is_some_and(|check| !before_function_expression(check))
                } else if self.before(self.curly, 4) == Some("function") {
                    // Named: function f(){} /42/
                    self.before(self.curly, 5).map_or(true, |check| !before_function_expression(check))
                } else {
                    true
                }
            }
            _ => true,
        }
    }

    fn push(&mut self, token: &RawToken) {
        if matches!(token.kind, TokenKind::Punctuator | TokenKind::Keyword) {
            match token.value.as_str() {
                "{" => self.curly = Some(self.values.len()),
                "(" => self.paren = Some(self.values.len()),
                _ => {}
            }
            self.values.push(Some(token.value.clone()));
        } else {
            self.values.push(None);
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

/// Iterator over the tokens (and, when requested, comments) of a source.
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    range: bool,
    loc: bool,
    buffer: VecDeque<TokenItem>,
    reader: Reader,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, options: &TokenizeOptions) -> Self {
        let mut scanner = Scanner::new(source, ErrorHandler::new(options.tolerant));
        scanner.track_comment = options.comment;
        Self {
            scanner,
            range: options.range,
            loc: options.loc,
            buffer: VecDeque::new(),
            reader: Reader::default(),
            done: false,
        }
    }

    fn cursor_position(&self) -> Position {
        Position {
            line: self.scanner.line_number,
            column: (self.scanner.index - self.scanner.line_start) as u32,
        }
    }

    /// Scan the next token, preferring a regular expression where the
    /// history allows one and falling back to ordinary lexing.
    fn scan_token(&mut self) -> Result<RawToken, ParseError> {
        let maybe_regex = self.scanner.source().as_bytes().get(self.scanner.index) == Some(&b'/')
            && self.reader.is_regex_start();
        if !maybe_regex {
            return self.scanner.lex();
        }

        let state = self.scanner.save_state();
        match self.scanner.scan_regexp() {
            Ok(token) => Ok(token),
            Err(_) => {
                self.scanner.restore_state(state);
                self.scanner.lex()
            }
        }
    }

    fn fill_buffer(&mut self) -> Result<(), ParseError> {
        let comments = self.scanner.scan_comments()?;
        if self.scanner.track_comment {
            for comment in comments {
                let value = self.scanner.source().get(comment.slice.0..comment.slice.1).unwrap_or("");
                let entry = CommentEntry {
                    kind: if comment.multi_line {
                        "BlockComment"
                    } else {
                        "LineComment"
                    },
                    value: value.to_string(),
                    range: self.range.then_some([comment.range.0 as u32, comment.range.1 as u32]),
                    loc: self.loc.then_some(SourceLocation {
                        start: comment.start,
                        end: comment.end,
                        source: None,
                    }),
                };
                self.buffer.push_back(TokenItem::Comment(entry));
            }
        }

        if self.scanner.eof() {
            self.done = true;
            return Ok(());
        }

        let start = self.cursor_position();
        let token = self.scan_token()?;
        self.reader.push(&token);
        let value = self.scanner.source().get(token.start..token.end).unwrap_or("").to_string();
        let entry = TokenEntry {
            kind: token.kind,
            value,
            regex: token.regex,
            range: self.range.then_some([token.start as u32, token.end as u32]),
            loc: self.loc.then(|| SourceLocation {
                start,
                end: self.cursor_position(),
                source: None,
            }),
        };
        self.buffer.push_back(TokenItem::Token(entry));
        Ok(())
    }

    /// Next token or comment; `Ok(None)` at the end of input.
    pub fn next_token(&mut self) -> Result<Option<TokenItem>, ParseError> {
        if self.buffer.is_empty() && !self.done {
            self.fill_buffer()?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Errors recorded in tolerant mode.
    pub fn errors(&mut self) -> Vec<ParseError> {
        self.scanner.errors.take_errors()
    }

    pub(crate) fn tolerate(&mut self, error: ParseError) -> Result<(), ParseError> {
        self.scanner.errors.tolerate(error)
    }

    pub(crate) fn is_tolerant(&self) -> bool {
        self.scanner.errors.tolerant
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<TokenItem, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(item) => item.map(Ok),
            Err(err) => {
                self.done = true;
                self.buffer.clear();
                Some(Err(err))
            }
        }
    }
}

/// Tokenize a whole source. A scan error ends the stream; in tolerant mode
/// it is recorded instead of returned.
pub(crate) fn tokenize(source: &str, options: &TokenizeOptions) -> Result<TokenStream, ParseError> {
    let mut tokenizer = Tokenizer::new(source, options);
    let mut tokens = Vec::new();

    loop {
        match tokenizer.next_token() {
            Ok(Some(item)) => tokens.push(item),
            Ok(None) => break,
            Err(err) => {
                tokenizer.tolerate(err)?;
                break;
            }
        }
    }

    let errors = tokenizer.is_tolerant().then(|| tokenizer.errors());
    tracing::debug!(
        tokens = tokens.len(),
        errors = errors.as_ref().map_or(0, Vec::len),
        "tokenized"
    );
    Ok(TokenStream { tokens, errors })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<String> {
        tokenize(source, &TokenizeOptions::default())
            .unwrap()
            .tokens
            .iter()
            .map(|t| t.value().to_string())
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, &TokenizeOptions::default())
            .unwrap()
            .tokens
            .into_iter()
            .filter_map(|t| match t {
                TokenItem::Token(t) => Some(t.kind),
                TokenItem::Comment(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_regex_after_if_paren() {
        let kinds = kinds("if (x) /y/.test(z)");
        assert_eq!(kinds[4], TokenKind::RegularExpression);
    }

    #[test]
    fn test_division_after_identifier() {
        assert_eq!(values("a / b / c"), ["a", "/", "b", "/", "c"]);
    }

    #[test]
    fn test_regex_at_start_and_after_operator() {
        assert_eq!(kinds("/a/g")[0], TokenKind::RegularExpression);
        assert_eq!(kinds("x = /=/")[2], TokenKind::RegularExpression);
    }

    #[test]
    fn test_division_after_call_paren_and_this() {
        assert_eq!(kinds("f(x) / 2")[4], TokenKind::Punctuator);
        assert_eq!(kinds("this / 2")[1], TokenKind::Punctuator);
    }

    #[test]
    fn test_after_function_body() {
        // Declaration: a regex follows.
        assert_eq!(kinds("function f() {} /42/")[6], TokenKind::RegularExpression);
        // Expression: a division follows.
        assert_eq!(kinds("x = function () {} / 42")[7], TokenKind::Punctuator);
    }

    #[test]
    fn test_regex_parts() {
        let stream = tokenize("/ab+c/gi", &TokenizeOptions::default()).unwrap();
        let TokenItem::Token(token) = &stream.tokens[0] else {
            panic!("expected a token");
        };
        let regex = token.regex.as_ref().unwrap();
        assert_eq!(regex.pattern, "ab+c");
        assert_eq!(regex.flags, "gi");
        assert_eq!(token.value, "/ab+c/gi");
    }

    #[test]
    fn test_comments_when_requested() {
        let options = TokenizeOptions::default().with_comment(true).with_range(true);
        let stream = tokenize("a // note\n/* b */", &options).unwrap();
        let json = serde_json::to_value(&stream).unwrap();
        assert_eq!(json["tokens"][1]["type"], "LineComment");
        assert_eq!(json["tokens"][1]["value"], " note");
        assert_eq!(json["tokens"][1]["range"], serde_json::json!([2, 9]));
        assert_eq!(json["tokens"][2]["type"], "BlockComment");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_loc() {
        let options = TokenizeOptions::default().with_loc(true);
        let stream = tokenize("a\n  bc", &options).unwrap();
        let TokenItem::Token(token) = &stream.tokens[1] else {
            panic!("expected a token");
        };
        let loc = token.loc.as_ref().unwrap();
        assert_eq!((loc.start.line, loc.start.column), (2, 2));
        assert_eq!((loc.end.line, loc.end.column), (2, 4));
    }

    #[test]
    fn test_error_is_fatal_unless_tolerant() {
        assert!(tokenize("a 'unterminated", &TokenizeOptions::default()).is_err());

        let stream = tokenize("a 'unterminated", &TokenizeOptions::default().with_tolerant(true)).unwrap();
        assert_eq!(stream.tokens.len(), 1);
        assert_eq!(stream.errors.unwrap().len(), 1);
    }

    #[test]
    fn test_iterator() {
        let tokenizer = Tokenizer::new("let x = 1;", &TokenizeOptions::default());
        let items: Result<Vec<_>, _> = tokenizer.collect();
        assert_eq!(items.unwrap().len(), 5);
    }
}
