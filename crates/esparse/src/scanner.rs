//! Scanner: source text to raw tokens.
//!
//! The scanner is driven by the parser one token at a time, so the parser
//! decides when a `/` starts a regular expression and when JSX lexing applies.
//! All positions are byte offsets; columns are byte distances from the start
//! of the line.

use unicode_xid::UnicodeXID;

use crate::error::{messages, ErrorHandler, ParseError};
use crate::span::Position;
use crate::token::{is_keyword, RawToken, RegexParts, TokenKind};

type Result<T> = std::result::Result<T, ParseError>;

/// What opened a `}`-terminated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Curly {
    Brace,
    TemplateSubstitution,
}

/// A saved scanner cursor.
///
/// Restoring is exact for probes that lex a bounded number of tokens, which
/// is all the parser ever does (at most one net `}` pop per probe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerState {
    pub index: usize,
    pub line_number: u32,
    pub line_start: usize,
    curly_depth: usize,
    curly_top: Option<Curly>,
}

/// A comment found while skipping trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedComment {
    pub multi_line: bool,
    /// Byte range of the comment text without delimiters.
    pub slice: (usize, usize),
    /// Byte range of the whole comment.
    pub range: (usize, usize),
    pub start: Position,
    pub end: Position,
}

/// The scanner state.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pub(crate) errors: ErrorHandler,
    pub(crate) track_comment: bool,
    pub(crate) is_module: bool,
    pub(crate) index: usize,
    pub(crate) line_number: u32,
    pub(crate) line_start: usize,
    curly_stack: Vec<Curly>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source code.
    pub fn new(source: &'a str, errors: ErrorHandler) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            errors,
            track_comment: false,
            is_module: false,
            index: 0,
            line_number: if source.is_empty() { 0 } else { 1 },
            line_start: 0,
            curly_stack: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn save_state(&self) -> ScannerState {
        ScannerState {
            index: self.index,
            line_number: self.line_number,
            line_start: self.line_start,
            curly_depth: self.curly_stack.len(),
            curly_top: self.curly_stack.last().copied(),
        }
    }

    pub fn restore_state(&mut self, state: ScannerState) {
        self.index = state.index;
        self.line_number = state.line_number;
        self.line_start = state.line_start;
        self.curly_stack.truncate(state.curly_depth);
        if self.curly_stack.len() < state.curly_depth {
            if let Some(top) = state.curly_top {
                self.curly_stack.push(top);
            }
        }
    }

    /// Run `f` and rewind the cursor afterwards, whatever `f` returned.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let state = self.save_state();
        let result = f(self);
        self.restore_state(state);
        result
    }

    /// Open a brace region from outside the punctuator scanner.
    pub(crate) fn push_brace(&mut self) {
        self.curly_stack.push(Curly::Brace);
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.index >= self.bytes.len()
    }

    // === Helper methods ===

    #[inline]
    fn byte_at(&self, i: usize) -> u8 {
        self.bytes.get(i).copied().unwrap_or(0)
    }

    #[inline]
    fn char_at(&self, i: usize) -> Option<char> {
        self.source.get(i..).and_then(|s| s.chars().next())
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.char_at(self.index)
    }

    /// Advance past the current character and return it.
    #[inline]
    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.index += ch.len_utf8();
        Some(ch)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or("")
    }

    fn token(&self, kind: TokenKind, value: impl Into<String>, start: usize) -> RawToken {
        RawToken::new(kind, value).at(self.line_number, self.line_start, start, self.index)
    }

    fn column(&self) -> u32 {
        (self.index - self.line_start) as u32 + 1
    }

    pub(crate) fn unexpected(&self, message: &str) -> ParseError {
        ParseError::new(self.index, self.line_number, self.column(), message)
    }

    fn throw_unexpected_token<T>(&self) -> Result<T> {
        Err(self.unexpected(messages::UNEXPECTED_TOKEN_ILLEGAL))
    }

    fn tolerate_unexpected_token(&mut self, message: &str) -> Result<()> {
        let err = self.unexpected(message);
        self.errors.tolerate(err)
    }

    fn new_line(&mut self, ch: char) {
        if ch == '\r' && self.byte_at(self.index) == b'\n' {
            self.index += 1;
        }
        self.line_number += 1;
        self.line_start = self.index;
    }

    // =========================================================================
    // Comments
    // =========================================================================

    fn skip_single_line_comment(&mut self, offset: usize) -> Vec<ScannedComment> {
        let mut comments = Vec::new();
        let start = self.index - offset;
        let loc_start = Position::new(self.line_number, (start - self.line_start) as u32);

        while let Some(ch) = self.current() {
            let before = self.index;
            self.index += ch.len_utf8();
            if is_line_terminator(ch) {
                if self.track_comment {
                    comments.push(ScannedComment {
                        multi_line: false,
                        slice: (start + offset, before),
                        range: (start, before),
                        start: loc_start,
                        end: Position::new(self.line_number, (before - self.line_start) as u32),
                    });
                }
                self.new_line(ch);
                return comments;
            }
        }

        if self.track_comment {
            comments.push(ScannedComment {
                multi_line: false,
                slice: (start + offset, self.index),
                range: (start, self.index),
                start: loc_start,
                end: Position::new(self.line_number, (self.index - self.line_start) as u32),
            });
        }
        comments
    }

    fn skip_multi_line_comment(&mut self) -> Result<Vec<ScannedComment>> {
        let mut comments = Vec::new();
        let start = self.index - 2;
        let loc_start = Position::new(self.line_number, (start - self.line_start) as u32);

        while let Some(ch) = self.current() {
            if is_line_terminator(ch) {
                self.index += ch.len_utf8();
                self.new_line(ch);
            } else if ch == '*' {
                if self.byte_at(self.index + 1) == b'/' {
                    self.index += 2;
                    if self.track_comment {
                        comments.push(ScannedComment {
                            multi_line: true,
                            slice: (start + 2, self.index - 2),
                            range: (start, self.index),
                            start: loc_start,
                            end: Position::new(self.line_number, (self.index - self.line_start) as u32),
                        });
                    }
                    return Ok(comments);
                }
                self.index += 1;
            } else {
                self.index += ch.len_utf8();
            }
        }

        // Ran off the end of the file: the whole thing is a comment.
        if self.track_comment {
            comments.push(ScannedComment {
                multi_line: true,
                slice: (start + 2, self.index),
                range: (start, self.index),
                start: loc_start,
                end: Position::new(self.line_number, (self.index - self.line_start) as u32),
            });
        }
        self.tolerate_unexpected_token(messages::UNEXPECTED_TOKEN_ILLEGAL)?;
        Ok(comments)
    }

    /// Skip whitespace and comments, returning the comments when tracked.
    pub fn scan_comments(&mut self) -> Result<Vec<ScannedComment>> {
        let mut comments = Vec::new();
        let mut at_line_start = self.index == 0;

        while let Some(ch) = self.current() {
            if is_white_space(ch) {
                self.index += ch.len_utf8();
            } else if is_line_terminator(ch) {
                self.index += ch.len_utf8();
                self.new_line(ch);
                at_line_start = true;
            } else if ch == '/' {
                match self.byte_at(self.index + 1) {
                    b'/' => {
                        self.index += 2;
                        comments.extend(self.skip_single_line_comment(2));
                        at_line_start = true;
                    }
                    b'*' => {
                        self.index += 2;
                        comments.extend(self.skip_multi_line_comment()?);
                    }
                    _ => break,
                }
            } else if at_line_start && ch == '-' && !self.is_module {
                // `-->` at the start of a line is a single-line comment
                if self.byte_at(self.index + 1) == b'-' && self.byte_at(self.index + 2) == b'>' {
                    self.index += 3;
                    comments.extend(self.skip_single_line_comment(3));
                } else {
                    break;
                }
            } else if ch == '<' && !self.is_module {
                if self.bytes.get(self.index + 1..self.index + 4) == Some(b"!--") {
                    self.index += 4;
                    comments.extend(self.skip_single_line_comment(4));
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(comments)
    }

    // =========================================================================
    // Escapes
    // =========================================================================

    /// Read a `\x` (2 digits) or `\u` (4 digits) escape body as a code unit.
    fn scan_hex_escape(&mut self, prefix: char) -> Option<u32> {
        let len = if prefix == 'u' { 4 } else { 2 };
        let mut code = 0u32;
        for _ in 0..len {
            let digit = (self.byte_at(self.index) as char).to_digit(16)?;
            code = code * 16 + digit;
            self.index += 1;
        }
        Some(code)
    }

    /// `\u` escape body as a character, joining surrogate pairs.
    fn scan_unicode_escape_char(&mut self) -> Option<char> {
        let code = self.scan_hex_escape('u')?;
        if (0xD800..0xDC00).contains(&code)
            && self.byte_at(self.index) == b'\\'
            && self.byte_at(self.index + 1) == b'u'
        {
            let restore = self.index;
            self.index += 2;
            match self.scan_hex_escape('u') {
                Some(low) if (0xDC00..0xE000).contains(&low) => {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined);
                }
                _ => self.index = restore,
            }
        }
        Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Body of `\u{...}` after the brace; `None` when malformed.
    fn try_scan_unicode_code_point_escape(&mut self) -> Option<char> {
        let mut code = 0u32;
        let mut digits = 0;
        while let Some(digit) = (self.byte_at(self.index) as char).to_digit(16) {
            code = code.checked_mul(16)?.checked_add(digit)?;
            self.index += 1;
            digits += 1;
        }
        if digits == 0 || code > 0x10FFFF || self.byte_at(self.index) != b'}' {
            return None;
        }
        self.index += 1;
        Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn scan_unicode_code_point_escape(&mut self) -> Result<char> {
        match self.try_scan_unicode_code_point_escape() {
            Some(ch) => Ok(ch),
            None => self.throw_unexpected_token(),
        }
    }

    /// Escape inside an identifier, positioned just after the backslash.
    fn scan_identifier_escape(&mut self, accept: fn(char) -> bool) -> Result<char> {
        if self.byte_at(self.index) != b'u' {
            return self.throw_unexpected_token();
        }
        self.index += 1;
        let ch = if self.byte_at(self.index) == b'{' {
            self.index += 1;
            self.scan_unicode_code_point_escape()?
        } else {
            match self.scan_unicode_escape_char() {
                Some(ch) if ch != '\\' && accept(ch) => ch,
                _ => return self.throw_unexpected_token(),
            }
        };
        Ok(ch)
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    fn get_identifier(&mut self) -> Result<String> {
        let start = self.index;
        while let Some(ch) = self.current() {
            if ch == '\\' {
                // Slow path for escapes
                self.index = start;
                return self.get_complex_identifier();
            }
            if !is_identifier_part(ch) {
                break;
            }
            self.index += ch.len_utf8();
        }
        Ok(self.slice(start, self.index).to_string())
    }

    fn get_complex_identifier(&mut self) -> Result<String> {
        let mut id = String::new();
        match self.bump() {
            Some('\\') => id.push(self.scan_identifier_escape(is_identifier_start)?),
            Some(ch) => id.push(ch),
            None => return self.throw_unexpected_token(),
        }

        while let Some(ch) = self.current() {
            if ch == '\\' {
                self.index += 1;
                id.push(self.scan_identifier_escape(is_identifier_part)?);
            } else if is_identifier_part(ch) {
                self.index += ch.len_utf8();
                id.push(ch);
            } else {
                break;
            }
        }
        Ok(id)
    }

    fn scan_identifier(&mut self) -> Result<RawToken> {
        let start = self.index;
        let id = if self.byte_at(start) == b'\\' {
            self.get_complex_identifier()?
        } else {
            self.get_identifier()?
        };

        let kind = if id.chars().count() == 1 {
            TokenKind::Identifier
        } else if is_keyword(&id) {
            TokenKind::Keyword
        } else if id == "null" {
            TokenKind::NullLiteral
        } else if id == "true" || id == "false" {
            TokenKind::BooleanLiteral
        } else {
            TokenKind::Identifier
        };

        if kind != TokenKind::Identifier && start + id.len() != self.index {
            let restore = self.index;
            self.index = start;
            self.tolerate_unexpected_token(messages::INVALID_ESCAPED_RESERVED_WORD)?;
            self.index = restore;
        }

        Ok(self.token(kind, id, start))
    }

    // =========================================================================
    // Punctuators
    // =========================================================================

    fn scan_punctuator(&mut self) -> Result<RawToken> {
        let start = self.index;
        let b = self.byte_at(start);
        let value: &'static str = match b {
            b'(' => "(",
            b'{' => {
                self.curly_stack.push(Curly::Brace);
                "{"
            }
            b'}' => {
                self.curly_stack.pop();
                "}"
            }
            b')' => ")",
            b';' => ";",
            b',' => ",",
            b'[' => "[",
            b']' => "]",
            b':' => ":",
            b'~' => "~",
            b'.' => {
                if self.byte_at(start + 1) == b'.' && self.byte_at(start + 2) == b'.' {
                    "..."
                } else {
                    "."
                }
            }
            b'?' => {
                if self.byte_at(start + 1) == b'?' {
                    if self.byte_at(start + 2) == b'=' {
                        "??="
                    } else {
                        "??"
                    }
                } else if self.byte_at(start + 1) == b'.' && !self.byte_at(start + 2).is_ascii_digit() {
                    "?."
                } else {
                    "?"
                }
            }
            _ => self.scan_operator(start),
        };

        if value.is_empty() {
            return self.throw_unexpected_token();
        }
        self.index = start + value.len();
        Ok(self.token(TokenKind::Punctuator, value, start))
    }

    /// Longest operator match starting at `start`; empty when none.
    fn scan_operator(&self, start: usize) -> &'static str {
        const FOUR: &[&str] = &[">>>="];
        const THREE: &[&str] = &["===", "!==", ">>>", "<<=", ">>=", "**=", "&&=", "||="];
        const TWO: &[&str] = &[
            "&&", "||", "==", "!=", "+=", "-=", "*=", "/=", "++", "--", "<<", ">>", "&=", "|=", "^=", "%=", "<=",
            ">=", "=>", "**",
        ];
        const ONE: &[&str] = &["<", ">", "=", "!", "+", "-", "*", "%", "&", "|", "^", "/"];

        let rest = self.bytes.get(start..).unwrap_or(&[]);
        for table in [FOUR, THREE, TWO, ONE] {
            if let Some(op) = table.iter().copied().find(|op| rest.starts_with(op.as_bytes())) {
                return op;
            }
        }
        ""
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    fn numeric(&self, value: f64, octal: bool, start: usize) -> RawToken {
        let mut token = self.token(TokenKind::NumericLiteral, self.slice(start, self.index), start);
        token.number = value;
        token.octal = octal;
        token
    }

    fn scan_radix_digits(&mut self, radix: u32) -> (f64, usize) {
        let mut value = 0.0;
        let mut count = 0;
        while let Some(d) = (self.byte_at(self.index) as char).to_digit(radix) {
            value = value * f64::from(radix) + f64::from(d);
            self.index += 1;
            count += 1;
        }
        (value, count)
    }

    fn check_after_number(&self) -> Result<()> {
        match self.current() {
            Some(ch) if is_identifier_start(ch) || ch == '\\' => self.throw_unexpected_token(),
            _ => Ok(()),
        }
    }

    fn scan_hex_literal(&mut self, start: usize) -> Result<RawToken> {
        let (value, count) = self.scan_radix_digits(16);
        if count == 0 {
            return self.throw_unexpected_token();
        }
        self.check_after_number()?;
        Ok(self.numeric(value, false, start))
    }

    fn scan_binary_literal(&mut self, start: usize) -> Result<RawToken> {
        let (value, count) = self.scan_radix_digits(2);
        if count == 0 || self.byte_at(self.index).is_ascii_digit() {
            return self.throw_unexpected_token();
        }
        self.check_after_number()?;
        Ok(self.numeric(value, false, start))
    }

    /// `0o17` (explicit) or `017` (legacy, flagged octal).
    fn scan_octal_literal(&mut self, explicit: bool, start: usize) -> Result<RawToken> {
        let (value, count) = self.scan_radix_digits(8);
        if explicit && count == 0 {
            return self.throw_unexpected_token();
        }
        if self.byte_at(self.index).is_ascii_digit() {
            return self.throw_unexpected_token();
        }
        self.check_after_number()?;
        Ok(self.numeric(value, !explicit, start))
    }

    /// A leading zero followed only by octal digits.
    fn is_implicit_octal_literal(&self) -> bool {
        for &b in self.bytes.get(self.index + 1..).unwrap_or(&[]) {
            if b == b'8' || b == b'9' {
                return false;
            }
            if !is_octal_digit(b) {
                return true;
            }
        }
        true
    }

    fn scan_numeric_literal(&mut self) -> Result<RawToken> {
        let start = self.index;
        let mut b = self.byte_at(start);

        if b != b'.' {
            self.index += 1;
            let next = self.byte_at(self.index);
            if b == b'0' {
                match next {
                    b'x' | b'X' => {
                        self.index += 1;
                        return self.scan_hex_literal(start);
                    }
                    b'b' | b'B' => {
                        self.index += 1;
                        return self.scan_binary_literal(start);
                    }
                    b'o' | b'O' => {
                        self.index += 1;
                        return self.scan_octal_literal(true, start);
                    }
                    _ if is_octal_digit(next) && self.is_implicit_octal_literal() => {
                        return self.scan_octal_literal(false, start);
                    }
                    _ => {}
                }
            }
            while self.byte_at(self.index).is_ascii_digit() {
                self.index += 1;
            }
            b = self.byte_at(self.index);
        }

        if b == b'.' {
            self.index += 1;
            while self.byte_at(self.index).is_ascii_digit() {
                self.index += 1;
            }
            b = self.byte_at(self.index);
        }

        if b == b'e' || b == b'E' {
            self.index += 1;
            if matches!(self.byte_at(self.index), b'+' | b'-') {
                self.index += 1;
            }
            if !self.byte_at(self.index).is_ascii_digit() {
                return self.throw_unexpected_token();
            }
            while self.byte_at(self.index).is_ascii_digit() {
                self.index += 1;
            }
        }

        self.check_after_number()?;
        let text = self.slice(start, self.index);
        let value = match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => return self.throw_unexpected_token(),
        };
        // A decimal with a leading zero such as `08` is legacy syntax too.
        let legacy = text.len() > 1 && text.starts_with('0') && text.as_bytes()[1].is_ascii_digit();
        Ok(self.numeric(value, legacy, start))
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Legacy octal escape, positioned after its first digit.
    fn octal_to_decimal(&mut self, first: u8) -> (u32, bool) {
        let mut octal = first != b'0';
        let mut code = u32::from(first - b'0');
        if is_octal_digit(self.byte_at(self.index)) {
            octal = true;
            code = code * 8 + u32::from(self.byte_at(self.index) - b'0');
            self.index += 1;
            if matches!(first, b'0'..=b'3') && is_octal_digit(self.byte_at(self.index)) {
                code = code * 8 + u32::from(self.byte_at(self.index) - b'0');
                self.index += 1;
            }
        }
        (code, octal)
    }

    fn scan_string_literal(&mut self) -> Result<RawToken> {
        let start = self.index;
        let quote = self.byte_at(start) as char;
        self.index += 1;
        let mut octal = false;
        let mut value = String::new();
        let mut terminated = false;

        while let Some(ch) = self.bump() {
            if ch == quote {
                terminated = true;
                break;
            } else if ch == '\\' {
                let Some(esc) = self.bump() else { break };
                if is_line_terminator(esc) {
                    self.new_line(esc);
                    continue;
                }
                match esc {
                    'u' => {
                        if self.byte_at(self.index) == b'{' {
                            self.index += 1;
                            value.push(self.scan_unicode_code_point_escape()?);
                        } else {
                            match self.scan_unicode_escape_char() {
                                Some(c) => value.push(c),
                                None => return self.throw_unexpected_token(),
                            }
                        }
                    }
                    'x' => match self.scan_hex_escape('x').and_then(char::from_u32) {
                        Some(c) => value.push(c),
                        None => return Err(self.unexpected(messages::INVALID_HEX_ESCAPE_SEQUENCE)),
                    },
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'v' => value.push('\u{b}'),
                    '8' | '9' => {
                        value.push(esc);
                        octal = true;
                    }
                    '0'..='7' => {
                        let (code, is_octal) = self.octal_to_decimal(esc as u8);
                        octal |= is_octal;
                        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    other => value.push(other),
                }
            } else if is_line_terminator(ch) {
                break;
            } else {
                value.push(ch);
            }
        }

        if !terminated {
            self.index = start;
            return self.throw_unexpected_token();
        }

        let mut token = self.token(TokenKind::StringLiteral, value, start);
        token.octal = octal;
        Ok(token)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    fn scan_template(&mut self) -> Result<RawToken> {
        let start = self.index;
        let head = self.byte_at(start) == b'`';
        let mut cooked = String::new();
        let mut terminated = false;
        let mut tail = false;
        let mut invalid_escape: Option<char> = None;
        let mut raw_offset = 2;

        self.index += 1;
        while let Some(ch) = self.bump() {
            if ch == '`' {
                raw_offset = 1;
                tail = true;
                terminated = true;
                break;
            } else if ch == '$' {
                if self.byte_at(self.index) == b'{' {
                    self.curly_stack.push(Curly::TemplateSubstitution);
                    self.index += 1;
                    terminated = true;
                    break;
                }
                cooked.push(ch);
            } else if ch == '\\' {
                let Some(esc) = self.bump() else { break };
                if is_line_terminator(esc) {
                    self.new_line(esc);
                    continue;
                }
                if invalid_escape.is_some() {
                    continue;
                }
                match esc {
                    'n' => cooked.push('\n'),
                    'r' => cooked.push('\r'),
                    't' => cooked.push('\t'),
                    'b' => cooked.push('\u{8}'),
                    'f' => cooked.push('\u{c}'),
                    'v' => cooked.push('\u{b}'),
                    'u' => {
                        let escaped = if self.byte_at(self.index) == b'{' {
                            self.index += 1;
                            self.try_scan_unicode_code_point_escape()
                        } else {
                            self.scan_unicode_escape_char()
                        };
                        match escaped {
                            Some(c) => cooked.push(c),
                            None => invalid_escape = Some('u'),
                        }
                    }
                    'x' => match self.scan_hex_escape('x').and_then(char::from_u32) {
                        Some(c) => cooked.push(c),
                        None => invalid_escape = Some('x'),
                    },
                    '0' => {
                        if self.byte_at(self.index).is_ascii_digit() {
                            invalid_escape = Some('0');
                        } else {
                            cooked.push('\0');
                        }
                    }
                    '1'..='9' => invalid_escape = Some(esc),
                    other => cooked.push(other),
                }
            } else if is_line_terminator(ch) {
                self.new_line(ch);
                cooked.push('\n');
            } else {
                cooked.push(ch);
            }
        }

        if !terminated {
            return self.throw_unexpected_token();
        }
        if !head {
            self.curly_stack.pop();
        }

        let raw = self.slice(start + 1, self.index - raw_offset);
        let mut token = self.token(TokenKind::Template, raw, start);
        token.cooked = if invalid_escape.is_none() { Some(cooked) } else { None };
        token.not_escape_sequence_head = invalid_escape;
        token.head = head;
        token.tail = tail;
        Ok(token)
    }

    // =========================================================================
    // Regular expressions
    // =========================================================================

    fn scan_regexp_body(&mut self) -> Result<String> {
        let start = self.index;
        self.index += 1;
        let mut class_marker = false;

        loop {
            let Some(ch) = self.bump() else {
                return Err(self.unexpected(messages::UNTERMINATED_REG_EXP));
            };
            if ch == '\\' {
                match self.bump() {
                    Some(next) if !is_line_terminator(next) => {}
                    _ => return Err(self.unexpected(messages::UNTERMINATED_REG_EXP)),
                }
            } else if is_line_terminator(ch) {
                return Err(self.unexpected(messages::UNTERMINATED_REG_EXP));
            } else if class_marker {
                if ch == ']' {
                    class_marker = false;
                }
            } else if ch == '/' {
                break;
            } else if ch == '[' {
                class_marker = true;
            }
        }

        Ok(self.slice(start + 1, self.index - 1).to_string())
    }

    fn scan_regexp_flags(&mut self) -> Result<String> {
        let mut flags = String::new();
        while let Some(ch) = self.current() {
            if ch == '\\' {
                self.index += 1;
                if self.byte_at(self.index) == b'u' {
                    self.index += 1;
                    let restore = self.index;
                    match self.scan_unicode_escape_char() {
                        Some(c) => flags.push(c),
                        None => {
                            self.index = restore;
                            flags.push('u');
                        }
                    }
                }
                self.tolerate_unexpected_token(messages::UNEXPECTED_TOKEN_ILLEGAL)?;
                continue;
            }
            if !is_identifier_part(ch) {
                break;
            }
            self.index += ch.len_utf8();
            flags.push(ch);
        }
        Ok(flags)
    }

    /// Scan a regular expression literal starting at the current `/`.
    pub fn scan_regexp(&mut self) -> Result<RawToken> {
        let start = self.index;
        let pattern = self.scan_regexp_body()?;
        let flags = self.scan_regexp_flags()?;
        let mut token = self.token(TokenKind::RegularExpression, "", start);
        token.regex = Some(RegexParts { pattern, flags });
        Ok(token)
    }

    // =========================================================================
    // Entry point
    // =========================================================================

    /// Scan the next token. Trivia must already be skipped.
    pub fn lex(&mut self) -> Result<RawToken> {
        let Some(ch) = self.current() else {
            return Ok(self.token(TokenKind::Eof, "", self.index));
        };

        if is_identifier_start(ch) || ch == '\\' {
            return self.scan_identifier();
        }
        match ch {
            '(' | ')' | ';' => self.scan_punctuator(),
            '\'' | '"' => self.scan_string_literal(),
            '.' => {
                if self.byte_at(self.index + 1).is_ascii_digit() {
                    self.scan_numeric_literal()
                } else {
                    self.scan_punctuator()
                }
            }
            '0'..='9' => self.scan_numeric_literal(),
            '`' => self.scan_template(),
            '}' if self.curly_stack.last() == Some(&Curly::TemplateSubstitution) => self.scan_template(),
            _ => self.scan_punctuator(),
        }
    }
}

// =============================================================================
// Character classes
// =============================================================================

pub(crate) fn is_white_space(ch: char) -> bool {
    matches!(
        ch,
        '\u{20}' | '\u{09}' | '\u{0B}' | '\u{0C}' | '\u{A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}'
            | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

pub(crate) fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub(crate) fn is_identifier_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_ascii_alphabetic() || (!ch.is_ascii() && UnicodeXID::is_xid_start(ch))
}

pub(crate) fn is_identifier_part(ch: char) -> bool {
    ch == '$'
        || ch == '_'
        || ch.is_ascii_alphanumeric()
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || (!ch.is_ascii() && UnicodeXID::is_xid_continue(ch))
}

#[inline]
fn is_octal_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(source: &str) -> Scanner<'_> {
        Scanner::new(source, ErrorHandler::default())
    }

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let mut s = scanner(source);
        let mut out = Vec::new();
        loop {
            s.scan_comments().unwrap();
            let token = s.lex().unwrap();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push((token.kind, token.value));
        }
        out
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let tokens = tokenize("foo if null true $x _y");
        assert_eq!(tokens[0], (TokenKind::Identifier, "foo".into()));
        assert_eq!(tokens[1], (TokenKind::Keyword, "if".into()));
        assert_eq!(tokens[2].0, TokenKind::NullLiteral);
        assert_eq!(tokens[3].0, TokenKind::BooleanLiteral);
        assert_eq!(tokens[4].1, "$x");
    }

    #[test]
    fn test_unicode_identifiers() {
        let tokens = tokenize("café \\u0061b \\u{62}c");
        assert_eq!(tokens[0].1, "café");
        assert_eq!(tokens[1].1, "ab");
        assert_eq!(tokens[2].1, "bc");
    }

    #[test]
    fn test_escaped_keyword_is_tolerated() {
        let mut s = Scanner::new("\\u0069f", ErrorHandler::new(true));
        let token = s.lex().unwrap();
        assert_eq!(token.kind, TokenKind::Keyword);
        assert_eq!(s.errors.errors.len(), 1);
    }

    #[test]
    fn test_numbers() {
        let mut s = scanner("0x1F 0b101 0o17 017 019 1.5e3 .5");
        let mut values = Vec::new();
        loop {
            s.scan_comments().unwrap();
            let t = s.lex().unwrap();
            if t.kind == TokenKind::Eof {
                break;
            }
            values.push((t.number, t.octal));
        }
        assert_eq!(
            values,
            vec![
                (31.0, false),
                (5.0, false),
                (15.0, false),
                (15.0, true),
                (19.0, true),
                (1500.0, false),
                (0.5, false)
            ]
        );
    }

    #[test]
    fn test_number_followed_by_identifier() {
        let mut s = scanner("3in");
        assert!(s.lex().is_err());
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#"'a\nb' "\x41B\u{43}" '\101'"#);
        assert_eq!(tokens[0].1, "a\nb");
        assert_eq!(tokens[1].1, "ABC");
        assert_eq!(tokens[2].1, "A");
    }

    #[test]
    fn test_octal_escape_flag() {
        let mut s = scanner(r"'\012'");
        assert!(s.lex().unwrap().octal);
        let mut s = scanner(r"'\0'");
        assert!(!s.lex().unwrap().octal);
    }

    #[test]
    fn test_unterminated_string() {
        let mut s = scanner("'abc");
        let err = s.lex().unwrap_err();
        assert_eq!(err.description, messages::UNEXPECTED_TOKEN_ILLEGAL);
        assert_eq!(err.index, 0);
    }

    #[test]
    fn test_punctuators() {
        let tokens = tokenize("a >>>= b ?. c ?? d ??= e ... **= &&= ?.5");
        let values: Vec<_> = tokens.iter().map(|t| t.1.as_str()).collect();
        assert_eq!(
            values,
            vec!["a", ">>>=", "b", "?.", "c", "??", "d", "??=", "e", "...", "**=", "&&=", "?", ".5"]
        );
    }

    #[test]
    fn test_template_parts() {
        let mut s = scanner("`a${b}c${d}e`");
        let head = s.lex().unwrap();
        assert!(head.head && !head.tail);
        assert_eq!(head.value, "a");
        assert_eq!(s.lex().unwrap().value, "b");
        let middle = s.lex().unwrap();
        assert!(!middle.head && !middle.tail);
        assert_eq!(middle.cooked.as_deref(), Some("c"));
        s.lex().unwrap();
        let tail = s.lex().unwrap();
        assert!(tail.tail);
        assert_eq!(tail.value, "e");
    }

    #[test]
    fn test_template_invalid_escape() {
        let mut s = scanner(r"`\unicode`");
        let token = s.lex().unwrap();
        assert_eq!(token.cooked, None);
        assert_eq!(token.not_escape_sequence_head, Some('u'));
        assert_eq!(token.value, r"\unicode");
    }

    #[test]
    fn test_regexp() {
        let mut s = scanner("/[/]\\//gi");
        let token = s.scan_regexp().unwrap();
        let regex = token.regex.unwrap();
        assert_eq!(regex.pattern, "[/]\\/");
        assert_eq!(regex.flags, "gi");
        assert_eq!(token.end, 9);
    }

    #[test]
    fn test_unterminated_regexp() {
        let mut s = scanner("/abc\n/");
        let err = s.scan_regexp().unwrap_err();
        assert_eq!(err.description, messages::UNTERMINATED_REG_EXP);
    }

    #[test]
    fn test_comments_tracked() {
        let mut s = scanner("// one\n/* two\n */ x");
        s.track_comment = true;
        let comments = s.scan_comments().unwrap();
        assert_eq!(comments.len(), 2);
        assert!(!comments[0].multi_line);
        assert_eq!(comments[0].slice, (2, 6));
        assert_eq!(comments[0].range, (0, 6));
        assert!(comments[1].multi_line);
        assert_eq!(comments[1].end, Position::new(3, 3));
        assert_eq!(s.line_number, 3);
    }

    #[test]
    fn test_html_comments() {
        let mut s = scanner("<!-- hidden\n--> also hidden\nx");
        s.track_comment = true;
        assert_eq!(s.scan_comments().unwrap().len(), 2);
        assert_eq!(s.lex().unwrap().value, "x");

        let mut m = scanner("<!-- x");
        m.is_module = true;
        assert!(m.scan_comments().unwrap().is_empty());
        assert_eq!(m.lex().unwrap().value, "<");
    }

    #[test]
    fn test_unterminated_comment_tolerated() {
        let mut s = Scanner::new("/* open", ErrorHandler::new(true));
        s.scan_comments().unwrap();
        assert_eq!(s.errors.errors.len(), 1);
        assert!(s.eof());
    }

    #[test]
    fn test_look_ahead_restores() {
        let mut s = scanner("a { b");
        s.lex().unwrap();
        let next = s.look_ahead(|s| {
            s.scan_comments().unwrap();
            s.lex().unwrap()
        });
        assert_eq!(next.value, "{");
        assert_eq!(s.index, 1);
        s.scan_comments().unwrap();
        assert_eq!(s.lex().unwrap().value, "{");
    }

    #[test]
    fn test_line_tracking() {
        let mut s = scanner("a\r\nb\u{2028}c");
        s.lex().unwrap();
        s.scan_comments().unwrap();
        let b = s.lex().unwrap();
        assert_eq!(b.line_number, 2);
        assert_eq!(b.line_start, 3);
        s.scan_comments().unwrap();
        let c = s.lex().unwrap();
        assert_eq!(c.line_number, 3);
    }
}
