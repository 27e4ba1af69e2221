//! Token types.
//!
//! The scanner produces [`RawToken`]s. Token capture converts them into
//! [`TokenEntry`] values, the shape that ends up in `Program.tokens`.

use serde::{Serialize, Serializer};

use crate::span::SourceLocation;

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    BooleanLiteral,
    Eof,
    Identifier,
    Keyword,
    NullLiteral,
    NumericLiteral,
    Punctuator,
    StringLiteral,
    RegularExpression,
    Template,
    JsxIdentifier,
    JsxText,
}

impl TokenKind {
    /// Name used in token output.
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::BooleanLiteral => "Boolean",
            TokenKind::Eof => "<end>",
            TokenKind::Identifier => "Identifier",
            TokenKind::Keyword => "Keyword",
            TokenKind::NullLiteral => "Null",
            TokenKind::NumericLiteral => "Numeric",
            TokenKind::Punctuator => "Punctuator",
            TokenKind::StringLiteral => "String",
            TokenKind::RegularExpression => "RegularExpression",
            TokenKind::Template => "Template",
            TokenKind::JsxIdentifier => "JSXIdentifier",
            TokenKind::JsxText => "JSXText",
        }
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Pattern and flags of a regular expression literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexParts {
    pub pattern: String,
    pub flags: String,
}

/// A token as produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub kind: TokenKind,
    /// Identifier name, punctuator, keyword, cooked string, or raw template text.
    pub value: String,
    /// Numeric value of a `NumericLiteral`.
    pub number: f64,
    /// Legacy octal literal or octal escape.
    pub octal: bool,
    /// Template cooked value; `None` when the chunk has an invalid escape.
    pub cooked: Option<String>,
    /// First character of the first invalid escape in a template chunk.
    pub not_escape_sequence_head: Option<char>,
    pub head: bool,
    pub tail: bool,
    pub regex: Option<RegexParts>,
    pub line_number: u32,
    pub line_start: usize,
    pub start: usize,
    pub end: usize,
}

impl RawToken {
    pub(crate) fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            number: 0.0,
            octal: false,
            cooked: None,
            not_escape_sequence_head: None,
            head: false,
            tail: false,
            regex: None,
            line_number: 1,
            line_start: 0,
            start: 0,
            end: 0,
        }
    }

    /// Set the position fields.
    #[must_use]
    pub(crate) fn at(mut self, line_number: u32, line_start: usize, start: usize, end: usize) -> Self {
        self.line_number = line_number;
        self.line_start = line_start;
        self.start = start;
        self.end = end;
        self
    }

    #[inline]
    pub fn is_punctuator(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.value == value
    }

    #[inline]
    pub fn is_keyword(&self, value: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == value
    }

    #[inline]
    pub fn is_identifier(&self, value: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == value
    }
}

/// A token in `Program.tokens` or the tokenizer output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenEntry {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexParts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

/// A comment in the tokenizer output (`LineComment` / `BlockComment`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

// =============================================================================
// Word classes
// =============================================================================

/// ECMAScript keywords (not counting `true`, `false`, `null`).
pub fn is_keyword(id: &str) -> bool {
    matches!(
        id,
        "if" | "in"
            | "do"
            | "var"
            | "for"
            | "new"
            | "try"
            | "let"
            | "this"
            | "else"
            | "case"
            | "void"
            | "with"
            | "enum"
            | "while"
            | "break"
            | "catch"
            | "throw"
            | "const"
            | "yield"
            | "class"
            | "super"
            | "return"
            | "typeof"
            | "delete"
            | "switch"
            | "export"
            | "import"
            | "default"
            | "finally"
            | "extends"
            | "function"
            | "continue"
            | "debugger"
            | "instanceof"
    )
}

/// Words reserved for future use in every mode.
pub fn is_future_reserved_word(id: &str) -> bool {
    matches!(id, "enum" | "export" | "import" | "super")
}

/// Words reserved in strict mode code.
pub fn is_strict_mode_reserved_word(id: &str) -> bool {
    matches!(
        id,
        "implements"
            | "interface"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
            | "let"
    )
}

/// `eval` and `arguments`.
pub fn is_restricted_word(id: &str) -> bool {
    id == "eval" || id == "arguments"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_names() {
        assert_eq!(TokenKind::Eof.name(), "<end>");
        assert_eq!(TokenKind::NumericLiteral.name(), "Numeric");
        assert_eq!(TokenKind::JsxText.name(), "JSXText");
    }

    #[test]
    fn test_word_classes() {
        assert!(is_keyword("instanceof"));
        assert!(!is_keyword("async"));
        assert!(is_future_reserved_word("enum"));
        assert!(is_strict_mode_reserved_word("let"));
        assert!(!is_strict_mode_reserved_word("await"));
        assert!(is_restricted_word("arguments"));
    }

    #[test]
    fn test_token_entry_json() {
        let entry = TokenEntry {
            kind: TokenKind::Punctuator,
            value: "(".into(),
            regex: None,
            range: Some([0, 1]),
            loc: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "Punctuator");
        assert_eq!(json["range"][1], 1);
        assert!(json.get("loc").is_none());
    }
}
