//! Parse and tokenize options.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Caller-supplied precedence override, consulted once per table key.
pub type PrecedenceFn = Arc<dyn Fn(&str) -> Option<u8> + Send + Sync>;

/// Goal symbol of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
}

impl SourceType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Module => "module",
        }
    }
}

/// Options for [`crate::parse`].
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Add `range` to every node.
    pub range: bool,

    /// Add `loc` to every node.
    pub loc: bool,

    /// Copied into `loc.source` when `loc` is on.
    pub source: Option<String>,

    pub source_type: SourceType,

    /// Enable JSX syntax.
    pub jsx: bool,

    /// Record recoverable errors in `Program.errors` instead of failing.
    pub tolerant: bool,

    /// Collect tokens into `Program.tokens`.
    pub tokens: bool,

    /// Collect comments into `Program.comments`.
    pub comment: bool,

    /// Attach comments to nodes. Comments are scanned even when `comment` is off.
    pub attach_comment: bool,

    /// Override the binary operator precedence table.
    #[serde(skip)]
    pub operator_precedence: Option<PrecedenceFn>,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("range", &self.range)
            .field("loc", &self.loc)
            .field("source", &self.source)
            .field("source_type", &self.source_type)
            .field("jsx", &self.jsx)
            .field("tolerant", &self.tolerant)
            .field("tokens", &self.tokens)
            .field("comment", &self.comment)
            .field("attach_comment", &self.attach_comment)
            .field("operator_precedence", &self.operator_precedence.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    #[must_use]
    pub fn with_module(self) -> Self {
        self.with_source_type(SourceType::Module)
    }

    #[must_use]
    pub fn with_range(mut self, range: bool) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_loc(mut self, loc: bool) -> Self {
        self.loc = loc;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_jsx(mut self, jsx: bool) -> Self {
        self.jsx = jsx;
        self
    }

    #[must_use]
    pub fn with_tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: bool) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: bool) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub fn with_attach_comment(mut self, attach: bool) -> Self {
        self.attach_comment = attach;
        self
    }

    /// Install a precedence override.
    #[must_use]
    pub fn with_operator_precedence(mut self, f: impl Fn(&str) -> Option<u8> + Send + Sync + 'static) -> Self {
        self.operator_precedence = Some(Arc::new(f));
        self
    }

    pub fn is_module(&self) -> bool {
        self.source_type == SourceType::Module
    }

    /// Whether comments are collected at all.
    pub fn collects_comments(&self) -> bool {
        self.comment || self.attach_comment
    }
}

/// Options for [`crate::tokenize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenizeOptions {
    pub range: bool,
    pub loc: bool,
    /// Emit `LineComment` / `BlockComment` entries.
    pub comment: bool,
    pub tolerant: bool,
}

impl TokenizeOptions {
    #[must_use]
    pub fn with_range(mut self, range: bool) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_loc(mut self, loc: bool) -> Self {
        self.loc = loc;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: bool) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub fn with_tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.source_type, SourceType::Script);
        assert!(!options.collects_comments());
        assert!(options.operator_precedence.is_none());
    }

    #[test]
    fn test_builders() {
        let options = ParseOptions::new()
            .with_module()
            .with_attach_comment(true)
            .with_operator_precedence(|op| (op == "<<").then_some(16));
        assert!(options.is_module());
        assert!(options.collects_comments());
        let f = options.operator_precedence.as_ref().unwrap();
        assert_eq!(f("<<"), Some(16));
        assert_eq!(f("+"), None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"sourceType": "module", "attachComment": true, "jsx": true}"#).unwrap();
        assert!(options.is_module());
        assert!(options.attach_comment);
        assert!(options.jsx);
        assert!(!options.range);
    }

    #[test]
    fn test_source_type_str() {
        assert_eq!(SourceType::Module.as_str(), "module");
        assert_eq!(serde_json::to_value(SourceType::Script).unwrap(), "script");
    }
}
