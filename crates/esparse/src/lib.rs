//! esparse: ECMAScript and JSX parser producing ESTree-shaped syntax trees.
//!
//! # Design
//!
//! 1. **On-demand scanning**
//!    - The parser pulls one token of lookahead from the scanner
//!    - `/` is rescanned as a regular expression where an expression starts
//!
//! 2. **Cover grammar**
//!    - Parenthesized lists and array/object literals are parsed as
//!      expressions and reinterpreted as patterns when `=>` or `=` follows
//!
//! 3. **Pluggable precedence**
//!    - Binary operators are reduced with an operator stack driven by a
//!      precedence table that callers may override
//!
//! 4. **Tolerant mode**
//!    - Recoverable violations are recorded in `Program.errors` instead of
//!      aborting the parse
//!
//! # Example
//!
//! ```
//! use esparse::{parse_module, ParseOptions};
//!
//! let program = parse_module("export const x = a ?? b;", &ParseOptions::default()).unwrap();
//! assert_eq!(program.body().len(), 1);
//! ```

mod ast;
mod comments;
mod entities;
mod error;
mod function;
mod jsx;
mod options;
mod params;
mod parser;
mod precedence;
mod scanner;
mod span;
mod statement;
mod token;
mod tokenizer;

use std::path::Path;

pub use ast::*;
pub use error::{messages, Error, ParseError};
pub use options::{ParseOptions, PrecedenceFn, SourceType, TokenizeOptions};
pub use parser::{Delegate, Parser};
pub use precedence::{PrecedenceTable, DEFAULT_PRECEDENCE};
pub use span::{MetaPosition, Metadata, Position, SourceLocation, Span};
pub use token::{CommentEntry, RegexParts, TokenEntry, TokenKind};
pub use tokenizer::{TokenItem, TokenStream, Tokenizer};

/// Parse a script or module, per `options.source_type`.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    tracing::debug!(
        len = source.len(),
        source_type = options.source_type.as_str(),
        jsx = options.jsx,
        "parsing"
    );
    Parser::new(source, options, None)?.parse_program()
}

/// Parse as a script, whatever `options.source_type` says.
pub fn parse_script(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    let options = options.clone().with_source_type(SourceType::Script);
    parse(source, &options)
}

/// Parse as a module, whatever `options.source_type` says.
pub fn parse_module(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    let options = options.clone().with_module();
    parse(source, &options)
}

/// Parse, reporting every finished node and comment to `delegate`.
pub fn parse_with_delegate<'a>(
    source: &'a str,
    options: &ParseOptions,
    delegate: &'a mut dyn Delegate,
) -> Result<Program, ParseError> {
    Parser::new(source, options, Some(delegate))?.parse_program()
}

/// Read and parse a file.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Program, Error> {
    let source = std::fs::read_to_string(path)?;
    Ok(parse(&source, options)?)
}

/// Parse and serialize to an ESTree JSON value.
pub fn parse_to_json(source: &str, options: &ParseOptions) -> Result<serde_json::Value, Error> {
    let program = parse(source, options)?;
    Ok(program.to_json()?)
}

/// Split a source into tokens without parsing it.
pub fn tokenize(source: &str, options: &TokenizeOptions) -> Result<TokenStream, ParseError> {
    tokenizer::tokenize(source, options)
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
