//! Errors and the error handler shared by the scanner and the parser.

use serde::Serialize;
use thiserror::Error;

/// A syntax error with its position.
///
/// `column` is 1-based. The `index` is a byte offset into the source.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("Line {line_number}: {description}")]
pub struct ParseError {
    pub index: usize,
    pub line_number: u32,
    pub column: u32,
    pub description: String,
}

impl ParseError {
    pub fn new(index: usize, line_number: u32, column: u32, description: impl Into<String>) -> Self {
        Self {
            index,
            line_number,
            column,
            description: description.into(),
        }
    }
}

/// Top-level error type for the public API.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to serialize syntax tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decides whether a violation aborts the parse or is recorded.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    pub errors: Vec<ParseError>,
    pub tolerant: bool,
}

impl ErrorHandler {
    pub fn new(tolerant: bool) -> Self {
        Self {
            errors: Vec::new(),
            tolerant,
        }
    }

    /// Record `error` in tolerant mode, otherwise hand it back for propagation.
    pub fn tolerate(&mut self, error: ParseError) -> Result<(), ParseError> {
        if self.tolerant {
            tracing::debug!(line = error.line_number, column = error.column, "tolerated: {}", error.description);
            self.errors.push(error);
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Build an error and tolerate it.
    pub fn tolerate_error(
        &mut self,
        index: usize,
        line_number: u32,
        column: u32,
        description: impl Into<String>,
    ) -> Result<(), ParseError> {
        self.tolerate(ParseError::new(index, line_number, column, description))
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }
}

/// Replace `%0`, `%1`, ... with `args`.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '%' {
            if let Some(&(_, d)) = chars.peek() {
                if let Some(n) = d.to_digit(10) {
                    chars.next();
                    match args.get(n as usize) {
                        Some(arg) => out.push_str(arg),
                        None => {
                            out.push('%');
                            out.push(d);
                        }
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Error messages.
pub mod messages {
    pub const ASYNC_FUNCTION_IN_SINGLE_STATEMENT_CONTEXT: &str =
        "Async functions can only be declared at the top level or inside a block.";
    pub const BAD_GETTER_ARITY: &str = "Getter must not have any formal parameters";
    pub const BAD_IMPORT_CALL_ARITY: &str = "Unexpected token";
    pub const BAD_SETTER_ARITY: &str = "Setter must have exactly one formal parameter";
    pub const BAD_SETTER_REST_PARAMETER: &str = "Setter function argument must not be a rest parameter";
    pub const CANNOT_USE_IMPORT_META_OUTSIDE_A_MODULE: &str = "Cannot use 'import.meta' outside a module";
    pub const CONSTRUCTOR_IS_ASYNC: &str = "Class constructor may not be an async method";
    pub const CONSTRUCTOR_SPECIAL_METHOD: &str = "Class constructor may not be an accessor";
    pub const DECLARATION_MISSING_INITIALIZER: &str = "Missing initializer in %0 declaration";
    pub const DEFAULT_REST_PARAMETER: &str = "Unexpected token =";
    pub const DEFAULT_REST_PROPERTY: &str = "Unexpected token =";
    pub const DUPLICATE_BINDING: &str = "Duplicate binding %0";
    pub const DUPLICATE_CONSTRUCTOR: &str = "A class may only have one constructor";
    pub const DUPLICATE_PARAMETER: &str = "Duplicate parameter name not allowed in this context";
    pub const DUPLICATE_PROTO_PROPERTY: &str = "Duplicate __proto__ fields are not allowed in object literals";
    pub const FOR_IN_OF_LOOP_INITIALIZER: &str = "%0 loop variable declaration may not have an initializer.";
    pub const GENERATOR_IN_LEGACY_CONTEXT: &str = "Generator declarations are not allowed in legacy contexts";
    pub const ILLEGAL_BREAK: &str = "Illegal break statement";
    pub const ILLEGAL_CONTINUE: &str = "Illegal continue statement";
    pub const ILLEGAL_EXPORT_DECLARATION: &str = "Unexpected token";
    pub const ILLEGAL_IMPORT_DECLARATION: &str = "Unexpected token";
    pub const ILLEGAL_LANGUAGE_MODE_DIRECTIVE: &str =
        "Illegal 'use strict' directive in function with non-simple parameter list";
    pub const ILLEGAL_RETURN: &str = "Illegal return statement";
    pub const INVALID_ESCAPED_RESERVED_WORD: &str = "Keyword must not contain escaped characters";
    pub const INVALID_HEX_ESCAPE_SEQUENCE: &str = "Invalid hexadecimal escape sequence";
    pub const INVALID_LHS_IN_ASSIGNMENT: &str = "Invalid left-hand side in assignment";
    pub const INVALID_LHS_IN_FOR_IN: &str = "Invalid left-hand side in for-in";
    pub const INVALID_LHS_IN_FOR_LOOP: &str = "Invalid left-hand side in for-loop";
    pub const INVALID_MODULE_SPECIFIER: &str = "Unexpected token";
    pub const INVALID_REG_EXP: &str = "Invalid regular expression";
    pub const INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN: &str = "Invalid tagged template on optional chain";
    pub const INVALID_UNICODE_ESCAPE_SEQUENCE: &str = "Invalid Unicode escape sequence";
    pub const LET_IN_LEXICAL_BINDING: &str = "let is disallowed as a lexically bound name";
    pub const MISSING_FROM_CLAUSE: &str = "Unexpected token";
    pub const MULTIPLE_DEFAULTS_IN_SWITCH: &str = "More than one default clause in switch statement";
    pub const NEWLINE_AFTER_THROW: &str = "Illegal newline after throw";
    pub const NO_AS_AFTER_IMPORT_NAMESPACE: &str = "Unexpected token";
    pub const NO_CATCH_OR_FINALLY: &str = "Missing catch or finally after try";
    pub const PARAMETER_AFTER_REST_PARAMETER: &str = "Rest parameter must be last formal parameter";
    pub const PROPERTY_AFTER_REST_PROPERTY: &str = "Unexpected token";
    pub const REDECLARATION: &str = "%0 '%1' has already been declared";
    pub const STATIC_PROTOTYPE: &str = "Classes may not have static property named prototype";
    pub const STRICT_CATCH_VARIABLE: &str = "Catch variable may not be eval or arguments in strict mode";
    pub const STRICT_DELETE: &str = "Delete of an unqualified identifier in strict mode.";
    pub const STRICT_FUNCTION: &str =
        "In strict mode code, functions can only be declared at top level or inside a block";
    pub const STRICT_FUNCTION_NAME: &str = "Function name may not be eval or arguments in strict mode";
    pub const STRICT_LHS_ASSIGNMENT: &str = "Assignment to eval or arguments is not allowed in strict mode";
    pub const STRICT_LHS_POSTFIX: &str =
        "Postfix increment/decrement may not have eval or arguments operand in strict mode";
    pub const STRICT_LHS_PREFIX: &str =
        "Prefix increment/decrement may not have eval or arguments operand in strict mode";
    pub const STRICT_MODE_WITH: &str = "Strict mode code may not include a with statement";
    pub const STRICT_OCTAL_LITERAL: &str = "Octal literals are not allowed in strict mode.";
    pub const STRICT_PARAM_NAME: &str = "Parameter name eval or arguments is not allowed in strict mode";
    pub const STRICT_RESERVED_WORD: &str = "Use of future reserved word in strict mode";
    pub const STRICT_VAR_NAME: &str = "Variable name may not be eval or arguments in strict mode";
    pub const TEMPLATE_ESCAPE_89: &str = "\\8 and \\9 are not allowed in template strings.";
    pub const TEMPLATE_OCTAL_LITERAL: &str = "Octal literals are not allowed in template strings.";
    pub const UNEXPECTED_EOS: &str = "Unexpected end of input";
    pub const UNEXPECTED_IDENTIFIER: &str = "Unexpected identifier";
    pub const UNEXPECTED_NUMBER: &str = "Unexpected number";
    pub const UNEXPECTED_RESERVED: &str = "Unexpected reserved word";
    pub const UNEXPECTED_STRING: &str = "Unexpected string";
    pub const UNEXPECTED_SUPER: &str = "'super' keyword unexpected here";
    pub const UNEXPECTED_TEMPLATE: &str = "Unexpected quasi %0";
    pub const UNEXPECTED_TOKEN: &str = "Unexpected token %0";
    pub const UNEXPECTED_TOKEN_ILLEGAL: &str = "Invalid or unexpected token";
    pub const UNKNOWN_LABEL: &str = "Undefined label '%0'";
    pub const UNTERMINATED_REG_EXP: &str = "Invalid regular expression: missing /";

    // JSX
    pub const JSX_EMPTY_ATTRIBUTE_EXPRESSION: &str = "JSX attributes must only be assigned a non-empty expression";
    pub const JSX_CLOSING_TAG_MISMATCH: &str = "Expected corresponding JSX closing tag for %0";
    pub const JSX_FRAGMENT_MISMATCH: &str = "Expected corresponding JSX closing tag for jsx fragment";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        assert_eq!(format_message(messages::UNEXPECTED_TOKEN, &["}"]), "Unexpected token }");
        assert_eq!(
            format_message(messages::REDECLARATION, &["Label", "a"]),
            "Label 'a' has already been declared"
        );
        assert_eq!(format_message("100%", &[]), "100%");
        assert_eq!(format_message("%1 missing", &["x"]), "%1 missing");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(4, 2, 3, "Unexpected token )");
        assert_eq!(err.to_string(), "Line 2: Unexpected token )");
    }

    #[test]
    fn test_error_handler_tolerant() {
        let mut handler = ErrorHandler::new(true);
        assert!(handler.tolerate_error(0, 1, 1, "oops").is_ok());
        assert_eq!(handler.errors.len(), 1);
        assert_eq!(handler.take_errors().len(), 1);
        assert!(handler.errors.is_empty());
    }

    #[test]
    fn test_error_handler_strict() {
        let mut handler = ErrorHandler::new(false);
        let err = handler.tolerate_error(7, 1, 8, "oops").unwrap_err();
        assert_eq!(err.index, 7);
        assert!(handler.errors.is_empty());
    }

    #[test]
    fn test_parse_error_json() {
        let err = ParseError::new(4, 2, 3, "bad");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["lineNumber"], 2);
        assert_eq!(json["description"], "bad");
    }
}
