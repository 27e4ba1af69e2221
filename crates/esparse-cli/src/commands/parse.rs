use std::path::Path;

use esparse::{ParseOptions, SourceType};
use miette::{IntoDiagnostic, Result, WrapErr};

use super::{diagnostic, print_json, read_input};

/// Option flags given on the command line. A set flag overrides `--options`.
#[derive(Debug, Default)]
pub struct Flags {
    pub module: bool,
    pub jsx: bool,
    pub range: bool,
    pub loc: bool,
    pub tokens: bool,
    pub comment: bool,
    pub attach_comment: bool,
    pub tolerant: bool,
}

/// Merge `--options` JSON with the flags.
pub fn resolve_options(json: Option<&str>, flags: &Flags) -> Result<ParseOptions> {
    let mut options: ParseOptions = match json {
        Some(json) => serde_json::from_str(json)
            .into_diagnostic()
            .wrap_err("invalid --options JSON")?,
        None => ParseOptions::default(),
    };

    if flags.module {
        options.source_type = SourceType::Module;
    }
    options.jsx |= flags.jsx;
    options.range |= flags.range;
    options.loc |= flags.loc;
    options.tokens |= flags.tokens;
    options.comment |= flags.comment;
    options.attach_comment |= flags.attach_comment;
    options.tolerant |= flags.tolerant;
    Ok(options)
}

pub fn run(file: Option<&Path>, flags: &Flags, options_json: Option<&str>, compact: bool) -> Result<()> {
    let input = read_input(file)?;
    let mut options = resolve_options(options_json, flags)?;
    if options.loc && options.source.is_none() && file.is_some() {
        options.source = Some(input.name.clone());
    }

    let program = esparse::parse(&input.source, &options).map_err(|err| diagnostic(&input, &err))?;
    if let Some(errors) = &program.errors {
        for err in errors {
            tracing::warn!(line = err.line_number, column = err.column, "{}", err.description);
        }
    }
    print_json(&program, compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_json() {
        let flags = Flags {
            module: true,
            range: true,
            ..Flags::default()
        };
        let options = resolve_options(Some(r#"{"jsx": true, "range": false}"#), &flags).unwrap();
        assert!(options.is_module());
        assert!(options.jsx);
        assert!(options.range);
        assert!(!options.tolerant);
    }

    #[test]
    fn test_invalid_options_json() {
        assert!(resolve_options(Some("{not json"), &Flags::default()).is_err());
    }
}
