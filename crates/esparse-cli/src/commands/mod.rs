//! Subcommands.

pub mod parse;
pub mod tokenize;
pub mod version;

use std::io::Read;
use std::path::Path;

use esparse::ParseError;
use miette::{miette, IntoDiagnostic, LabeledSpan, NamedSource, Result};
use serde::Serialize;

/// Source text and a display name for diagnostics.
pub struct Input {
    pub name: String,
    pub source: String,
}

/// Read `file`, or stdin when it is absent or `-`.
pub fn read_input(file: Option<&Path>) -> Result<Input> {
    match file {
        Some(path) if path != Path::new("-") => {
            let source = std::fs::read_to_string(path)
                .into_diagnostic()
                .map_err(|e| e.wrap_err(format!("failed to read {}", path.display())))?;
            Ok(Input {
                name: path.display().to_string(),
                source,
            })
        }
        _ => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source).into_diagnostic()?;
            Ok(Input {
                name: "<stdin>".to_string(),
                source,
            })
        }
    }
}

/// Turn a syntax error into a report pointing into the source.
pub fn diagnostic(input: &Input, err: &ParseError) -> miette::Report {
    let offset = err.index.min(input.source.len());
    miette!(
        labels = vec![LabeledSpan::at_offset(offset, "here")],
        "{err}"
    )
    .with_source_code(NamedSource::new(input.name.clone(), input.source.clone()))
}

pub fn print_json(value: &impl Serialize, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .into_diagnostic()?;
    println!("{json}");
    Ok(())
}
