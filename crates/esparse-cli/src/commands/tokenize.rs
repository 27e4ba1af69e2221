use std::path::Path;

use esparse::TokenizeOptions;
use miette::Result;

use super::{diagnostic, print_json, read_input};

pub fn run(file: Option<&Path>, range: bool, loc: bool, comment: bool, tolerant: bool, compact: bool) -> Result<()> {
    let input = read_input(file)?;
    let options = TokenizeOptions::default()
        .with_range(range)
        .with_loc(loc)
        .with_comment(comment)
        .with_tolerant(tolerant);

    let stream = esparse::tokenize(&input.source, &options).map_err(|err| diagnostic(&input, &err))?;
    if tolerant {
        print_json(&stream, compact)
    } else {
        print_json(&stream.tokens, compact)
    }
}
