#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::fn_params_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "esparse")]
#[command(author, version, about = "Parse ECMAScript and JSX into ESTree JSON", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Parse a source file and print the syntax tree as JSON
    Parse {
        /// Input file (stdin when omitted or `-`)
        file: Option<PathBuf>,

        /// Parse as an ES module
        #[arg(long)]
        module: bool,

        /// Enable JSX
        #[arg(long)]
        jsx: bool,

        /// Add `range` to nodes
        #[arg(long)]
        range: bool,

        /// Add `loc` to nodes
        #[arg(long)]
        loc: bool,

        /// Include the token list
        #[arg(long)]
        tokens: bool,

        /// Include the comment list
        #[arg(long)]
        comment: bool,

        /// Attach comments to nodes
        #[arg(long)]
        attach_comment: bool,

        /// Record recoverable errors instead of failing
        #[arg(long)]
        tolerant: bool,

        /// Parse options as JSON, e.g. '{"sourceType":"module"}'; flags win
        #[arg(long, value_name = "JSON", env = "ESPARSE_OPTIONS")]
        options: Option<String>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Split a source file into tokens and print them as JSON
    Tokenize {
        /// Input file (stdin when omitted or `-`)
        file: Option<PathBuf>,

        /// Add `range` to tokens
        #[arg(long)]
        range: bool,

        /// Add `loc` to tokens
        #[arg(long)]
        loc: bool,

        /// Include comments in the stream
        #[arg(long)]
        comment: bool,

        /// Record scan errors instead of failing
        #[arg(long)]
        tolerant: bool,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Parse {
            file,
            module,
            jsx,
            range,
            loc,
            tokens,
            comment,
            attach_comment,
            tolerant,
            options,
            compact,
        } => {
            let flags = commands::parse::Flags {
                module,
                jsx,
                range,
                loc,
                tokens,
                comment,
                attach_comment,
                tolerant,
            };
            commands::parse::run(file.as_deref(), &flags, options.as_deref(), compact)
        }
        Commands::Tokenize {
            file,
            range,
            loc,
            comment,
            tolerant,
            compact,
        } => commands::tokenize::run(file.as_deref(), range, loc, comment, tolerant, compact),
    }
}
