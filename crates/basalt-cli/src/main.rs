// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Command-line driver for the Basalt compiler front-end.
//!
//! ```text
//! basalt dump-tokens file.bst       one line per token
//! basalt dump-parse-tree file.bst   the stable parse-tree dump
//! ```
//!
//! Diagnostics are rendered with miette; the exit status is non-zero when
//! any error-severity diagnostic was emitted.

mod diagnostic;

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::debug;

use basalt_core::diagnostics::DiagnosticList;
use basalt_core::parse_tree::ParseTree;
use basalt_core::source_analysis::{NumericValue, TokenIndex, TokenizedBuffer};
use basalt_core::source_buffer::SourceBuffer;

use crate::diagnostic::RenderedDiagnostic;

#[derive(Parser)]
#[command(name = "basalt", about = "Basalt compiler front-end driver", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lex a source file and print one line per token.
    DumpTokens {
        /// The source file to lex.
        file: Utf8PathBuf,
    },
    /// Parse a source file and print the parse-tree dump.
    DumpParseTree {
        /// The source file to parse.
        file: Utf8PathBuf,
    },
}

fn main() -> miette::Result<ExitCode> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let clean = run(&cli.command)?;
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one subcommand; `Ok(false)` means error diagnostics were emitted.
fn run(command: &Command) -> miette::Result<bool> {
    match command {
        Command::DumpTokens { file } => dump_tokens(file),
        Command::DumpParseTree { file } => dump_parse_tree(file),
    }
}

fn load(file: &Utf8PathBuf) -> miette::Result<SourceBuffer> {
    debug!(%file, "loading source buffer");
    SourceBuffer::from_file(file.as_str()).map_err(miette::Report::new)
}

fn dump_tokens(file: &Utf8PathBuf) -> miette::Result<bool> {
    let source = load(file)?;
    let mut diagnostics = DiagnosticList::new();
    let tokens = TokenizedBuffer::lex(&source, &mut diagnostics);
    debug!(count = tokens.len(), "lexed");

    for token in tokens.tokens() {
        println!("{}", token_line(&tokens, token));
    }

    report_diagnostics(&source, &diagnostics);
    Ok(!diagnostics.has_errors())
}

fn dump_parse_tree(file: &Utf8PathBuf) -> miette::Result<bool> {
    let source = load(file)?;
    let mut diagnostics = DiagnosticList::new();
    let tokens = TokenizedBuffer::lex(&source, &mut diagnostics);
    let tree = ParseTree::parse(&tokens, &mut diagnostics);
    debug!(nodes = tree.len(), "parsed");

    print!("{tree}");

    report_diagnostics(&source, &diagnostics);
    Ok(!diagnostics.has_errors())
}

/// Formats one token dump line:
/// `{index: 3, kind: 'Identifier', text: 'f'}` with `partner` and `value`
/// fields where the token has them.
fn token_line(tokens: &TokenizedBuffer<'_>, token: TokenIndex) -> String {
    use std::fmt::Write as _;

    let mut line = format!(
        "{{index: {token}, kind: '{}', text: '{}'",
        tokens.kind(token).name(),
        tokens.text(token)
    );

    if let Some(partner) = tokens.partner(token) {
        let _ = write!(line, ", partner: {partner}");
    }
    match tokens.numeric_value(token) {
        Some(NumericValue::Integer(value)) => {
            let _ = write!(line, ", value: {value}");
        }
        Some(NumericValue::Real(value)) => {
            let _ = write!(
                line,
                ", value: {}*{}^{}",
                value.mantissa, value.radix, value.exponent
            );
        }
        Some(NumericValue::Error) => {
            let _ = write!(line, ", value: error");
        }
        None => {}
    }
    if let Some(value) = tokens.string_value(token) {
        let _ = write!(line, ", value: {value:?}");
    }

    line.push('}');
    line
}

fn report_diagnostics(source: &SourceBuffer, diagnostics: &DiagnosticList) {
    for diagnostic in diagnostics {
        let rendered =
            RenderedDiagnostic::from_core(diagnostic, source.filename(), source.text());
        eprintln!("{:?}", miette::Report::new(rendered));
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_for(text: &str) -> (&'static SourceBuffer, TokenizedBuffer<'static>) {
        let source = Box::leak(Box::new(
            SourceBuffer::from_text(text, "test.bst").unwrap(),
        ));
        let mut diagnostics = DiagnosticList::new();
        let tokens = TokenizedBuffer::lex(source, &mut diagnostics);
        (source, tokens)
    }

    #[test]
    fn token_line_plain() {
        let (_, tokens) = tokens_for("fn f");
        assert_eq!(
            token_line(&tokens, tokens.token_at(0)),
            "{index: 0, kind: 'Fn', text: 'fn'}"
        );
        assert_eq!(
            token_line(&tokens, tokens.token_at(1)),
            "{index: 1, kind: 'Identifier', text: 'f'}"
        );
    }

    #[test]
    fn token_line_partner_and_values() {
        let (_, tokens) = tokens_for("(42)");
        assert_eq!(
            token_line(&tokens, tokens.token_at(0)),
            "{index: 0, kind: 'OpenParen', text: '(', partner: 2}"
        );
        assert_eq!(
            token_line(&tokens, tokens.token_at(1)),
            "{index: 1, kind: 'IntegerLiteral', text: '42', value: 42}"
        );
    }

    #[test]
    fn token_line_string_value_is_escaped() {
        let (_, tokens) = tokens_for(r#""a\n""#);
        assert_eq!(
            token_line(&tokens, tokens.token_at(0)),
            "{index: 0, kind: 'StringLiteral', text: '\"a\\n\"', value: \"a\\n\"}"
        );
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["basalt", "dump-tokens", "x.bst"]).unwrap();
        assert!(matches!(cli.command, Command::DumpTokens { .. }));
        let cli = Cli::try_parse_from(["basalt", "-vv", "dump-parse-tree", "x.bst"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::DumpParseTree { .. }));
    }
}
