use std::fmt::Display;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chungus_core::ast::render_tree;
use chungus_core::config::DEFAULT_MAX_DEPTH;
use chungus_core::{
    CoreError, Diagnostic, FrontendConfig, caret_snippet, check_source, load_source, parse_source,
    tokenize,
};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(version, about = "Check Chungus programs", long_about = None)]
struct Cli {
    /// Source file; standard input when omitted.
    #[arg(short, long)]
    input: Option<String>,

    #[arg(long, value_enum, default_value_t = Emit::Check, help = "What to print")]
    emit: Emit,

    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_DEPTH,
        help = "Deepest statement/expression nesting accepted"
    )]
    max_depth: usize,

    /// Log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// One token per line: `line:col kind lexeme`.
    Tokens,
    /// The syntax tree.
    Ast,
    /// Run every stage and print `ok`.
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => {
            load_source(path).with_context(|| format!("failed to read input file {path}"))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            buffer
        }
    };
    let config = FrontendConfig::with_max_depth(cli.max_depth);

    let result = match cli.emit {
        Emit::Tokens => tokenize(&source).map(|tokens| {
            for token in tokens {
                println!(
                    "{}:{} {} {}",
                    token.line(),
                    token.column(),
                    token.kind.as_str(),
                    token.lexeme
                );
            }
        }),
        Emit::Ast => parse_source(&source, &config).map(|checked| {
            print!("{}", render_tree(&checked.program));
        }),
        Emit::Check => check_source(&source, &config).map(|_| println!("ok")),
    };

    result.map_err(|err| {
        report(&source, &err);
        anyhow::Error::new(err)
    })
}

fn report(source: &str, err: &CoreError) {
    eprintln!("{} errors:", err.stage());
    match err {
        CoreError::SourceIo(io) => eprintln!("{io}"),
        CoreError::Lexical(errors) => print_diagnostics(source, errors),
        CoreError::Syntax(errors) => print_diagnostics(source, errors),
        CoreError::Semantic(errors) => print_diagnostics(source, errors),
    }
}

fn print_diagnostics<E: Diagnostic + Display>(source: &str, errors: &[E]) {
    for error in errors {
        eprintln!("{error}");
        if error.line() > 0 {
            eprintln!("{}", caret_snippet(source, error.line(), error.column()));
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn chungus() -> Command {
        Command::cargo_bin("chungus").expect("binary exists")
    }

    #[test]
    fn checks_a_valid_file() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("main.chg");
        fs::write(
            &input_path,
            "fn add(x, y):\n  ret x + y\nclose\nshow add(1, 2)\n",
        )
        .expect("write input");

        chungus()
            .arg("--input")
            .arg(&input_path)
            .assert()
            .success()
            .stdout("ok\n");
    }

    #[test]
    fn reads_standard_input_and_prints_tokens() {
        chungus()
            .args(["--emit", "tokens"])
            .write_stdin("x = ~4\nshow x")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "1:1 id x\n1:3 = =\n1:5 int_literal ~4\n2:1 show show\n2:6 id x\n",
            ));
    }

    #[test]
    fn prints_the_syntax_tree() {
        chungus()
            .args(["--emit", "ast"])
            .write_stdin("show 1 + 2")
            .assert()
            .success()
            .stdout(predicate::str::contains("└─ binary: +"));
    }

    #[test]
    fn semantic_errors_are_reported_with_carets() {
        chungus()
            .write_stdin("value = missing + 1\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("semantic errors:"))
            .stderr(predicate::str::contains(
                "Line 1, Col 9: undefined variable 'missing'",
            ))
            .stderr(predicate::str::contains(
                "1    |value = missing + 1\n     |        ^",
            ));
    }

    #[test]
    fn lexical_errors_stop_before_parsing() {
        chungus()
            .write_stdin("x = 1 @ 2\nshow (")
            .assert()
            .failure()
            .stderr(predicate::str::contains("lexical errors:"))
            .stderr(predicate::str::contains("1:7 invalid character '@'"))
            .stderr(predicate::str::contains("syntax errors:").not());
    }

    #[test]
    fn max_depth_flag_limits_nesting() {
        chungus()
            .args(["--max-depth", "3"])
            .write_stdin("x = ((((1))))")
            .assert()
            .failure()
            .stderr(predicate::str::contains("nesting too deep (limit 3)"));
    }

    #[test]
    fn missing_input_file_fails_with_context() {
        chungus()
            .args(["--input", "does/not/exist.chg"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read input file"));
    }
}
