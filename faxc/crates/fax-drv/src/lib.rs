//! `faxc` CLI: wires `fax-pp` and `fax-calc` together behind a `preprocess`
//! subcommand and a line-at-a-time calculator REPL.
//!
//! Kept deliberately thin — an interactive shell and any build-system
//! integration are out of scope, so this crate is just argument parsing
//! plus the two subcommands.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use fax_calc::CalcDriver;
use fax_pp::{IncludeKind, IncludeResolver};
use fax_util::diagnostic::{Diagnostic, Handler};
use fax_util::Span;

#[derive(Parser, Debug)]
#[command(name = "faxc")]
#[command(author = "Fax Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "C-preprocessor-compatible preprocessor and expression calculator", long_about = None)]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preprocess a file and print the resulting source text.
    Preprocess(PreprocessArgs),
    /// Read expressions from stdin, one per line, and print each result.
    Calc(CalcArgs),
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// The file to preprocess.
    pub file: PathBuf,

    /// Predefine NAME or NAME=VALUE, may be repeated.
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Treat `;`-introduced text inside asm blocks as comments.
    #[arg(long)]
    pub asm_comments: bool,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    /// Predefine NAME or NAME=VALUE, may be repeated.
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,
}

/// Parses a `NAME` or `NAME=VALUE` `-D` predefine argument.
fn parse_define(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (raw.to_string(), "1".to_string()),
    }
}

/// Resolves `#include` against the directory holding the file being
/// preprocessed, matching how a real `cpp` looks relative includes up.
struct FsIncludeResolver {
    base_dir: PathBuf,
}

impl IncludeResolver for FsIncludeResolver {
    fn open(&mut self, kind: IncludeKind, filename: &str, parent: &str) -> Option<(Rc<str>, Box<dyn FnOnce()>)> {
        let candidate = match kind {
            IncludeKind::Local => Path::new(parent)
                .parent()
                .map(|dir| dir.join(filename))
                .unwrap_or_else(|| self.base_dir.join(filename)),
            IncludeKind::System => self.base_dir.join(filename),
        };
        let text = fs::read_to_string(&candidate).ok()?;
        tracing::debug!(path = %candidate.display(), "opened include");
        Some((Rc::from(text.as_str()), Box::new(|| {})))
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Preprocess(args) => run_preprocess(args),
        Commands::Calc(args) => run_calc(args),
    }
}

fn run_preprocess(args: PreprocessArgs) -> Result<()> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let defines: Vec<(String, String)> = args.defines.iter().map(|d| parse_define(d)).collect();
    let filename = args.file.to_string_lossy().into_owned();
    let base_dir = args
        .file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolver = Box::new(FsIncludeResolver { base_dir });

    tracing::info!(file = %filename, defines = defines.len(), "preprocessing");
    let result = fax_pp::preprocess(&filename, Rc::from(source.as_str()), &defines, args.asm_comments, resolver)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", result.output)?;

    let handler = Handler::new();
    for diag in &result.errors {
        handler.emit(Diagnostic::error(diag.message.clone(), Span::new(diag.filename.clone(), diag.line)));
    }

    if handler.has_errors() {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        for diag in handler.diagnostics() {
            writeln!(err, "{diag}")?;
        }
        bail!("{} preprocessing error(s)", handler.error_count());
    }

    Ok(())
}

fn run_calc(args: CalcArgs) -> Result<()> {
    let defines: Vec<(String, String)> = args.defines.iter().map(|d| parse_define(d)).collect();
    let driver = CalcDriver::with_defines(defines);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let trimmed = line.trim();
        if trimmed == "q" || trimmed == "quit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        match driver.eval_line(trimmed) {
            Ok((ast, result)) => writeln!(out, "{ast} = {result}")?,
            Err(e) => writeln!(out, "error: {e}")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_define_splits_on_equals() {
        assert_eq!(parse_define("FOO=1"), ("FOO".to_string(), "1".to_string()));
    }

    #[test]
    fn parse_define_without_value_defaults_to_one() {
        assert_eq!(parse_define("FOO"), ("FOO".to_string(), "1".to_string()));
    }
}
