//! `CalcDriver`: feeds a line of text through the
//! preprocessor then the shunting-yard parser, and hands back a
//! completed AST plus its numeric result.
//!
//! Each call gets its own [`Context`] — the calculator has no persistent
//! macro table across lines, matching how the CLI's `calc` subcommand
//! treats every input line as an independent expression.

use crate::ast::Expr;
use crate::parser;
use fax_pp::{Context, IncludeResolver, NoIncludes};
use fax_util::error::CalcError;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcDriverError {
    #[error(transparent)]
    Preprocess(#[from] fax_util::error::PpError),
    #[error(transparent)]
    Parse(#[from] CalcError),
}

/// Drives one line at a time through `fax-pp` then `fax-calc`.
pub struct CalcDriver {
    defines: Vec<(String, String)>,
}

impl CalcDriver {
    pub fn new() -> Self {
        Self { defines: Vec::new() }
    }

    pub fn with_defines(defines: Vec<(String, String)>) -> Self {
        Self { defines }
    }

    /// Preprocesses and parses `line`, returning the AST and its `f64`
    /// result — the completion hook's print/run/free steps, minus `free`,
    /// which Rust's ownership model does for free when the returned `Expr`
    /// is dropped.
    pub fn eval_line(&self, line: &str) -> Result<(Expr, f64), CalcDriverError> {
        self.eval_line_with_resolver(line, Box::new(NoIncludes))
    }

    pub fn eval_line_with_resolver(
        &self,
        line: &str,
        resolver: Box<dyn IncludeResolver>,
    ) -> Result<(Expr, f64), CalcDriverError> {
        let mut buffered = line.to_string();
        if !buffered.ends_with('\n') {
            buffered.push('\n');
        }
        tracing::debug!(line, "evaluating expression");
        let mut ctx = Context::new("<calc>", Rc::<str>::from(buffered.as_str()), &self.defines, false, resolver)?;
        let ast = parser::parse(&mut ctx)?;
        let result = ast.eval();
        tracing::debug!(%ast, result, "expression evaluated");
        Ok((ast, result))
    }
}

impl Default for CalcDriver {
    fn default() -> Self {
        Self::new()
    }
}
