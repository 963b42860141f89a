//! Diagnostic reporting for the driver layer.
//!
//! `fax-pp` and `fax-calc` report failures as `Result<_, PpError/CalcError>`
//! internally; `fax-drv` is where those get turned into user-facing
//! messages. A [`Diagnostic`] pairs a [`Level`] and message with the
//! [`Span`] it occurred at, and a [`Handler`] accumulates them for a whole
//! driver invocation so `main` can decide the process exit code from
//! `has_errors()` once input is exhausted.

mod level;

pub use level::Level;

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// A single diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.level, self.message)
    }
}

/// Accumulates diagnostics for one driver invocation.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    pub fn warning(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.level.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level.is_error())
            .count()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn span() -> Span {
        Span::new(Rc::from("test.c"), 3)
    }

    #[test]
    fn test_handler_new() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn test_handler_error() {
        let handler = Handler::new();
        handler.error("bad token", span());
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_handler_warning_does_not_count_as_error() {
        let handler = Handler::new();
        handler.warning("unknown pragma", span());
        assert!(!handler.has_errors());
        assert_eq!(handler.diagnostics().len(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("bad token", span());
        assert_eq!(diag.to_string(), "test.c:3: error: bad token");
    }
}
