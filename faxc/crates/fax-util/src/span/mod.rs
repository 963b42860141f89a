//! Source location tracking.
//!
//! The preprocessor and calculator both report positions as a filename plus
//! a 1-based line number, not byte ranges into a shared source map — each
//! `IncludeState` already owns its own line counter, so `Span` just
//! snapshots that pair at the moment a
//! diagnostic is raised.

use std::fmt;
use std::rc::Rc;

/// A source location: a filename and a 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub filename: Rc<str>,
    pub line: u32,
}

impl Span {
    pub fn new(filename: Rc<str>, line: u32) -> Self {
        Self { filename, line }
    }

    /// A placeholder span for contexts with no active source (e.g. a
    /// top-level calculator error raised before any input is read).
    pub fn dummy() -> Self {
        Self {
            filename: Rc::from("<unknown>"),
            line: 0,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_filename_colon_line() {
        let span = Span::new(Rc::from("main.c"), 7);
        assert_eq!(span.to_string(), "main.c:7");
    }

    #[test]
    fn dummy_span_has_line_zero() {
        assert_eq!(Span::dummy().line, 0);
    }
}
