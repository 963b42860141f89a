//! LIFO stack of open input sources.

use crate::conditional::ConditionalStack;
use fax_lex::{Lexer, Token};
use fax_util::error::PpError;
use fax_util::pool::{Pool, PoolHandle};
use std::rc::Rc;

/// One open source: filename, buffer-backed lexer, pushback slot, and this
/// source's own conditional stack.
pub struct IncludeState {
    pub filename: Rc<str>,
    pub lexer: Lexer,
    pub pushback: Option<Token>,
    pub conditionals: ConditionalStack,
    close_callback: Option<Box<dyn FnOnce()>>,
}

impl IncludeState {
    fn new(filename: Rc<str>, source: Rc<str>, asm_comments: bool, close_callback: Option<Box<dyn FnOnce()>>) -> Self {
        let mut lexer = Lexer::new(source);
        lexer.asm_comments = asm_comments;
        Self {
            filename,
            lexer,
            pushback: None,
            conditionals: ConditionalStack::new(),
            close_callback,
        }
    }
}

/// Pool-backed LIFO of [`IncludeState`]s.
pub struct IncludeStack {
    pool: Pool<IncludeState>,
    stack: Vec<PoolHandle>,
}

impl IncludeStack {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            stack: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_source(
        &mut self,
        filename: Rc<str>,
        source: Rc<str>,
        asm_comments: bool,
        close_callback: Option<Box<dyn FnOnce()>>,
    ) {
        let handle = self
            .pool
            .alloc(IncludeState::new(filename, source, asm_comments, close_callback));
        self.stack.push(handle);
    }

    pub fn top(&mut self) -> Option<&mut IncludeState> {
        let handle = *self.stack.last()?;
        Some(self.pool.get_mut(handle))
    }

    /// Immutable peek — used by read-only queries (`current_filename`,
    /// `current_line`) that don't want a `&mut self` borrow.
    pub fn top_ref(&self) -> Option<&IncludeState> {
        let handle = *self.stack.last()?;
        Some(self.pool.get(handle))
    }

    /// Unlinks the top frame, invoking its close-callback exactly once if
    /// present. Returns an error if the frame's conditional stack is
    /// non-empty (an unterminated `#if` chain).
    pub fn pop_source(&mut self) -> Result<(), PpError> {
        let handle = self.stack.pop().ok_or_else(|| PpError::UnterminatedIf { line: 0 })?;
        let state = self.pool.free(handle);
        if !state.conditionals.is_empty() {
            return Err(PpError::UnterminatedIf {
                line: state.conditionals.top().map(|c| c.start_line).unwrap_or(0),
            });
        }
        if let Some(cb) = state.close_callback {
            cb();
        }
        Ok(())
    }
}

impl Default for IncludeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_is_empty() {
        let mut stack = IncludeStack::new();
        stack.push_source(Rc::from("a.c"), Rc::from("1+1"), false, None);
        assert!(!stack.is_empty());
        stack.pop_source().unwrap();
        assert!(stack.is_empty());
    }

    #[test]
    fn pop_invokes_close_callback_exactly_once() {
        use std::cell::Cell;
        use std::rc::Rc as StdRc;
        let closed = StdRc::new(Cell::new(0));
        let closed2 = StdRc::clone(&closed);
        let mut stack = IncludeStack::new();
        stack.push_source(
            Rc::from("a.c"),
            Rc::from(""),
            false,
            Some(Box::new(move || closed2.set(closed2.get() + 1))),
        );
        stack.pop_source().unwrap();
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn pop_with_unterminated_conditional_errors() {
        use crate::conditional::DirectiveKind;
        let mut stack = IncludeStack::new();
        stack.push_source(Rc::from("a.c"), Rc::from(""), false, None);
        stack.top().unwrap().conditionals.push_if(DirectiveKind::If, 1, true);
        assert!(stack.pop_source().is_err());
    }
}
