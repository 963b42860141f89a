//! Character cursor for traversing preprocessor source text.
//!
//! Unlike the cursor this is adapted from, which borrowed `&'a str` for the
//! lifetime of the scan, this one holds an `Rc<str>` clone of the source
//! buffer. Each `IncludeState` on the include stack owns both the buffer and
//! a cursor into it; tying the cursor to a borrow would make that
//! self-referential. The `Rc` clone is one atomic-free refcount bump, not a
//! copy of the text.

use std::rc::Rc;

/// A cursor for traversing source code character by character.
pub struct Cursor {
    source: Rc<str>,
    position: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new(source: Rc<str>) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn current_char(&self) -> char {
        self.char_at(0)
    }

    #[inline]
    pub fn char_at(&self, offset: usize) -> char {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            return '\0';
        }
        let b = self.source.as_bytes()[pos];
        if b < 128 {
            return b as char;
        }
        self.source[pos..].chars().next().unwrap_or('\0')
    }

    #[inline]
    pub fn peek_char(&self, offset: usize) -> char {
        self.char_at(offset)
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.position >= self.source.len() {
            return;
        }
        let b = self.source.as_bytes()[self.position];
        if b < 128 {
            self.position += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            return;
        }
        if let Some(c) = self.source[self.position..].chars().next() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn advance_n(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_at_end() {
                break;
            }
            self.advance();
        }
    }

    pub fn match_char(&mut self, expected: char) -> bool {
        if self.current_char() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Overrides the reported line number (for `#line`). Does not
    /// touch `position`/`column` — only what `__LINE__` and diagnostics see.
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn slice_from(&self, start: usize) -> &str {
        &self.source[start..self.position]
    }

    pub fn remaining(&self) -> &str {
        &self.source[self.position..]
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
        self.column = snapshot.column;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CursorSnapshot {
    pub position: usize,
    pub line: u32,
    pub column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(s: &str) -> Cursor {
        Cursor::new(Rc::from(s))
    }

    #[test]
    fn test_new_cursor() {
        let c = cursor("let x = 42;");
        assert_eq!(c.current_char(), 'l');
        assert_eq!(c.line(), 1);
        assert_eq!(c.column(), 1);
    }

    #[test]
    fn test_advance() {
        let mut c = cursor("abc");
        c.advance();
        assert_eq!(c.current_char(), 'b');
        c.advance();
        assert_eq!(c.current_char(), 'c');
        c.advance();
        assert_eq!(c.current_char(), '\0');
    }

    #[test]
    fn test_line_tracking_across_newline() {
        let mut c = cursor("ab\ncd");
        c.advance_n(3);
        assert_eq!(c.line(), 2);
        assert_eq!(c.column(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut c = cursor("abcdef");
        let snap = c.snapshot();
        c.advance_n(4);
        c.restore(snap);
        assert_eq!(c.current_char(), 'a');
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_slice_from() {
        let mut c = cursor("let x");
        let start = c.position();
        c.advance_n(3);
        assert_eq!(c.slice_from(start), "let");
    }
}
