//! Character-level lexer for `fax-pp`'s C-preprocessor-compatible token
//! stream.
//!
//! This crate has no knowledge of macros, conditionals, or includes — it
//! only turns one source buffer into [`Token`]s. `fax-pp` owns one
//! [`Lexer`] per entry on its include stack and drives `next_token` itself.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::{Cursor, CursorSnapshot};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
