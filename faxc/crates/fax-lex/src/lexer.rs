//! Character-level tokenizer for one open source.
//!
//! Dispatches on the current character the way the lexer this is adapted
//! from does, but re-specialized to preprocessor punctuators/literals/
//! directive tags instead of a general-purpose language's keywords.

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

/// Tokenizes a single source buffer.
///
/// `asm_comments` and `report_whitespace` are public mutable fields that
/// `fax-pp`'s directive handlers toggle mid-scan (e.g. function-like macro
/// argument collection sets `report_whitespace = true` to see the boundary
/// before `(`).
pub struct Lexer {
    cursor: Cursor,
    /// Whether `;` to end-of-line is a comment (assembly-style).
    pub asm_comments: bool,
    /// Whether runs of horizontal whitespace are returned as a synthetic
    /// `' '` token instead of being silently skipped.
    pub report_whitespace: bool,
    /// True at the start of a logical line (only whitespace seen since the
    /// last newline), used to recognize `#directive` tags.
    at_line_start: bool,
    /// Single-slot internal pushback, distinct from the `IncludeState`-level
    /// pushback slot `fax-pp` owns.
    pushback: Option<Token>,
}

impl Lexer {
    pub fn new(source: Rc<str>) -> Self {
        Self {
            cursor: Cursor::new(source),
            asm_comments: false,
            report_whitespace: false,
            at_line_start: true,
            pushback: None,
        }
    }

    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Overrides the reported line number (for `#line`).
    pub fn set_line(&mut self, line: u32) {
        self.cursor.set_line(line);
    }

    /// Push a single token back; the next `next_token` call returns it.
    /// Panics if a token is already pending — the pushback slot holds at
    /// most one token by construction.
    pub fn push_back(&mut self, token: Token) {
        assert!(self.pushback.is_none(), "lexer pushback slot already full");
        self.pushback = Some(token);
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.pushback.take() {
            return tok;
        }
        self.scan_token()
    }

    fn scan_token(&mut self) -> Token {
        let line = self.cursor.line();

        if self.report_whitespace && self.at_horizontal_whitespace() {
            self.skip_horizontal_whitespace();
            return Token::new(TokenKind::Whitespace, " ", line);
        }

        if let Some(tok) = self.skip_insignificant() {
            return tok;
        }

        let line = self.cursor.line();
        let start = self.cursor.position();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eoi, "", line);
        }

        let c = self.cursor.current_char();

        if c == '\n' {
            self.cursor.advance();
            self.at_line_start = true;
            return Token::new(TokenKind::Newline, "\n", line);
        }

        let was_line_start = self.at_line_start;
        self.at_line_start = false;

        if c == '#' {
            if self.cursor.peek_char(1) == '#' {
                self.cursor.advance_n(2);
                return Token::new(TokenKind::HashHash, "##", line);
            }
            if was_line_start {
                if let Some(tok) = self.try_scan_directive(line) {
                    return tok;
                }
            }
            self.cursor.advance();
            return Token::new(TokenKind::Hash, "#", line);
        }

        if c.is_ascii_digit() {
            return self.scan_number(line);
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_identifier(line);
        }
        if c == '"' || c == '\'' {
            return self.scan_string(line, c);
        }

        match c {
            '(' => self.single(TokenKind::LParen, line),
            ')' => self.single(TokenKind::RParen, line),
            '{' => self.single(TokenKind::LBrace, line),
            '}' => self.single(TokenKind::RBrace, line),
            '[' => self.single(TokenKind::LBracket, line),
            ']' => self.single(TokenKind::RBracket, line),
            ',' => self.single(TokenKind::Comma, line),
            ';' => self.single(TokenKind::Semicolon, line),
            '?' => self.single(TokenKind::Question, line),
            '.' => self.single(TokenKind::Dot, line),
            '~' => self.single(TokenKind::Tilde, line),
            ':' => self.single(TokenKind::Colon, line),
            '+' => self.scan_two(line, '+', TokenKind::PlusPlus, "++", '=', TokenKind::PlusEq, "+=", TokenKind::Plus, "+"),
            '-' => self.scan_two(line, '-', TokenKind::MinusMinus, "--", '=', TokenKind::MinusEq, "-=", TokenKind::Minus, "-"),
            '*' => self.scan_eq(line, TokenKind::StarEq, "*=", TokenKind::Star, "*"),
            '%' => self.scan_eq(line, TokenKind::PercentEq, "%=", TokenKind::Percent, "%"),
            '=' => self.scan_eq(line, TokenKind::EqEq, "==", TokenKind::Assign, "="),
            '!' => self.scan_eq(line, TokenKind::Ne, "!=", TokenKind::Bang, "!"),
            '^' => self.scan_eq(line, TokenKind::CaretEq, "^=", TokenKind::Caret, "^"),
            '/' => self.scan_eq(line, TokenKind::SlashEq, "/=", TokenKind::Slash, "/"),
            '&' => self.scan_dup_or_eq(line, '&', TokenKind::AndAnd, "&&", TokenKind::AmpEq, "&=", TokenKind::Amp, "&"),
            '|' => self.scan_dup_or_eq(line, '|', TokenKind::OrOr, "||", TokenKind::PipeEq, "|=", TokenKind::Pipe, "|"),
            '<' => self.scan_shift(line, '<', TokenKind::Shl, "<<", TokenKind::ShlEq, "<<=", TokenKind::Le, "<=", TokenKind::Lt, "<"),
            '>' => self.scan_shift(line, '>', TokenKind::Shr, ">>", TokenKind::ShrEq, ">>=", TokenKind::Ge, ">=", TokenKind::Gt, ">"),
            bad => {
                self.cursor.advance();
                let _ = start;
                Token::new(TokenKind::BadChars, bad.to_string(), line)
            }
        }
    }

    fn single(&mut self, kind: TokenKind, line: u32) -> Token {
        let c = self.cursor.current_char();
        self.cursor.advance();
        Token::new(kind, c.to_string(), line)
    }

    /// `c=` vs bare `c`.
    fn scan_eq(&mut self, line: u32, eq_kind: TokenKind, eq_lex: &str, bare_kind: TokenKind, bare_lex: &str) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(eq_kind, eq_lex, line)
        } else {
            Token::new(bare_kind, bare_lex, line)
        }
    }

    /// `cc`, `c=`, or bare `c` (e.g. `+`/`++`/`+=`).
    #[allow(clippy::too_many_arguments)]
    fn scan_two(
        &mut self,
        line: u32,
        dup: char,
        dup_kind: TokenKind,
        dup_lex: &str,
        eq: char,
        eq_kind: TokenKind,
        eq_lex: &str,
        bare_kind: TokenKind,
        bare_lex: &str,
    ) -> Token {
        self.cursor.advance();
        if self.cursor.match_char(dup) {
            Token::new(dup_kind, dup_lex, line)
        } else if self.cursor.match_char(eq) {
            Token::new(eq_kind, eq_lex, line)
        } else {
            Token::new(bare_kind, bare_lex, line)
        }
    }

    /// `&&`/`&=`/`&` or `||`/`|=`/`|`.
    #[allow(clippy::too_many_arguments)]
    fn scan_dup_or_eq(
        &mut self,
        line: u32,
        dup: char,
        dup_kind: TokenKind,
        dup_lex: &str,
        eq_kind: TokenKind,
        eq_lex: &str,
        bare_kind: TokenKind,
        bare_lex: &str,
    ) -> Token {
        self.cursor.advance();
        if self.cursor.match_char(dup) {
            Token::new(dup_kind, dup_lex, line)
        } else if self.cursor.match_char('=') {
            Token::new(eq_kind, eq_lex, line)
        } else {
            Token::new(bare_kind, bare_lex, line)
        }
    }

    /// `<<=`/`<<`/`<=`/`<` or `>>=`/`>>`/`>=`/`>`.
    #[allow(clippy::too_many_arguments)]
    fn scan_shift(
        &mut self,
        line: u32,
        dup: char,
        shift_kind: TokenKind,
        shift_lex: &str,
        shift_eq_kind: TokenKind,
        shift_eq_lex: &str,
        le_kind: TokenKind,
        le_lex: &str,
        bare_kind: TokenKind,
        bare_lex: &str,
    ) -> Token {
        self.cursor.advance();
        if self.cursor.match_char(dup) {
            if self.cursor.match_char('=') {
                Token::new(shift_eq_kind, shift_eq_lex, line)
            } else {
                Token::new(shift_kind, shift_lex, line)
            }
        } else if self.cursor.match_char('=') {
            Token::new(le_kind, le_lex, line)
        } else {
            Token::new(bare_kind, bare_lex, line)
        }
    }

    fn scan_identifier(&mut self, line: u32) -> Token {
        let start = self.cursor.position();
        while !self.cursor.is_at_end()
            && (self.cursor.current_char().is_ascii_alphanumeric() || self.cursor.current_char() == '_')
        {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start).to_string();
        Token::new(TokenKind::Identifier, text, line)
    }

    /// Decimal/hex/octal integers and floating literals with optional
    /// exponent/suffix.
    fn scan_number(&mut self, line: u32) -> Token {
        let start = self.cursor.position();
        let mut is_float = false;

        if self.cursor.current_char() == '0'
            && (self.cursor.peek_char(1) == 'x' || self.cursor.peek_char(1) == 'X')
        {
            self.cursor.advance_n(2);
            while self.cursor.current_char().is_ascii_hexdigit() {
                self.cursor.advance();
            }
        } else {
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
                is_float = true;
                self.cursor.advance();
                while self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            }
            if matches!(self.cursor.current_char(), 'e' | 'E') {
                let save = self.cursor.snapshot();
                self.cursor.advance();
                if matches!(self.cursor.current_char(), '+' | '-') {
                    self.cursor.advance();
                }
                if self.cursor.current_char().is_ascii_digit() {
                    is_float = true;
                    while self.cursor.current_char().is_ascii_digit() {
                        self.cursor.advance();
                    }
                } else {
                    self.cursor.restore(save);
                }
            }
        }

        // Trailing type suffix (f, F, l, L, u, U and combinations).
        while matches!(self.cursor.current_char(), 'f' | 'F' | 'l' | 'L' | 'u' | 'U') {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start).to_string();
        let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntLiteral };
        Token::new(kind, text, line)
    }

    fn scan_string(&mut self, line: u32, quote: char) -> Token {
        let start = self.cursor.position();
        self.cursor.advance();
        while !self.cursor.is_at_end() && self.cursor.current_char() != quote {
            if self.cursor.current_char() == '\\' {
                self.cursor.advance();
                if !self.cursor.is_at_end() {
                    self.cursor.advance();
                }
            } else if self.cursor.current_char() == '\n' {
                break;
            } else {
                self.cursor.advance();
            }
        }
        if self.cursor.current_char() == quote {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start).to_string();
        Token::new(TokenKind::StringLiteral, text, line)
    }

    /// Attempts the `#directive` promotion: a
    /// `#` at logical-line start followed (after optional horizontal
    /// whitespace) by a recognized directive name consumes both into one
    /// `PP_*` token. Returns `None` (leaving the cursor at `#`) if the
    /// following identifier isn't a known directive name.
    fn try_scan_directive(&mut self, line: u32) -> Option<Token> {
        let save = self.cursor.snapshot();
        let hash_start = self.cursor.position();
        self.cursor.advance(); // consume '#'
        while matches!(self.cursor.current_char(), ' ' | '\t') {
            self.cursor.advance();
        }
        let name_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_alphabetic() {
            self.cursor.advance();
        }
        let name = self.cursor.slice_from(name_start);
        let kind = TokenKind::directive_from_name(name)?;
        let lexeme = self.cursor.slice_from(hash_start).to_string();
        let _ = save;
        Some(Token::new(kind, lexeme, line))
    }

    fn at_horizontal_whitespace(&self) -> bool {
        matches!(self.cursor.current_char(), ' ' | '\t')
    }

    fn skip_horizontal_whitespace(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t') {
            self.cursor.advance();
        }
    }

    /// Skips horizontal whitespace and comments (but not newlines, which
    /// are significant tokens). A block comment that never closes before
    /// end of input returns `Some` with an `IncompleteComment` token
    /// spanning from its opening `/*` to the end of the buffer; the caller
    /// must return that token immediately instead of continuing to scan.
    fn skip_insignificant(&mut self) -> Option<Token> {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' => {
                    self.cursor.advance();
                }
                ';' if self.asm_comments => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek_char(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek_char(1) == '*' => {
                    let comment_line = self.cursor.line();
                    let comment_start = self.cursor.position();
                    self.cursor.advance_n(2);
                    loop {
                        if self.cursor.is_at_end() {
                            let lexeme = self.cursor.slice_from(comment_start).to_string();
                            return Some(Token::new(TokenKind::IncompleteComment, lexeme, comment_line));
                        }
                        if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                            self.cursor.advance_n(2);
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(Rc::from(src));
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eoi;
            kinds.push(tok.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn lexes_simple_arithmetic() {
        let kinds = lex_all("1+2*3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::Plus,
                TokenKind::IntLiteral,
                TokenKind::Star,
                TokenKind::IntLiteral,
                TokenKind::Eoi,
            ]
        );
    }

    #[test]
    fn recognizes_directive_at_line_start() {
        let mut lexer = Lexer::new(Rc::from("#define A 2\n"));
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::PpDefine);
        assert_eq!(tok.lexeme, "#define");
    }

    #[test]
    fn hash_not_at_line_start_is_not_a_directive() {
        let mut lexer = Lexer::new(Rc::from("a #b"));
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Hash);
    }

    #[test]
    fn hash_hash_is_one_token() {
        let kinds = lex_all("a##b");
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::HashHash, TokenKind::Identifier, TokenKind::Eoi]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        let kinds = lex_all("1 // comment\n/* block */2");
        assert_eq!(
            kinds,
            vec![TokenKind::IntLiteral, TokenKind::Newline, TokenKind::IntLiteral, TokenKind::Eoi]
        );
    }

    #[test]
    fn lexes_float_with_exponent() {
        let mut lexer = Lexer::new(Rc::from("2.5e-3"));
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::FloatLiteral);
        assert_eq!(tok.lexeme, "2.5e-3");
    }

    #[test]
    fn lexes_hex_integer() {
        let mut lexer = Lexer::new(Rc::from("0xFF"));
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IntLiteral);
        assert_eq!(tok.lexeme, "0xFF");
    }

    #[test]
    fn lexes_string_with_escape() {
        let mut lexer = Lexer::new(Rc::from(r#""a\"b""#));
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.lexeme, r#""a\"b""#);
    }

    #[test]
    fn two_char_operators() {
        let kinds = lex_all("<< >> <= >= == != && || ## += -=");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::HashHash,
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::Eoi,
            ]
        );
    }

    #[test]
    fn report_whitespace_emits_synthetic_space_token() {
        let mut lexer = Lexer::new(Rc::from("a b"));
        lexer.report_whitespace = true;
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let ws = lexer.next_token();
        assert_eq!(ws.kind, TokenKind::Whitespace);
        assert_eq!(ws.lexeme, " ");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
    }

    #[test]
    fn push_back_replays_token() {
        let mut lexer = Lexer::new(Rc::from("a b"));
        let first = lexer.next_token();
        lexer.push_back(first.clone());
        assert_eq!(lexer.next_token(), first);
    }

    #[test]
    #[should_panic(expected = "already full")]
    fn double_push_back_panics() {
        let mut lexer = Lexer::new(Rc::from("a"));
        let tok = lexer.next_token();
        lexer.push_back(tok.clone());
        lexer.push_back(tok);
    }

    #[test]
    fn newline_bumps_line_and_resets_directive_detection() {
        let mut lexer = Lexer::new(Rc::from("a\n#define B 1\n"));
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let nl = lexer.next_token();
        assert_eq!(nl.kind, TokenKind::Newline);
        let directive = lexer.next_token();
        assert_eq!(directive.kind, TokenKind::PpDefine);
        assert_eq!(directive.line, 2);
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let mut lexer = Lexer::new(Rc::from("a /* never closes"));
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::IncompleteComment);
        assert!(tok.lexeme.starts_with("/*"));
    }

    #[test]
    fn closed_block_comment_is_skipped() {
        let kinds = lex_all("a /* fine */ b");
        assert_eq!(kinds, vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eoi]);
    }
}
