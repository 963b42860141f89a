//! Token kinds for the C-preprocessor-compatible lexer.
//!
//! A closed tag set: punctuators, operator-pair tokens,
//! the `PP_*` directive tags, literal kinds, and the sentinel kinds
//! (`INCOMPLETE_COMMENT`, `BAD_CHARS`, `EOI`, `PREPROCESSING_ERROR`).

/// A lexical token kind. Carries no payload itself — `Token` pairs a kind
/// with the owned lexeme text and the line it started on. Lexemes are owned
/// `String`s, not borrowed slices, because `IncludeState` owns its buffer via `Rc<str>`
/// and a borrowed-slice `Token` would tie the token's lifetime to that
/// buffer, which doesn't compose with macro expansion synthesizing new
/// buffers at runtime).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // --- Literals & identifiers ---
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // --- Single-char punctuators ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Question,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Lt,
    Gt,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Hash,

    // --- Two-char (and longer) operators ---
    Shl,       // <<
    Shr,       // >>
    Le,        // <=
    Ge,        // >=
    EqEq,      // ==
    Ne,        // !=
    AndAnd,    // &&
    OrOr,      // ||
    PlusPlus,  // ++
    MinusMinus, // --
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    ShlEq,     // <<=
    ShrEq,     // >>=
    AmpEq,     // &=
    PipeEq,    // |=
    CaretEq,   // ^=
    HashHash,  // ##

    // --- Preprocessor directive tags ---
    PpInclude,
    PpLine,
    PpDefine,
    PpUndef,
    PpIf,
    PpIfdef,
    PpIfndef,
    PpElse,
    PpElif,
    PpEndif,
    PpError,
    PpPragma,

    // --- Structural / sentinel ---
    Newline,
    /// A run of horizontal whitespace, only emitted when `report_whitespace`
    /// is set.
    Whitespace,
    IncompleteComment,
    BadChars,
    Eoi,
    PreprocessingError,
}

impl TokenKind {
    /// The directive tag for a `#`-introduced identifier, if any — promotes
    /// the next token to the corresponding `PP_*` kind.
    pub fn directive_from_name(name: &str) -> Option<TokenKind> {
        Some(match name {
            "include" => TokenKind::PpInclude,
            "line" => TokenKind::PpLine,
            "define" => TokenKind::PpDefine,
            "undef" => TokenKind::PpUndef,
            "if" => TokenKind::PpIf,
            "ifdef" => TokenKind::PpIfdef,
            "ifndef" => TokenKind::PpIfndef,
            "else" => TokenKind::PpElse,
            "elif" => TokenKind::PpElif,
            "endif" => TokenKind::PpEndif,
            "error" => TokenKind::PpError,
            "pragma" => TokenKind::PpPragma,
            _ => return None,
        })
    }
}

/// A lexed token: kind, owned lexeme text, and the 1-based line it started on.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}
