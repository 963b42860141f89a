//! Error kinds shared by `fax-pp` and `fax-calc`.
//!
//! Preprocessor errors group into lexical, directive-syntax, semantic, and
//! resource kinds; `PpError` mirrors that grouping so a `Context` can match
//! on it when deciding whether to resume scanning at the next newline or
//! poison the whole translation unit.

use thiserror::Error;

/// Preprocessor error kinds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PpError {
    // --- Lexical ---
    #[error("unterminated comment starting at line {line}")]
    IncompleteComment { line: u32 },

    #[error("invalid characters at line {line}: {text}")]
    BadChars { line: u32, text: String },

    // --- Directive syntax ---
    #[error("malformed #include at line {line}")]
    BadInclude { line: u32 },

    #[error("malformed #line at line {line}")]
    BadLine { line: u32 },

    #[error("malformed #define at line {line}: {reason}")]
    BadDefine { line: u32, reason: String },

    #[error("malformed #undef at line {line}")]
    BadUndef { line: u32 },

    #[error("malformed constant expression at line {line}: {reason}")]
    BadConstantExpr { line: u32, reason: String },

    #[error("unmatched ')' in constant expression at line {line}")]
    UnmatchedRParen { line: u32 },

    #[error("unmatched '(' in constant expression at line {line}")]
    UnmatchedLParen { line: u32 },

    #[error("'##' may not appear at the {position} of a macro replacement (line {line})")]
    DanglingConcat { line: u32, position: &'static str },

    #[error("'defined' used incorrectly at line {line}")]
    BadDefinedOperator { line: u32 },

    // --- Semantic ---
    #[error("'{name}' redefined at line {line}")]
    DuplicateDefine { name: String, line: u32 },

    #[error("#{directive} with no matching #if at line {line}")]
    DirectiveWithoutIf { directive: &'static str, line: u32 },

    #[error("#else after #else at line {line}")]
    ElseAfterElse { line: u32 },

    #[error("#elif after #else at line {line}")]
    ElifAfterElse { line: u32 },

    #[error("unterminated #if started at line {line}")]
    UnterminatedIf { line: u32 },

    #[error("#include callback failed for '{filename}' at line {line}")]
    IncludeFailed { filename: String, line: u32 },

    #[error("macro '{name}' invoked with {got} argument(s), expected {expected} at line {line}")]
    ArgumentCountMismatch {
        name: String,
        expected: i32,
        got: usize,
        line: u32,
    },

    #[error("macro expansion recursion limit ({limit}) exceeded expanding '{name}'")]
    RecursionLimitExceeded { name: String, limit: u32 },

    #[error("'defined' is not a legal macro name (line {line})")]
    DefinedIsReserved { line: u32 },

    // --- Resource ---
    #[error("out of memory")]
    OutOfMemory,

    #[error("#error directive at line {line}: {message}")]
    UserError { line: u32, message: String },
}

impl PpError {
    /// Render as a fixed-size `failstr`, truncated to 255 bytes.
    pub fn to_failstr(&self) -> String {
        let full = self.to_string();
        if full.len() <= 255 {
            full
        } else {
            full.chars().take(255).collect()
        }
    }
}

/// Calculator error kinds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("expected ':' to close ternary expression")]
    MissingTernaryColon,

    #[error("mismatched parentheses")]
    MismatchedParens,

    #[error("operator stack overflow (limit {limit})")]
    OperatorStackOverflow { limit: usize },

    #[error("operand stack overflow (limit {limit})")]
    OperandStackOverflow { limit: usize },

    #[error("expression exceeds the {limit}-token output limit")]
    ExpressionTooLong { limit: usize },
}
