//! Macro expansion: argument collection, `#` stringify,
//! `##` concatenation, and re-lexing the replacement into a synthetic
//! source frame.

use crate::context::Context;
use crate::define::Define;
use fax_lex::{Lexer, Token, TokenKind};
use fax_util::error::PpError;
use std::rc::Rc;

/// Cap on nested macro expansion depth.
pub const MAX_EXPANSION_DEPTH: u32 = 256;

struct Argument {
    /// Raw lexeme text, space-joined and trimmed — used by `#` stringify.
    original: String,
    /// Inner object-like macros pre-expanded — used everywhere else.
    definition: String,
}

/// Attempts to expand the identifier `name` at the current pump position.
/// Returns `Ok(true)` if a new synthetic source frame was pushed (the
/// caller should re-lex from the new top frame), `Ok(false)` if `name`
/// does not name a macro (or a function-like macro wasn't actually
/// invoked — no `(` followed), and `Err` on a hard expansion error.
pub fn try_expand(ctx: &mut Context, name: &str, line: u32) -> Result<bool, PpError> {
    if let Some(text) = synthetic_expansion(ctx, name) {
        ctx.push_synthetic_frame(text);
        return Ok(true);
    }

    let define = match ctx.macros().find_define(name) {
        Some(d) => d.clone(),
        None => return Ok(false),
    };

    if ctx.recursion_count() >= MAX_EXPANSION_DEPTH {
        return Err(PpError::RecursionLimitExceeded {
            name: name.to_string(),
            limit: MAX_EXPANSION_DEPTH,
        });
    }

    if !define.is_function_like() {
        ctx.bump_recursion();
        ctx.push_synthetic_frame(define.definition.clone());
        return Ok(true);
    }

    // Function-like: must see `(` (ignoring intervening whitespace) or
    // this isn't a macro invocation at all.
    ctx.set_report_whitespace(true);
    let mut lookahead = ctx.next_raw_token();
    while lookahead.kind == TokenKind::Whitespace {
        lookahead = ctx.next_raw_token();
    }
    ctx.set_report_whitespace(false);
    if lookahead.kind != TokenKind::LParen {
        ctx.push_back_raw(lookahead);
        return Ok(false);
    }

    let args = collect_arguments(ctx, &define, line)?;
    ctx.bump_recursion();
    let expanded = substitute_body(&define, &args, line)?;
    ctx.push_synthetic_frame(expanded);
    Ok(true)
}

fn synthetic_expansion(ctx: &Context, name: &str) -> Option<String> {
    match name {
        "__FILE__" if !ctx.file_disabled() => Some(format!("\"{}\"", ctx.current_filename())),
        "__LINE__" if !ctx.line_disabled() => Some(ctx.current_line().to_string()),
        _ => None,
    }
}

fn collect_arguments(ctx: &mut Context, define: &Define, line: u32) -> Result<Vec<Argument>, PpError> {
    let mut raw_groups: Vec<Vec<Token>> = vec![Vec::new()];
    let mut depth = 1u32;
    loop {
        let tok = ctx.next_raw_token();
        match tok.kind {
            TokenKind::LParen => {
                depth += 1;
                raw_groups.last_mut().unwrap().push(tok);
            }
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                raw_groups.last_mut().unwrap().push(tok);
            }
            TokenKind::Comma if depth == 1 => raw_groups.push(Vec::new()),
            TokenKind::Newline => raw_groups.last_mut().unwrap().push(tok),
            TokenKind::Eoi => {
                return Err(PpError::ArgumentCountMismatch {
                    name: define.identifier.clone(),
                    expected: define.paramcount.max(0),
                    got: raw_groups.len(),
                    line,
                })
            }
            _ => raw_groups.last_mut().unwrap().push(tok),
        }
    }

    // A single empty group means "no arguments written", which only
    // matches paramcount == -1 (`#define a()`).
    let is_empty_call = raw_groups.len() == 1 && raw_groups[0].is_empty();
    let expected: i32 = if define.paramcount < 0 { 0 } else { define.paramcount };
    let got = if is_empty_call { 0 } else { raw_groups.len() };
    if got != expected as usize {
        return Err(PpError::ArgumentCountMismatch {
            name: define.identifier.clone(),
            expected,
            got,
            line,
        });
    }

    let groups: Vec<Vec<Token>> = if is_empty_call { Vec::new() } else { raw_groups };
    groups
        .into_iter()
        .map(|tokens| build_argument(ctx, tokens))
        .collect()
}

fn build_argument(ctx: &mut Context, tokens: Vec<Token>) -> Result<Argument, PpError> {
    let original = join_lexemes(&tokens);
    let definition = expand_token_list(ctx, &tokens)?;
    Ok(Argument { original, definition })
}

fn join_lexemes(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        if tok.kind == TokenKind::Newline {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&tok.lexeme);
    }
    out.trim().to_string()
}

/// Pre-expands object-like macros referenced inside an argument, for use
/// in non-`#` substitution positions. Recursive
/// function-like invocations *within* an argument are intentionally not
/// expanded here — a second full macro-expanding pump would be needed to
/// support that, and no scenario in this toolchain's test surface needs
/// it (recorded in DESIGN.md).
fn expand_token_list(ctx: &Context, tokens: &[Token]) -> Result<String, PpError> {
    let mut out = String::new();
    for tok in tokens {
        if tok.kind == TokenKind::Newline {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        if tok.kind == TokenKind::Identifier {
            if let Some(def) = ctx.macros().find_define(&tok.lexeme) {
                if !def.is_function_like() {
                    out.push_str(&def.definition);
                    continue;
                }
            }
        }
        out.push_str(&tok.lexeme);
    }
    Ok(out.trim().to_string())
}

fn substitute_body(define: &Define, args: &[Argument], line: u32) -> Result<String, PpError> {
    let mut lexer = Lexer::new(Rc::from(define.definition.as_str()));
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token();
        if tok.kind == TokenKind::Eoi {
            break;
        }
        if tok.kind == TokenKind::Newline {
            continue;
        }
        tokens.push(tok);
    }

    if tokens.first().map(|t| t.kind) == Some(TokenKind::HashHash)
        || tokens.last().map(|t| t.kind) == Some(TokenKind::HashHash)
    {
        return Err(PpError::DanglingConcat {
            line,
            position: if tokens.first().map(|t| t.kind) == Some(TokenKind::HashHash) {
                "start"
            } else {
                "end"
            },
        });
    }

    let mut out = String::new();
    let mut i = 0;
    let mut suppress_leading_space = true;
    while i < tokens.len() {
        let tok = &tokens[i];

        if tok.kind == TokenKind::Hash {
            let next = tokens.get(i + 1).ok_or(PpError::BadDefine {
                line,
                reason: "`#` at end of replacement list".into(),
            })?;
            let text = if next.kind == TokenKind::Identifier {
                match define.param_index(&next.lexeme) {
                    Some(idx) => args[idx].original.clone(),
                    None => next.lexeme.clone(),
                }
            } else {
                next.lexeme.clone()
            };
            push_token(&mut out, &format!("\"{}\"", text), &mut suppress_leading_space);
            i += 2;
            continue;
        }

        if tok.kind == TokenKind::HashHash {
            suppress_leading_space = true;
            i += 1;
            continue;
        }

        let followed_by_concat = tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::HashHash);

        let text = if tok.kind == TokenKind::Identifier {
            match define.param_index(&tok.lexeme) {
                Some(idx) if followed_by_concat || was_concat_target(&tokens, i) => {
                    args[idx].original.clone()
                }
                Some(idx) => args[idx].definition.clone(),
                None => tok.lexeme.clone(),
            }
        } else {
            tok.lexeme.clone()
        };

        push_token(&mut out, &text, &mut suppress_leading_space);
        i += 1;
    }

    Ok(out)
}

fn was_concat_target(tokens: &[Token], idx: usize) -> bool {
    idx > 0 && tokens[idx - 1].kind == TokenKind::HashHash
}

fn push_token(out: &mut String, text: &str, suppress_leading_space: &mut bool) {
    if !out.is_empty() && !*suppress_leading_space {
        out.push(' ');
    }
    out.push_str(text);
    *suppress_leading_space = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::Define;

    fn square_macro() -> Define {
        Define {
            identifier: "SQ".into(),
            definition: "((x)*(x))".into(),
            original: None,
            parameters: vec!["x".into()],
            paramcount: 1,
        }
    }

    #[test]
    fn object_like_substitution_has_no_params() {
        let define = square_macro();
        let args = vec![Argument {
            original: "1+2".into(),
            definition: "1+2".into(),
        }];
        let out = substitute_body(&define, &args, 1).unwrap();
        assert_eq!(out, "((1+2)*(1+2))");
    }

    #[test]
    fn stringify_uses_original_text() {
        let define = Define {
            identifier: "STR".into(),
            definition: "#x".into(),
            original: None,
            parameters: vec!["x".into()],
            paramcount: 1,
        };
        let args = vec![Argument {
            original: "hello world".into(),
            definition: "hello world".into(),
        }];
        let out = substitute_body(&define, &args, 1).unwrap();
        assert_eq!(out, "\"hello world\"");
    }

    #[test]
    fn concat_joins_without_space() {
        let define = Define {
            identifier: "CAT".into(),
            definition: "a##b".into(),
            original: None,
            parameters: vec!["a".into(), "b".into()],
            paramcount: 2,
        };
        let args = vec![
            Argument { original: "foo".into(), definition: "foo".into() },
            Argument { original: "bar".into(), definition: "bar".into() },
        ];
        let out = substitute_body(&define, &args, 1).unwrap();
        assert_eq!(out, "foobar");
    }

    #[test]
    fn dangling_concat_at_start_is_rejected() {
        let define = Define {
            identifier: "BAD".into(),
            definition: "##x".into(),
            original: None,
            parameters: vec!["x".into()],
            paramcount: 1,
        };
        let args = vec![Argument { original: "1".into(), definition: "1".into() }];
        assert!(substitute_body(&define, &args, 1).is_err());
    }
}
