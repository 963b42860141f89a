//! Top-level one-shot preprocessing API: drains a [`Context`]'s
//! token pump into a flat text buffer and an accumulated diagnostic list.

use crate::context::{Context, IncludeResolver};
use fax_lex::TokenKind;
use fax_util::error::PpError;
use std::rc::Rc;

/// One accumulated `(filename, line, message)` triple.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub filename: Rc<str>,
    pub line: u32,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreprocessResult {
    pub output: String,
    pub errors: Vec<Diagnostic>,
}

const INDENT_UNIT: &str = "    ";

/// Streams the full pump output into `output`, inserting newlines after `;`
/// and around `{ … }` with indent. Directive/expansion errors
/// are accumulated rather than aborting the run — only `OutOfMemory` (via
/// `Context::new`'s `Result`) short-circuits before any output is produced.
pub fn preprocess(
    filename: &str,
    source: impl Into<Rc<str>>,
    defines: &[(String, String)],
    asm_comments: bool,
    resolver: Box<dyn IncludeResolver>,
) -> Result<PreprocessResult, PpError> {
    let mut ctx = Context::new(filename, source, defines, asm_comments, resolver)?;
    let mut output = String::new();
    let mut errors = Vec::new();
    let mut indent: u32 = 0;

    loop {
        let tok = ctx.next_token();
        match tok.kind {
            TokenKind::Eoi => break,

            TokenKind::PreprocessingError => {
                let (filename, _) = ctx.source_pos();
                errors.push(Diagnostic {
                    filename,
                    line: tok.line,
                    message: tok.lexeme,
                });
            }

            // Only reachable via `#pragma` passthrough.
            TokenKind::Newline => output.push('\n'),

            TokenKind::LBrace => {
                push_spaced(&mut output, &tok.lexeme);
                indent += 1;
                output.push('\n');
                push_indent(&mut output, indent);
            }

            TokenKind::RBrace => {
                indent = indent.saturating_sub(1);
                trim_trailing_blank_line(&mut output);
                output.push('\n');
                push_indent(&mut output, indent);
                output.push_str(&tok.lexeme);
                output.push('\n');
                push_indent(&mut output, indent);
            }

            TokenKind::Semicolon => {
                output.push_str(&tok.lexeme);
                output.push('\n');
                push_indent(&mut output, indent);
            }

            _ => push_spaced(&mut output, &tok.lexeme),
        }
    }

    Ok(PreprocessResult {
        output: output.trim_end_matches(|c: char| c == ' ' || c == '\n').to_string(),
        errors,
    })
}

fn push_spaced(out: &mut String, text: &str) {
    if !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str(text);
}

fn push_indent(out: &mut String, level: u32) {
    for _ in 0..level {
        out.push_str(INDENT_UNIT);
    }
}

fn trim_trailing_blank_line(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoIncludes;

    fn run(source: &str) -> PreprocessResult {
        preprocess("test.c", Rc::from(source), &[], false, Box::new(NoIncludes)).unwrap()
    }

    #[test]
    fn object_like_macros_expand_and_join_with_spaces() {
        let r = run("#define A 2\n#define B 3\nA+B\n");
        assert_eq!(r.output, "2 + 3");
        assert!(r.errors.is_empty());
    }

    #[test]
    fn function_like_macro_expands_arguments() {
        let r = run("#define SQ(x) ((x)*(x))\nSQ(1+2)\n");
        assert_eq!(r.output, "( ( 1 + 2 ) * ( 1 + 2 ) )");
    }

    #[test]
    fn stringify_operator() {
        let r = run("#define STR(x) #x\nSTR(hello world)\n");
        assert_eq!(r.output, "\"hello world\"");
    }

    #[test]
    fn concat_operator() {
        let r = run("#define CAT(a,b) a##b\nCAT(foo,bar)\n");
        assert_eq!(r.output, "foobar");
    }

    #[test]
    fn conditional_picks_else_branch() {
        let r = run("#if defined(X)\nyes\n#else\nno\n#endif\n");
        assert_eq!(r.output, "no");
    }

    #[test]
    fn conditional_expression_is_evaluated() {
        let r = run("#if 1+2*3 == 7\nok\n#endif\n");
        assert_eq!(r.output, "ok");
    }

    #[test]
    fn error_directive_is_accumulated_not_fatal() {
        let r = run("#error boom\nafter\n");
        assert_eq!(r.errors.len(), 1);
        assert!(r.errors[0].message.contains("boom"));
        assert_eq!(r.output, "after");
    }

    #[test]
    fn semicolons_and_braces_get_newlines_and_indent() {
        let r = run("int f(){x=1;y=2;}\n");
        assert!(r.output.contains("x = 1;\n"));
        assert!(r.output.contains("{\n"));
    }
}
