//! The preprocessor's central orchestrator.
//!
//! `Context` owns the include stack, macro table, and filename cache, and
//! drives the pull-based token pump that `fax-calc`'s shunting-yard driver
//! calls into. Directive handling and macro expansion are the only things
//! that ever see raw (unexpanded, undispatched) tokens — everything else
//! gets a fully macro-expanded, directive-free stream out of `next_token`.

use crate::conditional::DirectiveKind;
use crate::define::{Define, MacroTable};
use crate::eval::{self, EvalTok, Op};
use crate::expand;
use crate::filename_cache::FilenameCache;
use crate::include::IncludeStack;
use fax_lex::{Token, TokenKind};
use fax_util::error::PpError;
use std::rc::Rc;

/// What kind of `#include` was written: `"file.h"` or `<file.h>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeKind {
    Local,
    System,
}

/// Supplies the bytes for an `#include`d file. `parent` is the
/// filename of the source that contains the `#include`, for resolving
/// relative paths. The returned close-callback runs exactly once, when the
/// corresponding source is popped off the include stack.
pub trait IncludeResolver {
    fn open(
        &mut self,
        kind: IncludeKind,
        filename: &str,
        parent: &str,
    ) -> Option<(Rc<str>, Box<dyn FnOnce()>)>;
}

/// Resolver for translation units that never `#include` anything — every
/// attempt fails: a missing resolver is a hard error, not a silent no-op.
#[derive(Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn open(&mut self, _kind: IncludeKind, _filename: &str, _parent: &str) -> Option<(Rc<str>, Box<dyn FnOnce()>)> {
        None
    }
}

pub struct Context {
    include_stack: IncludeStack,
    macros: MacroTable,
    filenames: FilenameCache,
    /// Sticky once set: a translation unit that has emitted one
    /// `PREPROCESSING_ERROR` stays "poisoned" for the life of the `Context`,
    /// even though the pump keeps right on running afterward.
    poisoned: bool,
    recursion_count: u32,
    asm_comments: bool,
    parsing_pragma: bool,
    disabled_file: bool,
    disabled_line: bool,
    resolver: Box<dyn IncludeResolver>,
}

impl Context {
    /// `defines` are predefined object-like macros (`-D NAME=VALUE` style),
    /// applied before the first byte of `source` is read.
    pub fn new(
        filename: &str,
        source: impl Into<Rc<str>>,
        defines: &[(String, String)],
        asm_comments: bool,
        resolver: Box<dyn IncludeResolver>,
    ) -> Result<Self, PpError> {
        let mut ctx = Self {
            include_stack: IncludeStack::new(),
            macros: MacroTable::new(),
            filenames: FilenameCache::new(),
            poisoned: false,
            recursion_count: 0,
            asm_comments,
            parsing_pragma: false,
            disabled_file: false,
            disabled_line: false,
            resolver,
        };

        let fname = ctx.filenames.intern(filename);
        ctx.include_stack.push_source(fname, source.into(), asm_comments, None);

        if !defines.is_empty() {
            let mut predef = String::new();
            for (name, value) in defines {
                predef.push_str("#define ");
                predef.push_str(name);
                if !value.is_empty() {
                    predef.push(' ');
                    predef.push_str(value);
                }
                predef.push('\n');
            }
            // Pushed *after* (so: above) the real source, which means it is
            // drained first — the predefines run before line one of `source`.
            let predef_name = ctx.filenames.intern("<command-line>");
            ctx.include_stack
                .push_source(predef_name, Rc::from(predef.as_str()), asm_comments, None);
        }

        Ok(ctx)
    }

    /// The public pump: returns the next fully-expanded,
    /// directive-free token, or `EOI` once every source is exhausted, or a
    /// single `PREPROCESSING_ERROR` token at the point a directive or
    /// expansion fails. The pump keeps running on later calls — `poisoned`
    /// just latches for [`Context::is_poisoned`] to observe afterward.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.include_stack.is_empty() {
                return Token::new(TokenKind::Eoi, "", 0);
            }

            let tok = self.next_raw_token();

            match tok.kind {
                TokenKind::Eoi => match self.include_stack.pop_source() {
                    Ok(()) => continue,
                    Err(e) => return self.poison(e, tok.line),
                },

                TokenKind::Newline => {
                    if self.parsing_pragma {
                        self.parsing_pragma = false;
                        return tok;
                    }
                    continue;
                }

                k if is_directive_tag(k) => {
                    if k == TokenKind::PpPragma {
                        // Opaque passthrough: the tag, body, and trailing
                        // newline all escape the normal swallowing.
                        self.parsing_pragma = true;
                        return tok;
                    }
                    match self.handle_directive(k, tok.line) {
                        Ok(()) => continue,
                        Err(e) => return self.poison(e, tok.line),
                    }
                }

                TokenKind::Identifier => {
                    if self.parsing_pragma {
                        return tok;
                    }
                    if self.currently_skipping() {
                        continue;
                    }
                    match expand::try_expand(self, &tok.lexeme, tok.line) {
                        Ok(true) => continue,
                        Ok(false) => return tok,
                        Err(e) => return self.poison(e, tok.line),
                    }
                }

                TokenKind::BadChars => {
                    if self.currently_skipping() {
                        continue;
                    }
                    return self.poison(PpError::BadChars { line: tok.line, text: tok.lexeme }, tok.line);
                }

                TokenKind::IncompleteComment => {
                    return self.poison(PpError::IncompleteComment { line: tok.line }, tok.line);
                }

                _ => {
                    if self.parsing_pragma {
                        return tok;
                    }
                    if self.currently_skipping() {
                        continue;
                    }
                    return tok;
                }
            }
        }
    }

    pub fn source_pos(&self) -> (Rc<str>, u32) {
        (self.current_filename(), self.current_line())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // --- crate-internal surface used by `expand`/`eval` ---

    pub(crate) fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub(crate) fn recursion_count(&self) -> u32 {
        self.recursion_count
    }

    pub(crate) fn bump_recursion(&mut self) {
        self.recursion_count += 1;
    }

    pub(crate) fn set_report_whitespace(&mut self, value: bool) {
        if let Some(state) = self.include_stack.top() {
            state.lexer.report_whitespace = value;
        }
    }

    pub(crate) fn next_raw_token(&mut self) -> Token {
        match self.include_stack.top() {
            Some(state) => match state.pushback.take() {
                Some(tok) => tok,
                None => state.lexer.next_token(),
            },
            None => Token::new(TokenKind::Eoi, "", 0),
        }
    }

    pub(crate) fn push_back_raw(&mut self, tok: Token) {
        if let Some(state) = self.include_stack.top() {
            state.pushback = Some(tok);
        }
    }

    /// Like `next_raw_token`, but swallows whitespace tokens — the only
    /// kind `report_whitespace` ever injects that directive/expr parsing
    /// cares to skip rather than see.
    fn next_significant_raw(&mut self) -> Token {
        loop {
            let tok = self.next_raw_token();
            if tok.kind != TokenKind::Whitespace {
                return tok;
            }
        }
    }

    pub(crate) fn file_disabled(&self) -> bool {
        self.disabled_file
    }

    pub(crate) fn line_disabled(&self) -> bool {
        self.disabled_line
    }

    pub(crate) fn current_filename(&self) -> Rc<str> {
        self.include_stack
            .top_ref()
            .map(|s| Rc::clone(&s.filename))
            .unwrap_or_else(|| Rc::from("<unknown>"))
    }

    pub(crate) fn current_line(&self) -> u32 {
        self.include_stack.top_ref().map(|s| s.lexer.line()).unwrap_or(0)
    }

    /// Pushes a new synthetic source frame over `text` — how a macro
    /// expansion's replacement gets re-lexed. Reuses the
    /// current frame's filename; synthetic frames never need a distinct
    /// name since they can't themselves be the target of `#include`.
    pub(crate) fn push_synthetic_frame(&mut self, text: String) {
        let filename = self.current_filename();
        self.include_stack
            .push_source(filename, Rc::from(text.as_str()), self.asm_comments, None);
    }

    fn currently_skipping(&self) -> bool {
        self.include_stack
            .top_ref()
            .map(|s| s.conditionals.currently_skipping())
            .unwrap_or(false)
    }

    fn poison(&mut self, err: PpError, line: u32) -> Token {
        self.poisoned = true;
        Token::new(TokenKind::PreprocessingError, err.to_failstr(), line)
    }

    fn consume_to_eol(&mut self) {
        loop {
            let tok = self.next_raw_token();
            match tok.kind {
                TokenKind::Newline => break,
                TokenKind::Eoi => {
                    self.push_back_raw(tok);
                    break;
                }
                _ => {}
            }
        }
    }

    // --- directive dispatch ---

    fn handle_directive(&mut self, kind: TokenKind, line: u32) -> Result<(), PpError> {
        match kind {
            TokenKind::PpInclude => self.handle_include(line),
            TokenKind::PpLine => self.handle_line(line),
            TokenKind::PpDefine => self.handle_define(line),
            TokenKind::PpUndef => self.handle_undef(line),
            TokenKind::PpIf => self.handle_if(line),
            TokenKind::PpIfdef => self.handle_ifdef(line, true),
            TokenKind::PpIfndef => self.handle_ifdef(line, false),
            TokenKind::PpElif => self.handle_elif(line),
            TokenKind::PpElse => self.handle_else(line),
            TokenKind::PpEndif => self.handle_endif(line),
            TokenKind::PpError => self.handle_error(line),
            _ => unreachable!("non-directive kind reached handle_directive"),
        }
    }

    fn handle_include(&mut self, line: u32) -> Result<(), PpError> {
        if self.currently_skipping() {
            self.consume_to_eol();
            return Ok(());
        }

        let first = self.next_significant_raw();
        let (kind, filename) = match first.kind {
            TokenKind::StringLiteral => (IncludeKind::Local, first.lexeme.trim_matches('"').to_string()),
            TokenKind::Lt => {
                let mut name = String::new();
                loop {
                    let tok = self.next_raw_token();
                    match tok.kind {
                        TokenKind::Gt => break,
                        TokenKind::Newline | TokenKind::Eoi => {
                            self.push_back_raw(tok);
                            return Err(PpError::BadInclude { line });
                        }
                        _ => name.push_str(&tok.lexeme),
                    }
                }
                (IncludeKind::System, name)
            }
            _ => return Err(PpError::BadInclude { line }),
        };

        self.consume_to_eol();

        let parent = self.current_filename().to_string();
        match self.resolver.open(kind, &filename, &parent) {
            Some((data, close_cb)) => {
                let fname_rc = self.filenames.intern(&filename);
                self.include_stack
                    .push_source(fname_rc, data, self.asm_comments, Some(close_cb));
                Ok(())
            }
            None => Err(PpError::IncludeFailed { filename, line }),
        }
    }

    fn handle_line(&mut self, line: u32) -> Result<(), PpError> {
        if self.currently_skipping() {
            self.consume_to_eol();
            return Ok(());
        }

        let num_tok = self.next_significant_raw();
        if num_tok.kind != TokenKind::IntLiteral {
            return Err(PpError::BadLine { line });
        }
        let new_line: u32 = num_tok.lexeme.parse().map_err(|_| PpError::BadLine { line })?;

        let mut next = self.next_significant_raw();
        let new_filename = if next.kind == TokenKind::StringLiteral {
            let name = next.lexeme.trim_matches('"').to_string();
            next = self.next_significant_raw();
            Some(name)
        } else {
            None
        };

        match next.kind {
            TokenKind::Newline => {}
            TokenKind::Eoi => self.push_back_raw(next),
            _ => return Err(PpError::BadLine { line }),
        }

        if let Some(name) = new_filename {
            let rc = self.filenames.intern(&name);
            if let Some(state) = self.include_stack.top() {
                state.filename = rc;
            }
        }
        if let Some(state) = self.include_stack.top() {
            state.lexer.set_line(new_line);
        }
        Ok(())
    }

    fn handle_error(&mut self, line: u32) -> Result<(), PpError> {
        if self.currently_skipping() {
            self.consume_to_eol();
            return Ok(());
        }
        self.set_report_whitespace(true);
        let mut message = String::new();
        loop {
            let tok = self.next_raw_token();
            match tok.kind {
                TokenKind::Newline => break,
                TokenKind::Eoi => {
                    self.push_back_raw(tok);
                    break;
                }
                TokenKind::Whitespace => message.push(' '),
                _ => message.push_str(&tok.lexeme),
            }
        }
        self.set_report_whitespace(false);
        Err(PpError::UserError {
            line,
            message: message.trim().to_string(),
        })
    }

    fn handle_define(&mut self, line: u32) -> Result<(), PpError> {
        if self.currently_skipping() {
            self.consume_to_eol();
            return Ok(());
        }

        let name_tok = self.next_significant_raw();
        if name_tok.kind != TokenKind::Identifier {
            return Err(PpError::BadDefine {
                line,
                reason: "expected identifier after #define".into(),
            });
        }
        if name_tok.lexeme == "defined" {
            return Err(PpError::DefinedIsReserved { line });
        }

        // Function-like iff `(` follows with *no* intervening whitespace —
        // so the lookahead must see raw whitespace tokens to tell.
        self.set_report_whitespace(true);
        let lookahead = self.next_raw_token();
        let (parameters, paramcount) = if lookahead.kind == TokenKind::LParen {
            self.parse_param_list(line)?
        } else {
            self.push_back_raw(lookahead);
            (Vec::new(), 0)
        };
        self.set_report_whitespace(false);

        let mut replacement = Vec::new();
        loop {
            let tok = self.next_raw_token();
            match tok.kind {
                TokenKind::Newline => break,
                TokenKind::Eoi => {
                    self.push_back_raw(tok);
                    break;
                }
                _ => replacement.push(tok),
            }
        }

        if replacement.first().map(|t| t.kind) == Some(TokenKind::HashHash) {
            return Err(PpError::DanglingConcat { line, position: "start" });
        }
        if replacement.last().map(|t| t.kind) == Some(TokenKind::HashHash) {
            return Err(PpError::DanglingConcat { line, position: "end" });
        }

        let definition = replacement
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let define = Define {
            identifier: name_tok.lexeme.clone(),
            definition,
            original: None,
            parameters,
            paramcount,
        };

        self.macros
            .add_define(define)
            .map_err(|d| PpError::DuplicateDefine { name: d.identifier, line })
    }

    fn parse_param_list(&mut self, line: u32) -> Result<(Vec<String>, i32), PpError> {
        let mut params = Vec::new();
        let first = self.next_significant_raw();
        if first.kind == TokenKind::RParen {
            return Ok((params, -1));
        }
        if first.kind != TokenKind::Identifier {
            return Err(PpError::BadDefine {
                line,
                reason: "expected parameter name".into(),
            });
        }
        params.push(first.lexeme.clone());

        loop {
            let tok = self.next_significant_raw();
            match tok.kind {
                TokenKind::RParen => break,
                TokenKind::Comma => {
                    let ident = self.next_significant_raw();
                    if ident.kind != TokenKind::Identifier {
                        return Err(PpError::BadDefine {
                            line,
                            reason: "expected parameter name".into(),
                        });
                    }
                    params.push(ident.lexeme.clone());
                }
                _ => {
                    return Err(PpError::BadDefine {
                        line,
                        reason: "malformed parameter list".into(),
                    })
                }
            }
        }

        let count = params.len() as i32;
        Ok((params, count))
    }

    fn handle_undef(&mut self, line: u32) -> Result<(), PpError> {
        if self.currently_skipping() {
            self.consume_to_eol();
            return Ok(());
        }

        let tok = self.next_significant_raw();
        if tok.kind != TokenKind::Identifier {
            return Err(PpError::BadUndef { line });
        }
        let name = tok.lexeme.clone();

        let next = self.next_significant_raw();
        match next.kind {
            TokenKind::Newline => {}
            TokenKind::Eoi => self.push_back_raw(next),
            _ => return Err(PpError::BadUndef { line }),
        }

        if name == "__FILE__" {
            self.disabled_file = true;
        }
        if name == "__LINE__" {
            self.disabled_line = true;
        }
        self.macros.remove_define(&name);
        Ok(())
    }

    fn handle_if(&mut self, line: u32) -> Result<(), PpError> {
        let skip_entirely = self.currently_skipping();
        let condition = if skip_entirely {
            self.consume_to_eol();
            false
        } else {
            self.evaluate_conditional_expr(line)?
        };
        if let Some(state) = self.include_stack.top() {
            state.conditionals.push_if(DirectiveKind::If, line, condition);
        }
        Ok(())
    }

    fn handle_ifdef(&mut self, line: u32, want_defined: bool) -> Result<(), PpError> {
        let skip_entirely = self.currently_skipping();
        let condition = if skip_entirely {
            self.consume_to_eol();
            false
        } else {
            let tok = self.next_significant_raw();
            if tok.kind != TokenKind::Identifier {
                return Err(PpError::BadConstantExpr {
                    line,
                    reason: "expected identifier after #ifdef/#ifndef".into(),
                });
            }
            let defined = self.is_name_defined(&tok.lexeme);
            self.consume_to_eol();
            if want_defined {
                defined
            } else {
                !defined
            }
        };
        let kind = if want_defined { DirectiveKind::Ifdef } else { DirectiveKind::Ifndef };
        if let Some(state) = self.include_stack.top() {
            state.conditionals.push_if(kind, line, condition);
        }
        Ok(())
    }

    fn handle_elif(&mut self, line: u32) -> Result<(), PpError> {
        let state = match self.include_stack.top_ref() {
            Some(s) => s,
            None => return Err(PpError::DirectiveWithoutIf { directive: "elif", line }),
        };
        let top_cond = state
            .conditionals
            .top()
            .ok_or(PpError::DirectiveWithoutIf { directive: "elif", line })?;
        if top_cond.kind == DirectiveKind::Else {
            return Err(PpError::ElifAfterElse { line });
        }
        let skip_eval = top_cond.ancestor_skipping || top_cond.chosen;

        let condition = if skip_eval {
            self.consume_to_eol();
            false
        } else {
            self.evaluate_conditional_expr(line)?
        };

        let state = self
            .include_stack
            .top()
            .ok_or(PpError::DirectiveWithoutIf { directive: "elif", line })?;
        state
            .conditionals
            .elif(line, condition)
            .map_err(|_| PpError::ElifAfterElse { line })
    }

    fn handle_else(&mut self, line: u32) -> Result<(), PpError> {
        self.consume_to_eol();
        let state = self
            .include_stack
            .top()
            .ok_or(PpError::DirectiveWithoutIf { directive: "else", line })?;
        state
            .conditionals
            .else_branch(line)
            .map_err(|_| PpError::ElseAfterElse { line })
    }

    fn handle_endif(&mut self, line: u32) -> Result<(), PpError> {
        self.consume_to_eol();
        let state = self
            .include_stack
            .top()
            .ok_or(PpError::DirectiveWithoutIf { directive: "endif", line })?;
        state
            .conditionals
            .pop_endif()
            .map_err(|_| PpError::DirectiveWithoutIf { directive: "endif", line })
    }

    fn is_name_defined(&self, name: &str) -> bool {
        self.macros.find_define(name).is_some()
            || (name == "__FILE__" && !self.disabled_file)
            || (name == "__LINE__" && !self.disabled_line)
    }

    /// Gathers the `#if`/`#elif` expression into [`EvalTok`]s (macro-expanding
    /// identifiers and special-casing `defined`/`defined(...)`), then hands
    /// them to [`eval::evaluate`].
    fn evaluate_conditional_expr(&mut self, line: u32) -> Result<bool, PpError> {
        let mut toks: Vec<EvalTok> = Vec::new();
        let mut prev_was_operand = false;

        loop {
            let raw = self.next_significant_raw();
            match raw.kind {
                TokenKind::Newline => break,
                TokenKind::Eoi => {
                    self.push_back_raw(raw);
                    break;
                }
                TokenKind::Identifier if raw.lexeme == "defined" => {
                    let defined = self.read_defined_operand(line)?;
                    toks.push(EvalTok::Int(defined as i64));
                    prev_was_operand = true;
                }
                TokenKind::Identifier => match expand::try_expand(self, &raw.lexeme, raw.line)? {
                    true => continue,
                    false => {
                        toks.push(EvalTok::Int(0));
                        prev_was_operand = true;
                    }
                },
                TokenKind::IntLiteral => {
                    toks.push(EvalTok::Int(parse_int_literal(&raw.lexeme, line)?));
                    prev_was_operand = true;
                }
                TokenKind::LParen => {
                    toks.push(EvalTok::LParen);
                    prev_was_operand = false;
                }
                TokenKind::RParen => {
                    toks.push(EvalTok::RParen);
                    prev_was_operand = true;
                }
                TokenKind::Plus => {
                    toks.push(EvalTok::Op(if prev_was_operand { Op::Add } else { Op::UnaryPlus }));
                    prev_was_operand = false;
                }
                TokenKind::Minus => {
                    toks.push(EvalTok::Op(if prev_was_operand { Op::Sub } else { Op::UnaryMinus }));
                    prev_was_operand = false;
                }
                TokenKind::Bang => {
                    toks.push(EvalTok::Op(Op::Not));
                    prev_was_operand = false;
                }
                TokenKind::Tilde => {
                    toks.push(EvalTok::Op(Op::BitNot));
                    prev_was_operand = false;
                }
                TokenKind::Star => {
                    toks.push(EvalTok::Op(Op::Mul));
                    prev_was_operand = false;
                }
                TokenKind::Slash => {
                    toks.push(EvalTok::Op(Op::Div));
                    prev_was_operand = false;
                }
                TokenKind::Percent => {
                    toks.push(EvalTok::Op(Op::Mod));
                    prev_was_operand = false;
                }
                TokenKind::Shl => {
                    toks.push(EvalTok::Op(Op::Shl));
                    prev_was_operand = false;
                }
                TokenKind::Shr => {
                    toks.push(EvalTok::Op(Op::Shr));
                    prev_was_operand = false;
                }
                TokenKind::Lt => {
                    toks.push(EvalTok::Op(Op::Lt));
                    prev_was_operand = false;
                }
                TokenKind::Gt => {
                    toks.push(EvalTok::Op(Op::Gt));
                    prev_was_operand = false;
                }
                TokenKind::Le => {
                    toks.push(EvalTok::Op(Op::Le));
                    prev_was_operand = false;
                }
                TokenKind::Ge => {
                    toks.push(EvalTok::Op(Op::Ge));
                    prev_was_operand = false;
                }
                TokenKind::EqEq => {
                    toks.push(EvalTok::Op(Op::Eq));
                    prev_was_operand = false;
                }
                TokenKind::Ne => {
                    toks.push(EvalTok::Op(Op::Ne));
                    prev_was_operand = false;
                }
                TokenKind::Amp => {
                    toks.push(EvalTok::Op(Op::BitAnd));
                    prev_was_operand = false;
                }
                TokenKind::Caret => {
                    toks.push(EvalTok::Op(Op::BitXor));
                    prev_was_operand = false;
                }
                TokenKind::Pipe => {
                    toks.push(EvalTok::Op(Op::BitOr));
                    prev_was_operand = false;
                }
                TokenKind::AndAnd => {
                    toks.push(EvalTok::Op(Op::And));
                    prev_was_operand = false;
                }
                TokenKind::OrOr => {
                    toks.push(EvalTok::Op(Op::Or));
                    prev_was_operand = false;
                }
                other => {
                    return Err(PpError::BadConstantExpr {
                        line,
                        reason: format!("unexpected token {other:?} in constant expression"),
                    })
                }
            }
        }

        eval::evaluate(&toks)
    }

    fn read_defined_operand(&mut self, line: u32) -> Result<bool, PpError> {
        let tok = self.next_significant_raw();
        let name = if tok.kind == TokenKind::LParen {
            let ident = self.next_significant_raw();
            if ident.kind != TokenKind::Identifier {
                return Err(PpError::BadDefinedOperator { line });
            }
            let close = self.next_significant_raw();
            if close.kind != TokenKind::RParen {
                return Err(PpError::BadDefinedOperator { line });
            }
            ident.lexeme
        } else if tok.kind == TokenKind::Identifier {
            tok.lexeme
        } else {
            return Err(PpError::BadDefinedOperator { line });
        };
        Ok(self.is_name_defined(&name))
    }
}

fn is_directive_tag(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::PpInclude
            | TokenKind::PpLine
            | TokenKind::PpDefine
            | TokenKind::PpUndef
            | TokenKind::PpIf
            | TokenKind::PpIfdef
            | TokenKind::PpIfndef
            | TokenKind::PpElif
            | TokenKind::PpElse
            | TokenKind::PpEndif
            | TokenKind::PpError
            | TokenKind::PpPragma
    )
}

fn parse_int_literal(lexeme: &str, line: u32) -> Result<i64, PpError> {
    let trimmed = lexeme.trim_end_matches(['u', 'U', 'l', 'L']);
    let parsed = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        i64::from_str_radix(&trimmed[1..], 8)
    } else {
        trimmed.parse::<i64>()
    };
    parsed.map_err(|_| PpError::BadConstantExpr {
        line,
        reason: format!("invalid integer literal `{lexeme}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(source: &str) -> Context {
        Context::new("test.c", Rc::from(source), &[], false, Box::new(NoIncludes)).unwrap()
    }

    fn collect(ctx: &mut Context) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let tok = ctx.next_token();
            if tok.kind == TokenKind::Eoi {
                break;
            }
            out.push(tok);
        }
        out
    }

    fn lexemes(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.lexeme.as_str()).collect()
    }

    #[test]
    fn object_like_macro_expands_in_place() {
        let mut ctx = ctx("#define A 2\n#define B 3\nA+B\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["2", "+", "3"]);
    }

    #[test]
    fn function_like_macro_substitutes_arguments() {
        let mut ctx = ctx("#define SQ(x) ((x)*(x))\nSQ(1+2)\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["(", "(", "1", "+", "2", ")", "*", "(", "1", "+", "2", ")", ")"]);
    }

    #[test]
    fn stringify_operator_quotes_the_raw_argument() {
        let mut ctx = ctx("#define STR(x) #x\nSTR(hello world)\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["\"hello world\""]);
    }

    #[test]
    fn concat_operator_joins_tokens() {
        let mut ctx = ctx("#define CAT(a,b) a##b\nCAT(foo,bar)\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["foobar"]);
    }

    #[test]
    fn if_defined_picks_the_else_branch_when_undefined() {
        let mut ctx = ctx("#if defined(X)\nyes\n#else\nno\n#endif\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["no"]);
    }

    #[test]
    fn if_constant_expression_evaluates_correctly() {
        let mut ctx = ctx("#if 1+2*3 == 7\nok\n#endif\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["ok"]);
    }

    #[test]
    fn line_directive_changes_reported_line() {
        let mut ctx = ctx("#line 100\nX\n");
        let tok = ctx.next_token();
        assert_eq!(tok.line, 100);
    }

    #[test]
    fn error_directive_poisons_context_and_emits_error_token() {
        let mut ctx = ctx("#error boom\nafter\n");
        let tok = ctx.next_token();
        assert_eq!(tok.kind, TokenKind::PreprocessingError);
        assert!(tok.lexeme.contains("boom"));
        assert!(ctx.is_poisoned());
    }

    #[test]
    fn undef_then_reuse_is_not_a_macro() {
        let mut ctx = ctx("#define A 1\n#undef A\nA\n");
        let toks = collect(&mut ctx);
        assert_eq!(lexemes(&toks), vec!["A"]);
    }

    #[test]
    fn pragma_body_passes_through_unexpanded() {
        let mut ctx = ctx("#define X 9\n#pragma once X\nY\n");
        let toks = collect(&mut ctx);
        let idents: Vec<&str> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.lexeme.as_str())
            .collect();
        // `X` inside the pragma body is NOT macro-expanded.
        assert_eq!(idents, vec!["once", "X", "Y"]);
    }
}
