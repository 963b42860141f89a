//! Shunting-yard parser that builds an [`Expr`] AST directly from a
//! preprocessed token stream.
//!
//! A real driver's LALR parser is treated here as an opaque collaborator
//! whose *contract* — feed tokens in, get a completed AST out — matters,
//! not its generated tables. This builds that contract with
//! the same shunting-yard machinery `fax_pp::eval` already uses for `#if`
//! expressions, extended two ways: operands are AST nodes instead of bare
//! `i64`s, and the operator stack carries a ternary marker so `a ? b : c`
//! can be built without a second pass.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use fax_pp::Context;
use fax_util::error::CalcError;
use fax_lex::TokenKind;
use std::rc::Rc;

/// Boundaries mirroring `fax_pp::eval`'s.
pub const OPERATOR_STACK_CAP: usize = 64;
pub const OPERAND_STACK_CAP: usize = 128;
pub const EXPR_TOKEN_CAP: usize = 128;

#[derive(Clone, Debug, PartialEq)]
enum InTok {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Id(Rc<str>),
    LParen,
    RParen,
    QuestionMark,
    Colon,
    Op(BinOrUn),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOrUn {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

/// Operator-stack entries: ordinary operators plus the two-state ternary
/// marker. `TernaryOpen` becomes `TernaryReady` once its `:` is seen;
/// popping a still-`TernaryOpen` marker (end of input, or an enclosing
/// `)`) means the `:` was never found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StackOp {
    Binary(BinaryOp),
    Unary(UnaryOp),
    TernaryOpen,
    TernaryReady,
}

impl StackOp {
    /// Precedence, low to high, matching C's `#if`-expression table with the
    /// ternary grafted on beneath `||`, where C's own grammar places it.
    fn precedence(self) -> i8 {
        match self {
            StackOp::TernaryOpen | StackOp::TernaryReady => -1,
            StackOp::Binary(BinaryOp::Or) => 0,
            StackOp::Binary(BinaryOp::And) => 1,
            StackOp::Binary(BinaryOp::BitOr) => 2,
            StackOp::Binary(BinaryOp::BitXor) => 3,
            StackOp::Binary(BinaryOp::BitAnd) => 4,
            StackOp::Binary(BinaryOp::Ne) => 5,
            StackOp::Binary(BinaryOp::Eq) => 6,
            StackOp::Binary(BinaryOp::Lt)
            | StackOp::Binary(BinaryOp::Gt)
            | StackOp::Binary(BinaryOp::Le)
            | StackOp::Binary(BinaryOp::Ge) => 7,
            StackOp::Binary(BinaryOp::Shl) | StackOp::Binary(BinaryOp::Shr) => 8,
            StackOp::Binary(BinaryOp::Sub) | StackOp::Binary(BinaryOp::Add) => 9,
            StackOp::Binary(BinaryOp::Mod) | StackOp::Binary(BinaryOp::Div) | StackOp::Binary(BinaryOp::Mul) => 10,
            StackOp::Unary(_) => 11,
        }
    }

    fn is_right_assoc(self) -> bool {
        matches!(self, StackOp::Unary(_) | StackOp::TernaryOpen | StackOp::TernaryReady)
    }
}

/// What gets appended to the output queue — one entry per eventual AST
/// reduction step.
#[derive(Clone, Debug)]
enum OutTok {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Id(Rc<str>),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Ternary,
}

/// Parses one line already run through a [`Context`]: drains its token
/// pump, maps each token into the calculator's grammar, and builds the
/// completed [`Expr`].
pub fn parse(ctx: &mut Context) -> Result<Expr, CalcError> {
    let tokens = gather(ctx)?;
    let rpn = to_rpn(&tokens)?;
    build(&rpn)
}

fn gather(ctx: &mut Context) -> Result<Vec<InTok>, CalcError> {
    let mut out = Vec::new();
    // Tracks whether the previous significant token was an operand, to
    // disambiguate unary `+`/`-`/`!`/`~` from binary, the same rule
    // `fax_pp::context` uses for `#if` expressions.
    let mut prev_was_operand = false;

    loop {
        let tok = ctx.next_token();
        match tok.kind {
            TokenKind::Eoi => break,
            TokenKind::Newline | TokenKind::Whitespace => continue,
            TokenKind::PreprocessingError => {
                return Err(CalcError::UnexpectedToken(tok.lexeme));
            }
            TokenKind::IntLiteral => {
                out.push(InTok::Int(parse_int_literal(&tok.lexeme)));
                prev_was_operand = true;
            }
            TokenKind::FloatLiteral => {
                out.push(InTok::Float(parse_float_literal(&tok.lexeme)));
                prev_was_operand = true;
            }
            TokenKind::StringLiteral => {
                out.push(InTok::Str(Rc::from(strip_quotes(&tok.lexeme))));
                prev_was_operand = true;
            }
            TokenKind::Identifier => {
                out.push(InTok::Id(Rc::from(tok.lexeme.as_str())));
                prev_was_operand = true;
            }
            TokenKind::LParen => {
                out.push(InTok::LParen);
                prev_was_operand = false;
            }
            TokenKind::RParen => {
                out.push(InTok::RParen);
                prev_was_operand = true;
            }
            TokenKind::Question => {
                out.push(InTok::QuestionMark);
                prev_was_operand = false;
            }
            TokenKind::Colon => {
                out.push(InTok::Colon);
                prev_was_operand = false;
            }
            TokenKind::Bang => {
                out.push(InTok::Op(BinOrUn::Unary(UnaryOp::Not)));
                prev_was_operand = false;
            }
            TokenKind::Tilde => {
                out.push(InTok::Op(BinOrUn::Unary(UnaryOp::BitNot)));
                prev_was_operand = false;
            }
            TokenKind::Plus => {
                out.push(if prev_was_operand {
                    InTok::Op(BinOrUn::Binary(BinaryOp::Add))
                } else {
                    InTok::Op(BinOrUn::Unary(UnaryOp::Plus))
                });
                prev_was_operand = false;
            }
            TokenKind::Minus => {
                out.push(if prev_was_operand {
                    InTok::Op(BinOrUn::Binary(BinaryOp::Sub))
                } else {
                    InTok::Op(BinOrUn::Unary(UnaryOp::Minus))
                });
                prev_was_operand = false;
            }
            TokenKind::Star => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Mul),
            TokenKind::Slash => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Div),
            TokenKind::Percent => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Mod),
            TokenKind::Lt => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Lt),
            TokenKind::Gt => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Gt),
            TokenKind::Le => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Le),
            TokenKind::Ge => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Ge),
            TokenKind::EqEq => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Eq),
            TokenKind::Ne => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Ne),
            TokenKind::AndAnd => push_binary(&mut out, &mut prev_was_operand, BinaryOp::And),
            TokenKind::OrOr => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Or),
            TokenKind::Amp => push_binary(&mut out, &mut prev_was_operand, BinaryOp::BitAnd),
            TokenKind::Pipe => push_binary(&mut out, &mut prev_was_operand, BinaryOp::BitOr),
            TokenKind::Caret => push_binary(&mut out, &mut prev_was_operand, BinaryOp::BitXor),
            TokenKind::Shl => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Shl),
            TokenKind::Shr => push_binary(&mut out, &mut prev_was_operand, BinaryOp::Shr),
            other => return Err(CalcError::UnexpectedToken(format!("{other:?}"))),
        }
        if out.len() > EXPR_TOKEN_CAP {
            return Err(CalcError::ExpressionTooLong { limit: EXPR_TOKEN_CAP });
        }
    }
    Ok(out)
}

fn push_binary(out: &mut Vec<InTok>, prev_was_operand: &mut bool, op: BinaryOp) {
    out.push(InTok::Op(BinOrUn::Binary(op)));
    *prev_was_operand = false;
}

fn strip_quotes(lexeme: &str) -> &str {
    lexeme.trim_matches('"')
}

fn parse_int_literal(lexeme: &str) -> i64 {
    let trimmed = lexeme.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        i64::from_str_radix(&trimmed[1..], 8).unwrap_or(0)
    } else {
        trimmed.parse().unwrap_or(0)
    }
}

fn parse_float_literal(lexeme: &str) -> f64 {
    lexeme.trim_end_matches(['f', 'F', 'l', 'L']).parse().unwrap_or(0.0)
}

fn to_rpn(tokens: &[InTok]) -> Result<Vec<OutTok>, CalcError> {
    let mut output = Vec::new();
    let mut operators: Vec<StackOpOrParen> = Vec::new();

    for tok in tokens {
        match tok {
            InTok::Int(v) => output.push(OutTok::Int(*v)),
            InTok::Float(v) => output.push(OutTok::Float(*v)),
            InTok::Str(s) => output.push(OutTok::Str(Rc::clone(s))),
            InTok::Id(s) => output.push(OutTok::Id(Rc::clone(s))),
            InTok::LParen => {
                push_operator_stack(&mut operators, StackOpOrParen::LParen)?;
            }
            InTok::RParen => {
                loop {
                    match operators.pop() {
                        Some(StackOpOrParen::LParen) => break,
                        Some(StackOpOrParen::Op(StackOp::TernaryOpen)) => {
                            return Err(CalcError::MissingTernaryColon)
                        }
                        Some(StackOpOrParen::Op(op)) => output.push(to_out(op)),
                        None => return Err(CalcError::MismatchedParens),
                    }
                }
            }
            InTok::QuestionMark => {
                flush_to(&mut operators, &mut output, StackOp::TernaryOpen)?;
                push_operator_stack(&mut operators, StackOpOrParen::Op(StackOp::TernaryOpen))?;
            }
            InTok::Colon => {
                flush_to(&mut operators, &mut output, StackOp::TernaryOpen)?;
                match operators.last_mut() {
                    Some(StackOpOrParen::Op(op @ StackOp::TernaryOpen)) => *op = StackOp::TernaryReady,
                    _ => return Err(CalcError::UnexpectedToken(":".into())),
                }
            }
            InTok::Op(BinOrUn::Unary(u)) => {
                flush_to(&mut operators, &mut output, StackOp::Unary(*u))?;
                push_operator_stack(&mut operators, StackOpOrParen::Op(StackOp::Unary(*u)))?;
            }
            InTok::Op(BinOrUn::Binary(b)) => {
                flush_to(&mut operators, &mut output, StackOp::Binary(*b))?;
                push_operator_stack(&mut operators, StackOpOrParen::Op(StackOp::Binary(*b)))?;
            }
        }
    }

    while let Some(entry) = operators.pop() {
        match entry {
            StackOpOrParen::LParen => return Err(CalcError::MismatchedParens),
            StackOpOrParen::Op(StackOp::TernaryOpen) => return Err(CalcError::MissingTernaryColon),
            StackOpOrParen::Op(op) => output.push(to_out(op)),
        }
    }

    Ok(output)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StackOpOrParen {
    LParen,
    Op(StackOp),
}

fn push_operator_stack(operators: &mut Vec<StackOpOrParen>, entry: StackOpOrParen) -> Result<(), CalcError> {
    if operators.len() >= OPERATOR_STACK_CAP {
        return Err(CalcError::OperatorStackOverflow { limit: OPERATOR_STACK_CAP });
    }
    operators.push(entry);
    Ok(())
}

/// Pops operators that must be reduced before `incoming` can be pushed,
/// per its precedence/associativity, same rule as `fax_pp::eval::to_rpn`.
fn flush_to(operators: &mut Vec<StackOpOrParen>, output: &mut Vec<OutTok>, incoming: StackOp) -> Result<(), CalcError> {
    while let Some(&StackOpOrParen::Op(top)) = operators.last() {
        let pops = if incoming.is_right_assoc() {
            top.precedence() > incoming.precedence()
        } else {
            top.precedence() >= incoming.precedence()
        };
        if !pops {
            break;
        }
        operators.pop();
        output.push(to_out(top));
    }
    Ok(())
}

fn to_out(op: StackOp) -> OutTok {
    match op {
        StackOp::Unary(u) => OutTok::Unary(u),
        StackOp::Binary(b) => OutTok::Binary(b),
        StackOp::TernaryOpen => unreachable!("an unresolved ternary marker never reaches the output queue"),
        StackOp::TernaryReady => OutTok::Ternary,
    }
}

fn build(rpn: &[OutTok]) -> Result<Expr, CalcError> {
    let mut stack: Vec<Expr> = Vec::new();
    for tok in rpn {
        match tok {
            OutTok::Int(v) => push_operand(&mut stack, Expr::IntLit(*v))?,
            OutTok::Float(v) => push_operand(&mut stack, Expr::FloatLit(*v))?,
            OutTok::Str(s) => push_operand(&mut stack, Expr::StrLit(Rc::clone(s)))?,
            OutTok::Id(s) => push_operand(&mut stack, Expr::Id(Rc::clone(s)))?,
            OutTok::Unary(op) => {
                let child = pop(&mut stack)?;
                push_operand(&mut stack, Expr::Unary(*op, Box::new(child)))?;
            }
            OutTok::Binary(op) => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                push_operand(&mut stack, Expr::Binary(*op, Box::new(lhs), Box::new(rhs)))?;
            }
            OutTok::Ternary => {
                let else_branch = pop(&mut stack)?;
                let then_branch = pop(&mut stack)?;
                let cond = pop(&mut stack)?;
                push_operand(
                    &mut stack,
                    Expr::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)),
                )?;
            }
        }
    }
    if stack.len() != 1 {
        return Err(CalcError::UnexpectedEnd);
    }
    Ok(stack.into_iter().next().unwrap())
}

fn push_operand(stack: &mut Vec<Expr>, expr: Expr) -> Result<(), CalcError> {
    if stack.len() >= OPERAND_STACK_CAP {
        return Err(CalcError::OperandStackOverflow { limit: OPERAND_STACK_CAP });
    }
    stack.push(expr);
    Ok(())
}

fn pop(stack: &mut Vec<Expr>) -> Result<Expr, CalcError> {
    stack.pop().ok_or(CalcError::UnexpectedEnd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fax_pp::NoIncludes;
    use std::rc::Rc as StdRc;

    fn parse_line(src: &str) -> Expr {
        let mut ctx = Context::new("<calc>", StdRc::from(src), &[], false, Box::new(NoIncludes)).unwrap();
        parse(&mut ctx).unwrap()
    }

    #[test]
    fn simple_precedence() {
        let e = parse_line("1+2*3\n");
        assert_eq!(e.eval(), 7.0);
    }

    #[test]
    fn parens_group() {
        let e = parse_line("(1+2)*3\n");
        assert_eq!(e.eval(), 9.0);
    }

    #[test]
    fn ternary_builds_three_operands() {
        let e = parse_line("(1<2)?10:20\n");
        assert_eq!(e.eval(), 10.0);
        assert_eq!(e.to_string(), "(?: (< 1 2) 10 20)");
    }

    #[test]
    fn unary_minus_binds_tighter_than_plus() {
        let e = parse_line("-1+2\n");
        assert_eq!(e.eval(), 1.0);
    }

    #[test]
    fn mismatched_rparen_is_an_error() {
        let mut ctx = Context::new("<calc>", StdRc::from("1)\n"), &[], false, Box::new(NoIncludes)).unwrap();
        assert!(parse(&mut ctx).is_err());
    }

    #[test]
    fn missing_colon_is_an_error() {
        let mut ctx = Context::new("<calc>", StdRc::from("1?2\n"), &[], false, Box::new(NoIncludes)).unwrap();
        assert!(matches!(parse(&mut ctx), Err(CalcError::MissingTernaryColon)));
    }
}
