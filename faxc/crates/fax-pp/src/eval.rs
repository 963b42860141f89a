//! `#if`/`#elif` constant-expression evaluator.
//!
//! Pure shunting-yard over a pre-gathered token list — gathering (which
//! needs macro expansion and the `defined` special case) lives in
//! `context.rs`; this module only does the arithmetic, so it is testable
//! without a whole `Context`.

use fax_util::error::PpError;

/// Named stack-depth boundaries, enforced to reject pathological input
/// rather than overflow the host stack.
pub const RPN_STACK_CAP: usize = 128;
pub const OPERATOR_STACK_CAP: usize = 64;
pub const EXPR_TOKEN_CAP: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalTok {
    Int(i64),
    LParen,
    RParen,
    Op(Op),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Ne,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Sub,
    Add,
    Mod,
    Div,
    Mul,
    Not,
    BitNot,
    UnaryPlus,
    UnaryMinus,
}

impl Op {
    /// Precedence, low to high. Unary operators bind
    /// tightest and are right-associative; every binary operator is
    /// left-associative.
    fn precedence(self) -> u8 {
        match self {
            Op::Or => 0,
            Op::And => 1,
            Op::BitOr => 2,
            Op::BitXor => 3,
            Op::BitAnd => 4,
            Op::Ne => 5,
            Op::Eq => 6,
            Op::Lt | Op::Gt | Op::Le | Op::Ge => 7,
            Op::Shl | Op::Shr => 8,
            Op::Sub | Op::Add => 9,
            Op::Mod | Op::Div | Op::Mul => 10,
            Op::Not | Op::BitNot | Op::UnaryPlus | Op::UnaryMinus => 11,
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, Op::Not | Op::BitNot | Op::UnaryPlus | Op::UnaryMinus)
    }

    fn is_right_assoc(self) -> bool {
        self.is_unary()
    }
}

/// Converts the gathered infix tokens to RPN (shunting-yard) then
/// interprets on a 128-entry `i64` stack. Returns the boolean truth of the
/// final stack top.
pub fn evaluate(tokens: &[EvalTok]) -> Result<bool, PpError> {
    if tokens.len() > EXPR_TOKEN_CAP {
        return Err(PpError::BadConstantExpr {
            line: 0,
            reason: format!("expression exceeds {EXPR_TOKEN_CAP} tokens"),
        });
    }
    let rpn = to_rpn(tokens)?;
    let result = interpret(&rpn)?;
    Ok(result != 0)
}

fn to_rpn(tokens: &[EvalTok]) -> Result<Vec<EvalTok>, PpError> {
    let mut output = Vec::new();
    let mut operators: Vec<EvalTok> = Vec::new();

    for &tok in tokens {
        match tok {
            EvalTok::Int(_) => output.push(tok),
            EvalTok::LParen => {
                if operators.len() >= OPERATOR_STACK_CAP {
                    return Err(overflow_operators());
                }
                operators.push(tok);
            }
            EvalTok::RParen => {
                let mut found = false;
                while let Some(top) = operators.pop() {
                    if top == EvalTok::LParen {
                        found = true;
                        break;
                    }
                    output.push(top);
                }
                if !found {
                    return Err(PpError::UnmatchedRParen { line: 0 });
                }
            }
            EvalTok::Op(op) => {
                while let Some(&EvalTok::Op(top)) = operators.last() {
                    let pops = if op.is_right_assoc() {
                        top.precedence() > op.precedence()
                    } else {
                        top.precedence() >= op.precedence()
                    };
                    if !pops {
                        break;
                    }
                    output.push(operators.pop().unwrap());
                }
                if operators.len() >= OPERATOR_STACK_CAP {
                    return Err(overflow_operators());
                }
                operators.push(tok);
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top == EvalTok::LParen {
            return Err(PpError::UnmatchedLParen { line: 0 });
        }
        output.push(top);
    }

    Ok(output)
}

fn overflow_operators() -> PpError {
    PpError::BadConstantExpr {
        line: 0,
        reason: format!("operator stack exceeds {OPERATOR_STACK_CAP} entries"),
    }
}

fn interpret(rpn: &[EvalTok]) -> Result<i64, PpError> {
    let mut stack: Vec<i64> = Vec::new();
    for &tok in rpn {
        match tok {
            EvalTok::Int(v) => {
                if stack.len() >= RPN_STACK_CAP {
                    return Err(PpError::BadConstantExpr {
                        line: 0,
                        reason: format!("value stack exceeds {RPN_STACK_CAP} entries"),
                    });
                }
                stack.push(v);
            }
            EvalTok::Op(op) if op.is_unary() => {
                let v = pop(&mut stack)?;
                stack.push(match op {
                    Op::Not => (v == 0) as i64,
                    Op::BitNot => !v,
                    Op::UnaryPlus => v,
                    Op::UnaryMinus => -v,
                    _ => unreachable!(),
                });
            }
            EvalTok::Op(op) => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                stack.push(apply_binary(op, lhs, rhs));
            }
            _ => {
                return Err(PpError::BadConstantExpr {
                    line: 0,
                    reason: "malformed RPN".into(),
                })
            }
        }
    }
    if stack.len() != 1 {
        return Err(PpError::BadConstantExpr {
            line: 0,
            reason: "expression does not reduce to a single value".into(),
        });
    }
    Ok(stack[0])
}

fn pop(stack: &mut Vec<i64>) -> Result<i64, PpError> {
    stack.pop().ok_or_else(|| PpError::BadConstantExpr {
        line: 0,
        reason: "operand stack underflow".into(),
    })
}

fn apply_binary(op: Op, lhs: i64, rhs: i64) -> i64 {
    match op {
        Op::Or => ((lhs != 0) || (rhs != 0)) as i64,
        Op::And => ((lhs != 0) && (rhs != 0)) as i64,
        Op::BitOr => lhs | rhs,
        Op::BitXor => lhs ^ rhs,
        Op::BitAnd => lhs & rhs,
        Op::Ne => (lhs != rhs) as i64,
        Op::Eq => (lhs == rhs) as i64,
        Op::Lt => (lhs < rhs) as i64,
        Op::Gt => (lhs > rhs) as i64,
        Op::Le => (lhs <= rhs) as i64,
        Op::Ge => (lhs >= rhs) as i64,
        Op::Shl => lhs.wrapping_shl(rhs as u32),
        Op::Shr => lhs.wrapping_shr(rhs as u32),
        Op::Sub => lhs - rhs,
        Op::Add => lhs + rhs,
        Op::Mod => lhs.checked_rem(rhs).unwrap_or(0),
        Op::Div => lhs.checked_div(rhs).unwrap_or(0),
        Op::Mul => lhs.wrapping_mul(rhs),
        _ => unreachable!("unary op reached apply_binary"),
    }
}
