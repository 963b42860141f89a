//! Calculator AST: a closed sum type in place of a common header struct
//! with cast-based subclassing.
//!
//! Leaves that carry text (`Id`, `StrLit`) hold an owned `Rc<str>`
//! directly rather than a symbol into a shared cache — the calculator has
//! no symbol table of its own, and `Display` needs the text without an
//! extra cache parameter.

use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Plus,
    Minus,
}

impl UnaryOp {
    fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
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
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Ne => "!=",
            BinaryOp::Eq => "==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Sub => "-",
            BinaryOp::Add => "+",
            BinaryOp::Mod => "%",
            BinaryOp::Div => "/",
            BinaryOp::Mul => "*",
        }
    }
}

/// Unary/binary/ternary nodes and identifier/literal leaves.
#[derive(Clone, Debug)]
pub enum Expr {
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Id(Rc<str>),
    IntLit(i64),
    FloatLit(f64),
    StrLit(Rc<str>),
}

impl Expr {
    /// Numeric evaluation: arithmetic in `f64`; bitwise,
    /// shift, and modulo coerce to `i64` then back to `f64`; logical ops
    /// yield 1.0/0.0; `a ? b : c` picks by `a != 0.0`. Division by zero
    /// and out-of-range shifts are deliberately left unchecked.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::IntLit(v) => *v as f64,
            Expr::FloatLit(v) => *v,
            // Neither identifiers nor string literals carry a numeric
            // value in this calculator; both evaluate to 0, matching how
            // an unresolved identifier evaluates in a `#if` expression.
            Expr::Id(_) | Expr::StrLit(_) => 0.0,
            Expr::Unary(op, child) => {
                let v = child.eval();
                match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                    UnaryOp::Not => bool_f64(v == 0.0),
                    UnaryOp::BitNot => !as_i64(v) as f64,
                }
            }
            Expr::Binary(op, l, r) => {
                let lv = l.eval();
                let rv = r.eval();
                match op {
                    BinaryOp::Add => lv + rv,
                    BinaryOp::Sub => lv - rv,
                    BinaryOp::Mul => lv * rv,
                    BinaryOp::Div => lv / rv,
                    BinaryOp::Mod => as_i64(lv).checked_rem(as_i64(rv)).unwrap_or(0) as f64,
                    BinaryOp::Shl => as_i64(lv).wrapping_shl(as_i64(rv) as u32) as f64,
                    BinaryOp::Shr => as_i64(lv).wrapping_shr(as_i64(rv) as u32) as f64,
                    BinaryOp::BitOr => (as_i64(lv) | as_i64(rv)) as f64,
                    BinaryOp::BitXor => (as_i64(lv) ^ as_i64(rv)) as f64,
                    BinaryOp::BitAnd => (as_i64(lv) & as_i64(rv)) as f64,
                    BinaryOp::Eq => bool_f64(lv == rv),
                    BinaryOp::Ne => bool_f64(lv != rv),
                    BinaryOp::Lt => bool_f64(lv < rv),
                    BinaryOp::Gt => bool_f64(lv > rv),
                    BinaryOp::Le => bool_f64(lv <= rv),
                    BinaryOp::Ge => bool_f64(lv >= rv),
                    BinaryOp::Or => bool_f64(lv != 0.0 || rv != 0.0),
                    BinaryOp::And => bool_f64(lv != 0.0 && rv != 0.0),
                }
            }
            Expr::Ternary(cond, then_branch, else_branch) => {
                if cond.eval() != 0.0 {
                    then_branch.eval()
                } else {
                    else_branch.eval()
                }
            }
        }
    }
}

fn as_i64(v: f64) -> i64 {
    v as i64
}

fn bool_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(v) => write!(f, "{v}"),
            Expr::FloatLit(v) => write!(f, "{v}"),
            Expr::StrLit(s) => write!(f, "\"{s}\""),
            Expr::Id(name) => write!(f, "{name}"),
            Expr::Unary(op, child) => write!(f, "({} {child})", op.symbol()),
            Expr::Binary(op, l, r) => write!(f, "({} {l} {r})", op.symbol()),
            Expr::Ternary(c, t, e) => write!(f, "(?: {c} {t} {e})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_done_in_f64() {
        let e = Expr::Binary(
            BinaryOp::Add,
            Box::new(Expr::IntLit(1)),
            Box::new(Expr::Binary(BinaryOp::Mul, Box::new(Expr::IntLit(2)), Box::new(Expr::IntLit(3)))),
        );
        assert_eq!(e.eval(), 7.0);
    }

    #[test]
    fn ternary_picks_by_nonzero_condition() {
        let e = Expr::Ternary(
            Box::new(Expr::Binary(BinaryOp::Lt, Box::new(Expr::IntLit(1)), Box::new(Expr::IntLit(2)))),
            Box::new(Expr::IntLit(10)),
            Box::new(Expr::IntLit(20)),
        );
        assert_eq!(e.eval(), 10.0);
    }

    #[test]
    fn modulo_coerces_through_i64() {
        let e = Expr::Binary(BinaryOp::Mod, Box::new(Expr::IntLit(5)), Box::new(Expr::IntLit(2)));
        assert_eq!(e.eval(), 1.0);
    }

    #[test]
    fn bitnot_coerces_through_i64() {
        let e = Expr::Unary(UnaryOp::BitNot, Box::new(Expr::IntLit(0)));
        assert_eq!(e.eval(), -1.0);
    }

    #[test]
    fn display_prints_a_structural_prefix_form() {
        let e = Expr::Binary(BinaryOp::Add, Box::new(Expr::IntLit(1)), Box::new(Expr::IntLit(2)));
        assert_eq!(e.to_string(), "(+ 1 2)");
    }
}
