//! Black-box coverage of the calculator evaluator's worked examples.

use fax_calc::CalcDriver;

fn eval(line: &str) -> f64 {
    CalcDriver::new().eval_line(line).unwrap().1
}

#[test]
fn precedence_example() {
    assert_eq!(eval("1+2*3"), 7.0);
}

#[test]
fn ternary_example() {
    assert_eq!(eval("(1<2) ? 10 : 20"), 10.0);
}

#[test]
fn modulo_example() {
    assert_eq!(eval("5 % 2"), 1.0);
}

#[test]
fn bitwise_not_example() {
    assert_eq!(eval("~0"), -1.0);
}

#[test]
fn nested_ternary_is_right_associative() {
    // 0 ? 1 : (1 ? 2 : 3) == 2.0
    assert_eq!(eval("0 ? 1 : 1 ? 2 : 3"), 2.0);
}

#[test]
fn expression_exceeding_the_token_cap_is_rejected() {
    let mut line = String::from("1");
    for _ in 0..200 {
        line.push_str("+1");
    }
    assert!(CalcDriver::new().eval_line(&line).is_err());
}

#[test]
fn deeply_nested_parens_overflow_the_operator_stack() {
    let mut line = String::new();
    for _ in 0..100 {
        line.push('(');
    }
    line.push('1');
    for _ in 0..100 {
        line.push(')');
    }
    assert!(CalcDriver::new().eval_line(&line).is_err());
}
