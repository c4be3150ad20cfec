use momenta::{Expr, differentiate, parse_expr, simplify_fully};

fn canonical(input: &str) -> Expr {
    simplify_fully(parse_expr(input).expect("parse input"))
}

fn derive(var: &str, input: &str) -> Expr {
    simplify_fully(differentiate(var, &parse_expr(input).expect("parse input")))
}

#[test]
fn polynomial_rules() {
    assert_eq!(derive("x", "x^3"), canonical("3*x^2"));
    assert_eq!(derive("x", "x^2 + 2*x + 7"), canonical("2*x + 2"));
    assert_eq!(derive("k", "k*x^2"), canonical("x^2"));
    assert_eq!(derive("y", "k*x^2"), canonical("0"));
}

#[test]
fn product_and_quotient_rules() {
    assert_eq!(derive("x", "x*exp(x)"), canonical("x*exp(x) + exp(x)"));
    assert_eq!(derive("x", "log(x)"), canonical("1/x"));
}

#[test]
fn chain_rule_through_exp() {
    assert_eq!(derive("x", "exp(2*x)"), canonical("2*exp(2*x)"));
}
