use momenta::expr::Expr;
use momenta::parse_expr;
use momenta::simplify::{expand, simplify_fully, substitute};

fn canonical(input: &str) -> Expr {
    simplify_fully(parse_expr(input).expect("parse input"))
}

fn expect_simplified(input: &str, expected: &str) {
    let actual = canonical(input);
    let expected_expr = canonical(expected);
    assert_eq!(
        actual, expected_expr,
        "simplification mismatch for {input}: got {actual:?}, expected {expected_expr:?}"
    );
}

fn expect_expanded(input: &str, expected: &str) {
    let actual = expand(parse_expr(input).expect("parse input"));
    let expected_expr = canonical(expected);
    assert_eq!(
        actual, expected_expr,
        "expansion mismatch for {input}: got {actual:?}, expected {expected_expr:?}"
    );
}

#[test]
fn canonicalization_trivial_cases() {
    let cases = vec![
        ("2*x*3", "6*x"),
        ("x*1", "x"),
        ("x + 0", "x"),
        ("0*x + 5", "5"),
        ("x/2", "1/2*x"),
        ("1 + 2*x", "2*x + 1"),
        ("2*x + 3 + x", "3*x + 3"),
        ("x*x", "x^2"),
        ("x*x^2", "x^3"),
        ("x^2*x^3", "x^5"),
        ("x^1", "x"),
        ("x^0", "1"),
        ("(x^2)^3", "x^6"),
        ("-2*x", "-2*x"),
        ("exp(0)", "1"),
        ("exp(log(x))", "x"),
        ("log(1)", "0"),
        ("log(exp(x))", "x"),
    ];

    for (input, expected) in cases {
        expect_simplified(input, expected);
    }
}

#[test]
fn expansion_to_sum_of_monomials() {
    let cases = vec![
        ("x*(x+y)", "x^2 + x*y"),
        ("2*(x+3)", "2*x + 6"),
        ("(x+1)*(x-1)", "x^2 - 1"),
        ("(x+y)^2", "x^2 + 2*x*y + y^2"),
        ("(x+1)^3", "x^3 + 3*x^2 + 3*x + 1"),
        ("(x+y)*(x-y)", "x^2 - y^2"),
        ("x*(x^2+y)/(c+2)", "x^3/(c+2) + x*y/(c+2)"),
        ("(x^2+x)/c", "x^2/c + x/c"),
    ];

    for (input, expected) in cases {
        expect_expanded(input, expected);
    }
}

#[test]
fn expansion_is_idempotent() {
    let expanded = expand(parse_expr("(x+y)^2*(x-y)").expect("parse"));
    assert_eq!(expand(expanded.clone()), expanded);
}

#[test]
fn substitute_replaces_every_occurrence() {
    let base = parse_expr("M_3 + k*M_3^2").expect("parse");
    let replacement = canonical("3*M_1*M_2 - 2*M_1^3");
    let result = simplify_fully(substitute(&base, "M_3", &replacement));
    let expected = canonical("(3*M_1*M_2 - 2*M_1^3) + k*(3*M_1*M_2 - 2*M_1^3)^2");
    assert_eq!(result, expected);
}
