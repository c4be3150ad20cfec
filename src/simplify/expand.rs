use crate::expr::{Expr, zero};
use crate::simplify::rules::{
    simplify, simplify_add, simplify_div, simplify_mul, simplify_neg, simplify_pow, sum_terms,
};
use num_traits::ToPrimitive;

/// Rewrite an expression into sum-of-monomials form: products are distributed
/// over sums, non-negative integer powers of sums are multiplied out, and
/// division distributes over the terms of the numerator. The denominator itself
/// is left intact; whether it is admissible is the monomial decomposer's call.
pub fn expand(expr: Expr) -> Expr {
    match expr {
        Expr::Add(a, b) => simplify_add(expand(*a), expand(*b)),
        Expr::Sub(a, b) => simplify_add(expand(*a), simplify_neg(expand(*b))),
        Expr::Neg(a) => simplify_neg(expand(*a)),
        Expr::Mul(a, b) => expand_product(&expand(*a), &expand(*b)),
        Expr::Div(a, b) => {
            let num = expand(*a);
            let den = simplify(expand(*b));
            sum_terms(&num)
                .into_iter()
                .map(|term| simplify_div(term, den.clone()))
                .fold(zero(), simplify_add)
        }
        Expr::Pow(base, exp) => {
            let base = expand(*base);
            let exp = simplify(*exp);
            match integer_exponent(&exp) {
                Some(k) if k >= 2 && matches!(base, Expr::Add(..) | Expr::Sub(..)) => {
                    let mut acc = base.clone();
                    for _ in 1..k {
                        acc = expand_product(&acc, &base);
                    }
                    acc
                }
                _ => simplify_pow(base, exp),
            }
        }
        Expr::Exp(a) => Expr::Exp(expand(*a).boxed()),
        Expr::Log(a) => Expr::Log(expand(*a).boxed()),
        atom => atom,
    }
}

fn expand_product(a: &Expr, b: &Expr) -> Expr {
    let mut sum = zero();
    for ta in sum_terms(a) {
        for tb in sum_terms(b) {
            sum = simplify_add(sum, simplify_mul(ta.clone(), tb.clone()));
        }
    }
    sum
}

fn integer_exponent(exp: &Expr) -> Option<i64> {
    exp.as_integer().and_then(|k| k.to_i64())
}
