//! Symbolic simplification, expansion, and substitution utilities.

mod expand;
mod rules;
mod substitute;

pub use expand::expand;
pub use rules::{
    simplify, simplify_add, simplify_div, simplify_fully, simplify_mul, simplify_neg, simplify_pow,
    simplify_sub, simplify_with_limit,
};
pub(crate) use rules::sum_terms;
pub use substitute::substitute;
