//! Symbolic derivation of moment-closure ODE approximations for stochastic
//! chemical reaction networks, built on a purpose-built expression kernel.

pub mod calculus;
pub mod closure;
pub mod error;
pub mod expr;
pub mod format;
pub mod moment;
pub mod monomial;
pub mod network;
pub mod parser;
pub mod prelude;
pub mod simplify;

pub use calculus::differentiate;
pub use closure::{
    DerivativeMatching, LogNormalClosure, MomentClosure, NormalClosure, ZeroClosure,
};
pub use error::{MomentError, Result};
pub use expr::{Expr, Rational, add, div, mul, neg, one, pow, rational, sub, zero};
pub use format::{pretty, pretty_system};
pub use moment::{
    MomentEquation, MomentIndex, MomentSystem, moment_indices, raw_moment_equations,
    raw_moment_symbol,
};
pub use monomial::{PolynomialTerms, SpeciesMap, decompose_polynomial, polynomial_propensities};
pub use network::{Reaction, ReactionNetwork};
pub use parser::parse_expr;
pub use simplify::{expand, simplify, simplify_fully, simplify_with_limit, substitute};
