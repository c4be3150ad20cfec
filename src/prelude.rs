//! Convenience re-exports of the main surface.

pub use crate::closure::{
    DerivativeMatching, LogNormalClosure, MomentClosure, NormalClosure, ZeroClosure,
};
pub use crate::error::{MomentError, Result};
pub use crate::expr::Expr;
pub use crate::format::{pretty, pretty_system};
pub use crate::moment::{MomentIndex, MomentSystem, raw_moment_equations, raw_moment_symbol};
pub use crate::monomial::{SpeciesMap, decompose_polynomial, polynomial_propensities};
pub use crate::network::ReactionNetwork;
pub use crate::parser::parse_expr;
pub use crate::simplify::{expand, simplify, simplify_fully, substitute};
