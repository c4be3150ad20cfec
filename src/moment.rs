//! Moment indices, symbol naming, and raw-moment equation generation.
//!
//! For a tracked multi-index `m`, the exact raw-moment dynamics are
//! `d E[xᵐ]/dt = Σ_r E[a_r(x) · ((x + s_r)ᵐ − xᵐ)]`. The shifted-power
//! difference is built symbolically, expanded against the propensity, and fed
//! through the monomial decomposer; every surviving monomial `c · xᵏ` turns
//! into the term `c · M_k`.

use std::collections::BTreeSet;

use crate::calculus::differentiate;
use crate::error::{MomentError, Result};
use crate::expr::{Expr, one, zero};
use crate::monomial::{SpeciesMap, decompose_polynomial};
use crate::network::ReactionNetwork;
use crate::simplify::{expand, simplify_add, simplify_fully, simplify_mul};

/// Multi-index over species; entry `i` is the power of species `i`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MomentIndex(Vec<u32>);

impl MomentIndex {
    pub fn new(powers: Vec<u32>) -> Self {
        MomentIndex(powers)
    }

    /// Index of the mean of species `i`.
    pub fn unit(n_species: usize, i: usize) -> Self {
        let mut powers = vec![0; n_species];
        powers[i] = 1;
        MomentIndex(powers)
    }

    pub fn order(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn powers(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// All multi-indices of order 1..=`max_order`, graded, first species varying
/// slowest within each order.
pub fn moment_indices(n_species: usize, max_order: u32) -> Vec<MomentIndex> {
    let mut out = Vec::new();
    if n_species == 0 {
        return out;
    }
    let mut prefix = Vec::with_capacity(n_species);
    for order in 1..=max_order {
        fill(&mut prefix, n_species, order, &mut out);
    }
    out
}

fn fill(prefix: &mut Vec<u32>, n_species: usize, remaining: u32, out: &mut Vec<MomentIndex>) {
    if prefix.len() + 1 == n_species {
        prefix.push(remaining);
        out.push(MomentIndex::new(prefix.clone()));
        prefix.pop();
        return;
    }
    for k in (0..=remaining).rev() {
        prefix.push(k);
        fill(prefix, n_species, remaining - k, out);
        prefix.pop();
    }
}

/// Symbol naming is a pure function of the index: `M_2_1` is E[x₀²·x₁].
pub fn raw_moment_symbol(index: &MomentIndex) -> String {
    let mut name = String::from("M");
    for p in index.powers() {
        name.push('_');
        name.push_str(&p.to_string());
    }
    name
}

#[derive(Clone, Debug)]
pub struct MomentEquation {
    pub index: MomentIndex,
    pub symbol: String,
    pub rhs: Expr,
}

/// A system of raw-moment ODEs. `unclosed` lists the above-order moment
/// symbols still referenced by the right-hand sides; a closure removes them.
#[derive(Clone, Debug)]
pub struct MomentSystem {
    species: SpeciesMap,
    parameters: Vec<String>,
    max_order: u32,
    equations: Vec<MomentEquation>,
    unclosed: Vec<MomentIndex>,
}

/// Generate the raw-moment equations of a network up to `max_order`.
///
/// Every propensity must decompose into monomials over the species; a
/// non-polynomial propensity propagates [`MomentError::NonPolynomial`].
pub fn raw_moment_equations(network: &ReactionNetwork, max_order: u32) -> Result<MomentSystem> {
    if max_order == 0 {
        return Err(MomentError::Unsupported(
            "truncation order must be at least 1".into(),
        ));
    }

    let species = network.species().clone();
    let mut unclosed = BTreeSet::new();
    let mut equations = Vec::new();

    for index in moment_indices(species.len(), max_order) {
        let mut rhs = zero();
        for reaction in network.reactions() {
            let shift = shifted_power_difference(&index, reaction.changes(), &species);
            let integrand = expand(Expr::Mul(
                reaction.propensity().clone().boxed(),
                shift.boxed(),
            ));
            let terms = decompose_polynomial(&integrand, &species)?;
            for (coefficient, powers) in terms.coefficients.iter().zip(&terms.powers) {
                let k = MomentIndex::new(powers.clone());
                let term = if k.order() == 0 {
                    coefficient.clone()
                } else {
                    if k.order() > max_order {
                        unclosed.insert(k.clone());
                    }
                    simplify_mul(coefficient.clone(), Expr::var(raw_moment_symbol(&k)))
                };
                rhs = simplify_add(rhs, term);
            }
        }
        equations.push(MomentEquation {
            symbol: raw_moment_symbol(&index),
            index,
            rhs: simplify_fully(rhs),
        });
    }

    let mut unclosed: Vec<MomentIndex> = unclosed.into_iter().collect();
    unclosed.sort_by_key(MomentIndex::order);

    Ok(MomentSystem {
        species,
        parameters: network.parameters().to_vec(),
        max_order,
        equations,
        unclosed,
    })
}

/// `∏ (xᵢ + sᵢ)^{mᵢ} − ∏ xᵢ^{mᵢ}`, unexpanded.
fn shifted_power_difference(index: &MomentIndex, changes: &[i64], species: &SpeciesMap) -> Expr {
    let mut shifted = Vec::new();
    let mut plain = Vec::new();
    for (i, &m) in index.powers().iter().enumerate() {
        if m == 0 {
            continue;
        }
        let x = Expr::var(species.name(i));
        let exponent = Expr::integer(i64::from(m));
        plain.push(Expr::Pow(x.clone().boxed(), exponent.clone().boxed()));
        let base = if changes[i] == 0 {
            x
        } else {
            Expr::Add(x.boxed(), Expr::integer(changes[i]).boxed())
        };
        shifted.push(Expr::Pow(base.boxed(), exponent.boxed()));
    }
    Expr::Sub(product_of(shifted).boxed(), product_of(plain).boxed())
}

fn product_of(factors: Vec<Expr>) -> Expr {
    let mut iter = factors.into_iter();
    match iter.next() {
        None => one(),
        Some(first) => iter.fold(first, |acc, f| Expr::Mul(acc.boxed(), f.boxed())),
    }
}

impl MomentSystem {
    pub fn species(&self) -> &SpeciesMap {
        &self.species
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    pub fn equations(&self) -> &[MomentEquation] {
        &self.equations
    }

    pub fn equation(&self, symbol: &str) -> Option<&MomentEquation> {
        self.equations.iter().find(|eq| eq.symbol == symbol)
    }

    /// Above-order moment indices the right-hand sides still reference.
    pub fn unclosed(&self) -> &[MomentIndex] {
        &self.unclosed
    }

    pub fn is_closed(&self) -> bool {
        self.unclosed.is_empty()
    }

    /// Partial derivatives of every right-hand side with respect to every
    /// tracked moment symbol, row per equation.
    pub fn jacobian(&self) -> Vec<Vec<Expr>> {
        self.equations
            .iter()
            .map(|eq| {
                self.equations
                    .iter()
                    .map(|col| differentiate(&col.symbol, &eq.rhs))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn closed_copy(&self, equations: Vec<MomentEquation>) -> MomentSystem {
        MomentSystem {
            species: self.species.clone(),
            parameters: self.parameters.clone(),
            max_order: self.max_order,
            equations,
            unclosed: Vec::new(),
        }
    }
}
