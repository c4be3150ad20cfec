//! Monomial decomposition of polynomial propensities.
//!
//! A propensity in expanded sum-of-monomials form is split, term by term, into
//! a scalar-or-symbolic coefficient and one integer exponent per species. This
//! is the step that turns `E[a(x)·(...)]` integrands into linear combinations
//! of raw moments.

use std::collections::BTreeMap;

use num_traits::ToPrimitive;

use crate::error::{MomentError, Result};
use crate::expr::{Expr, one};
use crate::format::pretty;
use crate::simplify::{simplify_div, simplify_mul, sum_terms};

/// Species name → index mapping; fixes the ordering of exponent vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeciesMap {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl SpeciesMap {
    /// Build a species ordering. Every name must be distinct; a duplicate
    /// would leave a dead exponent slot behind.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(MomentError::Shape(format!("duplicate species {name}")));
            }
        }
        Ok(SpeciesMap { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }
}

/// Monomial structure of one polynomial expression: parallel lists of
/// coefficients and exponent vectors, plus the largest total degree seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolynomialTerms {
    pub coefficients: Vec<Expr>,
    pub powers: Vec<Vec<u32>>,
    pub max_degree: u32,
}

impl PolynomialTerms {
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Decompose a batch of propensity expressions against one species ordering.
pub fn polynomial_propensities(
    propensities: &[Expr],
    species: &SpeciesMap,
) -> Result<Vec<PolynomialTerms>> {
    propensities
        .iter()
        .map(|p| decompose_polynomial(p, species))
        .collect()
}

/// Decompose an expression, already in expanded form, into monomial terms.
///
/// Non-species symbols and numeric constants are factored into the
/// coefficients, including whole species-free subtrees such as `1/(c+2)`.
/// Any species occurring with a negative or non-integer exponent, or inside a
/// factor that is not a plain power (a denominator, an unexpanded sum, an
/// `exp`/`log` argument), fails with [`MomentError::NonPolynomial`].
pub fn decompose_polynomial(expr: &Expr, species: &SpeciesMap) -> Result<PolynomialTerms> {
    let mut coefficients = Vec::new();
    let mut powers = Vec::new();
    let mut max_degree = 0u32;

    for term in sum_terms(expr) {
        let mut split = TermSplit::new(species.len());
        let (coefficient, exponents) = split
            .collect(&term, false, species)
            .and_then(|_| split.finish(species))
            .map_err(|species_name| MomentError::NonPolynomial {
                term: pretty(&term),
                species: species_name,
            })?;

        let degree: u32 = exponents.iter().sum();
        max_degree = max_degree.max(degree);
        coefficients.push(coefficient);
        powers.push(exponents);
    }

    Ok(PolynomialTerms {
        coefficients,
        powers,
        max_degree,
    })
}

/// Per-term accumulator: integer species exponents plus the numerator and
/// denominator factors of the coefficient. Errors carry the offending species
/// name; the caller attaches the term.
struct TermSplit {
    exponents: Vec<i64>,
    numerator: Vec<Expr>,
    denominator: Vec<Expr>,
}

impl TermSplit {
    fn new(n_species: usize) -> Self {
        TermSplit {
            exponents: vec![0; n_species],
            numerator: Vec::new(),
            denominator: Vec::new(),
        }
    }

    fn collect(
        &mut self,
        factor: &Expr,
        inverted: bool,
        species: &SpeciesMap,
    ) -> std::result::Result<(), String> {
        match factor {
            Expr::Mul(a, b) => {
                self.collect(a, inverted, species)?;
                self.collect(b, inverted, species)
            }
            Expr::Div(a, b) => {
                self.collect(a, inverted, species)?;
                self.collect(b, !inverted, species)
            }
            Expr::Neg(a) => {
                self.numerator.push(Expr::integer(-1));
                self.collect(a, inverted, species)
            }
            Expr::Variable(name) => {
                match species.index_of(name) {
                    Some(i) => self.exponents[i] += if inverted { -1 } else { 1 },
                    None => self.push_factor(factor.clone(), inverted),
                }
                Ok(())
            }
            Expr::Constant(_) => {
                self.push_factor(factor.clone(), inverted);
                Ok(())
            }
            Expr::Pow(base, exp) => {
                let indexed = base
                    .as_variable()
                    .and_then(|n| species.index_of(n).map(|i| (n, i)));
                match indexed {
                    Some((name, i)) => {
                        let k = exp
                            .as_integer()
                            .and_then(|k| k.to_i64())
                            .ok_or_else(|| name.to_string())?;
                        self.exponents[i] += if inverted { -k } else { k };
                        Ok(())
                    }
                    None => self.species_free_factor(factor, inverted, species),
                }
            }
            Expr::Add(..) | Expr::Sub(..) | Expr::Exp(..) | Expr::Log(..) => {
                self.species_free_factor(factor, inverted, species)
            }
        }
    }

    /// Accept `factor` into the coefficient only if no species occurs in it.
    fn species_free_factor(
        &mut self,
        factor: &Expr,
        inverted: bool,
        species: &SpeciesMap,
    ) -> std::result::Result<(), String> {
        let vars = factor.free_variables();
        if let Some(name) = species.names().iter().find(|n| vars.contains(*n)) {
            return Err(name.clone());
        }
        self.push_factor(factor.clone(), inverted);
        Ok(())
    }

    fn push_factor(&mut self, factor: Expr, inverted: bool) {
        if inverted {
            self.denominator.push(factor);
        } else {
            self.numerator.push(factor);
        }
    }

    fn finish(&self, species: &SpeciesMap) -> std::result::Result<(Expr, Vec<u32>), String> {
        let mut exponents = Vec::with_capacity(self.exponents.len());
        for (i, &e) in self.exponents.iter().enumerate() {
            if e.is_negative() {
                return Err(species.name(i).to_string());
            }
            exponents.push(e as u32);
        }

        let numerator = self
            .numerator
            .iter()
            .cloned()
            .fold(one(), simplify_mul);
        let coefficient = if self.denominator.is_empty() {
            numerator
        } else {
            let denominator = self
                .denominator
                .iter()
                .cloned()
                .fold(one(), simplify_mul);
            simplify_div(numerator, denominator)
        };

        Ok((coefficient, exponents))
    }
}
