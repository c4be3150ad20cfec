//! Reaction-network model consumed by the moment machinery.

use crate::error::{MomentError, Result};
use crate::expr::Expr;
use crate::monomial::SpeciesMap;
use crate::simplify::simplify_mul;

/// One reaction channel: the net stoichiometric change per species and the
/// propensity expression over species and parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Reaction {
    changes: Vec<i64>,
    propensity: Expr,
}

impl Reaction {
    pub fn changes(&self) -> &[i64] {
        &self.changes
    }

    pub fn propensity(&self) -> &Expr {
        &self.propensity
    }
}

/// A chemical reaction network: species ordering, parameter names, and
/// reaction channels. Built programmatically; there is no file front end.
#[derive(Clone, Debug)]
pub struct ReactionNetwork {
    species: SpeciesMap,
    parameters: Vec<String>,
    reactions: Vec<Reaction>,
}

impl ReactionNetwork {
    /// Build an empty network. Species names must be distinct and at least one
    /// species must be declared.
    pub fn new<S, P>(
        species: impl IntoIterator<Item = S>,
        parameters: impl IntoIterator<Item = P>,
    ) -> Result<Self>
    where
        S: Into<String>,
        P: Into<String>,
    {
        let species = SpeciesMap::new(species)?;
        if species.is_empty() {
            return Err(MomentError::Shape(
                "network needs at least one species".into(),
            ));
        }
        Ok(ReactionNetwork {
            species,
            parameters: parameters.into_iter().map(Into::into).collect(),
            reactions: Vec::new(),
        })
    }

    /// Add a reaction channel. The change vector must cover every species and
    /// the propensity may only mention declared species and parameters.
    pub fn add_reaction(&mut self, changes: &[i64], propensity: Expr) -> Result<()> {
        if changes.len() != self.species.len() {
            return Err(MomentError::Shape(format!(
                "change vector has {} entries for {} species",
                changes.len(),
                self.species.len()
            )));
        }
        for name in propensity.free_variables() {
            if !self.species.contains(&name) && !self.parameters.iter().any(|p| *p == name) {
                return Err(MomentError::Shape(format!(
                    "unknown symbol {name} in propensity"
                )));
            }
        }
        self.reactions.push(Reaction {
            changes: changes.to_vec(),
            propensity,
        });
        Ok(())
    }

    /// Mass-action propensity `rate · ∏ xᵢ^rᵢ` for the given reactant
    /// stoichiometries. `rate` must be a declared parameter.
    pub fn mass_action(&self, rate: &str, reactants: &[u32]) -> Result<Expr> {
        if reactants.len() != self.species.len() {
            return Err(MomentError::Shape(format!(
                "reactant vector has {} entries for {} species",
                reactants.len(),
                self.species.len()
            )));
        }
        if !self.parameters.iter().any(|p| p == rate) {
            return Err(MomentError::Shape(format!("unknown rate parameter {rate}")));
        }

        let mut propensity = Expr::var(rate);
        for (i, &r) in reactants.iter().enumerate() {
            if r == 0 {
                continue;
            }
            let power = if r == 1 {
                Expr::var(self.species.name(i))
            } else {
                Expr::Pow(
                    Expr::var(self.species.name(i)).boxed(),
                    Expr::integer(i64::from(r)).boxed(),
                )
            };
            propensity = simplify_mul(propensity, power);
        }
        Ok(propensity)
    }

    pub fn species(&self) -> &SpeciesMap {
        &self.species
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }
}
