//! Moment-closure approximations over raw-moment systems.
//!
//! A closure supplies, for each raw moment whose order exceeds the truncation
//! order, an expression in the tracked raw-moment symbols. Closing a system
//! substitutes those expressions into every right-hand side.

use num_bigint::BigInt;
use num_integer::binomial;
use num_traits::{One, Zero};

use crate::error::{MomentError, Result};
use crate::expr::{Expr, Rational, one, zero};
use crate::moment::{
    MomentEquation, MomentIndex, MomentSystem, moment_indices, raw_moment_symbol,
};
use crate::simplify::{simplify, simplify_add, simplify_fully, simplify_mul, substitute};

pub trait MomentClosure {
    fn name(&self) -> &'static str;

    /// Expression for the raw moment `index`, whose order exceeds the
    /// truncation order of `system`, in tracked raw-moment symbols.
    fn close_moment(&self, index: &MomentIndex, system: &MomentSystem) -> Result<Expr>;
}

impl MomentSystem {
    /// Replace every above-order moment symbol using `closure` and simplify.
    /// The result reports no unclosed moments.
    pub fn close(&self, closure: &dyn MomentClosure) -> Result<MomentSystem> {
        let mut replacements = Vec::with_capacity(self.unclosed().len());
        for index in self.unclosed() {
            let expr = closure.close_moment(index, self)?;
            replacements.push((raw_moment_symbol(index), expr));
        }

        let mut equations = Vec::with_capacity(self.equations().len());
        for eq in self.equations() {
            let mut rhs = eq.rhs.clone();
            for (symbol, replacement) in &replacements {
                rhs = substitute(&rhs, symbol, replacement);
            }
            equations.push(MomentEquation {
                index: eq.index.clone(),
                symbol: eq.symbol.clone(),
                rhs: simplify_fully(rhs),
            });
        }
        Ok(self.closed_copy(equations))
    }
}

/// Central moments above the truncation order are set to zero; the open raw
/// moment is rebuilt from the surviving central moments.
pub struct ZeroClosure;

impl MomentClosure for ZeroClosure {
    fn name(&self) -> &'static str {
        "zero"
    }

    fn close_moment(&self, index: &MomentIndex, system: &MomentSystem) -> Result<Expr> {
        raw_from_centrals(index, system.max_order(), &|_| Ok(zero()))
    }
}

/// Above-order central moments follow Isserlis' theorem for a multivariate
/// normal: odd orders vanish, even orders are sums over pair partitions of
/// covariance products.
pub struct NormalClosure;

impl MomentClosure for NormalClosure {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn close_moment(&self, index: &MomentIndex, system: &MomentSystem) -> Result<Expr> {
        if system.max_order() < 2 {
            return Err(MomentError::Unsupported(
                "normal closure needs truncation order of at least 2".into(),
            ));
        }
        raw_from_centrals(index, system.max_order(), &|k| {
            if k.order() % 2 == 1 {
                Ok(zero())
            } else {
                Ok(isserlis(k))
            }
        })
    }
}

/// `E[xⁿ] = exp(nᵀν + ½ nᵀΣn)` with `ν` and `Σ` matched to the tracked first
/// and second raw moments of a log-normal distribution.
pub struct LogNormalClosure;

impl MomentClosure for LogNormalClosure {
    fn name(&self) -> &'static str {
        "log-normal"
    }

    fn close_moment(&self, index: &MomentIndex, system: &MomentSystem) -> Result<Expr> {
        if system.max_order() < 2 {
            return Err(MomentError::Unsupported(
                "log-normal closure needs truncation order of at least 2".into(),
            ));
        }

        let n_species = index.len();
        let mut exponent = zero();
        for (i, &ni) in index.powers().iter().enumerate() {
            if ni == 0 {
                continue;
            }
            // n_i·ν_i with ν_i = 2·log μ_i − ½·log E[x_i²]
            let ni_r = Rational::from_integer(BigInt::from(ni));
            exponent = simplify_add(
                exponent,
                simplify_mul(
                    Expr::Constant(&ni_r * Rational::from_integer(2.into())),
                    log_moment(&MomentIndex::unit(n_species, i)),
                ),
            );
            exponent = simplify_add(
                exponent,
                simplify_mul(
                    Expr::Constant(-&ni_r / Rational::from_integer(2.into())),
                    log_moment(&pair_index(n_species, i, i)),
                ),
            );
        }
        // ½·n_i·n_j·S_ij with S_ij = log E[x_i x_j] − log μ_i − log μ_j
        for (i, &ni) in index.powers().iter().enumerate() {
            for (j, &nj) in index.powers().iter().enumerate() {
                if ni == 0 || nj == 0 {
                    continue;
                }
                let half = Rational::new(BigInt::from(ni) * BigInt::from(nj), 2.into());
                exponent = simplify_add(
                    exponent,
                    simplify_mul(
                        Expr::Constant(half.clone()),
                        log_moment(&pair_index(n_species, i, j)),
                    ),
                );
                for &mean_of in &[i, j] {
                    exponent = simplify_add(
                        exponent,
                        simplify_mul(
                            Expr::Constant(-half.clone()),
                            log_moment(&MomentIndex::unit(n_species, mean_of)),
                        ),
                    );
                }
            }
        }

        Ok(Expr::Exp(simplify_fully(exponent).boxed()))
    }
}

/// Singh–Hespanha derivative matching: `E[xⁿ] ≈ ∏ M_k^{γ_k}` over the tracked
/// indices, with `γ` the unique solution of `Σ_k γ_k·C(k,s) = C(n,s)` for all
/// tracked `s`, where `C(a,b) = ∏ binom(aᵢ,bᵢ)`.
pub struct DerivativeMatching;

impl MomentClosure for DerivativeMatching {
    fn name(&self) -> &'static str {
        "derivative matching"
    }

    fn close_moment(&self, index: &MomentIndex, system: &MomentSystem) -> Result<Expr> {
        let tracked = moment_indices(index.len(), system.max_order());
        let matrix: Vec<Vec<Rational>> = tracked
            .iter()
            .map(|s| {
                tracked
                    .iter()
                    .map(|k| Rational::from_integer(multi_binomial(k, s)))
                    .collect()
            })
            .collect();
        let rhs: Vec<Rational> = tracked
            .iter()
            .map(|s| Rational::from_integer(multi_binomial(index, s)))
            .collect();

        let gamma = solve_linear(matrix, rhs).ok_or_else(|| {
            MomentError::Unsupported("derivative-matching system is singular".into())
        })?;

        let mut product = one();
        for (k, g) in tracked.iter().zip(gamma) {
            if g.is_zero() {
                continue;
            }
            let symbol = Expr::var(raw_moment_symbol(k));
            let factor = if g.is_one() {
                symbol
            } else {
                Expr::Pow(symbol.boxed(), Expr::Constant(g).boxed())
            };
            product = simplify_mul(product, factor);
        }
        Ok(simplify(product))
    }
}

/// `∏ binom(nᵢ, kᵢ)`, zero as soon as any `kᵢ > nᵢ`.
fn multi_binomial(n: &MomentIndex, k: &MomentIndex) -> BigInt {
    let mut acc = BigInt::one();
    for (&ni, &ki) in n.powers().iter().zip(k.powers()) {
        if ki > ni {
            return BigInt::zero();
        }
        acc *= binomial(BigInt::from(ni), BigInt::from(ki));
    }
    acc
}

/// Every multi-index `j` with `j ≤ n` componentwise, including 0 and `n`.
fn sub_indices(n: &MomentIndex) -> Vec<MomentIndex> {
    let mut out: Vec<Vec<u32>> = vec![Vec::new()];
    for &p in n.powers() {
        let mut next = Vec::with_capacity(out.len() * (p as usize + 1));
        for prefix in &out {
            for k in 0..=p {
                let mut v = prefix.clone();
                v.push(k);
                next.push(v);
            }
        }
        out = next;
    }
    out.into_iter().map(MomentIndex::new).collect()
}

fn mean_symbol(n_species: usize, i: usize) -> Expr {
    Expr::var(raw_moment_symbol(&MomentIndex::unit(n_species, i)))
}

/// `∏ μᵢ^{dᵢ}` over the mean symbols.
fn mean_power(diff: &[u32], n_species: usize) -> Expr {
    let mut acc = one();
    for (i, &d) in diff.iter().enumerate() {
        if d == 0 {
            continue;
        }
        let mean = mean_symbol(n_species, i);
        let factor = if d == 1 {
            mean
        } else {
            Expr::Pow(mean.boxed(), Expr::integer(i64::from(d)).boxed())
        };
        acc = simplify_mul(acc, factor);
    }
    acc
}

/// Central moment `C_k` written in raw-moment symbols via the binomial
/// transform `C_k = Σ_{j≤k} (−1)^{|k−j|}·C(k,j)·μ^{k−j}·M_j`.
fn central_in_raw(k: &MomentIndex) -> Expr {
    let n_species = k.len();
    let mut sum = zero();
    for j in sub_indices(k) {
        let mut coeff = multi_binomial(k, &j);
        if (k.order() - j.order()) % 2 == 1 {
            coeff = -coeff;
        }
        let diff: Vec<u32> = k
            .powers()
            .iter()
            .zip(j.powers())
            .map(|(a, b)| a - b)
            .collect();
        let mut term = simplify_mul(
            Expr::Constant(Rational::from_integer(coeff)),
            mean_power(&diff, n_species),
        );
        if j.order() > 0 {
            term = simplify_mul(term, Expr::var(raw_moment_symbol(&j)));
        }
        sum = simplify_add(sum, term);
    }
    sum
}

/// Inverse transform `M_n = Σ_{k≤n} C(n,k)·μ^{n−k}·C_k`, with `C_0 = 1`,
/// first-order centrals identically zero, tracked centrals rewritten in raw
/// symbols, and above-order centrals supplied by `above`.
fn raw_from_centrals(
    n: &MomentIndex,
    max_order: u32,
    above: &dyn Fn(&MomentIndex) -> Result<Expr>,
) -> Result<Expr> {
    let n_species = n.len();
    let mut sum = zero();
    for k in sub_indices(n) {
        let central = match k.order() {
            0 => one(),
            1 => continue,
            o if o <= max_order => central_in_raw(&k),
            _ => above(&k)?,
        };
        if central.is_zero() {
            continue;
        }
        let diff: Vec<u32> = n
            .powers()
            .iter()
            .zip(k.powers())
            .map(|(a, b)| a - b)
            .collect();
        let term = simplify_mul(
            simplify_mul(
                Expr::Constant(Rational::from_integer(multi_binomial(n, &k))),
                mean_power(&diff, n_species),
            ),
            central,
        );
        sum = simplify_add(sum, term);
    }
    Ok(simplify_fully(sum))
}

fn pair_index(n_species: usize, i: usize, j: usize) -> MomentIndex {
    let mut powers = vec![0; n_species];
    powers[i] += 1;
    powers[j] += 1;
    MomentIndex::new(powers)
}

fn log_moment(index: &MomentIndex) -> Expr {
    Expr::Log(Expr::var(raw_moment_symbol(index)).boxed())
}

/// Isserlis' theorem for an even-order central moment: sum over perfect
/// matchings of the species multiset, each contributing a covariance product.
fn isserlis(k: &MomentIndex) -> Expr {
    let mut slots = Vec::new();
    for (i, &p) in k.powers().iter().enumerate() {
        for _ in 0..p {
            slots.push(i);
        }
    }
    pairings(&slots, k.len())
}

fn pairings(slots: &[usize], n_species: usize) -> Expr {
    if slots.is_empty() {
        return one();
    }
    let first = slots[0];
    let mut sum = zero();
    for j in 1..slots.len() {
        let covariance = central_in_raw(&pair_index(n_species, first, slots[j]));
        let mut rest = slots[1..].to_vec();
        rest.remove(j - 1);
        sum = simplify_add(sum, simplify_mul(covariance, pairings(&rest, n_species)));
    }
    sum
}

/// Exact Gaussian elimination with partial pivoting; `None` when singular.
fn solve_linear(mut matrix: Vec<Vec<Rational>>, mut rhs: Vec<Rational>) -> Option<Vec<Rational>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n).find(|&r| !matrix[r][col].is_zero())?;
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let p = matrix[col][col].clone();
        for c in col..n {
            matrix[col][c] = &matrix[col][c] / &p;
        }
        rhs[col] = &rhs[col] / &p;

        for r in 0..n {
            if r == col {
                continue;
            }
            let f = matrix[r][col].clone();
            if f.is_zero() {
                continue;
            }
            for c in col..n {
                let delta = &matrix[col][c] * &f;
                matrix[r][c] = &matrix[r][c] - &delta;
            }
            let delta = &rhs[col] * &f;
            rhs[r] = &rhs[r] - &delta;
        }
    }
    Some(rhs)
}
