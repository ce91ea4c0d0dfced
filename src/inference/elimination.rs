//! Variable elimination
//!
//! [`eliminate`] turns a factor graph and an [`Ordering`] into a
//! [`BayesNet`]. For each group it gathers the remaining factors touching the
//! group, factors their product into a conditional on the group and a
//! residual over the separator, and returns the residual to the pool.
//!
//! Gaussian groups are eliminated by weighted Gram-Schmidt on the stacked
//! `[A | b]` system. Hard rows (zero sigma) win the pivot whenever they carry
//! the column, so equality constraints are eliminated exactly. Discrete
//! groups multiply their tables and divide out the marginal. Continuous
//! groups touched by hybrid factors are eliminated once per assignment of
//! the discrete keys involved.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector, RowDVector};

use super::bayes_net::BayesNet;
use super::config::{EliminationConfig, EliminationMode};
use super::errors::{InferenceError, Result};
use super::ordering::Ordering;
use crate::common::constants::CONSTRAINT_RESIDUAL_EPSILON;
use crate::common::linalg::{compress_rows, weighted_pivot, weights_from_neg_log, Pivot};
use crate::conditionals::{
    Conditional, DiscreteConditional, GaussianConditional, GaussianMixture,
};
use crate::factors::{
    enumerate_assignments, DiscreteFactor, Factor, FactorGraph, GaussianFactor,
    HybridGaussianFactor, NoiseModel,
};
use crate::types::{DiscreteKey, Key, KeyDisplay, VectorValues};

/// Eliminate every variable of `graph` in the order given by `ordering`
///
/// Returns one conditional per group, in elimination order.
///
/// # Errors
/// - [`InferenceError::InvalidOrdering`] if the ordering misses or repeats a
///   key, or eliminates a discrete key while a hybrid factor still needs it
/// - [`InferenceError::NumericDegeneracy`] if a continuous variable is not
///   determined by the factors touching it
/// - [`InferenceError::DimensionMismatch`] if factors disagree on a dimension
pub fn eliminate(
    graph: &FactorGraph,
    ordering: &Ordering,
    config: &EliminationConfig,
) -> Result<BayesNet> {
    ordering.validate(graph)?;
    let discrete = graph.discrete_cardinalities()?;

    let mut pool: Vec<Option<Factor>> = graph
        .iter()
        .map(|f| normalize(f.clone()).map(Some))
        .collect::<Result<_>>()?;

    let mut net = BayesNet::new();
    for group in ordering.groups() {
        let mut touching = Vec::new();
        for slot in pool.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|f| group.iter().any(|&k| f.involves(k)))
            {
                if let Some(factor) = slot.take() {
                    touching.push(factor);
                }
            }
        }
        if touching.is_empty() {
            return Err(InferenceError::InvalidOrdering {
                description: format!("no factor left for {}", KeyDisplay(group[0])),
            });
        }

        let (conditional, residual) = if discrete.contains_key(&group[0]) {
            eliminate_discrete(&touching, group, config.mode)?
        } else {
            eliminate_continuous(&touching, group, config.rank_tolerance)?
        };
        log::trace!(
            "eliminated {} from {} factors ({:?})",
            KeyDisplay(group[0]),
            touching.len(),
            conditional.kind()
        );
        net.push(conditional);
        if let Some(residual) = residual {
            pool.push(Some(residual));
        }
    }
    Ok(net)
}

/// A hybrid factor without continuous keys is a discrete potential
fn normalize(factor: Factor) -> Result<Factor> {
    match factor {
        Factor::Hybrid(h) if h.continuous_keys().is_empty() => {
            Ok(Factor::Discrete(hybrid_to_discrete(&h)?))
        }
        other => Ok(other),
    }
}

fn hybrid_to_discrete(factor: &HybridGaussianFactor) -> Result<DiscreteFactor> {
    let empty = VectorValues::new();
    let neg_log = enumerate_assignments(factor.discrete_keys())
        .iter()
        .map(|a| factor.error(&empty, a))
        .collect::<Result<Vec<f64>>>()?;
    DiscreteFactor::new(factor.discrete_keys().to_vec(), weights_from_neg_log(&neg_log))
}

fn eliminate_discrete(
    touching: &[Factor],
    frontals: &[Key],
    mode: EliminationMode,
) -> Result<(Conditional, Option<Factor>)> {
    let mut joint = DiscreteFactor::constant(1.0);
    for factor in touching {
        match factor {
            Factor::Discrete(table) => joint = joint.multiply(table)?,
            Factor::Hybrid(h) => {
                return Err(InferenceError::InvalidOrdering {
                    description: format!(
                        "discrete key {} eliminated while continuous key {} depends on it",
                        KeyDisplay(frontals[0]),
                        KeyDisplay(h.continuous_keys()[0])
                    ),
                })
            }
            Factor::Gaussian(_) => {
                return Err(InferenceError::InvalidOrdering {
                    description: format!(
                        "Gaussian factor attached to discrete key {}",
                        KeyDisplay(frontals[0])
                    ),
                })
            }
        }
    }
    let (conditional, residual) = DiscreteConditional::from_joint(&joint, frontals, mode)?;
    let residual = (!residual.keys().is_empty()).then_some(Factor::Discrete(residual));
    Ok((conditional.into(), residual))
}

fn eliminate_continuous(
    touching: &[Factor],
    frontals: &[Key],
    tolerance: f64,
) -> Result<(Conditional, Option<Factor>)> {
    let mut gaussians: Vec<&GaussianFactor> = Vec::new();
    let mut hybrids: Vec<&HybridGaussianFactor> = Vec::new();
    for factor in touching {
        match factor {
            Factor::Gaussian(g) => gaussians.push(g),
            Factor::Hybrid(h) => hybrids.push(h),
            Factor::Discrete(_) => {
                return Err(InferenceError::InvalidOrdering {
                    description: format!(
                        "discrete factor attached to continuous key {}",
                        KeyDisplay(frontals[0])
                    ),
                })
            }
        }
    }

    let layout = Layout::new(&gaussians, &hybrids, frontals)?;
    if hybrids.is_empty() {
        let (conditional, residual) = eliminate_gaussian(&gaussians, &layout, tolerance)?;
        let residual = (!residual.keys().is_empty()).then_some(Factor::Gaussian(residual));
        return Ok((conditional.into(), residual));
    }
    eliminate_hybrid(&gaussians, &hybrids, &layout, tolerance)
}

/// Column layout of the stacked system: frontal keys, then separator keys sorted
struct Layout {
    frontals: Vec<(Key, usize)>,
    separator: Vec<(Key, usize)>,
    offsets: BTreeMap<Key, (usize, usize)>,
    frontal_dim: usize,
    total_dim: usize,
}

impl Layout {
    fn new(
        gaussians: &[&GaussianFactor],
        hybrids: &[&HybridGaussianFactor],
        frontals: &[Key],
    ) -> Result<Self> {
        let mut dims: BTreeMap<Key, usize> = BTreeMap::new();
        let components = hybrids
            .iter()
            .flat_map(|h| h.components().leaves().into_iter().map(|(f, _)| f));
        for factor in gaussians.iter().copied().chain(components) {
            for (&key, block) in factor.keys().iter().zip(factor.blocks()) {
                match dims.get(&key) {
                    Some(&dim) if dim != block.ncols() => {
                        return Err(InferenceError::DimensionMismatch {
                            key,
                            expected: dim,
                            actual: block.ncols(),
                        })
                    }
                    Some(_) => {}
                    None => {
                        dims.insert(key, block.ncols());
                    }
                }
            }
        }

        let frontals = frontals
            .iter()
            .map(|&k| {
                dims.get(&k)
                    .map(|&d| (k, d))
                    .ok_or_else(|| InferenceError::InvalidOrdering {
                        description: format!("no Gaussian factor determines {}", KeyDisplay(k)),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let separator: Vec<(Key, usize)> = dims
            .iter()
            .filter(|(k, _)| !frontals.iter().any(|(f, _)| f == *k))
            .map(|(k, d)| (*k, *d))
            .collect();

        let mut offsets = BTreeMap::new();
        let mut offset = 0;
        for &(key, dim) in frontals.iter().chain(&separator) {
            offsets.insert(key, (offset, dim));
            offset += dim;
        }
        let frontal_dim = frontals.iter().map(|(_, d)| d).sum();
        Ok(Self {
            frontals,
            separator,
            offsets,
            frontal_dim,
            total_dim: offset,
        })
    }

    /// Key owning a frontal column
    fn frontal_at(&self, column: usize) -> Key {
        let mut start = 0;
        for &(key, dim) in &self.frontals {
            if column < start + dim {
                return key;
            }
            start += dim;
        }
        self.frontals.last().map_or(0, |(k, _)| *k)
    }

    /// Stack factors into `[A | b]` with one weight per row
    fn stack(&self, factors: &[&GaussianFactor]) -> Result<(DMatrix<f64>, Vec<f64>)> {
        let rows: usize = factors.iter().map(|f| f.rows()).sum();
        let mut ab = DMatrix::zeros(rows, self.total_dim + 1);
        let mut weights = Vec::with_capacity(rows);
        let mut row = 0;
        for factor in factors {
            let height = factor.rows();
            for (key, block) in factor.keys().iter().zip(factor.blocks()) {
                let &(offset, dim) = self
                    .offsets
                    .get(key)
                    .ok_or(InferenceError::UnknownKey(*key))?;
                ab.view_mut((row, offset), (height, dim)).copy_from(block);
            }
            ab.view_mut((row, self.total_dim), (height, 1))
                .copy_from(factor.b());
            weights.extend(factor.noise().weights());
            row += height;
        }
        Ok((ab, weights))
    }
}

/// Weighted Gram-Schmidt elimination of the layout's frontal columns
///
/// The conditional has unit diagonal. The residual always spans every
/// separator key (possibly with zero rows) and, when the separator is empty,
/// holds the constant error left over as a keyless factor.
fn eliminate_gaussian(
    factors: &[&GaussianFactor],
    layout: &Layout,
    tolerance: f64,
) -> Result<(GaussianConditional, GaussianFactor)> {
    let (mut ab, weights) = layout.stack(factors)?;
    let nf = layout.frontal_dim;
    let ncols = layout.total_dim + 1;

    let mut active = vec![true; ab.nrows()];
    let mut rd = DMatrix::zeros(nf, ncols);
    let mut sigmas = DVector::zeros(nf);
    for j in 0..nf {
        let column = ab.column(j).into_owned();
        let (mut pivot, sigma): (RowDVector<f64>, f64) =
            match weighted_pivot(&column, &weights, &active, tolerance) {
                Pivot::Constrained { row, coeff } => {
                    active[row] = false;
                    (ab.row(row) / coeff, 0.0)
                }
                Pivot::Soft { pseudo, precision } => {
                    (pseudo.transpose() * &ab, 1.0 / precision.sqrt())
                }
                Pivot::Degenerate { precision } => {
                    return Err(InferenceError::NumericDegeneracy {
                        key: layout.frontal_at(j),
                        description: format!(
                            "column precision {:.3e} below rank tolerance {:.3e}",
                            precision, tolerance
                        ),
                    })
                }
            };
        pivot[j] = 1.0;
        for k in 0..j {
            pivot[k] = 0.0;
        }
        ab -= &column * &pivot;
        rd.set_row(j, &pivot);
        sigmas[j] = sigma;
    }

    let conditional = GaussianConditional::new(
        layout.frontals.clone(),
        rd.columns(0, nf).into_owned(),
        layout
            .separator
            .iter()
            .map(|&(key, dim)| (key, rd.columns(layout.offsets[&key].0, dim).into_owned()))
            .collect(),
        rd.column(ncols - 1).into_owned(),
        sigmas,
    )?;

    let residual = residual_factor(&ab, &weights, &active, layout)?;
    Ok((conditional, residual))
}

/// Compress the rows left after elimination into a factor on the separator
fn residual_factor(
    ab: &DMatrix<f64>,
    weights: &[f64],
    active: &[bool],
    layout: &Layout,
) -> Result<GaussianFactor> {
    let nf = layout.frontal_dim;
    let width = ab.ncols() - nf;

    let soft: Vec<usize> = (0..ab.nrows())
        .filter(|&i| active[i] && weights[i].is_finite())
        .collect();
    let mut whitened = DMatrix::zeros(soft.len(), width);
    for (r, &i) in soft.iter().enumerate() {
        let scale = weights[i].sqrt();
        whitened
            .row_mut(r)
            .copy_from(&(ab.row(i).columns(nf, width) * scale));
    }
    let compressed = compress_rows(whitened);

    let mut hard: Vec<RowDVector<f64>> = Vec::new();
    for i in (0..ab.nrows()).filter(|&i| active[i] && weights[i].is_infinite()) {
        let row = ab.row(i).columns(nf, width).into_owned();
        let jacobian = row.iter().take(width - 1).fold(0.0f64, |m, v| m.max(v.abs()));
        if jacobian <= CONSTRAINT_RESIDUAL_EPSILON {
            if row[width - 1].abs() > CONSTRAINT_RESIDUAL_EPSILON {
                return Err(InferenceError::NumericDegeneracy {
                    key: layout.frontal_at(0),
                    description: "inconsistent hard constraints".to_string(),
                });
            }
            continue;
        }
        hard.push(row);
    }

    let rows = compressed.nrows() + hard.len();
    let mut stacked = DMatrix::zeros(rows, width);
    stacked
        .view_mut((0, 0), (compressed.nrows(), width))
        .copy_from(&compressed);
    for (r, row) in hard.iter().enumerate() {
        stacked.row_mut(compressed.nrows() + r).copy_from(row);
    }
    let noise = if hard.is_empty() {
        NoiseModel::unit(rows)
    } else {
        NoiseModel::constrained(DVector::from_fn(rows, |i, _| {
            if i < compressed.nrows() {
                1.0
            } else {
                0.0
            }
        }))
    };

    let mut keys = Vec::with_capacity(layout.separator.len());
    let mut blocks = Vec::with_capacity(layout.separator.len());
    for &(key, dim) in &layout.separator {
        keys.push(key);
        blocks.push(stacked.columns(layout.offsets[&key].0 - nf, dim).into_owned());
    }
    Ok(GaussianFactor::from_parts(
        keys,
        blocks,
        stacked.column(width - 1).into_owned(),
        noise,
    ))
}

/// Eliminate continuous frontals once per assignment of the hybrid factors' discrete keys
fn eliminate_hybrid(
    gaussians: &[&GaussianFactor],
    hybrids: &[&HybridGaussianFactor],
    layout: &Layout,
    tolerance: f64,
) -> Result<(Conditional, Option<Factor>)> {
    let mut discrete_keys: Vec<DiscreteKey> = hybrids
        .iter()
        .flat_map(|h| h.discrete_keys().iter().copied())
        .collect();
    discrete_keys.sort();
    discrete_keys.dedup();

    let assignments = enumerate_assignments(&discrete_keys);
    let mut conditionals = Vec::with_capacity(assignments.len());
    let mut residuals = Vec::with_capacity(assignments.len());
    for assignment in &assignments {
        let mut selected: Vec<&GaussianFactor> = gaussians.to_vec();
        let mut offset = 0.0;
        for hybrid in hybrids {
            let (factor, component_offset) = hybrid.component(assignment)?;
            selected.push(factor);
            offset += component_offset;
        }
        let (conditional, residual) = eliminate_gaussian(&selected, layout, tolerance)?;
        offset += conditional.log_determinant();
        conditionals.push(conditional);
        residuals.push((residual, offset));
    }

    let mixture = GaussianMixture::new(discrete_keys.clone(), conditionals)?;
    let residual = if layout.separator.is_empty() {
        let empty = VectorValues::new();
        let neg_log = residuals
            .iter()
            .map(|(factor, offset)| Ok(factor.error(&empty)? + offset))
            .collect::<Result<Vec<f64>>>()?;
        Factor::Discrete(DiscreteFactor::new(
            discrete_keys,
            weights_from_neg_log(&neg_log),
        )?)
    } else {
        Factor::Hybrid(HybridGaussianFactor::with_offsets(discrete_keys, residuals)?)
    };
    Ok((mixture.into(), Some(residual)))
}
