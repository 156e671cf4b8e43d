//! Principal component analysis of genotype dosages.
//!
//! Missing calls are replaced by the locus mean before centring, so they
//! contribute nothing to the covariance. Scores come from the
//! eigen-decomposition of the individual × individual Gram matrix, which is
//! the small side for marker panels.

use crate::core::error::{DartError, Result};
use crate::genotype::{GenotypeMatrix, MISSING};
use log::{debug, info};
use nalgebra::{DMatrix, SymmetricEigen};
use serde::Serialize;

/// Relative eigenvalue below which an axis is treated as numerical noise.
const EIGEN_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct PcaResult {
    /// Scores, individuals × axes, rows in the order of `rows`.
    pub scores: DMatrix<f64>,
    pub eigenvalues: Vec<f64>,
    pub variance_explained: Vec<f64>,
    pub rows: Vec<usize>,
}

/// One row of the PCA score table.
#[derive(Debug, Clone, Serialize)]
pub struct PcaScoreRow {
    pub id: String,
    pub pop: String,
    pub axis: usize,
    pub score: f64,
    pub variance_explained: f64,
}

/// Mean-imputed, column-centred dosages for `rows` (rows × loci).
pub fn centered_dosages(gm: &GenotypeMatrix, rows: &[usize]) -> DMatrix<f64> {
    let mut x: DMatrix<f64> = DMatrix::zeros(rows.len(), gm.n_loc());
    for l in 0..gm.n_loc() {
        let (sum, called) = rows.iter().fold((0.0, 0usize), |(s, n), &i| {
            match gm.calls[(i, l)] {
                MISSING => (s, n),
                c => (s + c as f64, n + 1),
            }
        });
        if called == 0 {
            continue;
        }
        let mean = sum / called as f64;
        for (r, &i) in rows.iter().enumerate() {
            x[(r, l)] = match gm.calls[(i, l)] {
                MISSING => 0.0,
                c => c as f64 - mean,
            };
        }
    }
    x
}

/// PCA of the individuals at `rows`, keeping at most `n_axes` axes with a
/// non-negligible eigenvalue.
pub fn pca_rows(gm: &GenotypeMatrix, rows: &[usize], n_axes: usize) -> Result<PcaResult> {
    if rows.len() < 2 {
        return Err(DartError::InvalidInput(format!(
            "PCA needs at least two individuals, got {}",
            rows.len()
        )));
    }
    if n_axes == 0 {
        return Err(DartError::InvalidInput(
            "PCA needs at least one axis".to_string(),
        ));
    }

    let x = centered_dosages(gm, rows);
    let gram = &x * x.transpose();
    let eigen = SymmetricEigen::new(gram);

    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let total: f64 = eigen.eigenvalues.iter().filter(|&&v| v > 0.0).sum();
    if total <= 0.0 {
        return Err(DartError::Numerical(
            "no genetic variation among the selected individuals".to_string(),
        ));
    }

    let kept: Vec<usize> = order
        .into_iter()
        .filter(|&k| eigen.eigenvalues[k] > EIGEN_TOLERANCE * total)
        .take(n_axes)
        .collect();
    debug!(
        "PCA kept {} of {} requested axes (total variance {:.4})",
        kept.len(),
        n_axes,
        total
    );

    let mut scores: DMatrix<f64> = DMatrix::zeros(rows.len(), kept.len());
    for (axis, &k) in kept.iter().enumerate() {
        let scale = eigen.eigenvalues[k].sqrt();
        for r in 0..rows.len() {
            scores[(r, axis)] = eigen.eigenvectors[(r, k)] * scale;
        }
    }

    let eigenvalues: Vec<f64> = kept.iter().map(|&k| eigen.eigenvalues[k]).collect();
    let variance_explained = eigenvalues.iter().map(|v| v / total).collect();
    Ok(PcaResult {
        scores,
        eigenvalues,
        variance_explained,
        rows: rows.to_vec(),
    })
}

/// PCA of all individuals in `gm`.
pub fn pca(gm: &GenotypeMatrix, n_axes: usize) -> Result<PcaResult> {
    let result = pca_rows(gm, &gm.all_rows(), n_axes)?;
    info!(
        "PCA on {} individuals × {} loci: {} axes, first explains {:.1}%",
        gm.n_ind(),
        gm.n_loc(),
        result.eigenvalues.len(),
        result.variance_explained.first().copied().unwrap_or(0.0) * 100.0
    );
    Ok(result)
}

impl PcaResult {
    /// Long-format score table for writing.
    pub fn score_rows(&self, gm: &GenotypeMatrix) -> Vec<PcaScoreRow> {
        let mut out = Vec::with_capacity(self.rows.len() * self.eigenvalues.len());
        for (r, &i) in self.rows.iter().enumerate() {
            for axis in 0..self.eigenvalues.len() {
                out.push(PcaScoreRow {
                    id: gm.ind_names[i].clone(),
                    pop: gm.pop[i].clone(),
                    axis: axis + 1,
                    score: self.scores[(r, axis)],
                    variance_explained: self.variance_explained[axis],
                });
            }
        }
        out
    }
}
