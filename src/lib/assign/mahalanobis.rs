//! Mahalanobis-distance assignment in PCA space.

use crate::assign::{private_alleles, AssignConfig, Assignment};
use crate::core::error::{DartError, Result};
use crate::core::special::chi_square_cdf;
use crate::genotype::GenotypeMatrix;
use crate::stats::pca::pca_rows;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

/// Ridge added to the diagonal of a singular covariance, relative to its
/// mean variance.
const RIDGE_FACTOR: f64 = 1e-6;

/// Squared Mahalanobis distance of `point` from the rows of `sample`.
///
/// The covariance uses the `n - 1` denominator. When it cannot be inverted a
/// small ridge is added to its diagonal before giving up.
pub fn mahalanobis_squared(sample: &DMatrix<f64>, point: &DVector<f64>) -> Result<f64> {
    let n = sample.nrows();
    let k = sample.ncols();
    if n < 2 {
        return Err(DartError::InvalidInput(format!(
            "covariance needs at least two observations, got {}",
            n
        )));
    }
    if point.len() != k {
        return Err(DartError::DimensionMismatch {
            expected: format!("{} coordinates", k),
            actual: format!("{} coordinates", point.len()),
        });
    }

    let centroid: DVector<f64> = sample.row_mean().transpose();
    let centred = DMatrix::from_fn(n, k, |i, j| sample[(i, j)] - centroid[j]);
    let cov = centred.transpose() * &centred / (n - 1) as f64;

    let inverse = match cov.clone().try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => inv,
        _ => {
            let ridge = RIDGE_FACTOR * (cov.trace() / k as f64).max(f64::EPSILON);
            debug!("Singular covariance, adding ridge {:.3e}", ridge);
            let regularised = cov + DMatrix::identity(k, k) * ridge;
            regularised.try_inverse().ok_or_else(|| {
                DartError::Numerical("covariance matrix is not invertible".to_string())
            })?
        }
    };

    let diff = point - &centroid;
    Ok((diff.transpose() * inverse * &diff)[(0, 0)])
}

/// Test whether individual `unknown` could originate from each population in
/// `gm`.
///
/// The unknown is removed from its own population before the comparison.
/// Populations with fewer than two remaining individuals are skipped. The
/// number of axes is `min(dim_limit, rank, smallest population - 1)`.
/// Results are sorted by increasing distance.
pub fn assign_mahalanobis(
    gm: &GenotypeMatrix,
    unknown: &str,
    config: &AssignConfig,
) -> Result<Vec<Assignment>> {
    config.validate()?;
    gm.require_snp("Mahalanobis assignment")?;
    let target = gm.ind_index(unknown).ok_or_else(|| {
        DartError::InvalidInput(format!("individual {} not found", unknown))
    })?;

    let mut candidates: Vec<(String, Vec<usize>)> = Vec::new();
    for (pop, rows) in gm.pop_groups() {
        let rows: Vec<usize> = rows.into_iter().filter(|&i| i != target).collect();
        if rows.len() < 2 {
            warn!(
                "Population {} has {} individual(s) besides {}, skipped",
                pop,
                rows.len(),
                unknown
            );
            continue;
        }
        candidates.push((pop, rows));
    }
    if candidates.is_empty() {
        return Err(DartError::EmptyData(
            "no candidate population has at least two individuals".to_string(),
        ));
    }

    let mut all_rows: Vec<usize> = candidates.iter().flat_map(|(_, r)| r.clone()).collect();
    all_rows.push(target);
    let pca = pca_rows(gm, &all_rows, config.dim_limit)?;

    let smallest = candidates.iter().map(|(_, r)| r.len()).min().unwrap_or(0);
    let axes = config
        .dim_limit
        .min(pca.eigenvalues.len())
        .min(smallest.saturating_sub(1));
    if axes == 0 {
        return Err(DartError::Numerical(
            "no PCA axis available for assignment".to_string(),
        ));
    }
    debug!(
        "Assigning {} with {} axes over {} candidate populations",
        unknown,
        axes,
        candidates.len()
    );

    let scores = pca.scores.columns(0, axes).into_owned();
    let point: DVector<f64> = scores.row(all_rows.len() - 1).transpose();

    let mut offset = 0;
    let mut results = Vec::with_capacity(candidates.len());
    for (pop, rows) in &candidates {
        let sample = scores.rows(offset, rows.len()).into_owned();
        offset += rows.len();
        let d2 = mahalanobis_squared(&sample, &point)?;
        let pvalue = (1.0 - chi_square_cdf(d2, axes)).clamp(0.0, 1.0);
        results.push(Assignment {
            unknown: unknown.to_string(),
            pop: pop.clone(),
            n_ind: rows.len(),
            axes,
            d2,
            pvalue,
            assigned: pvalue >= 1.0 - config.plevel,
            private_alleles: private_alleles(gm, target, rows),
        });
    }
    results.sort_by(|a, b| a.d2.total_cmp(&b.d2));

    info!(
        "{} assigned to {} of {} candidate populations",
        unknown,
        results.iter().filter(|r| r.assigned).count(),
        results.len()
    );
    Ok(results)
}
