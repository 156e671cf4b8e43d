//! Locus and individual filters for a [`GenotypeMatrix`].
//!
//! Every filter implements either [`LocusFilter`] or [`IndividualFilter`],
//! a single predicate answering whether one locus (or individual) passes.
//! [`apply_locus_filter`] and [`apply_individual_filter`] evaluate a
//! predicate over the whole matrix and return the retained subset;
//! [`run_filters`] chains the configured filters in a fixed order.

pub mod individuals;
pub mod loci;

pub use individuals::{HeterozygosityFilter, IndividualCallRateFilter};
pub use loci::{HweFilter, LocusCallRateFilter, MafFilter, MonomorphFilter};

use crate::core::error::{DartError, Result};
use crate::genotype::GenotypeMatrix;
use log::info;
use rayon::prelude::*;

/// A predicate over loci.
///
/// Implementors return `true` when locus `locus` of `gm` passes.
pub trait LocusFilter: Send + Sync {
    /// Short description used in log messages.
    fn name(&self) -> &'static str;

    fn keep_locus(&self, gm: &GenotypeMatrix, locus: usize) -> bool;
}

/// A predicate over individuals.
pub trait IndividualFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn keep_individual(&self, gm: &GenotypeMatrix, ind: usize) -> bool;
}

/// Keep the loci passing `filter`.
pub fn apply_locus_filter(gm: &GenotypeMatrix, filter: &dyn LocusFilter) -> Result<GenotypeMatrix> {
    let kept: Vec<usize> = (0..gm.n_loc())
        .into_par_iter()
        .filter(|&l| filter.keep_locus(gm, l))
        .collect();
    info!(
        "Filtered by {}: {} -> {} loci",
        filter.name(),
        gm.n_loc(),
        kept.len()
    );
    if kept.is_empty() {
        return Err(DartError::EmptyData(format!(
            "no loci left after filtering by {}",
            filter.name()
        )));
    }
    gm.subset_loci(&kept)
}

/// Keep the individuals passing `filter`.
pub fn apply_individual_filter(
    gm: &GenotypeMatrix,
    filter: &dyn IndividualFilter,
) -> Result<GenotypeMatrix> {
    let kept: Vec<usize> = (0..gm.n_ind())
        .into_par_iter()
        .filter(|&i| filter.keep_individual(gm, i))
        .collect();
    info!(
        "Filtered by {}: {} -> {} individuals",
        filter.name(),
        gm.n_ind(),
        kept.len()
    );
    if kept.is_empty() {
        return Err(DartError::EmptyData(format!(
            "no individuals left after filtering by {}",
            filter.name()
        )));
    }
    gm.subset_individuals(&kept)
}

/// Thresholds for [`run_filters`]. A `None` threshold disables its filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub min_ind_call_rate: Option<f64>,
    pub min_loc_call_rate: Option<f64>,
    pub drop_monomorphs: bool,
    pub min_maf: Option<f64>,
    pub hwe_alpha: Option<f64>,
    pub hwe_bonferroni: bool,
    pub hwe_per_population: bool,
    /// Populations with fewer called individuals are skipped by the HWE test.
    pub hwe_min_n: usize,
    pub max_ind_het: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_ind_call_rate: None,
            min_loc_call_rate: None,
            drop_monomorphs: false,
            min_maf: None,
            hwe_alpha: None,
            hwe_bonferroni: false,
            hwe_per_population: true,
            hwe_min_n: 5,
            max_ind_het: None,
        }
    }
}

fn check_unit(field: &str, value: Option<f64>, max: f64) -> Result<()> {
    match value {
        Some(v) if !(0.0..=max).contains(&v) || v.is_nan() => {
            Err(DartError::ThresholdValidation {
                field: field.to_string(),
                min: 0.0,
                max,
                value: v,
            })
        }
        _ => Ok(()),
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit("min_ind_call_rate", self.min_ind_call_rate, 1.0)?;
        check_unit("min_loc_call_rate", self.min_loc_call_rate, 1.0)?;
        check_unit("min_maf", self.min_maf, 0.5)?;
        check_unit("hwe_alpha", self.hwe_alpha, 1.0)?;
        check_unit("max_ind_het", self.max_ind_het, 1.0)?;
        Ok(())
    }

    /// True when no filter is enabled.
    pub fn is_noop(&self) -> bool {
        self.min_ind_call_rate.is_none()
            && self.min_loc_call_rate.is_none()
            && !self.drop_monomorphs
            && self.min_maf.is_none()
            && self.hwe_alpha.is_none()
            && self.max_ind_het.is_none()
    }
}

/// Apply the configured filters: individual call rate, locus call rate,
/// monomorphic loci, minor allele frequency, Hardy-Weinberg equilibrium,
/// then individual heterozygosity.
pub fn run_filters(gm: &GenotypeMatrix, config: &FilterConfig) -> Result<GenotypeMatrix> {
    config.validate()?;
    if config.min_maf.is_some() {
        gm.require_snp("MAF filtering")?;
    }
    if config.hwe_alpha.is_some() {
        gm.require_snp("HWE filtering")?;
    }
    if config.max_ind_het.is_some() {
        gm.require_snp("Heterozygosity filtering")?;
    }

    let mut current = gm.clone();
    if let Some(t) = config.min_ind_call_rate {
        current = apply_individual_filter(&current, &IndividualCallRateFilter::new(t))?;
    }
    if let Some(t) = config.min_loc_call_rate {
        current = apply_locus_filter(&current, &LocusCallRateFilter::new(t))?;
    }
    if config.drop_monomorphs {
        current = apply_locus_filter(&current, &MonomorphFilter)?;
    }
    if let Some(m) = config.min_maf {
        current = apply_locus_filter(&current, &MafFilter::for_matrix(&current, m))?;
    }
    if let Some(alpha) = config.hwe_alpha {
        let hwe = HweFilter::for_matrix(
            &current,
            alpha,
            config.hwe_bonferroni,
            config.hwe_per_population,
            config.hwe_min_n,
        );
        current = apply_locus_filter(&current, &hwe)?;
    }
    if let Some(h) = config.max_ind_het {
        current = apply_individual_filter(&current, &HeterozygosityFilter::new(h))?;
    }

    info!(
        "Filtering complete: {} x {} -> {} x {} (individuals x loci)",
        gm.n_ind(),
        gm.n_loc(),
        current.n_ind(),
        current.n_loc()
    );
    Ok(current)
}
