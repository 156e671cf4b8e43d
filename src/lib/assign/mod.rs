//! Assignment of individuals of unknown provenance to candidate source
//! populations.
//!
//! [`assign_mahalanobis`] places the unknown and every candidate population
//! in a common PCA space and asks, for each population, whether the unknown
//! lies within the population's multivariate spread.

pub mod mahalanobis;

pub use mahalanobis::{assign_mahalanobis, mahalanobis_squared};

use crate::core::error::{DartError, Result};
use crate::genotype::{DataType, GenotypeMatrix, MISSING};
use serde::Serialize;

/// Parameters of the Mahalanobis assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignConfig {
    /// Upper bound on the number of PCA axes used.
    pub dim_limit: usize,
    /// Confidence level; a population is retained when `p >= 1 - plevel`.
    pub plevel: f64,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            dim_limit: 8,
            plevel: 0.999,
        }
    }
}

impl AssignConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dim_limit == 0 {
            return Err(DartError::InvalidInput(
                "dim_limit must be at least 1".to_string(),
            ));
        }
        if !(self.plevel > 0.0 && self.plevel < 1.0) {
            return Err(DartError::ThresholdValidation {
                field: "plevel".to_string(),
                min: 0.0,
                max: 1.0,
                value: self.plevel,
            });
        }
        Ok(())
    }
}

/// Outcome of testing one unknown against one candidate population.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assignment {
    pub unknown: String,
    pub pop: String,
    pub n_ind: usize,
    pub axes: usize,
    pub d2: f64,
    pub pvalue: f64,
    pub assigned: bool,
    pub private_alleles: usize,
}

/// Number of alleles carried by individual `unknown` that no individual at
/// `rows` carries. Loci where `unknown` or every individual at `rows` is
/// missing are ignored.
pub fn private_alleles(gm: &GenotypeMatrix, unknown: usize, rows: &[usize]) -> usize {
    (0..gm.n_loc())
        .filter_map(|l| {
            let call = gm.get(unknown, l)?;
            let (mut has_ref, mut has_alt, mut called) = (false, false, false);
            for &i in rows {
                match gm.calls[(i, l)] {
                    MISSING => continue,
                    c => {
                        called = true;
                        let (r, a) = allele_presence(gm.data_type, c);
                        has_ref |= r;
                        has_alt |= a;
                    }
                }
            }
            if !called {
                return None;
            }
            let (r, a) = allele_presence(gm.data_type, call);
            Some((r && !has_ref) as usize + (a && !has_alt) as usize)
        })
        .sum()
}

/// Which of the two allele states a call carries.
#[inline]
fn allele_presence(data_type: DataType, call: u8) -> (bool, bool) {
    match data_type {
        DataType::Snp => (call < 2, call > 0),
        DataType::SilicoDart => (call == 0, call == 1),
    }
}
