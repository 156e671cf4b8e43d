//! Individual filters.

use crate::filter::IndividualFilter;
use crate::genotype::{GenotypeMatrix, MISSING};

/// Keeps individuals called at no fewer than `threshold` of the loci.
pub struct IndividualCallRateFilter {
    threshold: f64,
}

impl IndividualCallRateFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl IndividualFilter for IndividualCallRateFilter {
    fn name(&self) -> &'static str {
        "individual call rate"
    }

    #[inline]
    fn keep_individual(&self, gm: &GenotypeMatrix, ind: usize) -> bool {
        gm.individual_call_rate(ind) >= self.threshold
    }
}

/// Drops individuals whose observed heterozygosity exceeds `max_het`, a
/// common signature of contaminated or mixed samples.
///
/// Individuals without any call are dropped as well.
pub struct HeterozygosityFilter {
    max_het: f64,
}

impl HeterozygosityFilter {
    pub fn new(max_het: f64) -> Self {
        Self { max_het }
    }
}

impl IndividualFilter for HeterozygosityFilter {
    fn name(&self) -> &'static str {
        "individual heterozygosity"
    }

    fn keep_individual(&self, gm: &GenotypeMatrix, ind: usize) -> bool {
        let row = gm.calls.row(ind);
        let (called, het) = row.iter().fold((0usize, 0usize), |(c, h), &call| match call {
            MISSING => (c, h),
            1 => (c + 1, h + 1),
            _ => (c + 1, h),
        });
        called > 0 && het as f64 / called as f64 <= self.max_het
    }
}
