//! Locus filters.

use crate::filter::LocusFilter;
use crate::genotype::{DataType, GenotypeMatrix, MISSING};
use crate::stats::hwe::hwe_exact_pvalue;

/// Keeps loci called in at least `threshold` of the individuals.
pub struct LocusCallRateFilter {
    threshold: f64,
}

impl LocusCallRateFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl LocusFilter for LocusCallRateFilter {
    fn name(&self) -> &'static str {
        "locus call rate"
    }

    #[inline]
    fn keep_locus(&self, gm: &GenotypeMatrix, locus: usize) -> bool {
        gm.locus_call_rate(locus) >= self.threshold
    }
}

/// Keeps loci whose minor allele frequency is at least `min_maf`.
pub struct MafFilter {
    min_maf: f64,
    rows: Vec<usize>,
}

impl MafFilter {
    pub fn for_matrix(gm: &GenotypeMatrix, min_maf: f64) -> Self {
        Self {
            min_maf,
            rows: gm.all_rows(),
        }
    }
}

impl LocusFilter for MafFilter {
    fn name(&self) -> &'static str {
        "minor allele frequency"
    }

    fn keep_locus(&self, gm: &GenotypeMatrix, locus: usize) -> bool {
        match gm.alt_allele_frequency(locus, &self.rows) {
            Some(p) => p.min(1.0 - p) >= self.min_maf,
            None => false,
        }
    }
}

/// Drops loci showing a single call state, and loci nobody was called at.
pub struct MonomorphFilter;

impl LocusFilter for MonomorphFilter {
    fn name(&self) -> &'static str {
        "monomorphic loci"
    }

    fn keep_locus(&self, gm: &GenotypeMatrix, locus: usize) -> bool {
        let mut seen: Option<u8> = None;
        for &call in gm.calls.column(locus).iter() {
            if call == MISSING {
                continue;
            }
            match seen {
                None => seen = Some(call),
                Some(first) if first != call => return true,
                Some(_) => {}
            }
        }
        // SNP calls of only heterozygotes are still polymorphic
        gm.data_type == DataType::Snp && seen == Some(1)
    }
}

/// Drops loci departing from Hardy-Weinberg proportions.
///
/// With `per_population`, a locus is dropped when it fails in any population
/// with at least `min_n` called individuals; otherwise the test uses all
/// individuals pooled. The significance level is divided by the number of
/// loci when `bonferroni` is set.
pub struct HweFilter {
    threshold: f64,
    groups: Vec<Vec<usize>>,
    min_n: usize,
}

impl HweFilter {
    pub fn for_matrix(
        gm: &GenotypeMatrix,
        alpha: f64,
        bonferroni: bool,
        per_population: bool,
        min_n: usize,
    ) -> Self {
        let threshold = if bonferroni && gm.n_loc() > 0 {
            alpha / gm.n_loc() as f64
        } else {
            alpha
        };
        let groups = if per_population {
            gm.pop_groups().into_iter().map(|(_, rows)| rows).collect()
        } else {
            vec![gm.all_rows()]
        };
        Self {
            threshold,
            groups,
            min_n,
        }
    }

    /// Significance level after any multiple-testing correction.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl LocusFilter for HweFilter {
    fn name(&self) -> &'static str {
        "Hardy-Weinberg equilibrium"
    }

    fn keep_locus(&self, gm: &GenotypeMatrix, locus: usize) -> bool {
        self.groups.iter().all(|rows| {
            let (hom_ref, het, hom_alt) = gm.genotype_counts(locus, rows);
            if hom_ref + het + hom_alt < self.min_n {
                return true;
            }
            hwe_exact_pvalue(het, hom_ref, hom_alt) >= self.threshold
        })
    }
}
