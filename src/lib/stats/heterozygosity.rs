//! Observed and expected heterozygosity per population and per individual.

use crate::core::error::{DartError, Result};
use crate::genotype::{GenotypeMatrix, MISSING};
use log::info;
use rayon::prelude::*;
use serde::Serialize;

/// Heterozygosity summary of one population.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopHeterozygosity {
    pub pop: String,
    pub n_ind: usize,
    /// Loci with at least one call in the population.
    pub n_loc: usize,
    pub polymorphic_loci: usize,
    pub ho: f64,
    pub he: f64,
    /// He corrected for sample size, 2n / (2n - 1) per locus.
    pub uhe: f64,
    pub fis: f64,
}

/// Heterozygosity of one individual across its called loci.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndHeterozygosity {
    pub id: String,
    pub pop: String,
    pub called_loci: usize,
    pub het_loci: usize,
    pub heterozygosity: f64,
}

/// Alternate allele frequency of one population at one locus.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlleleFrequency {
    pub locus: String,
    pub pop: String,
    pub n_called: usize,
    pub alt_freq: Option<f64>,
}

fn pop_heterozygosity(gm: &GenotypeMatrix, pop: &str, rows: &[usize]) -> PopHeterozygosity {
    let mut n_loc = 0usize;
    let mut polymorphic = 0usize;
    let (mut ho_sum, mut he_sum, mut uhe_sum) = (0.0, 0.0, 0.0);

    for l in 0..gm.n_loc() {
        let (hom_ref, het, hom_alt) = gm.genotype_counts(l, rows);
        let n = hom_ref + het + hom_alt;
        if n == 0 {
            continue;
        }
        let p = (het + 2 * hom_alt) as f64 / (2 * n) as f64;
        let he = 2.0 * p * (1.0 - p);
        n_loc += 1;
        if p > 0.0 && p < 1.0 {
            polymorphic += 1;
        }
        ho_sum += het as f64 / n as f64;
        he_sum += he;
        uhe_sum += he * (2 * n) as f64 / (2 * n - 1) as f64;
    }

    let denom = n_loc.max(1) as f64;
    let ho = ho_sum / denom;
    let he = he_sum / denom;
    PopHeterozygosity {
        pop: pop.to_string(),
        n_ind: rows.len(),
        n_loc,
        polymorphic_loci: polymorphic,
        ho,
        he,
        uhe: uhe_sum / denom,
        fis: if he > 0.0 { 1.0 - ho / he } else { f64::NAN },
    }
}

/// Observed (Ho), expected (He), unbiased expected (uHe) heterozygosity and
/// FIS for every population. Means are taken over loci called in the
/// population.
pub fn population_heterozygosity(gm: &GenotypeMatrix) -> Result<Vec<PopHeterozygosity>> {
    gm.require_snp("Heterozygosity")?;
    if gm.n_ind() == 0 || gm.n_loc() == 0 {
        return Err(DartError::EmptyData(
            "heterozygosity needs at least one individual and one locus".to_string(),
        ));
    }

    let groups = gm.pop_groups();
    let report: Vec<PopHeterozygosity> = groups
        .par_iter()
        .map(|(pop, rows)| pop_heterozygosity(gm, pop, rows))
        .collect();

    info!(
        "Computed heterozygosity for {} populations over {} loci",
        report.len(),
        gm.n_loc()
    );
    Ok(report)
}

/// Proportion of called loci at which each individual is heterozygous.
pub fn individual_heterozygosity(gm: &GenotypeMatrix) -> Result<Vec<IndHeterozygosity>> {
    gm.require_snp("Individual heterozygosity")?;
    Ok((0..gm.n_ind())
        .into_par_iter()
        .map(|i| {
            let row = gm.calls.row(i);
            let called = row.iter().filter(|&&c| c != MISSING).count();
            let het = row.iter().filter(|&&c| c == 1).count();
            IndHeterozygosity {
                id: gm.ind_names[i].clone(),
                pop: gm.pop[i].clone(),
                called_loci: called,
                het_loci: het,
                heterozygosity: if called > 0 {
                    het as f64 / called as f64
                } else {
                    f64::NAN
                },
            }
        })
        .collect())
}

/// Alternate allele (or presence) frequency of every population at every locus.
pub fn allele_frequencies(gm: &GenotypeMatrix) -> Vec<AlleleFrequency> {
    let groups = gm.pop_groups();
    (0..gm.n_loc())
        .flat_map(|l| {
            groups.iter().map(move |(pop, rows)| AlleleFrequency {
                locus: gm.loc_names[l].clone(),
                pop: pop.clone(),
                n_called: gm.called_count(l, rows),
                alt_freq: gm.alt_allele_frequency(l, rows),
            })
        })
        .collect()
}
