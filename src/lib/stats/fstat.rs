//! Fixation indices.
//!
//! [`basic_stats`] follows Nei (1987) with the sample-size corrections used
//! by hierfstat; [`pairwise_fst`] is the Weir & Cockerham (1984) θ estimator
//! for every population pair, summing variance components over loci.

use crate::core::error::{DartError, Result};
use crate::genotype::{DataType, GenotypeMatrix};
use itertools::Itertools;
use log::{info, warn};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::Serialize;

/// Nei (1987) gene diversity components for one locus.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocusFStats {
    pub locus: String,
    pub ho: f64,
    pub hs: f64,
    pub ht: f64,
    pub dst: f64,
    pub fst: f64,
    pub fis: f64,
}

/// Overall values: means over loci, F-statistics as ratios of means.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverallFStats {
    pub ho: f64,
    pub hs: f64,
    pub ht: f64,
    pub dst: f64,
    pub fst: f64,
    pub fis: f64,
}

#[derive(Debug, Clone)]
pub struct BasicStats {
    pub per_locus: Vec<LocusFStats>,
    pub overall: OverallFStats,
}

/// Per-population summary of one locus: called count, alternate allele
/// frequency and observed heterozygosity.
#[derive(Debug, Clone, Copy)]
struct PopLocus {
    n: f64,
    p: f64,
    ho: f64,
}

fn pop_locus(gm: &GenotypeMatrix, loc: usize, rows: &[usize]) -> Option<PopLocus> {
    let (hom_ref, het, hom_alt) = gm.genotype_counts(loc, rows);
    let n = hom_ref + het + hom_alt;
    if n == 0 {
        return None;
    }
    Some(PopLocus {
        n: n as f64,
        p: (het + 2 * hom_alt) as f64 / (2 * n) as f64,
        ho: het as f64 / n as f64,
    })
}

fn nei_locus(locus: &str, pops: &[PopLocus]) -> Option<LocusFStats> {
    if pops.is_empty() {
        return None;
    }
    let np = pops.len() as f64;
    let mn = np / pops.iter().map(|s| 1.0 / s.n).sum::<f64>();
    if mn <= 1.0 {
        return None;
    }
    let m_ho = pops.iter().map(|s| s.ho).sum::<f64>() / np;
    let m_sp2 = pops
        .iter()
        .map(|s| s.p * s.p + (1.0 - s.p) * (1.0 - s.p))
        .sum::<f64>()
        / np;
    let p_bar = pops.iter().map(|s| s.p).sum::<f64>() / np;
    let mp2 = p_bar * p_bar + (1.0 - p_bar) * (1.0 - p_bar);

    let hs = mn / (mn - 1.0) * (1.0 - m_sp2 - m_ho / (2.0 * mn));
    let ht = 1.0 - mp2 + hs / (mn * np) - m_ho / (2.0 * mn * np);
    let dst = ht - hs;
    Some(LocusFStats {
        locus: locus.to_string(),
        ho: m_ho,
        hs,
        ht,
        dst,
        fst: if ht > 0.0 { dst / ht } else { f64::NAN },
        fis: if hs > 0.0 { 1.0 - m_ho / hs } else { f64::NAN },
    })
}

fn nei_per_locus(gm: &GenotypeMatrix) -> Vec<LocusFStats> {
    let groups = gm.pop_groups();
    (0..gm.n_loc())
        .into_par_iter()
        .filter_map(|l| {
            let pops: Vec<PopLocus> = groups
                .iter()
                .filter_map(|(_, rows)| pop_locus(gm, l, rows))
                .collect();
            nei_locus(&gm.loc_names[l], &pops)
        })
        .collect()
}

fn nei_overall(per_locus: &[LocusFStats]) -> OverallFStats {
    let n = per_locus.len() as f64;
    let mean = |f: fn(&LocusFStats) -> f64| per_locus.iter().map(f).sum::<f64>() / n;
    let ho = mean(|s| s.ho);
    let hs = mean(|s| s.hs);
    let ht = mean(|s| s.ht);
    let dst = mean(|s| s.dst);
    OverallFStats {
        ho,
        hs,
        ht,
        dst,
        fst: if ht > 0.0 { dst / ht } else { f64::NAN },
        fis: if hs > 0.0 { 1.0 - ho / hs } else { f64::NAN },
    }
}

/// Nei (1987) Ho, Hs, Ht, Dst, Fst and Fis per locus and overall.
pub fn basic_stats(gm: &GenotypeMatrix) -> Result<BasicStats> {
    gm.require_snp("F-statistics")?;
    let per_locus = nei_per_locus(gm);

    if per_locus.is_empty() {
        return Err(DartError::EmptyData(
            "no locus has enough called individuals for F-statistics".to_string(),
        ));
    }
    if per_locus.len() < gm.n_loc() {
        warn!(
            "{} loci skipped for F-statistics (too few calls)",
            gm.n_loc() - per_locus.len()
        );
    }

    let overall = nei_overall(&per_locus);
    info!(
        "Basic statistics over {} loci: Ho = {:.4}, Hs = {:.4}, Ht = {:.4}, Fst = {:.4}",
        per_locus.len(),
        overall.ho,
        overall.hs,
        overall.ht,
        overall.fst
    );
    Ok(BasicStats { per_locus, overall })
}

/// Overall Nei Fst without logging; `None` when undefined.
pub fn overall_fst(gm: &GenotypeMatrix) -> Option<f64> {
    if gm.data_type != DataType::Snp {
        return None;
    }
    let per_locus = nei_per_locus(gm);
    if per_locus.is_empty() {
        return None;
    }
    Some(nei_overall(&per_locus).fst).filter(|f| f.is_finite())
}

/// Weir & Cockerham variance components `(a, a + b + c)` for two samples.
fn wc_components(x: PopLocus, y: PopLocus) -> Option<(f64, f64)> {
    let n_bar = (x.n + y.n) / 2.0;
    if n_bar <= 1.0 {
        return None;
    }
    let n_c = 2.0 * n_bar - (x.n * x.n + y.n * y.n) / (2.0 * n_bar);
    let p_bar = (x.n * x.p + y.n * y.p) / (2.0 * n_bar);
    let s2 = (x.n * (x.p - p_bar).powi(2) + y.n * (y.p - p_bar).powi(2)) / n_bar;
    let h_bar = (x.n * x.ho + y.n * y.ho) / (2.0 * n_bar);
    let pq = p_bar * (1.0 - p_bar);

    let a = n_bar / n_c * (s2 - (pq - s2 / 2.0 - h_bar / 4.0) / (n_bar - 1.0));
    let b = n_bar / (n_bar - 1.0) * (pq - s2 / 2.0 - (2.0 * n_bar - 1.0) / (4.0 * n_bar) * h_bar);
    let c = h_bar / 2.0;
    Some((a, a + b + c))
}

/// Pairwise Fst between two populations, and the number of loci used.
pub fn fst_between(gm: &GenotypeMatrix, rows_a: &[usize], rows_b: &[usize]) -> (f64, usize) {
    let (num, den, used) = (0..gm.n_loc())
        .filter_map(|l| {
            let x = pop_locus(gm, l, rows_a)?;
            let y = pop_locus(gm, l, rows_b)?;
            wc_components(x, y)
        })
        .fold((0.0, 0.0, 0usize), |(n, d, k), (a, abc)| (n + a, d + abc, k + 1));
    let fst = if den > 0.0 { num / den } else { f64::NAN };
    (fst, used)
}

/// One entry of the pairwise Fst table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PairwiseFstRow {
    pub pop1: String,
    pub pop2: String,
    pub fst: f64,
    pub n_loci: usize,
}

/// Symmetric matrix of Weir & Cockerham Fst with a zero diagonal.
#[derive(Debug, Clone)]
pub struct PairwiseFst {
    pub pops: Vec<String>,
    pub values: DMatrix<f64>,
    pub rows: Vec<PairwiseFstRow>,
}

/// Weir & Cockerham (1984) Fst for every pair of populations.
pub fn pairwise_fst(gm: &GenotypeMatrix) -> Result<PairwiseFst> {
    gm.require_snp("Pairwise Fst")?;
    let groups = gm.pop_groups();
    if groups.len() < 2 {
        return Err(DartError::InvalidInput(format!(
            "pairwise Fst needs at least two populations, found {}",
            groups.len()
        )));
    }

    let pairs: Vec<(usize, usize)> = (0..groups.len()).tuple_combinations().collect();
    let rows: Vec<PairwiseFstRow> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let (fst, n_loci) = fst_between(gm, &groups[i].1, &groups[j].1);
            PairwiseFstRow {
                pop1: groups[i].0.clone(),
                pop2: groups[j].0.clone(),
                fst,
                n_loci,
            }
        })
        .collect();

    let mut values = DMatrix::zeros(groups.len(), groups.len());
    for (&(i, j), row) in pairs.iter().zip(&rows) {
        values[(i, j)] = row.fst;
        values[(j, i)] = row.fst;
    }

    info!("Computed pairwise Fst for {} population pairs", rows.len());
    Ok(PairwiseFst {
        pops: groups.into_iter().map(|(p, _)| p).collect(),
        values,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pops(a: &[Vec<u8>], b: &[Vec<u8>]) -> GenotypeMatrix {
        let rows: Vec<Vec<u8>> = a.iter().chain(b.iter()).cloned().collect();
        let n_loc = rows[0].len();
        GenotypeMatrix::from_rows(
            DataType::Snp,
            &rows,
            (0..rows.len()).map(|i| format!("ind{}", i)).collect(),
            a.iter()
                .map(|_| "A".to_string())
                .chain(b.iter().map(|_| "B".to_string()))
                .collect(),
            (0..n_loc).map(|l| format!("L{}", l)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn fixed_differences_give_fst_one() {
        let gm = two_pops(&vec![vec![0, 0]; 10], &vec![vec![2, 2]; 10]);
        let stats = basic_stats(&gm).unwrap();
        assert!((stats.overall.fst - 1.0).abs() < 1e-12);
        assert_eq!(overall_fst(&gm), Some(stats.overall.fst));
        assert!((stats.per_locus[0].ht - 0.5).abs() < 1e-12);
        assert!(stats.per_locus[0].hs.abs() < 1e-12);

        let pw = pairwise_fst(&gm).unwrap();
        assert!((pw.values[(0, 1)] - 1.0).abs() < 1e-12);
        assert_eq!(pw.values[(0, 1)], pw.values[(1, 0)]);
        assert_eq!(pw.values[(0, 0)], 0.0);
        assert_eq!(pw.rows[0].n_loci, 2);
    }

    #[test]
    fn identical_populations_have_no_differentiation() {
        let sample = vec![vec![0, 1], vec![1, 2], vec![2, 1], vec![1, 0], vec![0, 2]];
        let gm = two_pops(&sample, &sample);
        let stats = basic_stats(&gm).unwrap();
        assert!(stats.overall.fst <= 0.0 + 1e-12);
        let pw = pairwise_fst(&gm).unwrap();
        assert!(pw.values[(0, 1)] < 0.0 + 1e-12);
    }

    #[test]
    fn partial_differentiation_between_zero_and_one() {
        let a = vec![vec![0], vec![0], vec![1], vec![0], vec![1], vec![0]];
        let b = vec![vec![2], vec![1], vec![2], vec![2], vec![1], vec![2]];
        let gm = two_pops(&a, &b);
        let (fst, used) = fst_between(&gm, &gm.pop_indices("A"), &gm.pop_indices("B"));
        assert_eq!(used, 1);
        assert!(fst > 0.2 && fst < 1.0, "fst = {}", fst);
    }

    #[test]
    fn single_population_rejected_for_pairwise() {
        let gm = two_pops(&[vec![0], vec![1]], &[]);
        assert!(pairwise_fst(&gm).is_err());
    }
}
