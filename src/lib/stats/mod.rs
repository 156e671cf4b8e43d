//! Population-genetic statistics on a [`GenotypeMatrix`](crate::genotype::GenotypeMatrix)
//!
//! - [`heterozygosity`]: Ho, He, uHe and FIS per population, per-individual
//!   heterozygosity, allele frequencies
//! - [`fstat`]: Nei (1987) F-statistics and Weir & Cockerham pairwise Fst
//! - [`hwe`]: exact Hardy-Weinberg test
//! - [`pca`]: principal components of genotype dosages

pub mod fstat;
pub mod heterozygosity;
pub mod hwe;
pub mod pca;

pub use fstat::{basic_stats, fst_between, overall_fst, pairwise_fst, BasicStats, PairwiseFst};
pub use heterozygosity::{
    allele_frequencies, individual_heterozygosity, population_heterozygosity,
};
pub use hwe::hwe_exact_pvalue;
pub use pca::{centered_dosages, pca, pca_rows, PcaResult};
