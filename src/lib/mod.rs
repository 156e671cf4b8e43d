//! dartrs: population genomics on SNP and silicodart genotype tables
//!
//! The library provides:
//! 1. A dense genotype-matrix type with tab-separated I/O and export to
//!    STRUCTURE and NewHybrids input formats
//! 2. Locus and individual filters (call rate, MAF, monomorphs, Hardy-Weinberg,
//!    heterozygosity)
//! 3. Population statistics: heterozygosity, Nei and Weir & Cockerham
//!    F-statistics, allele frequencies, PCA
//! 4. Assignment of individuals of unknown origin by Mahalanobis distance
//! 5. A forward-in-time population simulator with selection and migration
//!
//! # Modules
//!
//! - [`core`]: errors, I/O, concurrency and numerical helpers
//! - [`genotype`]: the [`genotype::GenotypeMatrix`] and its file formats
//! - [`filter`]: locus and individual filters
//! - [`stats`]: population-genetic statistics
//! - [`assign`]: provenance assignment
//! - [`sim`]: the population simulator
//! - [`utils`]: re-exports of the most used helpers

pub mod assign;
pub mod core;
pub mod filter;
pub mod genotype;
pub mod sim;
pub mod stats;
pub mod utils;
