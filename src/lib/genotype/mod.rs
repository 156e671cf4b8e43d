//! Genotype-matrix object and its file formats
//!
//! - [`matrix`]: the [`GenotypeMatrix`] container for SNP and silicodart calls
//! - [`table`]: tab-separated genotype tables
//! - [`export`]: STRUCTURE and NewHybrids input files

pub mod export;
pub mod matrix;
pub mod table;

pub use export::{export_genotypes, write_newhybrids, write_structure, ExportFormat};
pub use matrix::{DataType, GenotypeMatrix, MISSING};
pub use table::{read_genotype_table, write_genotype_table};
