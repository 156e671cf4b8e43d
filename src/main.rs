//! dartrs - population genetics on DArT-style genotype matrices
//!
//! dartrs reads SNP and silicodart genotype tables (individuals × loci with a
//! population label per individual), filters and summarises them, assigns
//! individuals of unknown origin to candidate populations, exports input
//! files for STRUCTURE and NewHybrids, and runs a forward-time simulator of
//! diploid populations under selection, drift and migration.
//!
//! # Tools
//!
//! - `simulate`: forward-time simulation from a reference table
//! - `filter`: call-rate, monomorphism, MAF, HWE and heterozygosity filters
//! - `stats`: heterozygosity, F-statistics, allele frequencies and PCA
//! - `assign`: Mahalanobis assignment of unknown individuals
//! - `export`: STRUCTURE and NewHybrids input files
//!
//! # Usage
//!
//! ```bash
//! # Simulate two populations for 50 generations, keeping the last one
//! dartrs simulate --output runs/sim --pops 2 --generations 50 --store 50
//!
//! # Drop sparse and monomorphic loci
//! dartrs filter genotypes.tsv --min-loc-call-rate 0.95 --monomorphs -o filtered.tsv.gz
//!
//! # Pairwise Fst
//! dartrs stats filtered.tsv.gz --report fst
//!
//! # Where could sample X17 come from?
//! dartrs assign filtered.tsv.gz --unknown X17
//! ```

extern crate dartrs_lib;
pub mod commands;
use anyhow::Result;
use dartrs_lib::utils;
use env_logger::Env;
use log::*;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Population genetics toolkit for SNP and silicodart genotype matrices
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Simulate populations forward in time under selection and migration
    Simulate(commands::SimulateArgs),
    /// Filter loci and individuals of a genotype table
    Filter(commands::FilterArgs),
    /// Population-genetic summary statistics
    Stats(commands::StatsArgs),
    /// Assign individuals of unknown origin to candidate populations
    Assign(commands::AssignArgs),
    /// Write input files for STRUCTURE or NewHybrids
    Export(commands::ExportArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Simulate(args) => commands::run_simulate(args)?,
            Subcommand::Filter(args) => commands::run_filter(args)?,
            Subcommand::Stats(args) => commands::run_stats(args)?,
            Subcommand::Assign(args) => commands::run_assign(args)?,
            Subcommand::Export(args) => commands::run_export(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
