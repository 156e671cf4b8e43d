//! Forward-in-time simulation of diploid populations under selection,
//! drift and migration.
//!
//! A run starts from a [`ReferenceTable`] describing every locus and a
//! validated [`SimConfig`]. Each generation the [`Simulation`] engine runs:
//!
//! 1. [`reproduction`]: mating-success draw per male, negative-binomial
//!    broods, gametes with optional recombination
//! 2. [`selection`]: multiplicative fitness over deleterious loci, then
//!    absolute or relative viability selection and regulation back to the
//!    founding size
//! 3. [`migration`]: same-sex swaps between connected populations on
//!    migration generations
//!
//! Summaries and genotype snapshots are collected in a
//! [`SimulationOutcome`].

pub mod engine;
pub mod individual;
pub mod migration;
pub mod params;
pub mod reference;
pub mod reproduction;
pub mod selection;

pub use engine::{reference_rng, GenerationSummary, Simulation, SimulationOutcome, Snapshot};
pub use individual::{
    initialize_population, snapshot, Haplotype, Individual, Population, Sex, ANCESTRAL, DERIVED,
    NEUTRAL_MASK,
};
pub use migration::{migrate, MigrationEvent};
pub use params::{DispersalType, MigrationConfig, SelectionModel, SimConfig};
pub use reference::{
    read_reference_table, write_reference_table, Dominance, InitialFrequency, LocusKind,
    LocusRecord, ReferenceTable, TableParams,
};
pub use reproduction::{make_gamete, reproduce};
pub use selection::{fitness, regulate, select, Survivor};
