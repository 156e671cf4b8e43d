//! The generational loop.
//!
//! Each generation runs reproduction, selection and regulation for every
//! population in parallel, then migration, then reporting. Every
//! population draws from its own ChaCha stream derived from the seed, the
//! generation and the population id, so results do not depend on the
//! number of worker threads.

use crate::core::error::Result;
use crate::genotype::GenotypeMatrix;
use crate::sim::individual::{initialize_population, snapshot, Population};
use crate::sim::migration::{migrate, MigrationEvent};
use crate::sim::params::SimConfig;
use crate::sim::reference::ReferenceTable;
use crate::sim::reproduction::reproduce;
use crate::sim::selection::{fitness, regulate, select};
use crate::stats::fstat::overall_fst;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

/// Stream reserved for migration draws.
const MIGRATION_STREAM: usize = u32::MAX as usize;

fn stream_rng(seed: u64, generation: usize, stream: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(((generation as u64) << 32) | (stream as u64 & 0xFFFF_FFFF));
    rng
}

/// Generator for drawing a reference table under `seed`, on a stream no
/// generation uses.
pub fn reference_rng(seed: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::MAX);
    rng
}

/// One row of the per-generation report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub population: usize,
    pub size: usize,
    /// Mean observed heterozygosity over neutral loci.
    pub ho: f64,
    /// Mean expected heterozygosity over neutral loci.
    pub he: f64,
    pub mean_fitness: f64,
    pub genetic_load: f64,
    /// Mean derived allele frequency over deleterious loci.
    pub derived_freq: Option<f64>,
    /// Nei's Fst across all populations at neutral loci.
    pub fst: Option<f64>,
}

/// Genotypes of every population at one generation.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub generation: usize,
    pub genotypes: GenotypeMatrix,
}

#[derive(Clone, Debug, Default)]
pub struct SimulationOutcome {
    pub summaries: Vec<GenerationSummary>,
    pub snapshots: Vec<Snapshot>,
    pub migrations: Vec<MigrationEvent>,
    pub final_populations: Vec<Population>,
}

pub struct Simulation {
    config: SimConfig,
    table: ReferenceTable,
    /// Loci used for diversity statistics: neutral ones, or all when none is neutral.
    diversity_loci: Vec<usize>,
    deleterious_loci: Vec<usize>,
}

impl Simulation {
    pub fn new(config: SimConfig, table: ReferenceTable) -> Result<Self> {
        config.validate()?;
        let (neutral, deleterious): (Vec<usize>, Vec<usize>) =
            (0..table.n_loci()).partition(|&l| table.is_neutral(l));
        let diversity_loci = if neutral.is_empty() {
            warn!("No neutral loci; diversity statistics use all loci");
            (0..table.n_loci()).collect()
        } else {
            neutral
        };
        Ok(Self {
            config,
            table,
            diversity_loci,
            deleterious_loci: deleterious,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Founding populations (generation 0).
    pub fn initialize(&self) -> Vec<Population> {
        (0..self.config.number_pops)
            .into_par_iter()
            .map(|p| {
                let mut rng = stream_rng(self.config.seed, 0, p);
                initialize_population(p, &self.config, &self.table, &mut rng)
            })
            .collect()
    }

    /// Run every generation. Any extinction aborts the run.
    pub fn run(&self) -> Result<SimulationOutcome> {
        info!(
            "Simulating {} population(s) of {} for {} generations: {} loci ({} deleterious), selection {}",
            self.config.number_pops,
            self.config.population_size,
            self.config.generations,
            self.table.n_loci(),
            self.deleterious_loci.len(),
            self.config.selection
        );

        let mut outcome = SimulationOutcome::default();
        let mut pops = self.initialize();
        self.record(&pops, 0, &mut outcome)?;

        let mut flag = true;
        for generation in 1..=self.config.generations {
            pops = pops
                .into_par_iter()
                .map(|pop| self.next_generation(pop, generation))
                .collect::<Result<Vec<_>>>()?;

            if self.config.migrates_in(generation) {
                if let Some(migration) = &self.config.migration {
                    let mut rng = stream_rng(self.config.seed, generation, MIGRATION_STREAM);
                    let events = migrate(&mut pops, migration, generation, &mut flag, &mut rng);
                    outcome.migrations.extend(events);
                }
            }

            self.record(&pops, generation, &mut outcome)?;
            debug!("Generation {} complete", generation);
        }

        info!(
            "Simulation finished: {} summary rows, {} snapshots, {} migration events",
            outcome.summaries.len(),
            outcome.snapshots.len(),
            outcome.migrations.len()
        );
        outcome.final_populations = pops;
        Ok(outcome)
    }

    fn next_generation(&self, pop: Population, generation: usize) -> Result<Population> {
        let mut rng = stream_rng(self.config.seed, generation, pop.id);
        let offspring = reproduce(&pop, &self.config, &self.table, &mut rng)?;
        let survivors = select(offspring, self.config.selection, &self.table, &mut rng);
        let individuals = regulate(
            survivors,
            self.config.per_sex(),
            self.config.selection,
            generation,
            pop.id,
            &mut rng,
        )?;
        let mut next = Population {
            id: pop.id,
            individuals,
        };
        next.renumber();
        Ok(next)
    }

    fn record(
        &self,
        pops: &[Population],
        generation: usize,
        outcome: &mut SimulationOutcome,
    ) -> Result<()> {
        if self.config.reports_in(generation) {
            outcome.summaries.extend(self.summarise(pops, generation)?);
        }
        if self.config.store_generations.contains(&generation) {
            outcome.snapshots.push(Snapshot {
                generation,
                genotypes: snapshot(pops, &self.table)?,
            });
        }
        Ok(())
    }

    /// Summary rows of `pops` at `generation`.
    pub fn summarise(&self, pops: &[Population], generation: usize) -> Result<Vec<GenerationSummary>> {
        let fst = if pops.len() > 1 {
            let gm = snapshot(pops, &self.table)?.subset_loci(&self.diversity_loci)?;
            overall_fst(&gm)
        } else {
            None
        };

        Ok(pops
            .par_iter()
            .map(|pop| {
                let n = pop.size().max(1) as f64;
                let (mut ho, mut he) = (0.0, 0.0);
                for &l in &self.diversity_loci {
                    let mut hets = 0usize;
                    let mut derived = 0usize;
                    for ind in &pop.individuals {
                        let d = ind.derived_dosage(l) as usize;
                        hets += (d == 1) as usize;
                        derived += d;
                    }
                    let p = derived as f64 / (2.0 * n);
                    ho += hets as f64 / n;
                    he += 2.0 * p * (1.0 - p);
                }
                let n_div = self.diversity_loci.len().max(1) as f64;

                let mean_fitness = pop
                    .individuals
                    .iter()
                    .map(|ind| fitness(ind, &self.table))
                    .sum::<f64>()
                    / n;

                let derived_freq = if self.deleterious_loci.is_empty() {
                    None
                } else {
                    let total: usize = self
                        .deleterious_loci
                        .iter()
                        .map(|&l| {
                            pop.individuals
                                .iter()
                                .map(|ind| ind.derived_dosage(l) as usize)
                                .sum::<usize>()
                        })
                        .sum();
                    Some(total as f64 / (2.0 * n * self.deleterious_loci.len() as f64))
                };

                GenerationSummary {
                    generation,
                    population: pop.id,
                    size: pop.size(),
                    ho: ho / n_div,
                    he: he / n_div,
                    mean_fitness,
                    genetic_load: 1.0 - mean_fitness,
                    derived_freq,
                    fst,
                }
            })
            .collect())
    }
}
