mod args;

use anyhow::Result;
use log::info;
use dartrs_lib::genotype::write_genotype_table;
use dartrs_lib::sim::{
    read_reference_table, reference_rng, write_reference_table, ReferenceTable, Simulation,
    SimulationOutcome,
};
use dartrs_lib::utils;
use std::path::Path;

use crate::commands::common;

pub use args::{ReferenceSource, SimulateArgs, SimulateConfig};

/// Execute the `simulate` command end-to-end.
pub fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config: SimulateConfig = args.into();
    config.sim.validate()?;

    let threads = common::configure_global_thread_pool(config.threads)?;
    info!("Running dartrs simulate with {} threads", threads);

    let (table, generated) = match &config.reference {
        ReferenceSource::File(path) => (read_reference_table(path)?, false),
        ReferenceSource::Generate(params) => {
            params.validate()?;
            let mut rng = reference_rng(config.sim.seed);
            (ReferenceTable::generate(params, &mut rng)?, true)
        }
    };
    let simulation = Simulation::new(config.sim.clone(), table)?;

    if config.dry_run {
        info!(
            "Dry run: configuration valid, {} loci on {} chromosome(s)",
            simulation.table().n_loci(),
            simulation.table().chromosomes().len()
        );
        return Ok(());
    }

    if generated {
        let path = utils::with_suffix(&config.output, ".reference.tsv");
        write_reference_table(simulation.table(), &path)?;
        info!("Generated reference table -> {:?}", path);
    }

    let outcome = simulation.run()?;
    write_outcome(&outcome, &config.output)?;
    info!("Simulation complete -> {:?}", config.output);
    Ok(())
}

fn write_outcome(outcome: &SimulationOutcome, prefix: &Path) -> Result<()> {
    common::write_tsv(&outcome.summaries, &utils::with_suffix(prefix, ".summary.tsv"))?;
    if !outcome.migrations.is_empty() {
        common::write_tsv(
            &outcome.migrations,
            &utils::with_suffix(prefix, ".migrations.tsv"),
        )?;
    }
    for snapshot in &outcome.snapshots {
        let path = utils::with_suffix(prefix, &format!(".gen{}.tsv.gz", snapshot.generation));
        write_genotype_table(&snapshot.genotypes, &path)?;
    }
    Ok(())
}
