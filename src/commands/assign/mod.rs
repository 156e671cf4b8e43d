mod args;

use anyhow::{bail, Result};
use dartrs_lib::assign::{assign_mahalanobis, Assignment};
use dartrs_lib::genotype::GenotypeMatrix;
use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::commands::common;

pub use args::{AssignArgs, AssignCommandConfig};

/// Individuals of the candidate populations plus `unknown`.
fn candidate_matrix(gm: &GenotypeMatrix, pops: &[String], unknown: &str) -> Result<GenotypeMatrix> {
    if pops.is_empty() {
        return Ok(gm.clone());
    }
    let wanted: FxHashSet<&str> = pops.iter().map(String::as_str).collect();
    let rows: Vec<usize> = (0..gm.n_ind())
        .filter(|&i| wanted.contains(gm.pop[i].as_str()) || gm.ind_names[i] == unknown)
        .collect();
    Ok(gm.subset_individuals(&rows)?)
}

/// Execute the `assign` command end-to-end.
pub fn run_assign(args: AssignArgs) -> Result<()> {
    let config: AssignCommandConfig = args.into();
    config.assign.validate()?;
    common::configure_global_thread_pool(config.threads)?;

    let gm = common::load_genotypes(&config.input, config.data_type)?;
    let populations = gm.populations();
    let known: FxHashSet<&str> = populations.iter().map(String::as_str).collect();
    if let Some(missing) = config.pops.iter().find(|p| !known.contains(p.as_str())) {
        bail!("population {} not found in {:?}", missing, config.input);
    }
    if let Some(missing) = config.unknown.iter().find(|u| gm.ind_index(u).is_none()) {
        bail!("individual {} not found in {:?}", missing, config.input);
    }
    if config.dry_run {
        info!("Dry run: {} unknown(s) and candidates valid", config.unknown.len());
        return Ok(());
    }

    let results: Vec<Vec<Assignment>> = config
        .unknown
        .par_iter()
        .map(|unknown| {
            let candidates = candidate_matrix(&gm, &config.pops, unknown)?;
            Ok(assign_mahalanobis(&candidates, unknown, &config.assign)?)
        })
        .collect::<Result<_>>()?;

    let rows: Vec<Assignment> = results.into_iter().flatten().collect();
    for unknown in &config.unknown {
        let assigned: Vec<&str> = rows
            .iter()
            .filter(|a| &a.unknown == unknown && a.assigned)
            .map(|a| a.pop.as_str())
            .collect();
        info!("{}: possible sources {:?}", unknown, assigned);
    }
    common::write_tsv(&rows, &config.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::tests::write_genotype_fixture;
    use structopt::StructOpt;

    #[test]
    fn one_row_per_candidate_population() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_genotype_fixture(dir.path());
        let output = dir.path().join("assign.tsv");
        let args = AssignArgs::from_iter_safe(vec![
            "assign",
            input.to_str().unwrap(),
            "--unknown",
            "a1",
            "--pops",
            "A,B",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run_assign(args).unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("unknown\tpop\tn_ind\taxes\td2"));
        let mut pops: Vec<&str> = lines[1..]
            .iter()
            .map(|l| l.split('\t').nth(1).unwrap())
            .collect();
        pops.sort_unstable();
        assert_eq!(pops, vec!["A", "B"]);
    }

    #[test]
    fn unknown_individual_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_genotype_fixture(dir.path());
        let args = AssignArgs::from_iter_safe(vec![
            "assign",
            input.to_str().unwrap(),
            "--unknown",
            "zz9",
            "--dry-run",
        ])
        .unwrap();
        assert!(run_assign(args).is_err());
    }
}
