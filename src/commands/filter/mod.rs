mod args;

use anyhow::Result;
use dartrs_lib::filter::run_filters;
use dartrs_lib::genotype::write_genotype_table;
use log::{info, warn};

use crate::commands::common;

pub use args::{FilterArgs, FilterCommandConfig};

/// Execute the `filter` command end-to-end.
pub fn run_filter(args: FilterArgs) -> Result<()> {
    let config: FilterCommandConfig = args.into();
    config.filters.validate()?;
    common::configure_global_thread_pool(config.threads)?;

    let gm = common::load_genotypes(&config.input, config.data_type)?;
    if config.dry_run {
        info!("Dry run: input and thresholds valid");
        return Ok(());
    }
    if config.filters.is_noop() {
        warn!("No filter enabled; writing the input unchanged");
    }

    let filtered = run_filters(&gm, &config.filters)?;
    write_genotype_table(&filtered, &config.output)?;
    info!(
        "Filtering complete: {} x {} -> {} x {} (individuals x loci)",
        gm.n_ind(),
        gm.n_loc(),
        filtered.n_ind(),
        filtered.n_loc()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::tests::write_genotype_fixture;
    use dartrs_lib::genotype::{read_genotype_table, DataType};
    use structopt::StructOpt;

    #[test]
    fn drops_sparse_and_monomorphic_loci() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_genotype_fixture(dir.path());
        let output = dir.path().join("filtered.tsv.gz");
        let args = FilterArgs::from_iter_safe(vec![
            "filter",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--min-loc-call-rate",
            "0.5",
            "--monomorphs",
            "--threads",
            "1",
        ])
        .unwrap();
        run_filter(args).unwrap();

        let gm = read_genotype_table(&output, DataType::Snp).unwrap();
        assert_eq!(gm.n_ind(), 12);
        assert_eq!(gm.loc_names, vec!["L1", "L2", "L3", "L4"]);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_genotype_fixture(dir.path());
        let args = FilterArgs::from_iter_safe(vec![
            "filter",
            input.to_str().unwrap(),
            "--min-maf",
            "0.7",
            "--dry-run",
        ])
        .unwrap();
        assert!(run_filter(args).is_err());
    }
}
