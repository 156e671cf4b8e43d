mod args;

use anyhow::Result;
use dartrs_lib::genotype::GenotypeMatrix;
use dartrs_lib::stats::fstat::LocusFStats;
use dartrs_lib::stats::{
    allele_frequencies, basic_stats, individual_heterozygosity, pairwise_fst, pca,
    population_heterozygosity,
};
use log::info;
use std::path::Path;

use crate::commands::common;

pub use args::{StatsArgs, StatsConfig, StatsReport};

/// Execute the `stats` command end-to-end.
pub fn run_stats(args: StatsArgs) -> Result<()> {
    let config: StatsConfig = args.into();
    common::configure_global_thread_pool(config.threads)?;

    let gm = common::load_genotypes(&config.input, config.data_type)?;
    if config.dry_run {
        info!("Dry run: input valid, {} report requested", config.report);
        return Ok(());
    }

    info!("Computing {} report", config.report);
    write_report(&gm, config.report, config.axes, &config.output)
}

fn write_report(gm: &GenotypeMatrix, report: StatsReport, axes: usize, out: &Path) -> Result<()> {
    match report {
        StatsReport::Heterozygosity => common::write_tsv(&population_heterozygosity(gm)?, out),
        StatsReport::Individual => common::write_tsv(&individual_heterozygosity(gm)?, out),
        StatsReport::Basic => {
            let stats = basic_stats(gm)?;
            let overall = stats.overall;
            let mut rows = stats.per_locus;
            rows.push(LocusFStats {
                locus: "overall".to_string(),
                ho: overall.ho,
                hs: overall.hs,
                ht: overall.ht,
                dst: overall.dst,
                fst: overall.fst,
                fis: overall.fis,
            });
            common::write_tsv(&rows, out)
        }
        StatsReport::Fst => common::write_tsv(&pairwise_fst(gm)?.rows, out),
        StatsReport::Freq => common::write_tsv(&allele_frequencies(gm), out),
        StatsReport::Pca => {
            let result = pca(gm, axes)?;
            common::write_tsv(&result.score_rows(gm), out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::tests::write_genotype_fixture;
    use structopt::StructOpt;

    fn run(report: &str, dir: &Path) -> String {
        let input = write_genotype_fixture(dir);
        let output = dir.join(format!("{}.tsv", report));
        let args = StatsArgs::from_iter_safe(vec![
            "stats",
            input.to_str().unwrap(),
            "--report",
            report,
            "--output",
            output.to_str().unwrap(),
            "--axes",
            "2",
        ])
        .unwrap();
        run_stats(args).unwrap();
        std::fs::read_to_string(output).unwrap()
    }

    #[test]
    fn heterozygosity_has_one_row_per_population() {
        let dir = tempfile::tempdir().unwrap();
        let text = run("het", dir.path());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("pop\tn_ind"));
    }

    #[test]
    fn basic_report_ends_with_overall_row() {
        let dir = tempfile::tempdir().unwrap();
        let text = run("basic", dir.path());
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("overall\t"));
    }

    #[test]
    fn fst_and_pca_reports() {
        let dir = tempfile::tempdir().unwrap();
        // three population pairs
        assert_eq!(run("fst", dir.path()).lines().count(), 4);
        // 12 individuals x 2 axes
        assert_eq!(run("pca", dir.path()).lines().count(), 1 + 24);
    }
}
