mod args;

use anyhow::Result;
use dartrs_lib::genotype::export_genotypes;
use dartrs_lib::utils;
use log::info;

use crate::commands::common;

pub use args::{ExportArgs, ExportConfig};

/// Execute the `export` command end-to-end.
pub fn run_export(args: ExportArgs) -> Result<()> {
    let config: ExportConfig = args.into();

    let gm = common::load_genotypes(&config.input, config.data_type)?;
    if config.dry_run {
        info!("Dry run: input valid for {} export", config.format);
        return Ok(());
    }

    if config.output != "-" {
        utils::make_parent_dirs(&config.output)?;
    }
    export_genotypes(&gm, config.format, &config.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::tests::write_genotype_fixture;
    use structopt::StructOpt;

    #[test]
    fn structure_file_has_two_rows_per_individual() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_genotype_fixture(dir.path());
        let output = dir.path().join("out/fixture.str");
        let args = ExportArgs::from_iter_safe(vec![
            "export",
            input.to_str().unwrap(),
            "--format",
            "structure",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run_export(args).unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 12);
        assert_eq!(lines[0], "L1 L2 L3 L4 L5 L6");
        assert_eq!(lines[1], "a1 1 1 1 2 1 1 -9");
        assert!(lines[24].starts_with("c4 3 "));
    }

    #[test]
    fn format_is_required() {
        assert!(ExportArgs::from_iter_safe(vec!["export", "in.tsv"]).is_err());
    }
}
