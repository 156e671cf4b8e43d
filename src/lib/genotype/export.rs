//! Input files for STRUCTURE and NewHybrids.

use crate::core::error::{DartError, Result};
use crate::core::io::get_raw_writer;
use crate::genotype::matrix::GenotypeMatrix;
use itertools::Itertools;
use log::info;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// External program whose input format should be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Structure,
    NewHybrids,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structure" => Ok(ExportFormat::Structure),
            "newhybrids" | "nhyb" => Ok(ExportFormat::NewHybrids),
            _ => Err(format!(
                "Invalid export format: {}. Valid formats: structure, newhybrids",
                s
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportFormat::Structure => write!(f, "structure"),
            ExportFormat::NewHybrids => write!(f, "newhybrids"),
        }
    }
}

/// STRUCTURE allele pair for a dosage; `-9` codes missing data.
fn structure_alleles(call: Option<u8>) -> (&'static str, &'static str) {
    match call {
        Some(0) => ("1", "1"),
        Some(1) => ("1", "2"),
        Some(2) => ("2", "2"),
        _ => ("-9", "-9"),
    }
}

/// NewHybrids lumped genotype; `0` codes missing data.
fn newhybrids_genotype(call: Option<u8>) -> &'static str {
    match call {
        Some(0) => "11",
        Some(1) => "12",
        Some(2) => "22",
        _ => "0",
    }
}

/// Write the STRUCTURE two-row format: a locus-name header, then two rows per
/// individual (`name popindex allele…`), population index 1-based.
pub fn write_structure<W: Write>(gm: &GenotypeMatrix, out: &mut W) -> Result<()> {
    gm.require_snp("STRUCTURE export")?;
    let pops = gm.populations();

    writeln!(out, "{}", gm.loc_names.iter().join(" "))?;
    for i in 0..gm.n_ind() {
        let pop_index = pops
            .iter()
            .position(|p| p == &gm.pop[i])
            .map(|p| p + 1)
            .ok_or_else(|| DartError::InvalidInput(format!("unknown population {}", gm.pop[i])))?;
        let (first, second): (Vec<_>, Vec<_>) =
            (0..gm.n_loc()).map(|l| structure_alleles(gm.get(i, l))).unzip();
        writeln!(out, "{} {} {}", gm.ind_names[i], pop_index, first.join(" "))?;
        writeln!(out, "{} {} {}", gm.ind_names[i], pop_index, second.join(" "))?;
    }
    Ok(())
}

/// Write the NewHybrids lumped format.
pub fn write_newhybrids<W: Write>(gm: &GenotypeMatrix, out: &mut W) -> Result<()> {
    gm.require_snp("NewHybrids export")?;

    writeln!(out, "NumIndivs {}", gm.n_ind())?;
    writeln!(out, "NumLoci {}", gm.n_loc())?;
    writeln!(out, "Digits 1")?;
    writeln!(out, "Format Lumped")?;
    writeln!(out)?;
    writeln!(out, "LocusNames {}", gm.loc_names.iter().join(" "))?;
    writeln!(out)?;
    for i in 0..gm.n_ind() {
        let genotypes = (0..gm.n_loc())
            .map(|l| newhybrids_genotype(gm.get(i, l)))
            .join(" ");
        writeln!(out, "{} {}", i + 1, genotypes)?;
    }
    Ok(())
}

/// Export `gm` to `path` (or stdout with `-`) in the requested format.
pub fn export_genotypes(gm: &GenotypeMatrix, format: ExportFormat, path: &str) -> Result<()> {
    let mut out = get_raw_writer(&Some(path), false, 1, 6)?;
    match format {
        ExportFormat::Structure => write_structure(gm, &mut out)?,
        ExportFormat::NewHybrids => write_newhybrids(gm, &mut out)?,
    }
    out.flush()?;
    info!(
        "Exported {} individuals × {} loci in {} format to {}",
        gm.n_ind(),
        gm.n_loc(),
        format,
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::matrix::tests::small_snp;
    use crate::genotype::matrix::DataType;

    #[test]
    fn structure_rows_and_codes() {
        let gm = small_snp();
        let mut buf = Vec::new();
        write_structure(&gm, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * gm.n_ind());
        assert_eq!(lines[0], "L1 L2 L3 L4");
        assert_eq!(lines[1], "a 1 1 1 2 -9");
        assert_eq!(lines[2], "a 1 1 2 2 -9");
        assert!(lines[5].starts_with("c 2 "));
    }

    #[test]
    fn newhybrids_header_and_genotypes() {
        let gm = small_snp();
        let mut buf = Vec::new();
        write_newhybrids(&gm, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("NumIndivs 3\nNumLoci 4\nDigits 1\nFormat Lumped\n"));
        assert!(text.contains("LocusNames L1 L2 L3 L4"));
        assert!(text.contains("\n2 11 12 12 11\n"));
        assert!(text.trim_end().ends_with("3 11 22 0 0"));
    }

    #[test]
    fn silicodart_cannot_be_exported() {
        let mut gm = small_snp();
        gm.data_type = DataType::SilicoDart;
        let mut buf = Vec::new();
        assert!(write_structure(&gm, &mut buf).is_err());
        assert!(write_newhybrids(&gm, &mut buf).is_err());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("STRUCTURE".parse::<ExportFormat>().unwrap(), ExportFormat::Structure);
        assert_eq!("nhyb".parse::<ExportFormat>().unwrap(), ExportFormat::NewHybrids);
        assert!("genepop".parse::<ExportFormat>().is_err());
    }
}
