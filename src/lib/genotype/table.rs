//! Tab-separated genotype tables.
//!
//! Layout: a header `id  pop  <locus…>` followed by one row per individual.
//! Calls are `0`, `1`, `2` (SNP) or `0`, `1` (silicodart); `NA`, `-` and
//! empty fields are missing.

use crate::core::error::{DartError, Result};
use crate::core::fs::{is_gzipped, make_parent_dirs};
use crate::core::io::{get_reader, get_writer, require_input};
use crate::genotype::matrix::{DataType, GenotypeMatrix, MISSING};
use log::info;
use std::path::Path;

const ID_COLUMN: &str = "id";
const POP_COLUMN: &str = "pop";

fn parse_call(token: &str, data_type: DataType) -> Option<u8> {
    match token.trim() {
        "" | "NA" | "na" | "-" | "." => Some(MISSING),
        t => t
            .parse::<u8>()
            .ok()
            .filter(|&c| c <= data_type.max_call()),
    }
}

/// Read a genotype table from `path` (gzip detected by extension).
pub fn read_genotype_table<P: AsRef<Path>>(path: P, data_type: DataType) -> Result<GenotypeMatrix> {
    let path = path.as_ref();
    require_input(path, "Genotype table")?;
    info!("Reading genotype table: {}", path.display());

    let mut reader = get_reader(&Some(path), true, is_gzipped(path))?;
    let headers = reader.headers()?.clone();
    if headers.len() < 2
        || !headers[0].eq_ignore_ascii_case(ID_COLUMN)
        || !headers[1].eq_ignore_ascii_case(POP_COLUMN)
    {
        return Err(DartError::Parse(format!(
            "{}: header must start with '{}\t{}'",
            path.display(),
            ID_COLUMN,
            POP_COLUMN
        )));
    }
    let loc_names: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

    let mut ind_names = Vec::new();
    let mut pop = Vec::new();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(DartError::Parse(format!(
                "{}: row {} has {} fields, expected {}",
                path.display(),
                line + 2,
                record.len(),
                headers.len()
            )));
        }
        let mut calls = Vec::with_capacity(loc_names.len());
        for (col, token) in record.iter().enumerate().skip(2) {
            let call = parse_call(token, data_type).ok_or_else(|| {
                DartError::Parse(format!(
                    "{}: invalid {} call '{}' at row {}, locus {}",
                    path.display(),
                    data_type,
                    token,
                    line + 2,
                    loc_names[col - 2]
                ))
            })?;
            calls.push(call);
        }
        ind_names.push(record[0].to_string());
        pop.push(record[1].to_string());
        rows.push(calls);
    }

    if rows.is_empty() {
        return Err(DartError::EmptyData(format!(
            "{} contains no individuals",
            path.display()
        )));
    }

    let gm = GenotypeMatrix::from_rows(data_type, &rows, ind_names, pop, loc_names)?;
    info!(
        "Loaded {} data: {} individuals × {} loci in {} populations",
        gm.data_type,
        gm.n_ind(),
        gm.n_loc(),
        gm.populations().len()
    );
    Ok(gm)
}

/// Write `gm` as a genotype table; `.gz` paths are compressed.
pub fn write_genotype_table<P: AsRef<Path>>(gm: &GenotypeMatrix, path: P) -> Result<()> {
    let path = path.as_ref();
    make_parent_dirs(path)?;
    let mut writer = get_writer(&Some(path), is_gzipped(path), true, 1, 6)?;

    let mut header = Vec::with_capacity(gm.n_loc() + 2);
    header.push(ID_COLUMN.to_string());
    header.push(POP_COLUMN.to_string());
    header.extend(gm.loc_names.iter().cloned());
    writer.write_record(&header)?;

    for i in 0..gm.n_ind() {
        let mut record = Vec::with_capacity(gm.n_loc() + 2);
        record.push(gm.ind_names[i].clone());
        record.push(gm.pop[i].clone());
        record.extend((0..gm.n_loc()).map(|l| match gm.get(i, l) {
            Some(call) => call.to_string(),
            None => "NA".to_string(),
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(
        "Wrote {} individuals × {} loci to {}",
        gm.n_ind(),
        gm.n_loc(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::matrix::tests::small_snp;
    use std::io::Write;

    #[test]
    fn round_trip_preserves_calls_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.tsv.gz");
        let gm = small_snp();
        write_genotype_table(&gm, &path).unwrap();
        let back = read_genotype_table(&path, DataType::Snp).unwrap();
        assert_eq!(back, gm);
    }

    #[test]
    fn missing_tokens_are_recognised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id\tpop\tL1\tL2\tL3").unwrap();
        writeln!(file, "x\tp1\tNA\t-\t1").unwrap();
        writeln!(file, "y\tp1\t0\t\t2").unwrap();
        drop(file);

        let gm = read_genotype_table(&path, DataType::Snp).unwrap();
        assert_eq!(gm.get(0, 0), None);
        assert_eq!(gm.get(0, 1), None);
        assert_eq!(gm.get(1, 1), None);
        assert_eq!(gm.get(1, 2), Some(2));
    }

    #[test]
    fn silicodart_rejects_dosage_two() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pa.tsv");
        std::fs::write(&path, "id\tpop\tL1\nx\tp\t2\n").unwrap();
        let err = read_genotype_table(&path, DataType::SilicoDart).unwrap_err();
        assert!(matches!(err, DartError::Parse(_)));
    }

    #[test]
    fn header_must_name_id_and_pop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        std::fs::write(&path, "sample\tgroup\tL1\nx\tp\t1\n").unwrap();
        assert!(matches!(
            read_genotype_table(&path, DataType::Snp),
            Err(DartError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reported() {
        assert!(matches!(
            read_genotype_table("/nonexistent/calls.tsv", DataType::Snp),
            Err(DartError::FileNotFound(_))
        ));
    }
}
