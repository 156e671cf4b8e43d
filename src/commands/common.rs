use anyhow::{Context, Result};
use dartrs_lib::genotype::{read_genotype_table, DataType, GenotypeMatrix};
use dartrs_lib::utils;
use log::info;
use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::path::Path;

static GLOBAL_RAYON_THREADS: OnceCell<usize> = OnceCell::new();

/// Size the global Rayon pool on first use and return the active worker
/// count. Later calls keep the first pool and warn when they asked for a
/// different size.
pub fn configure_global_thread_pool(threads: usize) -> Result<usize> {
    let requested = utils::determine_allowed_cpus(threads)?;

    let active = *GLOBAL_RAYON_THREADS.get_or_init(|| {
        match ThreadPoolBuilder::new().num_threads(requested).build_global() {
            Ok(()) => requested,
            Err(err) => {
                log::debug!("Global thread pool not rebuilt: {}", err);
                rayon::current_num_threads()
            }
        }
    });
    if active != requested {
        log::warn!(
            "Thread pool running with {} threads; ignoring request for {}",
            active,
            requested
        );
    }
    Ok(active)
}

/// Load a genotype table, attaching the path to any error.
pub fn load_genotypes(path: &Path, data_type: DataType) -> Result<GenotypeMatrix> {
    read_genotype_table(path, data_type)
        .with_context(|| format!("failed to load genotypes from {}", path.display()))
}

/// Write serialisable rows as a headed TSV to `path` (`-` for stdout,
/// gzip when the extension asks for it).
pub fn write_tsv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let gzipped = utils::is_gzipped(path);
    if path.to_str() != Some("-") {
        utils::make_parent_dirs(path)?;
    }
    let mut writer = utils::get_writer(&Some(path), gzipped, true, 1, 6)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Three populations of four individuals at six SNP loci.
    pub(crate) fn write_genotype_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("genotypes.tsv");
        let text = "\
id\tpop\tL1\tL2\tL3\tL4\tL5\tL6
a1\tA\t0\t0\t2\t1\t0\tNA
a2\tA\t0\t1\t2\t1\t0\t0
a3\tA\t0\t0\t2\t0\t0\t0
a4\tA\t0\t0\t1\t1\t0\tNA
b1\tB\t2\t2\t0\t1\t0\t1
b2\tB\t2\t1\t0\t1\t0\tNA
b3\tB\t1\t2\t0\t2\t0\tNA
b4\tB\t2\t2\t1\t1\t0\tNA
c1\tC\t1\t1\t1\t0\t0\t2
c2\tC\t1\t0\t1\t1\t0\tNA
c3\tC\t0\t1\t1\t2\t0\tNA
c4\tC\t1\t1\t2\t1\t0\tNA
";
        std::fs::write(&path, text).unwrap();
        path
    }

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        value: f64,
    }

    #[test]
    fn tsv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/rows.tsv");
        write_tsv(
            &[Row { name: "a", value: 0.5 }, Row { name: "b", value: 1.0 }],
            &path,
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "name\tvalue\na\t0.5\nb\t1.0\n");
    }

    #[test]
    fn pool_size_is_sticky() {
        let first = configure_global_thread_pool(2).unwrap();
        assert_eq!(configure_global_thread_pool(3).unwrap(), first);
        assert!(configure_global_thread_pool(0).is_err());
    }
}
