use crate::core::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip/BGZF-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

/// Append `suffix` to the file name of `prefix`, keeping its directory.
///
/// `with_suffix("out/run1", ".summary.tsv")` gives `out/run1.summary.tsv`.
pub fn with_suffix<P: AsRef<Path>>(prefix: P, suffix: &str) -> PathBuf {
    let prefix = prefix.as_ref();
    let name = prefix
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dartrs");
    prefix.with_file_name(format!("{}{}", name, suffix))
}
