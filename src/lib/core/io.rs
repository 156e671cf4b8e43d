use crate::core::error::{DartError, Result};
use flate2::read::MultiGzDecoder;
use grep_cli::stdout;
use gzp::{deflate::Gzip, Compression, ZBuilder};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use termcolor::ColorChoice;

pub(crate) fn is_stdio<P: AsRef<Path>>(path: &P) -> bool {
    path.as_ref().to_str() == Some("-")
}

/// Fail with `FileNotFound` unless `path` exists or is `-` (stdin).
pub(crate) fn require_input(path: &Path, what: &str) -> Result<()> {
    if is_stdio(&path) || path.exists() {
        Ok(())
    } else {
        Err(DartError::FileNotFound(format!(
            "{} not found: {}",
            what,
            path.display()
        )))
    }
}

/// Build a TSV reader for optional file/stdin sources.
///
/// Gzip and BGZF input are both handled by the multi-member gzip decoder.
pub fn get_reader<P: AsRef<Path>>(
    path: &Option<P>,
    has_headers: bool,
    gzipped: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let raw_reader: Box<dyn Read> = match path {
        Some(path) if !is_stdio(path) => {
            let reader = BufReader::new(File::open(path)?);
            if gzipped {
                Box::new(MultiGzDecoder::new(reader))
            } else {
                Box::new(reader)
            }
        }
        _ => {
            let reader = io::stdin();
            if gzipped {
                Box::new(MultiGzDecoder::new(reader))
            } else {
                Box::new(reader)
            }
        }
    };

    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .from_reader(raw_reader))
}

/// Build a TSV writer targeting a file or stdout with optional gzip compression.
pub fn get_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    write_headers: bool,
    threads: usize,
    compression_level: u32,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let raw_writer = get_raw_writer(path, gzipped, threads, compression_level)?;

    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(write_headers)
        .from_writer(raw_writer))
}

/// Plain byte sink for formats that are not delimited tables (STRUCTURE, NewHybrids).
pub fn get_raw_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    threads: usize,
    compression_level: u32,
) -> Result<Box<dyn Write>> {
    let raw_writer: Box<dyn Write> = match path {
        Some(path) if !is_stdio(path) => {
            let writer = BufWriter::new(File::create(path)?);
            if gzipped {
                Box::new(
                    ZBuilder::<Gzip, _>::new()
                        .num_threads(threads)
                        .compression_level(Compression::new(compression_level))
                        .from_writer(writer),
                )
            } else {
                Box::new(writer)
            }
        }
        _ => {
            let writer = stdout(ColorChoice::Never);
            if gzipped {
                Box::new(
                    ZBuilder::<Gzip, _>::new()
                        .num_threads(threads)
                        .compression_level(Compression::new(compression_level))
                        .from_writer(writer),
                )
            } else {
                Box::new(writer)
            }
        }
    };
    Ok(raw_writer)
}
