use dartrs_lib::genotype::{DataType, ExportFormat};
use std::path::PathBuf;
use structopt::StructOpt;

/// CLI arguments for the `export` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "export")]
pub struct ExportArgs {
    /// Input SNP genotype table (`id pop <loci...>`, `.gz` accepted).
    pub input: PathBuf,

    /// Target program: structure or newhybrids.
    #[structopt(long, short = "f")]
    pub format: ExportFormat,

    /// Output file (`-` for stdout).
    #[structopt(long, short = "o", default_value = "-")]
    pub output: String,

    /// Validate the input, then exit.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Normalised configuration derived from [`ExportArgs`].
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub format: ExportFormat,
    pub output: String,
    pub data_type: DataType,
    pub dry_run: bool,
}

impl From<ExportArgs> for ExportConfig {
    fn from(args: ExportArgs) -> ExportConfig {
        ExportConfig {
            input: args.input,
            format: args.format,
            output: args.output,
            data_type: DataType::Snp,
            dry_run: args.dry_run,
        }
    }
}
