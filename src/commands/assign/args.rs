use dartrs_lib::assign::AssignConfig;
use dartrs_lib::genotype::DataType;
use lazy_static::lazy_static;
use std::path::PathBuf;
use structopt::StructOpt;

lazy_static! {
    static ref ASSIGN_DEFAULTS: AssignConfig = AssignConfig::default();

    pub static ref DIM_LIMIT_STR: String = ASSIGN_DEFAULTS.dim_limit.to_string();
    pub static ref PLEVEL_STR: String = ASSIGN_DEFAULTS.plevel.to_string();
}

/// CLI arguments for the `assign` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "assign")]
pub struct AssignArgs {
    /// Input SNP genotype table containing the unknowns and the candidate populations.
    pub input: PathBuf,

    /// Individuals of unknown provenance (comma separated).
    #[structopt(long, short = "u", use_delimiter = true, required = true)]
    pub unknown: Vec<String>,

    /// Candidate source populations (comma separated). All populations when omitted.
    #[structopt(long, short = "p", use_delimiter = true)]
    pub pops: Vec<String>,

    /// Upper bound on the PCA axes used for the distance.
    #[structopt(long, default_value = DIM_LIMIT_STR.as_str())]
    pub dim_limit: usize,

    /// Confidence level; a population is retained when p >= 1 - plevel.
    #[structopt(long, default_value = PLEVEL_STR.as_str())]
    pub plevel: f64,

    /// Output TSV (`-` for stdout, `.gz` to compress).
    #[structopt(long, short = "o", default_value = "-")]
    pub output: PathBuf,

    /// Number of worker threads (default: all available cores).
    #[structopt(long, short = "t")]
    pub threads: Option<usize>,

    /// Validate the input and parameters, then exit.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Normalised configuration derived from [`AssignArgs`].
#[derive(Debug, Clone)]
pub struct AssignCommandConfig {
    pub input: PathBuf,
    pub unknown: Vec<String>,
    pub pops: Vec<String>,
    pub data_type: DataType,
    pub assign: AssignConfig,
    pub output: PathBuf,
    pub threads: usize,
    pub dry_run: bool,
}

impl From<AssignArgs> for AssignCommandConfig {
    fn from(args: AssignArgs) -> AssignCommandConfig {
        AssignCommandConfig {
            input: args.input,
            unknown: args.unknown,
            pops: args.pops,
            data_type: DataType::Snp,
            assign: AssignConfig {
                dim_limit: args.dim_limit,
                plevel: args.plevel,
            },
            output: args.output,
            threads: args.threads.unwrap_or_else(num_cpus::get),
            dry_run: args.dry_run,
        }
    }
}
