use dartrs_lib::filter::FilterConfig;
use dartrs_lib::genotype::DataType;
use std::path::PathBuf;
use structopt::StructOpt;

/// CLI arguments for the `filter` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "filter")]
pub struct FilterArgs {
    /// Input genotype table (`id pop <loci...>`, `.gz` accepted).
    pub input: PathBuf,

    /// Output genotype table (`-` for stdout, `.gz` to compress).
    #[structopt(long, short = "o", default_value = "-")]
    pub output: PathBuf,

    /// Marker type of the input: snp or silicodart.
    #[structopt(long, default_value = "snp")]
    pub data_type: DataType,

    /// Drop individuals called at fewer than this fraction of loci.
    #[structopt(long)]
    pub min_ind_call_rate: Option<f64>,

    /// Drop loci called in fewer than this fraction of individuals.
    #[structopt(long)]
    pub min_loc_call_rate: Option<f64>,

    /// Drop loci without variation among called individuals.
    #[structopt(long)]
    pub monomorphs: bool,

    /// Drop SNP loci with a minor allele frequency below this value.
    #[structopt(long)]
    pub min_maf: Option<f64>,

    /// Drop SNP loci out of Hardy-Weinberg equilibrium at this significance level.
    #[structopt(long)]
    pub hwe_alpha: Option<f64>,

    /// Divide the HWE significance level by the number of tests.
    #[structopt(long)]
    pub bonferroni: bool,

    /// Test HWE on all individuals pooled instead of per population.
    #[structopt(long)]
    pub hwe_pooled: bool,

    /// Populations with fewer called individuals at a locus are not tested for HWE.
    #[structopt(long, default_value = "5")]
    pub hwe_min_n: usize,

    /// Drop SNP individuals heterozygous at more than this fraction of their called loci.
    #[structopt(long)]
    pub max_het: Option<f64>,

    /// Number of worker threads (default: all available cores).
    #[structopt(long, short = "t")]
    pub threads: Option<usize>,

    /// Validate the input and thresholds, then exit.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Normalised configuration derived from [`FilterArgs`].
#[derive(Debug, Clone)]
pub struct FilterCommandConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub data_type: DataType,
    pub filters: FilterConfig,
    pub threads: usize,
    pub dry_run: bool,
}

impl From<FilterArgs> for FilterCommandConfig {
    fn from(args: FilterArgs) -> FilterCommandConfig {
        FilterCommandConfig {
            input: args.input,
            output: args.output,
            data_type: args.data_type,
            filters: FilterConfig {
                min_ind_call_rate: args.min_ind_call_rate,
                min_loc_call_rate: args.min_loc_call_rate,
                drop_monomorphs: args.monomorphs,
                min_maf: args.min_maf,
                hwe_alpha: args.hwe_alpha,
                hwe_bonferroni: args.bonferroni,
                hwe_per_population: !args.hwe_pooled,
                hwe_min_n: args.hwe_min_n,
                max_ind_het: args.max_het,
            },
            threads: args.threads.unwrap_or_else(num_cpus::get),
            dry_run: args.dry_run,
        }
    }
}
