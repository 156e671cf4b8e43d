use dartrs_lib::sim::{
    DispersalType, Dominance, InitialFrequency, MigrationConfig, SelectionModel, SimConfig,
    TableParams,
};
use lazy_static::lazy_static;
use std::path::PathBuf;
use structopt::StructOpt;

lazy_static! {
    static ref SIM_DEFAULTS: SimConfig = SimConfig::default();
    static ref TABLE_DEFAULTS: TableParams = TableParams::default();

    pub static ref POPULATION_SIZE_STR: String = SIM_DEFAULTS.population_size.to_string();
    pub static ref NUMBER_POPS_STR: String = SIM_DEFAULTS.number_pops.to_string();
    pub static ref GENERATIONS_STR: String = SIM_DEFAULTS.generations.to_string();
    pub static ref OFFSPRING_MEAN_STR: String = SIM_DEFAULTS.offspring_mean.to_string();
    pub static ref OFFSPRING_DISPERSION_STR: String =
        SIM_DEFAULTS.offspring_dispersion.to_string();
    pub static ref MATING_SUCCESS_STR: String = SIM_DEFAULTS
        .mating_success
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");
    pub static ref CROSSOVERS_STR: String = SIM_DEFAULTS.crossovers_per_meiosis.to_string();
    pub static ref SELECTION_STR: String = SIM_DEFAULTS.selection.to_string();
    pub static ref SEED_STR: String = SIM_DEFAULTS.seed.to_string();

    pub static ref CHROMOSOMES_STR: String = TABLE_DEFAULTS.chromosomes.to_string();
    pub static ref NEUTRAL_LOCI_STR: String = TABLE_DEFAULTS.neutral_per_chromosome.to_string();
    pub static ref DELETERIOUS_LOCI_STR: String =
        TABLE_DEFAULTS.deleterious_per_chromosome.to_string();
    pub static ref CHROMOSOME_LENGTH_STR: String = TABLE_DEFAULTS.chromosome_length.to_string();
    pub static ref S_MEAN_STR: String = TABLE_DEFAULTS.s_mean.to_string();
    pub static ref S_SHAPE_STR: String = TABLE_DEFAULTS.s_shape.to_string();
    pub static ref DOMINANCE_K_STR: String = match TABLE_DEFAULTS.dominance {
        Dominance::Exponential(k) => k.to_string(),
        Dominance::Constant(_) => "25".to_string(),
    };
    pub static ref MUTATION_RATE_STR: String = match TABLE_DEFAULTS.initial_q {
        InitialFrequency::MutationSelection { mu } => mu.to_string(),
        InitialFrequency::Constant(_) => "5e-5".to_string(),
    };
    pub static ref NEUTRAL_Q_STR: String = TABLE_DEFAULTS.neutral_q.to_string();
}

fn parse_mating_success(s: &str) -> Result<[f64; 4], String> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid mating probability '{}': {}", v, e))
        })
        .collect::<Result<Vec<f64>, String>>()?;
    <[f64; 4]>::try_from(values.as_slice()).map_err(|_| {
        format!(
            "expected 4 comma-separated probabilities for 0-3 matings, got {}",
            values.len()
        )
    })
}

/// CLI arguments for the `simulate` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "simulate")]
pub struct SimulateArgs {
    /// Reference table (TSV with chromosome, position, q, h, s, type). Generated when omitted.
    #[structopt(long, short = "r")]
    pub reference: Option<PathBuf>,

    /// Output prefix; files are written as `<prefix>.summary.tsv`, `<prefix>.gen<g>.tsv.gz`, ...
    #[structopt(long, short = "o", default_value = "dartrs_sim")]
    pub output: PathBuf,

    /// Individuals per population (even, half of each sex).
    #[structopt(long, short = "n", default_value = POPULATION_SIZE_STR.as_str())]
    pub population_size: usize,

    /// Number of populations.
    #[structopt(long, short = "p", default_value = NUMBER_POPS_STR.as_str())]
    pub pops: usize,

    /// Generations to simulate.
    #[structopt(long, short = "g", default_value = GENERATIONS_STR.as_str())]
    pub generations: usize,

    /// Mean offspring per mating.
    #[structopt(long, default_value = OFFSPRING_MEAN_STR.as_str())]
    pub offspring_mean: f64,

    /// Negative binomial size parameter of the offspring count.
    #[structopt(long, default_value = OFFSPRING_DISPERSION_STR.as_str())]
    pub offspring_dispersion: f64,

    /// Probabilities that a male mates 0, 1, 2 or 3 times.
    #[structopt(
        long,
        default_value = MATING_SUCCESS_STR.as_str(),
        parse(try_from_str = parse_mating_success)
    )]
    pub mating_success: [f64; 4],

    /// Pass whole chromosomes to gametes without crossing over.
    #[structopt(long)]
    pub no_recombination: bool,

    /// Mean chiasmata per chromosome and meiosis.
    #[structopt(long, default_value = CROSSOVERS_STR.as_str())]
    pub crossovers: f64,

    /// Selection model: none, absolute or relative.
    #[structopt(long, short = "s", default_value = SELECTION_STR.as_str())]
    pub selection: SelectionModel,

    /// Generations between migration events. No migration when omitted.
    #[structopt(long)]
    pub migration_interval: Option<usize>,

    /// Individuals exchanged per population pair and event.
    #[structopt(long, default_value = "1")]
    pub transfers: usize,

    /// Draw the number exchanged uniformly from 0 up to `--transfers`.
    #[structopt(long)]
    pub random_transfers: bool,

    /// Connectivity of populations: line, circle or all.
    #[structopt(long, default_value = "line")]
    pub dispersal: DispersalType,

    /// Seed for every random draw of the run.
    #[structopt(long, default_value = SEED_STR.as_str())]
    pub seed: u64,

    /// Generations whose genotypes are written (comma separated).
    #[structopt(long, use_delimiter = true)]
    pub store: Vec<usize>,

    /// Generations between summary rows.
    #[structopt(long, default_value = "1")]
    pub report_interval: usize,

    /// Chromosomes of a generated reference table.
    #[structopt(long, default_value = CHROMOSOMES_STR.as_str())]
    pub chromosomes: usize,

    /// Neutral loci per generated chromosome.
    #[structopt(long, default_value = NEUTRAL_LOCI_STR.as_str())]
    pub neutral_loci: usize,

    /// Deleterious loci per generated chromosome.
    #[structopt(long, default_value = DELETERIOUS_LOCI_STR.as_str())]
    pub deleterious_loci: usize,

    /// Length in base pairs of a generated chromosome.
    #[structopt(long, default_value = CHROMOSOME_LENGTH_STR.as_str())]
    pub chromosome_length: u64,

    /// Mean of the gamma distribution of selection coefficients.
    #[structopt(long, default_value = S_MEAN_STR.as_str())]
    pub s_mean: f64,

    /// Shape of the gamma distribution of selection coefficients.
    #[structopt(long, default_value = S_SHAPE_STR.as_str())]
    pub s_shape: f64,

    /// Constant dominance coefficient. Overrides `--dominance-k`.
    #[structopt(long)]
    pub dominance: Option<f64>,

    /// Rate k of the dominance curve h = 0.5 * exp(-k * s).
    #[structopt(long, default_value = DOMINANCE_K_STR.as_str())]
    pub dominance_k: f64,

    /// Constant initial frequency of deleterious alleles. Overrides `--mutation-rate`.
    #[structopt(long)]
    pub q: Option<f64>,

    /// Mutation rate for mutation-selection balance initial frequencies.
    #[structopt(long, default_value = MUTATION_RATE_STR.as_str())]
    pub mutation_rate: f64,

    /// Initial frequency of neutral alleles in a generated table.
    #[structopt(long, default_value = NEUTRAL_Q_STR.as_str())]
    pub neutral_q: f64,

    /// Number of worker threads (default: all available cores).
    #[structopt(long, short = "t")]
    pub threads: Option<usize>,

    /// Validate the configuration and reference table, then exit.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Where the loci of the run come from.
#[derive(Debug, Clone)]
pub enum ReferenceSource {
    File(PathBuf),
    Generate(TableParams),
}

/// Normalised configuration derived from [`SimulateArgs`].
#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub reference: ReferenceSource,
    pub output: PathBuf,
    pub sim: SimConfig,
    pub threads: usize,
    pub dry_run: bool,
}

impl From<SimulateArgs> for SimulateConfig {
    fn from(args: SimulateArgs) -> SimulateConfig {
        let reference = match args.reference {
            Some(path) => ReferenceSource::File(path),
            None => ReferenceSource::Generate(TableParams {
                chromosomes: args.chromosomes,
                neutral_per_chromosome: args.neutral_loci,
                deleterious_per_chromosome: args.deleterious_loci,
                chromosome_length: args.chromosome_length,
                s_mean: args.s_mean,
                s_shape: args.s_shape,
                dominance: match args.dominance {
                    Some(h) => Dominance::Constant(h),
                    None => Dominance::Exponential(args.dominance_k),
                },
                initial_q: match args.q {
                    Some(q) => InitialFrequency::Constant(q),
                    None => InitialFrequency::MutationSelection {
                        mu: args.mutation_rate,
                    },
                },
                neutral_q: args.neutral_q,
            }),
        };

        let migration = args.migration_interval.map(|interval| MigrationConfig {
            interval,
            transfers: args.transfers,
            random_transfers: args.random_transfers,
            dispersal: args.dispersal,
        });

        let mut store_generations = args.store;
        store_generations.sort_unstable();
        store_generations.dedup();

        SimulateConfig {
            reference,
            output: args.output,
            sim: SimConfig {
                population_size: args.population_size,
                number_pops: args.pops,
                generations: args.generations,
                offspring_mean: args.offspring_mean,
                offspring_dispersion: args.offspring_dispersion,
                mating_success: args.mating_success,
                recombination: !args.no_recombination,
                crossovers_per_meiosis: args.crossovers,
                selection: args.selection,
                migration,
                seed: args.seed,
                store_generations,
                report_interval: args.report_interval,
            },
            threads: args.threads.unwrap_or_else(num_cpus::get),
            dry_run: args.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> SimulateConfig {
        let mut argv = vec!["simulate"];
        argv.extend_from_slice(extra);
        SimulateArgs::from_iter_safe(argv).unwrap().into()
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = parse(&[]);
        assert_eq!(config.sim, SimConfig::default());
        match config.reference {
            ReferenceSource::Generate(params) => assert_eq!(params, TableParams::default()),
            ReferenceSource::File(_) => panic!("expected a generated table"),
        }
    }

    #[test]
    fn migration_and_overrides() {
        let config = parse(&[
            "--migration-interval",
            "5",
            "--transfers",
            "3",
            "--dispersal",
            "circle",
            "--store",
            "10,0,10",
            "--dominance",
            "0.3",
            "--q",
            "0.05",
            "--mating-success",
            "0,1,0,0",
        ]);
        let migration = config.sim.migration.unwrap();
        assert_eq!(migration.interval, 5);
        assert_eq!(migration.transfers, 3);
        assert_eq!(migration.dispersal, DispersalType::Circle);
        assert_eq!(config.sim.store_generations, vec![0, 10]);
        assert_eq!(config.sim.mating_success, [0.0, 1.0, 0.0, 0.0]);
        match config.reference {
            ReferenceSource::Generate(params) => {
                assert_eq!(params.dominance, Dominance::Constant(0.3));
                assert_eq!(params.initial_q, InitialFrequency::Constant(0.05));
            }
            ReferenceSource::File(_) => panic!("expected a generated table"),
        }
    }

    #[test]
    fn mating_success_needs_four_values() {
        assert!(parse_mating_success("0.5,0.5").is_err());
        assert!(parse_mating_success("a,b,c,d").is_err());
    }
}
