use dartrs_lib::genotype::DataType;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

/// Report produced by the `stats` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsReport {
    /// Ho, He, uHe and FIS per population.
    Heterozygosity,
    /// Heterozygosity of every individual.
    Individual,
    /// Nei (1987) per-locus and overall F-statistics.
    Basic,
    /// Weir & Cockerham pairwise Fst.
    Fst,
    /// Alternate allele frequency per locus and population.
    Freq,
    /// Principal component scores.
    Pca,
}

impl FromStr for StatsReport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heterozygosity" | "het" => Ok(StatsReport::Heterozygosity),
            "individual" | "ind" => Ok(StatsReport::Individual),
            "basic" => Ok(StatsReport::Basic),
            "fst" => Ok(StatsReport::Fst),
            "freq" => Ok(StatsReport::Freq),
            "pca" => Ok(StatsReport::Pca),
            _ => Err(format!(
                "Invalid report: {}. Valid reports: heterozygosity, individual, basic, fst, freq, pca",
                s
            )),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StatsReport::Heterozygosity => "heterozygosity",
            StatsReport::Individual => "individual",
            StatsReport::Basic => "basic",
            StatsReport::Fst => "fst",
            StatsReport::Freq => "freq",
            StatsReport::Pca => "pca",
        };
        write!(f, "{}", name)
    }
}

/// CLI arguments for the `stats` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "stats")]
pub struct StatsArgs {
    /// Input genotype table (`id pop <loci...>`, `.gz` accepted).
    pub input: PathBuf,

    /// Report: heterozygosity, individual, basic, fst, freq or pca.
    #[structopt(long, short = "r", default_value = "heterozygosity")]
    pub report: StatsReport,

    /// Output TSV (`-` for stdout, `.gz` to compress).
    #[structopt(long, short = "o", default_value = "-")]
    pub output: PathBuf,

    /// Marker type of the input: snp or silicodart.
    #[structopt(long, default_value = "snp")]
    pub data_type: DataType,

    /// Principal components kept by the pca report.
    #[structopt(long, default_value = "5")]
    pub axes: usize,

    /// Number of worker threads (default: all available cores).
    #[structopt(long, short = "t")]
    pub threads: Option<usize>,

    /// Validate the input, then exit.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Normalised configuration derived from [`StatsArgs`].
#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub input: PathBuf,
    pub report: StatsReport,
    pub output: PathBuf,
    pub data_type: DataType,
    pub axes: usize,
    pub threads: usize,
    pub dry_run: bool,
}

impl From<StatsArgs> for StatsConfig {
    fn from(args: StatsArgs) -> StatsConfig {
        StatsConfig {
            input: args.input,
            report: args.report,
            output: args.output,
            data_type: args.data_type,
            axes: args.axes,
            threads: args.threads.unwrap_or_else(num_cpus::get),
            dry_run: args.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_aliases() {
        assert_eq!("het".parse::<StatsReport>().unwrap(), StatsReport::Heterozygosity);
        assert_eq!("IND".parse::<StatsReport>().unwrap(), StatsReport::Individual);
        assert!("hwe".parse::<StatsReport>().is_err());
    }
}
