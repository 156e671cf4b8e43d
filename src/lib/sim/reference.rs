//! Reference table: the per-locus parameters of a simulation.
//!
//! Each row gives a locus position, its initial derived allele frequency `q`,
//! dominance `h` and selection coefficient `s`, and whether it is neutral or
//! deleterious. Loci are ordered by chromosome (first appearance) and then
//! by position; haplotypes store them in that order.

use crate::core::error::{DartError, Result};
use crate::core::fs::{is_gzipped, make_parent_dirs};
use crate::core::io::{get_reader, get_writer, require_input};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Gamma, WeightedIndex};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocusKind {
    Neutral,
    Deleterious,
}

/// One row of the reference table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocusRecord {
    pub chromosome: String,
    pub position: u64,
    pub q: f64,
    pub h: f64,
    pub s: f64,
    #[serde(rename = "type")]
    pub kind: LocusKind,
}

/// Loci of one chromosome and the sampler placing chiasmata between them.
#[derive(Clone, Debug)]
pub struct ChromosomeSpan {
    pub name: String,
    /// Locus indices covered, in haplotype coordinates.
    pub loci: Range<usize>,
    /// Probability that a chiasma falls between locus `i` and `i + 1`.
    pub recombination_map: Vec<f64>,
    crossover_sampler: Option<WeightedIndex<f64>>,
}

impl ChromosomeSpan {
    /// Draw the interval of one chiasma, `None` for single-locus chromosomes.
    pub fn sample_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        self.crossover_sampler.as_ref().map(|w| w.sample(rng))
    }
}

#[derive(Clone, Debug)]
pub struct ReferenceTable {
    records: Vec<LocusRecord>,
    chromosomes: Vec<ChromosomeSpan>,
}

fn interval_probabilities(positions: &[u64]) -> Vec<f64> {
    if positions.len() < 2 {
        return Vec::new();
    }
    let gaps: Vec<f64> = positions
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]) as f64)
        .collect();
    let total: f64 = gaps.iter().sum();
    if total > 0.0 {
        gaps.iter().map(|g| g / total).collect()
    } else {
        vec![1.0 / gaps.len() as f64; gaps.len()]
    }
}

impl ReferenceTable {
    /// Order `records` and build the per-chromosome recombination maps.
    pub fn from_records(records: Vec<LocusRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(DartError::EmptyData(
                "reference table has no loci".to_string(),
            ));
        }
        for (i, r) in records.iter().enumerate() {
            for (field, value) in [("q", r.q), ("h", r.h), ("s", r.s)] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(DartError::ThresholdValidation {
                        field: format!("{} of locus {} ({}:{})", field, i, r.chromosome, r.position),
                        min: 0.0,
                        max: 1.0,
                        value,
                    });
                }
            }
        }

        let mut order: Vec<String> = Vec::new();
        for r in &records {
            if !order.contains(&r.chromosome) {
                order.push(r.chromosome.clone());
            }
        }
        let mut records = records;
        records.sort_by(|a, b| {
            let ia = order.iter().position(|c| *c == a.chromosome);
            let ib = order.iter().position(|c| *c == b.chromosome);
            ia.cmp(&ib).then(a.position.cmp(&b.position))
        });

        let mut chromosomes = Vec::with_capacity(order.len());
        let mut start = 0;
        for name in order {
            let end = start + records[start..]
                .iter()
                .take_while(|r| r.chromosome == name)
                .count();
            let positions: Vec<u64> = records[start..end].iter().map(|r| r.position).collect();
            let recombination_map = interval_probabilities(&positions);
            let crossover_sampler = if recombination_map.is_empty() {
                None
            } else {
                Some(WeightedIndex::new(&recombination_map).map_err(|e| {
                    DartError::Numerical(format!("recombination map of {}: {}", name, e))
                })?)
            };
            chromosomes.push(ChromosomeSpan {
                name,
                loci: start..end,
                recombination_map,
                crossover_sampler,
            });
            start = end;
        }

        debug!(
            "Reference table: {} loci on {} chromosomes",
            records.len(),
            chromosomes.len()
        );
        Ok(Self {
            records,
            chromosomes,
        })
    }

    #[inline]
    pub fn n_loci(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[LocusRecord] {
        &self.records
    }

    pub fn chromosomes(&self) -> &[ChromosomeSpan] {
        &self.chromosomes
    }

    /// Interval probabilities of chromosome `chrom`.
    pub fn recombination_map(&self, chrom: usize) -> &[f64] {
        &self.chromosomes[chrom].recombination_map
    }

    #[inline]
    pub fn is_neutral(&self, locus: usize) -> bool {
        self.records[locus].kind == LocusKind::Neutral
    }

    pub fn n_deleterious(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind == LocusKind::Deleterious)
            .count()
    }

    /// Locus names as `<chromosome>_<position>`.
    pub fn locus_names(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("{}_{}", r.chromosome, r.position))
            .collect()
    }

    /// Random table following `params`.
    pub fn generate<R: Rng + ?Sized>(params: &TableParams, rng: &mut R) -> Result<Self> {
        params.validate()?;
        let gamma = Gamma::new(params.s_shape, params.s_mean / params.s_shape)
            .map_err(|e| DartError::Config(format!("selection coefficient distribution: {}", e)))?;

        let per_chrom = params.neutral_per_chromosome + params.deleterious_per_chromosome;
        let mut records = Vec::with_capacity(params.chromosomes * per_chrom);
        for c in 1..=params.chromosomes {
            let mut positions: Vec<u64> = (0..per_chrom)
                .map(|_| rng.gen_range(1..=params.chromosome_length))
                .collect();
            positions.sort_unstable();

            let mut kinds = vec![LocusKind::Neutral; params.neutral_per_chromosome];
            kinds.extend(vec![LocusKind::Deleterious; params.deleterious_per_chromosome]);
            kinds.shuffle(rng);

            for (position, kind) in positions.into_iter().zip(kinds) {
                let (q, h, s) = match kind {
                    LocusKind::Neutral => (params.neutral_q, 0.0, 0.0),
                    LocusKind::Deleterious => {
                        let s = gamma.sample(rng).min(1.0);
                        let h = params.dominance.coefficient(s);
                        (params.initial_q.frequency(h, s), h, s)
                    }
                };
                records.push(LocusRecord {
                    chromosome: format!("chr{}", c),
                    position,
                    q,
                    h,
                    s,
                    kind,
                });
            }
        }
        info!(
            "Generated reference table: {} chromosomes, {} neutral and {} deleterious loci each",
            params.chromosomes, params.neutral_per_chromosome, params.deleterious_per_chromosome
        );
        Self::from_records(records)
    }
}

/// Read a reference table with columns `chromosome position q h s type`.
pub fn read_reference_table<P: AsRef<Path>>(path: P) -> Result<ReferenceTable> {
    let path = path.as_ref();
    require_input(path, "Reference table")?;
    let mut reader = get_reader(&Some(path), true, is_gzipped(path))?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<LocusRecord>, csv::Error>>()?;
    info!("Loaded {} loci from {}", records.len(), path.display());
    ReferenceTable::from_records(records)
}

pub fn write_reference_table<P: AsRef<Path>>(table: &ReferenceTable, path: P) -> Result<()> {
    let path = path.as_ref();
    make_parent_dirs(path)?;
    let mut writer = get_writer(&Some(path), is_gzipped(path), true, 1, 6)?;
    for record in table.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Dominance of deleterious alleles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dominance {
    Constant(f64),
    /// `h = 0.5 * exp(-k * s)`: strongly deleterious alleles are more recessive.
    Exponential(f64),
}

impl Dominance {
    pub fn coefficient(&self, s: f64) -> f64 {
        match *self {
            Dominance::Constant(h) => h,
            Dominance::Exponential(k) => 0.5 * (-k * s).exp(),
        }
    }
}

/// Initial frequency of deleterious alleles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitialFrequency {
    Constant(f64),
    /// Mutation-selection balance for mutation rate `mu`.
    MutationSelection { mu: f64 },
}

/// Upper bound on a generated deleterious allele frequency.
const MAX_INITIAL_Q: f64 = 0.5;

impl InitialFrequency {
    pub fn frequency(&self, h: f64, s: f64) -> f64 {
        let q = match *self {
            InitialFrequency::Constant(q) => q,
            InitialFrequency::MutationSelection { mu } => {
                if h * s > 0.0 {
                    mu / (h * s)
                } else if s > 0.0 {
                    (mu / s).sqrt()
                } else {
                    MAX_INITIAL_Q
                }
            }
        };
        q.min(MAX_INITIAL_Q)
    }
}

/// Layout and distributions for [`ReferenceTable::generate`].
#[derive(Clone, Debug, PartialEq)]
pub struct TableParams {
    pub chromosomes: usize,
    pub neutral_per_chromosome: usize,
    pub deleterious_per_chromosome: usize,
    /// Chromosome length in base pairs; positions are drawn in `1..=length`.
    pub chromosome_length: u64,
    pub s_mean: f64,
    pub s_shape: f64,
    pub dominance: Dominance,
    pub initial_q: InitialFrequency,
    pub neutral_q: f64,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            chromosomes: 1,
            neutral_per_chromosome: 100,
            deleterious_per_chromosome: 100,
            chromosome_length: 100_000_000,
            s_mean: 0.01,
            s_shape: 0.3,
            dominance: Dominance::Exponential(25.0),
            initial_q: InitialFrequency::MutationSelection { mu: 5e-5 },
            neutral_q: 0.5,
        }
    }
}

impl TableParams {
    pub fn validate(&self) -> Result<()> {
        if self.chromosomes == 0 {
            return Err(DartError::InvalidInput(
                "at least one chromosome is required".to_string(),
            ));
        }
        if self.neutral_per_chromosome + self.deleterious_per_chromosome == 0 {
            return Err(DartError::InvalidInput(
                "chromosomes must carry at least one locus".to_string(),
            ));
        }
        if self.chromosome_length == 0 {
            return Err(DartError::InvalidInput(
                "chromosome_length must be positive".to_string(),
            ));
        }
        if !(self.s_mean > 0.0 && self.s_shape > 0.0) {
            return Err(DartError::InvalidInput(format!(
                "s distribution needs positive mean and shape, got {} and {}",
                self.s_mean, self.s_shape
            )));
        }
        if let Dominance::Constant(h) = self.dominance {
            check_unit("h", h)?;
        }
        match self.initial_q {
            InitialFrequency::Constant(q) => check_unit("q", q)?,
            InitialFrequency::MutationSelection { mu } => check_unit("mu", mu)?,
        }
        check_unit("neutral_q", self.neutral_q)
    }
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DartError::ThresholdValidation {
            field: field.to_string(),
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub(crate) fn record(chrom: &str, position: u64, q: f64, s: f64, kind: LocusKind) -> LocusRecord {
        LocusRecord {
            chromosome: chrom.to_string(),
            position,
            q,
            h: 0.5,
            s,
            kind,
        }
    }

    /// Two chromosomes; after sorting, loci 2 and 3 are neutral.
    pub(crate) fn small_table() -> ReferenceTable {
        ReferenceTable::from_records(vec![
            record("chr1", 100, 0.1, 0.2, LocusKind::Deleterious),
            record("chr1", 400, 0.5, 0.0, LocusKind::Neutral),
            record("chr1", 200, 0.2, 0.1, LocusKind::Deleterious),
            record("chr2", 50, 0.5, 0.0, LocusKind::Neutral),
        ])
        .unwrap()
    }

    #[test]
    fn records_sorted_within_chromosome() {
        let table = small_table();
        let positions: Vec<u64> = table.records().iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![100, 200, 400, 50]);
        assert_eq!(table.chromosomes()[0].loci, 0..3);
        assert_eq!(table.chromosomes()[1].loci, 3..4);
        assert!(table.is_neutral(2));
        assert_eq!(table.n_deleterious(), 2);
        assert_eq!(table.locus_names()[3], "chr2_50");
    }

    #[test]
    fn recombination_map_proportional_to_distance() {
        let table = small_table();
        let map = table.recombination_map(0);
        assert_eq!(map.len(), 2);
        assert!((map[0] - 100.0 / 300.0).abs() < 1e-12);
        assert!((map[1] - 200.0 / 300.0).abs() < 1e-12);
        assert!(table.recombination_map(1).is_empty());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(table.chromosomes()[1].sample_interval(&mut rng), None);
    }

    #[test]
    fn coincident_positions_give_uniform_map() {
        assert_eq!(interval_probabilities(&[5, 5, 5]), vec![0.5, 0.5]);
    }

    #[test]
    fn invalid_records_rejected() {
        let bad = vec![record("chr1", 1, 1.5, 0.1, LocusKind::Deleterious)];
        assert!(matches!(
            ReferenceTable::from_records(bad),
            Err(DartError::ThresholdValidation { .. })
        ));
        assert!(ReferenceTable::from_records(Vec::new()).is_err());
    }

    #[test]
    fn generated_table_follows_params() {
        let params = TableParams {
            chromosomes: 2,
            neutral_per_chromosome: 5,
            deleterious_per_chromosome: 20,
            chromosome_length: 1_000,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let table = ReferenceTable::generate(&params, &mut rng).unwrap();
        assert_eq!(table.n_loci(), 50);
        assert_eq!(table.n_deleterious(), 40);
        assert_eq!(table.chromosomes().len(), 2);
        for r in table.records() {
            assert!(r.q <= MAX_INITIAL_Q);
            assert!(r.s <= 1.0);
            if r.kind == LocusKind::Neutral {
                assert_eq!(r.s, 0.0);
                assert_eq!(r.q, 0.5);
            }
        }
    }

    #[test]
    fn mutation_selection_balance() {
        let init = InitialFrequency::MutationSelection { mu: 1e-4 };
        assert!((init.frequency(0.5, 0.02) - 0.01).abs() < 1e-12);
        assert!((init.frequency(0.0, 0.01) - 0.1).abs() < 1e-12);
        assert_eq!(init.frequency(0.5, 1e-9), MAX_INITIAL_Q);
        assert!((Dominance::Exponential(25.0).coefficient(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn table_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.tsv");
        let table = small_table();
        write_reference_table(&table, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("chromosome\tposition\tq\th\ts\ttype"));
        assert!(text.contains("neutral"));
        let back = read_reference_table(&path).unwrap();
        assert_eq!(back.records(), table.records());
    }
}
