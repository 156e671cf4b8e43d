//! Simulation parameters and their validation.

use crate::core::error::{DartError, Result};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// How fitness decides which offspring survive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionModel {
    /// Every offspring survives; regulation samples uniformly.
    None,
    /// An offspring survives with probability equal to its fitness.
    Absolute,
    /// Fitness relative to the fittest offspring weights the draw of survivors.
    Relative,
}

impl FromStr for SelectionModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "neutral" => Ok(SelectionModel::None),
            "absolute" => Ok(SelectionModel::Absolute),
            "relative" => Ok(SelectionModel::Relative),
            _ => Err(format!(
                "Invalid selection model: {}. Valid models: none, absolute, relative",
                s
            )),
        }
    }
}

impl fmt::Display for SelectionModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionModel::None => write!(f, "none"),
            SelectionModel::Absolute => write!(f, "absolute"),
            SelectionModel::Relative => write!(f, "relative"),
        }
    }
}

/// Which populations exchange migrants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispersalType {
    /// Neighbours along a line: 0-1, 1-2, ...
    Line,
    /// A line closed into a ring.
    Circle,
    /// Every pair of populations.
    AllConnected,
}

impl DispersalType {
    /// Population pairs exchanging migrants among `n` populations.
    pub fn pairs(&self, n: usize) -> Vec<(usize, usize)> {
        if n < 2 {
            return Vec::new();
        }
        match self {
            DispersalType::Line => (0..n - 1).map(|i| (i, i + 1)).collect(),
            DispersalType::Circle => {
                let mut pairs: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
                if n > 2 {
                    pairs.push((n - 1, 0));
                }
                pairs
            }
            DispersalType::AllConnected => (0..n).tuple_combinations().collect(),
        }
    }
}

impl FromStr for DispersalType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(DispersalType::Line),
            "circle" => Ok(DispersalType::Circle),
            "all" | "all_connected" | "allconnected" => Ok(DispersalType::AllConnected),
            _ => Err(format!(
                "Invalid dispersal type: {}. Valid types: line, circle, all",
                s
            )),
        }
    }
}

impl fmt::Display for DispersalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DispersalType::Line => write!(f, "line"),
            DispersalType::Circle => write!(f, "circle"),
            DispersalType::AllConnected => write!(f, "all"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MigrationConfig {
    /// Generations between migration events.
    pub interval: usize,
    /// Individuals moved per pair and event.
    pub transfers: usize,
    /// Draw the count uniformly from `0..=transfers` instead.
    pub random_transfers: bool,
    pub dispersal: DispersalType,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            interval: 1,
            transfers: 1,
            random_transfers: false,
            dispersal: DispersalType::Line,
        }
    }
}

/// Everything [`Simulation`](crate::sim::engine::Simulation) needs besides
/// the reference table.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub population_size: usize,
    pub number_pops: usize,
    pub generations: usize,
    /// Mean offspring per mating.
    pub offspring_mean: f64,
    /// Size parameter of the negative binomial offspring distribution.
    pub offspring_dispersion: f64,
    /// Probability that a male mates 0, 1, 2 or 3 times.
    pub mating_success: [f64; 4],
    pub recombination: bool,
    /// Poisson mean of chiasmata per chromosome and meiosis.
    pub crossovers_per_meiosis: f64,
    pub selection: SelectionModel,
    pub migration: Option<MigrationConfig>,
    pub seed: u64,
    /// Generations whose genotypes are kept in the outcome.
    pub store_generations: Vec<usize>,
    /// Generations between summary rows; the last generation is always reported.
    pub report_interval: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            number_pops: 2,
            generations: 10,
            offspring_mean: 4.0,
            offspring_dispersion: 5.0,
            mating_success: [0.2, 0.3, 0.3, 0.2],
            recombination: true,
            crossovers_per_meiosis: 1.0,
            selection: SelectionModel::Relative,
            migration: None,
            seed: 42,
            store_generations: Vec::new(),
            report_interval: 1,
        }
    }
}

fn positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DartError::InvalidInput(format!(
            "{} must be positive, got {}",
            field, value
        )))
    }
}

fn probability(field: &str, value: f64) -> Result<()> {
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

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 || self.population_size % 2 != 0 {
            return Err(DartError::InvalidInput(format!(
                "population_size must be even and at least 2, got {}",
                self.population_size
            )));
        }
        if self.number_pops == 0 {
            return Err(DartError::InvalidInput(
                "number_pops must be at least 1".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(DartError::InvalidInput(
                "generations must be at least 1".to_string(),
            ));
        }
        positive("offspring_mean", self.offspring_mean)?;
        positive("offspring_dispersion", self.offspring_dispersion)?;

        for (i, &p) in self.mating_success.iter().enumerate() {
            probability(&format!("mating_success[{}]", i), p)?;
        }
        let total: f64 = self.mating_success.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(DartError::InvalidInput(format!(
                "mating_success probabilities must sum to 1, got {}",
                total
            )));
        }

        if !(self.crossovers_per_meiosis.is_finite() && self.crossovers_per_meiosis >= 0.0) {
            return Err(DartError::InvalidInput(format!(
                "crossovers_per_meiosis must be non-negative, got {}",
                self.crossovers_per_meiosis
            )));
        }
        if self.report_interval == 0 {
            return Err(DartError::InvalidInput(
                "report_interval must be at least 1".to_string(),
            ));
        }
        if let Some(&g) = self
            .store_generations
            .iter()
            .find(|&&g| g > self.generations)
        {
            return Err(DartError::InvalidInput(format!(
                "cannot store generation {} of a {}-generation run",
                g, self.generations
            )));
        }
        if let Some(migration) = &self.migration {
            if migration.interval == 0 {
                return Err(DartError::InvalidInput(
                    "migration interval must be at least 1".to_string(),
                ));
            }
            if migration.transfers > self.population_size / 2 {
                return Err(DartError::InvalidInput(format!(
                    "cannot transfer {} individuals of one sex from populations of {}",
                    migration.transfers, self.population_size
                )));
            }
        }
        Ok(())
    }

    /// Individuals of each sex kept after regulation.
    #[inline]
    pub fn per_sex(&self) -> usize {
        self.population_size / 2
    }

    /// Whether migrants move at the end of `generation`.
    pub fn migrates_in(&self, generation: usize) -> bool {
        match &self.migration {
            Some(m) => self.number_pops > 1 && generation % m.interval == 0,
            None => false,
        }
    }

    /// Whether a summary row is written for `generation`.
    pub fn reports_in(&self, generation: usize) -> bool {
        generation % self.report_interval == 0 || generation == self.generations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn odd_population_size_rejected() {
        let config = SimConfig {
            population_size: 11,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DartError::InvalidInput(_))));
    }

    #[test]
    fn mating_success_must_be_a_distribution() {
        let config = SimConfig {
            mating_success: [0.5, 0.5, 0.5, 0.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SimConfig {
            mating_success: [1.2, -0.2, 0.0, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DartError::ThresholdValidation { .. })
        ));
    }

    #[test]
    fn migration_schedule() {
        let config = SimConfig {
            migration: Some(MigrationConfig {
                interval: 3,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!config.migrates_in(2));
        assert!(config.migrates_in(3));
        let single = SimConfig {
            number_pops: 1,
            ..config
        };
        assert!(!single.migrates_in(3));
    }

    #[test]
    fn dispersal_pairs() {
        assert_eq!(DispersalType::Line.pairs(3), vec![(0, 1), (1, 2)]);
        assert_eq!(DispersalType::Circle.pairs(3), vec![(0, 1), (1, 2), (2, 0)]);
        assert_eq!(DispersalType::Circle.pairs(2), vec![(0, 1)]);
        assert_eq!(DispersalType::AllConnected.pairs(4).len(), 6);
        assert!(DispersalType::Line.pairs(1).is_empty());
    }

    #[test]
    fn parsing() {
        assert_eq!("Relative".parse::<SelectionModel>().unwrap(), SelectionModel::Relative);
        assert_eq!("all".parse::<DispersalType>().unwrap(), DispersalType::AllConnected);
        assert!("island".parse::<DispersalType>().is_err());
    }
}
