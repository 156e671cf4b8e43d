//! Meiosis and mating.

use crate::core::error::{DartError, Result};
use crate::sim::individual::{Haplotype, Individual, Population, Sex};
use crate::sim::params::SimConfig;
use crate::sim::reference::ReferenceTable;
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Gamma, Poisson, WeightedIndex};
use smallvec::SmallVec;

/// One gamete of `parent`.
///
/// Each chromosome starts on a random strand. With recombination enabled,
/// a Poisson number of chiasmata is placed on the chromosome's
/// recombination map and the copied strand switches after each of them.
/// Chromosomes assort independently.
pub fn make_gamete<R: Rng + ?Sized>(
    parent: &Individual,
    table: &ReferenceTable,
    config: &SimConfig,
    rng: &mut R,
) -> Result<Haplotype> {
    let crossovers = if config.recombination && config.crossovers_per_meiosis > 0.0 {
        Some(Poisson::new(config.crossovers_per_meiosis).map_err(|e| {
            DartError::Config(format!("crossover distribution: {}", e))
        })?)
    } else {
        None
    };

    let mut gamete = Vec::with_capacity(table.n_loci());
    for span in table.chromosomes() {
        let mut strand = rng.gen_range(0..2usize);

        let mut chiasmata: SmallVec<[usize; 4]> = SmallVec::new();
        if let Some(poisson) = &crossovers {
            let n = poisson.sample(rng) as usize;
            for _ in 0..n {
                if let Some(interval) = span.sample_interval(rng) {
                    chiasmata.push(interval);
                }
            }
            chiasmata.sort_unstable();
        }

        let mut next = chiasmata.iter().peekable();
        for (offset, locus) in span.loci.clone().enumerate() {
            gamete.push(parent.chromosomes[strand][locus]);
            // a chiasma in interval `offset` lies between this locus and the next
            while next.next_if(|&&c| c == offset).is_some() {
                strand = 1 - strand;
            }
        }
    }
    Ok(gamete)
}

/// Offspring of one generation of population `pop`.
///
/// Every male mates 0 to 3 times following the mating-success
/// distribution, each time with a random female. A mating produces a
/// negative-binomial number of offspring, drawn as a gamma-Poisson mixture.
pub fn reproduce<R: Rng + ?Sized>(
    pop: &Population,
    config: &SimConfig,
    table: &ReferenceTable,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    let males: Vec<&Individual> = pop.individuals.iter().filter(|i| i.sex == Sex::Male).collect();
    let females: Vec<&Individual> = pop
        .individuals
        .iter()
        .filter(|i| i.sex == Sex::Female)
        .collect();
    if males.is_empty() || females.is_empty() {
        debug!("Population {} has no breeding pair", pop.id);
        return Ok(Vec::new());
    }

    let matings = WeightedIndex::new(config.mating_success)
        .map_err(|e| DartError::Config(format!("mating success distribution: {}", e)))?;
    let fecundity = Gamma::new(
        config.offspring_dispersion,
        config.offspring_mean / config.offspring_dispersion,
    )
    .map_err(|e| DartError::Config(format!("offspring distribution: {}", e)))?;

    let mut offspring = Vec::new();
    for father in &males {
        for _ in 0..matings.sample(rng) {
            let mother = females[rng.gen_range(0..females.len())];
            let lambda = fecundity.sample(rng);
            let brood = if lambda > 0.0 {
                Poisson::new(lambda)
                    .map_err(|e| DartError::Numerical(format!("brood size: {}", e)))?
                    .sample(rng) as usize
            } else {
                0
            };
            for _ in 0..brood {
                let paternal = make_gamete(father, table, config, rng)?;
                let maternal = make_gamete(mother, table, config, rng)?;
                offspring.push(Individual {
                    id: offspring.len(),
                    sex: Sex::random(rng),
                    source_pop: pop.id,
                    chromosomes: [paternal, maternal],
                    father: Some(father.id),
                    mother: Some(mother.id),
                });
            }
        }
    }
    debug!(
        "Population {}: {} offspring from {} males and {} females",
        pop.id,
        offspring.len(),
        males.len(),
        females.len()
    );
    Ok(offspring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::individual::tests::individual;
    use crate::sim::individual::initialize_population;
    use crate::sim::reference::tests::{record, small_table};
    use crate::sim::reference::LocusKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn no_recombination() -> SimConfig {
        SimConfig {
            recombination: false,
            ..Default::default()
        }
    }

    #[test]
    fn gamete_without_recombination_copies_whole_strands() {
        let table = small_table();
        let parent = individual(0, Sex::Male, &[0, 0, 0, 0], &[1, 1, 1, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let g = make_gamete(&parent, &table, &no_recombination(), &mut rng).unwrap();
            assert_eq!(g.len(), 4);
            // chromosome 1 spans loci 0..3
            assert!(g[0] == g[1] && g[1] == g[2]);
        }
    }

    #[test]
    fn chromosomes_assort_independently() {
        let table = small_table();
        let parent = individual(0, Sex::Male, &[0, 0, 0, 0], &[1, 1, 1, 1]);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mixed = (0..200)
            .filter(|_| {
                let g = make_gamete(&parent, &table, &no_recombination(), &mut rng).unwrap();
                g[0] != g[3]
            })
            .count();
        assert!(mixed > 60 && mixed < 140, "mixed = {}", mixed);
    }

    #[test]
    fn recombination_switches_strands() {
        let records: Vec<_> = (0..20)
            .map(|p| record("c", p * 10, 0.5, 0.0, LocusKind::Neutral))
            .collect();
        let table = ReferenceTable::from_records(records).unwrap();
        let parent = individual(0, Sex::Female, &[0; 20], &[1; 20]);
        let config = SimConfig {
            recombination: true,
            crossovers_per_meiosis: 3.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let recombinant = (0..100)
            .filter(|_| {
                let g = make_gamete(&parent, &table, &config, &mut rng).unwrap();
                g.iter().any(|&a| a != g[0])
            })
            .count();
        // P(no chiasma) = exp(-3) and odd counts always show a switch
        assert!(recombinant > 40, "recombinant = {}", recombinant);
    }

    #[test]
    fn offspring_inherit_one_allele_from_each_parent() {
        let table = small_table();
        let pop = Population {
            id: 3,
            individuals: vec![
                individual(0, Sex::Male, &[1, 1, 1, 1], &[1, 1, 1, 1]),
                individual(1, Sex::Female, &[0, 0, 0, 0], &[0, 0, 0, 0]),
            ],
        };
        let config = SimConfig {
            mating_success: [0.0, 0.0, 0.0, 1.0],
            offspring_mean: 3.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let kids = reproduce(&pop, &config, &table, &mut rng).unwrap();
        assert!(!kids.is_empty());
        for kid in &kids {
            assert_eq!(kid.chromosomes[0], vec![1, 1, 1, 1]);
            assert_eq!(kid.chromosomes[1], vec![0, 0, 0, 0]);
            assert_eq!(kid.father, Some(0));
            assert_eq!(kid.mother, Some(1));
            assert_eq!(kid.source_pop, 3);
        }
    }

    #[test]
    fn no_females_no_offspring() {
        let table = small_table();
        let pop = Population {
            id: 0,
            individuals: vec![individual(0, Sex::Male, &[0; 4], &[0; 4])],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(reproduce(&pop, &SimConfig::default(), &table, &mut rng)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn mean_brood_size_matches_config() {
        let table = small_table();
        let config = SimConfig {
            population_size: 200,
            offspring_mean: 4.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let pop = initialize_population(0, &config, &table, &mut rng);
        let kids = reproduce(&pop, &config, &table, &mut rng).unwrap();
        // 100 males x 1.5 matings x 4 offspring
        let expected = 600.0;
        let got = kids.len() as f64;
        assert!((got - expected).abs() < 0.3 * expected, "got {}", got);
    }

    #[test]
    fn brood_sizes_are_overdispersed() {
        let table = small_table();
        let pop = Population {
            id: 0,
            individuals: vec![
                individual(0, Sex::Male, &[0; 4], &[0; 4]),
                individual(1, Sex::Female, &[0; 4], &[0; 4]),
            ],
        };
        let config = SimConfig {
            mating_success: [0.0, 1.0, 0.0, 0.0],
            offspring_mean: 4.0,
            offspring_dispersion: 1.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let broods: Vec<f64> = (0..5000)
            .map(|_| reproduce(&pop, &config, &table, &mut rng).unwrap().len() as f64)
            .collect();
        let n = broods.len() as f64;
        let mean = broods.iter().sum::<f64>() / n;
        let var = broods.iter().map(|b| (b - mean).powi(2)).sum::<f64>() / (n - 1.0);
        // negative binomial: mean + mean^2 / size = 20, Poisson would give 4
        assert!((mean - 4.0).abs() < 0.3, "mean = {}", mean);
        assert!(var > 15.0 && var < 26.0, "variance = {}", var);
    }
}
