//! Viability selection and population regulation.

use crate::core::error::{DartError, Result};
use crate::sim::individual::{Individual, Sex, DERIVED, NEUTRAL_MASK};
use crate::sim::params::SelectionModel;
use crate::sim::reference::ReferenceTable;
use log::debug;
use rand::seq::index;
use rand::Rng;

/// Multiplicative fitness of `ind` over its non-neutral loci: `1 - s` for
/// each homozygous derived locus and `1 - h*s` for each heterozygous one.
pub fn fitness(ind: &Individual, table: &ReferenceTable) -> f64 {
    let [a, b] = ind.masked(table);
    a.iter()
        .zip(b.iter())
        .zip(table.records())
        .filter(|((&x, _), _)| x != NEUTRAL_MASK)
        .fold(1.0, |w, ((&x, &y), r)| match (x == DERIVED, y == DERIVED) {
            (true, true) => w * (1.0 - r.s),
            (true, false) | (false, true) => w * (1.0 - r.h * r.s),
            (false, false) => w,
        })
}

/// An offspring that passed selection and its weight in regulation.
#[derive(Clone, Debug)]
pub struct Survivor {
    pub individual: Individual,
    pub weight: f64,
}

/// Apply viability selection to `offspring`.
///
/// Under the absolute model an individual survives when a uniform draw is
/// not below its genetic load `1 - w`. Under the relative model everyone
/// with non-zero fitness survives, weighted by fitness relative to the
/// fittest offspring.
pub fn select<R: Rng + ?Sized>(
    offspring: Vec<Individual>,
    model: SelectionModel,
    table: &ReferenceTable,
    rng: &mut R,
) -> Vec<Survivor> {
    let before = offspring.len();
    let survivors: Vec<Survivor> = match model {
        SelectionModel::None => offspring
            .into_iter()
            .map(|individual| Survivor {
                individual,
                weight: 1.0,
            })
            .collect(),
        SelectionModel::Absolute => offspring
            .into_iter()
            .filter(|ind| rng.gen::<f64>() >= 1.0 - fitness(ind, table))
            .map(|individual| Survivor {
                individual,
                weight: 1.0,
            })
            .collect(),
        SelectionModel::Relative => {
            let scored: Vec<(Individual, f64)> = offspring
                .into_iter()
                .map(|ind| {
                    let w = fitness(&ind, table);
                    (ind, w)
                })
                .collect();
            let max = scored.iter().map(|(_, w)| *w).fold(0.0, f64::max);
            if max <= 0.0 {
                Vec::new()
            } else {
                scored
                    .into_iter()
                    .filter(|(_, w)| *w > 0.0)
                    .map(|(individual, w)| Survivor {
                        individual,
                        weight: w / max,
                    })
                    .collect()
            }
        }
    };
    debug!(
        "Selection ({}): {} -> {} offspring",
        model,
        before,
        survivors.len()
    );
    survivors
}

/// Indices of `amount` items drawn without replacement with probability
/// proportional to `weights` (Efraimidis-Spirakis keys).
fn weighted_sample<R: Rng + ?Sized>(weights: &[f64], amount: usize, rng: &mut R) -> Vec<usize> {
    let mut keyed: Vec<(f64, usize)> = weights
        .iter()
        .enumerate()
        .filter(|(_, &w)| w > 0.0)
        .map(|(i, &w)| {
            let u: f64 = 1.0 - rng.gen::<f64>();
            (u.ln() / w, i)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.truncate(amount);
    keyed.into_iter().map(|(_, i)| i).collect()
}

/// Reduce `survivors` to exactly `per_sex` males and `per_sex` females.
///
/// The relative model draws the retained individuals by weight; the other
/// models draw uniformly. Fewer than `per_sex` survivors of either sex is an
/// extinction.
pub fn regulate<R: Rng + ?Sized>(
    survivors: Vec<Survivor>,
    per_sex: usize,
    model: SelectionModel,
    generation: usize,
    population: usize,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    let mut kept = Vec::with_capacity(2 * per_sex);
    for sex in [Sex::Male, Sex::Female] {
        let pool: Vec<&Survivor> = survivors
            .iter()
            .filter(|s| s.individual.sex == sex)
            .collect();
        if pool.len() < per_sex {
            return Err(DartError::Extinction {
                generation,
                population,
                reason: format!(
                    "only {} {}s survived selection, {} needed",
                    pool.len(),
                    sex,
                    per_sex
                ),
            });
        }

        let mut chosen = match model {
            SelectionModel::Relative => {
                let weights: Vec<f64> = pool.iter().map(|s| s.weight).collect();
                weighted_sample(&weights, per_sex, rng)
            }
            SelectionModel::None | SelectionModel::Absolute => {
                index::sample(rng, pool.len(), per_sex).into_vec()
            }
        };
        chosen.sort_unstable();
        kept.extend(chosen.into_iter().map(|i| pool[i].individual.clone()));
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::individual::tests::individual;
    use crate::sim::reference::tests::small_table;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fitness_ignores_neutral_loci() {
        // deleterious loci 0 (s 0.2) and 1 (s 0.1), h = 0.5
        let table = small_table();
        let clean = individual(0, Sex::Male, &[0, 0, 1, 1], &[0, 0, 1, 1]);
        assert_eq!(fitness(&clean, &table), 1.0);

        let hom = individual(0, Sex::Male, &[1, 0, 0, 0], &[1, 0, 0, 0]);
        assert!((fitness(&hom, &table) - 0.8).abs() < 1e-12);

        let het_both = individual(0, Sex::Male, &[1, 1, 0, 0], &[0, 0, 0, 0]);
        assert!((fitness(&het_both, &table) - 0.9 * 0.95).abs() < 1e-12);
    }

    #[test]
    fn neutral_model_keeps_everyone() {
        let table = small_table();
        let kids = vec![individual(0, Sex::Male, &[1; 4], &[1; 4]); 5];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let survivors = select(kids, SelectionModel::None, &table, &mut rng);
        assert_eq!(survivors.len(), 5);
    }

    #[test]
    fn absolute_model_survival_tracks_fitness() {
        let table = small_table();
        // fitness 0.8 * 0.9 = 0.72
        let kids = vec![individual(0, Sex::Male, &[1, 1, 0, 0], &[1, 1, 0, 0]); 2000];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let survivors = select(kids, SelectionModel::Absolute, &table, &mut rng);
        let rate = survivors.len() as f64 / 2000.0;
        assert!((rate - 0.72).abs() < 0.05, "rate = {}", rate);
    }

    #[test]
    fn relative_weights_scaled_by_fittest() {
        let table = small_table();
        let kids = vec![
            individual(0, Sex::Male, &[0; 4], &[0; 4]),
            individual(1, Sex::Female, &[1, 0, 0, 0], &[1, 0, 0, 0]),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let survivors = select(kids, SelectionModel::Relative, &table, &mut rng);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].weight, 1.0);
        assert!((survivors[1].weight - 0.8).abs() < 1e-12);
    }

    #[test]
    fn regulation_keeps_exactly_half_per_sex() {
        let mut survivors = Vec::new();
        for i in 0..30 {
            let sex = if i % 3 == 0 { Sex::Female } else { Sex::Male };
            survivors.push(Survivor {
                individual: individual(i, sex, &[0; 4], &[0; 4]),
                weight: 1.0 / (1 + i) as f64,
            });
        }
        for model in [SelectionModel::None, SelectionModel::Relative] {
            let mut rng = ChaCha8Rng::seed_from_u64(8);
            let kept = regulate(survivors.clone(), 5, model, 1, 0, &mut rng).unwrap();
            assert_eq!(kept.len(), 10);
            assert_eq!(kept.iter().filter(|i| i.sex == Sex::Male).count(), 5);
        }
    }

    #[test]
    fn too_few_of_a_sex_is_extinction() {
        let survivors: Vec<Survivor> = (0..6)
            .map(|i| Survivor {
                individual: individual(i, Sex::Male, &[0; 4], &[0; 4]),
                weight: 1.0,
            })
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let err = regulate(survivors, 2, SelectionModel::None, 7, 1, &mut rng).unwrap_err();
        match err {
            DartError::Extinction {
                generation,
                population,
                ..
            } => {
                assert_eq!(generation, 7);
                assert_eq!(population, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn weighted_sampling_prefers_heavy_items() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let weights = [100.0, 0.0, 0.01, 0.01, 0.01];
        let mut first = 0;
        for _ in 0..200 {
            let picked = weighted_sample(&weights, 1, &mut rng);
            assert_ne!(picked, vec![1]);
            if picked == vec![0] {
                first += 1;
            }
        }
        assert!(first > 190);
        assert_eq!(weighted_sample(&weights, 10, &mut rng).len(), 4);
    }
}
