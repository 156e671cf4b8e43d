//! Exchange of migrants between populations.

use crate::sim::individual::{Population, Sex};
use crate::sim::params::MigrationConfig;
use log::debug;
use rand::seq::index;
use rand::Rng;
use serde::Serialize;

/// One exchange between two populations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MigrationEvent {
    pub generation: usize,
    pub from: usize,
    pub to: usize,
    pub count: usize,
    pub sex: Sex,
}

/// Swap migrants between the population pairs of the dispersal topology.
///
/// For each pair, `flag` selects the donor: the first population of the
/// pair when set, the second otherwise. The donor sends `count`
/// individuals of a random sex and receives as many of the same sex in
/// return, so population sizes and sex ratios are unchanged. `flag` flips
/// once per call.
///
/// Since every exchange is a swap, there is no net one-way flow: `flag`
/// only decides which side of a pair is reported as `from` and `to` in the
/// returned [`MigrationEvent`]s and the order of the random draws.
pub fn migrate<R: Rng + ?Sized>(
    pops: &mut [Population],
    config: &MigrationConfig,
    generation: usize,
    flag: &mut bool,
    rng: &mut R,
) -> Vec<MigrationEvent> {
    let mut events = Vec::new();
    for (a, b) in config.dispersal.pairs(pops.len()) {
        let (from, to) = if *flag { (a, b) } else { (b, a) };
        let sex = Sex::random(rng);
        let wanted = if config.random_transfers {
            rng.gen_range(0..=config.transfers)
        } else {
            config.transfers
        };

        let donors: Vec<usize> = sex_indices(&pops[from], sex);
        let receivers: Vec<usize> = sex_indices(&pops[to], sex);
        let count = wanted.min(donors.len()).min(receivers.len());
        if count == 0 {
            continue;
        }

        let outgoing: Vec<usize> = index::sample(rng, donors.len(), count)
            .into_iter()
            .map(|k| donors[k])
            .collect();
        let incoming: Vec<usize> = index::sample(rng, receivers.len(), count)
            .into_iter()
            .map(|k| receivers[k])
            .collect();
        for (&i, &j) in outgoing.iter().zip(&incoming) {
            let leaving = pops[from].individuals[i].clone();
            let arriving = std::mem::replace(&mut pops[to].individuals[j], leaving);
            pops[from].individuals[i] = arriving;
        }

        debug!(
            "Generation {}: {} {}s exchanged between population {} and {}",
            generation, count, sex, from, to
        );
        events.push(MigrationEvent {
            generation,
            from,
            to,
            count,
            sex,
        });
    }
    *flag = !*flag;
    events
}

fn sex_indices(pop: &Population, sex: Sex) -> Vec<usize> {
    pop.individuals
        .iter()
        .enumerate()
        .filter_map(|(i, ind)| (ind.sex == sex).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::individual::tests::individual;
    use crate::sim::params::DispersalType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pops(n: usize) -> Vec<Population> {
        (0..n)
            .map(|p| {
                let individuals = (0..6)
                    .map(|i| {
                        let sex = if i < 3 { Sex::Male } else { Sex::Female };
                        let mut ind = individual(i, sex, &[p as u8], &[p as u8]);
                        ind.source_pop = p;
                        ind
                    })
                    .collect();
                Population { id: p, individuals }
            })
            .collect()
    }

    #[test]
    fn swap_preserves_sizes_and_sex_ratio() {
        let mut pops = pops(2);
        let config = MigrationConfig {
            transfers: 2,
            ..Default::default()
        };
        let mut flag = true;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let events = migrate(&mut pops, &config, 5, &mut flag, &mut rng);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].count, 2);
        assert_eq!((events[0].from, events[0].to), (0, 1));
        assert!(!flag);
        for pop in &pops {
            assert_eq!(pop.size(), 6);
            assert_eq!(pop.count_sex(Sex::Male), 3);
            let immigrants = pop
                .individuals
                .iter()
                .filter(|i| i.source_pop != pop.id)
                .count();
            assert_eq!(immigrants, 2);
        }
    }

    #[test]
    fn flag_alternates_direction() {
        let mut pops = pops(2);
        let config = MigrationConfig::default();
        let mut flag = true;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let first = migrate(&mut pops, &config, 1, &mut flag, &mut rng);
        let second = migrate(&mut pops, &config, 2, &mut flag, &mut rng);
        assert_eq!((first[0].from, first[0].to), (0, 1));
        assert_eq!((second[0].from, second[0].to), (1, 0));
    }

    #[test]
    fn exchange_is_symmetric_in_either_direction() {
        let config = MigrationConfig {
            transfers: 2,
            ..Default::default()
        };
        for start in [true, false] {
            let mut pops = pops(2);
            let mut flag = start;
            let mut rng = ChaCha8Rng::seed_from_u64(17);
            let events = migrate(&mut pops, &config, 1, &mut flag, &mut rng);
            assert_eq!(events[0].from, if start { 0 } else { 1 });
            for pop in &pops {
                let immigrants = pop
                    .individuals
                    .iter()
                    .filter(|i| i.source_pop != pop.id)
                    .count();
                assert_eq!(immigrants, 2);
            }
        }
    }

    #[test]
    fn transfers_capped_by_available_individuals() {
        let mut pops = pops(3);
        let config = MigrationConfig {
            transfers: 10,
            dispersal: DispersalType::Circle,
            ..Default::default()
        };
        let mut flag = false;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let events = migrate(&mut pops, &config, 1, &mut flag, &mut rng);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.count == 3));
    }

    #[test]
    fn random_transfers_bounded() {
        let config = MigrationConfig {
            transfers: 2,
            random_transfers: true,
            ..Default::default()
        };
        let mut flag = true;
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for g in 0..20 {
            let mut pops = pops(2);
            for e in migrate(&mut pops, &config, g, &mut flag, &mut rng) {
                assert!(e.count >= 1 && e.count <= 2);
            }
        }
    }
}
