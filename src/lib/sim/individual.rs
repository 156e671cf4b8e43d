//! Individuals, populations and their conversion to genotype matrices.

use crate::core::error::Result;
use crate::genotype::{DataType, GenotypeMatrix};
use crate::sim::params::SimConfig;
use crate::sim::reference::ReferenceTable;
use nalgebra::DMatrix;
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// One allele symbol per locus, loci in reference-table order.
pub type Haplotype = Vec<u8>;

pub const ANCESTRAL: u8 = 0;
pub const DERIVED: u8 = 1;
/// Replaces the allele at neutral loci before fitness is scored.
pub const NEUTRAL_MASK: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
    pub id: usize,
    pub sex: Sex,
    /// Population the individual was born in.
    pub source_pop: usize,
    pub chromosomes: [Haplotype; 2],
    pub father: Option<usize>,
    pub mother: Option<usize>,
}

impl Individual {
    /// Copies of the derived allele at `locus`.
    #[inline]
    pub fn derived_dosage(&self, locus: usize) -> u8 {
        (self.chromosomes[0][locus] == DERIVED) as u8 + (self.chromosomes[1][locus] == DERIVED) as u8
    }

    /// Both haplotypes with every neutral locus set to [`NEUTRAL_MASK`].
    pub fn masked(&self, table: &ReferenceTable) -> [Haplotype; 2] {
        let mask = |hap: &Haplotype| -> Haplotype {
            hap.iter()
                .enumerate()
                .map(|(l, &a)| if table.is_neutral(l) { NEUTRAL_MASK } else { a })
                .collect()
        };
        [mask(&self.chromosomes[0]), mask(&self.chromosomes[1])]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    pub id: usize,
    pub individuals: Vec<Individual>,
}

impl Population {
    #[inline]
    pub fn size(&self) -> usize {
        self.individuals.len()
    }

    pub fn count_sex(&self, sex: Sex) -> usize {
        self.individuals.iter().filter(|i| i.sex == sex).count()
    }

    /// Give the individuals sequential ids in their current order.
    pub fn renumber(&mut self) {
        for (id, ind) in self.individuals.iter_mut().enumerate() {
            ind.id = id;
        }
    }

    pub fn label(&self) -> String {
        format!("pop{}", self.id)
    }

    /// Derived allele dosages of the population as a SNP genotype matrix.
    pub fn to_genotype_matrix(&self, table: &ReferenceTable) -> Result<GenotypeMatrix> {
        snapshot(std::slice::from_ref(self), table)
    }
}

/// Genotypes of all individuals in `pops`, labelled by current population.
pub fn snapshot(pops: &[Population], table: &ReferenceTable) -> Result<GenotypeMatrix> {
    let members: Vec<(&Population, &Individual)> = pops
        .iter()
        .flat_map(|p| p.individuals.iter().map(move |i| (p, i)))
        .collect();
    let calls = DMatrix::from_fn(members.len(), table.n_loci(), |r, l| {
        members[r].1.derived_dosage(l)
    });
    GenotypeMatrix::new(
        DataType::Snp,
        calls,
        members
            .iter()
            .map(|(p, i)| format!("{}_{}", p.label(), i.id))
            .collect(),
        members.iter().map(|(p, _)| p.label()).collect(),
        table.locus_names(),
    )
}

/// Founders of population `id`: half males, half females, each allele
/// derived with the locus frequency `q`.
pub fn initialize_population<R: Rng + ?Sized>(
    id: usize,
    config: &SimConfig,
    table: &ReferenceTable,
    rng: &mut R,
) -> Population {
    let per_sex = config.per_sex();
    let mut draw = || -> Haplotype {
        table
            .records()
            .iter()
            .map(|r| if rng.gen::<f64>() < r.q { DERIVED } else { ANCESTRAL })
            .collect()
    };
    let individuals = (0..config.population_size)
        .map(|n| Individual {
            id: n,
            sex: if n < per_sex { Sex::Male } else { Sex::Female },
            source_pop: id,
            chromosomes: [draw(), draw()],
            father: None,
            mother: None,
        })
        .collect();
    Population { id, individuals }
}
