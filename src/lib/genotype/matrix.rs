//! Dense individuals × loci genotype matrix.

use crate::core::error::{DartError, Result};
use log::debug;
use nalgebra::DMatrix;
use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;

/// Sentinel stored for a missing call.
pub const MISSING: u8 = u8::MAX;

/// Marker technology behind the calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Diploid dosage of the alternate allele (0, 1 or 2).
    Snp,
    /// Presence (1) or absence (0) of a restriction fragment.
    SilicoDart,
}

impl DataType {
    /// Largest valid call for this data type.
    #[inline]
    pub fn max_call(&self) -> u8 {
        match self {
            DataType::Snp => 2,
            DataType::SilicoDart => 1,
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snp" => Ok(DataType::Snp),
            "silicodart" | "sd" | "pa" => Ok(DataType::SilicoDart),
            _ => Err(format!(
                "Invalid data type: {}. Valid types: snp, silicodart",
                s
            )),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Snp => write!(f, "snp"),
            DataType::SilicoDart => write!(f, "silicodart"),
        }
    }
}

/// Genotype calls for a set of individuals at a set of loci, plus the
/// population label of every individual.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeMatrix {
    pub data_type: DataType,
    /// Calls stored individuals × loci; [`MISSING`] marks a failed call.
    pub calls: DMatrix<u8>,
    pub ind_names: Vec<String>,
    pub pop: Vec<String>,
    pub loc_names: Vec<String>,
}

impl GenotypeMatrix {
    /// Build a matrix, checking that labels and calls agree in shape and range.
    pub fn new(
        data_type: DataType,
        calls: DMatrix<u8>,
        ind_names: Vec<String>,
        pop: Vec<String>,
        loc_names: Vec<String>,
    ) -> Result<Self> {
        let gm = Self {
            data_type,
            calls,
            ind_names,
            pop,
            loc_names,
        };
        gm.validate()?;
        Ok(gm)
    }

    /// Build from row-major calls (one `Vec` per individual).
    pub fn from_rows(
        data_type: DataType,
        rows: &[Vec<u8>],
        ind_names: Vec<String>,
        pop: Vec<String>,
        loc_names: Vec<String>,
    ) -> Result<Self> {
        let n_loc = loc_names.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_loc) {
            return Err(DartError::DimensionMismatch {
                expected: format!("{} calls for individual {}", n_loc, i),
                actual: format!("{} calls", row.len()),
            });
        }
        let calls = DMatrix::from_fn(rows.len(), n_loc, |i, l| rows[i][l]);
        Self::new(data_type, calls, ind_names, pop, loc_names)
    }

    /// Check the shape and call-range invariants.
    pub fn validate(&self) -> Result<()> {
        if self.ind_names.len() != self.calls.nrows() {
            return Err(DartError::DimensionMismatch {
                expected: format!("{} individual names", self.calls.nrows()),
                actual: format!("{} individual names", self.ind_names.len()),
            });
        }
        if self.pop.len() != self.calls.nrows() {
            return Err(DartError::DimensionMismatch {
                expected: format!("{} population labels", self.calls.nrows()),
                actual: format!("{} population labels", self.pop.len()),
            });
        }
        if self.loc_names.len() != self.calls.ncols() {
            return Err(DartError::DimensionMismatch {
                expected: format!("{} locus names", self.calls.ncols()),
                actual: format!("{} locus names", self.loc_names.len()),
            });
        }
        let max = self.data_type.max_call();
        if let Some(bad) = self.calls.iter().find(|&&c| c != MISSING && c > max) {
            return Err(DartError::InvalidInput(format!(
                "call {} out of range for {} data (max {})",
                bad, self.data_type, max
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn n_ind(&self) -> usize {
        self.calls.nrows()
    }

    #[inline]
    pub fn n_loc(&self) -> usize {
        self.calls.ncols()
    }

    /// Call for individual `ind` at locus `loc`, `None` when missing.
    #[inline]
    pub fn get(&self, ind: usize, loc: usize) -> Option<u8> {
        match self.calls[(ind, loc)] {
            MISSING => None,
            call => Some(call),
        }
    }

    /// Fail unless the calls are diploid SNP dosages.
    pub fn require_snp(&self, operation: &str) -> Result<()> {
        match self.data_type {
            DataType::Snp => Ok(()),
            DataType::SilicoDart => Err(DartError::snp_only(operation)),
        }
    }

    /// Population labels in order of first appearance.
    pub fn populations(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for label in &self.pop {
            if seen.insert(label.as_str()) {
                out.push(label.clone());
            }
        }
        out
    }

    /// Row indices of the individuals carrying population label `label`.
    pub fn pop_indices(&self, label: &str) -> Vec<usize> {
        self.pop
            .iter()
            .enumerate()
            .filter_map(|(i, p)| (p == label).then_some(i))
            .collect()
    }

    /// Row indices grouped by population, in the order of [`Self::populations`].
    pub fn pop_groups(&self) -> Vec<(String, Vec<usize>)> {
        self.populations()
            .into_iter()
            .map(|label| {
                let rows = self.pop_indices(&label);
                (label, rows)
            })
            .collect()
    }

    /// Row index of the individual named `name`.
    pub fn ind_index(&self, name: &str) -> Option<usize> {
        self.ind_names.iter().position(|n| n == name)
    }

    /// Keep the individuals at `rows`, in the given order.
    pub fn subset_individuals(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_ind()) {
            return Err(DartError::InvalidInput(format!(
                "individual index {} out of range ({} individuals)",
                bad,
                self.n_ind()
            )));
        }
        let calls = self.calls.select_rows(rows.iter());
        debug!("Subset individuals: {} -> {}", self.n_ind(), rows.len());
        Ok(Self {
            data_type: self.data_type,
            calls,
            ind_names: rows.iter().map(|&r| self.ind_names[r].clone()).collect(),
            pop: rows.iter().map(|&r| self.pop[r].clone()).collect(),
            loc_names: self.loc_names.clone(),
        })
    }

    /// Keep the loci at `cols`, in the given order.
    pub fn subset_loci(&self, cols: &[usize]) -> Result<Self> {
        if let Some(&bad) = cols.iter().find(|&&c| c >= self.n_loc()) {
            return Err(DartError::InvalidInput(format!(
                "locus index {} out of range ({} loci)",
                bad,
                self.n_loc()
            )));
        }
        let calls = self.calls.select_columns(cols.iter());
        debug!("Subset loci: {} -> {}", self.n_loc(), cols.len());
        Ok(Self {
            data_type: self.data_type,
            calls,
            ind_names: self.ind_names.clone(),
            pop: self.pop.clone(),
            loc_names: cols.iter().map(|&c| self.loc_names[c].clone()).collect(),
        })
    }

    /// Keep only individuals whose population label is in `labels`.
    pub fn subset_pops(&self, labels: &[&str]) -> Result<Self> {
        let rows: Vec<usize> = self
            .pop
            .iter()
            .enumerate()
            .filter_map(|(i, p)| labels.contains(&p.as_str()).then_some(i))
            .collect();
        if rows.is_empty() {
            return Err(DartError::EmptyData(format!(
                "no individuals belong to populations {:?}",
                labels
            )));
        }
        self.subset_individuals(&rows)
    }

    /// Number of called individuals among `rows` at `loc`.
    pub fn called_count(&self, loc: usize, rows: &[usize]) -> usize {
        rows.iter()
            .filter(|&&i| self.calls[(i, loc)] != MISSING)
            .count()
    }

    /// Proportion of individuals with a call at `loc`.
    pub fn locus_call_rate(&self, loc: usize) -> f64 {
        if self.n_ind() == 0 {
            return 0.0;
        }
        let called = self
            .calls
            .column(loc)
            .iter()
            .filter(|&&c| c != MISSING)
            .count();
        called as f64 / self.n_ind() as f64
    }

    /// Proportion of loci called for individual `ind`.
    pub fn individual_call_rate(&self, ind: usize) -> f64 {
        if self.n_loc() == 0 {
            return 0.0;
        }
        let called = self
            .calls
            .row(ind)
            .iter()
            .filter(|&&c| c != MISSING)
            .count();
        called as f64 / self.n_loc() as f64
    }

    /// Alternate allele (SNP) or presence (silicodart) frequency at `loc`
    /// among `rows`; `None` when nobody in `rows` was called.
    pub fn alt_allele_frequency(&self, loc: usize, rows: &[usize]) -> Option<f64> {
        let mut total = 0u32;
        let mut called = 0u32;
        for &i in rows {
            let c = self.calls[(i, loc)];
            if c != MISSING {
                total += c as u32;
                called += 1;
            }
        }
        if called == 0 {
            return None;
        }
        let copies = match self.data_type {
            DataType::Snp => 2 * called,
            DataType::SilicoDart => called,
        };
        Some(total as f64 / copies as f64)
    }

    /// Genotype counts `(hom_ref, het, hom_alt)` at `loc` among `rows`.
    pub fn genotype_counts(&self, loc: usize, rows: &[usize]) -> (usize, usize, usize) {
        rows.iter()
            .fold((0, 0, 0), |(r, h, a), &i| match self.calls[(i, loc)] {
                0 => (r + 1, h, a),
                1 => (r, h + 1, a),
                2 => (r, h, a + 1),
                _ => (r, h, a),
            })
    }

    /// All row indices.
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.n_ind()).collect()
    }
}
