pub mod generators;
pub mod runs;
pub mod summary;

pub use generators::{build, build_with_rng};
pub use runs::{enforce_min_run, find_runs};

use crate::error::{LfResult, LoopForgeError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

/// Values closer than this are treated as the same site class.
pub const ALPHA_TOLERANCE: f64 = 1e-8;

#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum LandscapeMode {
    #[strum(to_string = "periodic")]
    #[serde(rename = "periodic")]
    Periodic,
    #[strum(to_string = "one_random")]
    #[serde(rename = "one_random")]
    OneRandom,
    #[strum(to_string = "ntrandom", serialize = "nt_random")]
    #[serde(rename = "ntrandom", alias = "nt_random")]
    NtRandom,
    #[strum(to_string = "constantmean", serialize = "constant_mean")]
    #[serde(rename = "constantmean", alias = "constant_mean")]
    ConstantMean,
    #[strum(to_string = "array")]
    #[serde(rename = "array")]
    Array,
    #[strum(to_string = "laci")]
    #[serde(rename = "laci", alias = "LacI")]
    Laci,
    #[strum(to_string = "array_mean", serialize = "constant")]
    #[serde(rename = "array_mean", alias = "constant")]
    ArrayMean,
    #[strum(to_string = "array_max", serialize = "constant_max")]
    #[serde(rename = "array_max", alias = "constant_max")]
    ArrayMax,
}

impl LandscapeMode {
    pub fn parse(name: &str) -> LfResult<Self> {
        name.parse().map_err(|_| {
            LoopForgeError::InvalidConfiguration(format!("unknown landscape mode '{}'", name))
        })
    }

    /// Fixed obstacle arrays, laid out independently of the chromatin track length.
    pub fn is_array_architecture(&self) -> bool {
        matches!(
            self,
            Self::Array | Self::Laci | Self::ArrayMean | Self::ArrayMax
        )
    }

    /// Flattened controls with no free/obstacle structure.
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::ConstantMean | Self::ArrayMean | Self::ArrayMax)
    }
}

/// Per-trajectory acceptance probabilities.
///
/// Rows produced by deterministic generators point at the same allocation,
/// so an `nt x sites` landscape costs one row of memory unless every
/// trajectory draws its own placement.
#[derive(Debug, Clone)]
pub struct Landscape {
    rows: Vec<Arc<[f64]>>,
    sites: usize,
    pub alphao: f64,
    pub alphaf: f64,
    array_region: Option<(usize, usize)>,
}

impl Landscape {
    /// One row replicated across `nt` trajectories.
    pub fn shared(row: Vec<f64>, nt: usize, alphao: f64, alphaf: f64) -> Self {
        let sites = row.len();
        let row: Arc<[f64]> = row.into();
        Self {
            rows: vec![row; nt],
            sites,
            alphao,
            alphaf,
            array_region: None,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>, alphao: f64, alphaf: f64) -> LfResult<Self> {
        let sites = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != sites) {
            return Err(LoopForgeError::Validation(
                "landscape rows must all have the same length".to_string(),
            ));
        }
        Ok(Self {
            rows: rows.into_iter().map(Arc::from).collect(),
            sites,
            alphao,
            alphaf,
            array_region: None,
        })
    }

    pub fn with_array_region(mut self, x_min: usize, x_max: usize) -> Self {
        self.array_region = Some((x_min, x_max));
        self
    }

    pub fn array_region(&self) -> Option<(usize, usize)> {
        self.array_region
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn sites(&self) -> usize {
        self.sites
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(|r| &r[..])
    }

    /// Rows with consecutive duplicates of the same allocation collapsed.
    pub fn distinct_rows(&self) -> Vec<&[f64]> {
        let mut out: Vec<&[f64]> = Vec::new();
        let mut last: Option<&Arc<[f64]>> = None;
        for row in &self.rows {
            if last.is_some_and(|prev| Arc::ptr_eq(prev, row)) {
                continue;
            }
            out.push(row);
            last = Some(row);
        }
        out
    }

    pub fn is_free(&self, value: f64) -> bool {
        (value - self.alphaf).abs() <= ALPHA_TOLERANCE
    }

    pub fn is_obstacle(&self, value: f64) -> bool {
        !self.is_free(value) && (value - self.alphao).abs() <= ALPHA_TOLERANCE
    }

    /// Site-wise mean across trajectories.
    pub fn mean_profile(&self) -> Vec<f64> {
        let distinct = self.distinct_rows();
        if distinct.len() == 1 {
            return distinct[0].to_vec();
        }
        let mut acc = vec![0.0; self.sites];
        for row in self.iter_rows() {
            for (a, v) in acc.iter_mut().zip(row) {
                *a += v;
            }
        }
        let n = self.rows.len().max(1) as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}
