//! Brute-force nearest-neighbour search over the feature matrix.
//!
//! Rows are ranked by a strict total order: the target first, then by
//! Euclidean distance, then by row index. Because the order is total, the
//! `k` nearest rows are a prefix of the `k + 1` nearest, so growing `k` only
//! ever adds rows. Rows whose distance is undefined (a missing value on
//! either side) rank as infinitely far.

use crate::error::{CohortError, Result};
use credence_data::FeatureTable;
use ndarray::{Array1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Size of a neighbour cohort, bounded to `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct NeighborCount(usize);

impl NeighborCount {
    /// Smallest cohort.
    pub const MIN: usize = 10;
    /// Largest cohort.
    pub const MAX: usize = 1000;
    /// Initial cohort size.
    pub const DEFAULT: usize = 500;

    /// Validate a count.
    pub const fn new(count: usize) -> Result<Self> {
        if count < Self::MIN || count > Self::MAX {
            return Err(CohortError::NeighborCountOutOfRange {
                count,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(count))
    }

    /// The count.
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl Default for NeighborCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for NeighborCount {
    type Error = CohortError;

    fn try_from(count: usize) -> Result<Self> {
        Self::new(count)
    }
}

impl From<NeighborCount> for usize {
    fn from(count: NeighborCount) -> Self {
        count.0
    }
}

impl fmt::Display for NeighborCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which clients a comparison covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CohortScope {
    /// The nearest clients to the target.
    Neighbors(NeighborCount),
    /// Every client.
    FullPopulation,
}

impl CohortScope {
    /// Scope selected by the population toggle.
    pub const fn from_toggle(full_population: bool, count: NeighborCount) -> Self {
        if full_population {
            Self::FullPopulation
        } else {
            Self::Neighbors(count)
        }
    }
}

impl Default for CohortScope {
    fn default() -> Self {
        Self::Neighbors(NeighborCount::default())
    }
}

impl fmt::Display for CohortScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neighbors(k) => write!(f, "{k} nearest clients"),
            Self::FullPopulation => f.write_str("all clients"),
        }
    }
}

/// Rows selected for comparison with a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Target row
    pub target: usize,
    /// Member rows, ascending
    pub indices: Vec<usize>,
    /// How the cohort was chosen
    pub scope: CohortScope,
}

impl Cohort {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the cohort has no members.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether `row` is a member.
    pub fn contains(&self, row: usize) -> bool {
        self.indices.binary_search(&row).is_ok()
    }

    /// Position of the target within [`Cohort::indices`].
    pub fn target_position(&self) -> Option<usize> {
        self.indices.binary_search(&self.target).ok()
    }
}

/// Nearest-neighbour search over a borrowed feature matrix.
#[derive(Debug, Clone, Copy)]
pub struct NeighborFinder<'a> {
    features: ArrayView2<'a, f64>,
}

impl<'a> NeighborFinder<'a> {
    /// Search over a feature table.
    pub fn new(features: &'a FeatureTable) -> Self {
        Self::from_view(features.values())
    }

    /// Search over a raw matrix, rows are clients.
    pub const fn from_view(features: ArrayView2<'a, f64>) -> Self {
        Self { features }
    }

    /// Population size.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_target(&self, target: usize) -> Result<()> {
        if target >= self.len() {
            return Err(CohortError::TargetOutOfRange {
                index: target,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Euclidean distance from the target to every row.
    pub fn distances(&self, target: usize) -> Result<Array1<f64>> {
        self.check_target(target)?;
        let origin = self.features.row(target);
        let mut out = Array1::<f64>::zeros(self.len());
        Zip::from(&mut out)
            .and(self.features.rows())
            .par_for_each(|distance, row| {
                let squared: f64 = row
                    .iter()
                    .zip(origin.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                *distance = if squared.is_nan() {
                    f64::INFINITY
                } else {
                    squared.sqrt()
                };
            });
        Ok(out)
    }

    /// The `k` nearest rows to the target, ascending, target included.
    ///
    /// Returns `min(k, population)` rows.
    pub fn nearest(&self, target: usize, k: NeighborCount) -> Result<Vec<usize>> {
        let distances = self.distances(target)?;
        let take = k.get().min(self.len());

        let rank = |a: &usize, b: &usize| -> Ordering {
            (*a != target)
                .cmp(&(*b != target))
                .then_with(|| distances[*a].total_cmp(&distances[*b]))
                .then_with(|| a.cmp(b))
        };

        let mut rows: Vec<usize> = (0..self.len()).collect();
        if take < rows.len() {
            rows.select_nth_unstable_by(take - 1, rank);
            rows.truncate(take);
        }
        rows.sort_unstable();

        tracing::debug!(target, k = k.get(), returned = rows.len(), "selected nearest clients");
        Ok(rows)
    }

    /// Cohort of the target under a scope.
    pub fn cohort(&self, target: usize, scope: CohortScope) -> Result<Cohort> {
        let indices = match scope {
            CohortScope::Neighbors(k) => self.nearest(target, k)?,
            CohortScope::FullPopulation => {
                self.check_target(target)?;
                (0..self.len()).collect()
            }
        };
        Ok(Cohort {
            target,
            indices,
            scope,
        })
    }
}
