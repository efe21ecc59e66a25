//! Partitioner
//!
//! Groups test cases into a fixed number of clusters from a pairwise matrix
//! with k-means. Two embeddings are available and are not comparable with
//! each other, so a run should stick to one:
//!
//! - **Rows**: matrix row `i` is the feature vector of item `i`
//! - **PairValues**: every upper-triangle value is a 1-D point; each item
//!   takes the most frequent label among its own pairs
//!
//! Infinite cells (undefined NCD pairs) are replaced by a finite sentinel
//! before clustering.

pub mod algorithms;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{AnalysisError, Result};
use crate::core::matrix::PairwiseMatrix;
use crate::core::partition::PredictedPartition;

pub use algorithms::{
    euclidean_distance, ClusterResult, ClusteringError, ClusteringResult, KMeans,
};

/// How a matrix is turned into k-means input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Embedding {
    #[default]
    Rows,
    PairValues,
}

impl Embedding {
    /// Parse embedding from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rows" | "row" => Some(Embedding::Rows),
            "pair-values" | "pair_values" | "pairs" => Some(Embedding::PairValues),
            _ => None,
        }
    }
}

/// A predicted partition with clustering diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionOutcome {
    pub partition: PredictedPartition,
    pub inertia: f64,
    pub silhouette: f64,
    pub iterations: usize,
    pub empty_clusters: usize,
    /// Value substituted for infinite cells, when any were present
    pub sentinel: Option<f64>,
}

/// k-means partitioner over pairwise matrices.
#[derive(Debug, Clone)]
pub struct Partitioner {
    pub embedding: Embedding,
    pub seed: u64,
    pub max_iter: usize,
    pub tolerance: f64,
    /// Fixed replacement for infinite cells; derived from the matrix when unset
    pub infinity_sentinel: Option<f64>,
}

impl Default for Partitioner {
    fn default() -> Self {
        let kmeans = KMeans::default();
        Self {
            embedding: Embedding::default(),
            seed: kmeans.seed,
            max_iter: kmeans.max_iter,
            tolerance: kmeans.tolerance,
            infinity_sentinel: None,
        }
    }
}

impl Partitioner {
    pub fn new(embedding: Embedding) -> Self {
        Self {
            embedding,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_infinity_sentinel(mut self, sentinel: Option<f64>) -> Self {
        self.infinity_sentinel = sentinel;
        self
    }

    /// Sentinel for `matrix`: the configured value, else twice the largest
    /// finite off-diagonal value (at least 1.0).
    pub fn sentinel_for(&self, matrix: &PairwiseMatrix) -> f64 {
        self.infinity_sentinel.unwrap_or_else(|| {
            matrix
                .max_finite_off_diagonal()
                .map(|max| (2.0 * max).max(1.0))
                .unwrap_or(1.0)
        })
    }

    /// Split the matrix's index space into `k` clusters keyed `0..k`.
    ///
    /// `k` must be in `1..=matrix.size()`. `k == size` gives singletons under
    /// either embedding. Otherwise clusters may come back empty when k-means
    /// degenerates.
    pub fn partition(&self, matrix: &PairwiseMatrix, k: usize) -> Result<PartitionOutcome> {
        let n = matrix.size();
        if k == 0 {
            return Err(AnalysisError::precondition("cluster count must be at least 1"));
        }
        if k > n {
            return Err(AnalysisError::precondition(format!(
                "requested {} clusters for {} test cases",
                k, n
            )));
        }
        if k == n {
            return Ok(PartitionOutcome {
                partition: PredictedPartition::from_labels(&(0..n).collect::<Vec<_>>(), k),
                inertia: 0.0,
                silhouette: 0.0,
                iterations: 0,
                empty_clusters: 0,
                sentinel: None,
            });
        }

        let sentinel = matrix.has_undefined().then(|| self.sentinel_for(matrix));
        let rows = matrix.finite_rows(sentinel.unwrap_or(f64::MAX));
        let kmeans = KMeans::new(k)
            .with_seed(self.seed)
            .with_max_iter(self.max_iter)
            .with_tolerance(self.tolerance);

        debug!(metric = %matrix.metric, n, k, embedding = ?self.embedding, "partitioning");

        let (labels, result) = match self.embedding {
            Embedding::Rows => {
                let result = kmeans.fit(&rows)?;
                (result.labels.clone(), result)
            }
            Embedding::PairValues => pair_value_labels(&kmeans, &rows, k)?,
        };

        let partition = PredictedPartition::from_labels(&labels, k);
        let empty_clusters = partition.len() - partition.non_empty_count();
        if empty_clusters > 0 {
            warn!(metric = %matrix.metric, k, empty_clusters, "k-means left clusters empty");
        }

        Ok(PartitionOutcome {
            partition,
            inertia: result.inertia,
            silhouette: result.silhouette_score,
            iterations: result.iterations,
            empty_clusters,
            sentinel,
        })
    }
}

/// Cluster the upper-triangle values in 1-D, then give item `i` the most
/// frequent label among pairs `(i, j)`, ties to the lowest label.
fn pair_value_labels(
    kmeans: &KMeans,
    rows: &[Vec<f64>],
    k: usize,
) -> Result<(Vec<usize>, ClusterResult)> {
    let n = rows.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    let mut points = Vec::with_capacity(pairs.capacity());
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate().skip(i + 1) {
            pairs.push((i, j));
            points.push(vec![value]);
        }
    }
    if points.len() < k {
        return Err(AnalysisError::precondition(format!(
            "pair-value embedding needs at least {} pairs, corpus has {}",
            k,
            points.len()
        )));
    }

    let result = kmeans.fit(&points)?;

    let mut votes = vec![vec![0usize; k]; n];
    for (&(i, j), &label) in pairs.iter().zip(result.labels.iter()) {
        votes[i][label] += 1;
        votes[j][label] += 1;
    }
    let labels = votes
        .iter()
        .map(|counts| {
            counts
                .iter()
                .enumerate()
                .fold((0, 0), |best, (label, &count)| {
                    if count > best.1 {
                        (label, count)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect();

    Ok((labels, result))
}
