//! Alignment & Scoring Engine
//!
//! Matches predicted clusters to ground-truth clusters one-to-one so that the
//! total number of shared items is maximal, then scores the match.

pub mod hungarian;
pub mod scoring;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{AnalysisError, Result};
use crate::core::partition::{PredictedPartition, TruePartition};

pub use scoring::{
    classification_scores, micro_average, ranking_scores, ClassificationScores, RankingScores,
    ScoreReport, ScoringMode,
};

/// One matched (true cluster, predicted cluster) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub true_key: String,
    pub pred_key: usize,
    /// Position of the true cluster in the truth's key order
    pub row: usize,
    /// Position of the predicted cluster in the prediction's key order
    pub col: usize,
    pub overlap: usize,
}

/// Optimal one-to-one matching between two partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub true_keys: Vec<String>,
    pub pred_keys: Vec<usize>,
    /// `overlap[row][col]` = |true cluster ∩ predicted cluster|
    pub overlap: Vec<Vec<usize>>,
    /// `min(|true|, |pred|)` pairs, sorted by row
    pub pairs: Vec<AlignedPair>,
}

impl Alignment {
    /// Predicted column matched to true row `row`.
    pub fn matched_column(&self, row: usize) -> Option<usize> {
        self.pairs.iter().find(|p| p.row == row).map(|p| p.col)
    }

    /// True row matched to predicted column `col`.
    pub fn matched_row(&self, col: usize) -> Option<usize> {
        self.pairs.iter().find(|p| p.col == col).map(|p| p.row)
    }

    pub fn total_overlap(&self) -> usize {
        self.pairs.iter().map(|p| p.overlap).sum()
    }

    /// `(true_key, pred_key)` pairs.
    pub fn matches(&self) -> Vec<(&str, usize)> {
        self.pairs
            .iter()
            .map(|p| (p.true_key.as_str(), p.pred_key))
            .collect()
    }
}

/// Set-intersection sizes, rows in truth key order, columns in prediction key order.
pub fn overlap_matrix(truth: &TruePartition, predicted: &PredictedPartition) -> Vec<Vec<usize>> {
    truth
        .clusters()
        .iter()
        .map(|t| {
            predicted
                .clusters()
                .iter()
                .map(|p| t.members.intersection(&p.members).count())
                .collect()
        })
        .collect()
}

/// Align `predicted` against `truth`.
///
/// Both partitions need at least one cluster; otherwise this is a
/// [`AnalysisError::PreconditionViolation`].
pub fn align(truth: &TruePartition, predicted: &PredictedPartition) -> Result<Alignment> {
    if truth.is_empty() {
        return Err(AnalysisError::precondition(
            "ground-truth partition has no clusters",
        ));
    }
    if predicted.is_empty() {
        return Err(AnalysisError::precondition(
            "predicted partition has no clusters",
        ));
    }

    let overlap = overlap_matrix(truth, predicted);
    let cost: Vec<Vec<f64>> = overlap
        .iter()
        .map(|row| row.iter().map(|&v| -(v as f64)).collect())
        .collect();

    let true_keys: Vec<String> = truth.keys().into_iter().cloned().collect();
    let pred_keys: Vec<usize> = predicted.keys().into_iter().copied().collect();

    let pairs: Vec<AlignedPair> = hungarian::solve(&cost)
        .into_iter()
        .map(|(row, col)| AlignedPair {
            true_key: true_keys[row].clone(),
            pred_key: pred_keys[col],
            row,
            col,
            overlap: overlap[row][col],
        })
        .collect();

    let alignment = Alignment {
        true_keys,
        pred_keys,
        overlap,
        pairs,
    };
    debug!(
        pairs = alignment.pairs.len(),
        total_overlap = alignment.total_overlap(),
        "aligned partitions"
    );
    Ok(alignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::partition::Partition;

    fn truth(clusters: Vec<(&str, Vec<usize>)>) -> TruePartition {
        Partition::from_clusters(clusters.into_iter().map(|(k, m)| (k.to_string(), m))).unwrap()
    }

    fn predicted(clusters: Vec<Vec<usize>>) -> PredictedPartition {
        Partition::from_clusters(clusters.into_iter().enumerate()).unwrap()
    }

    #[test]
    fn test_overlap_matrix() {
        let t = truth(vec![("A", vec![0, 1]), ("B", vec![2])]);
        let p = predicted(vec![vec![0], vec![1, 2]]);
        assert_eq!(overlap_matrix(&t, &p), vec![vec![1, 1], vec![0, 1]]);
    }

    #[test]
    fn test_perfect_alignment() {
        let t = truth(vec![("A", vec![0, 1]), ("B", vec![2])]);
        let p = predicted(vec![vec![0, 1], vec![2]]);
        let alignment = align(&t, &p).unwrap();
        assert_eq!(alignment.matches(), vec![("A", 0), ("B", 1)]);
        assert_eq!(alignment.total_overlap(), 3);
    }

    #[test]
    fn test_alignment_follows_overlap_not_keys() {
        let t = truth(vec![("A", vec![0, 1]), ("B", vec![2, 3])]);
        let p = predicted(vec![vec![2, 3], vec![0, 1]]);
        let alignment = align(&t, &p).unwrap();
        assert_eq!(alignment.matches(), vec![("A", 1), ("B", 0)]);
        assert_eq!(alignment.matched_row(0), Some(1));
        assert_eq!(alignment.matched_column(0), Some(1));
    }

    #[test]
    fn test_rectangular_alignment() {
        let t = truth(vec![("A", vec![0, 1, 2])]);
        let p = predicted(vec![vec![0], vec![1, 2]]);
        let alignment = align(&t, &p).unwrap();
        assert_eq!(alignment.pairs.len(), 1);
        assert_eq!(alignment.matches(), vec![("A", 1)]);
        assert_eq!(alignment.matched_row(0), None);
    }

    #[test]
    fn test_empty_predicted_cluster_has_zero_overlap() {
        let t = truth(vec![("A", vec![0]), ("B", vec![1])]);
        let p = Partition::from_labels(&[0, 0], 2);
        let alignment = align(&t, &p).unwrap();
        assert_eq!(alignment.pairs.len(), 2);
        assert_eq!(alignment.total_overlap(), 1);
        assert_eq!(alignment.overlap[0][1], 0);
    }

    #[test]
    fn test_empty_partitions_rejected() {
        let t = truth(vec![("A", vec![0])]);
        let p = predicted(vec![vec![0]]);
        let err = align(&TruePartition::new(), &p).unwrap_err();
        assert!(matches!(err, AnalysisError::PreconditionViolation { .. }));
        let err = align(&t, &PredictedPartition::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::PreconditionViolation { .. }));
    }
}
