//! Scoring of an aligned prediction.
//!
//! Two metric sets are kept side by side:
//!
//! - [`ScoringMode::Ranking`]: precision, mean average precision and mean
//!   reciprocal rank over the matched clusters
//! - [`ScoringMode::Classification`]: per-item labels derived from the
//!   matching, micro-averaged precision/recall/F1
//!
//! The reciprocal rank of an item is `1 / (pred_key + 1)` for the predicted
//! cluster that holds it. The predicted key stands in for a rank here; it is
//! an arbitrary cluster id, so MRR depends on k-means label order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::partition::{PredictedPartition, TruePartition};

use super::Alignment;

/// Which metric set to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Ranking,
    Classification,
}

impl ScoringMode {
    pub const ALL: [ScoringMode; 2] = [ScoringMode::Ranking, ScoringMode::Classification];

    /// Parse mode from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ranking" | "a" | "ir" => Some(ScoringMode::Ranking),
            "classification" | "b" | "micro" => Some(ScoringMode::Classification),
            _ => None,
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::Ranking => f.write_str("ranking"),
            ScoringMode::Classification => f.write_str("classification"),
        }
    }
}

/// Mode A scores, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingScores {
    pub precision: f64,
    pub mean_average_precision: f64,
    pub mean_reciprocal_rank: f64,
}

/// Mode B scores, all in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Scores for every requested mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankingScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationScores>,
}

impl ScoreReport {
    pub fn compute(
        truth: &TruePartition,
        predicted: &PredictedPartition,
        alignment: &Alignment,
        modes: &[ScoringMode],
    ) -> Self {
        let wants = |mode| modes.contains(&mode);
        Self {
            ranking: wants(ScoringMode::Ranking)
                .then(|| ranking_scores(truth, predicted, alignment)),
            classification: wants(ScoringMode::Classification)
                .then(|| classification_scores(truth, predicted, alignment)),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mode A.
///
/// - precision: items placed in their true cluster's match / all items
/// - mean average precision: mean over true clusters of |true ∩ match| / |true|
/// - mean reciprocal rank: mean of `1 / (pred_key + 1)` over every
///   (true member, predicted cluster containing it) pair
///
/// True clusters left unmatched (more true than predicted clusters) count
/// zero correct items.
pub fn ranking_scores(
    truth: &TruePartition,
    predicted: &PredictedPartition,
    alignment: &Alignment,
) -> RankingScores {
    let empty = BTreeSet::new();
    let mut total_correct = 0;
    let mut total_items = 0;
    let mut average_precisions = Vec::with_capacity(truth.len());
    let mut reciprocal_ranks = Vec::new();

    for (row, cluster) in truth.clusters().iter().enumerate() {
        let matched = alignment
            .matched_column(row)
            .map(|col| &predicted.clusters()[col].members)
            .unwrap_or(&empty);

        let correct = cluster.members.intersection(matched).count();
        total_correct += correct;
        total_items += cluster.len();
        average_precisions.push(ratio(correct, cluster.len()));

        for member in &cluster.members {
            for pred in predicted.clusters() {
                if pred.members.contains(member) {
                    reciprocal_ranks.push(1.0 / (pred.key as f64 + 1.0));
                }
            }
        }
    }

    RankingScores {
        precision: ratio(total_correct, total_items),
        mean_average_precision: mean(&average_precisions),
        mean_reciprocal_rank: mean(&reciprocal_ranks),
    }
}

/// Mode B.
///
/// True label = position of the item's true cluster. Predicted label =
/// position of the true cluster its predicted cluster is matched to, or
/// `|true| + col` for an unmatched predicted cluster at column `col`. Items
/// missing from the prediction get a label no true cluster uses.
pub fn classification_scores(
    truth: &TruePartition,
    predicted: &PredictedPartition,
    alignment: &Alignment,
) -> ClassificationScores {
    let n_true = truth.len();
    let missing = n_true + predicted.len();

    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    for (row, cluster) in truth.clusters().iter().enumerate() {
        for &item in &cluster.members {
            y_true.push(row);
            let label = match predicted.position_of(item) {
                Some(col) => alignment.matched_row(col).unwrap_or(n_true + col),
                None => missing,
            };
            y_pred.push(label);
        }
    }

    micro_average(&y_true, &y_pred)
}

/// Micro-averaged precision, recall and F1 over all labels present in
/// either vector.
pub fn micro_average(y_true: &[usize], y_pred: &[usize]) -> ClassificationScores {
    let labels: BTreeSet<usize> = y_true.iter().chain(y_pred.iter()).copied().collect();

    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for label in labels {
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == label, p == label) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassificationScores {
        precision,
        recall,
        f1,
    }
}
