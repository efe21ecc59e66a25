//! Distance/Similarity Engine
//!
//! Four interchangeable pairwise metrics over a [`Corpus`]:
//!
//! - **NCD**: compression distance, no tokenisation
//! - **Cosine**: TF-IDF cosine similarity
//! - **Euclidean**: L2 distance between TF-IDF vectors
//! - **Manhattan**: L1 distance between TF-IDF vectors

pub mod ncd;
pub mod tfidf;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::corpus::Corpus;
use crate::core::matrix::PairwiseMatrix;

pub use ncd::{ncd, ncd_matrix, Compressor, ZlibCompressor};
pub use tfidf::{
    cosine_matrix, euclidean_matrix, manhattan_matrix, tokenize, SparseVector, TfIdfModel,
};

/// Pairwise metric selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ncd,
    Cosine,
    Euclidean,
    Manhattan,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Ncd,
        Metric::Cosine,
        Metric::Euclidean,
        Metric::Manhattan,
    ];

    /// True when larger values mean "more alike".
    pub fn is_similarity(&self) -> bool {
        matches!(self, Metric::Cosine)
    }

    /// True for the metrics computed from a TF-IDF model.
    pub fn uses_vector_space(&self) -> bool {
        !matches!(self, Metric::Ncd)
    }

    /// Value of a self-comparison.
    pub fn identity(&self) -> f64 {
        if self.is_similarity() {
            1.0
        } else {
            0.0
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Ncd => "NCD",
            Metric::Cosine => "Cosine",
            Metric::Euclidean => "Euclidean",
            Metric::Manhattan => "Manhattan",
        }
    }

    /// Parse metric from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ncd" | "compression" => Some(Metric::Ncd),
            "cosine" | "cos" => Some(Metric::Cosine),
            "euclidean" | "l2" => Some(Metric::Euclidean),
            "manhattan" | "l1" => Some(Metric::Manhattan),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Matrix for one vector-space metric from an already fitted model.
///
/// Returns `None` for [`Metric::Ncd`], which has no vector space.
pub fn vector_matrix(model: &TfIdfModel, metric: Metric) -> Option<PairwiseMatrix> {
    match metric {
        Metric::Ncd => None,
        Metric::Cosine => Some(cosine_matrix(model)),
        Metric::Euclidean => Some(euclidean_matrix(model)),
        Metric::Manhattan => Some(manhattan_matrix(model)),
    }
}

/// One-shot matrix for `metric` over `corpus`.
///
/// Vector metrics fit a fresh TF-IDF model; callers computing several vector
/// metrics on the same corpus should fit once and use [`vector_matrix`].
pub fn pairwise_matrix(
    corpus: &Corpus,
    metric: Metric,
    compressor: &dyn Compressor,
) -> PairwiseMatrix {
    match metric {
        Metric::Ncd => ncd_matrix(corpus, compressor),
        Metric::Cosine => cosine_matrix(&TfIdfModel::fit(corpus)),
        Metric::Euclidean => euclidean_matrix(&TfIdfModel::fit(corpus)),
        Metric::Manhattan => manhattan_matrix(&TfIdfModel::fit(corpus)),
    }
}
