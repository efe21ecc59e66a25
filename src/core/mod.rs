//! Core module for the scenario_atlas analysis engine
//!
//! # Architecture
//!
//! - `models`: Dataset, TestCase, Step and the projectable attributes
//! - `corpus`: Text projection of a dataset under one attribute
//! - `similarity`: NCD and TF-IDF based pairwise metrics
//! - `matrix`: Symmetric pairwise matrices built in parallel
//! - `clustering`: k-means and the matrix partitioner
//! - `partition`: Partitions and ground-truth extraction
//! - `alignment`: Hungarian matching and scoring
//! - `config`: Run configuration
//! - `pipeline`: The attribute × metric sweep
//! - `error`: Error types using thiserror

pub mod alignment;
pub mod clustering;
pub mod config;
pub mod corpus;
pub mod error;
pub mod matrix;
pub mod models;
pub mod partition;
pub mod pipeline;
pub mod similarity;

// Re-export commonly used types
pub use alignment::{
    align, overlap_matrix, Alignment, AlignedPair, ClassificationScores, RankingScores,
    ScoreReport, ScoringMode,
};
pub use clustering::{Embedding, KMeans, PartitionOutcome, Partitioner};
pub use config::AnalysisConfig;
pub use corpus::Corpus;
pub use error::{AnalysisError, Result, ResultExt};
pub use matrix::{PairwiseMatrix, UndefinedPair};
pub use models::{clean_step_name, Dataset, DatasetSummary, Step, StepAttribute, TestCase};
pub use partition::{ground_truth, Cluster, Partition, PredictedPartition, TruePartition};
pub use pipeline::{AnalysisReport, BranchOutcome, BranchReport, BranchStatus, Pipeline};
pub use similarity::{
    ncd, pairwise_matrix, Compressor, Metric, SparseVector, TfIdfModel, ZlibCompressor,
};
