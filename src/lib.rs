//! scenario_atlas - latent grouping analysis for behavioural test suites
//!
//! Takes a parsed BDD suite (test cases, their steps and matched glue code),
//! projects it into text under several attributes, measures pairwise
//! distances with compression and TF-IDF metrics, clusters the test cases
//! with k-means and scores the clusters against the feature-file grouping.
//!
//! # Architecture
//!
//! This crate follows the "Library-First" pattern:
//! - **lib.rs** (this file): re-exports and logging setup
//! - **core/**: the analysis engine, no CLI concerns
//! - **bin/atlas.rs**: thin wrapper that loads files and prints reports
//!
//! # Example
//!
//! ```no_run
//! use scenario_atlas::{AnalysisConfig, Dataset, Pipeline};
//!
//! let json = std::fs::read_to_string("scenarios.json")?;
//! let dataset = Dataset::from_json(&json)?;
//! let report = Pipeline::new(AnalysisConfig::default()).run(&dataset)?;
//! println!("{}", report.render_text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;

pub use crate::core::{
    align, clean_step_name, ground_truth, ncd, overlap_matrix, pairwise_matrix, AlignedPair,
    Alignment, AnalysisConfig, AnalysisError, AnalysisReport, BranchOutcome, BranchReport,
    BranchStatus, ClassificationScores, Cluster, Compressor, Corpus, Dataset, DatasetSummary,
    Embedding, KMeans, Metric, PairwiseMatrix, Partition, PartitionOutcome, Partitioner,
    Pipeline, PredictedPartition, RankingScores, Result, ResultExt, ScoreReport, ScoringMode,
    SparseVector, Step, StepAttribute, TestCase, TfIdfModel, TruePartition, UndefinedPair,
    ZlibCompressor,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the version of the scenario_atlas library
pub fn version() -> &'static str {
    VERSION
}

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG`; without it only warnings from this crate are shown.
/// Safe to call more than once.
pub fn init_logging() {
    init_logging_with("scenario_atlas=warn");
}

/// Like [`init_logging`] with an explicit fallback filter, used when
/// `RUST_LOG` is unset.
pub fn init_logging_with(default_filter: &str) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();

        // Fails silently if a subscriber is already installed
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging_with("scenario_atlas=debug");
    }
}
