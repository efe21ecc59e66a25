//! Analysis pipeline
//!
//! For every configured attribute the dataset is projected once and, when a
//! vector metric is requested, a single TF-IDF model is fitted. Each metric
//! then yields one branch: matrix, partition, alignment, scores. Branches
//! are independent; one failing does not stop the others.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::alignment::{align, Alignment, ScoreReport};
use super::clustering::PartitionOutcome;
use super::config::AnalysisConfig;
use super::corpus::Corpus;
use super::error::{AnalysisError, Result};
use super::matrix::PairwiseMatrix;
use super::models::{Dataset, DatasetSummary, StepAttribute};
use super::partition::{ground_truth, TruePartition};
use super::similarity::{ncd_matrix, vector_matrix, Metric, TfIdfModel, ZlibCompressor};

/// Result of one (attribute, metric) branch.
#[derive(Debug, Clone, Serialize)]
pub struct BranchOutcome {
    #[serde(skip_serializing)]
    pub matrix: PairwiseMatrix,
    pub undefined_pairs: usize,
    pub clustering: PartitionOutcome,
    pub alignment: Alignment,
    pub scores: ScoreReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BranchStatus {
    Completed(Box<BranchOutcome>),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchReport {
    /// e.g. "Step Name NCD"
    pub name: String,
    pub attribute: StepAttribute,
    pub metric: Metric,
    #[serde(flatten)]
    pub status: BranchStatus,
}

impl BranchReport {
    pub fn branch_name(attribute: StepAttribute, metric: Metric) -> String {
        format!("{} {}", attribute.label(), metric.label())
    }

    pub fn outcome(&self) -> Option<&BranchOutcome> {
        match &self.status {
            BranchStatus::Completed(outcome) => Some(outcome),
            BranchStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            BranchStatus::Completed(_) => None,
            BranchStatus::Failed { error } => Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome().is_some()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// SHA-256 of the dataset's JSON encoding
    pub dataset_digest: String,
    pub summary: DatasetSummary,
    /// K used for every branch
    pub clusters: usize,
    pub truth: TruePartition,
    pub branches: Vec<BranchReport>,
}

impl AnalysisReport {
    pub fn branch(&self, name: &str) -> Option<&BranchReport> {
        self.branches.iter().find(|b| b.name == name)
    }

    pub fn completed(&self) -> impl Iterator<Item = &BranchReport> {
        self.branches.iter().filter(|b| b.is_completed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BranchReport> {
        self.branches.iter().filter(|b| !b.is_completed())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text metrics, one block per branch.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;
        let _ = writeln!(
            out,
            "Dataset: {} test cases, {} groups, {} steps ({} unmatched)",
            s.test_cases, s.groups, s.steps, s.unmatched_steps
        );
        let _ = writeln!(out, "Clusters: {}", self.clusters);
        let _ = writeln!(out, "Digest: {}", self.dataset_digest);

        for branch in &self.branches {
            let _ = writeln!(out);
            match &branch.status {
                BranchStatus::Failed { error } => {
                    let _ = writeln!(out, "{} Metrics: failed ({})", branch.name, error);
                }
                BranchStatus::Completed(outcome) => {
                    let _ = writeln!(out, "{} Metrics:", branch.name);
                    if let Some(r) = &outcome.scores.ranking {
                        let _ = writeln!(out, "  Precision: {:.4}", r.precision);
                        let _ = writeln!(out, "  MAP: {:.4}", r.mean_average_precision);
                        let _ = writeln!(out, "  MRR: {:.4}", r.mean_reciprocal_rank);
                    }
                    if let Some(c) = &outcome.scores.classification {
                        let _ = writeln!(out, "  Micro Precision: {:.4}", c.precision);
                        let _ = writeln!(out, "  Micro Recall: {:.4}", c.recall);
                        let _ = writeln!(out, "  Micro F1: {:.4}", c.f1);
                    }
                    let _ = writeln!(
                        out,
                        "  Silhouette: {:.4}  Inertia: {:.4}",
                        outcome.clustering.silhouette, outcome.clustering.inertia
                    );
                    if outcome.undefined_pairs > 0 {
                        let _ = writeln!(out, "  Undefined pairs: {}", outcome.undefined_pairs);
                    }
                }
            }
        }
        out
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Entry point for an analysis run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every configured branch over `dataset`.
    ///
    /// Fails only for run-level problems (empty dataset, invalid config);
    /// branch failures are recorded in the report.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalysisReport> {
        self.config.validate()?;
        if dataset.is_empty() {
            return Err(AnalysisError::precondition("dataset has no test cases"));
        }
        dataset.validate()?;

        let encoded = serde_json::to_vec(dataset)?;
        let truth = ground_truth(dataset);
        let clusters = self.config.clusters.unwrap_or(truth.len());
        let compressor = self.config.compressor();

        info!(
            test_cases = dataset.len(),
            groups = truth.len(),
            clusters,
            branches = self.config.branch_count(),
            "starting analysis"
        );

        let mut branches = Vec::with_capacity(self.config.branch_count());
        for &attribute in &self.config.attributes {
            let corpus = Corpus::project(dataset, attribute);
            let model = self
                .config
                .metrics
                .iter()
                .any(Metric::uses_vector_space)
                .then(|| TfIdfModel::fit(&corpus));
            if let Some(model) = &model {
                debug!(%attribute, vocabulary = model.vocabulary_size(), "fitted tf-idf model");
            }

            for &metric in &self.config.metrics {
                let name = BranchReport::branch_name(attribute, metric);
                let status = match self.run_branch(
                    &corpus,
                    model.as_ref(),
                    metric,
                    &compressor,
                    &truth,
                    clusters,
                ) {
                    Ok(outcome) => {
                        debug!(branch = %name, "branch completed");
                        BranchStatus::Completed(Box::new(outcome))
                    }
                    Err(e) => {
                        warn!(branch = %name, error = %e, "branch failed");
                        BranchStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                branches.push(BranchReport {
                    name,
                    attribute,
                    metric,
                    status,
                });
            }
        }

        let report = AnalysisReport {
            generated_at: Utc::now(),
            dataset_digest: digest(&encoded),
            summary: dataset.summary(),
            clusters,
            truth,
            branches,
        };
        info!(
            completed = report.completed().count(),
            failed = report.failed().count(),
            "analysis finished"
        );
        Ok(report)
    }

    fn run_branch(
        &self,
        corpus: &Corpus,
        model: Option<&TfIdfModel>,
        metric: Metric,
        compressor: &ZlibCompressor,
        truth: &TruePartition,
        clusters: usize,
    ) -> Result<BranchOutcome> {
        let matrix = match metric {
            Metric::Ncd => ncd_matrix(corpus, compressor),
            _ => {
                let fitted;
                let model = match model {
                    Some(model) => model,
                    None => {
                        fitted = TfIdfModel::fit(corpus);
                        &fitted
                    }
                };
                vector_matrix(model, metric).ok_or_else(|| {
                    AnalysisError::precondition(format!("{} has no vector space", metric))
                })?
            }
        };

        let clustering = self.config.partitioner().partition(&matrix, clusters)?;
        let alignment = align(truth, &clustering.partition)?;
        let scores = ScoreReport::compute(
            truth,
            &clustering.partition,
            &alignment,
            &self.config.scoring_modes,
        );

        Ok(BranchOutcome {
            undefined_pairs: matrix.undefined_pairs().len(),
            matrix,
            clustering,
            alignment,
            scores,
        })
    }
}
