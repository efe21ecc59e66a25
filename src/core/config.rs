//! Run configuration
//!
//! Every knob of an analysis run lives in [`AnalysisConfig`], loaded from a
//! JSON file or built in code. Missing fields fall back to the defaults of
//! the 12-branch sweep.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::clustering::{Embedding, KMeans, Partitioner};
use super::error::{AnalysisError, Result};
use super::models::StepAttribute;
use super::similarity::{Metric, ZlibCompressor};
use super::alignment::ScoringMode;

/// Configuration for an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Corpus attributes to analyse
    #[serde(default = "default_attributes")]
    pub attributes: Vec<StepAttribute>,
    /// Metrics computed for every attribute
    #[serde(default = "default_metrics")]
    pub metrics: Vec<Metric>,
    /// Scoring modes reported per branch
    #[serde(default = "default_scoring_modes")]
    pub scoring_modes: Vec<ScoringMode>,
    #[serde(default)]
    pub embedding: Embedding,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// zlib level, 0..=9
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    /// Replacement for infinite cells before clustering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinity_sentinel: Option<f64>,
    /// Cluster count; defaults to the number of source groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<usize>,
}

fn default_attributes() -> Vec<StepAttribute> {
    StepAttribute::DEFAULT.to_vec()
}

fn default_metrics() -> Vec<Metric> {
    Metric::ALL.to_vec()
}

fn default_scoring_modes() -> Vec<ScoringMode> {
    ScoringMode::ALL.to_vec()
}

fn default_seed() -> u64 {
    KMeans::default().seed
}

fn default_max_iter() -> usize {
    KMeans::default().max_iter
}

fn default_tolerance() -> f64 {
    KMeans::default().tolerance
}

fn default_compression_level() -> u32 {
    6
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            metrics: default_metrics(),
            scoring_modes: default_scoring_modes(),
            embedding: Embedding::default(),
            seed: default_seed(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
            compression_level: default_compression_level(),
            infinity_sentinel: None,
            clusters: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file. A missing file is an error here: a run asked for
    /// a specific config and should not silently fall back to defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Reject settings no run can use.
    pub fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(AnalysisError::invalid_config("no attributes configured"));
        }
        if self.metrics.is_empty() {
            return Err(AnalysisError::invalid_config("no metrics configured"));
        }
        if self.scoring_modes.is_empty() {
            return Err(AnalysisError::invalid_config("no scoring modes configured"));
        }
        if self.max_iter == 0 {
            return Err(AnalysisError::invalid_config("max_iter must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AnalysisError::invalid_config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.compression_level > 9 {
            return Err(AnalysisError::invalid_config(format!(
                "compression_level must be in 0..=9, got {}",
                self.compression_level
            )));
        }
        if let Some(sentinel) = self.infinity_sentinel {
            if !sentinel.is_finite() || sentinel <= 0.0 {
                return Err(AnalysisError::invalid_config(format!(
                    "infinity_sentinel must be a positive finite number, got {}",
                    sentinel
                )));
            }
        }
        if self.clusters == Some(0) {
            return Err(AnalysisError::invalid_config("clusters must be at least 1"));
        }
        Ok(())
    }

    /// Partitioner carrying this config's k-means settings.
    pub fn partitioner(&self) -> Partitioner {
        Partitioner::new(self.embedding)
            .with_seed(self.seed)
            .with_max_iter(self.max_iter)
            .with_tolerance(self.tolerance)
            .with_infinity_sentinel(self.infinity_sentinel)
    }

    pub fn compressor(&self) -> ZlibCompressor {
        ZlibCompressor::new(self.compression_level)
    }

    /// Number of branches a run will produce.
    pub fn branch_count(&self) -> usize {
        self.attributes.len() * self.metrics.len()
    }
}
