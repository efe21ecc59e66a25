//! Error types for scenario_atlas
//!
//! This module provides structured error handling using thiserror.

use thiserror::Error;
use std::path::PathBuf;

use crate::core::clustering::ClusteringError;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analysing a scenario dataset
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A value reaching a metric cannot be compared (e.g. empty corpus string)
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A caller-side precondition of partitioning or alignment does not hold
    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    /// The dataset breaks a structural invariant
    #[error("Invalid dataset: {message}")]
    InvalidDataset { message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Failure inside the k-means implementation
    #[error("Clustering error: {0}")]
    Clustering(#[from] ClusteringError),

    /// IO error (dataset/config loading, compressor sink)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Wrap an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a precondition violation
    pub fn precondition(message: impl Into<String>) -> Self {
        AnalysisError::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Create an invalid dataset error
    pub fn invalid_dataset(message: impl Into<String>) -> Self {
        AnalysisError::InvalidDataset {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        AnalysisError::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for errors recovered per matrix cell rather than propagated.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            AnalysisError::InvalidInput { .. } => true,
            AnalysisError::WithContext { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::FileNotFound {
            path: PathBuf::from("/tmp/missing.json"),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));
    }

    #[test]
    fn test_error_with_context() {
        let err = AnalysisError::invalid_config("max_iter must be positive");
        let wrapped = err.with_context("loading config");
        assert!(wrapped.to_string().contains("loading config"));
        assert!(wrapped.to_string().contains("max_iter"));
    }

    #[test]
    fn test_invalid_input_survives_context() {
        let err = AnalysisError::invalid_input("empty string").with_context("pair (0, 1)");
        assert!(err.is_invalid_input());
        assert!(!AnalysisError::precondition("no clusters").is_invalid_input());
    }

    #[test]
    fn test_clustering_error_conversion() {
        let err: AnalysisError = ClusteringError::EmptyDataset.into();
        assert!(matches!(err, AnalysisError::Clustering(_)));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(AnalysisError::precondition("k exceeds corpus size"));
        let err = result.context("partitioning Step Name NCD").unwrap_err();
        assert!(err.to_string().starts_with("partitioning Step Name NCD"));
    }
}
