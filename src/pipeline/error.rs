//! Error types for pipeline execution
//!
//! Errors chain the failing stage's own error for debugging while keeping a
//! user-friendly message for operator output.

use thiserror::Error;

use crate::dimensions::DimensionError;
use crate::facts::FactError;
use crate::load::LoadError;
use crate::staging::StagingError;

/// Errors that can occur while running the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Staging normalization failed
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// Dimension building failed
    #[error("Dimension error: {0}")]
    Dimension(#[from] DimensionError),

    /// Fact aggregation failed
    #[error("Fact error: {0}")]
    Fact(#[from] FactError),

    /// Loading into the store failed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Too many fact rows were lost during the load
    #[error("fact load success rate {rate:.3} below minimum {min:.3}")]
    LoadBelowThreshold { rate: f64, min: f64 },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Get a user-friendly error message for operator output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ConfigError(msg) => {
                format!("Invalid pipeline configuration: {msg}\n\nHint: Fix the config and rerun.")
            }
            PipelineError::Staging(e) => e.user_message(),
            PipelineError::Dimension(e) => e.user_message(),
            PipelineError::Fact(e) => e.user_message(),
            PipelineError::Load(e) => e.user_message(),
            PipelineError::LoadBelowThreshold { rate, min } => {
                format!(
                    "Only {:.1}% of fact rows were loaded; the run requires {:.1}%.\n\n\
                    Hint: Check the store logs for failing chunks, then rerun.",
                    rate * 100.0,
                    min * 100.0
                )
            }
            PipelineError::Json(e) => format!("JSON error: {e}"),
        }
    }
}
