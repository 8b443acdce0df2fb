//! Error types for staging normalization

use thiserror::Error;

/// Errors raised while decoding raw extracts; all of them abort the run
#[derive(Error, Debug)]
pub enum StagingError {
    /// Required column absent from a source row
    #[error("{entity}: missing required column '{column}'")]
    MissingColumn {
        entity: &'static str,
        column: &'static str,
    },

    /// Column present but the value cannot be decoded
    #[error("{entity}: malformed value in '{column}': {reason}")]
    Malformed {
        entity: &'static str,
        column: &'static str,
        reason: String,
    },
}

impl StagingError {
    /// Get a user-friendly error message for operator output
    pub fn user_message(&self) -> String {
        match self {
            StagingError::MissingColumn { entity, column } => {
                format!(
                    "Missing required column '{column}' in {entity} extract.\n\n\
                    Hint: Check that the extraction step produced the full source schema."
                )
            }
            StagingError::Malformed {
                entity,
                column,
                reason,
            } => {
                format!(
                    "Malformed value in {entity}.{column}: {reason}\n\n\
                    Hint: Check the source data types for this column."
                )
            }
        }
    }
}
