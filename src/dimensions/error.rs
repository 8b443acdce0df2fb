//! Error types for dimension building

use thiserror::Error;

/// Errors raised while building dimensions; fatal for the run
#[derive(Error, Debug)]
pub enum DimensionError {
    /// A value fell outside its mapping table where silent fallback is not
    /// allowed (only the region table at present)
    #[error("no {table} mapping for value '{value}'")]
    Classification { table: &'static str, value: String },

    /// Configured date range is unusable
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
}

impl DimensionError {
    /// Get a user-friendly error message for operator output
    pub fn user_message(&self) -> String {
        match self {
            DimensionError::Classification { table, value } => {
                format!(
                    "Unmapped value '{value}' in the {table} table.\n\n\
                    Hint: Add the value to the configured {table} table or fix the source data."
                )
            }
            DimensionError::InvalidDateRange(msg) => {
                format!("Invalid date dimension range: {msg}\n\nHint: Check the configured bounds.")
            }
        }
    }
}
