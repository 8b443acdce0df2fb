//! Error types for fact aggregation

use thiserror::Error;

/// Errors raised while building fact tables; fatal for the run
#[derive(Error, Debug)]
pub enum FactError {
    /// Two orders carried the same business key; the extract is corrupt
    #[error("duplicate order id '{order_id}' in extract")]
    DuplicateKey { order_id: String },
}

impl FactError {
    /// Get a user-friendly error message for operator output
    pub fn user_message(&self) -> String {
        match self {
            FactError::DuplicateKey { order_id } => {
                format!(
                    "Order id '{order_id}' appears more than once in the extract.\n\n\
                    Hint: Deduplicate the source orders before running the transform."
                )
            }
        }
    }
}
