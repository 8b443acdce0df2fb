//! Error types for the load stage

use thiserror::Error;

use super::store::{StoreError, Table};

/// Fatal load failures; partial fact batches are counters, not errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// A dimension table failed to load; facts would all be orphans
    #[error("failed to load {table}: {source}")]
    Dimension { table: Table, source: StoreError },

    /// The cohort retention table failed to load
    #[error("failed to load cohort retention: {0}")]
    Cohort(#[source] StoreError),
}

impl LoadError {
    /// Get a user-friendly error message for operator output
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Dimension { table, source } => {
                format!(
                    "Loading the {table} dimension failed: {source}\n\n\
                    Hint: No facts were loaded. Fix the store and rerun; the run is idempotent."
                )
            }
            LoadError::Cohort(source) => {
                format!(
                    "Loading cohort retention failed: {source}\n\n\
                    Hint: Dimensions and facts are loaded; rerun to retry the cohort table."
                )
            }
        }
    }
}
