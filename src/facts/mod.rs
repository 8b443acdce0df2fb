//! Fact builders: order-grain facts and cohort retention

mod cohort;
mod error;
mod orders;

pub use cohort::CohortRetentionBuilder;
pub use error::FactError;
pub use orders::{AggregationStats, FactOrdersBuilder, PrimaryProductPolicy};
