//! Staging normalizer: raw extract rows → typed in-memory tables

mod error;
mod normalize;

pub use error::StagingError;
pub use normalize::{RawExtract, StagingTables, normalize};
