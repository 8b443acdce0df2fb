//! Pipeline orchestration: one entry point running every stage in order

mod config;
mod error;
mod runner;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use runner::{PipelineReport, PipelineRunner, StageTiming, StagedCounts};
