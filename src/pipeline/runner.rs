//! Pipeline runner for executing the full transform-and-load run

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, info_span};
use uuid::Uuid;

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use crate::dimensions::build_dimensions;
use crate::facts::{AggregationStats, CohortRetentionBuilder, FactOrdersBuilder};
use crate::load::{IntegrityLoader, LoadSummary, WarehouseStore};
use crate::quality::{ExpectedCounts, QualityReport, run_checks};
use crate::staging::{RawExtract, normalize};

/// Row counts of the normalized staging tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedCounts {
    pub customers: u64,
    pub orders: u64,
    pub order_items: u64,
    pub payments: u64,
    pub reviews: u64,
    pub products: u64,
}

/// Wall time of one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: u64,
}

/// Everything one run produced, for operator output and monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub run_id: String,
    pub config_hash: String,
    pub staged: StagedCounts,
    pub aggregation: AggregationStats,
    pub cohort_rows: u64,
    pub load: LoadSummary,
    pub quality: QualityReport,
    pub stages: Vec<StageTiming>,
    pub duration_ms: u64,
}

/// Runs all stages against a warehouse store
pub struct PipelineRunner {
    config: PipelineConfig,
    run_id: String,
    config_hash: String,
}

impl PipelineRunner {
    /// Create a new pipeline runner
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::ConfigError)?;
        let config_hash = Self::hash_config(&config)?;
        Ok(Self {
            config,
            run_id: Uuid::new_v4().to_string(),
            config_hash,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Hash of the effective configuration, for reproducibility tracking
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Run the full pipeline: normalize, build, aggregate, load, check
    pub fn run(
        &self,
        raw: &RawExtract,
        store: &mut dyn WarehouseStore,
    ) -> PipelineResult<PipelineReport> {
        let _span = info_span!(
            "pipeline_run",
            run_id = %self.run_id,
            name = self.config.name.as_deref().unwrap_or("unnamed")
        )
        .entered();
        let start = Instant::now();
        let mut stages = Vec::new();

        info!(
            run_id = %self.run_id,
            config_hash = %self.config_hash,
            "Starting pipeline"
        );

        let staging = {
            let _stage = info_span!("pipeline_stage", stage = "staging").entered();
            let stage_start = Instant::now();
            let tables = normalize(raw)?;
            stages.push(timing("staging", stage_start));
            tables
        };
        let staged = StagedCounts {
            customers: staging.customers.len() as u64,
            orders: staging.orders.len() as u64,
            order_items: staging.order_items.len() as u64,
            payments: staging.payments.len() as u64,
            reviews: staging.reviews.len() as u64,
            products: staging.products.len() as u64,
        };

        let dimensions = {
            let _stage = info_span!("pipeline_stage", stage = "dimensions").entered();
            let stage_start = Instant::now();
            let dims = build_dimensions(&staging, &self.config.dimensions)?;
            stages.push(timing("dimensions", stage_start));
            dims
        };

        let (facts, aggregation) = {
            let _stage = info_span!("pipeline_stage", stage = "facts").entered();
            let stage_start = Instant::now();
            let built = FactOrdersBuilder {
                dimensions: &dimensions,
                outlier_percentile: self.config.outlier_percentile,
                delivery_review_threshold_days: self.config.delivery_review_threshold_days,
                primary_product: self.config.primary_product,
            }
            .build(&staging)?;
            stages.push(timing("facts", stage_start));
            built
        };

        let cohorts = {
            let _stage = info_span!("pipeline_stage", stage = "cohorts").entered();
            let stage_start = Instant::now();
            let rows = CohortRetentionBuilder::build(
                &staging.orders,
                &dimensions.customer_key_by_order_ref,
            );
            stages.push(timing("cohorts", stage_start));
            rows
        };

        let load = {
            let _stage = info_span!("pipeline_stage", stage = "load").entered();
            let stage_start = Instant::now();
            let summary = IntegrityLoader {
                batch_size: self.config.batch_size,
            }
            .load(store, &dimensions, &facts, &cohorts)?;
            stages.push(timing("load", stage_start));
            summary
        };
        if !load.meets_threshold(self.config.min_load_success_rate) {
            return Err(PipelineError::LoadBelowThreshold {
                rate: load.success_rate(),
                min: self.config.min_load_success_rate,
            });
        }

        let quality = {
            let _stage = info_span!("pipeline_stage", stage = "quality").entered();
            let stage_start = Instant::now();
            let expected = ExpectedCounts {
                customers: dimensions.customers.len() as u64,
                products: dimensions.products.len() as u64,
                payment_types: dimensions.payment_types.len() as u64,
                dates: dimensions.dates.len() as u64,
                facts: load.succeeded,
                cohorts: cohorts.len() as u64,
            };
            let report = run_checks(store, &expected, &self.config.quality);
            stages.push(timing("quality", stage_start));
            report
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %self.run_id,
            duration_ms,
            facts = load.succeeded,
            quality_passed = quality.passed(),
            "Pipeline completed"
        );

        Ok(PipelineReport {
            run_id: self.run_id.clone(),
            config_hash: self.config_hash.clone(),
            staged,
            aggregation,
            cohort_rows: cohorts.len() as u64,
            load,
            quality,
            stages,
            duration_ms,
        })
    }

    fn hash_config(config: &PipelineConfig) -> PipelineResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(config)?);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn timing(stage: &str, start: Instant) -> StageTiming {
    StageTiming {
        stage: stage.to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
