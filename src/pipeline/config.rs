//! Pipeline configuration types

use serde::{Deserialize, Serialize};

use crate::dimensions::DimensionSettings;
use crate::facts::PrimaryProductPolicy;
use crate::quality::QualityConfig;

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline run
    pub name: Option<String>,
    /// Calendar range, rule tables and classification parameters
    pub dimensions: DimensionSettings,
    /// Item-price percentile above which orders are flagged as outliers
    pub outlier_percentile: f64,
    /// Delivery slower than this many days flags the order for review
    pub delivery_review_threshold_days: i64,
    /// Which line item carries the order's product foreign key
    pub primary_product: PrimaryProductPolicy,
    /// Fact rows per load chunk
    pub batch_size: usize,
    /// Minimum accepted share of fact rows for the run to pass
    pub min_load_success_rate: f64,
    /// Thresholds for the post-load quality checks
    pub quality: QualityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: None,
            dimensions: DimensionSettings::default(),
            outlier_percentile: 0.99,
            delivery_review_threshold_days: 90,
            primary_product: PrimaryProductPolicy::default(),
            batch_size: 500,
            min_load_success_rate: 0.99,
            quality: QualityConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the run name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set dimension settings
    pub fn with_dimensions(mut self, dimensions: DimensionSettings) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the outlier percentile
    pub fn with_outlier_percentile(mut self, percentile: f64) -> Self {
        self.outlier_percentile = percentile;
        self
    }

    /// Set the delivery review threshold
    pub fn with_delivery_review_threshold(mut self, days: i64) -> Self {
        self.delivery_review_threshold_days = days;
        self
    }

    /// Set the primary product policy
    pub fn with_primary_product(mut self, policy: PrimaryProductPolicy) -> Self {
        self.primary_product = policy;
        self
    }

    /// Set the fact load chunk size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the minimum load success rate
    pub fn with_min_load_success_rate(mut self, rate: f64) -> Self {
        self.min_load_success_rate = rate;
        self
    }

    /// Set quality thresholds
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0 < self.outlier_percentile && self.outlier_percentile <= 1.0) {
            return Err(format!(
                "outlier_percentile must be in (0, 1], got {}",
                self.outlier_percentile
            ));
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_load_success_rate) {
            return Err(format!(
                "min_load_success_rate must be in [0, 1], got {}",
                self.min_load_success_rate
            ));
        }
        if self.delivery_review_threshold_days < 0 {
            return Err("delivery_review_threshold_days must not be negative".to_string());
        }
        if self.dimensions.date_start > self.dimensions.date_end {
            return Err(format!(
                "date range start {} is after end {}",
                self.dimensions.date_start, self.dimensions.date_end
            ));
        }
        if self.dimensions.region_table.is_empty() {
            return Err("region table must not be empty".to_string());
        }
        Ok(())
    }
}
