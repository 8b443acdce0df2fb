//! Referential-integrity loader
//!
//! Dimensions load first and all-or-nothing. Facts load in chunks against
//! the keys the dimensions actually carry, so the store never sees a
//! dangling foreign key. A failed chunk is retried once, then written off.

use tracing::{info, warn};

use super::error::LoadError;
use super::store::{Table, WarehouseStore};
use crate::dimensions::Dimensions;
use crate::models::facts::{CohortRecord, FactRecord};
use serde::{Deserialize, Serialize};

/// Outcome counters of one load run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// Fact rows handed to the loader
    pub attempted: u64,
    /// Fact rows the store accepted
    pub succeeded: u64,
    /// Fact rows skipped for a dangling foreign key
    pub skipped_orphan: u64,
    /// Fact rows lost to chunks that failed twice
    pub failed: u64,
}

impl LoadSummary {
    /// Accepted share of attempted rows; 1.0 for an empty run
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 1.0;
        }
        self.succeeded as f64 / self.attempted as f64
    }

    pub fn meets_threshold(&self, min_success_rate: f64) -> bool {
        self.success_rate() >= min_success_rate
    }
}

/// Loads the star schema into a [`WarehouseStore`] in FK-safe order
pub struct IntegrityLoader {
    pub batch_size: usize,
}

impl IntegrityLoader {
    pub fn load(
        &self,
        store: &mut dyn WarehouseStore,
        dimensions: &Dimensions,
        facts: &[FactRecord],
        cohorts: &[CohortRecord],
    ) -> Result<LoadSummary, LoadError> {
        self.load_dimensions(store, dimensions)?;
        let summary = self.load_facts(store, dimensions, facts);
        store
            .insert_cohorts(cohorts)
            .map_err(LoadError::Cohort)?;
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            skipped = summary.skipped_orphan,
            failed = summary.failed,
            cohort_rows = cohorts.len(),
            "Load complete"
        );
        Ok(summary)
    }

    fn load_dimensions(
        &self,
        store: &mut dyn WarehouseStore,
        dimensions: &Dimensions,
    ) -> Result<(), LoadError> {
        store
            .insert_dates(&dimensions.dates)
            .map_err(|source| LoadError::Dimension { table: Table::DimDates, source })?;
        store
            .insert_customers(&dimensions.customers)
            .map_err(|source| LoadError::Dimension { table: Table::DimCustomers, source })?;
        store
            .insert_products(&dimensions.products)
            .map_err(|source| LoadError::Dimension { table: Table::DimProducts, source })?;
        store
            .insert_payment_types(&dimensions.payment_types)
            .map_err(|source| LoadError::Dimension { table: Table::DimPaymentTypes, source })?;
        Ok(())
    }

    fn load_facts(
        &self,
        store: &mut dyn WarehouseStore,
        dimensions: &Dimensions,
        facts: &[FactRecord],
    ) -> LoadSummary {
        let customer_keys = store.dimension_keys(Table::DimCustomers);
        let product_keys = store.dimension_keys(Table::DimProducts);
        let payment_keys = store.dimension_keys(Table::DimPaymentTypes);
        let date_keys = store.date_keys();
        debug_assert_eq!(date_keys.len(), dimensions.date_keys.len());

        let mut summary = LoadSummary {
            attempted: facts.len() as u64,
            ..LoadSummary::default()
        };

        let mut valid: Vec<&FactRecord> = Vec::with_capacity(facts.len());
        for fact in facts {
            let dangling = !customer_keys.contains(&fact.customer_key)
                || !product_keys.contains(&fact.product_key)
                || !date_keys.contains(&fact.order_date_key)
                || fact
                    .delivery_date_key
                    .is_some_and(|k| !date_keys.contains(&k))
                || fact
                    .payment_type_key
                    .is_some_and(|k| !payment_keys.contains(&k));
            if dangling {
                summary.skipped_orphan += 1;
                warn!(order_id = %fact.order_id, "Skipping fact with dangling foreign key");
                continue;
            }
            valid.push(fact);
        }

        let batch_size = self.batch_size.max(1);
        for chunk in valid.chunks(batch_size) {
            let rows: Vec<FactRecord> = chunk.iter().map(|&f| f.clone()).collect();
            match store.insert_facts(&rows) {
                Ok(()) => summary.succeeded += rows.len() as u64,
                Err(first) => {
                    warn!(rows = rows.len(), error = %first, "Fact chunk failed, retrying once");
                    match store.insert_facts(&rows) {
                        Ok(()) => summary.succeeded += rows.len() as u64,
                        Err(second) => {
                            summary.failed += rows.len() as u64;
                            warn!(rows = rows.len(), error = %second,
                                "Fact chunk failed twice, giving up on it");
                        }
                    }
                }
            }
        }

        summary
    }
}
