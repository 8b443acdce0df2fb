//! Post-load data quality checks
//!
//! Runs against the store after loading, so the report describes what
//! actually landed rather than what the transform intended.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::load::{Table, WarehouseStore};

/// Thresholds for the rate-based checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Tolerated share of facts without a review score
    pub max_review_null_rate: f64,
    /// Tolerated share of facts without a payment type
    pub max_payment_null_rate: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_review_null_rate: 0.9,
            max_payment_null_rate: 0.05,
        }
    }
}

/// Row counts the load stage reported; the store must agree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedCounts {
    pub customers: u64,
    pub products: u64,
    pub payment_types: u64,
    pub dates: u64,
    pub facts: u64,
    pub cohorts: u64,
}

/// One named check with its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// All checks of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub checks: Vec<QualityCheck>,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> Vec<&QualityCheck> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    fn record(&mut self, name: &str, passed: bool, detail: String) {
        if !passed {
            warn!(check = name, %detail, "Quality check failed");
        }
        self.checks.push(QualityCheck {
            name: name.to_string(),
            passed,
            detail,
        });
    }
}

/// Run every check family against the loaded store
pub fn run_checks(
    store: &dyn WarehouseStore,
    expected: &ExpectedCounts,
    config: &QualityConfig,
) -> QualityReport {
    let mut report = QualityReport::default();
    let facts = store.fact_rows();

    check_row_counts(store, expected, &mut report);
    check_referential_integrity(store, &mut report);
    check_null_rates(&facts, config, &mut report);
    check_duplicates(store, &facts, &mut report);
    check_value_ranges(&facts, &mut report);

    info!(
        checks = report.checks.len(),
        failures = report.failures().len(),
        "Quality report complete"
    );
    report
}

fn check_row_counts(
    store: &dyn WarehouseStore,
    expected: &ExpectedCounts,
    report: &mut QualityReport,
) {
    let pairs = [
        (Table::DimCustomers, expected.customers),
        (Table::DimProducts, expected.products),
        (Table::DimPaymentTypes, expected.payment_types),
        (Table::DimDates, expected.dates),
        (Table::FactOrders, expected.facts),
        (Table::FactCohortRetention, expected.cohorts),
    ];
    for (table, want) in pairs {
        let got = store.row_count(table);
        report.record(
            &format!("row_count:{table}"),
            got == want,
            format!("expected {want}, found {got}"),
        );
    }
}

fn check_referential_integrity(store: &dyn WarehouseStore, report: &mut QualityReport) {
    let customer_keys = store.dimension_keys(Table::DimCustomers);
    let product_keys = store.dimension_keys(Table::DimProducts);
    let payment_keys = store.dimension_keys(Table::DimPaymentTypes);
    let date_keys = store.date_keys();

    let mut dangling = 0u64;
    for fact in store.fact_rows() {
        let ok = customer_keys.contains(&fact.customer_key)
            && product_keys.contains(&fact.product_key)
            && date_keys.contains(&fact.order_date_key)
            && fact
                .delivery_date_key
                .is_none_or(|k| date_keys.contains(&k))
            && fact
                .payment_type_key
                .is_none_or(|k| payment_keys.contains(&k));
        if !ok {
            dangling += 1;
        }
    }
    report.record(
        "referential_integrity",
        dangling == 0,
        format!("{dangling} facts with dangling foreign keys"),
    );
}

fn check_null_rates(
    facts: &[crate::models::facts::FactRecord],
    config: &QualityConfig,
    report: &mut QualityReport,
) {
    let total = facts.len() as f64;
    let rate = |nulls: usize| if facts.is_empty() { 0.0 } else { nulls as f64 / total };

    let review_rate = rate(facts.iter().filter(|f| f.review_score.is_none()).count());
    report.record(
        "null_rate:review_score",
        review_rate <= config.max_review_null_rate,
        format!("{review_rate:.3} null (max {:.3})", config.max_review_null_rate),
    );

    let payment_rate = rate(facts.iter().filter(|f| f.payment_type_key.is_none()).count());
    report.record(
        "null_rate:payment_type",
        payment_rate <= config.max_payment_null_rate,
        format!("{payment_rate:.3} null (max {:.3})", config.max_payment_null_rate),
    );
}

fn check_duplicates(
    store: &dyn WarehouseStore,
    facts: &[crate::models::facts::FactRecord],
    report: &mut QualityReport,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    let duplicates = facts
        .iter()
        .filter(|f| !seen.insert(f.order_id.as_str()))
        .count();
    report.record(
        "unique:order_id",
        duplicates == 0,
        format!("{duplicates} duplicated order ids"),
    );

    // Dimension rows are keyed by surrogate in the store, so a business key
    // loaded twice would slip past the insert constraint
    for table in [Table::DimCustomers, Table::DimProducts, Table::DimPaymentTypes] {
        let keys = store.dimension_business_keys(table);
        let mut seen: HashSet<&str> = HashSet::new();
        let duplicates = keys.iter().filter(|k| !seen.insert(k.as_str())).count();
        report.record(
            &format!("unique:{table}"),
            duplicates == 0,
            format!("{duplicates} duplicated business keys"),
        );
    }
}

fn check_value_ranges(facts: &[crate::models::facts::FactRecord], report: &mut QualityReport) {
    use rust_decimal::Decimal;
    let bad = facts
        .iter()
        .filter(|f| {
            f.total_value < Decimal::ZERO
                || f.payment_value < Decimal::ZERO
                || f.item_count == 0
                || f.delivery_days.is_some_and(|d| d < 0)
                || f.review_score.is_some_and(|s| !(1..=5).contains(&s))
        })
        .count();
    report.record(
        "value_ranges",
        bad == 0,
        format!("{bad} facts with out-of-range measures"),
    );
}
