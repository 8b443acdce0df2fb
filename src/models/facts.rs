//! Fact record types: order-grain facts and cohort retention rows

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::staging::OrderStatus;

/// One fact row per order surviving the quality filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
    // Foreign keys to dimension surrogate keys
    pub customer_key: i64,
    pub product_key: i64,
    pub order_date_key: i32,
    pub delivery_date_key: Option<i32>,
    pub payment_type_key: Option<i64>,

    /// Business key from source
    pub order_id: String,
    pub status: OrderStatus,

    // Measures
    pub item_count: u32,
    pub subtotal: Decimal,
    pub freight_total: Decimal,
    pub total_value: Decimal,
    pub payment_value: Decimal,
    pub installments: i32,
    pub delivery_days: Option<i64>,
    /// Positive means delivered after the estimate
    pub delivery_delay_days: Option<i64>,
    pub is_late: bool,
    pub review_score: Option<i32>,

    // Annotations
    pub has_review: bool,
    /// An item price exceeded the run's outlier percentile
    pub is_outlier: bool,
    /// Delivery took longer than the review threshold
    pub needs_review: bool,
    /// Shipped but not yet delivered; delivery metrics are null
    pub in_transit: bool,

    pub purchase_timestamp: NaiveDateTime,
}

/// Calendar month used as the cohort period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Month containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whole months elapsed from `earlier` to `self`; negative if earlier
    pub fn months_since(&self, earlier: YearMonth) -> i32 {
        (self.year - earlier.year) * 12 + self.month as i32 - earlier.month as i32
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One retention observation per (cohort, offset) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortRecord {
    pub cohort_period: YearMonth,
    pub months_since_first_purchase: u32,
    pub cohort_size: u64,
    pub returning_count: u64,
    /// returning_count / cohort_size, in [0, 1]
    pub retention_rate: f64,
}
