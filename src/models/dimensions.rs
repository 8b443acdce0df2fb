//! Dimension record types
//!
//! Every dimension row is created once per run and never mutated. Surrogate
//! keys are dense from 1 in first-seen order of the business key, except the
//! generated date dimension, which keys on the YYYYMMDD integer.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Behavioral customer segment, assigned after all orders are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerSegment {
    /// No orders in the snapshot
    Inactive,
    /// Exactly one order
    New,
    /// Two to five orders
    Returning,
    /// More than five orders, or accumulated spend above the configured
    /// threshold
    Vip,
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CustomerSegment::Inactive => "Inactive",
            CustomerSegment::New => "New",
            CustomerSegment::Returning => "Returning",
            CustomerSegment::Vip => "VIP",
        };
        write!(f, "{}", s)
    }
}

/// Geographic region derived from the state code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    North,
    Northeast,
    CentralWest,
    Southeast,
    South,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Region::North => "North",
            Region::Northeast => "Northeast",
            Region::CentralWest => "Central-West",
            Region::Southeast => "Southeast",
            Region::South => "South",
        };
        write!(f, "{}", s)
    }
}

/// Customer dimension row, keyed by `customer_unique_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDimension {
    pub customer_key: i64,
    pub customer_unique_id: String,
    pub city: Option<String>,
    pub state: String,
    pub region: Region,
    pub segment: CustomerSegment,
    pub first_order_at: Option<NaiveDateTime>,
    pub last_order_at: Option<NaiveDateTime>,
    pub total_orders: u32,
    pub delivered_orders: u32,
    pub total_spent: Decimal,
    pub avg_order_value: Decimal,
    /// Projected customer lifetime value
    pub lifetime_value: Decimal,
    /// Days between first and last order, floored at 1
    pub days_as_customer: i64,
}

/// Product dimension row, keyed by `product_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDimension {
    pub product_key: i64,
    pub product_id: String,
    pub category: Option<String>,
    pub category_group: String,
    pub weight_g: Option<i64>,
    pub length_cm: Option<i64>,
    pub height_cm: Option<i64>,
    pub width_cm: Option<i64>,
    pub volume_cm3: Option<i64>,
    pub photos_qty: Option<i32>,
    pub has_photos: bool,
}

/// Payment type dimension row (small lookup dimension)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTypeDimension {
    pub payment_type_key: i64,
    pub payment_type: String,
    pub category: String,
}

/// Generated calendar day row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDimension {
    /// YYYYMMDD integer, derivable from the date without a lookup
    pub date_key: i32,
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub month_name: String,
    pub week: u32,
    pub day_of_month: u32,
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: u32,
    pub day_name: String,
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl DateDimension {
    /// Compute the YYYYMMDD key for a date
    pub fn key_for(date: NaiveDate) -> i32 {
        use chrono::Datelike;
        date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
    }
}
