//! Typed staging records, one struct per source entity
//!
//! Staging records are immutable once decoded; every downstream stage reads
//! them by reference and produces new record sets.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a source order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Delivered to the customer
    Delivered,
    /// Handed to the carrier, not yet delivered
    Shipped,
    /// Cancelled by the customer or seller
    Canceled,
    /// Stock unavailable after purchase
    Unavailable,
    /// Invoice issued
    Invoiced,
    /// Being prepared
    Processing,
    /// Created but not approved
    Created,
    /// Payment approved
    Approved,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Delivered => "delivered",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delivered" => Ok(OrderStatus::Delivered),
            "shipped" => Ok(OrderStatus::Shipped),
            "canceled" => Ok(OrderStatus::Canceled),
            "unavailable" => Ok(OrderStatus::Unavailable),
            "invoiced" => Ok(OrderStatus::Invoiced),
            "processing" => Ok(OrderStatus::Processing),
            "created" => Ok(OrderStatus::Created),
            "approved" => Ok(OrderStatus::Approved),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// One raw customer row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Per-order customer reference used by order rows
    pub customer_id: String,
    /// Business key identifying the person across orders
    pub customer_unique_id: String,
    pub city: Option<String>,
    /// Two-letter state code, mapped to a region during dimension build
    pub state: String,
}

/// One raw order row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchase_timestamp: NaiveDateTime,
    pub delivered_at: Option<NaiveDateTime>,
    pub estimated_delivery_date: Option<NaiveDate>,
}

/// One raw order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: String,
    /// Line number within the order, 1-based
    pub order_item_id: i32,
    pub product_id: String,
    pub seller_id: Option<String>,
    pub price: Decimal,
    pub freight_value: Decimal,
}

impl OrderItemRecord {
    /// Item price plus freight, the order-revenue contribution of one line
    pub fn item_total(&self) -> Decimal {
        self.price + self.freight_value
    }
}

/// One raw payment row (an order can carry several)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    pub payment_type: String,
    pub installments: i32,
    pub value: Decimal,
}

/// One raw review row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub order_id: String,
    pub score: i32,
}

/// One raw product row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    /// Source category name; absent maps to the Uncategorized group
    pub category: Option<String>,
    pub weight_g: Option<i64>,
    pub length_cm: Option<i64>,
    pub height_cm: Option<i64>,
    pub width_cm: Option<i64>,
    pub photos_qty: Option<i32>,
}
