//! Decoding of raw entity rows into typed staging tables
//!
//! Raw rows arrive as `serde_json::Value` objects from the extraction
//! collaborator. Decoding enforces the required-column contract (fatal on
//! violation) and applies the null policy: optional text columns are
//! trimmed, with empty strings becoming `None`.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use super::error::StagingError;
use crate::models::staging::{
    CustomerRecord, OrderItemRecord, OrderRecord, OrderStatus, PaymentRecord, ProductRecord,
    ReviewRecord,
};

/// Raw extract output, one row vector per source entity
#[derive(Debug, Clone, Default)]
pub struct RawExtract {
    pub customers: Vec<Value>,
    pub orders: Vec<Value>,
    pub order_items: Vec<Value>,
    pub payments: Vec<Value>,
    pub reviews: Vec<Value>,
    pub products: Vec<Value>,
}

/// Uniform in-memory staging tables, input order preserved
#[derive(Debug, Clone, Default)]
pub struct StagingTables {
    pub customers: Vec<CustomerRecord>,
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub payments: Vec<PaymentRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub products: Vec<ProductRecord>,
}

/// Decode a full raw extract into staging tables
pub fn normalize(raw: &RawExtract) -> Result<StagingTables, StagingError> {
    let tables = StagingTables {
        customers: decode_all(&raw.customers, decode_customer)?,
        orders: decode_all(&raw.orders, decode_order)?,
        order_items: decode_all(&raw.order_items, decode_order_item)?,
        payments: decode_all(&raw.payments, decode_payment)?,
        reviews: decode_all(&raw.reviews, decode_review)?,
        products: decode_all(&raw.products, decode_product)?,
    };

    info!(
        customers = tables.customers.len(),
        orders = tables.orders.len(),
        order_items = tables.order_items.len(),
        payments = tables.payments.len(),
        reviews = tables.reviews.len(),
        products = tables.products.len(),
        "Staging tables normalized"
    );

    Ok(tables)
}

fn decode_all<T>(
    rows: &[Value],
    decode: fn(&Row<'_>) -> Result<T, StagingError>,
) -> Result<Vec<T>, StagingError> {
    rows.iter()
        .map(|value| decode(&Row { value }))
        .collect()
}

/// One raw row under decode, with column accessors enforcing the null policy
struct Row<'a> {
    value: &'a Value,
}

impl Row<'_> {
    fn req_str(&self, entity: &'static str, column: &'static str) -> Result<String, StagingError> {
        match self.value.get(column) {
            None | Some(Value::Null) => Err(StagingError::MissingColumn { entity, column }),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Err(StagingError::MissingColumn { entity, column })
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Some(other) => Err(StagingError::Malformed {
                entity,
                column,
                reason: format!("expected string, got {}", type_name(other)),
            }),
        }
    }

    fn opt_str(&self, entity: &'static str, column: &'static str) -> Result<Option<String>, StagingError> {
        match self.value.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok(if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                })
            }
            Some(other) => Err(StagingError::Malformed {
                entity,
                column,
                reason: format!("expected string, got {}", type_name(other)),
            }),
        }
    }

    fn req_decimal(&self, entity: &'static str, column: &'static str) -> Result<Decimal, StagingError> {
        match self.value.get(column) {
            None | Some(Value::Null) => Err(StagingError::MissingColumn { entity, column }),
            // Parse from the JSON text representation so the decimal is exact
            Some(Value::Number(n)) => {
                Decimal::from_str(&n.to_string()).map_err(|e| StagingError::Malformed {
                    entity,
                    column,
                    reason: e.to_string(),
                })
            }
            Some(Value::String(s)) => {
                Decimal::from_str(s.trim()).map_err(|e| StagingError::Malformed {
                    entity,
                    column,
                    reason: e.to_string(),
                })
            }
            Some(other) => Err(StagingError::Malformed {
                entity,
                column,
                reason: format!("expected number, got {}", type_name(other)),
            }),
        }
    }

    fn req_i32(&self, entity: &'static str, column: &'static str) -> Result<i32, StagingError> {
        self.opt_i32(entity, column)?
            .ok_or(StagingError::MissingColumn { entity, column })
    }

    fn opt_i64(&self, entity: &'static str, column: &'static str) -> Result<Option<i64>, StagingError> {
        match self.value.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Ok(Some(i)),
                // Source exports sometimes carry integral floats (e.g. 250.0)
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                    _ => Err(StagingError::Malformed {
                        entity,
                        column,
                        reason: format!("expected integer, got {}", n),
                    }),
                },
            },
            Some(other) => Err(StagingError::Malformed {
                entity,
                column,
                reason: format!("expected integer, got {}", type_name(other)),
            }),
        }
    }

    fn opt_i32(&self, entity: &'static str, column: &'static str) -> Result<Option<i32>, StagingError> {
        match self.opt_i64(entity, column)? {
            None => Ok(None),
            Some(n) => i32::try_from(n)
                .map(Some)
                .map_err(|_| StagingError::Malformed {
                    entity,
                    column,
                    reason: format!("value {} out of range for a 32-bit integer", n),
                }),
        }
    }

    fn req_datetime(
        &self,
        entity: &'static str,
        column: &'static str,
    ) -> Result<NaiveDateTime, StagingError> {
        self.opt_datetime(entity, column)?
            .ok_or(StagingError::MissingColumn { entity, column })
    }

    fn opt_datetime(
        &self,
        entity: &'static str,
        column: &'static str,
    ) -> Result<Option<NaiveDateTime>, StagingError> {
        match self.opt_str(entity, column)? {
            None => Ok(None),
            Some(s) => parse_datetime(&s)
                .map(Some)
                .ok_or_else(|| StagingError::Malformed {
                    entity,
                    column,
                    reason: format!("unparseable timestamp '{}'", s),
                }),
        }
    }

    fn opt_date(
        &self,
        entity: &'static str,
        column: &'static str,
    ) -> Result<Option<NaiveDate>, StagingError> {
        Ok(self.opt_datetime(entity, column)?.map(|dt| dt.date()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accept the timestamp formats seen in source extracts
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn decode_customer(row: &Row<'_>) -> Result<CustomerRecord, StagingError> {
    const E: &str = "customers";
    Ok(CustomerRecord {
        customer_id: row.req_str(E, "customer_id")?,
        customer_unique_id: row.req_str(E, "customer_unique_id")?,
        city: row.opt_str(E, "customer_city")?,
        state: row.req_str(E, "customer_state")?,
    })
}

fn decode_order(row: &Row<'_>) -> Result<OrderRecord, StagingError> {
    const E: &str = "orders";
    let status_raw = row.req_str(E, "order_status")?;
    let status: OrderStatus = status_raw.parse().map_err(|reason| StagingError::Malformed {
        entity: E,
        column: "order_status",
        reason,
    })?;
    Ok(OrderRecord {
        order_id: row.req_str(E, "order_id")?,
        customer_id: row.req_str(E, "customer_id")?,
        status,
        purchase_timestamp: row.req_datetime(E, "order_purchase_timestamp")?,
        delivered_at: row.opt_datetime(E, "order_delivered_customer_date")?,
        estimated_delivery_date: row.opt_date(E, "order_estimated_delivery_date")?,
    })
}

fn decode_order_item(row: &Row<'_>) -> Result<OrderItemRecord, StagingError> {
    const E: &str = "order_items";
    Ok(OrderItemRecord {
        order_id: row.req_str(E, "order_id")?,
        order_item_id: row.req_i32(E, "order_item_id")?,
        product_id: row.req_str(E, "product_id")?,
        seller_id: row.opt_str(E, "seller_id")?,
        price: row.req_decimal(E, "price")?,
        freight_value: row.req_decimal(E, "freight_value")?,
    })
}

fn decode_payment(row: &Row<'_>) -> Result<PaymentRecord, StagingError> {
    const E: &str = "payments";
    Ok(PaymentRecord {
        order_id: row.req_str(E, "order_id")?,
        payment_type: row.req_str(E, "payment_type")?,
        // Missing installment counts default to a single installment
        installments: row.opt_i32(E, "payment_installments")?.unwrap_or(1),
        value: row.req_decimal(E, "payment_value")?,
    })
}

fn decode_review(row: &Row<'_>) -> Result<ReviewRecord, StagingError> {
    const E: &str = "reviews";
    Ok(ReviewRecord {
        order_id: row.req_str(E, "order_id")?,
        score: row.req_i32(E, "review_score")?,
    })
}

fn decode_product(row: &Row<'_>) -> Result<ProductRecord, StagingError> {
    const E: &str = "products";
    Ok(ProductRecord {
        product_id: row.req_str(E, "product_id")?,
        category: row.opt_str(E, "product_category_name")?,
        weight_g: row.opt_i64(E, "product_weight_g")?,
        length_cm: row.opt_i64(E, "product_length_cm")?,
        height_cm: row.opt_i64(E, "product_height_cm")?,
        width_cm: row.opt_i64(E, "product_width_cm")?,
        photos_qty: row.opt_i32(E, "product_photos_qty")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_order_full() {
        let raw = RawExtract {
            orders: vec![json!({
                "order_id": "o1",
                "customer_id": "c1",
                "order_status": "delivered",
                "order_purchase_timestamp": "2017-01-05 10:30:00",
                "order_delivered_customer_date": "2017-01-12 18:00:00",
                "order_estimated_delivery_date": "2017-01-20 00:00:00",
            })],
            ..Default::default()
        };
        let tables = normalize(&raw).unwrap();
        let order = &tables.orders[0];
        assert_eq!(order.order_id, "o1");
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivered_at.is_some());
        assert_eq!(
            order.estimated_delivery_date,
            NaiveDate::from_ymd_opt(2017, 1, 20)
        );
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let raw = RawExtract {
            orders: vec![json!({
                "customer_id": "c1",
                "order_status": "delivered",
                "order_purchase_timestamp": "2017-01-05 10:30:00",
            })],
            ..Default::default()
        };
        let err = normalize(&raw).unwrap_err();
        match err {
            StagingError::MissingColumn { entity, column } => {
                assert_eq!(entity, "orders");
                assert_eq!(column, "order_id");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_optional_string_becomes_none() {
        let raw = RawExtract {
            customers: vec![json!({
                "customer_id": "c1",
                "customer_unique_id": "u1",
                "customer_city": "   ",
                "customer_state": "SP",
            })],
            ..Default::default()
        };
        let tables = normalize(&raw).unwrap();
        assert_eq!(tables.customers[0].city, None);
    }

    #[test]
    fn test_missing_installments_defaults_to_one() {
        let raw = RawExtract {
            payments: vec![json!({
                "order_id": "o1",
                "payment_type": "credit_card",
                "payment_value": 42.5,
            })],
            ..Default::default()
        };
        let tables = normalize(&raw).unwrap();
        assert_eq!(tables.payments[0].installments, 1);
    }

    #[test]
    fn test_decimal_decoded_from_json_text() {
        let raw = RawExtract {
            order_items: vec![json!({
                "order_id": "o1",
                "order_item_id": 1,
                "product_id": "p1",
                "price": 19.9,
                "freight_value": "8.72",
            })],
            ..Default::default()
        };
        let tables = normalize(&raw).unwrap();
        let item = &tables.order_items[0];
        assert_eq!(item.price.to_string(), "19.9");
        assert_eq!(item.freight_value.to_string(), "8.72");
    }

    #[test]
    fn test_out_of_range_integer_is_malformed() {
        let raw = RawExtract {
            reviews: vec![json!({
                "order_id": "o1",
                "review_score": 4_294_967_296i64,
            })],
            ..Default::default()
        };
        assert!(matches!(
            normalize(&raw).unwrap_err(),
            StagingError::Malformed { column: "review_score", .. }
        ));
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let raw = RawExtract {
            orders: vec![json!({
                "order_id": "o1",
                "customer_id": "c1",
                "order_status": "refunded",
                "order_purchase_timestamp": "2017-01-05 10:30:00",
            })],
            ..Default::default()
        };
        assert!(matches!(
            normalize(&raw).unwrap_err(),
            StagingError::Malformed { column: "order_status", .. }
        ));
    }
}
