//! Order-grain fact aggregation
//!
//! Regrains line items, payments and reviews to one row per order, resolves
//! every dimension foreign key, and annotates quality flags. Orders that
//! cannot be resolved are counted and skipped, never silently invented.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::FactError;
use crate::dimensions::Dimensions;
use crate::models::dimensions::DateDimension;
use crate::models::facts::FactRecord;
use crate::models::staging::{OrderItemRecord, OrderStatus, PaymentRecord};
use crate::staging::StagingTables;

/// Which line item names the order's product foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryProductPolicy {
    /// Lowest line number wins
    #[default]
    FirstItem,
    /// Highest item price wins; ties keep the earlier line
    MostExpensive,
}

/// Counters describing what the aggregation kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationStats {
    pub facts_built: u64,
    /// Orders whose customer reference resolves to no dimension row
    pub orphaned_customer: u64,
    /// Orders with no line items at all
    pub orphaned_no_items: u64,
    /// Orders whose primary product resolves to no dimension row
    pub orphaned_product: u64,
    /// Canceled or unavailable orders excluded from the fact grain
    pub dropped_canceled: u64,
    /// Undelivered, non-shipped orders excluded from the fact grain
    pub dropped_undelivered: u64,
    /// Delivered-before-purchased rows, dropped as corrupt
    pub dropped_negative_delivery: u64,
    pub outlier_flagged: u64,
    pub needs_review_flagged: u64,
}

impl AggregationStats {
    /// Total orders excluded for any reason
    pub fn dropped_total(&self) -> u64 {
        self.orphaned_customer
            + self.orphaned_no_items
            + self.orphaned_product
            + self.dropped_canceled
            + self.dropped_undelivered
            + self.dropped_negative_delivery
    }
}

/// Builds the order-grain fact table against already-built dimensions
pub struct FactOrdersBuilder<'a> {
    pub dimensions: &'a Dimensions,
    /// Item-price percentile above which an order is flagged as outlier
    pub outlier_percentile: f64,
    /// Delivery slower than this many days flags the order for review
    pub delivery_review_threshold_days: i64,
    pub primary_product: PrimaryProductPolicy,
}

#[derive(Debug)]
struct ItemAggregate<'a> {
    item_count: u32,
    subtotal: Decimal,
    freight_total: Decimal,
    max_price: Decimal,
    primary: &'a OrderItemRecord,
}

#[derive(Debug)]
struct PaymentAggregate<'a> {
    total: Decimal,
    installments: i32,
    top_type: &'a str,
    top_value: Decimal,
}

impl FactOrdersBuilder<'_> {
    pub fn build(
        &self,
        staging: &StagingTables,
    ) -> Result<(Vec<FactRecord>, AggregationStats), FactError> {
        let items = self.aggregate_items(&staging.order_items);
        let payments = aggregate_payments(&staging.payments);
        let outlier_threshold = outlier_threshold(&staging.order_items, self.outlier_percentile);

        // Last review wins when an order was reviewed more than once
        let mut reviews: HashMap<&str, i32> = HashMap::new();
        for review in &staging.reviews {
            reviews.insert(review.order_id.as_str(), review.score);
        }

        let mut stats = AggregationStats::default();
        let mut seen_orders: HashSet<&str> = HashSet::new();
        let mut facts = Vec::new();

        for order in &staging.orders {
            if !seen_orders.insert(order.order_id.as_str()) {
                return Err(FactError::DuplicateKey {
                    order_id: order.order_id.clone(),
                });
            }

            if matches!(order.status, OrderStatus::Canceled | OrderStatus::Unavailable) {
                stats.dropped_canceled += 1;
                continue;
            }

            let Some(&customer_key) = self
                .dimensions
                .customer_key_by_order_ref
                .get(order.customer_id.as_str())
            else {
                stats.orphaned_customer += 1;
                warn!(order_id = %order.order_id, customer_id = %order.customer_id,
                    "Skipping order with unknown customer");
                continue;
            };

            let Some(agg) = items.get(order.order_id.as_str()) else {
                stats.orphaned_no_items += 1;
                warn!(order_id = %order.order_id, "Skipping order with no line items");
                continue;
            };

            let Some(&product_key) = self
                .dimensions
                .product_key_by_id
                .get(agg.primary.product_id.as_str())
            else {
                stats.orphaned_product += 1;
                warn!(order_id = %order.order_id, product_id = %agg.primary.product_id,
                    "Skipping order with unknown product");
                continue;
            };

            // Delivery metrics; shipped orders stay with null metrics
            let (delivery_date_key, delivery_days, delivery_delay_days, in_transit) =
                match order.delivered_at {
                    Some(delivered) => {
                        let days =
                            (delivered.date() - order.purchase_timestamp.date()).num_days();
                        if days < 0 {
                            stats.dropped_negative_delivery += 1;
                            warn!(order_id = %order.order_id, delivery_days = days,
                                "Skipping order delivered before purchase");
                            continue;
                        }
                        let delay = order
                            .estimated_delivery_date
                            .map(|estimated| (delivered.date() - estimated).num_days());
                        (
                            Some(DateDimension::key_for(delivered.date())),
                            Some(days),
                            delay,
                            false,
                        )
                    }
                    None if order.status == OrderStatus::Shipped => (None, None, None, true),
                    None => {
                        stats.dropped_undelivered += 1;
                        continue;
                    }
                };

            let payment = payments.get(order.order_id.as_str());
            let payment_type_key = payment.and_then(|p| {
                self.dimensions.payment_key_by_type.get(p.top_type).copied()
            });

            let is_outlier = outlier_threshold.is_some_and(|t| agg.max_price > t);
            if is_outlier {
                stats.outlier_flagged += 1;
            }
            let needs_review =
                delivery_days.is_some_and(|d| d > self.delivery_review_threshold_days);
            if needs_review {
                stats.needs_review_flagged += 1;
            }
            let review_score = reviews.get(order.order_id.as_str()).copied();

            facts.push(FactRecord {
                customer_key,
                product_key,
                order_date_key: DateDimension::key_for(order.purchase_timestamp.date()),
                delivery_date_key,
                payment_type_key,
                order_id: order.order_id.clone(),
                status: order.status,
                item_count: agg.item_count,
                subtotal: agg.subtotal,
                freight_total: agg.freight_total,
                total_value: agg.subtotal + agg.freight_total,
                payment_value: payment.map_or(Decimal::ZERO, |p| p.total),
                installments: payment.map_or(1, |p| p.installments),
                delivery_days,
                delivery_delay_days,
                is_late: delivery_delay_days.is_some_and(|d| d > 0),
                review_score,
                has_review: review_score.is_some(),
                is_outlier,
                needs_review,
                in_transit,
                purchase_timestamp: order.purchase_timestamp,
            });
        }

        stats.facts_built = facts.len() as u64;
        info!(
            facts = stats.facts_built,
            dropped = stats.dropped_total(),
            outliers = stats.outlier_flagged,
            "Fact aggregation complete"
        );
        Ok((facts, stats))
    }

    fn aggregate_items<'a>(
        &self,
        items: &'a [OrderItemRecord],
    ) -> HashMap<&'a str, ItemAggregate<'a>> {
        let mut by_order: HashMap<&str, ItemAggregate<'_>> = HashMap::new();
        for item in items {
            by_order
                .entry(item.order_id.as_str())
                .and_modify(|agg| {
                    agg.item_count += 1;
                    agg.subtotal += item.price;
                    agg.freight_total += item.freight_value;
                    agg.max_price = agg.max_price.max(item.price);
                    let replaces = match self.primary_product {
                        PrimaryProductPolicy::FirstItem => {
                            item.order_item_id < agg.primary.order_item_id
                        }
                        PrimaryProductPolicy::MostExpensive => item.price > agg.primary.price,
                    };
                    if replaces {
                        agg.primary = item;
                    }
                })
                .or_insert_with(|| ItemAggregate {
                    item_count: 1,
                    subtotal: item.price,
                    freight_total: item.freight_value,
                    max_price: item.price,
                    primary: item,
                });
        }
        by_order
    }
}

fn aggregate_payments(payments: &[PaymentRecord]) -> HashMap<&str, PaymentAggregate<'_>> {
    let mut by_order: HashMap<&str, PaymentAggregate<'_>> = HashMap::new();
    for payment in payments {
        by_order
            .entry(payment.order_id.as_str())
            .and_modify(|agg| {
                agg.total += payment.value;
                agg.installments = agg.installments.max(payment.installments);
                // Dominant type is the highest-value row; ties keep the earlier one
                if payment.value > agg.top_value {
                    agg.top_type = payment.payment_type.as_str();
                    agg.top_value = payment.value;
                }
            })
            .or_insert_with(|| PaymentAggregate {
                total: payment.value,
                installments: payment.installments,
                top_type: payment.payment_type.as_str(),
                top_value: payment.value,
            });
    }
    by_order
}

/// Nearest-rank percentile of item prices; `None` when there are no items
fn outlier_threshold(items: &[OrderItemRecord], percentile: f64) -> Option<Decimal> {
    if items.is_empty() {
        return None;
    }
    let mut prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();
    prices.sort_unstable();
    let rank = (percentile * prices.len() as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(prices.len() - 1);
    Some(prices[idx])
}
