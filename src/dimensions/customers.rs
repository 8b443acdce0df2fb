//! Customer dimension builder
//!
//! Two-pass algorithm: orders are fully aggregated per business key before
//! any segment is assigned, because the segment rules depend on totals that
//! only exist after the aggregation pass.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::error::DimensionError;
use super::keygen::KeySequence;
use super::rules::{ClvParams, SegmentationRules};
use crate::models::dimensions::{CustomerDimension, CustomerSegment, Region};
use crate::models::staging::{CustomerRecord, OrderItemRecord, OrderRecord};

/// Builds the customer dimension from staged customers, orders and items
pub struct CustomerDimensionBuilder<'a> {
    pub regions: &'a BTreeMap<String, Region>,
    pub rules: &'a SegmentationRules,
    pub clv: &'a ClvParams,
}

#[derive(Debug, Default)]
struct CustomerAggregate {
    total_orders: u32,
    delivered_orders: u32,
    total_spent: Decimal,
    first_order_at: Option<NaiveDateTime>,
    last_order_at: Option<NaiveDateTime>,
}

impl CustomerAggregate {
    fn observe(&mut self, order: &OrderRecord, revenue: Decimal) {
        self.total_orders += 1;
        if order.status == crate::models::staging::OrderStatus::Delivered {
            self.delivered_orders += 1;
        }
        self.total_spent += revenue;
        let ts = order.purchase_timestamp;
        self.first_order_at = Some(match self.first_order_at {
            Some(existing) if existing <= ts => existing,
            _ => ts,
        });
        self.last_order_at = Some(match self.last_order_at {
            Some(existing) if existing >= ts => existing,
            _ => ts,
        });
    }
}

impl CustomerDimensionBuilder<'_> {
    pub fn build(
        &self,
        customers: &[CustomerRecord],
        orders: &[OrderRecord],
        items: &[OrderItemRecord],
    ) -> Result<Vec<CustomerDimension>, DimensionError> {
        // Pass 1: revenue per order from line items
        let mut order_revenue: HashMap<&str, Decimal> = HashMap::new();
        for item in items {
            *order_revenue.entry(item.order_id.as_str()).or_default() += item.item_total();
        }

        // Per-order customer reference → business key; first row wins
        let mut business_key_of: HashMap<&str, &str> = HashMap::new();
        for customer in customers {
            business_key_of
                .entry(customer.customer_id.as_str())
                .or_insert(customer.customer_unique_id.as_str());
        }

        // Pass 2: aggregate all orders per business key
        let mut aggregates: HashMap<&str, CustomerAggregate> = HashMap::new();
        for order in orders {
            let Some(&key) = business_key_of.get(order.customer_id.as_str()) else {
                // Orders without a customer row are counted as orphans later,
                // during fact aggregation
                continue;
            };
            let revenue = order_revenue
                .get(order.order_id.as_str())
                .copied()
                .unwrap_or(Decimal::ZERO);
            aggregates.entry(key).or_default().observe(order, revenue);
        }

        // Pass 3: one row per business key, first-seen order; classify
        let mut keys = KeySequence::new();
        let mut rows = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for customer in customers {
            let business_key = customer.customer_unique_id.as_str();
            if !seen.insert(business_key) {
                continue;
            }

            let region = *self.regions.get(&customer.state).ok_or_else(|| {
                DimensionError::Classification {
                    table: "region",
                    value: customer.state.clone(),
                }
            })?;

            let empty = CustomerAggregate::default();
            let agg = aggregates.get(business_key).unwrap_or(&empty);
            let (avg_order_value, lifetime_value, days_as_customer) = self.project_value(agg);
            // Segments classify on what the customer actually spent; the CLV
            // projection is a reported attribute, not a rule input, since it
            // annualizes short tenures into implausible figures
            let segment = self.classify(agg.total_orders, agg.total_spent);

            rows.push(CustomerDimension {
                customer_key: keys.next_key(),
                customer_unique_id: business_key.to_string(),
                city: customer.city.clone(),
                state: customer.state.clone(),
                region,
                segment,
                first_order_at: agg.first_order_at,
                last_order_at: agg.last_order_at,
                total_orders: agg.total_orders,
                delivered_orders: agg.delivered_orders,
                total_spent: agg.total_spent,
                avg_order_value,
                lifetime_value,
                days_as_customer,
            });
        }

        info!(rows = rows.len(), "Customer dimension built");
        for segment in [
            CustomerSegment::New,
            CustomerSegment::Returning,
            CustomerSegment::Vip,
            CustomerSegment::Inactive,
        ] {
            let count = rows.iter().filter(|r| r.segment == segment).count();
            debug!(segment = %segment, count, "Segment distribution");
        }

        Ok(rows)
    }

    /// Average order value, projected lifetime value and tenure days
    fn project_value(&self, agg: &CustomerAggregate) -> (Decimal, Decimal, i64) {
        if agg.total_orders == 0 {
            return (Decimal::ZERO, Decimal::ZERO, 0);
        }
        let avg = (agg.total_spent / Decimal::from(agg.total_orders)).round_dp(2);

        let days = match (agg.first_order_at, agg.last_order_at) {
            (Some(first), Some(last)) => (last.date() - first.date()).num_days().max(1),
            _ => 1,
        };

        // CLV = avg order value × annualized purchase frequency × lifespan years
        let frequency_annual =
            Decimal::from(agg.total_orders) * Decimal::from(365) / Decimal::from(days);
        let lifespan_years =
            Decimal::from(self.clv.estimated_lifespan_days) / Decimal::from(365);
        let clv = (avg * frequency_annual * lifespan_years).round_dp(2);

        (avg, clv, days)
    }

    fn classify(&self, total_orders: u32, total_spent: Decimal) -> CustomerSegment {
        if total_orders == 0 {
            CustomerSegment::Inactive
        } else if total_orders >= self.rules.vip_min_orders
            || total_spent > self.rules.vip_min_spend
        {
            CustomerSegment::Vip
        } else if total_orders == 1 {
            CustomerSegment::New
        } else {
            CustomerSegment::Returning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::rules::default_region_table;
    use crate::models::staging::OrderStatus;
    use chrono::NaiveDate;

    fn customer(id: &str, unique: &str, state: &str) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            customer_unique_id: unique.to_string(),
            city: None,
            state: state.to_string(),
        }
    }

    fn order(order_id: &str, customer_id: &str, day: u32) -> OrderRecord {
        OrderRecord {
            order_id: order_id.to_string(),
            customer_id: customer_id.to_string(),
            status: OrderStatus::Delivered,
            purchase_timestamp: NaiveDate::from_ymd_opt(2017, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            delivered_at: None,
            estimated_delivery_date: None,
        }
    }

    fn item(order_id: &str, price: i64) -> OrderItemRecord {
        OrderItemRecord {
            order_id: order_id.to_string(),
            order_item_id: 1,
            product_id: "p1".to_string(),
            seller_id: None,
            price: Decimal::from(price),
            freight_value: Decimal::ZERO,
        }
    }

    fn builder<'a>(
        regions: &'a BTreeMap<String, Region>,
        rules: &'a SegmentationRules,
        clv: &'a ClvParams,
    ) -> CustomerDimensionBuilder<'a> {
        CustomerDimensionBuilder { regions, rules, clv }
    }

    #[test]
    fn test_single_order_customer_is_new() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let rows = b
            .build(
                &[customer("c1", "u1", "SP")],
                &[order("o1", "c1", 5)],
                &[item("o1", 50)],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].segment, CustomerSegment::New);
        assert_eq!(rows[0].total_orders, 1);
        assert_eq!(rows[0].region, Region::Southeast);
    }

    #[test]
    fn test_six_orders_is_vip_regardless_of_value() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let orders: Vec<_> = (1..=6).map(|d| order(&format!("o{d}"), "c1", d)).collect();
        let items: Vec<_> = (1..=6).map(|d| item(&format!("o{d}"), 1)).collect();
        let rows = b.build(&[customer("c1", "u1", "SP")], &orders, &items).unwrap();
        assert_eq!(rows[0].segment, CustomerSegment::Vip);
    }

    #[test]
    fn test_projected_value_does_not_inflate_segment() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        // One ordinary order: annualizing a 1-day tenure projects a large
        // CLV, but the segment follows actual spend
        let rows = b
            .build(
                &[customer("c1", "u1", "SP")],
                &[order("o1", "c1", 5)],
                &[item("o1", 50)],
            )
            .unwrap();
        assert_eq!(rows[0].lifetime_value, Decimal::from(36_500));
        assert_eq!(rows[0].segment, CustomerSegment::New);

        // Two mid-value orders stay Returning
        let rows = b
            .build(
                &[customer("c1", "u1", "SP")],
                &[order("o1", "c1", 5), order("o2", "c1", 20)],
                &[item("o1", 110), item("o2", 100)],
            )
            .unwrap();
        assert_eq!(rows[0].segment, CustomerSegment::Returning);
    }

    #[test]
    fn test_high_spend_customer_is_vip_by_spend() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let rows = b
            .build(
                &[customer("c1", "u1", "SP")],
                &[order("o1", "c1", 5), order("o2", "c1", 20)],
                &[item("o1", 4000), item("o2", 1500)],
            )
            .unwrap();
        assert_eq!(rows[0].total_spent, Decimal::from(5500));
        assert_eq!(rows[0].segment, CustomerSegment::Vip);
    }

    #[test]
    fn test_duplicate_business_keys_aggregate_into_one_row() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        // Two per-order customer ids, one person
        let rows = b
            .build(
                &[customer("c1", "u1", "SP"), customer("c2", "u1", "SP")],
                &[order("o1", "c1", 5), order("o2", "c2", 20)],
                &[item("o1", 30), item("o2", 40)],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_orders, 2);
        assert_eq!(rows[0].total_spent, Decimal::from(70));
        assert_eq!(rows[0].segment, CustomerSegment::Returning);
        assert_eq!(rows[0].days_as_customer, 15);
    }

    #[test]
    fn test_unmapped_state_fails_classification() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let err = b
            .build(&[customer("c1", "u1", "ZZ")], &[], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            DimensionError::Classification { table: "region", .. }
        ));
    }

    #[test]
    fn test_customer_without_orders_is_inactive() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let rows = b.build(&[customer("c1", "u1", "RS")], &[], &[]).unwrap();
        assert_eq!(rows[0].segment, CustomerSegment::Inactive);
        assert_eq!(rows[0].lifetime_value, Decimal::ZERO);
    }

    #[test]
    fn test_surrogate_keys_follow_first_seen_order() {
        let regions = default_region_table();
        let rules = SegmentationRules::default();
        let clv = ClvParams::default();
        let b = builder(&regions, &rules, &clv);

        let rows = b
            .build(
                &[
                    customer("c1", "u-b", "SP"),
                    customer("c2", "u-a", "SP"),
                    customer("c3", "u-b", "SP"),
                ],
                &[],
                &[],
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_unique_id, "u-b");
        assert_eq!(rows[0].customer_key, 1);
        assert_eq!(rows[1].customer_unique_id, "u-a");
        assert_eq!(rows[1].customer_key, 2);
    }
}
