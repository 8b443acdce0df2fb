//! Monthly cohort retention
//!
//! Customers are grouped into cohorts by first purchase month, then every
//! order is mapped to a (cohort, month offset) pair. Only observed pairs
//! produce rows; months in which no cohort member returned are absent.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::info;

use crate::models::facts::{CohortRecord, YearMonth};
use crate::models::staging::OrderRecord;

/// Builds cohort retention from all orders with a resolvable customer
pub struct CohortRetentionBuilder;

impl CohortRetentionBuilder {
    pub fn build(
        orders: &[OrderRecord],
        customer_key_by_order_ref: &HashMap<String, i64>,
    ) -> Vec<CohortRecord> {
        // Pass 1: first purchase month per customer
        let mut first_month: HashMap<i64, YearMonth> = HashMap::new();
        for order in orders {
            let Some(&customer) = customer_key_by_order_ref.get(order.customer_id.as_str())
            else {
                continue;
            };
            let month = YearMonth::from_date(order.purchase_timestamp.date());
            first_month
                .entry(customer)
                .and_modify(|m| *m = (*m).min(month))
                .or_insert(month);
        }

        // Pass 2: distinct customers active per (cohort, offset)
        let mut active: BTreeMap<(YearMonth, u32), HashSet<i64>> = BTreeMap::new();
        let mut cohort_sizes: HashMap<YearMonth, HashSet<i64>> = HashMap::new();
        for order in orders {
            let Some(&customer) = customer_key_by_order_ref.get(order.customer_id.as_str())
            else {
                continue;
            };
            let cohort = first_month[&customer];
            let month = YearMonth::from_date(order.purchase_timestamp.date());
            let offset = month.months_since(cohort) as u32;
            active.entry((cohort, offset)).or_default().insert(customer);
            cohort_sizes.entry(cohort).or_default().insert(customer);
        }

        let rows: Vec<CohortRecord> = active
            .into_iter()
            .map(|((cohort, offset), customers)| {
                let cohort_size = cohort_sizes[&cohort].len() as u64;
                let returning_count = customers.len() as u64;
                CohortRecord {
                    cohort_period: cohort,
                    months_since_first_purchase: offset,
                    cohort_size,
                    returning_count,
                    retention_rate: returning_count as f64 / cohort_size as f64,
                }
            })
            .collect();

        info!(
            rows = rows.len(),
            cohorts = cohort_sizes.len(),
            "Cohort retention built"
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::staging::OrderStatus;
    use chrono::NaiveDate;

    fn order(id: &str, customer: &str, y: i32, m: u32) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            customer_id: customer.to_string(),
            status: OrderStatus::Delivered,
            purchase_timestamp: NaiveDate::from_ymd_opt(y, m, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            delivered_at: None,
            estimated_delivery_date: None,
        }
    }

    fn keys(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_observed_offsets_only() {
        // One customer: orders in January, February and April 2017
        let orders = vec![
            order("o1", "c1", 2017, 1),
            order("o2", "c1", 2017, 2),
            order("o3", "c1", 2017, 4),
        ];
        let rows = CohortRetentionBuilder::build(&orders, &keys(&[("c1", 1)]));

        let jan = YearMonth { year: 2017, month: 1 };
        let offsets: Vec<u32> = rows
            .iter()
            .map(|r| r.months_since_first_purchase)
            .collect();
        assert_eq!(offsets, vec![0, 1, 3]);
        assert!(rows.iter().all(|r| r.cohort_period == jan));
        assert!(rows.iter().all(|r| r.cohort_size == 1 && r.returning_count == 1));
    }

    #[test]
    fn test_offset_zero_rate_is_one() {
        let orders = vec![
            order("o1", "c1", 2017, 1),
            order("o2", "c2", 2017, 1),
            order("o3", "c1", 2017, 2),
        ];
        let rows =
            CohortRetentionBuilder::build(&orders, &keys(&[("c1", 1), ("c2", 2)]));

        assert_eq!(rows[0].months_since_first_purchase, 0);
        assert_eq!(rows[0].cohort_size, 2);
        assert_eq!(rows[0].retention_rate, 1.0);
        assert_eq!(rows[1].months_since_first_purchase, 1);
        assert_eq!(rows[1].returning_count, 1);
        assert_eq!(rows[1].retention_rate, 0.5);
    }

    #[test]
    fn test_repeat_orders_in_one_month_count_once() {
        let orders = vec![
            order("o1", "c1", 2017, 1),
            order("o2", "c1", 2017, 2),
            order("o3", "c1", 2017, 2),
        ];
        let rows = CohortRetentionBuilder::build(&orders, &keys(&[("c1", 1)]));
        let feb = rows
            .iter()
            .find(|r| r.months_since_first_purchase == 1)
            .unwrap();
        assert_eq!(feb.returning_count, 1);
    }

    #[test]
    fn test_cohorts_cross_year_boundaries() {
        let orders = vec![order("o1", "c1", 2017, 11), order("o2", "c1", 2018, 2)];
        let rows = CohortRetentionBuilder::build(&orders, &keys(&[("c1", 1)]));
        assert_eq!(rows[1].months_since_first_purchase, 3);
        assert_eq!(rows[1].cohort_period, YearMonth { year: 2017, month: 11 });
    }

    #[test]
    fn test_unresolvable_customers_are_ignored() {
        let orders = vec![order("o1", "c1", 2017, 1), order("o2", "ghost", 2017, 1)];
        let rows = CohortRetentionBuilder::build(&orders, &keys(&[("c1", 1)]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cohort_size, 1);
    }
}
