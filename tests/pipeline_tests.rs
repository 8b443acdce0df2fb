//! Integration tests for the full transform-and-load pipeline
//!
//! Exercises the complete workflow against the in-memory store: raw extract
//! → staging → dimensions → facts → load → quality report.

use std::fs::File;

use serde_json::json;
use tempfile::TempDir;

use warehouse_core::{
    CustomerSegment, MemoryStore, PipelineConfig, PipelineRunner, RawExtract, Table,
    WarehouseStore, YearMonth,
};

fn customer(id: &str, unique: &str, state: &str) -> serde_json::Value {
    json!({
        "customer_id": id,
        "customer_unique_id": unique,
        "customer_city": "some city",
        "customer_state": state,
    })
}

fn order(
    id: &str,
    customer: &str,
    status: &str,
    purchased: &str,
    delivered: Option<&str>,
    estimated: Option<&str>,
) -> serde_json::Value {
    json!({
        "order_id": id,
        "customer_id": customer,
        "order_status": status,
        "order_purchase_timestamp": purchased,
        "order_delivered_customer_date": delivered,
        "order_estimated_delivery_date": estimated,
    })
}

fn item(order_id: &str, product: &str, price: f64) -> serde_json::Value {
    json!({
        "order_id": order_id,
        "order_item_id": 1,
        "product_id": product,
        "price": price,
        "freight_value": 10.0,
    })
}

fn payment(order_id: &str, payment_type: &str, value: f64) -> serde_json::Value {
    json!({
        "order_id": order_id,
        "payment_type": payment_type,
        "payment_installments": 2,
        "payment_value": value,
    })
}

fn product(id: &str, category: &str) -> serde_json::Value {
    json!({
        "product_id": id,
        "product_category_name": category,
        "product_weight_g": 400,
        "product_length_cm": 20,
        "product_height_cm": 10,
        "product_width_cm": 10,
        "product_photos_qty": 1,
    })
}

/// Three customers: u1 orders in January, February and April 2017; u2 orders
/// once in January plus one canceled order; u3 never orders. One extra order
/// references a customer that does not exist.
fn raw_extract() -> RawExtract {
    RawExtract {
        customers: vec![
            customer("c1", "u1", "SP"),
            customer("c2", "u2", "RS"),
            customer("c3", "u3", "BA"),
        ],
        orders: vec![
            order(
                "o1",
                "c1",
                "delivered",
                "2017-01-02 10:00:00",
                Some("2017-01-10 12:00:00"),
                Some("2017-01-05 00:00:00"),
            ),
            order(
                "o2",
                "c1",
                "delivered",
                "2017-02-14 09:00:00",
                Some("2017-02-20 15:00:00"),
                Some("2017-02-25 00:00:00"),
            ),
            order(
                "o3",
                "c1",
                "delivered",
                "2017-04-03 18:30:00",
                Some("2017-04-10 11:00:00"),
                Some("2017-04-15 00:00:00"),
            ),
            order(
                "o4",
                "c2",
                "delivered",
                "2017-01-20 08:00:00",
                Some("2017-01-28 19:00:00"),
                Some("2017-02-01 00:00:00"),
            ),
            order("o5", "c2", "canceled", "2017-01-25 12:00:00", None, None),
            order(
                "o6",
                "ghost",
                "delivered",
                "2017-03-01 10:00:00",
                Some("2017-03-08 10:00:00"),
                None,
            ),
        ],
        order_items: vec![
            item("o1", "p1", 120.0),
            item("o2", "p1", 80.0),
            item("o3", "p2", 45.5),
            item("o4", "p2", 200.0),
            item("o6", "p1", 30.0),
        ],
        payments: vec![
            payment("o1", "credit_card", 130.0),
            payment("o2", "boleto", 90.0),
            payment("o3", "credit_card", 55.5),
            payment("o4", "credit_card", 210.0),
            payment("o6", "voucher", 40.0),
        ],
        reviews: vec![json!({ "order_id": "o1", "review_score": 4 })],
        products: vec![product("p1", "telefonia"), product("p2", "esporte_lazer")],
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::new().with_name("integration")
}

#[test]
fn test_full_run_loads_star_schema() {
    let runner = PipelineRunner::new(config()).unwrap();
    let mut store = MemoryStore::new();
    let report = runner.run(&raw_extract(), &mut store).unwrap();

    assert_eq!(report.staged.customers, 3);
    assert_eq!(report.staged.orders, 6);

    // o5 canceled, o6 orphaned, the rest become facts
    assert_eq!(report.aggregation.facts_built, 4);
    assert_eq!(report.aggregation.dropped_canceled, 1);
    assert_eq!(report.aggregation.orphaned_customer, 1);
    assert_eq!(report.load.succeeded, 4);
    assert_eq!(report.load.skipped_orphan, 0);

    assert_eq!(store.row_count(Table::DimCustomers), 3);
    assert_eq!(store.row_count(Table::DimProducts), 2);
    assert_eq!(store.row_count(Table::DimPaymentTypes), 3);
    assert_eq!(store.row_count(Table::FactOrders), 4);
    assert!(store.row_count(Table::DimDates) > 1000);

    // Item rows of surviving orders are fully accounted for
    let item_total: u32 = store.fact_rows().iter().map(|f| f.item_count).sum();
    assert_eq!(item_total, 4);

    assert!(report.quality.passed(), "failures: {:?}", report.quality.failures());
    assert_eq!(report.stages.len(), 6);
}

#[test]
fn test_customer_segments_after_full_aggregation() {
    let staging = warehouse_core::normalize(&raw_extract()).unwrap();
    let dims =
        warehouse_core::build_dimensions(&staging, &config().dimensions).unwrap();

    let segment_of = |unique: &str| {
        dims.customers
            .iter()
            .find(|c| c.customer_unique_id == unique)
            .map(|c| c.segment)
            .unwrap()
    };
    // Three orders, two orders (one canceled still counts as activity), none
    assert_eq!(segment_of("u1"), CustomerSegment::Returning);
    assert_eq!(segment_of("u2"), CustomerSegment::Returning);
    assert_eq!(segment_of("u3"), CustomerSegment::Inactive);
}

#[test]
fn test_late_delivery_is_flagged() {
    let runner = PipelineRunner::new(config()).unwrap();
    let mut store = MemoryStore::new();
    runner.run(&raw_extract(), &mut store).unwrap();

    let facts = store.fact_rows();
    let o1 = facts.iter().find(|f| f.order_id == "o1").unwrap();
    // Delivered January 10th against an estimate of the 5th
    assert_eq!(o1.delivery_days, Some(8));
    assert_eq!(o1.delivery_delay_days, Some(5));
    assert!(o1.is_late);
    assert_eq!(o1.review_score, Some(4));

    let o2 = facts.iter().find(|f| f.order_id == "o2").unwrap();
    assert_eq!(o2.delivery_delay_days, Some(-5));
    assert!(!o2.is_late);
    assert!(!o2.has_review);
}

#[test]
fn test_cohort_offsets_match_order_months() {
    let runner = PipelineRunner::new(config()).unwrap();
    let mut store = MemoryStore::new();
    let report = runner.run(&raw_extract(), &mut store).unwrap();

    // Both active customers first purchased in January 2017
    let jan = YearMonth { year: 2017, month: 1 };
    assert_eq!(report.cohort_rows, 3);
    assert_eq!(store.row_count(Table::FactCohortRetention), 3);

    let staging = warehouse_core::normalize(&raw_extract()).unwrap();
    let dims =
        warehouse_core::build_dimensions(&staging, &config().dimensions).unwrap();
    let rows = warehouse_core::CohortRetentionBuilder::build(
        &staging.orders,
        &dims.customer_key_by_order_ref,
    );

    assert!(rows.iter().all(|r| r.cohort_period == jan));
    let offsets: Vec<u32> = rows.iter().map(|r| r.months_since_first_purchase).collect();
    assert_eq!(offsets, vec![0, 1, 3]);
    assert_eq!(rows[0].cohort_size, 2);
    assert_eq!(rows[0].retention_rate, 1.0);
    // Only u1 returned in February and April
    assert_eq!(rows[1].returning_count, 1);
    assert_eq!(rows[1].retention_rate, 0.5);
    assert_eq!(rows[2].retention_rate, 0.5);
}

#[test]
fn test_reruns_are_deterministic() {
    let first = {
        let runner = PipelineRunner::new(config()).unwrap();
        let mut store = MemoryStore::new();
        let report = runner.run(&raw_extract(), &mut store).unwrap();
        (report, store.fact_rows())
    };
    let second = {
        let runner = PipelineRunner::new(config()).unwrap();
        let mut store = MemoryStore::new();
        let report = runner.run(&raw_extract(), &mut store).unwrap();
        (report, store.fact_rows())
    };

    assert_eq!(first.1, second.1);
    assert_eq!(first.0.aggregation, second.0.aggregation);
    assert_eq!(first.0.load, second.0.load);
    assert_eq!(first.0.config_hash, second.0.config_hash);
    // Run identity is the only thing that differs
    assert_ne!(first.0.run_id, second.0.run_id);
}

#[test]
fn test_missing_column_fails_the_run() {
    let mut raw = raw_extract();
    raw.orders.push(json!({
        "customer_id": "c1",
        "order_status": "delivered",
        "order_purchase_timestamp": "2017-05-01 10:00:00",
    }));
    let runner = PipelineRunner::new(config()).unwrap();
    let mut store = MemoryStore::new();
    let err = runner.run(&raw, &mut store).unwrap_err();
    assert!(matches!(err, warehouse_core::PipelineError::Staging(_)));
    // Nothing was loaded
    assert_eq!(store.row_count(Table::FactOrders), 0);
}

#[test]
fn test_report_round_trips_through_json() {
    let runner = PipelineRunner::new(config()).unwrap();
    let mut store = MemoryStore::new();
    let report = runner.run(&raw_extract(), &mut store).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    serde_json::to_writer_pretty(File::create(&path).unwrap(), &report).unwrap();

    let loaded: warehouse_core::PipelineReport =
        serde_json::from_reader(File::open(&path).unwrap()).unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.load, report.load);
    assert_eq!(loaded.staged, report.staged);
}
