//! Dimension builders: staged tables → star-schema dimensions
//!
//! Each builder is deterministic and allocates its own surrogate keys, so a
//! rerun over the same extract produces byte-identical dimensions.

mod customers;
mod date;
mod error;
mod keygen;
mod payment_type;
mod products;
pub mod rules;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info_span;

pub use customers::CustomerDimensionBuilder;
pub use date::DateDimensionBuilder;
pub use error::DimensionError;
pub use keygen::KeySequence;
pub use payment_type::PaymentTypeDimensionBuilder;
pub use products::ProductDimensionBuilder;
pub use rules::{ClvParams, SegmentationRules};

use crate::models::dimensions::{
    CustomerDimension, DateDimension, PaymentTypeDimension, ProductDimension, Region,
};
use crate::staging::StagingTables;

/// Everything the dimension builders need from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSettings {
    /// First day of the generated calendar
    pub date_start: NaiveDate,
    /// Last day of the generated calendar, inclusive
    pub date_end: NaiveDate,
    pub segmentation: SegmentationRules,
    pub clv: ClvParams,
    pub region_table: BTreeMap<String, Region>,
    pub category_groups: BTreeMap<String, String>,
    pub payment_categories: BTreeMap<String, String>,
    pub holidays: Vec<NaiveDate>,
}

impl Default for DimensionSettings {
    fn default() -> Self {
        Self {
            date_start: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
            segmentation: SegmentationRules::default(),
            clv: ClvParams::default(),
            region_table: rules::default_region_table(),
            category_groups: rules::default_category_groups(),
            payment_categories: rules::default_payment_categories(),
            holidays: rules::default_holidays(),
        }
    }
}

/// All built dimensions plus the lookup maps fact building needs
#[derive(Debug)]
pub struct Dimensions {
    pub customers: Vec<CustomerDimension>,
    pub products: Vec<ProductDimension>,
    pub payment_types: Vec<PaymentTypeDimension>,
    pub dates: Vec<DateDimension>,
    /// Per-order customer reference → customer surrogate key
    pub customer_key_by_order_ref: HashMap<String, i64>,
    pub product_key_by_id: HashMap<String, i64>,
    pub payment_key_by_type: HashMap<String, i64>,
    /// Keys of the generated calendar, for date FK validation
    pub date_keys: HashSet<i32>,
}

/// Build all four dimensions and their lookup maps
pub fn build_dimensions(
    staging: &StagingTables,
    settings: &DimensionSettings,
) -> Result<Dimensions, DimensionError> {
    let span = info_span!("build_dimensions");
    let _guard = span.enter();

    let customers = CustomerDimensionBuilder {
        regions: &settings.region_table,
        rules: &settings.segmentation,
        clv: &settings.clv,
    }
    .build(&staging.customers, &staging.orders, &staging.order_items)?;

    let products = ProductDimensionBuilder {
        category_groups: &settings.category_groups,
    }
    .build(&staging.products)?;

    let payment_types = PaymentTypeDimensionBuilder {
        categories: &settings.payment_categories,
    }
    .build(&staging.payments)?;

    let dates = DateDimensionBuilder {
        start: settings.date_start,
        end: settings.date_end,
        holidays: &settings.holidays,
    }
    .build()?;

    // Fact rows reference orders by the per-order customer id, so the
    // customer map is keyed on that reference, not the business key
    let key_by_unique: HashMap<&str, i64> = customers
        .iter()
        .map(|c| (c.customer_unique_id.as_str(), c.customer_key))
        .collect();
    let mut customer_key_by_order_ref = HashMap::new();
    for record in &staging.customers {
        if let Some(&key) = key_by_unique.get(record.customer_unique_id.as_str()) {
            customer_key_by_order_ref
                .entry(record.customer_id.clone())
                .or_insert(key);
        }
    }

    let product_key_by_id = products
        .iter()
        .map(|p| (p.product_id.clone(), p.product_key))
        .collect();
    let payment_key_by_type = payment_types
        .iter()
        .map(|p| (p.payment_type.clone(), p.payment_type_key))
        .collect();
    let date_keys = dates.iter().map(|d| d.date_key).collect();

    Ok(Dimensions {
        customers,
        products,
        payment_types,
        dates,
        customer_key_by_order_ref,
        product_key_by_id,
        payment_key_by_type,
        date_keys,
    })
}
