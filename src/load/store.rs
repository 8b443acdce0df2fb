//! Warehouse store abstraction and the in-memory reference implementation

use std::collections::HashSet;

use thiserror::Error;

use crate::models::dimensions::{
    CustomerDimension, DateDimension, PaymentTypeDimension, ProductDimension,
};
use crate::models::facts::{CohortRecord, FactRecord};

/// Target tables of the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    DimCustomers,
    DimProducts,
    DimPaymentTypes,
    DimDates,
    FactOrders,
    FactCohortRetention,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Table::DimCustomers => "dim_customers",
            Table::DimProducts => "dim_products",
            Table::DimPaymentTypes => "dim_payment_types",
            Table::DimDates => "dim_dates",
            Table::FactOrders => "fact_orders",
            Table::FactCohortRetention => "fact_cohort_retention",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by a warehouse store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness or key constraint rejected the batch
    #[error("constraint violation on {table}: {detail}")]
    Constraint { table: Table, detail: String },

    /// The store could not accept the batch at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Destination of the load stage
///
/// Batches are atomic per call: either every row in the slice lands or none
/// does. Implementations enforce their own key constraints.
pub trait WarehouseStore {
    fn insert_customers(&mut self, rows: &[CustomerDimension]) -> Result<(), StoreError>;
    fn insert_products(&mut self, rows: &[ProductDimension]) -> Result<(), StoreError>;
    fn insert_payment_types(&mut self, rows: &[PaymentTypeDimension]) -> Result<(), StoreError>;
    fn insert_dates(&mut self, rows: &[DateDimension]) -> Result<(), StoreError>;
    fn insert_facts(&mut self, rows: &[FactRecord]) -> Result<(), StoreError>;
    fn insert_cohorts(&mut self, rows: &[CohortRecord]) -> Result<(), StoreError>;

    fn row_count(&self, table: Table) -> u64;
    /// Loaded fact rows, for post-load quality checks
    fn fact_rows(&self) -> Vec<FactRecord>;
    /// Loaded surrogate keys of a dimension table; empty for fact tables
    fn dimension_keys(&self, table: Table) -> HashSet<i64>;
    /// Loaded business keys of a dimension table, duplicates preserved;
    /// empty for generated and fact tables
    fn dimension_business_keys(&self, table: Table) -> Vec<String>;
    /// Loaded calendar keys
    fn date_keys(&self) -> HashSet<i32>;
}

/// In-memory store with the same constraint behavior a warehouse would have
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: Vec<CustomerDimension>,
    products: Vec<ProductDimension>,
    payment_types: Vec<PaymentTypeDimension>,
    dates: Vec<DateDimension>,
    facts: Vec<FactRecord>,
    cohorts: Vec<CohortRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique<T>(
        existing: &[T],
        incoming: &[T],
        table: Table,
        key: impl Fn(&T) -> String,
    ) -> Result<(), StoreError> {
        let mut seen: HashSet<String> = existing.iter().map(&key).collect();
        for row in incoming {
            if !seen.insert(key(row)) {
                return Err(StoreError::Constraint {
                    table,
                    detail: format!("duplicate key '{}'", key(row)),
                });
            }
        }
        Ok(())
    }
}

impl WarehouseStore for MemoryStore {
    fn insert_customers(&mut self, rows: &[CustomerDimension]) -> Result<(), StoreError> {
        Self::check_unique(&self.customers, rows, Table::DimCustomers, |r| {
            r.customer_key.to_string()
        })?;
        self.customers.extend_from_slice(rows);
        Ok(())
    }

    fn insert_products(&mut self, rows: &[ProductDimension]) -> Result<(), StoreError> {
        Self::check_unique(&self.products, rows, Table::DimProducts, |r| {
            r.product_key.to_string()
        })?;
        self.products.extend_from_slice(rows);
        Ok(())
    }

    fn insert_payment_types(&mut self, rows: &[PaymentTypeDimension]) -> Result<(), StoreError> {
        Self::check_unique(&self.payment_types, rows, Table::DimPaymentTypes, |r| {
            r.payment_type_key.to_string()
        })?;
        self.payment_types.extend_from_slice(rows);
        Ok(())
    }

    fn insert_dates(&mut self, rows: &[DateDimension]) -> Result<(), StoreError> {
        Self::check_unique(&self.dates, rows, Table::DimDates, |r| r.date_key.to_string())?;
        self.dates.extend_from_slice(rows);
        Ok(())
    }

    fn insert_facts(&mut self, rows: &[FactRecord]) -> Result<(), StoreError> {
        Self::check_unique(&self.facts, rows, Table::FactOrders, |r| r.order_id.clone())?;
        self.facts.extend_from_slice(rows);
        Ok(())
    }

    fn insert_cohorts(&mut self, rows: &[CohortRecord]) -> Result<(), StoreError> {
        Self::check_unique(&self.cohorts, rows, Table::FactCohortRetention, |r| {
            format!("{}/{}", r.cohort_period, r.months_since_first_purchase)
        })?;
        self.cohorts.extend_from_slice(rows);
        Ok(())
    }

    fn row_count(&self, table: Table) -> u64 {
        let n = match table {
            Table::DimCustomers => self.customers.len(),
            Table::DimProducts => self.products.len(),
            Table::DimPaymentTypes => self.payment_types.len(),
            Table::DimDates => self.dates.len(),
            Table::FactOrders => self.facts.len(),
            Table::FactCohortRetention => self.cohorts.len(),
        };
        n as u64
    }

    fn fact_rows(&self) -> Vec<FactRecord> {
        self.facts.clone()
    }

    fn dimension_keys(&self, table: Table) -> HashSet<i64> {
        match table {
            Table::DimCustomers => self.customers.iter().map(|r| r.customer_key).collect(),
            Table::DimProducts => self.products.iter().map(|r| r.product_key).collect(),
            Table::DimPaymentTypes => {
                self.payment_types.iter().map(|r| r.payment_type_key).collect()
            }
            _ => HashSet::new(),
        }
    }

    fn dimension_business_keys(&self, table: Table) -> Vec<String> {
        match table {
            Table::DimCustomers => self
                .customers
                .iter()
                .map(|r| r.customer_unique_id.clone())
                .collect(),
            Table::DimProducts => self.products.iter().map(|r| r.product_id.clone()).collect(),
            Table::DimPaymentTypes => self
                .payment_types
                .iter()
                .map(|r| r.payment_type.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn date_keys(&self) -> HashSet<i32> {
        self.dates.iter().map(|r| r.date_key).collect()
    }
}
