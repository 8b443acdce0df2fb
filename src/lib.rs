//! Warehouse Core - Transform-and-load engine for dimensional warehouse models
//!
//! Turns a raw e-commerce extract into a star schema:
//! - Staging: raw rows → typed, normalized staging tables
//! - Dimensions: customer, product, payment type and calendar tables with
//!   dense surrogate keys
//! - Facts: order-grain measures plus monthly cohort retention
//! - Load: FK-safe chunked loading into a [`load::WarehouseStore`]
//! - Quality: post-load checks over what actually landed
//!
//! [`pipeline::PipelineRunner`] wires the stages together; each stage is also
//! usable on its own.

pub mod dimensions;
pub mod facts;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod staging;

// Re-export commonly used types
pub use dimensions::{DimensionError, DimensionSettings, Dimensions, build_dimensions};
pub use facts::{
    AggregationStats, CohortRetentionBuilder, FactError, FactOrdersBuilder, PrimaryProductPolicy,
};
pub use load::{
    IntegrityLoader, LoadError, LoadSummary, MemoryStore, StoreError, Table, WarehouseStore,
};
pub use pipeline::{PipelineConfig, PipelineError, PipelineReport, PipelineResult, PipelineRunner};
pub use quality::{ExpectedCounts, QualityCheck, QualityConfig, QualityReport};
pub use staging::{RawExtract, StagingError, StagingTables, normalize};

// Re-export record types
pub use models::dimensions::{
    CustomerDimension, CustomerSegment, DateDimension, PaymentTypeDimension, ProductDimension,
    Region,
};
pub use models::facts::{CohortRecord, FactRecord, YearMonth};
pub use models::staging::{
    CustomerRecord, OrderItemRecord, OrderRecord, OrderStatus, PaymentRecord, ProductRecord,
    ReviewRecord,
};
