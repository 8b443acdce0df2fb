//! Record types shared across the pipeline stages

pub mod dimensions;
pub mod facts;
pub mod staging;

pub use dimensions::{
    CustomerDimension, CustomerSegment, DateDimension, PaymentTypeDimension, ProductDimension,
    Region,
};
pub use facts::{CohortRecord, FactRecord, YearMonth};
pub use staging::{
    CustomerRecord, OrderItemRecord, OrderRecord, OrderStatus, PaymentRecord, ProductRecord,
    ReviewRecord,
};
