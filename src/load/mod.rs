//! Load stage: star-schema tables into a warehouse store, FK-safe

mod error;
mod loader;
mod store;

pub use error::LoadError;
pub use loader::{IntegrityLoader, LoadSummary};
pub use store::{MemoryStore, StoreError, Table, WarehouseStore};
