//! Receipt records
//!
//! The receipt model plus the record-store seam the transfer bridge reads
//! from and reconciles into.

pub mod db;
pub mod models;
pub mod store;

pub use db::PgReceiptStore;
pub use models::{DEFAULT_CURRENCY, Receipt, TransferStateUpdate};
pub use store::{InMemoryReceiptStore, ReceiptStore, StoreError};
