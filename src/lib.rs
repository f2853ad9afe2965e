//! Receipt ERP Bridge
//!
//! Transfers approved expense receipts into the Logo ERP as expense vouchers
//! and reconciles the outcome back onto the receipt.
//!
//! # Modules
//!
//! - [`receipt`] - Receipt model and record stores (in-memory, PostgreSQL)
//! - [`erp`] - Logo session, document mapping, submission, reference data
//! - [`transfer`] - Transfer state machine, orchestrator, recovery sweeper
//! - [`gateway`] - axum HTTP surface
//! - [`config`] - YAML configuration with `LOGO_*` overrides
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod erp;
pub mod gateway;
pub mod logging;
pub mod receipt;
pub mod transfer;

pub use erp::{ErpError, RemoteErpClient};
pub use receipt::{Receipt, ReceiptStore};
pub use transfer::{TransferError, TransferOrchestrator, TransferOutcome, TransferRequest};
