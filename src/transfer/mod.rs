//! Receipt → Logo transfer
//!
//! Moves an approved receipt into Logo as an expense voucher and records the
//! result on the receipt.
//!
//! # State Machine
//!
//! ```text
//! draft | pending | failed → processing → success
//!                                   ↓
//!                                failed (retryable)
//! ```
//!
//! # Invariants
//!
//! 1. **Persist-Before-Call**: `processing` is written before the ERP is contacted
//! 2. **Exactly one terminal write** per attempt that wrote `processing`
//! 3. **Single flight**: one attempt per receipt at a time (in-process guard + store CAS)
//! 4. **No resubmission of `success`**: a transferred receipt is rejected up front

pub mod api;
pub mod error;
pub mod orchestrator;
pub mod reconciler;
pub mod state;
pub mod types;
pub mod worker;

pub use api::{TransferApiRequest, TransferApiResponse, execute_transfer};
pub use error::TransferError;
pub use orchestrator::TransferOrchestrator;
pub use reconciler::ReconciliationWriter;
pub use state::TransferStatus;
pub use types::{TransferOutcome, TransferRequest};
pub use worker::{RecoverySweeper, WorkerConfig};
