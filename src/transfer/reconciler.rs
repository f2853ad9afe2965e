//! Reconciliation Writer
//!
//! The only component that writes transfer state back to the receipt store.
//! Writes touch `logo_status`, `logo_ref_no`, `logo_error_message` and
//! `logo_transferred_at` only.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use super::error::TransferError;
use super::state::TransferStatus;
use super::types::TransferOutcome;
use crate::receipt::{ReceiptStore, TransferStateUpdate};

pub struct ReconciliationWriter {
    store: Arc<dyn ReceiptStore>,
}

impl ReconciliationWriter {
    pub fn new(store: Arc<dyn ReceiptStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ReceiptStore> {
        &self.store
    }

    /// Move the receipt into `processing` if it is still in `current`
    ///
    /// Returns false when a concurrent attempt won the transition.
    pub async fn begin(&self, receipt_id: &str, current: TransferStatus) -> Result<bool, TransferError> {
        let moved = self.store.begin_transfer(receipt_id, current).await?;
        debug!(receipt_id, from = %current, moved, "processing write");
        Ok(moved)
    }

    /// Record the terminal state of an attempt
    ///
    /// Safe to repeat with the same outcome. A store failure is logged and
    /// returned; the receipt then stays in `processing` until recovered.
    pub async fn apply_outcome(&self, receipt_id: &str, outcome: &TransferOutcome) -> Result<(), TransferError> {
        let update = match outcome {
            TransferOutcome::Succeeded { reference_number } => TransferStateUpdate::Succeeded {
                ref_no: reference_number.clone(),
                transferred_at: Utc::now(),
            },
            TransferOutcome::Failed { error_message } => TransferStateUpdate::Failed {
                message: error_message.clone(),
            },
        };

        if let Err(e) = self.store.update_transfer_state(receipt_id, &update).await {
            error!(
                receipt_id,
                status = %update.status(),
                error = %e,
                "Failed to record transfer outcome"
            );
            return Err(TransferError::Persistence(e.to_string()));
        }
        debug!(receipt_id, status = %update.status(), "terminal write");
        Ok(())
    }

    /// Record `failed` for an abandoned attempt, unless it has since settled
    ///
    /// Returns false when the receipt is no longer in `processing`.
    pub async fn fail_abandoned(&self, receipt_id: &str, message: &str) -> Result<bool, TransferError> {
        match self.store.fail_if_processing(receipt_id, message).await {
            Ok(written) => {
                debug!(receipt_id, written, "recovery write");
                Ok(written)
            }
            Err(e) => {
                error!(receipt_id, error = %e, "Failed to record abandoned transfer");
                Err(TransferError::Persistence(e.to_string()))
            }
        }
    }
}
