//! Transfer Orchestrator
//!
//! Drives one receipt through the transfer state machine:
//!
//! ```text
//! draft|pending|failed --(start)--> processing --(remote success)--> success
//!                                             \--(any failure)-----> failed
//! ```
//!
//! The `processing` write always happens before the ERP is contacted, and
//! every attempt that wrote `processing` ends with exactly one terminal
//! write. ERP errors never escape as `Err`: they become a `Failed` outcome.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::reconciler::ReconciliationWriter;
use super::state::TransferStatus;
use super::types::{TransferOutcome, TransferRequest};
use crate::erp::{DocumentMapper, ErpError, RemoteErpClient, SessionProvider, TransferSubmitter};
use crate::receipt::{Receipt, ReceiptStore};

/// Error message recorded for attempts abandoned mid-flight
pub const INTERRUPTED_MESSAGE: &str =
    "Transfer interrupted before Logo confirmed the document; check Logo before retrying";

/// Releases the per-receipt in-flight slot on drop
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<String, ()>,
    receipt_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a DashMap<String, ()>, receipt_id: &str) -> Option<Self> {
        if in_flight.insert(receipt_id.to_string(), ()).is_some() {
            return None;
        }
        Some(Self {
            in_flight,
            receipt_id: receipt_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.receipt_id);
    }
}

pub struct TransferOrchestrator {
    writer: ReconciliationWriter,
    session: Arc<SessionProvider>,
    submitter: TransferSubmitter,
    mapper: DocumentMapper,
    in_flight: DashMap<String, ()>,
}

impl TransferOrchestrator {
    pub fn new(
        store: Arc<dyn ReceiptStore>,
        session: Arc<SessionProvider>,
        client: Arc<dyn RemoteErpClient>,
        mapper: DocumentMapper,
    ) -> Self {
        Self {
            writer: ReconciliationWriter::new(store),
            session,
            submitter: TransferSubmitter::new(client),
            mapper,
            in_flight: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ReceiptStore> {
        self.writer.store()
    }

    /// Transfer a receipt to Logo as an expense voucher
    ///
    /// `Err` only for requests that never reached the ERP stage (validation,
    /// unknown receipt, already transferred, concurrent attempt) and for a
    /// failed terminal write.
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferOutcome, TransferError> {
        request.validate()?;
        let receipt_id = request.receipt_id.trim();

        let receipt = self
            .store()
            .get(receipt_id)
            .await?
            .ok_or_else(|| TransferError::ReceiptNotFound(receipt_id.to_string()))?;

        if !receipt.logo_status.can_start() {
            return Err(match receipt.logo_status {
                TransferStatus::Success => TransferError::AlreadyTransferred(receipt.id),
                _ => TransferError::InProgress(receipt.id),
            });
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &receipt.id) else {
            return Err(TransferError::InProgress(receipt.id));
        };

        if !self.writer.begin(&receipt.id, receipt.logo_status).await? {
            return Err(TransferError::InProgress(receipt.id));
        }
        info!(
            receipt_id = %receipt.id,
            from = %receipt.logo_status,
            expense_code = %request.expense_code,
            account_code = %request.cash_account_code,
            "Transfer started"
        );

        let outcome = match self.submit(&receipt, &request).await {
            Ok(reference_number) => TransferOutcome::Succeeded { reference_number },
            Err(e) => {
                warn!(receipt_id = %receipt.id, code = e.code(), error = %e, "Transfer failed");
                TransferOutcome::Failed {
                    error_message: e.to_string(),
                }
            }
        };

        self.writer.apply_outcome(&receipt.id, &outcome).await?;
        if let Some(reference) = outcome.reference_number() {
            info!(receipt_id = %receipt.id, reference = %reference, "Transfer succeeded");
        }
        Ok(outcome)
    }

    /// Run [`Self::transfer`] on its own task
    ///
    /// Dropping the returned future does not cancel the attempt: once the
    /// `processing` write has happened the terminal write still follows.
    pub async fn transfer_detached(
        self: &Arc<Self>,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        let orchestrator = Arc::clone(self);
        let receipt_id = request.receipt_id.clone();
        tokio::spawn(async move { orchestrator.transfer(request).await })
            .await
            .map_err(|e| {
                error!(receipt_id = %receipt_id, error = %e, "Transfer task aborted");
                TransferError::Persistence(format!("transfer task aborted: {}", e))
            })?
    }

    /// Token, mapping and submission; a rejected session is renewed once
    async fn submit(&self, receipt: &Receipt, request: &TransferRequest) -> Result<String, ErpError> {
        let document = self.mapper.map(
            receipt,
            request.expense_code.trim(),
            request.cash_account_code.trim(),
            request.description.as_deref(),
            request.project_code.as_deref(),
        );
        debug!(receipt_id = %receipt.id, fiche_no = %document.fiche_no, "Document mapped");

        let submitter = &self.submitter;
        let document = &document;
        self.session
            .with_token(move |token| async move { submitter.submit(&token, document).await })
            .await
    }

    /// Fail receipts stuck in `processing` for longer than `threshold`
    ///
    /// Attempts still running in this process are left alone. Returns the
    /// number of receipts moved to `failed`.
    pub async fn recover_stale(&self, threshold: Duration) -> Result<usize, TransferError> {
        let stale = self.store().find_stale_processing(threshold).await?;
        if stale.is_empty() {
            debug!("No stale transfers found");
            return Ok(0);
        }

        let mut recovered = 0;
        for receipt in stale {
            let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &receipt.id) else {
                debug!(receipt_id = %receipt.id, "Stale receipt still in flight, skipping");
                continue;
            };
            // Another process may have settled it since the scan
            if !self.writer.fail_abandoned(&receipt.id, INTERRUPTED_MESSAGE).await? {
                debug!(receipt_id = %receipt.id, "Stale receipt settled meanwhile, skipping");
                continue;
            }
            warn!(
                receipt_id = %receipt.id,
                stuck_since = %receipt.updated_at,
                "Stale transfer marked failed"
            );
            recovered += 1;
        }
        Ok(recovered)
    }

    /// Number of attempts currently between their two writes
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
