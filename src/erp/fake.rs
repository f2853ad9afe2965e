//! In-memory ERP client
//!
//! Used when no Logo connection is configured, and by tests. Serves the
//! fixture reference data and accepts every document unless scripted
//! otherwise.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::client::{RemoteDocumentResult, RemoteErpClient};
use super::document::DocumentPayload;
use super::error::ErpError;
use super::reference_data::{
    ExpenseCategory, SettlementAccount, default_expense_categories, default_settlement_accounts,
};

const FIRST_REFERENCE: usize = 100_001;

/// How the fake reports the reference of an accepted document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    /// 100001, 100002, ...
    #[default]
    Sequential,
    Fixed(String),
    /// 2xx with no reference field
    Omitted,
}

#[derive(Default)]
struct Script {
    auth_failure: Option<u16>,
    persistent_rejection: Option<ErpError>,
    queued_failures: VecDeque<ErpError>,
    reference_mode: ReferenceMode,
    latency: Option<Duration>,
}

pub struct InMemoryErpClient {
    script: Mutex<Script>,
    documents: Mutex<Vec<(String, DocumentPayload)>>,
    auth_calls: AtomicUsize,
    create_calls: AtomicUsize,
    accepted: AtomicUsize,
}

impl Default for InMemoryErpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryErpClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            documents: Mutex::new(Vec::new()),
            auth_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make token requests fail with `status` (`None` restores success)
    pub fn set_auth_failure(&self, status: Option<u16>) {
        self.script().auth_failure = status;
    }

    /// Reject every document with `error` (`None` restores acceptance)
    pub fn set_rejection(&self, error: Option<ErpError>) {
        self.script().persistent_rejection = error;
    }

    /// Fail the next document call only
    pub fn push_failure(&self, error: ErpError) {
        self.script().queued_failures.push_back(error);
    }

    pub fn set_reference_mode(&self, mode: ReferenceMode) {
        self.script().reference_mode = mode;
    }

    /// Delay every document call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.script().latency = latency;
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Documents received so far, with the token each was sent with
    pub fn documents(&self) -> Vec<(String, DocumentPayload)> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RemoteErpClient for InMemoryErpClient {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn request_token(&self) -> Result<String, ErpError> {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(status) = self.script().auth_failure {
            return Err(ErpError::Authentication { status });
        }
        Ok(format!("fake-token-{}", n))
    }

    async fn create_purchase_invoice(
        &self,
        token: &str,
        document: &DocumentPayload,
    ) -> Result<RemoteDocumentResult, ErpError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.script().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((token.to_string(), document.clone()));

        let mode = {
            let mut script = self.script();
            if let Some(err) = script.queued_failures.pop_front() {
                return Err(err);
            }
            if let Some(err) = script.persistent_rejection.clone() {
                return Err(err);
            }
            script.reference_mode.clone()
        };

        let internal_reference = match mode {
            ReferenceMode::Sequential => {
                let n = self.accepted.fetch_add(1, Ordering::SeqCst);
                Some((FIRST_REFERENCE + n).to_string())
            }
            ReferenceMode::Fixed(reference) => Some(reference),
            ReferenceMode::Omitted => None,
        };
        debug!(fiche_no = %document.fiche_no, ?internal_reference, "Fake document accepted");
        Ok(RemoteDocumentResult { internal_reference })
    }

    async fn list_expense_categories(
        &self,
        _token: &str,
    ) -> Result<Vec<ExpenseCategory>, ErpError> {
        Ok(default_expense_categories())
    }

    async fn list_settlement_accounts(
        &self,
        _token: &str,
    ) -> Result<Vec<SettlementAccount>, ErpError> {
        Ok(default_settlement_accounts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp::document::DocumentMapper;
    use crate::receipt::Receipt;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn payload() -> DocumentPayload {
        let receipt = Receipt::draft(
            Decimal::new(10000, 2),
            "TRY",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Kafe",
        );
        DocumentMapper::default().map(&receipt, "GID.YMK", "KA-001", None, None)
    }

    #[tokio::test]
    async fn test_sequential_references() {
        let fake = InMemoryErpClient::new();
        let a = fake.create_purchase_invoice("t", &payload()).await.unwrap();
        let b = fake.create_purchase_invoice("t", &payload()).await.unwrap();
        assert_eq!(a.internal_reference.as_deref(), Some("100001"));
        assert_eq!(b.internal_reference.as_deref(), Some("100002"));
        assert_eq!(fake.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_queued_failure_is_one_shot() {
        let fake = InMemoryErpClient::new();
        fake.push_failure(ErpError::Network("reset".into()));

        assert!(fake.create_purchase_invoice("t", &payload()).await.is_err());
        assert!(fake.create_purchase_invoice("t", &payload()).await.is_ok());
        assert_eq!(fake.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_omitted_reference() {
        let fake = InMemoryErpClient::new();
        fake.set_reference_mode(ReferenceMode::Omitted);
        let result = fake.create_purchase_invoice("t", &payload()).await.unwrap();
        assert!(result.internal_reference.is_none());
    }
}
