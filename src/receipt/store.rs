//! Receipt Store
//!
//! Record-store seam consumed by the transfer bridge. The bridge only ever
//! calls [`ReceiptStore::get`], [`ReceiptStore::begin_transfer`],
//! [`ReceiptStore::update_transfer_state`],
//! [`ReceiptStore::fail_if_processing`] and
//! [`ReceiptStore::find_stale_processing`]; the remaining operations serve the
//! wider application.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::models::{Receipt, TransferStateUpdate};
use crate::transfer::state::TransferStatus;

/// Receipt store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Receipt not found: {0}")]
    NotFound(String),

    #[error("Receipt already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt receipt row: {0}")]
    Corrupt(String),

    #[error("Receipt store unavailable: {0}")]
    Unavailable(String),
}

/// Receipt persistence operations
///
/// Every method that writes transfer state must leave the receipt's
/// financial and descriptive fields untouched.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Get store name for logging
    fn name(&self) -> &'static str;

    /// Insert a new receipt
    async fn create(&self, receipt: Receipt) -> Result<Receipt, StoreError>;

    /// Fetch a receipt; soft-deleted receipts are not returned
    async fn get(&self, id: &str) -> Result<Option<Receipt>, StoreError>;

    /// Most recent receipts first
    async fn list(&self, limit: usize) -> Result<Vec<Receipt>, StoreError>;

    /// Mark a receipt deleted; returns false when it did not exist
    async fn soft_delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Atomic CAS: move into `processing` only if the status is still `expected`
    ///
    /// Returns true if the transition happened, false if another writer got there first.
    async fn begin_transfer(&self, id: &str, expected: TransferStatus)
    -> Result<bool, StoreError>;

    /// Partial update of the transfer-state fields
    async fn update_transfer_state(
        &self,
        id: &str,
        update: &TransferStateUpdate,
    ) -> Result<(), StoreError>;

    /// Write `failed` with `message`, but only while the status is `processing`
    ///
    /// Returns false when the receipt already left `processing`.
    async fn fail_if_processing(&self, id: &str, message: &str) -> Result<bool, StoreError>;

    /// Receipts stuck in `processing` for longer than `threshold`
    async fn find_stale_processing(&self, threshold: Duration)
    -> Result<Vec<Receipt>, StoreError>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process receipt store
///
/// Used in dev mode (no PostgreSQL configured) and by tests. Every
/// transfer-state write is journaled so callers can assert on the exact
/// sequence of writes per receipt.
#[derive(Default)]
pub struct InMemoryReceiptStore {
    receipts: RwLock<HashMap<String, Receipt>>,
    journal: Mutex<Vec<(String, TransferStateUpdate)>>,
    fail_state_writes: AtomicBool,
    offline: AtomicBool,
}

impl InMemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfer-state writes recorded for one receipt, oldest first
    pub async fn transfer_writes(&self, id: &str) -> Vec<TransferStateUpdate> {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|(receipt_id, _)| receipt_id == id)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Overwrite a stored receipt as-is (fixture setup)
    pub async fn put(&self, receipt: Receipt) {
        self.receipts
            .write()
            .await
            .insert(receipt.id.clone(), receipt);
    }

    /// Make `update_transfer_state` fail until reset
    pub fn set_fail_state_writes(&self, fail: bool) {
        self.fail_state_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `ping` report the store as unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn record(&self, id: &str, update: &TransferStateUpdate) {
        self.journal
            .lock()
            .await
            .push((id.to_string(), update.clone()));
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, receipt: Receipt) -> Result<Receipt, StoreError> {
        let mut receipts = self.receipts.write().await;
        if receipts.contains_key(&receipt.id) {
            return Err(StoreError::AlreadyExists(receipt.id));
        }
        receipts.insert(receipt.id.clone(), receipt.clone());
        Ok(receipt)
    }

    async fn get(&self, id: &str) -> Result<Option<Receipt>, StoreError> {
        Ok(self
            .receipts
            .read()
            .await
            .get(id)
            .filter(|r| !r.is_deleted)
            .cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Receipt>, StoreError> {
        let receipts = self.receipts.read().await;
        let mut live: Vec<Receipt> = receipts.values().filter(|r| !r.is_deleted).cloned().collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        live.truncate(limit);
        Ok(live)
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut receipts = self.receipts.write().await;
        match receipts.get_mut(id) {
            Some(receipt) if !receipt.is_deleted => {
                receipt.is_deleted = true;
                receipt.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn begin_transfer(
        &self,
        id: &str,
        expected: TransferStatus,
    ) -> Result<bool, StoreError> {
        let update = TransferStateUpdate::Processing;
        {
            let mut receipts = self.receipts.write().await;
            let receipt = receipts
                .get_mut(id)
                .filter(|r| !r.is_deleted)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            if receipt.logo_status != expected {
                return Ok(false);
            }
            receipt.apply_transfer_update(&update, Utc::now());
        }
        self.record(id, &update).await;
        Ok(true)
    }

    async fn update_transfer_state(
        &self,
        id: &str,
        update: &TransferStateUpdate,
    ) -> Result<(), StoreError> {
        if self.fail_state_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("state writes disabled".to_string()));
        }
        {
            let mut receipts = self.receipts.write().await;
            let receipt = receipts
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            receipt.apply_transfer_update(update, Utc::now());
        }
        self.record(id, update).await;
        Ok(())
    }

    async fn fail_if_processing(&self, id: &str, message: &str) -> Result<bool, StoreError> {
        if self.fail_state_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("state writes disabled".to_string()));
        }
        let update = TransferStateUpdate::Failed {
            message: message.to_string(),
        };
        {
            let mut receipts = self.receipts.write().await;
            let receipt = receipts
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if receipt.logo_status != TransferStatus::Processing {
                return Ok(false);
            }
            receipt.apply_transfer_update(&update, Utc::now());
        }
        self.record(id, &update).await;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }

    async fn find_stale_processing(
        &self,
        threshold: Duration,
    ) -> Result<Vec<Receipt>, StoreError> {
        let threshold = chrono::Duration::from_std(threshold)
            .map_err(|e| StoreError::Corrupt(format!("invalid threshold: {}", e)))?;
        let cutoff = Utc::now() - threshold;

        let receipts = self.receipts.read().await;
        let mut stale: Vec<Receipt> = receipts
            .values()
            .filter(|r| {
                !r.is_deleted
                    && r.logo_status == TransferStatus::Processing
                    && r.updated_at < cutoff
            })
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(stale)
    }
}
