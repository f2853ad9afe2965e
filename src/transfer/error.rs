//! Transfer Error Types
//!
//! Errors the orchestrator returns instead of an outcome. Remote ERP failures
//! are not errors at this level: they become a `Failed` outcome.

use thiserror::Error;

use crate::receipt::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("Receipt {0} is already transferred to Logo")]
    AlreadyTransferred(String),

    #[error("Receipt {0} is already being transferred")]
    InProgress(String),

    #[error("Failed to record transfer state: {0}")]
    Persistence(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "VALIDATION_ERROR",
            TransferError::ReceiptNotFound(_) => "RECEIPT_NOT_FOUND",
            TransferError::AlreadyTransferred(_) => "ALREADY_TRANSFERRED",
            TransferError::InProgress(_) => "TRANSFER_IN_PROGRESS",
            TransferError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Validation(_) => 400,
            TransferError::ReceiptNotFound(_) => 404,
            TransferError::AlreadyTransferred(_) | TransferError::InProgress(_) => 409,
            TransferError::Persistence(_) => 500,
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TransferError::ReceiptNotFound(id),
            other => TransferError::Persistence(other.to_string()),
        }
    }
}
