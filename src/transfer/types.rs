//! Transfer Types

use serde::{Deserialize, Serialize};

use super::error::TransferError;

/// One caller-initiated transfer attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub receipt_id: String,
    pub expense_code: String,
    pub cash_account_code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_code: Option<String>,
}

impl TransferRequest {
    pub fn new(
        receipt_id: impl Into<String>,
        expense_code: impl Into<String>,
        cash_account_code: impl Into<String>,
    ) -> Self {
        Self {
            receipt_id: receipt_id.into(),
            expense_code: expense_code.into(),
            cash_account_code: cash_account_code.into(),
            description: None,
            project_code: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_project_code(mut self, project_code: impl Into<String>) -> Self {
        self.project_code = Some(project_code.into());
        self
    }

    /// Reject blank identifiers and codes. Pure; no I/O.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.receipt_id.trim().is_empty() {
            return Err(TransferError::Validation("receipt id is required".into()));
        }
        if self.expense_code.trim().is_empty() {
            return Err(TransferError::Validation("expense code is required".into()));
        }
        if self.cash_account_code.trim().is_empty() {
            return Err(TransferError::Validation(
                "cash account code is required".into(),
            ));
        }
        Ok(())
    }
}

/// Result of a transfer attempt that reached the ERP stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Succeeded { reference_number: String },
    Failed { error_message: String },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Succeeded { .. })
    }

    pub fn reference_number(&self) -> Option<&str> {
        match self {
            TransferOutcome::Succeeded { reference_number } => Some(reference_number),
            TransferOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TransferOutcome::Failed { error_message } => Some(error_message),
            TransferOutcome::Succeeded { .. } => None,
        }
    }
}
