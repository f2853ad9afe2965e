//! Receipt model
//!
//! The receipt record is owned by the persistence collaborator. The transfer
//! bridge reads all of it but writes only the transfer-state fields through
//! [`TransferStateUpdate`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transfer::state::TransferStatus;

/// Currency used when a receipt carries none
pub const DEFAULT_CURRENCY: &str = "TRY";

/// Captured expense receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Gross amount in major currency units
    pub amount: Decimal,
    pub currency: String,
    /// Tax (KDV) amount included in `amount`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdv_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdv_rate: Option<Decimal>,
    pub date: NaiveDate,

    pub merchant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,

    // Logo ERP fields
    #[serde(default)]
    pub logo_status: TransferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_ref_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_expense_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_expense_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_cash_account_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_cash_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_project_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_transferred_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Receipt {
    /// Create a new draft receipt with a generated id
    pub fn draft(
        amount: Decimal,
        currency: impl Into<String>,
        date: NaiveDate,
        merchant_name: impl Into<String>,
    ) -> Self {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            amount,
            currency,
            date,
            merchant_name,
        )
    }

    /// Create a new draft receipt with a caller-chosen id
    pub fn with_id(
        id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        date: NaiveDate,
        merchant_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: None,
            image_url: None,
            amount,
            currency: currency.into(),
            kdv_amount: None,
            kdv_rate: None,
            date,
            merchant_name: merchant_name.into(),
            description: None,
            tax_number: None,
            logo_status: TransferStatus::Draft,
            logo_ref_no: None,
            logo_expense_code: None,
            logo_expense_name: None,
            logo_cash_account_code: None,
            logo_cash_account_name: None,
            logo_project_code: None,
            logo_error_message: None,
            logo_transferred_at: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    pub fn with_kdv_amount(mut self, kdv_amount: Decimal) -> Self {
        self.kdv_amount = Some(kdv_amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TransferStatus) -> Self {
        self.logo_status = status;
        self
    }

    /// Currency code to send to the ERP
    pub fn currency_or_default(&self) -> &str {
        let currency = self.currency.trim();
        if currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            currency
        }
    }

    /// Apply a transfer-state write in memory
    ///
    /// Touches only `logo_status`, `logo_ref_no`, `logo_error_message`,
    /// `logo_transferred_at` (and `updated_at`).
    pub fn apply_transfer_update(&mut self, update: &TransferStateUpdate, now: DateTime<Utc>) {
        match update {
            TransferStateUpdate::Processing => {
                self.logo_status = TransferStatus::Processing;
            }
            TransferStateUpdate::Succeeded {
                ref_no,
                transferred_at,
            } => {
                self.logo_status = TransferStatus::Success;
                self.logo_ref_no = Some(ref_no.clone());
                self.logo_transferred_at = Some(*transferred_at);
                self.logo_error_message = None;
            }
            TransferStateUpdate::Failed { message } => {
                self.logo_status = TransferStatus::Failed;
                self.logo_error_message = Some(message.clone());
            }
        }
        self.updated_at = now;
    }
}

/// A write to the transfer-state fields of a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStateUpdate {
    /// Attempt started
    Processing,
    /// Document created in the ERP
    Succeeded {
        ref_no: String,
        transferred_at: DateTime<Utc>,
    },
    /// Attempt failed
    Failed { message: String },
}

impl TransferStateUpdate {
    /// Status this write moves the receipt into
    pub fn status(&self) -> TransferStatus {
        match self {
            TransferStateUpdate::Processing => TransferStatus::Processing,
            TransferStateUpdate::Succeeded { .. } => TransferStatus::Success,
            TransferStateUpdate::Failed { .. } => TransferStatus::Failed,
        }
    }
}
