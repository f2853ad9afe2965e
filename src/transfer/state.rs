//! Receipt Transfer State Definitions
//!
//! String IDs match the `logo_status` column of the receipts table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transfer state of a receipt with respect to the ERP
///
/// ```text
/// draft|pending|failed --(start)--> processing --(remote success)--> success
///                                              \--(any failure)----> failed
/// ```
///
/// Terminal states: SUCCESS, FAILED. FAILED is retry-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Captured, not yet submitted for approval
    #[default]
    Draft,

    /// Waiting to be transferred
    Pending,

    /// Transfer attempt in flight (persist-before-call)
    /// CRITICAL: never the state left behind after an attempt returns
    Processing,

    /// Terminal: document created in the ERP, reference number recorded
    Success,

    /// Terminal: last attempt failed, error message recorded
    Failed,
}

impl TransferStatus {
    /// Check if this is a terminal state of a transfer attempt
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Failed)
    }

    /// Check if a transfer attempt may start from this state
    #[inline]
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            TransferStatus::Draft | TransferStatus::Pending | TransferStatus::Failed
        )
    }

    /// Get the storage string for the `logo_status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Draft => "draft",
            TransferStatus::Pending => "pending",
            TransferStatus::Processing => "processing",
            TransferStatus::Success => "success",
            TransferStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stored status string is not a known state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transfer status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TransferStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TransferStatus::Draft),
            "pending" => Ok(TransferStatus::Pending),
            "processing" => Ok(TransferStatus::Processing),
            "success" => Ok(TransferStatus::Success),
            "failed" => Ok(TransferStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
