//! Transfer API Layer
//!
//! Request/response DTOs for the transfer endpoint and the mapping from
//! [`TransferError`] to HTTP status plus numeric error code.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::TransferError;
use super::orchestrator::TransferOrchestrator;
use super::types::{TransferOutcome, TransferRequest};
use crate::gateway::types::error_codes;

/// API request for transferring a receipt
///
/// Fields are optional at the JSON level so a missing code is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferApiRequest {
    #[schema(example = "3f2c9a4e-1b7d-4c1e-9f6a-12ab34cd56ef")]
    pub receipt_id: Option<String>,
    #[schema(example = "GID.YMK")]
    pub expense_code: Option<String>,
    #[schema(example = "KA-001")]
    pub cash_account_code: Option<String>,
    pub description: Option<String>,
    pub project_code: Option<String>,
}

impl From<TransferApiRequest> for TransferRequest {
    fn from(req: TransferApiRequest) -> Self {
        TransferRequest {
            receipt_id: req.receipt_id.unwrap_or_default(),
            expense_code: req.expense_code.unwrap_or_default(),
            cash_account_code: req.cash_account_code.unwrap_or_default(),
            description: req.description,
            project_code: req.project_code,
        }
    }
}

/// Outcome of a transfer that reached the ERP
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferApiResponse {
    pub success: bool,
    /// Logo reference, duplicated as `logoRefNo` for existing clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_ref_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<TransferOutcome> for TransferApiResponse {
    fn from(outcome: TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Succeeded { reference_number } => Self {
                success: true,
                reference_number: Some(reference_number.clone()),
                logo_ref_no: Some(reference_number),
                error_message: None,
            },
            TransferOutcome::Failed { error_message } => Self {
                success: false,
                reference_number: None,
                logo_ref_no: None,
                error_message: Some(error_message),
            },
        }
    }
}

/// Map TransferError to (StatusCode, error_code, message)
pub fn map_error(e: &TransferError) -> (StatusCode, i32, String) {
    let status = match e.http_status() {
        400 => StatusCode::BAD_REQUEST,
        404 => StatusCode::NOT_FOUND,
        409 => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let code = match e {
        TransferError::Validation(_) => error_codes::INVALID_PARAMETER,
        TransferError::ReceiptNotFound(_) => error_codes::RECEIPT_NOT_FOUND,
        TransferError::AlreadyTransferred(_) => error_codes::ALREADY_TRANSFERRED,
        TransferError::InProgress(_) => error_codes::TRANSFER_IN_PROGRESS,
        TransferError::Persistence(_) => error_codes::INTERNAL_ERROR,
    };

    (status, code, e.to_string())
}

/// Run a transfer on behalf of an HTTP caller
///
/// The attempt runs detached, so a client disconnect cannot strand the
/// receipt in `processing`.
pub async fn execute_transfer(
    orchestrator: &Arc<TransferOrchestrator>,
    req: TransferApiRequest,
) -> Result<TransferApiResponse, TransferError> {
    let outcome = orchestrator.transfer_detached(req.into()).await?;
    Ok(outcome.into())
}
