//! HTTP handlers

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};

use super::openapi::ApiDoc;
use super::state::AppState;
use super::types::{ApiError, ApiResult, error_codes, ok};
use crate::erp::{ExpenseCategory, SettlementAccount};
use crate::receipt::Receipt;
use crate::transfer::{TransferApiRequest, TransferApiResponse, execute_transfer};

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Build revision
    #[schema(example = "a1b2c3d")]
    pub version: String,
    /// ERP client in use
    #[schema(example = "logo-rest")]
    pub erp_client: String,
    /// Receipt store in use
    #[schema(example = "postgres")]
    pub store: String,
    pub uptime_secs: u64,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Receipt store unreachable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    state.store.ping().await.map_err(|e| {
        warn!(store = state.store.name(), error = %e, "Receipt store unreachable");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            format!("Receipt store unavailable: {}", e),
        )
    })?;

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    ok(HealthResponse {
        version: env!("GIT_HASH").to_string(),
        erp_client: state.erp_client.to_string(),
        store: state.store.name().to_string(),
        uptime_secs: state.uptime_secs(),
        timestamp_ms,
    })
}

/// Transfer a receipt to Logo
///
/// 200 is returned whenever the ERP was contacted, whether or not it
/// accepted the document; `data.success` carries the result.
#[utoipa::path(
    post,
    path = "/api/v1/erp/transfer",
    request_body = TransferApiRequest,
    responses(
        (status = 200, description = "Transfer attempted", body = TransferApiResponse),
        (status = 400, description = "Malformed body or missing receipt id, expense code or account code"),
        (status = 404, description = "Receipt not found"),
        (status = 409, description = "Receipt already transferred or transfer in progress"),
        (status = 500, description = "Transfer state could not be recorded")
    ),
    tag = "Transfer"
)]
pub async fn transfer_receipt(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferApiRequest>, JsonRejection>,
) -> ApiResult<TransferApiResponse> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let response = execute_transfer(&state.orchestrator, req).await?;
    ok(response)
}

/// Expense categories (Logo service cards)
#[utoipa::path(
    get,
    path = "/api/v1/erp/expense-categories",
    responses(
        (status = 200, description = "Expense categories", body = Vec<ExpenseCategory>),
        (status = 502, description = "Logo unavailable")
    ),
    tag = "Reference Data"
)]
pub async fn list_expense_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<ExpenseCategory>> {
    let categories = state
        .reference_data
        .list_expense_categories()
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to fetch expense categories"))?;
    ok(categories)
}

/// Cash offices, bank accounts and corporate cards
#[utoipa::path(
    get,
    path = "/api/v1/erp/settlement-accounts",
    responses(
        (status = 200, description = "Settlement accounts", body = Vec<SettlementAccount>),
        (status = 502, description = "Logo unavailable")
    ),
    tag = "Reference Data"
)]
pub async fn list_settlement_accounts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<SettlementAccount>> {
    let accounts = state
        .reference_data
        .list_settlement_accounts()
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to fetch settlement accounts"))?;
    ok(accounts)
}

/// Receipt with its current transfer state
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}",
    params(("id" = String, Path, description = "Receipt id")),
    responses(
        (status = 200, description = "Receipt"),
        (status = 404, description = "Receipt not found")
    ),
    tag = "Receipts"
)]
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Receipt> {
    match state.store.get(&id).await? {
        Some(receipt) => ok(receipt),
        None => ApiError::not_found(
            error_codes::RECEIPT_NOT_FOUND,
            format!("Receipt not found: {}", id),
        )
        .into_err(),
    }
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
