//! Live Logo REST client against a mock HTTP server
//!
//! Covers the wire contract: token request shape and casing, firm/period
//! scoping, rejection bodies, reference spellings, session renewal on 401
//! and the reference-data endpoints.

use std::sync::Arc;

use chrono::NaiveDate;
use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use receipt_erp_bridge::config::ErpConfig;
use receipt_erp_bridge::erp::{
    AccountKind, DocumentMapper, ErpError, LogoRestClient, ReferenceDataService, RemoteErpClient,
    SessionProvider,
};
use receipt_erp_bridge::receipt::{InMemoryReceiptStore, Receipt, ReceiptStore};
use receipt_erp_bridge::transfer::{TransferOrchestrator, TransferRequest, TransferStatus};

const RECEIPT_ID: &str = "0b9f6c2e-55aa-4d1e-8c3b-a1b2c3d4e5f6";

fn config(server: &MockServer) -> ErpConfig {
    ErpConfig {
        base_url: server.base_url(),
        username: "svc-receipts".to_string(),
        password: "s3cret".to_string(),
        firm_no: 7,
        period_no: 3,
        timeout_secs: 5,
        ..ErpConfig::default()
    }
}

fn client(server: &MockServer) -> Arc<LogoRestClient> {
    Arc::new(LogoRestClient::new(config(server)).unwrap())
}

fn receipt() -> Receipt {
    Receipt::with_id(
        RECEIPT_ID,
        Decimal::new(125425, 2),
        "TRY",
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
        "Ofis Dünyası",
    )
    .with_kdv_amount(Decimal::new(19133, 2))
}

async fn orchestrator(
    erp: Arc<LogoRestClient>,
) -> (Arc<InMemoryReceiptStore>, Arc<SessionProvider>, TransferOrchestrator) {
    let store = Arc::new(InMemoryReceiptStore::new());
    store.create(receipt()).await.unwrap();
    let session = Arc::new(SessionProvider::new(erp.clone()));
    let orchestrator =
        TransferOrchestrator::new(store.clone(), session.clone(), erp, DocumentMapper::default());
    (store, session, orchestrator)
}

fn request() -> TransferRequest {
    TransferRequest::new(RECEIPT_ID, "GID.OFIS", "KA-001")
}

// ============================================================================
// Token
// ============================================================================

#[tokio::test]
async fn test_token_request_shape() {
    let server = MockServer::start_async().await;
    let token = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token").json_body(json!({
                "UserName": "svc-receipts",
                "Password": "s3cret",
                "FirmNo": 7,
                "PeriodNo": 3
            }));
            then.status(200).json_body(json!({"Token": "abc"}));
        })
        .await;

    assert_eq!(client(&server).request_token().await.unwrap(), "abc");
    token.assert_async().await;
}

#[tokio::test]
async fn test_token_lowercase_key() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"token": "lower"}));
        })
        .await;

    assert_eq!(client(&server).request_token().await.unwrap(), "lower");
}

#[tokio::test]
async fn test_token_missing_field() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"access_token": "x"}));
        })
        .await;

    let err = client(&server).request_token().await.unwrap_err();
    assert!(matches!(err, ErpError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_token_http_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(500).body("boom");
        })
        .await;

    let err = client(&server).request_token().await.unwrap_err();
    assert_eq!(err, ErpError::Authentication { status: 500 });
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = ErpConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        username: "svc".to_string(),
        timeout_secs: 2,
        ..ErpConfig::default()
    };
    let err = LogoRestClient::new(config)
        .unwrap()
        .request_token()
        .await
        .unwrap_err();
    assert!(matches!(err, ErpError::Network(_)));
}

// ============================================================================
// Document submission through the orchestrator
// ============================================================================

#[tokio::test]
async fn test_transfer_success_end_to_end() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "tok-1"}));
        })
        .await;
    let invoice = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/purchaseInvoices")
                .query_param("firmNo", "7")
                .query_param("periodNo", "3")
                .header("authorization", "Bearer tok-1")
                .json_body_partial(
                    r#"{
                        "DOC_TYPE": 52,
                        "DATE": "2026.02.15",
                        "FICHENO": "GF-C3D4E5F6",
                        "AUXIL_CODE": "GID.OFIS",
                        "DESCRIPTION": "Ofis Dünyası"
                    }"#,
                );
            then.status(200).json_body(json!({"INTERNAL_REFERENCE": 778899}));
        })
        .await;

    let (store, _, orchestrator) = orchestrator(client(&server)).await;
    let outcome = orchestrator.transfer(request()).await.unwrap();

    assert_eq!(outcome.reference_number(), Some("778899"));
    invoice.assert_async().await;

    let stored = store.get(RECEIPT_ID).await.unwrap().unwrap();
    assert_eq!(stored.logo_status, TransferStatus::Success);
    assert_eq!(stored.logo_ref_no.as_deref(), Some("778899"));
}

#[tokio::test]
async fn test_rejection_body_reaches_receipt() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "tok-1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/purchaseInvoices");
            then.status(400).body("VAT mismatch");
        })
        .await;

    let (store, _, orchestrator) = orchestrator(client(&server)).await;
    let outcome = orchestrator.transfer(request()).await.unwrap();
    assert!(!outcome.is_success());

    let stored = store.get(RECEIPT_ID).await.unwrap().unwrap();
    assert_eq!(stored.logo_status, TransferStatus::Failed);
    let message = stored.logo_error_message.unwrap();
    assert!(message.contains("400"));
    assert!(message.contains("VAT mismatch"));
}

#[tokio::test]
async fn test_missing_reference_uses_fallback() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "tok-1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/purchaseInvoices");
            then.status(201).json_body(json!({"status": "created"}));
        })
        .await;

    let (_, _, orchestrator) = orchestrator(client(&server)).await;
    let outcome = orchestrator.transfer(request()).await.unwrap();
    assert!(outcome.reference_number().unwrap().starts_with("REF-"));
}

#[tokio::test]
async fn test_expired_token_is_renewed() {
    let server = MockServer::start_async().await;
    let stale_token = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "stale"}));
        })
        .await;
    let stale_invoice = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/purchaseInvoices")
                .header("authorization", "Bearer stale");
            then.status(401).body("token expired");
        })
        .await;
    let fresh_invoice = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/purchaseInvoices")
                .header("authorization", "Bearer fresh");
            then.status(200).json_body(json!({"internalReference": "A-17"}));
        })
        .await;

    let (store, session, orchestrator) = orchestrator(client(&server)).await;
    // Cache the token that the ERP will reject
    assert_eq!(session.acquire_token().await.unwrap(), "stale");
    stale_token.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "fresh"}));
        })
        .await;

    let outcome = orchestrator.transfer(request()).await.unwrap();
    assert_eq!(outcome.reference_number(), Some("A-17"));
    assert_eq!(stale_invoice.hits_async().await, 1);
    assert_eq!(fresh_invoice.hits_async().await, 1);
    assert_eq!(store.transfer_writes(RECEIPT_ID).await.len(), 2);
}

#[tokio::test]
async fn test_auth_failure_never_posts_document() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(500);
        })
        .await;
    let invoice = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/purchaseInvoices");
            then.status(200).json_body(json!({"INTERNAL_REFERENCE": 1}));
        })
        .await;

    let (store, _, orchestrator) = orchestrator(client(&server)).await;
    let outcome = orchestrator.transfer(request()).await.unwrap();

    assert!(!outcome.is_success());
    assert_eq!(invoice.hits_async().await, 0);
    assert_eq!(
        store.get(RECEIPT_ID).await.unwrap().unwrap().logo_status,
        TransferStatus::Failed
    );
}

// ============================================================================
// Reference data
// ============================================================================

#[tokio::test]
async fn test_expense_categories_from_service_cards() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "tok"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/items")
                .query_param("firmNo", "7")
                .query_param("type", "SERVICE")
                .query_param("pageSize", "200");
            then.status(200).json_body(json!({"items": [
                {"CODE": "GID.OFIS", "NAME": "Ofis Giderleri", "VAT_RATE": 20},
                {"code": "GID.GEN", "name": "Genel Giderler"},
                {"NAME": "code missing"}
            ]}));
        })
        .await;

    let erp = client(&server);
    let service = ReferenceDataService::new(Arc::new(SessionProvider::new(erp.clone())), erp);
    let categories = service.list_expense_categories().await.unwrap();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].vat_rate, Decimal::from(20));
    assert_eq!(categories[1].code, "GID.GEN");
    assert_eq!(categories[1].vat_rate, Decimal::from(18));
}

#[tokio::test]
async fn test_settlement_accounts_skip_failing_source() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/token");
            then.status(200).json_body(json!({"Token": "tok"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/cashOffices");
            then.status(200).json_body(json!([
                {"CODE": "KA-001", "DESCRIPTION": "Ana Kasa (TL)", "CURRENCY_CODE": "TRY"},
                {"CODE": "KA-002", "DESCRIPTION": "Döviz Kasa (USD)", "CURRENCY_CODE": "USD"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/bankAccounts");
            then.status(500).body("bank module offline");
        })
        .await;

    let erp = client(&server);
    let service = ReferenceDataService::new(Arc::new(SessionProvider::new(erp.clone())), erp);
    let accounts = service.list_settlement_accounts().await.unwrap();

    assert_eq!(accounts.len(), 2);
    assert!(accounts.iter().all(|a| a.kind == AccountKind::Cash));
    assert_eq!(accounts[1].currency, "USD");
}
