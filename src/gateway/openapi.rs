//! OpenAPI Documentation
//!
//! Served as JSON at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::erp::{AccountKind, ExpenseCategory, SettlementAccount};
use crate::gateway::handlers::HealthResponse;
use crate::transfer::{TransferApiRequest, TransferApiResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Receipt ERP Bridge API",
        version = "0.1.0",
        description = "Transfers approved receipts into Logo as expense vouchers.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::transfer_receipt,
        crate::gateway::handlers::list_expense_categories,
        crate::gateway::handlers::list_settlement_accounts,
        crate::gateway::handlers::get_receipt,
    ),
    components(
        schemas(
            HealthResponse,
            TransferApiRequest,
            TransferApiResponse,
            ExpenseCategory,
            SettlementAccount,
            AccountKind,
        )
    ),
    tags(
        (name = "Transfer", description = "Receipt to Logo transfer"),
        (name = "Reference Data", description = "Expense categories and settlement accounts"),
        (name = "Receipts", description = "Receipt lookup"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Receipt ERP Bridge API");
    }

    #[test]
    fn test_endpoints_registered() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;
        assert!(paths.contains_key("/api/v1/health"));
        assert!(paths.contains_key("/api/v1/erp/transfer"));
        assert!(paths.contains_key("/api/v1/erp/expense-categories"));
        assert!(paths.contains_key("/api/v1/erp/settlement-accounts"));
        assert!(paths.contains_key("/api/v1/receipts/{id}"));
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("TransferApiRequest"));
    }
}
