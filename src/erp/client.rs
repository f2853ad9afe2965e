//! Remote ERP client seam
//!
//! The live reqwest adapter and the in-memory fake both implement
//! [`RemoteErpClient`]; the application picks one at construction time.

use async_trait::async_trait;

use super::document::DocumentPayload;
use super::error::ErpError;
use super::reference_data::{ExpenseCategory, SettlementAccount};

/// Result of a document creation call
///
/// `internal_reference` is `None` when the ERP answered 2xx but the body
/// carried none of the known reference fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocumentResult {
    pub internal_reference: Option<String>,
}

/// Logo REST operations used by the bridge
///
/// Implementations normalize Logo's loosely typed responses before returning.
#[async_trait]
pub trait RemoteErpClient: Send + Sync {
    /// Get client name for logging
    fn name(&self) -> &'static str;

    /// Exchange the configured service credentials for a bearer token
    async fn request_token(&self) -> Result<String, ErpError>;

    /// Create the expense voucher in the configured firm/period
    async fn create_purchase_invoice(
        &self,
        token: &str,
        document: &DocumentPayload,
    ) -> Result<RemoteDocumentResult, ErpError>;

    /// Service cards usable as expense categories
    async fn list_expense_categories(&self, token: &str)
    -> Result<Vec<ExpenseCategory>, ErpError>;

    /// Cash offices and bank accounts usable for settlement
    async fn list_settlement_accounts(
        &self,
        token: &str,
    ) -> Result<Vec<SettlementAccount>, ErpError>;
}
