//! Logo REST client (reqwest)

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::{RemoteDocumentResult, RemoteErpClient};
use super::document::DocumentPayload;
use super::error::ErpError;
use super::reference_data::{AccountKind, ExpenseCategory, SettlementAccount};
use super::wire;
use crate::config::ErpConfig;

const TOKEN_PATH: &str = "/api/v1/token";
const PURCHASE_INVOICES_PATH: &str = "/api/v1/purchaseInvoices";
const ITEMS_PATH: &str = "/api/v1/items";
const CASH_OFFICES_PATH: &str = "/api/v1/cashOffices";
const BANK_ACCOUNTS_PATH: &str = "/api/v1/bankAccounts";
const ITEMS_PAGE_SIZE: u32 = 200;
const ACCOUNTS_PAGE_SIZE: u32 = 100;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TokenRequest<'a> {
    user_name: &'a str,
    password: &'a str,
    firm_no: u32,
    period_no: u32,
}

pub struct LogoRestClient {
    client: reqwest::Client,
    config: ErpConfig,
}

impl LogoRestClient {
    pub fn new(config: ErpConfig) -> Result<Self, ErpError> {
        if !config.is_configured() {
            return Err(ErpError::Config(
                "base_url and username are required".to_string(),
            ));
        }
        info!(base_url = config.base(), firm_no = config.firm_no, "Initializing Logo REST client");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ErpError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base(), path)
    }

    /// GET a list endpoint and return its JSON body
    async fn get_list(&self, token: &str, path: &str, query: &[(&str, String)]) -> Result<Value, ErpError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = body_or_read_error(response.text().await);
            return Err(ErpError::RemoteRejection {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn list_accounts(
        &self,
        token: &str,
        path: &str,
        kind: AccountKind,
    ) -> Result<Vec<SettlementAccount>, ErpError> {
        let query = [
            ("firmNo", self.config.firm_no.to_string()),
            ("pageSize", ACCOUNTS_PAGE_SIZE.to_string()),
        ];
        let body = self.get_list(token, path, &query).await?;
        Ok(wire::list_items(&body)
            .iter()
            .filter_map(|item| wire::parse_settlement_account(item, kind))
            .collect())
    }
}

/// Rejection body for diagnostics; a failed read keeps the read error instead
fn body_or_read_error<E: std::fmt::Display>(body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<response body unreadable: {}>", e))
}

#[async_trait]
impl RemoteErpClient for LogoRestClient {
    fn name(&self) -> &'static str {
        "logo-rest"
    }

    async fn request_token(&self) -> Result<String, ErpError> {
        let request = TokenRequest {
            user_name: &self.config.username,
            password: &self.config.password,
            firm_no: self.config.firm_no,
            period_no: self.config.period_no,
        };

        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErpError::Authentication {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        wire::extract_token(&body)
    }

    async fn create_purchase_invoice(
        &self,
        token: &str,
        document: &DocumentPayload,
    ) -> Result<RemoteDocumentResult, ErpError> {
        debug!(fiche_no = %document.fiche_no, "Submitting purchase invoice");
        let response = self
            .client
            .post(self.url(PURCHASE_INVOICES_PATH))
            .bearer_auth(token)
            .query(&[
                ("firmNo", self.config.firm_no),
                ("periodNo", self.config.period_no),
            ])
            .json(document)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErpError::RemoteRejection {
                status: status.as_u16(),
                body: body_or_read_error(response.text().await),
            });
        }
        let text = response.text().await?;

        // A 2xx body that is not JSON still means the document was created
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(RemoteDocumentResult {
            internal_reference: wire::extract_reference(&body),
        })
    }

    async fn list_expense_categories(
        &self,
        token: &str,
    ) -> Result<Vec<ExpenseCategory>, ErpError> {
        let query = [
            ("firmNo", self.config.firm_no.to_string()),
            ("type", "SERVICE".to_string()),
            ("pageSize", ITEMS_PAGE_SIZE.to_string()),
        ];
        let body = self.get_list(token, ITEMS_PATH, &query).await?;
        Ok(wire::list_items(&body)
            .iter()
            .filter_map(wire::parse_expense_category)
            .collect())
    }

    async fn list_settlement_accounts(
        &self,
        token: &str,
    ) -> Result<Vec<SettlementAccount>, ErpError> {
        let mut accounts = Vec::new();
        for (path, kind) in [
            (CASH_OFFICES_PATH, AccountKind::Cash),
            (BANK_ACCOUNTS_PATH, AccountKind::Bank),
        ] {
            match self.list_accounts(token, path, kind).await {
                Ok(mut found) => accounts.append(&mut found),
                // An expired session must reach the renewal path
                Err(e) if e.is_session_rejected() => return Err(e),
                Err(e) => warn!(path, error = %e, "Skipping settlement account source"),
            }
        }
        Ok(accounts)
    }
}
