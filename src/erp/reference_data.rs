//! Reference data exposed to the receipt UI
//!
//! Expense categories (Logo service cards) and settlement accounts (cash
//! offices, bank accounts, corporate cards). Read-only; the bridge never
//! writes reference data back to the ERP.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::client::RemoteErpClient;
use super::document::DEFAULT_VAT_RATE;
use super::error::ErpError;
use super::session::SessionProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    #[schema(example = "GID.OFIS")]
    pub code: String,
    pub name: String,
    #[schema(value_type = String, example = "18")]
    pub vat_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Bank,
    CreditCard,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::CreditCard => "credit_card",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementAccount {
    #[schema(example = "KA-001")]
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub currency: String,
}

fn category(code: &str, name: &str) -> ExpenseCategory {
    ExpenseCategory {
        code: code.to_string(),
        name: name.to_string(),
        vat_rate: DEFAULT_VAT_RATE,
    }
}

fn account(code: &str, name: &str, kind: AccountKind, currency: &str) -> SettlementAccount {
    SettlementAccount {
        code: code.to_string(),
        name: name.to_string(),
        kind,
        currency: currency.to_string(),
    }
}

/// Fixture categories served when no Logo connection is configured
pub fn default_expense_categories() -> Vec<ExpenseCategory> {
    vec![
        category("GID.OFIS", "Ofis & Kırtasiye Giderleri"),
        category("GID.ARAC", "Araç & Ulaşım Giderleri"),
        category("GID.YMK", "Yemek & Temsil Giderleri"),
        category("GID.OTL", "Otel & Konaklama Giderleri"),
        category("GID.TLS", "Telefon & İletişim Giderleri"),
        category("GID.BLG", "Bilgisayar & Teknoloji Giderleri"),
        category("GID.RKL", "Reklam & Pazarlama Giderleri"),
        category("GID.GEN", "Genel Giderler"),
    ]
}

/// Fixture settlement accounts served when no Logo connection is configured
pub fn default_settlement_accounts() -> Vec<SettlementAccount> {
    vec![
        account("KA-001", "Ana Kasa (TL)", AccountKind::Cash, "TRY"),
        account("KA-002", "Döviz Kasa (USD)", AccountKind::Cash, "USD"),
        account("BK-001", "İş Bankası Vadesiz", AccountKind::Bank, "TRY"),
        account("BK-002", "Garanti BBVA Vadesiz", AccountKind::Bank, "TRY"),
        account("KK-001", "Kurumsal Kredi Kartı", AccountKind::CreditCard, "TRY"),
    ]
}

/// Fetches reference lists through the shared session
pub struct ReferenceDataService {
    session: Arc<SessionProvider>,
    client: Arc<dyn RemoteErpClient>,
}

impl ReferenceDataService {
    pub fn new(session: Arc<SessionProvider>, client: Arc<dyn RemoteErpClient>) -> Self {
        Self { session, client }
    }

    pub async fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>, ErpError> {
        let categories = self
            .session
            .with_token(|token| {
                let client = self.client.clone();
                async move { client.list_expense_categories(&token).await }
            })
            .await?;
        debug!(count = categories.len(), "Expense categories fetched");
        Ok(categories)
    }

    pub async fn list_settlement_accounts(&self) -> Result<Vec<SettlementAccount>, ErpError> {
        let accounts = self
            .session
            .with_token(|token| {
                let client = self.client.clone();
                async move { client.list_settlement_accounts(&token).await }
            })
            .await?;
        debug!(count = accounts.len(), "Settlement accounts fetched");
        Ok(accounts)
    }
}
