//! Logo response normalization
//!
//! Logo's JSON is not strictly typed: the same field shows up as `Token` or
//! `token`, `INTERNAL_REFERENCE` or `internalReference`, lists come wrapped in
//! `{items: [...]}` or bare. Everything is funneled through the fixed key
//! sets below so the rest of the crate sees typed values only.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use super::error::ErpError;
use super::reference_data::{AccountKind, ExpenseCategory, SettlementAccount};
use crate::erp::document::DEFAULT_VAT_RATE;
use crate::receipt::DEFAULT_CURRENCY;

pub const TOKEN_KEYS: &[&str] = &["Token", "token"];
pub const REFERENCE_KEYS: &[&str] = &["INTERNAL_REFERENCE", "InternalReference", "internalReference"];
const CODE_KEYS: &[&str] = &["CODE", "code"];
const CARD_NAME_KEYS: &[&str] = &["NAME", "name"];
const VAT_RATE_KEYS: &[&str] = &["VAT_RATE", "vatRate"];
const ACCOUNT_NAME_KEYS: &[&str] = &["DESCRIPTION", "description", "name"];
const CURRENCY_KEYS: &[&str] = &["CURRENCY_CODE", "currencyCode"];

/// First non-null value under any of `keys`
fn first<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| body.get(*k))
        .find(|v| !v.is_null())
}

/// First non-blank string under any of `keys`; numbers are rendered as text
fn first_text(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| body.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Extract the bearer token from an auth response
pub fn extract_token(body: &Value) -> Result<String, ErpError> {
    match first(body, TOKEN_KEYS) {
        Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
        _ => Err(ErpError::MalformedResponse(format!(
            "token field missing (expected one of {:?})",
            TOKEN_KEYS
        ))),
    }
}

/// Extract the internal reference of a created document, if any
pub fn extract_reference(body: &Value) -> Option<String> {
    first_text(body, REFERENCE_KEYS)
}

/// Entries of a Logo list response (`{items: [...]}` or a bare array)
pub fn list_items(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => body
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Service card → expense category; entries without a code are skipped
pub fn parse_expense_category(item: &Value) -> Option<ExpenseCategory> {
    let code = first_text(item, CODE_KEYS)?;
    let name = first_text(item, CARD_NAME_KEYS).unwrap_or_else(|| code.clone());
    let vat_rate = match first(item, VAT_RATE_KEYS) {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
    .unwrap_or(DEFAULT_VAT_RATE);

    Some(ExpenseCategory {
        code,
        name,
        vat_rate,
    })
}

/// Cash office / bank account → settlement account
pub fn parse_settlement_account(item: &Value, kind: AccountKind) -> Option<SettlementAccount> {
    let code = first_text(item, CODE_KEYS)?;
    let name = first_text(item, ACCOUNT_NAME_KEYS).unwrap_or_else(|| code.clone());
    let currency =
        first_text(item, CURRENCY_KEYS).unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Some(SettlementAccount {
        code,
        name,
        kind,
        currency,
    })
}
