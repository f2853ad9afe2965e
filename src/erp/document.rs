//! Expense voucher document
//!
//! Pure mapping from a receipt plus the caller's expense/settlement selection
//! to the nested purchase-invoice payload Logo expects. No I/O, no clock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::receipt::Receipt;

/// Logo document type for an expense voucher
pub const EXPENSE_VOUCHER_DOC_TYPE: u16 = 52;
/// Transaction line type for a service/expense card
pub const SERVICE_LINE_TYPE: u16 = 4;
/// Payment type for cash / immediate settlement
pub const CASH_PAYMENT_TYPE: u16 = 1;
/// Unit of measure for the single transaction line
pub const UNIT_CODE: &str = "ADET";
/// Prefix of the human-readable document number
pub const FICHE_NO_PREFIX: &str = "GF-";
/// VAT rate applied when neither the receipt nor the config says otherwise
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Component order of the dotted document date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `2026.02.15` - separators swapped, component order kept
    #[default]
    YearFirst,
    /// `15.02.2026`
    DayFirst,
}

impl DateOrder {
    fn format(&self) -> &'static str {
        match self {
            DateOrder::YearFirst => "%Y.%m.%d",
            DateOrder::DayFirst => "%d.%m.%Y",
        }
    }
}

/// `{ "items": [...] }` wrapper Logo uses for nested collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    pub items: Vec<T>,
}

/// Expense voucher payload for `POST /purchaseInvoices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DocumentPayload {
    pub doc_type: u16,
    pub date: String,
    #[serde(rename = "FICHENO")]
    pub fiche_no: String,
    pub auxil_code: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    pub transactions: ItemList<TransactionLine>,
    pub payment_list: ItemList<PaymentLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionLine {
    #[serde(rename = "TYPE")]
    pub line_type: u16,
    pub master_code: String,
    pub quantity: u32,
    /// Net (pre-tax) unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat_amount: Decimal,
    /// Gross total
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub unit_code: String,
    pub auxil_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PaymentLine {
    pub payment_type: u16,
    pub account_code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency_code: String,
    pub date: String,
}

impl DocumentPayload {
    /// The single transaction line
    pub fn line(&self) -> Option<&TransactionLine> {
        self.transactions.items.first()
    }

    /// The single payment line
    pub fn payment(&self) -> Option<&PaymentLine> {
        self.payment_list.items.first()
    }
}

/// Builds [`DocumentPayload`]s
///
/// Assumes validated input: non-empty expense and account codes are checked
/// by the orchestrator before mapping.
#[derive(Debug, Clone, Copy)]
pub struct DocumentMapper {
    date_order: DateOrder,
    default_vat_rate: Decimal,
}

impl Default for DocumentMapper {
    fn default() -> Self {
        Self::new(DateOrder::default())
    }
}

impl DocumentMapper {
    pub fn new(date_order: DateOrder) -> Self {
        Self {
            date_order,
            default_vat_rate: DEFAULT_VAT_RATE,
        }
    }

    pub fn with_default_vat_rate(mut self, rate: Decimal) -> Self {
        self.default_vat_rate = rate;
        self
    }

    /// Map a receipt to the expense voucher payload
    ///
    /// `description` overrides the receipt's own description; the merchant
    /// name is used when neither is present.
    pub fn map(
        &self,
        receipt: &Receipt,
        expense_code: &str,
        account_code: &str,
        description: Option<&str>,
        project_code: Option<&str>,
    ) -> DocumentPayload {
        let date = receipt.date.format(self.date_order.format()).to_string();
        let description = description
            .or(receipt.description.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&receipt.merchant_name)
            .to_string();

        let gross = receipt.amount;
        let vat_amount = receipt.kdv_amount.unwrap_or(Decimal::ZERO);
        let net = gross - vat_amount;
        let vat_rate = receipt.kdv_rate.unwrap_or(self.default_vat_rate);

        DocumentPayload {
            doc_type: EXPENSE_VOUCHER_DOC_TYPE,
            date: date.clone(),
            fiche_no: fiche_no(&receipt.id),
            auxil_code: expense_code.to_string(),
            description: description.clone(),
            project_code: project_code
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            transactions: ItemList {
                items: vec![TransactionLine {
                    line_type: SERVICE_LINE_TYPE,
                    master_code: expense_code.to_string(),
                    quantity: 1,
                    price: net,
                    vat_rate,
                    vat_amount,
                    total: gross,
                    unit_code: UNIT_CODE.to_string(),
                    auxil_code: expense_code.to_string(),
                    description,
                }],
            },
            payment_list: ItemList {
                items: vec![PaymentLine {
                    payment_type: CASH_PAYMENT_TYPE,
                    account_code: account_code.to_string(),
                    amount: gross,
                    currency_code: receipt.currency_or_default().to_string(),
                    date,
                }],
            },
        }
    }
}

/// `GF-` + last 8 characters of the receipt id, upper-cased
pub fn fiche_no(receipt_id: &str) -> String {
    let count = receipt_id.chars().count();
    let tail: String = receipt_id.chars().skip(count.saturating_sub(8)).collect();
    format!("{}{}", FICHE_NO_PREFIX, tail.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn receipt() -> Receipt {
        Receipt::with_id(
            "6f1c2a9e-4b7d-4e21-9c3a-a1b2c3d4e5f6",
            Decimal::new(125425, 2),
            "TRY",
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            "Migros Ticaret",
        )
        .with_kdv_amount(Decimal::new(19133, 2))
    }

    #[test]
    fn test_net_plus_vat_equals_gross() {
        let doc = DocumentMapper::default().map(&receipt(), "GID.OFIS", "KA-001", None, None);
        let line = doc.line().unwrap();

        assert_eq!(line.price, Decimal::new(106292, 2));
        assert_eq!(line.vat_amount, Decimal::new(19133, 2));
        assert_eq!(line.price + line.vat_amount, line.total);
        assert_eq!(line.total, Decimal::new(125425, 2));
        assert_eq!(doc.payment().unwrap().amount, line.total);
    }

    #[test]
    fn test_missing_kdv_means_zero_tax() {
        let mut r = receipt();
        r.kdv_amount = None;
        let doc = DocumentMapper::default().map(&r, "GID.OFIS", "KA-001", None, None);
        let line = doc.line().unwrap();
        assert_eq!(line.vat_amount, Decimal::ZERO);
        assert_eq!(line.price, r.amount);
    }

    #[test]
    fn test_fixed_codes_and_single_lines() {
        let doc = DocumentMapper::default().map(&receipt(), "GID.OFIS", "KA-001", None, None);

        assert_eq!(doc.doc_type, 52);
        assert_eq!(doc.auxil_code, "GID.OFIS");
        assert_eq!(doc.transactions.items.len(), 1);
        assert_eq!(doc.payment_list.items.len(), 1);

        let line = doc.line().unwrap();
        assert_eq!(line.line_type, 4);
        assert_eq!(line.master_code, "GID.OFIS");
        assert_eq!(line.auxil_code, "GID.OFIS");
        assert_eq!(line.quantity, 1);
        assert_eq!(line.unit_code, "ADET");
        assert_eq!(line.vat_rate, Decimal::from(18));

        let payment = doc.payment().unwrap();
        assert_eq!(payment.payment_type, 1);
        assert_eq!(payment.account_code, "KA-001");
        assert_eq!(payment.currency_code, "TRY");
        assert_eq!(payment.date, doc.date);
    }

    #[test]
    fn test_receipt_vat_rate_wins_over_default() {
        let mut r = receipt();
        r.kdv_rate = Some(Decimal::from(10));
        let doc = DocumentMapper::default().map(&r, "GID.YMK", "KA-001", None, None);
        assert_eq!(doc.line().unwrap().vat_rate, Decimal::from(10));

        r.kdv_rate = None;
        let doc = DocumentMapper::default()
            .with_default_vat_rate(Decimal::from(20))
            .map(&r, "GID.YMK", "KA-001", None, None);
        assert_eq!(doc.line().unwrap().vat_rate, Decimal::from(20));
    }

    #[test]
    fn test_date_order() {
        let year_first = DocumentMapper::new(DateOrder::YearFirst).map(
            &receipt(),
            "GID.OFIS",
            "KA-001",
            None,
            None,
        );
        assert_eq!(year_first.date, "2026.02.15");

        let day_first = DocumentMapper::new(DateOrder::DayFirst).map(
            &receipt(),
            "GID.OFIS",
            "KA-001",
            None,
            None,
        );
        assert_eq!(day_first.date, "15.02.2026");
        assert_eq!(day_first.payment().unwrap().date, "15.02.2026");
    }

    #[test]
    fn test_fiche_no_from_id_tail() {
        assert_eq!(fiche_no("6f1c2a9e-4b7d-4e21-9c3a-a1b2c3d4e5f6"), "GF-C3D4E5F6");
        assert_eq!(fiche_no("abc"), "GF-ABC");
        assert_eq!(fiche_no(""), "GF-");
    }

    #[test]
    fn test_description_fallbacks() {
        let mapper = DocumentMapper::default();

        let doc = mapper.map(&receipt(), "GID.OFIS", "KA-001", None, None);
        assert_eq!(doc.description, "Migros Ticaret");

        let r = receipt().with_description("Toner");
        let doc = mapper.map(&r, "GID.OFIS", "KA-001", None, None);
        assert_eq!(doc.description, "Toner");

        let doc = mapper.map(&r, "GID.OFIS", "KA-001", Some("Kağıt"), None);
        assert_eq!(doc.description, "Kağıt");
        assert_eq!(doc.line().unwrap().description, "Kağıt");

        let doc = mapper.map(&receipt(), "GID.OFIS", "KA-001", Some("  "), None);
        assert_eq!(doc.description, "Migros Ticaret");
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = DocumentMapper::default();
        let r = receipt();
        let a = serde_json::to_vec(&mapper.map(&r, "GID.OFIS", "KA-001", None, Some("PRJ-7"))).unwrap();
        let b = serde_json::to_vec(&mapper.map(&r, "GID.OFIS", "KA-001", None, Some("PRJ-7"))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_project_code_on_the_wire() {
        let mapper = DocumentMapper::default();

        let doc = mapper.map(&receipt(), "GID.OFIS", "KA-001", None, Some(" PRJ-7 "));
        assert_eq!(doc.project_code.as_deref(), Some("PRJ-7"));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["PROJECT_CODE"], "PRJ-7");

        let doc = mapper.map(&receipt(), "GID.OFIS", "KA-001", None, Some("   "));
        assert!(doc.project_code.is_none());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("PROJECT_CODE").is_none());
    }

    #[test]
    fn test_wire_shape() {
        let doc = DocumentMapper::default().map(&receipt(), "GID.OFIS", "KA-001", None, None);
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["DOC_TYPE"], 52);
        assert_eq!(json["DATE"], "2026.02.15");
        assert_eq!(json["FICHENO"], "GF-C3D4E5F6");
        assert!(json.get("PROJECT_CODE").is_none());

        let item = &json["TRANSACTIONS"]["items"][0];
        assert_eq!(item["TYPE"], 4);
        assert_eq!(item["MASTER_CODE"], "GID.OFIS");
        assert_eq!(item["PRICE"].as_f64(), Some(1062.92));
        assert_eq!(item["VAT_RATE"].as_f64(), Some(18.0));
        assert_eq!(item["TOTAL"].as_f64(), Some(1254.25));
        assert_eq!(item["UNIT_CODE"], "ADET");

        let payment = &json["PAYMENT_LIST"]["items"][0];
        assert_eq!(payment["PAYMENT_TYPE"], 1);
        assert_eq!(payment["ACCOUNT_CODE"], "KA-001");
        assert_eq!(payment["AMOUNT"].as_f64(), Some(1254.25));
        assert_eq!(payment["CURRENCY_CODE"], "TRY");
    }
}
