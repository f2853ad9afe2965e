//! Receipt Database Layer
//!
//! PostgreSQL-backed [`ReceiptStore`]. Transfer-state writes are single-row
//! partial updates; the start of an attempt is an atomic CAS on `logo_status`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::models::{Receipt, TransferStateUpdate};
use super::store::{ReceiptStore, StoreError};
use crate::transfer::state::TransferStatus;

/// DDL for the receipts table
pub const RECEIPTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS receipts (
    id                      TEXT PRIMARY KEY,
    user_id                 TEXT,
    image_url               TEXT,
    amount                  NUMERIC(18, 2) NOT NULL,
    currency                TEXT NOT NULL DEFAULT 'TRY',
    kdv_amount              NUMERIC(18, 2),
    kdv_rate                NUMERIC(5, 2),
    date                    DATE NOT NULL,
    merchant_name           TEXT NOT NULL,
    description             TEXT,
    tax_number              TEXT,
    logo_status             TEXT NOT NULL DEFAULT 'draft',
    logo_ref_no             TEXT,
    logo_expense_code       TEXT,
    logo_expense_name       TEXT,
    logo_cash_account_code  TEXT,
    logo_cash_account_name  TEXT,
    logo_project_code       TEXT,
    logo_error_message      TEXT,
    logo_transferred_at     TIMESTAMPTZ,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    is_deleted              BOOLEAN NOT NULL DEFAULT FALSE
)
"#;

const SELECT_COLUMNS: &str = r#"
    id, user_id, image_url, amount, currency, kdv_amount, kdv_rate, date,
    merchant_name, description, tax_number,
    logo_status, logo_ref_no, logo_expense_code, logo_expense_name,
    logo_cash_account_code, logo_cash_account_name, logo_project_code,
    logo_error_message, logo_transferred_at,
    created_at, updated_at, is_deleted
"#;

/// PostgreSQL receipt store
pub struct PgReceiptStore {
    pool: PgPool,
}

impl PgReceiptStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and make sure the table exists
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the receipts table if missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(RECEIPTS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_receipt(row: &PgRow) -> Result<Receipt, StoreError> {
        let status_str: String = row.try_get("logo_status")?;
        let logo_status = status_str
            .parse::<TransferStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Receipt {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            image_url: row.try_get("image_url")?,
            amount: row.try_get::<Decimal, _>("amount")?,
            currency: row.try_get("currency")?,
            kdv_amount: row.try_get::<Option<Decimal>, _>("kdv_amount")?,
            kdv_rate: row.try_get::<Option<Decimal>, _>("kdv_rate")?,
            date: row.try_get::<NaiveDate, _>("date")?,
            merchant_name: row.try_get("merchant_name")?,
            description: row.try_get("description")?,
            tax_number: row.try_get("tax_number")?,
            logo_status,
            logo_ref_no: row.try_get("logo_ref_no")?,
            logo_expense_code: row.try_get("logo_expense_code")?,
            logo_expense_name: row.try_get("logo_expense_name")?,
            logo_cash_account_code: row.try_get("logo_cash_account_code")?,
            logo_cash_account_name: row.try_get("logo_cash_account_name")?,
            logo_project_code: row.try_get("logo_project_code")?,
            logo_error_message: row.try_get("logo_error_message")?,
            logo_transferred_at: row.try_get::<Option<DateTime<Utc>>, _>("logo_transferred_at")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

#[async_trait]
impl ReceiptStore for PgReceiptStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, receipt: Receipt) -> Result<Receipt, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO receipts
                (id, user_id, image_url, amount, currency, kdv_amount, kdv_rate, date,
                 merchant_name, description, tax_number,
                 logo_status, logo_expense_code, logo_expense_name,
                 logo_cash_account_code, logo_cash_account_name, logo_project_code,
                 created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.user_id)
        .bind(&receipt.image_url)
        .bind(receipt.amount)
        .bind(&receipt.currency)
        .bind(receipt.kdv_amount)
        .bind(receipt.kdv_rate)
        .bind(receipt.date)
        .bind(&receipt.merchant_name)
        .bind(&receipt.description)
        .bind(&receipt.tax_number)
        .bind(receipt.logo_status.as_str())
        .bind(&receipt.logo_expense_code)
        .bind(&receipt.logo_expense_name)
        .bind(&receipt.logo_cash_account_code)
        .bind(&receipt.logo_cash_account_name)
        .bind(&receipt.logo_project_code)
        .bind(receipt.created_at)
        .bind(receipt.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(receipt.id));
        }
        Ok(receipt)
    }

    async fn get(&self, id: &str) -> Result<Option<Receipt>, StoreError> {
        let sql = format!(
            "SELECT {} FROM receipts WHERE id = $1 AND NOT is_deleted",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn list(&self, limit: usize) -> Result<Vec<Receipt>, StoreError> {
        let sql = format!(
            "SELECT {} FROM receipts WHERE NOT is_deleted ORDER BY created_at DESC LIMIT $1",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_receipt).collect()
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE receipts SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin_transfer(
        &self,
        id: &str,
        expected: TransferStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE receipts
            SET logo_status = $1, updated_at = NOW()
            WHERE id = $2 AND logo_status = $3 AND NOT is_deleted
            "#,
        )
        .bind(TransferStatus::Processing.as_str())
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_transfer_state(
        &self,
        id: &str,
        update: &TransferStateUpdate,
    ) -> Result<(), StoreError> {
        let result = match update {
            TransferStateUpdate::Processing => {
                sqlx::query(
                    "UPDATE receipts SET logo_status = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(update.status().as_str())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            TransferStateUpdate::Succeeded {
                ref_no,
                transferred_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE receipts
                    SET logo_status = $1, logo_ref_no = $2, logo_transferred_at = $3,
                        logo_error_message = NULL, updated_at = NOW()
                    WHERE id = $4
                    "#,
                )
                .bind(update.status().as_str())
                .bind(ref_no)
                .bind(transferred_at)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            TransferStateUpdate::Failed { message } => {
                sqlx::query(
                    r#"
                    UPDATE receipts
                    SET logo_status = $1, logo_error_message = $2, updated_at = NOW()
                    WHERE id = $3
                    "#,
                )
                .bind(update.status().as_str())
                .bind(message)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn fail_if_processing(&self, id: &str, message: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE receipts
            SET logo_status = $1, logo_error_message = $2, updated_at = NOW()
            WHERE id = $3 AND logo_status = $4
            "#,
        )
        .bind(TransferStatus::Failed.as_str())
        .bind(message)
        .bind(id)
        .bind(TransferStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_stale_processing(
        &self,
        threshold: Duration,
    ) -> Result<Vec<Receipt>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM receipts
            WHERE logo_status = $1
              AND NOT is_deleted
              AND updated_at < NOW() - INTERVAL '1 second' * $2
            ORDER BY updated_at ASC
            LIMIT 100
            "#,
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(TransferStatus::Processing.as_str())
            .bind(threshold.as_secs() as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_receipt).collect()
    }
}
