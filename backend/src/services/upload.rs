//! CSV upload pipeline: parse, validate, stage, apply
//!
//! Both import flows share the same skeleton: parse the CSV, validate the
//! exact required header set, tag every row with one batch identifier,
//! insert into the staging table, verify the staged count, then invoke the
//! remote apply procedure keyed by that identifier. Validation failures
//! abort before anything is staged; apply failures leave the staging rows in
//! place for inspection and are never remediated automatically.
//!
//! The apply procedures themselves (snapshot semantics for stock,
//! same-date replacement for sales) live in the hosted database.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::validation::{
    validate_headers, UploadValidationError, SALES_REQUIRED_COLUMNS, STOCK_REQUIRED_COLUMNS,
};

use crate::error::{AppError, AppResult};

/// CSV upload service
#[derive(Clone)]
pub struct UploadService {
    db: PgPool,
}

/// One row of a stock snapshot CSV
///
/// `product_id` stays a raw string here; the apply procedure owns its
/// validation against the product catalog.
#[derive(Debug, Deserialize)]
struct StockCsvRow {
    warehouse: String,
    product_id: String,
    cat_a_qty: f64,
    snapshot_date: NaiveDate,
}

/// One row of a sales CSV
#[derive(Debug, Deserialize)]
struct SalesCsvRow {
    sale_date: NaiveDate,
    warehouse_city: String,
    product_name: String,
    quantity_sold: f64,
    marketplace: String,
    brand: String,
}

/// Outcome of a stock snapshot upload
#[derive(Debug, Serialize)]
pub struct StockUploadReport {
    pub upload_id: Uuid,
    pub rows_staged: usize,
    pub snapshot_date: NaiveDate,
}

/// Outcome of a sales upload
#[derive(Debug, Serialize)]
pub struct SalesUploadReport {
    pub upload_id: Uuid,
    pub rows_staged: usize,
    pub rows_inserted: i64,
    /// Rows of prior same-date data the apply procedure replaced
    pub rows_deleted: i64,
}

impl UploadService {
    /// Create a new UploadService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stage a full stock snapshot CSV and apply it
    pub async fn import_stock(&self, csv_bytes: &[u8]) -> AppResult<StockUploadReport> {
        let rows: Vec<StockCsvRow> = parse_csv(csv_bytes, &STOCK_REQUIRED_COLUMNS)?;
        let snapshot_date = rows[0].snapshot_date;
        let upload_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO staging_inventory_upload
                    (upload_id, warehouse, product_id, cat_a_qty, snapshot_date)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(upload_id)
            .bind(&row.warehouse)
            .bind(&row.product_id)
            .bind(row.cat_a_qty)
            .bind(row.snapshot_date)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.verify_staged("staging_inventory_upload", upload_id)
            .await?;

        sqlx::query("SELECT apply_inventory_snapshot($1)")
            .bind(upload_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::ApplyFailed {
                procedure: "apply_inventory_snapshot".to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(%upload_id, rows = rows.len(), %snapshot_date, "stock snapshot applied");

        Ok(StockUploadReport {
            upload_id,
            rows_staged: rows.len(),
            snapshot_date,
        })
    }

    /// Stage a sales CSV and apply it
    ///
    /// The apply procedure replaces any previously loaded data for the same
    /// sale dates and reports how many rows it inserted and replaced.
    pub async fn import_sales(
        &self,
        file_name: &str,
        csv_bytes: &[u8],
    ) -> AppResult<SalesUploadReport> {
        let rows: Vec<SalesCsvRow> = parse_csv(csv_bytes, &SALES_REQUIRED_COLUMNS)?;
        let upload_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO staging_sales_upload
                    (upload_id, file_name, sale_date, warehouse_city, product_name,
                     quantity_sold, marketplace, brand)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(upload_id)
            .bind(file_name)
            .bind(row.sale_date)
            .bind(&row.warehouse_city)
            .bind(&row.product_name)
            .bind(row.quantity_sold)
            .bind(&row.marketplace)
            .bind(&row.brand)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.verify_staged("staging_sales_upload", upload_id).await?;

        let result: serde_json::Value =
            sqlx::query_scalar("SELECT apply_sales_upload($1)")
                .bind(upload_id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| AppError::ApplyFailed {
                    procedure: "apply_sales_upload".to_string(),
                    message: e.to_string(),
                })?;

        let rows_inserted = result["rows_inserted"].as_i64().unwrap_or(0);
        let rows_deleted = result["rows_deleted"].as_i64().unwrap_or(0);

        tracing::info!(%upload_id, rows_inserted, rows_deleted, "sales upload applied");

        Ok(SalesUploadReport {
            upload_id,
            rows_staged: rows.len(),
            rows_inserted,
            rows_deleted,
        })
    }

    /// Confirm the staging table actually holds rows for this batch
    async fn verify_staged(&self, table: &str, upload_id: Uuid) -> AppResult<()> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE upload_id = $1", table))
                .bind(upload_id)
                .fetch_one(&self.db)
                .await?;

        if count == 0 {
            return Err(UploadValidationError::EmptyStage.into());
        }
        Ok(())
    }
}

/// Parse a CSV with a header row, enforcing the required column set
fn parse_csv<T: DeserializeOwned>(bytes: &[u8], required: &[&str]) -> AppResult<Vec<T>> {
    if bytes.is_empty() {
        return Err(UploadValidationError::EmptyFile.into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    validate_headers(&headers, required)?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;

    if rows.is_empty() {
        return Err(UploadValidationError::EmptyFile.into());
    }

    Ok(rows)
}
