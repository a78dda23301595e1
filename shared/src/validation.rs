//! Validation utilities for CSV upload flows
//!
//! Uploads are validated before anything touches staging: an upload that
//! fails here never generates a batch identifier, staging rows, or an apply
//! call.

use thiserror::Error;

/// Required header set for a stock snapshot CSV
pub const STOCK_REQUIRED_COLUMNS: [&str; 4] =
    ["warehouse", "product_id", "cat_a_qty", "snapshot_date"];

/// Required header set for a sales CSV
pub const SALES_REQUIRED_COLUMNS: [&str; 6] = [
    "sale_date",
    "warehouse_city",
    "product_name",
    "quantity_sold",
    "marketplace",
    "brand",
];

/// Why an upload was rejected before staging
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadValidationError {
    #[error("CSV is empty")]
    EmptyFile,

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("No rows inserted into staging")]
    EmptyStage,
}

/// Check that every required column is present in the CSV header row
///
/// Extra columns are tolerated; the staging procedure ignores them.
pub fn validate_headers(
    headers: &[String],
    required: &[&str],
) -> Result<(), UploadValidationError> {
    for col in required {
        if !headers.iter().any(|h| h == col) {
            return Err(UploadValidationError::MissingColumn(col.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_stock_headers_complete() {
        let h = headers(&["warehouse", "product_id", "cat_a_qty", "snapshot_date"]);
        assert!(validate_headers(&h, &STOCK_REQUIRED_COLUMNS).is_ok());
    }

    #[test]
    fn test_stock_headers_missing_column_named() {
        let h = headers(&["warehouse", "product_id", "snapshot_date"]);
        assert_eq!(
            validate_headers(&h, &STOCK_REQUIRED_COLUMNS),
            Err(UploadValidationError::MissingColumn("cat_a_qty".to_string()))
        );
    }

    #[test]
    fn test_extra_columns_tolerated() {
        let h = headers(&[
            "sale_date",
            "warehouse_city",
            "product_name",
            "quantity_sold",
            "marketplace",
            "brand",
            "file_note",
        ]);
        assert!(validate_headers(&h, &SALES_REQUIRED_COLUMNS).is_ok());
    }

    #[test]
    fn test_header_order_irrelevant() {
        let h = headers(&["snapshot_date", "cat_a_qty", "product_id", "warehouse"]);
        assert!(validate_headers(&h, &STOCK_REQUIRED_COLUMNS).is_ok());
    }
}
