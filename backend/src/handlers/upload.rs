//! HTTP handlers for the CSV import flows (admin only)

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::middleware::RequireAdmin;
use crate::services::upload::{SalesUploadReport, StockUploadReport, UploadService};
use crate::AppState;

/// Upload a full stock snapshot CSV
pub async fn import_stock(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> AppResult<Json<StockUploadReport>> {
    let (file_name, bytes) = read_csv_file(multipart).await?;
    tracing::info!(email = %user.email, %file_name, "stock import started");

    let service = UploadService::new(state.db);
    let report = service.import_stock(&bytes).await?;
    Ok(Json(report))
}

/// Upload a sales CSV
pub async fn import_sales(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> AppResult<Json<SalesUploadReport>> {
    let (file_name, bytes) = read_csv_file(multipart).await?;
    tracing::info!(email = %user.email, %file_name, "sales import started");

    let service = UploadService::new(state.db);
    let report = service.import_sales(&file_name, &bytes).await?;
    Ok(Json(report))
}

/// Pull the uploaded CSV out of the multipart body
async fn read_csv_file(mut multipart: Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation {
            field: "file".to_string(),
            message: format!("Malformed multipart body: {}", e),
        })?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let file_name = field
                .file_name()
                .unwrap_or("upload.csv")
                .to_string();
            let bytes = field.bytes().await.map_err(|e| AppError::Validation {
                field: "file".to_string(),
                message: format!("Failed to read uploaded file: {}", e),
            })?;
            return Ok((file_name, bytes.to_vec()));
        }
    }

    Err(AppError::Validation {
        field: "file".to_string(),
        message: "Please select a CSV file".to_string(),
    })
}
