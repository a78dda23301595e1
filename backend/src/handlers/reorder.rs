//! HTTP handlers for the reorder dashboard
//!
//! Query parameters bind to the view state; the handler always runs the
//! full derive -> filter -> sort pipeline over the complete row set.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use shared::engine;
use shared::models::{
    DemandWindow, DerivedRow, ReorderFilter, SortDir, SortKey, StatusFilter, ViewState,
    ViewSummary, FILTER_ALL,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::export::{self, ExportFormat, CSV_FILE_NAME, XLSX_FILE_NAME};
use crate::services::reorder::{ReorderService, ReportMeta};
use crate::AppState;

/// View parameters as they arrive on the query string
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub window: Option<DemandWindow>,
    pub warehouse: Option<String>,
    pub brand: Option<String>,
    pub status: Option<StatusFilter>,
    pub reorder: Option<ReorderFilter>,
    pub search: Option<String>,
    pub sort_key: Option<SortKey>,
    pub sort_dir: Option<SortDir>,
    /// Only meaningful on the export route
    pub format: Option<ExportFormat>,
}

impl ViewQuery {
    fn into_view_state(self) -> ViewState {
        ViewState {
            warehouse: self.warehouse.unwrap_or_else(|| FILTER_ALL.to_string()),
            brand: self.brand.unwrap_or_else(|| FILTER_ALL.to_string()),
            status: self.status.unwrap_or_default(),
            reorder: self.reorder.unwrap_or_default(),
            search: self.search.unwrap_or_default(),
            sort_key: self.sort_key,
            sort_dir: self.sort_dir.unwrap_or_default(),
            window: self.window.unwrap_or_default(),
        }
    }
}

/// The derived, filtered, sorted table plus its KPI summary
#[derive(Debug, Serialize)]
pub struct ReorderViewResponse {
    pub rows: Vec<DerivedRow>,
    pub summary: ViewSummary,
    pub view: ViewState,
}

/// Serve the reorder table for the requested view state
pub async fn get_reorder_view(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<ReorderViewResponse>> {
    let service = ReorderService::new(state.db);
    let raw = service.fetch_rows().await;

    let view = query.into_view_state();
    let (rows, summary) = engine::view(&raw, &view);

    Ok(Json(ReorderViewResponse {
        rows,
        summary,
        view,
    }))
}

/// Serve the report freshness metadata
pub async fn get_report_meta(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Option<ReportMeta>>> {
    let service = ReorderService::new(state.db);
    Ok(Json(service.fetch_report_meta().await))
}

/// Export the current view as a downloadable file
///
/// Responds 204 when the filtered view is empty: nothing to export is not
/// an error.
pub async fn export_reorder_view(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ViewQuery>,
) -> AppResult<Response> {
    let service = ReorderService::new(state.db);
    let raw = service.fetch_rows().await;

    let format = query.format.unwrap_or_default();
    let view = query.into_view_state();
    let (rows, _) = engine::view(&raw, &view);

    let response = match format {
        ExportFormat::Xlsx => match export::to_xlsx(&rows, view.window)? {
            None => StatusCode::NO_CONTENT.into_response(),
            Some(bytes) => file_response(
                bytes,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                XLSX_FILE_NAME,
            ),
        },
        ExportFormat::Csv => match export::to_csv(&rows, view.window)? {
            None => StatusCode::NO_CONTENT.into_response(),
            Some(text) => file_response(text.into_bytes(), "text/csv", CSV_FILE_NAME),
        },
    };

    Ok(response)
}

fn file_response(bytes: Vec<u8>, content_type: &str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}
