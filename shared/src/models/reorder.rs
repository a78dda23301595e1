//! Reorder view models
//!
//! Rows come from the hosted database's precomputed `v_reorder_final` view,
//! one per SKU x warehouse. Everything derived from them lives in
//! [`DerivedRow`] and is recomputed in full on every view change.

use serde::{Deserialize, Serialize};

/// Sentinel value meaning "no constraint" for the warehouse and brand filters
pub const FILTER_ALL: &str = "ALL";

/// A raw row from the precomputed reorder view
///
/// Run rates are `Option` because a SKU may have no recorded demand over a
/// window; `None` is "unknown", which is not the same thing as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRow {
    pub warehouse: String,
    pub product_name: String,
    pub brand: String,
    pub current_stock: f64,
    pub drr_7d: Option<f64>,
    pub drr_15d: Option<f64>,
    pub drr_30d: Option<f64>,
    pub drr_ytd: Option<f64>,
}

/// Trailing demand windows selectable on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DemandWindow {
    /// Shows every DRR column; the effective run rate is the 15-day one.
    /// This is a fixed business rule, not a UI default.
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "7D")]
    SevenDay,
    #[serde(rename = "15D")]
    FifteenDay,
    #[serde(rename = "30D")]
    ThirtyDay,
    #[serde(rename = "YTD")]
    Ytd,
}

impl DemandWindow {
    /// Select the run rate this window governs
    pub fn effective_drr(&self, row: &ReorderRow) -> Option<f64> {
        match self {
            // ALL aliases the 15-day rate, it is never an aggregate
            DemandWindow::All | DemandWindow::FifteenDay => row.drr_15d,
            DemandWindow::SevenDay => row.drr_7d,
            DemandWindow::ThirtyDay => row.drr_30d,
            DemandWindow::Ytd => row.drr_ytd,
        }
    }

    /// Column label used in exports and table headers
    pub fn label(&self) -> &'static str {
        match self {
            DemandWindow::All => "All DRR",
            DemandWindow::SevenDay => "7D DRR",
            DemandWindow::FifteenDay => "15D DRR",
            DemandWindow::ThirtyDay => "30D DRR",
            DemandWindow::Ytd => "YTD DRR",
        }
    }
}

/// Stock health for a derived row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Critical,
    Healthy,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Critical => "CRITICAL",
            StockStatus::Healthy => "HEALTHY",
        }
    }
}

/// A reorder row plus everything computed from it for the active window
///
/// Fields are pure functions of (row, window); nothing here is mutated after
/// derivation and nothing is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    #[serde(flatten)]
    pub row: ReorderRow,
    /// Run rate selected by the active window
    pub effective_drr: Option<f64>,
    /// Days of supply: `current_stock / effective_drr`, unknown when the
    /// run rate is unknown or zero
    pub dos: Option<f64>,
    pub status: StockStatus,
    pub reorder_qty: u64,
}

/// Status filter on the derived table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    Critical,
    Healthy,
}

/// Reorder filter on the derived table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReorderFilter {
    #[default]
    All,
    ReorderOnly,
}

/// Sortable columns of the derived table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Warehouse,
    ProductName,
    Brand,
    CurrentStock,
    #[serde(rename = "drr_7d")]
    Drr7d,
    #[serde(rename = "drr_15d")]
    Drr15d,
    #[serde(rename = "drr_30d")]
    Drr30d,
    #[serde(rename = "drr_ytd")]
    DrrYtd,
    Dos,
    ReorderQty,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn flipped(&self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// Everything the user has dialed in on the dashboard
///
/// The source app kept these as independent mutable flags; collapsing them
/// into one immutable struct makes the recomputation order explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub warehouse: String,
    pub brand: String,
    pub status: StatusFilter,
    pub reorder: ReorderFilter,
    pub search: String,
    pub sort_key: Option<SortKey>,
    pub sort_dir: SortDir,
    pub window: DemandWindow,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            warehouse: FILTER_ALL.to_string(),
            brand: FILTER_ALL.to_string(),
            status: StatusFilter::default(),
            reorder: ReorderFilter::default(),
            search: String::new(),
            sort_key: None,
            sort_dir: SortDir::default(),
            window: DemandWindow::default(),
        }
    }
}

/// KPI aggregates over the filtered row set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub total_count: usize,
    pub critical_count: usize,
    pub total_reorder_qty: u64,
    /// Mean days of supply over rows with a known DOS; `None` when no row
    /// has one. "Unknown" and zero are distinct and must stay distinct.
    pub avg_dos: Option<f64>,
}
