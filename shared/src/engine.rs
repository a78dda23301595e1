//! The reorder derivation pipeline
//!
//! Pure and total: no I/O, no suspension, no shared state. The full view is
//! always `sort(filter(derive(rows, window), view), key, dir)` — derive runs
//! on the complete unfiltered row set first, because the status and
//! reorder-quantity filters are undefined before derivation.

use std::cmp::Ordering;

use crate::models::{
    DemandWindow, DerivedRow, ReorderFilter, ReorderRow, SortDir, SortKey, StatusFilter,
    StockStatus, ViewState, ViewSummary, FILTER_ALL,
};

/// A row is flagged critical below this many days of supply
pub const CRITICAL_DOS_THRESHOLD: f64 = 7.0;

/// Reorder brings projected supply up to this many days
pub const REORDER_TARGET_DAYS: f64 = 15.0;

/// Product search kicks in at this many characters
pub const MIN_SEARCH_LEN: usize = 3;

/// Compute the derived fields for every row under the active window
///
/// Total over the documented input domain: a null or zero run rate yields a
/// null DOS and a zero reorder quantity, never a division error.
pub fn derive(rows: &[ReorderRow], window: DemandWindow) -> Vec<DerivedRow> {
    rows.iter().map(|row| derive_row(row, window)).collect()
}

fn derive_row(row: &ReorderRow, window: DemandWindow) -> DerivedRow {
    let effective_drr = window.effective_drr(row);

    let dos = match effective_drr {
        Some(drr) if drr > 0.0 => Some(row.current_stock / drr),
        _ => None,
    };

    let status = if row.current_stock <= 0.0 {
        StockStatus::Critical
    } else if dos.is_some_and(|d| d < CRITICAL_DOS_THRESHOLD) {
        StockStatus::Critical
    } else {
        StockStatus::Healthy
    };

    let reorder_qty = match (effective_drr, dos) {
        (Some(drr), Some(dos)) if dos <= CRITICAL_DOS_THRESHOLD => {
            let qty = (drr * REORDER_TARGET_DAYS - row.current_stock).ceil();
            if qty > 0.0 {
                qty as u64
            } else {
                0
            }
        }
        _ => 0,
    };

    DerivedRow {
        row: row.clone(),
        effective_drr,
        dos,
        status,
        reorder_qty,
    }
}

/// Keep the rows matching every active filter, in their original order
///
/// The predicates are commutative conjunctions; application order never
/// affects the result.
pub fn filter(derived: Vec<DerivedRow>, view: &ViewState) -> Vec<DerivedRow> {
    let search = view.search.trim().to_lowercase();
    // Threshold is in characters, not bytes; a two-character CJK query must
    // stay inactive even though it is six bytes long.
    let search_active = search.chars().count() >= MIN_SEARCH_LEN;

    derived
        .into_iter()
        .filter(|r| {
            if view.warehouse != FILTER_ALL && r.row.warehouse != view.warehouse {
                return false;
            }
            if view.brand != FILTER_ALL && r.row.brand != view.brand {
                return false;
            }
            let status_ok = match view.status {
                StatusFilter::All => true,
                StatusFilter::Critical => r.status == StockStatus::Critical,
                StatusFilter::Healthy => r.status == StockStatus::Healthy,
            };
            if !status_ok {
                return false;
            }
            if view.reorder == ReorderFilter::ReorderOnly && r.reorder_qty == 0 {
                return false;
            }
            if search_active && !r.row.product_name.to_lowercase().contains(&search) {
                return false;
            }
            true
        })
        .collect()
}

/// Stable sort by the selected key; no-op when no key is set
///
/// Inside the comparator a null numeric sorts as 0. The source app treats
/// null as a distinct "unknown" everywhere else (status, DOS display,
/// averaging) but as 0 here; that asymmetry is kept on purpose.
pub fn sort(rows: &mut [DerivedRow], key: Option<SortKey>, dir: SortDir) {
    let Some(key) = key else { return };

    match key {
        SortKey::Warehouse => sort_text(rows, dir, |r| &r.row.warehouse),
        SortKey::ProductName => sort_text(rows, dir, |r| &r.row.product_name),
        SortKey::Brand => sort_text(rows, dir, |r| &r.row.brand),
        SortKey::CurrentStock => sort_numeric(rows, dir, |r| r.row.current_stock),
        SortKey::Drr7d => sort_numeric(rows, dir, |r| r.row.drr_7d.unwrap_or(0.0)),
        SortKey::Drr15d => sort_numeric(rows, dir, |r| r.row.drr_15d.unwrap_or(0.0)),
        SortKey::Drr30d => sort_numeric(rows, dir, |r| r.row.drr_30d.unwrap_or(0.0)),
        SortKey::DrrYtd => sort_numeric(rows, dir, |r| r.row.drr_ytd.unwrap_or(0.0)),
        SortKey::Dos => sort_numeric(rows, dir, |r| r.dos.unwrap_or(0.0)),
        SortKey::ReorderQty => sort_numeric(rows, dir, |r| r.reorder_qty as f64),
    }
}

fn sort_text<F>(rows: &mut [DerivedRow], dir: SortDir, field: F)
where
    F: Fn(&DerivedRow) -> &str,
{
    // Case-insensitive lexicographic order stands in for locale collation
    rows.sort_by(|a, b| {
        let ord = field(a)
            .to_lowercase()
            .cmp(&field(b).to_lowercase())
            .then_with(|| field(a).cmp(field(b)));
        apply_dir(ord, dir)
    });
}

fn sort_numeric<F>(rows: &mut [DerivedRow], dir: SortDir, field: F)
where
    F: Fn(&DerivedRow) -> f64,
{
    rows.sort_by(|a, b| apply_dir(field(a).total_cmp(&field(b)), dir));
}

fn apply_dir(ord: Ordering, dir: SortDir) -> Ordering {
    match dir {
        SortDir::Asc => ord,
        SortDir::Desc => ord.reverse(),
    }
}

/// Click-a-column-header semantics: same key flips the direction, a new key
/// resets it to ascending
pub fn toggle_sort(view: &mut ViewState, key: SortKey) {
    if view.sort_key == Some(key) {
        view.sort_dir = view.sort_dir.flipped();
    } else {
        view.sort_key = Some(key);
        view.sort_dir = SortDir::Asc;
    }
}

/// KPI aggregates over the filtered rows
pub fn summarize(rows: &[DerivedRow]) -> ViewSummary {
    let known_dos: Vec<f64> = rows.iter().filter_map(|r| r.dos).collect();
    let avg_dos = if known_dos.is_empty() {
        None
    } else {
        Some(known_dos.iter().sum::<f64>() / known_dos.len() as f64)
    };

    ViewSummary {
        total_count: rows.len(),
        critical_count: rows
            .iter()
            .filter(|r| r.status == StockStatus::Critical)
            .count(),
        total_reorder_qty: rows.iter().map(|r| r.reorder_qty).sum(),
        avg_dos,
    }
}

/// The whole pipeline in the contractual order: derive, filter, sort
pub fn view(rows: &[ReorderRow], view: &ViewState) -> (Vec<DerivedRow>, ViewSummary) {
    let mut visible = filter(derive(rows, view.window), view);
    sort(&mut visible, view.sort_key, view.sort_dir);
    let summary = summarize(&visible);
    (visible, summary)
}
