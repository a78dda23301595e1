//! Spreadsheet export for the filtered reorder table
//!
//! The exported column set follows the active demand window: all four DRR
//! columns under `All`, a single one otherwise. Run rates are rounded to two
//! decimals, days of supply to one, and an unknown DOS exports as `NA`.
//! Exporting zero rows is a no-op, not an error.

use serde::Deserialize;

use shared::models::{DemandWindow, DerivedRow};

use crate::error::AppResult;

/// Fixed sheet name in the exported workbook
pub const EXPORT_SHEET_NAME: &str = "Reorder";

/// Fixed download filename for the XLSX export
pub const XLSX_FILE_NAME: &str = "TWBP_Reorder_Report.xlsx";

/// Fixed download filename for the CSV export
pub const CSV_FILE_NAME: &str = "TWBP_Reorder_Report.csv";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

/// DRR columns visible under a window
fn drr_columns(window: DemandWindow) -> Vec<DemandWindow> {
    match window {
        DemandWindow::All => vec![
            DemandWindow::SevenDay,
            DemandWindow::FifteenDay,
            DemandWindow::ThirtyDay,
            DemandWindow::Ytd,
        ],
        single => vec![single],
    }
}

fn drr_value(column: DemandWindow, row: &DerivedRow) -> f64 {
    // Null run rates export as 0 in the rate columns, matching the report
    // consumers' expectation; "unknown" survives only in the DOS column
    round2(column.effective_drr(&row.row).unwrap_or(0.0))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn header_row(columns: &[DemandWindow]) -> Vec<String> {
    let mut header = vec![
        "Warehouse".to_string(),
        "Product".to_string(),
        "Brand".to_string(),
        "Stock".to_string(),
    ];
    header.extend(columns.iter().map(|c| c.label().to_string()));
    header.extend([
        "DOS".to_string(),
        "Status".to_string(),
        "Reorder_Qty".to_string(),
    ]);
    header
}

/// Render the rows into an XLSX workbook
///
/// Returns `Ok(None)` when there is nothing to export.
pub fn to_xlsx(rows: &[DerivedRow], window: DemandWindow) -> AppResult<Option<Vec<u8>>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    if rows.is_empty() {
        return Ok(None);
    }

    let columns = drr_columns(window);

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, title) in header_row(&columns).iter().enumerate() {
        worksheet.write_string(0, col as u16, title)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let mut c: u16 = 0;

        worksheet.write_string(r, c, &row.row.warehouse)?;
        c += 1;
        worksheet.write_string(r, c, &row.row.product_name)?;
        c += 1;
        worksheet.write_string(r, c, &row.row.brand)?;
        c += 1;
        worksheet.write_number(r, c, row.row.current_stock)?;
        c += 1;

        for column in &columns {
            worksheet.write_number(r, c, drr_value(*column, row))?;
            c += 1;
        }

        match row.dos {
            Some(dos) => worksheet.write_number(r, c, round1(dos))?,
            None => worksheet.write_string(r, c, "NA")?,
        };
        c += 1;
        worksheet.write_string(r, c, row.status.as_str())?;
        c += 1;
        worksheet.write_number(r, c, row.reorder_qty as f64)?;
    }

    workbook.push_worksheet(worksheet);

    Ok(Some(workbook.save_to_buffer()?))
}

/// Render the rows into CSV text, same shape as the XLSX export
///
/// Returns `Ok(None)` when there is nothing to export.
pub fn to_csv(rows: &[DerivedRow], window: DemandWindow) -> AppResult<Option<String>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let columns = drr_columns(window);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(header_row(&columns))?;

    for row in rows {
        let mut record = vec![
            row.row.warehouse.clone(),
            row.row.product_name.clone(),
            row.row.brand.clone(),
            format!("{}", row.row.current_stock),
        ];
        for column in &columns {
            record.push(format!("{:.2}", drr_value(*column, row)));
        }
        record.push(match row.dos {
            Some(dos) => format!("{:.1}", dos),
            None => "NA".to_string(),
        });
        record.push(row.status.as_str().to_string());
        record.push(row.reorder_qty.to_string());

        wtr.write_record(record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| crate::error::AppError::Internal(format!("CSV writer error: {}", e)))?;
    let csv_data = String::from_utf8(bytes)
        .map_err(|e| crate::error::AppError::Internal(format!("CSV encoding error: {}", e)))?;

    Ok(Some(csv_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::engine;
    use shared::models::ReorderRow;

    fn derived(stock: f64, drr_15d: Option<f64>, window: DemandWindow) -> Vec<DerivedRow> {
        let row = ReorderRow {
            warehouse: "Bhiwandi".to_string(),
            product_name: "Widget".to_string(),
            brand: "TWBP".to_string(),
            current_stock: stock,
            drr_7d: Some(1.234),
            drr_15d,
            drr_30d: None,
            drr_ytd: None,
        };
        engine::derive(&[row], window)
    }

    #[test]
    fn empty_view_exports_nothing() {
        assert!(to_xlsx(&[], DemandWindow::All).unwrap().is_none());
        assert!(to_csv(&[], DemandWindow::All).unwrap().is_none());
    }

    #[test]
    fn all_window_exports_four_drr_columns() {
        let rows = derived(10.0, Some(2.0), DemandWindow::All);
        let csv = to_csv(&rows, DemandWindow::All).unwrap().unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "Warehouse,Product,Brand,Stock,7D DRR,15D DRR,30D DRR,YTD DRR,DOS,Status,Reorder_Qty"
        );
    }

    #[test]
    fn single_window_exports_one_drr_column() {
        let rows = derived(10.0, Some(2.0), DemandWindow::SevenDay);
        let csv = to_csv(&rows, DemandWindow::SevenDay).unwrap().unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "Warehouse,Product,Brand,Stock,7D DRR,DOS,Status,Reorder_Qty");
    }

    #[test]
    fn unknown_dos_exports_as_na() {
        let rows = derived(10.0, None, DemandWindow::FifteenDay);
        let csv = to_csv(&rows, DemandWindow::FifteenDay).unwrap().unwrap();
        let data = csv.lines().nth(1).unwrap();
        assert!(data.contains(",NA,"));
    }

    #[test]
    fn rates_round_to_two_decimals() {
        let rows = derived(10.0, Some(2.0), DemandWindow::SevenDay);
        let csv = to_csv(&rows, DemandWindow::SevenDay).unwrap().unwrap();
        // drr_7d = 1.234 rounds to 1.23
        assert!(csv.lines().nth(1).unwrap().contains("1.23"));
    }

    #[test]
    fn xlsx_export_produces_bytes() {
        let rows = derived(10.0, Some(2.0), DemandWindow::All);
        let bytes = to_xlsx(&rows, DemandWindow::All).unwrap().unwrap();
        assert!(!bytes.is_empty());
        // XLSX files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
