//! Data source for the reorder dashboard
//!
//! All derivation happens in `shared::engine`; this service only fetches the
//! precomputed `v_reorder_final` view in one shot. The view and the report
//! freshness view are maintained by the hosted database, not by this repo's
//! migrations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::time::Duration;

use shared::models::ReorderRow;

/// Delay before the single fetch retry
const FETCH_RETRY_DELAY: Duration = Duration::from_millis(800);

/// Run a fetch attempt, retrying exactly once after a fixed delay
///
/// An error or an empty first result triggers the retry; a failure on the
/// second attempt degrades to an empty set, so the caller never sees a
/// partial or error state.
async fn fetch_with_retry<F, Fut>(mut attempt: F) -> Vec<ReorderRow>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<ReorderRow>, sqlx::Error>>,
{
    match attempt().await {
        Ok(rows) if !rows.is_empty() => return rows,
        Ok(_) => tracing::warn!("reorder view returned no rows, retrying once"),
        Err(e) => tracing::warn!(error = %e, "reorder view fetch failed, retrying once"),
    }

    tokio::time::sleep(FETCH_RETRY_DELAY).await;

    match attempt().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "reorder view fetch failed after retry, serving empty set");
            Vec::new()
        }
    }
}

/// Reorder view data source
#[derive(Clone)]
pub struct ReorderService {
    db: PgPool,
}

/// Row shape of `v_reorder_final`
#[derive(Debug, FromRow)]
struct ReorderViewRow {
    warehouse: String,
    product_name: String,
    brand: String,
    current_stock: f64,
    drr_7d: Option<f64>,
    drr_15d: Option<f64>,
    drr_30d: Option<f64>,
    drr_ytd: Option<f64>,
}

impl From<ReorderViewRow> for ReorderRow {
    fn from(r: ReorderViewRow) -> Self {
        ReorderRow {
            warehouse: r.warehouse,
            product_name: r.product_name,
            brand: r.brand,
            current_stock: r.current_stock,
            drr_7d: r.drr_7d,
            drr_15d: r.drr_15d,
            drr_30d: r.drr_30d,
            drr_ytd: r.drr_ytd,
        }
    }
}

/// Freshness metadata for the dashboard header, from `v_report_last_updated`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportMeta {
    pub stock_business_date: Option<NaiveDate>,
    pub stock_uploaded_at: Option<DateTime<Utc>>,
    pub sales_business_date: Option<NaiveDate>,
    pub sales_uploaded_at: Option<DateTime<Utc>>,
}

impl ReorderService {
    /// Create a new ReorderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch the full reorder row set
    ///
    /// One call returns everything (no pagination); the retry-once policy
    /// lives in [`fetch_with_retry`].
    pub async fn fetch_rows(&self) -> Vec<ReorderRow> {
        fetch_with_retry(|| self.query_rows()).await
    }

    async fn query_rows(&self) -> Result<Vec<ReorderRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ReorderViewRow>(
            r#"
            SELECT warehouse, product_name, brand, current_stock,
                   drr_7d, drr_15d, drr_30d, drr_ytd
            FROM v_reorder_final
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ReorderRow::from).collect())
    }

    /// Fetch report freshness metadata, best effort
    pub async fn fetch_report_meta(&self) -> Option<ReportMeta> {
        match sqlx::query_as::<_, ReportMeta>(
            r#"
            SELECT stock_business_date, stock_uploaded_at,
                   sales_business_date, sales_uploaded_at
            FROM v_report_last_updated
            "#,
        )
        .fetch_optional(&self.db)
        .await
        {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(error = %e, "report meta fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample_row() -> ReorderRow {
        ReorderRow {
            warehouse: "Bhiwandi".to_string(),
            product_name: "Widget".to_string(),
            brand: "TWBP".to_string(),
            current_stock: 10.0,
            drr_7d: None,
            drr_15d: Some(2.0),
            drr_30d: None,
            drr_ytd: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_skips_the_retry() {
        let calls = Cell::new(0u32);
        let rows = fetch_with_retry(|| {
            calls.set(calls.get() + 1);
            async { Ok::<_, sqlx::Error>(vec![sample_row()]) }
        })
        .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_first_result_is_retried_once() {
        let calls = Cell::new(0u32);
        let rows = fetch_with_retry(|| {
            calls.set(calls.get() + 1);
            let first = calls.get() == 1;
            async move {
                if first {
                    Ok::<_, sqlx::Error>(Vec::new())
                } else {
                    Ok(vec![sample_row()])
                }
            }
        })
        .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_recovers_on_the_retry() {
        let calls = Cell::new(0u32);
        let rows = fetch_with_retry(|| {
            calls.set(calls.get() + 1);
            let first = calls.get() == 1;
            async move {
                if first {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(vec![sample_row()])
                }
            }
        })
        .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_degrade_to_an_empty_set() {
        let calls = Cell::new(0u32);
        let rows = fetch_with_retry(|| {
            calls.set(calls.get() + 1);
            async { Err::<Vec<ReorderRow>, _>(sqlx::Error::PoolTimedOut) }
        })
        .await;

        assert!(rows.is_empty());
        assert_eq!(calls.get(), 2);
    }
}
