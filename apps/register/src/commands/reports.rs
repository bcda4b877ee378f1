//! # Report Commands

use bodega_core::SalesReport;
use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;

/// How many recent transactions a report covers by default.
const DEFAULT_REPORT_WINDOW: u32 = 1000;

/// Aggregates the most recent `limit` transactions.
pub async fn sales_report(db: &DbState, limit: Option<u32>) -> Result<SalesReport, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_REPORT_WINDOW);
    let transactions = db.inner().ledger().list(limit).await?;
    let report = SalesReport::from_transactions(&transactions);

    info!(
        transactions = report.transaction_count,
        gross = %report.gross_total,
        "Sales report built"
    );
    Ok(report)
}
