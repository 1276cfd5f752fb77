//! # Report Export
//!
//! The sales and inventory reports are first laid out as a
//! [`ReportDocument`]; the CSV and PDF renderers only print documents, so
//! every format shows the same figures.
//!
//! ```text
//!   SalesSummary ─────┐                     ┌──► csv::render  ─► text/csv
//!                     ├──► ReportDocument ──┤
//!   InventorySummary ─┘        ▲            └──► pdf::render  ─► application/pdf
//!                              │
//!   POST /api/reports/pdf ─────┘ (SPA-built document)
//! ```
//!
//! Amounts are written as plain decimals (`1234.50`) so spreadsheets parse
//! them as numbers.

pub mod csv;
pub mod pdf;
pub mod receipt;

use serde::{Deserialize, Serialize};
use tally_core::report::{InventorySummary, SalesSummary};
use tally_core::Money;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Document Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

impl SummaryRow {
    fn new(label: &str, value: impl ToString) -> Self {
        SummaryRow {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    #[serde(default)]
    pub heading: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(heading: &str, columns: &[&str]) -> Self {
        ReportTable {
            heading: Some(heading.to_string()),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// A printable report: a title block, label/value pairs, then tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: Vec<SummaryRow>,
    #[serde(default)]
    pub tables: Vec<ReportTable>,
}

/// Body of `POST /api/reports/pdf`: a single-table report built by the SPA.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: Vec<SummaryRow>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl From<PdfRequest> for ReportDocument {
    fn from(req: PdfRequest) -> Self {
        let tables = if req.columns.is_empty() && req.rows.is_empty() {
            Vec::new()
        } else {
            vec![ReportTable {
                heading: None,
                columns: req.columns,
                rows: req.rows,
            }]
        };

        ReportDocument {
            title: req.title,
            subtitle: req.subtitle,
            summary: req.summary,
            tables,
        }
    }
}

/// `1234.50`
pub fn amount(cents: i64) -> String {
    Money::from_cents(cents).to_decimal_string()
}

/// Basis points as a percentage, no `%`: `2537` → `25.37`.
pub fn percent(bps: i64) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    let abs = bps.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

impl ReportDocument {
    pub fn sales(summary: &SalesSummary, store_name: &str) -> Self {
        let mut payments = ReportTable::new("Payment methods", &["Method", "Transactions", "Total"]);
        for p in &summary.by_payment_method {
            payments.rows.push(vec![
                p.method.label().to_string(),
                p.transaction_count.to_string(),
                amount(p.total_cents),
            ]);
        }

        let mut daily = ReportTable::new("Daily sales", &["Date", "Transactions", "Revenue"]);
        for d in &summary.daily {
            daily.rows.push(vec![
                d.date.to_string(),
                d.transaction_count.to_string(),
                amount(d.revenue_cents),
            ]);
        }

        let mut top = ReportTable::new("Top products", &["Product", "Quantity", "Revenue", "Profit"]);
        for p in &summary.top_products {
            top.rows.push(vec![
                p.name.clone(),
                p.quantity.to_string(),
                amount(p.revenue_cents),
                amount(p.profit_cents),
            ]);
        }

        ReportDocument {
            title: "Sales Report".to_string(),
            subtitle: Some(format!("{} - {} to {}", store_name, summary.from, summary.to)),
            summary: vec![
                SummaryRow::new("Gross revenue", amount(summary.gross_revenue_cents)),
                SummaryRow::new("Refunds", amount(summary.refunded_cents)),
                SummaryRow::new("Net revenue", amount(summary.net_revenue_cents)),
                SummaryRow::new("Cost of goods", amount(summary.cost_of_goods_cents)),
                SummaryRow::new("Gross profit", amount(summary.gross_profit_cents)),
                SummaryRow::new("Margin (%)", percent(summary.margin_bps)),
                SummaryRow::new("Transactions", summary.transaction_count),
                SummaryRow::new("Refunded transactions", summary.refund_count),
                SummaryRow::new("Items sold", summary.items_sold),
                SummaryRow::new("Average ticket", amount(summary.average_ticket_cents)),
            ],
            tables: vec![payments, daily, top],
        }
    }

    pub fn inventory(summary: &InventorySummary, store_name: &str) -> Self {
        let mut categories = ReportTable::new(
            "By category",
            &["Category", "Products", "Units", "Value at cost"],
        );
        for c in &summary.by_category {
            categories.rows.push(vec![
                c.category_name.clone(),
                c.product_count.to_string(),
                c.total_units.to_string(),
                amount(c.stock_value_cost_cents),
            ]);
        }

        let mut low = ReportTable::new("Low stock", &["Barcode", "Product", "In stock", "Minimum"]);
        for item in &summary.low_stock {
            low.rows.push(vec![
                item.barcode.clone(),
                item.name.clone(),
                item.stock_quantity.to_string(),
                item.min_stock_level.to_string(),
            ]);
        }

        ReportDocument {
            title: "Inventory Report".to_string(),
            subtitle: Some(store_name.to_string()),
            summary: vec![
                SummaryRow::new("Active products", summary.product_count),
                SummaryRow::new("Units in stock", summary.total_units),
                SummaryRow::new("Stock value (cost)", amount(summary.stock_value_cost_cents)),
                SummaryRow::new("Stock value (retail)", amount(summary.stock_value_retail_cents)),
                SummaryRow::new("Low stock", summary.low_stock_count),
                SummaryRow::new("Out of stock", summary.out_of_stock_count),
            ],
            tables: vec![categories, low],
        }
    }

    /// Looks up a summary value by label.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.summary
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_amount_and_percent() {
        assert_eq!(amount(123450), "1234.50");
        assert_eq!(amount(-5), "-0.05");
        assert_eq!(percent(2537), "25.37");
        assert_eq!(percent(-50), "-0.50");
        assert_eq!(percent(0), "0.00");
    }

    #[test]
    fn test_sales_document_uses_summary_figures() {
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let summary = SalesSummary::build(&[], day, day);
        let doc = ReportDocument::sales(&summary, "Corner Shop");

        assert_eq!(doc.value("Net revenue"), Some("0.00"));
        assert_eq!(doc.value("Transactions"), Some("0"));
        assert_eq!(doc.tables.len(), 3);
        assert_eq!(doc.tables[0].rows.len(), 3);
        assert_eq!(doc.tables[1].rows, vec![vec!["2026-05-04", "0", "0.00"]]);
        assert!(doc.subtitle.unwrap().contains("Corner Shop"));
    }

    #[test]
    fn test_pdf_request_becomes_single_table() {
        let req: PdfRequest = serde_json::from_value(serde_json::json!({
            "title": "Shift",
            "summary": [{ "label": "Sales", "value": "12" }],
            "columns": ["A", "B"],
            "rows": [["1", "2"]]
        }))
        .unwrap();

        let doc = ReportDocument::from(req);
        assert_eq!(doc.title, "Shift");
        assert_eq!(doc.subtitle, None);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].heading, None);
        assert_eq!(doc.value("Sales"), Some("12"));
    }
}
