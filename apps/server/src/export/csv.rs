//! CSV rendering of a [`ReportDocument`].
//!
//! ```text
//! Sales Report
//! Corner Shop - 2026-05-01 to 2026-05-07
//! Gross revenue,1520.00          ◄── summary: label,value
//! ...
//! Payment methods                ◄── table heading
//! Method,Transactions,Total      ◄── columns
//! Cash,12,480.00                 ◄── rows
//! ```
//!
//! Records have different widths, so the writer runs in flexible mode.

use ::csv::WriterBuilder;

use super::{ExportError, ReportDocument};

pub fn render(doc: &ReportDocument) -> Result<Vec<u8>, ExportError> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    wtr.write_record([doc.title.as_str()])?;
    if let Some(subtitle) = &doc.subtitle {
        wtr.write_record([subtitle.as_str()])?;
    }

    for row in &doc.summary {
        wtr.write_record([row.label.as_str(), row.value.as_str()])?;
    }

    for table in &doc.tables {
        if let Some(heading) = &table.heading {
            wtr.write_record([heading.as_str()])?;
        }
        if !table.columns.is_empty() {
            wtr.write_record(&table.columns)?;
        }
        for row in &table.rows {
            wtr.write_record(row)?;
        }
    }

    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ReportTable, SummaryRow};

    fn document() -> ReportDocument {
        ReportDocument {
            title: "Inventory Report".to_string(),
            subtitle: None,
            summary: vec![SummaryRow {
                label: "Stock value (cost)".to_string(),
                value: "1234.50".to_string(),
            }],
            tables: vec![ReportTable {
                heading: Some("Low stock".to_string()),
                columns: vec!["Barcode".into(), "Product".into()],
                rows: vec![vec!["123".into(), "Pen, blue".into()]],
            }],
        }
    }

    #[test]
    fn test_render_layout() {
        let bytes = render(&document()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Inventory Report",
                "Stock value (cost),1234.50",
                "Low stock",
                "Barcode,Product",
                "123,\"Pen, blue\"",
            ]
        );
    }

    #[test]
    fn test_output_parses_back() {
        let bytes = render(&document()).unwrap();
        let mut rdr = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let records: Vec<::csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 5);
        assert_eq!(&records[4][1], "Pen, blue");
    }
}
