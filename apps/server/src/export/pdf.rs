//! PDF rendering of a [`ReportDocument`] with `printpdf`.
//!
//! A4 portrait, built-in Helvetica, text only:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Sales Report          (16pt) │
//! │ Corner Shop - ...     (10pt) │
//! │                              │
//! │ Gross revenue      1520.00   │  summary, two columns
//! │ ...                          │
//! │                              │
//! │ Payment methods  (bold 11pt) │
//! │ Method   Trans.   Total      │  header repeated on every page
//! │ Cash     12       480.00     │
//! └──────────────────────────────┘
//! ```
//!
//! Cells are truncated to their column width. Built-in fonts only cover
//! Latin-1, other characters print as `?`.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{ExportError, ReportDocument, ReportTable};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.5;
const BODY_SIZE: f32 = 9.0;

/// Average Helvetica glyph width at 1pt, in mm.
const CHAR_WIDTH_PER_PT: f32 = 0.18;

fn pdf_error(err: impl std::fmt::Debug) -> ExportError {
    ExportError::Pdf(format!("{:?}", err))
}

/// Keeps characters the built-in fonts can print.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 && !c.is_control() { c } else { '?' })
        .collect()
}

fn fit(text: &str, width_mm: f32, size: f32) -> String {
    let max_chars = (width_mm / (CHAR_WIDTH_PER_PT * size)).floor().max(1.0) as usize;
    let text = printable(text);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Tracks the current page and vertical position.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> Cursor<'a> {
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    /// Starts a new page if fewer than `needed` mm are left.
    fn ensure_room(&mut self, needed: f32) -> bool {
        if self.y - needed >= MARGIN {
            return false;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        true
    }
}

pub fn render(report: &ReportDocument) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        printable(&report.title),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Page 1".to_string(),
    );

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    cursor.advance(6.0);
    cursor.text(&fit(&report.title, PAGE_WIDTH - 2.0 * MARGIN, 16.0), 16.0, MARGIN, &fonts.bold);
    cursor.advance(7.0);

    if let Some(subtitle) = &report.subtitle {
        cursor.text(&fit(subtitle, PAGE_WIDTH - 2.0 * MARGIN, 10.0), 10.0, MARGIN, &fonts.regular);
        cursor.advance(LINE_HEIGHT);
    }
    cursor.advance(LINE_HEIGHT);

    let label_width = 80.0;
    for row in &report.summary {
        cursor.ensure_room(LINE_HEIGHT);
        cursor.text(&fit(&row.label, label_width, BODY_SIZE), BODY_SIZE, MARGIN, &fonts.regular);
        cursor.text(
            &fit(&row.value, PAGE_WIDTH - 2.0 * MARGIN - label_width, BODY_SIZE),
            BODY_SIZE,
            MARGIN + label_width,
            &fonts.bold,
        );
        cursor.advance(LINE_HEIGHT);
    }

    for table in &report.tables {
        cursor.advance(LINE_HEIGHT);
        draw_table(&mut cursor, table, &fonts);
    }

    drop(cursor);
    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_table(cursor: &mut Cursor<'_>, table: &ReportTable, fonts: &Fonts) {
    let columns = table
        .columns
        .len()
        .max(table.rows.iter().map(Vec::len).max().unwrap_or(0))
        .max(1);
    let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;

    // Heading plus header plus one row stay together
    cursor.ensure_room(LINE_HEIGHT * 3.0);

    if let Some(heading) = &table.heading {
        cursor.text(&fit(heading, PAGE_WIDTH - 2.0 * MARGIN, 11.0), 11.0, MARGIN, &fonts.bold);
        cursor.advance(LINE_HEIGHT + 1.0);
    }

    draw_header(cursor, table, fonts, col_width);

    for row in &table.rows {
        if cursor.ensure_room(LINE_HEIGHT) {
            draw_header(cursor, table, fonts, col_width);
        }
        for (i, cell) in row.iter().enumerate() {
            let x = MARGIN + i as f32 * col_width;
            cursor.text(&fit(cell, col_width - 2.0, BODY_SIZE), BODY_SIZE, x, &fonts.regular);
        }
        cursor.advance(LINE_HEIGHT);
    }
}

fn draw_header(cursor: &mut Cursor<'_>, table: &ReportTable, fonts: &Fonts, col_width: f32) {
    if table.columns.is_empty() {
        return;
    }
    for (i, column) in table.columns.iter().enumerate() {
        let x = MARGIN + i as f32 * col_width;
        cursor.text(&fit(column, col_width - 2.0, BODY_SIZE), BODY_SIZE, x, &fonts.bold);
    }
    cursor.advance(LINE_HEIGHT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SummaryRow;

    fn document(rows: usize) -> ReportDocument {
        ReportDocument {
            title: "Daily Sales".to_string(),
            subtitle: Some("Corner Shop".to_string()),
            summary: vec![SummaryRow {
                label: "Net revenue".to_string(),
                value: "12.00".to_string(),
            }],
            tables: vec![ReportTable {
                heading: Some("Lines".to_string()),
                columns: vec!["Item".into(), "Qty".into()],
                rows: (0..rows).map(|i| vec![format!("Item {}", i), "1".into()]).collect(),
            }],
        }
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&document(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_tables_paginate() {
        let short = render(&document(3)).unwrap();
        let long = render(&document(300)).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_fit_truncates() {
        assert_eq!(fit("short", 100.0, BODY_SIZE), "short");
        let cut = fit(&"x".repeat(200), 20.0, BODY_SIZE);
        assert!(cut.ends_with('~'));
        assert!(cut.chars().count() < 200);
    }

    #[test]
    fn test_printable_replaces_unsupported_chars() {
        assert_eq!(printable("Café ☕"), "Café ?");
    }
}
