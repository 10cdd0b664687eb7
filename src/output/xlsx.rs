use super::traits::{ExportLayout, Exporter, OutputResult, COLUMN_WIDTHS, HEADERS};
use crate::aggregate::AggregateStore;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Name of the single worksheet
pub const SHEET_NAME: &str = "Products";

/// Longest text a spreadsheet cell accepts
const MAX_CELL_CHARS: usize = 32_767;

/// Writes `.xlsx` workbooks with one bold-headed sheet
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxExporter;

impl Exporter for XlsxExporter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write(&self, store: &AggregateStore, layout: &ExportLayout, path: &Path) -> OutputResult<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, *header, &header_format)?;
            worksheet.set_column_width(col, width)?;
        }

        for (index, record) in store.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in layout.render_row(record).iter().enumerate() {
                worksheet.write_string(row, col as u16, fit_cell(cell))?;
            }
        }

        workbook.save(path)?;
        tracing::debug!("Wrote {} rows to {}", store.len(), path.display());
        Ok(())
    }
}

fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ProductRecord;
    use crate::config::OutputConfig;

    #[test]
    fn test_fit_cell_truncates_long_text() {
        let long = "é".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(fit_cell(&long).chars().count(), MAX_CELL_CHARS);
        assert_eq!(fit_cell("short"), "short");
    }

    #[test]
    fn test_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.xlsx");

        let mut store = AggregateStore::new();
        store.insert(ProductRecord::placeholder("https://shop.com/catalogue/a/"));
        store.insert(ProductRecord::placeholder("https://shop.com/catalogue/b/"));

        XlsxExporter
            .write(&store, &ExportLayout::from(&OutputConfig::default()), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
