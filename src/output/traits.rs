//! Exporter trait and the fixed export layout
//!
//! Every format writes the same eight columns in the same order; only the
//! separators used to flatten list fields vary between the crawl export and
//! the converter.

use crate::aggregate::{AggregateStore, ProductRecord};
use crate::config::{ConverterConfig, OutputConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export already failed for this run: {0}")]
    Finalize(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Header row of every export
pub const HEADERS: [&str; 8] = [
    "URL",
    "Category",
    "Name",
    "Code",
    "Description",
    "Price",
    "Specs",
    "Images",
];

/// Spreadsheet column widths, in character units
pub const COLUMN_WIDTHS: [f64; 8] = [50.0, 30.0, 40.0, 15.0, 60.0, 15.0, 40.0, 30.0];

/// Separators used to flatten list fields into cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    pub category_delimiter: String,
    pub specs_separator: String,
    pub images_separator: String,
}

impl ExportLayout {
    /// One export row, in [`HEADERS`] order
    pub fn render_row(&self, record: &ProductRecord) -> [String; 8] {
        [
            record.url.clone(),
            record.category.render(&self.category_delimiter),
            record.name.clone(),
            record.code.clone(),
            record.description.clone(),
            record.price.clone(),
            record.specs.join(&self.specs_separator),
            record.images.join(&self.images_separator),
        ]
    }
}

impl From<&OutputConfig> for ExportLayout {
    fn from(config: &OutputConfig) -> Self {
        Self {
            category_delimiter: config.category_delimiter.clone(),
            specs_separator: config.specs_separator.clone(),
            images_separator: config.images_separator.clone(),
        }
    }
}

impl From<&ConverterConfig> for ExportLayout {
    fn from(config: &ConverterConfig) -> Self {
        Self {
            category_delimiter: config.category_delimiter.clone(),
            specs_separator: config.specs_separator.clone(),
            images_separator: config.images_separator.clone(),
        }
    }
}

/// Writes an aggregate store as one tabular file
///
/// Implementations write the header row followed by one row per record in
/// store order. Callers go through [`Exporter::export`], which only ever
/// leaves a complete file at the final path.
pub trait Exporter: Send + Sync {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn write(&self, store: &AggregateStore, layout: &ExportLayout, path: &Path) -> OutputResult<()>;

    /// Writes to a `.part` sibling and renames it to `path` once complete;
    /// the sibling is removed when writing fails
    fn export(&self, store: &AggregateStore, layout: &ExportLayout, path: &Path) -> OutputResult<()> {
        let partial = partial_path(path);
        if let Err(e) = self.write(store, layout, &partial) {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                tracing::debug!("No partial file to remove at {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
        std::fs::rename(&partial, path)?;
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
