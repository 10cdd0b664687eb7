//! Output module for exports and run reports
//!
//! This module handles:
//! - Writing the consolidated product table (`.xlsx` or `.csv`)
//! - Writing the JSON product feed read back by the converter
//! - Choosing fresh timestamped file names
//! - Printing run statistics

mod csv_output;
mod json_feed;
mod paths;
pub mod stats;
mod traits;
mod xlsx;

pub use csv_output::CsvExporter;
pub use json_feed::{write_json_feed, JSON_FEED_PREFIX};
pub use paths::{timestamped_path, TIMESTAMP_FORMAT};
pub use stats::{print_statistics, KindCounters, RunStatistics};
pub use traits::{ExportLayout, Exporter, OutputError, OutputResult, COLUMN_WIDTHS, HEADERS};
pub use xlsx::{XlsxExporter, SHEET_NAME};

use crate::config::ExportFormat;

/// Returns the exporter for a configured format
pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Xlsx => Box::new(XlsxExporter),
        ExportFormat::Csv => Box::new(CsvExporter),
    }
}
