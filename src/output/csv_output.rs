use super::traits::{ExportLayout, Exporter, OutputResult, HEADERS};
use crate::aggregate::AggregateStore;
use std::path::Path;

/// Writes comma-separated exports with a header row
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, store: &AggregateStore, layout: &ExportLayout, path: &Path) -> OutputResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADERS)?;

        for record in store.iter() {
            writer.write_record(layout.render_row(record))?;
        }

        writer.flush()?;
        tracing::debug!("Wrote {} rows to {}", store.len(), path.display());
        Ok(())
    }
}
