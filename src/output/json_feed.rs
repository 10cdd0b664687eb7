use super::traits::OutputResult;
use crate::aggregate::AggregateStore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name prefix of the JSON product feed; matches the converter's default
/// input prefix so feeds can be merged later
pub const JSON_FEED_PREFIX: &str = "products";

/// Writes the store as a JSON list of product objects
pub fn write_json_feed(store: &AggregateStore, path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, store.records())?;
    writer.flush()?;

    tracing::debug!("Wrote JSON feed with {} records to {}", store.len(), path.display());
    Ok(())
}
