//! Offline conversion of JSON product feeds into one spreadsheet

use super::record::ProductRecord;
use super::store::AggregateStore;
use crate::config::ConverterConfig;
use crate::output::{exporter_for, timestamped_path, ExportLayout};
use std::fmt;
use std::path::{Path, PathBuf};

/// Why an input file was skipped
#[derive(Debug)]
pub enum LoadIssue {
    Unreadable(std::io::Error),
    InvalidJson(serde_json::Error),
    NotAList,
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "unreadable: {}", e),
            Self::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            Self::NotAList => write!(f, "top-level value is not a list"),
        }
    }
}

/// Per-file accounting of a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,

    /// Product records read from the file
    pub records: usize,

    /// Records that were new to the merged store
    pub kept: usize,
}

/// Result of merging a directory of feeds
#[derive(Debug, Default)]
pub struct LoadReport {
    pub store: AggregateStore,
    pub files: Vec<LoadedFile>,
    pub skipped: Vec<(PathBuf, LoadIssue)>,
}

/// Lists `<prefix>*.json` files in `dir`, sorted by file name
pub fn discover_export_files(dir: &Path, prefix: &str) -> crate::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(".json"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Reads one feed file as a store of its records
///
/// Elements that are not product objects or lack a URL are skipped.
pub fn load_export_file(path: &Path, category_delimiter: &str) -> Result<AggregateStore, LoadIssue> {
    let text = std::fs::read_to_string(path).map_err(LoadIssue::Unreadable)?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(LoadIssue::InvalidJson)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(LoadIssue::NotAList),
    };

    let total = items.len();
    let store: AggregateStore = items
        .into_iter()
        .filter_map(|item| ProductRecord::from_loose_json(item, category_delimiter))
        .collect();
    if store.len() < total {
        tracing::debug!(
            "{}: {} of {} entries were not usable products",
            path.display(),
            total - store.len(),
            total
        );
    }
    Ok(store)
}

/// Merges every `<prefix>*.json` file of `dir` in file-name order
///
/// Malformed files are skipped with a warning. The same directory content
/// always yields the same store.
pub fn load_export_files(
    dir: &Path,
    prefix: &str,
    category_delimiter: &str,
) -> crate::Result<LoadReport> {
    let mut report = LoadReport::default();

    for path in discover_export_files(dir, prefix)? {
        match load_export_file(&path, category_delimiter) {
            Ok(file_store) => {
                let records = file_store.len();
                let kept = report.store.merge(file_store);
                tracing::info!(
                    "{}: {} products ({} new)",
                    path.display(),
                    records,
                    kept
                );
                report.files.push(LoadedFile { path, records, kept });
            }
            Err(issue) => {
                tracing::warn!("Skipping {}: {}", path.display(), issue);
                report.skipped.push((path, issue));
            }
        }
    }

    Ok(report)
}

/// Runs the offline converter
///
/// Returns the written spreadsheet, or `None` when there were no input files
/// or no records to convert.
pub fn run_converter(config: &ConverterConfig) -> crate::Result<Option<PathBuf>> {
    let input = Path::new(&config.input_directory);
    let files = discover_export_files(input, &config.file_prefix)?;
    if files.is_empty() {
        tracing::info!(
            "No {}*.json files found in {}",
            config.file_prefix,
            input.display()
        );
        return Ok(None);
    }

    tracing::info!("Found {} input files:", files.len());
    for (i, file) in files.iter().enumerate() {
        tracing::info!("  {}. {}", i + 1, file.display());
    }

    let report = load_export_files(input, &config.file_prefix, &config.category_delimiter)?;
    if report.store.is_empty() {
        tracing::info!("No records to convert");
        return Ok(None);
    }
    tracing::info!("Total unique products: {}", report.store.len());

    let output = Path::new(&config.output_directory);
    std::fs::create_dir_all(output)?;

    let exporter = exporter_for(config.format);
    let path = timestamped_path(
        output,
        &config.output_name,
        exporter.extension(),
        chrono::Local::now(),
    );
    exporter.export(&report.store, &ExportLayout::from(config), &path)?;

    tracing::info!("Saved {} products to {}", report.store.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "products_2.json", "[]");
        write(dir.path(), "products_1.json", "[]");
        write(dir.path(), "products_3.txt", "[]");
        write(dir.path(), "other_1.json", "[]");
        std::fs::create_dir(dir.path().join("products_dir.json")).unwrap();

        let files = discover_export_files(dir.path(), "products_").unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["products_1.json", "products_2.json"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_export_files(&dir.path().join("nope"), "products_").is_err());
    }

    #[test]
    fn test_load_issues() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.json", "{ not json");
        write(dir.path(), "object.json", r#"{"url": "https://shop.com/a"}"#);

        assert!(matches!(
            load_export_file(&dir.path().join("bad.json"), " » "),
            Err(LoadIssue::InvalidJson(_))
        ));
        assert!(matches!(
            load_export_file(&dir.path().join("object.json"), " » "),
            Err(LoadIssue::NotAList)
        ));
        assert!(matches!(
            load_export_file(&dir.path().join("missing.json"), " » "),
            Err(LoadIssue::Unreadable(_))
        ));
    }

    #[test]
    fn test_records_without_url_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "products_1.json",
            r#"[{"url": "https://shop.com/a"}, {"name": "orphan"}, {"url": ""}, 42]"#,
        );

        let store = load_export_file(&dir.path().join("products_1.json"), " » ").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_run_converter_without_inputs_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConverterConfig {
            input_directory: dir.path().display().to_string(),
            output_directory: dir.path().join("out").display().to_string(),
            ..ConverterConfig::default()
        };

        assert_eq!(run_converter(&config).unwrap(), None);

        write(dir.path(), "products_1.json", r#"[{"name": "no url"}]"#);
        assert_eq!(run_converter(&config).unwrap(), None);
        assert!(!dir.path().join("out").exists());
    }
}
