//! Integration tests for the offline converter

use catalog_sweep::aggregate::{load_export_files, run_converter, LoadIssue};
use catalog_sweep::config::{ConverterConfig, ExportFormat};
use std::path::Path;

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn seed_feeds(dir: &Path) {
    write(
        dir,
        "products_20240101_100000.json",
        r#"[
            {"url": "https://shop.com/catalogue/a/", "categories": ["Oils"], "name": "First A"},
            {"url": "https://shop.com/catalogue/b/", "categories": ["Oils", "Motor"], "name": "B"}
        ]"#,
    );
    write(
        dir,
        "products_20240102_100000.json",
        r#"[
            {"url": "https://shop.com/catalogue/a/", "category": "Tyres » Summer", "name": "Second A"},
            {"url": "https://shop.com/catalogue/c/", "category": "Tyres", "price": 1500}
        ]"#,
    );
    write(dir, "products_20240103_100000.json", "[{\"url\": ");
    write(dir, "notes.json", r#"[{"url": "https://shop.com/catalogue/x/"}]"#);
}

#[test]
fn test_merge_is_deterministic_and_first_seen_wins() {
    let dir = tempfile::tempdir().unwrap();
    seed_feeds(dir.path());

    let first = load_export_files(dir.path(), "products_", " » ").unwrap();
    let second = load_export_files(dir.path(), "products_", " » ").unwrap();

    assert_eq!(
        serde_json::to_string(first.store.records()).unwrap(),
        serde_json::to_string(second.store.records()).unwrap()
    );

    let urls: Vec<&str> = first.store.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://shop.com/catalogue/a/",
            "https://shop.com/catalogue/b/",
            "https://shop.com/catalogue/c/",
        ]
    );
    let a = first.store.get("https://shop.com/catalogue/a/").unwrap();
    assert_eq!(a.name, "First A");
    assert_eq!(a.category.segments(), &["Oils"]);

    assert_eq!(first.files.len(), 2);
    assert_eq!(first.files[1].records, 2);
    assert_eq!(first.files[1].kept, 1);
    assert_eq!(first.skipped.len(), 1);
    assert!(matches!(first.skipped[0].1, LoadIssue::InvalidJson(_)));
}

#[test]
fn test_run_converter_writes_one_spreadsheet() {
    let dir = tempfile::tempdir().unwrap();
    seed_feeds(dir.path());

    let config = ConverterConfig {
        input_directory: dir.path().display().to_string(),
        output_directory: dir.path().join("combined").display().to_string(),
        format: ExportFormat::Csv,
        ..ConverterConfig::default()
    };

    let path = run_converter(&config)
        .unwrap()
        .expect("records should be converted");
    assert!(path.starts_with(dir.path().join("combined")));
    assert!(path
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("combined_products_"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("URL"));
    assert_eq!(headers.get(1), Some("Category"));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].get(1), Some("Oils » Motor"));
    assert_eq!(rows[2].get(5), Some("1500"));

    let again = run_converter(&config).unwrap().unwrap();
    assert_ne!(path, again, "a second run never overwrites the first");
}

#[test]
fn test_run_converter_writes_xlsx_by_default() {
    let dir = tempfile::tempdir().unwrap();
    seed_feeds(dir.path());

    let config = ConverterConfig {
        input_directory: dir.path().display().to_string(),
        output_directory: dir.path().display().to_string(),
        ..ConverterConfig::default()
    };

    let path = run_converter(&config).unwrap().unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}
