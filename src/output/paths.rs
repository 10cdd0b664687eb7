use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Timestamp format used in every generated file name
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Returns `<dir>/<prefix>_<timestamp>.<extension>`, appending `_1`, `_2`, ...
/// when that file already exists so earlier runs are never overwritten
pub fn timestamped_path(dir: &Path, prefix: &str, extension: &str, now: DateTime<Local>) -> PathBuf {
    let prefix = prefix.trim_end_matches('_');
    let stem = format!("{}_{}", prefix, now.format(TIMESTAMP_FORMAT));

    let mut candidate = dir.join(format!("{}.{}", stem, extension));
    let mut suffix = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", stem, suffix, extension));
        suffix += 1;
    }
    candidate
}
