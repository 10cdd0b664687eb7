//! Product aggregation and deduplication
//!
//! - `record`: the product record and its permissive JSON reader
//! - `store`: insertion-ordered, first-seen-wins store keyed by canonical URL
//! - `session`: the shared aggregator of a crawl run (branch counting and
//!   finalize-once export)
//! - `convert`: offline merge of JSON feeds into one spreadsheet

mod convert;
pub mod record;
mod session;
mod store;

pub use convert::{
    discover_export_files, load_export_file, load_export_files, run_converter, LoadIssue,
    LoadReport, LoadedFile,
};
pub use record::{ProductRecord, NOT_SPECIFIED, NO_DESCRIPTION, NO_IMAGES};
pub use session::{Aggregator, BranchTicket, ExportReport, ExportTarget};
pub use store::AggregateStore;
