//! Shared aggregation state of one crawl run
//!
//! The aggregator is the only mutable resource shared between branches. One
//! mutex guards both `insert` and `finalize`, and an atomic counter of open
//! branches decides when the run is complete: every task holds a
//! [`BranchTicket`] from before it is queued until its children have been
//! ticketed and its record inserted. The close that takes the counter from 1
//! to 0 finalizes the run.

use super::record::ProductRecord;
use super::store::AggregateStore;
use crate::config::{ExportFormat, OutputConfig};
use crate::output::{
    exporter_for, timestamped_path, write_json_feed, ExportLayout, OutputError, JSON_FEED_PREFIX,
};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where and how the run's export is written
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub format: ExportFormat,
    pub layout: ExportLayout,

    /// Directory of the JSON product feed; `None` disables the feed
    pub json_feed_directory: Option<PathBuf>,
}

impl From<&OutputConfig> for ExportTarget {
    fn from(config: &OutputConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            file_prefix: config.file_prefix.clone(),
            format: config.format,
            layout: ExportLayout::from(config),
            json_feed_directory: config
                .json_feed
                .then(|| PathBuf::from(&config.json_feed_directory)),
        }
    }
}

/// Outcome of a successful finalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// The spreadsheet written
    pub artifact: PathBuf,

    /// The JSON feed written, if enabled and successful
    pub json_feed: Option<PathBuf>,

    pub records: usize,

    /// True when the configured directory failed and the system temp
    /// directory was used instead
    pub used_fallback: bool,
}

#[derive(Debug)]
enum Finalization {
    Open,
    Done(ExportReport),
    Failed(String),
}

#[derive(Debug)]
struct Inner {
    store: AggregateStore,
    duplicates: u64,
    finalization: Finalization,
}

/// Thread-safe front of the aggregate store for one crawl run
#[derive(Debug)]
pub struct Aggregator {
    inner: Mutex<Inner>,
    open_branches: AtomicUsize,
    target: ExportTarget,
}

impl Aggregator {
    pub fn new(target: ExportTarget) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: AggregateStore::new(),
                duplicates: 0,
                finalization: Finalization::Open,
            }),
            open_branches: AtomicUsize::new(0),
            target,
        }
    }

    pub fn target(&self) -> &ExportTarget {
        &self.target
    }

    /// Inserts a record, first-seen-wins; returns true if it was kept
    ///
    /// Records arriving after a successful export are discarded.
    pub fn insert(&self, record: ProductRecord) -> bool {
        let mut inner = self.lock();
        if matches!(inner.finalization, Finalization::Done(_)) {
            tracing::warn!("Discarding {}: export already written", record.url);
            return false;
        }

        let kept = inner.store.insert(record);
        if !kept {
            inner.duplicates += 1;
        }
        kept
    }

    /// Opens a branch; the ticket must be closed once the branch's work is done
    pub fn open_branch(self: &Arc<Self>) -> BranchTicket {
        self.open_branches.fetch_add(1, Ordering::AcqRel);
        BranchTicket {
            aggregator: Arc::clone(self),
            open: true,
        }
    }

    pub fn open_branches(&self) -> usize {
        self.open_branches.load(Ordering::Acquire)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duplicates(&self) -> u64 {
        self.lock().duplicates
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.lock().finalization, Finalization::Done(_))
    }

    /// Copy of the current store
    pub fn snapshot(&self) -> AggregateStore {
        self.lock().store.clone()
    }

    /// Writes the export once per run
    ///
    /// The first call writes the spreadsheet (falling back to the system temp
    /// directory if the configured one fails) and the JSON feed. Later calls
    /// return the first outcome without writing anything.
    pub fn finalize(&self) -> crate::Result<ExportReport> {
        let mut inner = self.lock();
        match &inner.finalization {
            Finalization::Done(report) => return Ok(report.clone()),
            Finalization::Failed(message) => {
                return Err(OutputError::Finalize(message.clone()).into())
            }
            Finalization::Open => {}
        }

        let now = Local::now();
        let result = match self.write_artifact(&inner.store, &self.target.directory, now) {
            Ok(path) => Ok((path, false)),
            Err(e) => {
                tracing::error!(
                    "Failed to write export to {}: {}",
                    self.target.directory.display(),
                    e
                );
                let fallback = std::env::temp_dir();
                tracing::warn!("Retrying export in {}", fallback.display());
                self.write_artifact(&inner.store, &fallback, now)
                    .map(|path| (path, true))
            }
        };

        match result {
            Ok((artifact, used_fallback)) => {
                let report = self.complete(&mut inner, artifact, used_fallback, now);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Export failed, {} records kept in memory: {}", inner.store.len(), e);
                inner.finalization = Finalization::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Writes the export into `directory`, regardless of an earlier failure
    ///
    /// Used to retry after [`Aggregator::finalize`] reported an error; the
    /// records are still held at that point.
    pub fn finalize_to(&self, directory: &Path) -> crate::Result<ExportReport> {
        let mut inner = self.lock();
        if let Finalization::Done(report) = &inner.finalization {
            return Ok(report.clone());
        }

        let now = Local::now();
        let artifact = self.write_artifact(&inner.store, directory, now)?;
        Ok(self.complete(&mut inner, artifact, false, now))
    }

    fn complete(
        &self,
        inner: &mut Inner,
        artifact: PathBuf,
        used_fallback: bool,
        now: DateTime<Local>,
    ) -> ExportReport {
        let json_feed = self
            .target
            .json_feed_directory
            .as_deref()
            .and_then(|dir| match self.write_feed(&inner.store, dir, now) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::error!("Failed to write JSON feed to {}: {}", dir.display(), e);
                    None
                }
            });

        let report = ExportReport {
            artifact,
            json_feed,
            records: inner.store.len(),
            used_fallback,
        };
        tracing::info!(
            "Exported {} products to {}",
            report.records,
            report.artifact.display()
        );

        inner.store = AggregateStore::new();
        inner.finalization = Finalization::Done(report.clone());
        report
    }

    fn write_artifact(
        &self,
        store: &AggregateStore,
        directory: &Path,
        now: DateTime<Local>,
    ) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let exporter = exporter_for(self.target.format);
        let path = timestamped_path(directory, &self.target.file_prefix, exporter.extension(), now);
        exporter.export(store, &self.target.layout, &path)?;
        Ok(path)
    }

    fn write_feed(
        &self,
        store: &AggregateStore,
        directory: &Path,
        now: DateTime<Local>,
    ) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let path = timestamped_path(directory, JSON_FEED_PREFIX, "json", now);
        write_json_feed(store, &path)?;
        Ok(path)
    }

    fn close_branch(&self) -> Option<crate::Result<ExportReport>> {
        let previous = self.open_branches.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            tracing::debug!("Last branch closed, finalizing");
            Some(self.finalize())
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks one open branch of the crawl
///
/// Closing the last open ticket finalizes the aggregator. A ticket dropped
/// without [`BranchTicket::close`] (an aborted task) only releases its count;
/// the owner of the run then finalizes explicitly.
#[derive(Debug)]
#[must_use = "an open branch keeps the run from finalizing"]
pub struct BranchTicket {
    aggregator: Arc<Aggregator>,
    open: bool,
}

impl BranchTicket {
    /// Closes the branch; returns the finalization outcome if this was the
    /// last open branch
    pub fn close(mut self) -> Option<crate::Result<ExportReport>> {
        self.open = false;
        self.aggregator.close_branch()
    }
}

impl Drop for BranchTicket {
    fn drop(&mut self) {
        if self.open {
            self.aggregator.open_branches.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
