//! Run statistics collected by the coordinator and printed after a crawl

use crate::crawler::TaskKind;
use std::path::PathBuf;
use std::time::Duration;

/// Dispatched/succeeded/failed counters for one task kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounters {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl KindCounters {
    /// Percentage of dispatched tasks that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.dispatched == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.dispatched as f64) * 100.0
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub categories: KindCounters,
    pub pagination: KindCounters,
    pub products: KindCounters,

    /// Records kept by the aggregator
    pub records_kept: u64,

    /// Records discarded because their URL was already aggregated
    pub duplicates_discarded: u64,

    /// Category and pagination URLs skipped by the visited set
    pub revisits_skipped: u64,

    /// True when the crawl stopped on Ctrl-C
    pub interrupted: bool,

    pub elapsed: Duration,

    pub artifact: Option<PathBuf>,
    pub json_feed: Option<PathBuf>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters_mut(&mut self, kind: &TaskKind) -> &mut KindCounters {
        match kind {
            TaskKind::Category => &mut self.categories,
            TaskKind::Pagination { .. } => &mut self.pagination,
            TaskKind::Product => &mut self.products,
        }
    }

    pub fn record_dispatched(&mut self, kind: &TaskKind) {
        self.counters_mut(kind).dispatched += 1;
    }

    pub fn record_succeeded(&mut self, kind: &TaskKind) {
        self.counters_mut(kind).succeeded += 1;
    }

    pub fn record_failed(&mut self, kind: &TaskKind) {
        self.counters_mut(kind).failed += 1;
    }

    pub fn total_failed(&self) -> u64 {
        self.categories.failed + self.pagination.failed + self.products.failed
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Tasks:");
    for (label, counters) in [
        ("Categories", &stats.categories),
        ("Pagination", &stats.pagination),
        ("Products", &stats.products),
    ] {
        println!(
            "  {}: {} dispatched, {} succeeded, {} failed ({:.1}%)",
            label,
            counters.dispatched,
            counters.succeeded,
            counters.failed,
            counters.success_rate()
        );
    }
    println!();

    println!("Records:");
    println!("  Unique products: {}", stats.records_kept);
    println!("  Duplicates discarded: {}", stats.duplicates_discarded);
    if stats.revisits_skipped > 0 {
        println!("  Revisits skipped: {}", stats.revisits_skipped);
    }
    println!();

    if let Some(path) = &stats.artifact {
        println!("Export: {}", path.display());
    }
    if let Some(path) = &stats.json_feed {
        println!("JSON feed: {}", path.display());
    }
    if stats.interrupted {
        println!("Crawl was interrupted; the export covers products aggregated so far.");
    }

    println!("Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}
