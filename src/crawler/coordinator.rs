//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier and opening a branch ticket per task
//! - Running fetches concurrently up to the configured limit
//! - Dispatching fetched pages on their task kind
//! - Feeding product records to the aggregator
//! - Handling Ctrl-C and the final export

use super::fetcher::{FetchFailure, FetchedPage, HttpFetcher, PageFetcher};
use super::scheduler::Scheduler;
use super::task::{CrawlTask, TaskKind};
use crate::aggregate::{Aggregator, BranchTicket, ExportReport, ExportTarget, ProductRecord};
use crate::config::Config;
use crate::extract::{category_label, extract_links, extract_product, CompiledSelectors, PageLinks};
use crate::output::stats::RunStatistics;
use crate::state::TaskState;
use scraper::Html;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// What a fetched page turned out to contain
#[derive(Debug)]
enum PageData {
    Listing {
        label: Option<String>,
        links: PageLinks,
    },
    Product(ProductRecord),
}

/// A finished task, handed back to the coordinator loop
struct TaskDone {
    task: CrawlTask,
    ticket: BranchTicket,
    state: TaskState,
    outcome: Result<PageData, FetchFailure>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    selectors: Arc<CompiledSelectors>,
    scheduler: Scheduler,
    aggregator: Arc<Aggregator>,
    stats: RunStatistics,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP
    pub fn new(config: Config) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(
            config.fetcher.clone(),
            config.crawler.max_concurrent_pages_open as usize,
        )?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator over any page source
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> crate::Result<Self> {
        let selectors = CompiledSelectors::compile(&config.selectors)?;
        let scheduler = Scheduler::new(&config.crawler);
        let aggregator = Arc::new(Aggregator::new(ExportTarget::from(&config.output)));

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            selectors: Arc::new(selectors),
            scheduler,
            aggregator,
            stats: RunStatistics::new(),
        })
    }

    /// The aggregator of this run
    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Runs the crawl until the frontier drains or Ctrl-C is pressed
    pub async fn run(&mut self) -> crate::Result<RunStatistics> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the crawl until the frontier drains or `shutdown` completes
    ///
    /// On shutdown no further task is dispatched, in-flight tasks are aborted
    /// and whatever was aggregated is still exported.
    pub async fn run_until<F>(&mut self, shutdown: F) -> crate::Result<RunStatistics>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let limit = (self.config.crawler.max_concurrent_pages_open as usize).max(1);

        let seeds = self.scheduler.seed(&self.config.crawler.seeds);
        tracing::info!(
            "Starting crawl: {} seeds, max depth {}, max page {}, {} concurrent pages",
            seeds.len(),
            self.config.crawler.max_depth,
            self.config.crawler.max_page,
            limit
        );

        let mut frontier: VecDeque<(CrawlTask, BranchTicket)> = seeds
            .into_iter()
            .map(|task| (task, self.aggregator.open_branch()))
            .collect();
        let mut in_flight: JoinSet<TaskDone> = JoinSet::new();

        let mut handled: u64 = 0;

        tokio::pin!(shutdown);
        loop {
            while in_flight.len() < limit {
                let Some((task, ticket)) = frontier.pop_front() else {
                    break;
                };
                self.stats.record_dispatched(&task.kind);
                in_flight.spawn(process_task(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.selectors),
                    task,
                    ticket,
                ));
            }

            if in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::warn!(
                        "Interrupted: aborting {} in-flight tasks, dropping {} queued",
                        in_flight.len(),
                        frontier.len()
                    );
                    self.stats.interrupted = true;
                    in_flight.abort_all();
                    break;
                }

                joined = in_flight.join_next() => match joined {
                    Some(Ok(done)) => self.handle_done(done, &mut frontier),
                    Some(Err(e)) => tracing::error!("Crawl task failed to complete: {}", e),
                    None => {}
                },
            }

            handled += 1;
            if handled % 50 == 0 {
                tracing::info!(
                    "Progress: {} pages done, {} queued, {} products aggregated",
                    handled,
                    frontier.len(),
                    self.aggregator.len()
                );
            }
        }

        frontier.clear();
        while in_flight.join_next().await.is_some() {}

        let report = self.aggregator.finalize()?;
        self.finish(started, &report);
        Ok(self.stats.clone())
    }

    fn handle_done(&mut self, done: TaskDone, frontier: &mut VecDeque<(CrawlTask, BranchTicket)>) {
        let TaskDone {
            task,
            ticket,
            mut state,
            outcome,
        } = done;

        match outcome {
            Ok(PageData::Listing { label, links }) => {
                self.stats.record_succeeded(&task.kind);
                let children = self
                    .scheduler
                    .on_listing_page(&task, label.as_deref(), &links);
                for child in children {
                    let child_ticket = self.aggregator.open_branch();
                    frontier.push_back((child, child_ticket));
                }
                advance(&task, &mut state, TaskState::Dispatched);
            }
            Ok(PageData::Product(record)) => {
                self.stats.record_succeeded(&task.kind);
                let url = record.url.clone();
                if self.aggregator.insert(record) {
                    tracing::debug!("Aggregated {} [{}]", url, task.category_path);
                } else {
                    tracing::debug!("Duplicate product {}", url);
                }
                advance(&task, &mut state, TaskState::Dispatched);
            }
            Err(failure) => {
                self.stats.record_failed(&task.kind);
                tracing::warn!("Failed to fetch {} page {}", task.kind, failure);
            }
        }

        if let Some(result) = ticket.close() {
            match result {
                Ok(report) => tracing::info!(
                    "Last branch closed, exported {} products",
                    report.records
                ),
                Err(e) => tracing::error!("Last branch closed, export failed: {}", e),
            }
        }
    }

    fn finish(&mut self, started: Instant, report: &ExportReport) {
        self.stats.records_kept = report.records as u64;
        self.stats.duplicates_discarded = self.aggregator.duplicates();
        self.stats.revisits_skipped = self.scheduler.revisits_skipped();
        self.stats.artifact = Some(report.artifact.clone());
        self.stats.json_feed = report.json_feed.clone();
        self.stats.elapsed = started.elapsed();

        tracing::info!(
            "Crawl finished in {:?}: {} products written to {}",
            self.stats.elapsed,
            report.records,
            report.artifact.display()
        );
    }
}

/// Fetches and parses one task off the coordinator loop
async fn process_task(
    fetcher: Arc<dyn PageFetcher>,
    selectors: Arc<CompiledSelectors>,
    task: CrawlTask,
    ticket: BranchTicket,
) -> TaskDone {
    let mut state = TaskState::Pending;
    advance(&task, &mut state, TaskState::Fetching);
    tracing::debug!("Fetching {} {} (depth {})", task.kind, task.url, task.depth);

    let outcome = fetcher
        .fetch(&task.url, task.depth)
        .await
        .map(|page| parse_page(&task, &page, &selectors));

    let next = if outcome.is_ok() {
        TaskState::Succeeded
    } else {
        TaskState::Failed
    };
    advance(&task, &mut state, next);

    TaskDone {
        task,
        ticket,
        state,
        outcome,
    }
}

fn parse_page(task: &CrawlTask, page: &FetchedPage, selectors: &CompiledSelectors) -> PageData {
    let document = Html::parse_document(&page.body);
    match task.kind {
        TaskKind::Category | TaskKind::Pagination { .. } => PageData::Listing {
            label: category_label(&document, selectors),
            links: extract_links(&document, &page.final_url, selectors),
        },
        TaskKind::Product => PageData::Product(extract_product(
            &document,
            &task.url,
            &task.category_path,
            selectors,
        )),
    }
}

fn advance(task: &CrawlTask, state: &mut TaskState, next: TaskState) {
    if let Err(e) = state.advance(next) {
        tracing::error!("{}: {}", task.url, e);
    }
}

/// Runs a complete crawl with the given configuration
///
/// Returns the statistics of the run once the export is written.
pub async fn run_crawl(config: Config) -> crate::Result<RunStatistics> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
