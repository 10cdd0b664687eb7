//! Crawler module for catalogue traversal
//!
//! This module contains the core crawling logic, including:
//! - Crawl tasks tagged by page kind
//! - HTTP fetching with retry logic and per-domain pacing
//! - The category-tree scheduler (depth and page bounds, visited set)
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod scheduler;
mod task;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchFailure, FetchedPage, HttpFetcher, PageFetcher};
pub use scheduler::Scheduler;
pub use task::{CrawlTask, TaskKind};
