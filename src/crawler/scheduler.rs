//! Traversal state machine
//!
//! The scheduler turns the outcome of a listing page into child tasks. It
//! does no I/O: fetching belongs to the fetcher and queueing to the
//! coordinator. It enforces:
//! - the depth bound on subcategory fan-out
//! - the page bound on pagination
//! - the allowed-domain filter
//! - the optional visited set on category and pagination URLs

use super::task::{CrawlTask, TaskKind};
use crate::config::CrawlerConfig;
use crate::extract::{page_url, PageLinks, Pagination};
use crate::state::CategoryPath;
use crate::url::{canonical_key, is_allowed_domain};
use std::collections::HashSet;
use url::Url;

/// Decides which child tasks a processed listing page yields
#[derive(Debug, Clone)]
pub struct Scheduler {
    max_depth: u32,
    max_page: u32,
    allowed_domains: Vec<String>,

    /// Canonical keys of dispatched category and pagination URLs, when enabled
    visited: Option<HashSet<String>>,

    revisits_skipped: u64,
}

impl Scheduler {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_page: config.max_page,
            allowed_domains: config.allowed_domains.clone(),
            visited: config.visited_set.then(HashSet::new),
            revisits_skipped: 0,
        }
    }

    /// Builds the seed tasks; unparsable seeds are skipped with a warning
    pub fn seed(&mut self, seeds: &[String]) -> Vec<CrawlTask> {
        let mut tasks = Vec::new();
        for seed in seeds {
            match Url::parse(seed.trim()) {
                Ok(url) => {
                    if self.admit_listing(&url) {
                        tasks.push(CrawlTask::seed(url));
                    }
                }
                Err(e) => tracing::warn!("Skipping seed {}: {}", seed, e),
            }
        }
        tasks
    }

    /// Children of a successfully fetched category or pagination page
    ///
    /// `label` is the page heading. Seeds yield only their category links, as
    /// first pages of depth-1 categories with an empty path. Category pages
    /// extend their path with the label; pagination pages keep the path of
    /// their first page. Both yield product tasks, and category pages also
    /// yield subcategories below the depth bound and pagination within the
    /// page bound.
    pub fn on_listing_page(
        &mut self,
        task: &CrawlTask,
        label: Option<&str>,
        links: &PageLinks,
    ) -> Vec<CrawlTask> {
        if task.kind == TaskKind::Product {
            return Vec::new();
        }

        if task.is_seed() {
            let categories: Vec<CrawlTask> = links
                .categories
                .iter()
                .filter(|url| self.admit_listing(url))
                .map(|url| task.subcategory(url.clone(), &task.category_path))
                .collect();
            tracing::debug!("Seed {} yielded {} categories", task.url, categories.len());
            return categories;
        }

        let path = match task.kind {
            TaskKind::Category => task.category_path.clone().extend(label.unwrap_or_default()),
            _ => task.category_path.clone(),
        };
        let mut children: Vec<CrawlTask> = links
            .products
            .iter()
            .filter(|url| is_allowed_domain(url, &self.allowed_domains))
            .map(|url| task.product(url.clone(), &path))
            .collect();

        match task.kind {
            TaskKind::Category => {
                if task.depth < self.max_depth {
                    for url in &links.categories {
                        if self.admit_listing(url) {
                            children.push(task.subcategory(url.clone(), &path));
                        }
                    }
                } else {
                    tracing::debug!(
                        "{}: depth {} reached, not descending",
                        task.url,
                        task.depth
                    );
                }

                if task.page == 1 {
                    self.first_page_pagination(task, &path, &links.pagination, &mut children);
                }
            }
            TaskKind::Pagination { follow_next: true } => {
                let next = match &links.pagination {
                    Pagination::Next(url) => Some(url.clone()),
                    Pagination::Numbered { .. } | Pagination::None => None,
                };
                if let Some(url) = next {
                    if task.page < self.max_page && self.admit_listing(&url) {
                        children.push(task.pagination(url, &path, task.page + 1, true));
                    }
                }
            }
            TaskKind::Pagination { follow_next: false } | TaskKind::Product => {}
        }

        tracing::debug!(
            "{} ({} page {}, depth {}) yielded {} tasks",
            task.url,
            task.kind,
            task.page,
            task.depth,
            children.len()
        );
        children
    }

    /// Number of listing URLs skipped because they were already dispatched
    pub fn revisits_skipped(&self) -> u64 {
        self.revisits_skipped
    }

    fn first_page_pagination(
        &mut self,
        task: &CrawlTask,
        path: &CategoryPath,
        pagination: &Pagination,
        children: &mut Vec<CrawlTask>,
    ) {
        match pagination {
            Pagination::Numbered { template, last } => {
                let last = (*last).min(self.max_page);
                for page in 2..=last {
                    match page_url(template, page) {
                        Some(url) if self.admit_listing(&url) => {
                            children.push(task.pagination(url, path, page, false));
                        }
                        Some(_) => {}
                        None => tracing::debug!("Cannot build page {} from {}", page, template),
                    }
                }
            }
            Pagination::Next(url) => {
                if 1 < self.max_page && self.admit_listing(url) {
                    children.push(task.pagination(url.clone(), path, 2, true));
                }
            }
            Pagination::None => {}
        }
    }

    /// Applies the domain filter and, when enabled, the visited set
    fn admit_listing(&mut self, url: &Url) -> bool {
        if !is_allowed_domain(url, &self.allowed_domains) {
            tracing::trace!("{} is outside the allowed domains", url);
            return false;
        }

        match &mut self.visited {
            Some(visited) => {
                let fresh = visited.insert(canonical_key(url.as_str()));
                if !fresh {
                    self.revisits_skipped += 1;
                    tracing::trace!("{} already dispatched", url);
                }
                fresh
            }
            None => true,
        }
    }
}
