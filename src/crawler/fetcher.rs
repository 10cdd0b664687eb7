//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured browser user agent
//! - GET requests to fetch page content
//! - Retry with exponential backoff on configured status codes and
//!   transport errors
//! - Per-domain pacing and a global cap on open requests

use crate::config::FetcherConfig;
use crate::state::DomainState;
use crate::url::extract_domain;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

/// Longest single backoff between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    pub body: String,
}

/// A fetch that did not produce a page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{url}: {reason}")]
pub struct FetchFailure {
    pub url: Url,
    pub reason: String,
}

impl FetchFailure {
    pub fn new(url: &Url, reason: impl Into<String>) -> Self {
        Self {
            url: url.clone(),
            reason: reason.into(),
        }
    }
}

/// Source of page bodies for the coordinator
///
/// `depth` is the category depth of the requesting task; implementations may
/// refuse requests beyond their own ceiling.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, depth: u32) -> Result<FetchedPage, FetchFailure>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::FetcherConfig;
/// use catalog_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Outcome of a single attempt
enum Attempt {
    Done(FetchedPage),
    Retry(String),
    Fatal(String),
}

/// `reqwest`-backed fetcher with retries, pacing and a concurrency cap
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
    semaphore: Arc<Semaphore>,
    domains: Mutex<HashMap<String, DomainState>>,
}

impl HttpFetcher {
    /// Creates a fetcher allowing `max_open` requests in flight at once
    pub fn new(config: FetcherConfig, max_open: usize) -> crate::Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            semaphore: Arc::new(Semaphore::new(max_open.max(1))),
            domains: Mutex::new(HashMap::new()),
        })
    }

    /// Waits until `domain` may be requested again, then claims the slot
    async fn wait_for_domain(&self, domain: &str) {
        loop {
            let wait = {
                let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
                let state = domains.entry(domain.to_string()).or_default();
                let now = Instant::now();
                match state.time_until_next_request(&self.config, now) {
                    Some(wait) => wait,
                    None => {
                        state.record_request(now);
                        return;
                    }
                }
            };
            tracing::trace!("Pacing {} for {:?}", domain, wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn mark_rate_limited(&self, domain: &str, cooldown: Duration) {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains
            .entry(domain.to_string())
            .or_default()
            .mark_rate_limited(Instant::now(), cooldown);
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.config.retry_delay.saturating_mul(factor)).min(MAX_BACKOFF)
    }

    async fn attempt(&self, url: &Url, domain: &str) -> Attempt {
        self.wait_for_domain(domain).await;

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else if e.is_redirect() {
                    "Too many redirects".to_string()
                } else {
                    e.to_string()
                };
                return if e.is_redirect() {
                    Attempt::Fatal(reason)
                } else {
                    Attempt::Retry(reason)
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            let reason = format!("HTTP {}", status.as_u16());
            if status == StatusCode::TOO_MANY_REQUESTS {
                self.mark_rate_limited(domain, Duration::from_millis(self.config.retry_delay));
            }
            return if self.config.retry_http_codes.contains(&status.as_u16()) {
                Attempt::Retry(reason)
            } else {
                Attempt::Fatal(reason)
            };
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(body) => Attempt::Done(FetchedPage { final_url, body }),
            Err(e) => Attempt::Retry(format!("Failed to read body: {}", e)),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, depth: u32) -> Result<FetchedPage, FetchFailure> {
        if depth > self.config.depth_limit {
            return Err(FetchFailure::new(
                url,
                format!("depth {} exceeds limit {}", depth, self.config.depth_limit),
            ));
        }

        let domain = extract_domain(url).ok_or_else(|| FetchFailure::new(url, "URL has no host"))?;
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchFailure::new(url, "fetcher is shut down"))?;

        let mut attempt = 0;
        loop {
            match self.attempt(url, &domain).await {
                Attempt::Done(page) => {
                    tracing::debug!("Fetched {} ({} bytes)", page.final_url, page.body.len());
                    return Ok(page);
                }
                Attempt::Fatal(reason) => return Err(FetchFailure::new(url, reason)),
                Attempt::Retry(reason) if attempt < self.config.retry_times => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    tracing::debug!(
                        "{}: {}, retry {}/{} in {:?}",
                        url,
                        reason,
                        attempt,
                        self.config.retry_times,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Retry(reason) => {
                    return Err(FetchFailure::new(
                        url,
                        format!("{} (gave up after {} retries)", reason, attempt),
                    ))
                }
            }
        }
    }
}
