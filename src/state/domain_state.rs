use crate::config::FetcherConfig;
use std::time::{Duration, Instant};

/// Tracks the state of a domain during crawling
///
/// The fetcher keeps one of these per host to space requests out and to back
/// off after the server answers 429.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Timestamp of the last request to this domain
    pub last_request_time: Option<Instant>,

    /// Requests are held back until this instant after an HTTP 429
    pub rate_limited_until: Option<Instant>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can be made to this domain at `now`
    pub fn can_request(&self, config: &FetcherConfig, now: Instant) -> bool {
        self.time_until_next_request(config, now).is_none()
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Holds further requests back for `cooldown`
    pub fn mark_rate_limited(&mut self, now: Instant, cooldown: Duration) {
        self.rate_limited_until = Some(now + cooldown);
    }

    pub fn is_rate_limited(&self, now: Instant) -> bool {
        self.rate_limited_until.is_some_and(|until| now < until)
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, config: &FetcherConfig, now: Instant) -> Option<Duration> {
        let pacing = self.last_request_time.and_then(|last| {
            let min_delay = Duration::from_millis(config.minimum_time_on_page);
            min_delay.checked_sub(now.duration_since(last))
        });
        let cooldown = self
            .rate_limited_until
            .and_then(|until| until.checked_duration_since(now));

        match (pacing, cooldown) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
        .filter(|wait| !wait.is_zero())
    }
}
