//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CategoryPath`: the breadcrumb carried by each traversal branch
//! - `TaskState`: lifecycle of one crawl task (pending, fetching, succeeded, ...)
//! - `DomainState`: per-domain pacing and 429 backoff used by the fetcher

mod category_path;
mod domain_state;
mod task_state;

pub use category_path::CategoryPath;
pub use domain_state::DomainState;
pub use task_state::TaskState;
