//! HTML extraction for catalogue pages
//!
//! All functions here are pure: they take an already parsed document and
//! return values. `scraper::Html` is not `Send`, so callers parse and extract
//! inside one synchronous step and never hold a document across an `.await`.
//!
//! - `links`: category, product and pagination links of a listing page
//! - `product`: product records from detail pages
//! - `price`: price text normalization
//! - `selectors`: compiled selector tiers shared by both extractors

mod links;
mod price;
mod product;
mod selectors;

pub use links::{category_label, extract_links, page_number, page_url, PageLinks, Pagination};
pub use price::normalize_price;
pub use product::{breadcrumbs, extract_product};
pub use selectors::{collapse_whitespace, element_text, CompiledSelectors, SelectorTier, TierList};
