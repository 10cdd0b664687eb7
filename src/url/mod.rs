//! URL handling module for Catalog-Sweep
//!
//! This module provides URL canonicalization (used as the product identity
//! key and the visited-set key), domain extraction and the allowed-domain
//! filter applied to discovered links.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_allowed_domain, matches_wildcard};
pub use normalize::{canonical_key, normalize_url};
