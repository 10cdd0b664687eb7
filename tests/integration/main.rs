//! Integration tests for Catalog-Sweep

mod convert_tests;
mod crawl_tests;
