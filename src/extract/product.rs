//! Product detail page extraction

use super::links::resolve_link;
use super::price::normalize_price;
use super::selectors::{element_text, CompiledSelectors};
use crate::aggregate::ProductRecord;
use crate::state::CategoryPath;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Attributes an image URL is read from, in preference order
const IMAGE_ATTRIBUTES: &[&str] = &["data-src", "data-original", "src"];

/// Builds a product record from a parsed detail page
///
/// Every field falls back to its placeholder when no tier matches. When the
/// branch reached the product without a category path, the page breadcrumbs
/// are used instead.
pub fn extract_product(
    document: &Html,
    page_url: &Url,
    category_path: &CategoryPath,
    selectors: &CompiledSelectors,
) -> ProductRecord {
    let mut record = ProductRecord::placeholder(page_url.as_str());

    record.category = if category_path.is_empty() {
        breadcrumbs(document, selectors)
    } else {
        category_path.clone()
    };

    if let Some(name) = selectors.name.first_value(document) {
        record.name = name;
    }
    if let Some(code) = selectors.code.first_value(document) {
        record.code = code;
    }
    if let Some(description) = selectors.description.first_value(document) {
        record.description = description;
    }
    if let Some(raw) = selectors.price.first_value(document) {
        record.price = normalize_price(&raw);
    }

    let specs = extract_specs(document, selectors);
    if !specs.is_empty() {
        record.specs = specs;
    }

    let images = extract_images(document, page_url, selectors);
    if !images.is_empty() {
        record.images = images;
    }

    record
}

/// Category path from the page breadcrumbs, without the leading "home" crumb
pub fn breadcrumbs(document: &Html, selectors: &CompiledSelectors) -> CategoryPath {
    let crumbs = selectors.breadcrumbs.first_non_empty(|tier| {
        tier.select(document)
            .filter_map(|el| tier.value(el))
            .collect()
    });
    crumbs.into_iter().skip(1).collect()
}

/// Specification lines from every row and block tier, deduplicated in order
fn extract_specs(document: &Html, selectors: &CompiledSelectors) -> Vec<String> {
    let rows = selectors
        .spec_rows
        .iter()
        .flat_map(|tier| tier.select(document).filter_map(spec_row));
    let blocks = selectors
        .spec_blocks
        .iter()
        .flat_map(|tier| tier.select(document).filter_map(|el| tier.value(el)));

    let mut seen = HashSet::new();
    rows.chain(blocks)
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

/// Renders a table row as `label: value`, or its text when it has no cells
fn spec_row(row: ElementRef<'_>) -> Option<String> {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    let line = match cells.split_first() {
        Some((label, values)) if !values.is_empty() => {
            format!("{}: {}", label.trim_end_matches(':'), values.join(" "))
        }
        Some((only, _)) => only.clone(),
        None => element_text(row),
    };
    (!line.is_empty()).then_some(line)
}

fn extract_images(document: &Html, page_url: &Url, selectors: &CompiledSelectors) -> Vec<String> {
    let images = selectors.images.first_non_empty(|tier| {
        tier.select(document)
            .filter_map(|el| match tier.attr() {
                Some(attr) => el.value().attr(attr),
                None => IMAGE_ATTRIBUTES.iter().find_map(|attr| {
                    el.value()
                        .attr(attr)
                        .filter(|v| !v.trim().is_empty() && !v.trim_start().starts_with("data:"))
                }),
            })
            .filter_map(|src| resolve_link(src, page_url))
            .map(String::from)
            .collect()
    });

    let mut seen = HashSet::new();
    images
        .into_iter()
        .filter(|src| seen.insert(src.clone()))
        .collect()
}
