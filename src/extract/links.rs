//! Link discovery on category and listing pages
//!
//! Links are split into three classes:
//! - category links (subcategories to descend into)
//! - product links (detail pages to extract records from)
//! - pagination (either a numbered "last page" link or a "next" link)
//!
//! Every class uses ordered selector tiers. The first tier yielding at least
//! one usable link wins and later tiers are never merged in.

use super::selectors::{CompiledSelectors, SelectorTier, TierList};
use crate::url::canonical_key;
use scraper::{ElementRef, Html};
use std::collections::BTreeSet;
use url::{Position, Url};

/// Links discovered on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub categories: BTreeSet<Url>,
    pub products: BTreeSet<Url>,
    pub pagination: Pagination,
}

/// How the page exposes further pages of the same listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Pagination {
    #[default]
    None,

    /// A "next page" link only
    Next(Url),

    /// A "last page" link carrying its page number; other pages are built
    /// from `template` with [`page_url`]
    Numbered { template: Url, last: u32 },
}

/// Extracts category, product and pagination links from a parsed page
///
/// `base_url` is the final URL of the page; it resolves relative hrefs and is
/// excluded from the category and product classes. Product candidates also
/// exclude:
/// - pagination and breadcrumb links
/// - anchors inside `nav`, `header` and `footer`
/// - the listing itself and its ancestors (same path with another query, or
///   a path prefix of it)
pub fn extract_links(document: &Html, base_url: &Url, selectors: &CompiledSelectors) -> PageLinks {
    let own_key = canonical_key(base_url.as_str());

    let categories: BTreeSet<Url> = selectors
        .category_links
        .first_non_empty(|tier| {
            tier_links(document, tier, base_url)
                .filter(|url| canonical_key(url.as_str()) != own_key)
                .collect()
        })
        .into_iter()
        .collect();

    let pagination = extract_pagination(document, base_url, selectors, &own_key);

    let mut excluded: BTreeSet<String> = categories.iter().map(|u| canonical_key(u.as_str())).collect();
    excluded.insert(own_key);
    for tiers in [&selectors.last_page, &selectors.next_page, &selectors.breadcrumbs] {
        for tier in tiers.iter() {
            excluded.extend(tier_links(document, tier, base_url).map(|u| canonical_key(u.as_str())));
        }
    }

    let products: BTreeSet<Url> = selectors
        .product_links
        .first_non_empty(|tier| {
            let attr = tier.attr().unwrap_or("href");
            link_elements(document, tier)
                .filter(|el| !in_page_chrome(*el))
                .filter_map(|el| link_target(el, attr))
                .filter_map(|href| resolve_link(href, base_url))
                .filter(|url| is_product_url(url, &selectors.product_url_patterns))
                .filter(|url| !is_listing_or_ancestor(url, base_url))
                .filter(|url| !excluded.contains(&canonical_key(url.as_str())))
                .collect()
        })
        .into_iter()
        .collect();

    tracing::trace!(
        "{}: {} categories, {} products, pagination {:?}",
        base_url,
        categories.len(),
        products.len(),
        pagination
    );

    PageLinks {
        categories,
        products,
        pagination,
    }
}

/// Returns the page heading used to extend the category path
pub fn category_label(document: &Html, selectors: &CompiledSelectors) -> Option<String> {
    selectors.category_title.first_value(document)
}

/// Builds the URL of page `page` by substituting the trailing digit run of
/// the template's path and query
///
/// ```
/// use catalog_sweep::extract::page_url;
/// use url::Url;
///
/// let template = Url::parse("https://shop.com/catalogue/oils/?PAGEN_1=7").unwrap();
/// let third = page_url(&template, 3).unwrap();
/// assert_eq!(third.as_str(), "https://shop.com/catalogue/oils/?PAGEN_1=3");
/// ```
pub fn page_url(template: &Url, page: u32) -> Option<Url> {
    let tail = &template[Position::BeforePath..Position::AfterQuery];
    let (start, end) = trailing_digit_run(tail)?;
    let rebuilt = format!(
        "{}{}{}{}",
        &template[..Position::BeforePath],
        &tail[..start],
        page,
        &tail[end..]
    );
    Url::parse(&rebuilt).ok()
}

/// Page number carried by a URL: the last digit run of its path and query
pub fn page_number(url: &Url) -> Option<u32> {
    let tail = &url[Position::BeforePath..Position::AfterQuery];
    let (start, end) = trailing_digit_run(tail)?;
    tail[start..end].parse().ok()
}

fn extract_pagination(
    document: &Html,
    base_url: &Url,
    selectors: &CompiledSelectors,
    own_key: &str,
) -> Pagination {
    let numbered = first_link(document, &selectors.last_page, base_url, own_key)
        .and_then(|template| page_number(&template).map(|last| (template, last)));
    if let Some((template, last)) = numbered {
        return Pagination::Numbered { template, last };
    }

    match first_link(document, &selectors.next_page, base_url, own_key) {
        Some(next) => Pagination::Next(next),
        None => Pagination::None,
    }
}

fn first_link(document: &Html, tiers: &TierList, base_url: &Url, own_key: &str) -> Option<Url> {
    tiers
        .first_non_empty(|tier| {
            tier_links(document, tier, base_url)
                .filter(|url| canonical_key(url.as_str()) != own_key)
                .take(1)
                .collect()
        })
        .into_iter()
        .next()
}

/// Resolved links of every element matched by one tier, in document order
fn tier_links<'a>(
    document: &'a Html,
    tier: &'a SelectorTier,
    base_url: &'a Url,
) -> impl Iterator<Item = Url> + 'a {
    let attr = tier.attr().unwrap_or("href");
    link_elements(document, tier)
        .filter_map(move |el| link_target(el, attr))
        .filter_map(move |href| resolve_link(href, base_url))
}

fn link_elements<'a>(
    document: &'a Html,
    tier: &'a SelectorTier,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    tier.select(document)
        .filter(|el| el.value().attr("download").is_none())
}

/// The element's own link attribute, or the first descendant carrying one
/// (tiers may select a wrapper such as `li.next`)
fn link_target<'a>(element: ElementRef<'a>, attr: &str) -> Option<&'a str> {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .find_map(|el| el.value().attr(attr))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}

/// Site navigation rather than listing content
fn in_page_chrome(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| matches!(el.value().name(), "nav" | "header" | "footer"))
}

/// True for the listing's own path (any query) and every path above it
fn is_listing_or_ancestor(url: &Url, listing: &Url) -> bool {
    if url.host_str() != listing.host_str() || url.port_or_known_default() != listing.port_or_known_default() {
        return false;
    }
    let segments = |u: &Url| -> Vec<String> {
        u.path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let candidate = segments(url);
    let own = segments(listing);
    candidate.len() <= own.len() && own.starts_with(&candidate)
}

fn is_product_url(url: &Url, patterns: &[String]) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| url.path().contains(p.as_str()))
}

fn trailing_digit_run(text: &str) -> Option<(usize, usize)> {
    let end = text.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = text[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(0, |(i, c)| i + c.len_utf8());
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    fn selectors() -> CompiledSelectors {
        CompiledSelectors::compile(&SelectorConfig::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://shop.com/catalogue/oils/").unwrap()
    }

    fn links(html: &str) -> PageLinks {
        extract_links(&Html::parse_document(html), &base(), &selectors())
    }

    fn urls(items: &[&str]) -> BTreeSet<Url> {
        items.iter().map(|s| Url::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_category_links_resolved_and_deduplicated() {
        let page = links(
            r#"<body>
                <a class="category-submenu-link" href="/catalogue/oils/motor/">Motor</a>
                <a class="category-submenu-link" href="motor/">Motor again</a>
                <a class="category-submenu-link" href="/catalogue/oils/gear/">Gear</a>
                <a class="category-submenu-link" href="/catalogue/oils/">Self</a>
            </body>"#,
        );

        assert_eq!(
            page.categories,
            urls(&[
                "https://shop.com/catalogue/oils/gear/",
                "https://shop.com/catalogue/oils/motor/",
            ])
        );
    }

    #[test]
    fn test_first_non_empty_tier_wins() {
        let page = links(
            r#"<body>
                <div class="subcategories"><a href="/catalogue/a/">A</a></div>
                <nav class="catalog-menu"><a href="/catalogue/b/">B</a></nav>
            </body>"#,
        );

        assert_eq!(page.categories, urls(&["https://shop.com/catalogue/a/"]));
    }

    #[test]
    fn test_product_links_from_container_tier() {
        let page = links(
            r#"<body>
                <div class="products-list-item fix-prop-height">
                    <a href="/catalogue/oils/item-1/"><img src="/i.png"></a>
                    <a href="/catalogue/oils/item-1/">Item 1</a>
                </div>
                <div class="products-list-item"><a href="/catalogue/oils/item-2/">Item 2</a></div>
                <div class="products-list-item"><a href="/cart/add?id=2">Buy</a></div>
                <a href="/catalogue/oils/item-9/">Not in a card</a>
            </body>"#,
        );

        assert_eq!(
            page.products,
            urls(&[
                "https://shop.com/catalogue/oils/item-1/",
                "https://shop.com/catalogue/oils/item-2/",
            ])
        );
    }

    #[test]
    fn test_any_anchor_fallback_excludes_categories_and_self() {
        let page = links(
            r#"<body>
                <a class="category-submenu-link" href="/catalogue/oils/motor/">Motor</a>
                <a href="/catalogue/oils/">Self</a>
                <a href="/catalogue/oils/item-3/">Item 3</a>
                <a href="/about/">About</a>
                <a href="mailto:sales@shop.com">Mail</a>
            </body>"#,
        );

        assert_eq!(
            page.categories,
            urls(&["https://shop.com/catalogue/oils/motor/"])
        );
        assert_eq!(
            page.products,
            urls(&["https://shop.com/catalogue/oils/item-3/"])
        );
    }

    #[test]
    fn test_subcategory_only_listing_has_no_products() {
        let page = links(
            r#"<body>
                <div class="breadcrumbs"><a href="/catalogue/">Catalogue</a><span>Oils</span></div>
                <nav class="catalog-menu"><a href="/catalogue/tyres/">Tyres</a></nav>
                <a class="category-submenu-link" href="/catalogue/oils/motor/">Motor</a>
                <a class="page-next" href="?PAGEN_1=2">Next</a>
            </body>"#,
        );

        assert_eq!(
            page.categories,
            urls(&["https://shop.com/catalogue/oils/motor/"])
        );
        assert!(page.products.is_empty(), "got {:?}", page.products);
        assert_eq!(
            page.pagination,
            Pagination::Next(Url::parse("https://shop.com/catalogue/oils/?PAGEN_1=2").unwrap())
        );
    }

    #[test]
    fn test_listing_ancestors_are_not_products() {
        let base = base();
        let check = |s: &str| is_listing_or_ancestor(&Url::parse(s).unwrap(), &base);

        assert!(check("https://shop.com/"));
        assert!(check("https://shop.com/catalogue/"));
        assert!(check("https://shop.com/catalogue/oils/?sort=price"));
        assert!(!check("https://shop.com/catalogue/oils/item-1/"));
        assert!(!check("https://shop.com/catalogue/tyres/"));
        assert!(!check("https://other.com/catalogue/"));
    }

    #[test]
    fn test_offset_pagination_is_kept() {
        let page = links(r#"<body><a class="page-next" href="?from=20">Next</a></body>"#);
        assert_eq!(
            page.pagination,
            Pagination::Next(Url::parse("https://shop.com/catalogue/oils/?from=20").unwrap())
        );
    }

    #[test]
    fn test_numbered_pagination() {
        let page = links(
            r#"<body>
                <a class="page-next" href="?PAGEN_1=2">Next</a>
                <a class="page-last" href="?PAGEN_1=5">5</a>
            </body>"#,
        );

        match page.pagination {
            Pagination::Numbered { template, last } => {
                assert_eq!(last, 5);
                assert_eq!(
                    page_url(&template, 2).unwrap().as_str(),
                    "https://shop.com/catalogue/oils/?PAGEN_1=2"
                );
            }
            other => panic!("expected numbered pagination, got {:?}", other),
        }
    }

    #[test]
    fn test_next_pagination_without_last() {
        let page = links(r#"<body><a class="page-next" href="page/2/">Next</a></body>"#);
        assert_eq!(
            page.pagination,
            Pagination::Next(Url::parse("https://shop.com/catalogue/oils/page/2/").unwrap())
        );
    }

    #[test]
    fn test_no_pagination() {
        assert_eq!(links("<body><p>Nothing</p></body>").pagination, Pagination::None);
    }

    #[test]
    fn test_page_url_ignores_port_digits() {
        let template = Url::parse("http://127.0.0.1:4000/list/page/9").unwrap();
        assert_eq!(page_number(&template), Some(9));
        assert_eq!(
            page_url(&template, 4).unwrap().as_str(),
            "http://127.0.0.1:4000/list/page/4"
        );
    }

    #[test]
    fn test_page_url_without_digits() {
        let template = Url::parse("http://127.0.0.1:4000/list/").unwrap();
        assert_eq!(page_number(&template), None);
        assert!(page_url(&template, 2).is_none());
    }

    #[test]
    fn test_resolve_link_filters_schemes() {
        let base = base();
        assert!(resolve_link("javascript:void(0)", &base).is_none());
        assert!(resolve_link("JavaScript:void(0)", &base).is_none());
        assert!(resolve_link("tel:+7000", &base).is_none());
        assert!(resolve_link("data:image/png;base64,xx", &base).is_none());
        assert!(resolve_link("#top", &base).is_none());
        assert!(resolve_link("   ", &base).is_none());
        assert!(resolve_link("ftp://shop.com/f", &base).is_none());
        assert_eq!(
            resolve_link("../filters/", &base).unwrap().as_str(),
            "https://shop.com/catalogue/filters/"
        );
    }

    #[test]
    fn test_category_label_prefers_heading() {
        let sel = selectors();
        let doc = Html::parse_document(
            "<html><head><title>Oils | Shop</title></head><body><h1> Motor  oils </h1></body></html>",
        );
        assert_eq!(category_label(&doc, &sel), Some("Motor oils".to_string()));

        let doc = Html::parse_document("<html><head><title>Oils | Shop</title></head><body></body></html>");
        assert_eq!(category_label(&doc, &sel), Some("Oils | Shop".to_string()));
    }
}
