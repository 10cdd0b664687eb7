//! Compiled selector tiers
//!
//! Every configured tier string is parsed once at startup. A tier is either a
//! plain CSS selector (group) or `selector@attribute`, in which case values
//! are read from that attribute instead of the element text.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// One parsed selector tier
#[derive(Debug, Clone)]
pub struct SelectorTier {
    source: String,
    selector: Selector,
    attr: Option<String>,
}

impl SelectorTier {
    /// Parses a tier string, splitting off a trailing `@attribute`
    ///
    /// The `@` split only happens when the suffix is a plain attribute name,
    /// so attribute selectors whose values contain `@` are left intact.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let source = source.trim();
        let (css, attr) = match source.rsplit_once('@') {
            Some((css, attr)) if !css.trim().is_empty() && is_attribute_name(attr) => {
                (css.trim(), Some(attr.to_string()))
            }
            _ => (source, None),
        };

        let selector = Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
            selector: source.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            source: source.to_string(),
            selector,
            attr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }

    /// Elements matched by this tier, in document order
    pub fn select<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        document.select(&self.selector)
    }

    /// The element's value for this tier: the named attribute or the
    /// whitespace-collapsed text, `None` when empty
    pub fn value(&self, element: ElementRef<'_>) -> Option<String> {
        let raw = match &self.attr {
            Some(attr) => collapse_whitespace(element.value().attr(attr)?),
            None => element_text(element),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

/// Ordered list of tiers for one field or link class
#[derive(Debug, Clone, Default)]
pub struct TierList(Vec<SelectorTier>);

impl TierList {
    pub fn compile(sources: &[String]) -> Result<Self, ConfigError> {
        sources
            .iter()
            .map(|s| SelectorTier::parse(s))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectorTier> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First non-empty value across the tiers, in tier order then document order
    pub fn first_value(&self, document: &Html) -> Option<String> {
        self.iter().find_map(|tier| {
            let value = tier.select(document).find_map(|el| tier.value(el));
            if let Some(v) = &value {
                tracing::trace!("Tier '{}' matched: {}", tier.source(), v);
            }
            value
        })
    }

    /// Runs `collect` per tier and returns the first non-empty result
    pub fn first_non_empty<T, F>(&self, mut collect: F) -> Vec<T>
    where
        F: FnMut(&SelectorTier) -> Vec<T>,
    {
        for tier in self.iter() {
            let found = collect(tier);
            if !found.is_empty() {
                tracing::trace!("Tier '{}' won with {} matches", tier.source(), found.len());
                return found;
            }
        }
        Vec::new()
    }
}

/// All selector tiers, compiled
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub category_links: TierList,
    pub product_links: TierList,
    pub product_url_patterns: Vec<String>,
    pub last_page: TierList,
    pub next_page: TierList,
    pub category_title: TierList,
    pub breadcrumbs: TierList,
    pub name: TierList,
    pub code: TierList,
    pub price: TierList,
    pub description: TierList,
    pub spec_rows: TierList,
    pub spec_blocks: TierList,
    pub images: TierList,
}

impl CompiledSelectors {
    /// Parses every configured tier, failing on the first invalid one
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            category_links: TierList::compile(&config.category_links)?,
            product_links: TierList::compile(&config.product_links)?,
            product_url_patterns: config.product_url_patterns.clone(),
            last_page: TierList::compile(&config.last_page)?,
            next_page: TierList::compile(&config.next_page)?,
            category_title: TierList::compile(&config.category_title)?,
            breadcrumbs: TierList::compile(&config.breadcrumbs)?,
            name: TierList::compile(&config.name)?,
            code: TierList::compile(&config.code)?,
            price: TierList::compile(&config.price)?,
            description: TierList::compile(&config.description)?,
            spec_rows: TierList::compile(&config.spec_rows)?,
            spec_blocks: TierList::compile(&config.spec_blocks)?,
            images: TierList::compile(&config.images)?,
        })
    }
}

/// Text content of an element with runs of whitespace collapsed to one space
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}
