use serde::Deserialize;

/// Default bound on category nesting, shared by the scheduler and the fetcher
pub const DEFAULT_MAX_DEPTH: u32 = 50;

/// Default bound on pages followed per category
pub const DEFAULT_MAX_PAGE: u32 = 50;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Catalogue root pages; their category links become the branches
    pub seeds: Vec<String>,

    /// Domain patterns links must match (e.g. "shop.com" or "*.shop.com"); empty allows all
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Maximum subcategory depth below the seeds
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum page number followed inside one category
    #[serde(default = "default_max_page")]
    pub max_page: u32,

    /// Maximum number of tasks in flight at once
    #[serde(default = "default_concurrency")]
    pub max_concurrent_pages_open: u32,

    /// Skip category and pagination URLs that were already dispatched
    #[serde(default)]
    pub visited_set: bool,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(default = "default_minimum_time_on_page")]
    pub minimum_time_on_page: u64,

    /// Number of retries after the first attempt
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,

    /// HTTP status codes that are retried
    #[serde(default = "default_retry_http_codes")]
    pub retry_http_codes: Vec<u16>,

    /// Base delay before the first retry, doubled on each further retry (milliseconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Whole-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Depth ceiling enforced by the fetcher; must agree with `crawler.max-depth`
    #[serde(default = "default_max_depth")]
    pub depth_limit: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            minimum_time_on_page: default_minimum_time_on_page(),
            retry_times: default_retry_times(),
            retry_http_codes: default_retry_http_codes(),
            retry_delay: default_retry_delay(),
            request_timeout: default_request_timeout(),
            depth_limit: default_max_depth(),
        }
    }
}

/// Spreadsheet format of the export artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

/// Output of a live crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving the timestamped spreadsheet
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File name prefix; the run timestamp is appended
    #[serde(default = "default_output_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default = "default_crawl_category_delimiter")]
    pub category_delimiter: String,

    #[serde(default = "default_newline")]
    pub specs_separator: String,

    #[serde(default = "default_comma")]
    pub images_separator: String,

    /// Also write the records as `products_<timestamp>.json`
    #[serde(default = "default_true")]
    pub json_feed: bool,

    #[serde(default = "default_data_directory")]
    pub json_feed_directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_prefix: default_output_prefix(),
            format: ExportFormat::default(),
            category_delimiter: default_crawl_category_delimiter(),
            specs_separator: default_newline(),
            images_separator: default_comma(),
            json_feed: true,
            json_feed_directory: default_data_directory(),
        }
    }
}

/// Offline aggregation of earlier JSON product files
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConverterConfig {
    #[serde(default = "default_data_directory")]
    pub input_directory: String,

    /// Only `<prefix>*.json` files are read
    #[serde(default = "default_feed_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_data_directory")]
    pub output_directory: String,

    #[serde(default = "default_converter_name")]
    pub output_name: String,

    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default = "default_converter_category_delimiter")]
    pub category_delimiter: String,

    #[serde(default = "default_newline")]
    pub specs_separator: String,

    #[serde(default = "default_newline")]
    pub images_separator: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_directory: default_data_directory(),
            file_prefix: default_feed_prefix(),
            output_directory: default_data_directory(),
            output_name: default_converter_name(),
            format: ExportFormat::default(),
            category_delimiter: default_converter_category_delimiter(),
            specs_separator: default_newline(),
            images_separator: default_newline(),
        }
    }
}

/// CSS selector tiers used by the link and product extractors
///
/// Every list is ordered: earlier entries are preferred. A single entry may be
/// a comma-separated selector group, and entries used for values may end in
/// `@attribute` to read an attribute instead of the element text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub category_links: Vec<String>,
    pub product_links: Vec<String>,
    pub product_url_patterns: Vec<String>,
    pub last_page: Vec<String>,
    pub next_page: Vec<String>,
    pub category_title: Vec<String>,
    pub breadcrumbs: Vec<String>,
    pub name: Vec<String>,
    pub code: Vec<String>,
    pub price: Vec<String>,
    pub description: Vec<String>,
    pub spec_rows: Vec<String>,
    pub spec_blocks: Vec<String>,
    pub images: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            category_links: owned(&[
                "a.category-submenu-link",
                ".subcategories a, .catalog-sections a",
                "nav.catalog-menu a",
            ]),
            product_links: owned(&[
                "div.products-list-item a",
                ".product-card a, .product-item a",
                "li.product a, .catalog-item a",
                "a",
            ]),
            product_url_patterns: owned(&["/catalogue/", "/product/", "/item/"]),
            last_page: owned(&["a.page-last", "a[rel='last']", ".pagination a.last"]),
            next_page: owned(&[
                "a.page-next",
                "a[rel='next']",
                ".pagination a.next, .pagination .next a",
            ]),
            category_title: owned(&["h1", "title"]),
            breadcrumbs: owned(&[
                "div.breadcrumbs a, div.breadcrumbs span",
                ".breadcrumb a, .breadcrumb li",
            ]),
            name: owned(&[
                "div.product-card-title h1",
                "h1[itemprop='name'], .product-title",
                "meta[property='og:title']@content",
                "h1",
            ]),
            code: owned(&[
                "i.icon-copy-code@data-code",
                "[itemprop='sku']",
                ".product-code, .sku",
            ]),
            price: owned(&[
                "div.product-card-prices-value",
                "[itemprop='price']@content",
                "[itemprop='price'], .price",
            ]),
            description: owned(&[
                "div#description.tabs-content",
                "[itemprop='description']",
                ".product-description",
                "meta[name='description']@content",
            ]),
            spec_rows: owned(&[
                "table.product-specs tr, .product-card-props tr",
                "table.specs tr, .characteristics tr",
            ]),
            spec_blocks: owned(&[".product-card-prop-item", ".product-properties li"]),
            images: owned(&[
                ".product-card-gallery img, .product-gallery img",
                "img[itemprop='image']",
                "img",
            ]),
        }
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_max_page() -> u32 {
    DEFAULT_MAX_PAGE
}

fn default_concurrency() -> u32 {
    16
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_minimum_time_on_page() -> u64 {
    500
}

fn default_retry_times() -> u32 {
    5
}

fn default_retry_http_codes() -> Vec<u16> {
    vec![500, 502, 503, 504, 408, 429, 403]
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_output_directory() -> String {
    "outputs".to_string()
}

fn default_output_prefix() -> String {
    "catalog_combined".to_string()
}

fn default_data_directory() -> String {
    "data".to_string()
}

fn default_feed_prefix() -> String {
    "products_".to_string()
}

fn default_converter_name() -> String {
    "combined_products".to_string()
}

fn default_crawl_category_delimiter() -> String {
    " > ".to_string()
}

fn default_converter_category_delimiter() -> String {
    " » ".to_string()
}

fn default_newline() -> String {
    "\n".to_string()
}

fn default_comma() -> String {
    ", ".to_string()
}

fn default_true() -> bool {
    true
}
