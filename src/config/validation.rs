use crate::config::types::{
    Config, ConverterConfig, CrawlerConfig, FetcherConfig, OutputConfig, SelectorConfig,
};
use crate::extract::CompiledSelectors;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Everything checked here is fatal at startup; nothing is re-validated
/// once the crawl is running.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher, &config.crawler)?;
    validate_output_config(&config.output)?;
    validate_converter_config(&config.converter)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max_depth must be >= 1, got 0".to_string(),
        ));
    }

    if config.max_page < 1 {
        return Err(ConfigError::Validation(
            "max_page must be >= 1, got 0".to_string(),
        ));
    }

    if config.max_concurrent_pages_open < 1 || config.max_concurrent_pages_open > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages_open must be between 1 and 100, got {}",
            config.max_concurrent_pages_open
        )));
    }

    Ok(())
}

/// Validates transport configuration against the traversal bounds
fn validate_fetcher_config(
    config: &FetcherConfig,
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.depth_limit != crawler.max_depth {
        return Err(ConfigError::Validation(format!(
            "fetcher depth_limit ({}) must equal crawler max_depth ({})",
            config.depth_limit, crawler.max_depth
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1 second".to_string(),
        ));
    }

    for code in &config.retry_http_codes {
        if !(100..=599).contains(code) {
            return Err(ConfigError::Validation(format!(
                "retry_http_codes contains invalid status {}",
                code
            )));
        }
    }

    Ok(())
}

/// Validates live crawl output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    validate_file_stem("output file_prefix", &config.file_prefix)?;
    validate_delimiter("output category_delimiter", &config.category_delimiter)?;
    validate_delimiter("output specs_separator", &config.specs_separator)?;
    validate_delimiter("output images_separator", &config.images_separator)?;

    if config.json_feed && config.json_feed_directory.is_empty() {
        return Err(ConfigError::Validation(
            "json_feed_directory cannot be empty when json_feed is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates offline converter configuration
fn validate_converter_config(config: &ConverterConfig) -> Result<(), ConfigError> {
    if config.input_directory.is_empty() || config.output_directory.is_empty() {
        return Err(ConfigError::Validation(
            "converter directories cannot be empty".to_string(),
        ));
    }

    validate_file_stem("converter output_name", &config.output_name)?;
    validate_delimiter("converter category_delimiter", &config.category_delimiter)?;
    validate_delimiter("converter specs_separator", &config.specs_separator)?;
    validate_delimiter("converter images_separator", &config.images_separator)?;

    Ok(())
}

/// Compiles every selector tier once so typos fail before any request is sent
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.product_url_patterns.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "product_url_patterns cannot contain empty patterns".to_string(),
        ));
    }

    CompiledSelectors::compile(config).map(|_| ())
}

fn validate_file_stem(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if value.contains('/') || value.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "{} must be a file name, got '{}'",
            field, value
        )));
    }

    Ok(())
}

fn validate_delimiter(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
