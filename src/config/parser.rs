use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_sweep::config::load_config;
///
/// let config = load_config(Path::new("catalog.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is logged at startup so a run's export can be traced back to
/// the exact configuration that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config_content = r#"
[crawler]
seeds = ["https://shop.example.com/catalogue/"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 50);
        assert_eq!(config.crawler.max_page, 50);
        assert_eq!(config.crawler.max_concurrent_pages_open, 16);
        assert!(!config.crawler.visited_set);
        assert_eq!(config.fetcher.depth_limit, 50);
        assert_eq!(config.fetcher.retry_times, 5);
        assert_eq!(config.output.format, ExportFormat::Xlsx);
        assert_eq!(config.output.category_delimiter, " > ");
        assert_eq!(config.converter.category_delimiter, " » ");
        assert_eq!(config.converter.file_prefix, "products_");
        assert!(!config.selectors.category_links.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[crawler]
seeds = ["https://shop.example.com/catalogue/"]
allowed-domains = ["*.example.com"]
max-depth = 3
max-page = 5
max-concurrent-pages-open = 4
visited-set = true

[fetcher]
user-agent = "TestCrawler/1.0"
minimum-time-on-page = 100
retry-times = 2
retry-http-codes = [503]
depth-limit = 3

[output]
directory = "out"
file-prefix = "shop"
format = "csv"
images-separator = "\n"

[converter]
input-directory = "feeds"
category-delimiter = " / "

[selectors]
category-links = ["ul.menu a"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_page, 5);
        assert!(config.crawler.visited_set);
        assert_eq!(config.crawler.allowed_domains, vec!["*.example.com"]);
        assert_eq!(config.fetcher.user_agent, "TestCrawler/1.0");
        assert_eq!(config.fetcher.retry_http_codes, vec![503]);
        assert_eq!(config.output.format, ExportFormat::Csv);
        assert_eq!(config.output.images_separator, "\n");
        assert_eq!(config.converter.input_directory, "feeds");
        assert_eq!(config.converter.category_delimiter, " / ");
        assert_eq!(config.selectors.category_links, vec!["ul.menu a"]);
        // Untouched selector lists keep their defaults
        assert!(!config.selectors.product_links.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/catalog.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
seeds = ["https://shop.example.com/"]
max-concurrent-pages-open = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
