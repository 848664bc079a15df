use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_classifier_config(&config.classifier)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    for path in &config.fallback_category_paths {
        if path.is_empty() || path.starts_with('#') {
            return Err(ConfigError::Validation(format!(
                "Invalid fallback category path '{}'",
                path
            )));
        }
        url.join(path).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid fallback category path '{}': {}", path, e))
        })?;
    }

    if config.pagination_param.is_empty()
        || !config
            .pagination_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "pagination-param must be a plain query key, got '{}'",
            config.pagination_param
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 10 || config.request_timeout > 30 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 10 and 30 seconds, got {}",
            config.request_timeout
        )));
    }

    if config.politeness_delay > 10_000 {
        return Err(ConfigError::Validation(format!(
            "politeness-delay must be <= 10000ms, got {}ms",
            config.politeness_delay
        )));
    }

    if config.max_pagination_depth < 1 {
        return Err(ConfigError::Validation(
            "max-pagination-depth must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.progress_buffer < 1 {
        return Err(ConfigError::Validation(
            "progress-buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates request header configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !config.value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err(ConfigError::Validation(format!(
            "user-agent value contains invalid characters: '{}'",
            config.value
        )));
    }

    Ok(())
}

/// Validates classifier thresholds
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.weak_indicator_threshold < 1 || config.weak_indicator_threshold > 5 {
        return Err(ConfigError::Validation(format!(
            "weak-indicator-threshold must be between 1 and 5, got {}",
            config.weak_indicator_threshold
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("json-path", &config.json_path),
        ("csv-path", &config.csv_path),
        ("summary-path", &config.summary_path),
    ] {
        if matches!(value, Some(path) if path.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::for_site("https://shop.example.com/")
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = valid_config();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.site.base_url = "ftp://shop.example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_request_timeout_bounds() {
        let mut config = valid_config();
        config.crawler.request_timeout = 5;
        assert!(validate(&config).is_err());

        config.crawler.request_timeout = 31;
        assert!(validate(&config).is_err());

        config.crawler.request_timeout = 30;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_workers() {
        let mut config = valid_config();
        config.crawler.workers = 0;
        assert!(validate(&config).is_err());

        config.crawler.workers = 17;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_pagination_param() {
        let mut config = valid_config();
        config.site.pagination_param = "page&x".to_string();
        assert!(validate(&config).is_err());

        config.site.pagination_param = "paged".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_weak_threshold() {
        let mut config = valid_config();
        config.classifier.weak_indicator_threshold = 0;
        assert!(validate(&config).is_err());

        config.classifier.weak_indicator_threshold = 6;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_empty_output_path() {
        let mut config = valid_config();
        config.output.csv_path = Some("  ".to_string());
        assert!(validate(&config).is_err());
    }
}
