use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use crate::url_classifier::{anchored_filter, normalize_domain, UrlClassifier};

// Defaults for a crawl
pub const DEFAULT_PROTOCOL: &str = "https://";
pub const DEFAULT_ERROR_PAGE_TITLE: &str = "404 not found";
pub const DEFAULT_SCOPE: &str = ".//main";
/// Scope expression covering the whole document
pub const FULL_PAGE_SCOPE: &str = ".";

/// Errors raised while building a `CrawlConfig`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Domain cannot be empty")]
    EmptyDomain,

    #[error("Protocol '{0}' is not supported, use http:// or https://")]
    UnsupportedProtocol(String),

    #[error("Starting URL '{url}' is not internal to domain '{domain}'")]
    ExternalStartingUrl { url: String, domain: String },

    #[error("Invalid filter pattern '{pattern}': {error}")]
    InvalidFilter {
        pattern: String,
        #[source]
        error: regex::Error,
    },

    #[error("Wait time must be a non-negative number of seconds that fits a duration, got {0}")]
    InvalidWait(f64),

    #[error("Scope expression cannot be empty")]
    EmptyScope,
}

/// Immutable configuration of one crawl.
///
/// Built once through `CrawlConfig::builder` and then only read.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    protocol: String,
    domain: String,
    starting_url: String,
    error_page_title: String,
    time_to_wait: Duration,
    scope: String,
    check_anchors: bool,
    filter: Option<Regex>,
    denylist: HashSet<String>,
}

impl CrawlConfig {
    /// Starts a builder for the given domain, with every other field defaulted
    pub fn builder(domain: impl Into<String>) -> CrawlConfigBuilder {
        CrawlConfigBuilder::new(domain)
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Domain without trailing slash
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Canonical relative form of the first page to visit
    pub fn starting_url(&self) -> &str {
        &self.starting_url
    }

    pub fn error_page_title(&self) -> &str {
        &self.error_page_title
    }

    /// Courtesy delay after each page load
    pub fn time_to_wait(&self) -> Duration {
        self.time_to_wait
    }

    /// XPath of the subtree whose anchors are followed on non-seed pages
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether fragment identifiers are kept in relative URLs
    pub fn check_anchors(&self) -> bool {
        self.check_anchors
    }

    /// The anchored filter pattern, if any
    pub fn filter(&self) -> Option<&Regex> {
        self.filter.as_ref()
    }

    /// Whether the relative URL is a known-bad page
    pub fn is_denied(&self, relative: &str) -> bool {
        self.denylist.contains(relative)
    }

    pub fn denylist(&self) -> &HashSet<String> {
        &self.denylist
    }

    /// Absolute URL of the first page
    pub fn starting_absolute_url(&self) -> String {
        format!("{}{}{}", self.protocol, self.domain, self.starting_url)
    }
}

/// Builder for `CrawlConfig`; validation happens in `build`
#[derive(Debug, Clone)]
pub struct CrawlConfigBuilder {
    domain: String,
    protocol: String,
    starting_url: String,
    error_page_title: String,
    time_to_wait_secs: f64,
    scope: String,
    check_anchors: bool,
    filter: Option<String>,
    denylist: Vec<String>,
}

impl CrawlConfigBuilder {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            starting_url: String::new(),
            error_page_title: DEFAULT_ERROR_PAGE_TITLE.to_string(),
            time_to_wait_secs: 0.0,
            scope: DEFAULT_SCOPE.to_string(),
            check_anchors: false,
            filter: None,
            denylist: Vec::new(),
        }
    }

    /// Sets the protocol prefix, e.g. `http://`
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the first page; absolute URLs on the domain are accepted too
    pub fn with_starting_url(mut self, starting_url: impl Into<String>) -> Self {
        self.starting_url = starting_url.into();
        self
    }

    /// Sets the title that marks a page as an error page
    pub fn with_error_page_title(mut self, title: impl Into<String>) -> Self {
        self.error_page_title = title.into();
        self
    }

    /// Sets the delay in seconds after each page load
    pub fn with_time_to_wait(mut self, seconds: f64) -> Self {
        self.time_to_wait_secs = seconds;
        self
    }

    /// Sets the XPath of the subtree harvested on non-seed pages
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Keeps fragment identifiers, so `/a#x` and `/a#y` are distinct pages
    pub fn with_check_anchors(mut self, check_anchors: bool) -> Self {
        self.check_anchors = check_anchors;
        self
    }

    /// Restricts followed links to relative URLs matching the pattern at their start
    pub fn with_filter(mut self, pattern: Option<String>) -> Self {
        self.filter = pattern.filter(|p| !p.is_empty());
        self
    }

    /// Adds known-bad URLs that are reported whenever they are visited
    pub fn with_denylist<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let domain = normalize_domain(&self.domain);
        if domain.is_empty() {
            return Err(ConfigError::EmptyDomain);
        }

        let protocol = self.protocol.trim().to_ascii_lowercase();
        if protocol != "http://" && protocol != "https://" {
            return Err(ConfigError::UnsupportedProtocol(self.protocol));
        }

        let time_to_wait = Duration::try_from_secs_f64(self.time_to_wait_secs)
            .map_err(|_| ConfigError::InvalidWait(self.time_to_wait_secs))?;

        let scope = self.scope.trim().to_string();
        if scope.is_empty() {
            return Err(ConfigError::EmptyScope);
        }

        let filter = match &self.filter {
            Some(pattern) => Some(anchored_filter(pattern).map_err(|error| {
                ConfigError::InvalidFilter {
                    pattern: pattern.clone(),
                    error,
                }
            })?),
            None => None,
        };

        let classifier =
            UrlClassifier::from_parts(&protocol, &domain, self.check_anchors, filter.clone());

        // The empty string is the root and needs no classification
        let starting_url = if self.starting_url.trim().is_empty() {
            String::new()
        } else {
            classifier
                .to_relative(&self.starting_url)
                .ok_or_else(|| ConfigError::ExternalStartingUrl {
                    url: self.starting_url.clone(),
                    domain: domain.clone(),
                })?
        };

        let denylist = self
            .denylist
            .iter()
            .filter_map(|url| {
                let relative = classifier.to_relative(url);
                if relative.is_none() {
                    debug!("Ignoring denylist entry outside the domain: {}", url);
                }
                relative
            })
            .collect();

        Ok(CrawlConfig {
            protocol,
            domain,
            starting_url,
            error_page_title: self.error_page_title,
            time_to_wait,
            scope,
            check_anchors: self.check_anchors,
            filter,
            denylist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::builder("w3.org").build().unwrap();

        assert_eq!(config.domain(), "w3.org");
        assert_eq!(config.protocol(), "https://");
        assert_eq!(config.starting_url(), "");
        assert_eq!(config.error_page_title(), "404 not found");
        assert_eq!(config.time_to_wait(), Duration::ZERO);
        assert_eq!(config.scope(), ".//main");
        assert!(!config.check_anchors());
        assert!(config.filter().is_none());
        assert!(config.denylist().is_empty());
        assert_eq!(config.starting_absolute_url(), "https://w3.org");
    }

    #[test]
    fn test_builder() {
        let config = CrawlConfig::builder("www.w3.org/")
            .with_protocol("http://")
            .with_starting_url("https://w3.org/standards/")
            .with_error_page_title("Page not found")
            .with_time_to_wait(1.5)
            .with_scope(".//body")
            .with_check_anchors(true)
            .with_filter(Some("/?standards".to_string()))
            .with_denylist(["https://w3.org/broken/", "/also-broken", "https://google.com/x"])
            .build()
            .unwrap();

        assert_eq!(config.domain(), "www.w3.org");
        assert_eq!(config.protocol(), "http://");
        assert_eq!(config.starting_url(), "/standards");
        assert_eq!(config.error_page_title(), "Page not found");
        assert_eq!(config.time_to_wait(), Duration::from_millis(1500));
        assert_eq!(config.scope(), ".//body");
        assert!(config.check_anchors());
        assert!(config.filter().unwrap().is_match("/standards"));
        assert!(config.is_denied("/broken"));
        assert!(config.is_denied("/also-broken"));
        assert_eq!(config.denylist().len(), 2);
        assert_eq!(config.starting_absolute_url(), "http://www.w3.org/standards");
    }

    #[test]
    fn test_relative_starting_url() {
        let config = CrawlConfig::builder("w3.org")
            .with_starting_url("/standards")
            .build()
            .unwrap();
        assert_eq!(config.starting_url(), "/standards");
    }

    #[test]
    fn test_external_starting_url_is_rejected() {
        let result = CrawlConfig::builder("w3.org")
            .with_starting_url("https://google.com")
            .build();
        assert!(matches!(result, Err(ConfigError::ExternalStartingUrl { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            CrawlConfig::builder("  ").build(),
            Err(ConfigError::EmptyDomain)
        ));
        assert!(matches!(
            CrawlConfig::builder("w3.org").with_protocol("ftp://").build(),
            Err(ConfigError::UnsupportedProtocol(_))
        ));
        assert!(matches!(
            CrawlConfig::builder("w3.org").with_time_to_wait(-1.0).build(),
            Err(ConfigError::InvalidWait(_))
        ));
        for wait in [1e30, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                CrawlConfig::builder("w3.org").with_time_to_wait(wait).build(),
                Err(ConfigError::InvalidWait(_))
            ));
        }
        assert!(matches!(
            CrawlConfig::builder("w3.org").with_scope("").build(),
            Err(ConfigError::EmptyScope)
        ));

        let err = CrawlConfig::builder("w3.org")
            .with_filter(Some("(unclosed".to_string()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_empty_filter_means_no_filter() {
        let config = CrawlConfig::builder("w3.org")
            .with_filter(Some(String::new()))
            .build()
            .unwrap();
        assert!(config.filter().is_none());
    }
}
