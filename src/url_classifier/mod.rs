use regex::Regex;
use tracing::trace;
use url::Url;

use crate::config::CrawlConfig;

/// Schemes an anchor can carry that never lead to a page on the site
const NON_WEB_SCHEMES: [&str; 5] = ["mailto:", "tel:", "ftp:", "javascript:", "data:"];

/// Decides which URIs are followable, which belong to the crawled domain,
/// and what their canonical relative form is.
///
/// All functions are pure: invalid input is simply "not a link" and nothing
/// here returns an error.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    protocol: String,
    domain: String,
    domain_no_www: String,
    check_anchors: bool,
    filter: Option<Regex>,
}

impl UrlClassifier {
    /// Builds a classifier from the crawl configuration
    pub fn new(config: &CrawlConfig) -> Self {
        Self::from_parts(
            config.protocol(),
            config.domain(),
            config.check_anchors(),
            config.filter().cloned(),
        )
    }

    /// Builds a classifier without going through a full `CrawlConfig`.
    ///
    /// The filter is expected to be anchored already (see `anchored_filter`).
    pub fn from_parts(
        protocol: &str,
        domain: &str,
        check_anchors: bool,
        filter: Option<Regex>,
    ) -> Self {
        let domain = normalize_domain(domain);
        let domain_no_www = strip_www(&domain).to_string();
        Self {
            protocol: protocol.to_string(),
            domain,
            domain_no_www,
            check_anchors,
            filter,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether the URI can be followed at all
    pub fn is_link(&self, uri: &str) -> bool {
        let uri = uri.trim();
        if uri.is_empty() {
            return false;
        }
        let lower = uri.to_ascii_lowercase();
        !NON_WEB_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
    }

    /// Whether the URI starts with an http or https scheme
    pub fn is_absolute(&self, uri: &str) -> bool {
        let lower = uri.trim_start().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Whether the URI points into the configured domain.
    ///
    /// Relative URIs are always internal. Absolute and scheme-relative URIs
    /// must carry the configured authority, ignoring a leading `www.` on
    /// either side.
    pub fn is_internal(&self, uri: &str) -> bool {
        if !self.is_link(uri) {
            return false;
        }
        let uri = uri.trim();

        let candidate = if self.is_absolute(uri) {
            uri.to_string()
        } else if uri.starts_with("//") {
            format!("http:{}", uri)
        } else {
            return true;
        };

        match authority_of(&candidate) {
            Some(authority) => strip_www(&authority) == self.domain_no_www,
            None => {
                trace!("Could not parse authority of {}", uri);
                false
            }
        }
    }

    /// Converts an internal URI into its canonical relative form.
    ///
    /// Returns `None` for URIs outside the domain. The root of the site is the
    /// empty string.
    pub fn to_relative(&self, uri: &str) -> Option<String> {
        if !self.is_internal(uri) {
            return None;
        }
        let uri = uri.trim();

        let mut relative = if self.is_absolute(uri) || uri.starts_with("//") {
            let after_scheme = match uri.find("//") {
                Some(idx) => &uri[idx + 2..],
                None => uri,
            };
            match after_scheme.find(&['/', '?', '#'][..]) {
                Some(idx) => after_scheme[idx..].to_string(),
                None => String::new(),
            }
        } else {
            uri.to_string()
        };

        if !self.check_anchors {
            relative = strip_fragment(&relative).to_string();
        }

        // A run of trailing slashes collapses so the result is a fixed point
        let trimmed = relative.trim_end_matches('/').len();
        relative.truncate(trimmed);

        // `//x` would read back as a scheme-relative URI
        if relative.starts_with("//") {
            relative = format!("/{}", relative.trim_start_matches('/'));
        }

        if !relative.is_empty() && !relative.starts_with(&['/', '#', '?'][..]) {
            relative.insert(0, '/');
        }

        Some(relative)
    }

    /// Whether the URI passes the configured filter pattern.
    ///
    /// Without a pattern every internal URI passes.
    pub fn matches_filter(&self, uri: &str) -> bool {
        let Some(relative) = self.to_relative(uri) else {
            return false;
        };
        match &self.filter {
            Some(filter) => filter.is_match(&relative),
            None => true,
        }
    }

    /// Composes the absolute URL the browser should load for a relative one
    pub fn to_absolute(&self, relative: &str) -> String {
        format!("{}{}{}", self.protocol, self.domain, relative)
    }
}

/// Resolves an href against the URL of the page it was found on.
///
/// Hrefs that cannot be joined (or when the page URL is unknown) come back
/// trimmed but otherwise unchanged, for the classifier to judge.
pub fn resolve_href(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    match base {
        Some(base) if !href.is_empty() => match base.join(href) {
            Ok(resolved) => resolved.into(),
            Err(e) => {
                trace!("Could not resolve {} against {}: {}", href, base, e);
                href.to_string()
            }
        },
        _ => href.to_string(),
    }
}

/// Removes everything from the first `#` onward
pub fn strip_fragment(uri: &str) -> &str {
    match uri.find('#') {
        Some(idx) => &uri[..idx],
        None => uri,
    }
}

/// Removes a single leading `www.`
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Lower-cases a configured domain and drops any trailing slashes
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Wraps a user pattern so it only matches at the start of the relative URL
pub fn anchored_filter(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

fn authority_of(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
