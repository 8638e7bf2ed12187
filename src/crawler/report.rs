use serde::Serialize;
use tracing::{debug, error, warn};

/// Something worth reporting that happened during a crawl.
///
/// None of these stop the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEvent {
    /// The page title matched the configured error-page title
    ErrorPage { url: String, title: String },
    /// The page is on the list of known-bad URLs
    DeniedUrl { url: String },
    /// The browser could not load the page
    NavigationFailed { url: String, reason: String },
    /// An anchor was skipped because it was stale or had no href
    SkippedAnchor { page: String, reason: String },
    /// The anchors of a page could not be listed
    AnchorLookupFailed { page: String, reason: String },
}

impl ReportEvent {
    /// Whether the event marks a broken or unreachable page
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            ReportEvent::ErrorPage { .. }
                | ReportEvent::DeniedUrl { .. }
                | ReportEvent::NavigationFailed { .. }
        )
    }
}

/// Append-only log of crawl events, mirrored to tracing
#[derive(Debug, Default)]
pub struct Reporter {
    events: Vec<ReportEvent>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_page(&mut self, url: &str, title: &str) {
        warn!("Invalid URL: {} (title: {:?})", url, title);
        self.events.push(ReportEvent::ErrorPage {
            url: url.to_string(),
            title: title.to_string(),
        });
    }

    pub fn denied_url(&mut self, url: &str) {
        error!("Known bad URL visited: {}", url);
        self.events.push(ReportEvent::DeniedUrl {
            url: url.to_string(),
        });
    }

    pub fn navigation_failed(&mut self, url: &str, reason: &str) {
        warn!("Failed to load {}: {}", url, reason);
        self.events.push(ReportEvent::NavigationFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn skipped_anchor(&mut self, page: &str, reason: &str) {
        debug!("Skipping anchor on {}: {}", page, reason);
        self.events.push(ReportEvent::SkippedAnchor {
            page: page.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn anchor_lookup_failed(&mut self, page: &str, reason: &str) {
        warn!("Could not list anchors on {}: {}", page, reason);
        self.events.push(ReportEvent::AnchorLookupFailed {
            page: page.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn into_report(self, visited: Vec<String>, stopped_early: bool) -> CrawlReport {
        CrawlReport {
            visited,
            events: self.events,
            stopped_early,
        }
    }
}

/// Outcome of a finished crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Relative URLs in the order they were fetched
    pub visited: Vec<String>,
    pub events: Vec<ReportEvent>,
    /// Whether a stop was requested before the frontier drained
    pub stopped_early: bool,
}

impl CrawlReport {
    /// Events for pages whose title marked them as error pages
    pub fn error_pages(&self) -> impl Iterator<Item = &ReportEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event, ReportEvent::ErrorPage { .. }))
    }

    pub fn anomaly_count(&self) -> usize {
        self.events.iter().filter(|event| event.is_anomaly()).count()
    }

    /// True when no page was broken or unreachable
    pub fn is_clean(&self) -> bool {
        self.anomaly_count() == 0
    }
}
