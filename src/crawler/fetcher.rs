use tracing::{debug, trace, warn};

use crate::browser::{AnchorHandle, BrowserDriver, DriverError};
use crate::crawler::frontier::Frontier;
use crate::url_classifier::UrlClassifier;

/// Result of asking the fetcher to load a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// The page is loaded in the browser and marked visited
    Loaded { relative: String, absolute: String },
    /// The page was fetched earlier in this crawl; the browser was not touched
    AlreadyVisited { relative: String },
    /// The URI is not a link into the crawled domain
    NotInternal,
    /// The browser could not load the page; it is not marked visited
    Failed { absolute: String, error: DriverError },
}

/// An anchor that could not be harvested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAnchor {
    /// Position of the anchor in document order
    pub index: usize,
    pub reason: String,
}

/// Hrefs read from one page
#[derive(Debug, Default)]
pub struct LinkHarvest {
    /// Raw hrefs in document order
    pub hrefs: Vec<String>,
    pub skipped: Vec<SkippedAnchor>,
    /// Set when the anchors could not be listed at all
    pub lookup_error: Option<DriverError>,
}

/// Adapter between the crawl loop and the browser driver.
///
/// Every driver failure comes back as a value, never as an error.
pub struct PageFetcher<D: BrowserDriver> {
    driver: D,
    classifier: UrlClassifier,
}

impl<D: BrowserDriver> PageFetcher<D> {
    pub fn new(driver: D, classifier: UrlClassifier) -> Self {
        Self { driver, classifier }
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    /// Loads the page for `uri` unless it was visited already.
    ///
    /// `uri` may be absolute or relative; it is canonicalized first. On success
    /// the relative URL is recorded in `frontier` as visited.
    pub async fn visit(&mut self, uri: &str, frontier: &mut Frontier) -> VisitOutcome {
        let Some(relative) = self.classifier.to_relative(uri) else {
            debug!("Not visiting {}: not an internal link", uri);
            return VisitOutcome::NotInternal;
        };

        if frontier.is_visited(&relative) {
            trace!("Already visited: {:?}", relative);
            return VisitOutcome::AlreadyVisited { relative };
        }

        let absolute = self.classifier.to_absolute(&relative);
        match self.driver.navigate(&absolute).await {
            Ok(()) => {
                frontier.mark_visited(&relative);
                VisitOutcome::Loaded { relative, absolute }
            }
            Err(error) => VisitOutcome::Failed { absolute, error },
        }
    }

    /// Title of the loaded page, `None` if the driver could not tell
    pub async fn current_title(&self) -> Option<String> {
        match self.driver.current_title().await {
            Ok(title) => Some(title),
            Err(e) => {
                warn!("Could not read page title: {}", e);
                None
            }
        }
    }

    /// URL the browser ended up on, `None` if the driver could not tell
    pub async fn current_url(&self) -> Option<String> {
        match self.driver.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Could not read current URL: {}", e);
                None
            }
        }
    }

    /// Reads the href of every anchor under `scope`.
    ///
    /// Stale anchors and anchors without an href are skipped; the rest of the
    /// page is still harvested.
    pub async fn collect_links(&self, scope: &str) -> LinkHarvest {
        let mut harvest = LinkHarvest::default();

        let anchors = match self.driver.find_anchors(scope).await {
            Ok(anchors) => anchors,
            Err(error) => {
                harvest.lookup_error = Some(error);
                return harvest;
            }
        };
        trace!("Found {} anchors under {}", anchors.len(), scope);

        for (index, anchor) in anchors.iter().enumerate() {
            match anchor.href().await {
                Ok(Some(href)) if !href.trim().is_empty() => harvest.hrefs.push(href),
                Ok(_) => harvest.skipped.push(SkippedAnchor {
                    index,
                    reason: "empty href".to_string(),
                }),
                Err(e) => harvest.skipped.push(SkippedAnchor {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        harvest
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Hands the driver back, e.g. to quit it
    pub fn into_driver(self) -> D {
        self.driver
    }
}
