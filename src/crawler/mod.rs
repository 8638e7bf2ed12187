//! Breadth-first crawl of one site.
//!
//! The crawl loads the starting page, harvests every link on it, then drains
//! the frontier page by page. Each loaded page is checked against the
//! configured error-page title and denylist; problems are reported and the
//! crawl carries on.

pub mod fetcher;
pub mod frontier;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::browser::BrowserDriver;
use crate::config::{CrawlConfig, FULL_PAGE_SCOPE};
use crate::url_classifier::{resolve_href, UrlClassifier};

pub use fetcher::{LinkHarvest, PageFetcher, SkippedAnchor, VisitOutcome};
pub use frontier::Frontier;
pub use report::{CrawlReport, ReportEvent, Reporter};

/// Where a crawl is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Init,
    Seeding,
    Draining,
    Done,
}

/// Requests a running crawl to stop before its next page
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Asks the crawl to stop; returns whether a stop was already pending
    pub fn request_stop(&self) -> bool {
        self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives one crawl; owns the frontier, the reporter and the browser
pub struct Crawler<'a, D: BrowserDriver> {
    config: &'a CrawlConfig,
    fetcher: PageFetcher<D>,
    frontier: Frontier,
    reporter: Reporter,
    phase: CrawlPhase,
    stop: StopHandle,
}

impl<'a, D: BrowserDriver> Crawler<'a, D> {
    pub fn new(config: &'a CrawlConfig, driver: D) -> Self {
        let classifier = UrlClassifier::new(config);
        Self {
            config,
            fetcher: PageFetcher::new(driver, classifier),
            frontier: Frontier::new(),
            reporter: Reporter::new(),
            phase: CrawlPhase::Init,
            stop: StopHandle::default(),
        }
    }

    /// Handle that can stop this crawl from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Crawls the whole site.
    ///
    /// Returns once the frontier is empty, a stop was requested, or the
    /// starting page could not be loaded.
    pub async fn run(&mut self) {
        let config = self.config;
        self.phase = CrawlPhase::Init;
        let start = config.starting_absolute_url();
        info!("Starting crawl of {} at {}", config.domain(), start);

        match self.fetcher.visit(&start, &mut self.frontier).await {
            VisitOutcome::Loaded { relative, absolute } => {
                self.after_load(&relative, &absolute).await;
                self.phase = CrawlPhase::Seeding;
                debug!("Seeding frontier from the full page");
                self.harvest(FULL_PAGE_SCOPE, &absolute).await;
            }
            VisitOutcome::Failed { absolute, error } => {
                self.reporter.navigation_failed(&absolute, &error.to_string());
                warn!("Starting page could not be loaded, nothing to crawl");
                self.phase = CrawlPhase::Done;
                return;
            }
            other => {
                warn!("Starting page was not loaded: {:?}", other);
                self.phase = CrawlPhase::Done;
                return;
            }
        }

        self.phase = CrawlPhase::Draining;
        debug!("Draining frontier with {} queued URLs", self.frontier.len());

        loop {
            if self.stop.is_stop_requested() {
                info!("Stop requested, {} URLs left unvisited", self.frontier.len());
                break;
            }
            let Some(next) = self.frontier.dequeue_next() else {
                break;
            };

            let absolute = self.fetcher.classifier().to_absolute(&next);
            match self.fetcher.visit(&absolute, &mut self.frontier).await {
                VisitOutcome::Loaded { relative, absolute } => {
                    self.after_load(&relative, &absolute).await;
                    self.harvest(config.scope(), &absolute).await;
                }
                VisitOutcome::Failed { absolute, error } => {
                    self.reporter.navigation_failed(&absolute, &error.to_string());
                }
                VisitOutcome::AlreadyVisited { relative } => {
                    trace!("Skipping already visited {:?}", relative);
                }
                VisitOutcome::NotInternal => {
                    trace!("Skipping non-internal frontier entry {:?}", next);
                }
            }
        }

        self.phase = CrawlPhase::Done;
        info!(
            "Crawl finished: {} pages visited, {} events",
            self.frontier.visited().len(),
            self.reporter.events().len()
        );
    }

    /// Runs the crawl and returns its report
    pub async fn crawl(mut self) -> (CrawlReport, D) {
        self.run().await;
        self.finish()
    }

    /// Splits a finished crawler into its report and the driver
    pub fn finish(self) -> (CrawlReport, D) {
        let stopped = self.stop.is_stop_requested() && !self.frontier.is_empty();
        let report = self.reporter.into_report(self.frontier.into_visited(), stopped);
        (report, self.fetcher.into_driver())
    }

    /// Courtesy wait, then page validation
    async fn after_load(&mut self, relative: &str, absolute: &str) {
        let wait = self.config.time_to_wait();
        if !wait.is_zero() {
            trace!("Waiting {:?} after loading {}", wait, absolute);
            tokio::time::sleep(wait).await;
        }
        self.validate_page(relative, absolute).await;
    }

    async fn validate_page(&mut self, relative: &str, absolute: &str) {
        if let Some(title) = self.fetcher.current_title().await {
            if title == self.config.error_page_title() {
                self.reporter.error_page(absolute, &title);
            }
        }
        if self.config.is_denied(relative) {
            self.reporter.denied_url(absolute);
        }
    }

    /// Queues every new internal link under `scope` on the loaded page.
    ///
    /// Hrefs are resolved against the URL the browser reports, which may
    /// differ from `page` after a redirect.
    async fn harvest(&mut self, scope: &str, page: &str) {
        let base = self
            .fetcher
            .current_url()
            .await
            .and_then(|url| Url::parse(&url).ok())
            .or_else(|| Url::parse(page).ok());
        let harvest = self.fetcher.collect_links(scope).await;

        if let Some(error) = &harvest.lookup_error {
            self.reporter.anchor_lookup_failed(page, &error.to_string());
        }
        for skipped in &harvest.skipped {
            self.reporter
                .skipped_anchor(page, &format!("anchor #{}: {}", skipped.index, skipped.reason));
        }

        let mut added = 0;
        for href in &harvest.hrefs {
            let href = resolve_href(base.as_ref(), href);
            if self.enqueue_link(&href) {
                added += 1;
            }
        }
        debug!(
            "Harvested {} links on {}, queued {} new",
            harvest.hrefs.len(),
            page,
            added
        );
    }

    fn enqueue_link(&mut self, href: &str) -> bool {
        let classifier = self.fetcher.classifier();
        if !classifier.is_internal(href) || !classifier.matches_filter(href) {
            return false;
        }
        let Some(relative) = classifier.to_relative(href) else {
            return false;
        };
        if self.frontier.is_visited(&relative) {
            return false;
        }
        self.frontier.enqueue(relative)
    }
}

/// Crawls the site with `driver` and always quits the driver afterwards.
///
/// This is the usual entry point: the driver is released whether the crawl
/// drained the frontier, was stopped, or could not load the starting page.
pub async fn validate_site<D: BrowserDriver>(config: &CrawlConfig, driver: D) -> CrawlReport {
    validate_site_with_stop(config, driver, StopHandle::default()).await
}

/// Like `validate_site`, stopping early once `stop` is triggered
pub async fn validate_site_with_stop<D: BrowserDriver>(
    config: &CrawlConfig,
    driver: D,
    stop: StopHandle,
) -> CrawlReport {
    let mut crawler = Crawler::new(config, driver);
    crawler.stop = stop;
    let (report, mut driver) = crawler.crawl().await;

    if let Err(e) = driver.quit().await {
        warn!("Failed to close browser session: {}", e);
    }

    info!(
        "Validated {} pages of {}: {} anomalies",
        report.visited.len(),
        config.domain(),
        report.anomaly_count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_handle_is_shared_between_clones() {
        let stop = StopHandle::default();
        let other = stop.clone();
        assert!(!stop.is_stop_requested());

        assert!(!other.request_stop());
        assert!(stop.is_stop_requested());
        assert!(stop.request_stop());
    }
}
