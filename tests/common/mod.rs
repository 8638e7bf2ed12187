#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use site_link_validator::{AnchorHandle, BrowserDriver, DriverError};

pub const DOMAIN: &str = "example.com";
pub const ROOT: &str = "https://example.com";

/// An anchor as the mock browser exposes it
#[derive(Debug, Clone)]
pub enum MockAnchor {
    Href(String),
    Empty,
    Stale,
}

#[async_trait]
impl AnchorHandle for MockAnchor {
    async fn href(&self) -> Result<Option<String>, DriverError> {
        match self {
            MockAnchor::Href(href) => Ok(Some(href.clone())),
            MockAnchor::Empty => Ok(None),
            MockAnchor::Stale => Err(DriverError::StaleElement("element is not attached".to_string())),
        }
    }
}

/// One page of the mock site.
///
/// Anchors are either inside the content area (visible to any scope) or in
/// the page chrome (only visible to a full-page lookup).
#[derive(Debug, Clone)]
pub struct MockPage {
    title: String,
    anchors: Vec<(MockAnchor, bool)>,
    anchors_unavailable: bool,
}

impl MockPage {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            anchors: Vec::new(),
            anchors_unavailable: false,
        }
    }

    /// Link inside the content area
    pub fn link(mut self, href: &str) -> Self {
        self.anchors.push((MockAnchor::Href(href.to_string()), true));
        self
    }

    /// Link in the navigation chrome, outside the content area
    pub fn nav_link(mut self, href: &str) -> Self {
        self.anchors.push((MockAnchor::Href(href.to_string()), false));
        self
    }

    pub fn empty_anchor(mut self) -> Self {
        self.anchors.push((MockAnchor::Empty, true));
        self
    }

    pub fn stale_anchor(mut self) -> Self {
        self.anchors.push((MockAnchor::Stale, true));
        self
    }

    pub fn anchors_unavailable(mut self) -> Self {
        self.anchors_unavailable = true;
        self
    }
}

/// What the crawler asked the mock browser to do
#[derive(Debug, Default)]
pub struct DriverLog {
    pub navigations: Vec<String>,
    /// (page, scope) of every anchor lookup
    pub anchor_scopes: Vec<(String, String)>,
    pub quit_calls: usize,
}

/// Static site keyed by absolute URL without fragment
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
    failing: HashSet<String>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page at a path relative to `ROOT`
    pub fn page(mut self, path: &str, page: MockPage) -> Self {
        self.pages.insert(format!("{}{}", ROOT, path), page);
        self
    }

    /// Makes navigation to the path fail
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(format!("{}{}", ROOT, path));
        self
    }

    pub fn driver(self) -> (MockDriver, Arc<Mutex<DriverLog>>) {
        let log = Arc::new(Mutex::new(DriverLog::default()));
        let driver = MockDriver {
            site: self,
            current: None,
            log: log.clone(),
        };
        (driver, log)
    }
}

pub struct MockDriver {
    site: MockSite,
    current: Option<String>,
    log: Arc<Mutex<DriverLog>>,
}

impl MockDriver {
    fn current_page(&self) -> Result<&MockPage, DriverError> {
        self.current
            .as_ref()
            .and_then(|url| self.site.pages.get(url))
            .ok_or_else(|| DriverError::Command("no page loaded".to_string()))
    }
}

fn page_key(url: &str) -> String {
    let without_fragment = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };
    without_fragment.trim_end_matches('/').to_string()
}

#[async_trait]
impl BrowserDriver for MockDriver {
    type Anchor = MockAnchor;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        let key = page_key(url);
        if self.site.failing.contains(&key) || !self.site.pages.contains_key(&key) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        self.current = Some(key);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.current
            .clone()
            .ok_or_else(|| DriverError::Command("no page loaded".to_string()))
    }

    async fn current_title(&self) -> Result<String, DriverError> {
        Ok(self.current_page()?.title.clone())
    }

    async fn find_anchors(&self, scope: &str) -> Result<Vec<MockAnchor>, DriverError> {
        let page = self.current_page()?;
        self.log
            .lock()
            .unwrap()
            .anchor_scopes
            .push((self.current.clone().unwrap_or_default(), scope.to_string()));

        if page.anchors_unavailable {
            return Err(DriverError::Command("no such window".to_string()));
        }
        let full_page = scope == ".";
        Ok(page
            .anchors
            .iter()
            .filter(|(_, in_content)| full_page || *in_content)
            .map(|(anchor, _)| anchor.clone())
            .collect())
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.log.lock().unwrap().quit_calls += 1;
        self.current = None;
        Ok(())
    }
}
