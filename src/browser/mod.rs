//! Browser automation boundary.
//!
//! The crawler only talks to a browser through `BrowserDriver`, so the crawl
//! logic runs the same against a real WebDriver session or an in-memory site.

pub mod client;
pub mod config;
pub mod webdriver;

use async_trait::async_trait;

pub use webdriver::{WebDriverAnchor, WebDriverBrowser};

/// Failures reported by a browser driver
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The browser session could not be created or is gone
    #[error("WebDriver session error: {0}")]
    Session(String),

    /// The browser could not load the requested URL
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The element was detached from the DOM before it could be read
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// Any other failed WebDriver command
    #[error("WebDriver command failed: {0}")]
    Command(String),
}

/// A browser the crawler can drive, one command at a time
#[async_trait]
pub trait BrowserDriver: Send {
    type Anchor: AnchorHandle;

    /// Loads the absolute URL in the current window
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// URL of the loaded page, after any redirects
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Title of the loaded page
    async fn current_title(&self) -> Result<String, DriverError>;

    /// All anchors under the XPath `scope`, in document order
    async fn find_anchors(&self, scope: &str) -> Result<Vec<Self::Anchor>, DriverError>;

    /// Ends the browser session
    async fn quit(&mut self) -> Result<(), DriverError>;
}

/// An anchor element found on the current page
#[async_trait]
pub trait AnchorHandle: Send + Sync {
    /// The element's href, `None` if it has none.
    ///
    /// Relative values are allowed; the crawler resolves them against the
    /// current page URL.
    async fn href(&self) -> Result<Option<String>, DriverError>;
}

/// XPath locating every anchor below `scope`
pub fn anchor_xpath(scope: &str) -> String {
    format!("{}//a", scope.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_xpath() {
        assert_eq!(anchor_xpath("."), ".//a");
        assert_eq!(anchor_xpath(".//main"), ".//main//a");
        assert_eq!(anchor_xpath("//div[@id='content']/"), "//div[@id='content']//a");
    }
}
