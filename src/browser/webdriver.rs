use anyhow::Result;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use std::fmt;
use tracing::{debug, info, trace, warn};

use crate::browser::{anchor_xpath, client, AnchorHandle, BrowserDriver, DriverError};

/// `BrowserDriver` backed by a fantoccini WebDriver session
pub struct WebDriverBrowser {
    client: Option<Client>,
    webdriver_url: String,
}

impl fmt::Debug for WebDriverBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverBrowser")
            .field("webdriver_url", &self.webdriver_url)
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl WebDriverBrowser {
    /// Opens a new Chrome session on the WebDriver server
    pub async fn connect(
        webdriver_url: &str,
        viewport_size: Option<(u32, u32)>,
        headless: bool,
    ) -> Result<Self> {
        let client = client::create_client(webdriver_url, viewport_size, headless).await?;
        info!("WebDriver session opened at {}", webdriver_url);
        Ok(Self::from_client(client, webdriver_url))
    }

    /// Wraps an already connected client
    pub fn from_client(client: Client, webdriver_url: &str) -> Self {
        Self {
            client: Some(client),
            webdriver_url: webdriver_url.to_string(),
        }
    }

    fn client(&self) -> Result<&Client, DriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| DriverError::Session("session already closed".to_string()))
    }
}

impl Drop for WebDriverBrowser {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        warn!("WebDriverBrowser dropped without quit, closing the session in the background");
        // Can't do async close in drop, so hand it to the runtime if there is one
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.close().await {
                        warn!("Error closing leaked browser session: {}", e);
                    }
                });
            }
            Err(_) => warn!("No async runtime to close the session; it may stay open"),
        }
    }
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    type Anchor = WebDriverAnchor;

    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to URL: {}", url);
        self.client()?
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        trace!("Successfully navigated to {}", url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self.client()?.current_url().await.map_err(command_error)?;
        Ok(url.to_string())
    }

    async fn current_title(&self) -> Result<String, DriverError> {
        self.client()?.title().await.map_err(command_error)
    }

    async fn find_anchors(&self, scope: &str) -> Result<Vec<WebDriverAnchor>, DriverError> {
        let xpath = anchor_xpath(scope);
        trace!("Looking up anchors with {}", xpath);
        let elements = self
            .client()?
            .find_all(Locator::XPath(&xpath))
            .await
            .map_err(command_error)?;
        Ok(elements.into_iter().map(WebDriverAnchor).collect())
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        match self.client.take() {
            Some(client) => {
                info!("Closing WebDriver session at {}", self.webdriver_url);
                client.close().await.map_err(command_error)
            }
            None => {
                debug!("WebDriver session already closed");
                Ok(())
            }
        }
    }
}

/// Anchor element in a WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverAnchor(Element);

#[async_trait]
impl AnchorHandle for WebDriverAnchor {
    async fn href(&self) -> Result<Option<String>, DriverError> {
        // The property holds the href resolved against the page URL
        self.0.prop("href").await.map_err(command_error)
    }
}

fn command_error(e: CmdError) -> DriverError {
    let message = e.to_string();
    if message.to_ascii_lowercase().contains("stale element") {
        DriverError::StaleElement(message)
    } else {
        DriverError::Command(message)
    }
}
