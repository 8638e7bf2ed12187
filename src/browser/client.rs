use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, error, trace, warn};

use crate::browser::config;

/// Creates a new WebDriver client with the specified configuration
///
/// Sets up a Chrome browser instance suited to walking a site: JavaScript on,
/// images and popups off.
///
/// # Arguments
/// * `webdriver_url` - WebDriver server URL
/// * `viewport_size` - Optional viewport dimensions
/// * `headless` - Whether to run in headless mode
///
/// # Returns
/// * `Result<Client>` - A configured WebDriver client or an error
pub async fn create_client(
    webdriver_url: &str,
    viewport_size: Option<(u32, u32)>,
    headless: bool,
) -> Result<Client> {
    trace!("Creating new WebDriver client connecting to {}", webdriver_url);
    let mut caps = serde_json::map::Map::new();
    let mut chrome_opts = serde_json::map::Map::new();

    debug!("Configuring Chrome options with headless={}", headless);
    let args = config::chrome_arguments(headless);

    trace!("Setting Chrome arguments: {:?}", args);
    chrome_opts.insert("args".to_string(), serde_json::Value::Array(
        args.into_iter().map(serde_json::Value::String).collect()
    ));

    let prefs = config::chrome_preferences();
    chrome_opts.insert("prefs".to_string(), serde_json::Value::Object(prefs));

    caps.insert("goog:chromeOptions".to_string(), serde_json::Value::Object(chrome_opts));

    debug!("Connecting to WebDriver at {}", webdriver_url);
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps);
    let connect = builder.connect(webdriver_url);

    let client = match tokio::time::timeout(config::CONNECTION_TIMEOUT, connect).await {
        Ok(Ok(client)) => client,
        Ok(Err(e)) => {
            error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            return Err(e).context(format!("Failed to connect to WebDriver at {}", webdriver_url));
        }
        Err(_) => {
            error!("Timed out connecting to WebDriver at {}", webdriver_url);
            anyhow::bail!(
                "Timed out after {:?} connecting to WebDriver at {}",
                config::CONNECTION_TIMEOUT,
                webdriver_url
            );
        }
    };

    if let Some((width, height)) = viewport_size {
        debug!("Setting viewport size to {}x{}", width, height);
        if let Err(e) = client.set_window_size(width, height).await {
            // Not critical for link checking
            warn!("Failed to set window size to {}x{}: {}", width, height, e);
        }
    }

    trace!("Successfully created WebDriver client");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_webdriver_is_an_error() {
        let result = create_client("http://127.0.0.1:1", Some((800, 600)), true).await;

        let err = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("127.0.0.1:1"), "unexpected result: {:?}", err);
    }
}
