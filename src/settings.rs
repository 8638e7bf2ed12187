use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::browser::config::{DEFAULT_VIEWPORT, DEFAULT_WEBDRIVER_URL};
use crate::cli::Cli;
use crate::config::CrawlConfig;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "site_link_validator";
/// Prefix of environment overrides, e.g. `SITE_VALIDATOR_DOMAIN`
pub const ENV_PREFIX: &str = "SITE_VALIDATOR";

/// Everything a run can be configured with, before validation
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub domain: Option<String>,
    pub protocol: Option<String>,
    pub starting_url: Option<String>,
    pub error_page_title: Option<String>,
    pub time_to_wait: Option<f64>,
    pub scope: Option<String>,
    pub check_anchors: Option<bool>,
    pub filter: Option<String>,
    pub denylist: Vec<String>,
    pub log_dir: Option<String>,
    pub browser: BrowserSettings,
}

/// How to open the browser session
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            viewport_width: DEFAULT_VIEWPORT.0,
            viewport_height: DEFAULT_VIEWPORT.1,
        }
    }
}

impl BrowserSettings {
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }
}

impl Settings {
    /// Loads settings from a file and `SITE_VALIDATOR_*` environment variables.
    ///
    /// An explicit `path` must exist; otherwise `site_link_validator.{toml,yaml,json}`
    /// is used when present. Nested keys use `__` in the environment, e.g.
    /// `SITE_VALIDATOR_BROWSER__HEADLESS=false`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        builder = match path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                builder.add_source(::config::File::from(path))
            }
            None => builder.add_source(::config::File::with_name(DEFAULT_SETTINGS_FILE).required(false)),
        };

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Overrides settings with whatever was given on the command line
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(domain) = &cli.domain {
            self.domain = Some(domain.clone());
        }
        if let Some(protocol) = &cli.protocol {
            self.protocol = Some(protocol.clone());
        }
        if let Some(starting_url) = &cli.starting_url {
            self.starting_url = Some(starting_url.clone());
        }
        if let Some(title) = &cli.error_title {
            self.error_page_title = Some(title.clone());
        }
        if let Some(wait) = cli.wait {
            self.time_to_wait = Some(wait);
        }
        if let Some(scope) = &cli.scope {
            self.scope = Some(scope.clone());
        }
        if cli.check_anchors {
            self.check_anchors = Some(true);
        }
        if let Some(filter) = &cli.filter {
            self.filter = Some(filter.clone());
        }
        self.denylist.extend(cli.denylist.iter().cloned());
        if let Some(log_dir) = &cli.log_dir {
            self.log_dir = Some(log_dir.to_string_lossy().into_owned());
        }
        if let Some(url) = &cli.webdriver_url {
            self.browser.webdriver_url = url.clone();
        }
        if cli.headed {
            self.browser.headless = false;
        }
        if let Some((width, height)) = cli.viewport {
            self.browser.viewport_width = width;
            self.browser.viewport_height = height;
        }
        self
    }

    /// Validates the crawl part of the settings
    pub fn crawl_config(&self) -> Result<CrawlConfig> {
        let domain = self
            .domain
            .clone()
            .context("No domain given: pass one on the command line or set `domain` in the settings")?;

        let mut builder = CrawlConfig::builder(domain)
            .with_check_anchors(self.check_anchors.unwrap_or(false))
            .with_filter(self.filter.clone())
            .with_denylist(self.denylist.iter().cloned());

        if let Some(protocol) = &self.protocol {
            builder = builder.with_protocol(protocol.clone());
        }
        if let Some(starting_url) = &self.starting_url {
            builder = builder.with_starting_url(starting_url.clone());
        }
        if let Some(title) = &self.error_page_title {
            builder = builder.with_error_page_title(title.clone());
        }
        if let Some(wait) = self.time_to_wait {
            builder = builder.with_time_to_wait(wait);
        }
        if let Some(scope) = &self.scope {
            builder = builder.with_scope(scope.clone());
        }

        builder.build().context("Invalid crawl settings")
    }
}
