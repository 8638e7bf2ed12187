pub mod browser;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod settings;
pub mod url_classifier;
pub mod utils;

pub use browser::{AnchorHandle, BrowserDriver, DriverError, WebDriverBrowser};
pub use config::{ConfigError, CrawlConfig, CrawlConfigBuilder};
pub use crawler::{
    validate_site, validate_site_with_stop, CrawlPhase, CrawlReport, Crawler, ReportEvent,
    StopHandle,
};
pub use url_classifier::UrlClassifier;
