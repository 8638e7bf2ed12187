use clap::Parser;
use std::path::PathBuf;

/// Command-line options; anything left unset falls back to the settings
/// file, then the environment, then the built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(
    name = "site-link-validator",
    version,
    about = "Crawls a website in a real browser and reports pages that resolve to its error page"
)]
pub struct Cli {
    /// Domain to crawl, e.g. w3.org
    pub domain: Option<String>,

    /// Protocol prefix used to build page URLs (http:// or https://)
    #[arg(long)]
    pub protocol: Option<String>,

    /// First page to visit, relative (/standards) or absolute on the domain
    #[arg(long = "start")]
    pub starting_url: Option<String>,

    /// Title of the site's error page
    #[arg(long)]
    pub error_title: Option<String>,

    /// Seconds to wait after each page load
    #[arg(long)]
    pub wait: Option<f64>,

    /// XPath of the area whose links are followed after the first page
    #[arg(long)]
    pub scope: Option<String>,

    /// Treat links with different #fragments as different pages
    #[arg(long)]
    pub check_anchors: bool,

    /// Only follow relative URLs matching this regex at their start
    #[arg(long)]
    pub filter: Option<String>,

    /// Known-bad URL to report whenever it is visited (repeatable)
    #[arg(long = "deny")]
    pub denylist: Vec<String>,

    /// WebDriver server to open the browser session on
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Browser window size, e.g. 1280x800
    #[arg(long, value_parser = parse_viewport)]
    pub viewport: Option<(u32, u32)>,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_viewport(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(&['x', 'X'][..])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width.trim().parse().map_err(|_| format!("invalid width '{}'", width))?;
    let height = height.trim().parse().map_err(|_| format!("invalid height '{}'", height))?;
    Ok((width, height))
}
