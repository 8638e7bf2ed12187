use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use site_link_validator::cli::Cli;
use site_link_validator::crawler::{validate_site_with_stop, CrawlReport, ReportEvent, StopHandle};
use site_link_validator::settings::Settings;
use site_link_validator::utils::logger::init_logger;
use site_link_validator::WebDriverBrowser;

// Exit codes: 0 = every page valid, 1 = anomalies found, 2 = could not run,
// 130 = interrupted twice
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(report) if report.is_clean() => 0,
        Ok(_) => 1,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<CrawlReport> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?.apply_cli(&cli);
    init_logger(settings.log_dir.as_ref().map(PathBuf::from).as_deref())?;

    let config = settings.crawl_config()?;
    info!("Validating {} starting at {:?}", config.domain(), config.starting_url());

    let browser = &settings.browser;
    let driver = WebDriverBrowser::connect(
        &browser.webdriver_url,
        Some(browser.viewport()),
        browser.headless,
    ).await?;

    // First Ctrl-C lets the current page finish, a second one exits at once
    let stop = StopHandle::default();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_stop.request_stop() {
                warn!("Second interrupt received, exiting without waiting for the browser");
                std::process::exit(EXIT_INTERRUPTED);
            }
            info!("Interrupt received, stopping after the current page (Ctrl-C again to exit now)");
        }
    });

    let report = validate_site_with_stop(&config, driver, stop).await;
    print_report(&report, cli.json)?;

    Ok(report)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for event in report.events.iter().filter(|event| event.is_anomaly()) {
        match event {
            ReportEvent::ErrorPage { url, title } => println!("Invalid URL: {} ({})", url, title),
            ReportEvent::DeniedUrl { url } => println!("Known bad URL: {}", url),
            ReportEvent::NavigationFailed { url, reason } => println!("Failed to load: {} ({})", url, reason),
            _ => {}
        }
    }

    println!();
    println!("Pages visited: {}", report.visited.len());
    println!("Anomalies:     {}", report.anomaly_count());
    if report.stopped_early {
        println!("Crawl stopped before all links were visited");
    }

    Ok(())
}
