use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use browserless_client::BrowserlessClient;
use byline_common::{Config, Edition};
use byline_scout::discoverer::EmailDiscoverer;
use byline_scout::feed::HttpFeedFetcher;
use byline_scout::ledger::Ledger;
use byline_scout::monitor::Monitor;
use byline_scout::outlets;
use byline_scout::publisher::SyncPublisher;
use byline_scout::render::{BrowserlessRenderer, ChromeRenderer};
use byline_scout::traits::PageRenderer;
use byline_scout::verifier::VerificationWorker;
use emailverify_client::EmailVerifyClient;
use sheets_client::SheetsClient;

#[derive(Parser)]
#[command(name = "byline", about = "Journalist lead monitor and verification queue")]
struct Cli {
    /// Regional edition: ca or uk
    #[arg(long, default_value = "ca")]
    edition: Edition,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Scan outlet feeds for new journalists
    Monitor,
    /// Drain the pending queue through the verification service
    Validate,
    /// Print the edition's outlet catalogue
    Outlets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("byline=info".parse()?);
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => run_monitor(cli.edition).await,
        Command::Validate => run_validate(cli.edition).await,
        Command::Outlets => {
            print_outlets(cli.edition);
            Ok(())
        }
    }
}

async fn run_monitor(edition: Edition) -> Result<()> {
    info!(%edition, "Journalist monitor starting...");

    let config = match Config::monitor_from_env(edition) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error, aborting");
            std::process::exit(1);
        }
    };
    config.log_redacted();

    let fetcher = HttpFeedFetcher::new(config.settings.fetch_timeout)?;
    let renderer = build_renderer(&config)?;
    let discoverer = EmailDiscoverer::new(renderer, config.settings.render_timeout);

    let monitor = Monitor::new(
        edition,
        outlets::catalogue(edition),
        Ledger::new(&config.data_dir, edition),
        Arc::new(fetcher),
        discoverer,
        build_publisher(&config),
        config.settings.clone(),
    );

    let stats = monitor.run().await?;
    info!("{stats}");
    Ok(())
}

async fn run_validate(edition: Edition) -> Result<()> {
    info!(%edition, "Verification worker starting...");

    let config = match Config::validator_from_env(edition) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error, aborting");
            std::process::exit(1);
        }
    };
    config.log_redacted();

    let api_key = config.require_verify_key()?.to_string();
    let client = EmailVerifyClient::new(api_key).context("Failed to build verification client")?;

    let mut worker = VerificationWorker::new(
        Ledger::new(&config.data_dir, edition),
        Arc::new(client),
        build_publisher(&config),
        config.verify_credits,
        config.settings.clone(),
    );

    let report = worker.run().await?;
    info!("{report}");
    Ok(())
}

fn print_outlets(edition: Edition) {
    let catalogue = outlets::catalogue(edition);
    println!("{} outlets ({edition}):", catalogue.len());
    for outlet in catalogue {
        println!("  {:<40} {:<28} {}", outlet.name, outlet.region, outlet.feed_url);
    }
}

/// Browserless when configured, otherwise a local headless Chromium.
fn build_renderer(config: &Config) -> Result<Arc<dyn PageRenderer>> {
    match &config.browserless_url {
        Some(url) => {
            let client = BrowserlessClient::new(url, config.browserless_token.as_deref())
                .context("Failed to build Browserless client")?;
            Ok(Arc::new(BrowserlessRenderer::new(client)))
        }
        None => Ok(Arc::new(ChromeRenderer::new(&config.chrome_bin))),
    }
}

/// Spreadsheet sync is optional. Missing settings or credentials disable it.
fn build_publisher(config: &Config) -> SyncPublisher {
    let worksheet = config.edition.worksheet();
    let Some(sheet_name) = config.sheet_name.as_deref() else {
        info!("JOURNALIST_SHEET_NAME not set, spreadsheet sync disabled");
        return SyncPublisher::disabled(worksheet);
    };

    match SheetsClient::from_credentials_file(&config.google_credentials_file, sheet_name) {
        Ok(client) => {
            info!(spreadsheet = sheet_name, worksheet, "Spreadsheet sync enabled");
            SyncPublisher::new(Arc::new(client), worksheet)
        }
        Err(e) => {
            warn!(
                path = %config.google_credentials_file.display(),
                error = %e,
                "Could not load Google credentials, spreadsheet sync disabled"
            );
            SyncPublisher::disabled(worksheet)
        }
    }
}
