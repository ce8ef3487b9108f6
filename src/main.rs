//! suno-sync: mirror a Suno library to a local folder.
//!
//! The tool never logs in. It reuses the bearer token and device id of an
//! existing browser session (given explicitly or captured from a HAR
//! export), walks the paginated catalog, and downloads audio, cover art
//! and JSON metadata for every song not already on disk.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod download;
mod library;
mod retry;
mod shutdown;
mod suno;
mod types;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use auth::{CaptureMonitor, Credential};
use config::{CredentialSources, ListConfig, Mode, SyncConfig};
use download::{DownloadOutcome, LocalStorage, ProgressBarReporter};
use library::BrowseSession;
use suno::{CatalogError, CatalogFetcher, SongRecord};

/// Run every configured credential source through a fresh capture monitor.
///
/// The HAR capture is replayed first; an explicit token/device id pair is
/// observed last so it wins over anything in the capture.
fn capture_credential(api_base: &str, sources: &CredentialSources) -> anyhow::Result<CaptureMonitor> {
    let monitor = CaptureMonitor::new(api_base)?;

    if let Some(har) = &sources.har {
        let replay = auth::har::replay_har(har, &monitor)?;
        tracing::info!(
            "Replayed {} requests from {}, {} carried catalog credentials",
            replay.requests,
            har.display(),
            replay.captures
        );
    }

    if let (Some(token), Some(device_id)) = (&sources.token, &sources.device_id) {
        let authorization = format!("Bearer {}", token);
        monitor.observe(
            api_base,
            [
                ("authorization", authorization.as_str()),
                ("device-id", device_id.as_str()),
            ],
        );
    }

    Ok(monitor)
}

/// Fetch the whole catalog. `Ok(None)` means the user cancelled.
async fn fetch_catalog(
    client: &reqwest::Client,
    api_base: &str,
    credential: &Credential,
    page_delay: Duration,
    shutdown_token: &CancellationToken,
) -> anyhow::Result<Option<Vec<SongRecord>>> {
    let fetcher = CatalogFetcher::new(Box::new(client.clone()), api_base, page_delay);

    tracing::info!("Fetching song catalog...");
    match fetcher.fetch_all(credential, shutdown_token).await {
        Ok(songs) => {
            if songs.is_empty() {
                tracing::info!("Account has no songs");
            } else {
                tracing::info!("Fetched {} songs", songs.len());
            }
            Ok(Some(songs))
        }
        Err(CatalogError::Cancelled { page }) => {
            tracing::info!("Shutdown requested, stopped catalog fetch at page {}", page);
            Ok(None)
        }
        Err(e) if e.is_auth_failure() => Err(anyhow::Error::new(e).context(
            "The catalog rejected the credential; it has most likely expired. \
             Reload suno.com and capture a fresh token",
        )),
        Err(e) => {
            let page = e.page();
            Err(anyhow::Error::new(e).context(format!("Catalog fetch aborted at page {}", page)))
        }
    }
}

async fn run_sync(
    api_base: &str,
    config: SyncConfig,
    shutdown_token: &CancellationToken,
) -> anyhow::Result<Option<DownloadOutcome>> {
    let credential = capture_credential(api_base, &config.credentials)?.require()?;
    let client = suno::http_client().context("Failed to build HTTP client")?;

    let Some(songs) =
        fetch_catalog(&client, api_base, &credential, config.page_delay, shutdown_token).await?
    else {
        return Ok(None);
    };

    let mut session = BrowseSession::new(songs);
    session.set_query(config.query);
    session.set_visibility(config.visibility);
    if config.songs.is_empty() {
        session.select_all_visible();
    } else {
        for id in &config.songs {
            if !session.select(id) {
                tracing::warn!("Song {} is not in the library, ignoring", id);
            }
        }
    }
    tracing::info!(
        "Syncing {} of {} songs to {}",
        session.selected_count(),
        session.total(),
        config.download.directory.display()
    );
    let selected = session.selected();

    let reporter = ProgressBarReporter::new(config.no_progress_bar, selected.len());
    let outcome = download::download_songs(
        &client,
        &LocalStorage,
        &selected,
        &config.download,
        &reporter,
        shutdown_token,
    )
    .await;

    Ok(Some(outcome))
}

/// Cut `s` to at most `width` characters, marking the cut with `~`.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

/// One line per song, plus a header line.
fn render_table(songs: &[&SongRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(songs.len() + 1);
    lines.push(format!(
        "{:<10}  {:<40}  {:<20}  {:<30}  {:>5}  {:<7}  {}",
        "DATE", "TITLE", "PROJECT", "TAGS", "FAVS", "VIS", "ID"
    ));
    for song in songs {
        let date = song
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let visibility = match song.visibility() {
            suno::Visibility::Public => "public",
            suno::Visibility::Private => "private",
        };
        lines.push(format!(
            "{:<10}  {:<40}  {:<20}  {:<30}  {:>5}  {:<7}  {}",
            date,
            fit(song.display_title(), 40),
            fit(song.project_name().unwrap_or(""), 20),
            fit(song.tags().unwrap_or(""), 30),
            song.upvote_count,
            visibility,
            song.id
        ));
    }
    lines
}

async fn run_list(
    api_base: &str,
    config: ListConfig,
    shutdown_token: &CancellationToken,
) -> anyhow::Result<()> {
    let credential = capture_credential(api_base, &config.credentials)?.require()?;
    let client = suno::http_client().context("Failed to build HTTP client")?;

    let Some(songs) =
        fetch_catalog(&client, api_base, &credential, config.page_delay, shutdown_token).await?
    else {
        return Ok(());
    };

    let mut session = BrowseSession::new(songs);
    session.set_query(config.query);
    session.set_visibility(config.visibility);
    session.set_sort_stack(config.sort_stack);
    for field in config.clicks {
        session.click_column(field);
    }

    for line in render_table(&session.view()) {
        println!("{}", line);
    }
    let order: Vec<String> = session
        .sort_stack()
        .criteria()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!();
    println!("{} (sorted by {})", session.summary(), order.join(", "));
    Ok(())
}

fn run_check_auth(api_base: &str, sources: &CredentialSources) -> anyhow::Result<()> {
    let monitor = capture_credential(api_base, sources)?;
    let credential = monitor.require()?;
    let age = credential.age(chrono::Utc::now());
    println!("Credential captured for {}", monitor.api_host());
    println!("  device id:   {}", credential.device_id);
    println!(
        "  captured at: {} ({} minutes ago)",
        credential.captured_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_minutes()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = config::Config::from_cli(cli)?;
    tracing::debug!(?config, "Starting suno-sync");

    match config.mode {
        Mode::CheckAuth(sources) => run_check_auth(&config.api_base, &sources),
        Mode::List(list) => {
            let shutdown_token = shutdown::install_signal_handler();
            run_list(&config.api_base, list, &shutdown_token).await
        }
        Mode::Sync(sync) => {
            let shutdown_token = shutdown::install_signal_handler();
            run_sync(&config.api_base, sync, &shutdown_token).await?;
            Ok(())
        }
    }
}
