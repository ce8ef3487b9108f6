use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::library::{SortCriterion, SortField};
use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "suno-sync",
    version,
    about = "Sync your Suno library (audio, cover art, metadata) to a local folder"
)]
pub struct Cli {
    /// Log level (RUST_LOG overrides this)
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Catalog API base URL
    #[arg(
        long,
        env = "SUNO_API_BASE",
        default_value = crate::suno::DEFAULT_API_BASE,
        global = true
    )]
    pub api_base: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the catalog and download songs that are not on disk yet
    Sync(SyncArgs),

    /// Fetch the catalog and print it as a table
    List(ListArgs),

    /// Check whether a credential can be captured from the configured sources
    CheckAuth(CheckAuthArgs),
}

/// Where the bearer token and device id come from.
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Bearer token copied from an authenticated suno.com request.
    /// WARNING: passing via --token is visible in process listings.
    /// Prefer the SUNO_TOKEN environment variable instead.
    #[arg(long, env = "SUNO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Device id sent alongside the token (the `device-id` request header)
    #[arg(long, env = "SUNO_DEVICE_ID", hide_env_values = true)]
    pub device_id: Option<String>,

    /// Browser HTTP Archive export of a suno.com session to capture
    /// credentials from
    #[arg(long, value_name = "FILE")]
    pub har: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Only songs whose title, tags or project contain this text
    #[arg(short = 's', long)]
    pub search: Option<String>,

    /// Only public songs
    #[arg(long, conflicts_with = "private_only")]
    pub public_only: bool,

    /// Only private songs
    #[arg(long)]
    pub private_only: bool,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Local directory for downloads
    #[arg(short = 'd', long, default_value = "./suno-downloads")]
    pub directory: String,

    /// Don't download audio
    #[arg(long)]
    pub no_audio: bool,

    /// Don't download cover art
    #[arg(long)]
    pub no_images: bool,

    /// Don't write JSON metadata sidecars
    #[arg(long)]
    pub no_metadata: bool,

    /// Put every song in the output root instead of per-project folders
    #[arg(long)]
    pub flat: bool,

    /// Only download the song(s) with this id
    #[arg(long = "song", value_name = "ID")]
    pub songs: Vec<String>,

    /// Delay between catalog pages in milliseconds
    #[arg(long, default_value_t = 500)]
    pub page_delay_ms: u64,

    /// Max retries per asset on transient failures (0 = no retries)
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Initial retry delay in seconds
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort key as field[:asc|desc]; repeat for tie-breakers, primary first.
    /// Fields: name, date, project, tags, favorites
    #[arg(long, value_name = "FIELD[:DIR]")]
    pub sort: Vec<SortCriterion>,

    /// Re-sort as if this column header were clicked, applied in order after
    /// --sort: the primary field flips direction, any other field moves to
    /// the front
    #[arg(long = "click", value_name = "FIELD")]
    pub clicks: Vec<SortField>,

    /// Delay between catalog pages in milliseconds
    #[arg(long, default_value_t = 500)]
    pub page_delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct CheckAuthArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
}
