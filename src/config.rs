use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::cli::{AuthArgs, Cli, Command, FilterArgs};
use crate::download::paths::MAX_NAME_LEN;
use crate::download::DownloadConfig;
use crate::library::{SortField, SortStack, VisibilityFilter};
use crate::retry::RetryConfig;

/// Validated application configuration.
#[derive(Debug)]
pub struct Config {
    pub api_base: String,
    pub mode: Mode,
}

/// What the invocation asked for.
#[derive(Debug)]
pub enum Mode {
    Sync(SyncConfig),
    List(ListConfig),
    CheckAuth(CredentialSources),
}

/// Places a credential may be observed from. At least one of the
/// explicit pair or the HAR file should be set for capture to succeed.
#[derive(Clone, Default)]
pub struct CredentialSources {
    pub token: Option<String>,
    pub device_id: Option<String>,
    pub har: Option<PathBuf>,
}

impl std::fmt::Debug for CredentialSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSources")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("device_id", &self.device_id)
            .field("har", &self.har)
            .finish()
    }
}

impl CredentialSources {
    fn from_args(args: AuthArgs) -> anyhow::Result<Self> {
        let token = non_blank(args.token);
        let device_id = non_blank(args.device_id);
        if token.is_some() != device_id.is_some() {
            anyhow::bail!("--token and --device-id must be given together");
        }
        Ok(Self {
            token,
            device_id,
            har: args.har.map(|p| expand_tilde(&p.to_string_lossy())),
        })
    }
}

#[derive(Debug)]
pub struct SyncConfig {
    pub credentials: CredentialSources,
    pub query: String,
    pub visibility: VisibilityFilter,
    /// Explicit selection; empty means every song passing the filters.
    pub songs: Vec<String>,
    pub page_delay: Duration,
    pub no_progress_bar: bool,
    pub download: DownloadConfig,
}

#[derive(Debug)]
pub struct ListConfig {
    pub credentials: CredentialSources,
    pub query: String,
    pub visibility: VisibilityFilter,
    pub sort_stack: SortStack,
    /// Column clicks replayed on top of `sort_stack`, in order.
    pub clicks: Vec<SortField>,
    pub page_delay: Duration,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn validate_api_base(api_base: &str) -> anyhow::Result<String> {
    let trimmed = api_base.trim().trim_end_matches('/');
    let url = url::Url::parse(trimmed)
        .with_context(|| format!("Invalid --api-base '{}'", api_base))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        anyhow::bail!("--api-base must be an http(s) URL, got '{}'", api_base);
    }
    Ok(trimmed.to_string())
}

fn filter_parts(args: FilterArgs) -> (String, VisibilityFilter) {
    (
        args.search.unwrap_or_default(),
        VisibilityFilter::from_flags(args.public_only, args.private_only),
    )
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let api_base = validate_api_base(&cli.api_base)?;

        let mode = match cli.command {
            Command::Sync(args) => {
                let directory = expand_tilde(args.directory.trim());
                if directory.as_os_str().is_empty() {
                    anyhow::bail!("--directory must not be empty");
                }
                let (query, visibility) = filter_parts(args.filter);
                Mode::Sync(SyncConfig {
                    credentials: CredentialSources::from_args(args.auth)?,
                    query,
                    visibility,
                    songs: args.songs,
                    page_delay: Duration::from_millis(args.page_delay_ms),
                    no_progress_bar: args.no_progress_bar,
                    download: DownloadConfig {
                        directory,
                        download_audio: !args.no_audio,
                        download_images: !args.no_images,
                        save_metadata: !args.no_metadata,
                        organize_by_project: !args.flat,
                        max_name_len: MAX_NAME_LEN,
                        retry: RetryConfig {
                            max_retries: args.max_retries,
                            base_delay: Duration::from_secs(args.retry_delay),
                            ..RetryConfig::default()
                        },
                    },
                })
            }
            Command::List(args) => {
                let (query, visibility) = filter_parts(args.filter);
                let sort_stack = if args.sort.is_empty() {
                    SortStack::default()
                } else {
                    SortStack::new(args.sort)
                };
                Mode::List(ListConfig {
                    credentials: CredentialSources::from_args(args.auth)?,
                    query,
                    visibility,
                    sort_stack,
                    clicks: args.clicks,
                    page_delay: Duration::from_millis(args.page_delay_ms),
                })
            }
            Command::CheckAuth(args) => Mode::CheckAuth(CredentialSources::from_args(args.auth)?),
        };

        Ok(Self { api_base, mode })
    }
}
