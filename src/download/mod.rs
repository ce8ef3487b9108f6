//! Download orchestrator: turns a list of songs into files on disk.
//!
//! Songs are processed one at a time in catalog order. Every asset that
//! already exists locally is skipped without touching the network, so a
//! re-run over a populated directory only fetches what is missing.
//! Cancellation is polled before each song; an in-flight transfer is
//! allowed to finish.

pub mod error;
pub mod file;
pub mod metadata;
pub mod paths;
pub mod progress;
pub mod storage;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::retry::RetryConfig;
use crate::suno::SongRecord;

pub use error::DownloadError;
pub use progress::{Progress, ProgressBarReporter, ProgressReporter};
pub use storage::{LocalStorage, Storage};

/// Subset of application config consumed by the orchestrator.
/// Decoupled from CLI parsing so it can be tested on its own.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub(crate) directory: PathBuf,
    pub(crate) download_audio: bool,
    pub(crate) download_images: bool,
    pub(crate) save_metadata: bool,
    pub(crate) organize_by_project: bool,
    pub(crate) max_name_len: usize,
    pub(crate) retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total_songs: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Finished(DownloadStats),
    Cancelled(DownloadStats),
}

impl DownloadOutcome {
    pub fn stats(&self) -> &DownloadStats {
        match self {
            DownloadOutcome::Finished(s) | DownloadOutcome::Cancelled(s) => s,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadOutcome::Cancelled(_))
    }
}

/// Files touched while syncing one song.
#[derive(Debug, Default)]
struct SongTally {
    written: usize,
    existing: usize,
}

/// Download every song in `songs` according to `config`.
///
/// Per-song failures are logged and counted; they never abort the batch.
pub async fn download_songs(
    client: &Client,
    storage: &dyn Storage,
    songs: &[SongRecord],
    config: &DownloadConfig,
    reporter: &dyn ProgressReporter,
    shutdown_token: &CancellationToken,
) -> DownloadOutcome {
    let started = Instant::now();
    let mut stats = DownloadStats {
        total_songs: songs.len(),
        ..DownloadStats::default()
    };
    let mut cancelled = false;

    for (index, song) in songs.iter().enumerate() {
        if shutdown_token.is_cancelled() {
            reporter.suspend(&mut || {
                tracing::info!("Shutdown requested, stopping before song {}", index + 1)
            });
            cancelled = true;
            break;
        }

        let title = song.display_title();
        let status = match sync_song(client, storage, song, config).await {
            Ok(tally) if tally.written > 0 => {
                stats.downloaded += 1;
                format!("Downloaded: {}", title)
            }
            Ok(tally) if tally.existing > 0 => {
                stats.skipped += 1;
                format!("Skipped: {}", title)
            }
            Ok(_) => format!("Nothing to download: {}", title),
            Err(e) => {
                stats.failed += 1;
                reporter.suspend(&mut || {
                    tracing::error!("Download failed: {} ({}): {}", title, song.id, e)
                });
                format!("Failed: {}", title)
            }
        };

        reporter.progress(&Progress {
            current: index + 1,
            total: songs.len(),
            status,
            stats,
        });
    }

    let outcome = if cancelled {
        DownloadOutcome::Cancelled(stats)
    } else {
        DownloadOutcome::Finished(stats)
    };
    reporter.finished(&outcome);
    log_summary(&outcome, &config.directory, started.elapsed());
    outcome
}

/// Fetch the missing assets of one song. The first failing step aborts
/// the song; the sidecar is written last so a failed song leaves none.
async fn sync_song(
    client: &Client,
    storage: &dyn Storage,
    song: &SongRecord,
    config: &DownloadConfig,
) -> Result<SongTally, DownloadError> {
    let paths = paths::song_paths(
        &config.directory,
        song,
        config.organize_by_project,
        config.max_name_len,
    );

    let mut assets: Vec<(&str, &Path)> = Vec::with_capacity(2);
    if config.download_audio {
        if let Some(url) = source_url(song.audio_url.as_deref()) {
            assets.push((url, paths.audio.as_path()));
        }
    }
    if config.download_images {
        if let Some(url) = source_url(song.image_url.as_deref()) {
            assets.push((url, paths.image.as_path()));
        }
    }

    let mut tally = SongTally::default();
    if assets.is_empty() && !config.save_metadata {
        return Ok(tally);
    }

    if !storage.exists(&paths.dir).await {
        storage.create_dir_all(&paths.dir).await?;
    }

    for (url, dest) in assets {
        if storage.exists(dest).await {
            tracing::debug!("{} already exists", dest.display());
            tally.existing += 1;
            continue;
        }
        file::download_file(client, storage, url, dest, &config.retry).await?;
        tally.written += 1;
    }

    if config.save_metadata {
        if storage.exists(&paths.metadata).await {
            tally.existing += 1;
        } else {
            metadata::write_sidecar(storage, &paths.metadata, song).await?;
            tally.written += 1;
        }
    }

    Ok(tally)
}

fn source_url(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| !u.is_empty())
}

fn log_summary(outcome: &DownloadOutcome, directory: &Path, elapsed: Duration) {
    let stats = outcome.stats();
    if outcome.is_cancelled() {
        tracing::info!("── Summary (cancelled) ──");
    } else {
        tracing::info!("── Summary ──");
    }
    tracing::info!(
        "  {} downloaded, {} skipped, {} failed, {} total",
        stats.downloaded,
        stats.skipped,
        stats.failed,
        stats.total_songs
    );
    tracing::info!("  destination: {}", directory.display());
    tracing::info!("  elapsed: {}", format_duration(elapsed));
}

pub(crate) fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{StatusCode, Uri};
    use axum::Router;
    use serde_json::json;

    use super::*;

    /// Asset CDN that counts every request. Paths under `/missing` are 404.
    async fn cdn() -> (String, Arc<AtomicUsize>) {
        async fn handler(State(hits): State<Arc<AtomicUsize>>, uri: Uri) -> (StatusCode, String) {
            hits.fetch_add(1, Ordering::SeqCst);
            if uri.path().starts_with("/missing") {
                (StatusCode::NOT_FOUND, String::new())
            } else {
                (StatusCode::OK, format!("bytes of {}", uri.path()))
            }
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().fallback(handler).with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    fn song(base: &str, id: &str, title: &str) -> SongRecord {
        serde_json::from_value(json!({
            "id": id,
            "title": title,
            "audio_url": format!("{}/audio/{}.mp3", base, id),
            "image_large_url": format!("{}/image/{}.jpg", base, id),
        }))
        .unwrap()
    }

    fn config(dir: &Path) -> DownloadConfig {
        DownloadConfig {
            directory: dir.to_path_buf(),
            download_audio: true,
            download_images: true,
            save_metadata: true,
            organize_by_project: false,
            max_name_len: paths::MAX_NAME_LEN,
            retry: RetryConfig::none(),
        }
    }

    /// Records status lines; optionally cancels once record `cancel_at` is done.
    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<String>>,
        outcome: Mutex<Option<DownloadOutcome>>,
        cancel: Option<(usize, CancellationToken)>,
    }

    impl ProgressReporter for Recorder {
        fn progress(&self, progress: &Progress) {
            self.statuses.lock().unwrap().push(progress.status.clone());
            if let Some((at, token)) = &self.cancel {
                if progress.current == *at {
                    token.cancel();
                }
            }
        }

        fn finished(&self, outcome: &DownloadOutcome) {
            *self.outcome.lock().unwrap() = Some(*outcome);
        }
    }

    async fn run(songs: &[SongRecord], config: &DownloadConfig, reporter: &Recorder) -> DownloadOutcome {
        let token = reporter
            .cancel
            .as_ref()
            .map(|(_, t)| t.clone())
            .unwrap_or_default();
        download_songs(&Client::new(), &LocalStorage, songs, config, reporter, &token).await
    }

    #[tokio::test]
    async fn test_rerun_skips_existing_without_network() {
        let (base, hits) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let songs = vec![song(&base, "1", "Neon Rain"), song(&base, "2", "Dust")];
        let config = config(dir.path());

        let first = run(&songs, &config, &Recorder::default()).await;
        assert_eq!(
            first,
            DownloadOutcome::Finished(DownloadStats {
                total_songs: 2,
                downloaded: 2,
                skipped: 0,
                failed: 0
            })
        );
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        for name in ["Neon Rain_1.mp3", "Neon Rain_1.jpg", "Neon Rain_1.json", "Dust_2.mp3"] {
            assert!(dir.path().join(name).exists(), "{name}");
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Dust_2.mp3")).unwrap(),
            "bytes of /audio/2.mp3"
        );

        let recorder = Recorder::default();
        let second = run(&songs, &config, &recorder).await;
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert_eq!(second.stats().skipped, 2);
        assert_eq!(second.stats().downloaded, 0);
        assert_eq!(
            *recorder.statuses.lock().unwrap(),
            ["Skipped: Neon Rain", "Skipped: Dust"]
        );
    }

    #[tokio::test]
    async fn test_only_missing_assets_are_fetched() {
        let (base, hits) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let songs = vec![song(&base, "1", "Neon Rain")];
        std::fs::write(dir.path().join("Neon Rain_1.mp3"), b"already here").unwrap();

        let outcome = run(&songs, &config(dir.path()), &Recorder::default()).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.stats().downloaded, 1);
        assert_eq!(
            std::fs::read(dir.path().join("Neon Rain_1.mp3")).unwrap(),
            b"already here"
        );
    }

    #[tokio::test]
    async fn test_failed_song_does_not_stop_batch() {
        let (base, _) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let mut broken = song(&base, "1", "Broken");
        broken.audio_url = Some(format!("{}/missing/1.mp3", base));
        let songs = vec![broken, song(&base, "2", "Fine")];

        let recorder = Recorder::default();
        let outcome = run(&songs, &config(dir.path()), &recorder).await;

        assert_eq!(outcome.stats().failed, 1);
        assert_eq!(outcome.stats().downloaded, 1);
        assert!(!dir.path().join("Broken_1.mp3").exists());
        assert!(!dir.path().join("Broken_1.json").exists());
        assert!(!dir.path().join("Broken_1.mp3.part").exists());
        assert!(dir.path().join("Fine_2.mp3").exists());
        assert_eq!(
            *recorder.statuses.lock().unwrap(),
            ["Failed: Broken", "Downloaded: Fine"]
        );
    }

    #[tokio::test]
    async fn test_nothing_enabled_is_a_no_op() {
        let (base, hits) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let songs = vec![song(&base, "1", "A"), song(&base, "2", "B")];
        let config = DownloadConfig {
            download_audio: false,
            download_images: false,
            save_metadata: false,
            ..config(&out)
        };

        let outcome = run(&songs, &config, &Recorder::default()).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Finished(DownloadStats {
                total_songs: 2,
                ..DownloadStats::default()
            })
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_song_without_source_url_is_not_counted() {
        let (base, hits) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let mut silent = song(&base, "1", "Silent");
        silent.audio_url = None;
        let config = DownloadConfig {
            download_images: false,
            save_metadata: false,
            ..config(dir.path())
        };

        let outcome = run(&[silent], &config, &Recorder::default()).await;
        assert_eq!(outcome.stats().downloaded + outcome.stats().skipped + outcome.stats().failed, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_organize_by_project() {
        let (base, _) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let mut grouped = song(&base, "1", "Song");
        grouped.project = Some(crate::suno::Project {
            id: "p".into(),
            name: Some("Road Trip".into()),
        });
        let config = DownloadConfig {
            organize_by_project: true,
            ..config(dir.path())
        };

        run(&[grouped, song(&base, "2", "Loose")], &config, &Recorder::default()).await;
        assert!(dir.path().join("Road Trip/Song_1.mp3").exists());
        assert!(dir.path().join("Road Trip/Song_1.json").exists());
        assert!(dir.path().join("Loose_2.mp3").exists());
    }

    #[tokio::test]
    async fn test_cancel_after_first_record() {
        let (base, hits) = cdn().await;
        let dir = tempfile::tempdir().unwrap();
        let songs = vec![song(&base, "1", "A"), song(&base, "2", "B"), song(&base, "3", "C")];
        let config = DownloadConfig {
            download_images: false,
            ..config(dir.path())
        };
        let recorder = Recorder {
            cancel: Some((1, CancellationToken::new())),
            ..Recorder::default()
        };

        let outcome = run(&songs, &config, &recorder).await;

        assert_eq!(
            outcome,
            DownloadOutcome::Cancelled(DownloadStats {
                total_songs: 3,
                downloaded: 1,
                skipped: 0,
                failed: 0
            })
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("B_2.mp3").exists());
        assert_eq!(*recorder.outcome.lock().unwrap(), Some(outcome));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(7)), "7s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }
}
