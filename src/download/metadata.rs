use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use super::file::part_path;
use super::storage::Storage;
use crate::suno::{Project, SongRecord, Visibility};

/// JSON sidecar written next to each song's audio.
#[derive(Debug, Serialize)]
struct Sidecar<'a> {
    id: &'a str,
    title: &'a str,
    created_at: Option<DateTime<Utc>>,
    tags: &'a str,
    prompt: &'a str,
    display_tags: &'a str,
    duration: f64,
    model_version: Option<&'a str>,
    audio_url: Option<&'a str>,
    image_url: Option<&'a str>,
    visibility: Visibility,
    is_public: bool,
    play_count: u64,
    upvote_count: u64,
    project: Option<&'a Project>,
}

impl<'a> From<&'a SongRecord> for Sidecar<'a> {
    fn from(song: &'a SongRecord) -> Self {
        Self {
            id: &song.id,
            title: song.title.as_deref().unwrap_or(""),
            created_at: song.created_at,
            tags: song.metadata.tags.as_deref().unwrap_or(""),
            prompt: song.metadata.prompt.as_deref().unwrap_or(""),
            display_tags: song.display_tags.as_deref().unwrap_or(""),
            duration: song.duration_seconds(),
            model_version: song.model_version.as_deref(),
            audio_url: song.audio_url.as_deref(),
            image_url: song.image_url.as_deref(),
            visibility: song.visibility(),
            is_public: song.is_public,
            play_count: song.play_count,
            upvote_count: song.upvote_count,
            project: song.project.as_ref(),
        }
    }
}

/// Pretty-printed sidecar document for `song`.
pub fn render_sidecar(song: &SongRecord) -> Result<Vec<u8>, DownloadError> {
    Ok(serde_json::to_vec_pretty(&Sidecar::from(song))?)
}

/// Write the sidecar for `song` to `path`, staged through a `.part` file.
pub async fn write_sidecar(
    storage: &dyn Storage,
    path: &Path,
    song: &SongRecord,
) -> Result<(), DownloadError> {
    let body = render_sidecar(song)?;
    let part = part_path(path);

    let mut sink = storage.create(&part).await?;
    let written = async {
        sink.write_all(&body).await?;
        sink.shutdown().await
    }
    .await;
    drop(sink);

    if let Err(e) = written {
        let _ = storage.remove_file(&part).await;
        return Err(e.into());
    }
    storage.rename(&part, path).await?;
    Ok(())
}
