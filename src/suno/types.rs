use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One page of `GET /api/feed/v2`.
///
/// `clips` must be present: an error object served with status 200 would
/// otherwise read as an empty last page.
#[derive(Debug, Deserialize)]
pub struct FeedPage {
    #[serde(deserialize_with = "null_as_default")]
    pub clips: Vec<SongRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The nested `metadata` object of a clip.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClipMetadata {
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// A single song ("clip") as returned by the catalog.
///
/// Field names follow the wire format; the few renames map Suno's names
/// onto what the rest of the crate calls them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, rename = "image_large_url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ClipMetadata,
    #[serde(default)]
    pub display_tags: Option<String>,
    #[serde(default, rename = "major_model_version")]
    pub model_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub play_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upvote_count: u64,
}

impl SongRecord {
    /// Title for display, `"Untitled"` when absent or blank.
    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or("Untitled")
    }

    /// Style tags: `metadata.tags`, falling back to `display_tags`.
    pub fn tags(&self) -> Option<&str> {
        non_empty(self.metadata.tags.as_deref()).or_else(|| non_empty(self.display_tags.as_deref()))
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| non_empty(p.name.as_deref()))
    }

    pub fn duration_seconds(&self) -> f64 {
        self.metadata.duration.unwrap_or(0.0)
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Suno sends explicit `null` for counters and flags it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
