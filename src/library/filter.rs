use crate::suno::{SongRecord, Visibility};

/// Public/private narrowing chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityFilter {
    #[default]
    All,
    PublicOnly,
    PrivateOnly,
}

impl VisibilityFilter {
    /// Build from the two mutually exclusive UI flags; public wins if both are set.
    pub fn from_flags(public_only: bool, private_only: bool) -> Self {
        match (public_only, private_only) {
            (true, _) => VisibilityFilter::PublicOnly,
            (false, true) => VisibilityFilter::PrivateOnly,
            (false, false) => VisibilityFilter::All,
        }
    }

    pub fn admits(&self, song: &SongRecord) -> bool {
        match self {
            VisibilityFilter::All => true,
            VisibilityFilter::PublicOnly => song.visibility() == Visibility::Public,
            VisibilityFilter::PrivateOnly => song.visibility() == Visibility::Private,
        }
    }
}

/// Case-insensitive substring match against title, tags and project name.
/// `needle` must already be lower-cased; an empty needle matches everything.
fn matches_query(song: &SongRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [song.title.as_deref(), song.tags(), song.project_name()]
        .into_iter()
        .flatten()
        .any(|hay| hay.to_lowercase().contains(needle))
}

/// Songs matching `query` and `visibility`, in input order.
pub fn filter<'a>(
    songs: &'a [SongRecord],
    query: &str,
    visibility: VisibilityFilter,
) -> Vec<&'a SongRecord> {
    let needle = query.trim().to_lowercase();
    songs
        .iter()
        .filter(|song| visibility.admits(song) && matches_query(song, &needle))
        .collect()
}
