use std::path::{Path, PathBuf};

use crate::suno::SongRecord;

/// Upper bound on a sanitized name, in UTF-8 bytes. Leaves room for
/// `_<id>.json` under the usual 255-byte NAME_MAX.
pub const MAX_NAME_LEN: usize = 200;

/// Folder used for songs whose project has no usable name.
const UNNAMED_PROJECT: &str = "Unnamed_Project";

/// Make `name` safe to use as a single path component on common filesystems.
///
/// `<>:"/\|?*` and control characters become `_`, whitespace runs collapse
/// to one space, and the result is trimmed and cut on a character boundary
/// to at most `max_len` bytes.
/// Trailing dots are dropped as Windows cannot create such names, so a name
/// made only of dots sanitizes to the empty string.
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(replace_forbidden(c));
    }

    truncate_bytes(&out, max_len)
        .trim_end_matches([' ', '.'])
        .to_string()
}

fn replace_forbidden(c: char) -> char {
    if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control() {
        '_'
    } else {
        c
    }
}

fn truncate_bytes(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// The catalog id is remote input too; it may not introduce path components.
fn clean_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_whitespace() { '_' } else { replace_forbidden(c) })
        .collect()
}

/// File stem shared by a song's audio, cover and sidecar:
/// `<sanitized title>_<id>`. A title that sanitizes to nothing is replaced
/// by `Untitled_<id>` before the id is appended, giving `Untitled_<id>_<id>`.
pub fn base_name(song: &SongRecord, max_len: usize) -> String {
    let id = clean_id(&song.id);
    let title = song
        .title
        .as_deref()
        .map(|t| sanitize_filename(t, max_len))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| sanitize_filename(&format!("Untitled_{}", id), max_len));
    format!("{}_{}", title, id)
}

/// Local destinations for one song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongPaths {
    pub dir: PathBuf,
    pub audio: PathBuf,
    pub image: PathBuf,
    pub metadata: PathBuf,
}

/// Build `<root>/[<project>/]<base>.{mp3,jpg,json}` for `song`.
pub fn song_paths(
    root: &Path,
    song: &SongRecord,
    organize_by_project: bool,
    max_len: usize,
) -> SongPaths {
    let dir = match (&song.project, organize_by_project) {
        (Some(project), true) => {
            let folder = project
                .name
                .as_deref()
                .map(|n| sanitize_filename(n, max_len))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNNAMED_PROJECT.to_string());
            root.join(folder)
        }
        _ => root.to_path_buf(),
    };
    let base = base_name(song, max_len);
    SongPaths {
        audio: dir.join(format!("{}.mp3", base)),
        image: dir.join(format!("{}.jpg", base)),
        metadata: dir.join(format!("{}.json", base)),
        dir,
    }
}
