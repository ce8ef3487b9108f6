//! Replay a browser HTTP Archive (HAR) export through the capture monitor.
//!
//! This is the standalone runner's observation hook: the user records
//! suno.com traffic in the browser's network panel, exports it, and every
//! request in the file is fed to [`CaptureMonitor::observe`] in order.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::capture::CaptureMonitor;
use super::error::AuthError;

#[derive(Debug, Deserialize)]
struct HarLog {
    log: HarRoot,
}

#[derive(Debug, Deserialize)]
struct HarRoot {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    #[serde(default, rename = "startedDateTime")]
    started: Option<String>,
    request: HarRequest,
}

impl HarEntry {
    /// When the browser issued the request; missing or unparsable stamps
    /// count as now.
    fn started_at(&self) -> DateTime<Utc> {
        let Some(raw) = self.started.as_deref() else {
            tracing::debug!(url = %self.request.url, "HAR entry has no startedDateTime, using now");
            return Utc::now();
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(d) => d.with_timezone(&Utc),
            Err(e) => {
                tracing::debug!(
                    url = %self.request.url,
                    started = raw,
                    "Unparsable HAR startedDateTime ({}), using now",
                    e
                );
                Utc::now()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    url: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

/// Counts from one HAR replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarReplay {
    pub requests: usize,
    pub captures: usize,
}

/// Feed every request in the HAR file at `path` to `monitor`.
pub fn replay_har(path: &Path, monitor: &CaptureMonitor) -> Result<HarReplay, AuthError> {
    let bytes = std::fs::read(path).map_err(|source| AuthError::HarRead {
        path: path.to_path_buf(),
        source,
    })?;
    let har: HarLog = serde_json::from_slice(&bytes).map_err(|source| AuthError::HarParse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut replay = HarReplay {
        requests: har.log.entries.len(),
        captures: 0,
    };
    for entry in &har.log.entries {
        let headers = entry
            .request
            .headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_str()));
        if monitor.observe_at(&entry.request.url, headers, entry.started_at()) {
            replay.captures += 1;
        }
    }

    tracing::debug!(
        path = %path.display(),
        requests = replay.requests,
        captures = replay.captures,
        "Replayed HAR capture"
    );
    Ok(replay)
}
