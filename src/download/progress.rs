use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

use super::{DownloadOutcome, DownloadStats};

/// Per-record progress notification.
#[derive(Debug, Clone)]
pub struct Progress {
    /// 1-based index of the record just processed.
    pub current: usize,
    pub total: usize,
    pub status: String,
    pub stats: DownloadStats,
}

/// Receives progress from the download orchestrator.
pub trait ProgressReporter: Send + Sync {
    fn progress(&self, progress: &Progress);

    fn finished(&self, _outcome: &DownloadOutcome) {}

    /// Run `f` with any live display paused so log lines are not garbled.
    fn suspend(&self, f: &mut dyn FnMut()) {
        f()
    }
}

/// Terminal progress bar.
pub struct ProgressBarReporter {
    pb: ProgressBar,
}

impl ProgressBarReporter {
    /// Hidden when `no_progress_bar` is set or stdout is not a TTY
    /// (piped output, cron jobs).
    pub fn new(no_progress_bar: bool, total: usize) -> Self {
        let pb = if no_progress_bar || !std::io::stdout().is_terminal() {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            ) {
                pb.set_style(style.progress_chars("=> "));
            }
            pb
        };
        Self { pb }
    }
}

/// `status [N new, N skipped, N failed]`, with the failure count only once
/// something has failed.
fn status_line(progress: &Progress) -> String {
    let stats = &progress.stats;
    if stats.failed > 0 {
        format!(
            "{} [{} new, {} skipped, {} failed]",
            progress.status, stats.downloaded, stats.skipped, stats.failed
        )
    } else {
        format!(
            "{} [{} new, {} skipped]",
            progress.status, stats.downloaded, stats.skipped
        )
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn progress(&self, progress: &Progress) {
        self.pb.set_length(progress.total as u64);
        self.pb.set_position(progress.current as u64);
        self.pb.set_message(status_line(progress));
    }

    fn finished(&self, _outcome: &DownloadOutcome) {
        self.pb.finish_and_clear();
    }

    fn suspend(&self, f: &mut dyn FnMut()) {
        self.pb.suspend(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_counts() {
        let mut progress = Progress {
            current: 2,
            total: 3,
            status: "Downloaded: Song".into(),
            stats: DownloadStats {
                total_songs: 3,
                downloaded: 1,
                skipped: 1,
                failed: 0,
            },
        };
        assert_eq!(status_line(&progress), "Downloaded: Song [1 new, 1 skipped]");

        progress.stats.failed = 1;
        assert_eq!(
            status_line(&progress),
            "Downloaded: Song [1 new, 1 skipped, 1 failed]"
        );
    }
}
