//! Cycle report
//!
//! Soft failures accumulate here as warnings and are summarized once at
//! cycle end; the counters give a one-line picture of what the cycle did.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use photomirror_core::domain::Warning;

/// Outcome of one sync cycle
#[derive(Debug)]
pub struct SyncReport {
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// Per-item soft failures observed during the cycle
    pub warnings: Vec<Warning>,
    pub assets_added: usize,
    pub assets_deleted: usize,
    pub assets_kept: usize,
    pub albums_added: usize,
    pub albums_deleted: usize,
    pub albums_kept: usize,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReport {
    /// Creates an empty report stamped with the current time
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            warnings: Vec::new(),
            assets_added: 0,
            assets_deleted: 0,
            assets_kept: 0,
            albums_added: 0,
            albums_deleted: 0,
            albums_kept: 0,
        }
    }

    /// Records a soft failure
    pub fn warn(&mut self, warning: Warning) {
        warn!(context = warning.context(), "{}", warning.message());
        self.warnings.push(warning);
    }

    /// Records several soft failures
    pub fn warn_all(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    /// Logs the cycle summary
    pub fn summarize(&self) {
        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
        info!(
            elapsed_ms,
            assets_added = self.assets_added,
            assets_deleted = self.assets_deleted,
            assets_kept = self.assets_kept,
            albums_added = self.albums_added,
            albums_deleted = self.albums_deleted,
            albums_kept = self.albums_kept,
            warnings = self.warnings.len(),
            "sync cycle finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_accumulate() {
        let mut report = SyncReport::new();
        report.warn(Warning::new("IMG_1.jpeg", "download failed"));
        report.warn_all(vec![
            Warning::new("IMG_2.jpeg", "store entry missing"),
            Warning::new("Trip", "display name collision"),
        ]);
        assert_eq!(report.warnings.len(), 3);
    }
}
