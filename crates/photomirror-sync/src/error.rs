//! Orchestrator error type

use thiserror::Error;

use photomirror_core::domain::LibraryError;
use photomirror_recon::ReconError;

/// Fatal failures that abort a sync cycle
///
/// Per-item soft failures never surface here; they accumulate as warnings
/// on the [`crate::SyncReport`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reconciliation detected corrupted local structure
    #[error(transparent)]
    Recon(#[from] ReconError),

    /// The storage model hit a structural conflict or I/O failure
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// The remote library adapter failed
    #[error("Remote library failure: {0}")]
    Remote(anyhow::Error),
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        Self::Remote(err)
    }
}
