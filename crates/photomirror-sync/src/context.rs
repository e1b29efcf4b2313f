//! Per-run context
//!
//! One context object is constructed at startup and passed to every
//! component; there is no ambient global state. It bundles the loaded
//! configuration with the remote library adapter.

use std::sync::Arc;

use photomirror_core::config::Config;
use photomirror_core::ports::RemoteLibrary;

/// Everything a sync or archive run needs, constructed once per run
#[derive(Clone)]
pub struct SyncContext {
    /// Loaded configuration
    pub config: Config,
    /// Remote library adapter
    pub remote: Arc<dyn RemoteLibrary>,
}

impl SyncContext {
    /// Bundles configuration and remote adapter into a context
    #[must_use]
    pub fn new(config: Config, remote: Arc<dyn RemoteLibrary>) -> Self {
        Self { config, remote }
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
