//! photomirror Sync Orchestrator
//!
//! Drives a full sync cycle: fetch the remote snapshot, rebuild the local
//! maps from disk, diff and repair the queues, then apply the mutations.
//! Asset downloads run on a bounded worker pool; all album tree mutation
//! stays on the control task, strictly ordered parent-before-child.
//!
//! The archive workflow lives here too: it freezes one album's symlinks
//! into real files and optionally deletes the frozen assets remotely.

pub mod archive;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;

pub use archive::ArchiveEngine;
pub use context::SyncContext;
pub use engine::SyncEngine;
pub use error::SyncError;
pub use report::SyncReport;
