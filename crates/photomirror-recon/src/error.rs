//! Reconciliation error types

use thiserror::Error;

/// Fatal invariant violations detected during reconciliation
///
/// These abort the surrounding operation: they signal corrupted local
/// state that no further processing can trust.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconError {
    /// The album queue could not be brought into parent-before-child order
    #[error("Album queue could not be brought into hierarchical order")]
    QueueNotSorted,

    /// An album's parent chain never reaches the library root
    #[error("No link to root found for album {0}")]
    NoRootLink(String),
}
