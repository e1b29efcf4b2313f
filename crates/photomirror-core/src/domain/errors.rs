//! Domain error types
//!
//! This module defines the error taxonomy shared by the reconciliation
//! engine and the storage model. Structural conflicts and fatal invariant
//! violations carry the offending path or UUID as context, since they
//! indicate local state inconsistent with what the engine believes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the domain model and the hierarchical storage model
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A path the engine expected to create already exists
    #[error("Path already exists: {0}")]
    PathExists(PathBuf),

    /// A path the engine expected to find is missing
    #[error("Expected path missing: {0}")]
    PathMissing(PathBuf),

    /// The parent album's hidden directory could not be located in the tree
    #[error("Unable to find parent {parent_uuid} of album {album}")]
    ParentNotFound {
        /// UUID of the missing parent
        parent_uuid: String,
        /// Display name of the album whose parent was searched
        album: String,
    },

    /// More than one hidden directory matched the searched UUID
    #[error("Multiple directories found for album {uuid}")]
    AmbiguousAlbum {
        /// The UUID that matched more than once
        uuid: String,
    },

    /// An album directory scheduled for deletion holds non-symlink content
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    /// Asset verification: the file does not exist on disk
    #[error("Asset not found on disk: {0}")]
    AssetMissing(PathBuf),

    /// Asset verification: byte length differs from the remote record
    #[error("Asset size mismatch for {path}: disk {actual}, remote {expected}")]
    AssetSizeMismatch {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    /// Asset verification: modification time outside the tolerance window
    #[error("Asset modification time for {path} out of range: disk {actual} ms, remote {expected} ms")]
    AssetModifiedMismatch {
        path: PathBuf,
        actual: i64,
        expected: i64,
    },

    /// The path given to the archive workflow is not an album directory
    /// inside the library tree
    #[error("Path cannot be archived: {0}")]
    NotArchivable(PathBuf),

    /// The remote supplied a file type descriptor outside the known table
    #[error("Unknown file type descriptor: {0}")]
    UnknownDescriptor(String),

    /// A scanned file carries an extension outside the known table
    #[error("Unknown file type extension: {0}")]
    UnknownExtension(String),

    /// A scanned asset-store filename could not be decoded into a checksum
    #[error("Invalid asset filename: {0}")]
    InvalidAssetFilename(String),

    /// Underlying filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
