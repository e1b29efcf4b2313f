//! photomirror Storage Model
//!
//! Filesystem representation of the photo library:
//! - A flat, content-addressable **asset store** per zone, one file per
//!   physical asset, named after its checksum.
//! - An **album tree** of hidden UUID-named directories linked from
//!   user-visible name symlinks; albums hold relative symlinks into the
//!   asset store.
//! - An **archive stash** that parks archived album pairs while the tree
//!   around them is rebuilt, and promotes orphaned entries into a
//!   user-visible archive area.
//!
//! Album tree mutation is strictly single-threaded: the existing-path and
//! non-empty-directory guards assume no concurrent writer. Asset writes
//! are async and may interleave freely, since assets never reference each
//! other.

use std::path::{Path, PathBuf};

use tracing::info;

use photomirror_core::domain::{Asset, LibraryError, Zone};

pub mod albums;
pub mod assets;
pub mod stash;

/// Asset store directory for the primary zone
pub const PRIMARY_ASSET_DIR: &str = "_All-Photos";
/// Asset store directory for the shared zone
pub const SHARED_ASSET_DIR: &str = "_Shared-Photos";
/// User-visible archive area for orphan-promoted albums
pub const ARCHIVE_DIR: &str = "_Archive";
/// Holding area for archived albums temporarily unlinked from the tree
pub const STASH_DIR: &str = ".stash";
/// OS artifacts ignored everywhere
pub const SAFE_FILES: &[&str] = &[".DS_Store"];

/// Whether a directory entry name is an ignorable OS artifact
#[must_use]
pub fn is_safe_file(name: &str) -> bool {
    SAFE_FILES.contains(&name)
}

/// Handle to the on-disk photo library
///
/// Holds only the root path; all state lives in the filesystem itself.
#[derive(Debug, Clone)]
pub struct PhotosLibrary {
    root: PathBuf,
}

impl PhotosLibrary {
    /// Opens the library at `root`, creating the fixed directory skeleton
    /// (asset stores, archive, stash) if it does not exist yet.
    ///
    /// # Errors
    /// Fails when a directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let library = Self { root: root.into() };
        for dir in [
            library.root.clone(),
            library.zone_dir(Zone::Primary),
            library.zone_dir(Zone::Shared),
            library.archive_dir(),
            library.stash_dir(),
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                info!(path = %dir.display(), "created library directory");
            }
        }
        Ok(library)
    }

    /// Returns the library root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the asset store directory for a zone
    #[must_use]
    pub fn zone_dir(&self, zone: Zone) -> PathBuf {
        match zone {
            Zone::Primary => self.root.join(PRIMARY_ASSET_DIR),
            Zone::Shared => self.root.join(SHARED_ASSET_DIR),
        }
    }

    /// Returns the user-visible archive area
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    /// Returns the stash holding area
    #[must_use]
    pub fn stash_dir(&self) -> PathBuf {
        self.archive_dir().join(STASH_DIR)
    }

    /// Returns the asset store path for an asset
    #[must_use]
    pub fn asset_path(&self, asset: &Asset) -> PathBuf {
        self.zone_dir(asset.zone()).join(asset.store_filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_skeleton() {
        let tmp = tempfile::TempDir::new().unwrap();
        let library = PhotosLibrary::new(tmp.path()).unwrap();
        assert!(library.zone_dir(Zone::Primary).is_dir());
        assert!(library.zone_dir(Zone::Shared).is_dir());
        assert!(library.archive_dir().is_dir());
        assert!(library.stash_dir().is_dir());
    }

    #[test]
    fn test_new_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        PhotosLibrary::new(tmp.path()).unwrap();
        assert!(PhotosLibrary::new(tmp.path()).is_ok());
    }

    #[test]
    fn test_safe_file_list() {
        assert!(is_safe_file(".DS_Store"));
        assert!(!is_safe_file("IMG_1.jpeg"));
    }
}
