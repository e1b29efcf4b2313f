//! Archive stash
//!
//! Archived albums hold user-owned content, so they are never rewritten.
//! When the tree around one is rebuilt, its (name symlink, hidden
//! directory) pair is parked in the stash and later retrieved into its
//! new position. Stash entries no longer referenced by any pending album
//! are promoted out into the user-visible archive area.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use photomirror_core::domain::{Album, LibraryEntity, LibraryError, Warning};

use crate::{is_safe_file, PhotosLibrary};

/// An album's on-disk pair: hidden directory and name symlink
type PathPair = (PathBuf, PathBuf);

impl PhotosLibrary {
    fn stash_pair(&self, album: &Album) -> PathPair {
        let stash = self.stash_dir();
        (
            stash.join(format!(".{}", album.uuid())),
            stash.join(album.sanitized_name()),
        )
    }

    /// Moves an archived album's pair from the live tree into the stash
    ///
    /// # Errors
    /// Fails when the live pair cannot be located or the stash already
    /// holds an entry under the same name.
    #[instrument(skip(self, album), fields(uuid = %album.uuid(), name = %album.display_name()))]
    pub fn stash_album(&self, album: &Album) -> Result<(), LibraryError> {
        let hidden = self
            .find_album(&album.uuid())?
            .ok_or_else(|| LibraryError::PathMissing(PathBuf::from(format!(".{}", album.uuid()))))?;
        let parent = hidden.parent().unwrap_or_else(|| self.root()).to_path_buf();
        let link = parent.join(album.sanitized_name());

        move_path_pair((hidden, link), self.stash_pair(album))?;
        info!("archived album stashed");
        Ok(())
    }

    /// Moves an archived album's pair from the stash back into the tree,
    /// under its (possibly new) parent
    ///
    /// # Errors
    /// Fails when the stash entry is missing, the parent cannot be
    /// located, or the destination pair already exists.
    #[instrument(skip(self, album), fields(uuid = %album.uuid(), name = %album.display_name()))]
    pub fn retrieve_album(&self, album: &Album) -> Result<(), LibraryError> {
        let parent = self.album_parent_dir(album)?;
        let destination = (
            parent.join(format!(".{}", album.uuid())),
            parent.join(album.sanitized_name()),
        );
        move_path_pair(self.stash_pair(album), destination)?;
        info!("archived album retrieved from stash");
        Ok(())
    }

    /// Promotes stash entries no longer referenced by any pending album
    /// into the user-visible archive area
    ///
    /// The hidden directory is renamed to its display name (falling back
    /// to the bare UUID), with a numeric suffix appended on collision.
    /// Per-entry failures are reported and the scan continues.
    ///
    /// # Errors
    /// Fails only when the stash itself cannot be read.
    #[instrument(skip(self, referenced))]
    pub fn clean_archived_orphans(
        &self,
        referenced: &HashSet<String>,
    ) -> Result<Vec<Warning>, LibraryError> {
        let mut warnings = Vec::new();
        let stash = self.stash_dir();

        // First pass: map hidden directory names to their symlink names.
        let mut links: HashMap<String, String> = HashMap::new();
        let mut hidden_dirs: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&stash)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&name) {
                continue;
            }
            let meta = entry.path().symlink_metadata()?;
            if meta.is_symlink() {
                if let Ok(target) = std::fs::read_link(entry.path()) {
                    links.insert(target.to_string_lossy().into_owned(), name);
                }
            } else if meta.is_dir() && name.starts_with('.') {
                hidden_dirs.push(name);
            }
        }

        for hidden_name in hidden_dirs {
            let uuid = hidden_name.trim_start_matches('.').to_string();
            if referenced.contains(&uuid) {
                continue;
            }
            let display = links.get(&hidden_name).cloned().unwrap_or_else(|| uuid.clone());
            let destination = free_archive_slot(&self.archive_dir(), &display);
            if let Err(err) = std::fs::rename(stash.join(&hidden_name), &destination) {
                warn!(entry = %hidden_name, error = %err, "failed to promote stash orphan");
                warnings.push(Warning::new(&hidden_name, err));
                continue;
            }
            if let Some(link_name) = links.get(&hidden_name) {
                if let Err(err) = std::fs::remove_file(stash.join(link_name)) {
                    warnings.push(Warning::new(link_name, err));
                }
            }
            info!(entry = %hidden_name, destination = %destination.display(), "stash orphan promoted");
        }
        Ok(warnings)
    }
}

/// Moves a (hidden directory, name symlink) pair atomically as a unit
///
/// Both sources must exist and both destinations must be free before
/// either rename happens, so a half-moved pair cannot be produced by a
/// precondition failure.
fn move_path_pair(source: PathPair, destination: PathPair) -> Result<(), LibraryError> {
    let (src_hidden, src_link) = source;
    let (dst_hidden, dst_link) = destination;

    for src in [&src_hidden, &src_link] {
        if src.symlink_metadata().is_err() {
            return Err(LibraryError::PathMissing(src.clone()));
        }
    }
    for dst in [&dst_hidden, &dst_link] {
        if dst.symlink_metadata().is_ok() {
            return Err(LibraryError::PathExists(dst.clone()));
        }
    }

    // The symlink target is the relative hidden name, so it stays valid
    // wherever the pair lands.
    std::fs::rename(&src_hidden, &dst_hidden)?;
    std::fs::rename(&src_link, &dst_link)?;
    Ok(())
}

/// First non-existing path under `archive_dir` for `name`, suffixing
/// `-1`, `-2`, ... on collision
fn free_archive_slot(archive_dir: &Path, name: &str) -> PathBuf {
    let candidate = archive_dir.join(name);
    if candidate.symlink_metadata().is_err() {
        return candidate;
    }
    let mut suffix = 1;
    loop {
        let candidate = archive_dir.join(format!("{name}-{suffix}"));
        if candidate.symlink_metadata().is_err() {
            return candidate;
        }
        suffix += 1;
    }
}
