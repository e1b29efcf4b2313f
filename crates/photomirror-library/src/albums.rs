//! Album tree operations
//!
//! Every album is materialized as a hidden `.{uuid}` directory plus a
//! sibling symlink carrying the sanitized display name. Folder albums
//! nest further hidden directories; regular albums contain relative
//! symlinks into the asset store. All mutation here is synchronous and
//! single-threaded: the existing-path and non-empty-directory guards are
//! not safe under concurrent writers.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use photomirror_core::domain::{
    Album, AlbumKind, LibraryEntities, LibraryEntity, LibraryError, Warning,
};

use crate::assets::{filetime_from_ms, mtime_ms};
use crate::{is_safe_file, PhotosLibrary, ARCHIVE_DIR, PRIMARY_ASSET_DIR, SHARED_ASSET_DIR};

/// Directory names at the library root that are not part of the album tree
const NON_TREE_DIRS: &[&str] = &[PRIMARY_ASSET_DIR, SHARED_ASSET_DIR, ARCHIVE_DIR];

fn hidden_dir_name(uuid: &str) -> String {
    format!(".{uuid}")
}

impl PhotosLibrary {
    /// Finds every hidden directory in the live tree matching `uuid`
    ///
    /// # Errors
    /// Fails when a directory cannot be read.
    pub fn find_album_paths(&self, uuid: &str) -> Result<Vec<PathBuf>, LibraryError> {
        let mut found = Vec::new();
        self.collect_album_paths(self.root(), uuid, true, &mut found)?;
        Ok(found)
    }

    fn collect_album_paths(
        &self,
        dir: &Path,
        uuid: &str,
        at_root: bool,
        found: &mut Vec<PathBuf>,
    ) -> Result<(), LibraryError> {
        let wanted = hidden_dir_name(uuid);
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if at_root && NON_TREE_DIRS.contains(&name.as_str()) {
                continue;
            }
            // Only hidden directories can hold albums; name symlinks are
            // followed through their targets instead.
            let meta = entry.path().symlink_metadata()?;
            if !meta.is_dir() || !name.starts_with('.') {
                continue;
            }
            if name == wanted {
                found.push(entry.path());
            }
            self.collect_album_paths(&entry.path(), uuid, false, found)?;
        }
        Ok(())
    }

    /// Resolves the unique hidden directory of an album
    ///
    /// # Errors
    /// Returns [`LibraryError::AmbiguousAlbum`] when the UUID matches more
    /// than one directory.
    pub fn find_album(&self, uuid: &str) -> Result<Option<PathBuf>, LibraryError> {
        let mut paths = self.find_album_paths(uuid)?;
        match paths.len() {
            0 => Ok(None),
            1 => Ok(Some(paths.remove(0))),
            _ => Err(LibraryError::AmbiguousAlbum {
                uuid: uuid.to_string(),
            }),
        }
    }

    /// Resolves the directory a new album pair must be created in
    pub(crate) fn album_parent_dir(&self, album: &Album) -> Result<PathBuf, LibraryError> {
        match album.parent_uuid() {
            None => Ok(self.root().to_path_buf()),
            Some(parent_uuid) => self
                .find_album(parent_uuid)?
                .ok_or_else(|| LibraryError::ParentNotFound {
                    parent_uuid: parent_uuid.to_string(),
                    album: album.display_name(),
                }),
        }
    }

    /// Creates the album's hidden directory and name symlink
    ///
    /// For regular albums every membership entry additionally becomes a
    /// relative symlink into the asset store; per-asset failures (missing
    /// target, display name collision) are reported and skipped.
    ///
    /// # Errors
    /// Fails when the parent cannot be located or either the hidden
    /// directory or the visible symlink already exists.
    #[instrument(skip(self, album), fields(uuid = %album.uuid(), name = %album.display_name()))]
    pub fn write_album(&self, album: &Album) -> Result<Vec<Warning>, LibraryError> {
        let parent = self.album_parent_dir(album)?;
        let hidden = parent.join(hidden_dir_name(&album.uuid()));
        let link = parent.join(album.sanitized_name());

        if hidden.symlink_metadata().is_ok() {
            return Err(LibraryError::PathExists(hidden));
        }
        if link.symlink_metadata().is_ok() {
            return Err(LibraryError::PathExists(link));
        }

        std::fs::create_dir(&hidden)?;
        std::os::unix::fs::symlink(hidden_dir_name(&album.uuid()), &link)?;
        debug!(path = %hidden.display(), "album pair created");

        let warnings = if album.kind() == AlbumKind::Album {
            self.link_album_assets(album, &hidden)
        } else {
            Vec::new()
        };
        Ok(warnings)
    }

    fn link_album_assets(&self, album: &Album, hidden: &Path) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (store_filename, pretty_filename) in album.assets() {
            let pretty = pretty_filename.replace('/', "_");
            let link = hidden.join(&pretty);
            if link.symlink_metadata().is_ok() {
                warnings.push(Warning::new(&pretty, "display name collision, entry skipped"));
                continue;
            }
            let store_path = self.root().join(PRIMARY_ASSET_DIR).join(store_filename);
            let store_meta = match store_path.metadata() {
                Ok(meta) => meta,
                Err(_) => {
                    warnings.push(Warning::new(
                        &pretty,
                        format!("asset {store_filename} not present in store"),
                    ));
                    continue;
                }
            };
            let target = self.relative_asset_target(hidden, store_filename);
            if let Err(err) = std::os::unix::fs::symlink(&target, &link) {
                warnings.push(Warning::new(&pretty, err));
                continue;
            }
            let mtime = filetime_from_ms(mtime_ms(&store_meta));
            if let Err(err) = filetime::set_symlink_file_times(&link, mtime, mtime) {
                warnings.push(Warning::new(&pretty, err));
            }
        }
        warnings
    }

    /// Removes the album's hidden directory and name symlink
    ///
    /// # Errors
    /// Fails when the pair cannot be located, or when the hidden directory
    /// holds anything other than symlinks and OS artifacts. That guard
    /// protects content the remote never told us about; children must be
    /// deleted first (deepest-first ordering).
    #[instrument(skip(self, album), fields(uuid = %album.uuid(), name = %album.display_name()))]
    pub fn delete_album(&self, album: &Album) -> Result<(), LibraryError> {
        let hidden = self
            .find_album(&album.uuid())?
            .ok_or_else(|| LibraryError::PathMissing(
                PathBuf::from(hidden_dir_name(&album.uuid())),
            ))?;

        for entry in std::fs::read_dir(&hidden)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&name) {
                continue;
            }
            if !entry.path().symlink_metadata()?.is_symlink() {
                return Err(LibraryError::DirectoryNotEmpty(hidden));
            }
        }

        let parent = hidden.parent().unwrap_or_else(|| self.root()).to_path_buf();
        let link = parent.join(album.sanitized_name());
        if link.symlink_metadata().is_err() {
            return Err(LibraryError::PathMissing(link));
        }

        std::fs::remove_dir_all(&hidden)?;
        std::fs::remove_file(&link)?;
        debug!("album pair deleted");
        Ok(())
    }

    /// Walks the album tree and rebuilds the local album map
    ///
    /// Hidden directories are classified by inspection: nested directories
    /// mean a folder, any real file means an archived snapshot, otherwise
    /// a regular album (even when empty). Dangling name symlinks are
    /// removed and reported; hidden directories no symlink points at are
    /// removed too unless they hold real content; unexpected files are
    /// reported and skipped.
    ///
    /// # Errors
    /// Fails only when a directory cannot be read.
    #[instrument(skip(self))]
    pub fn load_albums(
        &self,
    ) -> Result<(LibraryEntities<Album>, Vec<Warning>), LibraryError> {
        let mut albums = LibraryEntities::new();
        let mut warnings = Vec::new();
        self.load_albums_in(self.root(), None, true, &mut albums, &mut warnings)?;
        debug!(count = albums.len(), warnings = warnings.len(), "loaded local albums");
        Ok((albums, warnings))
    }

    fn load_albums_in(
        &self,
        dir: &Path,
        parent_uuid: Option<&str>,
        at_root: bool,
        albums: &mut LibraryEntities<Album>,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), LibraryError> {
        let mut hidden_dirs = Vec::new();
        let mut linked = HashSet::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&name) || (at_root && NON_TREE_DIRS.contains(&name.as_str())) {
                continue;
            }
            let meta = entry.path().symlink_metadata()?;
            if meta.is_symlink() {
                // Hidden directories are reached through their name symlinks.
                if let Some(target) =
                    self.load_album_link(&entry.path(), &name, parent_uuid, albums, warnings)?
                {
                    linked.insert(target);
                }
            } else if meta.is_dir() && name.starts_with('.') {
                hidden_dirs.push(name);
            } else if !meta.is_dir() {
                warnings.push(Warning::new(&name, "unexpected file in album tree"));
            }
        }

        // A hidden directory nobody links to is the leftover of an
        // interrupted write; it blocks re-creating the album, so remove it
        // unless it holds real content.
        for name in hidden_dirs {
            if !linked.contains(&name) {
                self.remove_orphan_album_dir(&dir.join(&name), &name, warnings)?;
            }
        }
        Ok(())
    }

    fn remove_orphan_album_dir(
        &self,
        hidden: &Path,
        name: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), LibraryError> {
        for entry in std::fs::read_dir(hidden)? {
            let entry = entry?;
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&entry_name) || entry.path().symlink_metadata()?.is_symlink() {
                continue;
            }
            warnings.push(Warning::new(
                name,
                "unreferenced album directory holds real content, left in place",
            ));
            return Ok(());
        }
        warn!(path = %hidden.display(), "removing unreferenced album directory");
        std::fs::remove_dir_all(hidden)?;
        warnings.push(Warning::new(name, "unreferenced album directory removed"));
        Ok(())
    }

    /// Loads one album through its name symlink, returning the hidden
    /// directory name the link points at (`None` when the link dangled)
    fn load_album_link(
        &self,
        link: &Path,
        name: &str,
        parent_uuid: Option<&str>,
        albums: &mut LibraryEntities<Album>,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<String>, LibraryError> {
        let target = std::fs::read_link(link)?;
        let parent_dir = link.parent().unwrap_or_else(|| self.root());
        let hidden = parent_dir.join(&target);
        if !hidden.is_dir() {
            warn!(link = %link.display(), "removing dangling album symlink");
            warnings.push(Warning::new(name, "dangling album symlink removed"));
            std::fs::remove_file(link)?;
            return Ok(None);
        }

        let hidden_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let uuid = hidden_name.trim_start_matches('.').to_string();
        let kind = classify_album_dir(&hidden)?;

        let mut album = Album::new(&uuid, kind, name, parent_uuid.map(String::from));
        if kind == AlbumKind::Album {
            album = album.with_assets(read_album_membership(&hidden)?);
        }
        albums.insert(album.uuid(), album);

        if kind == AlbumKind::Folder {
            self.load_albums_in(&hidden, Some(&uuid), false, albums, warnings)?;
        }
        Ok(Some(hidden_name))
    }
}

/// Classifies a hidden album directory by its contents
fn classify_album_dir(hidden: &Path) -> Result<AlbumKind, LibraryError> {
    let mut kind = AlbumKind::Album;
    for entry in std::fs::read_dir(hidden)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_safe_file(&name) {
            continue;
        }
        let meta = entry.path().symlink_metadata()?;
        if meta.is_dir() {
            return Ok(AlbumKind::Folder);
        }
        if !meta.is_symlink() {
            kind = AlbumKind::Archived;
        }
    }
    Ok(kind)
}

/// Reads a regular album's membership: link target filename to link name
fn read_album_membership(hidden: &Path) -> Result<HashMap<String, String>, LibraryError> {
    let mut membership = HashMap::new();
    for entry in std::fs::read_dir(hidden)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_safe_file(&name) || !entry.path().symlink_metadata()?.is_symlink() {
            continue;
        }
        let target = std::fs::read_link(entry.path())?;
        if let Some(store_filename) = target.file_name() {
            membership.insert(store_filename.to_string_lossy().into_owned(), name);
        }
    }
    Ok(membership)
}
