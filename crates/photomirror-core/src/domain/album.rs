//! Album domain entity
//!
//! Albums form a tree rooted at the library directory. Folders group other
//! albums, albums hold asset links, and archived albums hold real files
//! that the engine no longer touches. The tree shape lives in each album's
//! `parent_uuid`; helpers on [`Album`] answer the two structural questions
//! the reconciliation engine needs: ancestry and depth.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::entity::{LibraryEntities, LibraryEntity};

/// The structural role of an album in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumKind {
    /// Groups other albums, holds no assets of its own
    Folder,
    /// Holds symlinks into the asset store
    Album,
    /// Holds real files; its content is owned by the user, not the engine
    Archived,
}

impl fmt::Display for AlbumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Folder => "folder",
            Self::Album => "album",
            Self::Archived => "archived album",
        };
        write!(f, "{label}")
    }
}

/// A node of the album tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Stable identity, also the hidden directory name (without the dot)
    uuid: String,
    kind: AlbumKind,
    /// Display name, becomes the visible symlink name
    name: String,
    /// Parent album, or `None` for albums at the library root
    parent_uuid: Option<String>,
    /// Asset membership: store filename to pretty filename
    assets: HashMap<String, String>,
}

impl Album {
    /// Creates an album without asset membership
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        kind: AlbumKind,
        name: impl Into<String>,
        parent_uuid: Option<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            kind,
            name: name.into(),
            parent_uuid,
            assets: HashMap::new(),
        }
    }

    /// Sets the asset membership (store filename to pretty filename)
    #[must_use]
    pub fn with_assets(mut self, assets: HashMap<String, String>) -> Self {
        self.assets = assets;
        self
    }

    /// Returns the structural role
    pub fn kind(&self) -> AlbumKind {
        self.kind
    }

    /// Returns the display name as stored
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent UUID, or `None` at the library root
    pub fn parent_uuid(&self) -> Option<&str> {
        self.parent_uuid.as_deref()
    }

    /// Returns the asset membership map (store filename to pretty filename)
    pub fn assets(&self) -> &HashMap<String, String> {
        &self.assets
    }

    /// Returns the display name with path separators replaced, safe to use
    /// as a single filesystem component
    #[must_use]
    pub fn sanitized_name(&self) -> String {
        self.name.replace('/', "_")
    }

    /// Marks the album as archived, keeping everything else
    #[must_use]
    pub fn into_archived(mut self) -> Self {
        self.kind = AlbumKind::Archived;
        self
    }

    /// Whether `ancestor_uuid` appears anywhere on this album's parent chain
    ///
    /// Walks the chain through `albums`; a missing parent ends the walk. A
    /// hop guard bounds the walk so a corrupted, cyclic chain terminates.
    #[must_use]
    pub fn has_ancestor(&self, ancestor_uuid: &str, albums: &LibraryEntities<Album>) -> bool {
        let mut current = self.parent_uuid.as_deref();
        let mut hops = 0;
        while let Some(parent) = current {
            if parent == ancestor_uuid {
                return true;
            }
            hops += 1;
            if hops > albums.len() {
                return false;
            }
            current = albums.get(parent).and_then(|a| a.parent_uuid.as_deref());
        }
        false
    }

    /// Number of hops from this album up to the library root
    ///
    /// Returns `None` when the chain runs through a parent that is not in
    /// `albums`, or when a cycle is detected.
    #[must_use]
    pub fn distance_to_root(&self, albums: &LibraryEntities<Album>) -> Option<usize> {
        let mut distance = 0;
        let mut current = self.parent_uuid.as_deref();
        while let Some(parent) = current {
            distance += 1;
            if distance > albums.len() {
                return None;
            }
            current = albums.get(parent)?.parent_uuid.as_deref();
        }
        Some(distance)
    }

    fn assets_match(&self, other: &Self) -> bool {
        // Membership comparison is by key set: pretty names can legitimately
        // drift when the remote renames an original file.
        self.assets.len() == other.assets.len()
            && self.assets.keys().all(|k| other.assets.contains_key(k))
    }
}

impl LibraryEntity for Album {
    fn uuid(&self) -> String {
        self.uuid.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn matches(&self, other: &Self) -> bool {
        // Names compare sanitized: the filesystem stores the sanitized form,
        // so a scanned album must still match its slash-bearing remote record.
        if self.uuid != other.uuid
            || self.sanitized_name() != other.sanitized_name()
            || self.parent_uuid != other.parent_uuid
        {
            return false;
        }
        // An archived album keeps whatever content the user left in it, so
        // membership drift must not re-queue it.
        if self.kind == AlbumKind::Archived || other.kind == AlbumKind::Archived {
            return true;
        }
        self.kind == other.kind && self.assets_match(other)
    }

    fn apply_local(self, local: &Self) -> Self {
        // Archive state only exists locally; a kept album stays archived.
        if local.kind == AlbumKind::Archived {
            self.into_archived()
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(uuid: &str, parent: Option<&str>) -> Album {
        Album::new(uuid, AlbumKind::Album, uuid.to_uppercase(), parent.map(String::from))
    }

    fn tree() -> LibraryEntities<Album> {
        // root -> a -> b -> c
        [
            ("a".to_string(), album("a", None)),
            ("b".to_string(), album("b", Some("a"))),
            ("c".to_string(), album("c", Some("b"))),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_sanitized_name() {
        let a = Album::new("u", AlbumKind::Album, "2020/2021 Trip", None);
        assert_eq!(a.sanitized_name(), "2020_2021 Trip");
    }

    #[test]
    fn test_has_ancestor() {
        let albums = tree();
        assert!(albums["c"].has_ancestor("a", &albums));
        assert!(albums["c"].has_ancestor("b", &albums));
        assert!(!albums["a"].has_ancestor("c", &albums));
        assert!(!albums["a"].has_ancestor("a", &albums));
    }

    #[test]
    fn test_has_ancestor_survives_cycle() {
        let mut albums = tree();
        albums.insert("a".to_string(), album("a", Some("c")));
        assert!(!albums["c"].has_ancestor("missing", &albums));
    }

    #[test]
    fn test_distance_to_root() {
        let albums = tree();
        assert_eq!(albums["a"].distance_to_root(&albums), Some(0));
        assert_eq!(albums["b"].distance_to_root(&albums), Some(1));
        assert_eq!(albums["c"].distance_to_root(&albums), Some(2));
    }

    #[test]
    fn test_distance_to_root_broken_chain() {
        let orphan = album("x", Some("missing"));
        assert_eq!(orphan.distance_to_root(&tree()), None);
    }

    #[test]
    fn test_distance_to_root_cycle() {
        let mut albums = tree();
        albums.insert("a".to_string(), album("a", Some("c")));
        assert_eq!(albums["c"].distance_to_root(&albums), None);
    }

    #[test]
    fn test_matches_ignores_assets_for_archived() {
        let remote = album("a", None).with_assets(
            [("x.jpeg".to_string(), "IMG_1.jpeg".to_string())]
                .into_iter()
                .collect(),
        );
        let local = album("a", None).into_archived();
        assert!(remote.matches(&local));
    }

    #[test]
    fn test_matches_compares_asset_key_sets() {
        let remote = album("a", None).with_assets(
            [("x.jpeg".to_string(), "IMG_1.jpeg".to_string())]
                .into_iter()
                .collect(),
        );
        let same_keys = album("a", None).with_assets(
            [("x.jpeg".to_string(), "RENAMED.jpeg".to_string())]
                .into_iter()
                .collect(),
        );
        let other_keys = album("a", None).with_assets(
            [("y.jpeg".to_string(), "IMG_1.jpeg".to_string())]
                .into_iter()
                .collect(),
        );
        assert!(remote.matches(&same_keys));
        assert!(!remote.matches(&other_keys));
    }

    #[test]
    fn test_matches_on_sanitized_name() {
        let remote = Album::new("a", AlbumKind::Album, "2020/2021 Trip", None);
        let scanned = Album::new("a", AlbumKind::Album, "2020_2021 Trip", None);
        assert!(remote.matches(&scanned));
        assert!(scanned.matches(&remote));
    }

    #[test]
    fn test_matches_requires_same_parent_and_name() {
        let a = album("a", None);
        let renamed = Album::new("a", AlbumKind::Album, "Other", None);
        let moved = album("a", Some("b"));
        assert!(!a.matches(&renamed));
        assert!(!a.matches(&moved));
    }

    #[test]
    fn test_apply_local_preserves_archive_state() {
        let remote = album("a", None);
        let local = album("a", None).into_archived();
        assert_eq!(remote.apply_local(&local).kind(), AlbumKind::Archived);
    }
}
