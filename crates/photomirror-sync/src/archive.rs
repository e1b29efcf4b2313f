//! Archive workflow
//!
//! Freezes one album in place: every asset symlink inside it is replaced
//! by a real copy of the store file, turning the album into an archived
//! snapshot the sync cycle will never rewrite. Optionally the frozen
//! assets are also deleted from the remote library, so they stop counting
//! against remote storage.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use photomirror_core::domain::{Asset, LibraryError, Warning};
use photomirror_library::{is_safe_file, PhotosLibrary, ARCHIVE_DIR, PRIMARY_ASSET_DIR, SHARED_ASSET_DIR};

use crate::context::SyncContext;
use crate::error::SyncError;

/// Freezes albums in place and optionally deletes their assets remotely
pub struct ArchiveEngine {
    context: SyncContext,
    library: PhotosLibrary,
}

impl ArchiveEngine {
    /// Opens the library named by the configuration
    ///
    /// # Errors
    /// Fails when the library skeleton cannot be created.
    pub fn new(context: SyncContext) -> Result<Self, SyncError> {
        let library = PhotosLibrary::new(context.config.sync.data_dir.clone())?;
        Ok(Self { context, library })
    }

    /// Archives the album at `path`
    ///
    /// `path` may be the visible name symlink or the hidden directory
    /// itself. Per-asset failures (dangling link, copy error, missing
    /// remote record) are reported as warnings and excluded from the
    /// remote deletion batch; the rest of the album is still archived.
    ///
    /// # Errors
    /// Fails when the path is not an album directory inside the library,
    /// or when the remote deletion batch itself fails.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn archive(&self, path: &Path) -> Result<Vec<Warning>, SyncError> {
        let album_dir = self.resolve_album_dir(path)?;
        let mut warnings = Vec::new();
        let mut frozen: Vec<String> = Vec::new();

        for entry in std::fs::read_dir(&album_dir).map_err(LibraryError::from)? {
            let entry = entry.map_err(LibraryError::from)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&name) {
                continue;
            }
            let meta = entry.path().symlink_metadata().map_err(LibraryError::from)?;
            if !meta.is_symlink() {
                continue;
            }
            match freeze_symlink(&entry.path()) {
                Ok(store_filename) => frozen.push(store_filename),
                Err(err) => {
                    warn!(entry = %name, error = %err, "failed to freeze album entry");
                    warnings.push(Warning::new(&name, err));
                }
            }
        }
        info!(frozen = frozen.len(), "album archived");

        if self.context.config.sync.remote_delete && !frozen.is_empty() {
            self.delete_remote_assets(&frozen, &mut warnings).await?;
        }
        Ok(warnings)
    }

    /// Resolves and validates the hidden directory to archive
    fn resolve_album_dir(&self, path: &Path) -> Result<PathBuf, SyncError> {
        let target = path
            .canonicalize()
            .map_err(|_| LibraryError::NotArchivable(path.to_path_buf()))?;
        let root = self
            .library
            .root()
            .canonicalize()
            .map_err(LibraryError::from)?;

        let inside_tree = target.strip_prefix(&root).is_ok_and(|rest| {
            rest.components().next().is_some_and(|first| {
                let first = first.as_os_str().to_string_lossy();
                ![PRIMARY_ASSET_DIR, SHARED_ASSET_DIR, ARCHIVE_DIR]
                    .contains(&first.as_ref())
            })
        });
        let is_hidden_dir = target.is_dir()
            && target
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if !inside_tree || !is_hidden_dir {
            return Err(LibraryError::NotArchivable(path.to_path_buf()).into());
        }
        Ok(target)
    }

    /// Maps frozen store filenames to remote records and deletes them
    async fn delete_remote_assets(
        &self,
        frozen: &[String],
        warnings: &mut Vec<Warning>,
    ) -> Result<(), SyncError> {
        let records = self.context.remote.fetch_assets().await?;
        let by_filename: std::collections::HashMap<String, String> = records
            .into_iter()
            .filter_map(|record| {
                let record_name = record.record_name.clone();
                Asset::try_from(record)
                    .ok()
                    .map(|asset| (asset.store_filename(), record_name))
            })
            .collect();

        let mut record_names = Vec::new();
        for store_filename in frozen {
            match by_filename.get(store_filename) {
                Some(record_name) => record_names.push(record_name.clone()),
                None => warnings.push(Warning::new(
                    store_filename,
                    "no remote record found, skipping remote deletion",
                )),
            }
        }
        if !record_names.is_empty() {
            self.context.remote.delete_assets(&record_names).await?;
            info!(count = record_names.len(), "assets deleted remotely");
        }
        Ok(())
    }
}

/// Replaces one asset symlink with a real copy of its target
///
/// Returns the store filename of the frozen asset. The copy lands in a
/// temporary sibling first and is renamed over the symlink, so a failed
/// copy leaves the link intact.
fn freeze_symlink(link: &Path) -> Result<String, LibraryError> {
    let target = link
        .canonicalize()
        .map_err(|_| LibraryError::AssetMissing(link.to_path_buf()))?;
    let store_filename = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LibraryError::AssetMissing(target.clone()))?;

    let link_name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = link.with_file_name(format!("{link_name}.freeze"));
    std::fs::copy(&target, &tmp)?;
    let meta = std::fs::metadata(&target)?;
    filetime::set_file_mtime(&tmp, filetime::FileTime::from_last_modification_time(&meta))?;
    std::fs::rename(&tmp, link)?;
    Ok(store_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use photomirror_core::config::Config;
    use photomirror_core::domain::{Album, AlbumKind, AssetVariant, Zone};
    use photomirror_core::ports::{
        AssetStream, RemoteAlbumRecord, RemoteAssetRecord, RemoteLibrary,
    };

    #[derive(Default)]
    struct MockRemote {
        assets: Vec<RemoteAssetRecord>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl RemoteLibrary for MockRemote {
        async fn fetch_assets(&self) -> anyhow::Result<Vec<RemoteAssetRecord>> {
            Ok(self.assets.clone())
        }

        async fn fetch_albums(&self) -> anyhow::Result<Vec<RemoteAlbumRecord>> {
            Ok(Vec::new())
        }

        async fn download_asset(&self, _asset: &photomirror_core::domain::Asset) -> anyhow::Result<AssetStream> {
            anyhow::bail!("not used in archive tests")
        }

        async fn delete_assets(&self, record_names: &[String]) -> anyhow::Result<()> {
            self.deleted
                .lock()
                .unwrap()
                .extend(record_names.iter().cloned());
            Ok(())
        }
    }

    fn asset_record(checksum: &str) -> RemoteAssetRecord {
        RemoteAssetRecord {
            checksum: checksum.to_string(),
            size: 5,
            modified: 1_600_000_000_000,
            descriptor: "public.jpeg".to_string(),
            variant: AssetVariant::Original,
            original_filename: format!("IMG_{checksum}"),
            zone: Zone::Primary,
            record_name: format!("rec-{checksum}"),
            wrapping_key: None,
            reference_checksum: None,
            download_url: None,
            is_favorite: None,
        }
    }

    fn setup(remote_delete: bool, remote: MockRemote) -> (tempfile::TempDir, ArchiveEngine) {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.sync.data_dir = tmp.path().to_path_buf();
        config.sync.remote_delete = remote_delete;
        let engine = ArchiveEngine::new(SyncContext::new(config, Arc::new(remote))).unwrap();

        // One stored asset linked from one album.
        std::fs::write(
            engine.library.zone_dir(Zone::Primary).join("QUJD.jpeg"),
            b"bytes",
        )
        .unwrap();
        let album = Album::new("a1", AlbumKind::Album, "Trip", None).with_assets(
            HashMap::from([("QUJD.jpeg".to_string(), "IMG_1.jpeg".to_string())]),
        );
        engine.library.write_album(&album).unwrap();
        (tmp, engine)
    }

    #[tokio::test]
    async fn test_archive_replaces_symlinks_with_copies() {
        let (tmp, engine) = setup(false, MockRemote::default());
        let warnings = engine.archive(&tmp.path().join("Trip")).await.unwrap();
        assert!(warnings.is_empty(), "warnings: {warnings:?}");

        let frozen = tmp.path().join(".a1").join("IMG_1.jpeg");
        let meta = frozen.symlink_metadata().unwrap();
        assert!(meta.is_file() && !meta.is_symlink());
        assert_eq!(std::fs::read(frozen).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_archive_records_remote_deletions() {
        let remote = Arc::new(MockRemote {
            assets: vec![asset_record("QUJD")],
            ..MockRemote::default()
        });
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.sync.data_dir = tmp.path().to_path_buf();
        config.sync.remote_delete = true;
        let engine =
            ArchiveEngine::new(SyncContext::new(config, remote.clone())).unwrap();
        std::fs::write(
            engine.library.zone_dir(Zone::Primary).join("QUJD.jpeg"),
            b"bytes",
        )
        .unwrap();
        let album = Album::new("a1", AlbumKind::Album, "Trip", None).with_assets(
            HashMap::from([("QUJD.jpeg".to_string(), "IMG_1.jpeg".to_string())]),
        );
        engine.library.write_album(&album).unwrap();

        engine.archive(&tmp.path().join("Trip")).await.unwrap();
        assert_eq!(*remote.deleted.lock().unwrap(), vec!["rec-QUJD".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_record_is_excluded_from_the_batch() {
        let (tmp, engine) = setup(true, MockRemote::default());
        let warnings = engine.archive(&tmp.path().join("Trip")).await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].context(), "QUJD.jpeg");
    }

    #[tokio::test]
    async fn test_refuses_paths_outside_the_tree() {
        let (tmp, engine) = setup(false, MockRemote::default());
        for bad in [
            tmp.path().to_path_buf(),
            tmp.path().join("_All-Photos"),
            tmp.path().join("_Archive"),
            tmp.path().join("does-not-exist"),
        ] {
            let result = engine.archive(&bad).await;
            assert!(
                matches!(result, Err(SyncError::Library(LibraryError::NotArchivable(_)))),
                "expected NotArchivable for {}",
                bad.display()
            );
        }
    }

    #[tokio::test]
    async fn test_dangling_link_is_skipped_with_warning() {
        let (tmp, engine) = setup(false, MockRemote::default());
        std::os::unix::fs::symlink("../_All-Photos/gone.jpeg", tmp.path().join(".a1").join("IMG_9.jpeg")).unwrap();

        let warnings = engine.archive(&tmp.path().join("Trip")).await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].context(), "IMG_9.jpeg");
        // The healthy entry is still frozen.
        assert!(!tmp.path().join(".a1").join("IMG_1.jpeg").symlink_metadata().unwrap().is_symlink());
    }
}
