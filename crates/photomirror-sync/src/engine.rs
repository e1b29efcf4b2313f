//! Sync cycle driver
//!
//! One call to [`SyncEngine::sync`] performs a complete cycle:
//!
//! 1. Fetch the remote snapshot and rebuild the local maps from disk.
//! 2. Diff both entity kinds; repair the album queues for ancestor
//!    deletion.
//! 3. Apply asset mutations: deletions sequentially, downloads on a
//!    bounded worker pool.
//! 4. Apply album mutations on the control task, deletions deepest-first
//!    and additions parent-first; archived albums move through the stash.
//! 5. Promote stash entries no pending album references anymore.
//!
//! Per-item failures become warnings on the report; structural failures
//! of a single album write are downgraded to warnings as well so one bad
//! directory cannot wedge the whole mirror, while sort failures and
//! unreadable directories abort the cycle.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use photomirror_core::domain::{
    Album, AlbumKind, Asset, LibraryEntities, LibraryEntity, ProcessingQueues, Warning,
};
use photomirror_core::ports::{RemoteAlbumRecord, RemoteAssetRecord};
use photomirror_library::PhotosLibrary;
use photomirror_recon::{processing_queues, resolve_hierarchical_dependencies, sort_queue};

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::report::SyncReport;

/// Drives sync cycles against one library directory
pub struct SyncEngine {
    context: SyncContext,
    library: PhotosLibrary,
}

impl SyncEngine {
    /// Opens the library named by the configuration
    ///
    /// # Errors
    /// Fails when the library skeleton cannot be created.
    pub fn new(context: SyncContext) -> Result<Self, SyncError> {
        let library = PhotosLibrary::new(context.config.sync.data_dir.clone())?;
        Ok(Self { context, library })
    }

    /// Returns the underlying library handle
    #[must_use]
    pub fn library(&self) -> &PhotosLibrary {
        &self.library
    }

    /// Runs one full sync cycle
    ///
    /// # Errors
    /// Fails on remote fetch failures, unreadable local directories and
    /// unsortable album queues. Per-item failures do not abort the cycle;
    /// they are collected on the returned report.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new();

        info!("fetching remote state");
        let asset_records = self.context.remote.fetch_assets().await?;
        let album_records = self.context.remote.fetch_albums().await?;
        let remote_assets = convert_asset_records(asset_records, &mut report);
        let remote_albums = convert_album_records(album_records, &mut report);

        info!("loading local state");
        let (local_assets, warnings) = self.library.load_assets()?;
        report.warn_all(warnings);
        let (local_albums, warnings) = self.library.load_albums()?;
        report.warn_all(warnings);

        let asset_queues = processing_queues(remote_assets, &local_assets);
        let album_queues = resolve_hierarchical_dependencies(
            processing_queues(remote_albums, &local_albums),
            &local_albums,
        );
        // Uuids any pending album still claims; stash entries outside this
        // set are orphans.
        let referenced: HashSet<String> = album_queues
            .to_add
            .iter()
            .chain(&album_queues.to_keep)
            .map(LibraryEntity::uuid)
            .collect();

        self.write_assets(asset_queues, &mut report).await;
        self.write_albums(album_queues, &local_albums, &mut report)?;

        let warnings = self.library.clean_archived_orphans(&referenced)?;
        report.warn_all(warnings);

        report.summarize();
        Ok(report)
    }

    /// Applies the asset queues: sequential deletes, pooled downloads
    async fn write_assets(&self, queues: ProcessingQueues<Asset>, report: &mut SyncReport) {
        report.assets_kept = queues.to_keep.len();

        for asset in &queues.to_delete {
            match self.library.delete_asset(asset) {
                Ok(()) => report.assets_deleted += 1,
                Err(err) => report.warn(Warning::new(asset.store_filename(), err)),
            }
        }

        let concurrency = self.context.config.sync.download_concurrency.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut downloads = JoinSet::new();

        for asset in queues.to_add {
            // A correct file may already sit in the store, e.g. after a
            // crash between asset and album phases.
            if self.library.verify_asset(&asset).is_ok() {
                debug!(file = %asset.store_filename(), "asset already present, skipping download");
                report.assets_added += 1;
                continue;
            }
            let semaphore = Arc::clone(&semaphore);
            let remote = Arc::clone(&self.context.remote);
            let library = self.library.clone();
            downloads.spawn(async move {
                let file = asset.store_filename();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => return Err(Warning::new(file, err)),
                };
                let stream = match remote.download_asset(&asset).await {
                    Ok(stream) => stream,
                    Err(err) => return Err(Warning::new(file, err)),
                };
                match library.write_asset(&asset, stream).await {
                    Ok(()) => Ok(()),
                    Err(err) => Err(Warning::new(file, err)),
                }
            });
        }

        while let Some(joined) = downloads.join_next().await {
            match joined {
                Ok(Ok(())) => report.assets_added += 1,
                Ok(Err(warning)) => report.warn(warning),
                Err(err) => report.warn(Warning::new("download task", err)),
            }
        }
    }

    /// Applies the album queues in hierarchical order
    ///
    /// The removal phase covers the delete queue plus the stale local
    /// pairs of albums being re-added: an album that changed in place
    /// (rename, move, membership) appears only in the add queue, but its
    /// old pair still has to come off the disk before the new one can be
    /// written.
    fn write_albums(
        &self,
        queues: ProcessingQueues<Album>,
        local_albums: &LibraryEntities<Album>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        report.albums_kept = queues.to_keep.len();

        let mut removals: Vec<Album> = queues.to_delete;
        let mut removal_uuids: HashSet<String> =
            removals.iter().map(LibraryEntity::uuid).collect();
        for album in &queues.to_add {
            if let Some(stale) = local_albums.get(&album.uuid()) {
                if removal_uuids.insert(stale.uuid()) {
                    removals.push(stale.clone());
                }
            }
        }

        let mut deletions = sort_queue(removals)?;
        deletions.reverse();
        for album in &deletions {
            let result = if album.kind() == AlbumKind::Archived {
                self.library.stash_album(album)
            } else {
                self.library.delete_album(album)
            };
            match result {
                Ok(()) => report.albums_deleted += 1,
                Err(err) => report.warn(Warning::new(album.display_name(), err)),
            }
        }

        for album in &sort_queue(queues.to_add)? {
            if album.kind() == AlbumKind::Archived {
                match self.library.retrieve_album(album) {
                    Ok(()) => report.albums_added += 1,
                    Err(err) => report.warn(Warning::new(album.display_name(), err)),
                }
            } else {
                match self.library.write_album(album) {
                    Ok(warnings) => {
                        report.albums_added += 1;
                        report.warn_all(warnings);
                    }
                    Err(err) => report.warn(Warning::new(album.display_name(), err)),
                }
            }
        }
        Ok(())
    }
}

fn convert_asset_records(
    records: Vec<RemoteAssetRecord>,
    report: &mut SyncReport,
) -> Vec<Asset> {
    records
        .into_iter()
        .filter_map(|record| {
            let identity = record.checksum.clone();
            match Asset::try_from(record) {
                Ok(asset) => Some(asset),
                Err(err) => {
                    report.warn(Warning::new(identity, err));
                    None
                }
            }
        })
        .collect()
}

fn convert_album_records(
    records: Vec<RemoteAlbumRecord>,
    report: &mut SyncReport,
) -> Vec<Album> {
    records
        .into_iter()
        .filter_map(|record| {
            let identity = record.uuid.clone();
            match Album::try_from(record) {
                Ok(album) => Some(album),
                Err(err) => {
                    report.warn(Warning::new(identity, err));
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    use photomirror_core::config::Config;
    use photomirror_core::domain::{AssetVariant, Zone};
    use photomirror_core::ports::{AssetStream, RemoteAlbumAsset, RemoteLibrary};

    #[derive(Default)]
    struct MockRemote {
        assets: Vec<RemoteAssetRecord>,
        albums: Vec<RemoteAlbumRecord>,
        bodies: HashMap<String, Vec<u8>>,
        failing: HashSet<String>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl RemoteLibrary for MockRemote {
        async fn fetch_assets(&self) -> anyhow::Result<Vec<RemoteAssetRecord>> {
            Ok(self.assets.clone())
        }

        async fn fetch_albums(&self) -> anyhow::Result<Vec<RemoteAlbumRecord>> {
            Ok(self.albums.clone())
        }

        async fn download_asset(&self, asset: &Asset) -> anyhow::Result<AssetStream> {
            if self.failing.contains(&asset.uuid()) {
                anyhow::bail!("simulated download failure");
            }
            let body = self
                .bodies
                .get(&asset.uuid())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no body for {}", asset.uuid()))?;
            Ok(Box::pin(Cursor::new(body)) as AssetStream)
        }

        async fn delete_assets(&self, record_names: &[String]) -> anyhow::Result<()> {
            self.deleted
                .lock()
                .unwrap()
                .extend(record_names.iter().cloned());
            Ok(())
        }
    }

    fn asset_record(checksum: &str, body: &[u8]) -> RemoteAssetRecord {
        RemoteAssetRecord {
            checksum: checksum.to_string(),
            size: body.len() as u64,
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

    fn album_member(checksum: &str, pretty: &str) -> RemoteAlbumAsset {
        RemoteAlbumAsset {
            checksum: checksum.to_string(),
            descriptor: "public.jpeg".to_string(),
            pretty_filename: pretty.to_string(),
        }
    }

    fn mock_remote() -> MockRemote {
        MockRemote {
            assets: vec![asset_record("QUJD", b"body-abc"), asset_record("REVG", b"body-def")],
            albums: vec![
                RemoteAlbumRecord {
                    uuid: "folder-1".to_string(),
                    name: "2024".to_string(),
                    parent_uuid: None,
                    is_folder: true,
                    assets: Vec::new(),
                },
                RemoteAlbumRecord {
                    uuid: "album-1".to_string(),
                    name: "Trip".to_string(),
                    parent_uuid: Some("folder-1".to_string()),
                    is_folder: false,
                    assets: vec![album_member("QUJD", "IMG_1.jpeg")],
                },
            ],
            bodies: HashMap::from([
                ("QUJD".to_string(), b"body-abc".to_vec()),
                ("REVG".to_string(), b"body-def".to_vec()),
            ]),
            ..MockRemote::default()
        }
    }

    fn engine(data_dir: &std::path::Path, remote: MockRemote) -> SyncEngine {
        let mut config = Config::default();
        config.sync.data_dir = data_dir.to_path_buf();
        SyncEngine::new(SyncContext::new(config, Arc::new(remote))).unwrap()
    }

    #[tokio::test]
    async fn test_full_cycle_mirrors_remote_state() {
        let tmp = tempfile::TempDir::new().unwrap();
        let engine = engine(tmp.path(), mock_remote());

        let report = engine.sync().await.unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(report.assets_added, 2);
        assert_eq!(report.albums_added, 2);

        let store = engine.library().zone_dir(Zone::Primary);
        assert_eq!(std::fs::read(store.join("QUJD.jpeg")).unwrap(), b"body-abc");
        assert_eq!(std::fs::read(store.join("REVG.jpeg")).unwrap(), b"body-def");

        let linked = tmp
            .path()
            .join(".folder-1")
            .join(".album-1")
            .join("IMG_1.jpeg");
        assert_eq!(std::fs::read(linked).unwrap(), b"body-abc");
    }

    #[tokio::test]
    async fn test_second_cycle_is_a_noop() {
        let tmp = tempfile::TempDir::new().unwrap();
        engine(tmp.path(), mock_remote()).sync().await.unwrap();

        let report = engine(tmp.path(), mock_remote()).sync().await.unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(report.assets_added, 0);
        assert_eq!(report.assets_deleted, 0);
        assert_eq!(report.assets_kept, 2);
        assert_eq!(report.albums_added, 0);
        assert_eq!(report.albums_deleted, 0);
        assert_eq!(report.albums_kept, 2);
    }

    #[tokio::test]
    async fn test_failed_download_does_not_abort_cycle() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut remote = mock_remote();
        remote.albums[1].assets = vec![album_member("REVG", "IMG_2.jpeg")];
        remote.failing.insert("QUJD".to_string());
        let engine = engine(tmp.path(), remote);

        let report = engine.sync().await.unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].context(), "QUJD.jpeg");
        assert_eq!(report.assets_added, 1);

        let store = engine.library().zone_dir(Zone::Primary);
        assert!(store.join("REVG.jpeg").is_file());
        assert!(!store.join("QUJD.jpeg").exists());
    }

    #[tokio::test]
    async fn test_emptied_remote_deletes_local_state() {
        let tmp = tempfile::TempDir::new().unwrap();
        engine(tmp.path(), mock_remote()).sync().await.unwrap();

        let report = engine(tmp.path(), MockRemote::default()).sync().await.unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(report.assets_deleted, 2);
        assert_eq!(report.albums_deleted, 2);
        assert!(!tmp.path().join(".folder-1").exists());
    }

    #[tokio::test]
    async fn test_archived_album_survives_parent_rebuild() {
        let tmp = tempfile::TempDir::new().unwrap();
        engine(tmp.path(), mock_remote()).sync().await.unwrap();

        // The user freezes the album by dropping a real file into it.
        std::fs::write(
            tmp.path().join(".folder-1").join(".album-1").join("note.txt"),
            b"mine",
        )
        .unwrap();

        // The remote renames the folder, forcing a delete-and-recreate of
        // the whole subtree.
        let mut remote = mock_remote();
        remote.albums[0].name = "2024 Renamed".to_string();
        let report = engine(tmp.path(), remote).sync().await.unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

        let frozen = tmp
            .path()
            .join(".folder-1")
            .join(".album-1")
            .join("note.txt");
        assert_eq!(std::fs::read(frozen).unwrap(), b"mine");
        assert!(tmp.path().join("2024 Renamed").symlink_metadata().unwrap().is_symlink());
    }

    #[tokio::test]
    async fn test_vanished_archived_album_is_promoted() {
        let tmp = tempfile::TempDir::new().unwrap();
        engine(tmp.path(), mock_remote()).sync().await.unwrap();
        std::fs::write(
            tmp.path().join(".folder-1").join(".album-1").join("note.txt"),
            b"mine",
        )
        .unwrap();

        // The remote forgets the album entirely; its frozen content moves
        // into the visible archive instead of being destroyed.
        let mut remote = mock_remote();
        remote.albums.truncate(1);
        let report = engine(tmp.path(), remote).sync().await.unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

        let promoted = tmp.path().join("_Archive").join("Trip").join("note.txt");
        assert_eq!(std::fs::read(promoted).unwrap(), b"mine");
    }
}
