//! Content-addressable asset store
//!
//! One flat directory per zone, one file per physical asset, named by the
//! URL-safe re-encoding of its checksum plus the extension implied by the
//! file type. Verification compares existence, byte length and mtime
//! against the remote record; the checksum content is not independently
//! recomputed.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use photomirror_core::domain::{Asset, LibraryEntities, LibraryEntity, LibraryError, Warning, Zone};
use photomirror_core::ports::AssetStream;

use crate::{is_safe_file, PhotosLibrary};

/// Modification time of `meta` in milliseconds since the epoch
pub(crate) fn mtime_ms(meta: &Metadata) -> i64 {
    let mtime = FileTime::from_last_modification_time(meta);
    mtime.unix_seconds() * 1000 + i64::from(mtime.nanoseconds()) / 1_000_000
}

/// Converts an epoch-millisecond timestamp into a [`FileTime`]
pub(crate) fn filetime_from_ms(ms: i64) -> FileTime {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    FileTime::from_unix_time(ms.div_euclid(1000), (ms.rem_euclid(1000) * 1_000_000) as u32)
}

fn verify_file(path: &Path, asset: &Asset) -> Result<(), LibraryError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Err(LibraryError::AssetMissing(path.to_path_buf())),
    };
    if meta.len() != asset.size() {
        return Err(LibraryError::AssetSizeMismatch {
            path: path.to_path_buf(),
            actual: meta.len(),
            expected: asset.size(),
        });
    }
    let actual = mtime_ms(&meta);
    if !asset.modified_within_tolerance(actual) {
        return Err(LibraryError::AssetModifiedMismatch {
            path: path.to_path_buf(),
            actual,
            expected: asset.modified_at(),
        });
    }
    Ok(())
}

impl PhotosLibrary {
    /// Streams an asset body into the store
    ///
    /// The bytes go to a temporary sibling first; after setting the mtime
    /// and verifying size and timestamp the file is renamed into place.
    /// On verification failure the partial file is left behind for
    /// diagnostics rather than silently retried.
    ///
    /// # Errors
    /// Fails on I/O errors and on verification mismatches.
    #[instrument(skip(self, stream), fields(file = %asset.store_filename()))]
    pub async fn write_asset(
        &self,
        asset: &Asset,
        mut stream: AssetStream,
    ) -> Result<(), LibraryError> {
        let path = self.asset_path(asset);
        let tmp = path.with_file_name(format!("{}.tmp", asset.store_filename()));

        let mut file = tokio::fs::File::create(&tmp).await?;
        tokio::io::copy(&mut stream, &mut file).await?;
        file.flush().await?;
        drop(file);

        filetime::set_file_mtime(&tmp, filetime_from_ms(asset.modified_at()))?;
        verify_file(&tmp, asset)?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(size = asset.size(), "asset written");
        Ok(())
    }

    /// Verifies an asset against its store file
    ///
    /// # Errors
    /// Returns the specific mismatch: [`LibraryError::AssetMissing`],
    /// [`LibraryError::AssetSizeMismatch`] or
    /// [`LibraryError::AssetModifiedMismatch`].
    pub fn verify_asset(&self, asset: &Asset) -> Result<(), LibraryError> {
        verify_file(&self.asset_path(asset), asset)
    }

    /// Removes an asset from the store; already absent is not an error
    ///
    /// # Errors
    /// Fails only on I/O errors other than the file being missing.
    pub fn delete_asset(&self, asset: &Asset) -> Result<(), LibraryError> {
        let path = self.asset_path(asset);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "asset deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Scans both zone directories and rebuilds the local asset map
    ///
    /// Unparseable entries (leftover temp files, unknown extensions) are
    /// reported as warnings and skipped; the scan never aborts.
    ///
    /// # Errors
    /// Fails only when a zone directory itself cannot be read.
    #[instrument(skip(self))]
    pub fn load_assets(
        &self,
    ) -> Result<(LibraryEntities<Asset>, Vec<Warning>), LibraryError> {
        let mut assets = LibraryEntities::new();
        let mut warnings = Vec::new();

        for zone in [Zone::Primary, Zone::Shared] {
            self.load_zone_assets(zone, &mut assets, &mut warnings)?;
        }
        debug!(count = assets.len(), warnings = warnings.len(), "loaded local assets");
        Ok((assets, warnings))
    }

    fn load_zone_assets(
        &self,
        zone: Zone,
        assets: &mut LibraryEntities<Asset>,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), LibraryError> {
        for entry in std::fs::read_dir(self.zone_dir(zone))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_safe_file(&name) {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                warnings.push(Warning::new(&name, "unexpected non-file entry in asset store"));
                continue;
            }
            match Asset::from_file(&name, meta.len(), mtime_ms(&meta), zone) {
                Ok(asset) => {
                    assets.insert(asset.uuid(), asset);
                }
                Err(err) => {
                    warn!(file = %name, error = %err, "skipping unparseable store entry");
                    warnings.push(Warning::new(&name, err));
                }
            }
        }
        Ok(())
    }

    /// Relative symlink target from inside an album's hidden directory to
    /// an asset store file
    pub(crate) fn relative_asset_target(
        &self,
        hidden_dir: &Path,
        store_filename: &str,
    ) -> PathBuf {
        let depth = hidden_dir
            .strip_prefix(self.root())
            .map(|p| p.components().count())
            .unwrap_or(0);
        let mut target = PathBuf::new();
        for _ in 0..depth {
            target.push("..");
        }
        target.join(crate::PRIMARY_ASSET_DIR).join(store_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use photomirror_core::domain::{AssetVariant, Checksum, FileType};

    fn library() -> (tempfile::TempDir, PhotosLibrary) {
        let tmp = tempfile::TempDir::new().unwrap();
        let library = PhotosLibrary::new(tmp.path()).unwrap();
        (tmp, library)
    }

    fn asset(bytes: &[u8]) -> Asset {
        Asset::new(
            Checksum::from_base64("QUJDREVG").unwrap(),
            bytes.len() as u64,
            1_600_000_000_000,
            FileType::Jpeg,
            AssetVariant::Original,
            "IMG_1",
            Zone::Primary,
        )
    }

    fn stream(bytes: &'static [u8]) -> AssetStream {
        Box::pin(Cursor::new(bytes))
    }

    #[tokio::test]
    async fn test_write_then_verify() {
        let (_tmp, library) = library();
        let asset = asset(b"photo bytes");
        library.write_asset(&asset, stream(b"photo bytes")).await.unwrap();
        library.verify_asset(&asset).unwrap();
        assert!(library.asset_path(&asset).is_file());
    }

    #[tokio::test]
    async fn test_short_body_fails_verification_and_leaves_partial_file() {
        let (_tmp, library) = library();
        let asset = asset(b"full body expected");
        let result = library.write_asset(&asset, stream(b"short")).await;
        assert!(matches!(result, Err(LibraryError::AssetSizeMismatch { .. })));

        let tmp_file = library
            .zone_dir(Zone::Primary)
            .join(format!("{}.tmp", asset.store_filename()));
        assert!(tmp_file.is_file());
        assert!(!library.asset_path(&asset).exists());
    }

    #[test]
    fn test_verify_missing_asset() {
        let (_tmp, library) = library();
        let result = library.verify_asset(&asset(b"x"));
        assert!(matches!(result, Err(LibraryError::AssetMissing(_))));
    }

    #[tokio::test]
    async fn test_verify_tolerates_small_mtime_drift() {
        let (_tmp, library) = library();
        let asset = asset(b"bytes");
        library.write_asset(&asset, stream(b"bytes")).await.unwrap();

        // 5 ms off passes, 500 ms off fails
        let path = library.asset_path(&asset);
        filetime::set_file_mtime(&path, filetime_from_ms(asset.modified_at() + 5)).unwrap();
        library.verify_asset(&asset).unwrap();

        filetime::set_file_mtime(&path, filetime_from_ms(asset.modified_at() + 500)).unwrap();
        assert!(matches!(
            library.verify_asset(&asset),
            Err(LibraryError::AssetModifiedMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_asset_is_best_effort() {
        let (_tmp, library) = library();
        let asset = asset(b"bytes");
        // absent file is not an error
        library.delete_asset(&asset).unwrap();

        library.write_asset(&asset, stream(b"bytes")).await.unwrap();
        library.delete_asset(&asset).unwrap();
        assert!(!library.asset_path(&asset).exists());
    }

    #[tokio::test]
    async fn test_load_assets_roundtrip() {
        let (_tmp, library) = library();
        let asset = asset(b"bytes");
        library.write_asset(&asset, stream(b"bytes")).await.unwrap();

        let (loaded, warnings) = library.load_assets().unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.len(), 1);
        assert!(loaded[&asset.uuid()].matches(&asset));
    }

    #[test]
    fn test_load_assets_warns_on_unparseable_entries() {
        let (_tmp, library) = library();
        std::fs::write(library.zone_dir(Zone::Primary).join("junk.gif"), b"x").unwrap();
        std::fs::write(library.zone_dir(Zone::Primary).join(".DS_Store"), b"x").unwrap();

        let (loaded, warnings) = library.load_assets().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].context(), "junk.gif");
    }

    #[test]
    fn test_relative_asset_target_depth() {
        let (_tmp, library) = library();
        let hidden = library.root().join(".folder-uuid").join(".album-uuid");
        let target = library.relative_asset_target(&hidden, "QUJD.jpeg");
        assert_eq!(
            target,
            PathBuf::from("../..")
                .join(crate::PRIMARY_ASSET_DIR)
                .join("QUJD.jpeg")
        );
    }
}
