//! Remote library port (driven/secondary port)
//!
//! This module defines the interface for talking to the remote photo
//! backend. Record structs are port-level DTOs, not domain entities; the
//! `TryFrom`/`From` impls at the bottom perform the mapping into the
//! domain model, so adapters stay free of naming and checksum rules.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Downloads are returned as a boxed [`AsyncRead`] so the HTTP client
//!   stays behind the adapter and the core can stream bodies to disk.

use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::domain::{Album, AlbumKind, Asset, AssetVariant, Checksum, FileType, LibraryError, Zone};

/// A streaming download body
pub type AssetStream = Pin<Box<dyn AsyncRead + Send>>;

// ============================================================================
// Port-level DTOs
// ============================================================================

/// A single asset record as reported by the remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAssetRecord {
    /// Standard base64 checksum, the asset's identity
    pub checksum: String,
    /// File size in bytes
    pub size: u64,
    /// Modification timestamp in milliseconds since the epoch
    pub modified: i64,
    /// Backend file type descriptor, e.g. `public.jpeg`
    pub descriptor: String,
    /// Original, edit or live companion
    pub variant: AssetVariant,
    /// Filename stem the file was imported under
    pub original_filename: String,
    /// Library partition the record came from
    pub zone: Zone,
    /// Record identifier, needed for remote deletion
    pub record_name: String,
    /// Opaque key material attached to the record
    pub wrapping_key: Option<String>,
    /// Opaque reference checksum attached to the record
    pub reference_checksum: Option<String>,
    /// Where to download the asset bytes from
    pub download_url: Option<String>,
    /// Favorite flag
    pub is_favorite: Option<bool>,
}

/// Membership of one asset in a remote album
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAlbumAsset {
    /// Standard base64 checksum of the member asset
    pub checksum: String,
    /// Backend file type descriptor of the member asset
    pub descriptor: String,
    /// Filename the asset should be presented under inside the album
    pub pretty_filename: String,
}

/// A single album record as reported by the remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAlbumRecord {
    /// Stable album identity
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Parent album, or `None` at the tree root
    pub parent_uuid: Option<String>,
    /// Whether this is a folder (groups albums) rather than an album
    pub is_folder: bool,
    /// Asset membership; empty for folders
    pub assets: Vec<RemoteAlbumAsset>,
}

// ============================================================================
// RemoteLibrary trait
// ============================================================================

/// Port trait for remote photo library operations
///
/// Implementations handle the backend-specific API calls, authentication
/// and error mapping. All methods assume a valid session; re-auth is the
/// implementation's concern.
#[async_trait::async_trait]
pub trait RemoteLibrary: Send + Sync {
    /// Fetches every asset record of the remote library, across all zones
    async fn fetch_assets(&self) -> anyhow::Result<Vec<RemoteAssetRecord>>;

    /// Fetches every album record of the remote library
    async fn fetch_albums(&self) -> anyhow::Result<Vec<RemoteAlbumRecord>>;

    /// Opens a streaming download of the asset's bytes
    async fn download_asset(&self, asset: &Asset) -> anyhow::Result<AssetStream>;

    /// Deletes the given records from the remote library
    async fn delete_assets(&self, record_names: &[String]) -> anyhow::Result<()>;
}

// ============================================================================
// DTO to domain mapping
// ============================================================================

impl TryFrom<RemoteAssetRecord> for Asset {
    type Error = LibraryError;

    fn try_from(record: RemoteAssetRecord) -> Result<Self, Self::Error> {
        let checksum = Checksum::from_base64(&record.checksum)?;
        let file_type = FileType::from_descriptor(&record.descriptor)?;
        Ok(Asset::new(
            checksum,
            record.size,
            record.modified,
            file_type,
            record.variant,
            record.original_filename,
            record.zone,
        )
        .with_remote_metadata(
            record.wrapping_key,
            record.reference_checksum,
            record.download_url,
            Some(record.record_name),
            record.is_favorite,
        ))
    }
}

impl TryFrom<RemoteAlbumRecord> for Album {
    type Error = LibraryError;

    fn try_from(record: RemoteAlbumRecord) -> Result<Self, Self::Error> {
        let kind = if record.is_folder {
            AlbumKind::Folder
        } else {
            AlbumKind::Album
        };
        let mut assets = std::collections::HashMap::with_capacity(record.assets.len());
        for member in record.assets {
            let checksum = Checksum::from_base64(&member.checksum)?;
            let file_type = FileType::from_descriptor(&member.descriptor)?;
            let store_filename =
                format!("{}.{}", checksum.to_filename_stem(), file_type.extension());
            assets.insert(store_filename, member.pretty_filename);
        }
        Ok(Album::new(record.uuid, kind, record.name, record.parent_uuid).with_assets(assets))
    }
}
