//! Asset domain entity
//!
//! An [`Asset`] is a single physical file version in the library. Its
//! identity is the remote-supplied checksum, which doubles as the filename
//! stem inside the content-addressable asset store. Assets are immutable
//! after construction; they are created either from a remote record or from
//! a filesystem scan, and two assets are considered equal when checksum,
//! file type and size match and the modification times are within a small
//! tolerance window (never exact, to absorb filesystem timestamp rounding).

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::LibraryEntity;
use super::errors::LibraryError;
use super::file_type::FileType;

/// Window (in milliseconds) within which two modification timestamps are
/// considered the same. Filesystems round mtimes, so exact comparison
/// would flag every asset as changed on every cycle.
pub const MODIFIED_TOLERANCE_MS: i64 = 10;

// ============================================================================
// Checksum value type
// ============================================================================

/// The remote-supplied checksum of an asset
///
/// The checksum is opaque: it is never recomputed locally and only serves
/// as an identity and comparison key. The remote transports it as standard
/// base64; the asset store re-encodes it URL-safe (without padding) so it
/// can be used as a filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(Vec<u8>);

impl Checksum {
    /// Parses a checksum from its standard base64 representation
    ///
    /// # Errors
    /// Returns [`LibraryError::InvalidAssetFilename`] if the input is not
    /// valid base64.
    pub fn from_base64(value: &str) -> Result<Self, LibraryError> {
        STANDARD
            .decode(value)
            .map(Self)
            .map_err(|_| LibraryError::InvalidAssetFilename(value.to_string()))
    }

    /// Parses a checksum from an asset-store filename stem (URL-safe base64)
    ///
    /// # Errors
    /// Returns [`LibraryError::InvalidAssetFilename`] if the stem is not
    /// valid URL-safe base64.
    pub fn from_filename_stem(stem: &str) -> Result<Self, LibraryError> {
        URL_SAFE_NO_PAD
            .decode(stem)
            .map(Self)
            .map_err(|_| LibraryError::InvalidAssetFilename(stem.to_string()))
    }

    /// Returns the standard base64 representation (the canonical identity)
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Returns the URL-safe base64 representation used as a filename stem
    #[must_use]
    pub fn to_filename_stem(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl TryFrom<String> for Checksum {
    type Error = LibraryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.to_base64()
    }
}

// ============================================================================
// Variant and zone enums
// ============================================================================

/// Which version of a photo this asset represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetVariant {
    /// The file as originally imported
    #[default]
    Original,
    /// The latest edit of the original
    Edited,
    /// The video companion of a live photo
    Live,
}

/// The library partition an asset belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// The user's own library
    #[default]
    Primary,
    /// The shared library partition
    Shared,
}

// ============================================================================
// Asset entity
// ============================================================================

/// A single physical file version in the photo library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Checksum identity, doubles as the asset-store filename stem
    checksum: Checksum,
    /// File size in bytes
    size: u64,
    /// Modification timestamp in milliseconds since the epoch
    modified_at: i64,
    /// Content type
    file_type: FileType,
    /// Original, edit or live companion
    variant: AssetVariant,
    /// Filename stem of the originally imported file (empty when scanned
    /// from disk, where the information is not recoverable)
    original_filename: String,
    /// Library partition
    zone: Zone,
    /// Opaque remote wrapping key (present only on remote records)
    wrapping_key: Option<String>,
    /// Opaque remote reference checksum (present only on remote records)
    reference_checksum: Option<String>,
    /// Download URL (present only on remote records)
    download_url: Option<String>,
    /// Remote record identifier, needed to delete the asset remotely
    record_name: Option<String>,
    /// Favorite flag as reported by the remote
    is_favorite: Option<bool>,
}

impl Asset {
    /// Creates an asset with the mandatory attributes; remote-only metadata
    /// starts out unset
    #[must_use]
    pub fn new(
        checksum: Checksum,
        size: u64,
        modified_at: i64,
        file_type: FileType,
        variant: AssetVariant,
        original_filename: impl Into<String>,
        zone: Zone,
    ) -> Self {
        Self {
            checksum,
            size,
            modified_at,
            file_type,
            variant,
            original_filename: original_filename.into(),
            zone,
            wrapping_key: None,
            reference_checksum: None,
            download_url: None,
            record_name: None,
            is_favorite: None,
        }
    }

    /// Attaches the remote-only metadata a backend record carries
    #[must_use]
    pub fn with_remote_metadata(
        mut self,
        wrapping_key: Option<String>,
        reference_checksum: Option<String>,
        download_url: Option<String>,
        record_name: Option<String>,
        is_favorite: Option<bool>,
    ) -> Self {
        self.wrapping_key = wrapping_key;
        self.reference_checksum = reference_checksum;
        self.download_url = download_url;
        self.record_name = record_name;
        self.is_favorite = is_favorite;
        self
    }

    /// Creates an asset from a scanned asset-store file
    ///
    /// The filename stem is the URL-safe re-encoding of the checksum and
    /// the extension implies the file type; remote-only metadata is not
    /// recoverable from disk.
    ///
    /// # Errors
    /// Fails if the stem is not valid URL-safe base64 or the extension is
    /// outside the known file type table.
    pub fn from_file(
        file_name: &str,
        size: u64,
        modified_at: i64,
        zone: Zone,
    ) -> Result<Self, LibraryError> {
        let (stem, extension) = file_name
            .rsplit_once('.')
            .ok_or_else(|| LibraryError::InvalidAssetFilename(file_name.to_string()))?;
        let checksum = Checksum::from_filename_stem(stem)?;
        let file_type = FileType::from_extension(extension)?;
        Ok(Self::new(
            checksum,
            size,
            modified_at,
            file_type,
            AssetVariant::Original,
            "",
            zone,
        ))
    }

    // --- Getters ---

    /// Returns the checksum identity
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Returns the file size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the modification timestamp in milliseconds since the epoch
    pub fn modified_at(&self) -> i64 {
        self.modified_at
    }

    /// Returns the content type
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Returns the variant (original, edit, live companion)
    pub fn variant(&self) -> AssetVariant {
        self.variant
    }

    /// Returns the library partition
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Returns the remote record identifier, if known
    pub fn record_name(&self) -> Option<&str> {
        self.record_name.as_deref()
    }

    /// Returns the download URL, if known
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    /// Returns the favorite flag, if known
    pub fn is_favorite(&self) -> Option<bool> {
        self.is_favorite
    }

    // --- Derived names ---

    /// Returns the asset-store filename: URL-safe checksum stem plus the
    /// extension implied by the file type
    #[must_use]
    pub fn store_filename(&self) -> String {
        format!(
            "{}.{}",
            self.checksum.to_filename_stem(),
            self.file_type.extension()
        )
    }

    /// Returns the human readable filename, based on the original import
    /// name with a variant suffix
    #[must_use]
    pub fn pretty_filename(&self) -> String {
        let suffix = match self.variant {
            AssetVariant::Original => "",
            AssetVariant::Edited => "-edited",
            AssetVariant::Live => "-live",
        };
        format!(
            "{}{}.{}",
            self.original_filename,
            suffix,
            self.file_type.extension()
        )
    }

    /// Checks whether a disk timestamp matches this asset's modification
    /// time within [`MODIFIED_TOLERANCE_MS`]
    #[must_use]
    pub fn modified_within_tolerance(&self, other_ms: i64) -> bool {
        (self.modified_at - other_ms).abs() <= MODIFIED_TOLERANCE_MS
    }
}

impl LibraryEntity for Asset {
    fn uuid(&self) -> String {
        self.checksum.to_base64()
    }

    fn display_name(&self) -> String {
        self.checksum.to_base64()
    }

    fn matches(&self, other: &Self) -> bool {
        self.checksum == other.checksum
            && self.file_type == other.file_type
            && self.size == other.size
            && self.modified_within_tolerance(other.modified_at)
    }
}
