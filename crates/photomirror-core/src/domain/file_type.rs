//! File type table
//!
//! The remote backend describes asset content with an opaque descriptor
//! string; locally the same information is carried by the file extension.
//! The table below is the fixed, known mapping between the two. It is
//! incomplete by nature (the backend is undocumented), so both lookup
//! directions fail with a domain error for unknown values instead of
//! guessing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::LibraryError;

/// The content type of an asset, as derivable from the remote descriptor
/// or from a local file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Png,
    Mp4,
    Jpeg,
    Mov,
    Heic,
    Arw,
    Webp,
}

/// Descriptor/extension pairs for every known file type
const FILE_TYPE_TABLE: &[(FileType, &str, &str)] = &[
    (FileType::Png, "public.png", "png"),
    (FileType::Mp4, "public.mpeg-4", "mp4"),
    (FileType::Jpeg, "public.jpeg", "jpeg"),
    (FileType::Mov, "com.apple.quicktime-movie", "mov"),
    (FileType::Heic, "public.heic", "heic"),
    (FileType::Arw, "com.sony.arw-raw-image", "arw"),
    (FileType::Webp, "org.webmproject.webp", "webp"),
];

impl FileType {
    /// Resolves a backend-provided descriptor into a file type
    ///
    /// # Errors
    /// Returns [`LibraryError::UnknownDescriptor`] for descriptors outside
    /// the known table.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, LibraryError> {
        FILE_TYPE_TABLE
            .iter()
            .find(|(_, d, _)| *d == descriptor)
            .map(|(t, _, _)| *t)
            .ok_or_else(|| LibraryError::UnknownDescriptor(descriptor.to_string()))
    }

    /// Resolves a file extension (with or without leading dot) into a file type
    ///
    /// # Errors
    /// Returns [`LibraryError::UnknownExtension`] for extensions outside
    /// the known table.
    pub fn from_extension(extension: &str) -> Result<Self, LibraryError> {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        FILE_TYPE_TABLE
            .iter()
            .find(|(_, _, e)| *e == ext)
            .map(|(t, _, _)| *t)
            .ok_or_else(|| LibraryError::UnknownExtension(extension.to_string()))
    }

    /// Returns the backend descriptor for this file type
    #[must_use]
    pub fn descriptor(&self) -> &'static str {
        FILE_TYPE_TABLE
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, d, _)| *d)
            .unwrap_or("")
    }

    /// Returns the file extension (without leading dot) for this file type
    #[must_use]
    pub fn extension(&self) -> &'static str {
        FILE_TYPE_TABLE
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, _, e)| *e)
            .unwrap_or("")
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
