//! Domain entities and value types
//!
//! Pure data structures with no I/O: assets, albums, the shared entity
//! abstraction and the error/warning taxonomy used across the workspace.

pub mod album;
pub mod asset;
pub mod entity;
pub mod errors;
pub mod file_type;
pub mod warning;

pub use album::{Album, AlbumKind};
pub use asset::{Asset, AssetVariant, Checksum, Zone, MODIFIED_TOLERANCE_MS};
pub use entity::{LibraryEntities, LibraryEntity, ProcessingQueues};
pub use errors::LibraryError;
pub use file_type::FileType;
pub use warning::Warning;
