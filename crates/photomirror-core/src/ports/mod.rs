//! Ports (interfaces) between the sync core and its adapters

pub mod remote_library;

pub use remote_library::{
    AssetStream, RemoteAlbumAsset, RemoteAlbumRecord, RemoteAssetRecord, RemoteLibrary,
};
