//! Shared entity abstraction
//!
//! Assets and albums are reconciled by the same generic diff, so both
//! implement [`LibraryEntity`]: a stable identity, a display name for
//! logging, and an equality check that decides whether a local copy is
//! still current.

use std::collections::HashMap;

/// A keyed collection of entities, indexed by [`LibraryEntity::uuid`]
pub type LibraryEntities<T> = HashMap<String, T>;

/// Common behavior of reconcilable library entities
pub trait LibraryEntity: Clone {
    /// Stable identity of the entity (checksum for assets, UUID for albums)
    fn uuid(&self) -> String;

    /// Human readable name for logs and warnings
    fn display_name(&self) -> String;

    /// Whether the local entity is an up-to-date rendition of the remote one
    fn matches(&self, other: &Self) -> bool;

    /// Carries local-only state from the previous local entity onto the
    /// remote one before it is kept. The default keeps the remote entity
    /// unchanged.
    #[must_use]
    fn apply_local(self, _local: &Self) -> Self {
        self
    }
}

/// The outcome of diffing remote state against local state
#[derive(Debug, Clone, Default)]
pub struct ProcessingQueues<T> {
    /// Local entities with no current remote counterpart
    pub to_delete: Vec<T>,
    /// Remote entities missing or outdated locally
    pub to_add: Vec<T>,
    /// Remote entities whose local copy is already current
    pub to_keep: Vec<T>,
}

impl<T> ProcessingQueues<T> {
    /// Creates empty queues
    #[must_use]
    pub fn new() -> Self {
        Self {
            to_delete: Vec::new(),
            to_add: Vec::new(),
            to_keep: Vec::new(),
        }
    }

    /// Total number of queued entities across all three queues
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_add.len() + self.to_keep.len()
    }

    /// Whether all three queues are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty() && self.to_keep.is_empty()
    }
}
