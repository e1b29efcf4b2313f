//! Ancestor-deletion repair for album queues
//!
//! A kept album can be identical to its previous local version yet still
//! require a physical move, because an ancestor further up the chain is
//! being deleted and recreated. The shallow per-entity diff cannot see
//! this, so a dedicated pass cross-references the delete queue against
//! every kept album's ancestor chain.

use std::collections::HashSet;

use tracing::debug;

use photomirror_core::domain::{Album, LibraryEntities, LibraryEntity, ProcessingQueues};

/// Moves kept albums whose ancestor is physically going away into
/// delete + add
///
/// An ancestor goes away either because it is in the delete queue or
/// because it is in the add queue while a stale local pair exists: the
/// write path replaces such a pair, destroying everything nested inside
/// it. Ancestry is walked through the local map snapshot and tested
/// against those sets as they stood before this pass, so a single pass
/// suffices: every kept descendant of a vanishing ancestor is caught
/// directly, regardless of processing order. A gap in the parent chain
/// (dangling parent UUID) simply ends the walk.
#[must_use]
pub fn resolve_hierarchical_dependencies(
    mut queues: ProcessingQueues<Album>,
    local: &LibraryEntities<Album>,
) -> ProcessingQueues<Album> {
    let deleted_uuids: HashSet<String> = queues
        .to_delete
        .iter()
        .map(LibraryEntity::uuid)
        .chain(
            queues
                .to_add
                .iter()
                .map(LibraryEntity::uuid)
                .filter(|uuid| local.contains_key(uuid)),
        )
        .collect();
    if deleted_uuids.is_empty() {
        return queues;
    }

    let mut kept = Vec::with_capacity(queues.to_keep.len());
    for album in queues.to_keep.drain(..) {
        let moved = deleted_uuids
            .iter()
            .any(|deleted| album.has_ancestor(deleted, local));
        if moved {
            debug!(uuid = %album.uuid(), name = %album.display_name(), "ancestor deleted, album must move");
            queues.to_delete.push(album.clone());
            queues.to_add.push(album);
        } else {
            kept.push(album);
        }
    }
    queues.to_keep = kept;
    queues
}
