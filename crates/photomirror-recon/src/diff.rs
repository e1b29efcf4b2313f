//! State diffing
//!
//! Computes the delete/add/keep queues for one entity kind from the
//! remote snapshot and the local library map. The same generic function
//! serves assets and albums; album queues additionally go through
//! [`crate::hierarchy::resolve_hierarchical_dependencies`] afterwards.

use tracing::debug;

use photomirror_core::domain::{LibraryEntities, LibraryEntity, ProcessingQueues};

/// Diffs the remote snapshot against the local map
///
/// Every remote entity lands in `to_keep` when its local counterpart is
/// current, otherwise in `to_add`; in both cases local-only state is
/// merged onto the remote entity via [`LibraryEntity::apply_local`] and
/// the local entity is consumed, so it can never also be deleted. Local
/// entities with no remote counterpart end up in `to_delete`.
///
/// The queues partition the union of remote and local identities: every
/// UUID appears in exactly one queue.
#[must_use]
pub fn processing_queues<T: LibraryEntity>(
    remote: Vec<T>,
    local: &LibraryEntities<T>,
) -> ProcessingQueues<T> {
    let mut remaining: LibraryEntities<T> = local.clone();
    let mut queues = ProcessingQueues::new();

    for remote_entity in remote {
        match remaining.remove(&remote_entity.uuid()) {
            Some(local_entity) if remote_entity.matches(&local_entity) => {
                queues.to_keep.push(remote_entity.apply_local(&local_entity));
            }
            Some(local_entity) => {
                queues.to_add.push(remote_entity.apply_local(&local_entity));
            }
            None => {
                queues.to_add.push(remote_entity);
            }
        }
    }

    queues.to_delete.extend(remaining.into_values());

    debug!(
        to_delete = queues.to_delete.len(),
        to_add = queues.to_add.len(),
        to_keep = queues.to_keep.len(),
        "computed processing queues"
    );
    queues
}
