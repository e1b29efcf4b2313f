//! Write ordering for album queues
//!
//! Album additions must be applied parent-before-child (a child's parent
//! directory has to exist first) and deletions in the reverse order
//! (deepest first, so the non-empty-directory guard never fires on a
//! parent that still has children). The comparator below defines that
//! order; it is only a partial order when ancestor chains are broken, so
//! sorting uses a plain insertion sort and verifies the result instead
//! of relying on the standard library's total-order requirement.

use std::cmp::Ordering;

use tracing::warn;

use photomirror_core::domain::{Album, LibraryEntities, LibraryEntity};

use crate::error::ReconError;

/// Compares two albums for write order, resolving ancestry through `albums`
///
/// An ancestor always sorts before its descendants; unrelated albums are
/// ordered by their distance to the root, shallower first. Albums whose
/// depth cannot be computed (broken ancestor chain) compare as equal, so
/// a single anomaly does not fail the whole sort.
#[must_use]
pub fn compare_albums(a: &Album, b: &Album, albums: &LibraryEntities<Album>) -> Ordering {
    if a.uuid() == b.uuid() {
        return Ordering::Equal;
    }
    if a.has_ancestor(&b.uuid(), albums) {
        return Ordering::Greater;
    }
    if b.has_ancestor(&a.uuid(), albums) {
        return Ordering::Less;
    }
    match (a.distance_to_root(albums), b.distance_to_root(albums)) {
        (Some(da), Some(db)) => da.cmp(&db),
        _ => Ordering::Equal,
    }
}

/// Sorts a queue into parent-before-child order
///
/// # Errors
/// Returns [`ReconError::QueueNotSorted`] when the sorted result still
/// places a descendant before one of its ancestors, which indicates a
/// cyclic or otherwise corrupted parent structure.
pub fn sort_queue(mut queue: Vec<Album>) -> Result<Vec<Album>, ReconError> {
    let albums: LibraryEntities<Album> =
        queue.iter().map(|a| (a.uuid(), a.clone())).collect();

    // Insertion sort: stable and well defined for a partial order, where
    // the standard sort may reject a non-total comparator.
    for i in 1..queue.len() {
        let mut j = i;
        while j > 0 && compare_albums(&queue[j - 1], &queue[j], &albums) == Ordering::Greater {
            queue.swap(j - 1, j);
            j -= 1;
        }
    }

    if !queue_is_sorted(&queue, &albums) {
        warn!("album queue failed post-sort verification");
        return Err(ReconError::QueueNotSorted);
    }
    Ok(queue)
}

/// Whether every album appears after all of its ancestors in `queue`
#[must_use]
pub fn queue_is_sorted(queue: &[Album], albums: &LibraryEntities<Album>) -> bool {
    queue.iter().enumerate().all(|(i, album)| {
        queue[i + 1..]
            .iter()
            .all(|later| !album.has_ancestor(&later.uuid(), albums))
    })
}

/// Number of parent hops from `album` to the library root
///
/// # Errors
/// Returns [`ReconError::NoRootLink`] when the chain never reaches the
/// root, either because a parent is missing from `albums` or because the
/// chain is cyclic. Outside a sort context this is fatal: it signals
/// corrupted local state.
pub fn distance_to_root(
    album: &Album,
    albums: &LibraryEntities<Album>,
) -> Result<usize, ReconError> {
    album
        .distance_to_root(albums)
        .ok_or_else(|| ReconError::NoRootLink(album.uuid()))
}
