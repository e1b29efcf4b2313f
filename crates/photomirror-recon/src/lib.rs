//! photomirror Reconciliation Engine
//!
//! Pure, I/O-free state reconciliation: given a remote snapshot and the
//! local library map, this crate computes the delete/add/keep queues,
//! repairs the album queues for structural moves caused by ancestor
//! deletion, and linearizes album writes so parents are always created
//! before their children (and deleted after them).
//!
//! All functions here operate on immutable snapshots and return new
//! queues; nothing in this crate touches the filesystem or the network.

pub mod diff;
pub mod error;
pub mod hierarchy;
pub mod order;

pub use diff::processing_queues;
pub use error::ReconError;
pub use hierarchy::resolve_hierarchical_dependencies;
pub use order::{distance_to_root, queue_is_sorted, sort_queue};
