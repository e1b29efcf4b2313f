//! photomirror Core - Domain model and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Asset`, `Album`, `FileType`, `Checksum` and the
//!   generic `LibraryEntity` abstraction over both entity kinds
//! - **Processing queues** - The delete/add/keep triple produced by the
//!   reconciliation engine once per sync cycle and entity kind
//! - **Port definitions** - The `RemoteLibrary` trait behind which the
//!   network/auth adapter lives
//! - **Configuration** - Typed YAML configuration for the data directory,
//!   download concurrency and remote deletion flag
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O. The port
//! defines the trait interface the remote adapter implements. The storage
//! model and sync orchestrator live in sibling crates and consume this one.

pub mod config;
pub mod domain;
pub mod ports;
