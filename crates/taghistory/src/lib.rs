//! # Taghistory Architecture
//!
//! Taghistory tracks the **named, versioned snapshots** ("tags") of a
//! content-addressed repository. Each tag points at the root hash of the
//! filesystem tree published at one revision, and tags are grouped into
//! release channels so clients can resolve "latest production" without knowing
//! a revision number.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  History Facade (history.rs)                                │
//! │  - Load, mutate, store inside one transaction               │
//! │  - Aborts on any failure                                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Tag List (tag_list.rs)                                     │
//! │  - Pure in-memory algorithms: lookup, insert, rollback,     │
//! │    channel heads, referenced hashes                         │
//! │  - No I/O whatsoever                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract TagStore trait                                  │
//! │  - SqliteStore, JsonStore (production), MemoryStore (tests) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Algorithms Never Touch Storage
//!
//! [`tag_list::TagList`] is a plain value. It is filled from a store by
//! `load`, edited in memory, and written back whole by `store`. There is no
//! incremental diffing, which keeps rollback and channel-head computation
//! total functions over a small collection, testable without any store.
//!
//! ## Garbage Collection Contract
//!
//! [`tag_list::TagList::referenced_hashes`] is the authoritative list of root
//! hashes still reachable from surviving tags, newest first. Anything the
//! content store holds that is not reachable from one of these roots may be
//! reclaimed.
//!
//! ## Module Overview
//!
//! - [`history`]: Transactional facade over a store
//! - [`tag_list`]: The in-memory tag collection and its queries
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types (`Tag`, `UpdateChannel`)
//! - [`hash`]: Opaque root hash type
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod hash;
pub mod history;
pub mod model;
pub mod store;
pub mod tag_list;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use error::{HistoryError, Result};
pub use hash::RootHash;
pub use history::History;
pub use model::{Tag, UpdateChannel};
pub use store::{Backend, TagStore};
pub use tag_list::{ChannelTag, TagList};
