//! # Star Notary Store
//!
//! Storage abstraction for the Star Notary. Provides a trait-based interface
//! for the append-only block log with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`BlockStore`] trait keeps the chain manager storage-agnostic. The
//! primary implementation is [`SqliteStore`], with [`MemoryStore`] for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use star_notary_core::Block;
//! use star_notary_store::{BlockStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("notary.db").unwrap();
//!     if store.head_height().await.unwrap().is_none() {
//!         store.append(&Block::genesis(1_700_000_000)).await.unwrap();
//!     }
//!     let genesis = store.get_by_height(0).await.unwrap();
//!     assert!(genesis.is_genesis());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Compare-and-append**: `append` only accepts the block at `head + 1`
//!   and reports `HeightConflict` otherwise.
//! - **Append-only**: there is no update or delete.
//! - **Raw retrieval**: blocks come back exactly as persisted; integrity checks
//!   belong to the caller.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::BlockStore;
