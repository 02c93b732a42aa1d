//! BlockStore trait: the abstract interface for block persistence.
//!
//! This trait allows the chain manager to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use star_notary_core::{Block, BlockHash};

use crate::error::Result;

/// The BlockStore trait: async interface for the append-only block log.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - Reads see whole blocks only, never a partially written one.
/// - `append` is a compare-and-append on the expected height, so a writer that
///   computed its block from a stale head is rejected rather than overwriting.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Persist a block at `head + 1` (or 0 for an empty store).
    ///
    /// Returns `HeightConflict` for any other height. The block is durable
    /// when this returns `Ok`.
    async fn append(&self, block: &Block) -> Result<()>;

    /// Get the block at a height. `NotFound` if out of range.
    async fn get_by_height(&self, height: u64) -> Result<Block>;

    /// Get a block by its hash. `NotFound` if absent.
    async fn get_by_hash(&self, hash: &BlockHash) -> Result<Block>;

    /// All blocks owned by `address`, ascending height. Empty if none.
    async fn get_by_address(&self, address: &str) -> Result<Vec<Block>>;

    /// Height of the head block, `None` for an empty store.
    async fn head_height(&self) -> Result<Option<u64>>;

    /// Blocks with `start <= height <= end`, ascending.
    async fn blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>>;

    /// The head block, `None` for an empty store.
    async fn head(&self) -> Result<Option<Block>> {
        match self.head_height().await? {
            Some(height) => Ok(Some(self.get_by_height(height).await?)),
            None => Ok(None),
        }
    }

    /// Number of stored blocks.
    async fn len(&self) -> Result<u64> {
        Ok(self.head_height().await?.map_or(0, |h| h + 1))
    }

    /// Whether the store holds no blocks.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.head_height().await?.is_none())
    }
}

/// Height the next append must carry.
pub(crate) fn next_height(head: Option<u64>) -> u64 {
    head.map_or(0, |h| h + 1)
}
