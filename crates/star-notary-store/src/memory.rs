//! In-memory implementation of the BlockStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use star_notary_core::{Block, BlockHash};

use crate::error::{Result, StoreError};
use crate::traits::{next_height, BlockStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Blocks indexed by height.
    blocks: Vec<Block>,

    /// Hash index: hash -> height.
    by_hash: HashMap<BlockHash, u64>,

    /// Owner index: address -> heights, ascending.
    by_address: HashMap<String, Vec<u64>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }

    /// Overwrite a stored block in place, bypassing every check.
    ///
    /// Exists only to simulate on-disk corruption in integrity tests.
    #[doc(hidden)]
    pub fn tamper(&self, height: u64, f: impl FnOnce(&mut Block)) -> Result<()> {
        let mut inner = self.write()?;
        let block = inner
            .blocks
            .get_mut(height as usize)
            .ok_or_else(|| StoreError::NotFound(format!("height {}", height)))?;
        f(block);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn append(&self, block: &Block) -> Result<()> {
        let mut inner = self.write()?;

        let expected = next_height(inner.blocks.len().checked_sub(1).map(|h| h as u64));
        if block.height != expected {
            return Err(StoreError::HeightConflict {
                expected,
                got: block.height,
            });
        }
        if inner.by_hash.contains_key(&block.hash) {
            return Err(StoreError::InvalidData(format!(
                "duplicate block hash {}",
                block.hash
            )));
        }

        inner.by_hash.insert(block.hash, block.height);
        if let Some(address) = block.address() {
            inner
                .by_address
                .entry(address.to_string())
                .or_default()
                .push(block.height);
        }
        inner.blocks.push(block.clone());

        Ok(())
    }

    async fn get_by_height(&self, height: u64) -> Result<Block> {
        let inner = self.read()?;
        inner
            .blocks
            .get(height as usize)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("height {}", height)))
    }

    async fn get_by_hash(&self, hash: &BlockHash) -> Result<Block> {
        let inner = self.read()?;
        inner
            .by_hash
            .get(hash)
            .and_then(|&height| inner.blocks.get(height as usize))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("hash {}", hash)))
    }

    async fn get_by_address(&self, address: &str) -> Result<Vec<Block>> {
        let inner = self.read()?;
        Ok(inner
            .by_address
            .get(address)
            .map(|heights| {
                heights
                    .iter()
                    .filter_map(|&h| inner.blocks.get(h as usize).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn head_height(&self) -> Result<Option<u64>> {
        let inner = self.read()?;
        Ok(inner.blocks.len().checked_sub(1).map(|h| h as u64))
    }

    async fn blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        let inner = self.read()?;
        Ok(inner
            .blocks
            .iter()
            .filter(|b| b.height >= start && b.height <= end)
            .cloned()
            .collect())
    }
}
