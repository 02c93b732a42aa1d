//! Chain manager: builds blocks on the head and audits linkage.
//!
//! Appends are serialized by an async mutex owned by the chain, so "read head,
//! seal, append" is one critical section. The store's compare-and-append on
//! height is a second line of enforcement.

use std::sync::Arc;

use serde::Serialize;
use star_notary_core::{
    validate_star, verify_block, Block, BlockBuilder, BlockHash, CoreError, StarInput,
};
use star_notary_store::BlockStore;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::NotaryConfig;
use crate::error::{NotaryError, Result};
use crate::registry::ValidationRegistry;

/// Blocks read per store round-trip during an audit.
const AUDIT_PAGE: u64 = 256;

/// One integrity problem found by [`Chain::audit_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "fault", rename_all = "camelCase")]
pub enum ChainFault {
    /// Stored hash differs from the recomputed one.
    #[serde(rename_all = "camelCase")]
    HashMismatch {
        height: u64,
        stored: BlockHash,
        computed: BlockHash,
    },

    /// `previousBlockHash` does not match the predecessor's stored hash.
    #[serde(rename_all = "camelCase")]
    BrokenLink {
        height: u64,
        expected: BlockHash,
        found: Option<BlockHash>,
    },

    /// Block 0 carries a payload or a previous hash.
    GenesisMalformed { height: u64 },
}

impl ChainFault {
    pub fn height(&self) -> u64 {
        match self {
            Self::HashMismatch { height, .. }
            | Self::BrokenLink { height, .. }
            | Self::GenesisMalformed { height } => *height,
        }
    }
}

/// The ledger: a block store plus the write path that extends it.
pub struct Chain<S: BlockStore> {
    store: Arc<S>,
    registry: Arc<ValidationRegistry>,
    clock: Arc<dyn Clock>,
    max_story_bytes: usize,
    write_lock: Mutex<()>,
}

impl<S: BlockStore> Chain<S> {
    /// Wrap `store`, writing the genesis block if it is empty.
    pub async fn open(
        store: Arc<S>,
        registry: Arc<ValidationRegistry>,
        clock: Arc<dyn Clock>,
        config: &NotaryConfig,
    ) -> Result<Self> {
        let chain = Self {
            store,
            registry,
            clock,
            max_story_bytes: config.max_story_bytes,
            write_lock: Mutex::new(()),
        };

        {
            let _guard = chain.write_lock.lock().await;
            chain.head_or_genesis().await?;
        }
        Ok(chain)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register `input` for `address` in a new block on the head.
    ///
    /// Consumes the address's validated authorization. If the store rejects
    /// the block, the authorization is put back.
    pub async fn append_block(&self, address: &str, input: &StarInput) -> Result<Block> {
        if !self.registry.is_authorized(address) {
            return Err(NotaryError::Unauthorized(address.to_string()));
        }

        let star = validate_star(input, self.max_story_bytes).map_err(CoreError::InvalidStar)?;

        let _guard = self.write_lock.lock().await;

        let head = self.head_or_genesis().await?;
        let block = BlockBuilder::on_top_of(&head)
            .time(self.clock.now())
            .body(address, star)
            .seal();

        // No await between taking the authorization and starting the append.
        // Another caller may have used it since the check above.
        let authorization = self
            .registry
            .take(address)
            .ok_or_else(|| NotaryError::Unauthorized(address.to_string()))?;

        if let Err(e) = self.store.append(&block).await {
            tracing::warn!(address, height = block.height, error = %e, "block append failed");
            self.registry.reinstate(authorization);
            return Err(e.into());
        }

        tracing::info!(address, height = block.height, hash = %block.hash, "star registered");
        Ok(block)
    }

    /// Recompute `block`'s hash and compare it with the stored one.
    pub fn verify_block(&self, block: &Block) -> bool {
        verify_block(block)
    }

    /// Walk the whole chain and report every integrity fault, in height order.
    pub async fn audit_chain(&self) -> Result<Vec<ChainFault>> {
        let mut faults = Vec::new();
        let Some(head) = self.store.head_height().await? else {
            return Ok(faults);
        };

        let mut prev: Option<Block> = None;
        let mut start = 0;
        while start <= head {
            let end = start.saturating_add(AUDIT_PAGE - 1).min(head);
            for block in self.store.blocks_range(start, end).await? {
                audit_block(prev.as_ref(), &block, &mut faults);
                prev = Some(block);
            }
            start = end + 1;
        }

        if !faults.is_empty() {
            tracing::warn!(faults = faults.len(), "chain audit found faults");
        }
        Ok(faults)
    }

    /// Heights that failed validation, ascending and de-duplicated.
    pub async fn verify_chain(&self) -> Result<Vec<u64>> {
        let mut heights: Vec<u64> = self
            .audit_chain()
            .await?
            .iter()
            .map(ChainFault::height)
            .collect();
        heights.sort_unstable();
        heights.dedup();
        Ok(heights)
    }

    /// The head block; writes genesis first on an empty store.
    ///
    /// Callers must hold the write lock.
    async fn head_or_genesis(&self) -> Result<Block> {
        if let Some(head) = self.store.head().await? {
            return Ok(head);
        }
        let genesis = Block::genesis(self.clock.now());
        self.store.append(&genesis).await?;
        tracing::info!(hash = %genesis.hash, "genesis block created");
        Ok(genesis)
    }
}

fn audit_block(prev: Option<&Block>, block: &Block, faults: &mut Vec<ChainFault>) {
    let computed = block.compute_hash();
    if computed != block.hash {
        faults.push(ChainFault::HashMismatch {
            height: block.height,
            stored: block.hash,
            computed,
        });
    }

    match prev {
        None => {
            if block.previous_block_hash.is_some() || block.body.is_some() {
                faults.push(ChainFault::GenesisMalformed {
                    height: block.height,
                });
            }
        }
        Some(prev) => {
            if block.previous_block_hash != Some(prev.hash) {
                faults.push(ChainFault::BrokenLink {
                    height: block.height,
                    expected: prev.hash,
                    found: block.previous_block_hash,
                });
            }
        }
    }
}
