//! The Notary: the operations a transport exposes.
//!
//! Composes the registry and the chain. It adds no validation of its own; it
//! delegates and shapes results into views.

use std::sync::Arc;

use star_notary_core::{Block, BlockHash, SignatureVerifier, StarInput, WalletVerifier};
use star_notary_store::BlockStore;

use crate::chain::{Chain, ChainFault};
use crate::clock::{Clock, SystemClock};
use crate::config::NotaryConfig;
use crate::error::Result;
use crate::registry::{ValidationRegistry, ValidationRequest};
use crate::response::{BlockView, SignatureValidation};

/// The main Notary struct.
///
/// `Send + Sync`; share it across tasks as `Arc<Notary<S>>`.
pub struct Notary<S: BlockStore> {
    chain: Chain<S>,
    registry: Arc<ValidationRegistry>,
    config: NotaryConfig,
}

impl<S: BlockStore> Notary<S> {
    /// Open a notary over `store` with wallet signatures and wall-clock time.
    pub async fn open(store: S, config: NotaryConfig) -> Result<Self> {
        Self::open_with(store, config, Arc::new(WalletVerifier::new()), Arc::new(SystemClock)).await
    }

    /// Open a notary with an explicit verifier and clock.
    pub async fn open_with(
        store: S,
        config: NotaryConfig,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(ValidationRegistry::new(verifier, clock.clone(), &config));
        let chain = Chain::open(Arc::new(store), registry.clone(), clock, &config).await?;
        Ok(Self {
            chain,
            registry,
            config,
        })
    }

    pub fn chain(&self) -> &Chain<S> {
        &self.chain
    }

    pub fn registry(&self) -> &ValidationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Open (or report) the signing window for `address`.
    pub fn request_validation(&self, address: &str) -> ValidationRequest {
        self.registry.request_validation(address)
    }

    /// Submit the wallet's signature over its challenge message.
    pub fn validate_signature(&self, address: &str, signature: &str) -> Result<SignatureValidation> {
        let status = self.registry.validate(address, signature)?;
        Ok(SignatureValidation {
            register_star: true,
            status,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a star for a validated address.
    pub async fn add_block(&self, address: &str, star: &StarInput) -> Result<BlockView> {
        let block = self.chain.append_block(address, star).await?;
        Ok(self.view(&block))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up a block by its hex hash.
    pub async fn get_block_by_hash(&self, hash: &str) -> Result<BlockView> {
        let hash = BlockHash::from_hex(hash.trim())?;
        let block = self.chain.store().get_by_hash(&hash).await?;
        Ok(self.view(&block))
    }

    /// Every block registered by `address`, ascending height.
    pub async fn get_blocks_by_address(&self, address: &str) -> Result<Vec<BlockView>> {
        let blocks = self.chain.store().get_by_address(address).await?;
        tracing::debug!(address, count = blocks.len(), "blocks by address");
        Ok(blocks.iter().map(|b| self.view(b)).collect())
    }

    /// The block at `height`.
    pub async fn get_block(&self, height: u64) -> Result<BlockView> {
        let block = self.chain.store().get_by_height(height).await?;
        Ok(self.view(&block))
    }

    /// Current head height, `None` for an empty store.
    ///
    /// An opened notary always holds genesis, so this is `Some` unless the
    /// store was emptied underneath it.
    pub async fn height(&self) -> Result<Option<u64>> {
        Ok(self.chain.store().head_height().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Integrity
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn verify_chain(&self) -> Result<Vec<u64>> {
        self.chain.verify_chain().await
    }

    pub async fn audit_chain(&self) -> Result<Vec<ChainFault>> {
        self.chain.audit_chain().await
    }

    fn view(&self, block: &Block) -> BlockView {
        if !self.config.verify_on_read {
            return BlockView::new(block, None);
        }
        let verified = self.chain.verify_block(block);
        if !verified {
            tracing::warn!(height = block.height, hash = %block.hash, "stored block fails hash check");
        }
        BlockView::new(block, Some(verified))
    }
}
