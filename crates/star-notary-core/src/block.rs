//! Block: one entry of the append-only star ledger.
//!
//! A block is immutable once sealed. Its hash covers every field except the
//! hash itself; see [`canonical`](crate::canonical) for the exact bytes.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_block_bytes;
use crate::error::CoreError;
use crate::types::BlockHash;

/// A registered star, in its stored form.
///
/// `story` holds the lowercase hex of the UTF-8 story text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    pub ra: String,
    pub dec: String,
    pub story: String,
    pub magnitude: Option<String>,
    pub constellation: Option<String>,
}

impl Star {
    /// Decode the hex story back to text.
    pub fn decoded_story(&self) -> Result<String, CoreError> {
        let bytes = hex::decode(&self.story)?;
        String::from_utf8(bytes).map_err(|_| CoreError::StoryNotUtf8)
    }
}

/// A star as submitted by a client. Every field is optional so that missing
/// ones can be reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarInput {
    pub ra: Option<String>,
    pub dec: Option<String>,
    pub story: Option<String>,
    pub magnitude: Option<String>,
    pub constellation: Option<String>,
}

impl StarInput {
    /// Input with the three required fields set.
    pub fn new(ra: impl Into<String>, dec: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            ra: Some(ra.into()),
            dec: Some(dec.into()),
            story: Some(story.into()),
            ..Self::default()
        }
    }

    /// Set the magnitude.
    pub fn magnitude(mut self, magnitude: impl Into<String>) -> Self {
        self.magnitude = Some(magnitude.into());
        self
    }

    /// Set the constellation.
    pub fn constellation(mut self, constellation: impl Into<String>) -> Self {
        self.constellation = Some(constellation.into());
        self
    }
}

/// A star field that can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StarField {
    Ra,
    Dec,
    Story,
}

/// Why a submitted star was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "camelCase")]
pub enum StarViolation {
    /// A required field is absent or blank.
    Missing { field: StarField },
    /// The field exceeds its byte limit.
    #[serde(rename_all = "camelCase")]
    TooLong {
        field: StarField,
        limit: usize,
        actual: usize,
    },
}

impl StarViolation {
    /// The field this violation is about.
    pub fn field(&self) -> StarField {
        match self {
            Self::Missing { field } | Self::TooLong { field, .. } => *field,
        }
    }
}

/// The payload of a non-genesis block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// Wallet address that owns the star.
    pub address: String,
    pub star: Star,
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub height: u64,

    /// Creation time (Unix seconds).
    pub time: i64,

    /// Hash of the predecessor (None for genesis).
    pub previous_block_hash: Option<BlockHash>,

    /// Star registration (None for genesis).
    pub body: Option<BlockBody>,

    /// Hash over all of the above.
    pub hash: BlockHash,
}

impl Block {
    /// Build the genesis block.
    pub fn genesis(time: i64) -> Self {
        BlockBuilder::new(0).time(time).seal()
    }

    /// Recompute the hash from the block's fields, ignoring the stored hash.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash::digest(&canonical_block_bytes(self))
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Owning address, if any.
    pub fn address(&self) -> Option<&str> {
        self.body.as_ref().map(|b| b.address.as_str())
    }

    /// The embedded star, if any.
    pub fn star(&self) -> Option<&Star> {
        self.body.as_ref().map(|b| &b.star)
    }
}

/// Builder for sealing blocks.
pub struct BlockBuilder {
    height: u64,
    time: i64,
    previous_block_hash: Option<BlockHash>,
    body: Option<BlockBody>,
}

impl BlockBuilder {
    /// Start building a block at the given height.
    pub fn new(height: u64) -> Self {
        Self {
            height,
            time: 0,
            previous_block_hash: None,
            body: None,
        }
    }

    /// Start building the successor of `prev`.
    pub fn on_top_of(prev: &Block) -> Self {
        Self::new(prev.height + 1).previous(prev.hash)
    }

    /// Set the time.
    pub fn time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Set the previous block hash.
    pub fn previous(mut self, hash: BlockHash) -> Self {
        self.previous_block_hash = Some(hash);
        self
    }

    /// Set the body.
    pub fn body(mut self, address: impl Into<String>, star: Star) -> Self {
        self.body = Some(BlockBody {
            address: address.into(),
            star,
        });
        self
    }

    /// Fix all fields, then compute and store the hash.
    pub fn seal(self) -> Block {
        let mut block = Block {
            height: self.height,
            time: self.time,
            previous_block_hash: self.previous_block_hash,
            body: self.body,
            hash: BlockHash::from_bytes([0u8; 32]),
        };
        block.hash = block.compute_hash();
        block
    }
}
