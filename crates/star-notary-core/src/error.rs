//! Error types for the Star Notary Core.

use thiserror::Error;

use crate::block::StarViolation;

/// Core errors that can occur while handling blocks, hashes and keys.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("story is not valid UTF-8 after hex decoding")]
    StoryNotUtf8,

    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("invalid star: {} violation(s)", .0.len())]
    InvalidStar(Vec<StarViolation>),
}
