//! # Star Notary Core
//!
//! Pure primitives for the Star Notary: blocks, canonical encoding, and
//! wallet signature verification.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over the ledger's data structures.
//!
//! ## Key Types
//!
//! - [`Block`] - One entry of the append-only, hash-linked ledger
//! - [`BlockHash`] - Content hash of a block (Blake3 over canonical bytes)
//! - [`Star`] / [`StarInput`] - The registered claim, stored and submitted forms
//! - [`WalletAddress`] - A parsed wallet address (Bitcoin P2PKH or Ed25519)
//! - [`SignatureVerifier`] - Checks a wallet signature over a challenge message
//!
//! ## Canonicalization
//!
//! Block hashes are computed over deterministic CBOR. See [`canonical`] module.

pub mod address;
pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;
pub mod verifier;
pub mod wallet;

pub use address::{BitcoinNetwork, WalletAddress};
pub use block::{Block, BlockBody, BlockBuilder, Star, StarField, StarInput, StarViolation};
pub use canonical::canonical_block_bytes;
pub use crypto::{Ed25519PublicKey, Ed25519Signature};
pub use error::CoreError;
pub use types::BlockHash;
pub use validation::{validate_star, verify_block, verify_link, DEFAULT_MAX_STORY_BYTES};
pub use verifier::{SignatureVerifier, WalletVerifier};
pub use wallet::{BitcoinKeypair, Keypair, WalletSigner};
