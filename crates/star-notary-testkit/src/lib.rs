//! # Star Notary Testkit
//!
//! Testing utilities for the Star Notary.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: pinned canonical encodings for block hashing
//! - **Generators**: proptest strategies for stars, hashes and linked chains
//! - **Fixtures**: a notary over a memory store with a manual clock and
//!   deterministic wallets
//!
//! ## Golden Vectors
//!
//! ```rust
//! use star_notary_testkit::vectors::{all_vectors, block_from_vector};
//!
//! for vector in all_vectors() {
//!     let block = block_from_vector(&vector);
//!     println!("{}: {}", vector.name, block.hash.to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use star_notary_core::verify_block;
//! use star_notary_testkit::generators::linked_chain;
//!
//! proptest! {
//!     #[test]
//!     fn sealed_blocks_verify(chain in linked_chain(8)) {
//!         prop_assert!(chain.iter().all(verify_block));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use star_notary_testkit::fixtures::{bitcoin_wallet, NotaryFixture};
//!
//! let fx = NotaryFixture::new().await;
//! let block = fx.register(&bitcoin_wallet(1), "first light").await?;
//! assert_eq!(block.height, 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    bitcoin_wallet, bitcoin_wallets, ed25519_wallet, sample_star, AcceptAllVerifier,
    NotaryFixture,
};
pub use generators::{linked_chain, valid_star_input};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
