//! # Star Notary
//!
//! Register ownership of stars in an append-only, hash-linked ledger after
//! proving control of a wallet address.
//!
//! ## Overview
//!
//! A client asks for a validation window, signs the challenge message with
//! its wallet, and submits the signature. A validated address may then
//! register exactly one star before its grace period runs out. Each
//! registration becomes a block linked to its predecessor by hash.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use star_notary::{Notary, NotaryConfig};
//! use star_notary::core::{Keypair, StarInput, WalletSigner};
//! use star_notary::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("notary.db").unwrap();
//!     let notary = Notary::open(store, NotaryConfig::default()).await.unwrap();
//!
//!     let wallet = Keypair::generate();
//!     let address = wallet.address();
//!
//!     let request = notary.request_validation(&address);
//!     let signature = wallet.sign_message(&request.message);
//!     notary.validate_signature(&address, &signature).unwrap();
//!
//!     let star = StarInput::new("16h 29m 1.0s", "-26° 29' 24.9", "Found star");
//!     let block = notary.add_block(&address, &star).await.unwrap();
//!     assert_eq!(block.height, 1);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `star_notary::core` - Blocks, hashing, wallet signatures
//! - `star_notary::store` - Block storage and SQLite

pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod notary;
pub mod registry;
pub mod response;

pub use star_notary_core as core;
pub use star_notary_store as store;

pub use chain::{Chain, ChainFault};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, NotaryConfig};
pub use error::{ErrorKind, NotaryError, Result};
pub use notary::Notary;
pub use registry::{
    challenge_message, Authorization, RegistryError, ValidationRegistry, ValidationRequest,
    ValidationStatus,
};
pub use response::{BlockView, BodyView, Failure, Response, SignatureValidation, StarView};

pub use star_notary_core::{Block, BlockHash, StarField, StarInput, StarViolation};
