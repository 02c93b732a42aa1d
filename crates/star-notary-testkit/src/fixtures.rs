//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: deterministic wallets, a manual
//! clock, and a notary over an in-memory store.

use std::sync::Arc;

use star_notary::{BlockView, ManualClock, Notary, NotaryConfig, Result, StarInput};
use star_notary_core::{BitcoinKeypair, Keypair, SignatureVerifier, WalletSigner, WalletVerifier};
use star_notary_store::MemoryStore;

/// Start time of every fixture clock.
pub const FIXTURE_EPOCH: i64 = 1_700_000_000;

/// A notary over a memory store, driven by a manual clock.
pub struct NotaryFixture {
    pub notary: Notary<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl NotaryFixture {
    /// Default config, real wallet signature checks.
    pub async fn new() -> Self {
        Self::with_config(NotaryConfig::default()).await
    }

    pub async fn with_config(config: NotaryConfig) -> Self {
        Self::build(config, Arc::new(WalletVerifier::new())).await
    }

    /// Accepts any signature; for tests that are not about signing.
    pub async fn permissive() -> Self {
        Self::build(NotaryConfig::default(), Arc::new(AcceptAllVerifier)).await
    }

    async fn build(config: NotaryConfig, verifier: Arc<dyn SignatureVerifier>) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let notary = Notary::open_with(MemoryStore::new(), config, verifier, clock.clone())
            .await
            .expect("fixture notary opens over a memory store");
        Self { notary, clock }
    }

    /// Run the challenge for `wallet` and return its address.
    pub fn authorize(&self, wallet: &dyn WalletSigner) -> Result<String> {
        let address = wallet.address();
        let request = self.notary.request_validation(&address);
        let signature = wallet.sign_message(&request.message);
        self.notary.validate_signature(&address, &signature)?;
        Ok(address)
    }

    /// Authorize `wallet` and register one star with `story`.
    pub async fn register(&self, wallet: &dyn WalletSigner, story: &str) -> Result<BlockView> {
        let address = self.authorize(wallet)?;
        self.notary.add_block(&address, &sample_star(story)).await
    }
}

/// Verifier that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _address: &str, _message: &str, _signature: &str) -> bool {
        true
    }
}

/// Deterministic compressed mainnet wallet. `index` selects the key.
pub fn bitcoin_wallet(index: u8) -> BitcoinKeypair {
    BitcoinKeypair::from_seed(&seed(index)).expect("fixture seeds are valid secp256k1 keys")
}

/// Deterministic Ed25519 wallet.
pub fn ed25519_wallet(index: u8) -> Keypair {
    Keypair::from_seed(&seed(index))
}

/// `count` distinct Bitcoin wallets.
pub fn bitcoin_wallets(count: usize) -> Vec<BitcoinKeypair> {
    (0..count).map(|i| bitcoin_wallet(i as u8)).collect()
}

fn seed(index: u8) -> [u8; 32] {
    // Never all zero, which is not a valid secp256k1 key.
    let mut seed = [0x5a; 32];
    seed[0] = index;
    seed
}

/// A valid star with the given story.
pub fn sample_star(story: &str) -> StarInput {
    StarInput::new("16h 29m 1.0s", "-26° 29' 24.9", story)
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_notary::ErrorKind;

    #[tokio::test]
    async fn test_fixture_registers() {
        let fx = NotaryFixture::new().await;
        let wallet = bitcoin_wallet(1);

        let block = fx.register(&wallet, "hello").await.unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.body.unwrap().address, wallet.address());
    }

    #[tokio::test]
    async fn test_fixture_clock_drives_grace() {
        let fx = NotaryFixture::permissive().await;
        let wallet = ed25519_wallet(2);
        let address = fx.authorize(&wallet).unwrap();

        fx.clock.advance(30 * 60);
        let err = fx.notary.add_block(&address, &sample_star("late")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_wallets_are_distinct_and_stable() {
        let wallets = bitcoin_wallets(4);
        let mut addresses: Vec<_> = wallets.iter().map(|w| w.address()).collect();
        assert_eq!(addresses[0], bitcoin_wallet(0).address());
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), 4);
        assert_ne!(ed25519_wallet(0).address(), ed25519_wallet(1).address());
    }
}
