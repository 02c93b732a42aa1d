//! Wallet signing keys.
//!
//! These produce challenge signatures in exactly the encodings
//! [`WalletVerifier`](crate::verifier::WalletVerifier) accepts. The notary
//! itself never holds secret keys; wallets are used by clients, tests and the
//! command-line signer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use std::fmt;

use crate::address::{BitcoinNetwork, WalletAddress};
use crate::crypto::{hash160, Ed25519PublicKey, Ed25519Signature};
use crate::error::CoreError;
use crate::verifier::bitcoin_message_digest;

/// Something that owns a wallet address and can sign challenge messages for it.
pub trait WalletSigner {
    /// The wallet address string.
    fn address(&self) -> String;

    /// Sign a challenge message, returning the transport encoding.
    fn sign_message(&self, message: &str) -> String;
}

/// An Ed25519 keypair.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign raw bytes.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }
}

impl WalletSigner for Keypair {
    fn address(&self) -> String {
        WalletAddress::Ed25519(self.public_key()).to_string()
    }

    fn sign_message(&self, message: &str) -> String {
        self.sign(message.as_bytes()).to_base58()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// A secp256k1 keypair with a legacy P2PKH address.
#[derive(Clone)]
pub struct BitcoinKeypair {
    secret_key: SecretKey,
    public_key: PublicKey,
    network: BitcoinNetwork,
    compressed: bool,
}

impl BitcoinKeypair {
    /// Generate a new random mainnet keypair.
    pub fn generate() -> Self {
        let secp = Secp256k1::signing_only();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
        Self {
            secret_key,
            public_key,
            network: BitcoinNetwork::Mainnet,
            compressed: true,
        }
    }

    /// Create a mainnet keypair from 32 secret bytes.
    ///
    /// Fails if the bytes are zero or not below the curve order.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CoreError> {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::from_slice(seed).map_err(|_| CoreError::InvalidSecretKey)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
            network: BitcoinNetwork::Mainnet,
            compressed: true,
        })
    }

    /// Use a testnet address.
    pub fn on_network(mut self, network: BitcoinNetwork) -> Self {
        self.network = network;
        self
    }

    /// Derive the address from the uncompressed public key encoding.
    pub fn uncompressed(mut self) -> Self {
        self.compressed = false;
        self
    }

    /// The parsed wallet address.
    pub fn wallet_address(&self) -> WalletAddress {
        let pubkey_hash = if self.compressed {
            hash160(&self.public_key.serialize())
        } else {
            hash160(&self.public_key.serialize_uncompressed())
        };
        WalletAddress::bitcoin(self.network, pubkey_hash)
    }
}

impl WalletSigner for BitcoinKeypair {
    fn address(&self) -> String {
        self.wallet_address().to_string()
    }

    /// Base64 of `header || r || s`, header = 27 + recovery id (+4 if compressed).
    fn sign_message(&self, message: &str) -> String {
        let secp = Secp256k1::signing_only();
        let digest = Message::from_digest(bitcoin_message_digest(message));
        let sig = secp.sign_ecdsa_recoverable(&digest, &self.secret_key);
        let (recovery_id, compact) = sig.serialize_compact();

        let mut header = 27 + recovery_id.to_i32() as u8;
        if self.compressed {
            header += 4;
        }

        let mut raw = Vec::with_capacity(65);
        raw.push(header);
        raw.extend_from_slice(&compact);
        STANDARD.encode(raw)
    }
}

impl fmt::Debug for BitcoinKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitcoinKeypair({})", self.address())
    }
}
