//! Wallet addresses.
//!
//! Two address families are recognized, each tied to its native signing
//! scheme:
//!
//! - Bitcoin P2PKH: Base58Check of `version || hash160(pubkey)`, signed with
//!   secp256k1 recoverable signatures.
//! - Ed25519: Base58 of the raw 32-byte public key.

use std::fmt;

use crate::crypto::Ed25519PublicKey;

/// Base58Check version byte of a mainnet P2PKH address.
pub const P2PKH_MAINNET: u8 = 0x00;

/// Base58Check version byte of a testnet P2PKH address.
pub const P2PKH_TESTNET: u8 = 0x6f;

/// Network a Bitcoin address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
}

impl BitcoinNetwork {
    /// The P2PKH version byte for this network.
    pub const fn version_byte(self) -> u8 {
        match self {
            Self::Mainnet => P2PKH_MAINNET,
            Self::Testnet => P2PKH_TESTNET,
        }
    }

    fn from_version_byte(byte: u8) -> Option<Self> {
        match byte {
            P2PKH_MAINNET => Some(Self::Mainnet),
            P2PKH_TESTNET => Some(Self::Testnet),
            _ => None,
        }
    }
}

/// A parsed wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletAddress {
    /// Legacy pay-to-public-key-hash address.
    Bitcoin {
        network: BitcoinNetwork,
        pubkey_hash: [u8; 20],
    },
    /// Raw Ed25519 public key.
    Ed25519(Ed25519PublicKey),
}

impl WalletAddress {
    /// Parse an address string.
    ///
    /// Base58Check strings with a P2PKH version byte and a 20-byte payload are
    /// Bitcoin addresses; plain Base58 strings of 32 bytes are Ed25519 keys.
    /// Anything else is unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(decoded) = bs58::decode(s).with_check(None).into_vec() {
            if decoded.len() == 21 {
                if let Some(network) = BitcoinNetwork::from_version_byte(decoded[0]) {
                    let mut pubkey_hash = [0u8; 20];
                    pubkey_hash.copy_from_slice(&decoded[1..]);
                    return Some(Self::Bitcoin {
                        network,
                        pubkey_hash,
                    });
                }
            }
        }

        Ed25519PublicKey::from_base58(s).map(Self::Ed25519)
    }

    /// Build a P2PKH address from a public key hash.
    pub const fn bitcoin(network: BitcoinNetwork, pubkey_hash: [u8; 20]) -> Self {
        Self::Bitcoin {
            network,
            pubkey_hash,
        }
    }

    /// Short scheme label for logs.
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Bitcoin { .. } => "bitcoin-p2pkh",
            Self::Ed25519(_) => "ed25519",
        }
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitcoin {
                network,
                pubkey_hash,
            } => {
                let mut payload = Vec::with_capacity(21);
                payload.push(network.version_byte());
                payload.extend_from_slice(pubkey_hash);
                f.write_str(&bs58::encode(payload).with_check().into_string())
            }
            Self::Ed25519(pk) => f.write_str(&pk.to_base58()),
        }
    }
}
