//! Wallet signature verification.
//!
//! Verification failure is an expected outcome: every malformed input maps to
//! `false`, never to an error or a panic.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

use crate::address::WalletAddress;
use crate::crypto::{hash160, sha256d, Ed25519PublicKey, Ed25519Signature};

/// Prefix of every Bitcoin signed message, before length framing.
pub const BITCOIN_MESSAGE_MAGIC: &str = "Bitcoin Signed Message:\n";

/// Length of a compact recoverable signature: header byte plus r and s.
pub const COMPACT_SIGNATURE_LEN: usize = 65;

/// Checks a wallet signature over a challenge message.
///
/// Implementations must be deterministic and side-effect-free.
pub trait SignatureVerifier: Send + Sync {
    /// Returns true only if `signature` is a valid signature of `message` by
    /// the key behind `address`.
    fn verify(&self, address: &str, message: &str, signature: &str) -> bool;
}

/// The production verifier: dispatches on the address family.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalletVerifier;

impl WalletVerifier {
    /// Create a new verifier.
    pub const fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for WalletVerifier {
    fn verify(&self, address: &str, message: &str, signature: &str) -> bool {
        match WalletAddress::parse(address) {
            Some(WalletAddress::Bitcoin { pubkey_hash, .. }) => {
                verify_bitcoin(&pubkey_hash, message, signature)
            }
            Some(WalletAddress::Ed25519(public_key)) => {
                verify_ed25519(&public_key, message, signature)
            }
            None => false,
        }
    }
}

/// Digest that Bitcoin wallets sign for a text message.
///
/// `SHA256d(varstr(magic) || varstr(message))`.
pub fn bitcoin_message_digest(message: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(BITCOIN_MESSAGE_MAGIC.len() + message.len() + 10);
    write_varstr(&mut buf, BITCOIN_MESSAGE_MAGIC.as_bytes());
    write_varstr(&mut buf, message.as_bytes());
    sha256d(&buf)
}

/// Write a Bitcoin CompactSize-prefixed byte string.
fn write_varstr(buf: &mut Vec<u8>, bytes: &[u8]) {
    let len = bytes.len() as u64;
    if len < 0xfd {
        buf.push(len as u8);
    } else if len <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(len as u16).to_le_bytes());
    } else if len <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(len as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&len.to_le_bytes());
    }
}

/// Verify a base64 compact signature against a P2PKH public key hash.
fn verify_bitcoin(pubkey_hash: &[u8; 20], message: &str, signature: &str) -> bool {
    let Ok(raw) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    if raw.len() != COMPACT_SIGNATURE_LEN {
        return false;
    }

    // Header 27..=30 signs for the uncompressed key, 31..=34 for the compressed one.
    let header = raw[0];
    if !(27..=34).contains(&header) {
        return false;
    }
    let compressed = header >= 31;
    let Ok(recovery_id) = RecoveryId::from_i32(i32::from((header - 27) & 3)) else {
        return false;
    };
    let Ok(sig) = RecoverableSignature::from_compact(&raw[1..], recovery_id) else {
        return false;
    };

    let digest = Message::from_digest(bitcoin_message_digest(message));
    let secp = Secp256k1::verification_only();
    let Ok(public_key) = secp.recover_ecdsa(&digest, &sig) else {
        return false;
    };

    let recovered = if compressed {
        hash160(&public_key.serialize())
    } else {
        hash160(&public_key.serialize_uncompressed())
    };
    &recovered == pubkey_hash
}

/// Verify a Base58 Ed25519 signature over the raw message bytes.
fn verify_ed25519(public_key: &Ed25519PublicKey, message: &str, signature: &str) -> bool {
    match Ed25519Signature::from_base58(signature.trim()) {
        Some(sig) => public_key.verify(message.as_bytes(), &sig),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{BitcoinKeypair, Keypair, WalletSigner};

    const MESSAGE: &str = "1A2b:1700000000:starRegistry";

    #[test]
    fn test_varstr_framing() {
        let mut buf = Vec::new();
        write_varstr(&mut buf, &[0u8; 3]);
        assert_eq!(buf[0], 3);

        buf.clear();
        write_varstr(&mut buf, &vec![0u8; 300]);
        assert_eq!(&buf[..3], &[0xfd, 0x2c, 0x01]);
        assert_eq!(buf.len(), 303);
    }

    #[test]
    fn test_bitcoin_signature_verifies() {
        let wallet = BitcoinKeypair::from_seed(&[0x42; 32]).unwrap();
        let signature = wallet.sign_message(MESSAGE);
        assert!(WalletVerifier.verify(&wallet.address(), MESSAGE, &signature));
    }

    #[test]
    fn test_bitcoin_uncompressed_signature_verifies() {
        let wallet = BitcoinKeypair::from_seed(&[0x43; 32])
            .unwrap()
            .uncompressed();
        let signature = wallet.sign_message(MESSAGE);
        assert!(WalletVerifier.verify(&wallet.address(), MESSAGE, &signature));
    }

    #[test]
    fn test_bitcoin_signature_wrong_message() {
        let wallet = BitcoinKeypair::from_seed(&[0x42; 32]).unwrap();
        let signature = wallet.sign_message(MESSAGE);
        assert!(!WalletVerifier.verify(&wallet.address(), "tampered", &signature));
    }

    #[test]
    fn test_bitcoin_signature_wrong_address() {
        let signer = BitcoinKeypair::from_seed(&[0x42; 32]).unwrap();
        let other = BitcoinKeypair::from_seed(&[0x44; 32]).unwrap();
        let signature = signer.sign_message(MESSAGE);
        assert!(!WalletVerifier.verify(&other.address(), MESSAGE, &signature));
    }

    #[test]
    fn test_bitcoin_compression_flag_matters() {
        // Flip the header between compressed and uncompressed: the recovered
        // key hashes to a different address.
        let wallet = BitcoinKeypair::from_seed(&[0x42; 32]).unwrap();
        let mut raw = STANDARD.decode(wallet.sign_message(MESSAGE)).unwrap();
        raw[0] -= 4;
        let flipped = STANDARD.encode(&raw);
        assert!(!WalletVerifier.verify(&wallet.address(), MESSAGE, &flipped));
    }

    #[test]
    fn test_malformed_signatures_are_false() {
        let wallet = BitcoinKeypair::from_seed(&[0x42; 32]).unwrap();
        let addr = wallet.address();
        assert!(!WalletVerifier.verify(&addr, MESSAGE, ""));
        assert!(!WalletVerifier.verify(&addr, MESSAGE, "not base64 !!"));
        assert!(!WalletVerifier.verify(&addr, MESSAGE, &STANDARD.encode([0u8; 64])));
        assert!(!WalletVerifier.verify(&addr, MESSAGE, &STANDARD.encode([0u8; 65])));

        let mut bad_header = vec![0u8; 65];
        bad_header[0] = 99;
        assert!(!WalletVerifier.verify(&addr, MESSAGE, &STANDARD.encode(&bad_header)));
    }

    #[test]
    fn test_ed25519_signature_verifies() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let signature = keypair.sign_message(MESSAGE);
        assert!(WalletVerifier.verify(&keypair.address(), MESSAGE, &signature));
        assert!(!WalletVerifier.verify(&keypair.address(), "other", &signature));
    }

    #[test]
    fn test_scheme_mismatch_is_false() {
        // An Ed25519 signature presented for a Bitcoin address and vice versa.
        let ed = Keypair::from_seed(&[0x01; 32]);
        let btc = BitcoinKeypair::from_seed(&[0x02; 32]).unwrap();
        assert!(!WalletVerifier.verify(&btc.address(), MESSAGE, &ed.sign_message(MESSAGE)));
        assert!(!WalletVerifier.verify(&ed.address(), MESSAGE, &btc.sign_message(MESSAGE)));
    }

    #[test]
    fn test_unsupported_address_is_false() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let signature = keypair.sign_message(MESSAGE);
        assert!(!WalletVerifier.verify("nonsense", MESSAGE, &signature));
    }
}
