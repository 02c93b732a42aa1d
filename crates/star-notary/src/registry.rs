//! Signature challenge registry.
//!
//! Tracks one outstanding validation request per wallet address. A request
//! starts Pending with a fixed signing window; a correct signature flips it to
//! Validated for a grace period, during which the address may register one
//! star. Remaining time is always derived from the injected clock, so the
//! window only ever counts down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use star_notary_core::SignatureVerifier;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::NotaryConfig;

/// Fixed protocol suffix of every challenge message.
pub const MESSAGE_SUFFIX: &str = "starRegistry";

/// Build the challenge message an address must sign.
pub fn challenge_message(address: &str, request_timestamp: i64) -> String {
    format!("{}:{}:{}", address, request_timestamp, MESSAGE_SUFFIX)
}

/// Errors from the validate transition.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no validation request for address {0}")]
    NotFound(String),

    #[error("validation window expired for address {0}")]
    Expired(String),

    #[error("signature verification failed for address {0}")]
    VerificationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Pending,
    Validated,
}

/// A snapshot of a registry entry as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub address: String,

    /// When the request was first created (Unix seconds).
    pub request_timestamp: i64,

    /// The exact text the wallet must sign.
    pub message: String,

    /// Seconds left: of the signing window while Pending, of the grace
    /// period once Validated.
    pub validation_window: u64,

    pub status: ValidationStatus,
}

/// A validated entry removed from the registry by [`ValidationRegistry::take`].
///
/// Hand it back with [`ValidationRegistry::reinstate`] if the registration it
/// was taken for did not complete.
#[derive(Debug)]
pub struct Authorization {
    address: String,
    entry: Entry,
}

impl Authorization {
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[derive(Debug, Clone)]
struct Entry {
    request_timestamp: i64,
    message: String,
    status: ValidationStatus,
    validated_at: Option<i64>,
}

impl Entry {
    fn remaining(&self, now: i64, window: i64, grace: i64) -> u64 {
        let (start, budget) = match (self.status, self.validated_at) {
            (ValidationStatus::Validated, Some(at)) => (at, grace),
            _ => (self.request_timestamp, window),
        };
        let elapsed = now.saturating_sub(start).max(0);
        budget.saturating_sub(elapsed).max(0) as u64
    }

    fn is_expired(&self, now: i64, window: i64, grace: i64) -> bool {
        self.remaining(now, window, grace) == 0
    }

    fn view(&self, address: &str, remaining: u64) -> ValidationRequest {
        ValidationRequest {
            address: address.to_string(),
            request_timestamp: self.request_timestamp,
            message: self.message.clone(),
            validation_window: remaining,
            status: self.status,
        }
    }
}

/// The in-memory validation request table.
pub struct ValidationRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
    window: i64,
    grace: i64,
}

impl ValidationRegistry {
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
        config: &NotaryConfig,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            verifier,
            clock,
            window: i64::try_from(config.validation_window_secs).unwrap_or(i64::MAX),
            grace: i64::try_from(config.grace_period_secs).unwrap_or(i64::MAX),
        }
    }

    // Every mutation leaves the map consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a validation window for `address`, or report the one in progress.
    ///
    /// An unexpired entry is returned as-is with its remaining time; calling
    /// again never extends the window. An expired entry is replaced.
    pub fn request_validation(&self, address: &str) -> ValidationRequest {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now);

        if let Some(entry) = entries.get(address) {
            return entry.view(address, entry.remaining(now, self.window, self.grace));
        }

        let entry = Entry {
            request_timestamp: now,
            message: challenge_message(address, now),
            status: ValidationStatus::Pending,
            validated_at: None,
        };
        let view = entry.view(address, entry.remaining(now, self.window, self.grace));
        entries.insert(address.to_string(), entry);

        tracing::debug!(address, window = self.window, "validation window opened");
        view
    }

    /// Check `signature` over the stored challenge for `address`.
    ///
    /// A failed check leaves the entry as it was; the window keeps counting.
    /// Re-validating a Validated entry does not restart its grace period.
    pub fn validate(
        &self,
        address: &str,
        signature: &str,
    ) -> Result<ValidationRequest, RegistryError> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let entry = entries
            .get_mut(address)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;

        if entry.is_expired(now, self.window, self.grace) {
            entries.remove(address);
            tracing::debug!(address, "validation request expired");
            return Err(RegistryError::Expired(address.to_string()));
        }

        if !self.verifier.verify(address, &entry.message, signature) {
            tracing::warn!(address, "rejected challenge signature");
            return Err(RegistryError::VerificationFailed(address.to_string()));
        }

        if entry.status == ValidationStatus::Pending {
            entry.status = ValidationStatus::Validated;
            entry.validated_at = Some(now);
            tracing::info!(address, grace = self.grace, "address validated");
        }

        Ok(entry.view(address, entry.remaining(now, self.window, self.grace)))
    }

    /// Whether `address` currently holds an unexpired validated entry.
    ///
    /// Does not consume it.
    pub fn is_authorized(&self, address: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(address) {
            Some(entry) if entry.is_expired(now, self.window, self.grace) => {
                entries.remove(address);
                false
            }
            Some(entry) => entry.status == ValidationStatus::Validated,
            None => false,
        }
    }

    /// Atomically remove and return the authorization for `address`.
    ///
    /// `None` unless the entry is Validated and inside its grace period.
    pub fn take(&self, address: &str) -> Option<Authorization> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let entry = entries.get(address)?;
        if entry.is_expired(now, self.window, self.grace) {
            entries.remove(address);
            return None;
        }
        if entry.status != ValidationStatus::Validated {
            return None;
        }

        entries.remove(address).map(|entry| Authorization {
            address: address.to_string(),
            entry,
        })
    }

    /// Delete the entry if it authorizes a registration right now.
    pub fn consume(&self, address: &str) -> bool {
        self.take(address).is_some()
    }

    /// Put back an authorization whose registration failed.
    ///
    /// A pending request opened in the meantime is replaced; the original
    /// grace deadline still applies.
    pub fn reinstate(&self, authorization: Authorization) {
        let mut entries = self.lock();
        let Authorization { address, entry } = authorization;

        match entries.get(&address) {
            Some(existing) if existing.status == ValidationStatus::Validated => {}
            _ => {
                tracing::debug!(address = %address, "authorization reinstated");
                entries.insert(address, entry);
            }
        }
    }

    /// Current view of the entry for `address`, if it has not expired.
    pub fn get(&self, address: &str) -> Option<ValidationRequest> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(address) {
            Some(entry) if entry.is_expired(now, self.window, self.grace) => {
                entries.remove(address);
                None
            }
            Some(entry) => Some(entry.view(address, entry.remaining(now, self.window, self.grace))),
            None => None,
        }
    }

    /// Evict every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn sweep(&self, entries: &mut HashMap<String, Entry>, now: i64) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.window, self.grace));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "purged expired validation requests");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use star_notary_core::{Keypair, WalletSigner, WalletVerifier};

    const T0: i64 = 1_700_000_000;

    /// Accepts exactly one signature string.
    struct FixedVerifier(&'static str);

    impl SignatureVerifier for FixedVerifier {
        fn verify(&self, _address: &str, _message: &str, signature: &str) -> bool {
            signature == self.0
        }
    }

    fn registry(verifier: impl SignatureVerifier + 'static) -> (ValidationRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let registry = ValidationRegistry::new(
            Arc::new(verifier),
            clock.clone(),
            &NotaryConfig::default(),
        );
        (registry, clock)
    }

    #[test]
    fn test_challenge_message_format() {
        assert_eq!(
            challenge_message("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", 1_532_296_090),
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa:1532296090:starRegistry"
        );
    }

    #[test]
    fn test_new_request() {
        let (registry, _) = registry(FixedVerifier("ok"));
        let request = registry.request_validation("addr");

        assert_eq!(request.address, "addr");
        assert_eq!(request.request_timestamp, T0);
        assert_eq!(request.message, challenge_message("addr", T0));
        assert_eq!(request.validation_window, 300);
        assert_eq!(request.status, ValidationStatus::Pending);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_repeat_request_counts_down() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        let first = registry.request_validation("addr");
        clock.advance(42);
        let second = registry.request_validation("addr");

        assert_eq!(second.message, first.message);
        assert_eq!(second.request_timestamp, first.request_timestamp);
        assert_eq!(second.validation_window, 258);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_expired_request_is_replaced() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        clock.advance(300);
        let fresh = registry.request_validation("addr");

        assert_eq!(fresh.request_timestamp, T0 + 300);
        assert_eq!(fresh.validation_window, 300);
    }

    #[test]
    fn test_validate_unknown_address() {
        let (registry, _) = registry(FixedVerifier("ok"));
        assert!(matches!(
            registry.validate("ghost", "ok"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_after_window() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        clock.advance(301);

        assert!(matches!(
            registry.validate("addr", "ok"),
            Err(RegistryError::Expired(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_signature_keeps_pending_and_window() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        clock.advance(100);

        assert!(matches!(
            registry.validate("addr", "bad"),
            Err(RegistryError::VerificationFailed(_))
        ));
        let current = registry.get("addr").unwrap();
        assert_eq!(current.status, ValidationStatus::Pending);
        assert_eq!(current.validation_window, 200);
    }

    #[test]
    fn test_validate_starts_grace_period() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        clock.advance(10);

        let validated = registry.validate("addr", "ok").unwrap();
        assert_eq!(validated.status, ValidationStatus::Validated);
        assert_eq!(validated.validation_window, 1800);
        assert!(registry.is_authorized("addr"));

        // A repeat request reports the grace period, not a new window.
        clock.advance(600);
        let again = registry.request_validation("addr");
        assert_eq!(again.status, ValidationStatus::Validated);
        assert_eq!(again.validation_window, 1200);
    }

    #[test]
    fn test_revalidate_does_not_extend_grace() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        registry.validate("addr", "ok").unwrap();
        clock.advance(1000);

        let again = registry.validate("addr", "ok").unwrap();
        assert_eq!(again.validation_window, 800);
        assert!(registry.validate("addr", "bad").is_err());
        assert!(registry.is_authorized("addr"));
    }

    #[test]
    fn test_grace_period_expiry() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        registry.validate("addr", "ok").unwrap();
        clock.advance(1800);

        assert!(!registry.is_authorized("addr"));
        assert!(!registry.consume("addr"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_consume_once() {
        let (registry, _) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        assert!(!registry.consume("addr"), "pending entries are not consumable");

        registry.validate("addr", "ok").unwrap();
        assert!(registry.consume("addr"));
        assert!(!registry.consume("addr"));
        assert!(registry.get("addr").is_none());
    }

    #[test]
    fn test_reinstate_after_take() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("addr");
        registry.validate("addr", "ok").unwrap();
        clock.advance(100);

        let auth = registry.take("addr").unwrap();
        assert_eq!(auth.address(), "addr");
        assert!(!registry.is_authorized("addr"));

        registry.reinstate(auth);
        let restored = registry.get("addr").unwrap();
        assert_eq!(restored.status, ValidationStatus::Validated);
        assert_eq!(restored.validation_window, 1700);
    }

    #[test]
    fn test_purge_expired() {
        let (registry, clock) = registry(FixedVerifier("ok"));
        registry.request_validation("a");
        clock.advance(200);
        registry.request_validation("b");
        clock.advance(150);

        assert_eq!(registry.purge_expired(), 1);
        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn test_with_wallet_signature() {
        let (registry, _) = registry(WalletVerifier::new());
        let wallet = Keypair::from_seed(&[7u8; 32]);
        let address = wallet.address();

        let request = registry.request_validation(&address);
        let signature = wallet.sign_message(&request.message);
        let other = Keypair::from_seed(&[8u8; 32]).sign_message(&request.message);

        assert!(registry.validate(&address, &other).is_err());
        assert!(registry.validate(&address, &signature).is_ok());
    }

    #[test]
    fn test_request_view_serializes_camel_case() {
        let (registry, _) = registry(FixedVerifier("ok"));
        let json = serde_json::to_value(registry.request_validation("addr")).unwrap();
        assert_eq!(json["requestTimestamp"], T0);
        assert_eq!(json["validationWindow"], 300);
        assert_eq!(json["status"], "Pending");
    }
}
