//! Integrity checks over an on-disk ledger.
//!
//! Tampering goes through a second SQLite connection, the way an operator or
//! an attacker with file access would, and must be caught by the hash checks.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection};
use star_notary::core::SignatureVerifier;
use star_notary::store::SqliteStore;
use star_notary::{ChainFault, ManualClock, Notary, NotaryConfig, StarInput};

const T0: i64 = 1_700_000_000;

struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _: &str, _: &str, _: &str) -> bool {
        true
    }
}

async fn open(path: &Path, config: NotaryConfig) -> Notary<SqliteStore> {
    Notary::open_with(
        SqliteStore::open(path).unwrap(),
        config,
        Arc::new(AcceptAll),
        Arc::new(ManualClock::new(T0)),
    )
    .await
    .unwrap()
}

async fn register(notary: &Notary<SqliteStore>, address: &str, story: &str) {
    notary.request_validation(address);
    notary.validate_signature(address, "sig").unwrap();
    notary
        .add_block(address, &StarInput::new("ra", "dec", story))
        .await
        .unwrap();
}

async fn seeded(path: &Path) -> Notary<SqliteStore> {
    let notary = open(path, NotaryConfig::default()).await;
    for (address, story) in [("alice", "one"), ("bob", "two"), ("carol", "three")] {
        register(&notary, address, story).await;
    }
    notary
}

fn raw_update(path: &Path, sql: &str, height: u64) {
    let conn = Connection::open(path).unwrap();
    conn.execute(sql, params![height as i64]).unwrap();
}

#[tokio::test]
async fn test_linkage_invariant() {
    let dir = tempfile::tempdir().unwrap();
    let notary = seeded(&dir.path().join("notary.db")).await;

    let mut prev = notary.get_block(0).await.unwrap();
    for height in 1..=3 {
        let block = notary.get_block(height).await.unwrap();
        assert_eq!(block.previous_block_hash, prev.hash);
        assert_eq!(block.verified, Some(true));
        prev = block;
    }
    assert!(notary.verify_chain().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tampered_story_is_returned_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notary.db");
    let notary = seeded(&path).await;

    let original = notary.get_block(2).await.unwrap();
    raw_update(
        &path,
        &format!(
            "UPDATE blocks SET star_story = '{}' WHERE height = ?1",
            hex::encode("rewritten")
        ),
        2,
    );

    let tampered = notary.get_block(2).await.unwrap();
    assert_eq!(tampered.hash, original.hash);
    assert_eq!(tampered.verified, Some(false));
    assert_eq!(
        tampered.body.unwrap().star.story_decoded.as_deref(),
        Some("rewritten")
    );

    assert_eq!(notary.verify_chain().await.unwrap(), vec![2]);
}

#[tokio::test]
async fn test_every_column_is_covered() {
    let updates = [
        "UPDATE blocks SET time = time + 1 WHERE height = ?1",
        "UPDATE blocks SET address = 'mallory' WHERE height = ?1",
        "UPDATE blocks SET star_ra = 'elsewhere' WHERE height = ?1",
        "UPDATE blocks SET star_dec = 'elsewhere' WHERE height = ?1",
        "UPDATE blocks SET star_magnitude = '1.0' WHERE height = ?1",
        "UPDATE blocks SET star_constellation = 'Lyra' WHERE height = ?1",
    ];

    for sql in updates {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notary.db");
        let notary = seeded(&path).await;

        raw_update(&path, sql, 1);
        assert_eq!(notary.verify_chain().await.unwrap(), vec![1], "{}", sql);
    }
}

#[tokio::test]
async fn test_broken_link_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notary.db");
    let notary = seeded(&path).await;

    // Point block 3 at genesis instead of block 2.
    raw_update(
        &path,
        "UPDATE blocks SET previous_hash = (SELECT hash FROM blocks WHERE height = 0)
         WHERE height = ?1",
        3,
    );

    let faults = notary.audit_chain().await.unwrap();
    assert!(faults
        .iter()
        .any(|f| matches!(f, ChainFault::BrokenLink { height: 3, .. })));
    assert_eq!(notary.verify_chain().await.unwrap(), vec![3]);
}

#[tokio::test]
async fn test_reopen_keeps_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notary.db");

    let before = {
        let notary = seeded(&path).await;
        (
            notary.get_block(0).await.unwrap(),
            notary.get_block(3).await.unwrap(),
        )
    };

    let notary = open(&path, NotaryConfig::default()).await;
    assert_eq!(notary.height().await.unwrap(), Some(3));
    assert_eq!(notary.get_block(0).await.unwrap(), before.0);
    assert_eq!(notary.get_block(3).await.unwrap(), before.1);

    register(&notary, "dave", "four").await;
    let next = notary.get_block(4).await.unwrap();
    assert_eq!(next.previous_block_hash, before.1.hash);
    assert!(notary.verify_chain().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_on_read_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = NotaryConfig {
        verify_on_read: false,
        ..NotaryConfig::default()
    };
    let notary = open(&dir.path().join("notary.db"), config).await;

    let genesis = notary.get_block(0).await.unwrap();
    assert!(genesis.verified.is_none());
    let json = serde_json::to_value(&genesis).unwrap();
    assert!(json.get("verified").is_none());
}
