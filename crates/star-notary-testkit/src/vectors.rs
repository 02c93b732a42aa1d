//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the canonical bytes of one block. Any change to the
//! encoding shows up here before it reaches a ledger on disk.

use star_notary_core::{canonical_block_bytes, Block, BlockBuilder, BlockHash, Star};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub height: u64,
    pub time: i64,
    /// Fill byte of the previous hash, `None` for genesis.
    pub previous: Option<u8>,
    /// Owner and star, `None` for genesis.
    pub body: Option<VectorBody>,
    /// Expected canonical encoding (hex).
    pub expected_canonical: &'static str,
}

#[derive(Debug, Clone)]
pub struct VectorBody {
    pub address: &'static str,
    pub ra: &'static str,
    pub dec: &'static str,
    /// Story as plain text; stored hex-encoded.
    pub story: &'static str,
    pub magnitude: Option<&'static str>,
    pub constellation: Option<&'static str>,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis at 2023-11-14T22:13:20Z",
            height: 0,
            time: 1_700_000_000,
            previous: None,
            body: None,
            expected_canonical: "a40000011a6553f10002f603f6",
        },
        GoldenVector {
            name: "genesis at epoch",
            height: 0,
            time: 0,
            previous: None,
            body: None,
            expected_canonical: "a40000010002f603f6",
        },
        GoldenVector {
            name: "first star, required fields only",
            height: 1,
            time: 1_700_000_300,
            previous: Some(0x11),
            body: Some(VectorBody {
                address: "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
                ra: "16h 29m 1.0s",
                dec: "-26° 29' 24.9",
                story: "Found star using https://www.google.com/sky/",
                magnitude: None,
                constellation: None,
            }),
            expected_canonical: concat!(
                "a40001011a6553f22c",
                "0258201111111111111111111111111111111111111111111111111111111111111111",
                "03a20078223141317a5031655035514765666932444d505466544c35534c6d7637446976664e61",
                "01a5006c3136682032396d20312e3073016e2d3236c2b0203239272032342e39",
                "02785834363666373536653634323037333734363137323230373537333639366536",
                "37323036383734373437303733336132663266373737373737326536373666366636",
                "373663363532653633366636643266373336623739326603f604f6",
            ),
        },
        GoldenVector {
            name: "non-ASCII story with optional fields",
            height: 2,
            time: 1_700_000_600,
            previous: Some(0x22),
            body: Some(VectorBody {
                address: "8qbHbw2BbbTHBW1sbeqakYXVKRQM8Ne7pLK7m6CVfeR",
                ra: "5h 55m 10.3s",
                dec: "+7° 24' 25",
                story: "Étoile ✨",
                magnitude: Some("4.2"),
                constellation: Some("Orion"),
            }),
            expected_canonical: concat!(
                "a40002011a6553f358",
                "0258202222222222222222222222222222222222222222222222222222222222222222",
                "03a200782b38716248627732426262544842573173626571616b5958564b52514d384e6537704c4b376d36435666655",
                "201a5006c35682035356d2031302e3373016b2b37c2b0203234272032350276633338393734366636393663363532",
                "306532396361380363342e3204654f72696f6e",
            ),
        },
    ]
}

/// Seal the block a vector describes.
pub fn block_from_vector(vector: &GoldenVector) -> Block {
    let mut builder = BlockBuilder::new(vector.height).time(vector.time);
    if let Some(fill) = vector.previous {
        builder = builder.previous(BlockHash::from_bytes([fill; 32]));
    }
    if let Some(body) = &vector.body {
        builder = builder.body(
            body.address,
            Star {
                ra: body.ra.to_string(),
                dec: body.dec.to_string(),
                story: hex::encode(body.story),
                magnitude: body.magnitude.map(str::to_string),
                constellation: body.constellation.map(str::to_string),
            },
        );
    }
    builder.seal()
}

/// Check every vector. Returns `(name, matches, actual_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = hex::encode(canonical_block_bytes(&block_from_vector(v)));
            (v.name.to_string(), actual == v.expected_canonical, actual)
        })
        .collect()
}
