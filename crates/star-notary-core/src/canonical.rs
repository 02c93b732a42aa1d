//! Canonical CBOR encoding for block hashing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! Block layout (integer keys):
//!
//! ```text
//! { 0: height, 1: time, 2: previous_block_hash | null, 3: body | null }
//! body = { 0: address, 1: star }
//! star = { 0: ra, 1: dec, 2: story (hex), 3: magnitude | null, 4: constellation | null }
//! ```
//!
//! The stored hash is never part of the encoding. Changing anything here
//! breaks verification of every block already on disk.

use ciborium::value::Value;

use crate::block::{Block, BlockBody, Star};

mod keys {
    pub const HEIGHT: u64 = 0;
    pub const TIME: u64 = 1;
    pub const PREVIOUS_BLOCK_HASH: u64 = 2;
    pub const BODY: u64 = 3;

    pub const BODY_ADDRESS: u64 = 0;
    pub const BODY_STAR: u64 = 1;

    pub const STAR_RA: u64 = 0;
    pub const STAR_DEC: u64 = 1;
    pub const STAR_STORY: u64 = 2;
    pub const STAR_MAGNITUDE: u64 = 3;
    pub const STAR_CONSTELLATION: u64 = 4;
}

/// Encode a block, minus its hash, to canonical CBOR bytes.
pub fn canonical_block_bytes(block: &Block) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    encode_value_to(&mut buf, &block_to_cbor_value(block));
    buf
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

fn opt_text(s: &Option<String>) -> Value {
    match s {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn block_to_cbor_value(block: &Block) -> Value {
    let previous = match &block.previous_block_hash {
        Some(hash) => Value::Bytes(hash.0.to_vec()),
        None => Value::Null,
    };
    let body = match &block.body {
        Some(body) => body_to_cbor_value(body),
        None => Value::Null,
    };

    Value::Map(vec![
        (key(keys::HEIGHT), Value::Integer(block.height.into())),
        (key(keys::TIME), Value::Integer(block.time.into())),
        (key(keys::PREVIOUS_BLOCK_HASH), previous),
        (key(keys::BODY), body),
    ])
}

fn body_to_cbor_value(body: &BlockBody) -> Value {
    Value::Map(vec![
        (key(keys::BODY_ADDRESS), Value::Text(body.address.clone())),
        (key(keys::BODY_STAR), star_to_cbor_value(&body.star)),
    ])
}

fn star_to_cbor_value(star: &Star) -> Value {
    Value::Map(vec![
        (key(keys::STAR_RA), Value::Text(star.ra.clone())),
        (key(keys::STAR_DEC), Value::Text(star.dec.clone())),
        (key(keys::STAR_STORY), Value::Text(star.story.clone())),
        (key(keys::STAR_MAGNITUDE), opt_text(&star.magnitude)),
        (key(keys::STAR_CONSTELLATION), opt_text(&star.constellation)),
    ])
}

/// Recursively encode a CBOR value.
///
/// Only the value kinds produced by this module are supported.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Null => buf.push(0xf6),
        other => unreachable!("block encoding never produces {:?}", other),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
