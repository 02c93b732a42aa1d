//! Proptest generators for property-based testing.

use proptest::prelude::*;

use star_notary_core::{Block, BlockBuilder, BlockHash, Keypair, Star, StarInput};

/// Non-blank free text: no control characters, at least one non-space.
pub fn text(max_chars: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[^\\p{{C}}\\s][^\\p{{C}}]{{0,{}}}", max_chars.max(1) - 1))
        .expect("text regex compiles")
}

/// Story text of at most `max_bytes` UTF-8 bytes.
pub fn story(max_bytes: usize) -> impl Strategy<Value = String> {
    text(max_bytes)
        .prop_map(move |mut s| {
            while s.len() > max_bytes {
                s.pop();
            }
            s
        })
        .prop_filter("story must not be blank", |s| !s.trim().is_empty())
}

/// A star input that passes validation under `max_story_bytes`.
pub fn valid_star_input(max_story_bytes: usize) -> impl Strategy<Value = StarInput> {
    (
        text(24),
        text(24),
        story(max_story_bytes),
        proptest::option::of(text(8)),
        proptest::option::of(text(16)),
    )
        .prop_map(|(ra, dec, story, magnitude, constellation)| StarInput {
            ra: Some(ra),
            dec: Some(dec),
            story: Some(story),
            magnitude,
            constellation,
        })
}

/// A star input with at least one required field missing or blank.
pub fn incomplete_star_input() -> impl Strategy<Value = StarInput> {
    let field = prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        text(12).prop_map(Some),
    ];
    (field.clone(), field.clone(), field)
        .prop_filter("at least one required field must be unusable", |(ra, dec, story)| {
            [ra, dec, story]
                .iter()
                .any(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
        })
        .prop_map(|(ra, dec, story)| StarInput {
            ra,
            dec,
            story,
            ..StarInput::default()
        })
}

/// A random block hash.
pub fn block_hash() -> impl Strategy<Value = BlockHash> {
    any::<[u8; 32]>().prop_map(BlockHash::from_bytes)
}

/// A stored-form star.
pub fn star() -> impl Strategy<Value = Star> {
    (text(24), text(24), story(200), proptest::option::of(text(8)))
        .prop_map(|(ra, dec, story, magnitude)| Star {
            ra,
            dec,
            story: hex::encode(story),
            magnitude,
            constellation: None,
        })
}

/// A random Ed25519 wallet.
pub fn ed25519_wallet() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// A correctly linked chain: genesis plus `1..=max_len` star blocks.
pub fn linked_chain(max_len: usize) -> impl Strategy<Value = Vec<Block>> {
    (
        0i64..=2_000_000_000,
        prop::collection::vec((text(16), star()), 1..=max_len.max(1)),
    )
        .prop_map(|(genesis_time, bodies)| {
            let mut chain = vec![Block::genesis(genesis_time)];
            for (i, (address, star)) in bodies.into_iter().enumerate() {
                let block = BlockBuilder::on_top_of(&chain[chain.len() - 1])
                    .time(genesis_time + i as i64 + 1)
                    .body(address, star)
                    .seal();
                chain.push(block);
            }
            chain
        })
}
