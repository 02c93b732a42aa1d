//! Star validation and block integrity checks.

use crate::block::{Block, Star, StarField, StarInput, StarViolation};

/// Default story limit, in bytes of decoded UTF-8 text.
pub const DEFAULT_MAX_STORY_BYTES: usize = 500;

/// Validate a submitted star and convert it to its stored form.
///
/// All violations are collected, not just the first. Blank strings count as
/// missing. The story limit applies to the text before hex encoding.
pub fn validate_star(input: &StarInput, max_story_bytes: usize) -> Result<Star, Vec<StarViolation>> {
    let mut violations = Vec::new();

    let ra = required(&input.ra, StarField::Ra, &mut violations);
    let dec = required(&input.dec, StarField::Dec, &mut violations);
    let story = required(&input.story, StarField::Story, &mut violations);

    if let Some(story) = story {
        if story.len() > max_story_bytes {
            violations.push(StarViolation::TooLong {
                field: StarField::Story,
                limit: max_story_bytes,
                actual: story.len(),
            });
        }
    }

    match (ra, dec, story) {
        (Some(ra), Some(dec), Some(story)) if violations.is_empty() => Ok(Star {
            ra: ra.to_string(),
            dec: dec.to_string(),
            story: hex::encode(story.as_bytes()),
            magnitude: optional(&input.magnitude),
            constellation: optional(&input.constellation),
        }),
        _ => Err(violations),
    }
}

fn required<'a>(
    value: &'a Option<String>,
    field: StarField,
    violations: &mut Vec<StarViolation>,
) -> Option<&'a str> {
    match value.as_deref() {
        Some(s) if !s.trim().is_empty() => Some(s),
        _ => {
            violations.push(StarViolation::Missing { field });
            None
        }
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Check that the stored hash matches a recomputation over the block's fields.
pub fn verify_block(block: &Block) -> bool {
    block.compute_hash() == block.hash
}

/// Check that `block` points at `prev` by its stored hash and sits right above it.
pub fn verify_link(prev: &Block, block: &Block) -> bool {
    block.height == prev.height + 1 && block.previous_block_hash == Some(prev.hash)
}
