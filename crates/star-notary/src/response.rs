//! Response contract handed to the transport layer.
//!
//! Success values serialize as themselves; failures as
//! `{ "error": <kind>, "message": ..., "fields": [...] }`. Keys are camelCase.

use serde::Serialize;
use star_notary_core::{Block, Star, StarField, StarViolation};

use crate::error::{ErrorKind, NotaryError};
use crate::registry::ValidationRequest;

/// Either the operation's value or a failure object.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Ok(T),
    Failure(Failure),
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl<T> From<Result<T, NotaryError>> for Response<T> {
    fn from(result: Result<T, NotaryError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Failure(Failure::from(&e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<StarField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<StarViolation>,
}

impl From<&NotaryError> for Failure {
    fn from(e: &NotaryError) -> Self {
        Self {
            error: e.kind(),
            message: e.to_string(),
            fields: e.fields(),
            violations: e.violations().to_vec(),
        }
    }
}

/// Result of a successful signature validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureValidation {
    pub register_star: bool,
    pub status: ValidationRequest,
}

/// A block as returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    pub hash: String,
    pub height: u64,
    pub body: Option<BodyView>,
    pub time: i64,

    /// Empty string for genesis.
    pub previous_block_hash: String,

    /// Whether the stored hash matched a recomputation, when checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyView {
    pub address: String,
    pub star: StarView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarView {
    pub ra: String,
    pub dec: String,

    /// Hex, as stored.
    pub story: String,

    /// `None` when the stored story is not valid hex of UTF-8 text.
    pub story_decoded: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub constellation: Option<String>,
}

impl From<&Star> for StarView {
    fn from(star: &Star) -> Self {
        Self {
            ra: star.ra.clone(),
            dec: star.dec.clone(),
            story: star.story.clone(),
            story_decoded: star.decoded_story().ok(),
            magnitude: star.magnitude.clone(),
            constellation: star.constellation.clone(),
        }
    }
}

impl BlockView {
    pub fn new(block: &Block, verified: Option<bool>) -> Self {
        Self {
            hash: block.hash.to_hex(),
            height: block.height,
            body: block.body.as_ref().map(|body| BodyView {
                address: body.address.clone(),
                star: StarView::from(&body.star),
            }),
            time: block.time,
            previous_block_hash: block
                .previous_block_hash
                .map(|h| h.to_hex())
                .unwrap_or_default(),
            verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use star_notary_core::{BlockBuilder, CoreError};

    #[test]
    fn test_genesis_view() {
        let genesis = Block::genesis(1_700_000_000);
        let json = serde_json::to_value(BlockView::new(&genesis, Some(true))).unwrap();

        assert_eq!(json["height"], 0);
        assert_eq!(json["previousBlockHash"], "");
        assert!(json["body"].is_null());
        assert_eq!(json["verified"], true);
        assert_eq!(json["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_star_view_decodes_story() {
        let genesis = Block::genesis(0);
        let star = Star {
            ra: "ra".into(),
            dec: "dec".into(),
            story: hex::encode("Étoile ✨"),
            magnitude: None,
            constellation: Some("Orion".into()),
        };
        let block = BlockBuilder::on_top_of(&genesis).time(1).body("addr", star).seal();
        let json = serde_json::to_value(BlockView::new(&block, None)).unwrap();

        assert_eq!(json["previousBlockHash"], genesis.hash.to_hex());
        assert_eq!(json["body"]["address"], "addr");
        assert_eq!(json["body"]["star"]["story"], hex::encode("Étoile ✨"));
        assert_eq!(json["body"]["star"]["storyDecoded"], "Étoile ✨");
        assert_eq!(json["body"]["star"]["constellation"], "Orion");
        assert!(json["body"]["star"].get("magnitude").is_none());
        assert!(json.get("verified").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let result: Result<BlockView, _> = Err(NotaryError::from(RegistryError::NotFound(
            "addr".into(),
        )));
        let json = serde_json::to_value(Response::from(result)).unwrap();
        assert_eq!(json["error"], "NotFound");
        assert!(json["message"].as_str().unwrap().contains("addr"));
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn test_invalid_star_failure_lists_fields() {
        let err = NotaryError::from(CoreError::InvalidStar(vec![
            StarViolation::Missing {
                field: StarField::Dec,
            },
        ]));
        let json = serde_json::to_value(Failure::from(&err)).unwrap();
        assert_eq!(json["error"], "InvalidInput");
        assert_eq!(json["fields"], serde_json::json!(["dec"]));
        assert_eq!(json["violations"][0]["violation"], "missing");
    }

    #[test]
    fn test_ok_is_transparent() {
        let response: Response<Vec<u64>> = Response::from(Ok(vec![1, 2]));
        assert!(response.is_ok());
        assert_eq!(serde_json::to_value(response).unwrap(), serde_json::json!([1, 2]));
    }
}
