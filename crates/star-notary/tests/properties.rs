//! Property tests over the registration path.

use std::sync::Arc;

use proptest::prelude::*;
use star_notary::core::SignatureVerifier;
use star_notary::store::MemoryStore;
use star_notary::{ManualClock, Notary, NotaryConfig, StarInput};

struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _: &str, _: &str, _: &str) -> bool {
        true
    }
}

fn field(max_chars: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-zA-Z0-9°'\". ]{{0,{}}}", max_chars))
        .expect("valid field regex")
        .prop_filter("required fields are non-blank", |s| !s.trim().is_empty())
}

fn star_input() -> impl Strategy<Value = StarInput> {
    (
        field(16),
        field(16),
        "[^\\p{C}]{1,120}".prop_filter("non-blank story", |s| !s.trim().is_empty()),
        proptest::option::of(field(6)),
    )
        .prop_map(|(ra, dec, story, magnitude)| StarInput {
            magnitude,
            ..StarInput::new(ra, dec, story)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_registrations_keep_chain_dense_and_clean(
        inputs in prop::collection::vec(star_input(), 1..12),
        step in 0i64..600,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let clock = Arc::new(ManualClock::new(1_700_000_000));
            let notary = Notary::open_with(
                MemoryStore::new(),
                NotaryConfig::default(),
                Arc::new(AcceptAll),
                clock.clone(),
            )
            .await
            .unwrap();

            for (i, input) in inputs.iter().enumerate() {
                let address = format!("owner-{}", i % 3);
                notary.request_validation(&address);
                notary.validate_signature(&address, "sig").unwrap();
                clock.advance(step);

                let block = notary.add_block(&address, input).await.unwrap();
                assert_eq!(block.height, i as u64 + 1);
                assert_eq!(
                    block.body.unwrap().star.story_decoded.as_deref(),
                    input.story.as_deref()
                );
            }

            assert_eq!(notary.height().await.unwrap(), Some(inputs.len() as u64));
            assert!(notary.verify_chain().await.unwrap().is_empty());
        });
    }
}
