//! Property-based tests for text normalization, fingerprints, and the
//! deterministic embedder.

use proptest::prelude::*;
use rank_retrieve::embed::{DeterministicHashEmbedder, Embedder};
use rank_retrieve::fingerprint::exact_hash;
use rank_retrieve::text::tokenize;

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,60}"
}

proptest! {
    #[test]
    fn embedding_is_a_pure_function_of_text_and_dim(text in arb_text(), dim in 1usize..256) {
        let embedder = DeterministicHashEmbedder::new(dim);
        let a = embedder.encode(&text);
        let b = embedder.encode(&text);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn embedding_is_unit_norm_unless_textless(text in arb_text(), dim in 8usize..256) {
        let embedder = DeterministicHashEmbedder::new(dim);
        let v = embedder.encode(&text);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if tokenize(&text).is_empty() {
            prop_assert!(v.iter().all(|x| *x == 0.0));
        } else {
            prop_assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
        }
    }

    #[test]
    fn exact_hash_is_invariant_to_case_and_whitespace(stem in "[a-zA-Z]{1,20}( [a-zA-Z]{1,20}){0,5}") {
        let padded = format!("  {}  ", stem.to_uppercase());
        let a = exact_hash(&stem, &[], None);
        let b = exact_hash(&padded, &[], None);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn exact_hash_differs_when_answer_differs(stem in "[a-zA-Z]{3,20}") {
        let a = exact_hash(&stem, &[], Some("A"));
        let b = exact_hash(&stem, &[], Some("B"));
        prop_assert_ne!(a, b);
    }
}
