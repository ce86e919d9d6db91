//! Property-based tests for the patch layer
//!
//! These verify the contracts the gossip protocol leans on:
//!  - diff/apply correctness: apply(old, diff(old, new)) == new
//!  - reflexivity: diff(x, x) is empty
//!  - redundancy: after applying a delta, the delta is reflected

use aegs_patch::{apply, diff, is_reflected};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for arbitrary JSON documents, a few levels deep.
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map("[a-z~/]{1,4}", inner, 0..6).prop_map(|entries| {
                Value::Object(entries.into_iter().collect::<Map<String, Value>>())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn diff_then_apply_reaches_target(
        old in json_value_strategy(),
        new in json_value_strategy()
    ) {
        let delta = diff(&old, &new);
        let reached = apply(&old, &delta).expect("diff output must apply cleanly");
        prop_assert_eq!(reached, new);
    }

    #[test]
    fn diff_of_identical_documents_is_empty(doc in json_value_strategy()) {
        prop_assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn applied_delta_is_reflected(
        old in json_value_strategy(),
        new in json_value_strategy()
    ) {
        let delta = diff(&old, &new);
        let reached = apply(&old, &delta).unwrap();
        prop_assert!(is_reflected(&reached, &delta));
    }

    #[test]
    fn apply_never_mutates_input(
        old in json_value_strategy(),
        new in json_value_strategy()
    ) {
        let before = old.clone();
        let _ = apply(&old, &diff(&old, &new));
        prop_assert_eq!(old, before);
    }
}
