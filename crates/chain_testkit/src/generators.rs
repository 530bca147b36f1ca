//! Property-based test generators using proptest.

use chain_client::{AccountBuilder, AssetBuilder};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for aliases accepted by the ledger.
pub fn alias_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for flat tag maps with string and integer values.
pub fn tags_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
        prop_oneof![
            prop::string::string_regex("[a-z0-9 ]{0,12}")
                .expect("Invalid regex")
                .prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
        ],
        0..4,
    )
    .prop_map(|tags| tags.into_iter().collect())
}

/// Strategy for root xpub lists with a valid quorum.
pub fn keys_strategy() -> impl Strategy<Value = (Vec<String>, u32)> {
    prop::collection::vec(
        prop::string::string_regex("xpub[0-9a-f]{8}").expect("Invalid regex"),
        1..4,
    )
    .prop_flat_map(|xpubs| {
        let n = xpubs.len() as u32;
        (Just(xpubs), 1..=n)
    })
}

/// Strategy for valid asset specifications without an alias.
pub fn asset_spec_strategy() -> impl Strategy<Value = AssetBuilder> {
    (tags_strategy(), tags_strategy(), keys_strategy()).prop_map(|(definition, tags, (xpubs, quorum))| {
        AssetBuilder::new()
            .with_definition(definition)
            .with_tags(tags)
            .with_root_xpubs(xpubs)
            .with_quorum(quorum)
    })
}

/// Strategy for valid account specifications without an alias.
pub fn account_spec_strategy() -> impl Strategy<Value = AccountBuilder> {
    (tags_strategy(), keys_strategy()).prop_map(|(tags, (xpubs, quorum))| {
        xpubs
            .into_iter()
            .fold(AccountBuilder::new().with_tags(tags), |spec, xpub| spec.with_root_xpub(xpub))
            .with_quorum(quorum)
    })
}

/// Strategy for page sizes.
pub fn page_size_strategy() -> impl Strategy<Value = u64> {
    1u64..10
}
