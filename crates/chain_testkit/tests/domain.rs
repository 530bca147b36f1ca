//! Tag updates and core RPCs against the loopback ledger.

use chain_client::{
    Account, AccountBuilder, Asset, AssetBuilder, RawBlock, RawSnapshot, SnapshotInfo,
};
use chain_loopback::LedgerConfig;
use chain_testkit::TestLedger;
use serde_json::json;

#[tokio::test]
async fn asset_tags_round_trip_through_ledger() {
    let fixture = TestLedger::new();
    let asset = AssetBuilder::new()
        .with_alias("gold")
        .with_tag("class", "metal")
        .create(&fixture.client)
        .await
        .unwrap();

    let updated = asset
        .add_tag("grade", 1)
        .remove_tag("class")
        .update_tags(&fixture.client)
        .await
        .unwrap();
    assert_eq!(json!(updated.tags), json!({"grade": 1}));

    let listed = Asset::query()
        .with_filter("tags.grade=$1")
        .with_filter_param(1)
        .execute(&fixture.client)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, updated.id);
}

#[tokio::test]
async fn account_tags_replace_all() {
    let fixture = TestLedger::new();
    let account = AccountBuilder::new()
        .with_alias("alice")
        .with_root_xpub("xpub-a")
        .with_tag("team", "ops")
        .create(&fixture.client)
        .await
        .unwrap();

    let updated = account
        .set_tags(serde_json::Map::new())
        .update_tags(&fixture.client)
        .await
        .unwrap();
    assert!(updated.tags.is_empty());

    let listed: Vec<Account> = Account::query()
        .execute(&fixture.client)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert!(listed[0].tags.is_empty());
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let fixture = TestLedger::new();
    let ghost: Asset = serde_json::from_value(json!({"id": "ghost"})).unwrap();

    let err = ghost.update_tags(&fixture.client).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.code(), "CH002");
    assert_eq!(fixture.ledger.call_count("set-asset-tags"), 1);
}

#[tokio::test]
async fn snapshot_tracks_height() {
    let fixture = TestLedger::with_config(LedgerConfig::default().with_blockchain_id(vec![0xab; 32]), 3);

    let before = SnapshotInfo::fetch(&fixture.client).await.unwrap();
    assert_eq!(before.height, 1);
    assert_eq!(before.blockchain_id.to_hex(), "ab".repeat(32));

    AssetBuilder::new().create(&fixture.client).await.unwrap();

    let after = SnapshotInfo::fetch(&fixture.client).await.unwrap();
    assert_eq!(after.height, 2);
    assert!(after.size > before.size);
}

#[tokio::test]
async fn blocks_exist_up_to_height() {
    let fixture = TestLedger::new();
    AssetBuilder::new().create(&fixture.client).await.unwrap();

    let genesis = RawBlock::fetch(&fixture.client, 1).await.unwrap();
    let latest = RawBlock::fetch(&fixture.client, 2).await.unwrap();

    assert_eq!(genesis.as_bytes()[0], 1);
    assert_eq!(&latest.as_bytes()[1..9], &2u64.to_be_bytes());
}

#[tokio::test]
async fn snapshot_bytes_match_reported_size() {
    let fixture = TestLedger::new();
    AssetBuilder::new().create(&fixture.client).await.unwrap();

    let info = SnapshotInfo::fetch(&fixture.client).await.unwrap();
    let snapshot = RawSnapshot::fetch(&fixture.client, info.height).await.unwrap();
    assert_eq!(snapshot.as_bytes().len() as u64, info.size);

    let genesis = RawBlock::fetch(&fixture.client, 1).await.unwrap();
    assert!(snapshot.as_bytes().starts_with(genesis.as_bytes()));

    let err = RawSnapshot::fetch(&fixture.client, 42).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(fixture.ledger.call_count("get-snapshot"), 2);
}
