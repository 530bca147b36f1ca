//! Pagination tests against the loopback ledger.

use chain_client::{Asset, AssetBuilder, Client, QueryBuilder, Transaction};
use chain_loopback::LedgerConfig;
use chain_testkit::{page_size_strategy, TestLedger};
use futures::StreamExt;
use proptest::prelude::*;
use serde_json::json;

async fn create_assets(client: &Client, count: usize) -> Vec<String> {
    let specs: Vec<AssetBuilder> = (0..count)
        .map(|i| {
            AssetBuilder::new()
                .with_alias(format!("asset-{i}"))
                .with_tag("parity", if i % 2 == 0 { "even" } else { "odd" })
        })
        .collect();
    let response = AssetBuilder::create_batch(client, &specs).await.unwrap();
    assert!(response.all_succeeded());
    (0..count).map(|i| format!("asset-{i}")).collect()
}

fn aliases(assets: &[Asset]) -> Vec<String> {
    assets.iter().filter_map(|a| a.alias.clone()).collect()
}

#[tokio::test]
async fn empty_result_is_exhausted_after_first_fetch() {
    let fixture = TestLedger::new();

    let mut pager = Asset::query()
        .with_filter("alias=$1")
        .with_filter_param("gold")
        .execute(&fixture.client)
        .await
        .unwrap();

    assert_eq!(pager.buffered_len(), 0);
    assert!(pager.is_exhausted());

    let page = pager.fetch_next_page().await.unwrap();
    assert!(page.is_empty());
    assert!(page.last_page);
    assert_eq!(fixture.ledger.call_count("list-assets"), 1);
}

#[tokio::test]
async fn pages_concatenate_to_full_result() {
    let fixture = TestLedger::new();
    let expected = create_assets(&fixture.client, 7).await;

    let pager = Asset::query()
        .with_page_size(3)
        .execute(&fixture.client)
        .await
        .unwrap();
    let assets = pager.collect_all().await.unwrap();

    assert_eq!(aliases(&assets), expected);
    assert_eq!(fixture.ledger.call_count("list-assets"), 3);
}

#[tokio::test]
async fn stream_yields_filtered_items_across_pages() {
    let fixture = TestLedger::new();
    create_assets(&fixture.client, 9).await;

    let pager = Asset::query()
        .with_filter("tags.parity=$1")
        .with_filter_param("even")
        .with_page_size(2)
        .execute(&fixture.client)
        .await
        .unwrap();
    let assets: Vec<Asset> = pager.into_items().map(|item| item.unwrap()).collect().await;

    assert_eq!(
        aliases(&assets),
        vec!["asset-0", "asset-2", "asset-4", "asset-6", "asset-8"]
    );
}

#[tokio::test]
async fn manual_page_walk_sends_cursor() {
    let fixture = TestLedger::new();
    create_assets(&fixture.client, 4).await;

    let mut pager = Asset::query()
        .with_page_size(2)
        .execute(&fixture.client)
        .await
        .unwrap();
    assert_eq!(pager.buffered_len(), 2);
    assert_eq!(pager.query().cursor(), Some("2"));

    let second = pager.fetch_next_page().await.unwrap();
    assert_eq!(aliases(&second.items), vec!["asset-2", "asset-3"]);

    let calls = fixture.ledger.calls();
    let last: serde_json::Value = serde_json::from_slice(&calls[calls.len() - 1].body).unwrap();
    assert_eq!(last, json!({"page_size": 2, "after": "2"}));
}

#[tokio::test]
async fn builder_changes_do_not_reach_running_pager() {
    let fixture = TestLedger::new();
    create_assets(&fixture.client, 3).await;

    let builder: QueryBuilder<Asset> = Asset::query().with_page_size(1);
    let mut pager = builder.execute(&fixture.client).await.unwrap();
    let builder = builder.with_filter("alias=$1").with_filter_param("asset-2");

    let mut seen = Vec::new();
    while let Some(asset) = pager.next_item().await {
        seen.push(asset.unwrap().alias.unwrap());
    }
    assert_eq!(seen, vec!["asset-0", "asset-1", "asset-2"]);

    let filtered = builder.execute(&fixture.client).await.unwrap().collect_all().await.unwrap();
    assert_eq!(aliases(&filtered), vec!["asset-2"]);
}

#[tokio::test]
async fn transactions_respect_order_and_window() {
    let fixture = TestLedger::new();
    fixture
        .ledger
        .seed_transactions(
            (1..=5)
                .map(|i| json!({"id": format!("tx{i}"), "timestamp": i * 100}))
                .collect(),
        )
        .unwrap();

    let newest_first = Transaction::query()
        .with_page_size(2)
        .execute(&fixture.client)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let ids: Vec<_> = newest_first.iter().map(|tx| tx.id.as_str()).collect();
    assert_eq!(ids, vec!["tx5", "tx4", "tx3", "tx2", "tx1"]);

    let window = Transaction::query()
        .with_start_time(200)
        .with_end_time(400)
        .with_ascending_with_long_poll()
        .execute(&fixture.client)
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let ids: Vec<_> = window.iter().map(|tx| tx.id.as_str()).collect();
    assert_eq!(ids, vec!["tx2", "tx3", "tx4"]);
    assert!(window.iter().all(|tx| tx.block_height >= 2));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_page_size_sees_each_item_once(count in 0usize..12, page_size in page_size_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (seen, expected) = runtime.block_on(async {
            let fixture = TestLedger::with_config(LedgerConfig::new(5), 3);
            let expected = create_assets(&fixture.client, count).await;
            let assets = Asset::query()
                .with_page_size(page_size)
                .execute(&fixture.client)
                .await
                .unwrap()
                .collect_all()
                .await
                .unwrap();
            (aliases(&assets), expected)
        });

        prop_assert_eq!(seen, expected);
    }
}
