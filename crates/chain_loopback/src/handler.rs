//! Request handlers for ledger endpoints.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::filter::Filter;
use crate::store::{Collection, LedgerStore, Selection};
use chain_protocol::{HexBytes, Page, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Context shared by handlers.
pub struct HandlerContext {
    /// Ledger configuration.
    pub config: LedgerConfig,
    /// Ledger state.
    pub store: Arc<LedgerStore>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: LedgerConfig, store: Arc<LedgerStore>) -> Self {
        Self { config, store }
    }
}

#[derive(Deserialize)]
struct SetAssetTags {
    asset_id: String,
    #[serde(default)]
    tags: Value,
}

#[derive(Deserialize)]
struct SetAccountTags {
    account_id: String,
    #[serde(default)]
    tags: Value,
}

/// Dispatches decoded requests to the store.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles one call and returns the response body.
    pub fn handle(&self, endpoint: &str, body: &[u8]) -> LedgerResult<Value> {
        match endpoint {
            "create-asset" => self.handle_create(Collection::Assets, body),
            "create-account" => self.handle_create(Collection::Accounts, body),
            "list-assets" => self.handle_list(Collection::Assets, body),
            "list-accounts" => self.handle_list(Collection::Accounts, body),
            "list-transactions" => self.handle_list(Collection::Transactions, body),
            "set-asset-tags" => {
                let request: SetAssetTags = decode(body)?;
                self.context
                    .store
                    .set_tags(Collection::Assets, &request.asset_id, tags_or_empty(request.tags))
            }
            "set-account-tags" => {
                let request: SetAccountTags = decode(body)?;
                self.context.store.set_tags(
                    Collection::Accounts,
                    &request.account_id,
                    tags_or_empty(request.tags),
                )
            }
            "get-block" => self.handle_get_block(body),
            "get-snapshot-info" => Ok(self.snapshot_info()),
            other => Err(LedgerError::UnknownEndpoint(other.to_string())),
        }
    }

    /// Handles a batch create.
    pub fn handle_create(&self, collection: Collection, body: &[u8]) -> LedgerResult<Value> {
        let elements: Vec<Value> = decode(body)?;
        if elements.len() > self.context.config.max_batch {
            return Err(LedgerError::InvalidRequest(format!(
                "too many elements: {} > {}",
                elements.len(),
                self.context.config.max_batch
            )));
        }

        let outcomes = self.context.store.create(collection, elements);
        serde_json::to_value(outcomes).map_err(|e| LedgerError::Internal(e.to_string()))
    }

    /// Handles a list call, returning one page.
    ///
    /// The cursor is the offset of the first item of the next page within
    /// the selected items.
    pub fn handle_list(&self, collection: Collection, body: &[u8]) -> LedgerResult<Value> {
        let query: Query = if body.iter().all(u8::is_ascii_whitespace) {
            Query::new()
        } else {
            decode(body)?
        };

        let selection = Selection {
            filter: Filter::parse(query.filter().unwrap_or(""))?,
            params: query.filter_params().to_vec(),
            start_time: query.get("start_time").and_then(Value::as_u64),
            end_time: query.get("end_time").and_then(Value::as_u64),
            ascending: query
                .get("ascending_with_long_poll")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };

        let offset = match query.cursor() {
            None => 0,
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| LedgerError::InvalidRequest(format!("bad cursor {:?}", cursor)))?,
        };
        let page_size = self.context.config.page_size(query.page_size());

        let selected = self.context.store.select(collection, &selection)?;
        let total = selected.len();
        let items: Vec<Value> = selected.into_iter().skip(offset).take(page_size).collect();
        let end = offset.saturating_add(items.len());

        let mut next = query;
        next.set_cursor(end.to_string());
        let page = Page::new(items, next, end >= total);

        serde_json::to_value(page).map_err(|e| LedgerError::Internal(e.to_string()))
    }

    fn handle_get_block(&self, body: &[u8]) -> LedgerResult<Value> {
        let height: u64 = decode(body)?;
        let block = self
            .context
            .store
            .block(height)
            .ok_or(LedgerError::BlockNotReady(height))?;
        Ok(json!(HexBytes::new(block)))
    }

    /// Handles `get-snapshot`, whose answer is raw bytes rather than JSON.
    pub fn handle_get_snapshot(&self, body: &[u8]) -> LedgerResult<Vec<u8>> {
        let height: u64 = decode(body)?;
        self.context
            .store
            .snapshot(height)
            .ok_or_else(|| LedgerError::NotFound(format!("snapshot at height {}", height)))
    }

    fn snapshot_info(&self) -> Value {
        json!({
            "height": self.context.store.height(),
            "size": self.context.store.chain_size(),
            "blockchain_id": self.context.config.blockchain_id,
        })
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> LedgerResult<T> {
    chain_protocol::from_json_slice(body).map_err(|e| LedgerError::InvalidRequest(e.to_string()))
}

fn tags_or_empty(tags: Value) -> Value {
    if tags.is_null() {
        json!({})
    } else {
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_handler(page_size: usize) -> RequestHandler {
        let config = LedgerConfig::new(page_size);
        let store = Arc::new(LedgerStore::new());
        RequestHandler::new(Arc::new(HandlerContext::new(config, store)))
    }

    fn create_assets(handler: &RequestHandler, n: usize) {
        let specs: Vec<Value> = (0..n)
            .map(|i| json!({"client_token": format!("t{i}"), "alias": format!("asset-{i}")}))
            .collect();
        handler
            .handle("create-asset", json!(specs).to_string().as_bytes())
            .unwrap();
    }

    #[test]
    fn list_pagination() {
        let handler = create_handler(2);
        create_assets(&handler, 5);

        let page = handler.handle("list-assets", b"{}").unwrap();
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
        assert_eq!(page["last_page"], json!(false));
        assert_eq!(page["next"]["after"], json!("2"));

        let page = handler
            .handle("list-assets", page["next"].to_string().as_bytes())
            .unwrap();
        assert_eq!(page["items"][0]["alias"], json!("asset-2"));
        assert_eq!(page["next"]["after"], json!("4"));

        let page = handler
            .handle("list-assets", page["next"].to_string().as_bytes())
            .unwrap();
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
        assert_eq!(page["last_page"], json!(true));
    }

    #[test]
    fn list_filters_and_keeps_criteria_in_next() {
        let handler = create_handler(10);
        create_assets(&handler, 3);

        let query = json!({"filter": "alias=$1", "filter_params": ["asset-1"]});
        let page = handler
            .handle("list-assets", query.to_string().as_bytes())
            .unwrap();
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
        assert_eq!(page["next"]["filter"], json!("alias=$1"));
        assert_eq!(page["last_page"], json!(true));
    }

    #[test]
    fn empty_result_is_last_page() {
        let handler = create_handler(10);
        let page = handler
            .handle("list-assets", br#"{"filter": "alias='gold'"}"#)
            .unwrap();
        assert_eq!(page["items"], json!([]));
        assert_eq!(page["last_page"], json!(true));
    }

    #[test]
    fn bad_cursor_and_filter() {
        let handler = create_handler(10);
        let err = handler.handle("list-assets", br#"{"after": "x"}"#).unwrap_err();
        assert_eq!(err.code(), "CH003");
        let err = handler.handle("list-assets", br#"{"filter": "alias="}"#).unwrap_err();
        assert_eq!(err.code(), "CH602");
        let err = handler
            .handle("list-assets", br#"{"filter": "alias=$1"}"#)
            .unwrap_err();
        assert_eq!(err.code(), "CH602");
    }

    #[test]
    fn create_rejects_non_array() {
        let handler = create_handler(10);
        let err = handler.handle("create-asset", b"{}").unwrap_err();
        assert_eq!(err.code(), "CH003");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn get_block_and_snapshot() {
        let handler = create_handler(10);
        let block = handler.handle("get-block", b"1").unwrap();
        assert!(block.as_str().unwrap().starts_with("01"));

        let err = handler.handle("get-block", b"5").unwrap_err();
        assert!(err.is_temporary());

        let info = handler.handle("get-snapshot-info", b"{}").unwrap();
        assert_eq!(info["height"], json!(1));
        assert_eq!(info["size"], json!(13));
        assert_eq!(info["blockchain_id"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn set_tags_endpoints() {
        let handler = create_handler(10);
        let created = handler
            .handle("create-account", br#"[{"client_token": "t1", "alias": "alice"}]"#)
            .unwrap();
        let id = created[0]["id"].as_str().unwrap();

        let body = json!({"account_id": id, "tags": {"team": "ops"}}).to_string();
        let updated = handler.handle("set-account-tags", body.as_bytes()).unwrap();
        assert_eq!(updated["tags"]["team"], json!("ops"));

        let err = handler
            .handle("set-asset-tags", br#"{"asset_id": "nope", "tags": {}}"#)
            .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn unknown_endpoint() {
        let handler = create_handler(10);
        let err = handler.handle("list-widgets", b"{}").unwrap_err();
        assert_eq!(err.status(), 404);
    }

    proptest::proptest! {
        #[test]
        fn pages_cover_selection_once(count in 0usize..25, page_size in 1usize..8) {
            let handler = create_handler(page_size);
            create_assets(&handler, count);

            let mut seen = Vec::new();
            let mut query = json!({});
            loop {
                let page = handler.handle("list-assets", query.to_string().as_bytes()).unwrap();
                for item in page["items"].as_array().unwrap() {
                    seen.push(item["alias"].as_str().unwrap().to_string());
                }
                if page["last_page"] == json!(true) {
                    break;
                }
                query = page["next"].clone();
            }

            let expected: Vec<String> = (0..count).map(|i| format!("asset-{i}")).collect();
            proptest::prop_assert_eq!(seen, expected);
        }
    }
}
