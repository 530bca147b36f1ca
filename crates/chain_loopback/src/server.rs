//! The loopback ledger.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::{Collection, LedgerStore};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Endpoint answered with raw snapshot bytes instead of JSON.
pub const GET_SNAPSHOT: &str = "get-snapshot";

/// A response ready to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerResponse {
    /// HTTP status.
    pub status: u16,
    /// JSON body.
    pub body: Vec<u8>,
    /// `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
}

impl LedgerResponse {
    fn from_error(err: &LedgerError, retry_after: Option<u64>) -> Self {
        let body = chain_protocol::to_json_vec(&err.to_record()).unwrap_or_default();
        Self {
            status: err.status(),
            body,
            retry_after: if err.is_temporary() { retry_after } else { None },
        }
    }
}

/// A call the ledger received.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedCall {
    /// Endpoint name.
    pub endpoint: String,
    /// Request body.
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
struct Faults {
    /// Calls to refuse before processing.
    fail_next: u32,
    /// Calls to process and then report as failed.
    lose_next: u32,
}

/// An in-process ledger speaking the JSON RPC protocol.
///
/// It keeps everything in memory and answers synchronously. Fault
/// injection makes it refuse calls or drop responses, so retry and
/// idempotency behavior can be observed end to end.
///
/// # Example
///
/// ```
/// use chain_loopback::{LedgerConfig, LoopbackLedger};
///
/// let ledger = LoopbackLedger::new(LedgerConfig::default());
/// let response = ledger.handle_post("list-assets", b"{}");
/// assert_eq!(response.status, 200);
/// ```
pub struct LoopbackLedger {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<LoggedCall>>,
}

impl LoopbackLedger {
    /// Creates an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_store(config, Arc::new(LedgerStore::new()))
    }

    /// Creates a ledger over an existing store.
    pub fn with_store(config: LedgerConfig, store: Arc<LedgerStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self {
            handler,
            context,
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Handles a POST to `endpoint`.
    ///
    /// A leading `/` on the endpoint is ignored.
    pub fn handle_post(&self, endpoint: &str, body: &[u8]) -> LedgerResponse {
        let endpoint = endpoint.trim_start_matches('/');
        self.calls.lock().push(LoggedCall {
            endpoint: endpoint.to_string(),
            body: body.to_vec(),
        });

        let retry_after = self.context.config.retry_after_secs;
        if take_fault(&mut self.faults.lock().fail_next) {
            warn!(endpoint, "injected failure before processing");
            return LedgerResponse::from_error(&LedgerError::Unavailable, retry_after);
        }

        let result = match endpoint {
            GET_SNAPSHOT => self.handler.handle_get_snapshot(body),
            _ => self.handler.handle(endpoint, body).and_then(|value| {
                chain_protocol::to_json_vec(&value).map_err(|e| LedgerError::Internal(e.to_string()))
            }),
        };

        if take_fault(&mut self.faults.lock().lose_next) {
            warn!(endpoint, "injected failure after processing");
            return LedgerResponse::from_error(&LedgerError::Unavailable, retry_after);
        }

        match result {
            Ok(body) => {
                debug!(endpoint, bytes = body.len(), "handled call");
                LedgerResponse {
                    status: 200,
                    body,
                    retry_after: None,
                }
            }
            Err(err) => {
                debug!(endpoint, code = err.code(), "call failed");
                LedgerResponse::from_error(&err, retry_after)
            }
        }
    }

    /// Refuses the next `n` calls with a temporary error, without
    /// processing them.
    pub fn fail_next(&self, n: u32) {
        self.faults.lock().fail_next = n;
    }

    /// Processes the next `n` calls but answers them with a temporary
    /// error, as if the response was lost.
    pub fn lose_next_responses(&self, n: u32) {
        self.faults.lock().lose_next = n;
    }

    /// Adds transactions to the ledger.
    pub fn seed_transactions(&self, transactions: Vec<Value>) -> Result<(), LedgerError> {
        self.context.store.seed_transactions(transactions)
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<LoggedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls received for `endpoint`.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    /// Returns the number of stored objects of a kind.
    pub fn count(&self, collection: Collection) -> usize {
        self.context.store.count(collection)
    }

    /// Returns the current block height.
    pub fn height(&self) -> u64 {
        self.context.store.height()
    }

    /// Returns the shared store.
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.context.store
    }
}

fn take_fault(remaining: &mut u32) -> bool {
    if *remaining > 0 {
        *remaining -= 1;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_protocol::ErrorRecord;
    use serde_json::json;

    fn record(response: &LedgerResponse) -> ErrorRecord {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn ledger_lifecycle() {
        let ledger = LoopbackLedger::new(LedgerConfig::default());
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.count(Collection::Assets), 0);
        assert!(ledger.calls().is_empty());
    }

    #[test]
    fn create_and_list() {
        let ledger = LoopbackLedger::new(LedgerConfig::default());
        let body = json!([{"client_token": "t1", "alias": "gold"}]).to_string();

        let response = ledger.handle_post("/create-asset", body.as_bytes());
        assert_eq!(response.status, 200);

        let response = ledger.handle_post("list-assets", b"{}");
        let page: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(page["items"][0]["alias"], json!("gold"));
        assert_eq!(ledger.call_count("create-asset"), 1);
    }

    #[test]
    fn errors_carry_records() {
        let ledger = LoopbackLedger::new(LedgerConfig::default());
        let response = ledger.handle_post("create-asset", b"not json");
        assert_eq!(response.status, 400);
        assert_eq!(record(&response).code, "CH003");
        assert_eq!(record(&response).temporary, Some(false));
    }

    #[test]
    fn fail_next_skips_processing() {
        let ledger = LoopbackLedger::new(LedgerConfig::default().with_retry_after(1));
        ledger.fail_next(1);
        let body = json!([{"client_token": "t1"}]).to_string();

        let response = ledger.handle_post("create-asset", body.as_bytes());
        assert_eq!(response.status, 503);
        assert_eq!(response.retry_after, Some(1));
        assert_eq!(record(&response).temporary, Some(true));
        assert_eq!(ledger.count(Collection::Assets), 0);

        let response = ledger.handle_post("create-asset", body.as_bytes());
        assert_eq!(response.status, 200);
        assert_eq!(ledger.count(Collection::Assets), 1);
    }

    #[test]
    fn lost_response_still_commits() {
        let ledger = LoopbackLedger::new(LedgerConfig::default());
        ledger.lose_next_responses(1);
        let body = json!([{"client_token": "t1", "alias": "gold"}]).to_string();

        let lost = ledger.handle_post("create-asset", body.as_bytes());
        assert_eq!(lost.status, 503);
        assert_eq!(ledger.count(Collection::Assets), 1);

        let replay = ledger.handle_post("create-asset", body.as_bytes());
        let outcomes: Value = serde_json::from_slice(&replay.body).unwrap();
        assert_eq!(outcomes[0]["alias"], json!("gold"));
        assert_eq!(ledger.count(Collection::Assets), 1);
    }

    #[test]
    fn snapshot_is_raw_blocks() {
        let ledger = LoopbackLedger::new(LedgerConfig::default());
        ledger
            .seed_transactions(vec![json!({"id": "tx1"})])
            .unwrap();

        let response = ledger.handle_post(GET_SNAPSHOT, b"2");
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len() as u64, ledger.store().chain_size());
        assert_eq!(&response.body[1..9], &1u64.to_be_bytes());

        let missing = ledger.handle_post(GET_SNAPSHOT, b"9");
        assert_eq!(missing.status, 404);
        assert_eq!(record(&missing).code, "CH002");
    }

    #[test]
    fn shared_store() {
        let store = Arc::new(LedgerStore::new());
        let ledger = LoopbackLedger::with_store(LedgerConfig::default(), Arc::clone(&store));
        ledger
            .seed_transactions(vec![json!({"id": "tx1"})])
            .unwrap();
        assert_eq!(store.count(Collection::Transactions), 1);
        assert_eq!(store.height(), 2);
    }
}
