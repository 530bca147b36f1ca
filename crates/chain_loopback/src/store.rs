//! In-memory ledger state.

use crate::error::{LedgerError, LedgerResult};
use crate::filter::Filter;
use chain_protocol::{HexBytes, Outcome, CLIENT_TOKEN_FIELD};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// The kinds of object the ledger stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Assets.
    Assets,
    /// Accounts.
    Accounts,
    /// Transactions.
    Transactions,
}

impl Collection {
    fn id_tag(self) -> u8 {
        match self {
            Collection::Assets => 0xa5,
            Collection::Accounts => 0xac,
            Collection::Transactions => 0x7c,
        }
    }
}

/// Which part of a collection a list call wants.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Filter over the stored JSON objects.
    pub filter: Filter,
    /// Values for the filter's `$N` placeholders.
    pub params: Vec<Value>,
    /// Earliest timestamp, inclusive.
    pub start_time: Option<u64>,
    /// Latest timestamp, inclusive.
    pub end_time: Option<u64>,
    /// Oldest-first instead of newest-first. Transactions only.
    pub ascending: bool,
}

/// Ledger state.
///
/// Every call that changes state appends a block, so the height tracks the
/// number of state changes since genesis.
pub struct LedgerStore {
    state: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    assets: Vec<Value>,
    accounts: Vec<Value>,
    transactions: Vec<Value>,
    /// Successful create results by (collection, client token).
    tokens: HashMap<(Collection, String), Value>,
    /// Raw blocks; index 0 holds height 1.
    blocks: Vec<Vec<u8>>,
    next_seq: u64,
}

impl LedgerState {
    fn items(&self, collection: Collection) -> &Vec<Value> {
        match collection {
            Collection::Assets => &self.assets,
            Collection::Accounts => &self.accounts,
            Collection::Transactions => &self.transactions,
        }
    }

    fn items_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Assets => &mut self.assets,
            Collection::Accounts => &mut self.accounts,
            Collection::Transactions => &mut self.transactions,
        }
    }

    fn next_id(&mut self, collection: Collection) -> String {
        self.next_seq += 1;
        format!("{:02x}{:062x}", collection.id_tag(), self.next_seq)
    }

    fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn push_block(&mut self, changes: usize) -> u64 {
        let height = self.height() + 1;
        self.blocks.push(encode_block(height, changes));
        height
    }

    fn alias_taken(&self, collection: Collection, alias: &str) -> bool {
        self.items(collection)
            .iter()
            .any(|item| item.get("alias").and_then(Value::as_str) == Some(alias))
    }
}

/// Serializes a block: version byte, height, change count.
fn encode_block(height: u64, changes: usize) -> Vec<u8> {
    let mut block = Vec::with_capacity(13);
    block.push(1);
    block.extend_from_slice(&height.to_be_bytes());
    block.extend_from_slice(&(changes as u32).to_be_bytes());
    block
}

impl LedgerStore {
    /// Creates a store holding only the genesis block.
    pub fn new() -> Self {
        let mut state = LedgerState::default();
        state.push_block(0);
        Self {
            state: RwLock::new(state),
        }
    }

    /// Returns the current block height.
    pub fn height(&self) -> u64 {
        self.state.read().height()
    }

    /// Returns the raw block at `height`, if it exists.
    pub fn block(&self, height: u64) -> Option<Vec<u8>> {
        let index = usize::try_from(height.checked_sub(1)?).ok()?;
        self.state.read().blocks.get(index).cloned()
    }

    /// Returns the snapshot at `height`: every block up to and including it.
    pub fn snapshot(&self, height: u64) -> Option<Vec<u8>> {
        let end = usize::try_from(height).ok()?;
        let state = self.state.read();
        if end == 0 || end > state.blocks.len() {
            return None;
        }
        Some(state.blocks[..end].concat())
    }

    /// Returns the total size of all blocks, in bytes.
    pub fn chain_size(&self) -> u64 {
        self.state.read().blocks.iter().map(|b| b.len() as u64).sum()
    }

    /// Returns the number of objects in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        self.state.read().items(collection).len()
    }

    /// Creates a batch of assets or accounts.
    ///
    /// Each element is validated on its own; a failure affects only its own
    /// position. An element whose client token already produced an object
    /// returns that object again instead of creating a second one.
    pub fn create(&self, collection: Collection, elements: Vec<Value>) -> Vec<Outcome<Value>> {
        let mut state = self.state.write();
        let mut created = 0;

        let outcomes: Vec<Outcome<Value>> = elements
            .into_iter()
            .map(|element| {
                let result = create_one(&mut state, collection, element);
                if let Ok((_, true)) = result {
                    created += 1;
                }
                Outcome::from(
                    result
                        .map(|(object, _)| object)
                        .map_err(|err| err.to_record()),
                )
            })
            .collect();

        if created > 0 {
            state.push_block(created);
        }
        outcomes
    }

    /// Replaces the tags of the object with the given id.
    pub fn set_tags(&self, collection: Collection, id: &str, tags: Value) -> LedgerResult<Value> {
        if !tags.is_object() {
            return Err(LedgerError::InvalidRequest("tags must be an object".into()));
        }

        let mut state = self.state.write();
        let object = state
            .items_mut(collection)
            .iter_mut()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        object["tags"] = tags;
        let updated = object.clone();
        state.push_block(1);
        Ok(updated)
    }

    /// Returns the selected objects in list order.
    pub fn select(&self, collection: Collection, selection: &Selection) -> LedgerResult<Vec<Value>> {
        selection.filter.check_params(&selection.params)?;

        let state = self.state.read();
        let in_window = |item: &Value| {
            let ts = item.get("timestamp").and_then(Value::as_u64).unwrap_or(0);
            selection.start_time.map_or(true, |start| ts >= start)
                && selection.end_time.map_or(true, |end| end == 0 || ts <= end)
        };

        let mut items: Vec<Value> = state
            .items(collection)
            .iter()
            .filter(|item| in_window(*item))
            .filter(|item| selection.filter.matches(item, &selection.params))
            .cloned()
            .collect();

        if collection == Collection::Transactions && !selection.ascending {
            items.reverse();
        }
        Ok(items)
    }

    /// Records transactions, one block each.
    ///
    /// Missing `id`, `block_height`, `block_id`, `position` and `timestamp`
    /// fields are filled in.
    pub fn seed_transactions(&self, transactions: Vec<Value>) -> LedgerResult<()> {
        let mut state = self.state.write();

        for tx in transactions {
            let Value::Object(mut tx) = tx else {
                return Err(LedgerError::InvalidRequest("transaction must be an object".into()));
            };

            let height = state.push_block(1);
            if !tx.contains_key("id") {
                let id = state.next_id(Collection::Transactions);
                tx.insert("id".into(), json!(id));
            }
            tx.entry("block_height").or_insert(json!(height));
            tx.entry("block_id")
                .or_insert_with(|| json!(format!("{:064x}", height)));
            tx.entry("position").or_insert(json!(0));
            tx.entry("timestamp").or_insert(json!(height * 1000));
            state.transactions.push(Value::Object(tx));
        }
        Ok(())
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates one object, returning it and whether it is new.
fn create_one(
    state: &mut LedgerState,
    collection: Collection,
    element: Value,
) -> LedgerResult<(Value, bool)> {
    let Value::Object(spec) = element else {
        return Err(LedgerError::InvalidRequest("element must be an object".into()));
    };

    let token = match spec.get(CLIENT_TOKEN_FIELD) {
        Some(Value::String(token)) if !token.is_empty() => token.clone(),
        _ => {
            return Err(LedgerError::InvalidRequest(format!(
                "{} is required",
                CLIENT_TOKEN_FIELD
            )))
        }
    };

    if let Some(existing) = state.tokens.get(&(collection, token.clone())) {
        return Ok((existing.clone(), false));
    }

    let alias = optional_string(&spec, "alias")?;
    if let Some(alias) = &alias {
        if state.alias_taken(collection, alias) {
            return Err(LedgerError::DuplicateAlias(alias.clone()));
        }
    }

    let tags = object_field(&spec, "tags")
        .ok_or_else(|| LedgerError::InvalidRequest("tags must be an object".into()))?;
    let xpubs = string_list(&spec, "xpubs")?;
    let quorum = quorum(&spec, xpubs.len())?;
    let definition = match collection {
        Collection::Assets => Some(object_field(&spec, "definition").ok_or_else(|| {
            LedgerError::InvalidDefinition("definition must be a JSON object".into())
        })?),
        _ => None,
    };

    let id = state.next_id(collection);
    let object = match collection {
        Collection::Assets => {
            let mut program = vec![0xae, 0x20];
            program.extend_from_slice(&state.next_seq.to_be_bytes());
            json!({
                "id": id,
                "alias": alias,
                "issuance_program": HexBytes::new(program),
                "xpubs": xpubs,
                "quorum": quorum,
                "definition": definition,
                "tags": tags,
            })
        }
        Collection::Accounts => json!({
            "id": id,
            "alias": alias,
            "xpubs": xpubs,
            "quorum": quorum,
            "tags": tags,
        }),
        Collection::Transactions => {
            return Err(LedgerError::InvalidRequest(
                "transactions cannot be created directly".into(),
            ))
        }
    };

    state.items_mut(collection).push(object.clone());
    state.tokens.insert((collection, token), object.clone());
    Ok((object, true))
}

fn optional_string(spec: &Map<String, Value>, key: &str) -> LedgerResult<Option<String>> {
    match spec.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LedgerError::InvalidRequest(format!("{} must be a string", key))),
    }
}

/// Returns the object at `key`, `{}` when absent, `None` when not an object.
fn object_field(spec: &Map<String, Value>, key: &str) -> Option<Value> {
    match spec.get(key) {
        None | Some(Value::Null) => Some(Value::Object(Map::new())),
        Some(value @ Value::Object(_)) => Some(value.clone()),
        Some(_) => None,
    }
}

fn string_list(spec: &Map<String, Value>, key: &str) -> LedgerResult<Vec<String>> {
    match spec.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| LedgerError::InvalidRequest(format!("{} must hold strings", key)))
            })
            .collect(),
        Some(_) => Err(LedgerError::InvalidRequest(format!("{} must be a list", key))),
    }
}

/// Resolves the quorum, defaulting to every key.
fn quorum(spec: &Map<String, Value>, keys: usize) -> LedgerResult<u64> {
    match spec.get("quorum") {
        None | Some(Value::Null) => Ok(keys as u64),
        Some(value) => {
            let quorum = value
                .as_u64()
                .ok_or_else(|| LedgerError::InvalidRequest("quorum must be a number".into()))?;
            if quorum == 0 || quorum > keys as u64 {
                return Err(LedgerError::BadQuorum { quorum, keys });
            }
            Ok(quorum)
        }
    }
}
