//! Transaction queries.

use crate::query::QueryBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Endpoint that lists transactions.
pub const LIST_TRANSACTIONS: &str = "list-transactions";

/// A confirmed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    pub id: String,
    /// Block timestamp, in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: u64,
    /// Hash of the containing block.
    #[serde(default)]
    pub block_id: String,
    /// Height of the containing block.
    #[serde(default)]
    pub block_height: u64,
    /// Position within the block.
    #[serde(default)]
    pub position: u32,
    /// User-specified reference data.
    #[serde(default)]
    pub reference_data: Map<String, Value>,
    /// Inputs, in order.
    #[serde(default)]
    pub inputs: Vec<TransactionInput>,
    /// Outputs, in order.
    #[serde(default)]
    pub outputs: Vec<TransactionOutput>,
}

/// One input of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// `issue` or `spend`.
    #[serde(rename = "type")]
    pub action: String,
    /// Asset moved by this input.
    pub asset_id: String,
    /// Amount of the asset.
    pub amount: u64,
    /// Spending account, for spends from a local account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// One output of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// `control` or `retire`.
    #[serde(rename = "type")]
    pub action: String,
    /// Position within the transaction's outputs.
    #[serde(default)]
    pub position: u32,
    /// Asset received.
    pub asset_id: String,
    /// Amount of the asset.
    pub amount: u64,
    /// Receiving account, for outputs to a local account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Transaction {
    /// Starts a query over `list-transactions`.
    ///
    /// Combine [`with_start_time`](QueryBuilder::with_start_time) and
    /// [`with_end_time`](QueryBuilder::with_end_time) to bound the window.
    pub fn query() -> QueryBuilder<Transaction> {
        QueryBuilder::new(LIST_TRANSACTIONS)
    }
}
