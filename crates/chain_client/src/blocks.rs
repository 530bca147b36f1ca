//! Core RPCs for blocks and snapshots.

use crate::client::Client;
use crate::error::ClientResult;
use bytes::Bytes;
use chain_protocol::HexBytes;
use serde::{Deserialize, Serialize};

/// Endpoint returning one raw block.
pub const GET_BLOCK: &str = "get-block";
/// Endpoint describing the latest snapshot.
pub const GET_SNAPSHOT_INFO: &str = "get-snapshot-info";
/// Endpoint returning an encoded snapshot.
pub const GET_SNAPSHOT: &str = "get-snapshot";

/// The latest blockchain snapshot known to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Height of the snapshot.
    pub height: u64,
    /// Encoded size, in bytes.
    pub size: u64,
    /// Hash of the blockchain's initial block.
    pub blockchain_id: HexBytes,
}

impl SnapshotInfo {
    /// Fetches the latest snapshot's description.
    pub async fn fetch(client: &Client) -> ClientResult<SnapshotInfo> {
        client.invoke(GET_SNAPSHOT_INFO, &serde_json::json!({})).await
    }
}

/// A serialized block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBlock(pub HexBytes);

impl RawBlock {
    /// Fetches the block at `height`.
    ///
    /// A node answers only once the block exists; a block that is not there
    /// yet is reported as a temporary error and retried.
    pub async fn fetch(client: &Client, height: u64) -> ClientResult<RawBlock> {
        client.invoke(GET_BLOCK, &height).await
    }

    /// Returns the block bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// An encoded snapshot, as stored by the node.
///
/// The body is opaque binary data, not JSON, so it is handed over as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot(pub Bytes);

impl RawSnapshot {
    /// Fetches the snapshot at `height`.
    pub async fn fetch(client: &Client, height: u64) -> ClientResult<RawSnapshot> {
        client.invoke_raw(GET_SNAPSHOT, &height).await.map(RawSnapshot)
    }

    /// Returns the snapshot bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
