//! Assets: creation, listing and tag updates.

use crate::batch::BatchResponse;
use crate::client::Client;
use crate::error::ClientResult;
use crate::query::QueryBuilder;
use chain_protocol::HexBytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Endpoint that creates assets in batches.
pub const CREATE_ASSET: &str = "create-asset";
/// Endpoint that lists assets.
pub const LIST_ASSETS: &str = "list-assets";
/// Endpoint that replaces an asset's tags.
pub const SET_ASSET_TAGS: &str = "set-asset-tags";

/// An asset known to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Globally unique identifier.
    pub id: String,
    /// User-supplied unique name.
    #[serde(default)]
    pub alias: Option<String>,
    /// Program that controls issuance.
    #[serde(default)]
    pub issuance_program: HexBytes,
    /// Number of signatures needed to issue.
    #[serde(default)]
    pub quorum: u32,
    /// Immutable definition.
    #[serde(default)]
    pub definition: Map<String, Value>,
    /// Mutable, user-specified tags.
    #[serde(default)]
    pub tags: Map<String, Value>,
}

#[derive(Serialize)]
struct SetAssetTags<'a> {
    asset_id: &'a str,
    tags: &'a Map<String, Value>,
}

impl Asset {
    /// Starts a query over `list-assets`.
    pub fn query() -> QueryBuilder<Asset> {
        QueryBuilder::new(LIST_ASSETS)
    }

    /// Replaces the local tags.
    pub fn set_tags(mut self, tags: Map<String, Value>) -> Self {
        self.tags = tags;
        self
    }

    /// Adds or overwrites a local tag.
    pub fn add_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Removes a local tag.
    pub fn remove_tag(mut self, key: &str) -> Self {
        self.tags.remove(key);
        self
    }

    /// Stores the local tags on the ledger, returning the updated asset.
    pub async fn update_tags(&self, client: &Client) -> ClientResult<Asset> {
        let request = SetAssetTags {
            asset_id: &self.id,
            tags: &self.tags,
        };
        client.invoke(SET_ASSET_TAGS, &request).await
    }
}

/// Specification of an asset to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    definition: Map<String, Value>,
    tags: Map<String, Value>,
    #[serde(rename = "xpubs")]
    root_xpubs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quorum: Option<u32>,
}

impl AssetBuilder {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the definition.
    pub fn with_definition(mut self, definition: Map<String, Value>) -> Self {
        self.definition = definition;
        self
    }

    /// Adds a definition field.
    pub fn with_definition_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.definition.insert(key.into(), value.into());
        self
    }

    /// Replaces the tags.
    pub fn with_tags(mut self, tags: Map<String, Value>) -> Self {
        self.tags = tags;
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a root extended public key.
    pub fn with_root_xpub(mut self, xpub: impl Into<String>) -> Self {
        self.root_xpubs.push(xpub.into());
        self
    }

    /// Replaces the root extended public keys.
    pub fn with_root_xpubs<I, S>(mut self, xpubs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_xpubs = xpubs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the signature quorum.
    pub fn with_quorum(mut self, quorum: u32) -> Self {
        self.quorum = Some(quorum);
        self
    }

    /// Creates this asset.
    pub async fn create(&self, client: &Client) -> ClientResult<Asset> {
        client.create_one(CREATE_ASSET, self).await
    }

    /// Creates several assets in one call.
    pub async fn create_batch(client: &Client, specs: &[AssetBuilder]) -> ClientResult<BatchResponse<Asset>> {
        client.create_batch(CREATE_ASSET, specs).await
    }
}
