//! Accounts: creation, listing and tag updates.

use crate::batch::BatchResponse;
use crate::client::Client;
use crate::error::ClientResult;
use crate::query::QueryBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Endpoint that creates accounts in batches.
pub const CREATE_ACCOUNT: &str = "create-account";
/// Endpoint that lists accounts.
pub const LIST_ACCOUNTS: &str = "list-accounts";
/// Endpoint that replaces an account's tags.
pub const SET_ACCOUNT_TAGS: &str = "set-account-tags";

/// An account known to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Globally unique identifier.
    pub id: String,
    /// User-supplied unique name.
    #[serde(default)]
    pub alias: Option<String>,
    /// Root extended public keys controlling the account.
    #[serde(default, rename = "xpubs")]
    pub root_xpubs: Vec<String>,
    /// Number of signatures needed to spend.
    #[serde(default)]
    pub quorum: u32,
    /// Mutable, user-specified tags.
    #[serde(default)]
    pub tags: Map<String, Value>,
}

#[derive(Serialize)]
struct SetAccountTags<'a> {
    account_id: &'a str,
    tags: &'a Map<String, Value>,
}

impl Account {
    /// Starts a query over `list-accounts`.
    pub fn query() -> QueryBuilder<Account> {
        QueryBuilder::new(LIST_ACCOUNTS)
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

    /// Stores the local tags on the ledger, returning the updated account.
    pub async fn update_tags(&self, client: &Client) -> ClientResult<Account> {
        let request = SetAccountTags {
            account_id: &self.id,
            tags: &self.tags,
        };
        client.invoke(SET_ACCOUNT_TAGS, &request).await
    }
}

/// Specification of an account to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    tags: Map<String, Value>,
    #[serde(rename = "xpubs")]
    root_xpubs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quorum: Option<u32>,
}

impl AccountBuilder {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
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

    /// Sets the signature quorum.
    pub fn with_quorum(mut self, quorum: u32) -> Self {
        self.quorum = Some(quorum);
        self
    }

    /// Creates this account.
    pub async fn create(&self, client: &Client) -> ClientResult<Account> {
        client.create_one(CREATE_ACCOUNT, self).await
    }

    /// Creates several accounts in one call.
    pub async fn create_batch(
        client: &Client,
        specs: &[AccountBuilder],
    ) -> ClientResult<BatchResponse<Account>> {
        client.create_batch(CREATE_ACCOUNT, specs).await
    }
}
