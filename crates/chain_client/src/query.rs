//! Fluent construction of list queries.

use crate::client::Client;
use crate::error::ClientResult;
use crate::pager::Pager;
use chain_protocol::{Query, FILTER_FIELD, FILTER_PARAMS_FIELD, PAGE_SIZE_FIELD};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Builds a query against one list endpoint.
///
/// Setters consume and return the builder. [`execute`](Self::execute) sends
/// a copy of the accumulated query, so the builder can be reused afterwards
/// without affecting pagers it already started.
///
/// ```no_run
/// # async fn run(client: chain_client::Client) -> chain_client::ClientResult<()> {
/// use chain_client::Asset;
///
/// let mut pager = Asset::query()
///     .with_filter("alias=$1")
///     .with_filter_param("gold")
///     .execute(&client)
///     .await?;
/// while let Some(asset) = pager.next_item().await {
///     println!("{}", asset?.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueryBuilder<T> {
    endpoint: String,
    query: Query,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            query: self.query.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> QueryBuilder<T> {
    /// Creates an empty query against `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: Query::new(),
            _item: PhantomData,
        }
    }

    /// Sets a field, overwriting any earlier value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Sets the filter expression.
    pub fn with_filter(self, filter: impl Into<String>) -> Self {
        self.set(FILTER_FIELD, filter.into())
    }

    /// Appends a filter parameter.
    pub fn with_filter_param(mut self, param: impl Into<Value>) -> Self {
        self.query.push(FILTER_PARAMS_FIELD, param);
        self
    }

    /// Replaces all filter parameters.
    pub fn with_filter_params<I, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        self.set(FILTER_PARAMS_FIELD, params)
    }

    /// Sets the earliest timestamp, in milliseconds since the epoch.
    pub fn with_start_time(self, millis: u64) -> Self {
        self.set("start_time", millis)
    }

    /// Sets the latest timestamp, in milliseconds since the epoch.
    pub fn with_end_time(self, millis: u64) -> Self {
        self.set("end_time", millis)
    }

    /// Sets how long the server may wait for results, in milliseconds.
    pub fn with_timeout(self, millis: u64) -> Self {
        self.set("timeout", millis)
    }

    /// Asks for results oldest-first, waiting for new ones at the end.
    pub fn with_ascending_with_long_poll(self) -> Self {
        self.set("ascending_with_long_poll", true)
    }

    /// Sets the number of items per page.
    pub fn with_page_size(self, size: u64) -> Self {
        self.set(PAGE_SIZE_FIELD, size)
    }

    /// Returns the list endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the accumulated query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns a pager over a snapshot of the query, without fetching.
    pub fn build(&self, client: &Client) -> Pager<T> {
        Pager::new(client.clone(), self.endpoint.clone(), self.query.clone())
    }

    /// Starts paging and fetches the first page before returning.
    pub async fn execute(&self, client: &Client) -> ClientResult<Pager<T>> {
        Pager::start(client.clone(), self.endpoint.clone(), self.query.clone()).await
    }
}
