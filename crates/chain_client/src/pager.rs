//! Cursor-driven pagination over list endpoints.

use crate::client::Client;
use crate::error::ClientResult;
use chain_protocol::{Page, Query};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Walks a list endpoint's result set one page at a time.
///
/// The pager owns a snapshot of the query it was started with; changes to
/// the builder afterwards do not reach it. Each fetch sends the snapshot with
/// the cursor the previous page returned.
///
/// A pager is a single-consumer iterator: it is not restartable, and a new
/// pass over the result set needs a new pager.
#[derive(Debug)]
pub struct Pager<T> {
    client: Client,
    endpoint: String,
    query: Query,
    exhausted: bool,
    buffer: VecDeque<T>,
}

impl<T: DeserializeOwned> Pager<T> {
    /// Creates a pager that has not fetched anything yet.
    pub fn new(client: Client, endpoint: impl Into<String>, query: Query) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            query,
            exhausted: false,
            buffer: VecDeque::new(),
        }
    }

    /// Creates a pager and buffers its first page.
    pub async fn start(client: Client, endpoint: impl Into<String>, query: Query) -> ClientResult<Self> {
        let mut pager = Self::new(client, endpoint, query);
        let page = pager.fetch_next_page().await?;
        pager.buffer.extend(page.items);
        Ok(pager)
    }

    /// Returns the list endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the query the next fetch will send, cursor included.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns true once the server reported the last page.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns the number of fetched items not yet consumed by
    /// [`next_item`](Self::next_item).
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Fetches the page after the last one fetched.
    ///
    /// The page is handed to the caller, not buffered. Once the result set is
    /// exhausted this returns an empty last page without touching the
    /// network. On error the pager is unchanged and the call can be repeated.
    pub async fn fetch_next_page(&mut self) -> ClientResult<Page<T>> {
        if self.exhausted {
            return Ok(Page::exhausted());
        }

        let page: Page<T> = self.client.invoke(&self.endpoint, &self.query).await?;
        debug!(
            endpoint = %self.endpoint,
            items = page.items.len(),
            last_page = page.last_page,
            "fetched page"
        );
        self.advance(&page);
        Ok(page)
    }

    /// Folds the returned cursor into the query snapshot.
    ///
    /// Only the cursor is taken from `page.next`; the criteria always come
    /// from the snapshot the pager was started with.
    fn advance(&mut self, page: &Page<T>) {
        if page.last_page {
            self.exhausted = true;
            return;
        }

        if !page.next.same_criteria(&self.query) {
            debug!(
                endpoint = %self.endpoint,
                "next query differs from the snapshot, keeping the snapshot"
            );
        }

        match page.next_cursor() {
            Some(cursor) if self.query.cursor() != Some(cursor) => {
                self.query.set_cursor(cursor);
            }
            cursor => {
                warn!(
                    endpoint = %self.endpoint,
                    cursor = ?cursor,
                    "page is not the last but carries no new cursor, stopping"
                );
                self.exhausted = true;
            }
        }
    }

    /// Returns the next item, fetching pages as the buffer drains.
    ///
    /// Returns `None` after the last item. A failed fetch is returned as
    /// `Some(Err(_))` and leaves the cursor where it was, so calling again
    /// repeats the fetch.
    pub async fn next_item(&mut self) -> Option<ClientResult<T>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }
            match self.fetch_next_page().await {
                Ok(page) => self.buffer.extend(page.items),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Turns the pager into a stream of items across all remaining pages.
    ///
    /// The stream ends after yielding the first error.
    pub fn into_items(self) -> impl Stream<Item = ClientResult<T>> {
        stream::unfold(Some(self), |pager| async move {
            let mut pager = pager?;
            match pager.next_item().await? {
                Ok(item) => Some((Ok(item), Some(pager))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Collects every remaining item.
    pub async fn collect_all(mut self) -> ClientResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await {
            items.push(item?);
        }
        Ok(items)
    }
}
