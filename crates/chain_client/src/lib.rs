//! # Chain Client
//!
//! Typed async client for the Chain ledger JSON RPC API.
//!
//! This crate provides:
//! - A request engine with bounded, jittered retries of transient failures
//! - Typed errors that separate local, transient and permanent failures
//! - Idempotent batch creates carrying one client token per element
//! - Cursor pagination over list endpoints, as pages or as a stream
//! - A fluent query builder
//! - Domain operations for assets, accounts, transactions and blocks
//!
//! ## Architecture
//!
//! Every operation is a POST of a JSON body to `{base_url}/{endpoint}`.
//! Domain types build the payload; [`Client::invoke`] sends it through a
//! [`Transport`] and decodes the response. [`HttpTransport`] is the
//! production transport; [`MockTransport`] replays scripted responses.
//!
//! ## Key Invariants
//!
//! - A request body is serialized once and resent verbatim on every retry
//! - Client tokens are drawn before the first attempt of a create
//! - Only transient failures are retried, and never past the attempt budget
//! - A pager only replays a cursor against the query that produced it
//!
//! ```no_run
//! use chain_client::{AssetBuilder, Client, ClientConfig};
//!
//! # async fn run() -> chain_client::ClientResult<()> {
//! let client = Client::new(ClientConfig::new("http://localhost:1999"))?;
//! let gold = AssetBuilder::new()
//!     .with_alias("gold")
//!     .with_root_xpub("xpub...")
//!     .with_quorum(1)
//!     .create(&client)
//!     .await?;
//! println!("created {}", gold.id);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod account;
mod asset;
mod batch;
mod blocks;
mod cancel;
mod client;
mod config;
mod error;
pub mod error_mapper;
mod http;
mod pager;
mod query;
mod token;
mod transaction;
mod transport;

pub use account::{Account, AccountBuilder, CREATE_ACCOUNT, LIST_ACCOUNTS, SET_ACCOUNT_TAGS};
pub use asset::{Asset, AssetBuilder, CREATE_ASSET, LIST_ASSETS, SET_ASSET_TAGS};
pub use batch::BatchResponse;
pub use blocks::{RawBlock, RawSnapshot, SnapshotInfo, GET_BLOCK, GET_SNAPSHOT, GET_SNAPSHOT_INFO};
pub use cancel::CancelHandle;
pub use client::Client;
pub use config::{ClientConfig, RetryConfig};
pub use error::{ClientError, ClientResult, ErrorClass, TransportError, TransportErrorKind};
pub use http::HttpTransport;
pub use pager::Pager;
pub use query::QueryBuilder;
pub use token::{TokenGenerator, UuidTokenGenerator};
pub use transaction::{Transaction, TransactionInput, TransactionOutput, LIST_TRANSACTIONS};
pub use transport::{MockReply, MockTransport, RawResponse, RecordedRequest, Transport};

pub use chain_protocol::{ClientToken, ErrorRecord, HexBytes, Outcome, Page, Query};
