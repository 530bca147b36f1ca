//! # Chain Loopback
//!
//! In-process reference ledger for the Chain JSON RPC protocol.
//!
//! This crate provides:
//! - Asset and account creation with per-element validation
//! - Client-token deduplication of creates
//! - Filtered, cursor-paginated list endpoints
//! - Tag updates, raw blocks and snapshot info
//! - Fault injection (refused calls, lost responses)
//!
//! # Architecture
//!
//! [`LoopbackLedger::handle_post`] takes an endpoint name and a JSON body
//! and returns a status and body, the same exchange an HTTP server
//! would have. Transports in tests call it directly, without sockets.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod filter;
mod handler;
mod server;
mod store;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use filter::Filter;
pub use handler::{HandlerContext, RequestHandler};
pub use server::{LedgerResponse, LoggedCall, LoopbackLedger, GET_SNAPSHOT};
pub use store::{Collection, LedgerStore, Selection};
