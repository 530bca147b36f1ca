//! # Chain Protocol
//!
//! Wire types for the Chain ledger JSON RPC protocol.
//!
//! This crate provides:
//! - `ErrorRecord` for server-reported failures
//! - `Outcome` for per-element results of batch endpoints
//! - `Query` with its embedded page cursor
//! - `Page` for the list endpoint envelope
//! - `ClientToken` and `TokenedSpec` for idempotent creates
//! - `HexBytes` for hex-encoded byte strings
//!
//! This is a pure protocol crate with no I/O operations. Both the client and
//! the loopback ledger speak exactly these shapes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod hex_bytes;
mod outcome;
mod page;
mod query;
mod record;
mod token;

pub use error::{ProtocolError, ProtocolResult};
pub use hex_bytes::HexBytes;
pub use outcome::Outcome;
pub use page::Page;
pub use query::{Query, CURSOR_FIELD, FILTER_FIELD, FILTER_PARAMS_FIELD, PAGE_SIZE_FIELD};
pub use record::ErrorRecord;
pub use token::{ClientToken, TokenedSpec, CLIENT_TOKEN_FIELD};

/// Encodes a value as a JSON request or response body.
pub fn to_json_vec<T: serde::Serialize + ?Sized>(value: &T) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes a JSON request or response body.
pub fn from_json_slice<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
