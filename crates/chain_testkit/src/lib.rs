//! # Chain Testkit
//!
//! Test utilities for the Chain ledger client.
//!
//! This crate provides:
//! - A transport that talks to an in-process loopback ledger
//! - A transport wrapper that injects transient failures
//! - Deterministic client tokens
//! - Fixtures that wire a client to a fresh ledger
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chain_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn creates_asset() {
//!     let fixture = TestLedger::new();
//!     let asset = AssetBuilder::new()
//!         .with_alias("gold")
//!         .create(&fixture.client)
//!         .await
//!         .unwrap();
//!     assert_eq!(asset.alias.as_deref(), Some("gold"));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::transport::*;
    pub use chain_client::{AccountBuilder, AssetBuilder, Client, ClientError};
}

pub use fixtures::*;
pub use generators::*;
pub use transport::*;
