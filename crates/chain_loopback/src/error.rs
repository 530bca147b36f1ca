//! Error types for the loopback ledger.

use chain_protocol::ErrorRecord;
use serde_json::json;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors the ledger reports to clients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Unparseable or ill-typed request body.
    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    /// No object with the given id.
    #[error("not found: {0}")]
    NotFound(String),

    /// No such endpoint.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The alias is taken.
    #[error("alias already exists: {0}")]
    DuplicateAlias(String),

    /// Quorum is zero or larger than the number of keys.
    #[error("bad quorum {quorum} for {keys} keys")]
    BadQuorum {
        /// Requested quorum.
        quorum: u64,
        /// Number of keys supplied.
        keys: usize,
    },

    /// The asset definition is not a JSON object.
    #[error("invalid asset definition: {0}")]
    InvalidDefinition(String),

    /// The filter expression could not be parsed or evaluated.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The requested block does not exist yet.
    #[error("block {0} is not available yet")]
    BlockNotReady(u64),

    /// Temporarily refusing requests.
    #[error("service unavailable")]
    Unavailable,

    /// Internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidRequest(_) => "CH003",
            LedgerError::NotFound(_) | LedgerError::UnknownEndpoint(_) => "CH002",
            LedgerError::DuplicateAlias(_) => "CH050",
            LedgerError::BadQuorum { .. } => "CH202",
            LedgerError::InvalidDefinition(_) => "CH003",
            LedgerError::InvalidFilter(_) => "CH602",
            LedgerError::BlockNotReady(_) => "CH001",
            LedgerError::Unavailable | LedgerError::Internal(_) => "CH000",
        }
    }

    /// Returns the fixed message for the code.
    pub fn message(&self) -> &'static str {
        match self {
            LedgerError::InvalidRequest(_) => "Invalid request body",
            LedgerError::NotFound(_) => "Not found",
            LedgerError::UnknownEndpoint(_) => "Unknown endpoint",
            LedgerError::DuplicateAlias(_) => "Alias already exists",
            LedgerError::BadQuorum { .. } => {
                "Quorum must be at least 1 and at most the number of keys"
            }
            LedgerError::InvalidDefinition(_) => "Invalid asset definition",
            LedgerError::InvalidFilter(_) => "Malformed filter",
            LedgerError::BlockNotReady(_) => "Request timed out",
            LedgerError::Unavailable => "Service unavailable",
            LedgerError::Internal(_) => "Internal server error",
        }
    }

    /// Returns the HTTP status for a whole-call failure.
    pub fn status(&self) -> u16 {
        match self {
            LedgerError::NotFound(_) | LedgerError::UnknownEndpoint(_) => 404,
            LedgerError::BlockNotReady(_) | LedgerError::Unavailable => 503,
            LedgerError::Internal(_) => 500,
            _ => 400,
        }
    }

    /// Returns true if the client should retry.
    pub fn is_temporary(&self) -> bool {
        matches!(self, LedgerError::BlockNotReady(_) | LedgerError::Unavailable)
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Builds the wire error record.
    pub fn to_record(&self) -> ErrorRecord {
        let record = ErrorRecord::new(self.code(), self.message())
            .with_detail(self.to_string())
            .with_temporary(self.is_temporary());
        match self {
            LedgerError::BadQuorum { quorum, keys } => {
                record.with_data(json!({"quorum": quorum, "keys": keys}))
            }
            _ => record,
        }
    }
}
