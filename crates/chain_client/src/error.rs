//! Error types for the client.

use chain_protocol::ErrorRecord;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// How an error should be treated by callers and by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Failed before anything reached the network; never retried.
    Local,
    /// Worth retrying (network failure, timeout, overload).
    Transient,
    /// Retrying will not help.
    Permanent,
}

/// What went wrong at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection could not be established.
    Connect,
    /// The transport's own deadline passed.
    Timeout,
    /// TLS negotiation failed.
    Tls,
    /// The connection broke while sending or receiving.
    Reset,
    /// The request could not be built (bad URL, bad header).
    Request,
    /// Anything else.
    Other,
}

impl TransportErrorKind {
    /// Returns true if failures of this kind are worth retrying.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            TransportErrorKind::Connect
                | TransportErrorKind::Timeout
                | TransportErrorKind::Tls
                | TransportErrorKind::Reset
        )
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Reset => "reset",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failure reported by a [`Transport`](crate::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} failure: {message}")]
pub struct TransportError {
    /// What went wrong.
    pub kind: TransportErrorKind,
    /// Error message.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Creates a connection reset.
    pub fn reset(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Reset, message)
    }

    /// Returns true if this error can be retried.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Errors that can occur while talking to the ledger.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Serialization or configuration failure; nothing was sent.
    #[error("local error: {message}")]
    Local {
        /// Error message.
        message: String,
    },

    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A single attempt exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The ledger reported an error record.
    ///
    /// `status` is `None` for a failed element of a batch call, whose HTTP
    /// envelope succeeded.
    #[error("api error: {record}")]
    Api {
        /// HTTP status of the response, if the whole call failed.
        status: Option<u16>,
        /// The server-supplied error record.
        record: ErrorRecord,
        /// Minimum delay requested by the server before retrying.
        retry_after: Option<Duration>,
    },

    /// A non-2xx response whose body is not an error record.
    #[error("http error {status}: {body}")]
    Http {
        /// HTTP status of the response.
        status: u16,
        /// Leading part of the response body.
        body: String,
        /// Minimum delay requested by the server before retrying.
        retry_after: Option<Duration>,
    },

    /// A successful response could not be decoded.
    #[error("malformed response: {message}")]
    Decode {
        /// What failed to decode.
        message: String,
        /// Leading part of the response body.
        body: String,
    },

    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: Box<ClientError>,
    },

    /// The call was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Creates a local error.
    pub fn local(message: impl Into<String>) -> Self {
        Self::Local {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>, body: &[u8]) -> Self {
        Self::Decode {
            message: message.into(),
            body: crate::error_mapper::snippet(body),
        }
    }

    /// Wraps the error record of a failed batch element.
    pub fn element(record: ErrorRecord) -> Self {
        Self::Api {
            status: None,
            record,
            retry_after: None,
        }
    }

    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ClientError::Local { .. } => ErrorClass::Local,
            ClientError::Transport(err) if err.is_transient() => ErrorClass::Transient,
            ClientError::Transport(_) => ErrorClass::Permanent,
            ClientError::Timeout(_) => ErrorClass::Transient,
            ClientError::Api { status, record, .. } => match (record.temporary, status) {
                (Some(true), _) => ErrorClass::Transient,
                (Some(false), _) => ErrorClass::Permanent,
                (None, Some(status)) => crate::error_mapper::classify_status(*status),
                (None, None) => ErrorClass::Permanent,
            },
            ClientError::Http { status, .. } => crate::error_mapper::classify_status(*status),
            ClientError::Decode { .. }
            | ClientError::RetriesExhausted { .. }
            | ClientError::Cancelled => ErrorClass::Permanent,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Returns a stable code for programmatic branching.
    ///
    /// Ledger errors carry the server's code; client-side failures use a
    /// fixed lowercase name.
    pub fn code(&self) -> &str {
        match self {
            ClientError::Local { .. } => "local_error",
            ClientError::Transport(_) => "transport_error",
            ClientError::Timeout(_) => "timeout",
            ClientError::Api { record, .. } => &record.code,
            ClientError::Http { .. } => "http_error",
            ClientError::Decode { .. } => "decode_error",
            ClientError::RetriesExhausted { last, .. } => last.code(),
            ClientError::Cancelled => "cancelled",
        }
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            ClientError::Api { record, .. } => Cow::Borrowed(&record.message),
            ClientError::Local { message } | ClientError::Decode { message, .. } => {
                Cow::Borrowed(message)
            }
            ClientError::Transport(err) => Cow::Borrowed(&err.message),
            ClientError::RetriesExhausted { last, .. } => last.message(),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Returns additional detail, when available.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Api { record, .. } => record.detail.as_deref(),
            ClientError::Http { body, .. } | ClientError::Decode { body, .. } => Some(body),
            ClientError::RetriesExhausted { last, .. } => last.detail(),
            _ => None,
        }
    }

    /// Returns the HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => *status,
            ClientError::Http { status, .. } => Some(*status),
            ClientError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Returns the server's requested minimum delay before a retry.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::Api { retry_after, .. } | ClientError::Http { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }

    /// Returns the error record, if the ledger supplied one.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            ClientError::Api { record, .. } => Some(record),
            ClientError::RetriesExhausted { last, .. } => last.record(),
            _ => None,
        }
    }
}
