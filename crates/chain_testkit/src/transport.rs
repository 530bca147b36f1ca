//! Transports for tests.

use async_trait::async_trait;
use bytes::Bytes;
use chain_client::{RawResponse, Transport, TransportError, TransportErrorKind};
use chain_loopback::LoopbackLedger;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A transport that hands requests straight to an in-process ledger.
#[derive(Clone)]
pub struct LoopbackTransport {
    ledger: Arc<LoopbackLedger>,
}

impl LoopbackTransport {
    /// Connects to `ledger`.
    pub fn new(ledger: Arc<LoopbackLedger>) -> Self {
        Self { ledger }
    }

    /// Returns the ledger.
    pub fn ledger(&self) -> &Arc<LoopbackLedger> {
        &self.ledger
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn post(&self, endpoint: &str, body: Bytes) -> Result<RawResponse, TransportError> {
        let response = self.ledger.handle_post(endpoint, &body);
        let raw = RawResponse::new(response.status, response.body);
        Ok(match response.retry_after {
            Some(secs) => raw.with_retry_after(Duration::from_secs(secs)),
            None => raw,
        })
    }
}

/// Wraps a transport so that its first calls fail before reaching it.
pub struct FlakyTransport<T> {
    inner: T,
    failures_left: AtomicU32,
    kind: TransportErrorKind,
    attempts: AtomicUsize,
}

impl<T: Transport> FlakyTransport<T> {
    /// Fails the first `failures` calls with a connection error.
    pub fn new(inner: T, failures: u32) -> Self {
        Self::with_kind(inner, failures, TransportErrorKind::Connect)
    }

    /// Fails the first `failures` calls with errors of `kind`.
    pub fn with_kind(inner: T, failures: u32, kind: TransportErrorKind) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            kind,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls made, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Transport> Transport for FlakyTransport<T> {
    async fn post(&self, endpoint: &str, body: Bytes) -> Result<RawResponse, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::new(self.kind, "injected failure"));
        }

        self.inner.post(endpoint, body).await
    }
}
