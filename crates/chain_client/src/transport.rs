//! Transport layer abstraction.

use crate::error::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
    /// Parsed `Retry-After` header.
    pub retry_after: Option<Duration>,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Creates a response with a JSON-encoded body.
    pub fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> serde_json::Result<Self> {
        Ok(Self::new(status, serde_json::to_vec(body)?))
    }

    /// Sets the `Retry-After` hint.
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends JSON bodies to named RPC endpoints.
///
/// This trait abstracts the network layer so the request engine can run over
/// HTTP, an in-process ledger, or a scripted mock. One call is one attempt;
/// retries are the engine's business.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` to `endpoint` and returns the raw response.
    async fn post(&self, endpoint: &str, body: Bytes) -> Result<RawResponse, TransportError>;
}

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Endpoint name.
    pub endpoint: String,
    /// Request body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// A scripted reply for [`MockTransport`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with a response.
    Respond(RawResponse),
    /// Fail at the transport level.
    Fail(TransportError),
    /// Never answer within `Duration`, then fail.
    Stall(Duration),
}

/// A mock transport for testing.
///
/// Replies are consumed in order; once the script is empty the fallback
/// response (if any) is returned for every further request.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    fallback: Mutex<Option<RawResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply.
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().push_back(reply);
    }

    /// Queues a response.
    pub fn push_response(&self, response: RawResponse) {
        self.push_reply(MockReply::Respond(response));
    }

    /// Queues a response with a JSON body.
    pub fn push_json<T: Serialize + ?Sized>(&self, status: u16, body: &T) {
        let body = serde_json::to_vec(body).unwrap_or_default();
        self.push_response(RawResponse::new(status, body));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.push_reply(MockReply::Fail(error));
    }

    /// Sets the response returned once the script runs out.
    pub fn set_fallback(&self, response: RawResponse) {
        *self.fallback.lock() = Some(response);
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, endpoint: &str, body: Bytes) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(RecordedRequest {
            endpoint: endpoint.to_string(),
            body,
        });

        let reply = self.script.lock().pop_front();
        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(error)) => Err(error),
            Some(MockReply::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Err(TransportError::new(
                    TransportErrorKind::Timeout,
                    "stalled request gave up",
                ))
            }
            None => self.fallback.lock().clone().ok_or_else(|| {
                TransportError::new(TransportErrorKind::Other, "no mock response queued")
            }),
        }
    }
}
