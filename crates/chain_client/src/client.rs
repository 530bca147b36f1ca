//! The request engine.
//!
//! Every domain operation ends up in [`Client::invoke`]: serialize the
//! payload once, send it through the [`Transport`], retry transient failures
//! with backoff, then decode the body into the caller's response type.

use crate::batch::BatchResponse;
use crate::cancel::CancelHandle;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::error_mapper;
use crate::http::HttpTransport;
use crate::token::{TokenGenerator, UuidTokenGenerator};
use crate::transport::{RawResponse, Transport};
use bytes::Bytes;
use chain_protocol::{Outcome, TokenedSpec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A client for the ledger's JSON RPC API.
///
/// Cloning is cheap; clones share the transport and token generator. The
/// client holds no per-call state, so one instance can serve any number of
/// concurrent calls.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenGenerator>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.config.base_url)
            .field("tokens", &self.inner.tokens)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// Creates a client over a shared transport.
    pub fn with_shared_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens: Arc::new(UuidTokenGenerator),
            }),
        }
    }

    /// Returns a client that draws client tokens from `tokens`.
    pub fn with_token_generator(self, tokens: impl TokenGenerator + 'static) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config: self.inner.config.clone(),
                transport: Arc::clone(&self.inner.transport),
                tokens: Arc::new(tokens),
            }),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Calls `endpoint` with `payload` and decodes the response as `R`.
    pub async fn invoke<P, R>(&self, endpoint: &str, payload: &P) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call(endpoint, payload, None).await
    }

    /// Like [`invoke`](Self::invoke), aborting when `cancel` fires.
    ///
    /// The handle is checked before every attempt, so no new request leaves
    /// the client once it is cancelled, and it interrupts both the send and
    /// the backoff wait.
    pub async fn invoke_with_cancel<P, R>(
        &self,
        endpoint: &str,
        payload: &P,
        cancel: &CancelHandle,
    ) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call(endpoint, payload, Some(cancel)).await
    }

    /// Calls `endpoint` with a JSON `payload` and returns the undecoded
    /// response body, for endpoints that answer with binary data.
    pub async fn invoke_raw<P>(&self, endpoint: &str, payload: &P) -> ClientResult<Bytes>
    where
        P: Serialize + ?Sized,
    {
        self.call_raw(endpoint, payload, None).await
    }

    /// Creates a batch of objects at a create endpoint.
    ///
    /// One client token per spec is drawn before the first attempt and
    /// embedded in the serialized body, which every retry reuses verbatim.
    /// Per-element failures are returned in the [`BatchResponse`], not as an
    /// error.
    pub async fn create_batch<S, T>(&self, endpoint: &str, specs: &[S]) -> ClientResult<BatchResponse<T>>
    where
        S: Serialize,
        T: DeserializeOwned,
    {
        if specs.is_empty() {
            return Ok(BatchResponse::new(Vec::new()));
        }

        let elements: Vec<TokenedSpec<&S>> = specs
            .iter()
            .map(|spec| TokenedSpec::new(spec, self.inner.tokens.new_token()))
            .collect();
        debug!(endpoint, count = elements.len(), "issued client tokens");

        let outcomes: Vec<Outcome<T>> = self.invoke(endpoint, &elements).await?;
        if outcomes.len() != specs.len() {
            return Err(ClientError::Decode {
                message: format!(
                    "{}: expected {} results, got {}",
                    endpoint,
                    specs.len(),
                    outcomes.len()
                ),
                body: String::new(),
            });
        }

        Ok(BatchResponse::new(outcomes))
    }

    /// Creates a single object, surfacing its element error as an error.
    pub async fn create_one<S, T>(&self, endpoint: &str, spec: &S) -> ClientResult<T>
    where
        S: Serialize,
        T: DeserializeOwned,
    {
        self.create_batch(endpoint, std::slice::from_ref(spec))
            .await?
            .into_single()
    }

    async fn call<P, R>(
        &self,
        endpoint: &str,
        payload: &P,
        cancel: Option<&CancelHandle>,
    ) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.call_raw(endpoint, payload, cancel).await?;

        serde_json::from_slice(&body).map_err(|e| {
            ClientError::decode(format!("failed to decode {} response: {}", endpoint, e), &body)
        })
    }

    async fn call_raw<P>(
        &self,
        endpoint: &str,
        payload: &P,
        cancel: Option<&CancelHandle>,
    ) -> ClientResult<Bytes>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)
            .map(Bytes::from)
            .map_err(|e| ClientError::local(format!("failed to encode {} request: {}", endpoint, e)))?;

        let response = self.send_with_retry(endpoint, body, cancel).await?;
        Ok(response.body)
    }

    /// Sends `body` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    #[tracing::instrument(level = "debug", skip(self, body, cancel), fields(bytes = body.len()))]
    async fn send_with_retry(
        &self,
        endpoint: &str,
        body: Bytes,
        cancel: Option<&CancelHandle>,
    ) -> ClientResult<RawResponse> {
        let retry = &self.inner.config.retry;
        let max_attempts = retry.attempts();
        let mut attempt = 0u32;

        loop {
            check_cancelled(cancel)?;
            attempt += 1;
            debug!(endpoint, attempt, "sending request");

            let err = match self.attempt(endpoint, body.clone(), cancel).await {
                Ok(response) if response.is_success() => {
                    debug!(endpoint, attempt, status = response.status, "request succeeded");
                    return Ok(response);
                }
                Ok(response) => error_mapper::map_response(&response),
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(endpoint, attempt, error = %err, "permanent failure");
                return Err(err);
            }

            if attempt >= max_attempts {
                warn!(endpoint, attempt, error = %err, "retries exhausted");
                return Err(ClientError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = backoff_delay(retry.delay_for_attempt(attempt), &err, retry.max_delay);
            warn!(
                endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );

            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Makes one attempt, bounded by the configured timeout.
    async fn attempt(
        &self,
        endpoint: &str,
        body: Bytes,
        cancel: Option<&CancelHandle>,
    ) -> ClientResult<RawResponse> {
        let timeout = self.inner.config.timeout;
        let send = tokio::time::timeout(timeout, self.inner.transport.post(endpoint, body));

        let result = match cancel {
            Some(cancel) => {
                tokio::select! {
                    result = send => result,
                    _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                }
            }
            None => send.await,
        };

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(err.into()),
            Err(_elapsed) => Err(ClientError::Timeout(timeout)),
        }
    }
}

fn check_cancelled(cancel: Option<&CancelHandle>) -> ClientResult<()> {
    match cancel {
        Some(cancel) if cancel.is_cancelled() => Err(ClientError::Cancelled),
        _ => Ok(()),
    }
}

/// Picks the wait before the next attempt: the backoff schedule, raised to
/// the server's `Retry-After` hint, never above `max_delay`.
fn backoff_delay(scheduled: Duration, err: &ClientError, max_delay: Duration) -> Duration {
    match err.retry_after() {
        Some(hint) => scheduled.max(hint.min(max_delay)),
        None => scheduled,
    }
}
