//! HTTP transport implementation.
//!
//! This module provides the production [`Transport`] built on `reqwest`.
//! Each call is a single POST of a JSON body to `{base_url}/{endpoint}`.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, TransportError, TransportErrorKind};
use crate::transport::{RawResponse, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use std::time::Duration;

/// HTTP-based transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the ledger, without a trailing slash.
    base_url: String,
    /// Pooled HTTP client.
    client: reqwest::Client,
    /// Basic-auth credentials.
    credentials: Option<(String, Option<String>)>,
}

impl HttpTransport {
    /// Creates a new HTTP transport from a client configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::local(format!("failed to build http client: {}", e)))?;

        reqwest::Url::parse(&config.base_url).map_err(|e| {
            ClientError::local(format!("invalid base url {:?}: {}", config.base_url, e))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            credentials: config
                .credentials()
                .map(|(user, secret)| (user.to_string(), secret.map(str::to_string))),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the URL for an endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: Bytes) -> Result<RawResponse, TransportError> {
        let mut request = self
            .client
            .post(self.endpoint_url(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);

        if let Some((user, secret)) = &self.credentials {
            request = request.basic_auth(user, secret.as_deref());
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response.bytes().await.map_err(classify_error)?;

        Ok(RawResponse {
            status,
            body,
            retry_after,
        })
    }
}

/// Maps a reqwest failure onto a transport error kind.
fn classify_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if is_tls_failure(&err) {
            TransportErrorKind::Tls
        } else {
            TransportErrorKind::Connect
        }
    } else if err.is_builder() || err.is_redirect() {
        TransportErrorKind::Request
    } else if err.is_request() || err.is_body() || err.is_decode() {
        TransportErrorKind::Reset
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}

fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        let text = inner.to_string().to_ascii_lowercase();
        if text.contains("tls") || text.contains("certificate") {
            return true;
        }
        source = inner.source();
    }
    false
}

/// Parses a `Retry-After` header given in seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn transport_creation() {
        let config = ClientConfig::new("https://ledger.example.com/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "https://ledger.example.com");
        assert_eq!(
            transport.endpoint_url("list-assets"),
            "https://ledger.example.com/list-assets"
        );
        assert_eq!(
            transport.endpoint_url("/create-asset"),
            "https://ledger.example.com/create-asset"
        );
    }

    #[test]
    fn invalid_base_url_is_local_error() {
        let config = ClientConfig::new("not a url");
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Local { .. }));
    }

    #[test]
    fn credentials_are_split() {
        let config = ClientConfig::new("http://localhost:1999").with_access_token("user:pw");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.credentials,
            Some(("user".to_string(), Some("pw".to_string())))
        );
    }

    #[test]
    fn retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        // Port 9 (discard) is closed on test hosts.
        let config = ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport
            .post("list-assets", Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected kind: {:?}", err.kind);
    }
}
