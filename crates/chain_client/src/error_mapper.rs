//! Mapping of failed HTTP responses to typed errors.

use crate::error::{ClientError, ErrorClass};
use crate::transport::RawResponse;
use chain_protocol::ErrorRecord;

/// Longest body prefix kept in an error.
pub const MAX_SNIPPET_BYTES: usize = 512;

/// Maps a non-2xx response to a [`ClientError`].
///
/// A body that parses as an [`ErrorRecord`] yields [`ClientError::Api`];
/// anything else yields [`ClientError::Http`] with a snippet of the body.
pub fn map_response(response: &RawResponse) -> ClientError {
    match serde_json::from_slice::<ErrorRecord>(&response.body) {
        Ok(record) if !record.code.is_empty() => ClientError::Api {
            status: Some(response.status),
            record,
            retry_after: response.retry_after,
        },
        _ => ClientError::Http {
            status: response.status,
            body: snippet(&response.body),
            retry_after: response.retry_after,
        },
    }
}

/// Classifies an HTTP status.
///
/// Request timeouts, rate limiting and server errors are transient; every
/// other status is permanent.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 | 429 => ErrorClass::Transient,
        500..=599 => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Returns the leading part of a body as text, cut on a char boundary.
pub fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_SNIPPET_BYTES {
        return text.into_owned();
    }
    let mut end = MAX_SNIPPET_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse::new(status, body.as_bytes().to_vec())
    }

    #[test]
    fn parseable_body_yields_api_error() {
        let body = json!({
            "code": "CH003",
            "message": "Invalid request body",
            "detail": "field quorum: expected number",
            "temporary": false
        });
        let err = map_response(&response(400, &body.to_string()));

        assert_eq!(err.code(), "CH003");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.detail(), Some("field quorum: expected number"));
        assert_eq!(err.class(), ErrorClass::Permanent);
    }

    #[test]
    fn unparseable_body_yields_http_error() {
        let err = map_response(&response(502, "<html>Bad Gateway</html>"));
        match &err {
            ClientError::Http { status, body, .. } => {
                assert_eq!(*status, 502);
                assert_eq!(body, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_code_is_not_a_record() {
        let err = map_response(&response(400, r#"{"code": "", "message": "?"}"#));
        assert!(matches!(err, ClientError::Http { status: 400, .. }));
    }

    #[test]
    fn retry_after_is_carried() {
        let mut raw = response(429, "slow down");
        raw.retry_after = Some(Duration::from_secs(2));
        let err = map_response(&raw);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert!(err.is_retryable());
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(400), ErrorClass::Permanent);
        assert_eq!(classify_status(401), ErrorClass::Permanent);
        assert_eq!(classify_status(404), ErrorClass::Permanent);
        assert_eq!(classify_status(408), ErrorClass::Transient);
        assert_eq!(classify_status(429), ErrorClass::Transient);
        assert_eq!(classify_status(500), ErrorClass::Transient);
        assert_eq!(classify_status(503), ErrorClass::Transient);
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "é".repeat(MAX_SNIPPET_BYTES);
        let cut = snippet(body.as_bytes());
        assert!(cut.ends_with('…'));
        assert!(cut.len() <= MAX_SNIPPET_BYTES + '…'.len_utf8());
        assert_eq!(snippet(b"short"), "short");
    }
}
