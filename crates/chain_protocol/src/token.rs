//! Client tokens for idempotent creates.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Field carrying the client token in each create-batch element.
pub const CLIENT_TOKEN_FIELD: &str = "client_token";

/// An opaque client-generated token identifying one logical create.
///
/// The ledger deduplicates create requests by token: a repeated element
/// with a known token yields the original result instead of a new object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(String);

impl ClientToken {
    /// Creates a token, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Creates a token from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A create-batch element: the caller's spec with its client token appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenedSpec<S> {
    /// The caller's spec, flattened into the element.
    #[serde(flatten)]
    pub spec: S,
    /// The element's client token.
    pub client_token: ClientToken,
}

impl<S> TokenedSpec<S> {
    /// Attaches a token to a spec.
    pub fn new(spec: S, client_token: ClientToken) -> Self {
        Self { spec, client_token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_token_rejected() {
        assert!(ClientToken::new("").is_none());
        assert_eq!(ClientToken::new("t-1").unwrap().as_str(), "t-1");
    }

    #[test]
    fn token_is_flattened_into_spec() {
        #[derive(Serialize)]
        struct Spec {
            alias: &'static str,
        }

        let element = TokenedSpec::new(Spec { alias: "gold" }, ClientToken::new("t-1").unwrap());
        assert_eq!(
            serde_json::to_value(&element).unwrap(),
            json!({"alias": "gold", "client_token": "t-1"})
        );
    }

    #[test]
    fn token_is_flattened_into_borrowed_spec() {
        let spec = json!({"alias": "silver", "definition": {}});
        let element = TokenedSpec::new(&spec, ClientToken::new("t-2").unwrap());
        let encoded = serde_json::to_value(&element).unwrap();
        assert_eq!(encoded[CLIENT_TOKEN_FIELD], json!("t-2"));
        assert_eq!(encoded["alias"], json!("silver"));
    }
}
