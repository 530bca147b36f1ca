//! Idempotency token generation.

use chain_protocol::ClientToken;
use std::fmt;
use uuid::Uuid;

/// Source of client tokens for create calls.
///
/// The client asks for exactly one token per element of a logical create,
/// before the first attempt. Implementations must not repeat tokens.
pub trait TokenGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh, unique token.
    fn new_token(&self) -> ClientToken;
}

/// Generates random UUIDv4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenGenerator;

impl TokenGenerator for UuidTokenGenerator {
    fn new_token(&self) -> ClientToken {
        ClientToken::from_uuid(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_tokens_are_unique() {
        let generator = UuidTokenGenerator;
        let tokens: HashSet<_> = (0..1000).map(|_| generator.new_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn uuid_tokens_parse_as_v4() {
        let token = UuidTokenGenerator.new_token();
        let parsed = Uuid::parse_str(token.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
