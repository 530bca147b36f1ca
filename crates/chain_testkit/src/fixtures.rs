//! Test fixtures.
//!
//! Provides a client wired to an in-process ledger, deterministic client
//! tokens and logging for tests.

use crate::transport::LoopbackTransport;
use chain_client::{Client, ClientConfig, RetryConfig, TokenGenerator};
use chain_loopback::{LedgerConfig, LoopbackLedger};
use chain_protocol::ClientToken;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Issues `<prefix>-1`, `<prefix>-2`, ... in order.
#[derive(Debug)]
pub struct SequentialTokenGenerator {
    prefix: String,
    issued: Arc<AtomicU64>,
}

impl SequentialTokenGenerator {
    /// Creates a generator with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a counter of issued tokens that outlives the generator.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.issued)
    }

    /// Returns the number of tokens issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl TokenGenerator for SequentialTokenGenerator {
    fn new_token(&self) -> ClientToken {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        ClientToken::new(format!("{}-{}", self.prefix, n))
            .unwrap_or_else(|| ClientToken::from_uuid(Default::default()))
    }
}

/// Retry settings for tests: `attempts` tries, no waiting.
pub fn fast_retry(attempts: u32) -> RetryConfig {
    RetryConfig::new(attempts)
        .with_initial_delay(Duration::ZERO)
        .with_max_delay(Duration::ZERO)
        .with_jitter(false)
}

/// Client configuration for tests.
pub fn test_config(attempts: u32) -> ClientConfig {
    ClientConfig::new("http://loopback.test")
        .with_timeout(Duration::from_secs(5))
        .with_retry(fast_retry(attempts))
}

/// A client connected to an in-process ledger.
pub struct TestLedger {
    /// The ledger.
    pub ledger: Arc<LoopbackLedger>,
    /// A client using the ledger, with deterministic tokens.
    pub client: Client,
    /// Number of client tokens the client has drawn.
    pub tokens_issued: Arc<AtomicU64>,
}

impl TestLedger {
    /// Creates an empty ledger and a client allowed three attempts.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default(), 3)
    }

    /// Creates a ledger with `config` and a client allowed `attempts` tries.
    pub fn with_config(config: LedgerConfig, attempts: u32) -> Self {
        init_test_logging();
        let ledger = Arc::new(LoopbackLedger::new(config));
        let tokens = SequentialTokenGenerator::new("token");
        let tokens_issued = tokens.counter();
        let client = Client::with_transport(test_config(attempts), LoopbackTransport::new(Arc::clone(&ledger)))
            .with_token_generator(tokens);

        Self {
            ledger,
            client,
            tokens_issued,
        }
    }

    /// Returns the number of client tokens drawn so far.
    pub fn tokens_issued(&self) -> u64 {
        self.tokens_issued.load(Ordering::SeqCst)
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// The level comes from `RUST_LOG`, defaulting to `warn`. Safe to call from
/// every test.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
