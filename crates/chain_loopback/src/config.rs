//! Ledger configuration.

use chain_protocol::HexBytes;

/// Configuration for the loopback ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Page size used when a query does not set one.
    pub default_page_size: usize,
    /// Largest page size honored.
    pub max_page_size: usize,
    /// Largest number of elements accepted by one create call.
    pub max_batch: usize,
    /// Identifier reported by `get-snapshot-info`.
    pub blockchain_id: HexBytes,
    /// Seconds advertised in `Retry-After` on injected failures.
    pub retry_after_secs: Option<u64>,
}

impl LedgerConfig {
    /// Creates a configuration with the given default page size.
    pub fn new(default_page_size: usize) -> Self {
        Self {
            default_page_size: default_page_size.max(1),
            max_page_size: 1000,
            max_batch: 1000,
            blockchain_id: HexBytes::new([0x1c; 32]),
            retry_after_secs: None,
        }
    }

    /// Sets the maximum page size.
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    /// Sets the maximum create batch size.
    pub fn with_max_batch(mut self, size: usize) -> Self {
        self.max_batch = size;
        self
    }

    /// Sets the blockchain identifier.
    pub fn with_blockchain_id(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.blockchain_id = HexBytes::new(id);
        self
    }

    /// Advertises a `Retry-After` delay on injected failures.
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    /// Resolves the page size for a query.
    pub fn page_size(&self, requested: Option<u64>) -> usize {
        match requested {
            Some(0) | None => self.default_page_size,
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.max_page_size),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(100)
    }
}
