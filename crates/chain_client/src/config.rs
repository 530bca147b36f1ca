//! Configuration for the client.

use rand::Rng;
use std::time::Duration;

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ledger (e.g. `http://localhost:1999`).
    pub base_url: String,
    /// Access token in `user:secret` form, sent as basic auth.
    pub access_token: Option<String>,
    /// Deadline for a single network attempt.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            user_agent: format!("chain-sdk-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Splits the access token into basic-auth credentials.
    ///
    /// A token without a `:` is used as the user name with no password.
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.access_token.as_deref().map(|token| match token.split_once(':') {
            Some((user, secret)) => (user, Some(secret)),
            None => (token, None),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:1999")
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }

    /// Calculates the delay after a given number of failed attempts.
    ///
    /// `attempt` counts the attempts made so far; `0` means none failed yet.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let max_secs = self.max_delay.as_secs_f64();
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // A negative or NaN multiplier must not reach Duration, which panics on them.
        let delay_secs = if base_delay.is_nan() {
            max_secs
        } else {
            base_delay.clamp(0.0, max_secs)
        };

        let secs = if self.add_jitter {
            // Up to 25% either way, still capped by max_delay.
            let jitter = delay_secs * 0.25 * rand::thread_rng().gen_range(-1.0..=1.0);
            (delay_secs + jitter).clamp(0.0, max_secs)
        } else {
            delay_secs
        };
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }

    /// Returns the number of attempts actually made, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_builder() {
        let config = ClientConfig::new("https://ledger.example.com")
            .with_access_token("client:s3cret")
            .with_timeout(Duration::from_secs(5))
            .with_retry(RetryConfig::no_retry());

        assert_eq!(config.base_url, "https://ledger.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.credentials(), Some(("client", Some("s3cret"))));
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(100));
        assert!(config.user_agent.starts_with("chain-sdk-rust/"));
        assert_eq!(config.credentials(), None);
    }

    #[test]
    fn token_without_secret() {
        let config = ClientConfig::default().with_access_token("bare");
        assert_eq!(config.credentials(), Some(("bare", None)));
    }

    #[test]
    fn retry_delay_calculation() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn retry_delay_jitter_bounds() {
        let config = RetryConfig::new(5).with_initial_delay(Duration::from_millis(100));

        for _ in 0..50 {
            let delay = config.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(75));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn retry_delay_respects_max() {
        let config = RetryConfig::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(10.0);

        for attempt in 1..40 {
            assert!(config.delay_for_attempt(attempt) <= Duration::from_secs(5));
        }
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryConfig::new(0).attempts(), 1);
    }

    proptest::proptest! {
        #[test]
        fn delay_never_exceeds_cap(
            attempt in 0u32..64,
            initial_ms in 0u64..2_000,
            max_ms in 0u64..10_000,
            multiplier in 1.0f64..8.0,
            jitter in proptest::bool::ANY,
        ) {
            let config = RetryConfig::new(5)
                .with_initial_delay(Duration::from_millis(initial_ms))
                .with_max_delay(Duration::from_millis(max_ms))
                .with_backoff_multiplier(multiplier)
                .with_jitter(jitter);

            proptest::prop_assert!(config.delay_for_attempt(attempt) <= Duration::from_millis(max_ms));
        }

        #[test]
        fn shrinking_or_negative_multiplier_stays_in_range(
            attempt in 0u32..64,
            max_ms in 0u64..10_000,
            multiplier in -8.0f64..1.0,
            jitter in proptest::bool::ANY,
        ) {
            let config = RetryConfig::new(5)
                .with_initial_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_millis(max_ms))
                .with_backoff_multiplier(multiplier)
                .with_jitter(jitter);

            proptest::prop_assert!(config.delay_for_attempt(attempt) <= Duration::from_millis(max_ms));
        }
    }

    #[test]
    fn non_finite_multiplier_uses_max_delay() {
        for multiplier in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -2.0] {
            let config = RetryConfig::new(3)
                .with_max_delay(Duration::from_secs(5))
                .with_backoff_multiplier(multiplier)
                .with_jitter(false);

            let delay = config.delay_for_attempt(2);
            assert!(delay <= Duration::from_secs(5), "{multiplier}: {delay:?}");
        }
        let nan = RetryConfig::new(3)
            .with_max_delay(Duration::from_secs(5))
            .with_backoff_multiplier(f64::NAN)
            .with_jitter(false);
        assert_eq!(nan.delay_for_attempt(2), Duration::from_secs(5));
    }
}
