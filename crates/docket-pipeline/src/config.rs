//! Configuration for the batch pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budget and backoff curve for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base: Duration,

    /// Upper bound on any single delay
    pub cap: Duration,
}

impl RetryPolicy {
    /// Backoff after the given failed attempt (1-based)
    ///
    /// `min(base * 2^(attempt-1), cap)`, with no jitter.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use docket_pipeline::RetryPolicy;
    ///
    /// let policy = RetryPolicy {
    ///     max_attempts: 5,
    ///     base: Duration::from_secs(1),
    ///     cap: Duration::from_secs(5),
    /// };
    /// assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    /// assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// Configuration for the batch pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retries after the first attempt
    pub retry_attempts: u32,

    /// Maximum extraction calls in flight per batch
    pub concurrency: usize,

    /// Backoff after the first failure (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff (milliseconds)
    pub backoff_cap_ms: u64,

    /// Maximum time for a single extraction call (seconds)
    pub request_timeout_secs: u64,

    /// Bytes of raw service response kept on parse failures
    pub raw_response_limit: usize,

    /// Document extensions picked up from tenant folders
    pub extensions: Vec<String>,
}

impl PipelineConfig {
    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.saturating_add(1),
            base: Duration::from_millis(self.backoff_base_ms),
            cap: Duration::from_millis(self.backoff_cap_ms),
        }
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether a file name has one of the configured extensions
    pub fn accepts(&self, filename: &str) -> bool {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err("backoff_cap_ms cannot be below backoff_base_ms".to_string());
        }
        if self.raw_response_limit == 0 {
            return Err("raw_response_limit must be greater than 0".to_string());
        }
        if self.extensions.is_empty() {
            return Err("extensions must list at least one extension".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            concurrency: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            request_timeout_secs: 120,
            raw_response_limit: 2_000,
            extensions: vec!["pdf".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Aggressive preset: more parallelism, fewer and shorter retries
    pub fn aggressive() -> Self {
        Self {
            retry_attempts: 1,
            concurrency: 8,
            backoff_base_ms: 500,
            backoff_cap_ms: 5_000,
            request_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Lenient preset: gentle on the service, patient with failures
    pub fn lenient() -> Self {
        Self {
            retry_attempts: 4,
            concurrency: 1,
            backoff_base_ms: 2_000,
            backoff_cap_ms: 60_000,
            request_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
