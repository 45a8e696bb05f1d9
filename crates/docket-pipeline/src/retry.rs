//! Bounded retry around the extraction gateway

use crate::config::{PipelineConfig, RetryPolicy};
use docket_domain::{Outcome, ProgressEvent, ProgressSink};
use docket_gateway::{ExtractionGateway, ExtractionRequest, GatewayError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Runs one document through the gateway with retry and exponential backoff
///
/// Only errors the gateway classifies as retryable are retried. Each call is
/// bounded by the request timeout; a timeout is terminal.
pub struct RetryingExecutor {
    gateway: Arc<dyn ExtractionGateway>,
    policy: RetryPolicy,
    timeout: Duration,
    raw_response_limit: usize,
}

impl RetryingExecutor {
    /// Create an executor
    pub fn new(
        gateway: Arc<dyn ExtractionGateway>,
        policy: RetryPolicy,
        timeout: Duration,
        raw_response_limit: usize,
    ) -> Self {
        Self {
            gateway,
            policy,
            timeout,
            raw_response_limit,
        }
    }

    /// Create an executor from pipeline settings
    pub fn from_config(gateway: Arc<dyn ExtractionGateway>, config: &PipelineConfig) -> Self {
        Self::new(
            gateway,
            config.retry_policy(),
            config.request_timeout(),
            config.raw_response_limit,
        )
    }

    /// Retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute one request, emitting a `retrying` event before every backoff
    pub async fn execute(&self, request: &ExtractionRequest, sink: &dyn ProgressSink) -> Outcome {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.timeout, self.gateway.extract(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
            };

            match result {
                Ok(extraction) => {
                    debug!(filename = %request.filename, attempt, "Extraction succeeded");
                    return Outcome::Success {
                        extraction,
                        duration_ms: elapsed_ms(started),
                        attempts: attempt,
                    };
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    warn!(
                        filename = %request.filename,
                        attempt,
                        max_attempts,
                        delay_ms,
                        error = %e,
                        "Extraction failed, retrying"
                    );
                    sink.emit(ProgressEvent::Retrying {
                        filename: request.filename.clone(),
                        attempt,
                        max_attempts,
                        delay_ms,
                        error: e.to_string(),
                    });
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(filename = %request.filename, attempt, error = %e, "Extraction failed");
                    return Outcome::Failure {
                        error: e.to_string(),
                        raw_response: e
                            .raw_response()
                            .map(|raw| truncate_utf8(raw, self.raw_response_limit)),
                        duration_ms: elapsed_ms(started),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Cut a string to at most `limit` bytes without splitting a character
pub(crate) fn truncate_utf8(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
