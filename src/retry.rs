//! Bounded retry with backoff around a single outbound HTTP call
//!
//! The wrapped operation is re-invoked as-is; callers are responsible for it
//! being safe to repeat.

use crate::assistant::ApiError;
use std::future::Future;
use std::time::Duration;

/// Status codes that justify another attempt
pub const RETRYABLE_STATUS_CODES: [u16; 3] = [502, 503, 504];

const FAST_SCHEDULE_MS: [u64; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];
const COARSE_SCHEDULE_MS: [u64; 3] = [500, 1000, 2000];

/// Anything that carries a numeric HTTP status
pub trait HttpStatus {
    fn status_code(&self) -> u16;
}

impl HttpStatus for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Delay schedule; one delay per retry, so at most `delays.len() + 1` attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(millis: &[u64]) -> Self {
        Self::new(millis.iter().copied().map(Duration::from_millis).collect())
    }

    /// Millisecond-scale exponential schedule
    pub fn fast() -> Self {
        Self::from_millis(&FAST_SCHEDULE_MS)
    }

    /// Half-second linear-ish schedule
    pub fn coarse() -> Self {
        Self::from_millis(&COARSE_SCHEDULE_MS)
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    /// Run `op` until it yields a non-retryable status or the schedule runs out.
    ///
    /// Transport errors are retried on the same schedule. When attempts are
    /// exhausted the last error is returned; a retryable status on the final
    /// attempt becomes a `ServerError`.
    pub async fn call<R, F, Fut>(&self, operation: &str, mut op: F) -> Result<R, ApiError>
    where
        R: HttpStatus,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = op().await;

            let Some(&delay) = self.delays.get(attempt) else {
                return self.finish(operation, attempt, outcome);
            };

            match outcome {
                Ok(response) if is_retryable_status(response.status_code()) => {
                    tracing::debug!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.delays.len(),
                        status = response.status_code(),
                        delay_ms = %delay.as_millis(),
                        "Retryable status, backing off"
                    );
                }
                Ok(response) => {
                    if attempt > 0 {
                        tracing::debug!(operation, retries = attempt, "Succeeded after retries");
                    }
                    return Ok(response);
                }
                Err(e) => {
                    tracing::debug!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.delays.len(),
                        error = %e,
                        delay_ms = %delay.as_millis(),
                        "Request failed, backing off"
                    );
                }
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn finish<R: HttpStatus>(
        &self,
        operation: &str,
        attempt: usize,
        outcome: Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let result = match outcome {
            Ok(response) if is_retryable_status(response.status_code()) => Err(
                ApiError::server_error(format!(
                    "Request failed with status code {}",
                    response.status_code()
                )),
            ),
            other => other,
        };

        if let Err(e) = &result {
            tracing::warn!(
                operation,
                attempts = attempt + 1,
                error = %e,
                "All attempts failed"
            );
        } else if attempt > 0 {
            tracing::debug!(operation, retries = attempt, "Succeeded after retries");
        }

        result
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fast()
    }
}
