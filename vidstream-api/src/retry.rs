use crate::error::{ApiError, ApiResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Predicate deciding whether a failed attempt is worth another try
pub type ShouldRetry = Arc<dyn Fn(&ApiError) -> bool + Send + Sync>;

/// Retry policy for [`with_retry`]
#[derive(Clone)]
pub struct RetryOptions {
    pub max_retries: u32,
    /// Base delay between attempts
    pub delay: Duration,
    /// Double the delay after every failed attempt
    pub backoff: bool,
    /// Defaults to [`ApiError::is_retryable`]
    pub should_retry: Option<ShouldRetry>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
            backoff: true,
            should_retry: None,
        }
    }
}

impl std::fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("custom_should_retry", &self.should_retry.is_some())
            .finish()
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_should_retry<F>(mut self, should_retry: F) -> Self
    where
        F: Fn(&ApiError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(should_retry));
        self
    }

    fn should_retry(&self, error: &ApiError) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(error),
            None => error.is_retryable(),
        }
    }

    /// Wait before the attempt following `attempt` (zero based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.backoff {
            self.delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.delay
        }
    }
}

/// Run `operation` until it succeeds, the predicate rejects the error, or
/// `max_retries` retries have been spent.
///
/// At most `max_retries + 1` attempts are made and the error returned is the
/// one from the last attempt.
pub async fn with_retry<T, F, Fut>(mut operation: F, options: RetryOptions) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= options.max_retries || !options.should_retry(&error) {
                    return Err(error);
                }

                let wait = options.delay_for_attempt(attempt);
                tracing::debug!(
                    target: "api::retry",
                    attempt = attempt + 1,
                    max_retries = options.max_retries,
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "Attempt failed, retrying"
                );
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn assert_near(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_exponential_backoff() {
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();
        let attempts_at = Arc::new(Mutex::new(Vec::new()));

        let result: ApiResult<()> = with_retry(
            || {
                let calls = calls.clone();
                let attempts_at = attempts_at.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    attempts_at.lock().unwrap().push(started.elapsed());
                    let body = format!(r#"{{"message":"attempt {}"}}"#, n);
                    Err(ApiError::from_status(503, "Service Unavailable", body.as_bytes()))
                }
            },
            RetryOptions::new()
                .with_max_retries(2)
                .with_delay(Duration::from_millis(100)),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "attempt 2");

        let attempts_at = attempts_at.lock().unwrap();
        assert_near(attempts_at[0], 0);
        assert_near(attempts_at[1], 100);
        assert_near(attempts_at[2], 300);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let result: ApiResult<()> = with_retry(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::from_status(404, "Not Found", b""))
                }
            },
            RetryOptions::default(),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_near(started.elapsed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_predicate_and_flat_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let result = with_retry(
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ApiError::Timeout)
                    } else {
                        Ok("done")
                    }
                }
            },
            RetryOptions::new()
                .with_delay(Duration::from_millis(50))
                .with_backoff(false)
                .with_should_retry(ApiError::is_timeout),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_near(started.elapsed(), 100);
    }

    #[test]
    fn backoff_delays_double() {
        let options = RetryOptions::default();
        assert_eq!(options.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(options.delay_for_attempt(2), Duration::from_millis(4000));
        let flat = options.with_backoff(false);
        assert_eq!(flat.delay_for_attempt(5), Duration::from_millis(1000));
    }
}
