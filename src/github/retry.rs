use crate::error::GithubError;
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;
const MAX_DELAY_MS: u64 = 60_000;

pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    fn delay_ms(&self, attempt: u32, err: &GithubError) -> u64 {
        let backoff = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
        err.retry_after_ms()
            .unwrap_or(backoff)
            .min(self.max_delay_ms)
    }
}

pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, GithubError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, GithubError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay_ms = config.delay_ms(attempt, &e);

                tracing::warn!(
                    "GitHub request failed (attempt {}/{}), retrying in {}ms: {}",
                    attempt,
                    config.max_retries,
                    delay_ms,
                    e
                );

                sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
