//! Retry executor: classifies upstream failures and retries transient ones
//! on a fixed backoff schedule. Terminal failures and exhausted retries
//! propagate immediately.

use crate::errors::{ProviderError, RetryClass};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

const HTTP_BACKOFF_SECONDS: [u64; 5] = [1, 2, 4, 8, 16];
const NETWORK_BACKOFF_SECONDS: [u64; 3] = [30, 120, 480];

/// Runs `attempt` until it succeeds, exhausts its retry budget, or fails
/// terminally. `attempt` is called fresh on every try (it must be cheaply
/// re-invocable, e.g. a closure capturing request parameters by reference).
pub async fn with_retry<T, F, Fut>(mut attempt: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut http_attempts = 0u32;
    let mut network_attempts = 0u32;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => match err.retry_class() {
                RetryClass::Terminal => return Err(err),
                RetryClass::TransientHttp => {
                    if http_attempts as usize >= HTTP_BACKOFF_SECONDS.len() {
                        return Err(ProviderError::RetriesExhausted {
                            attempts: http_attempts,
                            source: Box::new(err),
                        });
                    }
                    let delay = HTTP_BACKOFF_SECONDS[http_attempts as usize];
                    http_attempts += 1;
                    sleep_with_jitter(delay).await;
                }
                RetryClass::TransientNetwork => {
                    if network_attempts as usize >= NETWORK_BACKOFF_SECONDS.len() {
                        return Err(ProviderError::RetriesExhausted {
                            attempts: network_attempts,
                            source: Box::new(err),
                        });
                    }
                    let delay = NETWORK_BACKOFF_SECONDS[network_attempts as usize];
                    network_attempts += 1;
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
            },
        }
    }
}

async fn sleep_with_jitter(base_seconds: u64) {
    let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
    let total = Duration::from_secs_f64(base_seconds as f64 + jitter);
    tokio::time::sleep(total).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn terminal_error_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::Terminal {
                    status: 400,
                    message: "bad request".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_http_retries_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = with_retry(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::TransientHttp {
                        status: 503,
                        message: "unavailable".into(),
                    })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
