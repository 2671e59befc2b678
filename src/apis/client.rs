/// Base HTTP plumbing shared by the API clients
///
/// Every request runs through [`HttpClient::get_json`]: slot-reserved pacing
/// against the endpoint's rate budget, bounded retry with jittered backoff
/// for retriable failures, and uniform status classification. A 404 is never
/// an error; callers get `Ok(None)`.
use crate::errors::{ApiError, ApiResult};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Retry policy shared by all clients: exponential backoff with jitter for
/// 5xx, 429, and transport errors
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8_000;

/// Per-minute request budget enforced by slot reservation
///
/// Callers claim the next send slot under a short lock and sleep outside it;
/// slots are handed out strictly `min_interval` apart, so concurrent callers
/// queue up in claim order without a semaphore. A 429 recovery hint pushes
/// the whole slot schedule past the upstream's requested quiet period.
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        let min_interval = if max_per_minute > 0 {
            Duration::from_secs_f64(60.0 / max_per_minute as f64)
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Claim the next send slot and wait until it arrives
    pub async fn pace(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let wait = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Delay all future slots until `not_before` (upstream recovery hint)
    pub async fn hold_until(&self, not_before: Instant) {
        let mut next = self.next_slot.lock().await;
        match *next {
            Some(at) if at >= not_before => {}
            _ => *next = Some(not_before),
        }
    }
}

/// HTTP client wrapper: shared connection pool, per-request timeout, and the
/// paced/retried JSON request path
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> ApiResult<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unavailable {
                feed: "http",
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a GET with pacing, retry, and JSON decoding
    ///
    /// Retriable failures (HTTP 5xx, 429, transport errors) back off
    /// exponentially with jitter. A `Retry-After` hint both bounds the next
    /// backoff and holds the limiter's slot schedule, so sibling calls on the
    /// same endpoint stay quiet too.
    pub async fn get_json<T>(
        &self,
        feed: &'static str,
        builder: reqwest::RequestBuilder,
        limiter: &RateLimiter,
    ) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt, last_error.as_ref())).await;
            }

            let builder = match builder.try_clone() {
                Some(b) => b,
                None => {
                    return Err(ApiError::Unavailable {
                        feed,
                        message: "request not cloneable for retry".to_string(),
                    })
                }
            };

            limiter.pace().await;
            let response = match builder.timeout(self.timeout).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ApiError::Unavailable {
                        feed,
                        message: format!("Request failed: {}", e),
                    });
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ApiError::Auth {
                    feed,
                    message: format!("HTTP {}", status),
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                if let Some(hint) = retry_after {
                    limiter.hold_until(Instant::now() + hint).await;
                }
                last_error = Some(ApiError::RateLimited { feed, retry_after });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(ApiError::Unavailable {
                    feed,
                    message: format!("HTTP {}: {}", status, truncate(&body, 200)),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::BadResponse {
                    feed,
                    message: format!("HTTP {}: {}", status, truncate(&body, 200)),
                });
            }

            return match response.json::<T>().await {
                Ok(value) => Ok(Some(value)),
                Err(e) => Err(ApiError::BadResponse {
                    feed,
                    message: format!("Failed to parse response: {}", e),
                }),
            };
        }

        Err(last_error.unwrap_or(ApiError::Unavailable {
            feed,
            message: "retries exhausted".to_string(),
        }))
    }
}

/// Exponential backoff with jitter, bounded by the upstream recovery hint
fn backoff_delay(attempt: u32, last_error: Option<&ApiError>) -> Duration {
    if let Some(ApiError::RateLimited {
        retry_after: Some(hint),
        ..
    }) = last_error
    {
        return (*hint).min(Duration::from_millis(MAX_BACKOFF_MS));
    }

    let exp = BASE_BACKOFF_MS.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(4));
    let capped = exp.min(MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped + jitter)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pacing_spaces_slot_claims() {
        let limiter = RateLimiter::new(600); // 100ms between slots
        let start = Instant::now();
        for _ in 0..3 {
            limiter.pace().await;
        }
        // First slot is immediate; the next two wait ~100ms each
        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn unlimited_budget_never_waits() {
        let limiter = RateLimiter::new(0);
        let start = Instant::now();
        for _ in 0..100 {
            limiter.pace().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn hold_until_pushes_the_schedule_out() {
        let limiter = RateLimiter::new(6_000); // 10ms spacing
        limiter.pace().await;

        let quiet = Duration::from_millis(150);
        limiter.hold_until(Instant::now() + quiet).await;

        let start = Instant::now();
        limiter.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn backoff_honors_retry_after_hint() {
        let err = ApiError::RateLimited {
            feed: "test",
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(backoff_delay(1, Some(&err)), Duration::from_secs(2));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let first = backoff_delay(1, None);
        assert!(first >= Duration::from_millis(BASE_BACKOFF_MS));
        let late = backoff_delay(10, None);
        assert!(late <= Duration::from_millis(MAX_BACKOFF_MS + MAX_BACKOFF_MS / 4));
    }
}
