use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 250;
/// Upper bound for a single backoff step.
pub const MAX_DELAY_MS: u64 = 8_000;

fn retryable_text_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)rate.?limit|too many (?:connections|clients)|temporarily unavailable",
            r"|service.?unavailable|connection.?refused|database system is starting up",
        ))
        .expect("retry regex must compile")
    })
}

/// Retry policy for a failed initial response.
///
/// Gateway and throttling statuses are retried, as are bodies reporting a
/// saturated or restarting database. Query errors are final.
pub fn is_retryable_http_error(status: u16, error_text: &str) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504) || retryable_text_regex().is_match(error_text)
}

/// Exponential backoff for a retry attempt, capped at [`MAX_DELAY_MS`].
pub fn retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.min(30);
    let delay = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(exponent));
    Duration::from_millis(delay.min(MAX_DELAY_MS))
}
