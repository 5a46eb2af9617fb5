use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Retry attempts after the initial request.
pub const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;
const MAX_DELAY_MS: u64 = 8000;

fn transient_error_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(?i)rate.?limit|too.?many.?requests|overloaded|server.?(busy|had.?an.?error)|temporarily.?unavailable|connection.?(refused|reset)|gateway.?time.?out",
        )
        .expect("transient error regex must compile")
    })
}

/// Whether a failed chat completions request is worth retrying.
///
/// Covers the transient statuses the endpoint emits, plus error bodies
/// that describe a transient condition behind a non-retryable status
/// (some proxies report upstream overload as 400-level text).
pub fn is_retryable_http_error(status: u16, error_text: &str) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
        || transient_error_regex().is_match(error_text)
}

/// Exponential backoff, capped so late attempts do not stall the console.
pub fn retry_delay_ms(attempt: u32) -> Duration {
    let delay = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(delay.min(MAX_DELAY_MS))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{is_retryable_http_error, retry_delay_ms};

    #[test]
    fn transient_statuses_are_retryable() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_http_error(status, ""), "status {status}");
        }
        assert!(!is_retryable_http_error(401, "invalid key"));
        assert!(!is_retryable_http_error(404, "model not found"));
    }

    #[test]
    fn transient_error_text_matches_regardless_of_status() {
        assert!(is_retryable_http_error(400, "Rate limit exceeded"));
        assert!(is_retryable_http_error(400, "Too many requests"));
        assert!(is_retryable_http_error(400, "The server had an error"));
        assert!(is_retryable_http_error(400, "connection reset by peer"));
        assert!(!is_retryable_http_error(400, "model not found"));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(retry_delay_ms(0), Duration::from_millis(1000));
        assert_eq!(retry_delay_ms(1), Duration::from_millis(2000));
        assert_eq!(retry_delay_ms(2), Duration::from_millis(4000));
        assert_eq!(retry_delay_ms(3), Duration::from_millis(8000));
        assert_eq!(retry_delay_ms(9), Duration::from_millis(8000));
    }
}
