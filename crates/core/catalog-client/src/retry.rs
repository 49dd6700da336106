//! Rate-limit aware request sending.
//!
//! The catalog API throttles aggressive clients with `429 Too Many
//! Requests`. Every request goes through [`send_with_retry`], which
//! honors the `Retry-After` header (both delta-seconds and HTTP-date
//! forms) and backs off for at least a configured floor between
//! attempts.

use std::time::{Duration, SystemTime};

use reqwest::{header::HeaderMap, RequestBuilder, Response, StatusCode};

use crate::Error;

/// Retry behavior for rate-limited requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total number of attempts before giving up, including the first.
    pub max_attempts: u32,
    /// Lower bound on the pause between attempts. A `Retry-After`
    /// shorter than this (or absent) is raised to it.
    pub min_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay: Duration::from_millis(1000),
        }
    }
}

/// Sends a request, retrying on 429 responses up to the configured
/// attempt budget.
///
/// Any non-429 response, success or failure, is returned to the caller
/// for status dispatch. Exhausting the budget yields
/// [`Error::RateLimitExceeded`].
pub(crate) async fn send_with_retry(
    request: RequestBuilder,
    retry: &RetryConfig,
) -> Result<Response, Error> {
    let mut attempt = 1;

    loop {
        let current = request.try_clone().ok_or(Error::UncloneableRequest)?;

        let response = current.send().await.map_err(|err| Error::Network {
            url: err.url().map(ToString::to_string).unwrap_or_default(),
            source: err,
        })?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        if attempt >= retry.max_attempts {
            let url = response.url().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("Failed to read response body"));
            return Err(Error::RateLimitExceeded {
                url,
                attempts: attempt,
                body,
            });
        }

        let delay = retry_delay(response.headers(), retry.min_delay);
        tracing::warn!(
            attempt,
            max_attempts = retry.max_attempts,
            delay_ms = delay.as_millis() as u64,
            url = %response.url(),
            "Rate limited by the catalog, backing off"
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Computes the pause before the next attempt from a 429 response's
/// headers, never going below `floor`.
pub fn retry_delay(headers: &HeaderMap, floor: Duration) -> Duration {
    let Some(value) = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
    else {
        return floor;
    };

    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds).max(floor);
    }

    if let Ok(date) = httpdate::parse_http_date(value) {
        let until = date
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        return until.max(floor);
    }

    // Unparseable header, fall back to the floor.
    floor
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, RETRY_AFTER};

    use super::*;

    const FLOOR: Duration = Duration::from_millis(1000);

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).expect("ascii"));
        headers
    }

    #[test]
    fn absent_header_uses_the_floor() {
        assert_eq!(retry_delay(&HeaderMap::new(), FLOOR), FLOOR);
    }

    #[test]
    fn delta_seconds_above_the_floor_are_honored() {
        assert_eq!(retry_delay(&headers("3"), FLOOR), Duration::from_secs(3));
    }

    #[test]
    fn delta_seconds_below_the_floor_are_raised() {
        assert_eq!(retry_delay(&headers("0"), FLOOR), FLOOR);
    }

    #[test]
    fn http_date_in_the_future_is_honored() {
        //* Given
        let future = SystemTime::now() + Duration::from_secs(30);
        let headers = headers(&httpdate::fmt_http_date(future));

        //* When
        let delay = retry_delay(&headers, FLOOR);

        //* Then
        // Allow for the clock read between formatting and computing.
        assert!(delay > Duration::from_secs(25), "got {delay:?}");
        assert!(delay <= Duration::from_secs(30), "got {delay:?}");
    }

    #[test]
    fn http_date_in_the_past_is_raised_to_the_floor() {
        let past = SystemTime::now() - Duration::from_secs(30);
        let headers = headers(&httpdate::fmt_http_date(past));

        assert_eq!(retry_delay(&headers, FLOOR), FLOOR);
    }

    #[test]
    fn garbage_header_uses_the_floor() {
        assert_eq!(retry_delay(&headers("soon"), FLOOR), FLOOR);
    }
}
