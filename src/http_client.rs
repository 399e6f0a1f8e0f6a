//! Shared HTTP client configuration, retry policy and bounded response helpers.
//!
//! Both outbound calls of the pipeline go through here: the dataset download
//! and the collector-to-trainer trigger.

use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry settings for network operations with exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first try.
    pub max_attempts: usize,
    /// Base delay used for the exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay allowed between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Return a shared HTTP agent with consistent timeouts.
pub(crate) fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

/// Whether a failed request is worth another attempt.
///
/// Transport failures and server-side statuses are retried; client errors are not.
pub(crate) fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Transport(_) => true,
        ureq::Error::Status(code, _) => *code >= 500,
    }
}

/// Whether the request failed before any bytes reached the server.
///
/// Only these are safe to repeat for a non-idempotent POST.
pub(crate) fn is_connect_failure(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Transport(transport) => matches!(
            transport.kind(),
            ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns
        ),
        ureq::Error::Status(..) => false,
    }
}

/// Retry an operation with bounded exponential backoff when the predicate allows it.
pub(crate) fn retry_with_backoff<T, E, F, R>(
    config: RetryConfig,
    mut action: F,
    mut should_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    R: FnMut(&E) -> bool,
{
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match action() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_attempts || !should_retry(&err) {
                    return Err(err);
                }
                let delay = backoff_delay(config.base_delay, config.max_delay, attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
                std::thread::sleep(delay);
            }
        }
    }
}

/// Read a response into memory, enforcing a maximum byte size.
pub(crate) fn read_response_bytes(
    response: ureq::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, io::Error> {
    check_content_length(&response, max_bytes)?;
    let mut limited = response.into_reader().take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}

fn check_content_length(response: &ureq::Response, max_bytes: usize) -> Result<(), io::Error> {
    let Some(length) = response.header("Content-Length") else {
        return Ok(());
    };
    let Ok(length) = length.parse::<u64>() else {
        return Ok(());
    };
    if length > max_bytes as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response too large: {length} bytes"),
        ));
    }
    Ok(())
}

fn backoff_delay(base: Duration, max: Duration, attempt: usize) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max)
}


#[cfg(test)]
mod tests {
    use super::test_server::{
        ok_response, refused_url, serve_hang_up, serve_sequence, status_response,
    };
    use super::*;

    fn no_delay(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn read_response_bytes_rejects_content_length_over_max() {
        let response = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Length: 100\r\n",
            "\r\n",
            "ok"
        )
        .to_string();
        let url = serve_sequence(vec![response]);
        let response = agent().get(&url).call().unwrap();
        let err = read_response_bytes(response, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_response_bytes_rejects_body_over_max() {
        let body = "a".repeat(32);
        let url = serve_sequence(vec![format!("HTTP/1.0 200 OK\r\n\r\n{body}")]);
        let response = agent().get(&url).call().unwrap();
        let err = read_response_bytes(response, 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_response_bytes_accepts_under_limit() {
        let url = serve_sequence(vec![ok_response("hello")]);
        let response = agent().get(&url).call().unwrap();
        let bytes = read_response_bytes(response, 16).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn server_errors_are_retried_until_success() {
        let url = serve_sequence(vec![
            status_response(503, "Service Unavailable"),
            ok_response("done"),
        ]);
        let response = retry_with_backoff(no_delay(3), || agent().get(&url).call(), is_retryable)
            .unwrap();
        assert_eq!(response.into_string().unwrap(), "done");
    }

    #[test]
    fn client_errors_are_not_retried() {
        let url = serve_sequence(vec![status_response(404, "Not Found"), ok_response("late")]);
        let err = retry_with_backoff(no_delay(3), || agent().get(&url).call(), is_retryable)
            .unwrap_err();
        assert!(matches!(err, ureq::Error::Status(404, _)));
    }

    #[test]
    fn only_failures_before_sending_count_as_connect_failures() {
        let refused = agent().get(&refused_url()).call().unwrap_err();
        assert!(is_connect_failure(&refused), "{refused}");

        let (url, _) = serve_hang_up();
        let dropped = agent().get(&url).call().unwrap_err();
        assert!(matches!(dropped, ureq::Error::Transport(_)));
        assert!(!is_connect_failure(&dropped), "{dropped}");

        let url = serve_sequence(vec![status_response(503, "Service Unavailable")]);
        let status = agent().get(&url).call().unwrap_err();
        assert!(!is_connect_failure(&status));
    }

    #[test]
    fn retry_with_backoff_gives_up_after_max_attempts() {
        let mut attempts = 0usize;
        let result: Result<u32, &'static str> = retry_with_backoff(
            no_delay(3),
            || {
                attempts += 1;
                Err("fail")
            },
            |_| true,
        );
        assert_eq!(result, Err("fail"));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn backoff_grows_and_saturates() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(350);
        assert_eq!(backoff_delay(base, max, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, max, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, max, 3), max);
        assert_eq!(backoff_delay(base, max, 64), max);
    }
}
