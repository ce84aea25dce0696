//! Exponential backoff shared by every outbound request.
//!
//! [`execute`] issues a request through a caller-supplied closure and keeps
//! re-issuing it while the server answers with a transient status (429 or
//! 5xx), sleeping for a doubling delay between attempts.

use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tracing::warn;

use crate::error::FetchError;

/// Backoff parameters. Defaults: 5 retries, 250ms initial delay, doubling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Number of retries after the initial request.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 5, initial_delay_ms: 250, multiplier: 2 }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_retries,
            initial_delay_ms: initial_delay.as_millis() as u64,
            multiplier,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Sleep before each retry, in order: `initial * multiplier^n`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |n| {
            self.initial_delay().saturating_mul(self.multiplier.saturating_pow(n))
        })
    }
}

/// How a response status is treated by [`execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Informational,
    Success,
    Retryable,
    Rejected,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            0..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            429 | 500..=599 => StatusClass::Retryable,
            _ => StatusClass::Rejected,
        }
    }
}

/// Anything that carries an HTTP status code.
pub trait StatusResponse {
    fn status_code(&self) -> u16;
}

impl StatusResponse for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// Issue `send` and retry it with backoff while the status is retryable.
///
/// Returns the first successful (2xx) response. Informational and rejected
/// statuses end the loop immediately, whatever attempt it is on.
pub async fn execute<R, F, Fut>(policy: &RetryPolicy, mut send: F) -> Result<R, FetchError>
where
    R: StatusResponse,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, FetchError>>,
{
    let mut response = send().await?;
    let mut delays = policy.delays();
    let mut attempt = 0;

    loop {
        let status = response.status_code();
        match StatusClass::of(status) {
            StatusClass::Success => return Ok(response),
            StatusClass::Informational => return Err(FetchError::Informational { status }),
            StatusClass::Rejected => return Err(FetchError::Rejected { status }),
            StatusClass::Retryable => {
                let Some(delay) = delays.next() else {
                    return Err(FetchError::Exhausted { attempts: attempt, status });
                };
                if attempt == 0 {
                    warn!(status, "transient failure, attempting exponential backoff");
                }
                attempt += 1;
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying connection");
                tokio::time::sleep(delay).await;
                response = send().await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        io,
        sync::{Arc, Mutex},
    };
    use tokio::time::Instant;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[derive(Debug)]
    struct FakeResponse(u16);

    impl StatusResponse for FakeResponse {
        fn status_code(&self) -> u16 {
            self.0
        }
    }

    async fn run(statuses: &[u16]) -> (Result<FakeResponse, FetchError>, usize) {
        let mut queue: VecDeque<u16> = statuses.iter().copied().collect();
        let mut calls = 0;
        let result = execute(&RetryPolicy::default(), || {
            calls += 1;
            let status = queue.pop_front().unwrap_or(503);
            async move { Ok(FakeResponse(status)) }
        })
        .await;
        (result, calls)
    }

    #[test]
    fn classifies_status_ranges() {
        assert_eq!(StatusClass::of(100), StatusClass::Informational);
        assert_eq!(StatusClass::of(199), StatusClass::Informational);
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(299), StatusClass::Success);
        assert_eq!(StatusClass::of(429), StatusClass::Retryable);
        assert_eq!(StatusClass::of(500), StatusClass::Retryable);
        assert_eq!(StatusClass::of(599), StatusClass::Retryable);
        assert_eq!(StatusClass::of(301), StatusClass::Rejected);
        assert_eq!(StatusClass::of(404), StatusClass::Rejected);
        assert_eq!(StatusClass::of(428), StatusClass::Rejected);
        assert_eq!(StatusClass::of(600), StatusClass::Rejected);
    }

    #[test]
    fn default_delays_double_from_250ms() {
        let delays: Vec<u64> =
            RetryPolicy::default().delays().map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 4000]);
    }

    #[test]
    fn delays_saturate_instead_of_overflowing() {
        let policy = RetryPolicy { max_retries: 40, initial_delay_ms: 1, multiplier: 10 };
        let last = policy.delays().last();
        assert_eq!(last, Some(Duration::from_millis(1).saturating_mul(u32::MAX)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_try_does_not_sleep() {
        let start = Instant::now();
        let (result, calls) = run(&[200]).await;

        assert_eq!(result.unwrap().0, 200);
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_statuses() {
        let start = Instant::now();
        let (result, calls) = run(&[503, 429, 204]).await;

        assert_eq!(result.unwrap().0, 204);
        assert_eq!(calls, 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(750), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(760), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_five_retries() {
        let start = Instant::now();
        let (result, calls) = run(&[500; 10]).await;

        let err = result.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 5, status: 500 }));
        assert!(err.is_exhausted());
        assert_eq!(calls, 6);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(7750), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(7760), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn every_retry_is_logged_at_warn() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (result, _) = run(&[503, 503, 200]).await;

        assert!(result.is_ok());
        let text = logs.contents();
        assert_eq!(text.matches("retrying connection").count(), 2, "logs: {text}");
        assert!(text.contains("attempt=1"), "logs: {text}");
        assert!(text.contains("attempt=2"), "logs: {text}");
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_status_during_backoff_stops_immediately() {
        let (result, calls) = run(&[502, 404, 200]).await;

        assert!(matches!(result.unwrap_err(), FetchError::Rejected { status: 404 }));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn informational_status_is_an_error() {
        let (result, calls) = run(&[101]).await;

        assert!(matches!(result.unwrap_err(), FetchError::Informational { status: 101 }));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_is_propagated() {
        let mut calls = 0;
        let result: Result<FakeResponse, _> = execute(&RetryPolicy::default(), || {
            calls += 1;
            let first = calls == 1;
            async move {
                if first {
                    Ok(FakeResponse(503))
                } else {
                    Err(FetchError::Malformed("connection reset".into()))
                }
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), FetchError::Malformed(_)));
        assert_eq!(calls, 2);
    }
}
