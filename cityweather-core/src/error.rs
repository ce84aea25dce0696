use thiserror::Error;

/// Failure of a single fetch (weather or nearby cities), after retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Status below 200; never retried.
    #[error("HttpResponseCode: {status}")]
    Informational { status: u16 },

    /// Non-retryable, non-success status (e.g. 401, 404).
    #[error("request rejected with status {status}")]
    Rejected { status: u16 },

    /// Status stayed retryable through every backoff attempt.
    #[error("backoff unsuccessful after {attempts} attempts (last status {status})")]
    Exhausted { attempts: u32, status: u16 },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FetchError::Exhausted { .. })
    }
}
