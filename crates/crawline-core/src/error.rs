//! Fetch error taxonomy
//!
//! Three classes with different handling downstream:
//! transport failures are retried with backoff, HTTP status failures
//! surface immediately, and gzip failures mark the payload itself as
//! corrupt (localized to one row, never retried).

/// Error from a range fetch (download + decompress).
#[derive(Debug)]
pub enum FetchError {
    /// Connection-level failure (refused, reset, stalled read). Retryable.
    Transport { message: String },
    /// Server answered with an error status. Not retryable at this layer.
    Http { status: u16, message: String },
    /// Payload failed to decompress (bad magic, truncated stream).
    Gzip(std::io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "transport error: {message}"),
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Gzip(e) => write!(f, "gzip: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a reqwest error: a response status means the server spoke,
    /// everything else is transport-level.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Transport {
                message: e.to_string(),
            },
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
