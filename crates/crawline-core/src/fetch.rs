//! HTTP range fetch with gzip decompression.
//!
//! Uses async reqwest internally on a shared runtime, but presents a
//! sync interface: both pipeline stages are sequential loops and block
//! on every fetch anyway.

use std::io::Read;
use std::sync::{Arc, LazyLock, RwLock};
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::error::FetchError;
use crate::metrics::FetchMetrics;
use crate::retry::retry_with_backoff;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read timeout (whole-response deadline per attempt)
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget for transport failures
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Process-wide HTTP settings, set once at startup.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub read_timeout: Duration,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

static HTTP_CONFIG: LazyLock<RwLock<HttpConfig>> =
    LazyLock::new(|| RwLock::new(HttpConfig::default()));

/// Override HTTP settings (call once, before any fetch).
pub fn set_http_config(config: HttpConfig) {
    *HTTP_CONFIG.write().expect("http config lock poisoned") = config;
}

/// Current HTTP settings.
pub fn http_config() -> HttpConfig {
    *HTTP_CONFIG.read().expect("http config lock poisoned")
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Fetch a byte range of a remote object, returning the decompressed payload.
pub trait RangeFetch {
    fn fetch(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher: HTTP range request against a fixed base URL,
/// gunzip, retry with backoff on transport failures only.
pub struct HttpRangeFetcher {
    base_url: String,
    metrics: Arc<FetchMetrics>,
}

impl HttpRangeFetcher {
    pub fn new(base_url: impl Into<String>, metrics: Arc<FetchMetrics>) -> Self {
        Self {
            base_url: base_url.into(),
            metrics,
        }
    }

    /// One download attempt: range request, status check, body bytes.
    fn download_once(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let range = format!("bytes={}-{}", start, start + length - 1);
        let read_timeout = http_config().read_timeout;

        SHARED_RUNTIME.handle().block_on(async {
            let response = SHARED_CLIENT
                .get(&url)
                .header(reqwest::header::RANGE, range)
                .timeout(read_timeout)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| FetchError::from_reqwest(&e))?;

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;
            Ok(body.to_vec())
        })
    }
}

impl RangeFetch for HttpRangeFetcher {
    fn fetch(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, FetchError> {
        let max_retries = http_config().max_retries;
        let metrics = &self.metrics;

        let compressed = retry_with_backoff(
            path,
            max_retries,
            |e: &FetchError| {
                if e.is_retryable() {
                    metrics.inc_retries();
                    true
                } else {
                    false
                }
            },
            || {
                metrics.inc_attempts();
                self.download_once(path, start, length)
            },
        )
        .inspect_err(|_| metrics.inc_failures())?;

        let decompressed = gunzip(&compressed).inspect_err(|_| metrics.inc_failures())?;
        metrics.inc_successes();
        Ok(decompressed)
    }
}

/// Decompress a gzip payload. Corrupt input is a decode failure,
/// distinct from any network error.
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::with_capacity(compressed.len() * 4);
    decoder.read_to_end(&mut out).map_err(FetchError::Gzip)?;
    Ok(out)
}

/// Gzip-compress bytes (test fixtures).
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}
