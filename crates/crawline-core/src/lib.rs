//! Crawline Core - Common infrastructure for the crawl ingestion pipeline
//!
//! This crate provides the pieces shared by both pipeline stages:
//! range fetching with retry, the fetch error taxonomy, logging,
//! progress reporting, shutdown handling, and metrics handles.

pub mod error;
pub mod fetch;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use error::FetchError;
pub use fetch::{HttpConfig, HttpRangeFetcher, RangeFetch, http_config, set_http_config};
pub use logging::{IndicatifLogger, init_logging};
pub use metrics::{BatcherMetrics, FetchMetrics, WorkerMetrics};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{backoff_duration, retry_with_backoff};
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
