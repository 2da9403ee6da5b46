//! Process-wide counters, injected into components at construction.
//!
//! Observability is a collaborator concern: these handles exist so an
//! exporter can scrape them, but nothing in the pipeline's behavior
//! depends on their values. Registered at startup, never reset.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::progress::fmt_num;

fn inc(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn get(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

/// Counters for range fetch attempts.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    attempts: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl FetchMetrics {
    pub fn inc_attempts(&self) {
        inc(&self.attempts);
    }
    pub fn inc_retries(&self) {
        inc(&self.retries);
    }
    pub fn inc_successes(&self) {
        inc(&self.successes);
    }
    pub fn inc_failures(&self) {
        inc(&self.failures);
    }

    pub fn attempts(&self) -> u64 {
        get(&self.attempts)
    }
    pub fn retries(&self) -> u64 {
        get(&self.retries)
    }
    pub fn successes(&self) -> u64 {
        get(&self.successes)
    }
    pub fn failures(&self) -> u64 {
        get(&self.failures)
    }
}

/// Counters for the ingestion/batching stage.
#[derive(Debug, Default)]
pub struct BatcherMetrics {
    pub documents_processed: AtomicU64,
    pub documents_non_english: AtomicU64,
    pub documents_bad_status: AtomicU64,
    pub documents_accepted: AtomicU64,
    pub documents_duplicate: AtomicU64,
    pub invalid_metadata: AtomicU64,
    pub invalid_rows: AtomicU64,
    pub batches_published: AtomicU64,
}

impl BatcherMetrics {
    pub fn log_summary(&self) {
        log::info!(
            "documents: {} processed, {} accepted, {} non-english, {} bad status, {} duplicate, {} invalid",
            fmt_num(get(&self.documents_processed) as usize),
            fmt_num(get(&self.documents_accepted) as usize),
            fmt_num(get(&self.documents_non_english) as usize),
            fmt_num(get(&self.documents_bad_status) as usize),
            fmt_num(get(&self.documents_duplicate) as usize),
            fmt_num(get(&self.invalid_metadata) as usize),
        );
        log::info!(
            "batches published: {}",
            fmt_num(get(&self.batches_published) as usize)
        );
    }
}

/// Counters for the extraction/tokenization stage.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    pub batches_received: AtomicU64,
    pub malformed_batches: AtomicU64,
    pub documents_processed: AtomicU64,
    pub records_processed: AtomicU64,
    pub successful_extractions: AtomicU64,
    pub extraction_failures: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub warc_failures: AtomicU64,
    pub tokenize_failures: AtomicU64,
    pub store_failures: AtomicU64,
    pub documents_stored: AtomicU64,
}

impl WorkerMetrics {
    pub fn log_summary(&self) {
        log::info!(
            "batches: {} received ({} malformed), documents: {} processed, {} stored",
            fmt_num(get(&self.batches_received) as usize),
            fmt_num(get(&self.malformed_batches) as usize),
            fmt_num(get(&self.documents_processed) as usize),
            fmt_num(get(&self.documents_stored) as usize),
        );
        log::info!(
            "records: {} seen, {} extracted; failures: {} fetch, {} warc, {} extract, {} tokenize, {} store",
            fmt_num(get(&self.records_processed) as usize),
            fmt_num(get(&self.successful_extractions) as usize),
            fmt_num(get(&self.fetch_failures) as usize),
            fmt_num(get(&self.warc_failures) as usize),
            fmt_num(get(&self.extraction_failures) as usize),
            fmt_num(get(&self.tokenize_failures) as usize),
            fmt_num(get(&self.store_failures) as usize),
        );
    }
}

/// Increment a public counter field.
pub fn count(counter: &AtomicU64) {
    inc(counter);
}

/// Read a public counter field.
pub fn counter_value(counter: &AtomicU64) -> u64 {
    get(counter)
}
