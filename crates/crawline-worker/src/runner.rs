//! Extraction stage orchestration.
//!
//! Pulls one batch at a time off the queue, processes every item, and
//! acknowledges the batch exactly once. Item failures are recovered
//! locally; only queue failures propagate to the caller.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use crawline_batcher::CandidateDocument;
use crawline_core::fetch::RangeFetch;
use crawline_core::metrics::{WorkerMetrics, count};
use crawline_core::shutdown::is_shutdown_requested;
use crawline_queue::BatchConsumer;
use crawline_store::object_store::ObjectStore;
use crawline_store::DocumentStore;

use crate::document::StoredDocument;
use crate::encoder::TextEncoder;
use crate::extract::TextExtractor;
use crate::tokenize::ChunkingTokenizer;
use crate::warc::{RecordIter, http_payload};

/// Worker loop settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is empty
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Archive location of one item's capture, read from its metadata.
struct Provenance {
    filename: String,
    offset: u64,
    length: u64,
}

impl Provenance {
    /// `offset` and `length` arrive as JSON strings, matching the index
    /// shard format they were copied from.
    ///
    /// Queue metadata is untrusted: an empty or overflowing range can
    /// never name real archive bytes, so both are rejected here rather
    /// than handed to the fetcher.
    fn from_item(item: &CandidateDocument) -> Option<Self> {
        let field = |name: &str| item.metadata.get(name).and_then(|v| v.as_str());
        let filename = field("filename")?.to_string();
        let offset: u64 = field("offset")?.parse().ok()?;
        let length: u64 = field("length")?.parse().ok()?;
        if length == 0 || offset.checked_add(length).is_none() {
            return None;
        }
        Some(Self {
            filename,
            offset,
            length,
        })
    }
}

/// Run one item through fetch, record iteration, extraction,
/// tokenization, and storage. Every failure is counted where it
/// happened and the next record continues; returns the number of
/// documents stored.
fn process_item<F, X, E, S>(
    item: &CandidateDocument,
    fetcher: &F,
    extractor: &X,
    tokenizer: &ChunkingTokenizer<E>,
    documents: &DocumentStore<S>,
    metrics: &WorkerMetrics,
) -> usize
where
    F: RangeFetch,
    X: TextExtractor,
    E: TextEncoder,
    S: ObjectStore,
{
    // An item without a readable archive location cannot be fetched
    let Some(provenance) = Provenance::from_item(item) else {
        log::warn!("item {} has no usable archive location", item.surt_url);
        count(&metrics.fetch_failures);
        return 0;
    };

    let data = match fetcher.fetch(&provenance.filename, provenance.offset, provenance.length) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("fetch failed for {}: {e}", item.surt_url);
            count(&metrics.fetch_failures);
            return 0;
        }
    };

    let url = item
        .metadata
        .get("url")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let mut stored = 0usize;
    for record in RecordIter::new(&data) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("bad record in range for {}: {e}", item.surt_url);
                count(&metrics.warc_failures);
                break;
            }
        };
        count(&metrics.records_processed);
        if !record.is_response() {
            continue;
        }

        let Some(text) = extractor.extract(http_payload(record.body)) else {
            count(&metrics.extraction_failures);
            continue;
        };
        count(&metrics.successful_extractions);

        let chunks = match tokenizer.tokenize(&text) {
            Ok(chunks) => chunks,
            Err(e) => {
                log::warn!("tokenization failed for {}: {e}", item.surt_url);
                count(&metrics.tokenize_failures);
                continue;
            }
        };

        let doc = StoredDocument::from_chunks(
            &chunks,
            tokenizer.config(),
            url.clone(),
            Some(item.timestamp.clone()),
        );
        let body = match doc.to_json() {
            Ok(body) => body,
            Err(e) => {
                log::error!("failed to encode document for {}: {e}", item.surt_url);
                count(&metrics.store_failures);
                continue;
            }
        };
        match documents.store(&body) {
            Ok(key) => {
                log::debug!("stored {} chunk(s) for {} at {key}", chunks.len(), item.surt_url);
                count(&metrics.documents_stored);
                stored += 1;
            }
            Err(e) => {
                log::error!("failed to store document for {}: {e}", item.surt_url);
                count(&metrics.store_failures);
            }
        }
    }
    stored
}

/// Process one queue message: a JSON array of candidate documents.
///
/// A body that fails to parse is counted and dropped; the caller still
/// acknowledges it, since redelivery would fail identically. One item's
/// failure never skips the remaining items. Returns the number of
/// documents stored.
pub fn process_message<F, X, E, S>(
    body: &[u8],
    fetcher: &F,
    extractor: &X,
    tokenizer: &ChunkingTokenizer<E>,
    documents: &DocumentStore<S>,
    metrics: &WorkerMetrics,
) -> usize
where
    F: RangeFetch,
    X: TextExtractor,
    E: TextEncoder,
    S: ObjectStore,
{
    count(&metrics.batches_received);
    let items: Vec<CandidateDocument> = match serde_json::from_slice(body) {
        Ok(items) => items,
        Err(e) => {
            count(&metrics.malformed_batches);
            log::error!("dropping malformed batch: {e}");
            return 0;
        }
    };
    log::debug!("processing batch of {}", items.len());

    let mut stored_total = 0usize;
    for item in &items {
        count(&metrics.documents_processed);
        stored_total += process_item(item, fetcher, extractor, tokenizer, documents, metrics);
    }
    stored_total
}

/// Blocking consume loop: receive, process, acknowledge, repeat until
/// shutdown is requested. Acknowledgment happens exactly once per
/// delivery, after processing, whatever the per-item outcomes were.
pub fn run_worker<C, F, X, E, S>(
    consumer: &mut C,
    fetcher: &F,
    extractor: &X,
    tokenizer: &ChunkingTokenizer<E>,
    documents: &DocumentStore<S>,
    config: &WorkerConfig,
    metrics: &WorkerMetrics,
) -> Result<()>
where
    C: BatchConsumer,
    F: RangeFetch,
    X: TextExtractor,
    E: TextEncoder,
    S: ObjectStore,
{
    while !is_shutdown_requested() {
        let delivery = match consumer.receive().context("queue receive failed")? {
            Some(delivery) => delivery,
            None => {
                thread::sleep(config.poll_interval);
                continue;
            }
        };
        process_message(
            &delivery.body,
            fetcher,
            extractor,
            tokenizer,
            documents,
            metrics,
        );
        consumer
            .ack(&delivery.tag)
            .with_context(|| format!("failed to ack delivery {}", delivery.tag))?;
    }
    log::info!("shutdown requested, worker loop exiting");
    Ok(())
}
