//! Ingestion stage orchestration.
//!
//! Drives index rows through fetch, filter, dedup, and bounded batch
//! publishing. Per-row and per-line failures are recovered locally;
//! publish and marker failures propagate to the caller.

use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crawline_core::fetch::RangeFetch;
use crawline_core::metrics::{BatcherMetrics, count};
use crawline_core::progress::fmt_num;
use crawline_queue::BatchPublisher;
use crawline_store::object_store::{ObjectStore, StoreError};
use crawline_store::MarkerStore;

use crate::batch::DocumentBatch;
use crate::config::BatcherConfig;
use crate::filter::{CandidateDocument, LineVerdict, classify_line};
use crate::index::{IndexError, IndexRow};

/// Dedup capability consumed by the ingestion loop.
pub trait DedupTracker {
    fn is_processed(&self, url: &str, timestamp: &str) -> Result<bool, StoreError>;
    fn mark_processed(&self, url: &str, timestamp: &str) -> Result<(), StoreError>;
}

impl<S: ObjectStore> DedupTracker for MarkerStore<S> {
    fn is_processed(&self, url: &str, timestamp: &str) -> Result<bool, StoreError> {
        MarkerStore::is_processed(self, url, timestamp)
    }

    fn mark_processed(&self, url: &str, timestamp: &str) -> Result<(), StoreError> {
        MarkerStore::mark_processed(self, url, timestamp)
    }
}

/// Ingestion run summary
#[derive(Debug)]
pub struct BatchSummary {
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub lines_scanned: usize,
    pub documents_accepted: usize,
    pub batches_published: usize,
    pub elapsed: std::time::Duration,
}

impl BatchSummary {
    pub fn log(&self) {
        log::info!("=== Batcher Summary ===");
        log::info!(
            "index rows: {}/{} fetched, {} lines scanned",
            fmt_num(self.rows_processed - self.rows_failed),
            fmt_num(self.rows_processed),
            fmt_num(self.lines_scanned)
        );
        log::info!(
            "documents accepted: {}, batches published: {}",
            fmt_num(self.documents_accepted),
            fmt_num(self.batches_published)
        );
        log::info!("time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Publish a full or final batch, then mark every published identity.
///
/// Marking happens strictly after a successful publish. A crash between
/// the two leaves the batch unmarked and eligible for reprocessing on a
/// later run, keeping delivery at-least-once.
fn publish_batch(
    publisher: &impl BatchPublisher,
    tracker: &impl DedupTracker,
    metrics: &BatcherMetrics,
    batch: Vec<CandidateDocument>,
) -> Result<()> {
    let size = batch.len();
    let body = serde_json::to_vec(&batch).context("failed to encode batch")?;
    publisher
        .publish(&body)
        .with_context(|| format!("failed to publish batch of {size}"))?;
    log::debug!("published batch of {size}");

    for item in &batch {
        tracker
            .mark_processed(&item.surt_url, &item.timestamp)
            .with_context(|| format!("failed to mark {} as processed", item.surt_url))?;
    }
    count(&metrics.batches_published);
    Ok(())
}

/// Traverse index rows, filter shard lines, publish bounded batches.
///
/// A fetch failure aborts only that row's lines; traversal continues. A
/// malformed index row is counted and skipped. Publish failures are fatal
/// to the run and mark nothing.
pub fn process_index<I, F, P, D>(
    rows: I,
    fetcher: &F,
    publisher: &P,
    tracker: &D,
    config: &BatcherConfig,
    metrics: &BatcherMetrics,
    pb: &ProgressBar,
) -> Result<BatchSummary>
where
    I: IntoIterator<Item = Result<IndexRow, IndexError>>,
    F: RangeFetch,
    P: BatchPublisher,
    D: DedupTracker,
{
    let start = Instant::now();
    let mut batch = DocumentBatch::new(config.batch_size);
    let mut summary_rows = 0usize;
    let mut summary_failed = 0usize;
    let mut summary_lines = 0usize;
    let mut summary_accepted = 0usize;
    let mut summary_batches = 0usize;

    for row in rows {
        if let Some(limit) = config.max_rows {
            if summary_rows >= limit {
                break;
            }
        }

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                count(&metrics.invalid_rows);
                log::warn!("skipping malformed index row: {e}");
                continue;
            }
        };
        summary_rows += 1;
        pb.set_message(format!(
            "row {} ({}), {} accepted",
            fmt_num(summary_rows),
            row.capture_file,
            fmt_num(summary_accepted)
        ));

        let payload = match fetcher.fetch(&row.capture_file, row.range_start, row.range_length) {
            Ok(bytes) => bytes,
            Err(e) => {
                summary_failed += 1;
                log::warn!(
                    "fetch failed for {} [{}, +{}]: {e}",
                    row.capture_file,
                    row.range_start,
                    row.range_length
                );
                continue;
            }
        };
        let payload = match String::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => {
                summary_failed += 1;
                log::warn!("shard {} is not valid UTF-8: {e}", row.capture_file);
                continue;
            }
        };

        for line in payload.split('\n') {
            if line.is_empty() {
                continue;
            }
            summary_lines += 1;
            count(&metrics.documents_processed);

            let doc = match classify_line(line) {
                LineVerdict::Accepted(doc) => *doc,
                LineVerdict::NonEnglish => {
                    count(&metrics.documents_non_english);
                    continue;
                }
                LineVerdict::BadStatus => {
                    count(&metrics.documents_bad_status);
                    continue;
                }
                LineVerdict::InvalidMetadata => {
                    count(&metrics.invalid_metadata);
                    continue;
                }
            };

            // Fail closed: a dedup check error is treated as already
            // processed and the line is skipped.
            match tracker.is_processed(&doc.surt_url, &doc.timestamp) {
                Ok(false) => {}
                Ok(true) => {
                    count(&metrics.documents_duplicate);
                    continue;
                }
                Err(e) => {
                    count(&metrics.documents_duplicate);
                    log::warn!("dedup check failed for {}, skipping: {e}", doc.surt_url);
                    continue;
                }
            }

            count(&metrics.documents_accepted);
            summary_accepted += 1;
            batch.push(doc);

            if batch.is_full() {
                publish_batch(publisher, tracker, metrics, batch.take())?;
                summary_batches += 1;
            }
        }
    }

    if !batch.is_empty() {
        publish_batch(publisher, tracker, metrics, batch.take())?;
        summary_batches += 1;
    }

    let summary = BatchSummary {
        rows_processed: summary_rows,
        rows_failed: summary_failed,
        lines_scanned: summary_lines,
        documents_accepted: summary_accepted,
        batches_published: summary_batches,
        elapsed: start.elapsed(),
    };
    pb.finish_and_clear();
    summary.log();
    metrics.log_summary();
    Ok(summary)
}
