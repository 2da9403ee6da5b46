//! crawline-batcher: ingestion/batching stage
//!
//! Walks a CDX cluster index, range-fetches each referenced index shard,
//! filters the shard's lines down to English 200-status captures, drops
//! identities that already carry a processed marker, and publishes the
//! survivors to the queue in bounded batches.

pub mod batch;
pub mod config;
pub mod filter;
pub mod index;
pub mod runner;

pub use batch::DocumentBatch;
pub use config::BatcherConfig;
pub use filter::{CandidateDocument, DocumentMetadata, LineVerdict, classify_line};
pub use index::{ClusterIndexReader, IndexError, IndexRow};
pub use runner::{BatchSummary, DedupTracker, process_index};
