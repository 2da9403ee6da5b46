//! crawline-worker: extraction/tokenization stage
//!
//! Consumes one batch at a time from the queue, fetches each item's
//! archive byte range, walks the WARC records inside, extracts article
//! text, and stores fixed-length tokenized chunks. One bad item never
//! takes down its batch; one bad batch never stalls the queue.

pub mod document;
pub mod encoder;
pub mod extract;
pub mod runner;
pub mod tokenize;
pub mod warc;

pub use document::{StoredChunk, StoredDocument, StoredMetadata, decode_ids, encode_ids};
pub use encoder::{TextEncoder, WordHashEncoder};
pub use extract::{HtmlTextExtractor, TextExtractor};
pub use runner::{WorkerConfig, process_message, run_worker};
pub use tokenize::{ChunkingConfig, ChunkingTokenizer, TokenChunk, TokenizeError};
pub use warc::{RecordIter, WarcError, WarcRecord, http_payload};
