//! Subword encoder contract and the default word-hash encoder.
//!
//! The real subword tokenizer is a collaborator: text in, token ids out,
//! plus three fixed special ids. The default implementation is a
//! deterministic stand-in that hashes unicode words into a fixed vocab
//! range, which is enough for chunking and for end-to-end runs without a
//! model download.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use unicode_segmentation::UnicodeSegmentation;

/// Ids below this are reserved for special tokens
const RESERVED_IDS: u32 = 4;

/// Default vocab size (BERT-base)
const DEFAULT_VOCAB_SIZE: u32 = 30_522;

/// Encoding capability: flat token-id sequence with no special tokens,
/// plus the fixed pad/cls/sep ids.
pub trait TextEncoder {
    fn encode(&self, text: &str) -> Vec<i32>;
    fn pad_id(&self) -> i32;
    fn cls_id(&self) -> i32;
    fn sep_id(&self) -> i32;
}

/// Deterministic encoder: one id per lowercased unicode word, hashed
/// into `[RESERVED_IDS, vocab_size)`. Never emits a reserved id, so the
/// value-equality attention mask stays correct for this encoder.
#[derive(Debug, Clone)]
pub struct WordHashEncoder {
    vocab_size: u32,
}

impl WordHashEncoder {
    pub fn new(vocab_size: u32) -> Self {
        assert!(vocab_size > RESERVED_IDS, "vocab must exceed reserved ids");
        Self { vocab_size }
    }
}

impl Default for WordHashEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_VOCAB_SIZE)
    }
}

impl TextEncoder for WordHashEncoder {
    fn encode(&self, text: &str) -> Vec<i32> {
        text.unicode_words()
            .map(|word| {
                let mut hasher = FxHasher::default();
                word.to_lowercase().hash(&mut hasher);
                let bucket = hasher.finish() % u64::from(self.vocab_size - RESERVED_IDS);
                (RESERVED_IDS as u64 + bucket) as i32
            })
            .collect()
    }

    fn pad_id(&self) -> i32 {
        0
    }

    fn cls_id(&self) -> i32 {
        1
    }

    fn sep_id(&self) -> i32 {
        2
    }
}
