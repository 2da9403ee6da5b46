//! Bounded batch accumulator for candidate documents.
//!
//! The configured size is the dispatch target; it is also a hard ceiling
//! at publish time. Only the ingestion loop writes here, so no locking.

use crate::filter::CandidateDocument;

/// In-flight batch of accepted documents.
#[derive(Debug)]
pub struct DocumentBatch {
    items: Vec<CandidateDocument>,
    capacity: usize,
}

impl DocumentBatch {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be positive");
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, doc: CandidateDocument) {
        self.items.push(doc);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Take the accumulated documents for publishing, resetting the batch.
    ///
    /// A batch above its ceiling can only come from a bug in the
    /// accumulation loop, so that is asserted rather than handled.
    pub fn take(&mut self) -> Vec<CandidateDocument> {
        assert!(
            self.items.len() <= self.capacity,
            "batch exceeded its ceiling: {} > {}",
            self.items.len(),
            self.capacity
        );
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(n: usize) -> CandidateDocument {
        CandidateDocument {
            surt_url: format!("com,example)/{n}"),
            timestamp: "20240722120756".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn fills_at_capacity() {
        let mut batch = DocumentBatch::new(2);
        batch.push(doc(0));
        assert!(!batch.is_full());
        batch.push(doc(1));
        assert!(batch.is_full());
    }

    #[test]
    fn take_resets() {
        let mut batch = DocumentBatch::new(2);
        batch.push(doc(0));
        batch.push(doc(1));
        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert!(batch.is_empty());
        assert!(!batch.is_full());
    }

    #[test]
    #[should_panic(expected = "batch capacity must be positive")]
    fn zero_capacity_is_a_bug() {
        DocumentBatch::new(0);
    }
}
