//! Stored-document shape: JSON with base64-encoded token arrays.
//!
//! Token ids and masks are packed as little-endian i32 before base64 so
//! downstream consumers can view them as typed arrays without parsing
//! JSON numbers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::tokenize::{ChunkingConfig, TokenChunk};

/// Pack i32 values as little-endian bytes and base64-encode them.
pub fn encode_ids(ids: &[i32]) -> String {
    let mut bytes = Vec::with_capacity(ids.len() * 4);
    for id in ids {
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Inverse of [`encode_ids`].
pub fn decode_ids(encoded: &str) -> Result<Vec<i32>, base64::DecodeError> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// One serialized chunk.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredChunk {
    pub input_ids: String,
    pub attention_mask: String,
    pub chunk_index: usize,
}

/// Provenance and tokenization parameters for a stored document.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredMetadata {
    pub timestamp: Option<String>,
    pub url: Option<String>,
    pub stride: usize,
    pub max_length: usize,
    pub original_length: usize,
}

/// Final artifact: written once per extracted text span, immutable.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredDocument {
    pub chunks: Vec<StoredChunk>,
    pub total_chunks: usize,
    pub metadata: StoredMetadata,
}

impl StoredDocument {
    /// Build the artifact from tokenized chunks and item provenance.
    pub fn from_chunks(
        chunks: &[TokenChunk],
        config: &ChunkingConfig,
        url: Option<String>,
        timestamp: Option<String>,
    ) -> Self {
        let original_length = chunks.first().map_or(0, |c| c.original_length);
        Self {
            chunks: chunks
                .iter()
                .map(|c| StoredChunk {
                    input_ids: encode_ids(&c.input_ids),
                    attention_mask: encode_ids(&c.attention_mask),
                    chunk_index: c.chunk_index,
                })
                .collect(),
            total_chunks: chunks.len(),
            metadata: StoredMetadata {
                timestamp,
                url,
                stride: config.stride(),
                max_length: config.max_length(),
                original_length,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        let ids = vec![1, -1, 0, i32::MAX, i32::MIN, 30_521];
        assert_eq!(decode_ids(&encode_ids(&ids)).unwrap(), ids);
    }

    #[test]
    fn encoding_is_little_endian() {
        // 0x01020304 -> bytes 04 03 02 01
        let encoded = encode_ids(&[0x0102_0304]);
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn document_shape() {
        let config = ChunkingConfig::new(8, 4).unwrap();
        let chunk = TokenChunk {
            input_ids: vec![1, 10, 11, 2, 0, 0, 0, 0],
            attention_mask: vec![1, 1, 1, 1, 0, 0, 0, 0],
            chunk_index: 0,
            original_length: 2,
        };
        let doc = StoredDocument::from_chunks(
            &[chunk],
            &config,
            Some("http://example.com/".to_string()),
            Some("20240722120756".to_string()),
        );
        assert_eq!(doc.total_chunks, 1);
        assert_eq!(doc.metadata.max_length, 8);
        assert_eq!(doc.metadata.stride, 4);
        assert_eq!(doc.metadata.original_length, 2);

        let json = doc.to_json().unwrap();
        let parsed: StoredDocument = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.chunks.len(), 1);
        assert_eq!(
            decode_ids(&parsed.chunks[0].input_ids).unwrap(),
            vec![1, 10, 11, 2, 0, 0, 0, 0]
        );
        assert_eq!(parsed.metadata.url.as_deref(), Some("http://example.com/"));
    }
}
