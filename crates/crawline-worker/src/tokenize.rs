//! Sliding-window chunking with padding and attention masks.
//!
//! Windows advance by `max_length - stride` tokens, so adjacent chunks
//! share `stride` tokens of context and a boundary token is seen by two
//! consecutive chunks. Every produced chunk is exactly `max_length` ids
//! and mask entries; that is the hard contract of this stage.

use crate::encoder::TextEncoder;

/// One fixed-length tokenized chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenChunk {
    pub input_ids: Vec<i32>,
    pub attention_mask: Vec<i32>,
    pub chunk_index: usize,
    pub original_length: usize,
}

/// Tokenization failure kinds.
#[derive(Debug)]
pub enum TokenizeError {
    /// Input was empty or whitespace-only (checked before encoding)
    EmptyInput,
    /// The encoder produced no tokens, so no chunks could be built
    NoChunks,
    /// A produced chunk violated the fixed-length contract; this is an
    /// internal-consistency bug, not an input error
    ChunkLength { expected: usize, got: usize },
    /// Window parameters are unusable
    InvalidConfig(&'static str),
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty or whitespace-only text"),
            Self::NoChunks => write!(f, "no chunks produced"),
            Self::ChunkLength { expected, got } => {
                write!(f, "chunk length {got}, expected exactly {expected}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid chunking config: {msg}"),
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Validated window parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    max_length: usize,
    stride: usize,
}

impl ChunkingConfig {
    pub fn new(max_length: usize, stride: usize) -> Result<Self, TokenizeError> {
        if max_length <= 2 {
            return Err(TokenizeError::InvalidConfig(
                "max_length must leave room for cls/sep",
            ));
        }
        if stride == 0 || stride >= max_length {
            return Err(TokenizeError::InvalidConfig(
                "stride must satisfy 0 < stride < max_length",
            ));
        }
        Ok(Self { max_length, stride })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            stride: 256,
        }
    }
}

/// Chunking tokenizer over any encoder. Pure and stateless per call.
pub struct ChunkingTokenizer<E> {
    encoder: E,
    config: ChunkingConfig,
}

impl<E: TextEncoder> ChunkingTokenizer<E> {
    pub fn new(encoder: E, config: ChunkingConfig) -> Self {
        Self { encoder, config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Pad (or truncate) a wrapped token sequence to exactly
    /// `max_length`, deriving the attention mask.
    ///
    /// The mask compares token-id value against the pad id, so a real
    /// token whose id equals `pad` would be masked out. Known quirk,
    /// kept as-is.
    fn pad_sequence(&self, mut tokens: Vec<i32>) -> Result<(Vec<i32>, Vec<i32>), TokenizeError> {
        let max_length = self.config.max_length;
        let pad = self.encoder.pad_id();

        if tokens.len() < max_length {
            tokens.resize(max_length, pad);
        } else {
            tokens.truncate(max_length);
        }

        let mask: Vec<i32> = tokens.iter().map(|&t| i32::from(t != pad)).collect();

        if tokens.len() != max_length {
            return Err(TokenizeError::ChunkLength {
                expected: max_length,
                got: tokens.len(),
            });
        }
        if mask.len() != max_length {
            return Err(TokenizeError::ChunkLength {
                expected: max_length,
                got: mask.len(),
            });
        }
        Ok((tokens, mask))
    }

    /// Encode text and slice it into overlapping fixed-length chunks.
    pub fn tokenize(&self, text: &str) -> Result<Vec<TokenChunk>, TokenizeError> {
        if text.trim().is_empty() {
            return Err(TokenizeError::EmptyInput);
        }

        let tokens = self.encoder.encode(text);
        let original_length = tokens.len();
        let max_length = self.config.max_length;
        let step = max_length - self.config.stride;

        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < tokens.len() {
            let window_end = (offset + max_length - 2).min(tokens.len());
            let mut wrapped = Vec::with_capacity(max_length);
            wrapped.push(self.encoder.cls_id());
            wrapped.extend_from_slice(&tokens[offset..window_end]);
            wrapped.push(self.encoder.sep_id());

            let (input_ids, attention_mask) = self.pad_sequence(wrapped)?;
            chunks.push(TokenChunk {
                input_ids,
                attention_mask,
                chunk_index: chunks.len(),
                original_length,
            });
            offset += step;
        }

        if chunks.is_empty() {
            return Err(TokenizeError::NoChunks);
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::WordHashEncoder;

    /// Encoder that emits one id per input word, ids chosen by the test
    struct SeqEncoder;

    impl TextEncoder for SeqEncoder {
        fn encode(&self, text: &str) -> Vec<i32> {
            // one token per whitespace word: 10, 11, 12, ...
            (0..text.split_whitespace().count())
                .map(|i| 10 + i as i32)
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

    /// Encoder that strips everything (models a tokenizer with no vocab
    /// coverage for the input)
    struct NullEncoder;

    impl TextEncoder for NullEncoder {
        fn encode(&self, _text: &str) -> Vec<i32> {
            Vec::new()
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

    fn words(n: usize) -> String {
        vec!["w"; n].join(" ")
    }

    #[test]
    fn empty_input_rejected() {
        let tok = ChunkingTokenizer::new(SeqEncoder, ChunkingConfig::default());
        assert!(matches!(tok.tokenize("").unwrap_err(), TokenizeError::EmptyInput));
        assert!(matches!(
            tok.tokenize("   ").unwrap_err(),
            TokenizeError::EmptyInput
        ));
    }

    #[test]
    fn stripped_input_is_no_chunks() {
        let tok = ChunkingTokenizer::new(NullEncoder, ChunkingConfig::default());
        assert!(matches!(
            tok.tokenize("something").unwrap_err(),
            TokenizeError::NoChunks
        ));
    }

    #[test]
    fn short_text_single_padded_chunk() {
        let cfg = ChunkingConfig::new(16, 8).unwrap();
        let tok = ChunkingTokenizer::new(SeqEncoder, cfg);
        let chunks = tok.tokenize(&words(5)).unwrap();
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.input_ids.len(), 16);
        assert_eq!(chunk.attention_mask.len(), 16);
        // cls + 5 tokens + sep, then padding
        assert_eq!(chunk.input_ids[0], 1);
        assert_eq!(&chunk.input_ids[1..6], &[10, 11, 12, 13, 14]);
        assert_eq!(chunk.input_ids[6], 2);
        assert!(chunk.input_ids[7..].iter().all(|&t| t == 0));
        assert_eq!(&chunk.attention_mask[..7], &[1; 7]);
        assert!(chunk.attention_mask[7..].iter().all(|&m| m == 0));
        assert_eq!(chunk.original_length, 5);
    }

    #[test]
    fn windows_overlap_by_stride() {
        // max 16, stride 8 -> step 8, window payload 14
        let cfg = ChunkingConfig::new(16, 8).unwrap();
        let tok = ChunkingTokenizer::new(SeqEncoder, cfg);
        let chunks = tok.tokenize(&words(20)).unwrap();
        assert_eq!(chunks.len(), 3);
        // second window starts at token offset 8 (id 18)
        assert_eq!(chunks[1].input_ids[1], 18);
        // boundary token 18..23 appear in both chunk 0 (payload 10..=23)
        // and chunk 1
        assert!(chunks[0].input_ids.contains(&18));
        assert!(chunks[1].input_ids.contains(&18));
    }

    #[test]
    fn all_chunks_exactly_max_length() {
        for (max_length, stride) in [(8, 4), (16, 8), (16, 15), (512, 256), (12, 1)] {
            let cfg = ChunkingConfig::new(max_length, stride).unwrap();
            let tok = ChunkingTokenizer::new(SeqEncoder, cfg);
            for n in [1usize, 5, 30, 100, 700] {
                let chunks = tok.tokenize(&words(n)).unwrap();
                assert!(!chunks.is_empty());
                for chunk in &chunks {
                    assert_eq!(chunk.input_ids.len(), max_length, "max={max_length} n={n}");
                    assert_eq!(chunk.attention_mask.len(), max_length);
                    assert!(chunk.attention_mask.iter().all(|&m| m == 0 || m == 1));
                }
            }
        }
    }

    #[test]
    fn chunk_indices_sequential() {
        let cfg = ChunkingConfig::new(8, 4).unwrap();
        let tok = ChunkingTokenizer::new(SeqEncoder, cfg);
        let chunks = tok.tokenize(&words(30)).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.original_length, 30);
        }
    }

    #[test]
    fn real_encoder_round() {
        let tok = ChunkingTokenizer::new(WordHashEncoder::default(), ChunkingConfig::default());
        let chunks = tok.tokenize("The quick brown fox jumps over the lazy dog.").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].input_ids.len(), 512);
        assert_eq!(chunks[0].original_length, 9);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            ChunkingConfig::new(2, 1).unwrap_err(),
            TokenizeError::InvalidConfig(_)
        ));
        assert!(matches!(
            ChunkingConfig::new(16, 0).unwrap_err(),
            TokenizeError::InvalidConfig(_)
        ));
        assert!(matches!(
            ChunkingConfig::new(16, 16).unwrap_err(),
            TokenizeError::InvalidConfig(_)
        ));
        assert!(matches!(
            ChunkingConfig::new(16, 20).unwrap_err(),
            TokenizeError::InvalidConfig(_)
        ));
    }
}
