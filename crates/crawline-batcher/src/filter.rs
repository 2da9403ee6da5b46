//! Per-line filtering of fetched index shard content.
//!
//! Each decompressed shard line has the form
//! `<surt url> <timestamp> <json metadata>`. Only captures with an
//! English language tag and HTTP status 200 become candidates; everything
//! else is a metrics-only skip.

use serde::{Deserialize, Serialize};

/// Free-form capture metadata. `status` and `languages` are inspected;
/// every other field passes through opaquely to the worker stage.
pub type DocumentMetadata = serde_json::Map<String, serde_json::Value>;

/// A capture that passed the filter. `(surt_url, timestamp)` is the
/// dedup identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub surt_url: String,
    pub timestamp: String,
    pub metadata: DocumentMetadata,
}

/// Outcome of classifying one shard line.
#[derive(Debug)]
pub enum LineVerdict {
    Accepted(Box<CandidateDocument>),
    /// No `languages` field, or no English tag in it
    NonEnglish,
    /// `status` is not the string "200"
    BadStatus,
    /// Metadata tail failed to parse as JSON
    InvalidMetadata,
}

/// Classify one non-blank shard line.
///
/// The line splits on single spaces; the metadata tail is the remaining
/// fields concatenated **without** re-inserting separators. That matches
/// the upstream index format, where the JSON tail never contains spaces.
pub fn classify_line(line: &str) -> LineVerdict {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() < 3 {
        return LineVerdict::InvalidMetadata;
    }

    let tail: String = fields[2..].concat();
    let metadata: DocumentMetadata = match serde_json::from_str(&tail) {
        Ok(m) => m,
        Err(_) => return LineVerdict::InvalidMetadata,
    };

    let has_english = metadata
        .get("languages")
        .and_then(|v| v.as_str())
        .is_some_and(|langs| langs.contains("eng"));
    if !has_english {
        return LineVerdict::NonEnglish;
    }

    if metadata.get("status").and_then(|v| v.as_str()) != Some("200") {
        return LineVerdict::BadStatus;
    }

    LineVerdict::Accepted(Box::new(CandidateDocument {
        surt_url: fields[0].to_string(),
        timestamp: fields[1].to_string(),
        metadata,
    }))
}
