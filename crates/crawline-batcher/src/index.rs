//! CDX cluster index reading.
//!
//! The cluster index is tab-separated, one row per compressed index
//! shard: `<url key + timestamp>\t<file>\t<offset>\t<length>\t<ordinal>`.
//! The reader is forward-only and single-pass; the underlying file handle
//! is released when the reader goes out of scope, on every exit path.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Minimum fields per cluster index row
const MIN_FIELDS: usize = 5;

/// One row of the cluster index, pointing at a byte range within a
/// compressed index shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub url_key: String,
    pub capture_file: String,
    pub range_start: u64,
    pub range_length: u64,
    pub ordinal: String,
}

/// Validation failure for a single index row. Raised on the failing
/// `next()` call; the reader never skips bad rows silently.
#[derive(Debug)]
pub enum IndexError {
    Io(io::Error),
    FieldCount { got: usize },
    InvalidNumber { field: &'static str, value: String },
    EmptyRange,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "index read: {e}"),
            Self::FieldCount { got } => {
                write!(f, "expected at least {MIN_FIELDS} fields, got {got}")
            }
            Self::InvalidNumber { field, value } => {
                write!(f, "field {field} is not a non-negative integer: {value:?}")
            }
            Self::EmptyRange => write!(f, "range length must be positive"),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<io::Error> for IndexError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Parse one tab-separated cluster index line.
pub fn parse_index_row(line: &str) -> Result<IndexRow, IndexError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Err(IndexError::FieldCount { got: fields.len() });
    }

    let range_start = fields[2].parse::<u64>().map_err(|_| IndexError::InvalidNumber {
        field: "offset",
        value: fields[2].to_string(),
    })?;
    let range_length = fields[3].parse::<u64>().map_err(|_| IndexError::InvalidNumber {
        field: "length",
        value: fields[3].to_string(),
    })?;
    if range_length == 0 {
        return Err(IndexError::EmptyRange);
    }

    Ok(IndexRow {
        url_key: fields[0].to_string(),
        capture_file: fields[1].to_string(),
        range_start,
        range_length,
        ordinal: fields[4].to_string(),
    })
}

/// Forward-only reader over cluster index rows.
pub struct ClusterIndexReader<R> {
    reader: R,
    line: String,
}

impl ClusterIndexReader<BufReader<File>> {
    /// Open a cluster index file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ClusterIndexReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for ClusterIndexReader<R> {
    type Item = Result<IndexRow, IndexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    let line = self.line.trim_end_matches(['\r', '\n']);
                    // Fully blank lines (trailing newline at EOF) are not rows
                    if line.is_empty() {
                        continue;
                    }
                    return Some(parse_index_row(line));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
