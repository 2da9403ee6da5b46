//! Minimal WARC container iteration.
//!
//! A decompressed archive byte range holds a sequence of records:
//! a `WARC/1.x` version line, CRLF-separated headers up to a blank line,
//! a body of exactly `Content-Length` bytes, and a blank-line separator
//! before the next record. Only `response` records carry a payload worth
//! extracting.

/// Decode failure inside a WARC byte range. Localized to the item being
/// processed; never retried.
#[derive(Debug)]
pub enum WarcError {
    /// Data ended inside a record
    Truncated,
    /// First line of a record is not a WARC version line
    BadVersion(String),
    /// A required header is missing
    MissingHeader(&'static str),
    /// A header failed to parse
    BadHeader(String),
}

impl std::fmt::Display for WarcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated record"),
            Self::BadVersion(line) => write!(f, "not a WARC version line: {line:?}"),
            Self::MissingHeader(name) => write!(f, "missing header: {name}"),
            Self::BadHeader(line) => write!(f, "malformed header: {line:?}"),
        }
    }
}

impl std::error::Error for WarcError {}

/// One parsed WARC record.
#[derive(Debug)]
pub struct WarcRecord<'a> {
    pub warc_type: String,
    pub body: &'a [u8],
}

impl WarcRecord<'_> {
    pub fn is_response(&self) -> bool {
        self.warc_type == "response"
    }
}

/// Iterator over records in a decompressed WARC byte range.
///
/// Yields `Err` once on the first malformed record and then stops; the
/// caller treats that as a decode failure for the whole range.
pub struct RecordIter<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Read one line (without its terminator), advancing the cursor.
    fn read_line(&mut self) -> Result<&'a str, WarcError> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(WarcError::Truncated)?;
        self.pos += end + 1;
        let line = &rest[..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        std::str::from_utf8(line)
            .map_err(|_| WarcError::BadHeader(String::from_utf8_lossy(line).into_owned()))
    }

    fn parse_record(&mut self) -> Result<WarcRecord<'a>, WarcError> {
        let version = self.read_line()?;
        if !version.starts_with("WARC/") {
            return Err(WarcError::BadVersion(version.to_string()));
        }

        let mut warc_type = None;
        let mut content_length = None;
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| WarcError::BadHeader(line.to_string()))?;
            let value = value.trim();
            if name.eq_ignore_ascii_case("WARC-Type") {
                warc_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("Content-Length") {
                let len = value
                    .parse::<usize>()
                    .map_err(|_| WarcError::BadHeader(line.to_string()))?;
                content_length = Some(len);
            }
        }

        let warc_type = warc_type.ok_or(WarcError::MissingHeader("WARC-Type"))?;
        let len = content_length.ok_or(WarcError::MissingHeader("Content-Length"))?;
        if self.pos + len > self.data.len() {
            return Err(WarcError::Truncated);
        }
        let body = &self.data[self.pos..self.pos + len];
        self.pos += len;

        // Consume the record separator (two CRLFs, tolerating bare LF)
        while self.pos < self.data.len()
            && (self.data[self.pos] == b'\r' || self.data[self.pos] == b'\n')
        {
            self.pos += 1;
        }

        Ok(WarcRecord { warc_type, body })
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<WarcRecord<'a>, WarcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        match self.parse_record() {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Strip the embedded HTTP header block from a response record body,
/// returning the entity payload. Bodies that do not start with an HTTP
/// status line pass through unchanged.
pub fn http_payload(body: &[u8]) -> &[u8] {
    if !body.starts_with(b"HTTP/") {
        return body;
    }
    match body.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => &body[pos + 4..],
        None => body,
    }
}

#[cfg(test)]
pub(crate) fn build_record(warc_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"WARC/1.0\r\n");
    out.extend_from_slice(format!("WARC-Type: {warc_type}\r\n").as_bytes());
    out.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n\r\n");
    out
}
