use crate::error::{FixtureError, Result};
use http::HeaderMap;
use http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use std::fmt;

/// The one value a stub derives from each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measurement {
    /// Header text written as received, never re-parsed.
    Raw(String),
    Count(u64),
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Raw(text) => f.write_str(text),
            Measurement::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Which signal a variant pulls out of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    ContentLength,
    HeaderBytes,
}

impl Extractor {
    pub fn measure(&self, headers: &HeaderMap) -> Result<Measurement> {
        match self {
            Extractor::ContentLength => content_length(headers),
            Extractor::HeaderBytes => Ok(Measurement::Count(header_bytes(headers))),
        }
    }
}

/// Reads `Content-Length` verbatim. Absent means `0`; more than one value is
/// a broken client or proxy and is reported as fatal.
pub fn content_length(headers: &HeaderMap) -> Result<Measurement> {
    let mut values: Vec<String> = headers
        .get_all(CONTENT_LENGTH)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();

    match values.len() {
        0 => Ok(Measurement::Raw("0".to_string())),
        1 => Ok(Measurement::Raw(values.remove(0))),
        count => Err(FixtureError::DuplicateContentLength { count, values }),
    }
}

/// Total byte size of the request headers: each distinct name once, plus
/// every value carried under it. `Host` and `Transfer-Encoding` describe the
/// connection rather than the request and are left out.
pub fn header_bytes(headers: &HeaderMap) -> u64 {
    headers
        .keys()
        .filter(|name| **name != HOST && **name != TRANSFER_ENCODING)
        .map(|name| {
            let values: usize = headers
                .get_all(name)
                .iter()
                .map(|v| v.as_bytes().len())
                .sum();
            (name.as_str().len() + values) as u64
        })
        .sum()
}
