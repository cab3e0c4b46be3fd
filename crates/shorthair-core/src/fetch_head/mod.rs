//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and confirm
//! `Content-Length` and `Accept-Ranges: bytes` before a segmented download.

mod parse;

pub(crate) use parse::{header_value, parse_status_line};

use std::str;

use crate::error::FetchError;
use crate::source::HttpOptions;

/// Result of a HEAD request: the headers a segmented download depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Final status code after redirects.
    pub status: u32,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    pub content_type: Option<String>,
}

impl HeadResult {
    /// Size to split into ranges, if the server allows splitting at all.
    pub fn segmentable_length(&self) -> Result<u64, FetchError> {
        if !self.accept_ranges {
            return Err(FetchError::RangesUnsupported);
        }
        self.content_length.ok_or(FetchError::MissingLength)
    }
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows redirects; only the last response's headers count.
/// Blocks the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(url: &str, options: &HttpOptions) -> Result<HeadResult, FetchError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.timeout(options.probe_timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: code,
        });
    }

    let head = parse::parse_headers(&headers);
    tracing::debug!(
        url,
        status = head.status,
        length = ?head.content_length,
        ranges = head.accept_ranges,
        "probed"
    );
    Ok(head)
}
