//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

/// Status code of an `HTTP/x.y NNN reason` line.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let rest = line.trim_start().strip_prefix("HTTP/")?;
    let mut parts = rest.split_whitespace();
    let _version = parts.next()?;
    parts.next()?.parse().ok()
}

/// Trimmed value of `line` if it is a `name: value` header (name compared
/// case-insensitively).
pub(crate) fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (n, v) = line.split_once(':')?;
    n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
}

/// Parse collected header lines into HeadResult. A status line starts a new
/// response, so after redirects only the final block is kept.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut head = HeadResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(status) = parse_status_line(line) {
            head = HeadResult {
                status,
                ..HeadResult::default()
            };
            continue;
        }
        if let Some(value) = header_value(line, "content-length") {
            if let Ok(n) = value.parse::<u64>() {
                head.content_length = Some(n);
            }
        } else if let Some(value) = header_value(line, "accept-ranges") {
            head.accept_ranges = value.eq_ignore_ascii_case("bytes");
        } else if let Some(value) = header_value(line, "content-type") {
            head.content_type = Some(value.to_string());
        }
    }

    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length_and_ranges() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(r.status, 200);
        assert_eq!(r.content_length, Some(12345));
        assert!(r.accept_ranges);
        assert_eq!(r.segmentable_length().unwrap(), 12345);
    }

    #[test]
    fn parse_headers_no_ranges() {
        let r = parse_headers(&lines(&["Content-Length: 999", "Accept-Ranges: none"]));
        assert_eq!(r.content_length, Some(999));
        assert!(!r.accept_ranges);
        assert!(matches!(
            r.segmentable_length(),
            Err(FetchError::RangesUnsupported)
        ));
    }

    #[test]
    fn parse_headers_missing_length() {
        let r = parse_headers(&lines(&["HTTP/2 200", "accept-ranges: BYTES"]));
        assert!(r.accept_ranges);
        assert!(matches!(
            r.segmentable_length(),
            Err(FetchError::MissingLength)
        ));
    }

    #[test]
    fn redirect_headers_are_discarded() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: /elsewhere",
            "Content-Length: 0",
            "Accept-Ranges: bytes",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 77",
            "Content-Type: application/octet-stream",
        ]));
        assert_eq!(r.status, 200);
        assert_eq!(r.content_length, Some(77));
        assert!(!r.accept_ranges);
        assert_eq!(r.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[test]
    fn status_lines() {
        assert_eq!(parse_status_line("HTTP/1.1 206 Partial Content\r\n"), Some(206));
        assert_eq!(parse_status_line("HTTP/2 200"), Some(200));
        assert_eq!(parse_status_line("Content-Length: 5"), None);
        assert_eq!(parse_status_line("HTTP/1.1"), None);
    }

    #[test]
    fn header_values_ignore_case_and_whitespace() {
        assert_eq!(header_value("content-LENGTH:  42 \r\n", "Content-Length"), Some("42"));
        assert_eq!(header_value("Content-Type: text/plain", "content-length"), None);
        assert_eq!(header_value("no colon here", "x"), None);
    }
}
