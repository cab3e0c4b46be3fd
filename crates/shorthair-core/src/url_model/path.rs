//! Filename extraction from URL path.

use url::Url;

/// Extracts the last path segment of `url`, percent-decoded, for use as a
/// filename hint.
///
/// Returns `None` if the path is empty/root or the segment is `.` or `..`.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path().split('/').filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> Option<String> {
        filename_from_url_path(&Url::parse(url).unwrap())
    }

    #[test]
    fn normal() {
        assert_eq!(name("https://example.com/a/b/file.deb").as_deref(), Some("file.deb"));
        assert_eq!(name("https://example.com/single").as_deref(), Some("single"));
    }

    #[test]
    fn root_or_empty() {
        assert_eq!(name("https://example.com/"), None);
        assert_eq!(name("https://example.com"), None);
    }

    #[test]
    fn with_query() {
        assert_eq!(name("https://example.com/file.zip?token=abc").as_deref(), Some("file.zip"));
    }

    #[test]
    fn trailing_slash_uses_last_real_segment() {
        assert_eq!(name("https://example.com/dists/bookworm/").as_deref(), Some("bookworm"));
    }

    #[test]
    fn percent_decoded() {
        assert_eq!(name("https://example.com/a%2Bb.txt").as_deref(), Some("a+b.txt"));
    }
}
