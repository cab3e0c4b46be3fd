//! URL modeling and filename derivation.
//!
//! Derives a safe local filename from the last segment of a URL path,
//! sanitized for Linux filesystems.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use crate::error::FetchError;

/// Default filename when the URL path yields nothing usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe filename for saving a download.
///
/// Uses the last path segment of `url`, percent-decoded and sanitized for
/// Linux (no `/`, NUL, or control chars; no leading/trailing dots or spaces;
/// reserved names like "." or ".." replaced). Fails only when `url` does not
/// parse.
///
/// # Examples
///
/// - `derive_filename("https://example.com/archive.zip")` → `Ok("archive.zip")`
/// - `derive_filename("https://example.com/")` → `Ok("download.bin")`
pub fn derive_filename(url: &str) -> Result<String, FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let raw = match filename_from_url_path(&parsed) {
        Some(c) => c,
        None => return Ok(DEFAULT_FILENAME.to_string()),
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        Ok(DEFAULT_FILENAME.to_string())
    } else {
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename("https://example.com/archive.zip").unwrap(),
            "archive.zip"
        );
        assert_eq!(
            derive_filename("https://cdn.example.com/path/to/debian-12.iso").unwrap(),
            "debian-12.iso"
        );
    }

    #[test]
    fn derive_filename_empty_url_path_fallback() {
        assert_eq!(derive_filename("https://example.com/").unwrap(), "download.bin");
        assert_eq!(derive_filename("https://example.com").unwrap(), "download.bin");
    }

    #[test]
    fn derive_filename_reserved_names_fallback() {
        assert_eq!(derive_filename("https://example.com/.").unwrap(), "download.bin");
        assert_eq!(derive_filename("https://example.com/..").unwrap(), "download.bin");
    }

    #[test]
    fn derive_filename_decodes_and_sanitizes() {
        assert_eq!(
            derive_filename("https://example.com/my%20file.tar.gz").unwrap(),
            "my_file.tar.gz"
        );
    }

    #[test]
    fn derive_filename_rejects_garbage() {
        assert!(matches!(
            derive_filename("::not a url::"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
