//! Long URL syntax checks.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Reasons a long URL is rejected before shortening.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LongUrlError {
    #[error("A URL was not provided")]
    Missing,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS URLs can be shortened")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("URL contains control characters")]
    ControlCharacters,
}

/// Parses a user-supplied long URL.
///
/// Surrounding whitespace is trimmed; everything else is kept verbatim so the
/// redirect goes exactly where the caller asked. Only `http` and `https` URLs with
/// a host are accepted, which rules out `javascript:`, `data:` and `file:` targets.
/// Control characters are rejected since the stored value becomes a `Location` header.
///
/// # Errors
///
/// See [`LongUrlError`].
pub fn parse_long_url(input: &str) -> Result<String, LongUrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LongUrlError::Missing);
    }

    if trimmed.chars().any(char::is_control) {
        return Err(LongUrlError::ControlCharacters);
    }

    let url = Url::parse(trimmed).map_err(|e| LongUrlError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(LongUrlError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(LongUrlError::MissingHost);
    }

    Ok(trimmed.to_string())
}

impl From<LongUrlError> for AppError {
    fn from(e: LongUrlError) -> Self {
        let details = match &e {
            LongUrlError::Missing => json!({ "field": "long_url" }),
            other => json!({ "field": "long_url", "reason": other.to_string() }),
        };
        AppError::bad_request(e.to_string(), details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            parse_long_url("https://example.com/Path?q=1#frag").unwrap(),
            "https://example.com/Path?q=1#frag"
        );
        assert!(parse_long_url("http://foobar.com").is_ok());
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            parse_long_url("  https://example.com  ").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(parse_long_url("   "), Err(LongUrlError::Missing));
    }

    #[test]
    fn test_rejects_relative() {
        assert!(matches!(
            parse_long_url("example.com/path"),
            Err(LongUrlError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_control_characters() {
        assert_eq!(
            parse_long_url("https://example.com/a\u{1}b"),
            Err(LongUrlError::ControlCharacters)
        );
        assert_eq!(
            parse_long_url("https://example.com/a\tb"),
            Err(LongUrlError::ControlCharacters)
        );
        assert!(parse_long_url("https://example.com/caf\u{e9}").is_ok());
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        assert_eq!(
            parse_long_url("javascript:alert(1)"),
            Err(LongUrlError::UnsupportedProtocol)
        );
        assert_eq!(
            parse_long_url("file:///etc/passwd"),
            Err(LongUrlError::UnsupportedProtocol)
        );
    }
}
