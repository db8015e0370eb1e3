//! Short code generation and validation utilities.
//!
//! Generated codes are the base-N encoding of the record identifier reserved from
//! the store, where N is the length of the configured [`Alphabet`]. Identifiers are
//! unique and monotonically assigned, so two identifiers never encode to the same
//! code under one alphabet.

use crate::error::AppError;
use base64::Engine as _;
use rand::seq::SliceRandom;
use serde_json::json;
use std::collections::HashSet;
use std::fmt;

/// Default short code alphabet (62 alphanumeric characters).
pub const DEFAULT_CHARS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Maximum length of a user-provided custom slug.
pub const MAX_SLUG_LENGTH: usize = 64;

/// Path segments served by the application itself; never usable as short codes.
pub const RESERVED_CODES: &[&str] = &["rest", "health", "api", "favicon.ico", "robots.txt"];

/// Length of the raw secret produced by [`generate_secret`], before encoding.
const SECRET_LENGTH_BYTES: usize = 32;

/// Characters allowed in custom slugs and alphabets.
fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Character set used to encode identifiers into short codes.
///
/// Holds at least two distinct URL-safe characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet from a character set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the set has fewer than two characters,
    /// repeats a character, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(chars: &str) -> Result<Self, AppError> {
        let chars: Vec<char> = chars.chars().collect();

        if chars.len() < 2 {
            return Err(AppError::bad_request(
                "Short code alphabet needs at least 2 characters",
                json!({ "length": chars.len() }),
            ));
        }

        if let Some(bad) = chars.iter().find(|c| !is_url_safe(**c)) {
            return Err(AppError::bad_request(
                "Short code alphabet contains a character that is not URL-safe",
                json!({ "character": bad.to_string() }),
            ));
        }

        let mut seen = HashSet::with_capacity(chars.len());
        if let Some(dup) = chars.iter().find(|c| !seen.insert(**c)) {
            return Err(AppError::bad_request(
                "Short code alphabet contains a repeated character",
                json!({ "character": dup.to_string() }),
            ));
        }

        Ok(Self { chars })
    }

    /// Number of symbols, the base of the encoding.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Encodes an identifier in base-N over this alphabet, most significant digit first.
    pub fn encode(&self, id: u64) -> String {
        let base = self.chars.len() as u64;

        if id == 0 {
            return self.chars[0].to_string();
        }

        let mut digits = Vec::new();
        let mut rest = id;
        while rest > 0 {
            digits.push(self.chars[(rest % base) as usize]);
            rest /= base;
        }

        digits.iter().rev().collect()
    }

    /// Inverse of [`Alphabet::encode`]. Returns `None` for foreign characters or overflow.
    pub fn decode(&self, code: &str) -> Option<u64> {
        let base = self.chars.len() as u64;

        code.chars().try_fold(0u64, |acc, c| {
            let digit = self.chars.iter().position(|x| *x == c)? as u64;
            acc.checked_mul(base)?.checked_add(digit)
        })
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_CHARS.chars().collect(),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Returns a random permutation of [`DEFAULT_CHARS`].
///
/// Same composition as the default alphabet, different order, so generated
/// codes are not guessable from the identifier sequence.
pub fn shuffled_default_chars() -> String {
    let mut chars: Vec<char> = DEFAULT_CHARS.chars().collect();
    chars.shuffle(&mut rand::rng());
    chars.into_iter().collect()
}

/// Generates a random URL-safe secret suitable for `TOKEN_SIGNING_SECRET`.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the operating system RNG is unavailable.
pub fn generate_secret() -> Result<String, AppError> {
    let mut buffer = [0u8; SECRET_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `code` collides with a route served by the application.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.iter().any(|r| r.eq_ignore_ascii_case(code))
}

/// Validates a user-provided custom slug.
///
/// # Rules
///
/// - Length: 1-64 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot be a reserved route segment
///
/// Matching against existing codes is case-sensitive; this function only checks shape.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.chars().count() > MAX_SLUG_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom slug must be 1-{MAX_SLUG_LENGTH} characters"),
            json!({ "provided_length": slug.chars().count() }),
        ));
    }

    if !slug.chars().all(is_url_safe) {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": slug }),
        ));
    }

    if is_reserved(slug) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet_has_62_chars() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 62);
        assert!(Alphabet::new(DEFAULT_CHARS).is_ok());
    }

    #[test]
    fn test_encode_small_ids_are_short() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.encode(0), "0");
        assert_eq!(alphabet.encode(1), "1");
        assert_eq!(alphabet.encode(61), "Z");
        assert_eq!(alphabet.encode(62), "10");
        assert_eq!(alphabet.encode(62 * 62), "100");
    }

    #[test]
    fn test_encode_respects_custom_alphabet() {
        let binary = Alphabet::new("ab").unwrap();
        assert_eq!(binary.encode(0), "a");
        assert_eq!(binary.encode(1), "b");
        assert_eq!(binary.encode(2), "ba");
        assert_eq!(binary.encode(5), "bab");
    }

    #[test]
    fn test_distinct_ids_give_distinct_codes() {
        let alphabet = Alphabet::new("xY7_-").unwrap();
        let codes: HashSet<String> = (1..5000).map(|id| alphabet.encode(id)).collect();
        assert_eq!(codes.len(), 4999);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let alphabet = Alphabet::new(&shuffled_default_chars()).unwrap();
        for id in [1u64, 61, 62, 12_345, 987_654_321] {
            assert_eq!(alphabet.decode(&alphabet.encode(id)), Some(id));
        }
        assert_eq!(alphabet.decode("!"), None);
    }

    #[test]
    fn test_alphabet_rejects_short_sets() {
        assert!(Alphabet::new("").is_err());
        assert!(Alphabet::new("a").is_err());
    }

    #[test]
    fn test_alphabet_rejects_repeated_chars() {
        let err = Alphabet::new("abca").unwrap_err();
        assert!(err.to_string().contains("repeated"));
    }

    #[test]
    fn test_alphabet_rejects_unsafe_chars() {
        let err = Alphabet::new("ab/c").unwrap_err();
        assert!(err.to_string().contains("URL-safe"));
    }

    #[test]
    fn test_alphabet_display_roundtrips() {
        let alphabet = Alphabet::new("q1w2e3").unwrap();
        assert_eq!(alphabet.to_string(), "q1w2e3");
    }

    #[test]
    fn test_shuffled_chars_keep_composition() {
        let shuffled = shuffled_default_chars();
        let mut a: Vec<char> = shuffled.chars().collect();
        let mut b: Vec<char> = DEFAULT_CHARS.chars().collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_secret_is_url_safe() {
        let secret = generate_secret().unwrap();
        assert_eq!(secret.len(), 43);
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(secret, generate_secret().unwrap());
    }

    #[test]
    fn test_validate_slug_accepts_mixed_case() {
        assert!(validate_custom_slug("My-Promo_2026").is_ok());
        assert!(validate_custom_slug("a").is_ok());
    }

    #[test]
    fn test_validate_slug_rejects_empty_and_long() {
        assert!(validate_custom_slug("").is_err());
        assert!(validate_custom_slug(&"x".repeat(MAX_SLUG_LENGTH + 1)).is_err());
        assert!(validate_custom_slug(&"x".repeat(MAX_SLUG_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_slug_rejects_special_characters() {
        assert!(validate_custom_slug("my slug").is_err());
        assert!(validate_custom_slug("a/b").is_err());
        assert!(validate_custom_slug("naïve").is_err());
    }

    #[test]
    fn test_validate_slug_rejects_reserved() {
        for &reserved in RESERVED_CODES.iter().filter(|r| !r.contains('.')) {
            assert!(validate_custom_slug(reserved).is_err());
        }
        assert!(validate_custom_slug("REST").is_err());
    }
}
