//! Short-code derivation and custom-alias validation.
//!
//! Codes are derived by hashing the destination URL together with a fresh
//! random salt and encoding the digest with a compact alphanumeric alphabet
//! (base58: no padding, no separator characters). Salting keeps codes short
//! while avoiding deterministic collisions when different users submit the
//! same URL. The bounded collision-retry loop lives in
//! [`crate::application::services::LinkService`].

use crate::error::AppError;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Default length of generated short codes.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Reserved codes that cannot be used as custom aliases.
///
/// These collide with system routes.
const RESERVED_ALIASES: &[&str] = &["shorten", "analytics", "stats", "health", "api"];

/// Draws a fresh random salt for code derivation.
pub fn random_salt() -> [u8; 16] {
    rand::random()
}

/// Derives a fixed-length short code from a destination URL and a salt.
///
/// SHA-256 over `url || salt`, base58-encoded, truncated to `length`
/// characters. Deterministic for a given `(url, salt)` pair.
///
/// # Examples
///
/// ```
/// use curtail::utils::code_generator::{derive_code, random_salt};
///
/// let code = derive_code("https://example.com", &random_salt(), 7);
/// assert_eq!(code.len(), 7);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn derive_code(destination_url: &str, salt: &[u8], length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(destination_url.as_bytes());
    hasher.update(salt);
    let digest = hasher.finalize();

    let mut encoded = bs58::encode(digest.as_slice()).into_string();
    encoded.truncate(length);
    encoded
}

/// Validates a user-provided custom alias.
///
/// # Rules
///
/// - Length: 3-32 characters
/// - Allowed characters: ASCII letters, digits, hyphens
/// - Cannot start or end with a hyphen
/// - Cannot be a reserved system route
///
/// Collision with existing codes is checked separately against the store;
/// an occupied alias is a [`AppError::Conflict`], not a validation error.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < 3 || alias.len() > 32 {
        return Err(AppError::bad_request(
            "Custom alias must be 3-32 characters",
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::bad_request(
            "Custom alias can only contain letters, digits, and hyphens",
            json!({ "alias": alias }),
        ));
    }

    if alias.starts_with('-') || alias.ends_with('-') {
        return Err(AppError::bad_request(
            "Custom alias cannot start or end with a hyphen",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES.contains(&alias) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_code_has_requested_length() {
        for length in [4, 7, 12] {
            let code = derive_code("https://example.com", &random_salt(), length);
            assert_eq!(code.len(), length);
        }
    }

    #[test]
    fn test_derive_code_alphanumeric_only() {
        for _ in 0..100 {
            let code = derive_code("https://example.com/page", &random_salt(), 7);
            assert!(
                code.chars().all(|c| c.is_ascii_alphanumeric()),
                "non-alphanumeric character in {code}"
            );
        }
    }

    #[test]
    fn test_derive_code_deterministic_for_same_salt() {
        let salt = [7u8; 16];
        let a = derive_code("https://example.com", &salt, 7);
        let b = derive_code("https://example.com", &salt, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_code_differs_across_salts() {
        let mut codes = HashSet::new();
        for _ in 0..1000 {
            codes.insert(derive_code("https://example.com", &random_salt(), 7));
        }
        // A handful of birthday collisions are possible in 58^7 but a
        // degenerate salt would collapse this set entirely.
        assert!(codes.len() > 990);
    }

    #[test]
    fn test_validate_alias_accepts_typical_values() {
        assert!(validate_custom_alias("promo").is_ok());
        assert!(validate_custom_alias("my-link-2024").is_ok());
        assert!(validate_custom_alias("ABC123").is_ok());
        assert!(validate_custom_alias("abc").is_ok());
    }

    #[test]
    fn test_validate_alias_too_short() {
        let result = validate_custom_alias("ab");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("3-32"));
    }

    #[test]
    fn test_validate_alias_too_long() {
        let alias = "a".repeat(33);
        assert!(validate_custom_alias(&alias).is_err());
    }

    #[test]
    fn test_validate_alias_rejects_special_characters() {
        assert!(validate_custom_alias("my_code").is_err());
        assert!(validate_custom_alias("my code").is_err());
        assert!(validate_custom_alias("code@123").is_err());
    }

    #[test]
    fn test_validate_alias_rejects_edge_hyphens() {
        assert!(validate_custom_alias("-promo").is_err());
        assert!(validate_custom_alias("promo-").is_err());
        assert!(validate_custom_alias("pro-mo").is_ok());
    }

    #[test]
    fn test_validate_alias_rejects_reserved_routes() {
        for &reserved in RESERVED_ALIASES {
            assert!(
                validate_custom_alias(reserved).is_err(),
                "reserved alias '{}' should be invalid",
                reserved
            );
        }
    }
}
