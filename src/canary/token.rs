//! Random URL-safe token and nonce generation.

use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;

/// Default number of random bytes per token.
pub const DEFAULT_TOKEN_BYTES: usize = 16;

/// Minimum number of random bytes per token. Requests below this are
/// clamped up so a misconfigured caller cannot issue weak tokens.
pub const MIN_TOKEN_BYTES: usize = 8;

/// Number of random bytes per auto-generated nonce.
pub(crate) const NONCE_BYTES: usize = 8;

/// Generates a URL-safe opaque token from `byte_len` random bytes.
///
/// Uses the operating system CSPRNG. `byte_len` is clamped to at least
/// [`MIN_TOKEN_BYTES`]. The output is base64url without padding, so it can
/// be embedded in a URL path segment without further escaping.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::generate_token;
///
/// let token = generate_token(16);
/// assert!(!token.contains('='));
/// assert!(!token.contains('+'));
/// assert!(!token.contains('/'));
/// ```
pub fn generate_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len.max(MIN_TOKEN_BYTES)];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a fresh 8-byte nonce, encoded the same way as tokens.
pub fn generate_nonce() -> String {
    generate_token(NONCE_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_token_is_url_safe_without_padding() {
        let token = generate_token(24);
        assert!(is_url_safe(&token), "unexpected characters in {token}");
        // 24 bytes -> 32 base64 characters, no padding
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_token_length_floor() {
        // Requests below the floor are clamped to 8 bytes (11 b64url chars)
        assert_eq!(generate_token(0).len(), 11);
        assert_eq!(generate_token(4).len(), 11);
        assert_eq!(generate_token(8).len(), 11);
    }

    #[test]
    fn test_tokens_are_independent() {
        let a = generate_token(16);
        let b = generate_token(16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_nonce_shape() {
        let nonce = generate_nonce();
        assert!(is_url_safe(&nonce));
        assert_eq!(nonce.len(), 11); // 8 bytes, unpadded base64url
    }
}
