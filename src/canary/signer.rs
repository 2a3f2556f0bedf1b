//! HMAC signature computation over the canonical string-to-sign.

use crate::HmacSha256;
use crate::canary::error::SignError;
use hmac::Mac;

/// Assembles the string-to-sign: `{timestamp}|{path}|{canonical_query}`.
///
/// The path and canonical query are already encoded forms; an unescaped pipe
/// in either would be a canonicalization bug upstream, so no further
/// escaping happens here.
pub fn string_to_sign(timestamp: u64, path: &str, canonical_query: &str) -> String {
    format!("{timestamp}|{path}|{canonical_query}")
}

/// Computes the lowercase hex HMAC-SHA256 signature over the string-to-sign.
///
/// Deterministic: same key and inputs always produce the same signature.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::sign;
///
/// let sig = sign(b"key", 1700000000, "/canary/abc", "")?;
/// assert_eq!(sig.len(), 64);
/// assert_eq!(sig, sign(b"key", 1700000000, "/canary/abc", "")?);
/// # Ok::<(), kanariya_sign::SignError>(())
/// ```
pub fn sign(
    key: &[u8],
    timestamp: u64,
    path: &str,
    canonical_query: &str,
) -> Result<String, SignError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SignError::CryptoError(format!("invalid signing key: {e}")))?;
    mac.update(string_to_sign(timestamp, path, canonical_query).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex-encoded signature in constant time.
///
/// Returns `BadSignature` on mismatch or when the supplied signature is not
/// valid hex.
pub fn verify_signature(
    key: &[u8],
    timestamp: u64,
    path: &str,
    canonical_query: &str,
    signature: &str,
) -> Result<(), SignError> {
    let supplied = hex::decode(signature).map_err(|_| SignError::BadSignature)?;

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SignError::CryptoError(format!("invalid signing key: {e}")))?;
    mac.update(string_to_sign(timestamp, path, canonical_query).as_bytes());

    // Constant-time comparison
    mac.verify_slice(&supplied)
        .map_err(|_| SignError::BadSignature)
}
