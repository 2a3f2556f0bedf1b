use thiserror::Error;

/// Error types that can occur while issuing or verifying signed canary URLs.
///
/// # Error Categories
///
/// - **Configuration errors**: `MissingSecret` is fatal and surfaced before
///   any URL is issued or verified, never per request.
/// - **Verification rejects**: `MalformedUrl`, `Expired`, `Replayed`,
///   `BadSignature` are terminal for that request, never retried internally.
/// - **System errors**: `StorageError`, `CryptoError`.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::{SignError, SignedUrlBuilder, SigningMode, UrlVerifier};
/// use kanariya_sign::storage::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), SignError> {
/// let mode = SigningMode::derived(b"master")?;
/// let signed = SignedUrlBuilder::new(mode.clone()).build()?;
///
/// let store = Arc::new(MemoryStore::new());
/// match UrlVerifier::new(store).with_mode(mode).verify(signed.url()).await {
///     Ok(verified) => println!("token {} accepted", verified.token),
///     Err(SignError::Replayed) => println!("URL already consumed"),
///     Err(SignError::BadSignature) => println!("tampered or wrong secret"),
///     Err(e) => println!("rejected: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum SignError {
    /// No usable signing secret is configured.
    ///
    /// Raised when neither a master secret nor a legacy static secret is
    /// available, or when an empty secret is supplied. This is a startup
    /// failure: no URL may be issued or verified until it is fixed.
    #[error("no signing secret configured (set a master secret or a legacy secret)")]
    MissingSecret,

    /// The inbound URL is structurally invalid for verification.
    ///
    /// Covers a missing token path segment, missing `ts`, `nonce` or `sig`
    /// query parameters, and a non-integer `ts` value.
    #[error("malformed signed URL: {0}")]
    MalformedUrl(String),

    /// The URL timestamp is outside the configured freshness window.
    ///
    /// The client must request a freshly signed URL; replays of this one are
    /// pointless.
    #[error("timestamp outside freshness window")]
    Expired,

    /// The `(token, nonce)` pair has already been consumed.
    ///
    /// Signals either a replay attack or a duplicate delivery. Never
    /// retried.
    #[error("nonce already consumed")]
    Replayed,

    /// The recomputed signature does not match the supplied one.
    ///
    /// Indicates tampering with any signed field or a secret mismatch
    /// between issuer and verifier.
    #[error("signature mismatch")]
    BadSignature,

    /// A replay store operation failed.
    #[error("storage error: {0}")]
    StorageError(String),

    /// An HMAC key setup or system clock operation failed.
    #[error("crypto error: {0}")]
    CryptoError(String),
}

impl SignError {
    /// Builds a `StorageError` from any displayable backend message.
    pub fn from_storage_message<M: std::fmt::Display>(message: M) -> Self {
        SignError::StorageError(message.to_string())
    }
}
