//! # Kanariya Sign
//!
//! A Rust library for issuing and verifying HMAC-signed canary URLs that are
//! tamper-evident and replay-resistant.
//!
//! Every issued URL carries a random token in its path plus a timestamp,
//! single-use nonce, optional source tag, and an HMAC-SHA256 signature over
//! a deterministic canonical form. The verifier recomputes the same pipeline
//! for an inbound URL and accepts it at most once within a freshness window.
//!
//! ## Features
//!
//! - **Deterministic canonicalization**: issuer and verifier agree on one
//!   byte-exact canonical query form, whatever order parameters arrive in
//! - **Per-token key derivation**: a master secret keys each token with its
//!   own HMAC-derived signing key, so one leaked key exposes nothing else
//! - **Legacy static-secret mode**: drop-in compatibility with deployments
//!   that still share one signing secret
//! - **Replay prevention**: consumed `(token, nonce)` pairs are recorded in
//!   a pluggable replay store with atomic insert-if-absent
//! - **Freshness window**: timestamps drifting beyond the window in either
//!   direction are rejected
//! - **Async replay storage**: in-memory for single instances, Redis for
//!   shared state across instances
//!
//! ## Quick Start
//!
//! ```rust
//! use kanariya_sign::{SignedUrlBuilder, SigningMode, UrlVerifier};
//! use kanariya_sign::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), kanariya_sign::SignError> {
//! // Issuer and verifier share a master secret
//! let mode = SigningMode::derived(b"master_secret")?;
//!
//! // Issue a signed URL with a source tag
//! let signed = SignedUrlBuilder::new(mode.clone())
//!     .with_src("mail-footer")
//!     .build()?;
//! println!("{}", signed.url());
//!
//! // Verify it on the consumer side
//! let verifier = UrlVerifier::new(Arc::new(MemoryStore::new())).with_mode(mode);
//! let verified = verifier.verify(signed.url()).await?;
//! assert_eq!(verified.token, signed.token);
//!
//! // The same URL cannot be consumed twice
//! assert!(verifier.verify(signed.url()).await.is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## URL format
//!
//! ```text
//! {scheme}://{host}{base_path}/{token}?ts={unix_seconds}&[src={value}&]nonce={nonce}&sig={hex_hmac_sha256}
//! ```
//!
//! The query parameters are *presented* in the fixed order above, while the
//! signature is computed over the *canonical* form: all parameters except
//! `sig`, sorted alphabetically as `(key, value)` tuples and percent-encoded.
//! The two orders are independent; conflating them breaks interoperability.
//!
//! ## Architecture
//!
//! - [`SignedUrlBuilder`]: issuer-side builder producing [`SignedUrl`]s
//! - [`UrlVerifier`]: consumer-side verification and replay tracking
//! - [`SigningMode`]: derived-key (master secret) or static legacy secret
//! - [`storage::ReplayStore`](canary::storage::ReplayStore): pluggable
//!   replay cache backends
//! - [`SignError`]: the full failure taxonomy

use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub mod canary;

// Re-export commonly used types
pub use canary::{
    ConfigPreset, DEFAULT_BASE_URL, DEFAULT_TOKEN_BYTES, MIN_TOKEN_BYTES, SIG_KEY, SignError,
    SignedUrlBuilder, SigningMode, UrlVerifier, VerifiedUrl, VerifierConfig, canonical_query,
    generate_nonce, generate_token, sign, storage, string_to_sign, sweep, verify_signature,
};

/// Internal type alias for HMAC-SHA256 operations.
pub(crate) type HmacSha256 = Hmac<Sha256>;

/// A fully issued, signed canary URL together with the material that went
/// into it.
///
/// The `url` field is what gets handed out; the remaining fields let callers
/// store or log the grant. The token identifies the grant, and the signature
/// is useless to an attacker once its nonce is consumed.
///
/// # Serialization
///
/// Implements `Serialize`/`Deserialize` so issuance results can be stored or
/// returned from management APIs as JSON.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::{SignedUrl, SignedUrlBuilder, SigningMode};
///
/// let mode = SigningMode::derived(b"master_secret")?;
/// let signed: SignedUrl = SignedUrlBuilder::new(mode).build()?;
///
/// assert!(signed.url().contains(&signed.token));
/// assert!(signed.url().ends_with(&signed.signature));
/// # Ok::<(), kanariya_sign::SignError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrl {
    /// The complete signed URL.
    pub url: String,

    /// The opaque token embedded in the URL path; identifies this grant.
    pub token: String,

    /// Unix timestamp (seconds) at which the URL was signed.
    pub timestamp: u64,

    /// The single-use nonce included in this signing operation.
    pub nonce: String,

    /// The optional free-text source tag.
    pub src: Option<String>,

    /// Lowercase hex HMAC-SHA256 signature over the canonical string-to-sign.
    pub signature: String,
}

impl SignedUrl {
    /// The complete signed URL as a string slice.
    pub fn url(&self) -> &str {
        &self.url
    }
}
