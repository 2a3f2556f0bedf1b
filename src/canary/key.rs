//! Signing-key selection and per-token key derivation.

use crate::HmacSha256;
use crate::canary::error::SignError;
use hmac::Mac;

/// Prefix of the key-derivation message, binding the derived key to exactly
/// one token value.
const DERIVATION_PREFIX: &str = "token:";

/// The active signing mode, resolved once at configuration load.
///
/// Exactly one mode is active per configuration:
///
/// - [`SigningMode::Derived`] keys each token with
///   `HMAC-SHA256(master_secret, "token:" + token)`, hex-encoded; the hex
///   string's bytes are the effective key material. Compromise of one
///   derived key exposes neither the master secret nor other tokens' keys.
/// - [`SigningMode::Static`] uses a single legacy secret directly for every
///   token.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::SigningMode;
///
/// let mode = SigningMode::derived(b"master_secret")?;
/// let key_a = mode.signing_key("token-a")?;
/// let key_b = mode.signing_key("token-b")?;
/// assert_ne!(key_a, key_b);
/// # Ok::<(), kanariya_sign::SignError>(())
/// ```
#[derive(Clone)]
pub enum SigningMode {
    /// Per-token keys derived from a master secret.
    Derived(Vec<u8>),
    /// One static legacy secret shared by all tokens.
    Static(Vec<u8>),
}

impl SigningMode {
    /// Creates the derived-key mode. Fails fast on an empty master secret.
    pub fn derived(master_secret: &[u8]) -> Result<Self, SignError> {
        if master_secret.is_empty() {
            return Err(SignError::MissingSecret);
        }
        Ok(SigningMode::Derived(master_secret.to_vec()))
    }

    /// Creates the legacy static-secret mode. Fails fast on an empty secret.
    pub fn static_secret(legacy_secret: &[u8]) -> Result<Self, SignError> {
        if legacy_secret.is_empty() {
            return Err(SignError::MissingSecret);
        }
        Ok(SigningMode::Static(legacy_secret.to_vec()))
    }

    /// Resolves the mode from optional master and legacy secrets, preferring
    /// the master secret. Mirrors the configuration surface of the signing
    /// tool: at least one secret must be present.
    pub fn resolve(
        master_secret: Option<&[u8]>,
        legacy_secret: Option<&[u8]>,
    ) -> Result<Self, SignError> {
        match (master_secret, legacy_secret) {
            (Some(master), _) if !master.is_empty() => Self::derived(master),
            (_, Some(legacy)) if !legacy.is_empty() => Self::static_secret(legacy),
            _ => Err(SignError::MissingSecret),
        }
    }

    /// Returns the effective signing key for `token`.
    ///
    /// In derived mode this is a pure function of `(master_secret, token)`;
    /// no other state affects it. In static mode the token is ignored.
    pub fn signing_key(&self, token: &str) -> Result<Vec<u8>, SignError> {
        match self {
            SigningMode::Derived(master) => {
                let mut mac = HmacSha256::new_from_slice(master)
                    .map_err(|e| SignError::CryptoError(format!("invalid master secret: {e}")))?;
                mac.update(DERIVATION_PREFIX.as_bytes());
                mac.update(token.as_bytes());
                let digest = hex::encode(mac.finalize().into_bytes());
                Ok(digest.into_bytes())
            }
            SigningMode::Static(secret) => Ok(secret.clone()),
        }
    }
}

impl std::fmt::Debug for SigningMode {
    // Secret material must never leak through Debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMode::Derived(_) => f.write_str("SigningMode::Derived(..)"),
            SigningMode::Static(_) => f.write_str("SigningMode::Static(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secrets_rejected() {
        assert!(matches!(
            SigningMode::derived(b""),
            Err(SignError::MissingSecret)
        ));
        assert!(matches!(
            SigningMode::static_secret(b""),
            Err(SignError::MissingSecret)
        ));
        assert!(matches!(
            SigningMode::resolve(None, None),
            Err(SignError::MissingSecret)
        ));
        assert!(matches!(
            SigningMode::resolve(Some(b""), Some(b"")),
            Err(SignError::MissingSecret)
        ));
    }

    #[test]
    fn test_resolve_prefers_master_secret() {
        let mode = SigningMode::resolve(Some(b"master"), Some(b"legacy")).unwrap();
        assert!(matches!(mode, SigningMode::Derived(_)));

        let mode = SigningMode::resolve(None, Some(b"legacy")).unwrap();
        assert!(matches!(mode, SigningMode::Static(_)));
    }

    #[test]
    fn test_known_derivation_vector() {
        // HMAC-SHA256("m", "token:abc"), hex digest
        let mode = SigningMode::derived(b"m").unwrap();
        let key = mode.signing_key("abc").unwrap();
        assert_eq!(
            key,
            b"7150d08bff362d5bad2b633443dd80df6bd1452e3cf857d5c443880b779fca3b".to_vec()
        );
    }

    #[test]
    fn test_derived_keys_are_token_scoped() {
        let mode = SigningMode::derived(b"master").unwrap();
        let key_a = mode.signing_key("abc").unwrap();
        let key_b = mode.signing_key("abd").unwrap();
        assert_ne!(key_a, key_b);

        // Pure function of (master_secret, token)
        assert_eq!(key_a, mode.signing_key("abc").unwrap());
    }

    #[test]
    fn test_static_mode_ignores_token() {
        let mode = SigningMode::static_secret(b"legacy").unwrap();
        assert_eq!(
            mode.signing_key("abc").unwrap(),
            mode.signing_key("xyz").unwrap()
        );
        assert_eq!(mode.signing_key("abc").unwrap(), b"legacy".to_vec());
    }

    #[test]
    fn test_debug_never_prints_secret() {
        let derived = SigningMode::derived(b"top_secret_material").unwrap();
        let legacy = SigningMode::static_secret(b"top_secret_material").unwrap();
        assert!(!format!("{derived:?}").contains("top_secret_material"));
        assert!(!format!("{legacy:?}").contains("top_secret_material"));
    }
}
