use crate::SignedUrl;
use crate::canary::canonical::{CANONICAL_ENCODE_SET, SIG_KEY, canonical_query};
use crate::canary::config::DEFAULT_BASE_URL;
use crate::canary::error::SignError;
use crate::canary::key::SigningMode;
use crate::canary::signer::sign;
use crate::canary::time_utils::current_timestamp;
use crate::canary::token::{DEFAULT_TOKEN_BYTES, generate_nonce, generate_token};
use percent_encoding::utf8_percent_encode;
use url::Url;

/// A function that generates token or nonce values.
pub type TokenGeneratorFn = Box<dyn Fn() -> String + Send + Sync>;

/// A function that provides Unix timestamps.
pub type TimeProviderFn = Box<dyn Fn() -> Result<u64, SignError> + Send + Sync>;

/// Builder for issuing signed canary URLs.
///
/// `SignedUrlBuilder` provides a fluent interface for configuring one
/// signing operation: the base URL, the token (auto-generated unless
/// overridden), the optional `src` tag, and the nonce. Signing itself is a
/// pure, stateless computation, so any number of builders may run
/// concurrently with no coordination.
///
/// # Example: Basic Usage
///
/// ```rust
/// use kanariya_sign::{SignedUrlBuilder, SigningMode};
///
/// let mode = SigningMode::derived(b"master_secret")?;
/// let signed = SignedUrlBuilder::new(mode)
///     .with_src("mail-footer")
///     .build()?;
/// println!("{}", signed.url());
/// # Ok::<(), kanariya_sign::SignError>(())
/// ```
///
/// # Example: Deterministic Output for Tests
///
/// ```rust
/// use kanariya_sign::{SignedUrlBuilder, SigningMode};
///
/// let mode = SigningMode::static_secret(b"legacy")?;
/// let signed = SignedUrlBuilder::new(mode)
///     .with_token("fixed-token")
///     .with_nonce("fixed-nonce")
///     .with_time_provider(|| Ok(1700000000))
///     .build()?;
/// assert_eq!(signed.timestamp, 1700000000);
/// # Ok::<(), kanariya_sign::SignError>(())
/// ```
pub struct SignedUrlBuilder {
    mode: SigningMode,
    base_url: String,
    token: Option<String>,
    token_bytes: usize,
    src: Option<String>,
    nonce_generator: TokenGeneratorFn,
    time_provider: TimeProviderFn,
}

impl SignedUrlBuilder {
    /// Creates a builder with the given signing mode and default settings:
    /// the canary base URL, auto-generated 16-byte tokens, auto-generated
    /// 8-byte nonces, no `src` tag.
    pub fn new(mode: SigningMode) -> Self {
        Self {
            mode,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            token_bytes: DEFAULT_TOKEN_BYTES,
            src: None,
            nonce_generator: Box::new(generate_nonce),
            time_provider: Box::new(current_timestamp),
        }
    }

    /// Overrides the base URL. Trailing slashes are stripped before the
    /// token segment is appended.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Uses a caller-supplied token instead of generating one.
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the random byte length for auto-generated tokens. Values below
    /// 8 are clamped up at generation time.
    pub fn with_token_bytes(mut self, token_bytes: usize) -> Self {
        self.token_bytes = token_bytes;
        self
    }

    /// Attaches a free-text source tag. Empty values are treated as absent,
    /// matching the signing tool's behavior.
    pub fn with_src<S: Into<String>>(mut self, src: S) -> Self {
        let src = src.into();
        self.src = if src.is_empty() { None } else { Some(src) };
        self
    }

    /// Uses a caller-supplied nonce instead of generating one.
    pub fn with_nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        let nonce = nonce.into();
        self.nonce_generator = Box::new(move || nonce.clone());
        self
    }

    /// Sets a custom nonce generator. The default generates 8 random bytes,
    /// base64url without padding.
    pub fn with_nonce_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.nonce_generator = Box::new(generator);
        self
    }

    /// Sets a custom time provider. The default reads the system clock.
    pub fn with_time_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Result<u64, SignError> + Send + Sync + 'static,
    {
        self.time_provider = Box::new(provider);
        self
    }

    /// Issues one signed URL.
    ///
    /// The signature covers `{ts}|{path}|{canonical_query}` where the
    /// canonical query is the sorted, percent-encoded form of `ts`, `nonce`
    /// and (if present) `src`. The emitted URL presents the parameters in
    /// the fixed order `ts`, `src`, `nonce`, `sig`, independent of the
    /// alphabetical canonical order, which only exists inside the signature
    /// computation.
    pub fn build(self) -> Result<SignedUrl, SignError> {
        let token = self
            .token
            .unwrap_or_else(|| generate_token(self.token_bytes));
        let timestamp = (self.time_provider)()?;
        let nonce = (self.nonce_generator)();

        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| SignError::MalformedUrl(format!("invalid base URL: {e}")))?;

        let path = format!("{}/{}", url.path().trim_end_matches('/'), token);
        url.set_path(&path);

        let mut params = vec![("ts".to_string(), timestamp.to_string())];
        if let Some(ref src) = self.src {
            params.push(("src".to_string(), src.clone()));
        }
        params.push(("nonce".to_string(), nonce.clone()));

        let query = canonical_query(&params);
        let key = self.mode.signing_key(&token)?;
        let signature = sign(&key, timestamp, url.path(), &query)?;

        url.set_query(Some(&presentation_query(
            timestamp,
            self.src.as_deref(),
            &nonce,
            &signature,
        )));

        Ok(SignedUrl {
            url: url.to_string(),
            token,
            timestamp,
            nonce,
            src: self.src,
            signature,
        })
    }
}

/// Renders the user-visible query string: `ts`, then `src` if present, then
/// `nonce`, with `sig` always last.
fn presentation_query(timestamp: u64, src: Option<&str>, nonce: &str, signature: &str) -> String {
    let mut query = format!("ts={timestamp}");
    if let Some(src) = src {
        query.push_str("&src=");
        query.extend(utf8_percent_encode(src, CANONICAL_ENCODE_SET));
    }
    query.push_str("&nonce=");
    query.extend(utf8_percent_encode(nonce, CANONICAL_ENCODE_SET));
    query.push('&');
    query.push_str(SIG_KEY);
    query.push('=');
    query.push_str(signature);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_builder() -> SignedUrlBuilder {
        SignedUrlBuilder::new(SigningMode::derived(b"unit-master").unwrap())
            .with_token("tok123")
            .with_nonce("n0nceXYZ")
            .with_time_provider(|| Ok(1700000000))
    }

    #[test]
    fn test_known_url_vector_with_src() {
        let signed = fixed_builder().with_src("smoke").build().unwrap();

        assert_eq!(signed.token, "tok123");
        assert_eq!(
            signed.signature,
            "17a803a43df5bad03f7e705ba1031841083a38a61092142569f3740e3d2c23b0"
        );
        assert_eq!(
            signed.url(),
            concat!(
                "https://kanariya.toppymicros.com/canary/tok123",
                "?ts=1700000000&src=smoke&nonce=n0nceXYZ",
                "&sig=17a803a43df5bad03f7e705ba1031841083a38a61092142569f3740e3d2c23b0",
            )
        );
    }

    #[test]
    fn test_known_url_vector_without_src() {
        let signed = fixed_builder().build().unwrap();
        assert_eq!(
            signed.signature,
            "9454285d158d6f8873cca7063a31eda8b972866e3a8b1ef05d0eb546687a44a4"
        );
        assert!(!signed.url().contains("src="));
    }

    #[test]
    fn test_presentation_order_is_fixed() {
        let signed = fixed_builder().with_src("smoke").build().unwrap();
        let query = signed.url().split('?').nth(1).unwrap().to_string();

        let keys: Vec<&str> = query
            .split('&')
            .map(|kv| kv.split('=').next().unwrap())
            .collect();
        // Presentation order, not the alphabetical canonical order
        assert_eq!(keys, ["ts", "src", "nonce", "sig"]);
    }

    #[test]
    fn test_trailing_slashes_stripped() {
        let signed = fixed_builder()
            .with_base_url("https://example.com/canary///")
            .build()
            .unwrap();
        assert!(signed.url().starts_with("https://example.com/canary/tok123?"));
    }

    #[test]
    fn test_empty_src_omitted() {
        let signed = fixed_builder().with_src("").build().unwrap();
        assert!(!signed.url().contains("src="));
        assert!(signed.src.is_none());
    }

    #[test]
    fn test_src_percent_encoded_in_url() {
        let signed = fixed_builder().with_src("a b&c").build().unwrap();
        assert!(signed.url().contains("src=a%20b%26c"));
    }

    #[test]
    fn test_auto_generated_fields() {
        let mode = SigningMode::static_secret(b"legacy").unwrap();
        let signed = SignedUrlBuilder::new(mode).build().unwrap();

        assert!(!signed.token.is_empty());
        assert!(!signed.nonce.is_empty());
        assert_eq!(signed.signature.len(), 64);
        assert!(signed.timestamp > 1577836800);
    }

    #[test]
    fn test_distinct_builds_use_distinct_material() {
        let mode = SigningMode::static_secret(b"legacy").unwrap();
        let a = SignedUrlBuilder::new(mode.clone()).build().unwrap();
        let b = SignedUrlBuilder::new(mode).build().unwrap();

        assert_ne!(a.token, b.token);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = fixed_builder().with_base_url("not a url").build();
        assert!(matches!(result, Err(SignError::MalformedUrl(_))));
    }

    #[test]
    fn test_time_provider_error_propagates() {
        let result = fixed_builder()
            .with_time_provider(|| Err(SignError::CryptoError("clock".to_string())))
            .build();
        assert!(matches!(result, Err(SignError::CryptoError(_))));
    }
}
