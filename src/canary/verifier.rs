use crate::canary::canonical::{SIG_KEY, canonical_query};
use crate::canary::config::VerifierConfig;
use crate::canary::error::SignError;
use crate::canary::key::SigningMode;
use crate::canary::signer::verify_signature;
use crate::canary::storage::ReplayStore;
use crate::canary::sweep::SweepSchedule;
use crate::canary::time_utils::{current_timestamp, is_outside_window};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The outcome of a successful verification: the canary token that was hit
/// and the optional source tag the issuer attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedUrl {
    /// The token from the URL path segment.
    pub token: String,
    /// The `src` tag, if the issuer supplied one.
    pub src: Option<String>,
}

/// Verifier for inbound signed canary URLs.
///
/// The verifier independently recomputes the issuing pipeline (per-token
/// key, canonical query, signature) and accepts a URL only when all of the
/// following hold:
///
/// 1. the URL parses and carries `ts`, `nonce` and `sig`;
/// 2. `ts` is within the freshness window of the current time;
/// 3. the `(token, nonce)` pair has not been consumed before;
/// 4. the recomputed signature matches `sig` (constant-time comparison).
///
/// On acceptance the pair is recorded atomically in the replay store, so a
/// concurrent duplicate sees [`SignError::Replayed`]. The verifier is
/// `Send + Sync` and is meant to be shared via `Arc` across request
/// handlers.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::{SignedUrlBuilder, SigningMode, UrlVerifier};
/// use kanariya_sign::storage::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), kanariya_sign::SignError> {
/// let mode = SigningMode::derived(b"master_secret")?;
/// let signed = SignedUrlBuilder::new(mode.clone()).build()?;
///
/// let verifier = UrlVerifier::new(Arc::new(MemoryStore::new())).with_mode(mode);
/// let verified = verifier.verify(signed.url()).await?;
/// assert_eq!(verified.token, signed.token);
///
/// // The same URL is single-use
/// assert!(verifier.verify(signed.url()).await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct UrlVerifier {
    store: Arc<dyn ReplayStore>,
    mode: Option<SigningMode>,
    time_window: Duration,
    replay_ttl: Duration,
    sweep: SweepSchedule,
    time_provider: Box<dyn Fn() -> Result<u64, SignError> + Send + Sync>,
}

impl UrlVerifier {
    /// Creates a verifier with default settings: a 5-minute freshness
    /// window, a 10-minute replay TTL, and the default sweep schedule.
    pub fn new(store: Arc<dyn ReplayStore>) -> Self {
        let config = VerifierConfig::default();
        Self {
            store,
            mode: None,
            time_window: config.time_window,
            replay_ttl: config.replay_ttl,
            sweep: SweepSchedule::default(),
            time_provider: Box::new(current_timestamp),
        }
    }

    /// Sets the signing mode. Verification fails with
    /// [`SignError::MissingSecret`] until a mode is set.
    pub fn with_mode(mut self, mode: SigningMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Applies a [`VerifierConfig`] (freshness window and replay TTL).
    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.time_window = config.time_window;
        self.replay_ttl = config.replay_ttl;
        self
    }

    /// Sets the freshness window. A URL whose timestamp drifts more than
    /// this from the current time, in either direction, is rejected.
    pub fn with_time_window(mut self, time_window: Duration) -> Self {
        self.time_window = time_window;
        self
    }

    /// Sets how long consumed `(token, nonce)` pairs stay in the replay
    /// store. Should be at least the freshness window, otherwise a replay
    /// could slip in after the record expires but before the URL does.
    pub fn with_replay_ttl(mut self, replay_ttl: Duration) -> Self {
        self.replay_ttl = replay_ttl;
        self
    }

    /// Configures how often expired replay records are pruned: after
    /// `every` verifications, or once the last sweep is `max_age` old.
    pub fn with_sweep_schedule(mut self, every: u32, max_age: Duration) -> Self {
        self.sweep = SweepSchedule::new(every, max_age);
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

    /// Initializes the replay store backend.
    pub async fn init(&self) -> Result<(), SignError> {
        self.store.init().await
    }

    /// Verifies one inbound URL.
    ///
    /// Returns the validated token and `src` tag on success. Every failure
    /// is terminal for this URL; nothing is retried internally.
    pub async fn verify(&self, url: &str) -> Result<VerifiedUrl, SignError> {
        let mode = self.mode.as_ref().ok_or(SignError::MissingSecret)?;

        let parsed = ParsedUrl::parse(url)?;

        // 1. Freshness window, both directions
        let now = (self.time_provider)()?;
        if is_outside_window(parsed.timestamp, now, self.time_window) {
            debug!(token = %parsed.token, "rejected: timestamp outside window");
            return Err(SignError::Expired);
        }

        // 2. Fast replay check before any crypto work
        if self.store.exists(&parsed.token, &parsed.nonce).await? {
            debug!(token = %parsed.token, "rejected: nonce already consumed");
            return Err(SignError::Replayed);
        }

        // 3. Recompute the signature over everything received except `sig`
        let canonical = canonical_query(&parsed.query_pairs);
        let key = mode.signing_key(&parsed.token)?;
        verify_signature(
            &key,
            parsed.timestamp,
            &parsed.path,
            &canonical,
            &parsed.signature,
        )
        .inspect_err(|_| debug!(token = %parsed.token, "rejected: signature mismatch"))?;

        // 4. Record atomically; a concurrent duplicate loses here
        self.store
            .insert(&parsed.token, &parsed.nonce, self.replay_ttl)
            .await?;

        self.maybe_cleanup(now).await;

        Ok(VerifiedUrl {
            token: parsed.token,
            src: parsed.src,
        })
    }

    /// Prunes expired replay records when the schedule says so. Sweep
    /// failures are logged, never surfaced: the verification already
    /// succeeded.
    async fn maybe_cleanup(&self, now: u64) {
        if self.sweep.after_verification(now) {
            let cutoff = now.saturating_sub(self.replay_ttl.as_secs());
            match self.store.cleanup_expired(cutoff).await {
                Ok(removed) => {
                    self.sweep.record_sweep(now);
                    debug!(removed, "swept expired replay records");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "replay store sweep failed");
                }
            }
        }
    }
}

/// The fields extracted from an inbound URL, before any cryptographic
/// checks.
struct ParsedUrl {
    token: String,
    path: String,
    timestamp: u64,
    nonce: String,
    src: Option<String>,
    signature: String,
    /// All decoded query pairs, in received order, `sig` included
    query_pairs: Vec<(String, String)>,
}

impl ParsedUrl {
    fn parse(url: &str) -> Result<Self, SignError> {
        let parsed =
            Url::parse(url).map_err(|e| SignError::MalformedUrl(format!("unparseable: {e}")))?;

        let token = parsed
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| SignError::MalformedUrl("missing token path segment".to_string()))?;

        let query_pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let first = |name: &str| {
            query_pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        let ts_raw = first("ts")
            .ok_or_else(|| SignError::MalformedUrl("missing ts parameter".to_string()))?;
        let timestamp: u64 = ts_raw
            .parse()
            .map_err(|_| SignError::MalformedUrl("ts is not an integer".to_string()))?;

        let nonce = first("nonce")
            .ok_or_else(|| SignError::MalformedUrl("missing nonce parameter".to_string()))?;
        let signature = first(SIG_KEY)
            .ok_or_else(|| SignError::MalformedUrl("missing sig parameter".to_string()))?;
        let src = first("src");

        Ok(Self {
            token,
            path: parsed.path().to_string(),
            timestamp,
            nonce,
            src,
            signature,
            query_pairs,
        })
    }
}
