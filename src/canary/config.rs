use std::time::Duration;

/// Default base URL for issued canary URLs.
pub const DEFAULT_BASE_URL: &str = "https://kanariya.toppymicros.com/canary";

/// Predefined configuration presets for common deployment scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production defaults.
    ///
    /// - Freshness window: 5 minutes (tolerates clock skew either direction)
    /// - Replay TTL: 10 minutes
    Production,

    /// Relaxed settings for local development and debugging.
    ///
    /// - Freshness window: 10 minutes
    /// - Replay TTL: 20 minutes
    Development,

    /// Strict timing for high-security deployments.
    ///
    /// - Freshness window: 1 minute
    /// - Replay TTL: 2 minutes
    HighSecurity,

    /// Read configuration from environment variables:
    /// - `KANARIYA_TIME_WINDOW`: freshness window in seconds (default: 300)
    /// - `KANARIYA_REPLAY_TTL`: replay record TTL in seconds (default: 600)
    FromEnv,
}

/// Timing configuration for the URL verifier.
///
/// # Example
///
/// ```rust
/// use kanariya_sign::{ConfigPreset, VerifierConfig};
/// use std::time::Duration;
///
/// let config = VerifierConfig::from(ConfigPreset::Production);
/// assert_eq!(config.time_window, Duration::from_secs(300));
///
/// let custom = VerifierConfig {
///     time_window: Duration::from_secs(120),
///     replay_ttl: Duration::from_secs(240),
/// };
/// assert!(custom.validate().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Maximum allowed drift between signing time and verification time,
    /// in either direction.
    pub time_window: Duration,
    /// How long consumed `(token, nonce)` pairs stay in the replay store.
    pub replay_ttl: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            time_window: Duration::from_secs(
                std::env::var("KANARIYA_TIME_WINDOW")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            replay_ttl: Duration::from_secs(
                std::env::var("KANARIYA_REPLAY_TTL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

impl VerifierConfig {
    /// Validates the configuration and returns human-readable warnings for
    /// questionable settings. An empty vector means no concerns.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.time_window.as_secs() < 30 {
            warnings.push(
                "very short freshness window (< 30 seconds) may reject legitimate clock skew"
                    .to_string(),
            );
        }
        if self.time_window.as_secs() > 3600 {
            warnings.push(
                "long freshness window (> 1 hour) widens the replay exposure".to_string(),
            );
        }

        if self.replay_ttl < self.time_window {
            warnings.push(
                "replay TTL shorter than the freshness window allows replays of still-fresh URLs"
                    .to_string(),
            );
        }

        warnings
    }

    /// Returns a one-line summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "VerifierConfig {{ time window: {}s, replay TTL: {}s }}",
            self.time_window.as_secs(),
            self.replay_ttl.as_secs(),
        )
    }
}

impl From<ConfigPreset> for VerifierConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self {
                time_window: Duration::from_secs(300),
                replay_ttl: Duration::from_secs(600),
            },
            ConfigPreset::Development => Self {
                time_window: Duration::from_secs(600),
                replay_ttl: Duration::from_secs(1200),
            },
            ConfigPreset::HighSecurity => Self {
                time_window: Duration::from_secs(60),
                replay_ttl: Duration::from_secs(120),
            },
            ConfigPreset::FromEnv => Self::default(),
        }
    }
}
