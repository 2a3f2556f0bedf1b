//! Time utilities for safe timestamp handling.
//!
//! Safe alternatives to direct `SystemTime` operations that could panic.

use crate::canary::error::SignError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current timestamp in seconds since the Unix epoch.
///
/// Returns an error instead of panicking if the system clock reports a time
/// before the epoch.
pub(crate) fn current_timestamp() -> Result<u64, SignError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| SignError::CryptoError("system time is before Unix epoch".to_string()))
}

/// Check whether a signing timestamp falls outside the freshness window,
/// in either direction. A drift of exactly `window` seconds is still inside.
pub(crate) fn is_outside_window(timestamp: u64, now: u64, window: Duration) -> bool {
    now.abs_diff(timestamp) > window.as_secs()
}
