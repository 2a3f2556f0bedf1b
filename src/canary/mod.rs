// Core signing pipeline
mod builder;
mod canonical;
mod config;
mod error;
mod key;
mod signer;
mod time_utils;
mod token;
mod verifier;

// Replay storage and sweep scheduling
pub mod storage;
pub mod sweep;

// Core exports
pub use builder::{SignedUrlBuilder, TimeProviderFn, TokenGeneratorFn};
pub use canonical::{SIG_KEY, canonical_query};
pub use config::{ConfigPreset, DEFAULT_BASE_URL, VerifierConfig};
pub use error::SignError;
pub use key::SigningMode;
pub use signer::{sign, string_to_sign, verify_signature};
pub use token::{DEFAULT_TOKEN_BYTES, MIN_TOKEN_BYTES, generate_nonce, generate_token};
pub use verifier::{UrlVerifier, VerifiedUrl};

// Storage and sweep exports
pub use storage::{MemoryStore, ReplayEntry, ReplayStore, StoreStats};
pub use sweep::SweepSchedule;
