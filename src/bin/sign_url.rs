//! Command-line tool that issues one signed canary URL.
//!
//! Resolves the signing secret from flags or the environment, signs a URL
//! for a (possibly auto-generated) token, and prints it to stdout. Exits
//! non-zero with a descriptive message when no secret is configured.

use anyhow::{Context, bail};
use clap::Parser;
use kanariya_sign::{DEFAULT_BASE_URL, SignError, SignedUrlBuilder, SigningMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kanariya-sign-url")]
#[command(about = "Generate signed Kanariya canary URLs")]
struct Cli {
    /// Base URL the token segment is appended to
    #[arg(long, env = "KANARIYA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Token override; auto-generated when empty
    #[arg(long, default_value = "")]
    token: String,

    /// Optional free-text source tag
    #[arg(long, default_value = "")]
    src: String,

    /// Master secret for per-token derived signing (recommended)
    #[arg(long, env = "MASTER_SECRET", default_value = "")]
    master_secret: String,

    /// Legacy signing secret (fallback if no master secret is set)
    #[arg(long, env = "SIGNING_SECRET", default_value = "")]
    secret: String,

    /// Nonce override; auto-generated when empty
    #[arg(long, default_value = "")]
    nonce: String,

    /// Random bytes per auto-generated token (floor 8)
    #[arg(long, default_value_t = 16)]
    bytes: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();

    let mode = match SigningMode::resolve(
        Some(cli.master_secret.as_bytes()),
        Some(cli.secret.as_bytes()),
    ) {
        Ok(mode) => mode,
        Err(SignError::MissingSecret) => {
            bail!(
                "MASTER_SECRET is required (use --master-secret or env). \
                 Alternatively provide legacy SIGNING_SECRET via --secret."
            );
        }
        Err(e) => return Err(e.into()),
    };

    let mut builder = SignedUrlBuilder::new(mode)
        .with_base_url(cli.base_url)
        .with_token_bytes(cli.bytes)
        .with_src(cli.src);
    if !cli.token.is_empty() {
        builder = builder.with_token(cli.token);
    }
    if !cli.nonce.is_empty() {
        builder = builder.with_nonce(cli.nonce);
    }

    let signed = builder.build().context("failed to sign URL")?;
    println!("{}", signed.url());

    Ok(())
}
