use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "carl=info,carl_core=info";
const VERBOSE_FILTER: &str = "carl=debug,carl_core=debug";

/// Initialize logging for the carl server
///
/// The log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=debug carl   (verbose logging)
/// - RUST_LOG=info carl    (default level)
/// - RUST_LOG=error carl   (errors only)
///
/// When RUST_LOG is unset, `verbose` selects debug output for carl's crates.
pub fn init(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}
