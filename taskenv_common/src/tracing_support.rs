//! Logging for the `taskenv` CLI.

use tracing_subscriber::{fmt::Subscriber, prelude::*, EnvFilter};

/// The filter used when `RUST_LOG` is unset or can't be parsed. Only warnings
/// and errors, so a rendered manifest can be piped straight into `kubectl`.
const DEFAULT_FILTER: &str = "warn";

/// Send `tracing` events to stderr, filtered by `RUST_LOG`. Stdout is
/// reserved for the JSON, YAML or table a subcommand prints.
pub fn initialize_tracing() {
    Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .without_time()
        .finish()
        .init();
}

/// Build our filter from `RUST_LOG`, falling back to `DEFAULT_FILTER`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
