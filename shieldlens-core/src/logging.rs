use tracing_subscriber::{EnvFilter, fmt};

/// Initialize structured logging.
///
/// Level filtering comes from `RUST_LOG` (default "info"). Events are written
/// as flattened JSON to stderr so they never interleave with the dashboard
/// drawn on stdout.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .flatten_event(true)
        .init();
}
