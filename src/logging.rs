use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,sqlx::query=warn";

/// Installs the global subscriber; `log` records are forwarded to it. `RUST_LOG` overrides
/// the default filter.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
