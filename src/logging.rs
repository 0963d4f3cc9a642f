use crate::types::{FlatAdjError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr `tracing` subscriber.
///
/// `level` is an `EnvFilter` directive such as `info` or `flatadj=debug`; when absent the
/// `RUST_LOG` environment variable is used, falling back to `warn`.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|_| FlatAdjError::Invalid("invalid log filter directive"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|_| FlatAdjError::Invalid("logging already initialized"))
}
