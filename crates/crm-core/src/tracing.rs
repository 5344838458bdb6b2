use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for the stdout tracing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines, for production log shipping.
    Json,
    /// Human-readable lines, for local development.
    Pretty,
}

impl LogFormat {
    /// `production` selects JSON; any other environment name selects pretty output.
    pub fn for_environment(env: &str) -> Self {
        if env.eq_ignore_ascii_case("production") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Initialize stdout tracing. Call once at service startup.
/// Filter comes from `RUST_LOG`, defaulting to `info`.
///
/// Subsequent calls are ignored.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };
}
