use crate::config::Environment;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// `RUST_LOG` filter, defaulting to `info`.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Formatting layer for the given environment. Logs go to stderr so that
/// stdout stays free for usage text.
pub(crate) fn fmt_layer<S>(environment: Environment) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    match environment {
        Environment::Production => tracing_subscriber::fmt::layer()
            .json()
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Environment::Development => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// Also adds an OpenTelemetry layer so spans are exported if a global tracer
/// provider is installed later on.
pub fn setup_logging(environment: Environment) {
    Registry::default()
        .with(env_filter())
        .with(tracing_opentelemetry::layer())
        .with(fmt_layer(environment))
        .init();
}
