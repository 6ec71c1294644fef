//! Telemetry setup for structured logging, OpenTelemetry tracing, and Prometheus metrics.
//!
//! # Features
//! - `otlp` (default): OpenTelemetry OTLP span exporter
//! - `prometheus` (default): Prometheus metrics recorder for the `/metrics` endpoint

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "prometheus")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "otlp")]
use opentelemetry::KeyValue;
#[cfg(feature = "otlp")]
use opentelemetry::trace::TracerProvider as _;
#[cfg(feature = "otlp")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "otlp")]
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider, Tracer as SdkTracer},
};
#[cfg(feature = "otlp")]
use tracing_opentelemetry::OpenTelemetryLayer;

/// Service name reported to trace collectors.
const SERVICE_NAME: &str = "agrisense-service";

/// Noisy dependencies held at a quieter level.
const QUIET_TARGETS: &[&str] = &[
    "sqlx::query=warn",
    "tower=info",
    "hyper=info",
    "h2=info",
    "reqwest=info",
];

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: String,
    /// Use JSON log format
    pub json_logs: bool,
    /// OpenTelemetry OTLP endpoint (optional)
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_logs: true,
            otlp_endpoint: None,
        }
    }
}

/// Active telemetry handles that need graceful shutdown.
pub struct TelemetryGuard {
    #[cfg(feature = "otlp")]
    otel_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush and shut down exporters.
    pub fn shutdown(self) {
        #[cfg(feature = "otlp")]
        if let Some(provider) = self.otel_provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown OpenTelemetry provider: {e}");
            }
        }
    }
}

/// Install the Prometheus recorder and return the handle for `/metrics`.
///
/// # Errors
/// Fails if a recorder is already installed in this process.
#[cfg(feature = "prometheus")]
pub fn init_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}

/// Build the OTLP tracer provider; `None` when no endpoint is configured
/// or the exporter cannot be built.
#[cfg(feature = "otlp")]
fn init_opentelemetry(otlp_endpoint: Option<&str>) -> Option<SdkTracerProvider> {
    let endpoint = otlp_endpoint?;

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(std::time::Duration::from_secs(5))
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("Failed to create OTLP exporter for {endpoint}: {e}");
            return None;
        }
    };

    let resource = Resource::builder()
        .with_attributes([KeyValue::new("service.name", SERVICE_NAME)])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());

    Some(provider)
}

/// Tracing layer exporting spans through `provider`.
#[cfg(feature = "otlp")]
fn otel_layer<S>(provider: &SdkTracerProvider) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME))
}

/// Parse a log level name, defaulting to INFO.
#[must_use]
pub fn parse_level(name: &str) -> Level {
    match name.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn env_filter(level: Level) -> EnvFilter {
    QUIET_TARGETS
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(
            EnvFilter::from_default_env().add_directive(level.into()),
            EnvFilter::add_directive,
        )
}

/// Setup the logging/tracing stack.
///
/// - Console logging (JSON or compact human-readable)
/// - OpenTelemetry tracing (if OTLP endpoint configured)
///
/// Keep the returned guard alive for the process lifetime.
///
/// # Panics
/// Panics if a global subscriber is already installed.
#[must_use]
pub fn setup_telemetry(config: &TelemetryConfig) -> TelemetryGuard {
    let env_filter = env_filter(parse_level(&config.log_level));

    let fmt_layer = if config.json_logs {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
            .compact()
            .boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    #[cfg(feature = "otlp")]
    {
        let otel_provider = init_opentelemetry(config.otlp_endpoint.as_deref());

        if let Some(provider) = &otel_provider {
            registry.with(otel_layer(provider)).init();
        } else {
            registry.init();
        }

        TelemetryGuard { otel_provider }
    }

    #[cfg(not(feature = "otlp"))]
    {
        registry.init();
        TelemetryGuard {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "INFO");
        assert!(config.json_logs);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[cfg(feature = "otlp")]
    #[test]
    fn otel_layer_composes_with_registry() {
        use tracing_subscriber::Registry;

        let provider = SdkTracerProvider::builder().build();
        let subscriber = Registry::default().with(otel_layer(&provider));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info_span!("composed").in_scope(|| {});
        });
        assert!(provider.shutdown().is_ok());
    }

    #[test]
    fn quiet_targets_are_valid_directives() {
        for target in QUIET_TARGETS {
            assert!(target.parse::<Directive>().is_ok(), "{target}");
        }
    }
}
