//! Tracing pipeline for the `simbridge` binary.
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL. When set, spans are exported over OTLP/HTTP. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `SIMBRIDGE_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Hold the returned guard until the process exits; dropping it flushes
/// pending spans.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("SIMBRIDGE_LOG_FORMAT").as_deref() == Ok("json");

    let provider = build_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("simbridge")));

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);
    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .init();
    }

    TracerProviderGuard(provider)
}

/// Shuts the [`SdkTracerProvider`] down on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[simbridge] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// `None` when `OTEL_EXPORTER_OTLP_ENDPOINT` is unset or the exporter
/// cannot be built.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[simbridge] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // Simple exporter: tracing is initialised before the Tokio runtime exists.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
