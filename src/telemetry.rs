//! Logging and optional OTLP span export.
//!
//! Spans carry the template policy of the running deployment as resource
//! attributes, so traces from services with different dimensions or
//! tolerances can be told apart in the collector.

use std::env;

use once_cell::sync::OnceCell;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app;
use crate::settings::{is_truthy, Settings};

const DEFAULT_FILTER: &str = "biometric_service=info,tower_http=debug";
const TRACER_NAME: &str = "biometric_service";

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Where spans go besides the log output.
#[derive(Debug, PartialEq)]
enum Export {
    Disabled,
    /// `endpoint` of `None` leaves the exporter on its default collector.
    Otlp { endpoint: Option<String> },
}

impl Export {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let forced = lookup("OTEL_ENABLED").is_some_and(|value| is_truthy(&value));

        if forced || endpoint.is_some() {
            Export::Otlp { endpoint }
        } else {
            Export::Disabled
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn resource_attributes(
    settings: &Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<KeyValue> {
    let environment = ["APP_ENV", "RUST_ENV"]
        .iter()
        .find_map(|name| lookup(*name))
        .unwrap_or_else(|| "development".to_string());

    vec![
        KeyValue::new(
            SERVICE_NAME,
            lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| app::SERVICE_NAME.to_string()),
        ),
        KeyValue::new(
            SERVICE_VERSION,
            lookup("APP_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        ),
        KeyValue::new("deployment.environment.name", environment),
        KeyValue::new("biometric.store", settings.store().as_str()),
        KeyValue::new(
            "biometric.template_dimension",
            settings.template_dimension() as i64,
        ),
        KeyValue::new("biometric.match_tolerance", settings.match_tolerance()),
        KeyValue::new(
            "biometric.normalized",
            settings.normalize_range().is_some(),
        ),
    ]
}

fn tracer_provider(
    endpoint: Option<String>,
    settings: &Settings,
) -> Result<SdkTracerProvider, String> {
    let mut builder = opentelemetry_otlp::SpanExporter::builder().with_http();
    if let Some(endpoint) = endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    let exporter = builder.build().map_err(|err| err.to_string())?;

    let resource = Resource::builder()
        .with_attributes(resource_attributes(settings, env_lookup))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Install the global subscriber. OTLP export is enabled by `OTEL_ENABLED`
/// or a non-empty `OTEL_EXPORTER_OTLP_ENDPOINT`; if the exporter cannot be
/// built the service keeps running with log output only.
pub fn init_tracing(settings: &Settings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let mut export_error = None;
    let provider = match Export::from_lookup(env_lookup) {
        Export::Disabled => None,
        Export::Otlp { endpoint } => match tracer_provider(endpoint, settings) {
            Ok(provider) => Some(provider),
            Err(err) => {
                export_error = Some(err);
                None
            }
        },
    };

    let otel_layer = provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer(TRACER_NAME)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    if let Some(provider) = provider {
        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());
        let _ = TRACER_PROVIDER.set(provider);
    }
    if let Some(err) = export_error {
        tracing::warn!("OTLP exporter unavailable, spans are not exported: {err}");
    }
}

/// Flush pending spans. No-op when export is disabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            tracing::warn!("Failed to shutdown tracer provider: {err}");
        }
    }
}
