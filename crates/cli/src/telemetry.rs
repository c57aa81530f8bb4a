//! Subscriber and OpenTelemetry wiring.

use anyhow::Context;
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::TracerProvider, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LoggingSection, TelemetrySection};

/// Identifies this process to the collector.
fn service_resource(telemetry: &TelemetrySection) -> Resource {
    Resource::new([
        KeyValue::new("service.name", telemetry.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}

/// Installs the global subscriber. Returns the tracer provider when OTLP
/// export is configured; the caller shuts it down on exit.
pub fn init(
    logging: &LoggingSection,
    telemetry: &TelemetrySection,
    level_override: Option<&str>,
) -> anyhow::Result<Option<TracerProvider>> {
    let filter = match level_override {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&logging.level))
            .context("invalid logging.level")?,
    };

    let provider = match telemetry.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .context("building OTLP span exporter")?;
            Some(
                TracerProvider::builder()
                    .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
                    .with_resource(service_resource(telemetry))
                    .build(),
            )
        }
        None => None,
    };
    let otel = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(telemetry.service_name.clone()))
    });

    let registry = tracing_subscriber::registry().with(filter).with(otel);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("installing tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("installing tracing subscriber")?;
    }
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use opentelemetry::{Key, Value};

    use super::*;

    #[test]
    fn resource_names_the_service() {
        let telemetry = TelemetrySection {
            otlp_endpoint: None,
            service_name: "portal-staging".to_string(),
        };
        let resource = service_resource(&telemetry);
        assert_eq!(
            resource.get(Key::new("service.name")),
            Some(Value::from("portal-staging"))
        );
    }
}
