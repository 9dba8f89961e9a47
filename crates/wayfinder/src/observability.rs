//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level. With the `observability`
//! feature, spans are also exported through OpenTelemetry's stdout exporter.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use wayfinder_core::LoggingSettings;

/// Log output options resolved from configuration and CLI flags.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Options from the `[logging]` section.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: settings.level().clone(),
            json_logs: *settings.json(),
        }
    }

    /// Force debug output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error>> {
        Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.log_level))?)
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        if self.json_logs {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer().with_target(false).boxed()
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log filter does not parse or a subscriber is
/// already installed.
#[cfg(not(feature = "observability"))]
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.fmt_layer())
        .try_init()?;
    Ok(())
}

/// Install the global subscriber with an OpenTelemetry bridge.
///
/// # Errors
///
/// Returns an error if the log filter does not parse or a subscriber is
/// already installed.
#[cfg(feature = "observability")]
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes(vec![KeyValue::new(
            "service.version",
            config.service_version.clone(),
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(config.service_name.clone());
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.fmt_layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_level() {
        let settings = LoggingSettings::default();
        let config = ObservabilityConfig::from_settings(&settings);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.verbose(true).log_level, "debug");
    }
}
