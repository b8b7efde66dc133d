use std::time::Duration;

use opentelemetry::{
    global,
    trace::{SamplingDecision, SamplingResult, TraceContextExt, TraceState, TracerProvider as _},
    KeyValue,
};
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::{
    metrics::{PeriodicReader, SdkMeterProvider},
    trace::{SdkTracerProvider, ShouldSample},
    Resource,
};
use tracing::Level;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::{Result, VoiceTextError};

const SERVICE_NAME: &str = "voicetext-player";
const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Spans emitted once per PCM chunk are not exported.
const DROPPED_SPANS: [&str; 1] = ["append_pcm"];

#[derive(Debug, Clone)]
struct FilterSampler;

impl ShouldSample for FilterSampler {
    fn should_sample(
        &self,
        parent_context: Option<&opentelemetry::Context>,
        _trace_id: opentelemetry::TraceId,
        name: &str,
        _span_kind: &opentelemetry::trace::SpanKind,
        _attributes: &[KeyValue],
        _links: &[opentelemetry::trace::Link],
    ) -> opentelemetry::trace::SamplingResult {
        let decision = if DROPPED_SPANS.contains(&name) {
            SamplingDecision::Drop
        } else {
            SamplingDecision::RecordAndSample
        };

        SamplingResult {
            decision,
            attributes: vec![],
            trace_state: match parent_context {
                Some(ctx) => ctx.span().span_context().trace_state().clone(),
                None => TraceState::default(),
            },
        }
    }
}

fn resource() -> Resource {
    Resource::builder().with_service_name(SERVICE_NAME).build()
}

/// OTLP/HTTP span and metric pipelines sharing one endpoint.
struct OtelProviders {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
}

impl OtelProviders {
    fn new(url: &str) -> Result<Self> {
        let span_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(url)
            .with_protocol(Protocol::HttpBinary)
            .build()
            .map_err(|e| VoiceTextError::config(format!("OTLP span exporter: {}", e)))?;

        let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_http()
            .with_endpoint(url)
            .with_protocol(Protocol::HttpBinary)
            .build()
            .map_err(|e| VoiceTextError::config(format!("OTLP metric exporter: {}", e)))?;

        let tracer = SdkTracerProvider::builder()
            .with_sampler(FilterSampler)
            .with_resource(resource())
            .with_batch_exporter(span_exporter)
            .build();

        let meter = SdkMeterProvider::builder()
            .with_resource(resource())
            .with_reader(
                PeriodicReader::builder(metric_exporter)
                    .with_interval(METRIC_EXPORT_INTERVAL)
                    .build(),
            )
            .build();
        global::set_meter_provider(meter.clone());

        Ok(Self { tracer, meter })
    }
}

/// Install the global subscriber. Logs go to stderr; spans and metrics are
/// also exported over OTLP/HTTP when `otel_http_url` is set.
pub fn init_tracing_subscriber(otel_http_url: Option<&str>, level: Level) -> Result<OtelGuard> {
    let providers = otel_http_url.map(OtelProviders::new).transpose()?;

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            providers
                .as_ref()
                .map(|p| MetricsLayer::new(p.meter.clone())),
        )
        .with(
            providers
                .as_ref()
                .map(|p| OpenTelemetryLayer::new(p.tracer.tracer(SERVICE_NAME))),
        )
        .try_init()
        .map_err(|e| VoiceTextError::config(format!("Tracing subscriber: {}", e)))?;

    Ok(OtelGuard { providers })
}

/// Flushes and shuts down the OTLP pipelines when dropped.
pub struct OtelGuard {
    providers: Option<OtelProviders>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        let Some(providers) = self.providers.take() else {
            return;
        };
        if let Err(e) = providers.tracer.shutdown() {
            eprintln!("Failed to shut down tracer provider: {}", e);
        }
        if let Err(e) = providers.meter.shutdown() {
            eprintln!("Failed to shut down meter provider: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::SpanKind;

    use super::*;

    fn decision(name: &str) -> SamplingDecision {
        FilterSampler
            .should_sample(
                None,
                opentelemetry::TraceId::from(1u128),
                name,
                &SpanKind::Internal,
                &[],
                &[],
            )
            .decision
    }

    #[test]
    fn test_sampler_drops_chunk_spans() {
        assert_eq!(decision("append_pcm"), SamplingDecision::Drop);
        assert_eq!(decision("run"), SamplingDecision::RecordAndSample);
    }

    #[test]
    fn test_subscriber_installs_once() {
        let guard = init_tracing_subscriber(None, Level::DEBUG).unwrap();
        assert!(guard.providers.is_none());

        assert!(matches!(
            init_tracing_subscriber(None, Level::INFO),
            Err(VoiceTextError::Config(_))
        ));
    }
}
