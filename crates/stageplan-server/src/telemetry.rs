use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const SERVICE_NAME: &str = "stageplan-server";

/// Flushes and shuts down OTel providers on drop.
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("failed to shut down tracer provider: {e}");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("failed to shut down meter provider: {e}");
        }
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("failed to shut down logger provider: {e}");
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn resource() -> Resource {
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    Resource::builder()
        .with_attributes([
            KeyValue::new(
                opentelemetry_semantic_conventions::attribute::SERVICE_NAME,
                service_name,
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::attribute::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            ),
        ])
        .build()
}

/// Build OTLP exporters for traces, metrics and logs.
///
/// Endpoints and headers come from the standard `OTEL_EXPORTER_OTLP_*`
/// variables; the SDK appends `/v1/traces` etc. itself.
fn build_providers() -> Result<TelemetryGuard, String> {
    let resource = resource();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .build()
        .map_err(|e| format!("trace exporter: {e}"))?;
    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .build()
        .map_err(|e| format!("metric exporter: {e}"))?;
    let metric_reader = PeriodicReader::builder(metric_exporter)
        .with_interval(std::time::Duration::from_secs(15))
        .build();
    let meter_provider = SdkMeterProvider::builder()
        .with_reader(metric_reader)
        .with_resource(resource.clone())
        .build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_http()
        .build()
        .map_err(|e| format!("log exporter: {e}"))?;
    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok(TelemetryGuard {
        tracer_provider,
        meter_provider,
        logger_provider,
    })
}

/// Initialise telemetry.
///
/// With `OTEL_EXPORTER_OTLP_ENDPOINT` set, traces, metrics and logs are
/// exported via OTLP HTTP/protobuf next to console logging. Otherwise, or
/// when the exporters cannot be built, only console `fmt` logging is on.
///
/// The returned guard must be held until the end of `main`.
pub fn init_telemetry() -> Option<TelemetryGuard> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        init_console();
        return None;
    };

    let guard = match build_providers() {
        Ok(guard) => guard,
        Err(e) => {
            init_console();
            tracing::warn!(error = %e, "OpenTelemetry disabled");
            return None;
        }
    };

    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![Box::new(
        TraceContextPropagator::new(),
    )]));
    global::set_meter_provider(guard.meter_provider.clone());

    let tracer = guard.tracer_provider.tracer(SERVICE_NAME);
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(OpenTelemetryLayer::new(tracer))
        .with(MetricsLayer::new(guard.meter_provider.clone()))
        .with(OpenTelemetryTracingBridge::new(&guard.logger_provider))
        .init();

    tracing::info!("OpenTelemetry enabled, exporting to {endpoint}");
    Some(guard)
}

fn init_console() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Register observable gauges reporting the DB connection pool state.
///
/// Safe to call without OTel: the callbacks are then never invoked.
pub fn spawn_db_pool_metrics(pool: sqlx::PgPool) {
    let meter = global::meter(SERVICE_NAME);

    let pool_total = pool.clone();
    let _total_gauge = meter
        .u64_observable_gauge("db.pool.connections")
        .with_description("Total connections in the database pool")
        .with_callback(move |observer| {
            observer.observe(u64::from(pool_total.size()), &[]);
        })
        .build();

    let _idle_gauge = meter
        .u64_observable_gauge("db.pool.idle_connections")
        .with_description("Idle connections in the database pool")
        .with_callback(move |observer| {
            observer.observe(pool.num_idle() as u64, &[]);
        })
        .build();
}
