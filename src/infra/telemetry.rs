use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register metric descriptions with the installed recorder. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "mockup_cache_hit_total",
            Unit::Count,
            "Total number of mockup result cache hits."
        );
        describe_counter!(
            "mockup_cache_miss_total",
            Unit::Count,
            "Total number of mockup result cache misses, including expired entries."
        );
        describe_counter!(
            "mockup_cache_evict_total",
            Unit::Count,
            "Total number of mockup result cache evictions due to capacity."
        );
        describe_histogram!(
            "mockup_transport_request_ms",
            Unit::Milliseconds,
            "Render API request latency in milliseconds."
        );
        describe_counter!(
            "mockup_transport_retry_total",
            Unit::Count,
            "Total number of retried render API requests."
        );
        describe_counter!(
            "mockup_task_total",
            Unit::Count,
            "Total number of render tasks by outcome."
        );
        describe_counter!(
            "mockup_batch_combination_total",
            Unit::Count,
            "Total number of batch style/placement combinations by outcome."
        );
    });
}
