//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{BatchArgs, CliArgs, Command, DesignArgs, RenderArgs, RuntimeOverrides, StylesArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mockup";
const ENV_PREFIX: &str = "MOCKUP";
const DEFAULT_API_BASE_URL: &str = "https://api.printful.com/v2/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WINDOW_SECS: u64 = 60;
const DEFAULT_MAX_REQUESTS: u64 = 120;
const DEFAULT_MAX_CONCURRENCY: u64 = 2;
const DEFAULT_MIN_SPACING_MS: u64 = 250;
const DEFAULT_MAX_ATTEMPTS: u64 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_POLL_ATTEMPTS: u64 = 90;
const DEFAULT_TASK_FORMAT: &str = "png";
const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 1_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_CACHE_CAPACITY: usize = 2_048;
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const TASK_FORMATS: &[&str] = &["png", "jpg"];

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub transport: TransportSettings,
    pub tasks: TaskSettings,
    pub batch: BatchSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Render API endpoint and credentials. Credentials are checked when the
/// transport is built, not here, so commands that never call out still load.
#[derive(Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub store_id: Option<u64>,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("store_id", &self.store_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub window: Duration,
    pub max_requests: NonZeroU32,
    pub max_concurrency: NonZeroU32,
    pub min_spacing: Duration,
    pub max_attempts: NonZeroU32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub poll_interval: Duration,
    pub poll_attempts: NonZeroU32,
    pub format: String,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub inter_request_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub capacity: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    api: RawApiSettings,
    transport: RawTransportSettings,
    tasks: RawTaskSettings,
    batch: RawBatchSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.api.api_key = Some(key.clone());
        }
        if let Some(store_id) = overrides.store_id {
            self.api.store_id = Some(store_id);
        }
        if let Some(seconds) = overrides.api_request_timeout_seconds {
            self.api.request_timeout_seconds = Some(seconds);
        }
        if let Some(max) = overrides.transport_max_requests {
            self.transport.max_requests = Some(max);
        }
        if let Some(window) = overrides.transport_window_seconds {
            self.transport.window_seconds = Some(window);
        }
        if let Some(max) = overrides.transport_max_concurrency {
            self.transport.max_concurrency = Some(max);
        }
        if let Some(max) = overrides.transport_max_attempts {
            self.transport.max_attempts = Some(max);
        }
        if let Some(ms) = overrides.tasks_poll_interval_ms {
            self.tasks.poll_interval_ms = Some(ms);
        }
        if let Some(attempts) = overrides.tasks_poll_attempts {
            self.tasks.poll_attempts = Some(attempts);
        }
        if let Some(ms) = overrides.batch_inter_request_delay_ms {
            self.batch.inter_request_delay_ms = Some(ms);
        }
        if let Some(seconds) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(seconds);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            api,
            transport,
            tasks,
            batch,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            api: build_api_settings(api)?,
            transport: build_transport_settings(transport)?,
            tasks: build_task_settings(tasks)?,
            batch: build_batch_settings(batch),
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let raw_url = api
        .base_url
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("api.base_url", format!("invalid URL: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "api.base_url",
            "scheme must be http or https",
        ));
    }

    let api_key = api.api_key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });
    if api.store_id == Some(0) {
        return Err(LoadError::invalid(
            "api.store_id",
            "must be greater than zero",
        ));
    }

    let timeout_secs = api
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    Ok(ApiSettings {
        base_url,
        api_key,
        store_id: api.store_id,
        request_timeout: positive_duration(
            Duration::from_secs(timeout_secs),
            "api.request_timeout_seconds",
        )?,
    })
}

fn build_transport_settings(
    transport: RawTransportSettings,
) -> Result<TransportSettings, LoadError> {
    let window_secs = transport.window_seconds.unwrap_or(DEFAULT_WINDOW_SECS);
    let backoff_base_ms = transport
        .backoff_base_ms
        .unwrap_or(DEFAULT_BACKOFF_BASE_MS);
    let backoff_max_ms = transport.backoff_max_ms.unwrap_or(DEFAULT_BACKOFF_MAX_MS);
    if backoff_max_ms < backoff_base_ms {
        return Err(LoadError::invalid(
            "transport.backoff_max_ms",
            "must not be smaller than transport.backoff_base_ms",
        ));
    }

    Ok(TransportSettings {
        window: positive_duration(Duration::from_secs(window_secs), "transport.window_seconds")?,
        max_requests: non_zero_u32(
            transport.max_requests.unwrap_or(DEFAULT_MAX_REQUESTS),
            "transport.max_requests",
        )?,
        max_concurrency: non_zero_u32(
            transport.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            "transport.max_concurrency",
        )?,
        min_spacing: Duration::from_millis(
            transport.min_spacing_ms.unwrap_or(DEFAULT_MIN_SPACING_MS),
        ),
        max_attempts: non_zero_u32(
            transport.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            "transport.max_attempts",
        )?,
        backoff_base: positive_duration(
            Duration::from_millis(backoff_base_ms),
            "transport.backoff_base_ms",
        )?,
        backoff_max: Duration::from_millis(backoff_max_ms),
    })
}

fn build_task_settings(tasks: RawTaskSettings) -> Result<TaskSettings, LoadError> {
    let interval_ms = tasks.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    let format = tasks
        .format
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_TASK_FORMAT.to_string());
    if !TASK_FORMATS.contains(&format.as_str()) {
        return Err(LoadError::invalid(
            "tasks.format",
            format!("expected one of {}", TASK_FORMATS.join(", ")),
        ));
    }

    Ok(TaskSettings {
        poll_interval: positive_duration(
            Duration::from_millis(interval_ms),
            "tasks.poll_interval_ms",
        )?,
        poll_attempts: non_zero_u32(
            tasks.poll_attempts.unwrap_or(DEFAULT_POLL_ATTEMPTS),
            "tasks.poll_attempts",
        )?,
        format,
    })
}

fn build_batch_settings(batch: RawBatchSettings) -> BatchSettings {
    BatchSettings {
        inter_request_delay: Duration::from_millis(
            batch
                .inter_request_delay_ms
                .unwrap_or(DEFAULT_INTER_REQUEST_DELAY_MS),
        ),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_secs = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            format!("must not exceed {MAX_CACHE_TTL_SECS} (one year)"),
        ));
    }
    let capacity = NonZeroUsize::new(cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY))
        .ok_or_else(|| LoadError::invalid("cache.capacity", "must be greater than zero"))?;

    Ok(CacheSettings {
        ttl: positive_duration(Duration::from_secs(ttl_secs), "cache.ttl_seconds")?,
        capacity,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    store_id: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTransportSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
    max_concurrency: Option<u64>,
    min_spacing_ms: Option<u64>,
    max_attempts: Option<u64>,
    backoff_base_ms: Option<u64>,
    backoff_max_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTaskSettings {
    poll_interval_ms: Option<u64>,
    poll_attempts: Option<u64>,
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBatchSettings {
    inter_request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
    capacity: Option<usize>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive_duration(value: Duration, key: &'static str) -> Result<Duration, LoadError> {
    if value.is_zero() {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}
