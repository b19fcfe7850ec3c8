use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::domain::{PlacementGeometry, Technique};

/// Command-line arguments for the mockup engine binary.
#[derive(Debug, Parser)]
#[command(
    name = "mockup-engine",
    version,
    about = "Render and cache product mockups"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MOCKUP_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render one mockup, reusing a cached result when available.
    Render(Box<RenderArgs>),
    /// Render every compatible style and placement of a product.
    Batch(BatchArgs),
    /// List the presentation styles offered for a product.
    Styles(StylesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DesignArgs {
    /// Catalog product identifier.
    #[arg(long = "product-id", value_name = "ID")]
    pub product_id: u64,

    /// Variant (size/color) to render.
    #[arg(long = "variant-id", value_name = "ID")]
    pub variant_id: u64,

    /// Publicly reachable URL of the design image.
    #[arg(long = "design-url", value_name = "URL")]
    pub design_url: String,

    /// Design position as WIDTH,HEIGHT,TOP,LEFT pixels at 150 DPI.
    #[arg(long = "geometry", value_name = "W,H,T,L")]
    pub geometry: Option<PlacementGeometry>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub design: DesignArgs,

    /// Placement code, e.g. `front` or `embroidery_chest_left`.
    #[arg(long = "placement", value_name = "CODE")]
    pub placement: String,

    /// Printing technique; derived from placement and product type when omitted.
    #[arg(long = "technique", value_name = "TECHNIQUE")]
    pub technique: Option<Technique>,

    /// Product type label used for the default technique (t-shirt, hat, mug...).
    #[arg(long = "product-type", value_name = "LABEL")]
    pub product_type: Option<String>,

    /// Presentation style to request.
    #[arg(long = "style-id", value_name = "ID")]
    pub style_id: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub design: DesignArgs,

    /// Printing technique every combination is rendered with.
    #[arg(long = "technique", value_name = "TECHNIQUE")]
    pub technique: Technique,
}

#[derive(Debug, Args, Clone)]
pub struct StylesArgs {
    /// Catalog product identifier.
    #[arg(long = "product-id", value_name = "ID")]
    pub product_id: u64,
}

/// Settings that can be overridden for any command.
#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the render API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Render API key.
    #[arg(
        long = "api-key",
        env = "MOCKUP_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,

    /// Render API store identifier.
    #[arg(long = "store-id", env = "MOCKUP_STORE_ID", value_name = "ID", global = true)]
    pub store_id: Option<u64>,

    /// Override the per-request timeout.
    #[arg(long = "api-request-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_request_timeout_seconds: Option<u64>,

    /// Override the outbound request ceiling per window.
    #[arg(long = "transport-max-requests", value_name = "COUNT", global = true)]
    pub transport_max_requests: Option<u64>,

    /// Override the outbound rate window size.
    #[arg(long = "transport-window-seconds", value_name = "SECONDS", global = true)]
    pub transport_window_seconds: Option<u64>,

    /// Override the number of in-flight outbound requests.
    #[arg(long = "transport-max-concurrency", value_name = "COUNT", global = true)]
    pub transport_max_concurrency: Option<u64>,

    /// Override the number of attempts for rate-limited requests.
    #[arg(long = "transport-max-attempts", value_name = "COUNT", global = true)]
    pub transport_max_attempts: Option<u64>,

    /// Override the task polling interval.
    #[arg(long = "tasks-poll-interval-ms", value_name = "MS", global = true)]
    pub tasks_poll_interval_ms: Option<u64>,

    /// Override the number of polls before a task is abandoned.
    #[arg(long = "tasks-poll-attempts", value_name = "COUNT", global = true)]
    pub tasks_poll_attempts: Option<u64>,

    /// Override the delay between batch submissions.
    #[arg(long = "batch-inter-request-delay-ms", value_name = "MS", global = true)]
    pub batch_inter_request_delay_ms: Option<u64>,

    /// Override the result cache time-to-live.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the result cache capacity.
    #[arg(long = "cache-capacity", value_name = "COUNT", global = true)]
    pub cache_capacity: Option<usize>,
}
