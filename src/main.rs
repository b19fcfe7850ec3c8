use std::{io::Write, process, sync::Arc};

use mockup_engine::{
    application::{BatchConfig, MockupService, PollConfig, error::AppError},
    cache::{CacheConfig, MemoryResultCache},
    config,
    domain::{BatchRequest, RenderRequest},
    infra::{
        error::InfraError,
        renderer::{ApiCredentials, HttpMockupApi, RateLimitedTransport, TransportConfig},
        telemetry,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let service = build_service(&settings)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(&service, *args).await,
        config::Command::Batch(args) => run_batch(&service, args).await,
        config::Command::Styles(args) => {
            let styles = service.product_styles(args.product_id).await?;
            print_json(&styles)
        }
    }
}

fn build_service(settings: &config::Settings) -> Result<MockupService, AppError> {
    let credentials = ApiCredentials::from_settings(&settings.api)?;
    let transport = RateLimitedTransport::new(
        TransportConfig::from_settings(&settings.api, &settings.transport),
        credentials,
    )?;
    let api = Arc::new(HttpMockupApi::new(transport, settings.tasks.format.clone()));
    let cache = Arc::new(MemoryResultCache::new(CacheConfig::from(&settings.cache)));

    info!(
        target = "mockup_engine::main",
        op = "build_service",
        result = "ok",
        base_url = %settings.api.base_url,
        max_requests = settings.transport.max_requests.get(),
        window_seconds = settings.transport.window.as_secs(),
        "Mockup service ready"
    );

    Ok(MockupService::new(
        api,
        cache,
        PollConfig::from(&settings.tasks),
        BatchConfig::from(&settings.batch),
    ))
}

async fn run_render(service: &MockupService, args: config::RenderArgs) -> Result<(), AppError> {
    let design = args.design;
    if design.design_url.trim().is_empty() {
        return Err(AppError::validation("design URL must not be empty"));
    }
    if args.placement.trim().is_empty() {
        return Err(AppError::validation("placement must not be empty"));
    }

    let request = RenderRequest {
        product_id: design.product_id,
        variant_id: design.variant_id,
        design_url: design.design_url,
        placement: args.placement,
        technique: args.technique,
        product_type: args.product_type,
        style_id: args.style_id,
        geometry: design.geometry,
    };

    // Each run starts with an empty in-memory cache, so a forced re-render is
    // only meaningful for long-lived callers of `MockupService::regenerate`.
    let result = service.generate_single(&request).await?;
    print_json(&result)
}

async fn run_batch(service: &MockupService, args: config::BatchArgs) -> Result<(), AppError> {
    let design = args.design;
    if design.design_url.trim().is_empty() {
        return Err(AppError::validation("design URL must not be empty"));
    }

    let request = BatchRequest {
        product_id: design.product_id,
        variant_id: design.variant_id,
        design_url: design.design_url,
        technique: args.technique,
        geometry: design.geometry,
    };

    let result = service.generate_batch(&request).await?;
    print_json(&result)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|err| InfraError::output(err.to_string()))?;
    writeln!(stdout).map_err(InfraError::from)?;
    Ok(())
}
