use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vf_api::{app::create_app, bootstrap::build_state};
use vf_shared::config::{AppConfig, LogFormat, LoggingConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.logging);

    tracing::info!(environment = %config.environment, "Starting Verifly API server");

    let state = web::Data::new(build_state(&config).await?);
    let shutdown = state.shutdown.clone();
    let database = state.database.clone();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server will bind to: {}", bind_address);

    let app_state = state.clone();
    let mut server = HttpServer::new(move || create_app(app_state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let server = server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run();

    // In-flight requests observe cancellation before their next write
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    server.await.context("server error")?;

    shutdown.cancel();
    if let Some(pool) = database {
        pool.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let with_location = logging.source_location;

    match logging.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(with_location)
                    .with_line_number(with_location),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(with_location)
                    .with_line_number(with_location),
            )
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_file(with_location)
                    .with_line_number(with_location),
            )
            .init(),
    }
}
