//! # salonbook-api — Binary Entry Point
//!
//! Starts the Axum HTTP server and, unless disabled, the expiry sweeper.
//! Uses PostgreSQL when `DATABASE_URL` is set, the in-memory repository
//! otherwise.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use salonbook_api::db::{self, PgBookingRepository};
use salonbook_api::middleware::rate_limit::RateLimitConfig;
use salonbook_api::{AppConfig, AppState};
use salonbook_booking::{
    spawn_expiry_sweeper, BookingConfig, BookingRepository, MemoryRepository, TracingNotifier,
};

/// salonbook booking API server.
#[derive(Parser, Debug)]
#[command(name = "salonbook-api", version, about)]
struct ServerArgs {
    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// PostgreSQL connection string. In-memory storage when absent.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Bearer secret. Development mode (no secret check) when absent.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Requests per caller per minute. Zero disables rate limiting.
    #[arg(long, env = "SALONBOOK_RATE_LIMIT", default_value_t = 1000)]
    rate_limit: u64,

    /// Emit JSON log lines.
    #[arg(long, env = "LOG_FORMAT_JSON", default_value_t = false)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json);

    let booking_config = BookingConfig::from_env().map_err(|e| {
        tracing::error!("Invalid booking configuration: {e}");
        e
    })?;

    let recorder = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let pool = match &args.database_url {
        Some(url) => Some(db::init_pool(url).await.map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?),
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 State will not survive restarts."
            );
            None
        }
    };
    let repo: Arc<dyn BookingRepository> = match &pool {
        Some(pool) => Arc::new(PgBookingRepository::new(pool.clone())),
        None => Arc::new(MemoryRepository::new()),
    };

    let config = AppConfig {
        auth_token: args.auth_token.clone(),
        rate_limit: RateLimitConfig {
            max_requests: args.rate_limit,
            window: Duration::from_secs(60),
        },
    };
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, bearer secrets are not checked");
    }

    let sweep_interval = booking_config.sweep_interval;
    let mut state = AppState::new(repo, Arc::new(TracingNotifier), booking_config, config)
        .with_metrics(recorder);
    if let Some(pool) = pool {
        state = state.with_db_pool(pool);
    }

    let shutdown = CancellationToken::new();
    let sweeper = if sweep_interval.is_zero() {
        tracing::info!("expiry sweeper disabled");
        None
    } else {
        Some(spawn_expiry_sweeper(
            Arc::clone(&state.bookings),
            sweep_interval,
            shutdown.clone(),
        ))
    };

    let app = salonbook_api::app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("salonbook API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
            tracing::info!("shutdown requested");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::warn!("expiry sweeper ended abnormally: {e}");
        }
    }
    Ok(())
}
