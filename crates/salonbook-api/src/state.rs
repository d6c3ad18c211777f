//! # Application State
//!
//! Shared state for the Axum application: the booking and directory
//! services over one repository, server configuration, the Prometheus
//! handle when a recorder is installed, and the database pool when the
//! repository is PostgreSQL.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use salonbook_booking::{
    BookingConfig, BookingRepository, BookingService, DirectoryService, MemoryRepository,
    Notifier, OpContext, TracingNotifier,
};

use crate::middleware::rate_limit::RateLimitConfig;

/// Server configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Shared bearer secret. `None` disables token checking.
    pub auth_token: Option<String>,
    /// Per-caller request budget.
    pub rate_limit: RateLimitConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub directory: DirectoryService,
    pub config: AppConfig,
    pub metrics: Option<PrometheusHandle>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        notifier: Arc<dyn Notifier>,
        booking_config: BookingConfig,
        config: AppConfig,
    ) -> Self {
        let bookings = BookingService::new(Arc::clone(&repo), notifier, Arc::new(booking_config));
        Self {
            bookings: Arc::new(bookings),
            directory: DirectoryService::new(repo),
            config,
            metrics: None,
            db_pool: None,
        }
    }

    /// In-memory repository, logging notifier, default configuration.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(TracingNotifier),
            BookingConfig::default(),
            AppConfig::default(),
        )
    }

    /// Attach the Prometheus handle that `/metrics` renders.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Attach the pool that readiness probes check.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// A per-request operation context.
    pub fn context(&self) -> OpContext {
        self.bookings.context()
    }
}
