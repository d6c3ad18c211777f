//! # Database Persistence Layer
//!
//! PostgreSQL storage via SQLx. [`PgBookingRepository`] implements the
//! repository contract; when no `DATABASE_URL` is configured the server
//! runs on the in-memory repository instead.
//!
//! Migrations are embedded at compile time and applied on connect.

pub mod repository;

pub use repository::PgBookingRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to `url` and apply the embedded migrations.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
