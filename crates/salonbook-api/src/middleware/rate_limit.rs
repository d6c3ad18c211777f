//! # Per-Caller Rate Limiting
//!
//! Fixed-window rate limiter keyed by the authenticated caller
//! (`role:actor_id`). Runs after the auth middleware.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;

use crate::auth::CallerIdentity;
use crate::error::{ErrorBody, ErrorDetail};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window. Zero disables limiting.
    pub max_requests: u64,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<String, BucketState>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `key`; `false` once the window is exhausted.
    fn check(&self, key: &str) -> bool {
        if self.config.max_requests == 0 {
            return true;
        }
        let mut buckets = self.buckets.lock();
        let now = Instant::now();

        let bucket = buckets.entry(key.to_string()).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) >= self.config.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }
}

/// Middleware that enforces per-caller rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = request
            .extensions()
            .get::<CallerIdentity>()
            .map(|c| c.actor().to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        if !limiter.check(&key) {
            tracing::warn!(caller = %key, "rate limit exceeded");
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "RATE_LIMITED".to_string(),
                    message: "rate limit exceeded".to_string(),
                    details: None,
                },
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }
    }

    next.run(request).await
}
