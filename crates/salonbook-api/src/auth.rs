//! # Authentication Middleware
//!
//! Bearer tokens carry the caller's role and actor id:
//!
//! ```text
//! Bearer {role}:{actor_id}:{secret}
//! ```
//!
//! `role` is `client`, `hairdresser` or `admin`; `actor_id` is the client
//! or hairdresser id (any UUID for admins). The `system` role is internal
//! to the expiry sweep and is never accepted from a token.
//!
//! When no secret is configured (development mode) the `{role}:{actor_id}`
//! prefix is trusted as-is and a request without a header acts as admin.
//!
//! Every authenticated request gets a [`CallerIdentity`] in its extensions.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use salonbook_state::{Actor, ActorRole};

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Actor);

impl CallerIdentity {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer secrets.
///
/// Performs a dummy comparison on length mismatch so timing does not leak
/// whether the lengths matched.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{role}:{actor_id}:{secret}`.
///
/// With `expected_secret == None` the secret segment is optional and not
/// checked.
pub fn parse_bearer_token(provided: &str, expected_secret: Option<&str>) -> Result<Actor, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    let (role_str, id_str) = match (parts.as_slice(), expected_secret) {
        ([role, id, secret], Some(expected)) => {
            if !constant_time_token_eq(secret, expected) {
                return Err("invalid bearer token".into());
            }
            (*role, *id)
        }
        ([role, id, _], None) | ([role, id], None) => (*role, *id),
        _ => return Err("invalid token format, expected {role}:{actor_id}:{secret}".into()),
    };

    let role = match ActorRole::from_name(role_str) {
        Some(ActorRole::System) | None => return Err(format!("unknown role: {role_str}")),
        Some(role) => role,
    };
    let id = id_str
        .parse::<Uuid>()
        .map_err(|e| format!("invalid actor_id: {e}"))?;
    Ok(Actor::new(id, role))
}

/// Resolve the caller from the `Authorization` header and inject a
/// [`CallerIdentity`], or answer 401.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let resolved = match (header_value, expected) {
        (Some(value), expected) => match value.strip_prefix("Bearer ") {
            Some(token) => parse_bearer_token(token, expected.as_deref()),
            None => Err("authorization header must use Bearer scheme".to_string()),
        },
        (None, Some(_)) => Err("missing authorization header".to_string()),
        (None, None) => Ok(Actor::admin(Uuid::nil())),
    };

    match resolved {
        Ok(actor) => {
            request.extensions_mut().insert(CallerIdentity(actor));
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthorized_response(&msg)
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(caller: CallerIdentity) -> String {
        caller.actor().to_string()
    }

    fn test_app(token: Option<&str>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig {
                token: token.map(String::from),
            }))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn parses_role_and_id() {
        let id = Uuid::new_v4();
        let actor = parse_bearer_token(&format!("hairdresser:{id}:s3cret"), Some("s3cret")).unwrap();
        assert_eq!(actor, Actor::new(id, ActorRole::Hairdresser));
    }

    #[test]
    fn rejects_wrong_secret_and_system_role() {
        let id = Uuid::new_v4();
        assert!(parse_bearer_token(&format!("client:{id}:nope"), Some("s3cret")).is_err());
        assert!(parse_bearer_token(&format!("system:{id}:s3cret"), Some("s3cret")).is_err());
        assert!(parse_bearer_token("s3cret", Some("s3cret")).is_err());
        assert!(parse_bearer_token("client:not-a-uuid:s3cret", Some("s3cret")).is_err());
    }

    #[test]
    fn secret_optional_in_dev_mode() {
        let id = Uuid::new_v4();
        let actor = parse_bearer_token(&format!("client:{id}"), None).unwrap();
        assert_eq!(actor.role, ActorRole::Client);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = AuthConfig {
            token: Some("hunter2".into()),
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let id = Uuid::new_v4();
        let (status, body) = call(
            test_app(Some("s3cret")),
            Some(&format!("Bearer client:{id}:s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("client:{id}"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized_when_secret_set() {
        let (status, _) = call(test_app(Some("s3cret")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let (status, _) = call(test_app(Some("s3cret")), Some("Basic abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dev_mode_without_header_is_admin() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("admin:"));
    }
}
