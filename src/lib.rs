//! Tokengate — request-time JWT authentication gate.
//!
//! Validates short-lived access tokens on every request, transparently
//! rotates them via longer-lived refresh tokens, and sweeps stale
//! refresh-token state daily. Re-exports the modules needed by the
//! integration tests in `tests/`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};

use errors::AppError;
use jwt::TokenCodec;
use models::AuthenticatedPrincipal;
use store::RefreshStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub codec: TokenCodec,
    pub store: Arc<dyn RefreshStore>,
    pub config: config::Config,
}

/// Assemble the HTTP surface: health endpoint, the sample protected route,
/// and the auth gate wrapped around everything.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gate::auth_gate,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Sample downstream handler: echoes the principal the gate bound to the
/// request, or 401 when none was attached (anonymous pass-through).
async fn whoami(
    principal: Option<Extension<AuthenticatedPrincipal>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Extension(principal) = principal.ok_or(AppError::Unauthenticated)?;
    Ok(Json(serde_json::json!({
        "userId": principal.user_id,
        "roles": principal.roles,
    })))
}

/// Middleware: injects a unique X-Request-Id into every response so clients
/// can correlate errors with gate logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
