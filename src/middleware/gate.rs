//! Request authentication gate.
//!
//! Every inbound request passes through here before any handler runs:
//! 1. Bypass-listed paths and token-less requests forward unauthenticated.
//! 2. A valid access token yields a principal bound to the request.
//! 3. An expired access token enters the reissue sub-flow: with a valid,
//!    stored refresh token the response is `200` carrying a fresh access
//!    token (header + JSON body) and the request is NOT forwarded — the
//!    client retries with the new token. Without one, `401`.
//!
//! The decision itself is a plain value ([`GateDecision`]) so the state
//! machine is testable without any transport; [`auth_gate`] is the thin
//! axum adapter that maps decisions onto responses.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::jwt::{TokenCategory, TokenCodec, TokenError};
use crate::models::{AuthenticatedPrincipal, Role};
use crate::store::RefreshStore;
use crate::AppState;

pub const ACCESS_HEADER: &str = "access";
pub const REFRESH_HEADER: &str = "refresh";

const REFRESH_REJECTED: &str =
    "Access token expired and no valid refresh token. Please login again.";
const REISSUE_FAILED: &str = "Failed to issue new access token.";

/// Terminal outcome of evaluating one request.
#[derive(Debug)]
pub enum GateDecision {
    /// Forward downstream, with a principal when valid credentials were
    /// presented and `None` for bypass/anonymous pass-through.
    Forward(Option<AuthenticatedPrincipal>),
    /// Terminate with the given status and a plain-text diagnostic.
    Reject {
        status: StatusCode,
        message: String,
    },
    /// Terminate with `200` and a freshly minted access token; the client
    /// must resend the original request with it.
    Reissue { access_token: String },
}

impl GateDecision {
    fn reject(status: StatusCode, message: &str) -> Self {
        GateDecision::Reject {
            status,
            message: message.to_string(),
        }
    }
}

/// Run the per-request decision procedure. Never lets a token failure
/// escape: every branch ends in a definite decision.
pub async fn evaluate(
    codec: &TokenCodec,
    store: &dyn RefreshStore,
    bypass_paths: &[String],
    access_ttl: chrono::Duration,
    path: &str,
    access: Option<&str>,
    refresh: Option<&str>,
) -> GateDecision {
    if bypass_paths.iter().any(|p| p == path) {
        return GateDecision::Forward(None);
    }

    let Some(access) = access else {
        tracing::debug!(path, "no access token presented, forwarding unauthenticated");
        return GateDecision::Forward(None);
    };

    let claims = match codec.decode(access) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            tracing::debug!(path, "access token expired, entering reissue sub-flow");
            return reissue(codec, store, access_ttl, refresh).await;
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "rejecting malformed access token");
            return GateDecision::reject(StatusCode::UNAUTHORIZED, "malformed access token.");
        }
    };

    if claims.category != TokenCategory::Access {
        tracing::warn!(
            path,
            category = claims.category.as_str(),
            "rejecting token with non-access category"
        );
        return GateDecision::reject(StatusCode::UNAUTHORIZED, "invalid access token category.");
    }

    let role = match claims.role.parse::<Role>() {
        Ok(role) => role,
        Err(unknown) => {
            tracing::warn!(path, role = %unknown.0, "rejecting token with unrecognized role");
            return GateDecision::reject(StatusCode::UNAUTHORIZED, "invalid role");
        }
    };

    GateDecision::Forward(Some(AuthenticatedPrincipal::single(claims.sub, role)))
}

/// Reissue sub-flow: an expired access token can be rotated when the client
/// also presents a refresh token that decodes cleanly, is unexpired, and is
/// still present in the store (i.e. not revoked at logout).
async fn reissue(
    codec: &TokenCodec,
    store: &dyn RefreshStore,
    access_ttl: chrono::Duration,
    refresh: Option<&str>,
) -> GateDecision {
    let Some(refresh) = refresh else {
        tracing::warn!("expired access token with no refresh token");
        return GateDecision::reject(StatusCode::UNAUTHORIZED, REFRESH_REJECTED);
    };

    let claims = match codec.decode(refresh) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "refresh token invalid");
            return GateDecision::reject(StatusCode::UNAUTHORIZED, REFRESH_REJECTED);
        }
    };

    match store.find_by_value(refresh).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!(subject = %claims.sub, "refresh token not in store (revoked?)");
            return GateDecision::reject(StatusCode::UNAUTHORIZED, REFRESH_REJECTED);
        }
        Err(e) => {
            tracing::error!(error = %e, "refresh store lookup failed during reissue");
            return GateDecision::reject(StatusCode::INTERNAL_SERVER_ERROR, REISSUE_FAILED);
        }
    }

    let role = match claims.role.parse::<Role>() {
        Ok(role) => role,
        Err(unknown) => {
            tracing::warn!(role = %unknown.0, "refresh token carries unrecognized role");
            return GateDecision::reject(StatusCode::UNAUTHORIZED, "invalid role");
        }
    };

    match codec.mint(TokenCategory::Access, &claims.sub, role, access_ttl) {
        Ok(token) => {
            tracing::info!(subject = %claims.sub, "issued replacement access token");
            GateDecision::Reissue { access_token: token }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to mint replacement access token");
            GateDecision::reject(StatusCode::INTERNAL_SERVER_ERROR, REISSUE_FAILED)
        }
    }
}

// ── Axum adapter ─────────────────────────────────────────────

/// Middleware wrapper: reads the token headers, runs [`evaluate`], and maps
/// the decision onto the response. On `Forward` with a principal, the
/// principal rides the request extensions to downstream handlers.
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let access = header_value(&req, ACCESS_HEADER);
    let refresh = header_value(&req, REFRESH_HEADER);

    let decision = evaluate(
        &state.codec,
        state.store.as_ref(),
        &state.config.bypass_paths,
        state.config.access_ttl(),
        req.uri().path(),
        access.as_deref(),
        refresh.as_deref(),
    )
    .await;

    match decision {
        GateDecision::Forward(principal) => {
            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            next.run(req).await
        }
        GateDecision::Reject { status, message } => (status, message).into_response(),
        GateDecision::Reissue { access_token } => {
            let mut resp = (
                StatusCode::OK,
                Json(serde_json::json!({ "accessToken": access_token })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&access_token) {
                resp.headers_mut().insert(ACCESS_HEADER, value);
            }
            resp
        }
    }
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RefreshRecord;
    use crate::store::memory::MemoryRefreshStore;
    use chrono::{Duration, Utc};

    const BYPASS: [&str; 3] = ["/join", "/login", "/reissue"];

    fn codec() -> TokenCodec {
        TokenCodec::new("gate-test-secret")
    }

    fn bypass() -> Vec<String> {
        BYPASS.iter().map(|s| s.to_string()).collect()
    }

    async fn decide(
        codec: &TokenCodec,
        store: &MemoryRefreshStore,
        path: &str,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> GateDecision {
        evaluate(
            codec,
            store,
            &bypass(),
            Duration::milliseconds(600_000),
            path,
            access,
            refresh,
        )
        .await
    }

    #[tokio::test]
    async fn test_bypass_path_forwards_regardless_of_tokens() {
        let codec = codec();
        let store = MemoryRefreshStore::new();
        for path in BYPASS {
            let decision = decide(&codec, &store, path, Some("garbage"), None).await;
            assert!(matches!(decision, GateDecision::Forward(None)), "path {path}");
        }
    }

    #[tokio::test]
    async fn test_missing_token_forwards_without_principal() {
        let decision = decide(&codec(), &MemoryRefreshStore::new(), "/events", None, None).await;
        assert!(matches!(decision, GateDecision::Forward(None)));
    }

    #[tokio::test]
    async fn test_valid_access_token_binds_principal() {
        let codec = codec();
        let token = codec
            .mint(TokenCategory::Access, "user-9", Role::Admin, Duration::minutes(10))
            .unwrap();
        let decision =
            decide(&codec, &MemoryRefreshStore::new(), "/events", Some(&token), None).await;

        match decision {
            GateDecision::Forward(Some(principal)) => {
                assert_eq!(principal.user_id, "user-9");
                assert!(principal.has_role(Role::Admin));
            }
            other => panic!("expected forward with principal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_category_rejected_as_access() {
        let codec = codec();
        let token = codec
            .mint(TokenCategory::Refresh, "user-9", Role::Admin, Duration::minutes(10))
            .unwrap();
        let decision =
            decide(&codec, &MemoryRefreshStore::new(), "/events", Some(&token), None).await;

        match decision {
            GateDecision::Reject { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "invalid access token category.");
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_access_token_rejected() {
        let decision = decide(
            &codec(),
            &MemoryRefreshStore::new(),
            "/events",
            Some("definitely.not.valid"),
            None,
        )
        .await;
        match decision {
            GateDecision::Reject { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_access_without_refresh_rejected() {
        let codec = codec();
        let expired = codec
            .mint(TokenCategory::Access, "user-9", Role::Viewer, Duration::seconds(-60))
            .unwrap();
        let decision =
            decide(&codec, &MemoryRefreshStore::new(), "/events", Some(&expired), None).await;

        match decision {
            GateDecision::Reject { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(message.contains("Please login again"));
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_access_with_expired_refresh_rejected() {
        let codec = codec();
        let expired_access = codec
            .mint(TokenCategory::Access, "user-9", Role::Viewer, Duration::seconds(-60))
            .unwrap();
        let expired_refresh = codec
            .mint(TokenCategory::Refresh, "user-9", Role::Viewer, Duration::seconds(-60))
            .unwrap();
        let decision = decide(
            &codec,
            &MemoryRefreshStore::new(),
            "/events",
            Some(&expired_access),
            Some(&expired_refresh),
        )
        .await;
        match decision {
            GateDecision::Reject { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(message.contains("Please login again"));
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_access_with_unstored_refresh_rejected() {
        let codec = codec();
        let expired_access = codec
            .mint(TokenCategory::Access, "user-9", Role::Viewer, Duration::seconds(-60))
            .unwrap();
        let refresh = codec
            .mint(TokenCategory::Refresh, "user-9", Role::Viewer, Duration::days(1))
            .unwrap();
        // Store stays empty: a revoked/unknown refresh value must not rotate.
        let decision = decide(
            &codec,
            &MemoryRefreshStore::new(),
            "/events",
            Some(&expired_access),
            Some(&refresh),
        )
        .await;
        match decision {
            GateDecision::Reject { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_access_with_valid_refresh_reissues() {
        let codec = codec();
        let store = MemoryRefreshStore::new();
        let expired_access = codec
            .mint(TokenCategory::Access, "user-7", Role::Editor, Duration::seconds(-60))
            .unwrap();
        let refresh = codec
            .mint(TokenCategory::Refresh, "user-7", Role::Editor, Duration::days(1))
            .unwrap();
        store
            .insert(RefreshRecord {
                token_value: refresh.clone(),
                expiration: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();

        let decision =
            decide(&codec, &store, "/events", Some(&expired_access), Some(&refresh)).await;

        match decision {
            GateDecision::Reissue { access_token } => {
                let claims = codec.decode(&access_token).unwrap();
                assert_eq!(claims.category, TokenCategory::Access);
                assert_eq!(claims.sub, "user-7");
                assert_eq!(claims.role, "editor");
                assert!(claims.exp > Utc::now().timestamp() as u64);
            }
            other => panic!("expected reissue, got {other:?}"),
        }
    }
}
