//! HTTP application wiring (axum router + engine assembly).
//!
//! Configuration values arrive here already validated (signing secret, TTL,
//! rule list); the engine crates never parse files or environment.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use gatewarden_access::{
    AuthorizationRule, Requirement, RequestPipeline, ResourceMatcher, RulePolicy, SecurityContext,
};
use gatewarden_token::{
    KeyRing, KeyRingHandle, RevocationSet, SigningKey, TokenCodec, TokenIssuer, TokenValidator,
};

use crate::credentials::CredentialStore;
use crate::errors::json_error;
use crate::middleware;

/// Already-validated configuration consumed by the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub signing_secret: String,
    pub key_id: String,
    pub token_ttl: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RequestPipeline>,
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<TokenValidator>,
    pub revocations: Arc<RevocationSet>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// Ordered rule list for this application. First match wins; anything not
/// listed is denied by the fail-closed default.
fn rule_policy() -> RulePolicy {
    RulePolicy::new(vec![
        AuthorizationRule::new(ResourceMatcher::path("/health"), Requirement::Public),
        AuthorizationRule::new(
            ResourceMatcher::path("/login").with_method("POST"),
            Requirement::Public,
        ),
        AuthorizationRule::new(
            ResourceMatcher::path("/logout").with_method("POST"),
            Requirement::any_of(["USER", "ADMIN"]),
        ),
        AuthorizationRule::new(
            ResourceMatcher::path("/whoami"),
            Requirement::any_of(["USER", "ADMIN"]),
        ),
        AuthorizationRule::new(
            ResourceMatcher::path("/admin/**"),
            Requirement::all_of(["ADMIN"]),
        ),
    ])
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(config: AppConfig, credentials: Arc<dyn CredentialStore>) -> Router {
    let keys = KeyRingHandle::new(KeyRing::new(SigningKey::from_secret(
        config.key_id,
        config.signing_secret.as_bytes(),
    )));
    let codec = TokenCodec::new(keys);
    let revocations = Arc::new(RevocationSet::new());

    // Config values arrive validated; a non-positive TTL is a startup defect.
    let issuer = Arc::new(
        TokenIssuer::new(codec.clone(), config.token_ttl).expect("token_ttl must be positive"),
    );
    let validator = TokenValidator::with_revocations(codec, revocations.clone());

    let state = AppState {
        pipeline: Arc::new(RequestPipeline::new(validator.clone(), rule_policy())),
        issuer,
        validator: Arc::new(validator),
        revocations,
        credentials,
    };

    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/whoami", get(whoami))
        .route("/admin/ping", get(admin_ping))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    token_type: &'static str,
}

/// Login: credential store → issuer → token in body and response header.
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let creds = match state.credentials.verify(&req.username, &req.password) {
        Ok(creds) => creds,
        Err(_) => {
            tracing::debug!(username = %req.username, "login rejected");
            return json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password",
            );
        }
    };

    match state.issuer.issue(creds.subject, creds.authorities) {
        Ok(token) => {
            let body = LoginResponse {
                token: token.as_str().to_string(),
                token_type: "Bearer",
            };
            let mut response = (StatusCode::OK, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                response.headers_mut().insert(AUTHORIZATION, value);
            }
            response
        }
        Err(e) => {
            // Issuer preconditions hold for store-verified credentials, so
            // this is a wiring defect worth shouting about.
            tracing::error!(kind = %e, "token issuance failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

/// Logout: revoke the presented token until its natural expiry.
///
/// The middleware already validated the token; re-validating here hands us
/// the claims (token id + expiry) the revocation set needs.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let now = Utc::now();
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    match state.validator.validate_header(authorization, now) {
        Ok(claims) => {
            if let Some(token_id) = claims.token_id {
                state.revocations.revoke(token_id, claims.expires_at, now);
            }
            Json(json!({ "status": "logged_out" })).into_response()
        }
        // Unreachable behind the middleware, but fail safe.
        Err(_) => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
    }
}

/// Sample protected route: echoes the verified identity.
async fn whoami(Extension(context): Extension<SecurityContext>) -> Response {
    match context.require_identity() {
        Ok(identity) => Json(json!({
            "subject": identity.subject().as_str(),
            "authorities": identity
                .authorities()
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(defect) => {
            tracing::error!(kind = %defect, "context defect behind protected route");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error",
            )
        }
    }
}

/// Sample admin-only route.
async fn admin_ping() -> Response {
    Json(json!({ "status": "admin_ok" })).into_response()
}
