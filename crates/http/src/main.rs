use std::sync::Arc;

use chrono::Duration;

use gatewarden_http::app::{build_app, AppConfig};
use gatewarden_http::credentials::InMemoryCredentialStore;

#[tokio::main]
async fn main() {
    gatewarden_observability::init();

    let signing_secret = std::env::var("GATEWARDEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("GATEWARDEN_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let ttl_secs: i64 = std::env::var("GATEWARDEN_TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(900);

    let config = AppConfig {
        signing_secret,
        key_id: "primary".to_string(),
        token_ttl: Duration::seconds(ttl_secs),
    };

    // Dev-only credential store; a real deployment injects its own.
    let credentials = Arc::new(
        InMemoryCredentialStore::new()
            .with_user("alice", "alice-password", ["USER"])
            .with_user("root", "root-password", ["USER", "ADMIN"]),
    );
    tracing::warn!("using in-memory dev credential store");

    let app = build_app(config, credentials);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
