use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without an access token. Refresh authenticates with the refresh token
/// itself, so it stays reachable after the access token has expired.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and container orchestration.
        .route("/health", get(|| async { "ok" }))
        // POST /api/admin/login
        .route("/api/admin/login", post(handlers::login))
        // POST /api/admin/refresh-token
        // Reads the refresh token from cookie, JSON body or bearer header, in that order.
        .route("/api/admin/refresh-token", post(handlers::refresh_token))
}
