use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes behind the session gate. The router is wrapped by `auth_middleware`, so every
/// handler here runs only for a verified, active admin; handlers that need the acting admin
/// take the `AuthAdmin` extractor as well.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        .route("/api/admin/logout", post(handlers::logout))
        .route("/api/admin/me", get(handlers::get_me))
        // --- Own account ---
        .route("/api/admin/details", put(handlers::update_details))
        // Revokes the stored refresh token and clears cookies.
        .route("/api/admin/password", put(handlers::change_password))
        // --- Administrator management ---
        .route("/api/admin/register", post(handlers::register_admin))
        .route("/api/admin/admins", get(handlers::list_admins))
        .route(
            "/api/admin/admins/{id}/deactivate",
            put(handlers::deactivate_admin),
        )
        .route(
            "/api/admin/admins/{id}/activate",
            put(handlers::activate_admin),
        )
        .route(
            "/api/admin/admins/{id}/verification",
            put(handlers::set_verification),
        )
}
