use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session core: tokens, credentials, cookies and the authority that ties them together.
pub mod cookies;
pub mod hasher;
pub mod session;
pub mod tokens;

// Persistence, administrator management and the HTTP surface.
pub mod admins;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub mod routes;
use auth::AuthAdmin;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use admins::AdminService;
pub use config::AppConfig;
pub use error::{AuthError, UnauthorizedReason};
pub use hasher::{BcryptHasher, HasherState};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use session::{SessionAuthority, SessionState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and wire schema into the OpenAPI document served
/// at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::refresh_token, handlers::logout, handlers::get_me,
        handlers::register_admin, handlers::list_admins, handlers::update_details,
        handlers::change_password, handlers::deactivate_admin, handlers::activate_admin,
        handlers::set_verification
    ),
    components(
        schemas(
            models::AdminProfile, models::AdminStatus, models::LoginRequest,
            models::LoginResponse, models::RefreshTokenRequest, models::TokenPair,
            models::RegisterAdminRequest, models::UpdateAdminDetailsRequest,
            models::ChangePasswordRequest, models::VerificationRequest,
            error::ErrorEnvelope, error::UnauthorizedReason,
        )
    ),
    tags(
        (name = "campus-admin", description = "Campus CMS administrator sessions and management")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub admins: AdminService,
    pub config: AppConfig,
}

impl AppState {
    /// new
    ///
    /// Wires the session authority and admin service over the given collaborators, using the
    /// token and cookie settings of `config`.
    pub fn new(config: AppConfig, repo: RepositoryState, hasher: HasherState) -> Self {
        let session = SessionState::new(SessionAuthority::new(
            config.session(),
            repo.clone(),
            hasher.clone(),
        ));
        let admins = AdminService::new(repo, hasher);
        Self {
            session,
            admins,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// The gate pulls only the session authority out of the shared state.

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

/// auth_middleware
///
/// Enforces the session gate for `authenticated_routes`. Extracting `AuthAdmin` runs
/// `SessionAuthority::verify_access`; on failure the extractor rejects with the 401 envelope
/// before the handler is reached. On success the resolved admin is stored in the request
/// extensions, where the handlers' own `AuthAdmin` extraction picks it up.
async fn auth_middleware(admin: AuthAdmin, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(admin);
    next.run(request).await
}

/// create_router
///
/// Assembles routing, the gate, docs and the observability layers around the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// cors_layer
///
/// Cookies only reach the API from an explicitly allowed origin with credentials enabled, which
/// rules out the `Any` wildcard. Without a configured origin, cross-origin calls are refused.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allowed = match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::list(Vec::<HeaderValue>::new()),
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// trace_span_logger
///
/// Builds the per-request span carrying method, uri and the `x-request-id`, so every log line
/// of one request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
