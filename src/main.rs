use campus_admin::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    hasher::{BcryptHasher, HasherState},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, database, bootstrap admin, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: Invalid configuration");

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_admin=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;
    let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost)) as HasherState;

    // 5. Unified State Assembly
    let port = config.server_port;
    let bootstrap = config.bootstrap_admin.clone();
    let app_state = AppState::new(config, repo, hasher);

    // 6. First administrator, only when the store is empty.
    if let Some(seed) = bootstrap {
        match app_state.admins.bootstrap(&seed).await {
            Ok(Some(admin)) => tracing::info!(username = %admin.username, "Bootstrap admin created"),
            Ok(None) => tracing::debug!("Admins already exist, bootstrap skipped"),
            Err(e) => panic!("FATAL: Bootstrap admin could not be created: {e}"),
        }
    }

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener");

    tracing::info!("Listening on {addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: HTTP server error");
}
