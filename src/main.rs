use solmetec_nav::{
    AppState,
    auth::CurrentUser,
    config::{AppConfig, Env},
    create_router,
    provider::{AuthState, JwtAuthProvider},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, the authentication provider, the route
/// table, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise verbose for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "solmetec_nav=debug,tower_http=info".into());

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

    tracing::info!("Navigation service starting in {:?} mode", config.env);

    // 3. Authentication provider. Locally, DEV_USER_ID enables the header bypass
    // as an administrator.
    let mut provider = JwtAuthProvider::new(&config.jwt_secret);
    if let Some(id) = config.dev_user_id {
        tracing::warn!(user_id = %id, "local session bypass enabled");
        provider = provider.with_known_user(CurrentUser {
            id,
            role: solmetec_nav::auth::ADMIN_ROLE.to_string(),
            permissions: Vec::new(),
        });
    }
    let auth = Arc::new(provider) as AuthState;

    // 4. Route table + guard. A broken table must stop startup.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::build(config, auth)
        .unwrap_or_else(|e| panic!("FATAL: invalid route table: {e}"));

    tracing::info!(
        routes = app_state.navigator.table().len(),
        "Route table loaded"
    );

    // 5. Router and server startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind BIND_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
